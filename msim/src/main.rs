#[macro_use]
extern crate clap;

use std::io::{self, BufRead, Write};

use clap::Arg;
use mips_vm::StdIo;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .takes_value(true)
                .value_name("FILE")
                .help("Runs a source file in batch mode directly, skipping the menu"),
        )
        .arg(
            Arg::with_name("memory")
                .short("m")
                .long("memory")
                .takes_value(true)
                .value_name("BYTES")
                .default_value("1000000")
                .help("Requested region size in bytes (informational: the address map is fixed)"),
        )
        .get_matches();

    let _ = value_t!(matches.value_of("memory"), u32).unwrap_or(1_000_000);

    if let Some(path) = matches.value_of("file") {
        run_file(path);
        return;
    }

    menu();
}

fn run_file(path: &str) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("could not read {}: {}", path, e);
            std::process::exit(1);
        }
    };
    let mut io = StdIo::default();
    if let Err(e) = msim::run_batch(&source, &mut io) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn menu() {
    let stdin = io::stdin();
    loop {
        println!("1) Start interpreter");
        println!("2) Read program from file");
        println!("3) Quit");
        print!("> ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        if stdin.lock().read_line(&mut choice).unwrap_or(0) == 0 {
            break;
        }
        match choice.trim() {
            "1" => run_interpreter(),
            "2" => {
                print!("path: ");
                io::stdout().flush().ok();
                let mut path = String::new();
                if stdin.lock().read_line(&mut path).unwrap_or(0) == 0 {
                    continue;
                }
                run_file(path.trim());
            }
            "3" | "q" | "quit" => break,
            other => println!("unrecognized choice: {}", other),
        }
    }
}

fn run_interpreter() {
    let stdin = io::stdin();
    let mut interpreter = msim::Interpreter::new();
    let mut io_handle = StdIo::default();

    println!(
        "Enter MIPS-I assembly, one statement per line. Meta-commands: ?, regs, labels, data, goto <hex>, saveto <file>, quit."
    );
    loop {
        print!("msim> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let trimmed = line.trim();
        match trimmed {
            "?" => print_help(),
            "regs" => print!("{}", interpreter.format_registers()),
            "labels" => print!("{}", interpreter.format_labels()),
            "data" => print!("{}", interpreter.format_data()),
            "quit" | "exit" => break,
            _ if trimmed.starts_with("goto ") => {
                let text = trimmed[5..].trim().trim_start_matches("0x");
                match u32::from_str_radix(text, 16) {
                    Ok(addr) => {
                        if let Err(e) = interpreter.goto(addr, &mut io_handle) {
                            eprintln!("{}", e);
                        }
                    }
                    Err(_) => eprintln!("malformed address, expected hex"),
                }
            }
            _ if trimmed.starts_with("saveto ") => {
                let path = trimmed[7..].trim();
                if let Err(e) = save_state(&interpreter, path) {
                    eprintln!("{}", e);
                }
            }
            _ => match interpreter.feed_line(&line, &mut io_handle) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => eprintln!("{}", e),
            },
        }
    }
}

fn print_help() {
    println!("?            show this message");
    println!("regs         print all registers, hi/lo and pc");
    println!("labels       print the symbol table");
    println!("data         print nonzero data memory");
    println!("goto <hex>   replay from a previously executed text address");
    println!("saveto <f>   write registers and data memory to a file");
    println!("quit         exit the interpreter");
}

fn save_state(interpreter: &msim::Interpreter, path: &str) -> std::io::Result<()> {
    let mut contents = String::new();
    contents.push_str(&interpreter.format_registers());
    contents.push_str(&interpreter.format_data());
    std::fs::write(path, contents)
}
