//! PAL machine CLI — load and execute a PAL object file.
//!
//! Usage: `pal [flags] [filename]`. Without a filename the default object
//! file `CODE` is used.
//!
//! Exit codes:
//! - 0: normal termination (`JMP 0 0`), or help requested
//! - 1: usage or load error
//! - 2: run-time error (unhandled exception or fatal condition)

use std::fs;
use std::io;
use std::process;

use pal_vm::VM;

const DEFAULT_CODE_FILE: &str = "CODE";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(code) = run(&args) {
        process::exit(code);
    }
}

fn run(args: &[String]) -> Result<(), i32> {
    let mut listing = false;
    let mut file: Option<&str> = None;

    for arg in args {
        match arg.as_str() {
            "-h" => {
                print_usage();
                return Ok(());
            }
            "-l" => listing = true,
            name => {
                if file.is_some() {
                    eprintln!("error: multiple object files provided");
                    eprintln!();
                    print_usage();
                    return Err(1);
                }
                file = Some(name);
            }
        }
    }

    let path = file.unwrap_or(DEFAULT_CODE_FILE);
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    let program = pal_loader::load(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    if listing {
        for (addr, instr) in program.iter() {
            eprintln!("{addr}:    {instr}");
        }
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut vm = VM::with_io(&program, stdin.lock(), stdout.lock());
    vm.set_trace(listing);
    vm.execute().map_err(|e| {
        eprintln!("runtime error: {e}");
        2
    })
}

fn print_usage() {
    eprintln!("Usage: pal [flags] [filename]");
    eprintln!("    where filename names the PAL object file to execute");
    eprintln!("    (default: {DEFAULT_CODE_FILE}).");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  -h    Print this help message.");
    eprintln!("  -l    List the loaded instructions and trace execution,");
    eprintln!("        with a stack dump after every instruction.");
}
