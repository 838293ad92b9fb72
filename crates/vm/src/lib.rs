//! PAL virtual machine — executes loaded object programs.
//!
//! The machine is stack-based with a tagged data store:
//!
//! - One flat sequence of tagged cells holds activation records and the
//!   operand stack.
//! - Activation records are linked statically (lexical scope) and
//!   dynamically (call chain), with a per-frame exception-handler slot.
//! - Raising a signal unwinds the dynamic chain to the nearest frame with
//!   a registered handler.
//!
//! # Usage
//!
//! ```
//! use pal_common::{Cell, Instruction, Opcode, Program};
//! use pal_vm::VM;
//!
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::Lcs, 0, Cell::Str("hello".into())),
//!     Instruction::new(Opcode::Opr, 0, Cell::Int(20)),
//!     Instruction::new(Opcode::Jmp, 0, Cell::Int(0)),
//! ]);
//!
//! let mut output = Vec::new();
//! let mut vm = VM::with_io(&program, std::io::empty(), &mut output);
//! vm.execute().unwrap();
//! assert_eq!(output, b"hello");
//! ```

pub mod error;

mod execute;
mod machine;
mod operators;
mod unwind;

pub use error::RuntimeError;
pub use machine::{STORE_CAPACITY, VM};

use pal_common::Program;
use std::io;

/// Execute a program against standard input and output.
///
/// Runs until the program jumps to address 0. Recoverable run-time errors
/// unwind toward a registered handler first; the returned error is either
/// a fatal condition or an exception no frame handled.
pub fn run(program: &Program) -> Result<(), RuntimeError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut vm = VM::with_io(program, stdin.lock(), stdout.lock());
    vm.execute()
}
