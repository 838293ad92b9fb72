//! PAL common types.
//!
//! This crate provides the foundational data structures shared by the
//! loader, the virtual machine, and the CLI:
//!
//! - [`Cell`] / [`CellTag`] — tagged memory cells and their runtime types
//! - [`Opcode`] — the 20 function codes of the instruction set
//! - [`Instruction`] — ⟨opcode, level, operand-cell⟩
//! - [`Program`] — the 1-based code store
//! - [`signal`] — the predefined exception codes
//! - [`TagError`] — reported on every mistyped cell access
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod cell;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod signal;

// Re-export commonly used types at the crate root.
pub use cell::{Cell, CellTag};
pub use error::TagError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::{Program, CODE_CAPACITY};
