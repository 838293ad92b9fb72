//! PAL object-code loader — textual object files into executable programs.
//!
//! An object file holds one instruction per line:
//!
//! ```text
//! <mnemonic> <level> <operand> [comment...]
//! ```
//!
//! The mnemonic is case-insensitive. The operand's type follows the
//! opcode: `LCR` takes a real, `LCS` a single-quoted string literal, and
//! every other opcode a signed integer. Anything after the operand is
//! comment.
//!
//! # Usage
//!
//! ```
//! use pal_loader::load;
//!
//! let program = load("LCI 0 42  push the answer\nJMP 0 0\n").unwrap();
//! assert_eq!(program.last_instruction(), 2);
//! ```

pub mod error;

mod line;

pub use error::LoadError;

use pal_common::{Program, CODE_CAPACITY};

use line::parse_line;

/// Load a textual object file into a program.
///
/// Returns the first error encountered; a partial program is never
/// produced. Load errors are fatal — the machine does not start.
pub fn load(text: &str) -> Result<Program, LoadError> {
    let mut instructions = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if instructions.len() == CODE_CAPACITY {
            return Err(LoadError::TooManyInstructions {
                capacity: CODE_CAPACITY,
            });
        }
        instructions.push(parse_line(line, idx + 1)?);
    }

    Ok(Program::new(instructions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::{Cell, Opcode};

    #[test]
    fn load_minimal_program() {
        let program = load("LCI 0 42\nJMP 0 0\n").unwrap();
        assert_eq!(program.last_instruction(), 2);
        let first = program.fetch(1).unwrap();
        assert_eq!(first.op, Opcode::Lci);
        assert_eq!(first.arg, Cell::Int(42));
    }

    #[test]
    fn load_empty_text() {
        let program = load("").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn load_without_trailing_newline() {
        let program = load("JMP 0 0").unwrap();
        assert_eq!(program.last_instruction(), 1);
    }

    #[test]
    fn literal_tags_are_preserved() {
        let program = load("LCI 0 1\nLCR 0 2.5\nLCS 0 'three'\nJMP 0 0\n").unwrap();
        assert_eq!(program.fetch(1).unwrap().arg, Cell::Int(1));
        assert_eq!(program.fetch(2).unwrap().arg, Cell::Real(2.5));
        assert_eq!(program.fetch(3).unwrap().arg, Cell::Str("three".into()));
    }

    #[test]
    fn comments_are_ignored() {
        let program = load("LCI 0 3 first operand\nLCI 0 4 second operand\nOPR 0 3 add\nJMP 0 0 halt\n")
            .unwrap();
        assert_eq!(program.last_instruction(), 4);
    }

    #[test]
    fn blank_line_aborts_load() {
        let err = load("LCI 0 1\n\nJMP 0 0\n").unwrap_err();
        assert!(matches!(err, LoadError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn error_reports_correct_line() {
        let err = load("LCI 0 1\nBAD 0 0\n").unwrap_err();
        assert_eq!(
            err,
            LoadError::UnknownOpcode {
                line: 2,
                token: "BAD".to_string()
            }
        );
    }

    #[test]
    fn first_error_wins() {
        let err = load("BAD 0 0\nWORSE x y\n").unwrap_err();
        assert!(matches!(err, LoadError::UnknownOpcode { line: 1, .. }));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut text = String::new();
        for _ in 0..CODE_CAPACITY + 1 {
            text.push_str("LCI 0 0\n");
        }
        let err = load(&text).unwrap_err();
        assert_eq!(
            err,
            LoadError::TooManyInstructions {
                capacity: CODE_CAPACITY
            }
        );
    }

    #[test]
    fn exactly_capacity_loads() {
        let mut text = String::new();
        for _ in 0..CODE_CAPACITY {
            text.push_str("LCI 0 0\n");
        }
        let program = load(&text).unwrap();
        assert_eq!(program.last_instruction(), CODE_CAPACITY);
    }
}
