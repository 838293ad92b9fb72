//! Error types for the PAL object-code loader.

use thiserror::Error;

/// Errors produced while loading a textual object file.
///
/// Every load error is fatal: the machine never starts on a partial
/// program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A line had fewer than the three required fields.
    #[error("line {line}: malformed instruction '{text}'")]
    MalformedLine { line: usize, text: String },

    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// The level field was not an integer.
    #[error("line {line}: level '{token}' is not an integer")]
    InvalidLevel { line: usize, token: String },

    /// The operand field did not parse as the type the opcode requires.
    #[error("line {line}: invalid {kind} operand '{token}'")]
    InvalidOperand {
        line: usize,
        kind: &'static str,
        token: String,
    },

    /// A string literal was empty or missing its closing quote.
    #[error("line {line}: malformed string literal")]
    MalformedString { line: usize },

    /// The object file holds more instructions than the code store.
    #[error("too many instructions: the code store holds {capacity}")]
    TooManyInstructions { capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_malformed_line() {
        let e = LoadError::MalformedLine {
            line: 3,
            text: "LCI 0".to_string(),
        };
        assert_eq!(e.to_string(), "line 3: malformed instruction 'LCI 0'");
    }

    #[test]
    fn display_unknown_opcode() {
        let e = LoadError::UnknownOpcode {
            line: 1,
            token: "FOO".to_string(),
        };
        assert_eq!(e.to_string(), "line 1: unknown opcode 'FOO'");
    }

    #[test]
    fn display_invalid_level() {
        let e = LoadError::InvalidLevel {
            line: 7,
            token: "x".to_string(),
        };
        assert_eq!(e.to_string(), "line 7: level 'x' is not an integer");
    }

    #[test]
    fn display_invalid_operand() {
        let e = LoadError::InvalidOperand {
            line: 2,
            kind: "real",
            token: "3..14".to_string(),
        };
        assert_eq!(e.to_string(), "line 2: invalid real operand '3..14'");
    }

    #[test]
    fn display_malformed_string() {
        let e = LoadError::MalformedString { line: 9 };
        assert_eq!(e.to_string(), "line 9: malformed string literal");
    }

    #[test]
    fn display_too_many_instructions() {
        let e = LoadError::TooManyInstructions { capacity: 10_000 };
        assert_eq!(
            e.to_string(),
            "too many instructions: the code store holds 10000"
        );
    }
}
