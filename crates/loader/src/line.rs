//! Per-line parsing of object-code text into instructions.
//!
//! A line is `<mnemonic> <level> <operand> [comment...]` with fields
//! separated by whitespace. The operand's type depends on the opcode, so
//! the parser dispatches after the mnemonic is known.

use pal_common::{Cell, Instruction, Opcode};

use crate::error::LoadError;

/// Parse one line of object-code text.
///
/// Anything after the operand is comment and ignored. Blank lines are not
/// allowed: every line in the object format carries an instruction.
pub(crate) fn parse_line(line: &str, line_num: usize) -> Result<Instruction, LoadError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(LoadError::MalformedLine {
            line: line_num,
            text: line.trim().to_string(),
        });
    }

    let mnemonic = fields[0].to_uppercase();
    let op = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| LoadError::UnknownOpcode {
        line: line_num,
        token: fields[0].to_string(),
    })?;

    let lev: i32 = fields[1].parse().map_err(|_| LoadError::InvalidLevel {
        line: line_num,
        token: fields[1].to_string(),
    })?;

    let arg = match op {
        Opcode::Lcr => {
            let value: f64 = fields[2].parse().map_err(|_| LoadError::InvalidOperand {
                line: line_num,
                kind: "real",
                token: fields[2].to_string(),
            })?;
            Cell::Real(value)
        }
        Opcode::Lcs => Cell::Str(scan_string(line, line_num)?),
        _ => {
            let value: i64 = fields[2].parse().map_err(|_| LoadError::InvalidOperand {
                line: line_num,
                kind: "integer",
                token: fields[2].to_string(),
            })?;
            Cell::Int(value)
        }
    };

    Ok(Instruction::new(op, lev, arg))
}

/// Scan the quoted string operand of an `LCS` line from the raw text.
///
/// The operand starts at the third whitespace-separated field; whitespace
/// inside the quotes is part of the literal, which is why this scans the
/// raw line instead of using the split fields. Quote characters are not
/// representable inside a literal. An empty body or a missing closing
/// quote is an error.
fn scan_string(line: &str, line_num: usize) -> Result<String, LoadError> {
    let malformed = LoadError::MalformedString { line: line_num };

    // Skip the mnemonic and level fields. The caller has verified the line
    // has at least three fields, so both skips find their whitespace.
    let mut rest = line.trim_start();
    for _ in 0..2 {
        let cut = rest.find(char::is_whitespace).ok_or(malformed.clone())?;
        rest = rest[cut..].trim_start();
    }

    let body = rest.strip_prefix('\'').ok_or(malformed.clone())?;
    let end = body.find('\'').ok_or(malformed.clone())?;
    if end == 0 {
        return Err(malformed);
    }
    Ok(body[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_operand() {
        let i = parse_line("LCI 0 42", 1).unwrap();
        assert_eq!(i, Instruction::new(Opcode::Lci, 0, Cell::Int(42)));
    }

    #[test]
    fn negative_integer_operand() {
        let i = parse_line("LCI 0 -13", 1).unwrap();
        assert_eq!(i.arg, Cell::Int(-13));
    }

    #[test]
    fn level_and_displacement() {
        let i = parse_line("LDV 2 3", 1).unwrap();
        assert_eq!(i.op, Opcode::Ldv);
        assert_eq!(i.lev, 2);
        assert_eq!(i.arg, Cell::Int(3));
    }

    #[test]
    fn lowercase_mnemonic_accepted() {
        let i = parse_line("jmp 0 0", 1).unwrap();
        assert_eq!(i.op, Opcode::Jmp);
    }

    #[test]
    fn real_operand() {
        let i = parse_line("LCR 0 3.14", 1).unwrap();
        assert_eq!(i.arg, Cell::Real(3.14));
    }

    #[test]
    fn real_operand_exponent_form() {
        let i = parse_line("LCR 0 2.0e-3", 1).unwrap();
        assert_eq!(i.arg, Cell::Real(0.002));
    }

    #[test]
    fn real_operand_integer_syntax() {
        let i = parse_line("LCR 0 2", 1).unwrap();
        assert_eq!(i.arg, Cell::Real(2.0));
    }

    #[test]
    fn string_operand() {
        let i = parse_line("LCS 0 'hello'", 1).unwrap();
        assert_eq!(i.arg, Cell::Str("hello".to_string()));
    }

    #[test]
    fn string_operand_with_spaces() {
        let i = parse_line("LCS 0 'hello world'", 1).unwrap();
        assert_eq!(i.arg, Cell::Str("hello world".to_string()));
    }

    #[test]
    fn string_operand_with_leading_whitespace_and_tabs() {
        let i = parse_line("  LCS\t0\t'padded'", 1).unwrap();
        assert_eq!(i.arg, Cell::Str("padded".to_string()));
    }

    #[test]
    fn string_operand_followed_by_comment() {
        let i = parse_line("LCS 0 'hi' push the greeting", 1).unwrap();
        assert_eq!(i.arg, Cell::Str("hi".to_string()));
    }

    #[test]
    fn comment_after_integer_operand_ignored() {
        let i = parse_line("LCI 0 7 the answer minus thirty-five", 1).unwrap();
        assert_eq!(i.arg, Cell::Int(7));
    }

    #[test]
    fn blank_line_is_malformed() {
        let err = parse_line("", 4).unwrap_err();
        assert!(matches!(err, LoadError::MalformedLine { line: 4, .. }));
    }

    #[test]
    fn two_fields_is_malformed() {
        let err = parse_line("LCI 0", 2).unwrap_err();
        assert!(matches!(err, LoadError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn unknown_opcode() {
        let err = parse_line("XYZ 0 0", 3).unwrap_err();
        assert_eq!(
            err,
            LoadError::UnknownOpcode {
                line: 3,
                token: "XYZ".to_string()
            }
        );
    }

    #[test]
    fn level_not_an_integer() {
        let err = parse_line("LCI x 42", 5).unwrap_err();
        assert_eq!(
            err,
            LoadError::InvalidLevel {
                line: 5,
                token: "x".to_string()
            }
        );
    }

    #[test]
    fn integer_operand_rejects_trailing_garbage() {
        let err = parse_line("LCI 0 12ab", 1).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidOperand {
                kind: "integer",
                ..
            }
        ));
    }

    #[test]
    fn real_operand_rejects_garbage() {
        let err = parse_line("LCR 0 3..14", 1).unwrap_err();
        assert!(matches!(err, LoadError::InvalidOperand { kind: "real", .. }));
    }

    #[test]
    fn string_missing_opening_quote() {
        let err = parse_line("LCS 0 hello", 1).unwrap_err();
        assert_eq!(err, LoadError::MalformedString { line: 1 });
    }

    #[test]
    fn string_missing_closing_quote() {
        let err = parse_line("LCS 0 'hello", 1).unwrap_err();
        assert_eq!(err, LoadError::MalformedString { line: 1 });
    }

    #[test]
    fn string_empty_body() {
        let err = parse_line("LCS 0 ''", 1).unwrap_err();
        assert_eq!(err, LoadError::MalformedString { line: 1 });
    }
}
