//! Tagged memory cells for the PAL machine.
//!
//! Every location in the data store carries a value together with its
//! runtime type. Reading a cell through the wrong tag is reported as a
//! [`TagError`], never a panic.

use std::fmt;

use crate::error::TagError;

/// The five runtime types known to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellTag {
    /// Uninitialized storage.
    Undef,
    /// Boolean value.
    Bool,
    /// Signed integer.
    Int,
    /// Real (floating-point) number.
    Real,
    /// Character string.
    Str,
}

impl CellTag {
    /// Returns the diagnostic name of this tag.
    pub fn name(&self) -> &'static str {
        match self {
            CellTag::Undef => "UNDEF",
            CellTag::Bool => "BOOL",
            CellTag::Int => "INT",
            CellTag::Real => "REAL",
            CellTag::Str => "STRING",
        }
    }
}

impl fmt::Display for CellTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tagged memory cell.
///
/// Cells live in the data store and as literal operands inside
/// instructions. String cells own their text.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    /// Uninitialized storage; the state of every cell before first use.
    #[default]
    Undef,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl Cell {
    /// Returns the type tag of this cell.
    pub fn tag(&self) -> CellTag {
        match self {
            Cell::Undef => CellTag::Undef,
            Cell::Bool(_) => CellTag::Bool,
            Cell::Int(_) => CellTag::Int,
            Cell::Real(_) => CellTag::Real,
            Cell::Str(_) => CellTag::Str,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Cell::Undef)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Cell::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Cell::Int(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Cell::Real(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Cell::Str(_))
    }

    /// Returns the boolean value, or a tag error for any other variant.
    pub fn as_bool(&self) -> Result<bool, TagError> {
        match self {
            Cell::Bool(b) => Ok(*b),
            other => Err(other.mismatch(CellTag::Bool)),
        }
    }

    /// Returns the integer value, or a tag error for any other variant.
    pub fn as_int(&self) -> Result<i64, TagError> {
        match self {
            Cell::Int(i) => Ok(*i),
            other => Err(other.mismatch(CellTag::Int)),
        }
    }

    /// Returns the real value, or a tag error for any other variant.
    pub fn as_real(&self) -> Result<f64, TagError> {
        match self {
            Cell::Real(r) => Ok(*r),
            other => Err(other.mismatch(CellTag::Real)),
        }
    }

    /// Returns the string value, or a tag error for any other variant.
    pub fn as_str(&self) -> Result<&str, TagError> {
        match self {
            Cell::Str(s) => Ok(s),
            other => Err(other.mismatch(CellTag::Str)),
        }
    }

    fn mismatch(&self, expected: CellTag) -> TagError {
        TagError {
            expected,
            found: self.tag(),
        }
    }
}

impl fmt::Display for Cell {
    /// Renders the diagnostic form used in stack dumps: the tag padded to
    /// an 8-column field, then the value. Reals render in shortest
    /// round-trip form, so `1024.0` keeps its decimal point.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Undef => write!(f, "UNDEF"),
            Cell::Bool(b) => write!(f, "BOOL    {b}"),
            Cell::Int(i) => write!(f, "INT     {i}"),
            Cell::Real(r) => write!(f, "REAL    {r:?}"),
            Cell::Str(s) => write!(f, "STRING  {s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_undef() {
        assert!(Cell::default().is_undef());
    }

    #[test]
    fn tags() {
        assert_eq!(Cell::Undef.tag(), CellTag::Undef);
        assert_eq!(Cell::Bool(true).tag(), CellTag::Bool);
        assert_eq!(Cell::Int(42).tag(), CellTag::Int);
        assert_eq!(Cell::Real(3.14).tag(), CellTag::Real);
        assert_eq!(Cell::Str("x".into()).tag(), CellTag::Str);
    }

    #[test]
    fn queries_match_variant() {
        assert!(Cell::Int(0).is_int());
        assert!(!Cell::Int(0).is_real());
        assert!(Cell::Str(String::new()).is_str());
        assert!(!Cell::Undef.is_bool());
    }

    #[test]
    fn accessor_right_tag() {
        assert_eq!(Cell::Bool(true).as_bool(), Ok(true));
        assert_eq!(Cell::Int(-7).as_int(), Ok(-7));
        assert_eq!(Cell::Real(2.5).as_real(), Ok(2.5));
        assert_eq!(Cell::Str("hi".into()).as_str(), Ok("hi"));
    }

    #[test]
    fn accessor_wrong_tag() {
        let err = Cell::Str("hi".into()).as_int().unwrap_err();
        assert_eq!(err.expected, CellTag::Int);
        assert_eq!(err.found, CellTag::Str);
        assert_eq!(err.to_string(), "cell holds STRING, expected INT");
    }

    #[test]
    fn undef_rejects_every_accessor() {
        assert!(Cell::Undef.as_bool().is_err());
        assert!(Cell::Undef.as_int().is_err());
        assert!(Cell::Undef.as_real().is_err());
        assert!(Cell::Undef.as_str().is_err());
    }

    #[test]
    fn display_padding() {
        assert_eq!(Cell::Undef.to_string(), "UNDEF");
        assert_eq!(Cell::Bool(false).to_string(), "BOOL    false");
        assert_eq!(Cell::Int(42).to_string(), "INT     42");
        assert_eq!(Cell::Str("hello".into()).to_string(), "STRING  hello");
    }

    #[test]
    fn display_real_keeps_decimal_point() {
        assert_eq!(Cell::Real(1024.0).to_string(), "REAL    1024.0");
        assert_eq!(Cell::Real(3.14).to_string(), "REAL    3.14");
    }
}
