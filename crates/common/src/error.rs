//! Tag-mismatch errors for cell access.

use thiserror::Error;

use crate::cell::CellTag;

/// A cell was read through the wrong type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cell holds {found}, expected {expected}")]
pub struct TagError {
    /// The tag the caller asked for.
    pub expected: CellTag,
    /// The tag the cell actually carries.
    pub found: CellTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_both_tags() {
        let e = TagError {
            expected: CellTag::Real,
            found: CellTag::Bool,
        };
        assert_eq!(e.to_string(), "cell holds BOOL, expected REAL");
    }
}
