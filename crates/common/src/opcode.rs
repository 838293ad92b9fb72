//! Function codes of the PAL instruction set.

use std::fmt;

/// Identifies the operation a single instruction performs.
///
/// The set is closed: the loader rejects any mnemonic outside this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Mark the stack: push a four-cell frame header.
    Mst,
    /// Procedure or function call.
    Cal,
    /// Increment the top-of-stack pointer, clearing exposed cells.
    Inc,
    /// Jump to the operand address if the top of stack is false.
    Jif,
    /// Unconditional jump. `JMP 0 0` is the normal-termination path.
    Jmp,
    /// Load an integer constant onto the stack.
    Lci,
    /// Load a real constant onto the stack.
    Lcr,
    /// Load a string literal onto the stack.
    Lcs,
    /// Load the absolute address of a variable onto the stack.
    Lda,
    /// Replace the address on top of the stack with the cell it names.
    Ldi,
    /// Load the value of a variable onto the stack.
    Ldv,
    /// Load an undefined value onto the stack.
    Ldu,
    /// Execute one of the 32 sub-operations.
    Opr,
    /// Read an integer from input into a variable.
    Rdi,
    /// Read a real from input into a variable.
    Rdr,
    /// Store the next-to-top value through the address on top of the stack.
    Sti,
    /// Store the top of stack into a variable.
    Sto,
    /// Raise a signal.
    Sig,
    /// Register an exception handler for the current frame.
    Reh,
    /// Toggle the per-instruction execution trace.
    Dbg,
}

/// All valid opcodes, in instruction-set order.
pub const ALL_OPCODES: [Opcode; 20] = [
    Opcode::Mst,
    Opcode::Cal,
    Opcode::Inc,
    Opcode::Jif,
    Opcode::Jmp,
    Opcode::Lci,
    Opcode::Lcr,
    Opcode::Lcs,
    Opcode::Lda,
    Opcode::Ldi,
    Opcode::Ldv,
    Opcode::Ldu,
    Opcode::Opr,
    Opcode::Rdi,
    Opcode::Rdr,
    Opcode::Sti,
    Opcode::Sto,
    Opcode::Sig,
    Opcode::Reh,
    Opcode::Dbg,
];

impl Opcode {
    /// Returns the three-letter mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Mst => "MST",
            Opcode::Cal => "CAL",
            Opcode::Inc => "INC",
            Opcode::Jif => "JIF",
            Opcode::Jmp => "JMP",
            Opcode::Lci => "LCI",
            Opcode::Lcr => "LCR",
            Opcode::Lcs => "LCS",
            Opcode::Lda => "LDA",
            Opcode::Ldi => "LDI",
            Opcode::Ldv => "LDV",
            Opcode::Ldu => "LDU",
            Opcode::Opr => "OPR",
            Opcode::Rdi => "RDI",
            Opcode::Rdr => "RDR",
            Opcode::Sti => "STI",
            Opcode::Sto => "STO",
            Opcode::Sig => "SIG",
            Opcode::Reh => "REH",
            Opcode::Dbg => "DBG",
        }
    }

    /// Looks up an opcode by its (already uppercased) mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic() == mnemonic)
            .copied()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 20);
    }

    #[test]
    fn mnemonic_roundtrip_all() {
        for &op in &ALL_OPCODES {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(Opcode::from_mnemonic("XYZ"), None);
        assert_eq!(Opcode::from_mnemonic(""), None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        // Callers uppercase before lookup; lowercase is not a mnemonic.
        assert_eq!(Opcode::from_mnemonic("jmp"), None);
    }

    #[test]
    fn display_is_mnemonic() {
        assert_eq!(Opcode::Mst.to_string(), "MST");
        assert_eq!(Opcode::Dbg.to_string(), "DBG");
    }
}
