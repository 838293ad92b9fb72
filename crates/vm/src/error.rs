//! Run-time errors and the internal trap channel.
//!
//! The machine distinguishes two failure tiers at run time. A [`Fault`] is
//! recoverable: the machine prints a diagnostic, then unwinds the stack
//! toward a registered handler. A [`RuntimeError`] is fatal: execution
//! terminates immediately and the error reaches the caller.

use pal_common::{signal, CellTag, TagError};
use thiserror::Error;

/// Fatal run-time errors. No handler can intercept these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A static-link cell did not hold an integer.
    #[error("static link is not an integer (found {found})")]
    StaticLinkCorrupt { found: CellTag },

    /// An exception-handler slot did not hold an integer during unwinding.
    #[error("exception handler slot has the wrong type (found {found})")]
    HandlerSlotWrongType { found: CellTag },

    /// A registered handler address lies outside the code store.
    #[error("exception handler address {addr} is invalid")]
    HandlerAddressInvalid { addr: i64 },

    /// A return-address or dynamic-link cell did not hold an integer.
    #[error("frame header corrupt (found {found})")]
    FrameCorrupt { found: CellTag },

    /// A frame base left no room for the four header cells.
    #[error("activation record base {base} has no header")]
    HeaderOutOfRange { base: usize },

    /// The dynamic chain ran out before any frame advertised a handler.
    #[error("exception {signal} was never handled")]
    UnhandledException { signal: i64 },

    /// The data store cannot grow past its capacity.
    #[error("data store overflow: more than {capacity} cells in use")]
    StoreOverflow { capacity: usize },

    /// The program counter left the code store without `JMP 0 0`.
    #[error("program counter {pc} is outside the code store")]
    CodeOutOfRange { pc: usize },

    /// Reading or writing a standard stream failed.
    #[error("stream error: {message}")]
    Stream { message: String },
}

/// A recoverable run-time condition.
///
/// Carries the diagnostic text and the exception code the unwinder will
/// make current, so handlers can match it with the `is` operation.
#[derive(Debug)]
pub(crate) struct Fault {
    pub message: String,
    pub signal: i64,
}

impl Fault {
    /// A fault that unwinds with the program-abort code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            signal: signal::PROGRAM_ABORT,
        }
    }

    /// A fault that unwinds with a specific exception code.
    pub fn with_signal(message: impl Into<String>, signal: i64) -> Self {
        Self {
            message: message.into(),
            signal,
        }
    }
}

/// Internal result channel for instruction execution.
#[derive(Debug)]
pub(crate) enum Trap {
    /// Recoverable: dump the stack, then unwind toward a handler.
    Fault(Fault),
    /// Fatal: terminate with the given error.
    Fatal(RuntimeError),
}

impl From<Fault> for Trap {
    fn from(fault: Fault) -> Self {
        Trap::Fault(fault)
    }
}

impl From<RuntimeError> for Trap {
    fn from(error: RuntimeError) -> Self {
        Trap::Fatal(error)
    }
}

impl From<TagError> for Trap {
    /// A mistyped operand is recoverable; the tag error becomes the
    /// diagnostic text.
    fn from(error: TagError) -> Self {
        Trap::Fault(Fault::new(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            RuntimeError::UnhandledException { signal: 7 }.to_string(),
            "exception 7 was never handled"
        );
        assert_eq!(
            RuntimeError::HandlerSlotWrongType {
                found: CellTag::Str
            }
            .to_string(),
            "exception handler slot has the wrong type (found STRING)"
        );
        assert_eq!(
            RuntimeError::StoreOverflow { capacity: 10_000 }.to_string(),
            "data store overflow: more than 10000 cells in use"
        );
    }

    #[test]
    fn fault_defaults_to_program_abort() {
        let fault = Fault::new("divide by integer zero");
        assert_eq!(fault.signal, signal::PROGRAM_ABORT);
    }

    #[test]
    fn tag_error_becomes_recoverable_fault() {
        let tag_err = TagError {
            expected: CellTag::Int,
            found: CellTag::Undef,
        };
        match Trap::from(tag_err) {
            Trap::Fault(fault) => {
                assert_eq!(fault.signal, signal::PROGRAM_ABORT);
                assert_eq!(fault.message, "cell holds UNDEF, expected INT");
            }
            Trap::Fatal(_) => panic!("expected a recoverable fault"),
        }
    }
}
