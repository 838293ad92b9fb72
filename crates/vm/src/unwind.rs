//! Stack unwinding: discard activation records along the dynamic chain
//! until one advertises a registered exception handler.

use std::io::{BufRead, Write};

use pal_common::Cell;

use crate::error::RuntimeError;
use crate::machine::{STORE_CAPACITY, VM};

impl<R: BufRead, W: Write> VM<'_, R, W> {
    /// Search outward from the current frame for a handler and transfer
    /// control to it.
    ///
    /// Walks candidate registers down the dynamic links; the machine's
    /// registers are only committed once a handler is found. Running out
    /// of frames, a mistyped header cell, or a handler address outside
    /// the code store cannot be recovered from.
    pub(crate) fn unwind(&mut self) -> Result<(), RuntimeError> {
        let mut b = self.base;
        let mut t = self.top;
        let pc;

        loop {
            if self.trace {
                eprintln!("unwinding at base {b}");
            }
            if b < 5 {
                return Err(RuntimeError::HeaderOutOfRange { base: b });
            }
            match &self.data[b - 1] {
                Cell::Int(0) => {
                    // No handler in this frame: discard it.
                    t = b - 5;
                    let ret = &self.data[t + 3];
                    if !ret.is_int() {
                        return Err(RuntimeError::FrameCorrupt { found: ret.tag() });
                    }
                    let link = match &self.data[t + 2] {
                        Cell::Int(v) => *v,
                        cell => return Err(RuntimeError::FrameCorrupt { found: cell.tag() }),
                    };
                    if link == 0 {
                        return Err(RuntimeError::UnhandledException {
                            signal: self.signal,
                        });
                    }
                    if !(1..=STORE_CAPACITY as i64).contains(&link) {
                        return Err(RuntimeError::HeaderOutOfRange {
                            base: link.max(0) as usize,
                        });
                    }
                    b = link as usize;
                }
                Cell::Int(addr) => {
                    if *addr > 0 && (*addr as usize) < self.program.last_instruction() {
                        pc = *addr as usize;
                        break;
                    }
                    return Err(RuntimeError::HandlerAddressInvalid { addr: *addr });
                }
                cell => {
                    return Err(RuntimeError::HandlerSlotWrongType { found: cell.tag() });
                }
            }
        }

        self.pc = pc;
        self.base = b;
        self.top = t;
        if self.trace {
            eprintln!("handler found at {pc}");
        }
        Ok(())
    }
}
