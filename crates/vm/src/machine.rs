//! Machine state: the data store, registers, and frame addressing.

use std::io::{self, BufRead, Write};

use pal_common::{signal, Cell, Instruction, Program};

use crate::error::{Fault, RuntimeError, Trap};

/// Capacity of the data store.
pub const STORE_CAPACITY: usize = 10_000;

/// The PAL virtual machine.
///
/// Owns the data store and registers, borrows the program, and reads and
/// writes through injected streams so tests can drive it with in-memory
/// buffers. The data store holds activation records and the operand stack
/// in one flat sequence of tagged cells, addressed from 1.
///
/// Frame layout, relative to the base register `B`:
///
/// ```text
/// B-4   static link          B-2   return address
/// B-3   dynamic link         B-1   handler address (0 = none)
/// B..T  locals and operands
/// ```
pub struct VM<'a, R, W> {
    pub(crate) program: &'a Program,
    /// Data store; index 0 exists but is never used.
    pub(crate) data: Vec<Cell>,
    /// Program counter: address of the next instruction; 0 halts.
    pub(crate) pc: usize,
    /// Base register: first body cell of the current activation record.
    pub(crate) base: usize,
    /// Top-of-stack register: highest live cell.
    pub(crate) top: usize,
    /// The instruction being executed, for diagnostics.
    pub(crate) ir: Option<Instruction>,
    /// The current exception code.
    pub(crate) signal: i64,
    /// Per-instruction trace toggle.
    pub(crate) trace: bool,
    pub(crate) input: R,
    pub(crate) output: W,
}

impl<'a, R: BufRead, W: Write> VM<'a, R, W> {
    /// Create a machine for the given program and streams.
    pub fn with_io(program: &'a Program, input: R, output: W) -> Self {
        Self {
            program,
            data: vec![Cell::Undef; STORE_CAPACITY + 1],
            pc: 0,
            base: 0,
            top: 0,
            ir: None,
            signal: signal::PROGRAM_ABORT,
            trace: false,
            input,
            output,
        }
    }

    /// Enable or disable the per-instruction trace.
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// Base of the activation record `lev` lexical levels outward from the
    /// current one, found by walking static links.
    pub(crate) fn frame_base(&self, lev: i32) -> Result<usize, Trap> {
        let mut b = self.base as i64;
        for _ in 0..lev {
            if !(5..=STORE_CAPACITY as i64).contains(&b) {
                return Err(RuntimeError::HeaderOutOfRange {
                    base: b.max(0) as usize,
                }
                .into());
            }
            match &self.data[b as usize - 4] {
                Cell::Int(link) => b = *link,
                cell => {
                    return Err(RuntimeError::StaticLinkCorrupt { found: cell.tag() }.into());
                }
            }
        }
        if b < 0 {
            return Err(RuntimeError::HeaderOutOfRange { base: 0 }.into());
        }
        Ok(b as usize)
    }

    /// Absolute, validated data-store address of the variable a
    /// level-difference/displacement pair names.
    pub(crate) fn var_addr(&self, instr: &Instruction) -> Result<usize, Trap> {
        let addr = self.frame_base(instr.lev)? as i64 + instr.arg.as_int()?;
        self.check_addr(addr)
    }

    /// Validate an absolute data-store address.
    pub(crate) fn check_addr(&self, addr: i64) -> Result<usize, Trap> {
        if (1..=STORE_CAPACITY as i64).contains(&addr) {
            Ok(addr as usize)
        } else {
            Err(Fault::new(format!("data address {addr} is outside the store")).into())
        }
    }

    /// Read a frame-header cell that must hold an integer. A mistyped
    /// header is fatal: no handler can run on a corrupt frame chain.
    pub(crate) fn header_int(&self, index: usize) -> Result<i64, Trap> {
        match &self.data[index] {
            Cell::Int(v) => Ok(*v),
            cell => Err(RuntimeError::FrameCorrupt { found: cell.tag() }.into()),
        }
    }

    /// Push a cell, growing the live region by one.
    pub(crate) fn push(&mut self, cell: Cell) -> Result<(), Trap> {
        if self.top >= STORE_CAPACITY {
            return Err(RuntimeError::StoreOverflow {
                capacity: STORE_CAPACITY,
            }
            .into());
        }
        self.top += 1;
        self.data[self.top] = cell;
        Ok(())
    }

    /// Require at least `n` live operand cells.
    pub(crate) fn need(&self, n: usize) -> Result<(), Trap> {
        if self.top < n {
            return Err(Fault::new("operand stack underflow").into());
        }
        Ok(())
    }

    /// Read the next whitespace-delimited token from input.
    ///
    /// Returns `Ok(None)` at end of input.
    pub(crate) fn read_token(&mut self) -> Result<Option<String>, Trap> {
        self.skip_whitespace()?;

        let mut token = Vec::new();
        loop {
            let (consumed, done) = {
                let buf = self.input.fill_buf().map_err(stream_error)?;
                if buf.is_empty() {
                    (0, true)
                } else {
                    let n = buf
                        .iter()
                        .take_while(|b| !b.is_ascii_whitespace())
                        .count();
                    token.extend_from_slice(&buf[..n]);
                    (n, n < buf.len())
                }
            };
            self.input.consume(consumed);
            if done {
                break;
            }
        }

        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&token).into_owned()))
        }
    }

    /// True when no further token can be read from input.
    ///
    /// Consumes pending whitespace first, so a trailing newline does not
    /// mask the end of the stream.
    pub(crate) fn input_at_eof(&mut self) -> Result<bool, Trap> {
        self.skip_whitespace()?;
        let buf = self.input.fill_buf().map_err(stream_error)?;
        Ok(buf.is_empty())
    }

    fn skip_whitespace(&mut self) -> Result<(), Trap> {
        loop {
            let (consumed, done) = {
                let buf = self.input.fill_buf().map_err(stream_error)?;
                let n = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
                (n, n == 0 || n < buf.len())
            };
            self.input.consume(consumed);
            if done {
                return Ok(());
            }
        }
    }

    /// Print the registers and live stack to stderr.
    pub(crate) fn dump_stack(&self) {
        eprintln!();
        eprintln!("*** Run-time stack:");
        eprintln!("    Program counter: {}.", self.pc);
        eprintln!("    Base of activation record: {}.", self.base);
        eprintln!("    Current top of stack: {}.", self.top);
        if let Some(ir) = &self.ir {
            eprintln!("    Instruction register: '{ir}'.");
        }
        eprintln!();
        eprintln!("Contents of stack:");
        eprintln!("------------------");
        for i in 1..=self.top {
            eprintln!("  {i}: '{}'", self.data[i]);
        }
        eprintln!();
    }
}

/// Map a stream failure into the fatal tier.
pub(crate) fn stream_error(error: io::Error) -> Trap {
    RuntimeError::Stream {
        message: error.to_string(),
    }
    .into()
}
