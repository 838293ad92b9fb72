//! The 32 sub-operations of the OPR instruction.
//!
//! Operands live at the top of the stack; results replace them. Tag
//! mismatches are recoverable faults that unwind toward a handler.

use std::cmp::Ordering;
use std::io::{BufRead, Write};

use pal_common::{Cell, Instruction};

use crate::error::{Fault, RuntimeError, Trap};
use crate::machine::{stream_error, STORE_CAPACITY, VM};

impl<R: BufRead, W: Write> VM<'_, R, W> {
    /// Dispatch one OPR sub-operation.
    pub(crate) fn exec_opr(&mut self, instr: &Instruction) -> Result<(), Trap> {
        match instr.arg.as_int()? {
            0 => self.op_return_proc(),
            1 => self.op_return_func(),
            2 => self.op_negate(),
            k @ 3..=6 => self.op_arith(k),
            7 => self.op_power(),
            8 => self.op_concat(),
            9 => self.op_odd(),
            k @ 10..=15 => self.op_compare(k),
            16 => self.op_not(),
            17 => self.push(Cell::Bool(true)),
            18 => self.push(Cell::Bool(false)),
            19 => self.op_eof(),
            20 => self.op_write(),
            21 => self.op_writeln(),
            22 => self.op_swap(),
            23 => self.op_dup(),
            24 => self.op_drop(),
            k @ 25..=28 => self.op_convert(k),
            29 => self.op_and(),
            30 => self.op_or(),
            31 => self.op_is_exception(),
            k => Err(Fault::new(format!("unknown operation {k}")).into()),
        }
    }

    /// Tear down the current frame: restore the caller's registers from
    /// the header cells and discard everything above them.
    ///
    /// A dynamic link of 0 restores the synthetic state below the main
    /// frame; together with a return address of 0 that is the path a
    /// return from the main program takes.
    fn op_return_proc(&mut self) -> Result<(), Trap> {
        if !(5..=STORE_CAPACITY).contains(&self.base) {
            return Err(RuntimeError::HeaderOutOfRange { base: self.base }.into());
        }
        self.top = self.base - 5;
        let ret = self.header_int(self.top + 3)?;
        let link = self.header_int(self.top + 2)?;
        if ret < 0 || link < 0 || link > STORE_CAPACITY as i64 {
            return Err(RuntimeError::HeaderOutOfRange {
                base: link.max(0) as usize,
            }
            .into());
        }
        self.pc = ret as usize;
        self.base = link as usize;
        Ok(())
    }

    /// Like a procedure return, but the value on top of the stack survives
    /// as the function result.
    fn op_return_func(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let result = self.data[self.top].clone();
        self.op_return_proc()?;
        self.push(result)
    }

    fn op_negate(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let negated = match &self.data[self.top] {
            Cell::Int(v) => Cell::Int(v.wrapping_neg()),
            Cell::Real(v) => Cell::Real(-v),
            cell => {
                return Err(Fault::new(format!("cannot negate a {} value", cell.tag())).into());
            }
        };
        self.data[self.top] = negated;
        Ok(())
    }

    /// Addition, subtraction, multiplication, and division share one
    /// shape: both operands must carry the same numeric tag, and the
    /// result keeps it.
    fn op_arith(&mut self, k: i64) -> Result<(), Trap> {
        self.need(2)?;
        self.top -= 1;
        let lhs = self.data[self.top].clone();
        let rhs = self.data[self.top + 1].clone();

        let result = match (lhs, rhs) {
            (Cell::Int(a), Cell::Int(b)) => Cell::Int(match k {
                3 => a.wrapping_add(b),
                4 => a.wrapping_sub(b),
                5 => a.wrapping_mul(b),
                _ => {
                    if b == 0 {
                        return Err(Fault::new("divide by integer zero").into());
                    }
                    a.wrapping_div(b)
                }
            }),
            (Cell::Real(a), Cell::Real(b)) => Cell::Real(match k {
                3 => a + b,
                4 => a - b,
                5 => a * b,
                _ => {
                    if b == 0.0 {
                        return Err(Fault::new("divide by real zero").into());
                    }
                    a / b
                }
            }),
            (lhs, rhs) if lhs.tag() != rhs.tag() => {
                return Err(Fault::new("operands must have the same type").into());
            }
            _ => return Err(Fault::new("operands must be integer or real").into()),
        };

        self.data[self.top] = result;
        Ok(())
    }

    /// Exponentiation by repeated multiplication. The exponent must be a
    /// non-negative integer; the base's tag decides the result's tag.
    fn op_power(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        self.top -= 1;

        let exponent = match &self.data[self.top + 1] {
            Cell::Int(e) => *e,
            _ => return Err(Fault::new("exponent must be an integer").into()),
        };
        if exponent < 0 {
            return Err(Fault::new("exponent must not be negative").into());
        }

        let raised = match &self.data[self.top] {
            Cell::Int(base) => {
                let mut acc = 1i64;
                for _ in 0..exponent {
                    acc = acc.wrapping_mul(*base);
                }
                Cell::Int(acc)
            }
            Cell::Real(base) => {
                let mut acc = 1f64;
                for _ in 0..exponent {
                    acc *= base;
                }
                Cell::Real(acc)
            }
            cell => {
                return Err(
                    Fault::new(format!("cannot raise a {} value to a power", cell.tag())).into(),
                );
            }
        };
        self.data[self.top] = raised;
        Ok(())
    }

    fn op_concat(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        let rhs = self.data[self.top].as_str()?;
        let lhs = self.data[self.top - 1].as_str()?;
        let joined = format!("{lhs}{rhs}");
        self.top -= 1;
        self.data[self.top] = Cell::Str(joined);
        Ok(())
    }

    fn op_odd(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let value = self.data[self.top].as_int()?;
        self.data[self.top] = Cell::Bool(value % 2 == 1);
        Ok(())
    }

    /// The six relational operations. Both operands must carry the same
    /// tag; booleans order false before true; strings do not compare.
    fn op_compare(&mut self, k: i64) -> Result<(), Trap> {
        self.need(2)?;
        self.top -= 1;

        let ordering = match (&self.data[self.top], &self.data[self.top + 1]) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Real(a), Cell::Real(b)) => match a.partial_cmp(b) {
                Some(ordering) => ordering,
                None => return Err(Fault::new("real values cannot be ordered").into()),
            },
            (lhs, rhs) if lhs.tag() != rhs.tag() => {
                return Err(Fault::new("operands must have the same type").into());
            }
            _ => {
                return Err(Fault::new("operands must be boolean, integer, or real").into());
            }
        };

        self.data[self.top] = Cell::Bool(relation_holds(k, ordering));
        Ok(())
    }

    fn op_not(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let value = self.data[self.top].as_bool()?;
        self.data[self.top] = Cell::Bool(!value);
        Ok(())
    }

    fn op_eof(&mut self) -> Result<(), Trap> {
        let at_eof = self.input_at_eof()?;
        self.push(Cell::Bool(at_eof))
    }

    /// Write the top of stack to output, without a newline, and pop it.
    /// Booleans and undefined cells are not writable.
    fn op_write(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        match &self.data[self.top] {
            Cell::Int(v) => write!(self.output, "{v}").map_err(stream_error)?,
            Cell::Real(v) => write!(self.output, "{v:?}").map_err(stream_error)?,
            Cell::Str(s) => write!(self.output, "{s}").map_err(stream_error)?,
            cell => {
                return Err(Fault::new(format!("cannot write a {} value", cell.tag())).into());
            }
        }
        self.top -= 1;
        Ok(())
    }

    fn op_writeln(&mut self) -> Result<(), Trap> {
        writeln!(self.output).map_err(stream_error)
    }

    fn op_swap(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        self.data.swap(self.top, self.top - 1);
        Ok(())
    }

    fn op_dup(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let copy = self.data[self.top].clone();
        self.push(copy)
    }

    fn op_drop(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        self.top -= 1;
        Ok(())
    }

    /// The four conversions: int↔real retag the cell, int/real→string
    /// render the value.
    fn op_convert(&mut self, k: i64) -> Result<(), Trap> {
        self.need(1)?;
        let converted = match k {
            25 => Cell::Real(self.data[self.top].as_int()? as f64),
            26 => Cell::Int(self.data[self.top].as_real()? as i64),
            27 => Cell::Str(self.data[self.top].as_int()?.to_string()),
            _ => Cell::Str(format!("{:?}", self.data[self.top].as_real()?)),
        };
        self.data[self.top] = converted;
        Ok(())
    }

    fn op_and(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        let rhs = self.data[self.top].as_bool()?;
        let lhs = self.data[self.top - 1].as_bool()?;
        self.top -= 1;
        self.data[self.top] = Cell::Bool(lhs && rhs);
        Ok(())
    }

    fn op_or(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        let rhs = self.data[self.top].as_bool()?;
        let lhs = self.data[self.top - 1].as_bool()?;
        self.top -= 1;
        self.data[self.top] = Cell::Bool(lhs || rhs);
        Ok(())
    }

    /// Pop an exception code, push whether it matches the current one.
    fn op_is_exception(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let code = self.data[self.top].as_int()?;
        self.data[self.top] = Cell::Bool(code == self.signal);
        Ok(())
    }
}

/// Whether relational operation `k` holds for the given ordering.
fn relation_holds(k: i64, ordering: Ordering) -> bool {
    match k {
        10 => ordering == Ordering::Equal,
        11 => ordering != Ordering::Equal,
        12 => ordering == Ordering::Less,
        13 => ordering != Ordering::Less,
        14 => ordering == Ordering::Greater,
        _ => ordering != Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_over_less() {
        assert!(!relation_holds(10, Ordering::Less));
        assert!(relation_holds(11, Ordering::Less));
        assert!(relation_holds(12, Ordering::Less));
        assert!(!relation_holds(13, Ordering::Less));
        assert!(!relation_holds(14, Ordering::Less));
        assert!(relation_holds(15, Ordering::Less));
    }

    #[test]
    fn relations_over_equal() {
        assert!(relation_holds(10, Ordering::Equal));
        assert!(!relation_holds(11, Ordering::Equal));
        assert!(!relation_holds(12, Ordering::Equal));
        assert!(relation_holds(13, Ordering::Equal));
        assert!(!relation_holds(14, Ordering::Equal));
        assert!(relation_holds(15, Ordering::Equal));
    }

    #[test]
    fn relations_over_greater() {
        assert!(!relation_holds(10, Ordering::Greater));
        assert!(relation_holds(11, Ordering::Greater));
        assert!(!relation_holds(12, Ordering::Greater));
        assert!(relation_holds(13, Ordering::Greater));
        assert!(relation_holds(14, Ordering::Greater));
        assert!(!relation_holds(15, Ordering::Greater));
    }
}
