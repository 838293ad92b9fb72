//! The fetch-decode-execute loop and per-opcode semantics.

use std::io::{BufRead, Write};

use pal_common::{signal, Cell, Instruction, Opcode};

use crate::error::{Fault, RuntimeError, Trap};
use crate::machine::{STORE_CAPACITY, VM};

impl<R: BufRead, W: Write> VM<'_, R, W> {
    /// Run the program until `JMP 0 0` or a fatal error.
    ///
    /// Sets up the synthetic main activation record (base 5, four zeroed
    /// header cells), then dispatches instructions until the program
    /// counter reaches 0.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        self.top = 4;
        self.base = 5;
        self.pc = 1;
        for i in 1..=4 {
            self.data[i] = Cell::Int(0);
        }

        while self.pc != 0 {
            let instr = match self.program.fetch(self.pc) {
                Some(instr) => instr.clone(),
                None => return Err(RuntimeError::CodeOutOfRange { pc: self.pc }),
            };
            if self.trace {
                eprintln!("instruction at {}: {}", self.pc, instr);
            }
            self.ir = Some(instr.clone());
            self.pc += 1;

            if let Err(trap) = self.step(&instr) {
                self.trap(trap)?;
            }
            if self.trace {
                self.dump_stack();
            }
        }
        Ok(())
    }

    /// Dispatch one instruction.
    fn step(&mut self, instr: &Instruction) -> Result<(), Trap> {
        match instr.op {
            Opcode::Mst => self.exec_mst(instr),
            Opcode::Cal => self.exec_cal(instr),
            Opcode::Inc => self.exec_inc(instr),
            Opcode::Jif => self.exec_jif(instr),
            Opcode::Jmp => self.branch(instr.arg.as_int()?),
            Opcode::Lci => self.push(Cell::Int(instr.arg.as_int()?)),
            Opcode::Lcr => self.push(Cell::Real(instr.arg.as_real()?)),
            Opcode::Lcs => self.push(Cell::Str(instr.arg.as_str()?.to_string())),
            Opcode::Lda => self.exec_lda(instr),
            Opcode::Ldi => self.exec_ldi(),
            Opcode::Ldv => self.exec_ldv(instr),
            Opcode::Ldu => self.push(Cell::Undef),
            Opcode::Opr => self.exec_opr(instr),
            Opcode::Rdi => self.exec_read(instr, true),
            Opcode::Rdr => self.exec_read(instr, false),
            Opcode::Sti => self.exec_sti(),
            Opcode::Sto => self.exec_sto(instr),
            Opcode::Sig => self.exec_sig(instr),
            Opcode::Reh => self.exec_reh(instr),
            Opcode::Dbg => self.exec_dbg(instr),
        }
    }

    /// Resolve a trap: recoverable faults dump diagnostics and unwind,
    /// fatal errors dump diagnostics and terminate.
    fn trap(&mut self, trap: Trap) -> Result<(), RuntimeError> {
        match trap {
            Trap::Fault(Fault { message, signal }) => {
                eprintln!("*** Run-time error: {message}");
                eprintln!("    At address: {}.", self.pc.saturating_sub(1));
                self.dump_stack();
                self.signal = signal;
                self.unwind()
            }
            Trap::Fatal(error) => {
                eprintln!("*** FATAL run-time error: {error}");
                eprintln!("    At address: {}.", self.pc.saturating_sub(1));
                self.dump_stack();
                Err(error)
            }
        }
    }

    /// Validate a jump target and assign the program counter.
    ///
    /// Target 0 is the terminator; anything past the last instruction is a
    /// recoverable error.
    fn branch(&mut self, target: i64) -> Result<(), Trap> {
        if !(0..=self.program.last_instruction() as i64).contains(&target) {
            return Err(Fault::new("attempt to jump outside the code").into());
        }
        self.pc = target as usize;
        Ok(())
    }

    /// MST: push the four-cell frame header — static link, dynamic link,
    /// and zeroed return-address and handler slots.
    fn exec_mst(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let link = self.frame_base(instr.lev)?;
        self.push(Cell::Int(link as i64))?;
        self.push(Cell::Int(self.base as i64))?;
        self.push(Cell::Int(0))?;
        self.push(Cell::Int(0))?;
        Ok(())
    }

    /// CAL: the level field carries the parameter count; the new base sits
    /// below the parameters already pushed.
    fn exec_cal(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let params = instr.lev as i64;
        let target = instr.arg.as_int()?;
        if params < 0 {
            return Err(Fault::new("negative parameter count").into());
        }

        let new_base = self.top as i64 - params + 1;
        if new_base < 5 {
            return Err(Fault::new("call frame below the stack mark").into());
        }
        self.base = new_base as usize;
        self.data[self.base - 2] = Cell::Int(self.pc as i64);
        self.branch(target)
    }

    /// INC: expose (and clear) new cells above the top of stack. Negative
    /// counts release cells.
    fn exec_inc(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let count = instr.arg.as_int()?;
        let new_top = self.top as i64 + count;
        if new_top > STORE_CAPACITY as i64 {
            return Err(RuntimeError::StoreOverflow {
                capacity: STORE_CAPACITY,
            }
            .into());
        }
        if new_top < 0 {
            return Err(Fault::new("top of stack moved below the store").into());
        }
        for i in self.top + 1..=new_top as usize {
            self.data[i] = Cell::Undef;
        }
        self.top = new_top as usize;
        Ok(())
    }

    /// JIF: branch when the top of stack holds false. The boolean is left
    /// on the stack; the compiler emits an explicit drop when needed.
    fn exec_jif(&mut self, instr: &Instruction) -> Result<(), Trap> {
        self.need(1)?;
        let flag = self.data[self.top].as_bool()?;
        if !flag {
            self.branch(instr.arg.as_int()?)?;
        }
        Ok(())
    }

    /// LDA: push the absolute address of a variable.
    fn exec_lda(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let addr = self.frame_base(instr.lev)? as i64 + instr.arg.as_int()?;
        self.push(Cell::Int(addr))
    }

    /// LDI: replace the address on top of the stack with the cell it names.
    fn exec_ldi(&mut self) -> Result<(), Trap> {
        self.need(1)?;
        let addr = self.data[self.top].as_int()?;
        let index = self.check_addr(addr)?;
        self.data[self.top] = self.data[index].clone();
        Ok(())
    }

    /// LDV: push a full copy of a variable's cell, tag included.
    fn exec_ldv(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let index = self.var_addr(instr)?;
        let cell = self.data[index].clone();
        self.push(cell)
    }

    /// RDI / RDR: read one token from input into a variable, retagging it.
    fn exec_read(&mut self, instr: &Instruction, want_int: bool) -> Result<(), Trap> {
        let index = self.var_addr(instr)?;

        let Some(token) = self.read_token()? else {
            return Err(
                Fault::with_signal("attempt to read past end of input", signal::END_ERROR).into(),
            );
        };

        let cell = if want_int {
            match token.parse::<i64>() {
                Ok(value) => Cell::Int(value),
                Err(_) => {
                    return Err(Fault::with_signal(
                        format!("input '{token}' is not an integer"),
                        signal::INPUT_ERROR,
                    )
                    .into());
                }
            }
        } else {
            match token.parse::<f64>() {
                Ok(value) => Cell::Real(value),
                Err(_) => {
                    return Err(Fault::with_signal(
                        format!("input '{token}' is not a real"),
                        signal::INPUT_ERROR,
                    )
                    .into());
                }
            }
        };

        self.data[index] = cell;
        Ok(())
    }

    /// STI: store the next-to-top value through the address on top.
    fn exec_sti(&mut self) -> Result<(), Trap> {
        self.need(2)?;
        let addr = self.data[self.top].as_int()?;
        let index = self.check_addr(addr)?;
        self.data[index] = self.data[self.top - 1].clone();
        self.top -= 2;
        Ok(())
    }

    /// STO: store the top of stack into a variable. The target keeps its
    /// type: storing a differently-tagged value into a defined cell is an
    /// error, while a store into undefined storage defines it.
    fn exec_sto(&mut self, instr: &Instruction) -> Result<(), Trap> {
        self.need(1)?;
        let index = self.var_addr(instr)?;
        let value = self.data[self.top].clone();

        let target = &self.data[index];
        if !target.is_undef() && target.tag() != value.tag() {
            return Err(Fault::new(format!(
                "cannot store {} into a {} variable",
                value.tag(),
                target.tag()
            ))
            .into());
        }

        self.data[index] = value;
        self.top -= 1;
        Ok(())
    }

    /// SIG: a nonzero code becomes the current exception and starts
    /// unwinding; code 0 leaves the current exception in place and does
    /// not unwind.
    fn exec_sig(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let code = instr.arg.as_int()?;
        if code != 0 {
            self.signal = code;
            self.unwind().map_err(Trap::Fatal)?;
        }
        Ok(())
    }

    /// REH: register (or with address 0, deregister) this frame's handler.
    fn exec_reh(&mut self, instr: &Instruction) -> Result<(), Trap> {
        let addr = instr.arg.as_int()?;
        if !(5..=STORE_CAPACITY).contains(&self.base) {
            return Err(RuntimeError::HeaderOutOfRange { base: self.base }.into());
        }
        self.data[self.base - 1] = Cell::Int(addr);
        Ok(())
    }

    /// DBG: operand 1 turns the trace on, anything else turns it off.
    fn exec_dbg(&mut self, instr: &Instruction) -> Result<(), Trap> {
        self.trace = instr.arg.as_int()? == 1;
        Ok(())
    }
}
