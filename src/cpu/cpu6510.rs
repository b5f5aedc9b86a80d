// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Per-cycle 6502/6510 core. `Cpu6510::clock` advances the machine by exactly
//! one master cycle, executing the `MicroOp`(s) scheduled for that cycle by
//! the static program returned from `cpu::uops::decode_opcode`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cpu::interrupt_line::{InterruptLine, Vector};
use crate::cpu::uops::{decode_opcode, load_program, MicroOp, MicroOpPair, ProgramId};
use crate::mem::Addressable;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Flag {
    Carry = 1 << 0,
    Zero = 1 << 1,
    IntDisable = 1 << 2,
    Decimal = 1 << 3,
    Break = 1 << 4,
    Reserved = 1 << 5,
    Overflow = 1 << 6,
    Negative = 1 << 7,
}

#[derive(Debug)]
pub enum CpuError {
    Jammed(u8),
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CpuError::Jammed(opcode) => write!(f, "cpu jammed on opcode {:#04x}", opcode),
        }
    }
}

/// 6510 register file plus the micro-op execution engine. The bus is owned
/// elsewhere; `mem` is the shared addressable view the CPU reads/writes
/// through (RAM/ROM/IO already resolved by bank switching).
pub struct Cpu6510 {
    mem: Rc<RefCell<dyn Addressable>>,
    irq_line: Rc<RefCell<InterruptLine>>,
    nmi_line: Rc<RefCell<InterruptLine>>,

    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    p: u8,

    program: &'static [MicroOpPair],
    step: usize,
    seq: u8,

    opcode: u8,
    data: u8,
    addr_lo: u8,
    addr_hi: u8,
    ptr_lo: u8,
    ptr_hi: u8,
    page_crossed: bool,
    vector: u16,

    nmi_prev_asserted: bool,
    nmi_latched: bool,

    rdy: bool,
    jammed_opcode: Option<u8>,
    fetched_instruction: bool,
    last_fetch_pc: u16,
}

impl Cpu6510 {
    pub fn new(
        mem: Rc<RefCell<dyn Addressable>>,
        irq_line: Rc<RefCell<InterruptLine>>,
        nmi_line: Rc<RefCell<InterruptLine>>,
    ) -> Cpu6510 {
        Cpu6510 {
            mem,
            irq_line,
            nmi_line,
            a: 0,
            x: 0,
            y: 0,
            sp: 0xff,
            pc: 0,
            p: 0x24,
            program: load_program(ProgramId::Start),
            step: 0,
            seq: 0,
            opcode: 0,
            data: 0,
            addr_lo: 0,
            addr_hi: 0,
            ptr_lo: 0,
            ptr_hi: 0,
            page_crossed: false,
            vector: Vector::Reset as u16,
            nmi_prev_asserted: false,
            nmi_latched: false,
            rdy: true,
            jammed_opcode: None,
            fetched_instruction: false,
            last_fetch_pc: 0,
        }
    }

    // -- Public accessors

    pub fn a(&self) -> u8 {
        self.a
    }
    pub fn x(&self) -> u8 {
        self.x
    }
    pub fn y(&self) -> u8 {
        self.y
    }
    pub fn sp(&self) -> u8 {
        self.sp
    }
    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn p(&self) -> u8 {
        self.p
    }
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn is_jammed(&self) -> Option<u8> {
        self.jammed_opcode
    }

    /// True for exactly the cycle that fetched a fresh opcode byte (not an
    /// interrupt-service entry), i.e. the instant `pc()` is a debugger's
    /// instruction boundary. Used to gate breakpoint checks.
    pub fn just_fetched_instruction(&self) -> bool {
        self.fetched_instruction
    }

    /// The address of the instruction fetched on the cycle where
    /// `just_fetched_instruction()` is true; stable for the rest of that
    /// instruction's execution.
    pub fn last_fetch_pc(&self) -> u16 {
        self.last_fetch_pc
    }

    /// Asserted by the bus driver (VIC bad-line DMA steal) to hold the CPU
    /// off the bus for one master cycle; the CPU's own state does not
    /// advance while RDY is low.
    pub fn set_rdy(&mut self, rdy: bool) {
        self.rdy = rdy;
    }

    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xfd;
        self.p = 0x24;
        self.program = load_program(ProgramId::Reset);
        self.step = 0;
        self.seq = 0;
        self.page_crossed = false;
        self.nmi_prev_asserted = false;
        self.nmi_latched = false;
        self.jammed_opcode = None;
        self.irq_line.borrow_mut().reset();
        self.nmi_line.borrow_mut().reset();
    }

    /// Advance the CPU by one master cycle.
    pub fn clock(&mut self) {
        if self.jammed_opcode.is_some() {
            return;
        }
        let nmi_now = self.nmi_line.borrow().is_asserted();
        if nmi_now && !self.nmi_prev_asserted {
            self.nmi_latched = true;
        }
        self.nmi_prev_asserted = nmi_now;

        if !self.rdy {
            return;
        }

        self.fetched_instruction = false;
        let old_i = self.get_flag(Flag::IntDisable);
        let MicroOpPair(op1, op2) = self.program[self.step];
        let mut fetched = self.exec(op1, old_i);
        if let Some(op2) = op2 {
            fetched |= self.exec(op2, old_i);
        }
        if !fetched {
            self.step += 1;
        }
    }

    // -- Flags

    #[inline]
    fn get_flag(&self, flag: Flag) -> bool {
        self.p & (flag as u8) != 0
    }

    #[inline]
    fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    #[inline]
    fn update_zn(&mut self, value: u8) {
        self.set_flag(Flag::Zero, value == 0);
        self.set_flag(Flag::Negative, value & 0x80 != 0);
    }

    // -- Bus helpers

    #[inline]
    fn read(&self, addr: u16) -> u8 {
        self.mem.borrow().read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u8) {
        self.mem.borrow_mut().write(addr, value);
    }

    #[inline]
    fn addr(&self) -> u16 {
        (self.addr_hi as u16) << 8 | self.addr_lo as u16
    }

    fn push(&mut self, value: u8) {
        self.write(0x100 + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(0x100 + self.sp as u16)
    }

    // -- Micro-op execution. Returns true if a FetchOpcode ran this cycle
    // (program/step were already reloaded and must not be incremented).

    fn exec(&mut self, op: MicroOp, old_i: bool) -> bool {
        match op {
            MicroOp::FetchOpcode => {
                self.on_fetch_opcode(old_i);
                return true;
            }
            MicroOp::FetchOpcodeDiscard => {
                let _ = self.read(self.pc);
            }
            MicroOp::FetchOperand => {
                self.data = self.read(self.pc);
                self.addr_lo = self.data;
                self.addr_hi = 0;
                self.pc = self.pc.wrapping_add(1);
            }
            MicroOp::FetchAdl => {
                self.addr_lo = self.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            MicroOp::FetchAdh => {
                self.addr_hi = self.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            MicroOp::IncrementAdlX => {
                let (lo, carry) = self.addr_lo.overflowing_add(self.x);
                self.addr_lo = lo;
                self.page_crossed = carry;
            }
            MicroOp::IncrementAdlY => {
                let (lo, carry) = self.addr_lo.overflowing_add(self.y);
                self.addr_lo = lo;
                self.page_crossed = carry;
            }
            MicroOp::IndirectFetchAdl => {
                self.ptr_lo = self.addr_lo;
                self.ptr_hi = self.addr_hi;
                self.addr_lo = self.read((self.ptr_hi as u16) << 8 | self.ptr_lo as u16);
            }
            MicroOp::IndirectFetchAdh => {
                let hi_ptr = (self.ptr_hi as u16) << 8 | self.ptr_lo.wrapping_add(1) as u16;
                self.addr_hi = self.read(hi_ptr);
            }
            MicroOp::ReadData => {
                self.data = self.read(self.addr());
            }
            MicroOp::ReadDataOrFixAdh => {
                if self.page_crossed {
                    self.addr_hi = self.addr_hi.wrapping_add(1);
                }
                self.data = self.read(self.addr());
            }
            MicroOp::WriteData => {
                let addr = self.addr();
                self.write(addr, self.data);
            }
            // Move
            MicroOp::OpLDA => {
                self.a = self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpLDX => {
                self.x = self.data;
                self.update_zn(self.x);
            }
            MicroOp::OpLDY => {
                self.y = self.data;
                self.update_zn(self.y);
            }
            MicroOp::OpSTA => {
                let addr = self.addr();
                self.write(addr, self.a);
            }
            MicroOp::OpSTX => {
                let addr = self.addr();
                self.write(addr, self.x);
            }
            MicroOp::OpSTY => {
                let addr = self.addr();
                self.write(addr, self.y);
            }
            MicroOp::OpTAX => {
                self.x = self.a;
                self.update_zn(self.x);
            }
            MicroOp::OpTXA => {
                self.a = self.x;
                self.update_zn(self.a);
            }
            MicroOp::OpTAY => {
                self.y = self.a;
                self.update_zn(self.y);
            }
            MicroOp::OpTYA => {
                self.a = self.y;
                self.update_zn(self.a);
            }
            MicroOp::OpTSX => {
                self.x = self.sp;
                self.update_zn(self.x);
            }
            MicroOp::OpTXS => {
                self.sp = self.x;
            }
            MicroOp::OpPLA => {
                self.a = self.pop();
                self.update_zn(self.a);
            }
            MicroOp::OpPLP => {
                let value = self.pop();
                self.p = (value | 0x20) & !0x10;
            }
            MicroOp::OpPHA => {
                self.push(self.a);
            }
            MicroOp::OpPHP => {
                self.push(self.p | 0x30);
            }
            // Logical/Arithmetic
            MicroOp::OpAND => {
                self.a &= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpEOR => {
                self.a ^= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpORA => {
                self.a |= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpADC => self.adc(self.data),
            MicroOp::OpSBC => self.sbc(self.data),
            MicroOp::OpBIT => {
                let result = self.a & self.data;
                self.set_flag(Flag::Zero, result == 0);
                self.set_flag(Flag::Negative, self.data & 0x80 != 0);
                self.set_flag(Flag::Overflow, self.data & 0x40 != 0);
            }
            MicroOp::OpCMP => self.compare(self.a, self.data),
            MicroOp::OpCPX => self.compare(self.x, self.data),
            MicroOp::OpCPY => self.compare(self.y, self.data),
            MicroOp::OpDEC => {
                self.data = self.data.wrapping_sub(1);
                self.update_zn(self.data);
            }
            MicroOp::OpDEX => {
                self.x = self.x.wrapping_sub(1);
                self.update_zn(self.x);
            }
            MicroOp::OpDEY => {
                self.y = self.y.wrapping_sub(1);
                self.update_zn(self.y);
            }
            MicroOp::OpINC => {
                self.data = self.data.wrapping_add(1);
                self.update_zn(self.data);
            }
            MicroOp::OpINX => {
                self.x = self.x.wrapping_add(1);
                self.update_zn(self.x);
            }
            MicroOp::OpINY => {
                self.y = self.y.wrapping_add(1);
                self.update_zn(self.y);
            }
            MicroOp::OpASL => {
                self.data = self.asl(self.data);
            }
            MicroOp::OpASLImplied => {
                self.a = self.asl(self.a);
            }
            MicroOp::OpLSR => {
                self.data = self.lsr(self.data);
            }
            MicroOp::OpLSRImplied => {
                self.a = self.lsr(self.a);
            }
            MicroOp::OpROL => {
                self.data = self.rol(self.data);
            }
            MicroOp::OpROLImplied => {
                self.a = self.rol(self.a);
            }
            MicroOp::OpROR => {
                self.data = self.ror(self.data);
            }
            MicroOp::OpRORImplied => {
                self.a = self.ror(self.a);
            }
            // Jump/Flag
            MicroOp::OpBCC => self.branch(!self.get_flag(Flag::Carry)),
            MicroOp::OpBCS => self.branch(self.get_flag(Flag::Carry)),
            MicroOp::OpBEQ => self.branch(self.get_flag(Flag::Zero)),
            MicroOp::OpBNE => self.branch(!self.get_flag(Flag::Zero)),
            MicroOp::OpBMI => self.branch(self.get_flag(Flag::Negative)),
            MicroOp::OpBPL => self.branch(!self.get_flag(Flag::Negative)),
            MicroOp::OpBVC => self.branch(!self.get_flag(Flag::Overflow)),
            MicroOp::OpBVS => self.branch(self.get_flag(Flag::Overflow)),
            MicroOp::OpJMP => {
                self.pc = self.addr();
            }
            MicroOp::OpJSR => self.jsr(),
            MicroOp::OpRTS => self.rts(),
            MicroOp::OpBRK => self.brk(),
            MicroOp::OpRTI => self.rti(),
            MicroOp::OpCLC => self.set_flag(Flag::Carry, false),
            MicroOp::OpCLD => self.set_flag(Flag::Decimal, false),
            MicroOp::OpCLI => self.set_flag(Flag::IntDisable, false),
            MicroOp::OpCLV => self.set_flag(Flag::Overflow, false),
            MicroOp::OpSEC => self.set_flag(Flag::Carry, true),
            MicroOp::OpSED => self.set_flag(Flag::Decimal, true),
            MicroOp::OpSEI => self.set_flag(Flag::IntDisable, true),
            MicroOp::OpNOP => {}
            // Undocumented
            MicroOp::OpANE => {
                self.a = (self.a | 0xee) & self.x & self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpANX => {
                self.a = (self.a | 0xee) & self.data;
                self.x = self.a;
                self.update_zn(self.a);
            }
            MicroOp::OpALR => {
                self.a &= self.data;
                self.a = self.lsr(self.a);
            }
            MicroOp::OpAXS => {
                let base = self.a & self.x;
                let (result, borrow) = base.overflowing_sub(self.data);
                self.x = result;
                self.set_flag(Flag::Carry, !borrow);
                self.update_zn(self.x);
            }
            MicroOp::OpLAX => {
                self.a = self.data;
                self.x = self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpSRE => {
                self.data = self.lsr(self.data);
                self.a ^= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpSLO => {
                self.data = self.asl(self.data);
                self.a |= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpRLA => {
                self.data = self.rol(self.data);
                self.a &= self.data;
                self.update_zn(self.a);
            }
            MicroOp::OpRRA => {
                self.data = self.ror(self.data);
                self.adc(self.data);
            }
            MicroOp::OpDCP => {
                self.data = self.data.wrapping_sub(1);
                self.compare(self.a, self.data);
            }
            MicroOp::OpISC => {
                self.data = self.data.wrapping_add(1);
                self.sbc(self.data);
            }
            MicroOp::OpSAX => {
                self.data = self.a & self.x;
            }
            // Interrupts / halt
            MicroOp::OpIRQ => self.service_interrupt(false, false),
            MicroOp::OpNMI => self.service_interrupt(true, false),
            MicroOp::OpRST => self.service_reset(),
            MicroOp::OpJAM => {
                self.jammed_opcode = Some(self.opcode);
            }
        }
        false
    }

    fn on_fetch_opcode(&mut self, old_i: bool) {
        if self.nmi_latched {
            self.nmi_latched = false;
            self.program = load_program(ProgramId::Nmi);
            self.step = 1;
            self.seq = 0;
            return;
        }
        if self.irq_line.borrow().is_asserted() && !old_i {
            self.program = load_program(ProgramId::Irq);
            self.step = 1;
            self.seq = 0;
            return;
        }
        self.last_fetch_pc = self.pc;
        self.opcode = self.read(self.pc);
        self.fetched_instruction = true;
        self.pc = self.pc.wrapping_add(1);
        self.addr_hi = 0;
        self.page_crossed = false;
        self.seq = 0;
        self.program = decode_opcode(self.opcode);
        self.step = 1;
    }

    // -- Multi-cycle instruction bodies (own internal bus access, driven by
    // the shared `seq` counter which resets whenever a new opcode is fetched).

    fn jsr(&mut self) {
        match self.seq {
            0 => self.push((self.pc >> 8) as u8),
            1 => self.push((self.pc & 0xff) as u8),
            _ => {
                self.addr_hi = self.read(self.pc);
                self.pc = self.addr();
            }
        }
        self.seq += 1;
    }

    fn rts(&mut self) {
        match self.seq {
            0 => self.addr_lo = self.pop(),
            1 => self.addr_hi = self.pop(),
            _ => self.pc = self.addr().wrapping_add(1),
        }
        self.seq += 1;
    }

    fn rti(&mut self) {
        match self.seq {
            0 => {
                let value = self.pop();
                self.p = (value | 0x20) & !0x10;
            }
            1 => self.addr_lo = self.pop(),
            _ => {
                self.addr_hi = self.pop();
                self.pc = self.addr();
            }
        }
        self.seq += 1;
    }

    fn brk(&mut self) {
        // BRK's signature byte was already consumed by FetchOperand in the
        // opcode's program; pc already points past it.
        self.service_interrupt(false, true);
    }

    fn service_interrupt(&mut self, is_nmi: bool, is_brk: bool) {
        match self.seq {
            0 => self.push((self.pc >> 8) as u8),
            1 => self.push((self.pc & 0xff) as u8),
            2 => {
                let break_bit: u8 = if is_brk { 0x10 } else { 0x00 };
                self.push(self.p | 0x20 | break_bit);
                self.set_flag(Flag::IntDisable, true);
            }
            3 => {
                // NMI can hijack a pending BRK/IRQ sequence at this point.
                self.vector = if is_nmi || self.nmi_latched {
                    self.nmi_latched = false;
                    Vector::Nmi as u16
                } else {
                    Vector::Irq as u16
                };
                self.addr_lo = self.read(self.vector);
            }
            _ => {
                self.addr_hi = self.read(self.vector + 1);
                self.pc = self.addr();
            }
        }
        self.seq += 1;
    }

    fn service_reset(&mut self) {
        match self.seq {
            0 | 1 => {
                // Dummy stack activity; RESET keeps R/W high so nothing is
                // actually written, but SP still walks down three slots.
                self.sp = self.sp.wrapping_sub(1);
            }
            2 => self.addr_lo = self.read(Vector::Reset as u16),
            _ => {
                self.addr_hi = self.read(Vector::Reset as u16 + 1);
                self.pc = self.addr();
                self.set_flag(Flag::IntDisable, true);
            }
        }
        self.seq += 1;
    }

    fn branch(&mut self, taken: bool) {
        if taken {
            let old_pc = self.pc;
            let new_pc = old_pc.wrapping_add(self.data as i8 as i16 as u16);
            self.pc = new_pc;
            self.page_crossed = (old_pc & 0xff00) != (new_pc & 0xff00);
        }
    }

    // -- Shift/rotate primitives shared by read-modify-write and illegal ops

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(Flag::Carry, value & 0x80 != 0);
        let result = value << 1;
        self.update_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(Flag::Carry, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = if self.get_flag(Flag::Carry) { 1 } else { 0 };
        self.set_flag(Flag::Carry, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.get_flag(Flag::Carry) { 0x80 } else { 0 };
        self.set_flag(Flag::Carry, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.update_zn(result);
        result
    }

    fn compare(&mut self, reg: u8, value: u8) {
        let result = reg.wrapping_sub(value);
        self.set_flag(Flag::Carry, reg >= value);
        self.update_zn(result);
    }

    // -- Decimal-aware ADC/SBC (NMOS 6502 semantics; flags for SBC are
    // always derived from the binary result per 6502.org's decimal mode doc)

    fn adc(&mut self, operand: u8) {
        let carry_in = if self.get_flag(Flag::Carry) { 1u16 } else { 0 };
        let a = self.a;
        if self.get_flag(Flag::Decimal) {
            let mut al = (a & 0x0f) as u16 + (operand & 0x0f) as u16 + carry_in;
            if al >= 0x0a {
                al = ((al + 0x06) & 0x0f) + 0x10;
            }
            let mut sum = (a & 0xf0) as u16 + (operand & 0xf0) as u16 + al;
            self.set_flag(Flag::Negative, sum & 0x80 != 0);
            self.set_flag(
                Flag::Overflow,
                (!((a as u16) ^ (operand as u16)) & ((a as u16) ^ sum) & 0x80) != 0,
            );
            if sum >= 0xa0 {
                sum += 0x60;
            }
            self.set_flag(Flag::Carry, sum >= 0x100);
            let bin_sum = a as u16 + operand as u16 + carry_in;
            self.set_flag(Flag::Zero, (bin_sum as u8) == 0);
            self.a = sum as u8;
        } else {
            let sum = a as u16 + operand as u16 + carry_in;
            let result = sum as u8;
            self.set_flag(Flag::Carry, sum > 0xff);
            self.set_flag(
                Flag::Overflow,
                (!((a as u16) ^ (operand as u16)) & ((a as u16) ^ sum) & 0x80) != 0,
            );
            self.a = result;
            self.update_zn(result);
        }
    }

    fn sbc(&mut self, operand: u8) {
        let carry_in = if self.get_flag(Flag::Carry) { 1i16 } else { 0 };
        let a = self.a;
        let diff = a as i16 - operand as i16 - (1 - carry_in);
        let result_bin = diff as u8;
        self.set_flag(Flag::Carry, diff >= 0);
        self.set_flag(
            Flag::Overflow,
            (((a as i16) ^ (operand as i16)) & ((a as i16) ^ diff) & 0x80) != 0,
        );
        self.update_zn(result_bin);
        if self.get_flag(Flag::Decimal) {
            let mut al = (a & 0x0f) as i16 - (operand & 0x0f) as i16 - (1 - carry_in);
            if al < 0 {
                al = ((al - 0x06) & 0x0f) - 0x10;
            }
            let mut sum = (a & 0xf0) as i16 - (operand & 0xf0) as i16 + al;
            if sum < 0 {
                sum -= 0x60;
            }
            self.a = sum as u8;
        } else {
            self.a = result_bin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::Ram;

    fn make_cpu(program: &[u8]) -> Cpu6510 {
        let ram = Rc::new(RefCell::new(Ram::new(0x10000)));
        for (i, b) in program.iter().enumerate() {
            ram.borrow_mut().write(0x0200 + i as u16, *b);
        }
        let irq = Rc::new(RefCell::new(InterruptLine::new()));
        let nmi = Rc::new(RefCell::new(InterruptLine::new()));
        let mut cpu = Cpu6510::new(ram, irq, nmi);
        cpu.pc = 0x0200;
        cpu.program = load_program(ProgramId::Start);
        cpu.step = 0;
        cpu
    }

    fn run(cpu: &mut Cpu6510, cycles: usize) {
        for _ in 0..cycles {
            cpu.clock();
        }
    }

    #[test]
    fn lda_immediate_sets_accumulator_and_flags() {
        let mut cpu = make_cpu(&[0xa9, 0x80]);
        run(&mut cpu, 2);
        assert_eq!(cpu.a(), 0x80);
        assert!(cpu.get_flag(Flag::Negative));
        assert!(!cpu.get_flag(Flag::Zero));
    }

    #[test]
    fn adc_sets_carry_and_overflow_on_signed_wrap() {
        let mut cpu = make_cpu(&[0xa9, 0x7f, 0x69, 0x01]);
        run(&mut cpu, 4);
        assert_eq!(cpu.a(), 0x80);
        assert!(cpu.get_flag(Flag::Overflow));
        assert!(!cpu.get_flag(Flag::Carry));
    }

    #[test]
    fn jsr_then_rts_round_trips_pc() {
        let mut cpu = make_cpu(&[0x20, 0x09, 0x02, 0, 0, 0, 0, 0, 0, 0x60]);
        run(&mut cpu, 6);
        assert_eq!(cpu.pc(), 0x0209);
        run(&mut cpu, 6);
        assert_eq!(cpu.pc(), 0x0203);
    }

    #[test]
    fn branch_not_taken_falls_through() {
        let mut cpu = make_cpu(&[0xa9, 0x00, 0xd0, 0x10]);
        run(&mut cpu, 2);
        let start_step_cycles = 4;
        run(&mut cpu, start_step_cycles);
        assert_eq!(cpu.pc(), 0x0204);
    }

    #[test]
    fn jam_halts_cpu() {
        let mut cpu = make_cpu(&[0x02]);
        run(&mut cpu, 2);
        assert_eq!(cpu.is_jammed(), Some(0x02));
        let pc_before = cpu.pc();
        run(&mut cpu, 4);
        assert_eq!(cpu.pc(), pc_before);
    }
}
