use thiserror::Error;

use crate::bus::Bus;
use crate::registers::Registers;

// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
const FLAG_Z: u8 = 0x80; // Zero
const FLAG_N: u8 = 0x40; // Subtract
const FLAG_H: u8 = 0x20; // Half Carry
const FLAG_C: u8 = 0x10; // Carry

// Interrupt vectors (gbdev.io/pandocs/Interrupts.html)
const INTERRUPT_VBLANK: u16 = 0x40;
const INTERRUPT_STAT: u16 = 0x48;
const INTERRUPT_TIMER: u16 = 0x50;
const INTERRUPT_SERIAL: u16 = 0x58;
const INTERRUPT_JOYPAD: u16 = 0x60;

const INTERRUPT_DISPATCH_CYCLES: u32 = 20;
const HALT_IDLE_CYCLES: u32 = 4;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("illegal opcode {opcode:#04X} at PC={pc:#06X}")]
    IllegalInstruction { opcode: u8, pc: u16 },
}

pub struct Cpu {
    pub regs: Registers,
    /// Cycles spent executing instructions and servicing interrupts.
    pub cycles: u64,
    pub ime: bool,
    pub halted: bool,
    /// EI arms this; it is promoted to IME at the top of the next step.
    ime_pending: bool,
}

impl Cpu {
    /// CPU in the post-boot state.
    pub fn new() -> Self {
        Self {
            regs: Registers::post_boot(),
            cycles: 0,
            ime: false,
            halted: false,
            ime_pending: false,
        }
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    /// Execute one instruction (or service one interrupt, or idle in HALT)
    /// and return the machine cycles consumed.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32, CpuError> {
        if self.ime_pending {
            self.ime = true;
            self.ime_pending = false;
        }

        let pending = bus.if_reg & bus.ie_reg & 0x1F;
        if pending != 0 {
            if self.ime {
                let cycles = self.dispatch_interrupt(bus, pending);
                self.cycles += cycles as u64;
                return Ok(cycles);
            }
            // A pending interrupt ends HALT even with IME off; it just
            // isn't dispatched.
            self.halted = false;
        }

        if self.halted {
            return Ok(HALT_IDLE_CYCLES);
        }

        let pc = self.regs.pc;
        let opcode = self.fetch8(bus);
        let cycles = self.execute(opcode, pc, bus)?;
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    fn dispatch_interrupt(&mut self, bus: &mut Bus, pending: u8) -> u32 {
        let (bit, vector) = next_interrupt(pending);
        bus.if_reg &= !bit;
        self.ime = false;
        self.halted = false;
        self.push_word(bus, self.regs.pc);
        self.regs.pc = vector;
        INTERRUPT_DISPATCH_CYCLES
    }

    #[inline(always)]
    fn fetch8(&mut self, bus: &mut Bus) -> u8 {
        let val = bus.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch8(bus) as u16;
        let hi = self.fetch8(bus) as u16;
        (hi << 8) | lo
    }

    fn push_word(&mut self, bus: &mut Bus, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, val as u8);
    }

    fn pop_word(&mut self, bus: &mut Bus) -> u16 {
        let lo = bus.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// Operand value for the 3-bit r8 encoding (B C D E H L (HL) A).
    fn read_reg(&mut self, bus: &mut Bus, index: u8) -> u8 {
        match index {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => bus.read_byte(self.regs.hl()),
            7 => self.regs.a,
            _ => unreachable!(),
        }
    }

    fn write_reg(&mut self, bus: &mut Bus, index: u8, val: u8) {
        match index {
            0 => self.regs.b = val,
            1 => self.regs.c = val,
            2 => self.regs.d = val,
            3 => self.regs.e = val,
            4 => self.regs.h = val,
            5 => self.regs.l = val,
            6 => bus.write_byte(self.regs.hl(), val),
            7 => self.regs.a = val,
            _ => unreachable!(),
        }
    }

    /// 16-bit register for the 2-bit rr encoding (BC DE HL SP).
    fn read_rr(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    fn write_rr(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            _ => self.regs.sp = val,
        }
    }

    /// Branch condition for the 2-bit cc encoding (NZ Z NC C).
    fn condition(&self, index: u8) -> bool {
        match index & 0x03 {
            0 => !self.regs.zf(),
            1 => self.regs.zf(),
            2 => !self.regs.cf(),
            _ => self.regs.cf(),
        }
    }

    fn execute(&mut self, opcode: u8, pc: u16, bus: &mut Bus) -> Result<u32, CpuError> {
        match opcode {
            // NOP
            0x00 => Ok(4),
            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(bus);
                self.write_rr(opcode >> 4, val);
                Ok(12)
            }
            // LD (BC), A / LD (DE), A
            0x02 => {
                bus.write_byte(self.regs.bc(), self.regs.a);
                Ok(8)
            }
            0x12 => {
                bus.write_byte(self.regs.de(), self.regs.a);
                Ok(8)
            }
            // INC rr / DEC rr (no flags)
            0x03 | 0x13 | 0x23 | 0x33 => {
                let index = opcode >> 4;
                self.write_rr(index, self.read_rr(index).wrapping_add(1));
                Ok(8)
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let index = opcode >> 4;
                self.write_rr(index, self.read_rr(index).wrapping_sub(1));
                Ok(8)
            }
            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let index = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, index);
                let res = self.inc8(val);
                self.write_reg(bus, index, res);
                Ok(if index == 6 { 12 } else { 4 })
            }
            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let index = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, index);
                let res = self.dec8(val);
                self.write_reg(bus, index, res);
                Ok(if index == 6 { 12 } else { 4 })
            }
            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let index = (opcode >> 3) & 0x07;
                let val = self.fetch8(bus);
                self.write_reg(bus, index, val);
                Ok(if index == 6 { 12 } else { 8 })
            }
            // RLCA / RRCA / RLA / RRA (Z is always cleared, unlike CB rotates)
            0x07 => {
                let carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                self.regs.set_f(if carry { FLAG_C } else { 0 });
                Ok(4)
            }
            0x0F => {
                let carry = self.regs.a & 0x01 != 0;
                self.regs.a = self.regs.a.rotate_right(1);
                self.regs.set_f(if carry { FLAG_C } else { 0 });
                Ok(4)
            }
            0x17 => {
                let carry = self.regs.a & 0x80 != 0;
                let carry_in = if self.regs.cf() { 1 } else { 0 };
                self.regs.a = (self.regs.a << 1) | carry_in;
                self.regs.set_f(if carry { FLAG_C } else { 0 });
                Ok(4)
            }
            0x1F => {
                let carry = self.regs.a & 0x01 != 0;
                let carry_in = if self.regs.cf() { 0x80 } else { 0 };
                self.regs.a = (self.regs.a >> 1) | carry_in;
                self.regs.set_f(if carry { FLAG_C } else { 0 });
                Ok(4)
            }
            // LD (nn), SP
            0x08 => {
                let addr = self.fetch16(bus);
                bus.write_word(addr, self.regs.sp);
                Ok(20)
            }
            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.add_hl(self.read_rr(opcode >> 4));
                Ok(8)
            }
            // LD A, (BC) / LD A, (DE)
            0x0A => {
                self.regs.a = bus.read_byte(self.regs.bc());
                Ok(8)
            }
            0x1A => {
                self.regs.a = bus.read_byte(self.regs.de());
                Ok(8)
            }
            // STOP behaves as HALT here; the pad byte is consumed so
            // execution resumes past it.
            0x10 => {
                let _ = self.fetch8(bus);
                self.halted = true;
                Ok(4)
            }
            // JR e
            0x18 => {
                let offset = self.fetch8(bus) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                Ok(12)
            }
            // JR cc, e
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch8(bus) as i8;
                if self.condition(opcode >> 3) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    Ok(12)
                } else {
                    Ok(8)
                }
            }
            // LD (HL+), A / LD A, (HL+) / LD (HL-), A / LD A, (HL-)
            0x22 => {
                let addr = self.regs.hl();
                bus.write_byte(addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_add(1));
                Ok(8)
            }
            0x2A => {
                let addr = self.regs.hl();
                self.regs.a = bus.read_byte(addr);
                self.regs.set_hl(addr.wrapping_add(1));
                Ok(8)
            }
            0x32 => {
                let addr = self.regs.hl();
                bus.write_byte(addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_sub(1));
                Ok(8)
            }
            0x3A => {
                let addr = self.regs.hl();
                self.regs.a = bus.read_byte(addr);
                self.regs.set_hl(addr.wrapping_sub(1));
                Ok(8)
            }
            // DAA
            0x27 => {
                self.daa();
                Ok(4)
            }
            // CPL
            0x2F => {
                self.regs.a ^= 0xFF;
                self.regs.set_f(self.regs.f() & (FLAG_Z | FLAG_C) | FLAG_N | FLAG_H);
                Ok(4)
            }
            // SCF
            0x37 => {
                self.regs.set_f(self.regs.f() & FLAG_Z | FLAG_C);
                Ok(4)
            }
            // CCF
            0x3F => {
                let carry = self.regs.cf();
                self.regs
                    .set_f(self.regs.f() & FLAG_Z | if carry { 0 } else { FLAG_C });
                Ok(4)
            }
            // HALT
            0x76 => {
                self.halted = true;
                Ok(4)
            }
            // LD r, r'
            0x40..=0x7F => {
                let src = opcode & 0x07;
                let dst = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, src);
                self.write_reg(bus, dst, val);
                Ok(if src == 6 || dst == 6 { 8 } else { 4 })
            }
            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, r
            0x80..=0xBF => {
                let src = opcode & 0x07;
                let val = self.read_reg(bus, src);
                self.alu((opcode >> 3) & 0x07, val);
                Ok(if src == 6 { 8 } else { 4 })
            }
            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                if self.condition(opcode >> 3) {
                    self.regs.pc = self.pop_word(bus);
                    Ok(20)
                } else {
                    Ok(8)
                }
            }
            // POP rr
            0xC1 | 0xD1 | 0xE1 => {
                let val = self.pop_word(bus);
                self.write_rr(opcode >> 4, val);
                Ok(12)
            }
            // POP AF (low nibble of F reads back as zero)
            0xF1 => {
                let val = self.pop_word(bus);
                self.regs.set_af(val);
                Ok(12)
            }
            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let addr = self.fetch16(bus);
                if self.condition(opcode >> 3) {
                    self.regs.pc = addr;
                    Ok(16)
                } else {
                    Ok(12)
                }
            }
            // JP nn
            0xC3 => {
                self.regs.pc = self.fetch16(bus);
                Ok(16)
            }
            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let addr = self.fetch16(bus);
                if self.condition(opcode >> 3) {
                    self.push_word(bus, self.regs.pc);
                    self.regs.pc = addr;
                    Ok(24)
                } else {
                    Ok(12)
                }
            }
            // PUSH rr
            0xC5 | 0xD5 | 0xE5 => {
                self.push_word(bus, self.read_rr(opcode >> 4));
                Ok(16)
            }
            0xF5 => {
                self.push_word(bus, self.regs.af());
                Ok(16)
            }
            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.fetch8(bus);
                self.alu((opcode >> 3) & 0x07, val);
                Ok(8)
            }
            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push_word(bus, self.regs.pc);
                self.regs.pc = (opcode & 0x38) as u16;
                Ok(16)
            }
            // RET
            0xC9 => {
                self.regs.pc = self.pop_word(bus);
                Ok(16)
            }
            // RETI enables interrupts immediately, without EI's delay.
            0xD9 => {
                self.regs.pc = self.pop_word(bus);
                self.ime = true;
                self.ime_pending = false;
                Ok(16)
            }
            // CB prefix
            0xCB => Ok(self.execute_cb(bus)),
            // CALL nn
            0xCD => {
                let addr = self.fetch16(bus);
                self.push_word(bus, self.regs.pc);
                self.regs.pc = addr;
                Ok(24)
            }
            // LDH (n), A / LDH A, (n)
            0xE0 => {
                let offset = self.fetch8(bus);
                bus.write_byte(0xFF00 | offset as u16, self.regs.a);
                Ok(12)
            }
            0xF0 => {
                let offset = self.fetch8(bus);
                self.regs.a = bus.read_byte(0xFF00 | offset as u16);
                Ok(12)
            }
            // LD (FF00+C), A / LD A, (FF00+C)
            0xE2 => {
                bus.write_byte(0xFF00 | self.regs.c as u16, self.regs.a);
                Ok(8)
            }
            0xF2 => {
                self.regs.a = bus.read_byte(0xFF00 | self.regs.c as u16);
                Ok(8)
            }
            // ADD SP, e
            0xE8 => {
                let val = self.fetch8(bus) as i8 as u16;
                self.regs.sp = self.sp_offset_flags(val);
                Ok(16)
            }
            // LD HL, SP+e
            0xF8 => {
                let val = self.fetch8(bus) as i8 as u16;
                let res = self.sp_offset_flags(val);
                self.regs.set_hl(res);
                Ok(12)
            }
            // JP (HL)
            0xE9 => {
                self.regs.pc = self.regs.hl();
                Ok(4)
            }
            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.regs.hl();
                Ok(8)
            }
            // LD (nn), A / LD A, (nn)
            0xEA => {
                let addr = self.fetch16(bus);
                bus.write_byte(addr, self.regs.a);
                Ok(16)
            }
            0xFA => {
                let addr = self.fetch16(bus);
                self.regs.a = bus.read_byte(addr);
                Ok(16)
            }
            // DI clears IME and any armed EI.
            0xF3 => {
                self.ime = false;
                self.ime_pending = false;
                Ok(4)
            }
            // EI takes effect after the following step.
            0xFB => {
                self.ime_pending = true;
                Ok(4)
            }
            // The eleven holes in the primary table:
            // D3 DB DD E3 E4 EB EC ED F4 FC FD.
            _ => Err(CpuError::IllegalInstruction { opcode, pc }),
        }
    }

    fn execute_cb(&mut self, bus: &mut Bus) -> u32 {
        let opcode = self.fetch8(bus);
        let index = opcode & 0x07;
        match opcode {
            // Rotates, shifts and SWAP
            0x00..=0x3F => {
                let val = self.read_reg(bus, index);
                let res = match (opcode >> 3) & 0x07 {
                    0 => self.rlc(val),
                    1 => self.rrc(val),
                    2 => self.rl(val),
                    3 => self.rr(val),
                    4 => self.sla(val),
                    5 => self.sra(val),
                    6 => self.swap(val),
                    _ => self.srl(val),
                };
                self.write_reg(bus, index, res);
                if index == 6 { 16 } else { 8 }
            }
            // BIT b, r
            0x40..=0x7F => {
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, index);
                self.regs.set_f(
                    self.regs.f() & FLAG_C
                        | FLAG_H
                        | if val & (1 << bit) == 0 { FLAG_Z } else { 0 },
                );
                if index == 6 { 12 } else { 8 }
            }
            // RES b, r
            0x80..=0xBF => {
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, index);
                self.write_reg(bus, index, val & !(1 << bit));
                if index == 6 { 16 } else { 8 }
            }
            // SET b, r
            0xC0..=0xFF => {
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg(bus, index);
                self.write_reg(bus, index, val | (1 << bit));
                if index == 6 { 16 } else { 8 }
            }
        }
    }

    /// Dispatch the 3-bit ALU encoding (ADD ADC SUB SBC AND XOR OR CP).
    fn alu(&mut self, op: u8, val: u8) {
        match op {
            0 => self.add_a(val),
            1 => self.adc_a(val),
            2 => self.sub_a(val),
            3 => self.sbc_a(val),
            4 => self.and_a(val),
            5 => self.xor_a(val),
            6 => self.or_a(val),
            _ => self.cp_a(val),
        }
    }

    fn add_a(&mut self, val: u8) {
        let a = self.regs.a;
        let (res, carry) = a.overflowing_add(val);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) + (val & 0x0F) > 0x0F { FLAG_H } else { 0 }
                | if carry { FLAG_C } else { 0 },
        );
        self.regs.a = res;
    }

    fn adc_a(&mut self, val: u8) {
        let a = self.regs.a;
        let carry_in = if self.regs.cf() { 1 } else { 0 };
        let (res1, carry1) = a.overflowing_add(val);
        let (res2, carry2) = res1.overflowing_add(carry_in);
        self.regs.set_f(
            if res2 == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) + (val & 0x0F) + carry_in > 0x0F { FLAG_H } else { 0 }
                | if carry1 || carry2 { FLAG_C } else { 0 },
        );
        self.regs.a = res2;
    }

    fn sub_a(&mut self, val: u8) {
        let a = self.regs.a;
        let (res, borrow) = a.overflowing_sub(val);
        self.regs.set_f(
            FLAG_N
                | if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                | if borrow { FLAG_C } else { 0 },
        );
        self.regs.a = res;
    }

    fn sbc_a(&mut self, val: u8) {
        let a = self.regs.a;
        let carry_in = if self.regs.cf() { 1 } else { 0 };
        let (res1, borrow1) = a.overflowing_sub(val);
        let (res2, borrow2) = res1.overflowing_sub(carry_in);
        self.regs.set_f(
            FLAG_N
                | if res2 == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) + carry_in { FLAG_H } else { 0 }
                | if borrow1 || borrow2 { FLAG_C } else { 0 },
        );
        self.regs.a = res2;
    }

    fn and_a(&mut self, val: u8) {
        self.regs.a &= val;
        self.regs
            .set_f(if self.regs.a == 0 { FLAG_Z } else { 0 } | FLAG_H);
    }

    fn xor_a(&mut self, val: u8) {
        self.regs.a ^= val;
        self.regs.set_f(if self.regs.a == 0 { FLAG_Z } else { 0 });
    }

    fn or_a(&mut self, val: u8) {
        self.regs.a |= val;
        self.regs.set_f(if self.regs.a == 0 { FLAG_Z } else { 0 });
    }

    fn cp_a(&mut self, val: u8) {
        let a = self.regs.a;
        let res = a.wrapping_sub(val);
        self.regs.set_f(
            FLAG_N
                | if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                | if a < val { FLAG_C } else { 0 },
        );
    }

    fn inc8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        self.regs.set_f(
            self.regs.f() & FLAG_C
                | if res == 0 { FLAG_Z } else { 0 }
                | if (val & 0x0F) + 1 > 0x0F { FLAG_H } else { 0 },
        );
        res
    }

    fn dec8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        self.regs.set_f(
            self.regs.f() & FLAG_C
                | FLAG_N
                | if res == 0 { FLAG_Z } else { 0 }
                | if val & 0x0F == 0 { FLAG_H } else { 0 },
        );
        res
    }

    fn add_hl(&mut self, val: u16) {
        let hl = self.regs.hl();
        let res = hl.wrapping_add(val);
        self.regs.set_f(
            self.regs.f() & FLAG_Z
                | if ((hl & 0x0FFF) + (val & 0x0FFF)) & 0x1000 != 0 { FLAG_H } else { 0 }
                | if (hl as u32 + val as u32) > 0xFFFF { FLAG_C } else { 0 },
        );
        self.regs.set_hl(res);
    }

    /// SP plus a sign-extended offset. H and C come from the unsigned add
    /// of the low bytes, not from the 16-bit result.
    fn sp_offset_flags(&mut self, val: u16) -> u16 {
        let sp = self.regs.sp;
        self.regs.set_f(
            if (sp & 0x000F) + (val & 0x000F) > 0x000F { FLAG_H } else { 0 }
                | if (sp & 0x00FF) + (val & 0x00FF) > 0x00FF { FLAG_C } else { 0 },
        );
        sp.wrapping_add(val)
    }

    fn daa(&mut self) {
        let f = self.regs.f();
        let mut correction = 0u8;
        let mut carry = false;
        if f & FLAG_H != 0 || (f & FLAG_N == 0 && (self.regs.a & 0x0F) > 9) {
            correction |= 0x06;
        }
        if f & FLAG_C != 0 || (f & FLAG_N == 0 && self.regs.a > 0x99) {
            correction |= 0x60;
            carry = true;
        }
        if f & FLAG_N == 0 {
            self.regs.a = self.regs.a.wrapping_add(correction);
        } else {
            self.regs.a = self.regs.a.wrapping_sub(correction);
        }
        self.regs.set_f(
            if self.regs.a == 0 { FLAG_Z } else { 0 }
                | (f & FLAG_N)
                | if carry { FLAG_C } else { 0 },
        );
    }

    fn rlc(&mut self, val: u8) -> u8 {
        let res = val.rotate_left(1);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn rrc(&mut self, val: u8) -> u8 {
        let res = val.rotate_right(1);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn rl(&mut self, val: u8) -> u8 {
        let carry_in = if self.regs.cf() { 1 } else { 0 };
        let res = (val << 1) | carry_in;
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn rr(&mut self, val: u8) -> u8 {
        let carry_in = if self.regs.cf() { 0x80 } else { 0 };
        let res = (val >> 1) | carry_in;
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn sla(&mut self, val: u8) -> u8 {
        let res = val << 1;
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn sra(&mut self, val: u8) -> u8 {
        let res = (val >> 1) | (val & 0x80);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
        );
        res
    }

    fn swap(&mut self, val: u8) -> u8 {
        let res = val.rotate_left(4);
        self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
        res
    }

    fn srl(&mut self, val: u8) -> u8 {
        let res = val >> 1;
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
        );
        res
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowest set bit wins: VBlank, then STAT, Timer, Serial, Joypad.
fn next_interrupt(pending: u8) -> (u8, u16) {
    if pending & 0x01 != 0 {
        (0x01, INTERRUPT_VBLANK)
    } else if pending & 0x02 != 0 {
        (0x02, INTERRUPT_STAT)
    } else if pending & 0x04 != 0 {
        (0x04, INTERRUPT_TIMER)
    } else if pending & 0x08 != 0 {
        (0x08, INTERRUPT_SERIAL)
    } else {
        (0x10, INTERRUPT_JOYPAD)
    }
}
