use super::{
    FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT, FLAG_NEGATIVE, FLAG_OVERFLOW,
    FLAG_UNUSED, FLAG_ZERO, Nes,
};

/// Every addressing mode the 2A03 documents. `Indirect` carries the
/// JMP ($xxFF) page-wrap bug; `Relative` is only reachable from branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndexedIndirect,
    IndirectIndexed,
    Indirect,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Instr {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Anything undocumented: behaves as a 2-cycle NOP and raises a warning.
    Ill,
}

#[derive(Clone, Copy)]
struct Op {
    instr: Instr,
    mode: AddrMode,
    cycles: u32,
}

const fn op(instr: Instr, mode: AddrMode, cycles: u32) -> Op {
    Op {
        instr,
        mode,
        cycles,
    }
}

/// Decode table indexed by opcode byte. Entries hold base cycle counts; the
/// page-cross and branch penalties are added during execution.
const OPCODE_TABLE: [Op; 256] = build_opcode_table();

const fn build_opcode_table() -> [Op; 256] {
    use AddrMode::*;
    use Instr::*;

    let mut t = [op(Ill, Implied, 2); 256];

    t[0xA9] = op(Lda, Immediate, 2);
    t[0xA5] = op(Lda, ZeroPage, 3);
    t[0xB5] = op(Lda, ZeroPageX, 4);
    t[0xAD] = op(Lda, Absolute, 4);
    t[0xBD] = op(Lda, AbsoluteX, 4);
    t[0xB9] = op(Lda, AbsoluteY, 4);
    t[0xA1] = op(Lda, IndexedIndirect, 6);
    t[0xB1] = op(Lda, IndirectIndexed, 5);

    t[0xA2] = op(Ldx, Immediate, 2);
    t[0xA6] = op(Ldx, ZeroPage, 3);
    t[0xB6] = op(Ldx, ZeroPageY, 4);
    t[0xAE] = op(Ldx, Absolute, 4);
    t[0xBE] = op(Ldx, AbsoluteY, 4);

    t[0xA0] = op(Ldy, Immediate, 2);
    t[0xA4] = op(Ldy, ZeroPage, 3);
    t[0xB4] = op(Ldy, ZeroPageX, 4);
    t[0xAC] = op(Ldy, Absolute, 4);
    t[0xBC] = op(Ldy, AbsoluteX, 4);

    t[0x85] = op(Sta, ZeroPage, 3);
    t[0x95] = op(Sta, ZeroPageX, 4);
    t[0x8D] = op(Sta, Absolute, 4);
    t[0x9D] = op(Sta, AbsoluteX, 5);
    t[0x99] = op(Sta, AbsoluteY, 5);
    t[0x81] = op(Sta, IndexedIndirect, 6);
    t[0x91] = op(Sta, IndirectIndexed, 6);

    t[0x86] = op(Stx, ZeroPage, 3);
    t[0x96] = op(Stx, ZeroPageY, 4);
    t[0x8E] = op(Stx, Absolute, 4);

    t[0x84] = op(Sty, ZeroPage, 3);
    t[0x94] = op(Sty, ZeroPageX, 4);
    t[0x8C] = op(Sty, Absolute, 4);

    t[0xAA] = op(Tax, Implied, 2);
    t[0xA8] = op(Tay, Implied, 2);
    t[0xBA] = op(Tsx, Implied, 2);
    t[0x8A] = op(Txa, Implied, 2);
    t[0x9A] = op(Txs, Implied, 2);
    t[0x98] = op(Tya, Implied, 2);

    t[0x48] = op(Pha, Implied, 3);
    t[0x08] = op(Php, Implied, 3);
    t[0x68] = op(Pla, Implied, 4);
    t[0x28] = op(Plp, Implied, 4);

    t[0x29] = op(And, Immediate, 2);
    t[0x25] = op(And, ZeroPage, 3);
    t[0x35] = op(And, ZeroPageX, 4);
    t[0x2D] = op(And, Absolute, 4);
    t[0x3D] = op(And, AbsoluteX, 4);
    t[0x39] = op(And, AbsoluteY, 4);
    t[0x21] = op(And, IndexedIndirect, 6);
    t[0x31] = op(And, IndirectIndexed, 5);

    t[0x09] = op(Ora, Immediate, 2);
    t[0x05] = op(Ora, ZeroPage, 3);
    t[0x15] = op(Ora, ZeroPageX, 4);
    t[0x0D] = op(Ora, Absolute, 4);
    t[0x1D] = op(Ora, AbsoluteX, 4);
    t[0x19] = op(Ora, AbsoluteY, 4);
    t[0x01] = op(Ora, IndexedIndirect, 6);
    t[0x11] = op(Ora, IndirectIndexed, 5);

    t[0x49] = op(Eor, Immediate, 2);
    t[0x45] = op(Eor, ZeroPage, 3);
    t[0x55] = op(Eor, ZeroPageX, 4);
    t[0x4D] = op(Eor, Absolute, 4);
    t[0x5D] = op(Eor, AbsoluteX, 4);
    t[0x59] = op(Eor, AbsoluteY, 4);
    t[0x41] = op(Eor, IndexedIndirect, 6);
    t[0x51] = op(Eor, IndirectIndexed, 5);

    t[0x24] = op(Bit, ZeroPage, 3);
    t[0x2C] = op(Bit, Absolute, 4);

    t[0x69] = op(Adc, Immediate, 2);
    t[0x65] = op(Adc, ZeroPage, 3);
    t[0x75] = op(Adc, ZeroPageX, 4);
    t[0x6D] = op(Adc, Absolute, 4);
    t[0x7D] = op(Adc, AbsoluteX, 4);
    t[0x79] = op(Adc, AbsoluteY, 4);
    t[0x61] = op(Adc, IndexedIndirect, 6);
    t[0x71] = op(Adc, IndirectIndexed, 5);

    t[0xE9] = op(Sbc, Immediate, 2);
    t[0xE5] = op(Sbc, ZeroPage, 3);
    t[0xF5] = op(Sbc, ZeroPageX, 4);
    t[0xED] = op(Sbc, Absolute, 4);
    t[0xFD] = op(Sbc, AbsoluteX, 4);
    t[0xF9] = op(Sbc, AbsoluteY, 4);
    t[0xE1] = op(Sbc, IndexedIndirect, 6);
    t[0xF1] = op(Sbc, IndirectIndexed, 5);

    t[0xC9] = op(Cmp, Immediate, 2);
    t[0xC5] = op(Cmp, ZeroPage, 3);
    t[0xD5] = op(Cmp, ZeroPageX, 4);
    t[0xCD] = op(Cmp, Absolute, 4);
    t[0xDD] = op(Cmp, AbsoluteX, 4);
    t[0xD9] = op(Cmp, AbsoluteY, 4);
    t[0xC1] = op(Cmp, IndexedIndirect, 6);
    t[0xD1] = op(Cmp, IndirectIndexed, 5);

    t[0xE0] = op(Cpx, Immediate, 2);
    t[0xE4] = op(Cpx, ZeroPage, 3);
    t[0xEC] = op(Cpx, Absolute, 4);

    t[0xC0] = op(Cpy, Immediate, 2);
    t[0xC4] = op(Cpy, ZeroPage, 3);
    t[0xCC] = op(Cpy, Absolute, 4);

    t[0xE6] = op(Inc, ZeroPage, 5);
    t[0xF6] = op(Inc, ZeroPageX, 6);
    t[0xEE] = op(Inc, Absolute, 6);
    t[0xFE] = op(Inc, AbsoluteX, 7);

    t[0xC6] = op(Dec, ZeroPage, 5);
    t[0xD6] = op(Dec, ZeroPageX, 6);
    t[0xCE] = op(Dec, Absolute, 6);
    t[0xDE] = op(Dec, AbsoluteX, 7);

    t[0xE8] = op(Inx, Implied, 2);
    t[0xC8] = op(Iny, Implied, 2);
    t[0xCA] = op(Dex, Implied, 2);
    t[0x88] = op(Dey, Implied, 2);

    t[0x0A] = op(Asl, Accumulator, 2);
    t[0x06] = op(Asl, ZeroPage, 5);
    t[0x16] = op(Asl, ZeroPageX, 6);
    t[0x0E] = op(Asl, Absolute, 6);
    t[0x1E] = op(Asl, AbsoluteX, 7);

    t[0x4A] = op(Lsr, Accumulator, 2);
    t[0x46] = op(Lsr, ZeroPage, 5);
    t[0x56] = op(Lsr, ZeroPageX, 6);
    t[0x4E] = op(Lsr, Absolute, 6);
    t[0x5E] = op(Lsr, AbsoluteX, 7);

    t[0x2A] = op(Rol, Accumulator, 2);
    t[0x26] = op(Rol, ZeroPage, 5);
    t[0x36] = op(Rol, ZeroPageX, 6);
    t[0x2E] = op(Rol, Absolute, 6);
    t[0x3E] = op(Rol, AbsoluteX, 7);

    t[0x6A] = op(Ror, Accumulator, 2);
    t[0x66] = op(Ror, ZeroPage, 5);
    t[0x76] = op(Ror, ZeroPageX, 6);
    t[0x6E] = op(Ror, Absolute, 6);
    t[0x7E] = op(Ror, AbsoluteX, 7);

    t[0x4C] = op(Jmp, Absolute, 3);
    t[0x6C] = op(Jmp, Indirect, 5);
    t[0x20] = op(Jsr, Absolute, 6);
    t[0x60] = op(Rts, Implied, 6);
    t[0x40] = op(Rti, Implied, 6);
    t[0x00] = op(Brk, Implied, 7);

    t[0x90] = op(Bcc, Relative, 2);
    t[0xB0] = op(Bcs, Relative, 2);
    t[0xF0] = op(Beq, Relative, 2);
    t[0x30] = op(Bmi, Relative, 2);
    t[0xD0] = op(Bne, Relative, 2);
    t[0x10] = op(Bpl, Relative, 2);
    t[0x50] = op(Bvc, Relative, 2);
    t[0x70] = op(Bvs, Relative, 2);

    t[0x18] = op(Clc, Implied, 2);
    t[0x38] = op(Sec, Implied, 2);
    t[0x58] = op(Cli, Implied, 2);
    t[0x78] = op(Sei, Implied, 2);
    t[0xB8] = op(Clv, Implied, 2);
    t[0xD8] = op(Cld, Implied, 2);
    t[0xF8] = op(Sed, Implied, 2);

    t[0xEA] = op(Nop, Implied, 2);

    t
}

impl Nes {
    /// Runs one instruction (or services a pending interrupt, or burns one
    /// DMA stall cycle) and returns the cycle cost.
    pub(crate) fn step_cpu(&mut self) -> u32 {
        if self.dma_cycles > 0 {
            self.dma_cycles -= 1;
            self.total_cycles += 1;
            return 1;
        }

        if self.pending_nmi {
            self.pending_nmi = false;
            self.service_nmi();
            self.total_cycles += 7;
            return 7;
        }

        if self.pending_irq && !self.get_flag(FLAG_INTERRUPT) {
            self.pending_irq = false;
            self.service_irq();
            self.total_cycles += 7;
            return 7;
        }

        let opcode_pc = self.pc;
        let opcode = self.fetch_byte();
        let entry = OPCODE_TABLE[opcode as usize];
        let cycles = self.execute(entry, opcode, opcode_pc);
        self.total_cycles += cycles as u64;
        cycles
    }

    fn execute(&mut self, entry: Op, opcode: u8, opcode_pc: u16) -> u32 {
        use Instr::*;

        match entry.instr {
            Lda => {
                let (value, extra) = self.read_operand(entry.mode);
                self.a = value;
                self.update_zn(self.a);
                entry.cycles + extra
            }
            Ldx => {
                let (value, extra) = self.read_operand(entry.mode);
                self.x = value;
                self.update_zn(self.x);
                entry.cycles + extra
            }
            Ldy => {
                let (value, extra) = self.read_operand(entry.mode);
                self.y = value;
                self.update_zn(self.y);
                entry.cycles + extra
            }

            Sta => {
                let (addr, _) = self.operand_addr(entry.mode);
                self.cpu_write(addr, self.a);
                entry.cycles
            }
            Stx => {
                let (addr, _) = self.operand_addr(entry.mode);
                self.cpu_write(addr, self.x);
                entry.cycles
            }
            Sty => {
                let (addr, _) = self.operand_addr(entry.mode);
                self.cpu_write(addr, self.y);
                entry.cycles
            }

            Tax => {
                self.x = self.a;
                self.update_zn(self.x);
                entry.cycles
            }
            Tay => {
                self.y = self.a;
                self.update_zn(self.y);
                entry.cycles
            }
            Tsx => {
                self.x = self.sp;
                self.update_zn(self.x);
                entry.cycles
            }
            Txa => {
                self.a = self.x;
                self.update_zn(self.a);
                entry.cycles
            }
            Txs => {
                self.sp = self.x;
                entry.cycles
            }
            Tya => {
                self.a = self.y;
                self.update_zn(self.a);
                entry.cycles
            }

            Pha => {
                self.push(self.a);
                entry.cycles
            }
            Php => {
                // The stack image always carries B and U set.
                self.push(self.p | FLAG_BREAK | FLAG_UNUSED);
                entry.cycles
            }
            Pla => {
                self.a = self.pop();
                self.update_zn(self.a);
                entry.cycles
            }
            Plp => {
                self.p = self.pop();
                self.p &= !FLAG_BREAK;
                self.p |= FLAG_UNUSED;
                entry.cycles
            }

            And => {
                let (value, extra) = self.read_operand(entry.mode);
                self.a &= value;
                self.update_zn(self.a);
                entry.cycles + extra
            }
            Ora => {
                let (value, extra) = self.read_operand(entry.mode);
                self.a |= value;
                self.update_zn(self.a);
                entry.cycles + extra
            }
            Eor => {
                let (value, extra) = self.read_operand(entry.mode);
                self.a ^= value;
                self.update_zn(self.a);
                entry.cycles + extra
            }
            Bit => {
                let (value, extra) = self.read_operand(entry.mode);
                self.set_flag(FLAG_ZERO, (self.a & value) == 0);
                self.set_flag(FLAG_NEGATIVE, (value & 0x80) != 0);
                self.set_flag(FLAG_OVERFLOW, (value & 0x40) != 0);
                entry.cycles + extra
            }

            Adc => {
                let (value, extra) = self.read_operand(entry.mode);
                self.adc(value);
                entry.cycles + extra
            }
            Sbc => {
                let (value, extra) = self.read_operand(entry.mode);
                self.sbc(value);
                entry.cycles + extra
            }

            Cmp => {
                let (value, extra) = self.read_operand(entry.mode);
                self.compare(self.a, value);
                entry.cycles + extra
            }
            Cpx => {
                let (value, extra) = self.read_operand(entry.mode);
                self.compare(self.x, value);
                entry.cycles + extra
            }
            Cpy => {
                let (value, extra) = self.read_operand(entry.mode);
                self.compare(self.y, value);
                entry.cycles + extra
            }

            Inc => {
                let (addr, _) = self.operand_addr(entry.mode);
                let result = self.cpu_read(addr).wrapping_add(1);
                self.cpu_write(addr, result);
                self.update_zn(result);
                entry.cycles
            }
            Dec => {
                let (addr, _) = self.operand_addr(entry.mode);
                let result = self.cpu_read(addr).wrapping_sub(1);
                self.cpu_write(addr, result);
                self.update_zn(result);
                entry.cycles
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zn(self.x);
                entry.cycles
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zn(self.y);
                entry.cycles
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zn(self.x);
                entry.cycles
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zn(self.y);
                entry.cycles
            }

            Asl => self.shift_op(entry, Self::asl),
            Lsr => self.shift_op(entry, Self::lsr),
            Rol => self.shift_op(entry, Self::rol),
            Ror => self.shift_op(entry, Self::ror),

            Jmp => {
                let (addr, _) = self.operand_addr(entry.mode);
                self.pc = addr;
                entry.cycles
            }
            Jsr => {
                let addr = self.fetch_word();
                self.push_u16(self.pc.wrapping_sub(1));
                self.pc = addr;
                entry.cycles
            }
            Rts => {
                self.pc = self.pop_u16().wrapping_add(1);
                entry.cycles
            }
            Rti => {
                self.p = self.pop();
                self.p &= !FLAG_BREAK;
                self.p |= FLAG_UNUSED;
                self.pc = self.pop_u16();
                entry.cycles
            }
            Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.push_u16(self.pc);
                self.push(self.p | FLAG_BREAK | FLAG_UNUSED);
                self.set_flag(FLAG_INTERRUPT, true);
                self.pc = self.read_u16(0xFFFE);
                entry.cycles
            }

            Bcc => self.branch(!self.get_flag(FLAG_CARRY)),
            Bcs => self.branch(self.get_flag(FLAG_CARRY)),
            Beq => self.branch(self.get_flag(FLAG_ZERO)),
            Bmi => self.branch(self.get_flag(FLAG_NEGATIVE)),
            Bne => self.branch(!self.get_flag(FLAG_ZERO)),
            Bpl => self.branch(!self.get_flag(FLAG_NEGATIVE)),
            Bvc => self.branch(!self.get_flag(FLAG_OVERFLOW)),
            Bvs => self.branch(self.get_flag(FLAG_OVERFLOW)),

            Clc => {
                self.set_flag(FLAG_CARRY, false);
                entry.cycles
            }
            Sec => {
                self.set_flag(FLAG_CARRY, true);
                entry.cycles
            }
            Cli => {
                self.set_flag(FLAG_INTERRUPT, false);
                entry.cycles
            }
            Sei => {
                self.set_flag(FLAG_INTERRUPT, true);
                entry.cycles
            }
            Clv => {
                self.set_flag(FLAG_OVERFLOW, false);
                entry.cycles
            }
            Cld => {
                self.set_flag(FLAG_DECIMAL, false);
                entry.cycles
            }
            Sed => {
                self.set_flag(FLAG_DECIMAL, true);
                entry.cycles
            }

            Nop => entry.cycles,

            Ill => {
                self.note_unknown_opcode(opcode, opcode_pc);
                entry.cycles
            }
        }
    }

    /// Resolves the operand address. The bool reports a page crossing,
    /// which only read instructions in abs,X / abs,Y / (zp),Y turn into an
    /// extra cycle.
    fn operand_addr(&mut self, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::ZeroPage => (self.fetch_byte() as u16, false),
            AddrMode::ZeroPageX => (self.fetch_byte().wrapping_add(self.x) as u16, false),
            AddrMode::ZeroPageY => (self.fetch_byte().wrapping_add(self.y) as u16, false),
            AddrMode::Absolute => (self.fetch_word(), false),
            AddrMode::AbsoluteX => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.x as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::IndexedIndirect => {
                let zp = self.fetch_byte().wrapping_add(self.x);
                (self.read_zp_u16(zp), false)
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch_byte();
                let base = self.read_zp_u16(zp);
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Indirect => {
                let ptr = self.fetch_word();
                (self.read_u16_bug(ptr), false)
            }
            // Implied/Accumulator/Immediate/Relative never resolve here.
            _ => (0, false),
        }
    }

    fn read_operand(&mut self, mode: AddrMode) -> (u8, u32) {
        if mode == AddrMode::Immediate {
            return (self.fetch_byte(), 0);
        }
        let (addr, page_crossed) = self.operand_addr(mode);
        (self.cpu_read(addr), page_crossed as u32)
    }

    fn shift_op(&mut self, entry: Op, apply: fn(&mut Self, u8) -> u8) -> u32 {
        if entry.mode == AddrMode::Accumulator {
            self.a = apply(self, self.a);
            return entry.cycles;
        }
        let (addr, _) = self.operand_addr(entry.mode);
        let value = self.cpu_read(addr);
        let result = apply(self, value);
        self.cpu_write(addr, result);
        entry.cycles
    }

    fn read_zp_u16(&mut self, addr: u8) -> u16 {
        let lo = self.cpu_read(addr as u16) as u16;
        let hi = self.cpu_read(addr.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    fn branch(&mut self, condition: bool) -> u32 {
        let offset = self.fetch_byte() as i8;
        if !condition {
            return 2;
        }

        let old_pc = self.pc;
        let new_pc = old_pc.wrapping_add(offset as i16 as u16);
        self.pc = new_pc;
        if (old_pc & 0xFF00) != (new_pc & 0xFF00) {
            4
        } else {
            3
        }
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zn(result);
    }

    fn adc(&mut self, value: u8) {
        // Binary only; the D flag is storable but has no effect on the 2A03.
        let carry_in = u16::from(self.get_flag(FLAG_CARRY));
        let result = self.a as u16 + value as u16 + carry_in;
        let out = result as u8;

        self.set_flag(FLAG_CARRY, result > 0xFF);
        self.set_flag(FLAG_OVERFLOW, ((self.a ^ out) & (value ^ out) & 0x80) != 0);

        self.a = out;
        self.update_zn(self.a);
    }

    fn sbc(&mut self, value: u8) {
        self.adc(value ^ 0xFF);
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, (value & 0x80) != 0);
        let result = value << 1;
        self.update_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, (value & 0x01) != 0);
        let result = value >> 1;
        self.update_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.get_flag(FLAG_CARRY));
        self.set_flag(FLAG_CARRY, (value & 0x80) != 0);
        let result = (value << 1) | carry_in;
        self.update_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.get_flag(FLAG_CARRY) { 0x80 } else { 0 };
        self.set_flag(FLAG_CARRY, (value & 0x01) != 0);
        let result = (value >> 1) | carry_in;
        self.update_zn(result);
        result
    }
}
