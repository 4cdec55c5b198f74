// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Instruction decoder
//!
//! `decode` turns a raw opcode into a [`DecodedInstruction`]. Selection is a
//! fixed-depth tree: the primary opcode picks either a leaf directly or one
//! of the secondary tables (SPECIAL, REGIMM, COP0, COP1, COP2, MMI), which
//! are indexed by a single field. Every table slot is an [`Opcode`]; slots
//! with no instruction hold [`Opcode::Invalid`].
//!
//! Field layouts:
//!
//! ```text
//! R-type: | op (6) | rs (5) | rt (5) | rd (5) | sa (5) | funct (6) |
//! I-type: | op (6) | rs (5) | rt (5) |       immediate (16)       |
//! J-type: | op (6) |               target (26)                    |
//! FPU:    | op (6) | fmt(5) | ft (5) | fs (5) | fd (5) | funct (6) |
//! ```

/// Instruction selector
///
/// One variant per semantic handler. The set is closed: every raw opcode
/// maps to exactly one variant.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Invalid,

    // Primary
    J, Jal, Beq, Bne, Blez, Bgtz,
    Addi, Addiu, Slti, Sltiu, Andi, Ori, Xori, Lui,
    Beql, Bnel, Blezl, Bgtzl,
    Daddi, Daddiu, Ldl, Ldr, Lq, Sq,
    Lb, Lh, Lwl, Lw, Lbu, Lhu, Lwr, Lwu,
    Sb, Sh, Swl, Sw, Sdl, Sdr, Swr, Cache,
    Lwc1, Pref, Lqc2, Ld, Swc1, Sqc2, Sd,

    // SPECIAL
    Sll, Srl, Sra, Sllv, Srlv, Srav, Jr, Jalr,
    Movz, Movn, Syscall, Break, Sync,
    Mfhi, Mthi, Mflo, Mtlo, Dsllv, Dsrlv, Dsrav,
    Mult, Multu, Div, Divu,
    Add, Addu, Sub, Subu, And, Or, Xor, Nor,
    Mfsa, Mtsa, Slt, Sltu, Dadd, Daddu, Dsub, Dsubu,
    Tge, Tgeu, Tlt, Tltu, Teq, Tne,
    Dsll, Dsrl, Dsra, Dsll32, Dsrl32, Dsra32,

    // REGIMM
    Bltz, Bgez, Bltzl, Bgezl,
    Tgei, Tgeiu, Tlti, Tltiu, Teqi, Tnei,
    Bltzal, Bgezal, Bltzall, Bgezall,
    Mtsab, Mtsah,

    // COP0
    Mfc0, Mtc0, Bc0f, Bc0t, Bc0fl, Bc0tl,
    Tlbr, Tlbwi, Tlbwr, Tlbp, Eret, Ei, Di,

    // COP1
    Mfc1, Cfc1, Mtc1, Ctc1, Bc1f, Bc1t, Bc1fl, Bc1tl,
    AddS, SubS, MulS, DivS, SqrtS, AbsS, MovS, NegS, RsqrtS,
    AddaS, SubaS, MulaS, MaddS, MsubS, MaddaS, MsubaS,
    CvtWS, MaxS, MinS, CF, CEq, CLt, CLe, CvtSW,

    // COP2 (VU0 macro mode)
    Qmfc2, Cfc2, Qmtc2, Ctc2, Bc2f, Bc2t, Bc2fl, Bc2tl, Cop2Macro,

    // MMI
    Madd, Maddu, Plzcw,
    Mfhi1, Mthi1, Mflo1, Mtlo1,
    Mult1, Multu1, Div1, Divu1, Madd1, Maddu1,
    Pmfhl, Pmthl,
    Psllh, Psrlh, Psrah, Psllw, Psrlw, Psraw,

    // MMI0
    Paddw, Psubw, Pcgtw, Pmaxw, Paddh, Psubh, Pcgth, Pmaxh,
    Paddb, Psubb, Pcgtb,
    Paddsw, Psubsw, Pextlw, Ppacw, Paddsh, Psubsh, Pextlh, Ppach,
    Paddsb, Psubsb, Pextlb, Ppacb, Pext5, Ppac5,

    // MMI1
    Pabsw, Pceqw, Pminw, Padsbh, Pabsh, Pceqh, Pminh, Pceqb,
    Padduw, Psubuw, Pextuw, Padduh, Psubuh, Pextuh,
    Paddub, Psubub, Pextub, Qfsrv,

    // MMI2
    Pmaddw, Psllvw, Psrlvw, Pmsubw, Pmfhi, Pmflo, Pinth,
    Pmultw, Pdivw, Pcpyld, Pmaddh, Phmadh, Pand, Pxor,
    Pmsubh, Phmsbh, Pexeh, Prevh, Pmulth, Pdivbw, Pexew, Prot3w,

    // MMI3
    Pmadduw, Psravw, Pmthi, Pmtlo, Pinteh, Pmultuw, Pdivuw, Pcpyud,
    Por, Pnor, Pexch, Pcpyh, Pexcw,
}

/// Cycle-cost class bound at decode time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleClass {
    Alu,
    Branch,
    Load,
    Store,
    Multiply,
    Divide,
    FpuMultiply,
    FpuDivide,
    Coprocessor,
}

impl CycleClass {
    /// Cycles charged for one retirement
    pub const fn cycles(self) -> u32 {
        match self {
            CycleClass::Alu => 1,
            CycleClass::Branch => 2,
            CycleClass::Load => 1,
            CycleClass::Store => 1,
            CycleClass::Multiply => 4,
            CycleClass::Divide => 37,
            CycleClass::FpuMultiply => 4,
            CycleClass::FpuDivide => 8,
            CycleClass::Coprocessor => 2,
        }
    }
}

/// Control-flow shape of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchClass {
    /// Falls through
    None,
    /// Always transfers, delay slot always executes
    Unconditional,
    /// May transfer, delay slot always executes
    Conditional,
    /// May transfer, delay slot is skipped when not taken
    ConditionalLikely,
    /// Enters or leaves an exception handler, no delay slot
    TrapLike,
}

impl BranchClass {
    /// Whether this instruction ends a basic block
    pub const fn ends_block(self) -> bool {
        !matches!(self, BranchClass::None)
    }

    /// Whether a delay slot follows
    pub const fn has_delay_slot(self) -> bool {
        matches!(
            self,
            BranchClass::Unconditional | BranchClass::Conditional | BranchClass::ConditionalLikely
        )
    }
}

impl Opcode {
    /// Cost class of this instruction
    pub const fn cycle_class(self) -> CycleClass {
        use Opcode::*;
        match self {
            J | Jal | Jr | Jalr | Beq | Bne | Blez | Bgtz | Beql | Bnel | Blezl | Bgtzl
            | Bltz | Bgez | Bltzl | Bgezl | Bltzal | Bgezal | Bltzall | Bgezall | Bc0f
            | Bc0t | Bc0fl | Bc0tl | Bc1f | Bc1t | Bc1fl | Bc1tl | Bc2f | Bc2t | Bc2fl
            | Bc2tl | Eret | Syscall | Break => CycleClass::Branch,

            Lb | Lh | Lwl | Lw | Lbu | Lhu | Lwr | Lwu | Ld | Ldl | Ldr | Lq | Lwc1
            | Lqc2 => CycleClass::Load,

            Sb | Sh | Swl | Sw | Swr | Sd | Sdl | Sdr | Sq | Swc1 | Sqc2 => CycleClass::Store,

            Mult | Multu | Mult1 | Multu1 | Madd | Maddu | Madd1 | Maddu1 | Pmultw
            | Pmultuw | Pmaddw | Pmadduw | Pmsubw | Pmulth | Pmaddh | Pmsubh | Phmadh
            | Phmsbh => CycleClass::Multiply,

            Div | Divu | Div1 | Divu1 | Pdivw | Pdivuw | Pdivbw => CycleClass::Divide,

            AddS | SubS | MulS | AddaS | SubaS | MulaS | MaddS | MsubS | MaddaS | MsubaS => {
                CycleClass::FpuMultiply
            }

            DivS | SqrtS | RsqrtS => CycleClass::FpuDivide,

            Mfc0 | Mtc0 | Mfc1 | Cfc1 | Mtc1 | Ctc1 | Qmfc2 | Cfc2 | Qmtc2 | Ctc2
            | Cop2Macro | AbsS | MovS | NegS | CvtWS | CvtSW | MaxS | MinS | CF | CEq
            | CLt | CLe | Tlbr | Tlbwi | Tlbwr | Tlbp | Ei | Di => CycleClass::Coprocessor,

            _ => CycleClass::Alu,
        }
    }

    /// Control-flow class of this instruction
    pub const fn branch_class(self) -> BranchClass {
        use Opcode::*;
        match self {
            J | Jal | Jr | Jalr => BranchClass::Unconditional,
            Beq | Bne | Blez | Bgtz | Bltz | Bgez | Bltzal | Bgezal | Bc0f | Bc0t | Bc1f
            | Bc1t | Bc2f | Bc2t => BranchClass::Conditional,
            Beql | Bnel | Blezl | Bgtzl | Bltzl | Bgezl | Bltzall | Bgezall | Bc0fl
            | Bc0tl | Bc1fl | Bc1tl | Bc2fl | Bc2tl => BranchClass::ConditionalLikely,
            Syscall | Break | Eret | Tge | Tgeu | Tlt | Tltu | Teq | Tne | Tgei | Tgeiu
            | Tlti | Tltiu | Teqi | Tnei | Invalid => BranchClass::TrapLike,
            _ => BranchClass::None,
        }
    }
}

/// A fully decoded instruction
///
/// Produced once per opcode and either executed immediately or stored in a
/// cached block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedInstruction {
    /// Raw opcode
    pub raw: u32,
    /// Handler selector
    pub op: Opcode,
    /// Source register (FPU: format field)
    pub rs: u8,
    /// Target register (FPU: ft)
    pub rt: u8,
    /// Destination register (FPU: fs)
    pub rd: u8,
    /// Shift amount (FPU: fd, MMI: sub-function)
    pub sa: u8,
    /// Raw 16-bit immediate
    pub imm: u16,
    /// Branch displacement in bytes, relative to the delay slot
    pub offset: i32,
    /// 26-bit jump target field
    pub target: u32,
    /// Cost class
    pub cycles: CycleClass,
    /// Control-flow class
    pub branch: BranchClass,
}

impl DecodedInstruction {
    /// Sign-extended immediate
    #[inline(always)]
    pub fn simm(&self) -> i64 {
        self.imm as i16 as i64
    }

    #[inline(always)]
    pub fn fs(&self) -> u8 {
        self.rd
    }

    #[inline(always)]
    pub fn ft(&self) -> u8 {
        self.rt
    }

    #[inline(always)]
    pub fn fd(&self) -> u8 {
        self.sa
    }
}

use Opcode::*;

#[rustfmt::skip]
const PRIMARY: [Opcode; 64] = [
    // 0x00
    Invalid, Invalid, J, Jal, Beq, Bne, Blez, Bgtz,
    // 0x08
    Addi, Addiu, Slti, Sltiu, Andi, Ori, Xori, Lui,
    // 0x10
    Invalid, Invalid, Invalid, Invalid, Beql, Bnel, Blezl, Bgtzl,
    // 0x18
    Daddi, Daddiu, Ldl, Ldr, Invalid, Invalid, Lq, Sq,
    // 0x20
    Lb, Lh, Lwl, Lw, Lbu, Lhu, Lwr, Lwu,
    // 0x28
    Sb, Sh, Swl, Sw, Sdl, Sdr, Swr, Cache,
    // 0x30
    Invalid, Lwc1, Invalid, Pref, Invalid, Invalid, Lqc2, Ld,
    // 0x38
    Invalid, Swc1, Invalid, Invalid, Invalid, Invalid, Sqc2, Sd,
];

#[rustfmt::skip]
const SPECIAL: [Opcode; 64] = [
    // 0x00
    Sll, Invalid, Srl, Sra, Sllv, Invalid, Srlv, Srav,
    // 0x08
    Jr, Jalr, Movz, Movn, Syscall, Break, Invalid, Sync,
    // 0x10
    Mfhi, Mthi, Mflo, Mtlo, Dsllv, Invalid, Dsrlv, Dsrav,
    // 0x18
    Mult, Multu, Div, Divu, Invalid, Invalid, Invalid, Invalid,
    // 0x20
    Add, Addu, Sub, Subu, And, Or, Xor, Nor,
    // 0x28
    Mfsa, Mtsa, Slt, Sltu, Dadd, Daddu, Dsub, Dsubu,
    // 0x30
    Tge, Tgeu, Tlt, Tltu, Teq, Invalid, Tne, Invalid,
    // 0x38
    Dsll, Invalid, Dsrl, Dsra, Dsll32, Invalid, Dsrl32, Dsra32,
];

#[rustfmt::skip]
const REGIMM: [Opcode; 32] = [
    // 0x00
    Bltz, Bgez, Bltzl, Bgezl, Invalid, Invalid, Invalid, Invalid,
    // 0x08
    Tgei, Tgeiu, Tlti, Tltiu, Teqi, Invalid, Tnei, Invalid,
    // 0x10
    Bltzal, Bgezal, Bltzall, Bgezall, Invalid, Invalid, Invalid, Invalid,
    // 0x18
    Mtsab, Mtsah, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid,
];

#[rustfmt::skip]
const MMI: [Opcode; 64] = [
    // 0x00
    Madd, Maddu, Invalid, Invalid, Plzcw, Invalid, Invalid, Invalid,
    // 0x08 (MMI0 and MMI2 are resolved before this table is consulted)
    Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid,
    // 0x10
    Mfhi1, Mthi1, Mflo1, Mtlo1, Invalid, Invalid, Invalid, Invalid,
    // 0x18
    Mult1, Multu1, Div1, Divu1, Invalid, Invalid, Invalid, Invalid,
    // 0x20
    Madd1, Maddu1, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid,
    // 0x28 (MMI1 and MMI3 likewise)
    Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid,
    // 0x30
    Pmfhl, Pmthl, Invalid, Invalid, Psllh, Invalid, Psrlh, Psrah,
    // 0x38
    Invalid, Invalid, Invalid, Invalid, Psllw, Invalid, Psrlw, Psraw,
];

#[rustfmt::skip]
const MMI0: [Opcode; 32] = [
    // 0x00
    Paddw, Psubw, Pcgtw, Pmaxw, Paddh, Psubh, Pcgth, Pmaxh,
    // 0x08
    Paddb, Psubb, Pcgtb, Invalid, Invalid, Invalid, Invalid, Invalid,
    // 0x10
    Paddsw, Psubsw, Pextlw, Ppacw, Paddsh, Psubsh, Pextlh, Ppach,
    // 0x18
    Paddsb, Psubsb, Pextlb, Ppacb, Invalid, Invalid, Pext5, Ppac5,
];

#[rustfmt::skip]
const MMI1: [Opcode; 32] = [
    // 0x00
    Invalid, Pabsw, Pceqw, Pminw, Padsbh, Pabsh, Pceqh, Pminh,
    // 0x08
    Invalid, Invalid, Pceqb, Invalid, Invalid, Invalid, Invalid, Invalid,
    // 0x10
    Padduw, Psubuw, Pextuw, Invalid, Padduh, Psubuh, Pextuh, Invalid,
    // 0x18
    Paddub, Psubub, Pextub, Qfsrv, Invalid, Invalid, Invalid, Invalid,
];

#[rustfmt::skip]
const MMI2: [Opcode; 32] = [
    // 0x00
    Pmaddw, Invalid, Psllvw, Psrlvw, Pmsubw, Invalid, Invalid, Invalid,
    // 0x08
    Pmfhi, Pmflo, Pinth, Invalid, Pmultw, Pdivw, Pcpyld, Invalid,
    // 0x10
    Pmaddh, Phmadh, Pand, Pxor, Pmsubh, Phmsbh, Invalid, Invalid,
    // 0x18
    Invalid, Invalid, Pexeh, Prevh, Pmulth, Pdivbw, Pexew, Prot3w,
];

#[rustfmt::skip]
const MMI3: [Opcode; 32] = [
    // 0x00
    Pmadduw, Invalid, Invalid, Psravw, Invalid, Invalid, Invalid, Invalid,
    // 0x08
    Pmthi, Pmtlo, Pinteh, Invalid, Pmultuw, Pdivuw, Pcpyud, Invalid,
    // 0x10
    Invalid, Invalid, Por, Pnor, Invalid, Invalid, Invalid, Invalid,
    // 0x18
    Invalid, Invalid, Pexch, Pcpyh, Invalid, Invalid, Pexcw, Invalid,
];

const COP0_C0: [Opcode; 64] = {
    let mut table = [Invalid; 64];
    table[0x01] = Tlbr;
    table[0x02] = Tlbwi;
    table[0x06] = Tlbwr;
    table[0x08] = Tlbp;
    table[0x18] = Eret;
    table[0x38] = Ei;
    table[0x39] = Di;
    table
};

const COP1_S: [Opcode; 64] = {
    let mut table = [Invalid; 64];
    table[0x00] = AddS;
    table[0x01] = SubS;
    table[0x02] = MulS;
    table[0x03] = DivS;
    table[0x04] = SqrtS;
    table[0x05] = AbsS;
    table[0x06] = MovS;
    table[0x07] = NegS;
    table[0x16] = RsqrtS;
    table[0x18] = AddaS;
    table[0x19] = SubaS;
    table[0x1A] = MulaS;
    table[0x1C] = MaddS;
    table[0x1D] = MsubS;
    table[0x1E] = MaddaS;
    table[0x1F] = MsubaS;
    table[0x24] = CvtWS;
    table[0x28] = MaxS;
    table[0x29] = MinS;
    table[0x30] = CF;
    table[0x32] = CEq;
    table[0x34] = CLt;
    table[0x36] = CLe;
    table
};

const BC0: [Opcode; 4] = [Bc0f, Bc0t, Bc0fl, Bc0tl];
const BC1: [Opcode; 4] = [Bc1f, Bc1t, Bc1fl, Bc1tl];
const BC2: [Opcode; 4] = [Bc2f, Bc2t, Bc2fl, Bc2tl];

#[inline(always)]
fn field_rs(raw: u32) -> usize {
    ((raw >> 21) & 0x1F) as usize
}

#[inline(always)]
fn field_rt(raw: u32) -> usize {
    ((raw >> 16) & 0x1F) as usize
}

#[inline(always)]
fn field_sa(raw: u32) -> usize {
    ((raw >> 6) & 0x1F) as usize
}

#[inline(always)]
fn field_funct(raw: u32) -> usize {
    (raw & 0x3F) as usize
}

/// Branch-on-coprocessor: only rt 0-3 are defined
#[inline(always)]
fn branch_cond(table: &[Opcode; 4], raw: u32) -> Opcode {
    let rt = field_rt(raw);
    if rt < 4 {
        table[rt]
    } else {
        Invalid
    }
}

fn select_cop0(raw: u32) -> Opcode {
    match field_rs(raw) {
        0x00 => Mfc0,
        0x04 => Mtc0,
        0x08 => branch_cond(&BC0, raw),
        0x10 => COP0_C0[field_funct(raw)],
        _ => Invalid,
    }
}

fn select_cop1(raw: u32) -> Opcode {
    match field_rs(raw) {
        0x00 => Mfc1,
        0x02 => Cfc1,
        0x04 => Mtc1,
        0x06 => Ctc1,
        0x08 => branch_cond(&BC1, raw),
        0x10 => COP1_S[field_funct(raw)],
        0x14 if field_funct(raw) == 0x20 => CvtSW,
        _ => Invalid,
    }
}

fn select_cop2(raw: u32) -> Opcode {
    match field_rs(raw) {
        0x01 => Qmfc2,
        0x02 => Cfc2,
        0x05 => Qmtc2,
        0x06 => Ctc2,
        0x08 => branch_cond(&BC2, raw),
        0x10..=0x1F => Cop2Macro,
        _ => Invalid,
    }
}

fn select_mmi(raw: u32) -> Opcode {
    match field_funct(raw) {
        0x08 => MMI0[field_sa(raw)],
        0x09 => MMI2[field_sa(raw)],
        0x28 => MMI1[field_sa(raw)],
        0x29 => MMI3[field_sa(raw)],
        funct => MMI[funct],
    }
}

/// Select the handler for a raw opcode
#[inline]
pub fn select(raw: u32) -> Opcode {
    match raw >> 26 {
        0x00 => SPECIAL[field_funct(raw)],
        0x01 => REGIMM[field_rt(raw)],
        0x10 => select_cop0(raw),
        0x11 => select_cop1(raw),
        0x12 => select_cop2(raw),
        0x1C => select_mmi(raw),
        primary => PRIMARY[primary as usize],
    }
}

/// Decode a raw opcode
///
/// Pure: identical input always yields an identical record.
///
/// # Example
///
/// ```
/// use ps2rx::core::cpu::{decode, BranchClass, Opcode};
///
/// // beql $t0, $zero, +16
/// let instr = decode(0x5100_0004);
/// assert_eq!(instr.op, Opcode::Beql);
/// assert_eq!(instr.offset, 16);
/// assert_eq!(instr.branch, BranchClass::ConditionalLikely);
/// ```
pub fn decode(raw: u32) -> DecodedInstruction {
    let op = select(raw);
    let imm = (raw & 0xFFFF) as u16;
    DecodedInstruction {
        raw,
        op,
        rs: field_rs(raw) as u8,
        rt: field_rt(raw) as u8,
        rd: ((raw >> 11) & 0x1F) as u8,
        sa: field_sa(raw) as u8,
        imm,
        offset: ((imm as i16) as i32) << 2,
        target: raw & 0x03FF_FFFF,
        cycles: op.cycle_class(),
        branch: op.branch_class(),
    }
}
