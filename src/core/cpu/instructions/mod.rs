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

//! CPU instruction implementations
//!
//! Handlers are grouped by instruction family. Every handler takes the
//! decoded record, so block replay never touches the raw opcode again.

use super::decode::{DecodedInstruction, Opcode};
use super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

mod arithmetic;
mod branch;
mod cop0;
mod cop1;
mod cop2;
mod exception;
mod jump;
mod load;
mod logical;
mod mmi;
mod mmi_multiply;
mod mmi_pack;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Execute one decoded instruction
    ///
    /// `pc`/`next_pc` have already been advanced past the instruction.
    pub(super) fn dispatch(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        use Opcode::*;
        match i.op {
            Invalid => self.op_reserved(i),

            // Arithmetic
            Add => self.op_add(i),
            Addu => self.op_addu(i),
            Sub => self.op_sub(i),
            Subu => self.op_subu(i),
            Addi => self.op_addi(i),
            Addiu => self.op_addiu(i),
            Dadd => self.op_dadd(i),
            Daddu => self.op_daddu(i),
            Dsub => self.op_dsub(i),
            Dsubu => self.op_dsubu(i),
            Daddi => self.op_daddi(i),
            Daddiu => self.op_daddiu(i),
            Slt => self.op_slt(i),
            Sltu => self.op_sltu(i),
            Slti => self.op_slti(i),
            Sltiu => self.op_sltiu(i),

            // Logical
            And => self.op_and(i),
            Or => self.op_or(i),
            Xor => self.op_xor(i),
            Nor => self.op_nor(i),
            Andi => self.op_andi(i),
            Ori => self.op_ori(i),
            Xori => self.op_xori(i),
            Lui => self.op_lui(i),
            Movz => self.op_movz(i),
            Movn => self.op_movn(i),

            // Shift
            Sll => self.op_sll(i),
            Srl => self.op_srl(i),
            Sra => self.op_sra(i),
            Sllv => self.op_sllv(i),
            Srlv => self.op_srlv(i),
            Srav => self.op_srav(i),
            Dsll => self.op_dsll(i),
            Dsrl => self.op_dsrl(i),
            Dsra => self.op_dsra(i),
            Dsll32 => self.op_dsll32(i),
            Dsrl32 => self.op_dsrl32(i),
            Dsra32 => self.op_dsra32(i),
            Dsllv => self.op_dsllv(i),
            Dsrlv => self.op_dsrlv(i),
            Dsrav => self.op_dsrav(i),

            // Multiply/divide, HI/LO, SA
            Mult => self.op_mult(i, 0),
            Multu => self.op_multu(i, 0),
            Div => self.op_div(i, 0),
            Divu => self.op_divu(i, 0),
            Madd => self.op_madd(i, 0),
            Maddu => self.op_maddu(i, 0),
            Mult1 => self.op_mult(i, 1),
            Multu1 => self.op_multu(i, 1),
            Div1 => self.op_div(i, 1),
            Divu1 => self.op_divu(i, 1),
            Madd1 => self.op_madd(i, 1),
            Maddu1 => self.op_maddu(i, 1),
            Mfhi => self.op_mfhi(i, 0),
            Mflo => self.op_mflo(i, 0),
            Mthi => self.op_mthi(i, 0),
            Mtlo => self.op_mtlo(i, 0),
            Mfhi1 => self.op_mfhi(i, 1),
            Mflo1 => self.op_mflo(i, 1),
            Mthi1 => self.op_mthi(i, 1),
            Mtlo1 => self.op_mtlo(i, 1),
            Mfsa => self.op_mfsa(i),
            Mtsa => self.op_mtsa(i),
            Mtsab => self.op_mtsab(i),
            Mtsah => self.op_mtsah(i),

            // Branches and jumps
            Beq => self.op_beq(i),
            Bne => self.op_bne(i),
            Blez => self.op_blez(i),
            Bgtz => self.op_bgtz(i),
            Beql => self.op_beql(i),
            Bnel => self.op_bnel(i),
            Blezl => self.op_blezl(i),
            Bgtzl => self.op_bgtzl(i),
            Bltz | Bgez | Bltzl | Bgezl | Bltzal | Bgezal | Bltzall | Bgezall => {
                self.op_regimm_branch(i)
            }
            J => self.op_j(i),
            Jal => self.op_jal(i),
            Jr => self.op_jr(i),
            Jalr => self.op_jalr(i),

            // Loads
            Lb => self.op_lb(i, bus),
            Lbu => self.op_lbu(i, bus),
            Lh => self.op_lh(i, bus),
            Lhu => self.op_lhu(i, bus),
            Lw => self.op_lw(i, bus),
            Lwu => self.op_lwu(i, bus),
            Ld => self.op_ld(i, bus),
            Lq => self.op_lq(i, bus),
            Lwl => self.op_lwl(i, bus),
            Lwr => self.op_lwr(i, bus),
            Ldl => self.op_ldl(i, bus),
            Ldr => self.op_ldr(i, bus),

            // Stores
            Sb => self.op_sb(i, bus),
            Sh => self.op_sh(i, bus),
            Sw => self.op_sw(i, bus),
            Sd => self.op_sd(i, bus),
            Sq => self.op_sq(i, bus),
            Swl => self.op_swl(i, bus),
            Swr => self.op_swr(i, bus),
            Sdl => self.op_sdl(i, bus),
            Sdr => self.op_sdr(i, bus),

            // Cache control and ordering
            Cache | Pref | Sync => Ok(()),

            // Exceptions and traps
            Syscall => self.op_syscall(i),
            Break => self.op_break(i),
            Tge | Tgeu | Tlt | Tltu | Teq | Tne => self.op_trap(i),
            Tgei | Tgeiu | Tlti | Tltiu | Teqi | Tnei => self.op_trap_imm(i),
            Eret => self.op_eret(i),

            // COP0
            Mfc0 => self.op_mfc0(i),
            Mtc0 => self.op_mtc0(i),
            Bc0f | Bc0t | Bc0fl | Bc0tl => self.op_bc0(i),
            Tlbr | Tlbwi | Tlbwr | Tlbp => self.op_tlb(i),
            Ei => self.op_ei(i),
            Di => self.op_di(i),

            // COP1
            Mfc1 => self.op_mfc1(i),
            Mtc1 => self.op_mtc1(i),
            Cfc1 => self.op_cfc1(i),
            Ctc1 => self.op_ctc1(i),
            Bc1f | Bc1t | Bc1fl | Bc1tl => self.op_bc1(i),
            Lwc1 => self.op_lwc1(i, bus),
            Swc1 => self.op_swc1(i, bus),
            AddS | SubS | MulS | DivS | SqrtS | RsqrtS | AbsS | MovS | NegS | MaxS | MinS
            | CvtWS | CvtSW => self.op_fpu_arith(i),
            AddaS | SubaS | MulaS | MaddaS | MsubaS | MaddS | MsubS => self.op_fpu_acc(i),
            CF | CEq | CLt | CLe => self.op_fpu_compare(i),

            // COP2
            Qmfc2 => self.op_qmfc2(i),
            Qmtc2 => self.op_qmtc2(i),
            Cfc2 => self.op_cfc2(i),
            Ctc2 => self.op_ctc2(i),
            Bc2f | Bc2t | Bc2fl | Bc2tl => self.op_bc2(i),
            Lqc2 => self.op_lqc2(i, bus),
            Sqc2 => self.op_sqc2(i, bus),
            Cop2Macro => self.op_cop2_macro(i),

            // MMI: lane arithmetic
            Paddw | Psubw | Pcgtw | Pmaxw | Paddh | Psubh | Pcgth | Pmaxh | Paddb | Psubb
            | Pcgtb | Paddsw | Psubsw | Paddsh | Psubsh | Paddsb | Psubsb | Pabsw | Pceqw
            | Pminw | Padsbh | Pabsh | Pceqh | Pminh | Pceqb | Padduw | Psubuw | Padduh
            | Psubuh | Paddub | Psubub | Pand | Por | Pxor | Pnor => self.op_mmi_lanes(i),
            Psllh | Psrlh | Psrah | Psllw | Psrlw | Psraw => self.op_mmi_shift(i),
            Psllvw | Psrlvw | Psravw => self.op_mmi_shift_variable(i),
            Plzcw => self.op_plzcw(i),
            Qfsrv => self.op_qfsrv(i),

            // MMI: pack, extend, permute
            Pextlw | Pextlh | Pextlb | Pextuw | Pextuh | Pextub | Ppacw | Ppach | Ppacb
            | Pext5 | Ppac5 | Pinth | Pinteh | Pcpyld | Pcpyud | Pcpyh | Pexeh | Prevh
            | Pexew | Prot3w | Pexch | Pexcw => self.op_mmi_permute(i),

            // MMI: HI/LO
            Pmfhi | Pmflo | Pmthi | Pmtlo => self.op_mmi_hilo_move(i),
            Pmfhl => self.op_pmfhl(i),
            Pmthl => self.op_pmthl(i),
            Pmultw | Pmultuw | Pmaddw | Pmadduw | Pmsubw => self.op_mmi_word_multiply(i),
            Pdivw | Pdivuw => self.op_mmi_word_divide(i),
            Pdivbw => self.op_pdivbw(i),
            Pmulth | Pmaddh | Pmsubh => self.op_mmi_halfword_multiply(i),
            Phmadh | Phmsbh => self.op_mmi_halfword_horizontal(i),
        }
    }

    /// Undefined opcode: raise ReservedInstruction
    fn op_reserved(&mut self, i: &DecodedInstruction) -> Result<()> {
        log::warn!(
            "Reserved instruction 0x{:08X} at PC=0x{:08X}",
            i.raw,
            self.current_pc
        );
        self.exception(ExceptionCause::ReservedInstruction);
        Ok(())
    }

    /// Effective address `rs + simm` of a load/store
    #[inline(always)]
    fn effective_address(&self, i: &DecodedInstruction) -> u32 {
        self.reg32(i.rs).wrapping_add(i.simm() as u32)
    }

    /// Turn a misaligned bus access into an address error
    ///
    /// Returns `Ok(None)` if the exception was raised. Any other bus error
    /// is propagated.
    fn guard<T>(&mut self, result: Result<T>, cause: ExceptionCause) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(crate::core::error::EmulatorError::UnalignedAccess { address, .. }) => {
                self.address_error(cause, address);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
