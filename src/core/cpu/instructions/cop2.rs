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

use super::super::cop0::Status;
use super::super::decode::{DecodedInstruction, Opcode};
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    /// Raise CoprocessorUnusable(2) unless Status.CU2 is set
    fn vu0_enabled(&mut self) -> bool {
        if self.cop0.status().contains(Status::CU2) {
            true
        } else {
            self.coprocessor_unusable(2);
            false
        }
    }

    // === COP2 (VU0 macro mode) ===

    /// QMFC2: rt = VF[rd] (all 128 bits)
    pub(in crate::core::cpu) fn op_qmfc2(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.vu0_enabled() {
            let value = self.cop2.read_vf(i.rd as usize);
            self.set_gpr(i.rt, value);
        }
        Ok(())
    }

    /// QMTC2: VF[rd] = rt (all 128 bits)
    pub(in crate::core::cpu) fn op_qmtc2(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.vu0_enabled() {
            let value = self.gpr(i.rt);
            self.cop2.write_vf(i.rd as usize, value);
        }
        Ok(())
    }

    /// CFC2: rt = sign_extend(VI/control[rd])
    pub(in crate::core::cpu) fn op_cfc2(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.vu0_enabled() {
            let value = self.cop2.read_control(i.rd as usize);
            self.set_reg_sx32(i.rt, value);
        }
        Ok(())
    }

    /// CTC2: VI/control[rd] = rt[31:0]
    pub(in crate::core::cpu) fn op_ctc2(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.vu0_enabled() {
            let value = self.reg32(i.rt);
            self.cop2.write_control(i.rd as usize, value);
        }
        Ok(())
    }

    /// BC2F/BC2T/BC2FL/BC2TL: branch on the VU0 condition
    pub(in crate::core::cpu) fn op_bc2(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.vu0_enabled() {
            return Ok(());
        }
        let c = self.cop2.branch_condition();
        match i.op {
            Opcode::Bc2f => self.branch_if(!c, i.offset),
            Opcode::Bc2t => self.branch_if(c, i.offset),
            Opcode::Bc2fl => self.branch_likely(!c, i.offset),
            _ => self.branch_likely(c, i.offset),
        }
        Ok(())
    }

    /// LQC2: VF[rt] = memory128[rs + offset]
    ///
    /// Unlike LQ, a misaligned address raises AddressErrorLoad.
    pub(in crate::core::cpu) fn op_lqc2(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        if !self.vu0_enabled() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read128(addr), ExceptionCause::AddressErrorLoad)? {
            self.cop2.write_vf(i.rt as usize, value);
        }
        Ok(())
    }

    /// SQC2: memory128[rs + offset] = VF[rt]
    pub(in crate::core::cpu) fn op_sqc2(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        if !self.vu0_enabled() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let value = self.cop2.read_vf(i.rt as usize);
        self.guard(bus.write128(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// Macro-mode VU0 instruction, forwarded to the collaborator
    pub(in crate::core::cpu) fn op_cop2_macro(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.vu0_enabled() {
            self.cop2.macro_op(i.raw);
        }
        Ok(())
    }
}
