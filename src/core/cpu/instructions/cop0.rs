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
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    /// COP0 is always usable in kernel mode, elsewhere only with CU0
    pub(super) fn cop0_usable(&self) -> bool {
        let status = self.cop0.status();
        status.is_kernel() || status.contains(Status::CU0)
    }

    // === COP0 Instructions ===

    /// MFC0: Move From Coprocessor 0
    ///
    /// Format: mfc0 rt, rd
    /// Operation: rt = sign_extend(COP0[rd])
    pub(in crate::core::cpu) fn op_mfc0(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.cop0_usable() {
            self.coprocessor_unusable(0);
            return Ok(());
        }
        let value = self.cop0.regs[i.rd as usize];
        self.set_reg_sx32(i.rt, value);
        Ok(())
    }

    /// MTC0: Move To Coprocessor 0
    ///
    /// Format: mtc0 rt, rd
    /// Operation: COP0[rd] = rt[31:0]
    pub(in crate::core::cpu) fn op_mtc0(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.cop0_usable() {
            self.coprocessor_unusable(0);
            return Ok(());
        }
        let value = self.reg32(i.rt);
        log::trace!("MTC0 r{} = 0x{:08X}", i.rd, value);
        self.cop0.write(i.rd as usize, value);
        Ok(())
    }

    /// BC0F/BC0T/BC0FL/BC0TL
    ///
    /// CPCOND0 reflects DMA completion, which is always signalled here.
    pub(in crate::core::cpu) fn op_bc0(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.cop0_usable() {
            self.coprocessor_unusable(0);
            return Ok(());
        }
        let cpcond0 = true;
        match i.op {
            Opcode::Bc0f => self.branch_if(!cpcond0, i.offset),
            Opcode::Bc0t => self.branch_if(cpcond0, i.offset),
            Opcode::Bc0fl => self.branch_likely(!cpcond0, i.offset),
            _ => self.branch_likely(cpcond0, i.offset),
        }
        Ok(())
    }

    /// TLBR/TLBWI/TLBWR/TLBP
    ///
    /// The TLB is not modeled; the instructions are accepted and ignored.
    pub(in crate::core::cpu) fn op_tlb(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.cop0_usable() {
            self.coprocessor_unusable(0);
            return Ok(());
        }
        log::warn!(
            "{:?} at PC=0x{:08X} ignored: TLB is not modeled",
            i.op,
            self.current_pc
        );
        Ok(())
    }

    /// EI: Enable Interrupts (sets Status.EIE)
    ///
    /// Only effective in kernel mode or when Status.EDI is set.
    pub(in crate::core::cpu) fn op_ei(&mut self, _i: &DecodedInstruction) -> Result<()> {
        let status = self.cop0.status();
        if status.is_kernel() || status.contains(Status::EDI) {
            self.cop0.set_status(status | Status::EIE);
        }
        Ok(())
    }

    /// DI: Disable Interrupts (clears Status.EIE)
    pub(in crate::core::cpu) fn op_di(&mut self, _i: &DecodedInstruction) -> Result<()> {
        let status = self.cop0.status();
        if status.is_kernel() || status.contains(Status::EDI) {
            self.cop0.set_status(status - Status::EIE);
        }
        Ok(())
    }
}
