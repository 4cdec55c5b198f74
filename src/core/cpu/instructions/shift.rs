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

use super::super::decode::DecodedInstruction;
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    // === Word Shifts ===
    //
    // Operate on the low word and sign-extend the 32-bit result.

    /// SLL: Shift Left Logical
    ///
    /// Format: sll rd, rt, sa
    /// Operation: rd = sign_extend(rt[31:0] << sa)
    ///
    /// Note: SLL r0, r0, 0 is the canonical NOP
    pub(in crate::core::cpu) fn op_sll(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg_sx32(i.rd, self.reg32(i.rt) << i.sa);
        Ok(())
    }

    /// SRL: Shift Right Logical
    ///
    /// Format: srl rd, rt, sa
    /// Operation: rd = sign_extend(rt[31:0] >> sa)
    pub(in crate::core::cpu) fn op_srl(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg_sx32(i.rd, self.reg32(i.rt) >> i.sa);
        Ok(())
    }

    /// SRA: Shift Right Arithmetic
    ///
    /// Format: sra rd, rt, sa
    /// Operation: rd = sign_extend((rt[31:0] as i32) >> sa)
    pub(in crate::core::cpu) fn op_sra(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg_sx32(i.rd, ((self.reg32(i.rt) as i32) >> i.sa) as u32);
        Ok(())
    }

    /// SLLV: Shift Left Logical Variable (amount = rs & 0x1F)
    pub(in crate::core::cpu) fn op_sllv(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x1F;
        self.set_reg_sx32(i.rd, self.reg32(i.rt) << shift);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srlv(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x1F;
        self.set_reg_sx32(i.rd, self.reg32(i.rt) >> shift);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srav(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x1F;
        self.set_reg_sx32(i.rd, ((self.reg32(i.rt) as i32) >> shift) as u32);
        Ok(())
    }

    // === Doubleword Shifts ===

    /// DSLL: Doubleword Shift Left Logical
    ///
    /// Format: dsll rd, rt, sa
    /// Operation: rd = rt << sa
    pub(in crate::core::cpu) fn op_dsll(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rt) << i.sa);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsrl(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rt) >> i.sa);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsra(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, ((self.reg(i.rt) as i64) >> i.sa) as u64);
        Ok(())
    }

    /// DSLL32: Doubleword Shift Left Logical + 32
    ///
    /// Format: dsll32 rd, rt, sa
    /// Operation: rd = rt << (sa + 32)
    pub(in crate::core::cpu) fn op_dsll32(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rt) << (i.sa as u32 + 32));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsrl32(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rt) >> (i.sa as u32 + 32));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsra32(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, ((self.reg(i.rt) as i64) >> (i.sa as u32 + 32)) as u64);
        Ok(())
    }

    /// DSLLV: Doubleword Shift Left Logical Variable (amount = rs & 0x3F)
    pub(in crate::core::cpu) fn op_dsllv(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x3F;
        self.set_reg(i.rd, self.reg(i.rt) << shift);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsrlv(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x3F;
        self.set_reg(i.rd, self.reg(i.rt) >> shift);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_dsrav(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.reg32(i.rs) & 0x3F;
        self.set_reg(i.rd, ((self.reg(i.rt) as i64) >> shift) as u64);
        Ok(())
    }
}
