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
    // === Logical Instructions ===
    //
    // All operate on the low doubleword.

    /// AND: Bitwise AND
    ///
    /// Format: and rd, rs, rt
    /// Operation: rd = rs & rt
    pub(in crate::core::cpu) fn op_and(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rs) & self.reg(i.rt));
        Ok(())
    }

    /// OR: Bitwise OR
    ///
    /// Format: or rd, rs, rt
    /// Operation: rd = rs | rt
    pub(in crate::core::cpu) fn op_or(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rs) | self.reg(i.rt));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_xor(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.reg(i.rs) ^ self.reg(i.rt));
        Ok(())
    }

    /// NOR: Bitwise NOR
    ///
    /// Format: nor rd, rs, rt
    /// Operation: rd = !(rs | rt)
    pub(in crate::core::cpu) fn op_nor(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, !(self.reg(i.rs) | self.reg(i.rt)));
        Ok(())
    }

    /// ANDI: AND Immediate (zero-extended)
    ///
    /// Format: andi rt, rs, imm
    /// Operation: rt = rs & zero_extend(imm)
    pub(in crate::core::cpu) fn op_andi(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rt, self.reg(i.rs) & i.imm as u64);
        Ok(())
    }

    /// ORI: OR Immediate (zero-extended)
    ///
    /// Format: ori rt, rs, imm
    /// Operation: rt = rs | zero_extend(imm)
    pub(in crate::core::cpu) fn op_ori(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rt, self.reg(i.rs) | i.imm as u64);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_xori(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rt, self.reg(i.rs) ^ i.imm as u64);
        Ok(())
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = sign_extend(imm << 16)
    pub(in crate::core::cpu) fn op_lui(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg_sx32(i.rt, (i.imm as u32) << 16);
        Ok(())
    }

    /// MOVZ: Move on Zero
    ///
    /// Format: movz rd, rs, rt
    /// Operation: if rt == 0 { rd = rs }
    pub(in crate::core::cpu) fn op_movz(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.reg(i.rt) == 0 {
            self.set_reg(i.rd, self.reg(i.rs));
        }
        Ok(())
    }

    /// MOVN: Move on Not Zero
    pub(in crate::core::cpu) fn op_movn(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.reg(i.rt) != 0 {
            self.set_reg(i.rd, self.reg(i.rs));
        }
        Ok(())
    }
}
