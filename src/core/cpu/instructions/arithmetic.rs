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
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;

impl CPU {
    // === Arithmetic Instructions ===

    /// ADD: Add Word (with overflow exception)
    ///
    /// Adds the low words of two registers with signed overflow detection.
    /// On overflow the destination is left unchanged and an Overflow
    /// exception is raised.
    ///
    /// Format: add rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] + rt[31:0])
    ///
    /// # Arguments
    ///
    /// * `i` - Decoded instruction
    ///
    /// # Returns
    ///
    /// Ok(()) on success (exception is triggered internally on overflow)
    pub(in crate::core::cpu) fn op_add(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg32(i.rs) as i32;
        let b = self.reg32(i.rt) as i32;

        match a.checked_add(b) {
            Some(result) => {
                self.set_reg_sx32(i.rd, result as u32);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    /// ADDU: Add Unsigned Word (no overflow exception)
    ///
    /// Format: addu rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] + rt[31:0])
    pub(in crate::core::cpu) fn op_addu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg32(i.rs).wrapping_add(self.reg32(i.rt));
        self.set_reg_sx32(i.rd, result);
        Ok(())
    }

    /// SUB: Subtract Word (with overflow exception)
    ///
    /// Format: sub rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] - rt[31:0])
    pub(in crate::core::cpu) fn op_sub(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg32(i.rs) as i32;
        let b = self.reg32(i.rt) as i32;

        match a.checked_sub(b) {
            Some(result) => {
                self.set_reg_sx32(i.rd, result as u32);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    /// SUBU: Subtract Unsigned Word
    pub(in crate::core::cpu) fn op_subu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg32(i.rs).wrapping_sub(self.reg32(i.rt));
        self.set_reg_sx32(i.rd, result);
        Ok(())
    }

    /// ADDI: Add Immediate Word (with overflow exception)
    ///
    /// Format: addi rt, rs, imm
    /// Operation: rt = sign_extend(rs[31:0] + sign_extend(imm))
    pub(in crate::core::cpu) fn op_addi(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg32(i.rs) as i32;

        match a.checked_add(i.simm() as i32) {
            Some(result) => {
                self.set_reg_sx32(i.rt, result as u32);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    /// ADDIU: Add Immediate Unsigned Word
    ///
    /// Despite the name the immediate is sign-extended; only the overflow
    /// check is skipped.
    ///
    /// Format: addiu rt, rs, imm
    /// Operation: rt = sign_extend(rs[31:0] + sign_extend(imm))
    pub(in crate::core::cpu) fn op_addiu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg32(i.rs).wrapping_add(i.simm() as u32);
        self.set_reg_sx32(i.rt, result);
        Ok(())
    }

    /// DADD: Doubleword Add (with overflow exception)
    ///
    /// Format: dadd rd, rs, rt
    /// Operation: rd = rs + rt (64-bit)
    pub(in crate::core::cpu) fn op_dadd(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg(i.rs) as i64;
        let b = self.reg(i.rt) as i64;

        match a.checked_add(b) {
            Some(result) => {
                self.set_reg(i.rd, result as u64);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    pub(in crate::core::cpu) fn op_daddu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg(i.rs).wrapping_add(self.reg(i.rt));
        self.set_reg(i.rd, result);
        Ok(())
    }

    /// DSUB: Doubleword Subtract (with overflow exception)
    pub(in crate::core::cpu) fn op_dsub(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg(i.rs) as i64;
        let b = self.reg(i.rt) as i64;

        match a.checked_sub(b) {
            Some(result) => {
                self.set_reg(i.rd, result as u64);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    pub(in crate::core::cpu) fn op_dsubu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg(i.rs).wrapping_sub(self.reg(i.rt));
        self.set_reg(i.rd, result);
        Ok(())
    }

    /// DADDI: Doubleword Add Immediate (with overflow exception)
    pub(in crate::core::cpu) fn op_daddi(&mut self, i: &DecodedInstruction) -> Result<()> {
        let a = self.reg(i.rs) as i64;

        match a.checked_add(i.simm()) {
            Some(result) => {
                self.set_reg(i.rt, result as u64);
                Ok(())
            }
            None => {
                self.exception(ExceptionCause::Overflow);
                Ok(())
            }
        }
    }

    pub(in crate::core::cpu) fn op_daddiu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg(i.rs).wrapping_add(i.simm() as u64);
        self.set_reg(i.rt, result);
        Ok(())
    }

    // === Comparison Instructions ===

    /// SLT: Set on Less Than (signed, 64-bit)
    ///
    /// Format: slt rd, rs, rt
    /// Operation: rd = (rs < rt) ? 1 : 0
    pub(in crate::core::cpu) fn op_slt(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = (self.reg(i.rs) as i64) < (self.reg(i.rt) as i64);
        self.set_reg(i.rd, result as u64);
        Ok(())
    }

    /// SLTU: Set on Less Than Unsigned
    pub(in crate::core::cpu) fn op_sltu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg(i.rs) < self.reg(i.rt);
        self.set_reg(i.rd, result as u64);
        Ok(())
    }

    /// SLTI: Set on Less Than Immediate (signed)
    ///
    /// Format: slti rt, rs, imm
    /// Operation: rt = (rs < sign_extend(imm)) ? 1 : 0
    pub(in crate::core::cpu) fn op_slti(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = (self.reg(i.rs) as i64) < i.simm();
        self.set_reg(i.rt, result as u64);
        Ok(())
    }

    /// SLTIU: Set on Less Than Immediate Unsigned
    ///
    /// The immediate is sign-extended, then both sides compare unsigned.
    pub(in crate::core::cpu) fn op_sltiu(&mut self, i: &DecodedInstruction) -> Result<()> {
        let result = self.reg(i.rs) < i.simm() as u64;
        self.set_reg(i.rt, result as u64);
        Ok(())
    }
}
