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

use super::super::decode::{DecodedInstruction, Opcode};
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    // === Branch helpers ===
    //
    // Handlers run with `pc` already pointing at the delay slot, so the
    // target is `pc + offset`.

    /// Conditional branch; the delay slot executes either way
    #[inline(always)]
    pub(super) fn branch_if(&mut self, taken: bool, offset: i32) {
        if taken {
            self.next_pc = self.pc.wrapping_add(offset as u32);
        }
        self.branch_pending = true;
    }

    /// Branch likely; the delay slot is skipped when not taken
    #[inline(always)]
    pub(super) fn branch_likely(&mut self, taken: bool, offset: i32) {
        if taken {
            self.next_pc = self.pc.wrapping_add(offset as u32);
            self.branch_pending = true;
        } else {
            self.pc = self.next_pc;
            self.next_pc = self.next_pc.wrapping_add(4);
        }
    }

    // === Branch Instructions ===

    /// BEQ: Branch on Equal
    ///
    /// Format: beq rs, rt, offset
    /// Operation: if (rs == rt) PC = delay_slot + (sign_extend(offset) << 2)
    pub(in crate::core::cpu) fn op_beq(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_if(self.reg(i.rs) == self.reg(i.rt), i.offset);
        Ok(())
    }

    /// BNE: Branch on Not Equal
    pub(in crate::core::cpu) fn op_bne(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_if(self.reg(i.rs) != self.reg(i.rt), i.offset);
        Ok(())
    }

    /// BLEZ: Branch on Less Than or Equal to Zero (signed)
    pub(in crate::core::cpu) fn op_blez(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_if((self.reg(i.rs) as i64) <= 0, i.offset);
        Ok(())
    }

    /// BGTZ: Branch on Greater Than Zero (signed)
    pub(in crate::core::cpu) fn op_bgtz(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_if((self.reg(i.rs) as i64) > 0, i.offset);
        Ok(())
    }

    /// BEQL: Branch on Equal Likely
    ///
    /// Format: beql rs, rt, offset
    /// Operation: if (rs == rt) branch, else skip the delay slot
    pub(in crate::core::cpu) fn op_beql(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_likely(self.reg(i.rs) == self.reg(i.rt), i.offset);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bnel(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_likely(self.reg(i.rs) != self.reg(i.rt), i.offset);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_blezl(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_likely((self.reg(i.rs) as i64) <= 0, i.offset);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgtzl(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.branch_likely((self.reg(i.rs) as i64) > 0, i.offset);
        Ok(())
    }

    /// REGIMM branches: BLTZ, BGEZ and their likely/link forms
    ///
    /// The link forms write the return address (branch + 8) to r31 whether
    /// or not the branch is taken.
    pub(in crate::core::cpu) fn op_regimm_branch(&mut self, i: &DecodedInstruction) -> Result<()> {
        use Opcode::*;
        let negative = (self.reg(i.rs) as i64) < 0;
        let (taken, likely, link) = match i.op {
            Bltz => (negative, false, false),
            Bgez => (!negative, false, false),
            Bltzl => (negative, true, false),
            Bgezl => (!negative, true, false),
            Bltzal => (negative, false, true),
            Bgezal => (!negative, false, true),
            Bltzall => (negative, true, true),
            _ => (!negative, true, true),
        };

        if link {
            self.set_reg(31, self.next_pc as u64);
        }
        if likely {
            self.branch_likely(taken, i.offset);
        } else {
            self.branch_if(taken, i.offset);
        }
        Ok(())
    }
}
