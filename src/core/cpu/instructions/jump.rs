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
    // === Jump Instructions ===

    /// J: Jump
    ///
    /// Jumps within the current 256MB region.
    ///
    /// Format: j target
    /// Operation: PC = (delay_slot & 0xF0000000) | (target << 2)
    pub(in crate::core::cpu) fn op_j(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.next_pc = (self.pc & 0xF000_0000) | (i.target << 2);
        self.branch_pending = true;
        Ok(())
    }

    /// JAL: Jump and Link
    ///
    /// Format: jal target
    /// Operation: r31 = PC + 8; PC = (delay_slot & 0xF0000000) | (target << 2)
    pub(in crate::core::cpu) fn op_jal(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(31, self.next_pc as u64);
        self.op_j(i)
    }

    /// JR: Jump Register
    ///
    /// A misaligned target faults when it is fetched.
    ///
    /// Format: jr rs
    /// Operation: PC = rs
    pub(in crate::core::cpu) fn op_jr(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.next_pc = self.reg32(i.rs);
        self.branch_pending = true;
        Ok(())
    }

    /// JALR: Jump and Link Register
    ///
    /// Format: jalr rd, rs
    /// Operation: rd = PC + 8; PC = rs
    pub(in crate::core::cpu) fn op_jalr(&mut self, i: &DecodedInstruction) -> Result<()> {
        let target = self.reg32(i.rs);
        self.set_reg(i.rd, self.next_pc as u64);
        self.next_pc = target;
        self.branch_pending = true;
        Ok(())
    }
}
