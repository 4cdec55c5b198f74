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

use super::super::cop0::{Status, COP0};
use super::super::decode::{DecodedInstruction, Opcode};
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;

impl CPU {
    // === Exception Instructions ===

    /// SYSCALL: System Call
    ///
    /// Raises a Syscall exception. The call number in $v1 is recorded so
    /// the execution driver can react to FlushCache.
    ///
    /// Format: syscall code
    pub(in crate::core::cpu) fn op_syscall(&mut self, _i: &DecodedInstruction) -> Result<()> {
        let number = self.reg32(3);
        log::trace!("SYSCALL 0x{:02X} at PC=0x{:08X}", number, self.current_pc);
        self.last_syscall = Some(number);
        self.exception(ExceptionCause::Syscall);
        Ok(())
    }

    /// BREAK: Breakpoint
    ///
    /// Format: break code
    pub(in crate::core::cpu) fn op_break(&mut self, _i: &DecodedInstruction) -> Result<()> {
        self.exception(ExceptionCause::Breakpoint);
        Ok(())
    }

    /// TGE/TGEU/TLT/TLTU/TEQ/TNE: Trap on register comparison
    ///
    /// Format: teq rs, rt
    pub(in crate::core::cpu) fn op_trap(&mut self, i: &DecodedInstruction) -> Result<()> {
        let (a, b) = (self.reg(i.rs), self.reg(i.rt));
        let taken = match i.op {
            Opcode::Tge => (a as i64) >= (b as i64),
            Opcode::Tgeu => a >= b,
            Opcode::Tlt => (a as i64) < (b as i64),
            Opcode::Tltu => a < b,
            Opcode::Teq => a == b,
            _ => a != b,
        };
        if taken {
            self.exception(ExceptionCause::Trap);
        }
        Ok(())
    }

    /// TGEI/TGEIU/TLTI/TLTIU/TEQI/TNEI: Trap on immediate comparison
    ///
    /// The immediate is sign-extended for both signed and unsigned forms.
    pub(in crate::core::cpu) fn op_trap_imm(&mut self, i: &DecodedInstruction) -> Result<()> {
        let (a, b) = (self.reg(i.rs), i.simm() as u64);
        let taken = match i.op {
            Opcode::Tgei => (a as i64) >= (b as i64),
            Opcode::Tgeiu => a >= b,
            Opcode::Tlti => (a as i64) < (b as i64),
            Opcode::Tltiu => a < b,
            Opcode::Teqi => a == b,
            _ => a != b,
        };
        if taken {
            self.exception(ExceptionCause::Trap);
        }
        Ok(())
    }

    /// ERET: Exception Return
    ///
    /// Returns to ErrorEPC and clears ERL if a level-2 exception is active,
    /// otherwise returns to EPC and clears EXL. ERET has no delay slot.
    ///
    /// Format: eret
    pub(in crate::core::cpu) fn op_eret(&mut self, _i: &DecodedInstruction) -> Result<()> {
        if !self.cop0_usable() {
            self.coprocessor_unusable(0);
            return Ok(());
        }

        let mut status = self.cop0.status();
        let target = if status.contains(Status::ERL) {
            status.remove(Status::ERL);
            self.cop0.regs[COP0::ERROR_EPC]
        } else {
            status.remove(Status::EXL);
            self.cop0.regs[COP0::EPC]
        };
        self.cop0.set_status(status);

        log::trace!("ERET to 0x{:08X}", target);
        self.pc = target;
        self.next_pc = target.wrapping_add(4);
        Ok(())
    }
}
