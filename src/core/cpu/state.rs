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

//! CPU save state capture and restore

use super::CPU;
use crate::core::save_state::{CpuState, StateSave};

impl StateSave for CPU {
    type State = CpuState;

    fn to_state(&self) -> CpuState {
        CpuState {
            gprs: self.regs,
            hi: self.hi,
            lo: self.lo,
            sa: self.sa,
            pc: self.pc,
            next_pc: self.next_pc,
            branch_pending: self.branch_pending,
            cop0_regs: self.cop0.regs,
            fpr: self.fpu.fpr,
            fcr31: self.fpu.fcr31,
            fpu_acc: self.fpu.acc,
            vf: std::array::from_fn(|n| self.cop2.read_vf(n)),
            vi: std::array::from_fn(|n| self.cop2.read_control(n)),
        }
    }

    /// Transient per-instruction flags are cleared; the COP2 collaborator
    /// receives the saved register files through its trait.
    fn restore_from_state(&mut self, state: &CpuState) {
        self.regs = state.gprs;
        self.regs[0] = 0;
        self.hi = state.hi;
        self.lo = state.lo;
        self.sa = state.sa;
        self.pc = state.pc;
        self.next_pc = state.next_pc;
        self.current_pc = state.pc;
        self.branch_pending = state.branch_pending;
        self.delay_slot_active = false;
        self.exception_raised = false;
        self.current_instruction = 0;
        self.last_syscall = None;
        self.reset_pending = false;

        self.cop0.regs = state.cop0_regs;
        self.fpu.fpr = state.fpr;
        self.fpu.fcr31 = state.fcr31;
        self.fpu.acc = state.fpu_acc;

        for n in 1..32 {
            self.cop2.write_vf(n, state.vf[n]);
            self.cop2.write_control(n, state.vi[n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpu::cop0::COP0;

    #[test]
    fn test_round_trip_restores_every_file() {
        let mut cpu = CPU::new();
        cpu.set_gpr(7, 0x0123_4567_89AB_CDEF_FEDC_BA98_7654_3210);
        cpu.set_hi(5);
        cpu.set_lo(1u128 << 70);
        cpu.set_pc(0x8000_2000);
        cpu.set_cop0_reg(COP0::EPC, 0x8000_0400);
        cpu.set_fpr(31, 0x4000_0000);
        cpu.cop2_mut().write_vf(4, 0xAAAA);
        cpu.cop2_mut().write_control(2, 9);

        let state = cpu.to_state();
        let mut other = CPU::new();
        other.restore_from_state(&state);

        assert_eq!(other.gpr(7), cpu.gpr(7));
        assert_eq!(other.hi(), 5);
        assert_eq!(other.lo(), 1u128 << 70);
        assert_eq!(other.pc(), 0x8000_2000);
        assert_eq!(other.next_pc(), 0x8000_2004);
        assert_eq!(other.cop0_reg(COP0::EPC), 0x8000_0400);
        assert_eq!(other.fpr(31), 0x4000_0000);
        assert_eq!(other.cop2().read_vf(4), 0xAAAA);
        assert_eq!(other.cop2().read_control(2), 9);
        assert_eq!(other.to_state(), state);
    }

    #[test]
    fn test_restore_keeps_r0_zero() {
        let mut state = CPU::new().to_state();
        state.gprs[0] = 0xFFFF;

        let mut cpu = CPU::new();
        cpu.restore_from_state(&state);

        assert_eq!(cpu.gpr(0), 0);
    }
}
