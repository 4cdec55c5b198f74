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
    /// Raise CoprocessorUnusable(1) unless Status.CU1 is set
    fn fpu_enabled(&mut self) -> bool {
        if self.cop0.status().contains(Status::CU1) {
            true
        } else {
            self.coprocessor_unusable(1);
            false
        }
    }

    // === FPU Transfers ===

    /// MFC1: rt = sign_extend(FPR[fs])
    pub(in crate::core::cpu) fn op_mfc1(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.fpu_enabled() {
            self.set_reg_sx32(i.rt, self.fpu.fpr[i.fs() as usize]);
        }
        Ok(())
    }

    /// MTC1: FPR[fs] = rt[31:0]
    pub(in crate::core::cpu) fn op_mtc1(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.fpu_enabled() {
            self.fpu.fpr[i.fs() as usize] = self.reg32(i.rt);
        }
        Ok(())
    }

    /// CFC1: rt = sign_extend(FCR[fs])
    pub(in crate::core::cpu) fn op_cfc1(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.fpu_enabled() {
            let value = self.fpu.read_control(i.fs() as usize);
            self.set_reg_sx32(i.rt, value);
        }
        Ok(())
    }

    /// CTC1: FCR[fs] = rt[31:0]
    pub(in crate::core::cpu) fn op_ctc1(&mut self, i: &DecodedInstruction) -> Result<()> {
        if self.fpu_enabled() {
            let value = self.reg32(i.rt);
            self.fpu.write_control(i.fs() as usize, value);
        }
        Ok(())
    }

    /// LWC1: FPR[ft] = memory32[rs + offset]
    pub(in crate::core::cpu) fn op_lwc1(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read32(addr), ExceptionCause::AddressErrorLoad)? {
            self.fpu.fpr[i.ft() as usize] = value;
        }
        Ok(())
    }

    /// SWC1: memory32[rs + offset] = FPR[ft]
    pub(in crate::core::cpu) fn op_swc1(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let value = self.fpu.fpr[i.ft() as usize];
        self.guard(bus.write32(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// BC1F/BC1T/BC1FL/BC1TL: branch on FCR31.C
    pub(in crate::core::cpu) fn op_bc1(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let c = self.fpu.condition();
        match i.op {
            Opcode::Bc1f => self.branch_if(!c, i.offset),
            Opcode::Bc1t => self.branch_if(c, i.offset),
            Opcode::Bc1fl => self.branch_likely(!c, i.offset),
            _ => self.branch_likely(c, i.offset),
        }
        Ok(())
    }

    // === FPU Arithmetic ===

    /// Two-operand and unary single-precision operations writing fd
    ///
    /// Format: add.s fd, fs, ft
    /// Operation: fd = flush(fs op ft)
    ///
    /// SQRT.S reads ft, not fs.
    pub(in crate::core::cpu) fn op_fpu_arith(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let fs = self.fpu.fpr[i.fs() as usize];
        let ft = self.fpu.fpr[i.ft() as usize];

        let result = match i.op {
            Opcode::AddS => self.fpu.add(fs, ft),
            Opcode::SubS => self.fpu.sub(fs, ft),
            Opcode::MulS => self.fpu.mul(fs, ft),
            Opcode::DivS => self.fpu.div(fs, ft),
            Opcode::SqrtS => self.fpu.sqrt(ft),
            Opcode::RsqrtS => self.fpu.rsqrt(fs, ft),
            Opcode::AbsS => self.fpu.abs(fs),
            Opcode::NegS => self.fpu.neg(fs),
            Opcode::MaxS => self.fpu.max(fs, ft),
            Opcode::MinS => self.fpu.min(fs, ft),
            Opcode::CvtWS => self.fpu.cvt_w(fs),
            Opcode::CvtSW => self.fpu.cvt_s(fs),
            _ => fs,
        };
        self.fpu.fpr[i.fd() as usize] = result;
        Ok(())
    }

    /// Accumulator forms
    ///
    /// ADDA/SUBA/MULA/MADDA/MSUBA write ACC; MADD/MSUB write fd from
    /// `ACC ± fs * ft`.
    pub(in crate::core::cpu) fn op_fpu_acc(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let fs = self.fpu.fpr[i.fs() as usize];
        let ft = self.fpu.fpr[i.ft() as usize];

        match i.op {
            Opcode::AddaS => self.fpu.acc = self.fpu.add(fs, ft),
            Opcode::SubaS => self.fpu.acc = self.fpu.sub(fs, ft),
            Opcode::MulaS => self.fpu.acc = self.fpu.mul(fs, ft),
            Opcode::MaddaS => self.fpu.acc = self.fpu.madd(fs, ft),
            Opcode::MsubaS => self.fpu.acc = self.fpu.msub(fs, ft),
            Opcode::MaddS => self.fpu.fpr[i.fd() as usize] = self.fpu.madd(fs, ft),
            _ => self.fpu.fpr[i.fd() as usize] = self.fpu.msub(fs, ft),
        }
        Ok(())
    }

    /// C.F/C.EQ/C.LT/C.LE: set FCR31.C from a comparison of fs and ft
    pub(in crate::core::cpu) fn op_fpu_compare(&mut self, i: &DecodedInstruction) -> Result<()> {
        if !self.fpu_enabled() {
            return Ok(());
        }
        let fs = self.fpu.fpr[i.fs() as usize];
        let ft = self.fpu.fpr[i.ft() as usize];

        match i.op {
            Opcode::CF => self.fpu.compare(fs, ft, |_, _| false),
            Opcode::CEq => self.fpu.compare(fs, ft, |a, b| a == b),
            Opcode::CLt => self.fpu.compare(fs, ft, |a, b| a < b),
            _ => self.fpu.compare(fs, ft, |a, b| a <= b),
        }
        Ok(())
    }
}
