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

/// Signed word division with the R5900 edge cases
///
/// Division by zero yields quotient -1 (or 1 for a negative dividend) and
/// remainder = dividend. `i32::MIN / -1` yields `i32::MIN` remainder 0.
pub(super) fn signed_divide(n: i32, d: i32) -> (i32, i32) {
    if d == 0 {
        (if n >= 0 { -1 } else { 1 }, n)
    } else {
        (n.wrapping_div(d), n.wrapping_rem(d))
    }
}

/// Unsigned word division; by zero yields all-ones and the dividend
pub(super) fn unsigned_divide(n: u32, d: u32) -> (u32, u32) {
    if d == 0 {
        (u32::MAX, n)
    } else {
        (n / d, n % d)
    }
}

#[inline(always)]
fn sx32(value: u32) -> u64 {
    value as i32 as i64 as u64
}

impl CPU {
    // === HI/LO pipe access ===

    /// Doubleword `pipe` (0 or 1) of HI
    #[inline(always)]
    pub(super) fn hi_pipe(&self, pipe: usize) -> u64 {
        (self.hi >> (64 * pipe)) as u64
    }

    #[inline(always)]
    pub(super) fn lo_pipe(&self, pipe: usize) -> u64 {
        (self.lo >> (64 * pipe)) as u64
    }

    #[inline(always)]
    pub(super) fn set_hi_pipe(&mut self, pipe: usize, value: u64) {
        let shift = 64 * pipe;
        self.hi = (self.hi & !((u64::MAX as u128) << shift)) | ((value as u128) << shift);
    }

    #[inline(always)]
    pub(super) fn set_lo_pipe(&mut self, pipe: usize, value: u64) {
        let shift = 64 * pipe;
        self.lo = (self.lo & !((u64::MAX as u128) << shift)) | ((value as u128) << shift);
    }

    /// Store a 32-bit LO/HI pair sign-extended into one pipe
    #[inline(always)]
    pub(super) fn set_hilo_words(&mut self, pipe: usize, lo: u32, hi: u32) {
        self.set_lo_pipe(pipe, sx32(lo));
        self.set_hi_pipe(pipe, sx32(hi));
    }

    /// 64-bit accumulator formed by HI[31:0]:LO[31:0] of one pipe
    #[inline(always)]
    pub(super) fn hilo_accumulator(&self, pipe: usize) -> u64 {
        ((self.hi_pipe(pipe) as u32 as u64) << 32) | self.lo_pipe(pipe) as u32 as u64
    }

    // === Multiply/Divide Instructions ===

    /// MULT / MULT1: Multiply Word (signed)
    ///
    /// The 64-bit product is split into LO (low word) and HI (high word),
    /// each sign-extended into the selected pipe. The EE also copies LO into
    /// rd.
    ///
    /// Format: mult rd, rs, rt
    /// Operation: (HI, LO) = rs[31:0] * rt[31:0]; rd = LO
    ///
    /// # Arguments
    ///
    /// * `i` - Decoded instruction
    /// * `pipe` - 0 for MULT, 1 for MULT1
    pub(in crate::core::cpu) fn op_mult(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let a = self.reg32(i.rs) as i32 as i64;
        let b = self.reg32(i.rt) as i32 as i64;
        let product = a.wrapping_mul(b) as u64;

        self.set_hilo_words(pipe, product as u32, (product >> 32) as u32);
        self.set_reg_sx32(i.rd, product as u32);
        Ok(())
    }

    /// MULTU / MULTU1: Multiply Word (unsigned)
    pub(in crate::core::cpu) fn op_multu(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let product = self.reg32(i.rs) as u64 * self.reg32(i.rt) as u64;

        self.set_hilo_words(pipe, product as u32, (product >> 32) as u32);
        self.set_reg_sx32(i.rd, product as u32);
        Ok(())
    }

    /// DIV / DIV1: Divide Word (signed)
    ///
    /// Format: div rs, rt
    /// Operation: LO = rs / rt; HI = rs % rt
    ///
    /// Never traps; see [`signed_divide`] for the zero and overflow cases.
    pub(in crate::core::cpu) fn op_div(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let (q, r) = signed_divide(self.reg32(i.rs) as i32, self.reg32(i.rt) as i32);
        self.set_hilo_words(pipe, q as u32, r as u32);
        Ok(())
    }

    /// DIVU / DIVU1: Divide Word (unsigned)
    pub(in crate::core::cpu) fn op_divu(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let (q, r) = unsigned_divide(self.reg32(i.rs), self.reg32(i.rt));
        self.set_hilo_words(pipe, q, r);
        Ok(())
    }

    /// MADD / MADD1: Multiply-Add Word (signed)
    ///
    /// Format: madd rd, rs, rt
    /// Operation: (HI, LO) = (HI, LO) + rs[31:0] * rt[31:0]; rd = LO
    pub(in crate::core::cpu) fn op_madd(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let a = self.reg32(i.rs) as i32 as i64;
        let b = self.reg32(i.rt) as i32 as i64;
        let acc = (self.hilo_accumulator(pipe) as i64).wrapping_add(a.wrapping_mul(b)) as u64;

        self.set_hilo_words(pipe, acc as u32, (acc >> 32) as u32);
        self.set_reg_sx32(i.rd, acc as u32);
        Ok(())
    }

    /// MADDU / MADDU1: Multiply-Add Word (unsigned)
    pub(in crate::core::cpu) fn op_maddu(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        let product = self.reg32(i.rs) as u64 * self.reg32(i.rt) as u64;
        let acc = self.hilo_accumulator(pipe).wrapping_add(product);

        self.set_hilo_words(pipe, acc as u32, (acc >> 32) as u32);
        self.set_reg_sx32(i.rd, acc as u32);
        Ok(())
    }

    // === HI/LO Moves ===

    /// MFHI / MFHI1: rd = HI (selected doubleword)
    pub(in crate::core::cpu) fn op_mfhi(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        self.set_reg(i.rd, self.hi_pipe(pipe));
        Ok(())
    }

    /// MFLO / MFLO1: rd = LO (selected doubleword)
    pub(in crate::core::cpu) fn op_mflo(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        self.set_reg(i.rd, self.lo_pipe(pipe));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mthi(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        self.set_hi_pipe(pipe, self.reg(i.rs));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mtlo(&mut self, i: &DecodedInstruction, pipe: usize) -> Result<()> {
        self.set_lo_pipe(pipe, self.reg(i.rs));
        Ok(())
    }

    // === Shift Amount Register ===

    /// MFSA: rd = SA
    pub(in crate::core::cpu) fn op_mfsa(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.set_reg(i.rd, self.sa as u64);
        Ok(())
    }

    /// MTSA: SA = rs
    pub(in crate::core::cpu) fn op_mtsa(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.sa = self.reg32(i.rs);
        Ok(())
    }

    /// MTSAB: SA = byte shift ((rs ^ imm) & 0xF) expressed in bits
    pub(in crate::core::cpu) fn op_mtsab(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.sa = ((self.reg32(i.rs) ^ i.imm as u32) & 0xF) * 8;
        Ok(())
    }

    /// MTSAH: SA = halfword shift ((rs ^ imm) & 0x7) expressed in bits
    pub(in crate::core::cpu) fn op_mtsah(&mut self, i: &DecodedInstruction) -> Result<()> {
        self.sa = ((self.reg32(i.rs) ^ i.imm as u32) & 0x7) * 16;
        Ok(())
    }
}
