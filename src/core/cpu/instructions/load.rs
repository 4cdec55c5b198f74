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
use crate::core::memory::Bus;

impl CPU {
    // === Load Instructions ===
    //
    // The EE has no load delay slot. Misaligned addresses raise
    // AddressErrorLoad and leave the target register untouched.

    /// LB: Load Byte (sign-extended)
    ///
    /// Format: lb rt, offset(rs)
    /// Operation: rt = sign_extend(memory8[rs + sign_extend(offset)])
    pub(in crate::core::cpu) fn op_lb(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read8(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value as i8 as i64 as u64);
        }
        Ok(())
    }

    /// LBU: Load Byte Unsigned
    pub(in crate::core::cpu) fn op_lbu(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read8(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value as u64);
        }
        Ok(())
    }

    /// LH: Load Halfword (sign-extended)
    ///
    /// The address must be 2-byte aligned.
    pub(in crate::core::cpu) fn op_lh(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read16(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value as i16 as i64 as u64);
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_lhu(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read16(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value as u64);
        }
        Ok(())
    }

    /// LW: Load Word (sign-extended)
    ///
    /// Format: lw rt, offset(rs)
    /// Operation: rt = sign_extend(memory32[rs + sign_extend(offset)])
    pub(in crate::core::cpu) fn op_lw(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read32(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg_sx32(i.rt, value);
        }
        Ok(())
    }

    /// LWU: Load Word Unsigned
    pub(in crate::core::cpu) fn op_lwu(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read32(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value as u64);
        }
        Ok(())
    }

    /// LD: Load Doubleword
    pub(in crate::core::cpu) fn op_ld(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        if let Some(value) = self.guard(bus.read64(addr), ExceptionCause::AddressErrorLoad)? {
            self.set_reg(i.rt, value);
        }
        Ok(())
    }

    /// LQ: Load Quadword
    ///
    /// The low four address bits are ignored, so LQ never faults on
    /// alignment. Writes all 128 bits of rt.
    pub(in crate::core::cpu) fn op_lq(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i) & !0xF;
        let value = bus.read128(addr)?;
        self.set_gpr(i.rt, value);
        Ok(())
    }

    /// LWL: Load Word Left
    ///
    /// Merges the bytes from the effective address up to the end of its
    /// aligned word into the most significant end of rt. The result is
    /// sign-extended.
    ///
    /// Format: lwl rt, offset(rs)
    pub(in crate::core::cpu) fn op_lwl(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let shift = (addr & 3) * 8;
        let mem = bus.read32(addr & !3)?;

        let mask = 0x00FF_FFFFu32 >> shift;
        let merged = (self.reg32(i.rt) & mask) | (mem << (24 - shift));
        self.set_reg_sx32(i.rt, merged);
        Ok(())
    }

    /// LWR: Load Word Right
    ///
    /// Merges the bytes from the start of the aligned word up to the
    /// effective address into the least significant end of rt. Only a full
    /// word load (offset 0) sign-extends; otherwise bits 63..32 are kept.
    ///
    /// Format: lwr rt, offset(rs)
    pub(in crate::core::cpu) fn op_lwr(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let shift = (addr & 3) * 8;
        let mem = bus.read32(addr & !3)?;

        let mask = 0xFFFF_FF00u32 << (24 - shift);
        let merged = (self.reg32(i.rt) & mask) | (mem >> shift);
        if shift == 0 {
            self.set_reg_sx32(i.rt, merged);
        } else {
            let upper = self.reg(i.rt) & 0xFFFF_FFFF_0000_0000;
            self.set_reg(i.rt, upper | merged as u64);
        }
        Ok(())
    }

    /// LDL: Load Doubleword Left
    pub(in crate::core::cpu) fn op_ldl(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let shift = (addr & 7) * 8;
        let mem = bus.read64(addr & !7)?;

        let mask = 0x00FF_FFFF_FFFF_FFFFu64 >> shift;
        self.set_reg(i.rt, (self.reg(i.rt) & mask) | (mem << (56 - shift)));
        Ok(())
    }

    /// LDR: Load Doubleword Right
    pub(in crate::core::cpu) fn op_ldr(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let shift = (addr & 7) * 8;
        let mem = bus.read64(addr & !7)?;

        let mask = 0xFFFF_FFFF_FFFF_FF00u64 << (56 - shift);
        self.set_reg(i.rt, (self.reg(i.rt) & mask) | (mem >> shift));
        Ok(())
    }
}
