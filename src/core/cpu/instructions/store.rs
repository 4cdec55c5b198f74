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
    // === Store Instructions ===

    /// SB: Store Byte
    ///
    /// Format: sb rt, offset(rs)
    /// Operation: memory8[rs + sign_extend(offset)] = rt[7:0]
    pub(in crate::core::cpu) fn op_sb(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let value = self.reg32(i.rt) as u8;
        self.guard(bus.write8(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// SH: Store Halfword
    pub(in crate::core::cpu) fn op_sh(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let value = self.reg32(i.rt) as u16;
        self.guard(bus.write16(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// SW: Store Word
    ///
    /// Format: sw rt, offset(rs)
    /// Operation: memory32[rs + sign_extend(offset)] = rt[31:0]
    pub(in crate::core::cpu) fn op_sw(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let value = self.reg32(i.rt);
        self.guard(bus.write32(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// SD: Store Doubleword
    pub(in crate::core::cpu) fn op_sd(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let value = self.reg(i.rt);
        self.guard(bus.write64(addr, value), ExceptionCause::AddressErrorStore)?;
        Ok(())
    }

    /// SQ: Store Quadword (low four address bits ignored)
    pub(in crate::core::cpu) fn op_sq(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i) & !0xF;
        bus.write128(addr, self.gpr(i.rt))
    }

    /// SWL: Store Word Left
    ///
    /// Stores the most significant bytes of rt into memory from the
    /// effective address up to the end of its aligned word.
    pub(in crate::core::cpu) fn op_swl(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let aligned = addr & !3;
        let shift = (addr & 3) * 8;
        let mem = bus.read32(aligned)?;

        let merged = (mem & (0xFFFF_FF00u32 << shift)) | (self.reg32(i.rt) >> (24 - shift));
        bus.write32(aligned, merged)
    }

    /// SWR: Store Word Right
    pub(in crate::core::cpu) fn op_swr(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let aligned = addr & !3;
        let shift = (addr & 3) * 8;
        let mem = bus.read32(aligned)?;

        let merged = (mem & (0x00FF_FFFFu32 >> (24 - shift))) | (self.reg32(i.rt) << shift);
        bus.write32(aligned, merged)
    }

    /// SDL: Store Doubleword Left
    pub(in crate::core::cpu) fn op_sdl(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let aligned = addr & !7;
        let shift = (addr & 7) * 8;
        let mem = bus.read64(aligned)?;

        let merged = (mem & (0xFFFF_FFFF_FFFF_FF00u64 << shift)) | (self.reg(i.rt) >> (56 - shift));
        bus.write64(aligned, merged)
    }

    /// SDR: Store Doubleword Right
    pub(in crate::core::cpu) fn op_sdr(&mut self, i: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        let addr = self.effective_address(i);
        let aligned = addr & !7;
        let shift = (addr & 7) * 8;
        let mem = bus.read64(aligned)?;

        let merged = (mem & (0x00FF_FFFF_FFFF_FFFFu64 >> (56 - shift))) | (self.reg(i.rt) << shift);
        bus.write64(aligned, merged)
    }
}
