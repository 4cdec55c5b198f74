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

//! Memory region identification and address translation
//!
//! The EE splits its 32-bit virtual space into the classic MIPS segments.
//! KSEG0 and KSEG1 are unmapped windows onto the 512MB physical space. KUSEG,
//! KSSEG and KSEG3 go through the TLB on real hardware; the TLB is not
//! modeled, so those segments are direct-mapped with the same mask unless the
//! bus runs in strict MMU mode.

use super::Bus;
use crate::core::error::{EmulatorError, Result};

/// Virtual address segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// 0x00000000-0x7FFFFFFF, mapped
    Kuseg,
    /// 0x80000000-0x9FFFFFFF, unmapped cached
    Kseg0,
    /// 0xA0000000-0xBFFFFFFF, unmapped uncached
    Kseg1,
    /// 0xC0000000-0xDFFFFFFF, mapped supervisor
    Ksseg,
    /// 0xE0000000-0xFFFFFFFF, mapped kernel
    Kseg3,
}

impl Segment {
    /// Classify a virtual address
    pub fn of(vaddr: u32) -> Self {
        match vaddr >> 29 {
            0..=3 => Segment::Kuseg,
            4 => Segment::Kseg0,
            5 => Segment::Kseg1,
            6 => Segment::Ksseg,
            _ => Segment::Kseg3,
        }
    }

    /// Whether real hardware would translate this segment through the TLB
    pub fn is_mapped(self) -> bool {
        !matches!(self, Segment::Kseg0 | Segment::Kseg1)
    }
}

/// Physical memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM (32MB)
    RAM,
    /// Scratchpad (16KB, virtual window only)
    Scratchpad,
    /// EE hardware registers (timers, IPU, GIF, VIF, DMAC, INTC, SIO)
    IO,
    /// VU0/VU1 code and data memory
    VU,
    /// GS privileged registers
    GS,
    /// IOP RAM as seen from the EE (2MB)
    IopRam,
    /// Boot ROM (4MB)
    BIOS,
    /// Nothing answers here
    Unmapped,
}

impl Bus {
    /// Scratchpad virtual window
    pub const SCRATCHPAD_START: u32 = 0x7000_0000;
    pub const SCRATCHPAD_SIZE: usize = 16 * 1024;

    const IO_START: u32 = 0x1000_0000;
    const IO_END: u32 = 0x1000_FFFF;
    const VU_START: u32 = 0x1100_0000;
    const VU_END: u32 = 0x1100_FFFF;
    const GS_START: u32 = 0x1200_0000;
    const GS_END: u32 = 0x1200_1FFF;

    /// Check whether a virtual address falls in the scratchpad window
    #[inline(always)]
    pub(super) fn in_scratchpad(vaddr: u32) -> bool {
        vaddr.wrapping_sub(Self::SCRATCHPAD_START) < Self::SCRATCHPAD_SIZE as u32
    }

    /// Translate a virtual address to a physical bus address
    ///
    /// - KSEG0/KSEG1: top 3 bits masked off
    /// - KUSEG/KSSEG/KSEG3: same mask, or
    ///   [`EmulatorError::UnmodeledCapability`] in strict MMU mode
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::memory::Bus;
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.translate_address(0x8000_1234).unwrap(), 0x0000_1234);
    /// assert_eq!(bus.translate_address(0xBFC0_0000).unwrap(), 0x1FC0_0000);
    /// assert_eq!(bus.translate_address(0x2010_0000).unwrap(), 0x0010_0000);
    /// ```
    #[inline(always)]
    pub fn translate_address(&self, vaddr: u32) -> Result<u32> {
        if self.strict_mmu && Segment::of(vaddr).is_mapped() {
            log::warn!("TLB translation required for 0x{:08X}", vaddr);
            return Err(EmulatorError::UnmodeledCapability(
                "TLB-mapped address translation",
            ));
        }
        Ok(vaddr & 0x1FFF_FFFF)
    }

    /// Identify the region a virtual address lands in
    ///
    /// Uses the placeholder direct mapping regardless of strict MMU mode.
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::memory::{Bus, MemoryRegion};
    ///
    /// let bus = Bus::new();
    ///
    /// assert_eq!(bus.identify_region(0x8000_0000), MemoryRegion::RAM);
    /// assert_eq!(bus.identify_region(0x7000_0000), MemoryRegion::Scratchpad);
    /// assert_eq!(bus.identify_region(0xB000_F000), MemoryRegion::IO);
    /// assert_eq!(bus.identify_region(0xBFC0_0000), MemoryRegion::BIOS);
    /// assert_eq!(bus.identify_region(0x0400_0000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, vaddr: u32) -> MemoryRegion {
        if Self::in_scratchpad(vaddr) {
            return MemoryRegion::Scratchpad;
        }

        let paddr = vaddr & 0x1FFF_FFFF;
        if let Some(page) = self.arena.page(paddr) {
            return match page.region {
                super::FastRegion::Ram => MemoryRegion::RAM,
                super::FastRegion::IopRam => MemoryRegion::IopRam,
                super::FastRegion::Rom => MemoryRegion::BIOS,
            };
        }

        if (Self::IO_START..=Self::IO_END).contains(&paddr) {
            MemoryRegion::IO
        } else if (Self::VU_START..=Self::VU_END).contains(&paddr) {
            MemoryRegion::VU
        } else if (Self::GS_START..=Self::GS_END).contains(&paddr) {
            MemoryRegion::GS
        } else {
            MemoryRegion::Unmapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_classification() {
        assert_eq!(Segment::of(0x0000_0000), Segment::Kuseg);
        assert_eq!(Segment::of(0x7FFF_FFFF), Segment::Kuseg);
        assert_eq!(Segment::of(0x8000_0000), Segment::Kseg0);
        assert_eq!(Segment::of(0xA000_0000), Segment::Kseg1);
        assert_eq!(Segment::of(0xC000_0000), Segment::Ksseg);
        assert_eq!(Segment::of(0xFFFF_FFFF), Segment::Kseg3);

        assert!(!Segment::Kseg0.is_mapped());
        assert!(!Segment::Kseg1.is_mapped());
        assert!(Segment::Kuseg.is_mapped());
    }

    #[test]
    fn test_scratchpad_window() {
        assert!(Bus::in_scratchpad(0x7000_0000));
        assert!(Bus::in_scratchpad(0x7000_3FFF));
        assert!(!Bus::in_scratchpad(0x7000_4000));
        assert!(!Bus::in_scratchpad(0x6FFF_FFFF));
    }
}
