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

//! Session-owned backing memory and the fast-path page table
//!
//! Every direct-mapped window (main RAM, IOP RAM, boot ROM) lives in one
//! [`MemoryArena`]. The arena also carries a flat table with one entry per
//! 64KB physical page; a hit lets the bus perform the access in place without
//! walking the peripheral ranges.

/// Page granularity of the fast-path table
pub const PAGE_SHIFT: u32 = 16;

const PAGE_SIZE: u32 = 1 << PAGE_SHIFT;

/// Physical space is 512MB after segment masking
const PAGE_COUNT: usize = (0x2000_0000u32 >> PAGE_SHIFT) as usize;

/// Backing buffer a fast-path page points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastRegion {
    Ram,
    IopRam,
    Rom,
}

/// One fast-path table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    /// Backing buffer
    pub region: FastRegion,
    /// Byte offset of this page inside the buffer
    pub base: usize,
    /// Writes are dropped when false
    pub writable: bool,
}

/// Result of an in-place write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastWrite {
    /// Written to the given buffer
    Done(FastRegion),
    /// Page is read-only
    ReadOnly,
    /// No fast-path entry for this page
    Miss,
}

/// Direct-mapped memory owned by one emulator session
pub struct MemoryArena {
    ram: Vec<u8>,
    iop_ram: Vec<u8>,
    rom: Vec<u8>,
    pages: Box<[Option<PageEntry>]>,
}

impl MemoryArena {
    /// Main RAM size (32MB)
    pub const RAM_SIZE: usize = 32 * 1024 * 1024;
    /// IOP RAM size (2MB)
    pub const IOP_RAM_SIZE: usize = 2 * 1024 * 1024;
    /// Boot ROM size (4MB)
    pub const ROM_SIZE: usize = 4 * 1024 * 1024;

    pub const RAM_START: u32 = 0x0000_0000;
    pub const IOP_RAM_START: u32 = 0x1C00_0000;
    pub const ROM_START: u32 = 0x1FC0_0000;

    /// Allocate zeroed memory and build the page table
    pub fn new() -> Self {
        let mut arena = Self {
            ram: vec![0u8; Self::RAM_SIZE],
            iop_ram: vec![0u8; Self::IOP_RAM_SIZE],
            rom: vec![0u8; Self::ROM_SIZE],
            pages: vec![None; PAGE_COUNT].into_boxed_slice(),
        };

        arena.map(Self::RAM_START, Self::RAM_SIZE, FastRegion::Ram, true);
        arena.map(Self::IOP_RAM_START, Self::IOP_RAM_SIZE, FastRegion::IopRam, true);
        arena.map(Self::ROM_START, Self::ROM_SIZE, FastRegion::Rom, false);
        arena
    }

    fn map(&mut self, start: u32, len: usize, region: FastRegion, writable: bool) {
        let first = (start >> PAGE_SHIFT) as usize;
        let count = len / PAGE_SIZE as usize;
        for i in 0..count {
            self.pages[first + i] = Some(PageEntry {
                region,
                base: i * PAGE_SIZE as usize,
                writable,
            });
        }
    }

    /// Look up the fast-path entry for a physical address
    #[inline(always)]
    pub fn page(&self, paddr: u32) -> Option<PageEntry> {
        self.pages
            .get((paddr >> PAGE_SHIFT) as usize)
            .copied()
            .flatten()
    }

    #[inline(always)]
    fn buffer(&self, region: FastRegion) -> &[u8] {
        match region {
            FastRegion::Ram => &self.ram,
            FastRegion::IopRam => &self.iop_ram,
            FastRegion::Rom => &self.rom,
        }
    }

    #[inline(always)]
    fn buffer_mut(&mut self, region: FastRegion) -> &mut [u8] {
        match region {
            FastRegion::Ram => &mut self.ram,
            FastRegion::IopRam => &mut self.iop_ram,
            FastRegion::Rom => &mut self.rom,
        }
    }

    /// Read `N` bytes in place
    ///
    /// `paddr` must be `N`-aligned so the access never straddles a page.
    #[inline(always)]
    pub fn read<const N: usize>(&self, paddr: u32) -> Option<[u8; N]> {
        let page = self.page(paddr)?;
        let offset = page.base + (paddr & (PAGE_SIZE - 1)) as usize;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer(page.region)[offset..offset + N]);
        Some(out)
    }

    /// Write `N` bytes in place
    #[inline(always)]
    pub fn write<const N: usize>(&mut self, paddr: u32, bytes: [u8; N]) -> FastWrite {
        let Some(page) = self.page(paddr) else {
            return FastWrite::Miss;
        };
        if !page.writable {
            return FastWrite::ReadOnly;
        }
        let offset = page.base + (paddr & (PAGE_SIZE - 1)) as usize;
        self.buffer_mut(page.region)[offset..offset + N].copy_from_slice(&bytes);
        FastWrite::Done(page.region)
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Copy an image into the start of the boot ROM
    ///
    /// The rest of the ROM is zero filled. Returns false if the image does
    /// not fit.
    pub fn load_rom(&mut self, image: &[u8]) -> bool {
        if image.len() > Self::ROM_SIZE {
            return false;
        }
        self.rom.fill(0);
        self.rom[..image.len()].copy_from_slice(image);
        true
    }

    /// Zero the volatile windows, keeping ROM
    pub fn clear_volatile(&mut self) {
        self.ram.fill(0);
        self.iop_ram.fill(0);
    }
}

impl Default for MemoryArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_table_layout() {
        let arena = MemoryArena::new();

        let page = arena.page(0x0001_2345).unwrap();
        assert_eq!(page.region, FastRegion::Ram);
        assert_eq!(page.base, 0x1_0000);
        assert!(page.writable);

        assert_eq!(arena.page(0x01FF_FFFF).unwrap().region, FastRegion::Ram);
        assert!(arena.page(0x0200_0000).is_none());

        let rom = arena.page(0x1FC1_0000).unwrap();
        assert_eq!(rom.region, FastRegion::Rom);
        assert!(!rom.writable);

        assert_eq!(arena.page(0x1C00_0000).unwrap().region, FastRegion::IopRam);
        assert!(arena.page(0x1000_F000).is_none());
    }

    #[test]
    fn test_read_write_in_place() {
        let mut arena = MemoryArena::new();

        assert_eq!(
            arena.write::<4>(0x0010_0000, 0xCAFE_BABEu32.to_le_bytes()),
            FastWrite::Done(FastRegion::Ram)
        );
        assert_eq!(arena.read::<4>(0x0010_0000), Some(0xCAFE_BABEu32.to_le_bytes()));
        assert_eq!(arena.ram()[0x0010_0000], 0xBE);
    }

    #[test]
    fn test_rom_is_read_only() {
        let mut arena = MemoryArena::new();
        assert!(arena.load_rom(&[1, 2, 3, 4]));

        assert_eq!(arena.write::<1>(0x1FC0_0000, [0xFF]), FastWrite::ReadOnly);
        assert_eq!(arena.read::<4>(0x1FC0_0000), Some([1, 2, 3, 4]));
    }

    #[test]
    fn test_miss_outside_windows() {
        let mut arena = MemoryArena::new();
        assert_eq!(arena.read::<4>(0x1000_0000), None);
        assert_eq!(arena.write::<4>(0x1000_0000, [0; 4]), FastWrite::Miss);
    }

    #[test]
    fn test_rom_too_large() {
        let mut arena = MemoryArena::new();
        assert!(!arena.load_rom(&vec![0u8; MemoryArena::ROM_SIZE + 1]));
    }
}
