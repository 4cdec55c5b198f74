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

//! Memory bus implementation for the Emotion Engine
//!
//! The Bus is the single entry point for every EE data and instruction
//! access. A virtual address goes through four stages:
//!
//! 1. the 16KB scratchpad window at `0x7000_0000`, served before translation
//! 2. segment translation to a physical address (see [`region`])
//! 3. the fast-path page table owned by the [`MemoryArena`] (RAM, IOP RAM, ROM)
//! 4. range dispatch to the INTC, the SIO console, then attached [`IODevice`]s
//!
//! Anything left over is unmapped: reads return zero, writes are dropped.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region       | Size   | Access |
//! |------------------------|--------------|--------|--------|
//! | 0x00000000-0x01FFFFFF  | RAM          | 32MB   | R/W    |
//! | 0x10000000-0x1000FFFF  | EE I/O       | 64KB   | R/W    |
//! | 0x11000000-0x1100FFFF  | VU memory    | 64KB   | R/W    |
//! | 0x12000000-0x12001FFF  | GS privileged| 8KB    | R/W    |
//! | 0x1C000000-0x1C1FFFFF  | IOP RAM      | 2MB    | R/W    |
//! | 0x1FC00000-0x1FFFFFFF  | BIOS ROM     | 4MB    | R only |
//!
//! # Example
//!
//! ```
//! use ps2rx::core::memory::Bus;
//!
//! let mut bus = Bus::new();
//!
//! bus.write32(0x8000_0000, 0x1234_5678).unwrap();
//! assert_eq!(bus.read32(0x0000_0000).unwrap(), 0x1234_5678);
//! assert_eq!(bus.read32(0xA000_0000).unwrap(), 0x1234_5678);
//! ```

mod arena;
mod console;
mod io_device;
mod region;

#[cfg(test)]
mod tests;

pub use arena::{FastRegion, FastWrite, MemoryArena, PageEntry, PAGE_SHIFT};
pub use console::{ConsoleHook, DebugConsole};
pub use io_device::IODevice;
pub use region::{MemoryRegion, Segment};

use crate::core::error::{EmulatorError, Result};
use crate::core::interrupt::InterruptController;
use std::cell::Cell;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Memory bus managing all EE accesses
pub struct Bus {
    /// RAM, IOP RAM, ROM and the fast-path table
    arena: MemoryArena,

    /// Scratchpad RAM (16KB)
    ///
    /// Virtual address: 0x70000000-0x70003FFF
    scratchpad: Vec<u8>,

    /// EE interrupt controller (drives INT0)
    intc: InterruptController,

    /// SIO transmit side, forwards bytes to the console hook
    console: DebugConsole,

    /// Peripherals owned by the embedder
    devices: Vec<Box<dyn IODevice>>,

    /// INT1 line level (DMAC), set by the embedder
    int1: bool,

    /// INTC_STAT reads since the driver last reset the counter
    intc_polls: Cell<u32>,

    /// Record RAM write ranges for block invalidation
    track_code_writes: bool,

    /// Physical `[start, end)` ranges written since the last drain
    code_writes: Vec<(u32, u32)>,

    /// Refuse TLB-mapped segments instead of direct-mapping them
    strict_mmu: bool,
}

impl Bus {
    /// Create a new Bus with zeroed memory and no devices attached
    pub fn new() -> Self {
        Self {
            arena: MemoryArena::new(),
            scratchpad: vec![0u8; Self::SCRATCHPAD_SIZE],
            intc: InterruptController::new(),
            console: DebugConsole::new(),
            devices: Vec::new(),
            int1: false,
            intc_polls: Cell::new(0),
            track_code_writes: false,
            code_writes: Vec::new(),
            strict_mmu: false,
        }
    }

    /// Reset the bus to its power-on state
    ///
    /// Clears RAM, IOP RAM, scratchpad and the INTC. ROM contents, attached
    /// devices and the console hook are kept.
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::memory::Bus;
    ///
    /// let mut bus = Bus::new();
    /// bus.write32(0x8000_0000, 0x1234_5678).unwrap();
    /// bus.reset();
    /// assert_eq!(bus.read32(0x8000_0000).unwrap(), 0);
    /// ```
    pub fn reset(&mut self) {
        self.arena.clear_volatile();
        self.scratchpad.fill(0);
        self.intc.reset();
        self.int1 = false;
        self.intc_polls.set(0);
        self.code_writes.clear();
    }

    /// Load a BIOS image from file
    ///
    /// # Errors
    ///
    /// - `EmulatorError::BiosNotFound` if the file cannot be opened
    /// - `EmulatorError::InvalidBiosSize` if the image is empty or larger than 4MB
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|_| EmulatorError::BiosNotFound(path.display().to_string()))?;

        let mut image = Vec::new();
        file.read_to_end(&mut image)?;
        self.load_bios_bytes(&image)?;

        log::info!("Loaded BIOS {} ({} bytes)", path.display(), image.len());
        Ok(())
    }

    /// Load a BIOS image from memory
    pub fn load_bios_bytes(&mut self, image: &[u8]) -> Result<()> {
        if image.is_empty() || !self.arena.load_rom(image) {
            return Err(EmulatorError::InvalidBiosSize {
                expected: MemoryArena::ROM_SIZE,
                got: image.len(),
            });
        }
        Ok(())
    }

    /// Copy a program image into main RAM at a physical address
    ///
    /// Used by the program-load entry point. The range is queued for block
    /// invalidation when code-write tracking is on.
    pub fn load_ram(&mut self, paddr: u32, data: &[u8]) -> Result<()> {
        let start = paddr as usize;
        let end = start
            .checked_add(data.len())
            .filter(|&end| end <= MemoryArena::RAM_SIZE)
            .ok_or_else(|| {
                EmulatorError::LoaderError(format!(
                    "{} bytes at 0x{:08X} do not fit in RAM",
                    data.len(),
                    paddr
                ))
            })?;

        self.arena.ram_mut()[start..end].copy_from_slice(data);
        if self.track_code_writes {
            self.code_writes.push((paddr, end as u32));
        }
        Ok(())
    }

    #[inline(always)]
    fn check_alignment(vaddr: u32, size: usize) -> Result<()> {
        if vaddr as usize & (size - 1) != 0 {
            return Err(EmulatorError::UnalignedAccess {
                address: vaddr,
                size: size as u8,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn read_bytes<const N: usize>(&self, vaddr: u32) -> Result<[u8; N]> {
        Self::check_alignment(vaddr, N)?;

        let mut out = [0u8; N];
        if Self::in_scratchpad(vaddr) {
            let offset = (vaddr - Self::SCRATCHPAD_START) as usize;
            out.copy_from_slice(&self.scratchpad[offset..offset + N]);
            return Ok(out);
        }

        let paddr = self.translate_address(vaddr)?;
        if let Some(bytes) = self.arena.read::<N>(paddr) {
            return Ok(bytes);
        }

        let value = self.read_slow(paddr, N)?;
        out.copy_from_slice(&value.to_le_bytes()[..N]);
        Ok(out)
    }

    #[inline(always)]
    fn write_bytes<const N: usize>(&mut self, vaddr: u32, bytes: [u8; N]) -> Result<()> {
        Self::check_alignment(vaddr, N)?;

        if Self::in_scratchpad(vaddr) {
            let offset = (vaddr - Self::SCRATCHPAD_START) as usize;
            self.scratchpad[offset..offset + N].copy_from_slice(&bytes);
            return Ok(());
        }

        let paddr = self.translate_address(vaddr)?;
        match self.arena.write::<N>(paddr, bytes) {
            FastWrite::Done(FastRegion::Ram) => {
                if self.track_code_writes {
                    self.queue_code_write(paddr, N as u32);
                }
                Ok(())
            }
            FastWrite::Done(_) => Ok(()),
            FastWrite::ReadOnly => {
                log::debug!("Ignoring {}-byte write to ROM at 0x{:08X}", N, vaddr);
                Ok(())
            }
            FastWrite::Miss => {
                let mut wide = [0u8; 16];
                wide[..N].copy_from_slice(&bytes);
                self.write_slow(paddr, N, u128::from_le_bytes(wide))
            }
        }
    }

    /// Coalesce with the previous range when the guest writes sequentially
    fn queue_code_write(&mut self, paddr: u32, len: u32) {
        if let Some(last) = self.code_writes.last_mut() {
            if last.1 == paddr {
                last.1 += len;
                return;
            }
        }
        self.code_writes.push((paddr, paddr + len));
    }

    fn read_slow(&self, paddr: u32, size: usize) -> Result<u128> {
        if self.intc.contains(paddr) {
            if paddr & !0xF == InterruptController::STAT_ADDR {
                self.intc_polls.set(self.intc_polls.get().saturating_add(1));
            }
            return Self::device_read(&self.intc, paddr, size);
        }
        if self.console.contains(paddr) {
            return Self::device_read(&self.console, paddr, size);
        }
        if let Some(device) = self.devices.iter().find(|d| d.contains(paddr)) {
            return Self::device_read(device.as_ref(), paddr, size);
        }

        self.log_unmapped("read", paddr, size);
        Ok(0)
    }

    fn write_slow(&mut self, paddr: u32, size: usize, value: u128) -> Result<()> {
        if self.intc.contains(paddr) {
            return Self::device_write(&mut self.intc, paddr, size, value);
        }
        if self.console.contains(paddr) {
            return Self::device_write(&mut self.console, paddr, size, value);
        }
        if let Some(device) = self.devices.iter_mut().find(|d| d.contains(paddr)) {
            return Self::device_write(device.as_mut(), paddr, size, value);
        }

        self.log_unmapped("write", paddr, size);
        Ok(())
    }

    fn device_read(device: &dyn IODevice, paddr: u32, size: usize) -> Result<u128> {
        let offset = paddr - device.address_range().0;
        device.read_sized(offset, size)
    }

    fn device_write(device: &mut dyn IODevice, paddr: u32, size: usize, value: u128) -> Result<()> {
        let offset = paddr - device.address_range().0;
        log::trace!(
            "{} write{} at offset 0x{:04X} = 0x{:X}",
            device.name(),
            size * 8,
            offset,
            value
        );
        device.write_sized(offset, size, value)
    }

    fn log_unmapped(&self, kind: &str, paddr: u32, size: usize) {
        match self.identify_region(paddr) {
            MemoryRegion::IO | MemoryRegion::VU | MemoryRegion::GS => {
                log::trace!("Unhandled {}{} at 0x{:08X}", kind, size * 8, paddr)
            }
            _ => log::warn!("Unmapped {}{} at 0x{:08X}", kind, size * 8, paddr),
        }
    }

    /// Read 8-bit value from memory
    pub fn read8(&self, vaddr: u32) -> Result<u8> {
        Ok(self.read_bytes::<1>(vaddr)?[0])
    }

    /// Read 16-bit value (must be 2-byte aligned)
    pub fn read16(&self, vaddr: u32) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes(vaddr)?))
    }

    /// Read 32-bit value (must be 4-byte aligned)
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::memory::Bus;
    ///
    /// let mut bus = Bus::new();
    /// bus.write32(0x8000_0000, 0x1234_5678).unwrap();
    /// assert_eq!(bus.read32(0x8000_0000).unwrap(), 0x1234_5678);
    ///
    /// // Unaligned access fails
    /// assert!(bus.read32(0x8000_0001).is_err());
    /// ```
    pub fn read32(&self, vaddr: u32) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes(vaddr)?))
    }

    /// Read 64-bit value (must be 8-byte aligned)
    pub fn read64(&self, vaddr: u32) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_bytes(vaddr)?))
    }

    /// Read 128-bit value (must be 16-byte aligned)
    pub fn read128(&self, vaddr: u32) -> Result<u128> {
        Ok(u128::from_le_bytes(self.read_bytes(vaddr)?))
    }

    /// Write 8-bit value to memory
    pub fn write8(&mut self, vaddr: u32, value: u8) -> Result<()> {
        self.write_bytes(vaddr, [value])
    }

    /// Write 16-bit value (must be 2-byte aligned)
    pub fn write16(&mut self, vaddr: u32, value: u16) -> Result<()> {
        self.write_bytes(vaddr, value.to_le_bytes())
    }

    /// Write 32-bit value (must be 4-byte aligned)
    pub fn write32(&mut self, vaddr: u32, value: u32) -> Result<()> {
        self.write_bytes(vaddr, value.to_le_bytes())
    }

    /// Write 64-bit value (must be 8-byte aligned)
    pub fn write64(&mut self, vaddr: u32, value: u64) -> Result<()> {
        self.write_bytes(vaddr, value.to_le_bytes())
    }

    /// Write 128-bit value (must be 16-byte aligned)
    pub fn write128(&mut self, vaddr: u32, value: u128) -> Result<()> {
        self.write_bytes(vaddr, value.to_le_bytes())
    }

    /// Attach a peripheral to the fallback dispatch list
    pub fn attach_device(&mut self, device: Box<dyn IODevice>) {
        let (start, end) = device.address_range();
        log::debug!(
            "Attached {} at 0x{:08X}-0x{:08X}",
            device.name(),
            start,
            end
        );
        self.devices.push(device);
    }

    /// Install the debug console byte hook
    pub fn set_console_hook(&mut self, hook: ConsoleHook) {
        self.console.set_hook(hook);
    }

    /// Remove the debug console byte hook
    pub fn clear_console_hook(&mut self) {
        self.console.clear_hook();
    }

    pub fn intc(&self) -> &InterruptController {
        &self.intc
    }

    pub fn intc_mut(&mut self) -> &mut InterruptController {
        &mut self.intc
    }

    /// INT0 line level (INTC has an unmasked source pending)
    pub fn int0(&self) -> bool {
        self.intc.is_pending()
    }

    /// INT1 line level
    pub fn int1(&self) -> bool {
        self.int1
    }

    /// Drive the INT1 line (DMAC)
    pub fn set_int1(&mut self, level: bool) {
        self.int1 = level;
    }

    /// INTC_STAT reads since the last [`reset_poll_count`](Self::reset_poll_count)
    pub fn intc_poll_count(&self) -> u32 {
        self.intc_polls.get()
    }

    pub fn reset_poll_count(&self) {
        self.intc_polls.set(0);
    }

    pub fn set_strict_mmu(&mut self, strict: bool) {
        self.strict_mmu = strict;
    }

    pub fn strict_mmu(&self) -> bool {
        self.strict_mmu
    }

    /// Enable or disable recording of RAM write ranges
    pub fn set_code_write_tracking(&mut self, enabled: bool) {
        self.track_code_writes = enabled;
        if !enabled {
            self.code_writes.clear();
        }
    }

    /// Drain the physical `[start, end)` RAM ranges written since the last call
    pub fn drain_code_writes(&mut self) -> Vec<(u32, u32)> {
        self.code_writes.drain(..).collect()
    }

    pub fn ram(&self) -> &[u8] {
        self.arena.ram()
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        self.arena.ram_mut()
    }

    pub fn scratchpad(&self) -> &[u8] {
        &self.scratchpad
    }

    pub fn scratchpad_mut(&mut self) -> &mut [u8] {
        &mut self.scratchpad
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
