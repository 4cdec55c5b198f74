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

//! Memory-mapped device interface
//!
//! Peripherals outside the CPU core (DMAC, GIF, VIF, timers, GS privileged
//! registers) plug into the [`Bus`](super::Bus) through [`IODevice`]. The
//! bus consults devices only after the scratchpad window and the
//! direct-mapped RAM/ROM path have missed, in this order:
//!
//! ```text
//! paddr ──► scratchpad? ──► page table hit? ──► INTC ──► SIO ──► attached devices ──► 0
//! ```
//!
//! A device only has to model its 32-bit registers. Narrower accesses are
//! merged into the containing word and 64/128-bit accesses are split into
//! ascending words, which is how the EE's 32-bit peripheral bus sees them.
//!
//! # Example
//!
//! ```
//! use ps2rx::core::error::Result;
//! use ps2rx::core::memory::{Bus, IODevice};
//!
//! /// Four latches at 0x1000_8000 (DMAC channel 0 window)
//! struct Latches([u32; 4]);
//!
//! impl IODevice for Latches {
//!     fn address_range(&self) -> (u32, u32) {
//!         (0x1000_8000, 0x1000_800F)
//!     }
//!
//!     fn read_word(&self, offset: u32) -> Result<u32> {
//!         Ok(self.0[(offset / 4) as usize])
//!     }
//!
//!     fn write_word(&mut self, offset: u32, value: u32) -> Result<()> {
//!         self.0[(offset / 4) as usize] = value;
//!         Ok(())
//!     }
//! }
//!
//! let mut bus = Bus::new();
//! bus.attach_device(Box::new(Latches([0; 4])));
//! bus.write64(0xB000_8008, 0x0000_0002_0000_0001).unwrap();
//! assert_eq!(bus.read32(0xB000_800C).unwrap(), 2);
//! ```

use crate::core::error::Result;

/// A peripheral occupying a physical address window
///
/// Offsets passed to the accessors are relative to the start of
/// [`address_range`](Self::address_range) and are naturally aligned for the
/// access size (the bus rejects misaligned accesses before routing).
pub trait IODevice {
    /// Inclusive `(start, end)` physical window
    fn address_range(&self) -> (u32, u32);

    fn contains(&self, paddr: u32) -> bool {
        let (start, end) = self.address_range();
        (start..=end).contains(&paddr)
    }

    /// 32-bit register read
    fn read_word(&self, offset: u32) -> Result<u32>;

    /// 32-bit register write
    fn write_word(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Read `size` bytes (1, 2, 4, 8 or 16)
    fn read_sized(&self, offset: u32, size: usize) -> Result<u128> {
        if size >= 4 {
            let mut value = 0u128;
            for (i, word) in (offset..offset + size as u32).step_by(4).enumerate() {
                value |= (self.read_word(word)? as u128) << (i * 32);
            }
            return Ok(value);
        }

        let shift = (offset & 0x3) * 8;
        let mask = (1u32 << (size * 8)) - 1;
        Ok(((self.read_word(offset & !0x3)? >> shift) & mask) as u128)
    }

    /// Write `size` bytes (1, 2, 4, 8 or 16)
    fn write_sized(&mut self, offset: u32, size: usize, value: u128) -> Result<()> {
        if size >= 4 {
            for (i, word) in (offset..offset + size as u32).step_by(4).enumerate() {
                self.write_word(word, (value >> (i * 32)) as u32)?;
            }
            return Ok(());
        }

        // Merge into the containing word
        let aligned = offset & !0x3;
        let shift = (offset & 0x3) * 8;
        let mask = ((1u32 << (size * 8)) - 1) << shift;
        let current = self.read_word(aligned)?;
        let merged = (current & !mask) | (((value as u32) << shift) & mask);
        self.write_word(aligned, merged)
    }

    /// Device name for logging
    fn name(&self) -> &str {
        "device"
    }
}
