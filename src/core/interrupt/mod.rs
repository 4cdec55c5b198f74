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

//! EE Interrupt Controller (INTC)
//!
//! The INTC collects interrupt requests from the EE-side peripherals and
//! drives the CPU's INT0 line (COP0 Cause.IP2).
//!
//! ## Registers
//!
//! - **INTC_STAT** (0x1000F000): Interrupt status register
//!   - Reading returns current interrupt flags
//!   - Writing 1 to a bit acknowledges that interrupt (clears the bit)
//!
//! - **INTC_MASK** (0x1000F010): Interrupt mask register
//!   - Writing 1 to a bit *toggles* that mask bit
//!   - 1 = interrupt enabled, 0 = interrupt masked
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit  | Source  | Description
//! -----|---------|----------------------------------
//! 0    | GS      | Graphics synthesizer
//! 1    | SBUS    | Sub-bus (IOP)
//! 2    | VBON    | VBlank start
//! 3    | VBOF    | VBlank end
//! 4    | VIF0    | VIF0
//! 5    | VIF1    | VIF1
//! 6    | VU0     | VU0
//! 7    | VU1     | VU1
//! 8    | IPU     | Image processing unit
//! 9-12 | TIMn    | Timers 0-3
//! 13   | SFIFO   | SIF FIFO error
//! 14   | VU0WD   | VU0 watchdog
//! ```
//!
//! INTC_STAT reads are also counted by the bus: a guest spinning on this
//! register is treated as a polling loop by the execution driver.

use crate::core::error::Result;
use crate::core::memory::IODevice;

/// Interrupt source bit flags
pub mod interrupts {
    /// Graphics synthesizer (bit 0)
    pub const GS: u16 = 1 << 0;
    /// Sub-bus / IOP (bit 1)
    pub const SBUS: u16 = 1 << 1;
    /// VBlank start (bit 2)
    pub const VBLANK_START: u16 = 1 << 2;
    /// VBlank end (bit 3)
    pub const VBLANK_END: u16 = 1 << 3;
    /// VIF0 (bit 4)
    pub const VIF0: u16 = 1 << 4;
    /// VIF1 (bit 5)
    pub const VIF1: u16 = 1 << 5;
    /// VU0 (bit 6)
    pub const VU0: u16 = 1 << 6;
    /// VU1 (bit 7)
    pub const VU1: u16 = 1 << 7;
    /// IPU (bit 8)
    pub const IPU: u16 = 1 << 8;
    /// Timer 0 (bit 9)
    pub const TIMER0: u16 = 1 << 9;
    /// Timer 1 (bit 10)
    pub const TIMER1: u16 = 1 << 10;
    /// Timer 2 (bit 11)
    pub const TIMER2: u16 = 1 << 11;
    /// Timer 3 (bit 12)
    pub const TIMER3: u16 = 1 << 12;
    /// SIF FIFO error (bit 13)
    pub const SFIFO: u16 = 1 << 13;
    /// VU0 watchdog (bit 14)
    pub const VU0_WATCHDOG: u16 = 1 << 14;

    /// Every implemented source
    pub const ALL: u16 = 0x7FFF;
}

/// EE Interrupt Controller
///
/// # Example
///
/// ```
/// use ps2rx::core::interrupt::{InterruptController, interrupts};
///
/// let mut ic = InterruptController::new();
///
/// ic.request(interrupts::VBLANK_START);
/// assert!(!ic.is_pending());
///
/// // Mask bits toggle on write
/// ic.write_mask(interrupts::VBLANK_START as u32);
/// assert!(ic.is_pending());
///
/// // Acknowledge by writing 1
/// ic.write_status(interrupts::VBLANK_START as u32);
/// assert!(!ic.is_pending());
/// ```
#[derive(Debug, Default)]
pub struct InterruptController {
    /// INTC_STAT - pending sources
    status: u16,

    /// INTC_MASK - enabled sources
    mask: u16,
}

impl InterruptController {
    /// Physical address of INTC_STAT
    pub const STAT_ADDR: u32 = 0x1000_F000;

    /// Physical address of INTC_MASK
    pub const MASK_ADDR: u32 = 0x1000_F010;

    /// Create a new interrupt controller with everything cleared and masked
    pub fn new() -> Self {
        Self { status: 0, mask: 0 }
    }

    /// Request an interrupt
    ///
    /// Called by peripherals; multiple sources may be ORed together.
    pub fn request(&mut self, interrupt: u16) {
        self.status |= interrupt & interrupts::ALL;
        log::trace!(
            "IRQ requested: 0x{:04X}, status=0x{:04X}",
            interrupt,
            self.status
        );
    }

    /// Acknowledge interrupts (1 bits clear)
    pub fn acknowledge(&mut self, value: u16) {
        self.status &= !value;
        log::trace!("IRQ acknowledged, status=0x{:04X}", self.status);
    }

    /// INT0 line level: any unmasked source pending
    pub fn is_pending(&self) -> bool {
        (self.status & self.mask) != 0
    }

    /// Read INTC_STAT
    pub fn read_status(&self) -> u32 {
        self.status as u32
    }

    /// Write INTC_STAT (acknowledge)
    pub fn write_status(&mut self, value: u32) {
        self.acknowledge(value as u16);
    }

    /// Read INTC_MASK
    pub fn read_mask(&self) -> u32 {
        self.mask as u32
    }

    /// Write INTC_MASK
    ///
    /// Each 1 bit toggles the corresponding mask bit.
    pub fn write_mask(&mut self, value: u32) {
        self.mask ^= (value as u16) & interrupts::ALL;
        log::debug!("IRQ mask set: 0x{:04X}", self.mask);
    }

    /// Clear status and mask
    pub fn reset(&mut self) {
        self.status = 0;
        self.mask = 0;
    }

    /// Restore raw register values (save states)
    pub(crate) fn restore(&mut self, status: u16, mask: u16) {
        self.status = status & interrupts::ALL;
        self.mask = mask & interrupts::ALL;
    }
}

impl IODevice for InterruptController {
    fn address_range(&self) -> (u32, u32) {
        (Self::STAT_ADDR, Self::MASK_ADDR + 0x0F)
    }

    fn read_word(&self, offset: u32) -> Result<u32> {
        Ok(match offset & !0x3 {
            0x00 => self.read_status(),
            0x10 => self.read_mask(),
            _ => 0,
        })
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<()> {
        match offset & !0x3 {
            0x00 => self.write_status(value),
            0x10 => self.write_mask(value),
            _ => log::trace!("INTC write to unused offset 0x{:02X}", offset),
        }
        Ok(())
    }

    /// Narrow stores forward only their own lane: both registers act on
    /// the 1 bits written, so merging with the current value would ack or
    /// toggle the other lanes as well.
    fn write_sized(&mut self, offset: u32, size: usize, value: u128) -> Result<()> {
        if size >= 4 {
            return self.write_word(offset & !0x3, value as u32);
        }

        let shift = (offset & 0x3) * 8;
        let lane = ((1u32 << (size * 8)) - 1) << shift;
        self.write_word(offset & !0x3, ((value as u32) << shift) & lane)
    }

    fn name(&self) -> &str {
        "INTC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_request() {
        let mut ic = InterruptController::new();

        ic.request(interrupts::VBLANK_START);
        assert_eq!(ic.status, interrupts::VBLANK_START);
        assert_eq!(ic.read_status(), interrupts::VBLANK_START as u32);
    }

    #[test]
    fn test_multiple_interrupt_requests() {
        let mut ic = InterruptController::new();

        ic.request(interrupts::VBLANK_START);
        ic.request(interrupts::TIMER0);

        assert_eq!(ic.status, interrupts::VBLANK_START | interrupts::TIMER0);
    }

    #[test]
    fn test_unimplemented_bits_ignored() {
        let mut ic = InterruptController::new();
        ic.request(0xFFFF);
        assert_eq!(ic.read_status(), interrupts::ALL as u32);
    }

    #[test]
    fn test_mask_toggles() {
        let mut ic = InterruptController::new();

        ic.write_mask(interrupts::GS as u32);
        assert_eq!(ic.read_mask(), interrupts::GS as u32);

        // Writing the same bit again turns it off
        ic.write_mask(interrupts::GS as u32);
        assert_eq!(ic.read_mask(), 0);

        // Writing 0 leaves the mask alone
        ic.write_mask(interrupts::TIMER1 as u32);
        ic.write_mask(0);
        assert_eq!(ic.read_mask(), interrupts::TIMER1 as u32);
    }

    #[test]
    fn test_partial_masking() {
        let mut ic = InterruptController::new();

        ic.request(interrupts::VBLANK_START | interrupts::TIMER0);
        ic.write_mask(interrupts::VBLANK_START as u32);
        assert!(ic.is_pending());

        // Swap VBLANK_START for TIMER0
        ic.write_mask((interrupts::VBLANK_START | interrupts::TIMER0) as u32);
        assert_eq!(ic.read_mask(), interrupts::TIMER0 as u32);
        assert!(ic.is_pending());

        ic.write_mask(interrupts::TIMER0 as u32);
        assert!(!ic.is_pending());
    }

    #[test]
    fn test_acknowledge_specific_interrupt() {
        let mut ic = InterruptController::new();

        ic.request(interrupts::VBLANK_START | interrupts::TIMER0);
        ic.write_mask(interrupts::ALL as u32);
        assert!(ic.is_pending());

        ic.write_status(interrupts::VBLANK_START as u32);

        assert!(ic.is_pending());
        assert_eq!(ic.read_status(), interrupts::TIMER0 as u32);
    }

    #[test]
    fn test_status_write_zero_is_noop() {
        let mut ic = InterruptController::new();

        ic.request(0x00FF);
        ic.write_status(0x0000);
        assert_eq!(ic.read_status(), 0x00FF);

        ic.write_status(0xFFFF);
        assert_eq!(ic.read_status(), 0x0000);
    }

    #[test]
    fn test_io_device_routing() {
        let mut ic = InterruptController::new();
        ic.request(interrupts::SBUS);

        assert_eq!(ic.read_word(0x00).unwrap(), interrupts::SBUS as u32);

        ic.write_word(0x10, interrupts::SBUS as u32).unwrap();
        assert_eq!(ic.read_word(0x10).unwrap(), interrupts::SBUS as u32);
        assert!(ic.is_pending());

        ic.write_word(0x00, interrupts::SBUS as u32).unwrap();
        assert!(!ic.is_pending());
    }

    #[test]
    fn test_reset() {
        let mut ic = InterruptController::new();
        ic.request(interrupts::IPU);
        ic.write_mask(interrupts::IPU as u32);
        ic.reset();

        assert_eq!(ic.read_status(), 0);
        assert_eq!(ic.read_mask(), 0);
    }
}
