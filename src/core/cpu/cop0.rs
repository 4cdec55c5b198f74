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

//! Coprocessor 0 (System Control)
//!
//! Holds the 32 control registers. Exception entry and interrupt admission
//! live in [`exception`](super::exception); this module only owns the
//! register file, its reset values and the write rules for MTC0.

use bitflags::bitflags;

bitflags! {
    /// COP0 Status register
    ///
    /// Bits not named here are reserved: they read back what was written
    /// and have no effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Interrupt enable
        const IE = 1 << 0;
        /// Level-1 exception in progress
        const EXL = 1 << 1;
        /// Level-2 exception in progress
        const ERL = 1 << 2;
        /// Privilege mode (00 kernel, 01 supervisor, 10 user)
        const KSU = 0b11 << 3;
        /// INT0 (INTC) mask
        const IM2 = 1 << 10;
        /// INT1 (DMAC) mask
        const IM3 = 1 << 11;
        /// Bus error mask
        const BEM = 1 << 12;
        /// COUNT/COMPARE timer mask
        const IM7 = 1 << 15;
        /// Master interrupt enable (EI/DI)
        const EIE = 1 << 16;
        /// EI/DI usable outside kernel mode
        const EDI = 1 << 17;
        /// Cache hit status
        const CH = 1 << 18;
        /// Bootstrap exception vectors
        const BEV = 1 << 22;
        /// Bootstrap vectors for debug and counter exceptions
        const DEV = 1 << 23;
        const CU0 = 1 << 28;
        const CU1 = 1 << 29;
        const CU2 = 1 << 30;
        const CU3 = 1 << 31;
    }
}

impl Status {
    /// Interrupt mask bits
    pub const IM: u32 = Self::IM2.bits() | Self::IM3.bits() | Self::IM7.bits();

    /// Kernel mode: KSU == 0 or an exception level is active
    pub fn is_kernel(self) -> bool {
        !self.intersects(Status::KSU) || self.intersects(Status::EXL | Status::ERL)
    }
}

/// COP0 Cause register fields
pub mod cause {
    /// ExcCode field (bits 2-6)
    pub const EXC_CODE_SHIFT: u32 = 2;
    pub const EXC_CODE_MASK: u32 = 0x1F << EXC_CODE_SHIFT;
    /// INT0 pending
    pub const IP2: u32 = 1 << 10;
    /// INT1 pending
    pub const IP3: u32 = 1 << 11;
    /// COUNT reached COMPARE
    pub const IP7: u32 = 1 << 15;
    /// Level-2 exception code (bits 16-18)
    pub const EXC2_SHIFT: u32 = 16;
    pub const EXC2_MASK: u32 = 0x7 << EXC2_SHIFT;
    /// Coprocessor number for CpU (bits 28-29)
    pub const CE_SHIFT: u32 = 28;
    pub const CE_MASK: u32 = 0x3 << CE_SHIFT;
    /// Level-2 exception taken in a delay slot
    pub const BD2: u32 = 1 << 30;
    /// Level-1 exception taken in a delay slot
    pub const BD: u32 = 1 << 31;
}

/// Coprocessor 0 (System Control)
pub(crate) struct COP0 {
    pub(crate) regs: [u32; 32],
}

impl COP0 {
    pub const INDEX: usize = 0;
    pub const RANDOM: usize = 1;
    pub const ENTRY_LO0: usize = 2;
    pub const ENTRY_LO1: usize = 3;
    pub const CONTEXT: usize = 4;
    pub const PAGE_MASK: usize = 5;
    pub const WIRED: usize = 6;
    /// Bad Virtual Address
    pub const BADVADDR: usize = 8;
    /// Timer counter, advanced by retired cycles
    pub const COUNT: usize = 9;
    pub const ENTRY_HI: usize = 10;
    /// Timer compare value
    pub const COMPARE: usize = 11;
    /// Status Register
    pub const STATUS: usize = 12;
    /// Cause Register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;
    pub const CONFIG: usize = 16;
    pub const BADPADDR: usize = 23;
    pub const DEBUG: usize = 24;
    pub const PERF: usize = 25;
    pub const TAG_LO: usize = 28;
    pub const TAG_HI: usize = 29;
    /// Level-2 exception PC
    pub const ERROR_EPC: usize = 30;

    /// R5900 implementation/revision
    const PRID_VALUE: u32 = 0x0000_2E20;

    /// CU0-2 usable, bootstrap vectors, ERL set
    const STATUS_RESET: u32 = 0x7040_0004;

    const CONFIG_RESET: u32 = 0x0000_0440;

    const RANDOM_RESET: u32 = 47;

    pub(crate) fn new() -> Self {
        let mut cop0 = Self { regs: [0u32; 32] };
        cop0.reset();
        cop0
    }

    /// Reset COP0 registers to their power-on values
    pub(crate) fn reset(&mut self) {
        self.regs = [0u32; 32];
        self.regs[Self::STATUS] = Self::STATUS_RESET;
        self.regs[Self::PRID] = Self::PRID_VALUE;
        self.regs[Self::CONFIG] = Self::CONFIG_RESET;
        self.regs[Self::RANDOM] = Self::RANDOM_RESET;
    }

    #[inline(always)]
    pub(crate) fn status(&self) -> Status {
        Status::from_bits_retain(self.regs[Self::STATUS])
    }

    #[inline(always)]
    pub(crate) fn set_status(&mut self, status: Status) {
        self.regs[Self::STATUS] = status.bits();
    }

    #[inline(always)]
    pub(crate) fn cause(&self) -> u32 {
        self.regs[Self::CAUSE]
    }

    #[inline(always)]
    pub(crate) fn set_cause(&mut self, value: u32) {
        self.regs[Self::CAUSE] = value;
    }

    /// MTC0 write rules
    ///
    /// PRId is read-only, Cause only takes the two software bits, and
    /// writing Compare acknowledges the timer interrupt.
    pub(crate) fn write(&mut self, index: usize, value: u32) {
        match index {
            Self::PRID => {
                log::debug!("Ignoring write to PRId: 0x{:08X}", value);
            }
            Self::CAUSE => {
                let cause = self.regs[Self::CAUSE];
                self.regs[Self::CAUSE] = (cause & !0x300) | (value & 0x300);
            }
            Self::COMPARE => {
                self.regs[Self::COMPARE] = value;
                self.regs[Self::CAUSE] &= !cause::IP7;
            }
            _ => self.regs[index] = value,
        }
    }

    /// Advance COUNT and raise IP7 when it passes COMPARE
    pub(crate) fn advance_count(&mut self, cycles: u32) {
        let before = self.regs[Self::COUNT];
        let after = before.wrapping_add(cycles);
        self.regs[Self::COUNT] = after;

        let compare = self.regs[Self::COMPARE];
        let passed = if after >= before {
            compare > before && compare <= after
        } else {
            compare > before || compare <= after
        };
        if passed && cycles != 0 {
            self.regs[Self::CAUSE] |= cause::IP7;
        }
    }
}
