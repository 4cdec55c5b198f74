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

//! Exception controller
//!
//! Two levels, as on the R5900:
//!
//! - Level 1 (EXL): interrupts and synchronous faults. EPC/BD are only
//!   recorded when EXL was clear, so a fault inside a handler does not lose
//!   the original return address.
//! - Level 2 (ERL): reset, NMI, performance counter and debug. They use
//!   ErrorEPC/BD2 and their own vectors.
//!
//! Synchronous exceptions are attributed to the instruction being executed
//! (`current_pc`). Interrupts are taken between instructions and are
//! attributed to the instruction about to run (`pc`).

use super::cop0::{cause, Status, COP0};
use super::CPU;
use crate::core::memory::Bus;

/// Level-1 exception codes (Cause.ExcCode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    /// External interrupt (INT0, INT1, COUNT/COMPARE)
    Interrupt = 0,
    /// TLB modified
    TlbModified = 1,
    /// TLB miss on load or fetch
    TlbLoad = 2,
    /// TLB miss on store
    TlbStore = 3,
    /// Address error on load or fetch
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on fetch
    BusErrorInstruction = 6,
    /// Bus error on data access
    BusErrorData = 7,
    /// SYSCALL
    Syscall = 8,
    /// BREAK
    Breakpoint = 9,
    /// Undefined opcode
    ReservedInstruction = 10,
    /// Coprocessor not enabled in Status.CU
    CoprocessorUnusable = 11,
    /// Signed overflow in a trapping add/sub
    Overflow = 12,
    /// Conditional trap instruction
    Trap = 13,
}

/// Level-2 exception sources (Cause.EXC2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Level2Cause {
    Reset = 0,
    Nmi = 1,
    PerformanceCounter = 2,
    Debug = 3,
}

/// Reset/NMI entry point
pub const RESET_VECTOR: u32 = 0xBFC0_0000;

const VECTOR_BASE: u32 = 0x8000_0000;
const VECTOR_BASE_BEV: u32 = 0xBFC0_0200;
const COMMON_OFFSET: u32 = 0x180;
const INTERRUPT_OFFSET: u32 = 0x200;

impl CPU {
    /// Raise a synchronous level-1 exception for the current instruction
    pub fn exception(&mut self, cause: ExceptionCause) {
        self.enter_level1(cause, self.current_pc, self.delay_slot_active);
    }

    /// Raise an address error and record the faulting address
    pub(crate) fn address_error(&mut self, cause: ExceptionCause, vaddr: u32) {
        self.cop0.regs[COP0::BADVADDR] = vaddr;
        self.exception(cause);
    }

    /// Raise CoprocessorUnusable for coprocessor `unit`
    pub(crate) fn coprocessor_unusable(&mut self, unit: u32) {
        let value = (self.cop0.cause() & !cause::CE_MASK) | ((unit << cause::CE_SHIFT) & cause::CE_MASK);
        self.cop0.set_cause(value);
        self.exception(ExceptionCause::CoprocessorUnusable);
    }

    fn enter_level1(&mut self, code: ExceptionCause, pc: u32, in_delay_slot: bool) {
        let mut status = self.cop0.status();
        let mut cause_reg =
            (self.cop0.cause() & !cause::EXC_CODE_MASK) | ((code as u32) << cause::EXC_CODE_SHIFT);

        if !status.contains(Status::EXL) {
            if in_delay_slot {
                self.cop0.regs[COP0::EPC] = pc.wrapping_sub(4);
                cause_reg |= cause::BD;
            } else {
                self.cop0.regs[COP0::EPC] = pc;
                cause_reg &= !cause::BD;
            }
            status |= Status::EXL;
        }
        self.cop0.set_cause(cause_reg);
        self.cop0.set_status(status);

        let base = if status.contains(Status::BEV) {
            VECTOR_BASE_BEV
        } else {
            VECTOR_BASE
        };
        let vector = base
            + if code == ExceptionCause::Interrupt {
                INTERRUPT_OFFSET
            } else {
                COMMON_OFFSET
            };

        match code {
            ExceptionCause::Interrupt | ExceptionCause::Syscall => log::debug!(
                "{:?}: EPC=0x{:08X} handler=0x{:08X}",
                code,
                self.cop0.regs[COP0::EPC],
                vector
            ),
            _ => log::warn!(
                "EXCEPTION: cause={:?}, EPC=0x{:08X}, handler=0x{:08X}, in_delay={}, instruction=0x{:08X}",
                code,
                self.cop0.regs[COP0::EPC],
                vector,
                in_delay_slot,
                self.current_instruction
            ),
        }

        self.redirect(vector);
    }

    /// Raise a level-2 exception
    ///
    /// Level-2 exceptions arrive between instructions, like interrupts.
    /// Reset reinitializes the whole processor and leaves a pending flag
    /// the execution driver takes to flush its block cache.
    pub fn level2_exception(&mut self, source: Level2Cause) {
        log::info!("Level-2 exception: {:?} at PC=0x{:08X}", source, self.pc);

        if source == Level2Cause::Reset {
            self.reset();
            self.reset_pending = true;
            return;
        }

        let mut cause_reg = (self.cop0.cause() & !cause::EXC2_MASK)
            | ((source as u32) << cause::EXC2_SHIFT);
        if self.branch_pending {
            self.cop0.regs[COP0::ERROR_EPC] = self.pc.wrapping_sub(4);
            cause_reg |= cause::BD2;
        } else {
            self.cop0.regs[COP0::ERROR_EPC] = self.pc;
            cause_reg &= !cause::BD2;
        }
        self.cop0.set_cause(cause_reg);

        let mut status = self.cop0.status() | Status::ERL;
        let dev = status.contains(Status::DEV);
        let vector = match source {
            Level2Cause::Nmi => {
                status |= Status::BEV;
                RESET_VECTOR
            }
            Level2Cause::PerformanceCounter if dev => 0xBFC0_0280,
            Level2Cause::PerformanceCounter => 0x8000_0080,
            Level2Cause::Debug if dev => 0xBFC0_0300,
            _ => 0x8000_0100,
        };
        self.cop0.set_status(status);
        self.redirect(vector);
    }

    fn redirect(&mut self, vector: u32) {
        self.pc = vector;
        self.next_pc = vector.wrapping_add(4);
        self.branch_pending = false;
        self.delay_slot_active = false;
        self.exception_raised = true;
    }

    /// Whether an interrupt would be admitted right now
    pub fn interrupts_enabled(&self) -> bool {
        let status = self.cop0.status();
        status.contains(Status::IE | Status::EIE) && !status.intersects(Status::EXL | Status::ERL)
    }

    /// Sample the interrupt lines and take an interrupt if one is admitted
    ///
    /// Refreshes Cause.IP2 (INTC) and Cause.IP3 (DMAC) from the bus; IP7 is
    /// maintained by COUNT/COMPARE.
    ///
    /// # Returns
    ///
    /// true if the CPU was redirected to the interrupt vector
    pub fn check_interrupts(&mut self, bus: &Bus) -> bool {
        let mut cause_reg = self.cop0.cause() & !(cause::IP2 | cause::IP3);
        if bus.int0() {
            cause_reg |= cause::IP2;
        }
        if bus.int1() {
            cause_reg |= cause::IP3;
        }
        self.cop0.set_cause(cause_reg);

        if !self.interrupts_enabled() {
            return false;
        }
        if cause_reg & self.cop0.status().bits() & Status::IM == 0 {
            return false;
        }

        self.enter_level1(ExceptionCause::Interrupt, self.pc, self.branch_pending);
        true
    }
}
