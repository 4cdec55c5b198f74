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

//! Emotion Engine main CPU (R5900)

use crate::core::error::Result;
use crate::core::memory::Bus;

/// Emotion Engine core (MIPS R5900)
///
/// # Specifications
/// - Architecture: MIPS III subset plus EE extensions (MMI, SA, three-operand
///   multiply, second HI/LO pipe)
/// - Registers: 32 × 128-bit general-purpose registers, 128-bit HI/LO
/// - Clock frequency: 294.912 MHz
///
/// 64-bit operations read and write the low doubleword of a register and
/// leave the upper doubleword untouched. Only LQ and the MMI instructions
/// write all 128 bits.
///
/// # Example
/// ```
/// use ps2rx::core::cpu::CPU;
///
/// let mut cpu = CPU::new();
/// cpu.set_reg(8, 0x1234_5678);
/// assert_eq!(cpu.reg(8), 0x1234_5678);
/// assert_eq!(cpu.reg(0), 0);
/// ```
pub struct CPU {
    /// General purpose registers (r0-r31)
    regs: [u128; 32],

    /// HI register; low doubleword is pipe 0, high doubleword is pipe 1
    hi: u128,

    /// LO register, same layout as `hi`
    lo: u128,

    /// Shift amount register used by QFSRV (in bits)
    sa: u32,

    /// Address of the next instruction to fetch
    pc: u32,

    /// Address after `pc`; a taken branch rewrites it
    next_pc: u32,

    /// Address of the instruction being executed
    current_pc: u32,

    /// Coprocessor 0 (System Control)
    cop0: COP0,

    /// Coprocessor 1 (FPU)
    fpu: Cop1,

    /// Coprocessor 2 (VU0 macro mode)
    cop2: Box<dyn Cop2>,

    /// The instruction at `pc` is a branch delay slot
    branch_pending: bool,

    /// The instruction being executed is a branch delay slot
    delay_slot_active: bool,

    /// The last instruction ended in an exception
    exception_raised: bool,

    /// Raw opcode of the instruction being executed
    current_instruction: u32,

    /// $v1 at the last SYSCALL, taken by the driver
    last_syscall: Option<u32>,

    /// A level-2 reset happened and cached code is stale
    reset_pending: bool,
}

mod block;
mod cop0;
mod cop1;
mod cop2;
mod decode;
mod driver;
mod exception;
mod instructions;
mod state;
#[cfg(test)]
mod tests;

pub use block::{build_block, Block, BlockCache};
pub use cop0::{cause, Status};
use cop0::COP0;
pub use cop1::{flush_input, Fcr31};
use cop1::Cop1;
pub use cop2::{Cop2, NullCop2};
pub use decode::{decode, select, BranchClass, CycleClass, DecodedInstruction, Opcode};
pub use driver::{DriverStats, ExecutionDriver};
pub use exception::{ExceptionCause, Level2Cause, RESET_VECTOR};

/// Register names for dumps
const REG_NAMES: [&str; 32] = [
    "zr", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
];

const LOW64: u128 = 0xFFFF_FFFF_FFFF_FFFF;

impl CPU {
    /// Create a CPU in its reset state with a register-file-only VU0
    pub fn new() -> Self {
        Self::with_cop2(Box::new(NullCop2::new()))
    }

    /// Create a CPU with a custom COP2 implementation
    pub fn with_cop2(cop2: Box<dyn Cop2>) -> Self {
        Self {
            regs: [0u128; 32],
            hi: 0,
            lo: 0,
            sa: 0,
            pc: RESET_VECTOR,
            next_pc: RESET_VECTOR.wrapping_add(4),
            current_pc: RESET_VECTOR,
            cop0: COP0::new(),
            fpu: Cop1::new(),
            cop2,
            branch_pending: false,
            delay_slot_active: false,
            exception_raised: false,
            current_instruction: 0,
            last_syscall: None,
            reset_pending: false,
        }
    }

    /// Reset CPU to its power-on state
    ///
    /// Registers are zeroed and execution restarts at the reset vector.
    /// The COP2 collaborator is kept as is.
    pub fn reset(&mut self) {
        self.regs = [0u128; 32];
        self.hi = 0;
        self.lo = 0;
        self.sa = 0;
        self.pc = RESET_VECTOR;
        self.next_pc = RESET_VECTOR.wrapping_add(4);
        self.current_pc = RESET_VECTOR;
        self.cop0.reset();
        self.fpu.reset();
        self.branch_pending = false;
        self.delay_slot_active = false;
        self.exception_raised = false;
        self.current_instruction = 0;
        self.last_syscall = None;
        self.reset_pending = false;
    }

    /// Full 128-bit register
    #[inline(always)]
    pub fn gpr(&self, index: u8) -> u128 {
        self.regs[index as usize]
    }

    /// Write all 128 bits of a register (writes to r0 are discarded)
    #[inline(always)]
    pub fn set_gpr(&mut self, index: u8, value: u128) {
        if index != 0 {
            self.regs[index as usize] = value;
        }
    }

    /// Low doubleword of a register
    #[inline(always)]
    pub fn reg(&self, index: u8) -> u64 {
        self.regs[index as usize] as u64
    }

    /// Write the low doubleword, keeping the upper doubleword
    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u64) {
        if index != 0 {
            let reg = &mut self.regs[index as usize];
            *reg = (*reg & !LOW64) | value as u128;
        }
    }

    /// Low word of a register
    #[inline(always)]
    pub fn reg32(&self, index: u8) -> u32 {
        self.regs[index as usize] as u32
    }

    /// Write a 32-bit result sign-extended into the low doubleword
    #[inline(always)]
    pub fn set_reg_sx32(&mut self, index: u8, value: u32) {
        self.set_reg(index, value as i32 as i64 as u64);
    }

    pub fn hi(&self) -> u128 {
        self.hi
    }

    pub fn lo(&self) -> u128 {
        self.lo
    }

    pub fn set_hi(&mut self, value: u128) {
        self.hi = value;
    }

    pub fn set_lo(&mut self, value: u128) {
        self.lo = value;
    }

    /// Shift amount register
    pub fn sa(&self) -> u32 {
        self.sa
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    /// Redirect execution, e.g. to a loaded program's entry point
    ///
    /// Any pending branch is dropped.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.branch_pending = false;
        self.delay_slot_active = false;
    }

    /// Whether the next instruction is a branch delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.branch_pending
    }

    /// Whether the last executed instruction raised an exception
    pub fn exception_raised(&self) -> bool {
        self.exception_raised
    }

    /// Raw COP0 register
    pub fn cop0_reg(&self, index: usize) -> u32 {
        self.cop0.regs[index & 0x1F]
    }

    /// Write a COP0 register directly, bypassing MTC0 rules
    pub fn set_cop0_reg(&mut self, index: usize, value: u32) {
        self.cop0.regs[index & 0x1F] = value;
    }

    pub fn status(&self) -> Status {
        self.cop0.status()
    }

    /// Advance COP0 COUNT by retired cycles
    pub fn advance_count(&mut self, cycles: u32) {
        self.cop0.advance_count(cycles);
    }

    /// FPU register, raw single bits
    pub fn fpr(&self, index: u8) -> u32 {
        self.fpu.fpr[(index & 0x1F) as usize]
    }

    pub fn set_fpr(&mut self, index: u8, value: u32) {
        self.fpu.fpr[(index & 0x1F) as usize] = value;
    }

    /// FPU control/status register
    pub fn fcr31(&self) -> Fcr31 {
        self.fpu.flags()
    }

    pub fn cop2(&self) -> &dyn Cop2 {
        self.cop2.as_ref()
    }

    pub fn cop2_mut(&mut self) -> &mut dyn Cop2 {
        self.cop2.as_mut()
    }

    /// Replace the VU0 collaborator
    pub fn set_cop2(&mut self, cop2: Box<dyn Cop2>) {
        log::info!("Attaching COP2: {}", cop2.name());
        self.cop2 = cop2;
    }

    /// Syscall number ($v1) of the last SYSCALL, if not taken yet
    pub fn take_syscall(&mut self) -> Option<u32> {
        self.last_syscall.take()
    }

    /// Whether a level-2 reset happened since the last call
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    /// Execute one instruction without the block cache
    ///
    /// Samples interrupts, fetches, decodes and executes. A misaligned PC
    /// raises an address error instead of fetching.
    ///
    /// # Arguments
    ///
    /// * `bus` - Memory bus for reading instructions and data
    ///
    /// # Returns
    ///
    /// Cycles charged for the instruction
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::cpu::CPU;
    /// use ps2rx::core::memory::Bus;
    ///
    /// let mut cpu = CPU::new();
    /// let mut bus = Bus::new();
    /// // lui $t0, 0x1234
    /// bus.load_bios_bytes(&0x3C08_1234u32.to_le_bytes()).unwrap();
    ///
    /// cpu.step(&mut bus).unwrap();
    /// assert_eq!(cpu.reg(8), 0x1234_0000);
    /// ```
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32> {
        self.check_interrupts(bus);

        let pc = self.pc;
        if pc & 0x3 != 0 {
            self.begin_instruction(0);
            self.address_error(ExceptionCause::AddressErrorLoad, pc);
            return Ok(1);
        }

        let raw = bus.read32(pc)?;
        let instr = decode(raw);
        self.execute_decoded(&instr, bus)?;
        Ok(instr.cycles.cycles())
    }

    /// Execute an already decoded instruction located at `pc`
    ///
    /// Used by both the uncached path and block replay. The caller is
    /// responsible for checking interrupts and that `pc` matches the
    /// instruction's address.
    pub fn execute_decoded(&mut self, instr: &DecodedInstruction, bus: &mut Bus) -> Result<()> {
        self.begin_instruction(instr.raw);

        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        let result = self.dispatch(instr, bus);
        self.regs[0] = 0;
        result
    }

    #[inline(always)]
    fn begin_instruction(&mut self, raw: u32) {
        self.current_pc = self.pc;
        self.current_instruction = raw;
        self.delay_slot_active = self.branch_pending;
        self.branch_pending = false;
        self.exception_raised = false;
    }

    /// Dump all CPU registers for debugging
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ps2rx::core::cpu::CPU;
    ///
    /// let cpu = CPU::new();
    /// cpu.dump_registers();
    /// ```
    pub fn dump_registers(&self) {
        println!("CPU Registers:");
        println!("PC: 0x{:08X}  Next PC: 0x{:08X}  SA: {}", self.pc, self.next_pc, self.sa);
        println!("HI: 0x{:032X}", self.hi);
        println!("LO: 0x{:032X}", self.lo);
        println!();

        for (i, name) in REG_NAMES.iter().enumerate() {
            println!("{:>2} ({}): 0x{:032X}", i, name, self.regs[i]);
        }
        println!();

        println!("COP0 Registers:");
        println!("Status: 0x{:08X}", self.cop0.regs[COP0::STATUS]);
        println!("Cause:  0x{:08X}", self.cop0.regs[COP0::CAUSE]);
        println!("EPC:    0x{:08X}", self.cop0.regs[COP0::EPC]);
        println!("BadVA:  0x{:08X}", self.cop0.regs[COP0::BADVADDR]);
        println!("Count:  0x{:08X}", self.cop0.regs[COP0::COUNT]);
        println!("FCR31:  0x{:08X}", self.fpu.fcr31);
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}
