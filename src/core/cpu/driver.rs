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

//! Execution driver
//!
//! Decides, once per step, how the CPU makes progress at the current PC:
//!
//! 1. PC on a known idle loop: skip `idle_skip_cycles` without executing.
//! 2. INTC_STAT polled more than `poll_threshold` times: check interrupts and
//!    skip `poll_skip_cycles`.
//! 3. Cached block at PC: replay it, stopping early on an interrupt, a PC
//!    that leaves program order, or an exception.
//! 4. Otherwise decode a new block, cache it and report 0 cycles. The next
//!    step replays it.
//!
//! In interpreter mode every step executes exactly one instruction through
//! [`CPU::step`].

use super::block::{build_block, Block, BlockCache};
use super::CPU;
use crate::core::config::{EmulatorConfig, ExecutionMode, InvalidationPolicy};
use crate::core::error::Result;
use crate::core::memory::Bus;
use crate::core::timing::Scheduler;

/// Physical address mask for idle address comparison
const PHYS_MASK: u32 = 0x1FFF_FFFF;

/// Counters kept by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Blocks decoded and cached
    pub blocks_built: u64,
    /// Block replays started
    pub blocks_replayed: u64,
    /// Instructions retired (both modes)
    pub instructions: u64,
    /// Whole-cache flushes
    pub flushes: u64,
    /// Blocks dropped by code-write invalidation
    pub invalidations: u64,
    /// Idle loop fast-forwards
    pub idle_skips: u64,
    /// Polling loop fast-forwards
    pub poll_skips: u64,
}

/// Block cache plus the stepping policy around it
pub struct ExecutionDriver {
    config: EmulatorConfig,
    cache: BlockCache,
    stats: DriverStats,
}

impl ExecutionDriver {
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            cache: BlockCache::new(),
            stats: DriverStats::default(),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    /// Drop every cached block
    pub fn flush(&mut self) {
        if !self.cache.is_empty() {
            log::debug!("Flushing block cache ({} blocks)", self.cache.len());
        }
        self.cache.clear();
        self.stats.flushes += 1;
    }

    /// Run one driver step in the configured mode
    ///
    /// # Returns
    ///
    /// Cycles consumed; 0 when the step only built a block
    pub fn step(&mut self, cpu: &mut CPU, bus: &mut Bus) -> Result<u32> {
        if cpu.take_reset() {
            log::debug!("Level-2 reset flushes the block cache");
            self.flush();
        }

        match self.config.mode {
            ExecutionMode::BlockCache => self.run_step(cpu, bus),
            ExecutionMode::Interpreter => self.interpret(cpu, bus),
        }
    }

    /// Execute until at least `cycles` cycles have elapsed
    ///
    /// The scheduler is ticked once per driver step (per instruction in
    /// interpreter mode, per block in block mode) and COP0 COUNT follows the
    /// same cycles.
    ///
    /// # Returns
    ///
    /// Cycles actually executed, which may overshoot `cycles` by the tail
    /// of the last block
    pub fn execute(
        &mut self,
        cpu: &mut CPU,
        bus: &mut Bus,
        scheduler: &mut dyn Scheduler,
        cycles: u64,
    ) -> Result<u64> {
        let mut executed = 0u64;
        while executed < cycles {
            let spent = self.step(cpu, bus)?;
            if spent > 0 {
                scheduler.tick(spent);
                cpu.advance_count(spent);
                executed += spent as u64;
            }
        }
        Ok(executed)
    }

    /// One uncached instruction
    fn interpret(&mut self, cpu: &mut CPU, bus: &mut Bus) -> Result<u32> {
        let cycles = cpu.step(bus)?;
        self.stats.instructions += 1;
        self.after_syscall(cpu);
        Ok(cycles)
    }

    /// One block-mode step
    pub fn run_step(&mut self, cpu: &mut CPU, bus: &mut Bus) -> Result<u32> {
        if self.config.invalidation == InvalidationPolicy::OnCodeWrite {
            self.invalidate_written(bus);
        }

        let pc = cpu.pc();
        if pc & 0x3 != 0 {
            // Raises AdEL
            return self.interpret(cpu, bus);
        }

        if self.is_idle(pc) {
            cpu.check_interrupts(bus);
            self.stats.idle_skips += 1;
            // A zero skip would never advance time
            return Ok(self.config.idle_skip_cycles.max(1));
        }

        if bus.intc_poll_count() > self.config.poll_threshold {
            bus.reset_poll_count();
            cpu.check_interrupts(bus);
            self.stats.poll_skips += 1;
            log::trace!("Polling loop at 0x{:08X} fast-forwarded", pc);
            return Ok(self.config.poll_skip_cycles.max(1));
        }

        if let Some(block) = self.cache.get(pc) {
            return self.replay(&block, cpu, bus);
        }

        let block = build_block(bus, pc, self.config.max_block_len)?;
        self.cache.insert(block);
        self.stats.blocks_built += 1;
        Ok(0)
    }

    /// Replay a cached block from its first instruction
    fn replay(&mut self, block: &Block, cpu: &mut CPU, bus: &mut Bus) -> Result<u32> {
        self.stats.blocks_replayed += 1;
        let mut cycles = 0u32;

        for (index, instr) in block.instructions.iter().enumerate() {
            // Likely-not-taken branches and exceptions leave program order
            if cpu.pc() != block.address_of(index) {
                break;
            }
            if cpu.check_interrupts(bus) {
                break;
            }

            cpu.execute_decoded(instr, bus)?;
            cycles += instr.cycles.cycles();
            self.stats.instructions += 1;
            self.after_syscall(cpu);

            if cpu.exception_raised() {
                break;
            }
        }

        Ok(cycles)
    }

    /// Flush the cache if the last instruction was a FlushCache syscall
    fn after_syscall(&mut self, cpu: &mut CPU) {
        if let Some(number) = cpu.take_syscall() {
            if self.config.flush_syscalls.contains(&number) {
                log::debug!("Syscall 0x{:02X} flushes the block cache", number);
                self.flush();
            }
        }
    }

    fn is_idle(&self, pc: u32) -> bool {
        self.config
            .idle_addresses
            .iter()
            .any(|&addr| addr & PHYS_MASK == pc & PHYS_MASK)
    }

    fn invalidate_written(&mut self, bus: &mut Bus) {
        for (start, end) in bus.drain_code_writes() {
            let dropped = self.cache.invalidate_range(start, end);
            if dropped > 0 {
                log::debug!(
                    "Write to 0x{:08X}-0x{:08X} dropped {} block(s)",
                    start,
                    end,
                    dropped
                );
                self.stats.invalidations += dropped as u64;
            }
        }
    }
}
