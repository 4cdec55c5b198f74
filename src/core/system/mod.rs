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

//! System integration module
//!
//! Ties the EE core, the bus, the execution driver and the scheduler together
//! and provides the entry points an embedder needs: load a BIOS or program,
//! run for a number of cycles, capture console output and save/restore state.

use super::config::{EmulatorConfig, InvalidationPolicy};
use super::cpu::{DriverStats, ExecutionDriver, CPU};
use super::error::{EmulatorError, Result};
use super::memory::{Bus, ConsoleHook};
use super::save_state::{SaveState, SaveStateMetadata, StateSave, SAVE_STATE_VERSION};
use super::timing::{EventHandle, Scheduler, TimingEventManager};
use chrono::Utc;
use std::path::Path;

/// Emotion Engine system
///
/// # Components
/// - CPU: R5900 core with COP0, FPU and a VU0 register file
/// - Bus: RAM, ROM, scratchpad, INTC and the debug console
/// - Driver: block cache and stepping policy
/// - Timing: cycle counter and embedder events
///
/// # Example
/// ```
/// use ps2rx::core::System;
///
/// let mut system = System::default();
/// // lui $t0, 0x1234 ; beq $0, $0, -1 ; nop
/// let rom: Vec<u8> = [0x3C08_1234u32, 0x1000_FFFF, 0]
///     .iter()
///     .flat_map(|w| w.to_le_bytes())
///     .collect();
/// system.load_bios_bytes(&rom).unwrap();
///
/// system.run_cycles(100).unwrap();
/// assert_eq!(system.cpu().reg(8), 0x1234_0000);
/// ```
pub struct System {
    /// CPU instance
    cpu: CPU,
    /// Memory bus
    bus: Bus,
    /// Block cache and stepping policy
    driver: ExecutionDriver,
    /// Timing event manager
    timing: TimingEventManager,
    /// Events fired and not yet taken by the embedder
    fired_events: Vec<EventHandle>,
    /// Total cycles executed
    cycles: u64,
}

impl System {
    /// Create a system in its power-on state
    ///
    /// The bus follows the configuration: strict MMU mode and, for the
    /// `OnCodeWrite` policy, RAM write tracking.
    pub fn new(config: EmulatorConfig) -> Self {
        let mut bus = Bus::new();
        bus.set_strict_mmu(config.strict_mmu);
        bus.set_code_write_tracking(config.invalidation == InvalidationPolicy::OnCodeWrite);

        log::info!(
            "System: {:?} mode, {:?} invalidation, max block {} instructions",
            config.mode,
            config.invalidation,
            config.max_block_len
        );

        Self {
            cpu: CPU::new(),
            bus,
            driver: ExecutionDriver::new(config),
            timing: TimingEventManager::new(),
            fired_events: Vec::new(),
            cycles: 0,
        }
    }

    /// Load BIOS from file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ps2rx::core::System;
    ///
    /// let mut system = System::default();
    /// system.load_bios("SCPH-70012.BIN").unwrap();
    /// ```
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.bus.load_bios(path)?;
        self.driver.flush();
        Ok(())
    }

    /// Load a BIOS image already in memory
    pub fn load_bios_bytes(&mut self, image: &[u8]) -> Result<()> {
        self.bus.load_bios_bytes(image)?;
        self.driver.flush();
        Ok(())
    }

    /// Copy a program into RAM and start executing it
    ///
    /// # Arguments
    ///
    /// * `paddr` - Physical RAM address the image is copied to
    /// * `image` - Raw program bytes
    /// * `entry` - Virtual address execution continues at
    ///
    /// # Errors
    ///
    /// `LoaderError` if the image does not fit in RAM or the entry point is
    /// not word aligned.
    pub fn load_program(&mut self, paddr: u32, image: &[u8], entry: u32) -> Result<()> {
        if entry & 0x3 != 0 {
            return Err(EmulatorError::LoaderError(format!(
                "entry point 0x{:08X} is not word aligned",
                entry
            )));
        }

        self.bus.load_ram(paddr, image)?;
        self.driver.flush();
        self.cpu.set_pc(entry);

        log::info!(
            "Loaded {} bytes at 0x{:08X}, entry 0x{:08X}",
            image.len(),
            paddr,
            entry
        );
        Ok(())
    }

    /// Reset the system to initial state
    ///
    /// Clears RAM and scratchpad but keeps the loaded BIOS and console hook.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.driver.flush();
        self.timing.reset();
        self.fired_events.clear();
        self.cycles = 0;
    }

    /// Run one driver step
    ///
    /// # Returns
    ///
    /// Cycles consumed; 0 when the step only built a block, in which case
    /// the caller simply steps again
    pub fn step(&mut self) -> Result<u32> {
        let spent = self.driver.step(&mut self.cpu, &mut self.bus)?;
        if spent > 0 {
            self.timing.tick(spent);
            self.cpu.advance_count(spent);
            self.cycles += spent as u64;
            self.collect_events();
        }
        Ok(spent)
    }

    /// Run for at least `cycles` cycles
    ///
    /// Execution is sliced at the next scheduled timing event so events fire
    /// close to their deadline. Fired events are available from
    /// [`take_fired_events`](Self::take_fired_events).
    ///
    /// # Returns
    ///
    /// Cycles actually executed
    pub fn run_cycles(&mut self, cycles: u64) -> Result<u64> {
        let mut executed = 0u64;

        while executed < cycles {
            let remaining = cycles - executed;
            let slice = match self.timing.downcount() {
                Some(until_event) if until_event > 0 => remaining.min(until_event),
                _ => remaining,
            };

            executed += self.driver.execute(
                &mut self.cpu,
                &mut self.bus,
                &mut self.timing,
                slice,
            )?;
            self.collect_events();
        }

        self.cycles += executed;
        Ok(executed)
    }

    fn collect_events(&mut self) {
        let fired = self.timing.run_events();
        self.fired_events.extend(fired);
    }

    /// Events fired since the last call
    pub fn take_fired_events(&mut self) -> Vec<EventHandle> {
        std::mem::take(&mut self.fired_events)
    }

    /// Drop every cached block
    pub fn flush_blocks(&mut self) {
        self.driver.flush();
    }

    /// Install the debug console byte hook
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::System;
    ///
    /// let mut system = System::default();
    /// system.set_console_hook(Box::new(|byte| print!("{}", byte as char)));
    /// ```
    pub fn set_console_hook(&mut self, hook: ConsoleHook) {
        self.bus.set_console_hook(hook);
    }

    /// Capture the current state
    pub fn save_state(&self, label: &str) -> SaveState {
        let (memory, interrupts) = self.bus.to_state();

        SaveState {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                label: label.to_string(),
                cycles: self.cycles,
                instructions: self.driver.stats().instructions,
            },
            cpu: self.cpu.to_state(),
            memory,
            interrupts,
        }
    }

    /// Restore a previously captured state
    ///
    /// The block cache is flushed: cached blocks may describe code that is
    /// no longer in RAM.
    ///
    /// # Errors
    ///
    /// `SaveState` if the version or memory sizes do not match.
    pub fn load_state(&mut self, state: &SaveState) -> Result<()> {
        if state.version != SAVE_STATE_VERSION {
            return Err(EmulatorError::SaveState(format!(
                "Incompatible save state version: expected {}, got {}",
                SAVE_STATE_VERSION, state.version
            )));
        }
        state.validate()?;

        self.cpu.restore_from_state(&state.cpu);
        self.bus
            .restore_from_state(&(state.memory.clone(), state.interrupts));
        self.driver.flush();
        self.cycles = state.metadata.cycles;

        log::info!(
            "Restored state '{}' from {} (PC 0x{:08X})",
            state.metadata.label,
            state.metadata.timestamp,
            state.cpu.pc
        );
        Ok(())
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// Get total cycles executed
    ///
    /// # Example
    ///
    /// ```
    /// use ps2rx::core::System;
    ///
    /// let system = System::default();
    /// assert_eq!(system.cycles(), 0);
    /// ```
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Driver counters
    pub fn stats(&self) -> DriverStats {
        self.driver.stats()
    }

    pub fn config(&self) -> &EmulatorConfig {
        self.driver.config()
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Timing manager, for registering embedder events
    pub fn timing_mut(&mut self) -> &mut TimingEventManager {
        &mut self.timing
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(EmulatorConfig::default())
    }
}

#[cfg(test)]
mod tests;
