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

//! Save state serialization
//!
//! A save state captures everything needed to resume the EE core exactly
//! where it stopped:
//! - Metadata (timestamp, label, cycle and instruction counters)
//! - CPU state (GPRs, HI/LO, SA, PC, COP0, FPU, VU0 register files)
//! - Memory state (main RAM, scratchpad)
//! - Interrupt state (INTC_STAT, INTC_MASK, INT1 line)
//!
//! The BIOS ROM is not saved. The block cache is not saved either; it is
//! rebuilt lazily after a restore.
//!
//! # Format
//!
//! States are encoded with bincode using the standard configuration. A
//! version number guards against loading states written by an incompatible
//! build.
//!
//! # Example
//!
//! ```no_run
//! use ps2rx::core::save_state::SaveState;
//! use ps2rx::core::System;
//!
//! let mut system = System::default();
//! system.run_cycles(1_000_000).unwrap();
//!
//! let state = system.save_state("checkpoint");
//! state.save_to_file("checkpoint.state").unwrap();
//!
//! let loaded = SaveState::load_from_file("checkpoint.state").unwrap();
//! system.load_state(&loaded).unwrap();
//! ```

use crate::core::error::{EmulatorError, Result};
use crate::core::memory::{Bus, MemoryArena};
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Save state version for compatibility checking
///
/// Incremented whenever the layout changes incompatibly.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete emulator save state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// CPU state
    pub cpu: CpuState,

    /// Memory state (RAM, scratchpad)
    pub memory: MemoryState,

    /// Interrupt controller state
    pub interrupts: InterruptState,
}

/// When and where the state was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Free-form label chosen by the embedder
    pub label: String,

    /// Cycles executed since reset
    pub cycles: u64,

    /// Instructions retired since reset
    pub instructions: u64,
}

/// EE core state (R5900 plus COP0, FPU and VU0 register files)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CpuState {
    /// General purpose registers (128-bit)
    pub gprs: [u128; 32],

    /// HI register, both pipes
    pub hi: u128,

    /// LO register, both pipes
    pub lo: u128,

    /// Shift amount register
    pub sa: u32,

    /// Program counter
    pub pc: u32,

    /// Next PC (delay slot handling)
    pub next_pc: u32,

    /// The instruction at `pc` is a branch delay slot
    pub branch_pending: bool,

    /// COP0 registers
    pub cop0_regs: [u32; 32],

    /// FPU registers (raw single-precision bits)
    pub fpr: [u32; 32],

    /// FPU control/status register
    pub fcr31: u32,

    /// FPU accumulator
    pub fpu_acc: u32,

    /// VU0 floating-point registers
    pub vf: [u128; 32],

    /// VU0 integer and control registers
    pub vi: [u32; 32],
}

/// Main RAM and scratchpad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct MemoryState {
    /// Main RAM (32MB)
    pub ram: Vec<u8>,

    /// Scratchpad (16KB)
    pub scratchpad: Vec<u8>,
}

/// Interrupt lines and INTC registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct InterruptState {
    /// INTC_STAT
    pub intc_stat: u32,

    /// INTC_MASK
    pub intc_mask: u32,

    /// INT1 (DMAC) line level
    pub int1: bool,
}

impl SaveState {
    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode from bytes and check the version
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::SaveState` if the data does not decode, the
    /// version does not match or the memory images have the wrong size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (SaveState, usize) =
            bincode::decode_from_slice(bytes, config::standard())?;

        if state.version != SAVE_STATE_VERSION {
            return Err(EmulatorError::SaveState(format!(
                "Incompatible save state version: expected {}, got {}",
                SAVE_STATE_VERSION, state.version
            )));
        }
        state.validate()?;

        Ok(state)
    }

    /// Save state to file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ps2rx::core::save_state::SaveState;
    /// # let state = SaveState::default();
    /// state.save_to_file("save.state").unwrap();
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened or read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    /// Check that the memory images match the emulated sizes
    pub fn validate(&self) -> Result<()> {
        if self.memory.ram.len() != MemoryArena::RAM_SIZE {
            return Err(EmulatorError::SaveState(format!(
                "RAM image is {} bytes (expected {})",
                self.memory.ram.len(),
                MemoryArena::RAM_SIZE
            )));
        }
        if self.memory.scratchpad.len() != Bus::SCRATCHPAD_SIZE {
            return Err(EmulatorError::SaveState(format!(
                "Scratchpad image is {} bytes (expected {})",
                self.memory.scratchpad.len(),
                Bus::SCRATCHPAD_SIZE
            )));
        }
        Ok(())
    }

    /// Approximate encoded size in bytes
    pub fn estimated_size(&self) -> usize {
        MemoryArena::RAM_SIZE +  // RAM
        Bus::SCRATCHPAD_SIZE +   // Scratchpad
        4 * 1024 // Registers, metadata
    }
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                label: String::new(),
                cycles: 0,
                instructions: 0,
            },
            cpu: CpuState::default(),
            memory: MemoryState {
                ram: vec![0u8; MemoryArena::RAM_SIZE],
                scratchpad: vec![0u8; Bus::SCRATCHPAD_SIZE],
            },
            interrupts: InterruptState {
                intc_stat: 0,
                intc_mask: 0,
                int1: false,
            },
        }
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            gprs: [0; 32],
            hi: 0,
            lo: 0,
            sa: 0,
            pc: crate::core::cpu::RESET_VECTOR,
            next_pc: crate::core::cpu::RESET_VECTOR.wrapping_add(4),
            branch_pending: false,
            cop0_regs: [0; 32],
            fpr: [0; 32],
            fcr31: 0,
            fpu_acc: 0,
            vf: [0; 32],
            vi: [0; 32],
        }
    }
}

/// Trait for components that can be saved and restored
///
/// # Example
///
/// ```
/// use ps2rx::core::cpu::CPU;
/// use ps2rx::core::save_state::StateSave;
///
/// let mut cpu = CPU::new();
/// cpu.set_reg(8, 42);
/// let state = cpu.to_state();
///
/// let mut other = CPU::new();
/// other.restore_from_state(&state);
/// assert_eq!(other.reg(8), 42);
/// ```
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    fn restore_from_state(&mut self, state: &Self::State);
}

impl StateSave for Bus {
    type State = (MemoryState, InterruptState);

    fn to_state(&self) -> Self::State {
        let memory = MemoryState {
            ram: self.ram().to_vec(),
            scratchpad: self.scratchpad().to_vec(),
        };
        let interrupts = InterruptState {
            intc_stat: self.intc().read_status(),
            intc_mask: self.intc().read_mask(),
            int1: self.int1(),
        };
        (memory, interrupts)
    }

    /// Images of the wrong size are copied up to the shorter length;
    /// [`SaveState::validate`] rejects them beforehand.
    fn restore_from_state(&mut self, state: &Self::State) {
        let (memory, interrupts) = state;

        let ram = self.ram_mut();
        let n = ram.len().min(memory.ram.len());
        ram[..n].copy_from_slice(&memory.ram[..n]);

        let scratchpad = self.scratchpad_mut();
        let n = scratchpad.len().min(memory.scratchpad.len());
        scratchpad[..n].copy_from_slice(&memory.scratchpad[..n]);

        self.intc_mut()
            .restore(interrupts.intc_stat as u16, interrupts.intc_mask as u16);
        self.set_int1(interrupts.int1);
        self.reset_poll_count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpu::CPU;

    #[test]
    fn test_save_state_default() {
        let state = SaveState::default();
        assert_eq!(state.version, SAVE_STATE_VERSION);
        assert_eq!(state.memory.ram.len(), 32 * 1024 * 1024);
        assert_eq!(state.memory.scratchpad.len(), 16 * 1024);
        assert_eq!(state.cpu.pc, 0xBFC0_0000);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.state");

        let mut state = SaveState::default();
        state.metadata.label = "boot".to_string();
        state.metadata.cycles = 123_456;
        state.memory.ram[0x1000] = 0xAB;
        state.memory.scratchpad[0x100] = 0xCD;
        state.save_to_file(&path).unwrap();

        let loaded = SaveState::load_from_file(&path).unwrap();

        assert_eq!(loaded.metadata.label, "boot");
        assert_eq!(loaded.metadata.cycles, 123_456);
        assert_eq!(loaded.memory.ram[0x1000], 0xAB);
        assert_eq!(loaded.memory.scratchpad[0x100], 0xCD);
    }

    #[test]
    fn test_version_check() {
        let state = SaveState {
            version: 999,
            ..Default::default()
        };
        let bytes = state.to_bytes().unwrap();

        let result = SaveState::from_bytes(&bytes);

        match result {
            Err(EmulatorError::SaveState(msg)) => {
                assert!(msg.contains("Incompatible save state version"))
            }
            other => panic!("expected version error, got {:?}", other.map(|s| s.version)),
        }
    }

    #[test]
    fn test_truncated_ram_is_rejected() {
        let mut state = SaveState::default();
        state.memory.ram.truncate(1024);
        let bytes = state.to_bytes().unwrap();

        assert!(matches!(
            SaveState::from_bytes(&bytes),
            Err(EmulatorError::SaveState(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(SaveState::from_bytes(&[0xFF, 0x00, 0x13]).is_err());
    }

    #[test]
    fn test_cpu_state_keeps_128_bit_values() {
        let mut cpu = CPU::new();
        cpu.set_gpr(5, u128::MAX - 1);
        cpu.set_hi(1u128 << 100);
        cpu.set_fpr(3, 0x3F80_0000);

        let mut state = SaveState::default();
        state.cpu = cpu.to_state();
        let decoded = SaveState::from_bytes(&state.to_bytes().unwrap()).unwrap();

        assert_eq!(decoded.cpu.gprs[5], u128::MAX - 1);
        assert_eq!(decoded.cpu.hi, 1u128 << 100);
        assert_eq!(decoded.cpu.fpr[3], 0x3F80_0000);
    }

    #[test]
    fn test_bus_state_round_trip() {
        let mut bus = Bus::new();
        bus.write32(0x8000_2000, 0xDEAD_BEEF).unwrap();
        bus.write32(0x7000_0010, 0x1234_5678).unwrap();
        bus.intc_mut().write_mask(0x0005);
        bus.intc_mut().request(0x0004);
        bus.set_int1(true);

        let state = bus.to_state();
        let mut restored = Bus::new();
        restored.restore_from_state(&state);

        assert_eq!(restored.read32(0x8000_2000).unwrap(), 0xDEAD_BEEF);
        assert_eq!(restored.read32(0x7000_0010).unwrap(), 0x1234_5678);
        assert_eq!(restored.intc().read_mask(), 0x0005);
        assert_eq!(restored.intc().read_status(), 0x0004);
        assert!(restored.int1());
    }

    #[test]
    fn test_estimated_size() {
        let state = SaveState::default();
        let estimated = state.estimated_size();
        assert!(estimated > 32 * 1024 * 1024);
        assert!(estimated < 33 * 1024 * 1024);
    }
}
