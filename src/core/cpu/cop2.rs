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

//! Coprocessor 2 (VU0 in macro mode)
//!
//! The vector unit is an external collaborator. The CPU only moves data
//! in and out of its register files and forwards macro-mode opcodes, so the
//! seam is a trait. [`NullCop2`] keeps the register files and ignores
//! macro operations.

/// VU0 as seen from the EE
pub trait Cop2 {
    /// Read VF register (128-bit, four packed singles)
    fn read_vf(&self, index: usize) -> u128;

    /// Write VF register
    fn write_vf(&mut self, index: usize, value: u128);

    /// Read integer/control register (VI0-VI15, then control registers)
    fn read_control(&self, index: usize) -> u32;

    /// Write integer/control register
    fn write_control(&mut self, index: usize, value: u32);

    /// Execute one macro-mode instruction (COP2 rs >= 0x10)
    fn macro_op(&mut self, raw: u32);

    /// Condition tested by BC2F/BC2T
    fn branch_condition(&self) -> bool {
        false
    }

    /// Name for logging
    fn name(&self) -> &str {
        "VU0"
    }
}

/// Register files only, macro ops are logged and ignored
pub struct NullCop2 {
    vf: [u128; 32],
    vi: [u32; 32],
}

impl NullCop2 {
    /// VF0 is hardwired to (0, 0, 0, 1)
    pub const VF0: u128 = (0x3F80_0000u128) << 96;

    pub fn new() -> Self {
        Self {
            vf: [0u128; 32],
            vi: [0u32; 32],
        }
    }
}

impl Default for NullCop2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cop2 for NullCop2 {
    fn read_vf(&self, index: usize) -> u128 {
        if index == 0 {
            Self::VF0
        } else {
            self.vf[index & 0x1F]
        }
    }

    fn write_vf(&mut self, index: usize, value: u128) {
        if index != 0 {
            self.vf[index & 0x1F] = value;
        }
    }

    fn read_control(&self, index: usize) -> u32 {
        if index == 0 {
            0
        } else {
            self.vi[index & 0x1F]
        }
    }

    fn write_control(&mut self, index: usize, value: u32) {
        if index != 0 {
            self.vi[index & 0x1F] = value;
        }
    }

    fn macro_op(&mut self, raw: u32) {
        log::debug!("VU0 macro instruction 0x{:08X} ignored", raw);
    }

    fn name(&self) -> &str {
        "VU0 (register file only)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vf0_is_hardwired() {
        let mut vu = NullCop2::new();
        vu.write_vf(0, 0x1234);
        assert_eq!(vu.read_vf(0), NullCop2::VF0);
    }

    #[test]
    fn test_register_files() {
        let mut vu = NullCop2::new();
        vu.write_vf(5, u128::MAX);
        vu.write_control(3, 0xABCD);
        vu.write_control(0, 1);
        assert_eq!(vu.read_vf(5), u128::MAX);
        assert_eq!(vu.read_control(3), 0xABCD);
        assert_eq!(vu.read_control(0), 0);
        assert!(!vu.branch_condition());
    }
}
