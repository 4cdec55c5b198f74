// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Helper functions for memory tests

use super::*;

/// Creates a Bus whose ROM starts with the given words
#[allow(dead_code)]
pub fn create_bus_with_rom(words: &[u32]) -> Bus {
    let mut bus = Bus::new();
    let image: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    bus.load_bios_bytes(&image).unwrap();
    bus
}

/// Minimal register-file device for routing tests
pub struct ScratchDevice {
    pub base: u32,
    pub regs: [u32; 8],
}

impl ScratchDevice {
    pub fn new(base: u32) -> Self {
        Self { base, regs: [0; 8] }
    }
}

impl IODevice for ScratchDevice {
    fn address_range(&self) -> (u32, u32) {
        (self.base, self.base + 0x1F)
    }

    fn read_word(&self, offset: u32) -> crate::core::error::Result<u32> {
        Ok(self.regs[(offset / 4) as usize])
    }

    fn write_word(&mut self, offset: u32, value: u32) -> crate::core::error::Result<()> {
        self.regs[(offset / 4) as usize] = value;
        Ok(())
    }

    fn name(&self) -> &str {
        "Scratch"
    }
}
