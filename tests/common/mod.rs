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

//! Shared helpers for integration tests

use ps2rx::core::system::System;

/// Encode an I-type instruction
#[allow(dead_code)]
pub fn itype(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm as u32
}

/// Encode an R-type SPECIAL instruction
#[allow(dead_code)]
pub fn special(funct: u32, rs: u32, rt: u32, rd: u32, sa: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (sa << 6) | funct
}

/// Encode an MMI instruction
#[allow(dead_code)]
pub fn mmi(funct: u32, sub: u32, rs: u32, rt: u32, rd: u32) -> u32 {
    (0x1C << 26) | (rs << 21) | (rt << 16) | (rd << 11) | (sub << 6) | funct
}

/// Encode a coprocessor register move (MFCz/MTCz)
#[allow(dead_code)]
pub fn cop_move(cop: u32, fmt: u32, rt: u32, rd: u32) -> u32 {
    ((0x10 | cop) << 26) | (fmt << 21) | (rt << 16) | (rd << 11)
}

/// `beq $0, $0, self` and its delay slot
#[allow(dead_code)]
pub const SPIN: [u32; 2] = [0x1000_FFFF, 0x0000_0000];

/// Little-endian byte image of instruction words
#[allow(dead_code)]
pub fn image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// System with `words` followed by a spin loop loaded as the BIOS
#[allow(dead_code)]
pub fn boot_rom(words: &[u32]) -> System {
    let mut program = words.to_vec();
    program.extend_from_slice(&SPIN);

    let mut system = System::default();
    system
        .load_bios_bytes(&image(&program))
        .expect("Failed to load ROM image");
    system
}

/// Pack four 32-bit lanes into a quadword, lane 0 lowest
#[allow(dead_code)]
pub fn quad(lanes: [u32; 4]) -> u128 {
    lanes
        .iter()
        .rev()
        .fold(0u128, |acc, &lane| (acc << 32) | lane as u128)
}

/// Get BIOS path from environment
#[allow(dead_code)]
pub fn get_bios_path() -> Option<String> {
    std::env::var("PS2_BIOS_PATH").ok()
}
