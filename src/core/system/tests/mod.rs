// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! System module tests


use super::*;

/// Little-endian ROM image from instruction words
pub(super) fn rom(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// `beq $0, $0, self` followed by its delay slot
pub(super) const SPIN: [u32; 2] = [0x1000_FFFF, 0x0000_0000];

/// System running the given words from the reset vector, followed by a spin
pub(super) fn system_with_rom(words: &[u32]) -> System {
    let mut image = words.to_vec();
    image.extend_from_slice(&SPIN);

    let mut system = System::default();
    system.load_bios_bytes(&rom(&image)).unwrap();
    system
}

pub(super) fn itype(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm as u32
}

pub(super) fn addiu(rt: u32, rs: u32, imm: u16) -> u32 {
    itype(0x09, rs, rt, imm)
}
