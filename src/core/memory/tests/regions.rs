// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Address translation and segment mirroring tests

use super::*;

#[test]
fn test_address_translation() {
    let bus = Bus::new();

    assert_eq!(bus.translate_address(0x0000_1234).unwrap(), 0x0000_1234);
    assert_eq!(bus.translate_address(0x8000_1234).unwrap(), 0x0000_1234);
    assert_eq!(bus.translate_address(0xA000_1234).unwrap(), 0x0000_1234);
    assert_eq!(bus.translate_address(0xFFFF_0000).unwrap(), 0x1FFF_0000);
}

#[test]
fn test_segment_mirroring() {
    let mut bus = Bus::new();

    bus.write32(0x0000_1000, 0xAAAA_AAAA).unwrap();
    assert_eq!(bus.read32(0x8000_1000).unwrap(), 0xAAAA_AAAA);

    bus.write32(0xA000_1000, 0xBBBB_BBBB).unwrap();
    assert_eq!(bus.read32(0x0000_1000).unwrap(), 0xBBBB_BBBB);

    // Uncached RAM alias in KUSEG
    assert_eq!(bus.read32(0x2000_1000).unwrap(), 0xBBBB_BBBB);
}

#[test]
fn test_scratchpad_bypasses_translation() {
    let mut bus = Bus::new();

    bus.write128(0x7000_3FF0, u128::MAX).unwrap();
    assert_eq!(bus.read128(0x7000_3FF0).unwrap(), u128::MAX);
    assert_eq!(bus.scratchpad()[0x3FF0], 0xFF);

    // Not visible through RAM
    assert_eq!(bus.read32(0x8000_3FF0).unwrap(), 0);
}

#[test]
fn test_scratchpad_works_in_strict_mode() {
    let mut bus = Bus::new();
    bus.set_strict_mmu(true);

    bus.write32(0x7000_0010, 7).unwrap();
    assert_eq!(bus.read32(0x7000_0010).unwrap(), 7);
}

#[test]
fn test_strict_mmu_rejects_mapped_segments() {
    let mut bus = Bus::new();
    bus.set_strict_mmu(true);
    assert!(bus.strict_mmu());

    assert!(matches!(
        bus.read32(0x0010_0000),
        Err(EmulatorError::UnmodeledCapability(_))
    ));
    assert!(bus.write32(0xC000_0000, 0).is_err());

    // Unmapped segments still work
    bus.write32(0x8010_0000, 9).unwrap();
    assert_eq!(bus.read32(0xA010_0000).unwrap(), 9);
}
