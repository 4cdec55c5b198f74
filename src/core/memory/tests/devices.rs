// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Peripheral routing tests

use super::*;
use crate::core::interrupt::interrupts;
use super::helpers::ScratchDevice;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_intc_routing() {
    let mut bus = Bus::new();
    bus.intc_mut().request(interrupts::VBLANK_START);

    assert_eq!(
        bus.read32(0xB000_F000).unwrap(),
        interrupts::VBLANK_START as u32
    );
    assert!(!bus.int0());

    bus.write32(0xB000_F010, interrupts::VBLANK_START as u32).unwrap();
    assert!(bus.int0());

    bus.write32(0xB000_F000, interrupts::VBLANK_START as u32).unwrap();
    assert!(!bus.int0());
}

#[test]
fn test_intc_byte_ack_leaves_other_sources_pending() {
    let mut bus = Bus::new();
    bus.intc_mut()
        .request(interrupts::VBLANK_START | interrupts::IPU);

    bus.write8(0xB000_F000, interrupts::VBLANK_START as u8).unwrap();

    assert_eq!(bus.intc().read_status(), interrupts::IPU as u32);
}

#[test]
fn test_intc_byte_mask_toggle_stays_in_lane() {
    let mut bus = Bus::new();
    bus.write32(0xB000_F010, (interrupts::GS | interrupts::IPU) as u32)
        .unwrap();

    // Upper byte: toggles IPU off, GS untouched
    bus.write8(0xB000_F011, (interrupts::IPU >> 8) as u8).unwrap();

    assert_eq!(bus.intc().read_mask(), interrupts::GS as u32);
}

#[test]
fn test_intc_stat_reads_are_counted() {
    let bus = Bus::new();

    for _ in 0..5 {
        bus.read32(0x1000_F000).unwrap();
    }
    // Mask reads do not count
    bus.read32(0x1000_F010).unwrap();
    assert_eq!(bus.intc_poll_count(), 5);

    bus.reset_poll_count();
    assert_eq!(bus.intc_poll_count(), 0);
}

#[test]
fn test_console_hook_receives_bytes() {
    let mut bus = Bus::new();
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&out);
    bus.set_console_hook(Box::new(move |b| sink.borrow_mut().push(b)));

    for &b in b"PS2" {
        bus.write8(0xB000_F180, b).unwrap();
    }
    assert_eq!(out.borrow().as_slice(), b"PS2");

    bus.clear_console_hook();
    bus.write8(0xB000_F180, b'!').unwrap();
    assert_eq!(out.borrow().len(), 3);
}

#[test]
fn test_attached_device_dispatch() {
    let mut bus = Bus::new();
    bus.attach_device(Box::new(ScratchDevice::new(0x1000_8000)));

    bus.write32(0xB000_8004, 0x1234_5678).unwrap();
    assert_eq!(bus.read32(0xB000_8004).unwrap(), 0x1234_5678);
    assert_eq!(bus.read16(0xB000_8006).unwrap(), 0x1234);

    bus.write64(0xB000_8010, 0xAAAA_BBBB_CCCC_DDDD).unwrap();
    assert_eq!(bus.read32(0xB000_8014).unwrap(), 0xAAAA_BBBB);
    assert_eq!(
        bus.read128(0xB000_8010).unwrap() as u64,
        0xAAAA_BBBB_CCCC_DDDD
    );
}

#[test]
fn test_int1_line() {
    let mut bus = Bus::new();
    assert!(!bus.int1());
    bus.set_int1(true);
    assert!(bus.int1());
}
