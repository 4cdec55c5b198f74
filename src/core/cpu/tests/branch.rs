// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::*;

#[test]
fn test_beql_not_taken_skips_delay_slot() {
    let (mut cpu, mut bus) = setup(&[
        itype(0x14, 1, 0, 4), // beql $1, $0, +4 (not taken)
        addiu(8, 0, 1),       // delay slot, nullified
        addiu(9, 0, 2),
    ]);
    cpu.set_reg(1, 1);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), BASE + 8);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.reg(8), 0);
    assert_eq!(cpu.reg(9), 2);
}

#[test]
fn test_beq_not_taken_executes_delay_slot() {
    let (mut cpu, mut bus) = setup(&[
        itype(0x04, 1, 0, 4), // beq $1, $0, +4 (not taken)
        addiu(8, 0, 1),
        addiu(9, 0, 2),
    ]);
    cpu.set_reg(1, 1);

    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.reg(8), 1);
    assert_eq!(cpu.reg(9), 2);
}

#[test]
fn test_beq_taken_runs_slot_then_target() {
    let (mut cpu, mut bus) = setup(&[
        itype(0x04, 0, 0, 2), // beq $0, $0, +2 -> BASE + 12
        addiu(8, 0, 1),       // delay slot
        addiu(9, 0, 2),       // skipped
        addiu(10, 0, 3),      // target
    ]);

    run(&mut cpu, &mut bus, 1);
    assert!(cpu.in_delay_slot());
    assert_eq!(cpu.next_pc(), BASE + 12);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.reg(8), 1);
    assert_eq!(cpu.reg(9), 0);
    assert_eq!(cpu.reg(10), 3);
}

#[test]
fn test_beql_taken_executes_slot() {
    let (mut cpu, mut bus) = setup(&[
        itype(0x14, 0, 0, 2), // beql $0, $0, +2
        addiu(8, 0, 1),
        NOP,
        NOP,
    ]);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.reg(8), 1);
    assert_eq!(cpu.pc(), BASE + 12);
}

#[test]
fn test_jal_links_past_delay_slot() {
    // jal 0x80002000
    let (mut cpu, mut bus) = setup(&[0x0C00_0800, NOP]);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.pc(), 0x8000_2000);
    assert_eq!(cpu.reg(31), (BASE + 8) as u64);
}

#[test]
fn test_jr_and_jalr() {
    let (mut cpu, mut bus) = setup(&[
        special(0x09, 4, 0, 5, 0), // jalr $5, $4
        NOP,
    ]);
    cpu.set_reg(4, 0x8000_3000);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.pc(), 0x8000_3000);
    assert_eq!(cpu.reg(5), (BASE + 8) as u64);
}

#[test]
fn test_bltzal_links_even_when_not_taken() {
    let (mut cpu, mut bus) = setup(&[
        0x0400_0000 | (1 << 21) | (0x10 << 16) | 4, // bltzal $1, +4
        NOP,
    ]);
    cpu.set_reg(1, 5);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.reg(31), (BASE + 8) as u64);
    assert_eq!(cpu.pc(), BASE + 8);
}

#[test]
fn test_branch_compares_64_bits() {
    let (mut cpu, mut bus) = setup(&[
        itype(0x05, 1, 2, 2), // bne $1, $2, +2
        NOP,
        addiu(8, 0, 1),
        addiu(9, 0, 1),
    ]);
    cpu.set_reg(1, 0x1_0000_0000);
    cpu.set_reg(2, 0);

    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.reg(8), 0);
    assert_eq!(cpu.reg(9), 1);
}

#[test]
fn test_backward_branch() {
    let (mut cpu, mut bus) = setup(&[
        addiu(8, 8, 1),            // loop: $t0 += 1
        itype(0x05, 8, 9, 0xFFFE), // bne $t0, $t1, loop
        NOP,
    ]);
    cpu.set_reg(9, 3);

    run(&mut cpu, &mut bus, 9);
    assert_eq!(cpu.reg(8), 3);
    assert_eq!(cpu.pc(), BASE + 12);
}
