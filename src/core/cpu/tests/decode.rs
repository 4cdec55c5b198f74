// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::*;
use proptest::prelude::*;

#[test]
fn test_decode_lui() {
    let instr = decode(0x3C08_1234);
    assert_eq!(instr.op, Opcode::Lui);
    assert_eq!(instr.rt, 8);
    assert_eq!(instr.imm, 0x1234);
    assert_eq!(instr.branch, BranchClass::None);
    assert_eq!(instr.cycles, CycleClass::Alu);
}

#[test]
fn test_decode_r_type_fields() {
    let instr = decode(special(0x20, 1, 2, 3, 0));
    assert_eq!(instr.op, Opcode::Add);
    assert_eq!((instr.rs, instr.rt, instr.rd), (1, 2, 3));
}

#[test]
fn test_decode_negative_branch_offset() {
    // bne $t0, $t1, -1
    let instr = decode(itype(0x05, 8, 9, 0xFFFF));
    assert_eq!(instr.op, Opcode::Bne);
    assert_eq!(instr.offset, -4);
    assert_eq!(instr.branch, BranchClass::Conditional);
    assert_eq!(instr.cycles, CycleClass::Branch);
}

#[test]
fn test_decode_jump_target() {
    let instr = decode(0x0C00_0800);
    assert_eq!(instr.op, Opcode::Jal);
    assert_eq!(instr.target, 0x800);
    assert_eq!(instr.branch, BranchClass::Unconditional);
}

#[test]
fn test_decode_mmi_subtables() {
    assert_eq!(decode(mmi(0x08, 0x18, 1, 2, 3)).op, Opcode::Paddsb);
    assert_eq!(decode(mmi(0x28, 0x18, 1, 2, 3)).op, Opcode::Paddub);
    assert_eq!(decode(mmi(0x09, 0x12, 1, 2, 3)).op, Opcode::Pand);
    assert_eq!(decode(mmi(0x29, 0x12, 1, 2, 3)).op, Opcode::Por);
    assert_eq!(decode(mmi(0x18, 0, 1, 2, 3)).op, Opcode::Mult1);
    assert_eq!(decode(mmi(0x30, 2, 0, 0, 3)).op, Opcode::Pmfhl);
}

#[test]
fn test_decode_coprocessors() {
    assert_eq!(decode(cop1_s(0x00, 2, 1, 3)).op, Opcode::AddS);
    assert_eq!(decode(cop1_s(0x32, 2, 1, 0)).op, Opcode::CEq);
    assert_eq!(decode(0x4500_0001).op, Opcode::Bc1f);
    assert_eq!(decode(0x4501_0001).op, Opcode::Bc1t);
    assert_eq!(decode(0x4502_0001).op, Opcode::Bc1fl);
    assert_eq!(decode(ERET).op, Opcode::Eret);
    assert_eq!(decode(0x4200_0038).op, Opcode::Ei);
    assert_eq!(decode(0x4800_0000 | (0x01 << 21)).op, Opcode::Qmfc2);
    assert_eq!(decode(0x4A00_0000).op, Opcode::Cop2Macro);
}

#[test]
fn test_decode_undefined_is_invalid() {
    // Primary 0x1D, SPECIAL funct 0x05, REGIMM rt 0x04
    assert_eq!(decode(0x7400_0000).op, Opcode::Invalid);
    assert_eq!(decode(0x0000_0005).op, Opcode::Invalid);
    assert_eq!(decode(0x0404_0000).op, Opcode::Invalid);
    assert_eq!(decode(0x7400_0000).branch, BranchClass::TrapLike);
}

#[test]
fn test_trap_like_classes() {
    assert_eq!(decode(SYSCALL).branch, BranchClass::TrapLike);
    assert_eq!(decode(ERET).branch, BranchClass::TrapLike);
    assert!(!BranchClass::TrapLike.has_delay_slot());
    assert!(BranchClass::ConditionalLikely.has_delay_slot());
}

#[test]
fn test_cycle_classes() {
    assert_eq!(decode(special(0x18, 1, 2, 0, 0)).cycles, CycleClass::Multiply);
    assert_eq!(decode(special(0x1A, 1, 2, 0, 0)).cycles, CycleClass::Divide);
    assert_eq!(decode(itype(0x23, 0, 8, 0)).cycles, CycleClass::Load);
    assert_eq!(decode(itype(0x2B, 0, 8, 0)).cycles, CycleClass::Store);
    assert_eq!(CycleClass::Divide.cycles(), 37);
}

proptest! {
    #[test]
    fn prop_decode_is_pure(raw in any::<u32>()) {
        let first = decode(raw);
        let second = decode(raw);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.op, select(raw));
        prop_assert_eq!(first.raw, raw);
    }

    #[test]
    fn prop_decode_classes_follow_opcode(raw in any::<u32>()) {
        let instr = decode(raw);
        prop_assert_eq!(instr.cycles, instr.op.cycle_class());
        prop_assert_eq!(instr.branch, instr.op.branch_class());
    }
}
