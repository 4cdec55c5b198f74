// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::*;

#[test]
fn test_add_overflow_traps_and_keeps_rd() {
    let mut cpu = CPU::new();
    cpu.set_pc(BASE);
    cpu.set_reg(1, 0x7FFF_FFFF);
    cpu.set_reg(2, 1);
    cpu.set_reg(3, 0xDEAD);

    exec(&mut cpu, special(0x20, 1, 2, 3, 0)); // add $3, $1, $2

    assert!(cpu.exception_raised());
    assert_eq!(cause_code(&cpu), ExceptionCause::Overflow as u32);
    assert_eq!(cpu.reg(3), 0xDEAD);
    assert_eq!(cpu.cop0_reg(COP0::EPC), BASE);
}

#[test]
fn test_add_without_overflow_commits() {
    let mut cpu = CPU::new();
    cpu.set_pc(BASE);
    cpu.set_reg(1, 0x7FFF_FFFE);
    cpu.set_reg(2, 1);

    exec(&mut cpu, special(0x20, 1, 2, 3, 0));

    assert!(!cpu.exception_raised());
    assert_eq!(cpu.reg(3), 0x7FFF_FFFF);
    assert_eq!(cpu.pc(), BASE + 4);
}

#[test]
fn test_addi_overflow() {
    let mut cpu = CPU::new();
    cpu.set_reg_sx32(1, 0x8000_0000);
    cpu.set_reg(4, 7);

    exec(&mut cpu, itype(0x08, 1, 4, 0xFFFF)); // addi $4, $1, -1

    assert_eq!(cause_code(&cpu), ExceptionCause::Overflow as u32);
    assert_eq!(cpu.reg(4), 7);
}

#[test]
fn test_addu_wraps_and_sign_extends() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 0x7FFF_FFFF);
    cpu.set_reg(2, 1);

    exec(&mut cpu, special(0x21, 1, 2, 3, 0));

    assert!(!cpu.exception_raised());
    assert_eq!(cpu.reg(3), 0xFFFF_FFFF_8000_0000);
}

#[test]
fn test_dadd_overflow_and_daddu() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, i64::MAX as u64);
    cpu.set_reg(2, 1);

    exec(&mut cpu, special(0x2C, 1, 2, 3, 0)); // dadd
    assert_eq!(cause_code(&cpu), ExceptionCause::Overflow as u32);
    assert_eq!(cpu.reg(3), 0);

    exec(&mut cpu, special(0x2D, 1, 2, 3, 0)); // daddu
    assert_eq!(cpu.reg(3), i64::MIN as u64);
}

#[test]
fn test_sub_overflow() {
    let mut cpu = CPU::new();
    cpu.set_reg_sx32(1, 0x8000_0000);
    cpu.set_reg(2, 1);

    exec(&mut cpu, special(0x22, 1, 2, 3, 0));
    assert_eq!(cause_code(&cpu), ExceptionCause::Overflow as u32);
    assert_eq!(cpu.reg(3), 0);
}

#[test]
fn test_alu_preserves_upper_doubleword() {
    let mut cpu = CPU::new();
    cpu.set_gpr(3, 0xAAAA_u128 << 64);
    cpu.set_reg(1, 5);
    cpu.set_reg(2, 6);

    exec(&mut cpu, special(0x21, 1, 2, 3, 0)); // addu

    assert_eq!(cpu.gpr(3), (0xAAAA_u128 << 64) | 11);
}

#[test]
fn test_slt_family() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, u64::MAX); // -1
    cpu.set_reg(2, 1);

    exec(&mut cpu, special(0x2A, 1, 2, 3, 0)); // slt
    assert_eq!(cpu.reg(3), 1);
    exec(&mut cpu, special(0x2B, 1, 2, 3, 0)); // sltu
    assert_eq!(cpu.reg(3), 0);
    exec(&mut cpu, itype(0x0B, 2, 4, 0xFFFF)); // sltiu $4, $2, -1
    assert_eq!(cpu.reg(4), 1);
}

#[test]
fn test_lui_ori_and_logic() {
    let mut cpu = CPU::new();
    exec(&mut cpu, 0x3C08_8000); // lui $t0, 0x8000
    assert_eq!(cpu.reg(8), 0xFFFF_FFFF_8000_0000);

    exec(&mut cpu, itype(0x0D, 8, 8, 0x00FF)); // ori
    assert_eq!(cpu.reg(8), 0xFFFF_FFFF_8000_00FF);

    exec(&mut cpu, itype(0x0C, 8, 9, 0x0F0F)); // andi
    assert_eq!(cpu.reg(9), 0x000F);

    exec(&mut cpu, special(0x27, 0, 0, 10, 0)); // nor $10, $0, $0
    assert_eq!(cpu.reg(10), u64::MAX);
}

#[test]
fn test_movz_movn() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 42);
    cpu.set_reg(2, 0);

    exec(&mut cpu, special(0x0A, 1, 2, 3, 0)); // movz $3, $1, $2
    assert_eq!(cpu.reg(3), 42);
    exec(&mut cpu, special(0x0B, 1, 2, 4, 0)); // movn $4, $1, $2
    assert_eq!(cpu.reg(4), 0);
}

#[test]
fn test_shifts() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 0x8000_0000);

    exec(&mut cpu, special(0x03, 0, 1, 2, 4)); // sra $2, $1, 4
    assert_eq!(cpu.reg(2), 0xFFFF_FFFF_F800_0000);
    exec(&mut cpu, special(0x02, 0, 1, 2, 4)); // srl
    assert_eq!(cpu.reg(2), 0x0800_0000);
    exec(&mut cpu, special(0x3C, 0, 1, 2, 0)); // dsll32
    assert_eq!(cpu.reg(2), 0x8000_0000_0000_0000);
    exec(&mut cpu, special(0x3B, 0, 2, 3, 31)); // dsra $3, $2, 31
    assert_eq!(cpu.reg(3), 0xFFFF_FFFF_0000_0000);
}

#[test]
fn test_mult_writes_lo_hi_and_rd() {
    let mut cpu = CPU::new();
    cpu.set_reg_sx32(1, 0xFFFF_FFFE); // -2
    cpu.set_reg(2, 3);

    exec(&mut cpu, special(0x18, 1, 2, 3, 0)); // mult $3, $1, $2

    assert_eq!(cpu.lo() as u64, (-6i64) as u64);
    assert_eq!(cpu.hi() as u64, u64::MAX);
    assert_eq!(cpu.reg(3), (-6i64) as u64);
    assert_eq!(cpu.lo() >> 64, 0);
}

#[test]
fn test_mult1_uses_pipe_one() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 0x1_0000);
    cpu.set_reg(2, 0x1_0000);

    exec(&mut cpu, mmi(0x18, 0, 1, 2, 0)); // mult1

    assert_eq!(cpu.lo() as u64, 0);
    assert_eq!((cpu.hi() >> 64) as u64, 1);
    assert_eq!((cpu.lo() >> 64) as u64, 0);
}

#[test]
fn test_div_edge_cases() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 7);
    cpu.set_reg(2, 0);

    exec(&mut cpu, special(0x1A, 1, 2, 0, 0)); // div by zero
    assert_eq!(cpu.lo() as u64, u64::MAX);
    assert_eq!(cpu.hi() as u64, 7);

    cpu.set_reg_sx32(1, 0x8000_0000);
    cpu.set_reg(2, u64::MAX);
    exec(&mut cpu, special(0x1A, 1, 2, 0, 0)); // i32::MIN / -1
    assert_eq!(cpu.lo() as u64, 0xFFFF_FFFF_8000_0000);
    assert_eq!(cpu.hi() as u64, 0);

    cpu.set_reg(1, 7);
    cpu.set_reg(2, 2);
    exec(&mut cpu, special(0x1B, 1, 2, 0, 0)); // divu
    assert_eq!(cpu.lo() as u64, 3);
    assert_eq!(cpu.hi() as u64, 1);
}

#[test]
fn test_madd_accumulates() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 3);
    cpu.set_reg(2, 4);

    exec(&mut cpu, special(0x18, 1, 2, 0, 0)); // mult
    exec(&mut cpu, mmi(0x00, 0, 1, 2, 5)); // madd $5, $1, $2

    assert_eq!(cpu.lo() as u64, 24);
    assert_eq!(cpu.reg(5), 24);
}

#[test]
fn test_sa_register() {
    let mut cpu = CPU::new();
    cpu.set_reg(1, 3);

    exec(&mut cpu, 0x0420_0000 | (0x18 << 16) | 0x0000); // mtsab $1, 0
    assert_eq!(cpu.sa(), 24);

    exec(&mut cpu, 0x0420_0000 | (0x19 << 16) | 0x0001); // mtsah $1, 1
    assert_eq!(cpu.sa(), 2 * 16);

    exec(&mut cpu, special(0x28, 0, 0, 4, 0)); // mfsa $4
    assert_eq!(cpu.reg(4), 32);
}
