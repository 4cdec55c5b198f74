// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::*;

const MMI0: u32 = 0x08;
const MMI1: u32 = 0x28;
const MMI2: u32 = 0x09;
const MMI3: u32 = 0x29;

fn splat8(byte: u8) -> u128 {
    u128::from_le_bytes([byte; 16])
}

fn splat16(half: u16) -> u128 {
    (0..8).fold(0u128, |acc, n| acc | (half as u128) << (16 * n))
}

fn splat32(word: u32) -> u128 {
    (0..4).fold(0u128, |acc, n| acc | (word as u128) << (32 * n))
}

fn words4(w: [u32; 4]) -> u128 {
    w.iter()
        .enumerate()
        .fold(0u128, |acc, (n, &x)| acc | (x as u128) << (32 * n))
}

fn binary(raw: u32, rs: u128, rt: u128) -> u128 {
    let mut cpu = CPU::new();
    cpu.set_gpr(1, rs);
    cpu.set_gpr(2, rt);
    exec(&mut cpu, raw);
    cpu.gpr(3)
}

#[test]
fn test_saturation_laws() {
    // paddsb: 127 + 1 = 127
    assert_eq!(binary(mmi(MMI0, 0x18, 1, 2, 3), splat8(127), splat8(1)), splat8(127));
    // paddub: 255 + 1 = 255
    assert_eq!(binary(mmi(MMI1, 0x18, 1, 2, 3), splat8(255), splat8(1)), splat8(255));
    // paddb: 255 + 1 = 0
    assert_eq!(binary(mmi(MMI0, 0x08, 1, 2, 3), splat8(255), splat8(1)), 0);
}

#[test]
fn test_signed_saturation_lower_bound() {
    // psubsb: -128 - 1 = -128
    assert_eq!(binary(mmi(MMI0, 0x19, 1, 2, 3), splat8(0x80), splat8(1)), splat8(0x80));
    // psubsh: -32768 - 1 = -32768
    assert_eq!(
        binary(mmi(MMI0, 0x15, 1, 2, 3), splat16(0x8000), splat16(1)),
        splat16(0x8000)
    );
    // psubuw: 0 - 1 = 0
    assert_eq!(binary(mmi(MMI1, 0x11, 1, 2, 3), 0, splat32(1)), 0);
}

#[test]
fn test_word_lanes_are_independent() {
    let rs = words4([0xFFFF_FFFF, 1, 0x7FFF_FFFF, 0]);
    let rt = words4([1, 1, 1, 0]);

    assert_eq!(binary(mmi(MMI0, 0x00, 1, 2, 3), rs, rt), words4([0, 2, 0x8000_0000, 0])); // paddw
    assert_eq!(
        binary(mmi(MMI0, 0x10, 1, 2, 3), rs, rt), // paddsw
        words4([0, 2, 0x7FFF_FFFF, 0])
    );
    assert_eq!(
        binary(mmi(MMI1, 0x10, 1, 2, 3), rs, rt), // padduw
        words4([0xFFFF_FFFF, 2, 0x8000_0000, 0])
    );
}

#[test]
fn test_compare_and_minmax() {
    let rs = words4([5, 0xFFFF_FFFF, 3, 3]);
    let rt = words4([4, 0, 3, 9]);

    assert_eq!(
        binary(mmi(MMI0, 0x02, 1, 2, 3), rs, rt), // pcgtw
        words4([0xFFFF_FFFF, 0, 0, 0])
    );
    assert_eq!(
        binary(mmi(MMI1, 0x02, 1, 2, 3), rs, rt), // pceqw
        words4([0, 0, 0xFFFF_FFFF, 0])
    );
    assert_eq!(
        binary(mmi(MMI0, 0x03, 1, 2, 3), rs, rt), // pmaxw
        words4([5, 0, 3, 9])
    );
    assert_eq!(
        binary(mmi(MMI1, 0x03, 1, 2, 3), rs, rt), // pminw
        words4([4, 0xFFFF_FFFF, 3, 3])
    );
}

#[test]
fn test_pabsh_saturates() {
    assert_eq!(binary(mmi(MMI1, 0x05, 0, 2, 3), 0, splat16(0x8000)), splat16(0x7FFF));
    assert_eq!(binary(mmi(MMI1, 0x05, 0, 2, 3), 0, splat16(0xFFFE)), splat16(2));
}

#[test]
fn test_logic_is_full_width() {
    let rs = u128::MAX << 64;
    let rt = u128::MAX;
    assert_eq!(binary(mmi(MMI2, 0x12, 1, 2, 3), rs, rt), rs); // pand
    assert_eq!(binary(mmi(MMI3, 0x13, 1, 2, 3), rs, 0), !rs); // pnor
}

#[test]
fn test_shift_lanes() {
    let mut cpu = CPU::new();
    cpu.set_gpr(2, splat16(0x8000));
    exec(&mut cpu, mmi(0x37, 15, 0, 2, 3)); // psrah $3, $2, 15
    assert_eq!(cpu.gpr(3), splat16(0xFFFF));

    cpu.set_gpr(2, splat32(1));
    exec(&mut cpu, mmi(0x3C, 31, 0, 2, 3)); // psllw $3, $2, 31
    assert_eq!(cpu.gpr(3), splat32(0x8000_0000));
}

#[test]
fn test_pextlw_and_pcpyld() {
    let rs = words4([0xA0, 0xA1, 0xA2, 0xA3]);
    let rt = words4([0xB0, 0xB1, 0xB2, 0xB3]);

    assert_eq!(
        binary(mmi(MMI0, 0x12, 1, 2, 3), rs, rt), // pextlw
        words4([0xB0, 0xA0, 0xB1, 0xA1])
    );
    assert_eq!(
        binary(mmi(MMI2, 0x0E, 1, 2, 3), rs, rt), // pcpyld
        words4([0xB0, 0xB1, 0xA0, 0xA1])
    );
    assert_eq!(
        binary(mmi(MMI3, 0x0E, 1, 2, 3), rs, rt), // pcpyud
        words4([0xA2, 0xA3, 0xB2, 0xB3])
    );
}

#[test]
fn test_plzcw() {
    let mut cpu = CPU::new();
    cpu.set_gpr(1, words4([1, 0xFFFF_FFFF, 0, 0]));

    exec(&mut cpu, mmi(0x04, 0, 1, 0, 3));

    assert_eq!(cpu.reg(3), (31u64 << 32) | 30);
}

#[test]
fn test_qfsrv_byte_funnel() {
    let mut cpu = CPU::new();
    cpu.set_gpr(1, 0x1111);
    cpu.set_gpr(2, u128::MAX);
    cpu.set_reg(4, 1);

    exec(&mut cpu, 0x0480_0000 | (0x18 << 16)); // mtsab $4, 0
    exec(&mut cpu, mmi(MMI1, 0x1B, 1, 2, 3)); // qfsrv $3, $1, $2

    assert_eq!(cpu.gpr(3), (u128::MAX >> 8) | (0x11u128 << 120));
}

#[test]
fn test_pmulth_layout() {
    let mut cpu = CPU::new();
    // halfwords 1..=8 times 2
    let rs = (0..8).fold(0u128, |acc, n| acc | ((n as u128 + 1) << (16 * n)));
    cpu.set_gpr(1, rs);
    cpu.set_gpr(2, splat16(2));

    exec(&mut cpu, mmi(MMI2, 0x1C, 1, 2, 3)); // pmulth

    assert_eq!(cpu.lo(), words4([2, 4, 10, 12]));
    assert_eq!(cpu.hi(), words4([6, 8, 14, 16]));
    assert_eq!(cpu.gpr(3), words4([2, 6, 10, 14]));
}

#[test]
fn test_pmultw_pipes() {
    let mut cpu = CPU::new();
    cpu.set_gpr(1, words4([0xFFFF_FFFF, 0, 3, 0]));
    cpu.set_gpr(2, words4([2, 0, 0x4000_0000, 0]));

    exec(&mut cpu, mmi(MMI2, 0x0C, 1, 2, 3)); // pmultw

    // pipe 0: -1 * 2, pipe 1: 3 * 2^30
    assert_eq!(cpu.gpr(3), ((0xC000_0000u128) << 64) | (-2i64 as u64) as u128);
    assert_eq!(cpu.lo() as u64, (-2i64) as u64);
    assert_eq!((cpu.hi() >> 64) as u64, 0);
    assert_eq!((cpu.lo() >> 64) as u64, 0xFFFF_FFFF_C000_0000);
}

#[test]
fn test_pdivw_and_pdivbw() {
    let mut cpu = CPU::new();
    cpu.set_gpr(1, words4([7, 0, 0xFFFF_FFF9, 0]));
    cpu.set_gpr(2, words4([2, 0, 2, 0]));

    exec(&mut cpu, mmi(MMI2, 0x0D, 1, 2, 0)); // pdivw
    assert_eq!(cpu.lo() as u64, 3);
    assert_eq!(cpu.hi() as u64, 1);
    assert_eq!((cpu.lo() >> 64) as u64, (-3i64) as u64);
    assert_eq!((cpu.hi() >> 64) as u64, (-1i64) as u64);

    cpu.set_gpr(1, words4([100, 0xFFFF_FF9C, 7, 0]));
    cpu.set_gpr(2, 10);
    exec(&mut cpu, mmi(MMI2, 0x1D, 1, 2, 0)); // pdivbw
    assert_eq!(cpu.lo(), words4([10, 0xFFFF_FFF6, 0, 0]));
    assert_eq!(cpu.hi(), words4([0, 0, 7, 0]));
}

#[test]
fn test_pmfhl_and_pmthl() {
    let mut cpu = CPU::new();
    cpu.set_lo(words4([1, 2, 3, 4]));
    cpu.set_hi(words4([5, 6, 7, 8]));

    exec(&mut cpu, mmi(0x30, 0, 0, 0, 3)); // pmfhl.lw
    assert_eq!(cpu.gpr(3), words4([1, 5, 3, 7]));

    exec(&mut cpu, mmi(0x30, 1, 0, 0, 3)); // pmfhl.uw
    assert_eq!(cpu.gpr(3), words4([2, 6, 4, 8]));

    cpu.set_gpr(1, words4([0xA, 0xB, 0xC, 0xD]));
    exec(&mut cpu, mmi(0x31, 0, 1, 0, 0)); // pmthl.lw
    assert_eq!(cpu.lo(), words4([0xA, 2, 0xC, 4]));
    assert_eq!(cpu.hi(), words4([0xB, 6, 0xD, 8]));
}

#[test]
fn test_pmfhl_saturating_formats() {
    let mut cpu = CPU::new();
    // pipe 0: HI:LO = 0x00000001_00000000 (too large), pipe 1: small negative
    cpu.set_lo(words4([0, 0, 0xFFFF_FFFE, 0]));
    cpu.set_hi(words4([1, 0, 0xFFFF_FFFF, 0]));

    exec(&mut cpu, mmi(0x30, 2, 0, 0, 3)); // pmfhl.slw
    assert_eq!(cpu.gpr(3) as u64, 0x7FFF_FFFF);
    assert_eq!((cpu.gpr(3) >> 64) as u64, (-2i64) as u64);

    cpu.set_lo(words4([0x0001_0000, 0xFFFF_0000, 5, 0]));
    cpu.set_hi(words4([0, 0, 0, 0]));
    exec(&mut cpu, mmi(0x30, 4, 0, 0, 3)); // pmfhl.sh
    assert_eq!(cpu.gpr(3) as u16, 0x7FFF);
    assert_eq!((cpu.gpr(3) >> 16) as u16, 0x8000);
    assert_eq!((cpu.gpr(3) >> 64) as u16, 5);
}

#[test]
fn test_pmfhl_undefined_format_is_reserved() {
    let mut cpu = CPU::new();
    exec(&mut cpu, mmi(0x30, 7, 0, 0, 3));
    assert_eq!(cause_code(&cpu), ExceptionCause::ReservedInstruction as u32);
}
