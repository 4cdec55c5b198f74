// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! CPU test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: initialization, reset, register views, r0 invariant
//! - `decode`: decoder table and purity
//! - `arithmetic`: ALU, overflow traps, HI/LO pipes
//! - `branch`: delay slots, likely branches, links
//! - `exceptions`: level-1/level-2 entry, ERET, interrupts, address errors
//! - `fpu`: COP1 transfers and flush-to-finite arithmetic
//! - `mmi`: packed multimedia instructions and saturation
//! - `driver`: block cache replay, fast paths, invalidation
//! - `end_to_end`: boot from ROM

use super::cop0::COP0;
use super::*;
use crate::core::memory::Bus;

mod arithmetic;
mod branch;
mod decode;
mod mmi;

/// Where test programs are placed (KSEG0, physical 0x1000)
const BASE: u32 = 0x8000_1000;

/// I-type: op rt, rs, imm
fn itype(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm as u32
}

/// SPECIAL R-type
fn special(funct: u32, rs: u32, rt: u32, rd: u32, sa: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (sa << 6) | funct
}

/// MMI R-type; `sub` is the sa field selecting within MMI0-3
fn mmi(funct: u32, sub: u32, rs: u32, rt: u32, rd: u32) -> u32 {
    (0x1C << 26) | (rs << 21) | (rt << 16) | (rd << 11) | (sub << 6) | funct
}

/// COP1 single-precision arithmetic
fn cop1_s(funct: u32, ft: u32, fs: u32, fd: u32) -> u32 {
    (0x11 << 26) | (0x10 << 21) | (ft << 16) | (fs << 11) | (fd << 6) | funct
}

const NOP: u32 = 0;
const SYSCALL: u32 = 0x0000_000C;
const ERET: u32 = 0x4200_0018;

fn addiu(rt: u32, rs: u32, imm: u16) -> u32 {
    itype(0x09, rs, rt, imm)
}

/// Bus with `program` at [`BASE`] and a CPU about to execute it
fn setup(program: &[u32]) -> (CPU, Bus) {
    let mut bus = Bus::new();
    for (n, &word) in program.iter().enumerate() {
        bus.write32(BASE + 4 * n as u32, word).unwrap();
    }
    let mut cpu = CPU::new();
    cpu.set_pc(BASE);
    (cpu, bus)
}

/// Run `n` uncached steps
fn run(cpu: &mut CPU, bus: &mut Bus, n: usize) {
    for _ in 0..n {
        cpu.step(bus).unwrap();
    }
}

/// Execute a single instruction without placing it in memory
fn exec(cpu: &mut CPU, raw: u32) {
    let mut bus = Bus::new();
    cpu.execute_decoded(&decode(raw), &mut bus).unwrap();
}

/// Clear BEV and ERL so vectors land in KSEG0 and interrupts can be admitted
fn kernel_mode(cpu: &mut CPU) {
    let status = cpu.status() & !(Status::BEV | Status::ERL);
    cpu.cop0.set_status(status);
}

fn cause_code(cpu: &CPU) -> u32 {
    (cpu.cop0_reg(COP0::CAUSE) & cause::EXC_CODE_MASK) >> cause::EXC_CODE_SHIFT
}
