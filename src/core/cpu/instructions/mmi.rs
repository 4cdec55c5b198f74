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

//! Multimedia instructions: lane-wise arithmetic, logic and shifts
//!
//! A 128-bit register is viewed as 16 bytes, 8 halfwords, 4 words or 2
//! doublewords, lane 0 being the least significant. Each instruction picks
//! one of three overflow behaviours: wrap, signed saturation or unsigned
//! saturation.

use super::super::decode::{DecodedInstruction, Opcode};
use super::super::CPU;
use crate::core::error::Result;

#[inline(always)]
pub(super) fn bytes(v: u128) -> [u8; 16] {
    v.to_le_bytes()
}

#[inline(always)]
pub(super) fn from_bytes(lanes: [u8; 16]) -> u128 {
    u128::from_le_bytes(lanes)
}

#[inline(always)]
pub(super) fn halves(v: u128) -> [u16; 8] {
    std::array::from_fn(|n| (v >> (16 * n)) as u16)
}

#[inline(always)]
pub(super) fn from_halves(lanes: [u16; 8]) -> u128 {
    lanes
        .iter()
        .enumerate()
        .fold(0u128, |acc, (n, &h)| acc | (h as u128) << (16 * n))
}

#[inline(always)]
pub(super) fn words(v: u128) -> [u32; 4] {
    std::array::from_fn(|n| (v >> (32 * n)) as u32)
}

#[inline(always)]
pub(super) fn from_words(lanes: [u32; 4]) -> u128 {
    lanes
        .iter()
        .enumerate()
        .fold(0u128, |acc, (n, &w)| acc | (w as u128) << (32 * n))
}

#[inline(always)]
pub(super) fn doublewords(v: u128) -> [u64; 2] {
    [v as u64, (v >> 64) as u64]
}

#[inline(always)]
pub(super) fn from_doublewords(lo: u64, hi: u64) -> u128 {
    (lo as u128) | ((hi as u128) << 64)
}

fn map_bytes(a: u128, b: u128, f: impl Fn(u8, u8) -> u8) -> u128 {
    let (a, b) = (bytes(a), bytes(b));
    from_bytes(std::array::from_fn(|n| f(a[n], b[n])))
}

fn map_halves(a: u128, b: u128, f: impl Fn(u16, u16) -> u16) -> u128 {
    let (a, b) = (halves(a), halves(b));
    from_halves(std::array::from_fn(|n| f(a[n], b[n])))
}

fn map_words(a: u128, b: u128, f: impl Fn(u32, u32) -> u32) -> u128 {
    let (a, b) = (words(a), words(b));
    from_words(std::array::from_fn(|n| f(a[n], b[n])))
}

#[inline(always)]
fn mask<T: From<u8> + std::ops::Not<Output = T>>(flag: bool) -> T {
    if flag {
        !T::from(0)
    } else {
        T::from(0)
    }
}

impl CPU {
    /// Lane-wise arithmetic, comparison and logic on rs and rt
    ///
    /// Format: paddw rd, rs, rt
    /// Operation: rd[n] = rs[n] op rt[n] for every lane n
    pub(in crate::core::cpu) fn op_mmi_lanes(&mut self, i: &DecodedInstruction) -> Result<()> {
        use Opcode::*;
        let a = self.gpr(i.rs);
        let b = self.gpr(i.rt);

        let result = match i.op {
            // Words
            Paddw => map_words(a, b, |x, y| x.wrapping_add(y)),
            Psubw => map_words(a, b, |x, y| x.wrapping_sub(y)),
            Paddsw => map_words(a, b, |x, y| (x as i32).saturating_add(y as i32) as u32),
            Psubsw => map_words(a, b, |x, y| (x as i32).saturating_sub(y as i32) as u32),
            Padduw => map_words(a, b, |x, y| x.saturating_add(y)),
            Psubuw => map_words(a, b, |x, y| x.saturating_sub(y)),
            Pcgtw => map_words(a, b, |x, y| mask((x as i32) > (y as i32))),
            Pceqw => map_words(a, b, |x, y| mask(x == y)),
            Pmaxw => map_words(a, b, |x, y| (x as i32).max(y as i32) as u32),
            Pminw => map_words(a, b, |x, y| (x as i32).min(y as i32) as u32),
            Pabsw => map_words(b, b, |x, _| (x as i32).saturating_abs() as u32),

            // Halfwords
            Paddh => map_halves(a, b, |x, y| x.wrapping_add(y)),
            Psubh => map_halves(a, b, |x, y| x.wrapping_sub(y)),
            Paddsh => map_halves(a, b, |x, y| (x as i16).saturating_add(y as i16) as u16),
            Psubsh => map_halves(a, b, |x, y| (x as i16).saturating_sub(y as i16) as u16),
            Padduh => map_halves(a, b, |x, y| x.saturating_add(y)),
            Psubuh => map_halves(a, b, |x, y| x.saturating_sub(y)),
            Pcgth => map_halves(a, b, |x, y| mask((x as i16) > (y as i16))),
            Pceqh => map_halves(a, b, |x, y| mask(x == y)),
            Pmaxh => map_halves(a, b, |x, y| (x as i16).max(y as i16) as u16),
            Pminh => map_halves(a, b, |x, y| (x as i16).min(y as i16) as u16),
            Pabsh => map_halves(b, b, |x, _| (x as i16).saturating_abs() as u16),
            Padsbh => {
                let (x, y) = (halves(a), halves(b));
                from_halves(std::array::from_fn(|n| {
                    if n < 4 {
                        x[n].wrapping_sub(y[n])
                    } else {
                        x[n].wrapping_add(y[n])
                    }
                }))
            }

            // Bytes
            Paddb => map_bytes(a, b, |x, y| x.wrapping_add(y)),
            Psubb => map_bytes(a, b, |x, y| x.wrapping_sub(y)),
            Paddsb => map_bytes(a, b, |x, y| (x as i8).saturating_add(y as i8) as u8),
            Psubsb => map_bytes(a, b, |x, y| (x as i8).saturating_sub(y as i8) as u8),
            Paddub => map_bytes(a, b, |x, y| x.saturating_add(y)),
            Psubub => map_bytes(a, b, |x, y| x.saturating_sub(y)),
            Pcgtb => map_bytes(a, b, |x, y| mask((x as i8) > (y as i8))),
            Pceqb => map_bytes(a, b, |x, y| mask(x == y)),

            // Whole register
            Pand => a & b,
            Por => a | b,
            Pxor => a ^ b,
            _ => !(a | b),
        };

        self.set_gpr(i.rd, result);
        Ok(())
    }

    /// PSLLH/PSRLH/PSRAH/PSLLW/PSRLW/PSRAW: shift every lane of rt by sa
    pub(in crate::core::cpu) fn op_mmi_shift(&mut self, i: &DecodedInstruction) -> Result<()> {
        use Opcode::*;
        let v = self.gpr(i.rt);
        let hs = (i.sa & 0xF) as u32;
        let ws = (i.sa & 0x1F) as u32;

        let result = match i.op {
            Psllh => map_halves(v, 0, |x, _| x << hs),
            Psrlh => map_halves(v, 0, |x, _| x >> hs),
            Psrah => map_halves(v, 0, |x, _| ((x as i16) >> hs) as u16),
            Psllw => map_words(v, 0, |x, _| x << ws),
            Psrlw => map_words(v, 0, |x, _| x >> ws),
            _ => map_words(v, 0, |x, _| ((x as i32) >> ws) as u32),
        };

        self.set_gpr(i.rd, result);
        Ok(())
    }

    /// PSLLVW/PSRLVW/PSRAVW: variable shift of words 0 and 2
    ///
    /// Each 32-bit result is sign-extended into its doubleword.
    pub(in crate::core::cpu) fn op_mmi_shift_variable(&mut self, i: &DecodedInstruction) -> Result<()> {
        let value = words(self.gpr(i.rt));
        let amount = words(self.gpr(i.rs));

        let shift = |n: usize| -> u64 {
            let s = amount[n] & 0x1F;
            let w = match i.op {
                Opcode::Psllvw => value[n] << s,
                Opcode::Psrlvw => value[n] >> s,
                _ => ((value[n] as i32) >> s) as u32,
            };
            w as i32 as i64 as u64
        };

        self.set_gpr(i.rd, from_doublewords(shift(0), shift(2)));
        Ok(())
    }

    /// PLZCW: count leading sign bits (minus one) of words 0 and 1
    ///
    /// Format: plzcw rd, rs
    pub(in crate::core::cpu) fn op_plzcw(&mut self, i: &DecodedInstruction) -> Result<()> {
        let w = words(self.gpr(i.rs));
        let count = |x: u32| -> u32 {
            let leading = if x as i32 >= 0 {
                x.leading_zeros()
            } else {
                x.leading_ones()
            };
            leading - 1
        };

        let result = ((count(w[1]) as u64) << 32) | count(w[0]) as u64;
        self.set_reg(i.rd, result);
        Ok(())
    }

    /// QFSRV: Quadword Funnel Shift Right Variable
    ///
    /// Shifts the 256-bit concatenation rs:rt right by SA bits and keeps the
    /// low 128 bits.
    ///
    /// Format: qfsrv rd, rs, rt
    pub(in crate::core::cpu) fn op_qfsrv(&mut self, i: &DecodedInstruction) -> Result<()> {
        let shift = self.sa & 0x7F;
        let rs = self.gpr(i.rs);
        let rt = self.gpr(i.rt);

        let result = if shift == 0 {
            rt
        } else {
            (rt >> shift) | (rs << (128 - shift))
        };
        self.set_gpr(i.rd, result);
        Ok(())
    }
}
