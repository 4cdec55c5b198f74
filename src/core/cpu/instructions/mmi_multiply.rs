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

//! Multimedia instructions that use the full 128-bit HI/LO pair

use super::super::decode::{DecodedInstruction, Opcode};
use super::super::CPU;
use super::mmi::{from_doublewords, from_halves, from_words, halves, words};
use super::multiply::{signed_divide, unsigned_divide};
use crate::core::error::Result;

/// Where each halfword product of PMULTH lands: (in HI, word index)
const HALF_PRODUCT_SLOTS: [(bool, usize); 8] = [
    (false, 0),
    (false, 1),
    (true, 0),
    (true, 1),
    (false, 2),
    (false, 3),
    (true, 2),
    (true, 3),
];

impl CPU {
    /// PMFHI/PMFLO/PMTHI/PMTLO: whole-register HI/LO moves
    pub(in crate::core::cpu) fn op_mmi_hilo_move(&mut self, i: &DecodedInstruction) -> Result<()> {
        match i.op {
            Opcode::Pmfhi => self.set_gpr(i.rd, self.hi),
            Opcode::Pmflo => self.set_gpr(i.rd, self.lo),
            Opcode::Pmthi => self.hi = self.gpr(i.rs),
            _ => self.lo = self.gpr(i.rs),
        }
        Ok(())
    }

    /// PMFHL: Parallel Move From HI/LO, format selected by sa
    ///
    /// - `.LW` (0): LO.w0, HI.w0, LO.w2, HI.w2
    /// - `.UW` (1): LO.w1, HI.w1, LO.w3, HI.w3
    /// - `.SLW` (2): HI:LO word pairs saturated to 32 bits, sign-extended
    /// - `.LH` (3): even halfwords of LO and HI
    /// - `.SH` (4): every word of LO and HI saturated to 16 bits
    pub(in crate::core::cpu) fn op_pmfhl(&mut self, i: &DecodedInstruction) -> Result<()> {
        let lo = words(self.lo);
        let hi = words(self.hi);

        let result = match i.sa {
            0 => from_words([lo[0], hi[0], lo[2], hi[2]]),
            1 => from_words([lo[1], hi[1], lo[3], hi[3]]),
            2 => {
                let saturate = |n: usize| {
                    let wide = (((hi[n] as u64) << 32) | lo[n] as u64) as i64;
                    wide.clamp(i32::MIN as i64, i32::MAX as i64) as u64
                };
                from_doublewords(saturate(0), saturate(2))
            }
            3 => {
                let (l, h) = (halves(self.lo), halves(self.hi));
                from_halves([l[0], l[2], h[0], h[2], l[4], l[6], h[4], h[6]])
            }
            4 => {
                let sat = |w: u32| (w as i32).clamp(i16::MIN as i32, i16::MAX as i32) as u16;
                from_halves([
                    sat(lo[0]),
                    sat(lo[1]),
                    sat(hi[0]),
                    sat(hi[1]),
                    sat(lo[2]),
                    sat(lo[3]),
                    sat(hi[2]),
                    sat(hi[3]),
                ])
            }
            _ => return self.op_reserved(i),
        };

        self.set_gpr(i.rd, result);
        Ok(())
    }

    /// PMTHL.LW: LO.w0/w2 = rs.w0/w2, HI.w0/w2 = rs.w1/w3
    ///
    /// Words 1 and 3 of HI and LO are kept.
    pub(in crate::core::cpu) fn op_pmthl(&mut self, i: &DecodedInstruction) -> Result<()> {
        if i.sa != 0 {
            return self.op_reserved(i);
        }
        let s = words(self.gpr(i.rs));
        let mut lo = words(self.lo);
        let mut hi = words(self.hi);
        lo[0] = s[0];
        hi[0] = s[1];
        lo[2] = s[2];
        hi[2] = s[3];
        self.lo = from_words(lo);
        self.hi = from_words(hi);
        Ok(())
    }

    /// PMULTW/PMULTUW/PMADDW/PMADDUW/PMSUBW
    ///
    /// Words 0 and 2 of rs and rt are multiplied. Product (or updated
    /// accumulator) n goes to doubleword n of rd and, split into words, to
    /// pipe n of HI/LO.
    pub(in crate::core::cpu) fn op_mmi_word_multiply(&mut self, i: &DecodedInstruction) -> Result<()> {
        let s = words(self.gpr(i.rs));
        let t = words(self.gpr(i.rt));
        let mut out = [0u64; 2];

        for (pipe, lane) in [(0usize, 0usize), (1, 2)] {
            let signed = (s[lane] as i32 as i64) * (t[lane] as i32 as i64);
            let unsigned = s[lane] as u64 * t[lane] as u64;
            let acc = self.hilo_accumulator(pipe);

            let value = match i.op {
                Opcode::Pmultw => signed as u64,
                Opcode::Pmultuw => unsigned,
                Opcode::Pmaddw => (acc as i64).wrapping_add(signed) as u64,
                Opcode::Pmadduw => acc.wrapping_add(unsigned),
                _ => (acc as i64).wrapping_sub(signed) as u64,
            };

            self.set_hilo_words(pipe, value as u32, (value >> 32) as u32);
            out[pipe] = value;
        }

        self.set_gpr(i.rd, from_doublewords(out[0], out[1]));
        Ok(())
    }

    /// PDIVW/PDIVUW: divide words 0 and 2; quotients to LO, remainders to HI
    pub(in crate::core::cpu) fn op_mmi_word_divide(&mut self, i: &DecodedInstruction) -> Result<()> {
        let s = words(self.gpr(i.rs));
        let t = words(self.gpr(i.rt));

        for (pipe, lane) in [(0usize, 0usize), (1, 2)] {
            let (q, r) = if i.op == Opcode::Pdivw {
                let (q, r) = signed_divide(s[lane] as i32, t[lane] as i32);
                (q as u32, r as u32)
            } else {
                unsigned_divide(s[lane], t[lane])
            };
            self.set_hilo_words(pipe, q, r);
        }
        Ok(())
    }

    /// PDIVBW: divide all four words of rs by halfword 0 of rt
    ///
    /// Quotients go to LO, remainders (16-bit, sign-extended) to HI.
    pub(in crate::core::cpu) fn op_pdivbw(&mut self, i: &DecodedInstruction) -> Result<()> {
        let s = words(self.gpr(i.rs));
        let divisor = halves(self.gpr(i.rt))[0] as i16 as i32;

        let mut q = [0u32; 4];
        let mut r = [0u32; 4];
        for n in 0..4 {
            let (quot, rem) = signed_divide(s[n] as i32, divisor);
            q[n] = quot as u32;
            r[n] = rem as i16 as i32 as u32;
        }

        self.lo = from_words(q);
        self.hi = from_words(r);
        Ok(())
    }

    /// PMULTH/PMADDH/PMSUBH: eight signed halfword products
    ///
    /// Products 0,1 go to LO.w0/w1, 2,3 to HI.w0/w1, 4,5 to LO.w2/w3 and
    /// 6,7 to HI.w2/w3. rd receives LO.w0, HI.w0, LO.w2, HI.w2.
    pub(in crate::core::cpu) fn op_mmi_halfword_multiply(&mut self, i: &DecodedInstruction) -> Result<()> {
        let s = halves(self.gpr(i.rs));
        let t = halves(self.gpr(i.rt));
        let mut lo = words(self.lo);
        let mut hi = words(self.hi);

        for (n, &(in_hi, w)) in HALF_PRODUCT_SLOTS.iter().enumerate() {
            let product = (s[n] as i16 as i32) * (t[n] as i16 as i32);
            let slot = if in_hi { &mut hi[w] } else { &mut lo[w] };
            *slot = match i.op {
                Opcode::Pmulth => product,
                Opcode::Pmaddh => (*slot as i32).wrapping_add(product),
                _ => (*slot as i32).wrapping_sub(product),
            } as u32;
        }

        self.lo = from_words(lo);
        self.hi = from_words(hi);
        self.set_gpr(i.rd, from_words([lo[0], hi[0], lo[2], hi[2]]));
        Ok(())
    }

    /// PHMADH/PHMSBH: horizontal multiply-add/subtract of halfword pairs
    ///
    /// Pair k of products (2k, 2k+1) is combined as `p[2k+1] ± p[2k]` and
    /// written to LO.w0, HI.w0, LO.w2, HI.w2 for k = 0..3. Words 1 and 3 are
    /// kept.
    pub(in crate::core::cpu) fn op_mmi_halfword_horizontal(&mut self, i: &DecodedInstruction) -> Result<()> {
        let s = halves(self.gpr(i.rs));
        let t = halves(self.gpr(i.rt));
        let p: [i32; 8] = std::array::from_fn(|n| (s[n] as i16 as i32) * (t[n] as i16 as i32));

        let combine = |k: usize| -> u32 {
            let (even, odd) = (p[2 * k], p[2 * k + 1]);
            if i.op == Opcode::Phmadh {
                odd.wrapping_add(even) as u32
            } else {
                odd.wrapping_sub(even) as u32
            }
        };

        let mut lo = words(self.lo);
        let mut hi = words(self.hi);
        lo[0] = combine(0);
        hi[0] = combine(1);
        lo[2] = combine(2);
        hi[2] = combine(3);

        self.lo = from_words(lo);
        self.hi = from_words(hi);
        self.set_gpr(i.rd, from_words([lo[0], hi[0], lo[2], hi[2]]));
        Ok(())
    }
}
