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

//! Multimedia instructions: extend, pack, interleave and permute

use super::super::decode::{DecodedInstruction, Opcode};
use super::super::CPU;
use super::mmi::{bytes, doublewords, from_bytes, from_doublewords, from_halves, from_words, halves, words};
use crate::core::error::Result;

/// Interleave `count` lanes of rt and rs starting at `first`: rt[first], rs[first], ...
fn interleave<T: Copy + Default, const N: usize>(rs: [T; N], rt: [T; N], first: usize) -> [T; N] {
    std::array::from_fn(|n| {
        let src = first + n / 2;
        if n % 2 == 0 {
            rt[src]
        } else {
            rs[src]
        }
    })
}

/// Even lanes of rt in the low half, even lanes of rs in the high half
fn pack_even<T: Copy + Default, const N: usize>(rs: [T; N], rt: [T; N]) -> [T; N] {
    std::array::from_fn(|n| {
        if n < N / 2 {
            rt[2 * n]
        } else {
            rs[2 * (n - N / 2)]
        }
    })
}

/// 1-5-5-5 halfword to 8-8-8-8 word
fn expand_5551(h: u32) -> u32 {
    let r = h & 0x1F;
    let g = (h >> 5) & 0x1F;
    let b = (h >> 10) & 0x1F;
    let a = (h >> 15) & 1;
    (r << 3) | (g << 11) | (b << 19) | (a << 31)
}

/// 8-8-8-8 word to 1-5-5-5 halfword
fn compress_8888(w: u32) -> u32 {
    ((w >> 3) & 0x1F) | (((w >> 11) & 0x1F) << 5) | (((w >> 19) & 0x1F) << 10) | ((w >> 31) << 15)
}

impl CPU {
    /// Extend, pack and permute instructions
    ///
    /// All of them only move lanes around; none of them change lane values
    /// except PEXT5/PPAC5, which convert pixel formats.
    pub(in crate::core::cpu) fn op_mmi_permute(&mut self, i: &DecodedInstruction) -> Result<()> {
        use Opcode::*;
        let rs = self.gpr(i.rs);
        let rt = self.gpr(i.rt);

        let result = match i.op {
            // Extend lower/upper half by interleaving rt and rs
            Pextlw => from_words(interleave(words(rs), words(rt), 0)),
            Pextuw => from_words(interleave(words(rs), words(rt), 2)),
            Pextlh => from_halves(interleave(halves(rs), halves(rt), 0)),
            Pextuh => from_halves(interleave(halves(rs), halves(rt), 4)),
            Pextlb => from_bytes(interleave(bytes(rs), bytes(rt), 0)),
            Pextub => from_bytes(interleave(bytes(rs), bytes(rt), 8)),

            // Pack even lanes
            Ppacw => from_words(pack_even(words(rs), words(rt))),
            Ppach => from_halves(pack_even(halves(rs), halves(rt))),
            Ppacb => from_bytes(pack_even(bytes(rs), bytes(rt))),

            // Pixel formats
            Pext5 => from_words(words(rt).map(expand_5551)),
            Ppac5 => from_words(words(rt).map(compress_8888)),

            // Interleave halfwords
            Pinth => {
                let (s, t) = (halves(rs), halves(rt));
                from_halves(std::array::from_fn(|n| if n % 2 == 0 { t[n / 2] } else { s[4 + n / 2] }))
            }
            Pinteh => {
                let (s, t) = (halves(rs), halves(rt));
                from_halves(std::array::from_fn(|n| if n % 2 == 0 { t[n] } else { s[n - 1] }))
            }

            // Doubleword copies
            Pcpyld => from_doublewords(doublewords(rt)[0], doublewords(rs)[0]),
            Pcpyud => from_doublewords(doublewords(rs)[1], doublewords(rt)[1]),
            Pcpyh => {
                let h = halves(rt);
                from_halves(std::array::from_fn(|n| if n < 4 { h[0] } else { h[4] }))
            }

            // Permutations of rt
            Pexeh => {
                let h = halves(rt);
                from_halves([h[2], h[1], h[0], h[3], h[6], h[5], h[4], h[7]])
            }
            Prevh => {
                let h = halves(rt);
                from_halves([h[3], h[2], h[1], h[0], h[7], h[6], h[5], h[4]])
            }
            Pexch => {
                let h = halves(rt);
                from_halves([h[0], h[2], h[1], h[3], h[4], h[6], h[5], h[7]])
            }
            Pexew => {
                let w = words(rt);
                from_words([w[2], w[1], w[0], w[3]])
            }
            Prot3w => {
                let w = words(rt);
                from_words([w[1], w[2], w[0], w[3]])
            }
            _ => {
                let w = words(rt);
                from_words([w[0], w[2], w[1], w[3]])
            }
        };

        self.set_gpr(i.rd, result);
        Ok(())
    }
}
