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

//! Coprocessor 1 (FPU)
//!
//! The EE FPU is not IEEE 754. Denormal inputs read as signed zero,
//! infinities and NaNs do not exist, and every result is clamped into the
//! finite single-precision range. Overflow saturates to ±`f32::MAX` and
//! underflow flushes to signed zero; both raise a flag in FCR31 plus its
//! sticky twin.
//!
//! Arithmetic is carried out in `f64` and narrowed once. The double keeps
//! every intermediate of a single operation finite, so the only place a
//! result can leave the finite range is the final narrowing.

use bitflags::bitflags;

bitflags! {
    /// FCR31 control/status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fcr31: u32 {
        /// Sticky underflow
        const SU = 1 << 3;
        /// Sticky overflow
        const SO = 1 << 4;
        /// Sticky divide by zero
        const SD = 1 << 5;
        /// Sticky invalid
        const SI = 1 << 6;
        /// Underflow (last operation)
        const U = 1 << 14;
        /// Overflow (last operation)
        const O = 1 << 15;
        /// Divide by zero (last division)
        const D = 1 << 16;
        /// Invalid (last division or square root)
        const I = 1 << 17;
        /// Compare condition, tested by BC1F/BC1T
        const C = 1 << 23;
    }
}

/// Largest finite single, sign bit clear
const MAX_BITS: u32 = 0x7F7F_FFFF;
const SIGN_BIT: u32 = 0x8000_0000;

/// Interpret raw single bits the way the FPU does
///
/// Exponent 0 is read as signed zero and exponent 255 as signed `f32::MAX`.
#[inline]
pub fn flush_input(bits: u32) -> f64 {
    let sign = bits & SIGN_BIT;
    match (bits >> 23) & 0xFF {
        0 => f32::from_bits(sign) as f64,
        0xFF => f32::from_bits(sign | MAX_BITS) as f64,
        _ => f32::from_bits(bits) as f64,
    }
}

/// FPU state
pub(crate) struct Cop1 {
    /// FPR0-FPR31, raw single bits
    pub(crate) fpr: [u32; 32],
    /// Control/status register
    pub(crate) fcr31: u32,
    /// Accumulator used by the ADDA/MADDA family
    pub(crate) acc: u32,
}

impl Cop1 {
    /// Implementation/revision register (FCR0)
    pub const FCR0_VALUE: u32 = 0x0000_2E30;

    /// Bits of FCR31 the guest may write
    const FCR31_WRITABLE: u32 = 0x0083_C078;

    pub(crate) fn new() -> Self {
        Self {
            fpr: [0u32; 32],
            fcr31: 0,
            acc: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    pub(crate) fn flags(&self) -> Fcr31 {
        Fcr31::from_bits_retain(self.fcr31)
    }

    #[inline(always)]
    fn set(&mut self, flags: Fcr31) {
        self.fcr31 |= flags.bits();
    }

    #[inline(always)]
    fn clear(&mut self, flags: Fcr31) {
        self.fcr31 &= !flags.bits();
    }

    /// Compare condition bit
    #[inline(always)]
    pub(crate) fn condition(&self) -> bool {
        self.flags().contains(Fcr31::C)
    }

    /// CFC1
    pub(crate) fn read_control(&self, index: usize) -> u32 {
        match index {
            0 => Self::FCR0_VALUE,
            31 => self.fcr31,
            _ => 0,
        }
    }

    /// CTC1
    pub(crate) fn write_control(&mut self, index: usize, value: u32) {
        match index {
            31 => self.fcr31 = value & Self::FCR31_WRITABLE,
            _ => log::debug!("Ignoring CTC1 to FCR{}: 0x{:08X}", index, value),
        }
    }

    /// Narrow an f64 result to a finite single, raising O/U as needed
    fn narrow(&mut self, value: f64) -> u32 {
        let single = value as f32;
        let sign = single.to_bits() & SIGN_BIT;

        if single.is_infinite() {
            self.set(Fcr31::O | Fcr31::SO);
            return sign | MAX_BITS;
        }
        if single.is_nan() {
            self.set(Fcr31::I | Fcr31::SI);
            return MAX_BITS;
        }
        let tiny = single != 0.0 && single.abs() < f32::MIN_POSITIVE;
        let lost = single == 0.0 && value != 0.0;
        if tiny || lost {
            self.set(Fcr31::U | Fcr31::SU);
            return sign;
        }
        single.to_bits()
    }

    /// Run one arithmetic operation with O/U cleared beforehand
    fn arith(&mut self, op: impl FnOnce(f64) -> f64, acc: u32) -> u32 {
        self.clear(Fcr31::O | Fcr31::U);
        let result = op(flush_input(acc));
        self.narrow(result)
    }

    pub(crate) fn add(&mut self, fs: u32, ft: u32) -> u32 {
        let (a, b) = (flush_input(fs), flush_input(ft));
        self.arith(|_| a + b, 0)
    }

    pub(crate) fn sub(&mut self, fs: u32, ft: u32) -> u32 {
        let (a, b) = (flush_input(fs), flush_input(ft));
        self.arith(|_| a - b, 0)
    }

    pub(crate) fn mul(&mut self, fs: u32, ft: u32) -> u32 {
        let (a, b) = (flush_input(fs), flush_input(ft));
        self.arith(|_| a * b, 0)
    }

    /// `acc + fs * ft`
    pub(crate) fn madd(&mut self, fs: u32, ft: u32) -> u32 {
        let (a, b) = (flush_input(fs), flush_input(ft));
        self.arith(|acc| acc + a * b, self.acc)
    }

    /// `acc - fs * ft`
    pub(crate) fn msub(&mut self, fs: u32, ft: u32) -> u32 {
        let (a, b) = (flush_input(fs), flush_input(ft));
        self.arith(|acc| acc - a * b, self.acc)
    }

    /// DIV.S
    ///
    /// Division by zero returns ±MAX and raises D (or I for 0/0).
    pub(crate) fn div(&mut self, fs: u32, ft: u32) -> u32 {
        self.clear(Fcr31::I | Fcr31::D);
        let (a, b) = (flush_input(fs), flush_input(ft));

        if b == 0.0 {
            if a == 0.0 {
                self.set(Fcr31::I | Fcr31::SI);
            } else {
                self.set(Fcr31::D | Fcr31::SD);
            }
            return ((fs ^ ft) & SIGN_BIT) | MAX_BITS;
        }
        self.arith(|_| a / b, 0)
    }

    /// SQRT.S
    ///
    /// Negative operands raise I and return the root of the magnitude.
    pub(crate) fn sqrt(&mut self, ft: u32) -> u32 {
        self.clear(Fcr31::I | Fcr31::D);
        let b = flush_input(ft);
        if b < 0.0 {
            self.set(Fcr31::I | Fcr31::SI);
        }
        self.arith(|_| b.abs().sqrt(), 0)
    }

    /// RSQRT.S: `fs / sqrt(ft)`
    pub(crate) fn rsqrt(&mut self, fs: u32, ft: u32) -> u32 {
        self.clear(Fcr31::I | Fcr31::D);
        let (a, b) = (flush_input(fs), flush_input(ft));

        if b == 0.0 {
            self.set(Fcr31::D | Fcr31::SD);
            return (fs & SIGN_BIT) | MAX_BITS;
        }
        if b < 0.0 {
            self.set(Fcr31::I | Fcr31::SI);
        }
        self.arith(|_| a / b.abs().sqrt(), 0)
    }

    pub(crate) fn abs(&mut self, fs: u32) -> u32 {
        self.clear(Fcr31::O | Fcr31::U);
        fs & !SIGN_BIT
    }

    pub(crate) fn neg(&mut self, fs: u32) -> u32 {
        self.clear(Fcr31::O | Fcr31::U);
        fs ^ SIGN_BIT
    }

    pub(crate) fn max(&mut self, fs: u32, ft: u32) -> u32 {
        self.clear(Fcr31::O | Fcr31::U);
        if flush_input(fs) >= flush_input(ft) {
            fs
        } else {
            ft
        }
    }

    pub(crate) fn min(&mut self, fs: u32, ft: u32) -> u32 {
        self.clear(Fcr31::O | Fcr31::U);
        if flush_input(fs) <= flush_input(ft) {
            fs
        } else {
            ft
        }
    }

    /// CVT.W.S, truncating and saturating at the i32 range
    pub(crate) fn cvt_w(&self, fs: u32) -> u32 {
        flush_input(fs) as i32 as u32
    }

    /// CVT.S.W
    pub(crate) fn cvt_s(&self, fs: u32) -> u32 {
        (fs as i32 as f32).to_bits()
    }

    /// C.F / C.EQ / C.LT / C.LE
    pub(crate) fn compare(&mut self, fs: u32, ft: u32, test: impl FnOnce(f64, f64) -> bool) {
        if test(flush_input(fs), flush_input(ft)) {
            self.set(Fcr31::C);
        } else {
            self.clear(Fcr31::C);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(v: f32) -> u32 {
        v.to_bits()
    }

    #[test]
    fn test_denormal_input_reads_as_zero() {
        assert_eq!(flush_input(0x0000_0001), 0.0);
        assert!(flush_input(0x8000_0001).is_sign_negative());
    }

    #[test]
    fn test_inf_input_reads_as_max() {
        assert_eq!(flush_input(0x7F80_0000), f32::MAX as f64);
        assert_eq!(flush_input(0xFF80_0000), -f32::MAX as f64);
    }

    #[test]
    fn test_overflow_clamps_and_sets_flags() {
        let mut fpu = Cop1::new();
        let r = fpu.mul(bits(f32::MAX), bits(2.0));
        assert_eq!(r, MAX_BITS);
        assert!(fpu.flags().contains(Fcr31::O | Fcr31::SO));

        let r = fpu.add(bits(1.0), bits(1.0));
        assert_eq!(r, bits(2.0));
        assert!(!fpu.flags().contains(Fcr31::O));
        assert!(fpu.flags().contains(Fcr31::SO));
    }

    #[test]
    fn test_underflow_flushes_to_signed_zero() {
        let mut fpu = Cop1::new();
        let r = fpu.mul(bits(-f32::MIN_POSITIVE), bits(0.5));
        assert_eq!(r, SIGN_BIT);
        assert!(fpu.flags().contains(Fcr31::U | Fcr31::SU));
    }

    #[test]
    fn test_divide_by_zero() {
        let mut fpu = Cop1::new();
        assert_eq!(fpu.div(bits(-3.0), bits(0.0)), SIGN_BIT | MAX_BITS);
        assert!(fpu.flags().contains(Fcr31::D | Fcr31::SD));

        assert_eq!(fpu.div(bits(0.0), bits(0.0)), MAX_BITS);
        assert!(fpu.flags().contains(Fcr31::I | Fcr31::SI));
        assert!(!fpu.flags().contains(Fcr31::D));
        assert!(fpu.flags().contains(Fcr31::SD));
    }

    #[test]
    fn test_sqrt_negative_uses_magnitude() {
        let mut fpu = Cop1::new();
        assert_eq!(fpu.sqrt(bits(-4.0)), bits(2.0));
        assert!(fpu.flags().contains(Fcr31::I));
    }

    #[test]
    fn test_accumulator_ops() {
        let mut fpu = Cop1::new();
        fpu.acc = bits(10.0);
        assert_eq!(fpu.madd(bits(2.0), bits(3.0)), bits(16.0));
        assert_eq!(fpu.msub(bits(2.0), bits(3.0)), bits(4.0));
    }

    #[test]
    fn test_conversions() {
        let fpu = Cop1::new();
        assert_eq!(fpu.cvt_w(bits(-7.9)), (-7i32) as u32);
        assert_eq!(fpu.cvt_w(bits(3.0e10)), i32::MAX as u32);
        assert_eq!(fpu.cvt_s(5), bits(5.0));
    }

    #[test]
    fn test_compare_sets_condition() {
        let mut fpu = Cop1::new();
        fpu.compare(bits(1.0), bits(2.0), |a, b| a < b);
        assert!(fpu.condition());
        fpu.compare(bits(1.0), bits(2.0), |_, _| false);
        assert!(!fpu.condition());
    }

    #[test]
    fn test_fcr_access() {
        let mut fpu = Cop1::new();
        assert_eq!(fpu.read_control(0), 0x2E30);
        fpu.write_control(31, 0xFFFF_FFFF);
        assert_eq!(fpu.read_control(31), 0x0083_C078);
        fpu.write_control(0, 0);
        assert_eq!(fpu.read_control(0), 0x2E30);
    }
}
