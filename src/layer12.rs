// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Support shared between the layer 1 and layer 2 decoders.

use lazy_static::lazy_static;

lazy_static! {
    /// Scale factors for layers 1 and 2, derived from Table B.1 of ISO/IEC 11172-3:
    /// `sf[i] = 2.0 * 2^(-i/3)`. Index 63 is reserved but transmitted by some encoders.
    pub static ref SCALEFACTORS: [f32; 64] = {
        let mut sf = [0f32; 64];
        for (i, sf) in sf.iter_mut().enumerate() {
            *sf = (2.0f64 * f64::powf(2.0, -(i as f64) / 3.0)) as f32;
        }
        sf
    };
}

lazy_static! {
    /// Dequantization factors for linearly-quantized samples of `nb` bits, indexed by `nb`.
    ///
    /// As per ISO/IEC 11172-3, given an nb-bit raw sample, dequantization is:
    ///
    /// ```text
    /// fractional = val / 2^(nb - 1)
    /// dequantized = (2^nb) / (2^nb - 1) * (fractional + 2^(-nb + 1))
    /// ```
    ///
    /// which reduces to a single multiplication of `(val + 1)` after combining terms.
    pub static ref LINEAR_FACTOR: [f32; 17] = {
        let mut factor = [0f32; 17];
        for (i, factor) in factor.iter_mut().enumerate().skip(2) {
            let a = 1u32 << i;
            let b = 1u32 << (i - 1);
            *factor = (a as f32 / (a - 1) as f32) * (b as f32).recip();
        }
        factor
    };
}

/// Dequantize a linearly-quantized sample, `raw`, of length `bits` bits.
#[inline(always)]
pub fn dequantize_linear(bits: u32, raw: u32) -> f32 {
    // Invert the most significant bit, then sign extend.
    let inv = raw ^ (1 << (bits - 1));
    let val = (inv as i32) << (32 - bits) >> (32 - bits);

    LINEAR_FACTOR[bits as usize] * (val + 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_scalefactors() {
        assert!((SCALEFACTORS[0] - 2.0).abs() < 1e-6);
        assert!((SCALEFACTORS[3] - 1.0).abs() < 1e-6);
        assert!((SCALEFACTORS[6] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn verify_dequantize_range() {
        // The all-ones codeword is never transmitted; the valid range is 0..2^nb - 1.
        for bits in 2..=16 {
            let top = (1u32 << bits) - 2;
            for &raw in &[0, 1, top / 2, top] {
                let s = dequantize_linear(bits, raw);
                assert!(s > -1.0 && s < 1.0, "bits={} raw={} s={}", bits, raw, s);
            }
        }
    }
}
