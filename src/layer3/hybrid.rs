// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Some loops are better expressed without a range loop.
#![allow(clippy::needless_range_loop)]

use std::convert::TryInto;
use std::f64;

use crate::common::*;

use lazy_static::lazy_static;

use super::{BlockType, GranuleChannel};

lazy_static! {
    /// IMDCT window coefficients for the four block types: Long, Start, Short, End, in that
    /// order.
    ///
    /// Long:
    /// ```text
    /// W[ 0..36] = sin(PI/36 * (i + 0.5))
    /// ```
    ///
    /// Start:
    /// ```text
    /// W[ 0..18] = sin(PI/36 * (i + 0.5))
    /// W[18..24] = 1.0
    /// W[24..30] = sin(PI/12 * ((i - 18) - 0.5))
    /// W[30..36] = 0.0
    /// ```
    ///
    /// Short (applied to each 12 sample window):
    /// ```text
    /// W[ 0..12] = sin(PI/12 * (i + 0.5))
    /// W[12..36] = 0.0
    /// ```
    ///
    /// End:
    /// ```text
    /// W[ 0..6 ] = 0.0
    /// W[ 6..12] = sin(PI/12 * ((i - 6) + 0.5))
    /// W[12..18] = 1.0
    /// W[18..36] = sin(PI/36 * (i + 0.5))
    /// ```
    static ref IMDCT_WINDOWS: [[f32; 36]; 4] = {
        const PI_36: f64 = f64::consts::PI / 36.0;
        const PI_12: f64 = f64::consts::PI / 12.0;

        let mut windows = [[0f32; 36]; 4];

        // Long.
        for i in 0..36 {
            windows[0][i] = (PI_36 * (i as f64 + 0.5)).sin() as f32;
        }

        // Start (indicies 30..36 implicitly 0.0).
        for i in 0..18 {
            windows[1][i] = (PI_36 * (i as f64 + 0.5)).sin() as f32;
        }
        for i in 18..24 {
            windows[1][i] = 1.0;
        }
        for i in 24..30 {
            windows[1][i] = (PI_12 * ((i - 18) as f64 + 0.5)).sin() as f32;
        }

        // Short.
        for i in 0..12 {
            windows[2][i] = (PI_12 * (i as f64 + 0.5)).sin() as f32;
        }

        // End (indicies 0..6 implicitly 0.0).
        for i in 6..12 {
            windows[3][i] = (PI_12 * ((i - 6) as f64 + 0.5)).sin() as f32;
        }
        for i in 12..18 {
            windows[3][i] = 1.0;
        }
        for i in 18..36 {
            windows[3][i] = (PI_36 * (i as f64 + 0.5)).sin() as f32;
        }

        windows
    };
}

lazy_static! {
    /// Cosine coefficients of half of a 12-point IMDCT:
    ///
    /// ```text
    /// cos12[i][k] = cos(PI/24 * (2*(i + 3) + 1 + 6) * (2*k + 1))
    /// ```
    ///
    /// Only the middle half is needed; the outer quarters are reflections.
    static ref IMDCT_HALF_COS_12: [[f32; 6]; 6] = {
        const PI_24: f64 = f64::consts::PI / 24.0;

        let mut cos = [[0f32; 6]; 6];

        for (i, cos_i) in cos.iter_mut().enumerate() {
            for (k, cos_ik) in cos_i.iter_mut().enumerate() {
                let n = (2 * (i + 3) + (12 / 2) + 1) * (2 * k + 1);
                *cos_ik = (PI_24 * n as f64).cos() as f32;
            }
        }

        cos
    };
}

lazy_static! {
    /// The alias-reduction coefficient pairs, from the butterfly constants of Table B.9 of
    /// ISO/IEC 11172-3:
    ///
    /// ```text
    /// cs[i] =  1.0 / sqrt(1.0 + c[i]^2)
    /// ca[i] = c[i] / sqrt(1.0 + c[i]^2)
    /// ```
    static ref ANTIALIAS_CS_CA: ([f32; 8], [f32; 8]) = {
        const C: [f64; 8] = [-0.6, -0.535, -0.33, -0.185, -0.095, -0.041, -0.0142, -0.0037];

        let mut cs = [0f32; 8];
        let mut ca = [0f32; 8];

        for i in 0..8 {
            let sqrt = f64::sqrt(1.0 + C[i] * C[i]);
            cs[i] = (1.0 / sqrt) as f32;
            ca[i] = (C[i] / sqrt) as f32;
        }

        (cs, ca)
    };
}

/// Reorder the samples of short blocks into sub-band order.
///
/// The three windows of each short band are stored consecutively in the spectrum; reordering
/// interleaves them so each sub-band holds its own time samples:
///
/// ```text
/// [ w0_0 w0_1 .. | w1_0 w1_1 .. | w2_0 w2_1 .. ]  ->  [ w0_0 w1_0 w2_0 | w0_1 w1_1 w2_1 | .. ]
/// ```
pub(super) fn reorder(header: &FrameHeader, channel: &GranuleChannel, buf: &mut [f32; 576]) {
    let is_mixed = match channel.block_type {
        BlockType::Short { is_mixed } => is_mixed,
        // Only short blocks are reordered.
        _ => return,
    };

    debug_assert!(channel.rzero <= 576);

    // In mixed blocks only the short bands past the switch point are reordered.
    let bands = if is_mixed {
        let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];
        &SFB_MIXED_BANDS[header.sample_rate_idx][switch..]
    }
    else {
        &SFB_SHORT_BANDS[header.sample_rate_idx][..]
    };

    let start = bands[0];

    let mut reorder_buf = [0f32; 576];
    let mut i = start;

    let n_bands = (bands.len() - 1) / 3;

    for band in 0..n_bands {
        let offsets = &bands[3 * band..3 * band + 4];

        let len = offsets[1] - offsets[0];

        for s in 0..len {
            reorder_buf[i + 0] = buf[offsets[0] + s];
            reorder_buf[i + 1] = buf[offsets[1] + s];
            reorder_buf[i + 2] = buf[offsets[2] + s];
            i += 3;
        }
    }

    buf[start..i].copy_from_slice(&reorder_buf[start..i]);
}

/// Apply the alias-reduction butterflies at the boundaries of adjacent sub-bands. Short blocks
/// are never anti-aliased; mixed blocks only in their two long sub-bands.
pub(super) fn antialias(channel: &GranuleChannel, samples: &mut [f32; 576]) {
    let sb_end = match channel.block_type {
        BlockType::Short { is_mixed: false } => return,
        BlockType::Short { is_mixed: true } => 2 * 18,
        _ => 32 * 18,
    };

    let (cs, ca): &([f32; 8], [f32; 8]) = &ANTIALIAS_CS_CA;

    // Eight butterflies per boundary. For each, the lower index walks backwards from the
    // boundary while the upper walks forward:
    //
    //   l1 = l0 * cs[i] - u0 * ca[i]
    //   u1 = u0 * cs[i] + l0 * ca[i]
    for sb in (18..sb_end).step_by(18) {
        for i in 0..8 {
            let li = sb - 1 - i;
            let ui = sb + i;
            let lower = samples[li];
            let upper = samples[ui];
            samples[li] = lower * cs[i] - upper * ca[i];
            samples[ui] = upper * cs[i] + lower * ca[i];
        }
    }
}

/// Perform hybrid synthesis (IMDCT and windowing) over all 32 sub-bands, overlap-adding into the
/// channel state.
pub(super) fn hybrid_synthesis(
    channel: &GranuleChannel,
    overlap: &mut [[f32; 18]; 32],
    samples: &mut [f32; 576],
) {
    // Short blocks process no sub-band as a long block, mixed blocks the first two, and all
    // other block types all 32.
    let n_long_bands = match channel.block_type {
        BlockType::Short { is_mixed: false } => 0,
        BlockType::Short { is_mixed: true } => 2,
        _ => 32,
    };

    if n_long_bands > 0 {
        let window: &[f32; 36] = match channel.block_type {
            BlockType::Start => &IMDCT_WINDOWS[1],
            BlockType::End => &IMDCT_WINDOWS[3],
            _ => &IMDCT_WINDOWS[0],
        };

        for sb in 0..n_long_bands {
            let start = 18 * sb;
            let sub_band: &mut [f32; 18] = (&mut samples[start..start + 18]).try_into().unwrap();

            imdct36(sub_band, window, &mut overlap[sb]);
        }
    }

    if n_long_bands < 32 {
        let window: &[f32; 36] = &IMDCT_WINDOWS[2];

        for sb in n_long_bands..32 {
            let start = 18 * sb;
            let sub_band: &mut [f32; 18] = (&mut samples[start..start + 18]).try_into().unwrap();

            // Each of the three short windows gets its own 12-point IMDCT.
            imdct12_win(sub_band, window, &mut overlap[sb]);
        }
    }
}

/// Invert every odd sample in every odd sub-band, undoing the frequency inversion of the
/// polyphase filterbank.
pub(super) fn frequency_inversion(samples: &mut [f32; 576]) {
    for i in (18..576).step_by(36) {
        for j in (i + 1..i + 18).step_by(2) {
            samples[j] = -samples[j];
        }
    }
}

/// Perform the 12-point IMDCT and windowing for each of the three short windows of one sub-band,
/// overlap-adding the result.
fn imdct12_win(x: &mut [f32; 18], window: &[f32; 36], overlap: &mut [f32; 18]) {
    let cos12: &[[f32; 6]; 6] = &IMDCT_HALF_COS_12;

    let mut tmp = [0.0; 36];

    for w in 0..3 {
        for i in 0..3 {
            // The 12-point IMDCT is split into left and right halves of a half-size transform;
            // y[0..3] = -y[3..6].rev() and y[9..12] = y[6..9].rev() supply the remainder.
            let yl = (x[w] * cos12[i][0])
                + (x[3 * 1 + w] * cos12[i][1])
                + (x[3 * 2 + w] * cos12[i][2])
                + (x[3 * 3 + w] * cos12[i][3])
                + (x[3 * 4 + w] * cos12[i][4])
                + (x[3 * 5 + w] * cos12[i][5]);

            let yr = (x[w] * cos12[i + 3][0])
                + (x[3 * 1 + w] * cos12[i + 3][1])
                + (x[3 * 2 + w] * cos12[i + 3][2])
                + (x[3 * 3 + w] * cos12[i + 3][3])
                + (x[3 * 4 + w] * cos12[i + 3][4])
                + (x[3 * 5 + w] * cos12[i + 3][5]);

            // The three windowed 12-sample IMDCTs overlap by 6 samples within the 36-sample
            // output, with 6 leading and trailing zero samples.
            tmp[6 + 6 * w + 3 - i - 1] += -yl * window[3 - i - 1];
            tmp[6 + 6 * w + i + 3] += yl * window[i + 3];
            tmp[6 + 6 * w + i + 6] += yr * window[i + 6];
            tmp[6 + 6 * w + 12 - i - 1] += yr * window[12 - i - 1];
        }
    }

    for i in 0..18 {
        x[i] = tmp[i] + overlap[i];
        overlap[i] = tmp[i + 18];
    }
}

/// Performs the 36-point Inverse Modified Discrete Cosine Transform, with windowing and
/// overlap-add, over one sub-band.
///
/// The IMDCT is computed through an 18-point DCT-IV, following the factorization of Szu-Wei Lee,
/// "Improved algorithm for efficient computation of the forward and backward MDCT in MPEG audio
/// coder" (IEEE TCAS-II vol. 48 no. 10).
fn imdct36(x: &mut [f32; 18], window: &[f32; 36], overlap: &mut [f32; 18]) {
    let mut dct = [0f32; 18];

    dct_iv(x, &mut dct);

    // The IMDCT is a mapping of the DCT-IV:
    //
    //  0            9                       27           36
    //  +------------+------------------------+------------+
    //  | dct[9..18] | -dct[0..18].rev()      | -dct[0..9] |
    //  +------------+------------------------+------------+
    for i in 0..9 {
        x[i] = overlap[i] + dct[9 + i] * window[i];
    }

    for i in 9..18 {
        x[i] = overlap[i] - dct[26 - i] * window[i];
    }

    for i in 18..27 {
        overlap[i - 18] = -dct[26 - i] * window[i];
    }

    for i in 27..36 {
        overlap[i - 18] = -dct[i - 27] * window[i];
    }
}

/// Step 2 of the IMDCT: map the 18-point DCT-IV onto an 18-point SDCT-II.
fn dct_iv(x: &[f32; 18], y: &mut [f32; 18]) {
    // Input scale factors: 2 * cos(PI * (2*m + 1) / (2*36)).
    const SCALE: [f32; 18] = [
        1.998_096_443_163_715_6, // m=0
        1.982_889_722_747_620_8, // m=1
        1.952_592_014_239_866_7, // m=2
        1.907_433_901_496_453_9, // m=3
        1.847_759_065_022_573_5, // m=4
        1.774_021_666_356_443_4, // m=5
        1.686_782_891_625_771_4, // m=6
        1.586_706_680_582_470_6, // m=7
        1.474_554_673_620_247_9, // m=8
        1.351_180_415_231_320_7, // m=9
        1.217_522_858_017_441_3, // m=10
        1.074_599_216_693_647_8, // m=11
        0.923_497_226_470_067_7, // m=12
        0.765_366_864_730_179_7, // m=13
        0.601_411_599_008_546_1, // m=14
        0.432_879_227_876_205_8, // m=15
        0.261_052_384_440_103_0, // m=16
        0.087_238_774_730_672_0, // m=17
    ];

    let mut samples = [0f32; 18];
    for i in 0..18 {
        samples[i] = SCALE[i] * x[i];
    }

    sdct_ii_18(&samples, y);

    y[0] /= 2.0;
    for i in 1..17 {
        y[i] = (y[i] / 2.0) - y[i - 1];
    }
    y[17] = (y[17] / 2.0) - y[16];
}

/// Step 3 of the IMDCT: decompose the 18-point SDCT-II into two 9-point SDCT-IIs.
fn sdct_ii_18(x: &[f32; 18], y: &mut [f32; 18]) {
    // Scale factors for the odd input samples: 2 * cos(PI * (2*m + 1) / 36).
    const SCALE: [f32; 9] = [
        1.992_389_396_183_491_1,  // m=0
        1.931_851_652_578_136_6,  // m=1
        1.812_615_574_073_299_9,  // m=2
        1.638_304_088_577_983_6,  // m=3
        std::f32::consts::SQRT_2, // m=4
        1.147_152_872_702_092_3,  // m=5
        0.845_236_523_481_398_9,  // m=6
        0.517_638_090_205_041_9,  // m=7
        0.174_311_485_495_316_3,  // m=8
    ];

    let mut even = [0f32; 9];
    let mut odd = [0f32; 9];

    for i in 0..9 {
        even[i] = x[i] + x[17 - i];
        odd[i] = SCALE[i] * (x[i] - x[17 - i]);
    }

    sdct_ii_9(&even, y);
    sdct_ii_9(&odd, &mut y[1..]);

    for i in (3..18).step_by(2) {
        y[i] -= y[i - 2];
    }
}

/// Step 4 of the IMDCT: the 9-point SDCT-II.
fn sdct_ii_9(x: &[f32; 9], y: &mut [f32]) {
    const D: [f32; 7] = [
        -1.732_050_807_568_877_2, // -sqrt(3.0)
        1.879_385_241_571_816_6,  // -2.0 * cos(8.0 * PI / 9.0)
        -0.347_296_355_333_860_8, // -2.0 * cos(4.0 * PI / 9.0)
        -1.532_088_886_237_956_0, // -2.0 * cos(2.0 * PI / 9.0)
        -0.684_040_286_651_337_8, // -2.0 * sin(8.0 * PI / 9.0)
        -1.969_615_506_024_416_0, // -2.0 * sin(4.0 * PI / 9.0)
        -1.285_575_219_373_078_5, // -2.0 * sin(2.0 * PI / 9.0)
    ];

    let a01 = x[3] + x[5];
    let a02 = x[3] - x[5];
    let a03 = x[6] + x[2];
    let a04 = x[6] - x[2];
    let a05 = x[1] + x[7];
    let a06 = x[1] - x[7];
    let a07 = x[8] + x[0];
    let a08 = x[8] - x[0];

    let a09 = x[4] + a05;
    let a10 = a01 + a03;
    let a11 = a10 + a07;
    let a12 = a03 - a07;
    let a13 = a01 - a07;
    let a14 = a01 - a03;
    let a15 = a02 - a04;
    let a16 = a15 + a08;
    let a17 = a04 + a08;
    let a18 = a02 - a08;
    let a19 = a02 + a04;
    let a20 = 2.0 * x[4] - a05;

    let m1 = D[0] * a06;
    let m2 = D[1] * a12;
    let m3 = D[2] * a13;
    let m4 = D[3] * a14;
    let m5 = D[0] * a16;
    let m6 = D[4] * a17;
    let m7 = D[5] * a18;
    let m8 = D[6] * a19;

    let a21 = a20 + m2;
    let a22 = a20 - m2;
    let a23 = a20 + m3;
    let a24 = m1 + m6;
    let a25 = m1 - m6;
    let a26 = m1 + m7;

    y[0] = a09 + a11;
    y[2] = m8 - a26;
    y[4] = m4 - a21;
    y[6] = m5;
    y[8] = a22 - m3;
    y[10] = a25 - m7;
    y[12] = a11 - 2.0 * a09;
    y[14] = a24 + m8;
    y[16] = a23 + m4;
}

#[cfg(test)]
mod tests {
    use super::{imdct12_win, imdct36, IMDCT_WINDOWS};
    use std::f64;

    const TEST_VECTOR: [f32; 18] = [
        0.0976, 0.9321, 0.6138, 0.0857, 0.0433, 0.4855, 0.2144, 0.8488, //
        0.6889, 0.2983, 0.1957, 0.7037, 0.0052, 0.0197, 0.3188, 0.5123, //
        0.2994, 0.7157,
    ];

    fn imdct12_analytical(x: &[f32; 6]) -> [f32; 12] {
        const PI_24: f64 = f64::consts::PI / 24.0;

        let mut result = [0f32; 12];

        for i in 0..12 {
            let mut sum = 0.0;
            for k in 0..6 {
                sum += (x[k] as f64) * (PI_24 * ((2 * i + (12 / 2) + 1) * (2 * k + 1)) as f64).cos();
            }
            result[i] = sum as f32;
        }

        result
    }

    #[test]
    fn verify_imdct12_win() {
        let window = &IMDCT_WINDOWS[2];

        let mut actual = TEST_VECTOR;
        let mut overlap = [0.0; 18];
        imdct12_win(&mut actual, window, &mut overlap);

        // Three analytical 12-point IMDCTs over the deinterleaved windows, windowed and
        // overlapped, for comparison.
        let expected = {
            let mut expected = [0f32; 36];

            let mut x0 = [0f32; 6];
            let mut x1 = [0f32; 6];
            let mut x2 = [0f32; 6];

            for i in 0..6 {
                x0[i] = TEST_VECTOR[3 * i + 0];
                x1[i] = TEST_VECTOR[3 * i + 1];
                x2[i] = TEST_VECTOR[3 * i + 2];
            }

            let imdct0 = imdct12_analytical(&x0);
            let imdct1 = imdct12_analytical(&x1);
            let imdct2 = imdct12_analytical(&x2);

            for i in 0..12 {
                expected[6 + i] += imdct0[i] * window[i];
                expected[12 + i] += imdct1[i] * window[i];
                expected[18 + i] += imdct2[i] * window[i];
            }

            expected
        };

        for i in 0..18 {
            assert!((expected[i] - actual[i]).abs() < 0.00001);
            assert!((expected[i + 18] - overlap[i]).abs() < 0.00001);
        }
    }

    fn imdct36_analytical(x: &[f32; 18]) -> [f32; 36] {
        const PI_72: f64 = f64::consts::PI / 72.0;

        let mut result = [0f32; 36];

        for i in 0..36 {
            let mut sum = 0.0;
            for j in 0..18 {
                sum += (x[j] as f64) * (PI_72 * (((2 * i) + 1 + 18) * ((2 * j) + 1)) as f64).cos();
            }
            result[i] = sum as f32;
        }
        result
    }

    #[test]
    fn verify_imdct36() {
        const WINDOW: [f32; 36] = [1.0; 36];

        let mut actual = TEST_VECTOR;
        let mut overlap = [0.0; 18];
        imdct36(&mut actual, &WINDOW, &mut overlap);

        let expected = imdct36_analytical(&TEST_VECTOR);

        for i in 0..18 {
            assert!((expected[i] - actual[i]).abs() < 0.00001);
            assert!((expected[i + 18] - overlap[i]).abs() < 0.00001);
        }
    }
}
