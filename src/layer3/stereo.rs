// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::max;
use std::{f32, f64};

use crate::common::*;
use crate::errors::{decode_error, Result};

use lazy_static::lazy_static;

use super::{BlockType, Granule};

/// The invalid intensity position for MPEG1 bitstreams. The MPEG1 ratio table only defines
/// positions 0..7.
const INTENSITY_INV_POS_MPEG1: u8 = 7;

/// The invalid intensity position for MPEG2 and MPEG2.5 bitstreams, whose ratio tables define
/// positions 0..31.
const INTENSITY_INV_POS_MPEG2: u8 = 31;

lazy_static! {
    /// (Left, right) channel coefficients for intensity stereo in MPEG1 bitstreams, derived from
    /// section 2.4.3.4.9.3 of ISO/IEC 11172-3:
    ///
    /// ```text
    /// is_ratio = tan(is_pos * PI/12)
    /// k_l = is_ratio / (1 + is_ratio)
    /// k_r =        1 / (1 + is_ratio)
    /// ```
    static ref INTENSITY_RATIOS_MPEG1: [(f32, f32); 7] = {
        const PI_12: f64 = f64::consts::PI / 12.0;

        let mut ratios = [(0.0, 0.0); 7];

        for (is_pos, ratio) in ratios.iter_mut().enumerate() {
            let is_ratio = (PI_12 * is_pos as f64).tan();
            *ratio = ((is_ratio / (1.0 + is_ratio)) as f32, (1.0 / (1.0 + is_ratio)) as f32);
        }

        // Position 6 maps the full signal left.
        ratios[6] = (1.0, 0.0);

        ratios
    };
}

lazy_static! {
    /// (Left, right) channel coefficients for intensity stereo in MPEG2 bitstreams, derived from
    /// section 2.4.3.2 of ISO/IEC 13818-3:
    ///
    /// ```text
    /// is_pos     == 0  ->  k_l = 1.0,                       k_r = 1.0
    /// is_pos & 1 == 1  ->  k_l = i0 ^ [(is_pos + 1) / 2],   k_r = 1.0
    /// is_pos & 1 == 0  ->  k_l = 1.0,                       k_r = i0 ^ (is_pos / 2)
    /// ```
    ///
    /// where i0 is 1/sqrt(sqrt(2)) or 1/sqrt(2) depending on the least significant bit of
    /// scalefac_compress. The first dimension selects i0; the second is is_pos.
    static ref INTENSITY_RATIOS_MPEG2: [[(f32, f32); 32]; 2] = {
        let is_scale: [f64; 2] = [
            1.0 / f64::sqrt(f64::consts::SQRT_2),
            f64::consts::FRAC_1_SQRT_2,
        ];

        let mut ratios = [[(0.0, 0.0); 32]; 2];

        for is_pos in 0..32 {
            if is_pos & 1 != 0 {
                let exp = f64::from((is_pos + 1) / 2);
                ratios[0][is_pos as usize] = (is_scale[0].powf(exp) as f32, 1.0);
                ratios[1][is_pos as usize] = (is_scale[1].powf(exp) as f32, 1.0);
            }
            else {
                let exp = f64::from(is_pos / 2);
                ratios[0][is_pos as usize] = (1.0, is_scale[0].powf(exp) as f32);
                ratios[1][is_pos as usize] = (1.0, is_scale[1].powf(exp) as f32);
            }
        }

        ratios
    };
}

/// Decorrelate the mid and side channels into left and right:
///
/// ```text
/// l[i] = (m[i] + s[i]) / sqrt(2)
/// r[i] = (m[i] - s[i]) / sqrt(2)
/// ```
fn process_mid_side(mid: &mut [f32], side: &mut [f32]) {
    debug_assert!(mid.len() == side.len());

    for (m, s) in mid.iter_mut().zip(side) {
        let left = (*m + *s) * f32::consts::FRAC_1_SQRT_2;
        let right = (*m - *s) * f32::consts::FRAC_1_SQRT_2;
        *m = left;
        *s = right;
    }
}

/// Decode one intensity coded band: channel 0 carries the intensity signal, which is scaled into
/// both output channels by the ratio pair at the intensity position. An invalid position leaves
/// the band to mid-side processing (if enabled) or passes it through untouched.
fn process_intensity(
    is_pos: u8,
    is_table: &[(f32, f32)],
    is_inv_pos: u8,
    mid_side: bool,
    ch0: &mut [f32],
    ch1: &mut [f32],
) {
    if is_pos < is_inv_pos {
        let (ratio_l, ratio_r) = is_table[usize::from(is_pos)];

        for (l, r) in ch0.iter_mut().zip(ch1) {
            let is = *l;
            *l = ratio_l * is;
            *r = ratio_r * is;
        }
    }
    else if mid_side {
        process_mid_side(ch0, ch1);
    }
}

#[inline(always)]
fn is_zero_band(band: &[f32]) -> bool {
    !band.iter().any(|&x| x != 0.0)
}

/// Select the intensity ratio table and invalid position for the stream version.
fn intensity_table(
    header: &FrameHeader,
    granule: &Granule,
) -> (&'static [(f32, f32)], u8) {
    if header.is_mpeg1() {
        (&INTENSITY_RATIOS_MPEG1[..], INTENSITY_INV_POS_MPEG1)
    }
    else {
        let is_scale = granule.channels[1].scalefac_compress & 1;
        (&INTENSITY_RATIOS_MPEG2[usize::from(is_scale)][..], INTENSITY_INV_POS_MPEG2)
    }
}

/// Decode the intensity coded bands of a long block and return the intensity bound.
///
/// All bands after the last non-zero band of channel 1 may be intensity coded; their intensity
/// positions are transmitted in the channel 1 scale factors.
fn process_intensity_long_block(
    header: &FrameHeader,
    granule: &Granule,
    mid_side: bool,
    max_bound: usize,
    ch0: &mut [f32; 576],
    ch1: &mut [f32; 576],
) -> usize {
    let rzero = granule.channels[1].rzero;

    let (is_table, is_inv_pos) = intensity_table(header, granule);

    let bands = &SFB_LONG_BANDS[header.sample_rate_idx];

    // The intensity position of the final band is not coded; it repeats the previous one.
    let mut is_pos = [0; 22];
    is_pos.copy_from_slice(&granule.channels[1].scalefacs[..22]);
    is_pos[21] = is_pos[20];

    let mut bound = max_bound;

    // Walk bands from the top down while they are zero in channel 1.
    for ((&start, &end), &pos) in bands.iter().zip(&bands[1..]).zip(is_pos.iter()).rev() {
        // Bands past rzero are zero by construction; earlier bands must be checked.
        let is_zero = start >= rzero || is_zero_band(&ch1[start..end]);

        if !is_zero {
            break;
        }

        process_intensity(
            pos,
            is_table,
            is_inv_pos,
            mid_side,
            &mut ch0[start..end],
            &mut ch1[start..end],
        );

        bound = start;
    }

    bound
}

/// Decode the intensity coded bands of a short (or mixed) block and return the intensity bound.
///
/// The three windows of a short band are interleaved in the spectrum but logically independent,
/// so each window carries its own intensity bound: a window stays intensity coded from the last
/// band whose window is non-zero upward. For mixed blocks the leading long bands follow the long
/// block rules once every short window has bottomed out.
fn process_intensity_short_block(
    header: &FrameHeader,
    granule: &Granule,
    is_mixed: bool,
    mid_side: bool,
    max_bound: usize,
    ch0: &mut [f32; 576],
    ch1: &mut [f32; 576],
) -> usize {
    // For mixed blocks, split off the long bands before the switch point.
    let (short_bands, long_bands, mut sfi) = if is_mixed {
        let bands = SFB_MIXED_BANDS[header.sample_rate_idx];
        let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];
        (&bands[switch..], Some(&bands[..switch + 1]), bands.len() - 1)
    }
    else {
        // 13 short bands of 3 windows yield 39 scale factors.
        (&SFB_SHORT_BANDS[header.sample_rate_idx][..], None, 39)
    };

    let (is_table, is_inv_pos) = intensity_table(header, granule);

    // Intensity positions for the final three windows repeat the previous band's windows.
    let mut is_pos = [0; 39];
    is_pos[..36].copy_from_slice(&granule.channels[1].scalefacs[..36]);
    is_pos[36..].copy_from_slice(&granule.channels[1].scalefacs[33..36]);

    let mut window_is_zero = [true; 3];

    let mut bound = max_bound;
    let mut found_bound = false;

    // Iterate over short bands top-down. Each iteration covers one band: three windows at
    // consecutive band offsets.
    let n_bands = (short_bands.len() - 1) / 3;

    for band in (0..n_bands).rev() {
        let offsets = &short_bands[3 * band..3 * band + 4];

        // Windows are processed in reverse so the scale factor index stays aligned.
        for win in (0..3).rev() {
            let start = offsets[win];
            let end = offsets[win + 1];

            window_is_zero[win] = window_is_zero[win] && is_zero_band(&ch1[start..end]);

            if window_is_zero[win] {
                process_intensity(
                    is_pos[sfi - 1],
                    is_table,
                    is_inv_pos,
                    mid_side,
                    &mut ch0[start..end],
                    &mut ch1[start..end],
                );
            }
            else if mid_side {
                // A window past its own bound within the intensity region uses mid-side.
                process_mid_side(&mut ch0[start..end], &mut ch1[start..end]);
            }

            sfi -= 1;
        }

        bound = offsets[0];

        // Once every window has hit a non-zero band, the remaining bands below are plain
        // mid-side or independent stereo.
        found_bound = !window_is_zero[0] && !window_is_zero[1] && !window_is_zero[2];

        if found_bound {
            break;
        }
    }

    // For mixed blocks, the long bands may continue the intensity region downward.
    if !found_bound {
        if let Some(long_bands) = long_bands {
            for (&start, &end) in long_bands.iter().zip(&long_bands[1..]).rev() {
                if !is_zero_band(&ch1[start..end]) {
                    break;
                }

                process_intensity(
                    is_pos[sfi - 1],
                    is_table,
                    is_inv_pos,
                    mid_side,
                    &mut ch0[start..end],
                    &mut ch1[start..end],
                );

                sfi -= 1;

                bound = start;
            }
        }
    }

    bound
}

/// Perform joint stereo decoding on the channel pair of one granule.
pub(super) fn stereo(
    header: &FrameHeader,
    granule: &mut Granule,
    ch: &mut [[f32; 576]; 2],
) -> Result<()> {
    let (mid_side, intensity) = match header.channel_mode {
        ChannelMode::JointStereo(Mode::Layer3 { mid_side, intensity }) => (mid_side, intensity),
        ChannelMode::JointStereo(Mode::Intensity { .. }) => {
            return decode_error("mpa: invalid mode extension for layer 3 stereo")
        }
        _ => return Ok(()),
    };

    if granule.channels[0].block_type != granule.channels[1].block_type {
        return decode_error("mpa: stereo channel pair block_type mismatch");
    }

    let (ch0, ch1) = {
        let (ch0, ch1) = ch.split_first_mut().unwrap();
        (ch0, &mut ch1[0])
    };

    // Each scale factor band uses mid-side, intensity, or no stereo coding, depending on the
    // mode extension, the block type, and the band contents.
    let end = max(granule.channels[0].rzero, granule.channels[1].rzero);

    let is_bound = if intensity {
        match granule.channels[1].block_type {
            BlockType::Short { is_mixed } => {
                process_intensity_short_block(header, granule, is_mixed, mid_side, end, ch0, ch1)
            }
            _ => process_intensity_long_block(header, granule, mid_side, end, ch0, ch1),
        }
    }
    else {
        end
    };

    // Everything below the intensity bound is mid-side coded, if enabled.
    if mid_side && is_bound > 0 {
        process_mid_side(&mut ch0[..is_bound], &mut ch1[..is_bound]);
    }

    // Joint stereo equalizes the decoded sample counts of both channels.
    if intensity || mid_side {
        granule.channels[0].rzero = end;
        granule.channels[1].rzero = end;
    }

    Ok(())
}
