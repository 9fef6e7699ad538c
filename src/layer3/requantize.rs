// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::min;

use crate::common::*;
use crate::errors::Result;
use crate::huffman;
use crate::io::BitReaderLtr;

use lazy_static::lazy_static;

use log::info;

use super::{BlockType, GranuleChannel};

lazy_static! {
    /// Lookup table of x^(4/3) for the decoded Huffman sample magnitudes. The magnitude of a
    /// sample is bound by 8191 + the largest linbits extension (13 bits).
    static ref POW43: Box<[f32]> = {
        let mut pow43 = vec![0f32; 8207].into_boxed_slice();
        for (i, p) in pow43.iter_mut().enumerate() {
            *p = (i as f32).powf(4.0 / 3.0);
        }
        pow43
    };
}

/// Reads the Huffman coded spectral samples of one granule channel into `buf`, combining each
/// magnitude with its sign and raising it to the 4/3 power. Returns the starting index of the
/// all-zero rzero partition.
pub(super) fn read_huffman_samples(
    bs: &mut BitReaderLtr<'_>,
    channel: &GranuleChannel,
    part3_bits: u32,
    buf: &mut [f32; 576],
) -> Result<usize> {
    // Zero spectra are encoded with no Huffman bits at all.
    if part3_bits == 0 {
        for sample in buf.iter_mut() {
            *sample = 0.0;
        }
        return Ok(0);
    }

    // Fetch the table reference once per granule.
    let pow43: &[f32] = &POW43;

    let mut bits_read = 0;
    let mut i = 0;

    // Two samples per big_value.
    let big_values_len = 2 * channel.big_values as usize;

    // The end of each of the three regions of the big_values partition, clamped to the
    // partition itself.
    let regions: [usize; 3] = [
        min(channel.region1_start, big_values_len),
        min(channel.region2_start, big_values_len),
        min(576, big_values_len),
    ];

    for (region_idx, &region_end) in regions.iter().enumerate() {
        let table = huffman::pair_table(channel.table_select[region_idx]);

        // Regions using one of the empty tables decode to zero.
        if table.tree.is_empty() {
            while i < region_end {
                buf[i] = 0.0;
                buf[i + 1] = 0.0;
                i += 2;
            }
            continue;
        }

        while i < region_end && bits_read < part3_bits {
            let (value, code_len) = table.tree.read(bs)?;
            bits_read += code_len;

            let mut x = usize::from(value >> 4);
            let mut y = usize::from(value & 0xf);

            if x > 0 {
                // A saturated sample is extended by linbits extra magnitude bits.
                if x == 15 && table.linbits > 0 {
                    x += bs.read_bits(table.linbits)? as usize;
                    bits_read += table.linbits;
                }

                buf[i] = if bs.read_bit()? { -pow43[x] } else { pow43[x] };
                bits_read += 1;
            }
            else {
                buf[i] = 0.0;
            }

            i += 1;

            if y > 0 {
                if y == 15 && table.linbits > 0 {
                    y += bs.read_bits(table.linbits)? as usize;
                    bits_read += table.linbits;
                }

                buf[i] = if bs.read_bit()? { -pow43[y] } else { pow43[y] };
                bits_read += 1;
            }
            else {
                buf[i] = 0.0;
            }

            i += 1;
        }
    }

    // The count1 partition: quads of samples in -1..1, until the spectrum or the bit budget
    // runs out.
    let count1_tree = huffman::quad_table(channel.count1table_select);

    while i <= 572 && bits_read < part3_bits {
        let (value, code_len) = count1_tree.read(bs)?;
        bits_read += code_len;

        // The four quad samples v, w, x, y are single bits; a set bit is followed by its sign.
        for bit in [0x8u8, 0x4, 0x2, 0x1].iter() {
            if value & bit != 0 {
                buf[i] = if bs.read_bit()? { -1.0 } else { 1.0 };
                bits_read += 1;
            }
            else {
                buf[i] = 0.0;
            }
            i += 1;
        }
    }

    if bits_read < part3_bits {
        // Remaining stuffing bits.
        bs.ignore_bits(part3_bits - bits_read)?;
    }
    else if bits_read > part3_bits {
        // Some encoders pad part3 imprecisely, making the final quad read overshoot into the
        // next granule's bits. That quad is random data, so erase it.
        info!("mpa: count1 overrun, malformed bitstream");
        i = i.saturating_sub(4);
    }

    // Everything past this point is the rzero partition.
    for sample in buf[i..].iter_mut() {
        *sample = 0.0;
    }

    Ok(i)
}

/// The pre-emphasis amounts per long scale factor band, from Table B.6 of ISO/IEC 11172-3.
#[rustfmt::skip]
const PRE_EMPHASIS: [u8; 22] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 1, 1, 2, 2, 3, 3, 3, 2, 0,
];

/// Requantize the long-block portion of `buf` spanning the given bands.
///
/// Dequantization of a sample is governed by:
///
/// ```text
/// xr(i) = s(i)^(4/3) * 2^(0.25 * A) * 2^(-B)
/// ```
///
/// with `A = global_gain - 210` and `B = scalefac_multiplier * (scalefac + preflag * pretab)`.
/// The samples in `buf` already carry the 4/3 power.
fn requantize_long(channel: &GranuleChannel, bands: &[usize], buf: &mut [f32; 576]) {
    debug_assert!(bands.len() <= 23);

    let a = i32::from(channel.global_gain) - 210;

    // The scale factor multiplier is 0.5 or 1; pre-multiplied by 4 here so the two exponents
    // combine into one 2^(0.25 * (A - B)) evaluation.
    let scalefac_shift = if channel.scalefac_scale { 2 } else { 1 };

    for (i, (&start, &end)) in bands.iter().zip(&bands[1..]).enumerate() {
        // Bands at or above rzero are all zero; nothing left to scale.
        if start >= channel.rzero {
            break;
        }

        let pre_emphasis = if channel.preflag { PRE_EMPHASIS[i] } else { 0 };

        let b = i32::from((channel.scalefacs[i] + pre_emphasis) << scalefac_shift);

        let pow2ab = f64::powf(2.0, 0.25 * f64::from(a - b)) as f32;

        let band_end = min(end, channel.rzero);

        for sample in buf[start..band_end].iter_mut() {
            *sample *= pow2ab;
        }
    }
}

/// Requantize the short-block portion of `buf`, with `switch` indexing the first short scale
/// factor.
///
/// Short blocks add a per-window gain: `A = global_gain - 210 - 8 * subblock_gain[win]`.
fn requantize_short(
    channel: &GranuleChannel,
    bands: &[usize],
    switch: usize,
    buf: &mut [f32; 576],
) {
    debug_assert!(bands.len() <= 40);

    let gain = i32::from(channel.global_gain) - 210;

    let a = [
        gain - 8 * i32::from(channel.subblock_gain[0]),
        gain - 8 * i32::from(channel.subblock_gain[1]),
        gain - 8 * i32::from(channel.subblock_gain[2]),
    ];

    let scalefac_shift = if channel.scalefac_scale { 2 } else { 1 };

    for (i, (&start, &end)) in bands.iter().zip(&bands[1..]).enumerate() {
        if start > channel.rzero {
            break;
        }

        let b = i32::from(channel.scalefacs[switch + i] << scalefac_shift);

        let pow2ab = f64::powf(2.0, 0.25 * f64::from(a[i % 3] - b)) as f32;

        let win_end = min(end, channel.rzero);

        for sample in buf[start..win_end].iter_mut() {
            *sample *= pow2ab;
        }
    }
}

/// Requantize the spectral samples of one granule channel, regardless of block type.
pub(super) fn requantize(header: &FrameHeader, channel: &GranuleChannel, buf: &mut [f32; 576]) {
    match channel.block_type {
        BlockType::Short { is_mixed: false } => {
            requantize_short(channel, &SFB_SHORT_BANDS[header.sample_rate_idx], 0, buf);
        }
        BlockType::Short { is_mixed: true } => {
            // A mixed block requantizes as a long block up to the switch point and as short
            // blocks past it.
            let bands = SFB_MIXED_BANDS[header.sample_rate_idx];
            let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];

            requantize_long(channel, &bands[..switch], buf);
            requantize_short(channel, &bands[switch..], switch, buf);
        }
        _ => {
            requantize_long(channel, &SFB_LONG_BANDS[header.sample_rate_idx], buf);
        }
    }
}
