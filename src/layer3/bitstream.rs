// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::common::{ChannelMode, FrameHeader, SFB_LONG_BANDS};
use crate::errors::{decode_error, Result};
use crate::io::BitReaderLtr;

use super::{BlockType, Granule, GranuleChannel, SideInfo};

/// Bit lengths of the two scale factor classes for MPEG1, indexed by scalefac_compress. The
/// first length covers the lower bands, the second the upper bands; the split depends on the
/// block type.
const SCALE_FACTOR_SLEN: [(u32, u32); 16] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (3, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (2, 1),
    (2, 2),
    (2, 3),
    (3, 1),
    (3, 2),
    (3, 3),
    (4, 2),
    (4, 3),
];

/// For MPEG2, the number of scale factors taking each of the four bit lengths derived from
/// scalefac_compress. Indexed by the scalefac_compress class, then by block type
/// (long/short/mixed).
const SCALE_FACTOR_MPEG2_NSFB: [[[usize; 4]; 3]; 6] = [
    // Intensity stereo channel modes.
    [[7, 7, 7, 0], [12, 12, 12, 0], [6, 15, 12, 0]],
    [[6, 6, 6, 3], [12, 9, 9, 6], [6, 12, 9, 6]],
    [[8, 8, 5, 0], [15, 12, 9, 0], [6, 18, 9, 0]],
    // Other channel modes.
    [[6, 5, 5, 5], [9, 9, 9, 9], [6, 9, 9, 9]],
    [[6, 5, 7, 3], [9, 9, 12, 6], [6, 9, 12, 6]],
    [[11, 10, 0, 0], [18, 18, 0, 0], [15, 18, 0, 0]],
];

/// Reads the side information of one channel in one granule.
fn read_granule_channel_side_info(
    bs: &mut BitReaderLtr<'_>,
    channel: &mut GranuleChannel,
    header: &FrameHeader,
) -> Result<()> {
    channel.part2_3_length = bs.read_bits(12)? as u16;
    channel.big_values = bs.read_bits(9)? as u16;

    // Each big_value decodes to a pair of samples, so at most half of the 576 samples can be
    // big_values.
    if channel.big_values > 288 {
        return decode_error("mpa: granule big_values > 288");
    }

    channel.global_gain = bs.read_bits(8)? as u8;

    channel.scalefac_compress =
        if header.is_mpeg1() { bs.read_bits(4) } else { bs.read_bits(9) }? as u16;

    let window_switching = bs.read_bit()?;

    if window_switching {
        let block_type_enc = bs.read_bits(2)?;
        let is_mixed = bs.read_bit()?;

        channel.block_type = match block_type_enc {
            // The long block type is forbidden when window switching is on.
            0b00 => return decode_error("mpa: invalid block_type"),
            0b01 => BlockType::Start,
            0b10 => BlockType::Short { is_mixed },
            0b11 => BlockType::End,
            _ => unreachable!(),
        };

        // With window switching there are only two regions, and so only two table selectors.
        for select in channel.table_select[..2].iter_mut() {
            *select = bs.read_bits(5)? as u8;
        }

        for gain in channel.subblock_gain.iter_mut() {
            *gain = bs.read_bits(3)? as u8;
        }

        // With window switching the region boundaries are implicit. For MPEG2.5, region 0 spans
        // the first 6 or 8 long bands depending on block type. For MPEG1 and for short blocks of
        // any version, the region always spans 36 samples; for non-short MPEG2 blocks, 54.
        if header.is_mpeg2p5() {
            let region0_count = match channel.block_type {
                BlockType::Short { is_mixed: false } => 5 + 1,
                _ => 7 + 1,
            };

            channel.region1_start = SFB_LONG_BANDS[header.sample_rate_idx][region0_count];
        }
        else if header.is_mpeg1() || block_type_enc == 0b10 {
            channel.region1_start = 36;
        }
        else {
            channel.region1_start = 54;
        }

        // Region 1 spans every remaining sample; region 2 is unused.
        channel.region2_start = 576;
    }
    else {
        channel.block_type = BlockType::Long;

        for select in channel.table_select.iter_mut() {
            *select = bs.read_bits(5)? as u8;
        }

        // Without window switching the region boundaries are transmitted as band counts, stored
        // one less than their actual value.
        let region0_count = bs.read_bits(4)? as usize + 1;
        let region0_1_count = bs.read_bits(3)? as usize + region0_count + 1;

        channel.region1_start = SFB_LONG_BANDS[header.sample_rate_idx][region0_count];

        // The summed count may exceed the band table; clamp to the full spectrum.
        channel.region2_start = match region0_1_count {
            0..=22 => SFB_LONG_BANDS[header.sample_rate_idx][region0_1_count],
            _ => 576,
        };
    }

    // For MPEG2 the preflag is determined while reading the scale factors.
    channel.preflag = if header.is_mpeg1() { bs.read_bit()? } else { false };

    channel.scalefac_scale = bs.read_bit()?;
    channel.count1table_select = bs.read_bit()? as u8;

    Ok(())
}

/// Reads the side information of every channel in a granule.
fn read_granule_side_info(
    bs: &mut BitReaderLtr<'_>,
    granule: &mut Granule,
    header: &FrameHeader,
) -> Result<()> {
    for channel in &mut granule.channels[..header.channel_mode.count()] {
        read_granule_channel_side_info(bs, channel, header)?;
    }
    Ok(())
}

/// Reads the side information of a frame.
pub(super) fn read_side_info(
    bs: &mut BitReaderLtr<'_>,
    header: &FrameHeader,
    side_info: &mut SideInfo,
) -> Result<()> {
    if header.is_mpeg1() {
        // 9 bits of main_data_begin, then 3 or 5 private bits depending on channel count.
        side_info.main_data_begin = bs.read_bits(9)? as u16;

        match header.channel_mode {
            ChannelMode::Mono => bs.ignore_bits(5)?,
            _ => bs.ignore_bits(3)?,
        };

        for scfsi in side_info.scfsi[..header.n_channels()].iter_mut() {
            for band in scfsi.iter_mut() {
                *band = bs.read_bit()?;
            }
        }
    }
    else {
        // 8 bits of main_data_begin, then 1 or 2 private bits.
        side_info.main_data_begin = bs.read_bits(8)? as u16;

        match header.channel_mode {
            ChannelMode::Mono => bs.ignore_bits(1)?,
            _ => bs.ignore_bits(2)?,
        }
    }

    for granule in side_info.granules_mut(header.version) {
        read_granule_side_info(bs, granule, header)?;
    }

    Ok(())
}

/// Reads the scale factors of one channel in one granule of a MPEG1 frame. Returns the number of
/// bits read.
pub(super) fn read_scale_factors_mpeg1(
    bs: &mut BitReaderLtr<'_>,
    gr: usize,
    ch: usize,
    side_info: &mut SideInfo,
) -> Result<u32> {
    let mut bits_read = 0;

    let channel = &mut side_info.granules[gr].channels[ch];

    let (slen1, slen2) = SCALE_FACTOR_SLEN[channel.scalefac_compress as usize];

    if let BlockType::Short { is_mixed } = channel.block_type {
        // A mixed block has 8 long-band scale factors followed by 3 bands of 3 short-window
        // factors, all slen1 bits; a plain short block has 6 bands of 3 windows instead.
        let n_sfb = if is_mixed { 8 + 3 * 3 } else { 6 * 3 };

        if slen1 > 0 {
            for sfb in 0..n_sfb {
                channel.scalefacs[sfb] = bs.read_bits(slen1)? as u8;
            }
            bits_read += n_sfb as u32 * slen1;
        }

        // The remaining 6 bands of 3 windows are slen2 bits each.
        if slen2 > 0 {
            for sfb in n_sfb..(n_sfb + 6 * 3) {
                channel.scalefacs[sfb] = bs.read_bits(slen2)? as u8;
            }
            bits_read += 6 * 3 * slen2;
        }
    }
    else {
        // Long blocks have 21 scale factor bands split into four groups. The lower two groups
        // are slen1 bits per factor, the upper two slen2. Groups flagged in scfsi re-use the
        // first granule's factors.
        const GROUPS: [(usize, usize); 4] = [(0, 6), (6, 11), (11, 16), (16, 21)];

        for (i, &(start, end)) in GROUPS.iter().enumerate() {
            let slen = if i < 2 { slen1 } else { slen2 };

            if gr > 0 && side_info.scfsi[ch][i] {
                let (granule0, rest) = side_info.granules.split_first_mut().unwrap();

                let from = &granule0.channels[ch].scalefacs[start..end];
                rest[0].channels[ch].scalefacs[start..end].copy_from_slice(from);
            }
            else if slen > 0 {
                for sfb in start..end {
                    side_info.granules[gr].channels[ch].scalefacs[sfb] =
                        bs.read_bits(slen)? as u8;
                }
                bits_read += slen * (end - start) as u32;
            }
        }
    }

    Ok(bits_read)
}

/// Reads the scale factors of one channel in the granule of a MPEG2/2.5 frame. Returns the
/// number of bits read.
pub(super) fn read_scale_factors_mpeg2(
    bs: &mut BitReaderLtr<'_>,
    is_intensity_stereo: bool,
    channel: &mut GranuleChannel,
) -> Result<u32> {
    let mut bits_read = 0;

    let block_index = match channel.block_type {
        BlockType::Short { is_mixed: true } => 2,
        BlockType::Short { is_mixed: false } => 1,
        _ => 0,
    };

    let (slen_table, nsfb_table) = if is_intensity_stereo {
        // For the intensity coded channel the 9-bit scalefac_compress is halved first.
        let sfc = u32::from(channel.scalefac_compress) >> 1;

        match sfc {
            0..=179 => (
                [sfc / 36, (sfc % 36) / 6, (sfc % 36) % 6, 0],
                &SCALE_FACTOR_MPEG2_NSFB[0][block_index],
            ),
            180..=243 => (
                [((sfc - 180) % 64) >> 4, ((sfc - 180) % 16) >> 2, (sfc - 180) % 4, 0],
                &SCALE_FACTOR_MPEG2_NSFB[1][block_index],
            ),
            244..=255 => (
                [(sfc - 244) / 3, (sfc - 244) % 3, 0, 0],
                &SCALE_FACTOR_MPEG2_NSFB[2][block_index],
            ),
            _ => unreachable!(),
        }
    }
    else {
        let sfc = u32::from(channel.scalefac_compress);

        // Preflag is implicit for scalefac_compress >= 500 (ISO/IEC 13818-3 section 2.4.3.4).
        channel.preflag = sfc >= 500;

        match sfc {
            0..=399 => (
                [(sfc >> 4) / 5, (sfc >> 4) % 5, (sfc % 16) >> 2, sfc % 4],
                &SCALE_FACTOR_MPEG2_NSFB[3][block_index],
            ),
            400..=499 => (
                [((sfc - 400) >> 2) / 5, ((sfc - 400) >> 2) % 5, (sfc - 400) % 4, 0],
                &SCALE_FACTOR_MPEG2_NSFB[4][block_index],
            ),
            500..=512 => (
                [(sfc - 500) / 3, (sfc - 500) % 3, 0, 0],
                &SCALE_FACTOR_MPEG2_NSFB[5][block_index],
            ),
            _ => unreachable!(),
        }
    };

    let mut start = 0;

    for (&slen, &n_sfb) in slen_table.iter().zip(nsfb_table.iter()) {
        // Scale factors with a zero bit length are zero, which they already are.
        if slen > 0 {
            for sfb in start..(start + n_sfb) {
                channel.scalefacs[sfb] = bs.read_bits(slen)? as u8;
            }
            bits_read += slen * n_sfb as u32;
        }

        start += n_sfb;
    }

    Ok(bits_read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_frame_header;

    #[test]
    fn verify_read_side_info_zeros() {
        // All-zero side info is valid: no window switching, long blocks, zero lengths.
        let header = parse_frame_header(0xfffb_9000).unwrap();
        let buf = [0u8; 32];

        let mut bs = BitReaderLtr::new(&buf);
        let mut side_info: SideInfo = Default::default();

        read_side_info(&mut bs, &header, &mut side_info).unwrap();

        assert_eq!(side_info.main_data_begin, 0);
        assert_eq!(bs.bits_read(), 32 * 8);

        for gr in 0..2 {
            for ch in 0..2 {
                let channel = &side_info.granules[gr].channels[ch];
                assert_eq!(channel.part2_3_length, 0);
                assert_eq!(channel.block_type, BlockType::Long);
                // region0_count of 0 encodes one band.
                assert_eq!(channel.region1_start, 4);
            }
        }
    }

    #[test]
    fn verify_side_info_rejects_big_values() {
        let header = parse_frame_header(0xfffb_9000).unwrap();

        // main_data_begin = 0, private bits = 0, scfsi = 0, then a granule channel with
        // part2_3_length = 0 and big_values = 300 (> 288).
        let mut buf = [0u8; 32];
        // The first granule channel starts at bit 20; big_values occupies bits 32..41.
        // 300 = 0b100101100. Bits 32..41 are byte 4 and the top bit of byte 5.
        buf[4] = 0b1001_0110;
        buf[5] = 0b0000_0000;

        let mut bs = BitReaderLtr::new(&buf);
        let mut side_info: SideInfo = Default::default();

        assert!(read_side_info(&mut bs, &header, &mut side_info).is_err());
    }
}
