// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::common::*;
use crate::errors::{decode_error, Result};

/// The length in bytes of a MPEG frame header word.
pub const MPEG_HEADER_LEN: usize = 4;

/// The maximum length in bytes of a MPEG audio frame body. Free-format streams are bound by this
/// as well; a header whose computed size exceeds it is rejected.
pub const MAX_FRAME_SIZE: usize = 3456;

/// The sync word: 11 consecutive 1 bits at the start of the header word.
const SYNC_MASK: u32 = 0xffe0_0000;

/// Header bits that must match between consecutive frames for both frames to be decodable by the
/// same routines: sync, version, layer and sample rate.
const COMPAT_MASK: u32 = 0xfffe_0c00;

/// Header bits that are constant across the frames of a constant-bitrate stream: the compatible
/// bits plus bitrate and channel mode. Used when probing for the next header of a free-format
/// stream.
pub const SAME_MASK: u32 = 0xfffe_fcc0;

/// Bit-rate lookup table for MPEG version 1 layer 1.
const BIT_RATES_MPEG1_L1: [u32; 15] = [
    0, 32_000, 64_000, 96_000, 128_000, 160_000, 192_000, 224_000, 256_000, 288_000, 320_000,
    352_000, 384_000, 416_000, 448_000,
];

/// Bit-rate lookup table for MPEG version 1 layer 2.
const BIT_RATES_MPEG1_L2: [u32; 15] = [
    0, 32_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000, 192_000, 224_000,
    256_000, 320_000, 384_000,
];

/// Bit-rate lookup table for MPEG version 1 layer 3.
const BIT_RATES_MPEG1_L3: [u32; 15] = [
    0, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000, 192_000,
    224_000, 256_000, 320_000,
];

/// Bit-rate lookup table for MPEG version 2 & 2.5 audio layer 1.
const BIT_RATES_MPEG2_L1: [u32; 15] = [
    0, 32_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 144_000, 160_000, 176_000,
    192_000, 224_000, 256_000,
];

/// Bit-rate lookup table for MPEG version 2 & 2.5 audio layers 2 & 3.
const BIT_RATES_MPEG2_L23: [u32; 15] = [
    0, 8_000, 16_000, 24_000, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000,
    128_000, 144_000, 160_000,
];

/// Quickly check if a header word may be the start of a frame: the sync pattern plus the
/// field-range checks that do not need any table lookups.
#[inline]
pub fn check_header(header: u32) -> bool {
    // Sync word.
    if header & SYNC_MASK != SYNC_MASK {
        return false;
    }
    // Version (0x1 is reserved).
    if (header >> 19) & 0x3 == 0x1 {
        return false;
    }
    // Layer (0x0 is reserved).
    if (header >> 17) & 0x3 == 0x0 {
        return false;
    }
    // Bitrate (0xf is invalid; 0x0, free format, is allowed here).
    if (header >> 12) & 0xf == 0xf {
        return false;
    }
    // Sample rate (0x3 is reserved).
    if (header >> 10) & 0x3 == 0x3 {
        return false;
    }
    true
}

/// Returns true if the given header word declares a mono stream.
#[inline(always)]
fn is_mono(header: u32) -> bool {
    (header >> 6) & 0x3 == 0x3
}

/// Returns true if two headers will decode with the same routines and produce the same amount of
/// output. Streams whose consecutive headers fail this test are concatenations of distinct
/// streams.
#[inline]
pub fn compatible(a: u32, b: u32) -> bool {
    (a & COMPAT_MASK) == (b & COMPAT_MASK) && is_mono(a) == is_mono(b)
}

pub fn parse_frame_header(header: u32) -> Result<FrameHeader> {
    // The MPEG audio header is structured as follows:
    //
    // 0b1111_1111 0b111v_vlly 0brrrr_hhpx 0bmmmm_coee
    // where:
    //     vv   = version, ll = layer      , y = crc
    //     rrrr = bitrate, hh = sample rate, p = padding , x  = private bit
    //     mmmm = mode   , c  = copyright  , o = original, ee = emphasis

    let version = match (header & 0x18_0000) >> 19 {
        0b00 => MpegVersion::Mpeg2p5,
        0b10 => MpegVersion::Mpeg2,
        0b11 => MpegVersion::Mpeg1,
        _ => return decode_error("mpa: invalid MPEG version"),
    };

    let layer = match (header & 0x6_0000) >> 17 {
        0b01 => MpegLayer::Layer3,
        0b10 => MpegLayer::Layer2,
        0b11 => MpegLayer::Layer1,
        _ => return decode_error("mpa: invalid MPEG layer"),
    };

    let is_free_format = (header & 0xf000) == 0;

    let bitrate = match ((header & 0xf000) >> 12, version, layer) {
        // Free format: the bitrate is not transmitted and the frame size must be inferred.
        (0b0000, _, _) => 0,
        (0b1111, _, _) => return decode_error("mpa: invalid bit-rate"),
        (i, MpegVersion::Mpeg1, MpegLayer::Layer1) => BIT_RATES_MPEG1_L1[i as usize],
        (i, MpegVersion::Mpeg1, MpegLayer::Layer2) => BIT_RATES_MPEG1_L2[i as usize],
        (i, MpegVersion::Mpeg1, MpegLayer::Layer3) => BIT_RATES_MPEG1_L3[i as usize],
        (i, _, MpegLayer::Layer1) => BIT_RATES_MPEG2_L1[i as usize],
        (i, _, _) => BIT_RATES_MPEG2_L23[i as usize],
    };

    let (sample_rate, sample_rate_idx) = match ((header & 0xc00) >> 10, version) {
        (0b00, MpegVersion::Mpeg1) => (44_100, 0),
        (0b01, MpegVersion::Mpeg1) => (48_000, 1),
        (0b10, MpegVersion::Mpeg1) => (32_000, 2),
        (0b00, MpegVersion::Mpeg2) => (22_050, 3),
        (0b01, MpegVersion::Mpeg2) => (24_000, 4),
        (0b10, MpegVersion::Mpeg2) => (16_000, 5),
        (0b00, MpegVersion::Mpeg2p5) => (11_025, 6),
        (0b01, MpegVersion::Mpeg2p5) => (12_000, 7),
        (0b10, MpegVersion::Mpeg2p5) => (8_000, 8),
        _ => return decode_error("mpa: invalid sample rate"),
    };

    let channel_mode = match ((header & 0xc0) >> 6, layer) {
        (0b00, _) => ChannelMode::Stereo,
        (0b10, _) => ChannelMode::DualMono,
        (0b11, _) => ChannelMode::Mono,
        // Joint stereo in layer 3 is a combination of Mid-Side and Intensity Stereo, declared by
        // the mode extension bits.
        (0b01, MpegLayer::Layer3) => ChannelMode::JointStereo(Mode::Layer3 {
            mid_side: header & 0x20 != 0x0,
            intensity: header & 0x10 != 0x0,
        }),
        // Joint stereo in layers 1 and 2 only supports Intensity Stereo; the mode extension
        // declares the first intensity-coded sub-band.
        (0b01, _) => {
            ChannelMode::JointStereo(Mode::Intensity { bound: (1 + ((header & 0x30) >> 4)) << 2 })
        }
        _ => unreachable!(),
    };

    // Some MPEG1 layer 2 channel and bit-rate combinations are not allowed by the standard.
    if layer == MpegLayer::Layer2 && version == MpegVersion::Mpeg1 && !is_free_format {
        if channel_mode == ChannelMode::Mono {
            if bitrate == 224_000 || bitrate == 256_000 || bitrate == 320_000 || bitrate == 384_000
            {
                return decode_error("mpa: invalid layer 2 bitrate for mono channel mode");
            }
        }
        else if bitrate == 32_000 || bitrate == 48_000 || bitrate == 56_000 || bitrate == 80_000 {
            return decode_error("mpa: invalid layer 2 bitrate for non-mono channel mode");
        }
    }

    let emphasis = match header & 0x3 {
        0b01 => Emphasis::Fifty15,
        0b11 => Emphasis::CcitJ17,
        _ => Emphasis::None,
    };

    let is_copyrighted = header & 0x8 != 0x0;
    let is_original = header & 0x4 != 0x0;
    let has_padding = header & 0x200 != 0;
    let has_crc = header & 0x1_0000 == 0;

    // The frame size of a free-format stream cannot be computed from the header; it is inferred
    // later by scanning for the next header.
    let frame_size = if is_free_format { 0 } else { compute_frame_size(layer, version, bitrate, sample_rate, has_padding) };

    if frame_size > MAX_FRAME_SIZE {
        return decode_error("mpa: frame size exceeds maximum");
    }

    Ok(FrameHeader {
        version,
        layer,
        bitrate,
        sample_rate,
        sample_rate_idx,
        channel_mode,
        emphasis,
        is_copyrighted,
        is_original,
        has_padding,
        has_crc,
        is_free_format,
        frame_size,
    })
}

/// Calculate the size in bytes of a frame body (excluding the header) as per ISO/IEC 11172-3
/// section 2.4.3.1.
fn compute_frame_size(
    layer: MpegLayer,
    version: MpegVersion,
    bitrate: u32,
    sample_rate: u32,
    has_padding: bool,
) -> usize {
    let factor = match layer {
        MpegLayer::Layer1 => 12,
        MpegLayer::Layer2 => 144,
        MpegLayer::Layer3 if version == MpegVersion::Mpeg1 => 144,
        MpegLayer::Layer3 => 72,
    };

    // The header declares the frame size in slots. A slot is 4 bytes for layer 1, 1 byte for
    // layers 2 and 3.
    let slot_size = match layer {
        MpegLayer::Layer1 => 4,
        _ => 1,
    };

    let slots = (factor * bitrate / sample_rate) as usize + usize::from(has_padding);

    (slots * slot_size) - MPEG_HEADER_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_check_header() {
        // MPEG1 layer 3, 128 kbps, 44.1 kHz, stereo.
        assert!(check_header(0xfffb_9000));
        // Free format is structurally valid.
        assert!(check_header(0xfffb_0000));
        // Bad sync.
        assert!(!check_header(0xffdb_9000));
        // Reserved version.
        assert!(!check_header(0xffea_9000));
        // Reserved layer.
        assert!(!check_header(0xfff9_9000));
        // Invalid bitrate index.
        assert!(!check_header(0xfffb_f000));
        // Reserved sample rate.
        assert!(!check_header(0xfffb_9c00));
    }

    #[test]
    fn verify_parse_frame_header() {
        let header = parse_frame_header(0xfffb_9000).unwrap();

        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, MpegLayer::Layer3);
        assert_eq!(header.bitrate, 128_000);
        assert_eq!(header.sample_rate, 44_100);
        assert_eq!(header.channel_mode, ChannelMode::Stereo);
        assert!(!header.has_crc);
        assert!(!header.has_padding);
        // 144 * 128000 / 44100 = 417 bytes total, minus the 4-byte header.
        assert_eq!(header.frame_size, 413);
        assert_eq!(header.samples_per_frame(), 1152);
        assert_eq!(header.side_info_len(), 32);
    }

    #[test]
    fn verify_parse_padding() {
        let header = parse_frame_header(0xfffb_9200).unwrap();
        assert!(header.has_padding);
        assert_eq!(header.frame_size, 414);
    }

    #[test]
    fn verify_compatible() {
        // Differing bitrates are compatible (VBR streams).
        assert!(compatible(0xfffb_9000, 0xfffb_5000));
        // Differing sample rates are not.
        assert!(!compatible(0xfffb_9000, 0xfffb_9400));
        // Mono versus stereo is not.
        assert!(!compatible(0xfffb_90c0, 0xfffb_9000));
    }

    #[test]
    fn verify_free_format() {
        let header = parse_frame_header(0xfffb_0000).unwrap();
        assert!(header.is_free_format);
        assert_eq!(header.bitrate, 0);
        assert_eq!(header.frame_size, 0);
    }

    #[test]
    fn verify_mpeg2_header() {
        // MPEG2 layer 3, 64 kbps, 22.05 kHz, mono.
        let header = parse_frame_header(0xfff3_80c0).unwrap();

        assert_eq!(header.version, MpegVersion::Mpeg2);
        assert_eq!(header.bitrate, 64_000);
        assert_eq!(header.sample_rate, 22_050);
        assert_eq!(header.samples_per_frame(), 576);
        assert_eq!(header.side_info_len(), 9);
        assert_eq!(header.frame_size, 72 * 64_000 as usize / 22_050 - 4);
    }
}
