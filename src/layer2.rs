// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::common::{ChannelMode, FrameHeader, Mode, SampleBuffer};
use crate::errors::{decode_error, Result};
use crate::io::BitReaderLtr;
use crate::layer12::{dequantize_linear, SCALEFACTORS};
use crate::synthesis;

/// A layer 2 quantization class as per ISO/IEC 11172-3 Table B.4. Classes with 3, 5, or 9 levels
/// pack three consecutive samples into a single grouped codeword.
#[derive(Copy, Clone)]
struct QuantClass {
    levels: u16,
    bits: u8,
    grouped: bool,
}

#[rustfmt::skip]
const QUANT_CLASSES: [QuantClass; 17] = [
    QuantClass { levels:     3, bits:  5, grouped: true  },
    QuantClass { levels:     5, bits:  7, grouped: true  },
    QuantClass { levels:     7, bits:  3, grouped: false },
    QuantClass { levels:     9, bits: 10, grouped: true  },
    QuantClass { levels:    15, bits:  4, grouped: false },
    QuantClass { levels:    31, bits:  5, grouped: false },
    QuantClass { levels:    63, bits:  6, grouped: false },
    QuantClass { levels:   127, bits:  7, grouped: false },
    QuantClass { levels:   255, bits:  8, grouped: false },
    QuantClass { levels:   511, bits:  9, grouped: false },
    QuantClass { levels:  1023, bits: 10, grouped: false },
    QuantClass { levels:  2047, bits: 11, grouped: false },
    QuantClass { levels:  4095, bits: 12, grouped: false },
    QuantClass { levels:  8191, bits: 13, grouped: false },
    QuantClass { levels: 16383, bits: 14, grouped: false },
    QuantClass { levels: 32767, bits: 15, grouped: false },
    QuantClass { levels: 65535, bits: 16, grouped: false },
];

/// One sub-band's slot in an allocation table: the width of the allocation field and the
/// quantization classes its non-zero values select.
struct AllocSpec {
    nbal: u32,
    classes: &'static [u8],
}

// Class index lists for the four MPEG1 allocation tables (ISO/IEC 11172-3 Tables B.2a-d) and
// the MPEG2 low-sampling-frequency table (ISO/IEC 13818-3 Table B.1).
const CLASSES_AB_LOW: &[u8] = &[0, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
const CLASSES_AB_MID: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16];
const CLASSES_AB_HIGH: &[u8] = &[0, 1, 2, 3, 4, 5, 16];
const CLASSES_AB_TOP: &[u8] = &[0, 1, 16];
const CLASSES_CD_LOW: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const CLASSES_CD_HIGH: &[u8] = &[1, 2, 3, 4, 5, 6, 7];
const CLASSES_LSF_LOW: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14];
const CLASSES_LSF_MID: &[u8] = &[0, 1, 2, 3, 4, 5, 6];
const CLASSES_LSF_HIGH: &[u8] = &[0, 1, 3];

/// Build the per-sub-band allocation spec for one of the five table variants.
fn alloc_spec(table: usize, sb: usize) -> AllocSpec {
    match table {
        // Table A, 27 sub-bands, and table B, 30 sub-bands.
        0 | 1 => match sb {
            0..=2 => AllocSpec { nbal: 4, classes: CLASSES_AB_LOW },
            3..=10 => AllocSpec { nbal: 4, classes: CLASSES_AB_MID },
            11..=22 => AllocSpec { nbal: 3, classes: CLASSES_AB_HIGH },
            _ => AllocSpec { nbal: 2, classes: CLASSES_AB_TOP },
        },
        // Table C, 8 sub-bands, and table D, 12 sub-bands.
        2 | 3 => match sb {
            0..=1 => AllocSpec { nbal: 4, classes: CLASSES_CD_LOW },
            _ => AllocSpec { nbal: 3, classes: CLASSES_CD_HIGH },
        },
        // The MPEG2 table, 30 sub-bands.
        _ => match sb {
            0..=3 => AllocSpec { nbal: 4, classes: CLASSES_LSF_LOW },
            4..=10 => AllocSpec { nbal: 3, classes: CLASSES_LSF_MID },
            _ => AllocSpec { nbal: 2, classes: CLASSES_LSF_HIGH },
        },
    }
}

/// Number of coded sub-bands for each allocation table variant.
const SB_LIMIT: [usize; 5] = [27, 30, 8, 12, 30];

/// Allocation table selection for MPEG1 by sample rate and per-stream bitrate, as per ISO/IEC
/// 11172-3 section 2.4.2.3. Indexed by sample rate (44.1, 48, 32 kHz), channel count - 1, and
/// bitrate index. Free-format streams (bitrate index 0) use table A.
#[rustfmt::skip]
const TABLE_SELECT: [[[u8; 16]; 2]; 3] = [
    // 44.1 kHz
    [
        [0, 2, 2, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0], // mono
        [0, 2, 2, 2, 2, 2, 2, 0, 0, 0, 1, 1, 1, 1, 1, 0], // stereo
    ],
    // 48 kHz
    [
        [0, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0], // mono
        [0, 2, 2, 2, 2, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0], // stereo
    ],
    // 32 kHz
    [
        [0, 3, 3, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0], // mono
        [0, 3, 3, 3, 3, 3, 3, 0, 0, 0, 1, 1, 1, 1, 1, 0], // stereo
    ],
];

/// Select the allocation table variant for a frame.
fn select_table(header: &FrameHeader) -> usize {
    if !header.is_mpeg1() {
        return 4;
    }

    // The bitrate index is recoverable from the bitrate table, but carrying it through the header
    // is unnecessary: the selection only depends on a few coarse classes.
    let bitrate_index = bitrate_index(header);

    usize::from(TABLE_SELECT[header.sample_rate_idx][header.n_channels() - 1][bitrate_index])
}

fn bitrate_index(header: &FrameHeader) -> usize {
    const RATES: [u32; 15] = [
        0, 32_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000, 192_000,
        224_000, 256_000, 320_000, 384_000,
    ];
    RATES.iter().position(|&r| r == header.bitrate).unwrap_or(0)
}

/// Dequantize one sample of a grouped quantization class with `n` levels. The degrouped value is
/// centered and scaled to a step of 2/n, as per the C/D constants of Table B.4.
#[inline(always)]
fn dequantize_grouped(n: u16, v: u16) -> f32 {
    (2.0 * f32::from(v) - f32::from(n - 1)) / f32::from(n)
}

/// The layer 2 decoder.
pub struct Layer2 {
    synthesis: [synthesis::SynthesisState; 2],
}

impl Layer2 {
    pub fn new() -> Self {
        Layer2 { synthesis: Default::default() }
    }

    pub fn reset(&mut self) {
        self.synthesis = Default::default();
    }

    pub fn decode(
        &mut self,
        body: &[u8],
        header: &FrameHeader,
        out: &mut SampleBuffer,
    ) -> Result<()> {
        let body = if header.has_crc {
            if body.len() < 2 {
                return decode_error("mpa: truncated layer 2 frame");
            }
            &body[2..]
        }
        else {
            body
        };

        let mut bs = BitReaderLtr::new(body);

        let table = select_table(header);
        let sblimit = SB_LIMIT[table];

        let num_channels = header.n_channels();

        // For joint stereo, sub-bands from the bound upward carry one set of samples scaled per
        // channel. For other modes every coded sub-band is independent.
        let bound = match header.channel_mode {
            ChannelMode::JointStereo(Mode::Intensity { bound }) => (bound as usize).min(sblimit),
            ChannelMode::JointStereo(Mode::Layer3 { .. }) => {
                return decode_error("mpa: invalid mode extension for layer 2")
            }
            _ => sblimit,
        };

        // Bit allocation per channel and sub-band: a quantization class index + 1, or 0 for no
        // allocation.
        let mut alloc = [[0u8; 32]; 2];

        for sb in 0..bound {
            let spec = alloc_spec(table, sb);
            for chan in alloc.iter_mut().take(num_channels) {
                let val = bs.read_bits(spec.nbal)? as usize;
                if val > 0 {
                    if val > spec.classes.len() {
                        return decode_error("mpa: invalid layer 2 bit allocation");
                    }
                    chan[sb] = spec.classes[val - 1] + 1;
                }
            }
        }

        for sb in bound..sblimit {
            let spec = alloc_spec(table, sb);
            let val = bs.read_bits(spec.nbal)? as usize;
            let class = if val > 0 {
                if val > spec.classes.len() {
                    return decode_error("mpa: invalid layer 2 bit allocation");
                }
                spec.classes[val - 1] + 1
            }
            else {
                0
            };
            alloc[0][sb] = class;
            alloc[1][sb] = class;
        }

        // Scale factor selection information for every allocated sub-band.
        let mut scfsi = [[0u8; 32]; 2];

        for sb in 0..sblimit {
            for ch in 0..num_channels {
                if alloc[ch][sb] != 0 {
                    scfsi[ch][sb] = bs.read_bits(2)? as u8;
                }
            }
        }

        // Three scale factors per sub-band, one per 12-sample part, shared as indicated by the
        // selection information.
        let mut scalefacs = [[[0f32; 3]; 32]; 2];

        for sb in 0..sblimit {
            for ch in 0..num_channels {
                if alloc[ch][sb] == 0 {
                    continue;
                }

                let sf = &mut scalefacs[ch][sb];

                match scfsi[ch][sb] {
                    0 => {
                        sf[0] = SCALEFACTORS[bs.read_bits(6)? as usize];
                        sf[1] = SCALEFACTORS[bs.read_bits(6)? as usize];
                        sf[2] = SCALEFACTORS[bs.read_bits(6)? as usize];
                    }
                    1 => {
                        let a = SCALEFACTORS[bs.read_bits(6)? as usize];
                        let b = SCALEFACTORS[bs.read_bits(6)? as usize];
                        sf[0] = a;
                        sf[1] = a;
                        sf[2] = b;
                    }
                    2 => {
                        let a = SCALEFACTORS[bs.read_bits(6)? as usize];
                        sf[0] = a;
                        sf[1] = a;
                        sf[2] = a;
                    }
                    _ => {
                        let a = SCALEFACTORS[bs.read_bits(6)? as usize];
                        let b = SCALEFACTORS[bs.read_bits(6)? as usize];
                        sf[0] = a;
                        sf[1] = b;
                        sf[2] = b;
                    }
                }
            }
        }

        // Decode 12 granules of 3 samples per coded sub-band.
        let mut samples = [[0f32; 1152]; 2];

        for gr in 0..12 {
            let part = gr / 4;

            for sb in 0..sblimit {
                let shared = sb >= bound;
                let last_ch = if shared { 1 } else { num_channels };

                for ch in 0..last_ch {
                    let class_idx = alloc[ch][sb];

                    if class_idx == 0 {
                        continue;
                    }

                    let class = QUANT_CLASSES[class_idx as usize - 1];

                    let mut triplet = [0f32; 3];

                    if class.grouped {
                        let mut code = bs.read_bits(u32::from(class.bits))? as u16;
                        for t in triplet.iter_mut() {
                            *t = dequantize_grouped(class.levels, code % class.levels);
                            code /= class.levels;
                        }
                    }
                    else {
                        for t in triplet.iter_mut() {
                            let raw = bs.read_bits(u32::from(class.bits))?;
                            *t = dequantize_linear(u32::from(class.bits), raw);
                        }
                    }

                    // Scale into the output plane(s). Shared sub-bands scale the same samples
                    // with each channel's own scale factor.
                    let targets = if shared { num_channels } else { 1 };

                    for i in 0..targets {
                        let to = if shared { i } else { ch };
                        let sf = scalefacs[to][sb][part];
                        for (t, &s) in triplet.iter().enumerate() {
                            samples[to][12 * 3 * sb + 3 * gr + t] = sf * s;
                        }
                    }
                }
            }
        }

        out.render(1152);

        for ch in 0..num_channels {
            synthesis::synthesis(
                &mut self.synthesis[ch],
                36,
                &samples[ch],
                out.chan_mut(ch),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_frame_header;

    #[test]
    fn verify_table_select() {
        // 48 kHz stereo 192 kbps: table A, 27 sub-bands.
        let h = parse_frame_header(0xfffd_a400).unwrap();
        assert_eq!(h.layer, crate::common::MpegLayer::Layer2);
        assert_eq!(SB_LIMIT[select_table(&h)], 27);

        // MPEG2 frames always use the low-sampling-frequency table.
        let h = parse_frame_header(0xfff5_8000).unwrap();
        assert_eq!(select_table(&h), 4);
        assert_eq!(SB_LIMIT[4], 30);
    }

    #[test]
    fn verify_grouped_dequantize() {
        assert!((dequantize_grouped(3, 0) + 2.0 / 3.0).abs() < 1e-6);
        assert!((dequantize_grouped(3, 1)).abs() < 1e-6);
        assert!((dequantize_grouped(3, 2) - 2.0 / 3.0).abs() < 1e-6);
        assert!((dequantize_grouped(9, 4)).abs() < 1e-6);
        assert!((dequantize_grouped(5, 4) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn verify_alloc_spec_widths() {
        // Table A: 4-bit allocations in the low bands, narrowing to 2 bits at the top.
        assert_eq!(alloc_spec(0, 0).nbal, 4);
        assert_eq!(alloc_spec(0, 12).nbal, 3);
        assert_eq!(alloc_spec(0, 26).nbal, 2);
        // Table C narrows after the second sub-band.
        assert_eq!(alloc_spec(2, 1).nbal, 4);
        assert_eq!(alloc_spec(2, 2).nbal, 3);
    }
}
