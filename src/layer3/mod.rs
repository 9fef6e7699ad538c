// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::common::*;
use crate::errors::{decode_error, Result};
use crate::io::BitReaderLtr;
use crate::synthesis;

mod bitstream;
mod hybrid;
mod requantize;
mod stereo;

/// The side information and scale factors of one MPEG audio frame.
#[derive(Default)]
struct SideInfo {
    /// Byte offset into the bit reservoir at which the frame's main data begins. 0 means the
    /// main data starts right after this frame's side info.
    main_data_begin: u16,
    /// Scale factor selection information, per channel. Each channel has 4 groups of bands whose
    /// scale factors may be shared between both granules; a true flag marks a shared group.
    ///
    /// Mapping of array indicies to bands: [0..6, 6..11, 11..16, 16..21].
    scfsi: [[bool; 4]; 2],
    /// The granules; MPEG1 frames have two, MPEG2/2.5 frames have one.
    granules: [Granule; 2],
}

impl SideInfo {
    #[inline(always)]
    fn granules_mut(&mut self, version: MpegVersion) -> &mut [Granule] {
        match version {
            MpegVersion::Mpeg1 => &mut self.granules[..2],
            _ => &mut self.granules[..1],
        }
    }
}

#[derive(Default)]
struct Granule {
    channels: [GranuleChannel; 2],
}

struct GranuleChannel {
    /// Total number of bits used for scale factors (part2) and Huffman encoded data (part3).
    part2_3_length: u16,
    /// HALF the number of samples in the big_values partition (sum of all samples in
    /// `region[0..3]`).
    big_values: u16,
    /// Logarithmic quantization step size.
    global_gain: u8,
    /// For MPEG1 a 4-bit index into the scale factor bit-length table; for MPEG2/2.5 a 9-bit
    /// value determining both bit lengths and band partitioning.
    scalefac_compress: u16,
    /// The block type (window shape) of the channel in the granule.
    block_type: BlockType,
    /// Gain factors for the three windows of a short block.
    subblock_gain: [u8; 3],
    /// The Huffman table selectors for regions 0..3 of big_values.
    table_select: [u8; 3],
    /// The index of the first sample in region 1 of big_values.
    region1_start: usize,
    /// The index of the first sample in region 2 of big_values.
    region2_start: usize,
    /// Add the fixed pre-emphasis amounts to the scale factors before requantization.
    preflag: bool,
    /// A 0.5x (false) or 1x (true) multiplier for scale factors.
    scalefac_scale: bool,
    /// Use Huffman quads table A (0) or B (1) for the count1 partition.
    count1table_select: u8,
    /// Long and short window scale factors, interpreted according to the block type:
    ///
    /// - short, not mixed: `scalefacs[0..36]` are the short-window factors;
    /// - short, mixed: `scalefacs[0..8]` are long factors, `scalefacs[8..35]` short;
    /// - otherwise: `scalefacs[0..21]` are the long factors.
    ///
    /// The final three short-window factors are never transmitted and stay 0.
    scalefacs: [u8; 39],
    /// The first sample of the all-zero rzero partition; equivalently, the number of decoded
    /// samples. Bands past the highest populated one are skipped during synthesis-side work.
    rzero: usize,
}

impl Default for GranuleChannel {
    fn default() -> Self {
        GranuleChannel {
            part2_3_length: 0,
            big_values: 0,
            global_gain: 0,
            scalefac_compress: 0,
            block_type: BlockType::Long,
            subblock_gain: [0; 3],
            table_select: [0; 3],
            region1_start: 0,
            region2_start: 0,
            preflag: false,
            scalefac_scale: false,
            count1table_select: 0,
            scalefacs: [0; 39],
            rzero: 0,
        }
    }
}

/// The block type of a granule channel.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BlockType {
    /// A single long block; the default when window switching is off.
    Long,
    /// A long-to-short transition block.
    Start,
    /// Three short blocks, optionally with long blocks in the lowest two sub-bands.
    Short { is_mixed: bool },
    /// A short-to-long transition block.
    End,
}

/// The layer 3 decoder with all inter-frame state: the previous frame's granule samples, the
/// overlap-add vectors, per-channel synthesis state, and the bit reservoir.
pub struct Layer3 {
    samples: [[[f32; 576]; 2]; 2],
    overlap: [[[f32; 18]; 32]; 2],
    synthesis: [synthesis::SynthesisState; 2],
    reservoir: BitReservoir,
}

impl Layer3 {
    pub fn new() -> Self {
        Layer3 {
            samples: [[[0f32; 576]; 2]; 2],
            overlap: [[[0f32; 18]; 32]; 2],
            synthesis: Default::default(),
            reservoir: BitReservoir::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Layer3::new();
    }

    /// The reservoir back-pointer bound for the stream's version.
    fn reservoir_cap(header: &FrameHeader) -> usize {
        if header.is_mpeg1() {
            MAX_RESERVOIR_MPEG1
        }
        else {
            MAX_RESERVOIR_MPEG2
        }
    }

    /// Feed a frame's main data into the bit reservoir without decoding it. Used when frames are
    /// skipped over (e.g. while winding towards a seek target) so that the reservoir stays
    /// primed for the first fully decoded frame.
    pub fn prime(&mut self, body: &[u8], header: &FrameHeader) {
        let body = if header.has_crc { body.get(2..).unwrap_or(&[]) } else { body };

        let side_info_len = header.side_info_len();
        if body.len() < side_info_len {
            self.reservoir.clear();
            return;
        }

        let cap = Self::reservoir_cap(header);
        let keep = self.reservoir.unread().min(cap);

        if self.reservoir.fill(&body[side_info_len..], keep).is_err() {
            self.reservoir.clear();
            return;
        }

        self.reservoir.trim(cap);
    }

    /// Clear the reservoir. Required whenever the stream loses sync, since carried-over main
    /// data is no longer valid.
    pub fn discontinuity(&mut self) {
        self.reservoir.clear();
    }

    /// Decode one frame into `out`.
    pub fn decode(
        &mut self,
        body: &[u8],
        header: &FrameHeader,
        out: &mut SampleBuffer,
    ) -> Result<()> {
        let body = if header.has_crc {
            if body.len() < 2 {
                return decode_error("mpa: truncated layer 3 frame");
            }
            // The CRC word is not verified.
            &body[2..]
        }
        else {
            body
        };

        let side_info_len = header.side_info_len();

        if body.len() < side_info_len {
            return decode_error("mpa: truncated layer 3 frame");
        }

        let mut side_info: SideInfo = Default::default();

        {
            let mut bs = BitReaderLtr::new(&body[..side_info_len]);

            if let Err(e) = bitstream::read_side_info(&mut bs, header, &mut side_info) {
                // The reservoir contents will not line up with the next frame any more.
                self.reservoir.clear();
                return Err(e);
            }
        }

        // Buffer this frame's main data into the reservoir, holding on to the back-referenced
        // bytes of previous frames.
        let underflow = match self
            .reservoir
            .fill(&body[side_info_len..], usize::from(side_info.main_data_begin))
        {
            Ok(underflow) => underflow,
            Err(e) => {
                self.reservoir.clear();
                return Err(e);
            }
        };

        // Read scale factors and spectral samples for every granule from the reservoir.
        match self.read_main_data(header, 8 * underflow, &mut side_info) {
            Ok(len) => {
                self.reservoir.consume(len);
                self.reservoir.trim(Self::reservoir_cap(header));
            }
            Err(e) => {
                self.reservoir.clear();
                return Err(e);
            }
        }

        for gr in 0..header.n_granules() {
            out.render(576);

            let granule = &mut side_info.granules[gr];

            requantize::requantize(header, &granule.channels[0], &mut self.samples[gr][0]);

            if header.channel_mode != ChannelMode::Mono {
                requantize::requantize(header, &granule.channels[1], &mut self.samples[gr][1]);

                stereo::stereo(header, granule, &mut self.samples[gr])?;
            }

            for ch in 0..header.n_channels() {
                let samples = &mut self.samples[gr][ch];

                // Short blocks are stored in window order; return them to sub-band order.
                hybrid::reorder(header, &granule.channels[ch], samples);

                hybrid::antialias(&granule.channels[ch], samples);

                hybrid::hybrid_synthesis(&granule.channels[ch], &mut self.overlap[ch], samples);

                // Negate every second sample of every second sub-band to undo the frequency
                // inversion of the polyphase filterbank.
                hybrid::frequency_inversion(samples);

                let out_samples = out.chan_mut(ch);

                synthesis::synthesis(
                    &mut self.synthesis[ch],
                    18,
                    samples,
                    &mut out_samples[gr * 576..(gr + 1) * 576],
                );
            }
        }

        Ok(())
    }

    /// Read the main data (scale factors and spectral samples) of all granules from the
    /// reservoir. Returns the number of whole bytes consumed.
    fn read_main_data(
        &mut self,
        header: &FrameHeader,
        underflow_bits: u32,
        side_info: &mut SideInfo,
    ) -> Result<usize> {
        let main_data = self.reservoir.bytes_ref();
        let mut part2_3_begin = 0;
        let mut part2_3_skipped = 0;

        for gr in 0..header.n_granules() {
            // When the reservoir underflowed, the granules whose bits are missing are zeroed and
            // produce silence rather than decoding garbage.
            if part2_3_skipped < underflow_bits {
                for ch in 0..header.n_channels() {
                    self.samples[gr][ch] = [0.0; 576];
                    side_info.granules[gr].channels[ch].rzero = 0;
                    part2_3_skipped +=
                        u32::from(side_info.granules[gr].channels[ch].part2_3_length);
                }

                if part2_3_skipped > underflow_bits {
                    part2_3_begin = (part2_3_skipped - underflow_bits) as usize;
                }

                continue;
            }

            for ch in 0..header.n_channels() {
                let byte_index = part2_3_begin >> 3;

                if byte_index >= main_data.len() {
                    return decode_error("mpa: invalid main_data offset");
                }

                let mut bs = BitReaderLtr::new(&main_data[byte_index..]);

                let bit_index = (part2_3_begin & 0x7) as u32;
                if bit_index > 0 {
                    bs.ignore_bits(bit_index)?;
                }

                // Scale factors (part2).
                let part2_len = if header.is_mpeg1() {
                    bitstream::read_scale_factors_mpeg1(&mut bs, gr, ch, side_info)
                }
                else {
                    bitstream::read_scale_factors_mpeg2(
                        &mut bs,
                        ch > 0 && header.is_intensity_stereo(),
                        &mut side_info.granules[gr].channels[ch],
                    )
                }?;

                let part2_3_length =
                    u32::from(side_info.granules[gr].channels[ch].part2_3_length);

                if part2_len > part2_3_length {
                    return decode_error("mpa: part2_3_length is not valid");
                }

                // Huffman-coded spectral samples (part3).
                let part3_len = part2_3_length - part2_len;

                let rzero = requantize::read_huffman_samples(
                    &mut bs,
                    &side_info.granules[gr].channels[ch],
                    part3_len,
                    &mut self.samples[gr][ch],
                )?;

                side_info.granules[gr].channels[ch].rzero = rzero;

                part2_3_begin += part2_3_length as usize;
            }
        }

        Ok((part2_3_begin + 7) >> 3)
    }
}
