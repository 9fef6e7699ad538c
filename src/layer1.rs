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

/// The layer 1 decoder.
pub struct Layer1 {
    synthesis: [synthesis::SynthesisState; 2],
}

impl Layer1 {
    pub fn new() -> Self {
        Layer1 { synthesis: Default::default() }
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
        // Ignore the CRC.
        let body = if header.has_crc {
            if body.len() < 2 {
                return decode_error("mpa: truncated layer 1 frame");
            }
            &body[2..]
        }
        else {
            body
        };

        let mut bs = BitReaderLtr::new(body);

        let mut alloc = [[0u8; 32]; 2];
        let mut scalefacs = [[0f32; 32]; 2];

        let num_channels = header.n_channels();

        let bound = match header.channel_mode {
            ChannelMode::JointStereo(Mode::Intensity { bound }) => bound as usize,
            ChannelMode::JointStereo(Mode::Layer3 { .. }) => {
                return decode_error("mpa: invalid mode extension for layer 1")
            }
            _ => 32,
        };

        // Read bit allocations for each independently coded sub-band.
        for sb in 0..bound {
            for chan in alloc.iter_mut().take(num_channels) {
                let bits = bs.read_bits(4)? as u8;

                if bits > 0xe {
                    return decode_error("mpa: invalid layer 1 bit allocation");
                }

                chan[sb] = if bits != 0 { bits + 1 } else { 0 };
            }
        }

        // Read bit allocations for the intensity coded sub-bands.
        for sb in bound..32 {
            let bits = bs.read_bits(4)? as u8;

            if bits > 0xe {
                return decode_error("mpa: invalid layer 1 bit allocation");
            }

            let ba = if bits != 0 { bits + 1 } else { 0 };

            alloc[0][sb] = ba;
            alloc[1][sb] = ba;
        }

        // Read the scale factor for every allocated sub-band.
        for sb in 0..32 {
            for ch in 0..num_channels {
                if alloc[ch][sb] != 0 {
                    let index = bs.read_bits(6)? as usize;
                    scalefacs[ch][sb] = SCALEFACTORS[index];
                }
            }
        }

        // Decode the 12 samples of each sub-band.
        let mut samples = [[0f32; 384]; 2];

        for s in 0..12 {
            for sb in 0..bound {
                for ch in 0..num_channels {
                    let bits = u32::from(alloc[ch][sb]);

                    if bits != 0 {
                        let raw = bs.read_bits(bits)?;
                        let sample = dequantize_linear(bits, raw);
                        samples[ch][12 * sb + s] = scalefacs[ch][sb] * sample;
                    }
                }
            }

            // Intensity coded sub-bands share the sample value but scale it per channel.
            for sb in bound..32 {
                let bits = u32::from(alloc[0][sb]);

                if bits != 0 {
                    let raw = bs.read_bits(bits)?;
                    let sample = dequantize_linear(bits, raw);

                    for ch in 0..num_channels {
                        samples[ch][12 * sb + s] = scalefacs[ch][sb] * sample;
                    }
                }
            }
        }

        out.render(384);

        for ch in 0..num_channels {
            synthesis::synthesis(
                &mut self.synthesis[ch],
                12,
                &samples[ch],
                out.chan_mut(ch),
            );
        }

        Ok(())
    }
}
