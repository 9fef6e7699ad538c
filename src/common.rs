// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{decode_error, Result};

use log::warn;

/// Maximum number of samples in a frame across all layers and versions.
pub const MAX_SAMPLES_PER_FRAME: usize = 1152;

/// Startng indicies of each scale factor band at various sampling rates for long blocks.
#[rustfmt::skip]
pub const SFB_LONG_BANDS: [[usize; 23]; 9] = [
    // 44.1 kHz, MPEG version 1, derived from ISO/IEC 11172-3 Table B.8
    [
        0, 4, 8, 12, 16, 20, 24, 30, 36, 44, 52, 62, 74, 90, 110, 134, 162, 196, 238, 288, 342,
        418, 576,
    ],
    // 48 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 30, 36, 42, 50, 60, 72, 88, 106, 128, 156, 190, 230, 276, 330,
        384, 576,
    ],
    // 32 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 30, 36, 44, 54, 66, 82, 102, 126, 156, 194, 240, 296, 364, 448,
        550, 576,
    ],
    // 22.050 kHz, MPEG version 2, derived from ISO/IEC 13818-3 Table B.2
    [
        0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336, 396, 464,
        522, 576,
    ],
    // 24 kHz (the band starting at 332 starts at 330 in some decoders, but 332 is correct)
    [
        0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 114, 136, 162, 194, 232, 278, 332, 394, 464,
        540, 576,
    ],
    // 16 kHz
    [
        0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336, 396, 464,
        522, 576,
    ],
    // 11.025 kHz, MPEG version 2.5
    [
        0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336, 396, 464,
        522, 576,
    ],
    // 12 kHz
    [
        0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336, 396, 464,
        522, 576,
    ],
    // 8 kHz
    [
        0, 12, 24, 36, 48, 60, 72, 88, 108, 132, 160, 192, 232, 280, 336, 400, 476, 566, 568, 570,
        572, 574, 576,
    ],
];

/// Starting indicies of each scale factor band at various sampling rates for short blocks. Each
/// value must be multiplied by 3 since there are three equal length windows per short scale factor
/// band.
#[rustfmt::skip]
pub const SFB_SHORT_BANDS: [[usize; 40]; 9] = [
    // 44.1 kHz, MPEG version 1, derived from ISO/IEC 11172-3 Table B.8
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 54, 60, 66, 74, 82, 90, 100, 110, 120,
        132, 144, 156, 170, 184, 198, 216, 234, 252, 274, 296, 318, 348, 378, 408, 464, 520, 576,
    ],
    // 48 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 54, 60, 66, 72, 78, 84, 94, 104, 114, 126,
        138, 150, 164, 178, 192, 208, 224, 240, 260, 280, 300, 326, 352, 378, 444, 510, 576,
    ],
    // 32 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 54, 60, 66, 74, 82, 90, 102, 114, 126,
        142, 158, 174, 194, 214, 234, 260, 286, 312, 346, 380, 414, 456, 498, 540, 552, 564, 576,
    ],
    // 22.050 kHz, MPEG version 2, derived from ISO/IEC 13818-3 Table B.2
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 42, 48, 54, 60, 66, 72, 80, 88, 96, 106, 116, 126,
        140, 154, 168, 186, 204, 222, 248, 274, 300, 332, 364, 396, 438, 480, 522, 540, 558, 576,
    ],
    // 24 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144,
        158, 172, 186, 204, 222, 240, 264, 288, 312, 344, 376, 408, 452, 496, 540, 552, 564, 576,
    ],
    // 16 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144,
        158, 172, 186, 204, 222, 240, 264, 288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 11.025 kHz, MPEG version 2.5
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144,
        158, 172, 186, 204, 222, 240, 264, 288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 12 kHz
    [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144,
        158, 172, 186, 204, 222, 240, 264, 288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 8 kHz
    [
        0, 8, 16, 24, 32, 40, 48, 56, 64, 72, 84, 96, 108, 124, 140, 156, 176, 196, 216, 240, 264,
        288, 316, 344, 372, 408, 444, 480, 482, 484, 486, 488, 490, 492, 494, 496, 498, 524, 550,
        576,
    ],
];

#[rustfmt::skip]
pub const SFB_MIXED_BANDS: [&[usize]; 9] = [
    // 44.1 kHz, MPEG version 1, derived from ISO/IEC 11172-3 Table B.8
    &[
        0, 4, 8, 12, 16, 20, 24, 30, // Split-point
        36, 40, 44, 48, 54, 60, 66, 74, 82, 90, 100, 110, 120, 132, 144, 156, 170, 184, 198, 216,
        234, 252, 274, 296, 318, 348, 378, 408, 464, 520, 576,
    ],
    // 48 kHz
    &[
        0, 4, 8, 12, 16, 20, 24, 30, // Split-point
        36, 40, 44, 48, 54, 60, 66, 72, 78, 84, 94, 104, 114, 126, 138, 150, 164, 178, 192, 208,
        224, 240, 260, 280, 300, 326, 352, 378, 444, 510, 576,
    ],
    // 32 kHz
    &[
        0, 4, 8, 12, 16, 20, 24, 30, // Split-point
        36, 40, 44, 48, 54, 60, 66, 74, 82, 90, 102, 114, 126, 142, 158, 174, 194, 214, 234, 260,
        286, 312, 346, 380, 414, 456, 498, 540, 552, 564, 576,
    ],
    // 22.050 kHz, MPEG version 2, derived from ISO/IEC 13818-3 Table B.2
    &[
        0, 6, 12, 18, 24, 30, // Split-point
        36, 42, 48, 54, 60, 66, 72, 80, 88, 96, 106, 116, 126, 140, 154, 168, 186, 204, 222, 248,
        274, 300, 332, 364, 396, 438, 480, 522, 540, 558, 576,
    ],
    // 24 kHz
    &[
        0, 6, 12, 18, 24, 30, // Split-point
        36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144, 158, 172, 186, 204, 222, 240, 264,
        288, 312, 344, 376, 408, 452, 496, 540, 552, 564, 576,
    ],
    // 16 kHz
    &[
        0, 6, 12, 18, 24, 30, // Split-point
        36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144, 158, 172, 186, 204, 222, 240, 264,
        288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 11.025 kHz, MPEG version 2.5
    &[
        0, 6, 12, 18, 24, 30, // Split-point
        36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144, 158, 172, 186, 204, 222, 240, 264,
        288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 12 kHz
    &[
        0, 6, 12, 18, 24, 30, // Split-point
        36, 42, 48, 54, 62, 70, 78, 88, 98, 108, 120, 132, 144, 158, 172, 186, 204, 222, 240, 264,
        288, 312, 342, 372, 402, 442, 482, 522, 540, 558, 576,
    ],
    // 8 kHz
    //
    // Note: The mixed bands for 8kHz do not follow the same pattern as the other sample rates.
    // There does not appear to be a consensus among other implementations either, so this is at
    // best an educated guess.
    &[
        0, 12, 24, 36, 40, 44, 48, 56, 64, 72, 84, 96, 108, 124, 140, 156, 176, 196, 216, 240, 264,
        288, 316, 344, 372, 408, 444, 480, 482, 484, 486, 488, 490, 492, 494, 496, 498, 524, 550,
        576,
    ],
];

/// The index of the first window in the first short band of a mixed block. All bands preceeding
/// the switch point are long bands.
pub const SFB_MIXED_SWITCH_POINT: [usize; 9] = [8, 8, 8, 6, 6, 6, 6, 6, 3];

/// The MPEG audio version.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegVersion {
    /// Version 2.5
    Mpeg2p5,
    /// Version 2
    Mpeg2,
    /// Version 1
    Mpeg1,
}

/// The MPEG audio layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegLayer {
    /// Layer 1
    Layer1,
    /// Layer 2
    Layer2,
    /// Layer 3
    Layer3,
}

/// For the Joint Stereo channel mode, the mode extension describes the features and parameters of
/// the stereo encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Joint Stereo in layer 3 may use both Mid-Side and Intensity encoding.
    Layer3 { mid_side: bool, intensity: bool },
    /// Joint Stereo in layers 1 and 2 may only use Intensity encoding on a set of bands. The range
    /// of bands using intensity encoding is bound..32.
    Intensity { bound: u32 },
}

/// The channel mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Single mono audio channel.
    Mono,
    /// Dual mono audio channels.
    DualMono,
    /// Stereo channels.
    Stereo,
    /// Joint Stereo encoded channels (decodes to Stereo).
    JointStereo(Mode),
}

impl ChannelMode {
    /// Gets the number of channels.
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

/// The emphasis applied during encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emphasis {
    /// No emphasis
    None,
    /// 50/15us
    Fifty15,
    /// CCIT J.17
    CcitJ17,
}

/// A decoded MPEG 1, 2, or 2.5 audio frame header. A `FrameHeader` is only ever constructed
/// fully populated from a validated header word; there is no partially-valid state.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub sample_rate_idx: usize,
    pub channel_mode: ChannelMode,
    pub emphasis: Emphasis,
    pub is_copyrighted: bool,
    pub is_original: bool,
    pub has_padding: bool,
    pub has_crc: bool,
    pub is_free_format: bool,
    /// The size of the frame body in bytes, excluding the 4-byte header. For a free-format
    /// header this is 0 until the size has been inferred.
    pub frame_size: usize,
}

impl FrameHeader {
    /// Returns true if this a MPEG1 frame, false otherwise.
    #[inline(always)]
    pub fn is_mpeg1(&self) -> bool {
        self.version == MpegVersion::Mpeg1
    }

    /// Returns true if this a MPEG2.5 frame, false otherwise.
    #[inline(always)]
    pub fn is_mpeg2p5(&self) -> bool {
        self.version == MpegVersion::Mpeg2p5
    }

    /// Returns the number of granules in the frame.
    #[inline(always)]
    pub fn n_granules(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 2,
            _ => 1,
        }
    }

    /// Returns the number of channels.
    #[inline(always)]
    pub fn n_channels(&self) -> usize {
        self.channel_mode.count()
    }

    /// Returns the number of PCM samples per channel decoded from one frame.
    #[inline(always)]
    pub fn samples_per_frame(&self) -> usize {
        match self.layer {
            MpegLayer::Layer1 => 384,
            MpegLayer::Layer2 => 1152,
            MpegLayer::Layer3 if self.is_mpeg1() => 1152,
            // MPEG 2.5 implies a low sampling frequency.
            MpegLayer::Layer3 => 576,
        }
    }

    /// Returns true if Intensity Stereo encoding is used, false otherwise.
    #[inline(always)]
    pub fn is_intensity_stereo(&self) -> bool {
        match self.channel_mode {
            ChannelMode::JointStereo(Mode::Intensity { .. }) => true,
            ChannelMode::JointStereo(Mode::Layer3 { intensity, .. }) => intensity,
            _ => false,
        }
    }

    /// Get the layer 3 side information length, excluding the optional CRC.
    #[inline(always)]
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }
}

/// The maximum number of carried-over main data bytes for MPEG1 streams. The main_data_begin
/// back-pointer is a 9-bit field and can never reference further back than this.
pub const MAX_RESERVOIR_MPEG1: usize = 511;

/// The maximum number of carried-over main data bytes for MPEG2 and 2.5 streams, where the
/// back-pointer is an 8-bit field.
pub const MAX_RESERVOIR_MPEG2: usize = 255;

/// `BitReservoir` implements the bit reservoir mechanism for layer 3 main data. Since frames have
/// a deterministic length based on the bit-rate, low-complexity portions of the audio may not
/// need every byte allocated to the frame. The reservoir allows these unused portions to be
/// used by future frames.
pub struct BitReservoir {
    buf: Box<[u8]>,
    len: usize,
    consumed: usize,
}

impl BitReservoir {
    pub fn new() -> Self {
        BitReservoir { buf: vec![0u8; 2048].into_boxed_slice(), len: 0, consumed: 0 }
    }

    /// Appends the main data of the current frame after the `main_data_begin` bytes re-used from
    /// previous frames. Returns the number of missing (underflowed) bytes, which is non-zero when
    /// the back-pointer references data that was never buffered (e.g. after starting mid-stream).
    pub fn fill(&mut self, frame_main_data: &[u8], main_data_begin: usize) -> Result<u32> {
        let main_data_len = frame_main_data.len();
        let main_data_end = main_data_begin + main_data_len;

        if main_data_end > self.buf.len() {
            return decode_error("mpa: invalid main_data length, will exceed reservoir buffer");
        }

        let unread = self.len - self.consumed;

        let underflow = if main_data_begin <= unread {
            // Shift the re-used bytes to the front of the reservoir, then append the new main
            // data after them.
            self.buf.copy_within(self.len - main_data_begin..self.len, 0);
            self.buf[main_data_begin..main_data_end].copy_from_slice(frame_main_data);
            self.len = main_data_end;

            0
        }
        else {
            // The back-pointer references more data than the reservoir holds. Keep what there
            // is, and report how many bytes are missing so the caller can zero the affected
            // granules instead of reading garbage.
            self.buf.copy_within(self.len - unread..self.len, 0);
            self.buf[unread..unread + main_data_len].copy_from_slice(frame_main_data);
            self.len = unread + main_data_len;

            let underflow = (main_data_begin - unread) as u32;

            warn!("mpa: invalid main_data_begin, underflow by {} bytes", underflow);

            underflow
        };

        self.consumed = 0;

        Ok(underflow)
    }

    /// Mark `len` bytes as consumed.
    pub fn consume(&mut self, len: usize) {
        self.consumed = self.len.min(self.consumed + len);
    }

    /// Discard all but the trailing `cap` bytes. The next frame's back-pointer can never exceed
    /// the cap, so anything older is dead weight.
    pub fn trim(&mut self, cap: usize) {
        if self.len > cap {
            self.buf.copy_within(self.len - cap..self.len, 0);
            self.consumed = self.consumed.saturating_sub(self.len - cap);
            self.len = cap;
        }
    }

    /// The unconsumed bytes.
    pub fn bytes_ref(&self) -> &[u8] {
        &self.buf[self.consumed..self.len]
    }

    /// The number of buffered bytes not yet consumed.
    pub fn unread(&self) -> usize {
        self.len - self.consumed
    }

    /// The number of buffered bytes, consumed or not.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.consumed = 0;
    }
}

/// A planar floating-point PCM buffer holding the decoded samples of exactly one frame.
pub struct SampleBuffer {
    planes: Box<[[f32; MAX_SAMPLES_PER_FRAME]; 2]>,
    len: usize,
}

impl SampleBuffer {
    pub fn new() -> SampleBuffer {
        SampleBuffer { planes: Box::new([[0.0; MAX_SAMPLES_PER_FRAME]; 2]), len: 0 }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Extend the frame by `len` samples per channel.
    pub fn render(&mut self, len: usize) {
        debug_assert!(self.len + len <= MAX_SAMPLES_PER_FRAME);
        self.len += len;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn chan(&self, ch: usize) -> &[f32] {
        &self.planes[ch][..self.len]
    }

    pub fn chan_mut(&mut self, ch: usize) -> &mut [f32; MAX_SAMPLES_PER_FRAME] {
        &mut self.planes[ch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reservoir_underflow() {
        let mut resv = BitReservoir::new();

        // Nothing buffered, but the frame claims 100 bytes of history.
        let underflow = resv.fill(&[1, 2, 3, 4], 100).unwrap();
        assert_eq!(underflow, 100);
        assert_eq!(resv.bytes_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn verify_reservoir_reuse() {
        let mut resv = BitReservoir::new();

        resv.fill(&[1, 2, 3, 4, 5, 6], 0).unwrap();
        resv.consume(4);

        // Reach back two bytes into the previous frame's data.
        let underflow = resv.fill(&[7, 8], 2).unwrap();
        assert_eq!(underflow, 0);
        assert_eq!(resv.bytes_ref(), &[5, 6, 7, 8]);
    }

    #[test]
    fn verify_reservoir_bound() {
        let mut resv = BitReservoir::new();

        // Feed a long run of frames and verify the retained history never exceeds the MPEG1
        // back-pointer bound after trimming.
        let frame = [0u8; 400];
        for _ in 0..16 {
            let keep = resv.unread().min(MAX_RESERVOIR_MPEG1);
            resv.fill(&frame, keep).unwrap();
            resv.consume(300);
            resv.trim(MAX_RESERVOIR_MPEG1);
            assert!(resv.len() <= MAX_RESERVOIR_MPEG1);
        }
    }

    #[test]
    fn verify_reservoir_overflow_rejected() {
        let mut resv = BitReservoir::new();
        let huge = vec![0u8; 2048];
        assert!(resv.fill(&huge, 511).is_err());
    }
}
