// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `decoder` module implements the top-level decode driver: the public handle tying the
//! reader, the frame parser, the per-layer decoders, and the output stage together.

use crate::common::{FrameHeader, MpegLayer, SampleBuffer};
use crate::errors::{seek_error, unsupported_error, Error, Result, SeekErrorKind};
use crate::index::{FrameIndex, IndexMode};
use crate::reader::{MediaSource, Reader, Step};
use crate::tags::StreamInfo;

use bitflags::bitflags;
use log::{debug, warn};

/// The number of samples the synthesis filterbank delays the signal by. Gapless boundaries
/// account for it on top of the encoder delay.
const DECODER_DELAY: i64 = 529;

/// The outcome of a `decode` or `read` call, alongside the number of bytes produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// Output was produced and more is available.
    Ok,
    /// More input must be fed before decoding can continue. Feed mode only; never fatal.
    NeedMore,
    /// The output format changed (or was determined for the first time). Query it with
    /// `format()`; no samples were lost.
    NewFormat,
    /// The end of the stream was reached.
    Done,
}

/// The PCM sample encoding of the output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Interleaved signed 16-bit, native endian.
    Signed16,
    /// Interleaved unsigned 16-bit, native endian.
    Unsigned16,
}

/// The negotiated output format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Format {
    pub sample_rate: u32,
    pub channels: usize,
    pub encoding: Encoding,
}

/// Whence for `seek`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Whence {
    /// Relative to the start of the stream.
    Set,
    /// Relative to the current position.
    Cur,
    /// Relative to the end of the stream. Requires the stream length to be known or computable.
    End,
}

/// Decoder configuration.
#[derive(Clone, Debug)]
pub struct Options {
    /// Maximum number of bytes to scan while resynchronizing before giving up on the stream.
    /// Negative means unlimited.
    pub resync_limit: i64,
    /// Trim encoder delay and padding using LAME tag information.
    pub gapless: bool,
    /// Allow output at half or quarter rate when a forced rate requires it.
    pub auto_resample: bool,
    /// Force the output sample rate. Only the native rate and its integer halves (with
    /// `auto_resample`) are accepted.
    pub force_rate: Option<u32>,
    /// Number of frames to decode ahead of a seek target to warm up the decoder state. Layer 3
    /// always uses at least 1 for the bit reservoir.
    pub preframes: u32,
    /// Frame index sizing.
    pub index_mode: IndexMode,
    /// Allow seeks to estimate byte positions from the mean frame size or the seek TOC instead
    /// of walking frames. Faster on long unindexed streams, but positions become approximate
    /// and gapless trimming is suspended until accuracy is regained.
    pub fuzzy_seek: bool,
    /// Number of spare chunks kept by the feed buffer pool.
    pub feed_pool: usize,
    /// Chunk size of the feed buffer, in bytes.
    pub feed_chunk: usize,
    /// Ignore stream length information from information tags.
    pub ignore_length_info: bool,
    /// Do not look for a Xing/Info/LAME tag at all.
    pub ignore_lame_tag: bool,
    /// Output sample encoding.
    pub encoding: Encoding,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            resync_limit: 1024,
            gapless: true,
            auto_resample: true,
            force_rate: None,
            preframes: 4,
            index_mode: IndexMode::default(),
            fuzzy_seek: false,
            // Keeping a few 4K buffers at hand covers the usual feed pattern.
            feed_pool: 5,
            feed_chunk: 4096,
            ignore_length_info: false,
            ignore_lame_tag: false,
            encoding: Encoding::Signed16,
        }
    }
}

bitflags! {
    pub(crate) struct StateFlags: u32 {
        /// The current stream position corresponds exactly to the current frame number.
        const ACCURATE = 0x1;
        /// The stream appears to be a concatenation of incompatible streams; length and seek
        /// bookkeeping is best-effort.
        const CONCATENATED = 0x2;
        /// No frame has been handed to the decode stage since (re)start.
        const FRESH = 0x4;
    }
}

pub(crate) enum LayerDecoder {
    #[cfg(feature = "mp1")]
    Layer1(crate::layer1::Layer1),
    #[cfg(feature = "mp2")]
    Layer2(crate::layer2::Layer2),
    #[cfg(feature = "mp3")]
    Layer3(crate::layer3::Layer3),
}

/// A MPEG audio decoder handle. One handle decodes one logical stream; it is not safe for
/// concurrent calls.
pub struct Decoder {
    pub(crate) opts: Options,
    pub(crate) reader: Reader,

    // Parser state.
    pub(crate) first_head: u32,
    pub(crate) old_head: u32,
    pub(crate) header: Option<FrameHeader>,
    pub(crate) frame_buf: Vec<u8>,
    pub(crate) freeformat_size: Option<usize>,
    /// Current frame number; -1 before the first frame.
    pub(crate) num: i64,
    pub(crate) audio_start: u64,
    pub(crate) mean_frame_size: f64,
    pub(crate) mean_frames: i64,
    pub(crate) flags: StateFlags,
    pub(crate) silent_resync: u32,
    /// 0: same header, 1: compatible header, 2: format may have changed.
    pub(crate) header_change: u8,
    pub(crate) to_decode: bool,
    pub(crate) to_ignore: bool,
    pub(crate) track_frames: u64,
    pub(crate) info: Option<StreamInfo>,
    pub(crate) index: FrameIndex,
    /// Non-fatal decode errors seen so far.
    pub(crate) errors: u64,

    // Decode state.
    layer: Option<LayerDecoder>,
    decoder_change: bool,
    format: Option<Format>,
    new_format: bool,
    down_sample: u32,
    pcm: SampleBuffer,
    out_buf: Vec<u8>,
    out_pos: usize,
    out_len: usize,

    // Gapless bookkeeping, in decoded (input-side) and output-side samples.
    gapless_frames: i64,
    begin_s: i64,
    end_s: i64,
    begin_os: i64,
    end_os: i64,
    fullend_os: i64,
    first_frame: i64,
    last_frame: i64,
    first_off: i64,
    last_off: i64,
    ignore_frame: i64,
}

impl Decoder {
    /// Open a decoder over a byte source with default options.
    pub fn open(src: Box<dyn MediaSource>) -> Result<Decoder> {
        Decoder::open_with_options(src, Options::default())
    }

    /// Open a decoder over a byte source. Seekable sources are read directly; others through a
    /// read-ahead buffer.
    pub fn open_with_options(src: Box<dyn MediaSource>, opts: Options) -> Result<Decoder> {
        let reader = Reader::open(src, opts.feed_pool, opts.feed_chunk)?;
        Ok(Decoder::new(reader, opts))
    }

    /// Open a decoder in feed mode: the caller pushes input with `feed` (or the `input` argument
    /// of `decode`), and no call ever blocks on I/O.
    pub fn open_feed(opts: Options) -> Decoder {
        let reader = Reader::open_feed(opts.feed_pool, opts.feed_chunk);
        Decoder::new(reader, opts)
    }

    fn new(reader: Reader, opts: Options) -> Decoder {
        let index = FrameIndex::new(opts.index_mode);

        Decoder {
            opts,
            reader,
            first_head: 0,
            old_head: 0,
            header: None,
            frame_buf: Vec::new(),
            freeformat_size: None,
            num: -1,
            audio_start: 0,
            mean_frame_size: 0.0,
            mean_frames: 0,
            flags: StateFlags::ACCURATE | StateFlags::FRESH,
            silent_resync: 0,
            header_change: 0,
            to_decode: false,
            to_ignore: false,
            track_frames: 0,
            info: None,
            index,
            errors: 0,
            layer: None,
            decoder_change: true,
            format: None,
            new_format: false,
            down_sample: 0,
            pcm: SampleBuffer::new(),
            out_buf: Vec::new(),
            out_pos: 0,
            out_len: 0,
            gapless_frames: -1,
            begin_s: 0,
            end_s: 0,
            begin_os: 0,
            end_os: 0,
            fullend_os: 0,
            first_frame: 0,
            last_frame: -1,
            first_off: 0,
            last_off: 0,
            ignore_frame: 0,
        }
    }

    /// Push input bytes. Feed mode only.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        self.reader.feed(data)
    }

    /// The number of non-fatal frame errors encountered so far.
    pub fn error_count(&self) -> u64 {
        self.errors
    }

    /// The negotiated output format, once the first frame has been parsed. In feed mode this may
    /// return `None` until enough input was fed.
    pub fn format(&mut self) -> Result<Option<Format>> {
        if self.format.is_none() {
            match self.init_track()? {
                Step::Ready(()) => (),
                _ => return Ok(None),
            }
        }
        self.new_format = false;
        Ok(self.format)
    }

    /// Decode the stream into `out`, optionally feeding `input` first (feed mode). Returns the
    /// number of bytes written and a status.
    ///
    /// A frame that fails to decode contributes silence of its expected duration; decoding
    /// continues at the next frame found by resynchronization. Only reader I/O failures and an
    /// exhausted resync limit are fatal.
    pub fn decode(&mut self, input: Option<&[u8]>, out: &mut [u8]) -> Result<(usize, Status)> {
        if let Some(data) = input {
            if !data.is_empty() {
                self.feed(data)?;
            }
        }

        let mut done = 0;

        loop {
            // Decode the pending frame, if any. The output buffer is empty at this point.
            if self.to_decode {
                if self.new_format {
                    self.new_format = false;
                    return Ok((done, Status::NewFormat));
                }

                self.decode_current_frame();
                self.trim_output();
            }

            if self.out_pos < self.out_len {
                let n = (out.len() - done).min(self.out_len - self.out_pos);
                out[done..done + n].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + n]);
                done += n;
                self.out_pos += n;

                if done == out.len() {
                    return Ok((done, Status::Ok));
                }
            }
            else {
                match self.next_frame()? {
                    Step::Ready(()) => (),
                    Step::NeedMore => return Ok((done, Status::NeedMore)),
                    Step::Eof => return Ok((done, Status::Done)),
                }
            }
        }
    }

    /// Decode the stream into `out` without feeding input.
    pub fn read(&mut self, out: &mut [u8]) -> Result<(usize, Status)> {
        self.decode(None, out)
    }

    /// The current position in output samples (per channel), gapless-adjusted.
    pub fn tell(&self) -> u64 {
        if self.num < 0 && !self.to_decode {
            return 0;
        }

        let buffered = (self.out_len - self.out_pos) as i64 / self.bytes_per_sample();

        let pos = if self.num < self.first_frame || (self.num == self.first_frame && self.to_decode)
        {
            // Winding towards the first frame: output starts there.
            self.frame_outs(self.first_frame) + self.first_off
        }
        else if self.to_decode {
            self.frame_outs(self.num) - buffered
        }
        else {
            self.frame_outs(self.num + 1) - buffered
        };

        self.sample_adjust(pos).max(0) as u64
    }

    /// Seek to an output sample position. Returns the position actually reached,
    /// gapless-adjusted.
    pub fn seek(&mut self, sample_off: i64, whence: Whence) -> Result<u64> {
        match self.init_track()? {
            Step::Ready(()) => (),
            Step::NeedMore => {
                return Err(Error::InvalidOperation("mpa: seek before the format is known"))
            }
            Step::Eof => (),
        }

        let mut pos = self.tell() as i64;

        match whence {
            Whence::Set => pos = sample_off,
            Whence::Cur => pos += sample_off,
            Whence::End => {
                // Establish the length first, scanning if needed and possible.
                if self.track_frames < 1 && self.reader.is_seekable() {
                    let _ = self.scan();
                }
                if self.track_frames > 0 {
                    pos = self.sample_adjust(self.frame_outs(self.track_frames as i64))
                        - sample_off;
                }
                else if self.end_os > 0 {
                    pos = self.sample_adjust(self.end_os) - sample_off;
                }
                else {
                    return seek_error(SeekErrorKind::Unseekable);
                }
            }
        }

        let pos = pos.max(0);

        let target = self.sample_unadjust(pos);
        self.set_frame_seek(target);
        self.do_seek()?;

        Ok(self.tell())
    }

    /// Walk the entire stream to determine the exact frame and sample counts. Requires a
    /// seekable source; the read position is restored afterwards.
    pub fn scan(&mut self) -> Result<()> {
        if !self.reader.is_seekable() {
            return seek_error(SeekErrorKind::Unseekable);
        }

        match self.init_track()? {
            Step::Ready(()) => (),
            Step::NeedMore => return Ok(()),
            Step::Eof => return Ok(()),
        }

        let old_pos = self.tell() as i64;

        // Restart from the very first audio frame and count every frame.
        self.seek_to_frame(0)?;

        if self.num != 0 {
            return Err(Error::InvalidOperation("mpa: scan failed to restart the stream"));
        }

        let spf = i64::from(self.samples_per_frame());
        let mut track_frames = 1u64;
        let mut track_samples = spf;

        // A scan ends at the first frame that cannot be read, including a late stream error; the
        // frames counted so far are still authoritative for everything before it.
        while let Ok(Step::Ready(())) = self.read_frame() {
            track_frames += 1;
            track_samples += spf;
        }

        self.track_frames = track_frames;

        if self.opts.gapless {
            self.gapless_update(track_samples);
        }

        self.seek(old_pos, Whence::Set)?;

        Ok(())
    }

    // ---- Internals. ----

    /// Pull the first frame if nothing was parsed yet, so that format and length information
    /// exist.
    pub(crate) fn init_track(&mut self) -> Result<Step<()>> {
        if self.num < 0 && !self.to_decode {
            self.next_frame()
        }
        else {
            Ok(Step::Ready(()))
        }
    }

    /// Samples per frame of the current stream.
    pub(crate) fn samples_per_frame(&self) -> u32 {
        match self.header {
            Some(ref h) => h.samples_per_frame() as u32,
            None => 1152,
        }
    }

    fn bytes_per_sample(&self) -> i64 {
        match self.format {
            Some(f) => 2 * f.channels as i64,
            None => 4,
        }
    }

    /// Advance to the next frame to decode, skipping and pre-decoding frames as dictated by a
    /// pending seek, and renegotiating the format on header changes.
    fn next_frame(&mut self) -> Result<Step<()>> {
        let mut change = self.decoder_change;

        if self.header_change > 1 && self.num >= 0 {
            change = true;
            self.header_change = 0;
            self.update_format()?;
        }

        loop {
            // Frames between the ignore point and the seek target are decoded for their state
            // and discarded.
            if self.to_ignore && self.num < self.first_frame && self.num >= self.ignore_frame {
                self.decode_current_frame();
                self.out_len = 0;
                self.out_pos = 0;
                self.to_ignore = false;
                self.to_decode = false;
            }

            self.to_decode = false;

            match self.read_frame()? {
                Step::Ready(()) => (),
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => {
                    self.track_frames = (self.num + 1).max(0) as u64;
                    return Ok(Step::Eof);
                }
            }

            if self.header_change > 1 {
                change = true;
                self.header_change = 0;
                self.update_format()?;
            }

            if self.num < self.first_frame {
                // Not yet at the target: prime the decoder state if inside the preframe window,
                // otherwise skip entirely.
                if !(self.to_ignore && self.num >= self.ignore_frame) {
                    self.frame_skip();
                }
            }
            else {
                break;
            }
        }

        if change {
            self.decoder_change = false;

            if self.flags.contains(StateFlags::FRESH) {
                self.flags.remove(StateFlags::FRESH);

                // First decodable frame: fix the gapless window and seek bookkeeping.
                self.gapless_realinit();
                self.set_frame_seek(self.num.max(0) * i64::from(self.samples_per_frame()));

                if self.num < self.first_frame {
                    return self.next_frame();
                }
            }
        }

        Ok(Step::Ready(()))
    }

    /// Negotiate the output format for the current header. Flags `NewFormat` when it differs
    /// from the previous negotiation.
    fn update_format(&mut self) -> Result<()> {
        let header = match self.header {
            Some(ref h) => h.clone(),
            None => return Ok(()),
        };

        let native_rate = header.sample_rate;

        let (rate, down_sample) = match self.opts.force_rate {
            None => (native_rate, 0),
            Some(rate) if rate == native_rate => (rate, 0),
            Some(rate) if self.opts.auto_resample && rate * 2 == native_rate => (rate, 1),
            Some(rate) if self.opts.auto_resample && rate * 4 == native_rate => (rate, 2),
            Some(_) => return unsupported_error("mpa: forced rate is not reachable"),
        };

        let format = Format {
            sample_rate: rate,
            channels: header.n_channels(),
            encoding: self.opts.encoding,
        };

        if self.format != Some(format) {
            self.format = Some(format);
            self.new_format = true;
        }

        self.down_sample = down_sample;

        // (Re)build the layer decoder when the layer changes or after a reset.
        let rebuild = match (&self.layer, header.layer) {
            #[cfg(feature = "mp1")]
            (Some(LayerDecoder::Layer1(_)), MpegLayer::Layer1) => false,
            #[cfg(feature = "mp2")]
            (Some(LayerDecoder::Layer2(_)), MpegLayer::Layer2) => false,
            #[cfg(feature = "mp3")]
            (Some(LayerDecoder::Layer3(_)), MpegLayer::Layer3) => false,
            _ => true,
        };

        if rebuild {
            self.layer = match header.layer {
                #[cfg(feature = "mp1")]
                MpegLayer::Layer1 => Some(LayerDecoder::Layer1(crate::layer1::Layer1::new())),
                #[cfg(feature = "mp2")]
                MpegLayer::Layer2 => Some(LayerDecoder::Layer2(crate::layer2::Layer2::new())),
                #[cfg(feature = "mp3")]
                MpegLayer::Layer3 => Some(LayerDecoder::Layer3(crate::layer3::Layer3::new())),
                #[allow(unreachable_patterns)]
                _ => None,
            };
        }

        Ok(())
    }

    /// Decode the current frame into the output buffer. A frame that fails to decode yields
    /// silence of the expected duration so downstream timing is preserved.
    fn decode_current_frame(&mut self) {
        let header = match self.header {
            Some(ref h) => h.clone(),
            None => return,
        };

        self.pcm.clear();

        let result = match self.layer {
            #[cfg(feature = "mp1")]
            Some(LayerDecoder::Layer1(ref mut l)) => l.decode(&self.frame_buf, &header, &mut self.pcm),
            #[cfg(feature = "mp2")]
            Some(LayerDecoder::Layer2(ref mut l)) => l.decode(&self.frame_buf, &header, &mut self.pcm),
            #[cfg(feature = "mp3")]
            Some(LayerDecoder::Layer3(ref mut l)) => l.decode(&self.frame_buf, &header, &mut self.pcm),
            _ => crate::errors::unsupported_error("mpa: no decoder for this layer"),
        };

        if let Err(e) = result {
            self.errors += 1;
            if self.silent_resync == 0 {
                warn!("mpa: frame {} failed to decode: {}", self.num, e);
            }
        }

        self.render_output(&header);

        self.to_decode = false;
        self.to_ignore = false;
    }

    /// Interleave, downsample, and convert the decoded samples to the output encoding, zero
    /// extending to the expected frame duration.
    fn render_output(&mut self, header: &FrameHeader) {
        let channels = self.format.map(|f| f.channels).unwrap_or_else(|| header.n_channels());
        let step = 1usize << self.down_sample;
        let expect = header.samples_per_frame() >> self.down_sample;

        let bytes = expect * channels * 2;
        if self.out_buf.len() < bytes {
            self.out_buf.resize(bytes, 0);
        }

        let decoded = self.pcm.len() / step;
        let unsigned_bias = match self.format.map(|f| f.encoding) {
            Some(Encoding::Unsigned16) => 0x8000u16,
            _ => 0,
        };

        for i in 0..expect {
            for ch in 0..channels {
                let s = if i < decoded { self.pcm.chan(ch)[i * step] } else { 0.0 };

                let v = (s * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
                let v = (v as u16) ^ unsigned_bias;

                let at = (i * channels + ch) * 2;
                self.out_buf[at..at + 2].copy_from_slice(&v.to_ne_bytes());
            }
        }

        self.out_len = bytes;
        self.out_pos = 0;
    }

    /// Feed a skipped frame to the decoder state keeper, so layer 3 reservoir continuity
    /// survives frames that are wound past without full decoding.
    fn frame_skip(&mut self) {
        #[cfg(feature = "mp3")]
        {
            if let (Some(LayerDecoder::Layer3(ref mut l)), Some(ref header)) =
                (&mut self.layer, &self.header)
            {
                if header.layer == MpegLayer::Layer3 {
                    l.prime(&self.frame_buf, header);
                }
            }
        }
    }

    /// Fully reset the decode-side state of the active layer decoder.
    fn reset_layer_state(&mut self) {
        match self.layer {
            #[cfg(feature = "mp1")]
            Some(LayerDecoder::Layer1(ref mut l)) => l.reset(),
            #[cfg(feature = "mp2")]
            Some(LayerDecoder::Layer2(ref mut l)) => l.reset(),
            #[cfg(feature = "mp3")]
            Some(LayerDecoder::Layer3(ref mut l)) => l.reset(),
            _ => (),
        }
    }

    /// Note a loss of stream continuity: carried-over decoder state is invalid.
    pub(crate) fn note_discontinuity(&mut self) {
        #[cfg(feature = "mp3")]
        {
            if let Some(LayerDecoder::Layer3(ref mut l)) = self.layer {
                l.discontinuity();
            }
        }
    }

    // ---- Gapless bookkeeping. ----

    /// Initialize the gapless window from a frame count and encoder delay/padding, in
    /// decoded-domain samples.
    pub(crate) fn gapless_init(&mut self, frame_count: i64, delay: i64, padding: i64) {
        self.gapless_frames = frame_count;

        if self.gapless_frames > 0 && delay >= 0 && padding >= 0 {
            let spf = i64::from(self.samples_per_frame());
            self.begin_s = delay + DECODER_DELAY;
            self.end_s = frame_count * spf - padding + DECODER_DELAY;
        }
        else {
            self.begin_s = 0;
            self.end_s = 0;
        }

        self.begin_os = 0;
        self.end_os = 0;
        self.fullend_os = 0;
    }

    /// Convert the gapless window into output-domain samples.
    fn gapless_realinit(&mut self) {
        self.begin_os = self.ins2outs(self.begin_s);
        self.end_os = self.ins2outs(self.end_s);

        self.fullend_os = if self.gapless_frames > 0 {
            self.ins2outs(self.gapless_frames * i64::from(self.samples_per_frame()))
        }
        else {
            0
        };
    }

    /// Validate the gapless bookkeeping against an actual total sample count.
    pub(crate) fn gapless_update(&mut self, total_samples: i64) {
        if self.gapless_frames < 1 {
            return;
        }

        let gapless_samples = self.gapless_frames * i64::from(self.samples_per_frame());

        if gapless_samples > total_samples {
            warn!(
                "mpa: gapless info covers {} samples but the stream has {}",
                gapless_samples, total_samples
            );
            // The declared window is bogus; drop it.
            self.gapless_init(-1, 0, 0);
            self.gapless_realinit();
            self.last_frame = -1;
            self.last_off = 0;
        }
    }

    fn ins2outs(&self, ins: i64) -> i64 {
        ins >> self.down_sample
    }

    /// Output samples before the given frame number.
    fn frame_outs(&self, frame: i64) -> i64 {
        (i64::from(self.samples_per_frame()) >> self.down_sample) * frame
    }

    /// The frame containing the given output sample offset.
    fn frame_of(&self, outs: i64) -> i64 {
        outs / (i64::from(self.samples_per_frame()) >> self.down_sample)
    }

    /// From an internal output-domain position to the externally visible one: leading delay and
    /// trailing padding do not exist on the outside.
    fn sample_adjust(&self, x: i64) -> i64 {
        if !self.opts.gapless {
            return x;
        }

        if x > self.end_os {
            if x < self.fullend_os {
                self.end_os - self.begin_os
            }
            else {
                x - (self.fullend_os - self.end_os + self.begin_os)
            }
        }
        else {
            x - self.begin_os
        }
    }

    /// The inverse of `sample_adjust`.
    fn sample_unadjust(&self, x: i64) -> i64 {
        if !self.opts.gapless {
            return x;
        }

        let mut s = x + self.begin_os;

        // There are no sample positions inside the trailing padding; jump over it.
        if self.end_os > 0 && s >= self.end_os {
            s += self.fullend_os - self.end_os;
        }

        s
    }

    /// Plan a seek to the given internal output-domain sample position.
    fn set_frame_seek(&mut self, sp: i64) {
        self.first_frame = self.frame_of(sp);

        if self.opts.gapless && self.gapless_frames > 0 {
            // Never start before the start of real audio.
            let begin_frame = self.frame_of(self.begin_os);

            if self.first_frame <= begin_frame {
                self.first_frame = begin_frame;
                self.first_off = self.begin_os - self.frame_outs(begin_frame);
            }
            else {
                self.first_off = sp - self.frame_outs(self.first_frame);
            }

            if self.end_os > 0 {
                self.last_frame = self.frame_of(self.end_os);
                self.last_off = self.end_os - self.frame_outs(self.last_frame);
            }
            else {
                self.last_frame = -1;
                self.last_off = 0;
            }
        }
        else {
            self.first_off = sp - self.frame_outs(self.first_frame);
            self.last_frame = -1;
            self.last_off = 0;
        }

        self.ignore_frame = self.first_frame - self.preframes();
    }

    fn preframes(&self) -> i64 {
        let mut preframes = i64::from(self.opts.preframes);

        if let Some(ref h) = self.header {
            match h.layer {
                // Layer 3 needs at least one frame of history for the bit reservoir.
                MpegLayer::Layer3 => preframes = preframes.max(1),
                // Layers 1 and 2 never benefit from more than two.
                _ => preframes = preframes.min(2),
            }
        }

        preframes
    }

    /// Trim the rendered output at the gapless window edges.
    fn trim_output(&mut self) {
        if !self.flags.contains(StateFlags::ACCURATE) {
            // Without an accurate position gapless trimming would cut at the wrong places.
            return;
        }

        // Streams sometimes grow frames past the declared gapless region (appended data); let
        // those through untouched.
        if self.gapless_frames > 0 && self.num >= self.gapless_frames {
            return;
        }

        let bps = self.bytes_per_sample();

        // Cut from the end first, then from the beginning; that order also works when the first
        // and last frame coincide.
        if self.last_frame > -1 && self.num >= self.last_frame {
            let keep = if self.num == self.last_frame { self.last_off * bps } else { 0 };

            if (self.out_len as i64) > keep {
                self.out_len = keep as usize;
            }
        }

        if self.first_off > 0 && self.num == self.first_frame {
            let cut = self.first_off * bps;

            if (self.out_len as i64) > cut {
                self.out_pos = cut as usize;
            }
            else {
                self.out_len = 0;
            }

            // This frame is only reachable again through a seek, which recomputes the offset.
            self.first_off = 0;
        }
    }

    // ---- Seeking. ----

    fn do_seek(&mut self) -> Result<()> {
        let target = self.ignore_frame.max(0);

        self.out_len = 0;
        self.out_pos = 0;

        // Within the ignore window no repositioning may be needed at all.
        if self.num < self.first_frame {
            self.to_decode = false;
            if self.num > target {
                return Ok(());
            }
        }

        if self.num == target && (self.to_decode || target < self.first_frame) {
            return Ok(());
        }

        if self.num == target - 1 {
            self.to_decode = false;
            return Ok(());
        }

        // A real jump follows: carried-over synthesis and reservoir state is stale.
        self.reset_layer_state();

        self.seek_to_frame(target)?;

        if self.header_change > 1 {
            self.update_format()?;
            self.header_change = 0;
        }

        if self.num < self.first_frame {
            self.to_decode = false;
        }

        Ok(())
    }

    /// Position the stream so that the next `read_frame` returns the given frame number, using
    /// the frame index when possible and fuzzy estimation otherwise.
    fn seek_to_frame(&mut self, new_frame: i64) -> Result<()> {
        let (pre_frame, seek_to) = self.find_seek_position(new_frame as u64);

        if self.num >= new_frame || self.num < pre_frame as i64 {
            match self.reader.seek_to(seek_to)? {
                Step::Ready(_) => (),
                Step::NeedMore => {
                    return seek_error(SeekErrorKind::ForwardOnly);
                }
                Step::Eof => return seek_error(SeekErrorKind::OutOfRange),
            }

            // The next frame read is pre_frame.
            self.num = pre_frame as i64 - 1;
            self.note_discontinuity();
        }

        while self.num < new_frame {
            match self.read_frame()? {
                Step::Ready(()) => (),
                _ => break,
            }
        }

        Ok(())
    }

    /// Choose the frame to restart decoding from and its byte position.
    fn find_seek_position(&mut self, want_frame: u64) -> (u64, u64) {
        if !self.index.is_empty() {
            // Prefer a fuzzy estimate over a long forward walk past the end of the index.
            if self.opts.fuzzy_seek && self.index.far_beyond(want_frame) {
                if let Some(hit) = self.fuzzy_find(want_frame) {
                    return hit;
                }
            }

            if let Some((frame, pos)) = self.index.find(want_frame) {
                self.flags.insert(StateFlags::ACCURATE);
                return (frame, pos);
            }
        }

        if self.opts.fuzzy_seek {
            if let Some(hit) = self.fuzzy_find(want_frame) {
                return hit;
            }
        }

        // Start over from the very beginning and parse from scratch.
        self.first_head = 0;
        self.old_head = 0;
        (0, self.audio_start)
    }

    /// Estimate a byte position for a frame from the seek TOC or the mean frame size. The
    /// position becomes inaccurate and one resync failure is forgiven.
    fn fuzzy_find(&mut self, want_frame: u64) -> Option<(u64, u64)> {
        let toc = self.info.as_ref().and_then(|i| i.toc);

        if let (Some(toc), true, Some(len)) =
            (toc, self.track_frames > 0, self.reader.stream_len())
        {
            // The TOC is indexed by percentage of total time, valued in 1/256ths of the total
            // length. Whether that length includes leading tag data is underspecified, so the
            // result is an estimate at best.
            let entry = ((want_frame as f64) * 100.0 / self.track_frames as f64) as usize;
            let entry = entry.min(99);

            let get_frame = ((entry as f64) / 100.0 * self.track_frames as f64) as u64;

            self.flags.remove(StateFlags::ACCURATE);
            self.silent_resync = 1;

            debug!("fuzzy seek via TOC entry {} to frame ~{}", entry, get_frame);

            let pos = (f64::from(toc[entry]) / 256.0 * len as f64) as u64;
            return Some((get_frame, pos));
        }

        if self.mean_frame_size > 0.0 {
            self.flags.remove(StateFlags::ACCURATE);
            self.silent_resync = 1;

            let pos = self.audio_start + (self.mean_frame_size * want_frame as f64) as u64;
            return Some((want_frame, pos));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_gapless_adjust_roundtrip() {
        let mut dec = Decoder::open_feed(Options::default());

        // A 3-frame gapless stream with 576 delay and 600 padding samples.
        dec.header = Some(crate::header::parse_frame_header(0xfffb_9000).unwrap());
        dec.gapless_init(3, 576, 600);
        dec.gapless_realinit();

        assert_eq!(dec.begin_s, 576 + 529);
        assert_eq!(dec.end_s, 3 * 1152 - 600 + 529);

        // Adjusted position 0 is the first audible sample.
        assert_eq!(dec.sample_adjust(dec.begin_os), 0);
        for &pos in &[0i64, 100, 1000, 1151] {
            assert_eq!(dec.sample_adjust(dec.sample_unadjust(pos)), pos);
        }

        // Positions inside the trailing padding collapse onto the stream end.
        let length = dec.end_os - dec.begin_os;
        assert_eq!(dec.sample_adjust(dec.end_os + 10), length);
    }

    #[test]
    fn verify_set_frame_seek() {
        let mut dec = Decoder::open_feed(Options::default());

        dec.header = Some(crate::header::parse_frame_header(0xfffb_9000).unwrap());
        dec.gapless_init(100, 576, 288);
        dec.gapless_realinit();

        // A seek to output sample 0 starts at the frame containing the delay.
        dec.set_frame_seek(dec.sample_unadjust(0));
        assert_eq!(dec.first_frame, (576 + 529) / 1152);
        assert_eq!(dec.first_off, 576 + 529 - dec.first_frame * 1152);
        // At least one preframe for layer 3.
        assert!(dec.ignore_frame < dec.first_frame);
    }
}
