// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `parse` module implements the frame-locating state machine: header validation, junk and
//! tag skipping, resynchronization, free-format size inference, and the one-frame look-ahead
//! check, feeding validated frame bodies to the decode stage.

use crate::common::{FrameHeader, MpegLayer};
use crate::decoder::{Decoder, StateFlags};
use crate::errors::{limit_error, Result};
use crate::header;
use crate::reader::Step;
use crate::tags;

use log::{debug, info, warn};

/// Skipping scans release buffered input every this many shifted bytes, so a long resync over a
/// feed stream does not pin every dead byte in memory.
const FORGET_INTERVAL: u32 = 1024;

/// Junk at the start of a stream is tolerated up to this many bytes, unless the configured
/// resync limit asks for more.
const INITIAL_JUNK_LIMIT: i64 = 65536;

/// The parser states. A frame read walks `ReadHeader` to `ReadBody`, detouring through the junk,
/// salvage, and look-ahead states as the data demands.
enum ParseState {
    /// Read the next 32-bit candidate header word.
    ReadHeader,
    /// Decide what the candidate word is: a frame header, leading junk, or mid-stream garbage.
    Evaluate(u32),
    /// Before the first frame: identify and skip tags, wrappers, and arbitrary junk.
    SkipJunk(u32),
    /// After losing sync: skip tags and shift byte-by-byte until something header-like appears.
    Salvage(u32),
    /// Validate a candidate first frame by peeking the header that should follow it.
    ReadAhead(u32, FrameHeader),
    /// Read the frame body and commit.
    ReadBody(u32, FrameHeader),
}

/// Outcome of decoding a candidate header word.
enum HeaderCheck {
    /// The header is usable and fully sized.
    Good(FrameHeader),
    /// The header is not usable; resynchronize.
    Bad,
}

impl Decoder {
    /// Locate, validate, and read the next frame in the stream, leaving its header and body in
    /// the handle. `Ready` means a frame is pending decode; `Eof` means the stream ended
    /// cleanly; `NeedMore` (feed mode) means the attempt must be repeated after more input, with
    /// no bytes lost.
    pub(crate) fn read_frame(&mut self) -> Result<Step<()>> {
        let mut freeformat_tries = 0u32;
        let mut junk_count: i64 = 0;

        let mut state = ParseState::ReadHeader;

        loop {
            state = match state {
                ParseState::ReadHeader => {
                    // Discard buffered bytes behind the current position. This both bounds feed
                    // memory and commits the position a failed parse will retry from.
                    self.reader.forget();

                    match self.reader.head_read()? {
                        Step::Ready(head) => ParseState::Evaluate(head),
                        Step::NeedMore => return Ok(Step::NeedMore),
                        Step::Eof => return Ok(Step::Eof),
                    }
                }

                ParseState::Evaluate(head) => {
                    if !header::check_header(head) {
                        if self.first_head == 0 {
                            ParseState::SkipJunk(head)
                        }
                        else {
                            ParseState::Salvage(head)
                        }
                    }
                    else {
                        match self.try_decode_header(head, &mut freeformat_tries)? {
                            Step::Ready(HeaderCheck::Good(fh)) => {
                                if self.first_head == 0 {
                                    ParseState::ReadAhead(head, fh)
                                }
                                else {
                                    ParseState::ReadBody(head, fh)
                                }
                            }
                            Step::Ready(HeaderCheck::Bad) => ParseState::Salvage(head),
                            Step::NeedMore => return Ok(Step::NeedMore),
                            Step::Eof => return Ok(Step::Eof),
                        }
                    }
                }

                ParseState::SkipJunk(head) => {
                    match self.skip_junk(head, &mut junk_count, &mut freeformat_tries)? {
                        Step::Ready(next) => next,
                        Step::NeedMore => return Ok(Step::NeedMore),
                        Step::Eof => return Ok(Step::Eof),
                    }
                }

                ParseState::Salvage(head) => match self.salvage(head)? {
                    Step::Ready(next) => next,
                    Step::NeedMore => return Ok(Step::NeedMore),
                    Step::Eof => return Ok(Step::Eof),
                },

                ParseState::ReadAhead(head, fh) => match self.read_ahead(head, &fh)? {
                    Step::Ready(None) => ParseState::ReadBody(head, fh),
                    Step::Ready(Some(next)) => next,
                    Step::NeedMore => return Ok(Step::NeedMore),
                    Step::Eof => return Ok(Step::Eof),
                },

                ParseState::ReadBody(head, fh) => match self.read_body(head, fh)? {
                    Step::Ready(true) => return Ok(Step::Ready(())),
                    // The frame turned out to be stream metadata; start over behind it.
                    Step::Ready(false) => ParseState::ReadHeader,
                    Step::NeedMore => return Ok(Step::NeedMore),
                    Step::Eof => return Ok(Step::Eof),
                },
            }
        }
    }

    /// Parse and size a candidate header word, inferring the frame size of free-format streams.
    fn try_decode_header(
        &mut self,
        head: u32,
        freeformat_tries: &mut u32,
    ) -> Result<Step<HeaderCheck>> {
        let mut fh = match header::parse_frame_header(head) {
            Ok(fh) => fh,
            Err(_) => return Ok(Step::Ready(HeaderCheck::Bad)),
        };

        if fh.is_free_format {
            match self.freeformat_size {
                // Free format is constant-size; once learned, the size is reused.
                Some(size) => fh.frame_size = size + usize::from(fh.has_padding),
                None => {
                    *freeformat_tries += 1;
                    if *freeformat_tries > 5 {
                        info!("mpa: free format frame size inference failed");
                        return Ok(Step::Ready(HeaderCheck::Bad));
                    }

                    match self.guess_freeformat_size(head)? {
                        Step::Ready(Some(size)) => {
                            debug!("mpa: inferred free format frame size {}", size);
                            fh.frame_size = size;
                            self.freeformat_size = Some(size - usize::from(fh.has_padding));
                        }
                        Step::Ready(None) => return Ok(Step::Ready(HeaderCheck::Bad)),
                        Step::NeedMore => return Ok(Step::NeedMore),
                        Step::Eof => return Ok(Step::Eof),
                    }
                }
            }
        }

        if fh.frame_size > header::MAX_FRAME_SIZE {
            return Ok(Step::Ready(HeaderCheck::Bad));
        }

        Ok(Step::Ready(HeaderCheck::Good(fh)))
    }

    /// Infer the body size of a free-format frame by scanning ahead for the next header with
    /// identical constant fields. The reader position is restored.
    fn guess_freeformat_size(&mut self, head: u32) -> Result<Step<Option<usize>>> {
        let mut next = match self.reader.head_read()? {
            Step::Ready(next) => next,
            Step::NeedMore => return Ok(Step::NeedMore),
            Step::Eof => return Ok(Step::Eof),
        };

        // Four bytes in already; scan at most a maximum frame further.
        for i in 4..header::MAX_FRAME_SIZE + 4 {
            match self.reader.head_shift(&mut next)? {
                Step::Ready(()) => (),
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            }

            // The constant-field mask covers everything a header check would.
            if next & header::SAME_MASK == head & header::SAME_MASK {
                self.reader.back_bytes((i + 1) as i64)?;
                return Ok(Step::Ready(Some(i - 3)));
            }
        }

        self.reader.back_bytes((header::MAX_FRAME_SIZE + 4) as i64)?;

        Ok(Step::Ready(None))
    }

    /// Shift one byte into the candidate header word, periodically releasing buffered input.
    fn forget_head_shift(
        &mut self,
        head: &mut u32,
        forget_count: &mut u32,
    ) -> Result<Step<()>> {
        match self.reader.head_shift(head)? {
            Step::Ready(()) => (),
            other => return Ok(other),
        }

        *forget_count += 1;

        if *forget_count >= FORGET_INTERVAL {
            *forget_count = 0;

            // Keep the last 4 bytes so the candidate word can be re-read on retry.
            if self.reader.back_bytes(4).is_ok() {
                self.reader.forget();
                match self.reader.skip_bytes(4)? {
                    Step::Ready(_) => (),
                    other => return Ok(other.map(|_| ())),
                }
            }
        }

        Ok(Step::Ready(()))
    }

    /// Handle non-header data before the first frame: ID3v2 tags, RIFF wrappers, or plain junk.
    fn skip_junk(
        &mut self,
        head: u32,
        junk_count: &mut i64,
        freeformat_tries: &mut u32,
    ) -> Result<Step<ParseState>> {
        if tags::is_id3v2(head) {
            self.old_head = 0;
            return match tags::skip_id3v2(&mut self.reader)? {
                // Even a tag that failed to parse fully restarts the scan; whatever was skipped
                // was not frame data.
                Step::Ready(_) => Ok(Step::Ready(ParseState::ReadHeader)),
                Step::NeedMore => Ok(Step::NeedMore),
                Step::Eof => Ok(Step::Eof),
            };
        }

        // Some streams open with a RIFF/WAVE wrapper; skip to its data chunk.
        if tags::is_riff(head) {
            debug!("mpa: skipping RIFF wrapper");

            let mut word = match self.reader.head_read()? {
                Step::Ready(w) => w,
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            };

            let mut forget_count = 0;

            while word != u32::from_be_bytes(*b"data") {
                match self.forget_head_shift(&mut word, &mut forget_count)? {
                    Step::Ready(()) => (),
                    Step::NeedMore => return Ok(Step::NeedMore),
                    Step::Eof => return Ok(Step::Eof),
                }
            }

            // Consume the chunk length; frame data follows.
            match self.reader.head_read()? {
                Step::Ready(_) => (),
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            }

            self.old_head = 0;
            return Ok(Step::Ready(ParseState::ReadHeader));
        }

        // Arbitrary junk: advance byte-by-byte until something decodes as a header.
        let mut limit = INITIAL_JUNK_LIMIT;
        if self.opts.resync_limit < 0 || self.opts.resync_limit > limit {
            limit = self.opts.resync_limit;
        }

        let mut head = head;
        let mut forget_count = 0;

        loop {
            *junk_count += 1;

            // Unlike a mid-stream resync, exhausting the search before any frame was found is a
            // clean "no audio here", not a stream error.
            if limit >= 0 && *junk_count >= limit {
                return Ok(Step::Eof);
            }

            match self.forget_head_shift(&mut head, &mut forget_count)? {
                Step::Ready(()) => (),
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            }

            if !header::check_header(head) {
                continue;
            }

            // ID3v2 tags may also follow junk.
            if tags::is_id3v2(head) {
                return Ok(Step::Ready(ParseState::SkipJunk(head)));
            }

            match self.try_decode_header(head, freeformat_tries)? {
                Step::Ready(HeaderCheck::Good(fh)) => {
                    return Ok(Step::Ready(ParseState::ReadAhead(head, fh)));
                }
                Step::Ready(HeaderCheck::Bad) => continue,
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            }
        }
    }

    /// Handle garbage where a frame header was expected mid-stream: mid-stream tags are
    /// consumed; anything else starts a bounded byte-by-byte resynchronization.
    fn salvage(&mut self, head: u32) -> Result<Step<ParseState>> {
        // A classic 128-byte ID3v1 tag; its first 4 bytes are already consumed.
        if tags::is_id3v1(head) {
            let mut tag = [0u8; 124];
            return match self.reader.read_exact(&mut tag)? {
                Step::Ready(()) => Ok(Step::Ready(ParseState::ReadHeader)),
                Step::NeedMore => Ok(Step::NeedMore),
                Step::Eof => Ok(Step::Eof),
            };
        }

        if tags::is_id3v2(head) {
            self.old_head = 0;
            return match tags::skip_id3v2(&mut self.reader)? {
                Step::Ready(_) => Ok(Step::Ready(ParseState::ReadHeader)),
                Step::NeedMore => Ok(Step::NeedMore),
                Step::Eof => Ok(Step::Eof),
            };
        }

        // Sync was lost, so any carried-over decoder state is now meaningless.
        self.note_discontinuity();

        if self.silent_resync > 0 {
            self.silent_resync -= 1;
        }
        else {
            warn!("mpa: lost sync at frame {}, resynchronizing", self.num + 1);
        }

        let limit = self.opts.resync_limit;

        let mut head = head;
        let mut tries: i64 = 0;
        let mut forget_count = 0;

        loop {
            tries += 1;

            if limit >= 0 && tries >= limit {
                return limit_error("mpa: resynchronization byte limit exceeded");
            }

            match self.forget_head_shift(&mut head, &mut forget_count)? {
                Step::Ready(()) => (),
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Eof => return Ok(Step::Eof),
            }

            if header::check_header(head) {
                break;
            }
        }

        self.old_head = 0;

        Ok(Step::Ready(ParseState::Evaluate(head)))
    }

    /// Peek the header that should follow the candidate first frame. An absent or incompatible
    /// follower invalidates the candidate, restarting the search one byte further on. Returns
    /// `Ready(None)` when the candidate holds.
    fn read_ahead(&mut self, head: u32, fh: &FrameHeader) -> Result<Step<Option<ParseState>>> {
        let start = self.reader.tell();

        match self.reader.skip_bytes(fh.frame_size as i64)? {
            Step::Ready(_) => (),
            Step::NeedMore => return Ok(Step::NeedMore),
            Step::Eof => return Ok(Step::Eof),
        }

        let next = match self.reader.head_read()? {
            Step::Ready(next) => {
                // Rewind to the candidate frame body.
                let now = self.reader.tell();
                self.reader.back_bytes((now - start) as i64)?;
                next
            }
            // A feed shortfall has already rolled the cursor back to the retry point.
            Step::NeedMore => return Ok(Step::NeedMore),
            Step::Eof => {
                let now = self.reader.tell();
                self.reader.back_bytes((now - start) as i64)?;
                return Ok(Step::Eof);
            }
        };

        if !header::check_header(next) || !header::compatible(head, next) {
            debug!("mpa: look-ahead rejected candidate header {:#010x}", head);

            self.old_head = 0;

            // Resume the header search from the byte after the candidate's sync start.
            self.reader.back_bytes(3)?;

            return Ok(Step::Ready(Some(ParseState::ReadHeader)));
        }

        Ok(Step::Ready(None))
    }

    /// Read the frame body and update stream bookkeeping. Returns false when the frame carried
    /// stream metadata instead of audio.
    fn read_body(&mut self, head: u32, fh: FrameHeader) -> Result<Step<bool>> {
        let frame_pos = self.reader.tell() - header::MPEG_HEADER_LEN as u64;

        self.frame_buf.resize(fh.frame_size, 0);

        match self.reader.read_exact(&mut self.frame_buf)? {
            Step::Ready(()) => (),
            Step::NeedMore => return Ok(Step::NeedMore),
            Step::Eof => return Ok(Step::Eof),
        }

        // The header is live state from here on: length and gapless bookkeeping depend on the
        // frame's samples-per-frame.
        self.header = Some(fh.clone());

        if self.first_head == 0 {
            self.first_head = head;

            // Only the very first frame of the stream may carry an information tag; after
            // resyncs and seeks the stream is already known.
            if self.num < 0 {
                self.audio_start = frame_pos;

                if fh.layer == MpegLayer::Layer3 && !self.opts.ignore_lame_tag {
                    if self.take_info_tag(&fh) {
                        self.reader.forget();
                        self.old_head = 0;
                        return Ok(Step::Ready(false));
                    }
                }
            }
        }

        // Track the mean frame size for fuzzy seeking.
        self.mean_frames += 1;
        self.mean_frame_size = ((self.mean_frames - 1) as f64 * self.mean_frame_size
            + (fh.frame_size + header::MPEG_HEADER_LEN) as f64)
            / self.mean_frames as f64;

        self.num += 1;

        // Frames beyond the declared length belong to something appended to the stream.
        if !self.flags.contains(StateFlags::CONCATENATED)
            && ((self.track_frames > 0 && self.num >= self.track_frames as i64)
                || (self.gapless_frame_count() > 0 && self.num >= self.gapless_frame_count()))
        {
            self.flags.insert(StateFlags::CONCATENATED);
        }

        if self.flags.contains(StateFlags::ACCURATE) && self.index.wants(self.num as u64) {
            self.index.add(frame_pos);
        }

        if self.silent_resync > 0 {
            self.silent_resync -= 1;
        }

        self.reader.forget();

        self.to_decode = true;
        self.to_ignore = true;

        // Classify the header against its predecessor: identical, compatible (same decode
        // routines), or incompatible (a concatenated stream).
        if self.header_change < 2 {
            self.header_change = 2;

            if self.old_head != 0 {
                if self.old_head == head {
                    self.header_change = 0;
                }
                else if header::compatible(self.old_head, head) {
                    self.header_change = 1;
                }
                else {
                    self.flags.insert(StateFlags::CONCATENATED);
                }
            }
            else if self.first_head != 0 && !header::compatible(self.first_head, head) {
                self.flags.insert(StateFlags::CONCATENATED);
            }
        }

        self.old_head = head;

        Ok(Step::Ready(true))
    }

    /// Check the first frame for a Xing/Info/LAME tag. When one is found the stream information
    /// is recorded and true is returned; the frame carries no audio.
    fn take_info_tag(&mut self, fh: &FrameHeader) -> bool {
        let body =
            if fh.has_crc { self.frame_buf.get(2..).unwrap_or(&[]) } else { &self.frame_buf };

        let tag = match tags::check_info_tag(body, fh) {
            Some(tag) => tag,
            None => return false,
        };

        debug!(
            "mpa: {:?} stream, {:?} frames, {:?} bytes",
            tag.vbr, tag.total_frames, tag.total_bytes
        );

        if !self.opts.ignore_length_info {
            if let Some(frames) = tag.total_frames {
                // An impossibly large count marks an endless stream.
                if frames < u64::MAX / 4 / 1152 {
                    self.track_frames = frames;

                    if self.opts.gapless {
                        self.gapless_init(frames as i64, 0, 0);
                    }
                }
            }

            if let Some(bytes) = tag.total_bytes {
                // The byte count spans from the tag frame onward; leading tag data is excluded.
                self.reader.set_stream_len(bytes + self.audio_start);
            }
        }

        if self.opts.gapless {
            if let (Some(delay), Some(padding)) = (tag.encoder_delay, tag.encoder_padding) {
                self.gapless_init(
                    self.track_frames as i64,
                    i64::from(delay),
                    i64::from(padding),
                );
            }
        }

        self.info = Some(tag);

        true
    }

    fn gapless_frame_count(&self) -> i64 {
        if self.opts.gapless {
            self.info
                .as_ref()
                .and_then(|i| i.total_frames)
                .map(|f| f as i64)
                .unwrap_or(0)
        }
        else {
            0
        }
    }
}
