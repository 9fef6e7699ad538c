// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `reader` module unifies the three input modes — direct seekable stream, buffered stream,
//! and push-feed — behind one operation set.

use std::io;
use std::io::{Read, Seek, SeekFrom};

use crate::errors::{seek_error, Result, SeekErrorKind};

mod chain;

pub(crate) use chain::BufferChain;

/// The outcome of a reader operation that may have to wait for input or may hit the end of the
/// stream. These are three distinct conditions and are never conflated with I/O errors.
#[derive(Debug)]
pub(crate) enum Step<T> {
    /// The operation completed.
    Ready(T),
    /// More input must be fed before the operation can complete. Only returned in feed mode.
    NeedMore,
    /// The logical end of the stream was reached.
    Eof,
}

/// `MediaSource` is a `Read` + `Seek` byte source for the decoder.
pub trait MediaSource: Read + Seek + Send {
    /// Returns if the source is seekable. This may be an expensive operation.
    fn is_seekable(&self) -> bool;

    /// Returns the length in bytes, if available. This may be an expensive operation.
    fn byte_len(&self) -> Option<u64>;
}

impl MediaSource for std::fs::File {
    fn is_seekable(&self) -> bool {
        self.metadata().map(|m| m.is_file()).unwrap_or(false)
    }

    fn byte_len(&self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }
}

impl<T: AsRef<[u8]> + Send> MediaSource for io::Cursor<T> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

/// `ReadOnlySource` wraps any source implementing `Read` in an unseekable `MediaSource`.
pub struct ReadOnlySource<R: Read> {
    inner: R,
}

impl<R: Read + Send> ReadOnlySource<R> {
    /// Instantiates a new `ReadOnlySource` by taking ownership and wrapping the provided `Read`er.
    pub fn new(inner: R) -> Self {
        ReadOnlySource { inner }
    }

    /// Unwraps this `ReadOnlySource`, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> Read for ReadOnlySource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Seek for ReadOnlySource<R> {
    fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Other, "source does not support seeking"))
    }
}

impl<R: Read + Send> MediaSource for ReadOnlySource<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

enum Mode {
    /// Directly backed by a seekable source.
    Stream(Box<dyn MediaSource>),
    /// Backed by a non-seekable source with a read-ahead chain for peeking and limited back-up.
    Buffered(Box<dyn MediaSource>, BufferChain),
    /// The caller pushes chunks; reads never block for I/O.
    Feed(BufferChain),
}

/// The unified reader over one of the three input modes.
pub(crate) struct Reader {
    mode: Mode,
    /// Position in the stream for direct mode; buffered modes derive it from the chain.
    pos: u64,
    /// Total stream length, if known. Trailing ID3v1 data is excluded.
    len: Option<u64>,
}

impl Reader {
    /// Open a reader over a byte source. Seekable sources are read directly; unseekable sources
    /// get a read-ahead buffer so the parser can peek and back up.
    pub fn open(mut src: Box<dyn MediaSource>, pool: usize, chunk: usize) -> Result<Reader> {
        if src.is_seekable() {
            let len = probe_len(src.as_mut())?;
            Ok(Reader { mode: Mode::Stream(src), pos: 0, len })
        }
        else {
            let chain = BufferChain::new(pool, chunk);
            Ok(Reader { mode: Mode::Buffered(src, chain), pos: 0, len: None })
        }
    }

    /// Open a reader in feed mode.
    pub fn open_feed(pool: usize, chunk: usize) -> Reader {
        Reader { mode: Mode::Feed(BufferChain::new(pool, chunk)), pos: 0, len: None }
    }

    pub fn is_feed(&self) -> bool {
        matches!(self.mode, Mode::Feed(_))
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self.mode, Mode::Stream(_))
    }

    /// Total stream length in bytes, if known.
    pub fn stream_len(&self) -> Option<u64> {
        self.len
    }

    /// Override the known stream length (e.g. from length metadata on an unseekable stream).
    pub fn set_stream_len(&mut self, len: u64) {
        if self.len.is_none() {
            self.len = Some(len);
        }
    }

    /// Push input bytes. Valid in feed mode only.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        match self.mode {
            Mode::Feed(ref mut chain) => {
                chain.append(data);
                Ok(())
            }
            _ => Err(crate::errors::Error::InvalidOperation("mpa: reader is not in feed mode")),
        }
    }

    /// Current absolute byte position.
    pub fn tell(&self) -> u64 {
        match self.mode {
            Mode::Stream(_) => self.pos,
            Mode::Buffered(_, ref chain) | Mode::Feed(ref chain) => chain.tell(),
        }
    }

    /// Ensure the chain holds at least `count` readable bytes, pulling from the inner source in
    /// buffered mode. Returns the number of bytes actually available.
    fn buffer_up(&mut self, count: usize) -> Result<usize> {
        if let Mode::Buffered(ref mut src, ref mut chain) = self.mode {
            let mut scratch = [0u8; 4096];
            while chain.fill() < count {
                let n = src.read(&mut scratch)?;
                if n == 0 {
                    break;
                }
                chain.append(&scratch[..n]);
            }
            Ok(chain.fill())
        }
        else if let Mode::Feed(ref chain) = self.mode {
            Ok(chain.fill())
        }
        else {
            unreachable!()
        }
    }

    /// Read exactly `out.len()` bytes.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<Step<()>> {
        match self.mode {
            Mode::Stream(ref mut src) => {
                let mut done = 0;
                while done < out.len() {
                    let n = src.read(&mut out[done..])?;
                    if n == 0 {
                        // A short read is a logical end of stream, not an error.
                        return Ok(Step::Eof);
                    }
                    done += n;
                    self.pos += n as u64;
                }
                Ok(Step::Ready(()))
            }
            Mode::Buffered(..) => {
                let have = self.buffer_up(out.len())?;
                if have < out.len() {
                    return Ok(Step::Eof);
                }
                match self.mode {
                    Mode::Buffered(_, ref mut chain) => Ok(chain.give(out).map(|_| ())),
                    _ => unreachable!(),
                }
            }
            Mode::Feed(ref mut chain) => Ok(chain.give(out).map(|_| ())),
        }
    }

    /// Read a 32-bit big-endian frame header word.
    pub fn head_read(&mut self) -> Result<Step<u32>> {
        let mut buf = [0u8; 4];
        match self.read_exact(&mut buf)? {
            Step::Ready(()) => Ok(Step::Ready(u32::from_be_bytes(buf))),
            Step::NeedMore => Ok(Step::NeedMore),
            Step::Eof => Ok(Step::Eof),
        }
    }

    /// Shift one byte into the given header word.
    pub fn head_shift(&mut self, head: &mut u32) -> Result<Step<()>> {
        let mut buf = [0u8; 1];
        match self.read_exact(&mut buf)? {
            Step::Ready(()) => {
                *head = (*head << 8) | u32::from(buf[0]);
                Ok(Step::Ready(()))
            }
            Step::NeedMore => Ok(Step::NeedMore),
            Step::Eof => Ok(Step::Eof),
        }
    }

    /// Skip bytes forward or backward, returning the new absolute position.
    pub fn skip_bytes(&mut self, count: i64) -> Result<Step<u64>> {
        match self.mode {
            Mode::Stream(ref mut src) => {
                let target = self.pos as i64 + count;
                if target < 0 {
                    return seek_error(SeekErrorKind::OutOfRange);
                }
                self.pos = src.seek(SeekFrom::Start(target as u64))?;
                Ok(Step::Ready(self.pos))
            }
            Mode::Buffered(..) => {
                if count >= 0 {
                    // Forward skips read through the source so unseekable streams still work.
                    let have = self.buffer_up(count as usize)?;
                    let n = have.min(count as usize);
                    if let Mode::Buffered(_, ref mut chain) = self.mode {
                        match chain.skip(n) {
                            Step::Ready(pos) => Ok(Step::Ready(pos)),
                            _ => unreachable!(),
                        }
                    }
                    else {
                        unreachable!()
                    }
                }
                else if let Mode::Buffered(_, ref mut chain) = self.mode {
                    if chain.seek_back((-count) as usize) {
                        Ok(Step::Ready(chain.tell()))
                    }
                    else {
                        seek_error(SeekErrorKind::OutOfRange)
                    }
                }
                else {
                    unreachable!()
                }
            }
            Mode::Feed(ref mut chain) => {
                if count >= 0 {
                    Ok(chain.skip(count as usize))
                }
                else if chain.seek_back((-count) as usize) {
                    Ok(Step::Ready(chain.tell()))
                }
                else {
                    seek_error(SeekErrorKind::OutOfRange)
                }
            }
        }
    }

    /// Undo reading of `count` bytes. Used for resync probing.
    pub fn back_bytes(&mut self, count: i64) -> Result<()> {
        match self.skip_bytes(-count)? {
            Step::Ready(_) => Ok(()),
            // Backward movement never waits for input.
            _ => seek_error(SeekErrorKind::OutOfRange),
        }
    }

    /// Seek to an absolute byte position.
    pub fn seek_to(&mut self, pos: u64) -> Result<Step<u64>> {
        let delta = pos as i64 - self.tell() as i64;
        self.skip_bytes(delta)
    }

    /// Release buffered bytes that are no longer needed. A no-op in direct mode.
    pub fn forget(&mut self) {
        match self.mode {
            Mode::Buffered(_, ref mut chain) | Mode::Feed(ref mut chain) => chain.forget(),
            Mode::Stream(_) => (),
        }
    }

    /// Declare the position of upcoming feed input (feed mode only). Returns the offset at which
    /// the next appended byte is expected.
    pub fn feed_set_pos(&mut self, pos: u64) -> Result<u64> {
        match self.mode {
            Mode::Feed(ref mut chain) => Ok(chain.set_pos(pos)),
            _ => Err(crate::errors::Error::InvalidOperation("mpa: reader is not in feed mode")),
        }
    }
}

impl<T> Step<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Step<U> {
        match self {
            Step::Ready(v) => Step::Ready(f(v)),
            Step::NeedMore => Step::NeedMore,
            Step::Eof => Step::Eof,
        }
    }
}

/// Determine the stream length of a seekable source, excluding any trailing 128-byte ID3v1 tag.
fn probe_len(src: &mut dyn MediaSource) -> Result<Option<u64>> {
    let mut len = match src.byte_len() {
        Some(len) => len,
        None => src.seek(SeekFrom::End(0))?,
    };

    if len >= 128 {
        let mut tail = [0u8; 3];
        src.seek(SeekFrom::End(-128))?;
        src.read_exact(&mut tail).map_err(crate::errors::Error::IoError)?;
        if &tail == b"TAG" {
            len -= 128;
        }
    }

    src.seek(SeekFrom::Start(0))?;

    Ok(Some(len))
}
