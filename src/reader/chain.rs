// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `chain` module implements the chunked byte FIFO backing the feed and buffered readers.

use std::collections::VecDeque;

use super::Step;

/// One chunk of buffered input. The capacity of `data` is fixed at allocation; `len` is the
/// number of valid bytes.
struct Chunk {
    data: Box<[u8]>,
    len: usize,
}

impl Chunk {
    fn new(size: usize) -> Chunk {
        Chunk { data: vec![0u8; size].into_boxed_slice(), len: 0 }
    }
}

/// `BufferChain` is an ordered list of variable-fill chunks holding unconsumed input bytes,
/// backed by a bounded pool of spare chunks.
///
/// The chain distinguishes a *read* position (`pos`) from a *committed* position (`first_pos`).
/// Reads advance `pos` without releasing data, so a parse that runs out of input can be rolled
/// back and retried byte-exactly once more data arrives. `forget` commits the consumed range and
/// recycles fully-consumed chunks into the pool.
pub struct BufferChain {
    chunks: VecDeque<Chunk>,
    pool: Vec<Chunk>,
    pool_size: usize,
    chunk_size: usize,
    /// Total valid bytes across all chunks.
    size: usize,
    /// Read cursor, relative to the first chunk. Invariant: `pos <= size`.
    pos: usize,
    /// Last committed cursor. Invariant: `first_pos <= pos`.
    first_pos: usize,
    /// Absolute stream offset of the first byte of the first chunk.
    file_off: u64,
}

impl BufferChain {
    pub fn new(pool_size: usize, chunk_size: usize) -> BufferChain {
        let mut chain = BufferChain {
            chunks: VecDeque::new(),
            pool: Vec::new(),
            pool_size,
            chunk_size: chunk_size.max(1),
            size: 0,
            pos: 0,
            first_pos: 0,
            file_off: 0,
        };
        chain.fill_pool();
        chain
    }

    fn fill_pool(&mut self) {
        while self.pool.len() > self.pool_size {
            self.pool.pop();
        }
        while self.pool.len() < self.pool_size {
            let size = self.chunk_size;
            self.pool.push(Chunk::new(size));
        }
    }

    fn alloc(&mut self) -> Chunk {
        match self.pool.pop() {
            Some(mut chunk) => {
                chunk.len = 0;
                chunk
            }
            None => Chunk::new(self.chunk_size),
        }
    }

    fn release(&mut self, chunk: Chunk) {
        if self.pool.len() < self.pool_size {
            self.pool.push(chunk);
        }
    }

    /// Bytes available to read without more input.
    pub fn fill(&self) -> usize {
        self.size - self.pos
    }

    /// Absolute stream offset of the read cursor.
    pub fn tell(&self) -> u64 {
        self.file_off + self.pos as u64
    }

    /// Absolute stream offset at which the next appended byte will land.
    pub fn end(&self) -> u64 {
        self.file_off + self.size as u64
    }

    /// Append bytes, filling the tail chunk before allocating new ones.
    pub fn append(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let need_chunk = match self.chunks.back() {
                Some(last) => last.len == last.data.len(),
                None => true,
            };

            if need_chunk {
                let chunk = self.alloc();
                self.chunks.push_back(chunk);
            }

            let last = self.chunks.back_mut().unwrap();
            let part = (last.data.len() - last.len).min(data.len());
            last.data[last.len..last.len + part].copy_from_slice(&data[..part]);
            last.len += part;
            self.size += part;
            data = &data[part..];
        }
    }

    /// Copy `out.len()` bytes at the cursor, advancing it but releasing nothing.
    ///
    /// On shortfall the cursor is rolled back to the last committed position so that the caller
    /// re-parses cleanly after the next `append`.
    pub fn give(&mut self, out: &mut [u8]) -> Step<()> {
        if self.fill() < out.len() {
            return self.need_more();
        }

        // Locate the chunk containing the cursor.
        let mut offset = 0;
        let mut got = 0;

        for chunk in self.chunks.iter() {
            if offset + chunk.len <= self.pos {
                offset += chunk.len;
                continue;
            }

            let local = self.pos - offset;
            let part = (chunk.len - local).min(out.len() - got);
            out[got..got + part].copy_from_slice(&chunk.data[local..local + part]);
            got += part;
            self.pos += part;
            offset += chunk.len;

            if got == out.len() {
                break;
            }
        }

        debug_assert!(got == out.len());
        Step::Ready(())
    }

    /// Move the cursor forward, returning the new absolute offset.
    pub fn skip(&mut self, count: usize) -> Step<u64> {
        if self.fill() < count {
            return self.need_more();
        }
        self.pos += count;
        Step::Ready(self.tell())
    }

    /// Move the cursor backward. Returns false if `count` exceeds the buffered history.
    pub fn seek_back(&mut self, count: usize) -> bool {
        if count <= self.pos {
            self.pos -= count;
            true
        }
        else {
            false
        }
    }

    fn need_more<T>(&mut self) -> Step<T> {
        // Undo all uncommitted reads.
        self.pos = self.first_pos;
        Step::NeedMore
    }

    /// Commit the cursor and recycle every fully-consumed chunk. Released data is never
    /// referenced again.
    pub fn forget(&mut self) {
        while let Some(front) = self.chunks.front() {
            if self.pos < front.len {
                break;
            }
            let chunk = self.chunks.pop_front().unwrap();
            self.file_off += chunk.len as u64;
            self.pos -= chunk.len;
            self.size -= chunk.len;
            self.release(chunk);
        }
        self.first_pos = self.pos;
    }

    /// Drop all buffered data, recycling chunks into the pool.
    pub fn reset(&mut self) {
        while let Some(chunk) = self.chunks.pop_front() {
            self.release(chunk);
        }
        self.fill_pool();
        self.size = 0;
        self.pos = 0;
        self.first_pos = 0;
        self.file_off = 0;
    }

    /// Declare the absolute stream position of upcoming input. If the position lies within the
    /// buffered window the cursor simply moves there; otherwise all buffered data is dropped and
    /// the caller is expected to feed from exactly the returned offset.
    pub fn set_pos(&mut self, pos: u64) -> u64 {
        if pos >= self.file_off && pos < self.file_off + self.size as u64 {
            self.pos = (pos - self.file_off) as usize;
            self.first_pos = self.pos;
            self.file_off + self.size as u64
        }
        else {
            self.reset();
            self.file_off = pos;
            pos
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BufferChain;
    use crate::reader::Step;

    #[test]
    fn verify_append_give() {
        let mut bc = BufferChain::new(2, 8);

        bc.append(&[1, 2, 3, 4, 5]);
        bc.append(&[6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(bc.fill(), 12);

        let mut out = [0u8; 10];
        assert!(matches!(bc.give(&mut out), Step::Ready(())));
        assert_eq!(&out, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(bc.fill(), 2);
        assert_eq!(bc.tell(), 10);
    }

    #[test]
    fn verify_give_shortfall_rolls_back() {
        let mut bc = BufferChain::new(2, 4);

        bc.append(&[1, 2, 3, 4, 5, 6]);

        let mut out = [0u8; 4];
        assert!(matches!(bc.give(&mut out), Step::Ready(())));
        bc.forget();
        assert_eq!(bc.tell(), 4);

        // Read past the committed point, then fail. The cursor must return to the commit.
        let mut two = [0u8; 2];
        assert!(matches!(bc.give(&mut two), Step::Ready(())));
        let mut four = [0u8; 4];
        assert!(matches!(bc.give(&mut four), Step::NeedMore));
        assert_eq!(bc.tell(), 4);

        // After more input the same parse succeeds from the commit point.
        bc.append(&[7, 8, 9, 10]);
        let mut six = [0u8; 6];
        assert!(matches!(bc.give(&mut six), Step::Ready(())));
        assert_eq!(&six, &[5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn verify_forget_commits_and_recycles() {
        let mut bc = BufferChain::new(1, 4);

        bc.append(&[0; 12]);
        assert!(matches!(bc.skip(9), Step::Ready(9)));
        bc.forget();

        // Two full chunks (8 bytes) released, one byte into the third consumed.
        assert_eq!(bc.tell(), 9);
        assert_eq!(bc.fill(), 3);

        // first_pos == pos after forget: an immediate shortfall stays put.
        let mut out = [0u8; 8];
        assert!(matches!(bc.give(&mut out), Step::NeedMore));
        assert_eq!(bc.tell(), 9);
    }

    #[test]
    fn verify_seek_back() {
        let mut bc = BufferChain::new(2, 8);

        bc.append(&[1, 2, 3, 4]);
        assert!(matches!(bc.skip(4), Step::Ready(4)));
        assert!(bc.seek_back(2));
        assert_eq!(bc.tell(), 2);
        assert!(!bc.seek_back(3));
        assert_eq!(bc.tell(), 2);
    }

    #[test]
    fn verify_set_pos() {
        let mut bc = BufferChain::new(2, 8);

        bc.append(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(bc.skip(8), Step::Ready(8)));
        bc.forget();

        // Out-of-window: buffered data is dropped, next input expected at the new offset.
        assert_eq!(bc.set_pos(100), 100);
        assert_eq!(bc.fill(), 0);
        bc.append(&[9, 9]);
        assert_eq!(bc.tell(), 100);

        // In-window: cursor moves without losing data.
        assert_eq!(bc.set_pos(101), 102);
        let mut one = [0u8; 1];
        assert!(matches!(bc.give(&mut one), Step::Ready(())));
        assert_eq!(one[0], 9);
    }
}
