// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end decoder tests over synthetic streams.
//!
//! The streams are built from valid silent frames: an all-zero frame body is a well-formed
//! layer 3 frame whose granules decode to silence, which makes expected sample counts and
//! contents exact without carrying reference audio around.

use std::io::Cursor;

use mpadec::{Decoder, Encoding, Format, Options, Status, Whence};

/// Size of a 44.1 kHz stereo 128 kbps MPEG1 layer 3 frame, header included.
const FRAME_LEN: usize = 417;

/// Bytes of decoded PCM per such frame: 1152 samples x 2 channels x 2 bytes.
const FRAME_PCM: usize = 1152 * 2 * 2;

/// One silent 44.1 kHz stereo 128 kbps frame.
fn silent_frame() -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&[0xff, 0xfb, 0x90, 0x00]);
    frame
}

fn silent_stream(frames: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for _ in 0..frames {
        stream.extend_from_slice(&silent_frame());
    }
    stream
}

/// Decode a whole stream in pull mode, returning the PCM and the negotiated format.
fn decode_stream(data: Vec<u8>, opts: Options) -> (Vec<u8>, Option<Format>) {
    let mut dec = Decoder::open_with_options(Box::new(Cursor::new(data)), opts).unwrap();

    let mut pcm = Vec::new();
    let mut format = None;
    let mut buf = vec![0u8; 4096];

    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);

        match status {
            Status::Done => break,
            Status::NewFormat => format = dec.format().unwrap(),
            Status::NeedMore => panic!("pull mode returned NeedMore"),
            Status::Ok => (),
        }
    }

    (pcm, format)
}

/// Decode a whole stream through the feed interface in fixed-size input chunks.
fn decode_stream_fed(data: &[u8], chunk: usize, opts: Options) -> Vec<u8> {
    let mut dec = Decoder::open_feed(opts);

    let mut pcm = Vec::new();
    let mut buf = vec![0u8; 4096];
    let mut input = data.chunks(chunk);

    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);

        match status {
            Status::NeedMore => match input.next() {
                Some(chunk) => dec.feed(chunk).unwrap(),
                None => break,
            },
            Status::Done => break,
            _ => (),
        }
    }

    pcm
}

#[test]
fn verify_two_frame_stream() {
    // Two back-to-back 417-byte frames decode to exactly 2 x 1152 stereo samples.
    let (pcm, format) = decode_stream(silent_stream(2), Options::default());

    assert_eq!(
        format,
        Some(Format { sample_rate: 44_100, channels: 2, encoding: Encoding::Signed16 })
    );
    assert_eq!(pcm.len(), 2 * FRAME_PCM);
    assert!(pcm.iter().all(|&b| b == 0));
}

#[test]
fn verify_format_known_after_first_decode() {
    let mut dec =
        Decoder::open_with_options(Box::new(Cursor::new(silent_stream(2))), Options::default())
            .unwrap();

    let mut buf = vec![0u8; 1024];
    let (n, status) = dec.read(&mut buf).unwrap();

    assert_eq!(status, Status::NewFormat);
    assert_eq!(n, 0);

    let format = dec.format().unwrap().unwrap();
    assert_eq!(format.sample_rate, 44_100);
    assert_eq!(format.channels, 2);
    assert_eq!(format.encoding, Encoding::Signed16);
}

#[test]
fn verify_feed_chunking_invariance() {
    let data = silent_stream(5);

    let (reference, _) = decode_stream(data.clone(), Options::default());
    assert_eq!(reference.len(), 5 * FRAME_PCM);

    for &chunk in &[1usize, 7, 64, FRAME_LEN, 4096] {
        let fed = decode_stream_fed(&data, chunk, Options::default());
        assert_eq!(fed, reference, "chunk size {}", chunk);
    }
}

#[test]
fn verify_resync_over_junk_prefix() {
    let (reference, _) = decode_stream(silent_stream(3), Options::default());

    // 0xaa bytes can never contain a sync pattern.
    for &junk_len in &[1usize, 17, 64] {
        let mut data = vec![0xaa; junk_len];
        data.extend_from_slice(&silent_stream(3));

        let (pcm, format) = decode_stream(data, Options::default());

        assert_eq!(pcm, reference, "junk length {}", junk_len);
        assert_eq!(format.unwrap().sample_rate, 44_100);
    }
}

#[test]
fn verify_false_sync_rejected_by_lookahead() {
    let (reference, _) = decode_stream(silent_stream(3), Options::default());

    // A lone valid-looking header followed by garbage: the look-ahead finds no compatible
    // header one frame later and the candidate is abandoned without decoding.
    let mut data = vec![0u8; 0];
    data.extend_from_slice(&[0xff, 0xfb, 0x90, 0x00]);
    data.extend_from_slice(&vec![0xaa; FRAME_LEN - 4]);
    data.extend_from_slice(&silent_stream(3));

    let mut dec =
        Decoder::open_with_options(Box::new(Cursor::new(data)), Options::default()).unwrap();

    let mut pcm = Vec::new();
    let mut buf = vec![0u8; 4096];

    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);
        if status == Status::Done {
            break;
        }
    }

    assert_eq!(pcm, reference);
    assert_eq!(dec.error_count(), 0);
}

#[test]
fn verify_id3v2_prefix_returns_need_more() {
    // An ID3v2 header declaring an empty tag, with no frames behind it, must produce NeedMore
    // rather than an error.
    let mut dec = Decoder::open_feed(Options::default());

    dec.feed(&[b'I', b'D', b'3', 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();

    let mut buf = vec![0u8; 512];
    let (n, status) = dec.read(&mut buf).unwrap();

    assert_eq!(n, 0);
    assert_eq!(status, Status::NeedMore);
    assert_eq!(dec.error_count(), 0);

    // Feeding audio afterwards resumes cleanly.
    dec.feed(&silent_stream(2)).unwrap();

    let mut pcm = Vec::new();
    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);
        if status == Status::NeedMore {
            break;
        }
    }

    assert_eq!(pcm.len(), 2 * FRAME_PCM);
}

#[test]
fn verify_id3v2_with_payload_is_skipped() {
    // A 100-byte tag payload before the audio.
    let mut data = vec![b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 100];
    data.extend_from_slice(&vec![0x55; 100]);
    data.extend_from_slice(&silent_stream(2));

    let (pcm, _) = decode_stream(data, Options::default());
    assert_eq!(pcm.len(), 2 * FRAME_PCM);
}

#[test]
fn verify_free_format_stream() {
    // Free-format frames with a constant 104-byte body; the size must be inferred from the
    // spacing of the headers.
    const BODY: usize = 104;

    let mut data = Vec::new();
    for _ in 0..5 {
        data.extend_from_slice(&[0xff, 0xfb, 0x00, 0x00]);
        data.extend_from_slice(&vec![0u8; BODY]);
    }

    let (pcm, format) = decode_stream(data, Options::default());

    assert_eq!(format.unwrap().sample_rate, 44_100);
    assert_eq!(pcm.len(), 5 * FRAME_PCM);
}

#[test]
fn verify_seek_and_tell() {
    let data = silent_stream(40);
    let total_samples = 40i64 * 1152;

    let mut dec =
        Decoder::open_with_options(Box::new(Cursor::new(data)), Options::default()).unwrap();

    // Pull a little to establish the format.
    let mut buf = vec![0u8; 4096];
    let _ = dec.read(&mut buf).unwrap();
    let _ = dec.read(&mut buf).unwrap();

    let target = 30_000i64;
    let reached = dec.seek(target, Whence::Set).unwrap();

    assert_eq!(reached, target as u64);
    assert_eq!(dec.tell(), target as u64);

    // Decoding to the end yields exactly the remaining samples.
    let mut pcm = Vec::new();
    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);
        if status == Status::Done {
            break;
        }
    }

    assert_eq!(pcm.len() as i64, (total_samples - target) * 4);
    assert!(pcm.iter().all(|&b| b == 0));
}

#[test]
fn verify_seek_back_to_start() {
    let data = silent_stream(10);

    let mut dec =
        Decoder::open_with_options(Box::new(Cursor::new(data)), Options::default()).unwrap();

    let mut buf = vec![0u8; 4096];
    for _ in 0..8 {
        let _ = dec.read(&mut buf).unwrap();
    }
    assert!(dec.tell() > 0);

    let reached = dec.seek(0, Whence::Set).unwrap();
    assert_eq!(reached, 0);

    let mut pcm = Vec::new();
    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);
        if status == Status::Done {
            break;
        }
    }

    assert_eq!(pcm.len(), 10 * FRAME_PCM);
}

/// Build an information (Xing/LAME) frame declaring the given frame count, encoder delay, and
/// padding.
fn info_frame(frames: u32, delay: u32, padding: u32) -> Vec<u8> {
    let mut frame = silent_frame();
    // Side info spans 32 bytes for MPEG1 stereo; the tag follows it.
    let mut at = 4 + 32;

    frame[at..at + 4].copy_from_slice(b"Xing");
    at += 4;

    // Flags: frame count only.
    frame[at..at + 4].copy_from_slice(&1u32.to_be_bytes());
    at += 4;

    frame[at..at + 4].copy_from_slice(&frames.to_be_bytes());
    at += 4;

    // LAME extension: encoder string, VBR method, lowpass, peak, two gain fields, flags, ABR
    // rate, then the delay/padding pair.
    frame[at..at + 9].copy_from_slice(b"LAME3.100");
    at += 9;
    frame[at] = 0x01; // CBR
    at += 1 + 1 + 4 + 2 + 2 + 1 + 1;

    frame[at] = (delay >> 4) as u8;
    frame[at + 1] = (((delay & 0xf) << 4) | (padding >> 8)) as u8;
    frame[at + 2] = (padding & 0xff) as u8;

    frame
}

#[test]
fn verify_gapless_trim() {
    let delay = 576u32;
    let padding = 600u32;

    let mut data = info_frame(3, delay, padding);
    data.extend_from_slice(&silent_stream(3));

    let (pcm, _) = decode_stream(data, Options::default());

    // The decoder delay of 529 samples joins the encoder delay at both edges.
    let begin = delay as i64 + 529;
    let end = 3 * 1152 - padding as i64 + 529;

    assert_eq!(pcm.len() as i64, (end - begin) * 4);
}

#[test]
fn verify_gapless_disabled() {
    let mut data = info_frame(3, 576, 600);
    data.extend_from_slice(&silent_stream(3));

    let opts = Options { gapless: false, ..Options::default() };
    let (pcm, _) = decode_stream(data, opts);

    // The info frame itself is still consumed as metadata, but nothing is trimmed.
    assert_eq!(pcm.len(), 3 * FRAME_PCM);
}

#[test]
fn verify_unsigned_output() {
    let opts = Options { encoding: Encoding::Unsigned16, ..Options::default() };
    let (pcm, format) = decode_stream(silent_stream(2), opts);

    assert_eq!(format.unwrap().encoding, Encoding::Unsigned16);

    // Silence in unsigned 16-bit is the midpoint value.
    for sample in pcm.chunks(2) {
        assert_eq!(u16::from_ne_bytes([sample[0], sample[1]]), 0x8000);
    }
}

#[test]
fn verify_trailing_id3v1_ignored() {
    let mut data = silent_stream(3);
    data.extend_from_slice(b"TAG");
    data.extend_from_slice(&[0u8; 125]);

    let (pcm, _) = decode_stream(data, Options::default());
    assert_eq!(pcm.len(), 3 * FRAME_PCM);
}

#[test]
fn verify_corrupt_frame_yields_silence_and_recovery() {
    // Corrupt the side info of the middle frame so it fails to decode; output must still span
    // all three frames, with the bad one zero-filled.
    let mut data = silent_stream(3);

    // big_values fields of the second frame: make them absurd.
    for b in data.iter_mut().skip(FRAME_LEN + 4).take(8) {
        *b = 0xff;
    }

    let mut dec =
        Decoder::open_with_options(Box::new(Cursor::new(data)), Options::default()).unwrap();

    let mut pcm = Vec::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let (n, status) = dec.read(&mut buf).unwrap();
        pcm.extend_from_slice(&buf[..n]);
        if status == Status::Done {
            break;
        }
    }

    assert_eq!(pcm.len(), 3 * FRAME_PCM);
    assert!(dec.error_count() > 0);
    assert!(pcm.iter().all(|&b| b == 0));
}
