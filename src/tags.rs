// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `tags` module handles the non-audio blocks that appear inside MPEG audio elementary
//! streams: ID3v2 and ID3v1 tags, RIFF/WAVE wrappers, and the Xing/Info/LAME information frame.

use crate::common::FrameHeader;
use crate::errors::Result;
use crate::reader::{Reader, Step};

use log::{debug, warn};

/// The bitrate management class of a stream, as declared by its information tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vbr {
    /// Constant bitrate.
    Cbr,
    /// Variable bitrate.
    Vbr,
    /// Average bitrate.
    Abr(u8),
}

/// Stream-level information extracted from a Xing/Info/LAME tag embedded in the first audio
/// frame.
pub struct StreamInfo {
    /// Total number of audio frames, excluding the tag frame itself.
    pub total_frames: Option<u64>,
    /// Total length in bytes of the audio data, counted from the tag frame onward.
    pub total_bytes: Option<u64>,
    /// Bitrate class.
    pub vbr: Vbr,
    /// 100-entry seek table. Entry i is the approximate byte position of audio time i percent,
    /// scaled so that 256 is the total stream length.
    pub toc: Option<[u8; 100]>,
    /// Number of leading samples added by the encoder.
    pub encoder_delay: Option<u32>,
    /// Number of trailing padding samples added by the encoder.
    pub encoder_padding: Option<u32>,
}

/// Decode a 28-bit synchsafe integer from 4 bytes. Returns `None` if any byte has its high bit
/// set.
pub fn synchsafe_u28(buf: [u8; 4]) -> Option<u32> {
    if buf.iter().any(|&b| b & 0x80 != 0) {
        return None;
    }
    Some(
        (u32::from(buf[0]) << 21)
            | (u32::from(buf[1]) << 14)
            | (u32::from(buf[2]) << 7)
            | u32::from(buf[3]),
    )
}

/// Returns true if the given header word starts an ID3v2 tag ("ID3" followed by a major version
/// that can never be 0xff).
pub fn is_id3v2(head: u32) -> bool {
    (head & 0xffff_ff00) == 0x4944_3300 && head & 0xff != 0xff
}

/// Returns true if the given header word starts an ID3v1 tag ("TAG" + first title byte).
pub fn is_id3v1(head: u32) -> bool {
    (head & 0xffff_ff00) == 0x5441_4700
}

/// Returns true if the given header word is a RIFF chunk header.
pub fn is_riff(head: u32) -> bool {
    head == 0x5249_4646
}

/// Skip over an ID3v2.3/2.4 tag. The reader is positioned just past the tag header word; on
/// success it is positioned after the complete tag (and footer, if declared). Returns
/// `Ready(false)` if the data is not a parseable tag, in which case the stream position is
/// unspecified and the caller should resync.
pub fn skip_id3v2(rd: &mut Reader) -> Result<Step<bool>> {
    // Following the "ID3" magic and major version: revision, flags, and a synchsafe length.
    let mut buf = [0u8; 6];
    match rd.read_exact(&mut buf)? {
        Step::Ready(()) => (),
        Step::NeedMore => return Ok(Step::NeedMore),
        Step::Eof => return Ok(Step::Eof),
    }

    // The revision can never be 0xff.
    if buf[0] == 0xff {
        return Ok(Step::Ready(false));
    }

    let flags = buf[1];

    let length = match synchsafe_u28([buf[2], buf[3], buf[4], buf[5]]) {
        Some(len) => len,
        None => return Ok(Step::Ready(false)),
    };

    debug!("skipping ID3v2 tag of {} bytes", length);

    match rd.skip_bytes(i64::from(length))? {
        Step::Ready(_) => (),
        Step::NeedMore => return Ok(Step::NeedMore),
        Step::Eof => return Ok(Step::Eof),
    }

    // A footer is a copy of the header and is not included in the declared length.
    if flags & 0x10 != 0 {
        match rd.skip_bytes(10)? {
            Step::Ready(_) => (),
            Step::NeedMore => return Ok(Step::NeedMore),
            Step::Eof => return Ok(Step::Eof),
        }
    }

    Ok(Step::Ready(true))
}

const XING_FRAMES: u32 = 0x1;
const XING_BYTES: u32 = 0x2;
const XING_TOC: u32 = 0x4;
const XING_QUALITY: u32 = 0x8;

/// Check the first audio frame for an embedded Xing/Info/LAME tag and extract the stream
/// information if one is present. The tag lives at a fixed offset after the side information,
/// preceded by all-zero bytes; such a frame carries no decodable audio.
pub fn check_info_tag(body: &[u8], header: &FrameHeader) -> Option<StreamInfo> {
    // The tag sits where layer 3 main data would start. Any CRC word is not counted.
    let mut at = header.side_info_len();

    // 4 bytes of magic plus 4 bytes of flags is the bare minimum.
    if body.len() < at + 8 {
        return None;
    }

    // Only accept the tag when everything before it is zero.
    if body[..at].iter().any(|&b| b != 0) {
        return None;
    }

    let magic = &body[at..at + 4];

    let mut vbr = if magic == b"Xing" {
        // A Xing header implies variable bitrate.
        Vbr::Vbr
    }
    else if magic == b"Info" {
        Vbr::Cbr
    }
    else {
        return None;
    };

    at += 4;

    let mut info = StreamInfo {
        total_frames: None,
        total_bytes: None,
        vbr,
        toc: None,
        encoder_delay: None,
        encoder_padding: None,
    };

    let flags = read_be_u32(body, &mut at)?;

    // Any combination of fields occurs in the wild, including headers that announce more than
    // the frame actually holds. Take what is there.
    if flags & XING_FRAMES != 0 {
        match read_be_u32(body, &mut at) {
            Some(v) => info.total_frames = Some(u64::from(v)),
            None => return Some(info),
        }
    }

    if flags & XING_BYTES != 0 {
        match read_be_u32(body, &mut at) {
            Some(v) => info.total_bytes = Some(u64::from(v)),
            None => return Some(info),
        }
    }

    if flags & XING_TOC != 0 {
        if body.len() < at + 100 {
            return Some(info);
        }
        let mut toc = [0u8; 100];
        toc.copy_from_slice(&body[at..at + 100]);
        info.toc = Some(toc);
        at += 100;
    }

    if flags & XING_QUALITY != 0 && read_be_u32(body, &mut at).is_none() {
        return Some(info);
    }

    // The LAME extension: a 9-byte encoder string, revision/VBR method, lowpass, ReplayGain,
    // encoder flags, ABR rate, and the encoder delay/padding pair.
    if body.len() < at + 24 || body[at] == 0 {
        return Some(info);
    }

    at += 9;

    let lame_vbr = body[at] & 0xf;
    at += 1;

    vbr = match lame_vbr {
        1 | 8 => Vbr::Cbr,
        2 | 9 => Vbr::Abr(0),
        _ => Vbr::Vbr,
    };

    // Lowpass byte, 4 bytes of peak amplitude, and two 16-bit ReplayGain fields. Volume
    // adjustment is the mixer's concern, not this decoder's.
    at += 1 + 4 + 2 + 2;

    // Encoding flags.
    at += 1;

    // ABR rate.
    if let Vbr::Abr(_) = vbr {
        vbr = Vbr::Abr(body[at]);
    }
    at += 1;

    // Encoder delay and padding as two 12-bit values.
    let delay = (u32::from(body[at]) << 4) | (u32::from(body[at + 1]) >> 4);
    let padding = ((u32::from(body[at + 1]) << 8) | u32::from(body[at + 2])) & 0xfff;

    info.vbr = vbr;
    info.encoder_delay = Some(delay);
    info.encoder_padding = Some(padding);

    if delay as usize > 1152 || padding as usize > 1152 + 529 {
        warn!("implausible encoder delay ({}) or padding ({})", delay, padding);
    }

    Some(info)
}

fn read_be_u32(buf: &[u8], at: &mut usize) -> Option<u32> {
    if buf.len() < *at + 4 {
        return None;
    }
    let v = u32::from_be_bytes([buf[*at], buf[*at + 1], buf[*at + 2], buf[*at + 3]]);
    *at += 4;
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_frame_header;

    fn info_frame(with_toc: bool, with_lame: bool) -> Vec<u8> {
        // MPEG1 layer 3, 44.1 kHz stereo: side info is 32 bytes.
        let mut body = vec![0u8; 413];
        let mut at = 32;

        body[at..at + 4].copy_from_slice(b"Xing");
        at += 4;

        let mut flags = XING_FRAMES | XING_BYTES;
        if with_toc {
            flags |= XING_TOC;
        }
        body[at..at + 4].copy_from_slice(&flags.to_be_bytes());
        at += 4;

        body[at..at + 4].copy_from_slice(&100u32.to_be_bytes());
        at += 4;
        body[at..at + 4].copy_from_slice(&41700u32.to_be_bytes());
        at += 4;

        if with_toc {
            for i in 0..100 {
                body[at + i] = (i * 256 / 100) as u8;
            }
            at += 100;
        }

        if with_lame {
            body[at..at + 9].copy_from_slice(b"LAME3.100");
            at += 9;
            body[at] = 0x02; // VBR method: ABR
            at += 1;
            at += 9; // lowpass, peak amplitude, two gain fields
            at += 1; // flags
            body[at] = 128; // ABR rate
            at += 1;
            // delay = 576, padding = 1152
            body[at] = (576 >> 4) as u8;
            body[at + 1] = (((576 & 0xf) << 4) | (1152 >> 8)) as u8;
            body[at + 2] = (1152 & 0xff) as u8;
        }

        body
    }

    #[test]
    fn verify_synchsafe() {
        assert_eq!(synchsafe_u28([0, 0, 0, 0]), Some(0));
        assert_eq!(synchsafe_u28([0x01, 0x7f, 0x7f, 0x7f]), Some(0x3f_ffff));
        assert_eq!(synchsafe_u28([0x00, 0x80, 0x00, 0x00]), None);
    }

    #[test]
    fn verify_info_tag_minimal() {
        let header = parse_frame_header(0xfffb_9000).unwrap();
        let info = check_info_tag(&info_frame(false, false), &header).unwrap();

        assert_eq!(info.total_frames, Some(100));
        assert_eq!(info.total_bytes, Some(41700));
        assert_eq!(info.vbr, Vbr::Vbr);
        assert!(info.toc.is_none());
        assert!(info.encoder_delay.is_none());
    }

    #[test]
    fn verify_info_tag_full() {
        let header = parse_frame_header(0xfffb_9000).unwrap();
        let info = check_info_tag(&info_frame(true, true), &header).unwrap();

        assert_eq!(info.total_frames, Some(100));
        assert!(info.toc.is_some());
        assert_eq!(info.vbr, Vbr::Abr(128));
        assert_eq!(info.encoder_delay, Some(576));
        assert_eq!(info.encoder_padding, Some(1152));
    }

    #[test]
    fn verify_not_a_tag() {
        let header = parse_frame_header(0xfffb_9000).unwrap();

        // Non-zero bytes before the magic disqualify the frame.
        let mut body = info_frame(false, false);
        body[2] = 1;
        assert!(check_info_tag(&body, &header).is_none());

        // No magic at all.
        let body = vec![0u8; 413];
        assert!(check_info_tag(&body, &header).is_none());
    }
}
