// mpadec
// Copyright (c) The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `huffman` module implements the canonical code tables and decoders for the layer 3
//! big-values and count1 partitions.

use crate::errors::{decode_error, Result};
use crate::io::BitReaderLtr;

use lazy_static::lazy_static;

// Code tables for the big-values and count1 partitions. Each entry is
// (codeword, codeword length in bits, packed x/y sample pair).

#[rustfmt::skip]
const PAIRS_1: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0001,  3, 0x01),
    (0x0001,  2, 0x10), (0x0000,  3, 0x11),
];

#[rustfmt::skip]
const PAIRS_2: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0002,  3, 0x01), (0x0001,  6, 0x02),
    (0x0003,  3, 0x10), (0x0001,  3, 0x11), (0x0001,  5, 0x12),
    (0x0003,  5, 0x20), (0x0002,  5, 0x21), (0x0000,  6, 0x22),
];

#[rustfmt::skip]
const PAIRS_3: &[(u16, u8, u8)] = &[
    (0x0003,  2, 0x00), (0x0002,  2, 0x01), (0x0001,  6, 0x02),
    (0x0001,  3, 0x10), (0x0001,  2, 0x11), (0x0001,  5, 0x12),
    (0x0003,  5, 0x20), (0x0002,  5, 0x21), (0x0000,  6, 0x22),
];

#[rustfmt::skip]
const PAIRS_5: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0002,  3, 0x01), (0x0006,  6, 0x02), (0x0005,  7, 0x03),
    (0x0003,  3, 0x10), (0x0001,  3, 0x11), (0x0004,  6, 0x12), (0x0004,  7, 0x13),
    (0x0007,  6, 0x20), (0x0005,  6, 0x21), (0x0007,  7, 0x22), (0x0001,  8, 0x23),
    (0x0006,  7, 0x30), (0x0001,  6, 0x31), (0x0001,  7, 0x32), (0x0000,  8, 0x33),
];

#[rustfmt::skip]
const PAIRS_6: &[(u16, u8, u8)] = &[
    (0x0007,  3, 0x00), (0x0003,  3, 0x01), (0x0005,  5, 0x02), (0x0001,  7, 0x03),
    (0x0006,  3, 0x10), (0x0002,  2, 0x11), (0x0003,  4, 0x12), (0x0002,  5, 0x13),
    (0x0005,  4, 0x20), (0x0004,  4, 0x21), (0x0004,  5, 0x22), (0x0001,  6, 0x23),
    (0x0003,  6, 0x30), (0x0003,  5, 0x31), (0x0002,  6, 0x32), (0x0000,  7, 0x33),
];

#[rustfmt::skip]
const PAIRS_7: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0002,  3, 0x01), (0x000a,  6, 0x02), (0x0013,  8, 0x03), (0x0010,  8, 0x04), (0x000a,  9, 0x05),
    (0x0003,  3, 0x10), (0x0003,  4, 0x11), (0x0007,  6, 0x12), (0x000a,  7, 0x13), (0x0005,  7, 0x14), (0x0003,  8, 0x15),
    (0x000b,  6, 0x20), (0x0004,  5, 0x21), (0x000d,  7, 0x22), (0x0011,  8, 0x23), (0x0008,  8, 0x24), (0x0004,  9, 0x25),
    (0x000c,  7, 0x30), (0x000b,  7, 0x31), (0x0012,  8, 0x32), (0x000f,  9, 0x33), (0x000b,  9, 0x34), (0x0002,  9, 0x35),
    (0x0007,  7, 0x40), (0x0006,  7, 0x41), (0x0009,  8, 0x42), (0x000e,  9, 0x43), (0x0003,  9, 0x44), (0x0001, 10, 0x45),
    (0x0006,  8, 0x50), (0x0004,  8, 0x51), (0x0005,  9, 0x52), (0x0003, 10, 0x53), (0x0002, 10, 0x54), (0x0000, 10, 0x55),
];

#[rustfmt::skip]
const PAIRS_8: &[(u16, u8, u8)] = &[
    (0x0003,  2, 0x00), (0x0004,  3, 0x01), (0x0006,  6, 0x02), (0x0012,  8, 0x03), (0x000c,  8, 0x04), (0x0005,  9, 0x05),
    (0x0005,  3, 0x10), (0x0001,  2, 0x11), (0x0002,  4, 0x12), (0x0010,  8, 0x13), (0x0009,  8, 0x14), (0x0003,  8, 0x15),
    (0x0007,  6, 0x20), (0x0003,  4, 0x21), (0x0005,  6, 0x22), (0x000e,  8, 0x23), (0x0007,  8, 0x24), (0x0003,  9, 0x25),
    (0x0013,  8, 0x30), (0x0011,  8, 0x31), (0x000f,  8, 0x32), (0x000d,  9, 0x33), (0x000a,  9, 0x34), (0x0004, 10, 0x35),
    (0x000d,  8, 0x40), (0x0005,  7, 0x41), (0x0008,  8, 0x42), (0x000b,  9, 0x43), (0x0005, 10, 0x44), (0x0001, 10, 0x45),
    (0x000c,  9, 0x50), (0x0004,  8, 0x51), (0x0004,  9, 0x52), (0x0001,  9, 0x53), (0x0001, 11, 0x54), (0x0000, 11, 0x55),
];

#[rustfmt::skip]
const PAIRS_9: &[(u16, u8, u8)] = &[
    (0x0007,  3, 0x00), (0x0005,  3, 0x01), (0x0009,  5, 0x02), (0x000e,  6, 0x03), (0x000f,  8, 0x04), (0x0007,  9, 0x05),
    (0x0006,  3, 0x10), (0x0004,  3, 0x11), (0x0005,  4, 0x12), (0x0005,  5, 0x13), (0x0006,  6, 0x14), (0x0007,  8, 0x15),
    (0x0007,  4, 0x20), (0x0006,  4, 0x21), (0x0008,  5, 0x22), (0x0008,  6, 0x23), (0x0008,  7, 0x24), (0x0005,  8, 0x25),
    (0x000f,  6, 0x30), (0x0006,  5, 0x31), (0x0009,  6, 0x32), (0x000a,  7, 0x33), (0x0005,  7, 0x34), (0x0001,  8, 0x35),
    (0x000b,  7, 0x40), (0x0007,  6, 0x41), (0x0009,  7, 0x42), (0x0006,  7, 0x43), (0x0004,  8, 0x44), (0x0001,  9, 0x45),
    (0x000e,  8, 0x50), (0x0004,  7, 0x51), (0x0006,  8, 0x52), (0x0002,  8, 0x53), (0x0006,  9, 0x54), (0x0000,  9, 0x55),
];

#[rustfmt::skip]
const PAIRS_10: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0002,  3, 0x01), (0x000a,  6, 0x02), (0x0017,  8, 0x03), (0x0023,  9, 0x04), (0x001e,  9, 0x05), (0x000c,  9, 0x06), (0x0011, 10, 0x07),
    (0x0003,  3, 0x10), (0x0003,  4, 0x11), (0x0008,  6, 0x12), (0x000c,  7, 0x13), (0x0012,  8, 0x14), (0x0015,  9, 0x15), (0x000c,  8, 0x16), (0x0007,  8, 0x17),
    (0x000b,  6, 0x20), (0x0009,  6, 0x21), (0x000f,  7, 0x22), (0x0015,  8, 0x23), (0x0020,  9, 0x24), (0x0028, 10, 0x25), (0x0013,  9, 0x26), (0x0006,  9, 0x27),
    (0x000e,  7, 0x30), (0x000d,  7, 0x31), (0x0016,  8, 0x32), (0x0022,  9, 0x33), (0x002e, 10, 0x34), (0x0017, 10, 0x35), (0x0012,  9, 0x36), (0x0007, 10, 0x37),
    (0x0014,  8, 0x40), (0x0013,  8, 0x41), (0x0021,  9, 0x42), (0x002f, 10, 0x43), (0x001b, 10, 0x44), (0x0016, 10, 0x45), (0x0009, 10, 0x46), (0x0003, 10, 0x47),
    (0x001f,  9, 0x50), (0x0016,  9, 0x51), (0x0029, 10, 0x52), (0x001a, 10, 0x53), (0x0015, 11, 0x54), (0x0014, 11, 0x55), (0x0005, 10, 0x56), (0x0003, 11, 0x57),
    (0x000e,  8, 0x60), (0x000d,  8, 0x61), (0x000a,  9, 0x62), (0x000b, 10, 0x63), (0x0010, 10, 0x64), (0x0006, 10, 0x65), (0x0005, 11, 0x66), (0x0001, 11, 0x67),
    (0x0009,  9, 0x70), (0x0008,  8, 0x71), (0x0007,  9, 0x72), (0x0008, 10, 0x73), (0x0004, 10, 0x74), (0x0004, 11, 0x75), (0x0002, 11, 0x76), (0x0000, 11, 0x77),
];

#[rustfmt::skip]
const PAIRS_11: &[(u16, u8, u8)] = &[
    (0x0003,  2, 0x00), (0x0004,  3, 0x01), (0x000a,  5, 0x02), (0x0018,  7, 0x03), (0x0022,  8, 0x04), (0x0021,  9, 0x05), (0x0015,  8, 0x06), (0x000f,  9, 0x07),
    (0x0005,  3, 0x10), (0x0003,  3, 0x11), (0x0004,  4, 0x12), (0x000a,  6, 0x13), (0x0020,  8, 0x14), (0x0011,  8, 0x15), (0x000b,  7, 0x16), (0x000a,  8, 0x17),
    (0x000b,  5, 0x20), (0x0007,  5, 0x21), (0x000d,  6, 0x22), (0x0012,  7, 0x23), (0x001e,  8, 0x24), (0x001f,  9, 0x25), (0x0014,  8, 0x26), (0x0005,  8, 0x27),
    (0x0019,  7, 0x30), (0x000b,  6, 0x31), (0x0013,  7, 0x32), (0x003b,  9, 0x33), (0x001b,  8, 0x34), (0x0012, 10, 0x35), (0x000c,  8, 0x36), (0x0005,  9, 0x37),
    (0x0023,  8, 0x40), (0x0021,  8, 0x41), (0x001f,  8, 0x42), (0x003a,  9, 0x43), (0x001e,  9, 0x44), (0x0010, 10, 0x45), (0x0007,  9, 0x46), (0x0005, 10, 0x47),
    (0x001c,  8, 0x50), (0x001a,  8, 0x51), (0x0020,  9, 0x52), (0x0013, 10, 0x53), (0x0011, 10, 0x54), (0x000f, 11, 0x55), (0x0008, 10, 0x56), (0x000e, 11, 0x57),
    (0x000e,  8, 0x60), (0x000c,  7, 0x61), (0x0009,  7, 0x62), (0x000d,  8, 0x63), (0x000e,  9, 0x64), (0x0009, 10, 0x65), (0x0004, 10, 0x66), (0x0001, 10, 0x67),
    (0x000b,  8, 0x70), (0x0004,  7, 0x71), (0x0006,  8, 0x72), (0x0006,  9, 0x73), (0x0006, 10, 0x74), (0x0003, 10, 0x75), (0x0002, 10, 0x76), (0x0000, 10, 0x77),
];

#[rustfmt::skip]
const PAIRS_12: &[(u16, u8, u8)] = &[
    (0x0009,  4, 0x00), (0x0006,  3, 0x01), (0x0010,  5, 0x02), (0x0021,  7, 0x03), (0x0029,  8, 0x04), (0x0027,  9, 0x05), (0x0026,  9, 0x06), (0x001a,  9, 0x07),
    (0x0007,  3, 0x10), (0x0005,  3, 0x11), (0x0006,  4, 0x12), (0x0009,  5, 0x13), (0x0017,  7, 0x14), (0x0010,  7, 0x15), (0x001a,  8, 0x16), (0x000b,  8, 0x17),
    (0x0011,  5, 0x20), (0x0007,  4, 0x21), (0x000b,  5, 0x22), (0x000e,  6, 0x23), (0x0015,  7, 0x24), (0x001e,  8, 0x25), (0x000a,  7, 0x26), (0x0007,  8, 0x27),
    (0x0011,  6, 0x30), (0x000a,  5, 0x31), (0x000f,  6, 0x32), (0x000c,  6, 0x33), (0x0012,  7, 0x34), (0x001c,  8, 0x35), (0x000e,  8, 0x36), (0x0005,  8, 0x37),
    (0x0020,  7, 0x40), (0x000d,  6, 0x41), (0x0016,  7, 0x42), (0x0013,  7, 0x43), (0x0012,  8, 0x44), (0x0010,  8, 0x45), (0x0009,  8, 0x46), (0x0005,  9, 0x47),
    (0x0028,  8, 0x50), (0x0011,  7, 0x51), (0x001f,  8, 0x52), (0x001d,  8, 0x53), (0x0011,  8, 0x54), (0x000d,  9, 0x55), (0x0004,  8, 0x56), (0x0002,  9, 0x57),
    (0x001b,  8, 0x60), (0x000c,  7, 0x61), (0x000b,  7, 0x62), (0x000f,  8, 0x63), (0x000a,  8, 0x64), (0x0007,  9, 0x65), (0x0004,  9, 0x66), (0x0001, 10, 0x67),
    (0x001b,  9, 0x70), (0x000c,  8, 0x71), (0x0008,  8, 0x72), (0x000c,  9, 0x73), (0x0006,  9, 0x74), (0x0003,  9, 0x75), (0x0001,  9, 0x76), (0x0000, 10, 0x77),
];

#[rustfmt::skip]
const PAIRS_13: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0005,  4, 0x01), (0x000e,  6, 0x02), (0x0015,  7, 0x03), (0x0022,  8, 0x04), (0x0033,  9, 0x05), (0x002e,  9, 0x06), (0x0047, 10, 0x07), (0x002a,  9, 0x08), (0x0034, 10, 0x09), (0x0044, 11, 0x0a), (0x0034, 11, 0x0b), (0x0043, 12, 0x0c), (0x002c, 12, 0x0d), (0x002b, 13, 0x0e), (0x0013, 13, 0x0f),
    (0x0003,  3, 0x10), (0x0004,  4, 0x11), (0x000c,  6, 0x12), (0x0013,  7, 0x13), (0x001f,  8, 0x14), (0x001a,  8, 0x15), (0x002c,  9, 0x16), (0x0021,  9, 0x17), (0x001f,  9, 0x18), (0x0018,  9, 0x19), (0x0020, 10, 0x1a), (0x0018, 10, 0x1b), (0x001f, 11, 0x1c), (0x0023, 12, 0x1d), (0x0016, 12, 0x1e), (0x000e, 12, 0x1f),
    (0x000f,  6, 0x20), (0x000d,  6, 0x21), (0x0017,  7, 0x22), (0x0024,  8, 0x23), (0x003b,  9, 0x24), (0x0031,  9, 0x25), (0x004d, 10, 0x26), (0x0041, 10, 0x27), (0x001d,  9, 0x28), (0x0028, 10, 0x29), (0x001e, 10, 0x2a), (0x0028, 11, 0x2b), (0x001b, 11, 0x2c), (0x0021, 12, 0x2d), (0x002a, 13, 0x2e), (0x0010, 13, 0x2f),
    (0x0016,  7, 0x30), (0x0014,  7, 0x31), (0x0025,  8, 0x32), (0x003d,  9, 0x33), (0x0038,  9, 0x34), (0x004f, 10, 0x35), (0x0049, 10, 0x36), (0x0040, 10, 0x37), (0x002b, 10, 0x38), (0x004c, 11, 0x39), (0x0038, 11, 0x3a), (0x0025, 11, 0x3b), (0x001a, 11, 0x3c), (0x001f, 12, 0x3d), (0x0019, 13, 0x3e), (0x000e, 13, 0x3f),
    (0x0023,  8, 0x40), (0x0010,  7, 0x41), (0x003c,  9, 0x42), (0x0039,  9, 0x43), (0x0061, 10, 0x44), (0x004b, 10, 0x45), (0x0072, 11, 0x46), (0x005b, 11, 0x47), (0x0036, 10, 0x48), (0x0049, 11, 0x49), (0x0037, 11, 0x4a), (0x0029, 12, 0x4b), (0x0030, 12, 0x4c), (0x0035, 13, 0x4d), (0x0017, 13, 0x4e), (0x0018, 14, 0x4f),
    (0x003a,  9, 0x50), (0x001b,  8, 0x51), (0x0032,  9, 0x52), (0x0060, 10, 0x53), (0x004c, 10, 0x54), (0x0046, 10, 0x55), (0x005d, 11, 0x56), (0x0054, 11, 0x57), (0x004d, 11, 0x58), (0x003a, 11, 0x59), (0x004f, 12, 0x5a), (0x001d, 11, 0x5b), (0x004a, 13, 0x5c), (0x0031, 13, 0x5d), (0x0029, 14, 0x5e), (0x0011, 14, 0x5f),
    (0x002f,  9, 0x60), (0x002d,  9, 0x61), (0x004e, 10, 0x62), (0x004a, 10, 0x63), (0x0073, 11, 0x64), (0x005e, 11, 0x65), (0x005a, 11, 0x66), (0x004f, 11, 0x67), (0x0045, 11, 0x68), (0x0053, 12, 0x69), (0x0047, 12, 0x6a), (0x0032, 12, 0x6b), (0x003b, 13, 0x6c), (0x0026, 13, 0x6d), (0x0024, 14, 0x6e), (0x000f, 14, 0x6f),
    (0x0048, 10, 0x70), (0x0022,  9, 0x71), (0x0038, 10, 0x72), (0x005f, 11, 0x73), (0x005c, 11, 0x74), (0x0055, 11, 0x75), (0x005b, 12, 0x76), (0x005a, 12, 0x77), (0x0056, 12, 0x78), (0x0049, 12, 0x79), (0x004d, 13, 0x7a), (0x0041, 13, 0x7b), (0x0033, 13, 0x7c), (0x002c, 14, 0x7d), (0x002b, 16, 0x7e), (0x002a, 16, 0x7f),
    (0x002b,  9, 0x80), (0x0014,  8, 0x81), (0x001e,  9, 0x82), (0x002c, 10, 0x83), (0x0037, 10, 0x84), (0x004e, 11, 0x85), (0x0048, 11, 0x86), (0x0057, 12, 0x87), (0x004e, 12, 0x88), (0x003d, 12, 0x89), (0x002e, 12, 0x8a), (0x0036, 13, 0x8b), (0x0025, 13, 0x8c), (0x001e, 14, 0x8d), (0x0014, 15, 0x8e), (0x0010, 15, 0x8f),
    (0x0035, 10, 0x90), (0x0019,  9, 0x91), (0x0029, 10, 0x92), (0x0025, 10, 0x93), (0x002c, 11, 0x94), (0x003b, 11, 0x95), (0x0036, 11, 0x96), (0x0051, 13, 0x97), (0x0042, 12, 0x98), (0x004c, 13, 0x99), (0x0039, 13, 0x9a), (0x0036, 14, 0x9b), (0x0025, 14, 0x9c), (0x0012, 14, 0x9d), (0x0027, 16, 0x9e), (0x000b, 15, 0x9f),
    (0x0023, 10, 0xa0), (0x0021, 10, 0xa1), (0x001f, 10, 0xa2), (0x0039, 11, 0xa3), (0x002a, 11, 0xa4), (0x0052, 12, 0xa5), (0x0048, 12, 0xa6), (0x0050, 13, 0xa7), (0x002f, 12, 0xa8), (0x003a, 13, 0xa9), (0x0037, 14, 0xaa), (0x0015, 13, 0xab), (0x0016, 14, 0xac), (0x001a, 15, 0xad), (0x0026, 16, 0xae), (0x0016, 17, 0xaf),
    (0x0035, 11, 0xb0), (0x0019, 10, 0xb1), (0x0017, 10, 0xb2), (0x0026, 11, 0xb3), (0x0046, 12, 0xb4), (0x003c, 12, 0xb5), (0x0033, 12, 0xb6), (0x0024, 12, 0xb7), (0x0037, 13, 0xb8), (0x001a, 13, 0xb9), (0x0022, 13, 0xba), (0x0017, 14, 0xbb), (0x001b, 15, 0xbc), (0x000e, 15, 0xbd), (0x0009, 15, 0xbe), (0x0007, 16, 0xbf),
    (0x0022, 11, 0xc0), (0x0020, 11, 0xc1), (0x001c, 11, 0xc2), (0x0027, 12, 0xc3), (0x0031, 12, 0xc4), (0x004b, 13, 0xc5), (0x001e, 12, 0xc6), (0x0034, 13, 0xc7), (0x0030, 14, 0xc8), (0x0028, 14, 0xc9), (0x0034, 15, 0xca), (0x001c, 15, 0xcb), (0x0012, 15, 0xcc), (0x0011, 16, 0xcd), (0x0009, 16, 0xce), (0x0005, 16, 0xcf),
    (0x002d, 12, 0xd0), (0x0015, 11, 0xd1), (0x0022, 12, 0xd2), (0x0040, 13, 0xd3), (0x0038, 13, 0xd4), (0x0032, 13, 0xd5), (0x0031, 14, 0xd6), (0x002d, 14, 0xd7), (0x001f, 14, 0xd8), (0x0013, 14, 0xd9), (0x000c, 14, 0xda), (0x000f, 15, 0xdb), (0x000a, 16, 0xdc), (0x0007, 15, 0xdd), (0x0006, 16, 0xde), (0x0003, 16, 0xdf),
    (0x0030, 13, 0xe0), (0x0017, 12, 0xe1), (0x0014, 12, 0xe2), (0x0027, 13, 0xe3), (0x0024, 13, 0xe4), (0x0023, 13, 0xe5), (0x0035, 15, 0xe6), (0x0015, 14, 0xe7), (0x0010, 14, 0xe8), (0x0017, 17, 0xe9), (0x000d, 15, 0xea), (0x000a, 15, 0xeb), (0x0006, 15, 0xec), (0x0001, 17, 0xed), (0x0004, 16, 0xee), (0x0002, 16, 0xef),
    (0x0010, 12, 0xf0), (0x000f, 12, 0xf1), (0x0011, 13, 0xf2), (0x001b, 14, 0xf3), (0x0019, 14, 0xf4), (0x0014, 14, 0xf5), (0x001d, 15, 0xf6), (0x000b, 14, 0xf7), (0x0011, 15, 0xf8), (0x000c, 15, 0xf9), (0x0010, 16, 0xfa), (0x0008, 16, 0xfb), (0x0001, 19, 0xfc), (0x0001, 18, 0xfd), (0x0000, 19, 0xfe), (0x0001, 16, 0xff),
];

#[rustfmt::skip]
const PAIRS_15: &[(u16, u8, u8)] = &[
    (0x0007,  3, 0x00), (0x000c,  4, 0x01), (0x0012,  5, 0x02), (0x0035,  7, 0x03), (0x002f,  7, 0x04), (0x004c,  8, 0x05), (0x007c,  9, 0x06), (0x006c,  9, 0x07), (0x0059,  9, 0x08), (0x007b, 10, 0x09), (0x006c, 10, 0x0a), (0x0077, 11, 0x0b), (0x006b, 11, 0x0c), (0x0051, 11, 0x0d), (0x007a, 12, 0x0e), (0x003f, 13, 0x0f),
    (0x000d,  4, 0x10), (0x0005,  3, 0x11), (0x0010,  5, 0x12), (0x001b,  6, 0x13), (0x002e,  7, 0x14), (0x0024,  7, 0x15), (0x003d,  8, 0x16), (0x0033,  8, 0x17), (0x002a,  8, 0x18), (0x0046,  9, 0x19), (0x0034,  9, 0x1a), (0x0053, 10, 0x1b), (0x0041, 10, 0x1c), (0x0029, 10, 0x1d), (0x003b, 11, 0x1e), (0x0024, 11, 0x1f),
    (0x0013,  5, 0x20), (0x0011,  5, 0x21), (0x000f,  5, 0x22), (0x0018,  6, 0x23), (0x0029,  7, 0x24), (0x0022,  7, 0x25), (0x003b,  8, 0x26), (0x0030,  8, 0x27), (0x0028,  8, 0x28), (0x0040,  9, 0x29), (0x0032,  9, 0x2a), (0x004e, 10, 0x2b), (0x003e, 10, 0x2c), (0x0050, 11, 0x2d), (0x0038, 11, 0x2e), (0x0021, 11, 0x2f),
    (0x001d,  6, 0x30), (0x001c,  6, 0x31), (0x0019,  6, 0x32), (0x002b,  7, 0x33), (0x0027,  7, 0x34), (0x003f,  8, 0x35), (0x0037,  8, 0x36), (0x005d,  9, 0x37), (0x004c,  9, 0x38), (0x003b,  9, 0x39), (0x005d, 10, 0x3a), (0x0048, 10, 0x3b), (0x0036, 10, 0x3c), (0x004b, 11, 0x3d), (0x0032, 11, 0x3e), (0x001d, 11, 0x3f),
    (0x0034,  7, 0x40), (0x0016,  6, 0x41), (0x002a,  7, 0x42), (0x0028,  7, 0x43), (0x0043,  8, 0x44), (0x0039,  8, 0x45), (0x005f,  9, 0x46), (0x004f,  9, 0x47), (0x0048,  9, 0x48), (0x0039,  9, 0x49), (0x0059, 10, 0x4a), (0x0045, 10, 0x4b), (0x0031, 10, 0x4c), (0x0042, 11, 0x4d), (0x002e, 11, 0x4e), (0x001b, 11, 0x4f),
    (0x004d,  8, 0x50), (0x0025,  7, 0x51), (0x0023,  7, 0x52), (0x0042,  8, 0x53), (0x003a,  8, 0x54), (0x0034,  8, 0x55), (0x005b,  9, 0x56), (0x004a,  9, 0x57), (0x003e,  9, 0x58), (0x0030,  9, 0x59), (0x004f, 10, 0x5a), (0x003f, 10, 0x5b), (0x005a, 11, 0x5c), (0x003e, 11, 0x5d), (0x0028, 11, 0x5e), (0x0026, 12, 0x5f),
    (0x007d,  9, 0x60), (0x0020,  7, 0x61), (0x003c,  8, 0x62), (0x0038,  8, 0x63), (0x0032,  8, 0x64), (0x005c,  9, 0x65), (0x004e,  9, 0x66), (0x0041,  9, 0x67), (0x0037,  9, 0x68), (0x0057, 10, 0x69), (0x0047, 10, 0x6a), (0x0033, 10, 0x6b), (0x0049, 11, 0x6c), (0x0033, 11, 0x6d), (0x0046, 12, 0x6e), (0x001e, 12, 0x6f),
    (0x006d,  9, 0x70), (0x0035,  8, 0x71), (0x0031,  8, 0x72), (0x005e,  9, 0x73), (0x0058,  9, 0x74), (0x004b,  9, 0x75), (0x0042,  9, 0x76), (0x007a, 10, 0x77), (0x005b, 10, 0x78), (0x0049, 10, 0x79), (0x0038, 10, 0x7a), (0x002a, 10, 0x7b), (0x0040, 11, 0x7c), (0x002c, 11, 0x7d), (0x0015, 11, 0x7e), (0x0019, 12, 0x7f),
    (0x005a,  9, 0x80), (0x002b,  8, 0x81), (0x0029,  8, 0x82), (0x004d,  9, 0x83), (0x0049,  9, 0x84), (0x003f,  9, 0x85), (0x0038,  9, 0x86), (0x005c, 10, 0x87), (0x004d, 10, 0x88), (0x0042, 10, 0x89), (0x002f, 10, 0x8a), (0x0043, 11, 0x8b), (0x0030, 11, 0x8c), (0x0035, 12, 0x8d), (0x0024, 12, 0x8e), (0x0014, 12, 0x8f),
    (0x0047,  9, 0x90), (0x0022,  8, 0x91), (0x0043,  9, 0x92), (0x003c,  9, 0x93), (0x003a,  9, 0x94), (0x0031,  9, 0x95), (0x0058, 10, 0x96), (0x004c, 10, 0x97), (0x0043, 10, 0x98), (0x006a, 11, 0x99), (0x0047, 11, 0x9a), (0x0036, 11, 0x9b), (0x0026, 11, 0x9c), (0x0027, 12, 0x9d), (0x0017, 12, 0x9e), (0x000f, 12, 0x9f),
    (0x006d, 10, 0xa0), (0x0035,  9, 0xa1), (0x0033,  9, 0xa2), (0x002f,  9, 0xa3), (0x005a, 10, 0xa4), (0x0052, 10, 0xa5), (0x003a, 10, 0xa6), (0x0039, 10, 0xa7), (0x0030, 10, 0xa8), (0x0048, 11, 0xa9), (0x0039, 11, 0xaa), (0x0029, 11, 0xab), (0x0017, 11, 0xac), (0x001b, 12, 0xad), (0x003e, 13, 0xae), (0x0009, 12, 0xaf),
    (0x0056, 10, 0xb0), (0x002a,  9, 0xb1), (0x0028,  9, 0xb2), (0x0025,  9, 0xb3), (0x0046, 10, 0xb4), (0x0040, 10, 0xb5), (0x0034, 10, 0xb6), (0x002b, 10, 0xb7), (0x0046, 11, 0xb8), (0x0037, 11, 0xb9), (0x002a, 11, 0xba), (0x0019, 11, 0xbb), (0x001d, 12, 0xbc), (0x0012, 12, 0xbd), (0x000b, 12, 0xbe), (0x000b, 13, 0xbf),
    (0x0076, 11, 0xc0), (0x0044, 10, 0xc1), (0x001e,  9, 0xc2), (0x0037, 10, 0xc3), (0x0032, 10, 0xc4), (0x002e, 10, 0xc5), (0x004a, 11, 0xc6), (0x0041, 11, 0xc7), (0x0031, 11, 0xc8), (0x0027, 11, 0xc9), (0x0018, 11, 0xca), (0x0010, 11, 0xcb), (0x0016, 12, 0xcc), (0x000d, 12, 0xcd), (0x000e, 13, 0xce), (0x0007, 13, 0xcf),
    (0x005b, 11, 0xd0), (0x002c, 10, 0xd1), (0x0027, 10, 0xd2), (0x0026, 10, 0xd3), (0x0022, 10, 0xd4), (0x003f, 11, 0xd5), (0x0034, 11, 0xd6), (0x002d, 11, 0xd7), (0x001f, 11, 0xd8), (0x0034, 12, 0xd9), (0x001c, 12, 0xda), (0x0013, 12, 0xdb), (0x000e, 12, 0xdc), (0x0008, 12, 0xdd), (0x0009, 13, 0xde), (0x0003, 13, 0xdf),
    (0x007b, 12, 0xe0), (0x003c, 11, 0xe1), (0x003a, 11, 0xe2), (0x0035, 11, 0xe3), (0x002f, 11, 0xe4), (0x002b, 11, 0xe5), (0x0020, 11, 0xe6), (0x0016, 11, 0xe7), (0x0025, 12, 0xe8), (0x0018, 12, 0xe9), (0x0011, 12, 0xea), (0x000c, 12, 0xeb), (0x000f, 13, 0xec), (0x000a, 13, 0xed), (0x0002, 12, 0xee), (0x0001, 13, 0xef),
    (0x0047, 12, 0xf0), (0x0025, 11, 0xf1), (0x0022, 11, 0xf2), (0x001e, 11, 0xf3), (0x001c, 11, 0xf4), (0x0014, 11, 0xf5), (0x0011, 11, 0xf6), (0x001a, 12, 0xf7), (0x0015, 12, 0xf8), (0x0010, 12, 0xf9), (0x000a, 12, 0xfa), (0x0006, 12, 0xfb), (0x0008, 13, 0xfc), (0x0006, 13, 0xfd), (0x0002, 13, 0xfe), (0x0000, 13, 0xff),
];

#[rustfmt::skip]
const PAIRS_16: &[(u16, u8, u8)] = &[
    (0x0001,  1, 0x00), (0x0005,  4, 0x01), (0x000e,  6, 0x02), (0x002c,  8, 0x03), (0x004a,  9, 0x04), (0x003f,  9, 0x05), (0x006e, 10, 0x06), (0x002e,  9, 0x07), (0x00ac, 11, 0x08), (0x0095, 11, 0x09), (0x008a, 11, 0x0a), (0x00f2, 12, 0x0b), (0x0070, 11, 0x0c), (0x00c3, 12, 0x0d), (0x00bc, 12, 0x0e), (0x0011, 10, 0x0f),
    (0x0003,  3, 0x10), (0x0004,  4, 0x11), (0x000c,  6, 0x12), (0x0014,  7, 0x13), (0x0023,  8, 0x14), (0x003e,  9, 0x15), (0x0035,  9, 0x16), (0x000f, 10, 0x17), (0x0053, 10, 0x18), (0x004b, 10, 0x19), (0x0013, 11, 0x1a), (0x0077, 12, 0x1b), (0x0064, 11, 0x1c), (0x006b, 13, 0x1d), (0x0067, 12, 0x1e), (0x0013,  9, 0x1f),
    (0x000f,  6, 0x20), (0x000d,  6, 0x21), (0x0017,  7, 0x22), (0x0026,  8, 0x23), (0x0043,  9, 0x24), (0x003a,  9, 0x25), (0x0019,  8, 0x26), (0x002d,  9, 0x27), (0x0028,  9, 0x28), (0x0024, 10, 0x29), (0x003f, 10, 0x2a), (0x00d7, 12, 0x2b), (0x0051, 11, 0x2c), (0x0029, 11, 0x2d), (0x0043, 13, 0x2e), (0x0018, 10, 0x2f),
    (0x002d,  8, 0x30), (0x0015,  7, 0x31), (0x0027,  8, 0x32), (0x0045,  9, 0x33), (0x0040, 11, 0x34), (0x0069, 10, 0x35), (0x0052, 10, 0x36), (0x008e, 11, 0x37), (0x0078, 11, 0x38), (0x00e2, 12, 0x39), (0x006f, 12, 0x3a), (0x002a, 11, 0x3b), (0x002e, 11, 0x3c), (0x0074, 13, 0x3d), (0x005a, 14, 0x3e), (0x0002, 10, 0x3f),
    (0x004b,  9, 0x40), (0x0024,  8, 0x41), (0x0044,  9, 0x42), (0x0041, 10, 0x43), (0x001c,  8, 0x44), (0x0060, 10, 0x45), (0x0046, 10, 0x46), (0x0080, 11, 0x47), (0x006a, 11, 0x48), (0x0088, 12, 0x49), (0x003a, 11, 0x4a), (0x0039, 11, 0x4b), (0x002c, 11, 0x4c), (0x0026, 11, 0x4d), (0x0036, 13, 0x4e), (0x001e, 10, 0x4f),
    (0x0042,  9, 0x50), (0x001e,  8, 0x51), (0x003b,  9, 0x52), (0x0025, 10, 0x53), (0x0061, 10, 0x54), (0x0013,  8, 0x55), (0x0094, 11, 0x56), (0x0042, 10, 0x57), (0x0037, 10, 0x58), (0x0065, 11, 0x59), (0x0050, 11, 0x5a), (0x00cc, 13, 0x5b), (0x0024, 11, 0x5c), (0x002c, 12, 0x5d), (0x008f, 14, 0x5e), (0x0029, 10, 0x5f),
    (0x006f, 10, 0x60), (0x0036,  9, 0x61), (0x0068, 10, 0x62), (0x0018, 11, 0x63), (0x0024,  9, 0x64), (0x0088, 11, 0x65), (0x00cf, 12, 0x66), (0x005f, 11, 0x67), (0x00b5, 12, 0x68), (0x0084, 12, 0x69), (0x0038, 11, 0x6a), (0x0028, 11, 0x6b), (0x0022, 12, 0x6c), (0x0042, 13, 0x6d), (0x006f, 15, 0x6e), (0x0021, 11, 0x6f),
    (0x002f,  9, 0x70), (0x002c,  9, 0x71), (0x0031, 10, 0x72), (0x008f, 11, 0x73), (0x0089, 11, 0x74), (0x0068, 11, 0x75), (0x00bd, 12, 0x76), (0x00b4, 12, 0x77), (0x0117, 13, 0x78), (0x0041, 11, 0x79), (0x00cd, 13, 0x7a), (0x0020, 11, 0x7b), (0x0024, 12, 0x7c), (0x001f, 13, 0x7d), (0x006e, 15, 0x7e), (0x0025, 11, 0x7f),
    (0x00ad, 11, 0x80), (0x002a,  9, 0x81), (0x0027, 11, 0x82), (0x00d9, 12, 0x83), (0x00d6, 12, 0x84), (0x005b, 11, 0x85), (0x0047, 11, 0x86), (0x0116, 13, 0x87), (0x006e, 12, 0x88), (0x001c, 11, 0x89), (0x005b, 14, 0x8a), (0x0046, 13, 0x8b), (0x007b, 15, 0x8c), (0x003b, 14, 0x8d), (0x002f, 15, 0x8e), (0x002b, 11, 0x8f),
    (0x008b, 11, 0x90), (0x0081, 11, 0x91), (0x0032, 11, 0x92), (0x00e3, 12, 0x93), (0x002c, 10, 0x94), (0x0089, 12, 0x95), (0x0019, 13, 0x96), (0x0085, 12, 0x97), (0x0035, 11, 0x98), (0x006a, 13, 0x99), (0x0014, 11, 0x9a), (0x0025, 12, 0x9b), (0x0025, 13, 0x9c), (0x0030, 14, 0x9d), (0x002e, 15, 0x9e), (0x0003, 12, 0x9f),
    (0x008c, 12, 0xa0), (0x00f3, 12, 0xa1), (0x00d8, 12, 0xa2), (0x00d3, 12, 0xa3), (0x00c2, 12, 0xa4), (0x008d, 12, 0xa5), (0x0076, 12, 0xa6), (0x00d0, 13, 0xa7), (0x00ea, 14, 0xa8), (0x00b7, 14, 0xa9), (0x008e, 14, 0xaa), (0x0051, 14, 0xab), (0x001c, 13, 0xac), (0x002c, 15, 0xad), (0x0014, 14, 0xae), (0x0001, 12, 0xaf),
    (0x003d, 10, 0xb0), (0x0039, 10, 0xb1), (0x00d2, 12, 0xb2), (0x002e, 10, 0xb3), (0x0021, 13, 0xb4), (0x007f, 12, 0xb5), (0x00de, 14, 0xb6), (0x00eb, 14, 0xb7), (0x0036, 12, 0xb8), (0x00b6, 14, 0xb9), (0x0040, 13, 0xba), (0x0027, 13, 0xbb), (0x0034, 14, 0xbc), (0x002b, 15, 0xbd), (0x009f, 17, 0xbe), (0x0011, 12, 0xbf),
    (0x003a, 10, 0xc0), (0x00ce, 12, 0xc1), (0x0043, 11, 0xc2), (0x007e, 12, 0xc3), (0x0026, 13, 0xc4), (0x00d1, 13, 0xc5), (0x000a, 14, 0xc6), (0x00ca, 14, 0xc7), (0x0010, 15, 0xc8), (0x0040, 14, 0xc9), (0x0013, 15, 0xca), (0x0036, 14, 0xcb), (0x002d, 15, 0xcc), (0x009e, 17, 0xcd), (0x0049, 17, 0xce), (0x0001, 13, 0xcf),
    (0x0029, 13, 0xd0), (0x002c, 13, 0xd1), (0x002f, 11, 0xd2), (0x0037, 13, 0xd3), (0x00df, 14, 0xd4), (0x0034, 12, 0xd5), (0x002e, 12, 0xd6), (0x0050, 14, 0xd7), (0x0041, 14, 0xd8), (0x003a, 14, 0xd9), (0x0055, 16, 0xda), (0x009d, 17, 0xdb), (0x0094, 17, 0xdc), (0x0048, 17, 0xdd), (0x008f, 18, 0xde), (0x0000, 13, 0xdf),
    (0x006e, 13, 0xe0), (0x002d, 11, 0xe1), (0x00cb, 14, 0xe2), (0x002f, 12, 0xe3), (0x0015, 11, 0xe4), (0x0024, 13, 0xe5), (0x007a, 15, 0xe6), (0x0026, 15, 0xe7), (0x0054, 16, 0xe8), (0x009c, 17, 0xe9), (0x0095, 17, 0xea), (0x0048, 16, 0xeb), (0x0049, 16, 0xec), (0x008e, 18, 0xed), (0x0046, 17, 0xee), (0x0031, 14, 0xef),
    (0x0015,  9, 0xf0), (0x0020,  8, 0xf1), (0x0007, 10, 0xf2), (0x003b, 10, 0xf3), (0x003e, 10, 0xf4), (0x0043, 10, 0xf5), (0x000c, 11, 0xf6), (0x0036, 11, 0xf7), (0x003e, 11, 0xf8), (0x0015, 12, 0xf9), (0x0017, 12, 0xfa), (0x0008, 13, 0xfb), (0x0041, 13, 0xfc), (0x000b, 14, 0xfd), (0x0035, 14, 0xfe), (0x0003, 11, 0xff),
];

#[rustfmt::skip]
const PAIRS_24: &[(u16, u8, u8)] = &[
    (0x000f,  4, 0x00), (0x000d,  4, 0x01), (0x002e,  6, 0x02), (0x0050,  7, 0x03), (0x0092,  8, 0x04), (0x0106,  9, 0x05), (0x00f8,  9, 0x06), (0x01b2, 10, 0x07), (0x01aa, 10, 0x08), (0x014e, 10, 0x09), (0x0146, 10, 0x0a), (0x0144, 10, 0x0b), (0x026d, 12, 0x0c), (0x0205, 12, 0x0d), (0x0408, 13, 0x0e), (0x0058,  9, 0x0f),
    (0x000e,  4, 0x10), (0x000c,  4, 0x11), (0x0015,  5, 0x12), (0x0026,  6, 0x13), (0x0047,  7, 0x14), (0x0082,  8, 0x15), (0x007a,  8, 0x16), (0x00d8,  9, 0x17), (0x00d1,  9, 0x18), (0x00c6,  9, 0x19), (0x0147, 10, 0x1a), (0x00ac,  9, 0x1b), (0x013f, 11, 0x1c), (0x0129, 11, 0x1d), (0x0117, 12, 0x1e), (0x002a,  8, 0x1f),
    (0x002f,  6, 0x20), (0x0016,  5, 0x21), (0x0029,  6, 0x22), (0x004a,  7, 0x23), (0x0044,  7, 0x24), (0x0080,  8, 0x25), (0x0078,  8, 0x26), (0x00dd,  9, 0x27), (0x00cf,  9, 0x28), (0x00c2,  9, 0x29), (0x00a8,  9, 0x2a), (0x009a,  9, 0x2b), (0x008f,  9, 0x2c), (0x0113, 11, 0x2d), (0x01f6, 11, 0x2e), (0x0028,  8, 0x2f),
    (0x0051,  7, 0x30), (0x0027,  6, 0x31), (0x004b,  7, 0x32), (0x0046,  7, 0x33), (0x0086,  8, 0x34), (0x007d,  8, 0x35), (0x0074,  8, 0x36), (0x00dc,  9, 0x37), (0x00cc,  9, 0x38), (0x00be,  9, 0x39), (0x0028, 10, 0x3a), (0x007b,  8, 0x3b), (0x0042,  8, 0x3c), (0x0135, 11, 0x3d), (0x010f, 11, 0x3e), (0x003a,  9, 0x3f),
    (0x0093,  8, 0x40), (0x0048,  7, 0x41), (0x0045,  7, 0x42), (0x0087,  8, 0x43), (0x007f,  8, 0x44), (0x0076,  8, 0x45), (0x0038,  7, 0x46), (0x00d2,  9, 0x47), (0x00c8,  9, 0x48), (0x005e,  8, 0x49), (0x0160, 10, 0x4a), (0x00a1,  9, 0x4b), (0x0132, 10, 0x4c), (0x011d, 11, 0x4d), (0x010e, 10, 0x4e), (0x001a,  9, 0x4f),
    (0x0107,  9, 0x50), (0x0083,  9, 0x51), (0x0081,  8, 0x52), (0x007e,  8, 0x53), (0x0077,  8, 0x54), (0x0039,  7, 0x55), (0x00d6,  9, 0x56), (0x00ca,  9, 0x57), (0x0060,  8, 0x58), (0x00b4, 10, 0x59), (0x0155, 10, 0x5a), (0x013d, 10, 0x5b), (0x012d, 10, 0x5c), (0x0119, 11, 0x5d), (0x0106, 11, 0x5e), (0x0031, 10, 0x5f),
    (0x00f9,  9, 0x60), (0x0003,  8, 0x61), (0x0079,  8, 0x62), (0x0075,  8, 0x63), (0x00d7,  9, 0x64), (0x00ce,  9, 0x65), (0x00c3,  9, 0x66), (0x005c,  9, 0x67), (0x015b, 10, 0x68), (0x00a5,  9, 0x69), (0x0033, 10, 0x6a), (0x008e,  9, 0x6b), (0x010f, 10, 0x6c), (0x0052, 11, 0x6d), (0x00fa, 11, 0x6e), (0x0030, 10, 0x6f),
    (0x01b3, 10, 0x70), (0x001b,  9, 0x71), (0x0023,  9, 0x72), (0x00d3,  9, 0x73), (0x00cb,  9, 0x74), (0x00c4,  9, 0x75), (0x00bb, 10, 0x76), (0x0161, 10, 0x77), (0x014c, 10, 0x78), (0x0149, 10, 0x79), (0x0129, 10, 0x7a), (0x0115, 11, 0x7b), (0x010e, 11, 0x7c), (0x0109, 11, 0x7d), (0x0105, 10, 0x7e), (0x002f, 10, 0x7f),
    (0x01ab, 10, 0x80), (0x00d4,  9, 0x81), (0x00d0,  9, 0x82), (0x00cd,  9, 0x83), (0x00c9,  9, 0x84), (0x0006,  5, 0x85), (0x00ba, 10, 0x86), (0x00b1,  9, 0x87), (0x0044, 10, 0x88), (0x0140, 10, 0x89), (0x007c, 10, 0x8a), (0x0114, 11, 0x8b), (0x0107, 11, 0x8c), (0x01fb, 11, 0x8d), (0x0104, 10, 0x8e), (0x002e, 10, 0x8f),
    (0x014f, 10, 0x90), (0x00c7,  9, 0x91), (0x00c5,  9, 0x92), (0x00bf,  9, 0x93), (0x002f,  8, 0x94), (0x00b5, 10, 0x95), (0x00ae, 10, 0x96), (0x014d, 10, 0x97), (0x0141, 10, 0x98), (0x0080, 10, 0x99), (0x0126, 11, 0x9a), (0x008a, 11, 0x9b), (0x01fa, 11, 0x9c), (0x04e7, 12, 0x9d), (0x0103, 10, 0x9e), (0x002d, 10, 0x9f),
    (0x00fb, 11, 0xa0), (0x00a9,  9, 0xa1), (0x0148, 10, 0xa2), (0x0145, 10, 0xa3), (0x009f,  9, 0xa4), (0x013c, 10, 0xa5), (0x0082, 10, 0xa6), (0x0097,  9, 0xa7), (0x00b2, 10, 0xa8), (0x0120, 11, 0xa9), (0x0202, 11, 0xaa), (0x01f4, 11, 0xab), (0x04e4, 12, 0xac), (0x04de, 12, 0xad), (0x0207, 12, 0xae), (0x002c, 10, 0xaf),
    (0x0110, 11, 0xb0), (0x015a, 10, 0xb1), (0x0154, 10, 0xb2), (0x0086, 10, 0xb3), (0x009d,  9, 0xb4), (0x0098,  9, 0xb5), (0x0049,  8, 0xb6), (0x0090,  9, 0xb7), (0x011c, 11, 0xb8), (0x01f7, 11, 0xb9), (0x00f8, 10, 0xba), (0x04e5, 12, 0xbb), (0x04df, 12, 0xbc), (0x026c, 11, 0xbd), (0x026c, 12, 0xbe), (0x0056, 11, 0xbf),
    (0x026e, 12, 0xc0), (0x0117, 11, 0xc1), (0x0133, 10, 0xc2), (0x012c, 10, 0xc3), (0x0128, 10, 0xc4), (0x0091,  9, 0xc5), (0x0046,  8, 0xc6), (0x0111, 11, 0xc7), (0x010a, 11, 0xc8), (0x011e, 11, 0xc9), (0x04e6, 12, 0xca), (0x0270, 11, 0xcb), (0x026d, 11, 0xcc), (0x0813, 13, 0xcd), (0x0811, 13, 0xce), (0x0055, 11, 0xcf),
    (0x0206, 12, 0xd0), (0x012b, 11, 0xd1), (0x0124, 11, 0xd2), (0x011f, 11, 0xd3), (0x0118, 11, 0xd4), (0x0116, 11, 0xd5), (0x0112, 11, 0xd6), (0x010b, 11, 0xd7), (0x007f,  9, 0xd8), (0x01f5, 11, 0xd9), (0x04e2, 12, 0xda), (0x0814, 13, 0xdb), (0x0812, 13, 0xdc), (0x0810, 13, 0xdd), (0x101f, 14, 0xde), (0x0054, 11, 0xdf),
    (0x0409, 13, 0xe0), (0x0121, 11, 0xe1), (0x0116, 12, 0xe2), (0x0125, 11, 0xe3), (0x0127, 11, 0xe4), (0x0108, 11, 0xe5), (0x0128, 11, 0xe6), (0x00fc, 10, 0xe7), (0x00f9, 10, 0xe8), (0x04e3, 12, 0xe9), (0x026e, 11, 0xea), (0x0815, 13, 0xeb), (0x026f, 12, 0xec), (0x101e, 14, 0xed), (0x080e, 13, 0xee), (0x0053, 11, 0xef),
    (0x0059,  8, 0xf0), (0x0010,  8, 0xf1), (0x0029,  8, 0xf2), (0x003b,  9, 0xf3), (0x001c,  8, 0xf4), (0x0032, 10, 0xf5), (0x008d, 10, 0xf6), (0x0091, 10, 0xf7), (0x009e, 10, 0xf8), (0x00af, 10, 0xf9), (0x00b3, 10, 0xfa), (0x0057, 11, 0xfb), (0x012a, 11, 0xfc), (0x0134, 11, 0xfd), (0x013e, 11, 0xfe), (0x0002,  8, 0xff),
];

#[rustfmt::skip]
const QUADS_A: &[(u16, u8, u8)] = &[
    (0x0001, 1, 0x00), (0x0005, 4, 0x01), (0x0004, 4, 0x02), (0x0005, 5, 0x03), (0x0006, 4, 0x04), (0x0005, 6, 0x05), (0x0004, 5, 0x06), (0x0004, 6, 0x07), (0x0007, 4, 0x08), (0x0003, 5, 0x09), (0x0006, 5, 0x0a), (0x0000, 6, 0x0b), (0x0007, 5, 0x0c), (0x0002, 6, 0x0d), (0x0003, 6, 0x0e), (0x0001, 6, 0x0f),
];

#[rustfmt::skip]
const QUADS_B: &[(u16, u8, u8)] = &[
    (0x000f, 4, 0x00), (0x000e, 4, 0x01), (0x000d, 4, 0x02), (0x000c, 4, 0x03), (0x000b, 4, 0x04), (0x000a, 4, 0x05), (0x0009, 4, 0x06), (0x0008, 4, 0x07), (0x0007, 4, 0x08), (0x0006, 4, 0x09), (0x0005, 4, 0x0a), (0x0004, 4, 0x0b), (0x0003, 4, 0x0c), (0x0002, 4, 0x0d), (0x0001, 4, 0x0e), (0x0000, 4, 0x0f),
];

/// A flattened binary decode tree. Interior nodes store the indicies of their children; leaves
/// store the decoded value with the high bit set. A zero child marks a prefix with no codeword.
pub struct HuffTree {
    nodes: Vec<[u16; 2]>,
}

impl HuffTree {
    fn build(codes: &'static [(u16, u8, u8)]) -> HuffTree {
        let mut nodes: Vec<[u16; 2]> = vec![[0, 0]];

        for &(code, len, value) in codes {
            let mut at = 0usize;

            // Codes can be longer than 16 bits even though their values fit in one.
            let code = u32::from(code);

            for i in (0..len).rev() {
                let bit = ((code >> i) & 1) as usize;

                if i == 0 {
                    nodes[at][bit] = 0x8000 | u16::from(value);
                }
                else if nodes[at][bit] == 0 {
                    nodes.push([0, 0]);
                    let next = (nodes.len() - 1) as u16;
                    nodes[at][bit] = next;
                    at = next as usize;
                }
                else {
                    at = nodes[at][bit] as usize;
                }
            }
        }

        HuffTree { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Read one codeword from the bitstream and return its decoded value and bit length.
    pub fn read(&self, bs: &mut BitReaderLtr<'_>) -> Result<(u8, u32)> {
        let mut at = 0usize;
        let mut len = 0;

        loop {
            let bit = bs.read_bit()? as usize;
            len += 1;

            match self.nodes[at][bit] {
                0 => return decode_error("mpa: invalid huffman code"),
                node if node & 0x8000 != 0 => return Ok(((node & 0xff) as u8, len)),
                node => at = node as usize,
            }
        }
    }
}

/// A big-values code table: the decode tree plus the number of linbits carried by escape values.
pub struct PairTable {
    pub tree: &'static HuffTree,
    pub linbits: u32,
}

lazy_static! {
    static ref TREE_EMPTY: HuffTree = HuffTree { nodes: vec![[0, 0]] };
    static ref TREE_1: HuffTree = HuffTree::build(PAIRS_1);
    static ref TREE_2: HuffTree = HuffTree::build(PAIRS_2);
    static ref TREE_3: HuffTree = HuffTree::build(PAIRS_3);
    static ref TREE_5: HuffTree = HuffTree::build(PAIRS_5);
    static ref TREE_6: HuffTree = HuffTree::build(PAIRS_6);
    static ref TREE_7: HuffTree = HuffTree::build(PAIRS_7);
    static ref TREE_8: HuffTree = HuffTree::build(PAIRS_8);
    static ref TREE_9: HuffTree = HuffTree::build(PAIRS_9);
    static ref TREE_10: HuffTree = HuffTree::build(PAIRS_10);
    static ref TREE_11: HuffTree = HuffTree::build(PAIRS_11);
    static ref TREE_12: HuffTree = HuffTree::build(PAIRS_12);
    static ref TREE_13: HuffTree = HuffTree::build(PAIRS_13);
    static ref TREE_15: HuffTree = HuffTree::build(PAIRS_15);
    static ref TREE_16: HuffTree = HuffTree::build(PAIRS_16);
    static ref TREE_24: HuffTree = HuffTree::build(PAIRS_24);
    static ref TREE_QUADS_A: HuffTree = HuffTree::build(QUADS_A);
    static ref TREE_QUADS_B: HuffTree = HuffTree::build(QUADS_B);
}

/// Get the big-values code table for a side-info table select. Tables 0, 4, and 14 carry no
/// codewords; regions using them decode to all zeros.
pub fn pair_table(select: u8) -> PairTable {
    // Tables 16..=23 and 24..=31 share codewords and differ only in linbits.
    let (tree, linbits): (&'static HuffTree, u32) = match select {
        1 => (&TREE_1, 0),
        2 => (&TREE_2, 0),
        3 => (&TREE_3, 0),
        5 => (&TREE_5, 0),
        6 => (&TREE_6, 0),
        7 => (&TREE_7, 0),
        8 => (&TREE_8, 0),
        9 => (&TREE_9, 0),
        10 => (&TREE_10, 0),
        11 => (&TREE_11, 0),
        12 => (&TREE_12, 0),
        13 => (&TREE_13, 0),
        15 => (&TREE_15, 0),
        16 => (&TREE_16, 1),
        17 => (&TREE_16, 2),
        18 => (&TREE_16, 3),
        19 => (&TREE_16, 4),
        20 => (&TREE_16, 6),
        21 => (&TREE_16, 8),
        22 => (&TREE_16, 10),
        23 => (&TREE_16, 13),
        24 => (&TREE_24, 4),
        25 => (&TREE_24, 5),
        26 => (&TREE_24, 6),
        27 => (&TREE_24, 7),
        28 => (&TREE_24, 8),
        29 => (&TREE_24, 9),
        30 => (&TREE_24, 11),
        31 => (&TREE_24, 13),
        _ => (&TREE_EMPTY, 0),
    };

    PairTable { tree, linbits }
}

/// Get the count1 code table. Table select 0 is table A (variable length codes), 1 is table B
/// (plain 4-bit codes).
pub fn quad_table(select: u8) -> &'static HuffTree {
    if select == 0 {
        &TREE_QUADS_A
    }
    else {
        &TREE_QUADS_B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BitReaderLtr;

    fn decode_all(tree: &HuffTree, data: &[u8], count: usize) -> Vec<(u8, u32)> {
        let mut bs = BitReaderLtr::new(data);
        (0..count).map(|_| tree.read(&mut bs).unwrap()).collect()
    }

    #[test]
    fn verify_pair_table_1() {
        let table = pair_table(1);

        // 1 | 001 | 01 | 000, packed per (x, y).
        let out = decode_all(table.tree, &[0b1_001_01_00, 0b0_0000000], 4);
        assert_eq!(out, vec![(0x00, 1), (0x01, 3), (0x10, 2), (0x11, 3)]);
    }

    #[test]
    fn verify_pair_table_7_linbits() {
        // Table 7 carries no linbits; its widened cousins 17 and 23 do.
        assert_eq!(pair_table(7).linbits, 0);
        assert_eq!(pair_table(17).linbits, 2);
        assert_eq!(pair_table(23).linbits, 13);
        assert_eq!(pair_table(28).linbits, 8);
    }

    #[test]
    fn verify_unused_tables_empty() {
        assert!(pair_table(0).tree.is_empty());
        assert!(pair_table(4).tree.is_empty());
        assert!(pair_table(14).tree.is_empty());
        assert!(!pair_table(13).tree.is_empty());
    }

    #[test]
    fn verify_quads() {
        // Table A: "1" decodes to 0b0000, "0101" to 0b0001.
        let tree = quad_table(0);
        let out = decode_all(tree, &[0b1_0101_000], 2);
        assert_eq!(out, vec![(0b0000, 1), (0b0001, 4)]);

        // Table B: plain 4-bit one's complement of the value.
        let tree = quad_table(1);
        let out = decode_all(tree, &[0b1111_0000], 2);
        assert_eq!(out, vec![(0b0000, 4), (0b1111, 4)]);
    }

    #[test]
    fn verify_truncated_code_is_error() {
        // A buffer that ends in the middle of a long codeword must yield a decode error, not a
        // panic. All-zero bits descend the deepest branch of table 13.
        let table = pair_table(13);
        let mut bs = BitReaderLtr::new(&[0x00]);
        assert!(table.tree.read(&mut bs).is_err());
    }
}
