/*
 * This file is part of Smcmon.
 *
 * Copyright (C) 2025 Smcmon contributors
 *
 * Smcmon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Smcmon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Smcmon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Four-character key codec and the controller's packed numeric encodings.
//!
//! Every addressable controller value is named by exactly four ASCII bytes,
//! packed big-endian into a `u32`. The codec is a bijection over valid
//! four-byte ASCII; codes that decode to non-printable bytes are
//! firmware-internal and never constructed here.

/// Packs a four-character key into its 32-bit code.
/// Byte 0 lands in bits 31..24, byte 3 in bits 7..0.
///
/// The caller is trusted to pass a valid controller key name; only the
/// length is checked.
pub fn four_char_code(text: &str) -> u32 {
    let bytes = text.as_bytes();
    assert_eq!(bytes.len(), 4, "controller keys are exactly 4 bytes");
    ((bytes[0] as u32) << 24) | ((bytes[1] as u32) << 16) | ((bytes[2] as u32) << 8) | (bytes[3] as u32)
}

/// Unpacks a 32-bit key code back into its four characters.
pub fn four_char_string(code: u32) -> String {
    let bytes = [
        (code >> 24) as u8,
        (code >> 16) as u8,
        (code >> 8) as u8,
        code as u8,
    ];
    bytes.iter().map(|&b| b as char).collect()
}

/// Converts a 2-byte fpe2 value (two fractional bits) to an integer.
pub fn fpe2_to_int(value: [u8; 2]) -> u32 {
    ((value[0] as u32) << 6) + ((value[1] as u32) >> 2)
}

/// Reinterprets 4 raw bytes as an IEEE-754 binary32 in native byte order
/// and truncates toward zero.
pub fn flt_to_int(value: [u8; 4]) -> i32 {
    f32::from_ne_bytes(value) as i32
}

/// The closed catalogue of value encodings the firmware uses for the keys
/// this crate reads. The introspected type of an arbitrary key may fall
/// outside this set; see `smc::KeyInfo` for that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// One-byte boolean flag.
    Flag,
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit unsigned integer.
    U32,
    /// 2-byte fixed point, two fractional bits. Legacy fan-speed encoding.
    Fpe2,
    /// 2-byte signed fixed point, 7 integer / 8 fraction bits. Temperatures.
    Sp78,
    /// 4-byte IEEE float. Fan-speed encoding on newer firmware.
    Flt,
    /// 16-byte fan descriptor struct.
    Fds,
}

impl ValueType {
    /// The four-character type code the firmware reports for this encoding.
    pub fn code(self) -> u32 {
        four_char_code(match self {
            ValueType::Flag => "flag",
            ValueType::U8 => "ui8 ",
            ValueType::U32 => "ui32",
            ValueType::Fpe2 => "fpe2",
            ValueType::Sp78 => "sp78",
            ValueType::Flt => "flt ",
            ValueType::Fds => "{fds",
        })
    }

    /// Payload size in bytes.
    pub fn size(self) -> u32 {
        match self {
            ValueType::Flag | ValueType::U8 => 1,
            ValueType::Fpe2 | ValueType::Sp78 => 2,
            ValueType::U32 | ValueType::Flt => 4,
            ValueType::Fds => 16,
        }
    }
}
