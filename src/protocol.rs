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

//! The fixed-layout record exchanged with the controller.
//!
//! Layout and field offsets are the controller's ABI and must not change.
//! The same 80-byte record shape is sent as the request and received as the
//! response; which fields are populated depends on the selector carried in
//! `data8`.

/// Maximum response payload in bytes.
pub const BYTES_LEN: usize = 32;

/// Raw value buffer. Only the first `size` bytes declared by the key's data
/// type are meaningful; the rest is undefined.
pub type SmcBytes = [u8; BYTES_LEN];

/// Firmware version sub-record. Zero-initialized on the read path.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

/// Power-limit sub-record. Zero-initialized on the read path.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcLimitData {
    pub version: u16,
    pub length: u16,
    pub cpu_plimit: u32,
    pub gpu_plimit: u32,
    pub mem_plimit: u32,
}

/// Key type information. Populated by the controller on introspection; on a
/// read request only `data_size` is filled in by the caller.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcKeyInfoData {
    pub data_size: u32,
    pub data_type: u32,
    pub data_attributes: u8,
}

/// The request/response envelope.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamStruct {
    pub key: u32,
    pub vers: SmcVersion,
    pub p_limit_data: SmcLimitData,
    pub key_info: SmcKeyInfoData,
    pub result: u8,
    pub status: u8,
    /// Command opcode, one of [`Opcode`].
    pub data8: u8,
    pub data32: u32,
    pub bytes: SmcBytes,
}

/// Kernel call selectors for the struct method.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The event selector every key operation goes through.
    HandleYpcEvent = 2,
    ReadKey = 5,
    WriteKey = 6,
    KeyFromIndex = 8,
    GetKeyInfo = 9,
}

/// In-envelope command opcodes carried in `data8`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    ReadKey = 5,
    WriteKey = 6,
    KeyFromIndex = 8,
    GetKeyInfo = 9,
}

/// Controller result byte: operation succeeded.
pub const RESULT_SUCCESS: u8 = 0;
/// Controller result byte: generic failure.
pub const RESULT_ERROR: u8 = 1;
/// Controller result byte: the key is not present in the firmware's table.
pub const RESULT_KEY_NOT_FOUND: u8 = 132;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_envelope_matches_controller_abi() {
        // Fixed offsets; the kernel interprets the record byte-for-byte.
        assert_eq!(size_of::<ParamStruct>(), 80);
        assert_eq!(offset_of!(ParamStruct, key), 0);
        assert_eq!(offset_of!(ParamStruct, vers), 4);
        assert_eq!(offset_of!(ParamStruct, p_limit_data), 12);
        assert_eq!(offset_of!(ParamStruct, key_info), 28);
        assert_eq!(offset_of!(ParamStruct, result), 40);
        assert_eq!(offset_of!(ParamStruct, status), 41);
        assert_eq!(offset_of!(ParamStruct, data8), 42);
        assert_eq!(offset_of!(ParamStruct, data32), 44);
        assert_eq!(offset_of!(ParamStruct, bytes), 48);
    }

    #[test]
    fn test_sub_record_sizes() {
        assert_eq!(size_of::<SmcVersion>(), 6);
        assert_eq!(size_of::<SmcLimitData>(), 16);
        assert_eq!(size_of::<SmcKeyInfoData>(), 12);
    }

    #[test]
    fn test_envelope_default_is_zeroed() {
        let p = ParamStruct::default();
        assert_eq!(p.key, 0);
        assert_eq!(p.vers, SmcVersion::default());
        assert_eq!(p.p_limit_data, SmcLimitData::default());
        assert_eq!(p.key_info, SmcKeyInfoData::default());
        assert_eq!(p.result, 0);
        assert_eq!(p.data8, 0);
        assert_eq!(p.data32, 0);
        assert!(p.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_opcode_values() {
        assert_eq!(Opcode::ReadKey as u8, 5);
        assert_eq!(Opcode::GetKeyInfo as u8, 9);
        assert_eq!(Selector::HandleYpcEvent as u8, 2);
    }
}
