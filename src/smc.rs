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

//! Typed reads of named controller keys.
//!
//! Builds read and introspection envelopes on top of [`ControllerChannel`]
//! and decodes the payloads. Fan-speed keys carry the one sanctioned retry in
//! the crate: firmware generations disagree on the encoding, so a failed
//! fpe2 read is retried once as a 4-byte float before the error propagates.

use serde_json::json;

use crate::channel::{ControllerChannel, ControllerPort};
use crate::error::Result;
use crate::key::{flt_to_int, four_char_code, four_char_string, fpe2_to_int, ValueType};
use crate::logger;
use crate::protocol::{Opcode, ParamStruct, Selector, SmcBytes};

/// CPU die temperature sensor.
pub const KEY_CPU_TEMP: &str = "TC0F";
/// Number of fans.
pub const KEY_FAN_COUNT: &str = "FNum";
/// Number of batteries.
pub const KEY_BATTERY_COUNT: &str = "BNum";
/// Battery state bits; bit 0 is the charging/AC flag.
pub const KEY_BATTERY_STATE: &str = "BSIn";

/// Type and size of a key as reported by the controller. The reported type
/// code may fall outside the [`ValueType`] catalogue for exotic keys, so the
/// raw code is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub data_type: u32,
    pub data_size: u32,
}

/// Read access to the controller's key space.
#[derive(Debug)]
pub struct SmcAccess<P: ControllerPort> {
    channel: ControllerChannel<P>,
}

impl<P: ControllerPort> SmcAccess<P> {
    pub fn new(port: P) -> Self {
        Self { channel: ControllerChannel::new(port) }
    }

    pub fn open(&mut self) -> Result<()> {
        self.channel.open()
    }

    pub fn close(&mut self) -> Result<()> {
        self.channel.close()
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Asks the controller for the declared type and size of a key.
    pub fn key_info(&mut self, key: &str) -> Result<KeyInfo> {
        let mut input = ParamStruct::default();
        input.key = four_char_code(key);
        input.data8 = Opcode::GetKeyInfo as u8;

        let resp = self.channel.call(&input, Selector::HandleYpcEvent)?;
        Ok(KeyInfo {
            data_type: resp.key_info.data_type,
            data_size: resp.key_info.data_size,
        })
    }

    /// Introspects a key and renders its reported type code as text.
    pub fn key_type_string(&mut self, key: &str) -> Result<String> {
        let info = self.key_info(key)?;
        Ok(four_char_string(info.data_type))
    }

    /// Reads a key declaring the given value type. The full 32-byte payload
    /// is returned; bytes past the type's size are undefined.
    pub fn read_key(&mut self, key: &str, ty: ValueType) -> Result<SmcBytes> {
        let mut input = ParamStruct::default();
        input.key = four_char_code(key);
        input.key_info.data_size = ty.size();
        input.data8 = Opcode::ReadKey as u8;

        let resp = self.channel.call(&input, Selector::HandleYpcEvent)?;
        Ok(resp.bytes)
    }

    /// CPU die temperature in integer degrees Celsius.
    pub fn cpu_temp(&mut self) -> Result<u32> {
        self.cpu_temp_at(KEY_CPU_TEMP)
    }

    /// Temperature read from an explicit sensor key (sp78-encoded; the first
    /// byte is the integer part).
    pub fn cpu_temp_at(&mut self, key: &str) -> Result<u32> {
        let bytes = self.read_key(key, ValueType::Sp78)?;
        Ok(bytes[0] as u32)
    }

    pub fn fan_count(&mut self) -> Result<u32> {
        let bytes = self.read_key(KEY_FAN_COUNT, ValueType::U8)?;
        Ok(bytes[0] as u32)
    }

    /// Lowest possible rpm of the given fan.
    pub fn min_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.read_fan_key(format!("F{}Mn", fan_id))
    }

    /// Highest possible rpm of the given fan.
    pub fn max_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.read_fan_key(format!("F{}Mx", fan_id))
    }

    /// Current rpm of the given fan.
    pub fn current_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.read_fan_key(format!("F{}Ac", fan_id))
    }

    pub fn battery_count(&mut self) -> Result<u32> {
        let bytes = self.read_key(KEY_BATTERY_COUNT, ValueType::U8)?;
        Ok(bytes[0] as u32)
    }

    /// Whether the battery is currently being charged (bit 0 of the state key).
    pub fn is_charging(&mut self) -> Result<bool> {
        let bytes = self.read_key(KEY_BATTERY_STATE, ValueType::U8)?;
        Ok(bytes[0] & 1 != 0)
    }

    /// Fan-speed keys changed encoding across firmware generations: older
    /// machines use fpe2, newer ones a 4-byte float. Probe as fpe2 first and
    /// fall back to float on any controller error; a second failure is final.
    fn read_fan_key(&mut self, key: String) -> Result<i32> {
        match self.read_key(&key, ValueType::Fpe2) {
            Ok(bytes) => Ok(fpe2_to_int([bytes[0], bytes[1]]) as i32),
            Err(first_err) => {
                logger::log_event(
                    "fan_key_fallback",
                    json!({ "key": key, "error": first_err.to_string() }),
                );
                let bytes = self.read_key(&key, ValueType::Flt)?;
                Ok(flt_to_int([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }
}
