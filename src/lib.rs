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

//! Smcmon - Mac sensor and power telemetry via the SMC
//!
//! This library reads CPU temperature, fan speeds and battery state from the
//! SMC's typed key-value space over a privileged IOKit connection, and
//! combines them with host kernel statistics (memory, CPU ticks, battery
//! registry) into plain numeric readings.

pub mod battery;
pub mod channel;
pub mod config;
pub mod error;
pub mod host;
pub mod key;
pub mod logger;
pub mod protocol;
pub mod smc;
pub mod telemetry;

#[cfg(target_os = "macos")]
pub mod iokit;

#[cfg(test)]
pub mod test_utils;
