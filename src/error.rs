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

//! Error type shared by every module of the crate.
//!
//! Controller failures are never folded into a catch-all: `PermissionDenied`
//! and `KeyNotFound` stay distinct so callers can tell an operator whether to
//! re-run with elevated privileges or to stop asking for a key the firmware
//! does not expose.

use std::io;

/// Result type alias using SmcError
pub type Result<T> = std::result::Result<T, SmcError>;

#[derive(thiserror::Error, Debug)]
pub enum SmcError {
    /// The controller service is not registered with the kernel.
    #[error("SMC service not found")]
    ServiceNotFound,

    /// The kernel rejected the connection attempt. Usually missing privileges.
    #[error("SMC connection refused (kern {0:#010x})")]
    ConnectionRefused(i32),

    /// Releasing the connection reported non-success.
    #[error("failed to close SMC connection (kern {0:#010x})")]
    CloseFailed(i32),

    /// The controller answered but does not know the requested key.
    #[error("SMC key '{0}' not found")]
    KeyNotFound(String),

    /// The transport refused the call for lack of privileges.
    #[error("reading this SMC key requires root privileges")]
    PermissionDenied,

    /// Any transport or status outcome outside the known set.
    #[error("unknown SMC error (kern {kern:#010x}, result {result})")]
    UnknownController { kern: i32, result: u8 },

    /// A host statistics query (VM pages, CPU ticks, total memory) failed.
    #[error("host statistics query failed: {0}")]
    HostQuery(String),

    /// The battery registry entry or one of its properties was unavailable.
    #[error("battery registry read failed: {0}")]
    RegistryRead(String),

    /// An operation was issued against a channel in the wrong state.
    #[error("invalid channel state: {0}")]
    InvalidState(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}
