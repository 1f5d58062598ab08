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

//! The privileged connection to the controller.
//!
//! [`ControllerChannel`] owns the connection lifecycle (Closed -> Open ->
//! Closed) and is the single place where raw kernel/controller status codes
//! become [`SmcError`] values. The raw transport sits behind
//! [`ControllerPort`] so the mapping can be exercised without hardware.
//!
//! The channel is a strict request/response primitive: one call in flight at
//! a time, enforced by `&mut self`. There is no pipelining, no timeout and no
//! cancellation; a call blocks until the transport returns.

use serde_json::json;

use crate::error::{Result, SmcError};
use crate::key::four_char_string;
use crate::logger;
use crate::protocol::{ParamStruct, Selector, RESULT_KEY_NOT_FOUND, RESULT_SUCCESS};

/// Registered name of the controller service.
pub const SERVICE_NAME: &str = "AppleSMC";

/// Kernel success code.
pub const KERN_SUCCESS: i32 = 0;
/// Kernel code for a call rejected for lack of privileges.
pub const KERN_NOT_PRIVILEGED: i32 = 0xE00002C1_u32 as i32;

/// Outcome of the service lookup plus connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// No service with [`SERVICE_NAME`] is registered.
    ServiceMissing,
    /// The service exists but the open call returned the given kernel code.
    Rejected(i32),
}

/// Raw struct-in/struct-out transport to the controller.
///
/// Implementations report kernel codes untranslated; all mapping into the
/// crate error taxonomy happens in [`ControllerChannel`].
#[cfg_attr(test, mockall::automock)]
pub trait ControllerPort {
    /// Locate the controller service and open a privileged connection.
    fn open(&mut self) -> OpenOutcome;

    /// Release the connection, returning the raw kernel code.
    fn close(&mut self) -> i32;

    /// Send one envelope and receive the same-shaped response, returning the
    /// raw kernel code alongside it. The response is only meaningful when the
    /// code is [`KERN_SUCCESS`].
    fn call(&mut self, selector: Selector, input: &ParamStruct) -> (i32, ParamStruct);
}

/// Connection state machine over a [`ControllerPort`].
#[derive(Debug)]
pub struct ControllerChannel<P: ControllerPort> {
    port: P,
    open: bool,
}

impl<P: ControllerPort> ControllerChannel<P> {
    pub fn new(port: P) -> Self {
        Self { port, open: false }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Closed -> Open. Opening an already-open channel is an error rather
    /// than a silent no-op, so a double acquisition never leaks a handle.
    pub fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(SmcError::InvalidState("connection already open"));
        }
        match self.port.open() {
            OpenOutcome::Opened => {
                self.open = true;
                Ok(())
            }
            OpenOutcome::ServiceMissing => Err(SmcError::ServiceNotFound),
            OpenOutcome::Rejected(kern) => Err(SmcError::ConnectionRefused(kern)),
        }
    }

    /// Open -> Closed. The channel is considered closed afterwards even when
    /// the release reports non-success; the handle must not be released twice.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Err(SmcError::InvalidState("connection not open"));
        }
        self.open = false;
        let kern = self.port.close();
        if kern != KERN_SUCCESS {
            return Err(SmcError::CloseFailed(kern));
        }
        Ok(())
    }

    /// The single I/O primitive: one envelope in, one envelope out.
    pub fn call(&mut self, input: &ParamStruct, selector: Selector) -> Result<ParamStruct> {
        if !self.open {
            return Err(SmcError::InvalidState("connection not open"));
        }
        let (kern, response) = self.port.call(selector, input);
        if kern == KERN_SUCCESS && response.result == RESULT_SUCCESS {
            Ok(response)
        } else if kern == KERN_SUCCESS && response.result == RESULT_KEY_NOT_FOUND {
            Err(SmcError::KeyNotFound(four_char_string(input.key)))
        } else if kern == KERN_NOT_PRIVILEGED {
            Err(SmcError::PermissionDenied)
        } else {
            Err(SmcError::UnknownController { kern, result: response.result })
        }
    }
}

impl<P: ControllerPort> Drop for ControllerChannel<P> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                // Non-fatal at teardown, but must stay observable.
                logger::log_event("channel_close_failed", json!({ "error": e.to_string() }));
            }
        }
    }
}
