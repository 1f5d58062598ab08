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

//! IOKit-backed controller transport.
//!
//! The only module that talks to the real kernel service. Kernel codes are
//! passed through untranslated; the channel layer owns the mapping.

use std::mem::size_of;

use libc::{c_char, c_void};

use crate::channel::{ControllerPort, OpenOutcome, KERN_SUCCESS};
use crate::protocol::{ParamStruct, Selector};

/// NUL-terminated [`crate::channel::SERVICE_NAME`] for the matching call.
const SERVICE_NAME_C: &[u8] = b"AppleSMC\0";

type MachPort = u32;
type IoObject = u32;
type IoService = u32;
type IoConnect = u32;
type KernReturn = i32;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const c_char) -> *mut c_void;
    fn IOServiceGetMatchingService(master_port: MachPort, matching: *mut c_void) -> IoService;
    fn IOServiceOpen(
        service: IoService,
        owning_task: MachPort,
        conn_type: u32,
        connect: *mut IoConnect,
    ) -> KernReturn;
    fn IOServiceClose(connect: IoConnect) -> KernReturn;
    fn IOObjectRelease(object: IoObject) -> KernReturn;
    fn IOConnectCallStructMethod(
        connection: IoConnect,
        selector: u32,
        input: *const c_void,
        input_size: usize,
        output: *mut c_void,
        output_size: *mut usize,
    ) -> KernReturn;
}

extern "C" {
    static mach_task_self_: MachPort;
}

/// A connection to the controller service through IOKit.
#[derive(Debug, Default)]
pub struct IoKitPort {
    connection: IoConnect,
}

impl IoKitPort {
    pub fn new() -> Self {
        Self { connection: 0 }
    }
}

impl ControllerPort for IoKitPort {
    fn open(&mut self) -> OpenOutcome {
        // The matching dictionary is consumed by the lookup.
        let service = unsafe {
            IOServiceGetMatchingService(0, IOServiceMatching(SERVICE_NAME_C.as_ptr() as *const c_char))
        };
        if service == 0 {
            return OpenOutcome::ServiceMissing;
        }

        let mut connection: IoConnect = 0;
        let kern = unsafe {
            let task = mach_task_self_;
            let kern = IOServiceOpen(service, task, 0, &mut connection);
            IOObjectRelease(service);
            kern
        };
        if kern != KERN_SUCCESS {
            return OpenOutcome::Rejected(kern);
        }
        self.connection = connection;
        OpenOutcome::Opened
    }

    fn close(&mut self) -> i32 {
        let kern = unsafe { IOServiceClose(self.connection) };
        self.connection = 0;
        kern
    }

    fn call(&mut self, selector: Selector, input: &ParamStruct) -> (i32, ParamStruct) {
        let mut output = ParamStruct::default();
        let mut output_size = size_of::<ParamStruct>();
        let kern = unsafe {
            IOConnectCallStructMethod(
                self.connection,
                selector as u32,
                input as *const ParamStruct as *const c_void,
                size_of::<ParamStruct>(),
                &mut output as *mut ParamStruct as *mut c_void,
                &mut output_size,
            )
        };
        (kern, output)
    }
}
