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

//! Host kernel statistics: virtual-memory pages, CPU ticks, physical memory.
//!
//! Each query is a single synchronous call with no retry; failures surface as
//! [`SmcError::HostQuery`]. The trait exists so the telemetry layer can be
//! driven from canned samples in tests.

use crate::error::Result;

/// Virtual-memory page counts plus the page size they are denominated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmStats {
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    pub wired: u64,
    pub compressed: u64,
    pub page_size: u64,
}

/// One CPU tick sample. Counters are cumulative since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTickSample {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

pub trait HostStats {
    fn vm_stats(&self) -> Result<VmStats>;
    fn cpu_ticks(&self) -> Result<CpuTickSample>;
    fn total_memory_bytes(&self) -> Result<u64>;
}

#[cfg(target_os = "macos")]
pub use mach_host::MachHostStats;

#[cfg(target_os = "macos")]
mod mach_host {
    use std::mem::{size_of, MaybeUninit};

    use libc::{c_char, c_int, c_uint, c_void};

    use super::{CpuTickSample, HostStats, VmStats};
    use crate::error::{Result, SmcError};

    type KernReturn = i32;
    type MachPort = u32;
    type NaturalT = u32;

    const KERN_SUCCESS: KernReturn = 0;
    const HOST_CPU_LOAD_INFO: c_int = 3;
    const HOST_VM_INFO64: c_int = 4;

    const CPU_STATE_USER: usize = 0;
    const CPU_STATE_SYSTEM: usize = 1;
    const CPU_STATE_IDLE: usize = 2;
    const CPU_STATE_NICE: usize = 3;

    /// `struct vm_statistics64` from <mach/vm_statistics.h>.
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct VmStatistics64 {
        free_count: NaturalT,
        active_count: NaturalT,
        inactive_count: NaturalT,
        wire_count: NaturalT,
        zero_fill_count: u64,
        reactivations: u64,
        pageins: u64,
        pageouts: u64,
        faults: u64,
        cow_faults: u64,
        lookups: u64,
        hits: u64,
        purges: u64,
        purgeable_count: NaturalT,
        speculative_count: NaturalT,
        decompressions: u64,
        compressions: u64,
        swapins: u64,
        swapouts: u64,
        compressor_page_count: NaturalT,
        throttled_count: NaturalT,
        external_page_count: NaturalT,
        internal_page_count: NaturalT,
        total_uncompressed_pages_in_compressor: u64,
    }

    /// `struct host_cpu_load_info` from <mach/host_info.h>.
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct HostCpuLoadInfo {
        cpu_ticks: [NaturalT; 4],
    }

    extern "C" {
        fn mach_host_self() -> MachPort;
        fn host_statistics(
            host: MachPort,
            flavor: c_int,
            info: *mut c_int,
            count: *mut c_uint,
        ) -> KernReturn;
        fn host_statistics64(
            host: MachPort,
            flavor: c_int,
            info: *mut c_int,
            count: *mut c_uint,
        ) -> KernReturn;
        fn host_page_size(host: MachPort, page_size: *mut usize) -> KernReturn;
    }

    /// Host statistics backed by the Mach host interfaces.
    #[derive(Debug, Default)]
    pub struct MachHostStats;

    impl MachHostStats {
        pub fn new() -> Self {
            Self
        }
    }

    impl HostStats for MachHostStats {
        fn vm_stats(&self) -> Result<VmStats> {
            let mut stats = MaybeUninit::<VmStatistics64>::zeroed();
            let mut count = (size_of::<VmStatistics64>() / size_of::<c_int>()) as c_uint;
            let host = unsafe { mach_host_self() };
            let kern = unsafe {
                host_statistics64(host, HOST_VM_INFO64, stats.as_mut_ptr() as *mut c_int, &mut count)
            };
            if kern != KERN_SUCCESS {
                return Err(SmcError::HostQuery(format!(
                    "host_statistics64 failed (kern {:#010x})",
                    kern
                )));
            }
            let stats = unsafe { stats.assume_init() };

            let mut page_size: usize = 0;
            let kern = unsafe { host_page_size(host, &mut page_size) };
            if kern != KERN_SUCCESS {
                return Err(SmcError::HostQuery(format!(
                    "host_page_size failed (kern {:#010x})",
                    kern
                )));
            }

            Ok(VmStats {
                free: stats.free_count as u64,
                active: stats.active_count as u64,
                inactive: stats.inactive_count as u64,
                wired: stats.wire_count as u64,
                compressed: stats.compressor_page_count as u64,
                page_size: page_size as u64,
            })
        }

        fn cpu_ticks(&self) -> Result<CpuTickSample> {
            let mut info = MaybeUninit::<HostCpuLoadInfo>::zeroed();
            let mut count = (size_of::<HostCpuLoadInfo>() / size_of::<c_int>()) as c_uint;
            let kern = unsafe {
                host_statistics(
                    mach_host_self(),
                    HOST_CPU_LOAD_INFO,
                    info.as_mut_ptr() as *mut c_int,
                    &mut count,
                )
            };
            if kern != KERN_SUCCESS {
                return Err(SmcError::HostQuery(format!(
                    "host_statistics failed (kern {:#010x})",
                    kern
                )));
            }
            let info = unsafe { info.assume_init() };
            Ok(CpuTickSample {
                user: info.cpu_ticks[CPU_STATE_USER] as u64,
                system: info.cpu_ticks[CPU_STATE_SYSTEM] as u64,
                idle: info.cpu_ticks[CPU_STATE_IDLE] as u64,
                nice: info.cpu_ticks[CPU_STATE_NICE] as u64,
            })
        }

        fn total_memory_bytes(&self) -> Result<u64> {
            let name = b"hw.memsize\0";
            let mut value: u64 = 0;
            let mut len = size_of::<u64>();
            let rc = unsafe {
                libc::sysctlbyname(
                    name.as_ptr() as *const c_char,
                    &mut value as *mut u64 as *mut c_void,
                    &mut len,
                    std::ptr::null_mut(),
                    0,
                )
            };
            if rc != 0 {
                return Err(SmcError::HostQuery(
                    "sysctl hw.memsize failed".to_string(),
                ));
            }
            Ok(value)
        }
    }
}
