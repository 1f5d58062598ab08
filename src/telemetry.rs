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

//! The telemetry facade: controller reads plus host-derived metrics.
//!
//! Owns the one controller connection per instance. CPU utilization is
//! stateful: one tick sample is retained and replaced on every
//! [`Telemetry::cpu_usage`] call, so each result is the delta since the
//! previous call (the first since construction). Concurrent use from several
//! threads requires external synchronization around the whole facade.

use serde::Serialize;

use crate::battery::BatteryRegistry;
use crate::channel::ControllerPort;
use crate::error::Result;
use crate::host::{CpuTickSample, HostStats};
use crate::smc::SmcAccess;

/// Bytes per binary gibibyte.
pub const BYTES_PER_GIB: f64 = 1_073_741_824.0;

/// Memory breakdown in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryBreakdown {
    pub free: f64,
    pub active: f64,
    pub inactive: f64,
    pub wired: f64,
    pub compressed: f64,
}

/// CPU utilization per category, in percent of the sampled interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuUsage {
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub nice: f64,
}

pub struct Telemetry<P: ControllerPort, H: HostStats, B: BatteryRegistry> {
    smc: SmcAccess<P>,
    host: H,
    battery: B,
    prev_ticks: CpuTickSample,
}

impl<P: ControllerPort, H: HostStats, B: BatteryRegistry> Telemetry<P, H, B> {
    /// Opens the controller connection and takes the baseline CPU tick
    /// sample. If the baseline query fails the connection is released before
    /// the error propagates.
    pub fn new(port: P, host: H, battery: B) -> Result<Self> {
        let mut smc = SmcAccess::new(port);
        smc.open()?;
        let prev_ticks = host.cpu_ticks()?;
        Ok(Self { smc, host, battery, prev_ticks })
    }

    /// Releases the controller connection explicitly. Also runs on drop.
    pub fn close(&mut self) -> Result<()> {
        self.smc.close()
    }

    /// Free/active/inactive/wired/compressed memory, page counts scaled by
    /// the page size and expressed in GiB.
    pub fn memory_usage(&self) -> Result<MemoryBreakdown> {
        let vm = self.host.vm_stats()?;
        let to_gib = |pages: u64| (pages * vm.page_size) as f64 / BYTES_PER_GIB;
        Ok(MemoryBreakdown {
            free: to_gib(vm.free),
            active: to_gib(vm.active),
            inactive: to_gib(vm.inactive),
            wired: to_gib(vm.wired),
            compressed: to_gib(vm.compressed),
        })
    }

    /// Total physical memory in GiB.
    pub fn total_memory(&self) -> Result<f64> {
        Ok(self.host.total_memory_bytes()? as f64 / BYTES_PER_GIB)
    }

    /// Utilization since the previously retained sample, which this call
    /// replaces. Returns zeros when no ticks elapsed between the samples.
    pub fn cpu_usage(&mut self) -> Result<CpuUsage> {
        let current = self.host.cpu_ticks()?;
        let user = current.user.saturating_sub(self.prev_ticks.user);
        let system = current.system.saturating_sub(self.prev_ticks.system);
        let idle = current.idle.saturating_sub(self.prev_ticks.idle);
        let nice = current.nice.saturating_sub(self.prev_ticks.nice);
        self.prev_ticks = current;

        let total = (user + system + idle + nice) as f64;
        if total == 0.0 {
            return Ok(CpuUsage { user: 0.0, system: 0.0, idle: 0.0, nice: 0.0 });
        }
        Ok(CpuUsage {
            user: user as f64 / total * 100.0,
            system: system as f64 / total * 100.0,
            idle: idle as f64 / total * 100.0,
            nice: nice as f64 / total * 100.0,
        })
    }

    /// Remaining battery health as max capacity over design capacity.
    pub fn battery_health(&self) -> Result<f64> {
        Ok(self.battery.snapshot()?.health())
    }

    /// Completed battery charge cycles.
    pub fn battery_cycles(&self) -> Result<i64> {
        Ok(self.battery.snapshot()?.cycle_count)
    }

    pub fn cpu_temp(&mut self) -> Result<u32> {
        self.smc.cpu_temp()
    }

    pub fn cpu_temp_at(&mut self, key: &str) -> Result<u32> {
        self.smc.cpu_temp_at(key)
    }

    pub fn fan_count(&mut self) -> Result<u32> {
        self.smc.fan_count()
    }

    pub fn min_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.smc.min_fan_speed(fan_id)
    }

    pub fn max_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.smc.max_fan_speed(fan_id)
    }

    pub fn current_fan_speed(&mut self, fan_id: u32) -> Result<i32> {
        self.smc.current_fan_speed(fan_id)
    }

    pub fn battery_count(&mut self) -> Result<u32> {
        self.smc.battery_count()
    }

    pub fn is_charging(&mut self) -> Result<bool> {
        self.smc.is_charging()
    }

    pub fn key_type_string(&mut self, key: &str) -> Result<String> {
        self.smc.key_type_string(key)
    }
}
