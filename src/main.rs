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

use smcmon::config::{self, MonitorConfig};
use smcmon::logger;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let cfg = config::load_config().unwrap_or_default();
    let logging = cfg.logging || args.iter().any(|a| a == "--logging");
    if logging {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    if unsafe { libc::geteuid() } != 0 {
        eprintln!("note: not running as root; privileged SMC keys may be denied");
    }

    let once = args.iter().any(|a| a == "--once");
    let as_json = args.iter().any(|a| a == "--json");
    run(&cfg, once, as_json)
}

#[cfg(target_os = "macos")]
fn run(cfg: &MonitorConfig, once: bool, as_json: bool) -> anyhow::Result<()> {
    use std::thread;
    use std::time::Duration;

    use smcmon::battery::SmartBatteryRegistry;
    use smcmon::error::SmcError;
    use smcmon::host::MachHostStats;
    use smcmon::iokit::IoKitPort;
    use smcmon::telemetry::Telemetry;

    let mut telemetry =
        match Telemetry::new(IoKitPort::new(), MachHostStats::new(), SmartBatteryRegistry::new()) {
            Ok(t) => t,
            Err(e @ (SmcError::ConnectionRefused(_) | SmcError::PermissionDenied)) => {
                eprintln!("error: {}", e);
                eprintln!("hint: re-run with: sudo {}", std::env::args().next().unwrap_or_else(|| "smcmon".to_string()));
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("error: {}", e);
                logger::log_event("fatal_error", serde_json::json!({ "error": e.to_string() }));
                std::process::exit(1);
            }
        };

    loop {
        let snapshot = take_snapshot(&mut telemetry, cfg);
        if as_json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            print_snapshot(&snapshot);
        }
        if once {
            break;
        }
        thread::sleep(Duration::from_millis(cfg.interval_ms));
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run(_cfg: &MonitorConfig, _once: bool, _as_json: bool) -> anyhow::Result<()> {
    eprintln!("error: smcmon reads the AppleSMC service and requires macOS");
    std::process::exit(1);
}

#[cfg(target_os = "macos")]
#[derive(serde::Serialize)]
struct FanSnapshot {
    id: u32,
    current_rpm: Option<i32>,
    min_rpm: Option<i32>,
    max_rpm: Option<i32>,
}

#[cfg(target_os = "macos")]
#[derive(serde::Serialize)]
struct Snapshot {
    cpu_temp_c: Option<u32>,
    fans: Vec<FanSnapshot>,
    battery_count: Option<u32>,
    charging: Option<bool>,
    battery_health: Option<f64>,
    battery_cycles: Option<i64>,
    memory_gib: Option<smcmon::telemetry::MemoryBreakdown>,
    total_memory_gib: Option<f64>,
    cpu_usage_pct: Option<smcmon::telemetry::CpuUsage>,
}

#[cfg(target_os = "macos")]
fn take_snapshot(
    telemetry: &mut smcmon::telemetry::Telemetry<
        smcmon::iokit::IoKitPort,
        smcmon::host::MachHostStats,
        smcmon::battery::SmartBatteryRegistry,
    >,
    cfg: &MonitorConfig,
) -> Snapshot {
    let cpu_temp_c = report("cpu temp", telemetry.cpu_temp_at(&cfg.cpu_temp_key));

    let mut fans = Vec::new();
    if let Some(count) = report("fan count", telemetry.fan_count()) {
        for id in 0..count {
            fans.push(FanSnapshot {
                id,
                current_rpm: report("fan speed", telemetry.current_fan_speed(id)),
                min_rpm: report("fan min", telemetry.min_fan_speed(id)),
                max_rpm: report("fan max", telemetry.max_fan_speed(id)),
            });
        }
    }

    Snapshot {
        cpu_temp_c,
        fans,
        battery_count: report("battery count", telemetry.battery_count()),
        charging: report("charging state", telemetry.is_charging()),
        battery_health: report("battery health", telemetry.battery_health()),
        battery_cycles: report("battery cycles", telemetry.battery_cycles()),
        memory_gib: report("memory usage", telemetry.memory_usage()),
        total_memory_gib: report("total memory", telemetry.total_memory()),
        cpu_usage_pct: report("cpu usage", telemetry.cpu_usage()),
    }
}

/// Surfaces a per-metric failure on stderr and keeps going; consumers decide
/// whether a retry is worth it.
#[cfg(target_os = "macos")]
fn report<T>(what: &str, res: smcmon::error::Result<T>) -> Option<T> {
    use smcmon::error::SmcError;
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            eprintln!("{}: {}", what, e);
            if matches!(e, SmcError::PermissionDenied) {
                eprintln!("hint: this key needs root; re-run with sudo");
            }
            None
        }
    }
}

#[cfg(target_os = "macos")]
fn print_snapshot(s: &Snapshot) {
    if let Some(t) = s.cpu_temp_c {
        println!("cpu temp: {} C", t);
    }
    for fan in &s.fans {
        println!(
            "fan {}: {} rpm (min {}, max {})",
            fan.id,
            fan.current_rpm.map_or("?".to_string(), |v| v.to_string()),
            fan.min_rpm.map_or("?".to_string(), |v| v.to_string()),
            fan.max_rpm.map_or("?".to_string(), |v| v.to_string()),
        );
    }
    if let (Some(count), Some(charging)) = (s.battery_count, s.charging) {
        println!(
            "battery: {} cell(s), {}",
            count,
            if charging { "charging" } else { "not charging" }
        );
    }
    if let (Some(health), Some(cycles)) = (s.battery_health, s.battery_cycles) {
        println!("battery health: {:.1}% ({} cycles)", health * 100.0, cycles);
    }
    if let (Some(mem), Some(total)) = (&s.memory_gib, s.total_memory_gib) {
        println!(
            "memory (GiB of {:.1}): free {:.2} active {:.2} inactive {:.2} wired {:.2} compressed {:.2}",
            total, mem.free, mem.active, mem.inactive, mem.wired, mem.compressed
        );
    }
    if let Some(cpu) = &s.cpu_usage_pct {
        println!(
            "cpu: user {:.1}% system {:.1}% idle {:.1}% nice {:.1}%",
            cpu.user, cpu.system, cpu.idle, cpu.nice
        );
    }
    println!();
}
