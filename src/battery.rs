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

//! Battery capacity and cycle data from the smart-battery registry entry.
//!
//! These values come from the platform registry, not the controller channel:
//! one property-dictionary read per snapshot. A missing entry or property is
//! [`SmcError::RegistryRead`]; nothing is defaulted.

use crate::error::Result;

/// One read of the battery registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatterySnapshot {
    /// Capacity the battery shipped with, in mAh.
    pub design_capacity: i64,
    /// Capacity the battery can currently hold, in mAh.
    pub max_capacity: i64,
    /// Completed charge cycles.
    pub cycle_count: i64,
}

impl BatterySnapshot {
    /// Remaining health as a fraction of design capacity.
    pub fn health(&self) -> f64 {
        self.max_capacity as f64 / self.design_capacity as f64
    }
}

pub trait BatteryRegistry {
    fn snapshot(&self) -> Result<BatterySnapshot>;
}

#[cfg(target_os = "macos")]
pub use smart_battery::SmartBatteryRegistry;

#[cfg(target_os = "macos")]
mod smart_battery {
    use libc::{c_char, c_void};

    use super::{BatteryRegistry, BatterySnapshot};
    use crate::error::{Result, SmcError};

    type CfTypeRef = *const c_void;
    type CfStringRef = *const c_void;
    type CfDictionaryRef = *mut c_void;
    type CfAllocatorRef = *const c_void;
    type IoRegistryEntry = u32;
    type KernReturn = i32;

    const KERN_SUCCESS: KernReturn = 0;
    const CF_NUMBER_SINT32_TYPE: i64 = 3;
    const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;

    const BATTERY_PATH: &[u8] = b"IOService:/AppleACPIPlatformExpert/SMB0/\
AppleECSMBusController/AppleSmartBatteryManager/AppleSmartBattery\0";

    #[link(name = "IOKit", kind = "framework")]
    extern "C" {
        fn IORegistryEntryFromPath(master_port: u32, path: *const c_char) -> IoRegistryEntry;
        fn IORegistryEntryCreateCFProperties(
            entry: IoRegistryEntry,
            properties: *mut CfDictionaryRef,
            allocator: CfAllocatorRef,
            options: u32,
        ) -> KernReturn;
        fn IOObjectRelease(object: u32) -> KernReturn;
    }

    #[link(name = "CoreFoundation", kind = "framework")]
    extern "C" {
        fn CFStringCreateWithCString(
            alloc: CfAllocatorRef,
            c_str: *const c_char,
            encoding: u32,
        ) -> CfStringRef;
        fn CFDictionaryGetValue(dict: CfDictionaryRef, key: *const c_void) -> *const c_void;
        fn CFNumberGetValue(number: *const c_void, number_type: i64, value: *mut c_void) -> u8;
        fn CFRelease(cf: CfTypeRef);
    }

    /// Reads one SInt32 property or fails; never defaults a missing value.
    unsafe fn dict_i32(dict: CfDictionaryRef, name: &[u8]) -> Result<i32> {
        let key = CFStringCreateWithCString(
            std::ptr::null(),
            name.as_ptr() as *const c_char,
            CF_STRING_ENCODING_UTF8,
        );
        if key.is_null() {
            return Err(SmcError::RegistryRead("failed to build property key".to_string()));
        }
        let value = CFDictionaryGetValue(dict, key);
        CFRelease(key);
        if value.is_null() {
            let prop = String::from_utf8_lossy(&name[..name.len() - 1]).to_string();
            return Err(SmcError::RegistryRead(format!("property '{}' absent", prop)));
        }
        let mut out: i32 = 0;
        if CFNumberGetValue(value, CF_NUMBER_SINT32_TYPE, &mut out as *mut i32 as *mut c_void) == 0 {
            let prop = String::from_utf8_lossy(&name[..name.len() - 1]).to_string();
            return Err(SmcError::RegistryRead(format!("property '{}' not numeric", prop)));
        }
        Ok(out)
    }

    /// Battery data from the AppleSmartBattery registry entry.
    #[derive(Debug, Default)]
    pub struct SmartBatteryRegistry;

    impl SmartBatteryRegistry {
        pub fn new() -> Self {
            Self
        }
    }

    impl BatteryRegistry for SmartBatteryRegistry {
        fn snapshot(&self) -> Result<BatterySnapshot> {
            unsafe {
                let entry = IORegistryEntryFromPath(0, BATTERY_PATH.as_ptr() as *const c_char);
                if entry == 0 {
                    return Err(SmcError::RegistryRead(
                        "smart battery registry entry not found".to_string(),
                    ));
                }

                let mut dict: CfDictionaryRef = std::ptr::null_mut();
                let kern =
                    IORegistryEntryCreateCFProperties(entry, &mut dict, std::ptr::null(), 0);
                IOObjectRelease(entry);
                if kern != KERN_SUCCESS || dict.is_null() {
                    return Err(SmcError::RegistryRead(format!(
                        "could not copy battery properties (kern {:#010x})",
                        kern
                    )));
                }

                let result: Result<BatterySnapshot> = (|| {
                    Ok(BatterySnapshot {
                        design_capacity: dict_i32(dict, b"DesignCapacity\0")? as i64,
                        max_capacity: dict_i32(dict, b"MaxCapacity\0")? as i64,
                        cycle_count: dict_i32(dict, b"CycleCount\0")? as i64,
                    })
                })();
                CFRelease(dict);
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::assert_approx_eq;

    #[test]
    fn test_health_fraction() {
        let snap = BatterySnapshot {
            design_capacity: 5000,
            max_capacity: 4500,
            cycle_count: 312,
        };
        assert_approx_eq(snap.health(), 0.9, 1e-9);
    }

    #[test]
    fn test_health_can_exceed_one_on_fresh_cells() {
        let snap = BatterySnapshot {
            design_capacity: 5000,
            max_capacity: 5100,
            cycle_count: 3,
        };
        assert!(snap.health() > 1.0);
    }
}
