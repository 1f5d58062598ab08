/*
 * Test utilities and mock helpers for Smcmon
 *
 * This module provides scripted transport fakes, canned controller replies,
 * and helper assertions shared across test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use crate::battery::{BatteryRegistry, BatterySnapshot};
    use crate::channel::{ControllerPort, OpenOutcome, KERN_SUCCESS};
    use crate::error::{Result, SmcError};
    use crate::host::{CpuTickSample, HostStats, VmStats};
    use crate::protocol::{ParamStruct, Selector, RESULT_KEY_NOT_FOUND};

    /// Scripted [`ControllerPort`]: replays canned replies in order and
    /// records everything sent through it.
    pub struct ScriptedPort {
        pub open_outcome: OpenOutcome,
        pub close_code: i32,
        pub replies: VecDeque<(i32, ParamStruct)>,
        pub calls: Rc<RefCell<Vec<(Selector, ParamStruct)>>>,
        pub open_count: Rc<RefCell<usize>>,
        pub close_count: Rc<RefCell<usize>>,
    }

    impl ScriptedPort {
        pub fn new() -> Self {
            Self {
                open_outcome: OpenOutcome::Opened,
                close_code: KERN_SUCCESS,
                replies: VecDeque::new(),
                calls: Rc::new(RefCell::new(Vec::new())),
                open_count: Rc::new(RefCell::new(0)),
                close_count: Rc::new(RefCell::new(0)),
            }
        }

        /// A port whose service lookup fails.
        pub fn unavailable() -> Self {
            let mut port = Self::new();
            port.open_outcome = OpenOutcome::ServiceMissing;
            port
        }

        /// A port whose open call is rejected with the given kernel code.
        pub fn rejecting(kern: i32) -> Self {
            let mut port = Self::new();
            port.open_outcome = OpenOutcome::Rejected(kern);
            port
        }

        pub fn push_reply(&mut self, reply: (i32, ParamStruct)) {
            self.replies.push_back(reply);
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ControllerPort for ScriptedPort {
        fn open(&mut self) -> OpenOutcome {
            *self.open_count.borrow_mut() += 1;
            self.open_outcome
        }

        fn close(&mut self) -> i32 {
            *self.close_count.borrow_mut() += 1;
            self.close_code
        }

        fn call(&mut self, selector: Selector, input: &ParamStruct) -> (i32, ParamStruct) {
            self.calls.borrow_mut().push((selector, *input));
            self.replies
                .pop_front()
                .unwrap_or((KERN_SUCCESS, ParamStruct::default()))
        }
    }

    /// A successful reply carrying the given payload bytes.
    pub fn success_reply(payload: &[u8]) -> (i32, ParamStruct) {
        let mut resp = ParamStruct::default();
        resp.bytes[..payload.len()].copy_from_slice(payload);
        (KERN_SUCCESS, resp)
    }

    /// A reply whose controller result byte says the key does not exist.
    pub fn key_not_found_reply() -> (i32, ParamStruct) {
        let mut resp = ParamStruct::default();
        resp.result = RESULT_KEY_NOT_FOUND;
        (KERN_SUCCESS, resp)
    }

    /// A successful introspection reply reporting the given type and size.
    pub fn key_info_reply(type_code: u32, size: u32) -> (i32, ParamStruct) {
        let mut resp = ParamStruct::default();
        resp.key_info.data_type = type_code;
        resp.key_info.data_size = size;
        (KERN_SUCCESS, resp)
    }

    /// Host statistics fake fed from fixed values; CPU tick samples are
    /// handed out in sequence so tests can drive the delta computation.
    pub struct FakeHost {
        pub vm: VmStats,
        pub total_bytes: u64,
        pub ticks: RefCell<VecDeque<CpuTickSample>>,
        pub fail_ticks: bool,
    }

    impl FakeHost {
        pub fn new(ticks: Vec<CpuTickSample>) -> Self {
            Self {
                vm: VmStats {
                    free: 2_000_000,
                    active: 500_000,
                    inactive: 250_000,
                    wired: 125_000,
                    compressed: 60_000,
                    page_size: 4096,
                },
                total_bytes: 16 * 1_073_741_824,
                ticks: RefCell::new(ticks.into()),
                fail_ticks: false,
            }
        }
    }

    impl HostStats for FakeHost {
        fn vm_stats(&self) -> Result<VmStats> {
            Ok(self.vm.clone())
        }

        fn cpu_ticks(&self) -> Result<CpuTickSample> {
            if self.fail_ticks {
                return Err(SmcError::HostQuery("scripted tick failure".to_string()));
            }
            self.ticks
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| SmcError::HostQuery("tick script exhausted".to_string()))
        }

        fn total_memory_bytes(&self) -> Result<u64> {
            Ok(self.total_bytes)
        }
    }

    /// Battery registry fake with a fixed snapshot.
    pub struct FakeBattery {
        pub snapshot: Option<BatterySnapshot>,
    }

    impl FakeBattery {
        pub fn healthy() -> Self {
            Self {
                snapshot: Some(BatterySnapshot {
                    design_capacity: 5000,
                    max_capacity: 4500,
                    cycle_count: 312,
                }),
            }
        }

        pub fn missing() -> Self {
            Self { snapshot: None }
        }
    }

    impl BatteryRegistry for FakeBattery {
        fn snapshot(&self) -> Result<BatterySnapshot> {
            self.snapshot
                .clone()
                .ok_or_else(|| SmcError::RegistryRead("battery entry unavailable".to_string()))
        }
    }

    /// Asserts that two floating point numbers are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            (a - b).abs() < tolerance,
            "Values {} and {} are not approximately equal (tolerance: {})",
            a, b, tolerance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::channel::{ControllerPort, KERN_SUCCESS};
    use crate::protocol::{ParamStruct, Selector, RESULT_KEY_NOT_FOUND};

    #[test]
    fn test_scripted_port_replays_in_order() {
        let mut port = ScriptedPort::new();
        port.push_reply(success_reply(&[0x2F, 0x80]));
        port.push_reply(key_not_found_reply());

        let (kern, first) = port.call(Selector::HandleYpcEvent, &ParamStruct::default());
        assert_eq!(kern, KERN_SUCCESS);
        assert_eq!(first.bytes[0], 0x2F);

        let (_, second) = port.call(Selector::HandleYpcEvent, &ParamStruct::default());
        assert_eq!(second.result, RESULT_KEY_NOT_FOUND);

        assert_eq!(port.call_count(), 2);
    }

    #[test]
    fn test_key_info_reply_shape() {
        let (kern, resp) = key_info_reply(crate::key::four_char_code("fpe2"), 2);
        assert_eq!(kern, KERN_SUCCESS);
        assert_eq!(resp.key_info.data_size, 2);
        assert_eq!(crate::key::four_char_string(resp.key_info.data_type), "fpe2");
    }

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.001, 0.01);
        assert_approx_eq(7.629, 7.6294, 0.001);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.01);
    }
}
