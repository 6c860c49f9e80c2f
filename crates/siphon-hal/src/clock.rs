//! Host clock backed by `mach_absolute_time`.

use siphon_core::HostClock;

/// The HAL's time base: mach absolute time.
#[derive(Debug, Clone, Copy)]
pub struct MachClock {
    ticks_per_second: f64,
}

impl MachClock {
    #[allow(deprecated)]
    pub fn new() -> Self {
        let mut info = libc::mach_timebase_info_data_t { numer: 0, denom: 0 };
        // SAFETY: `info` is a valid out-pointer for the duration of the call.
        unsafe {
            libc::mach_timebase_info(&mut info);
        }
        // ticks * numer / denom = nanoseconds
        let ticks_per_second = if info.numer == 0 || info.denom == 0 {
            1_000_000_000.0
        } else {
            1_000_000_000.0 * f64::from(info.denom) / f64::from(info.numer)
        };
        Self { ticks_per_second }
    }
}

impl Default for MachClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MachClock {
    #[allow(deprecated)]
    fn now(&self) -> u64 {
        // SAFETY: no preconditions.
        unsafe { libc::mach_absolute_time() }
    }

    fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }
}
