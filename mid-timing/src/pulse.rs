use std::io;
use std::time::Duration;

use mid_core::{Result, TaskError};

use crate::clock::Clock;

/// Pulse-generating backend. One variant reads scanner hardware, the other
/// derives pulses from the session clock; the counter logic above is agnostic
/// to which. Counts are cumulative and non-decreasing for the lifetime of a
/// session, so a consumer that polls rarely still sees every pulse.
pub trait PulseSource {
    /// Total pulses observed so far. Non-blocking.
    fn read_count(&mut self) -> Result<u64>;

    /// Signals that the scan has started. No-op for hardware sources.
    fn start(&mut self) {}
}

/// Raw counter access supplied by the DAQ driver layer. Driver internals are
/// out of scope here; one fallible register read is the whole contract.
pub trait CounterRegister {
    fn read_u32(&mut self) -> io::Result<u32>;
}

/// Scanner-hardware pulse source. Widens the 32-bit counter register to a
/// monotonic u64 across register rollover. A failed read is fatal for the
/// session; there is no fallback to emulation, which would silently
/// desynchronize from the scanner.
pub struct HardwarePulseSource<D> {
    device: D,
    last_raw: Option<u32>,
    high: u64,
}

impl<D: CounterRegister> HardwarePulseSource<D> {
    pub fn new(device: D) -> Self {
        Self { device, last_raw: None, high: 0 }
    }
}

impl<D: CounterRegister> PulseSource for HardwarePulseSource<D> {
    fn read_count(&mut self) -> Result<u64> {
        let raw = self
            .device
            .read_u32()
            .map_err(|e| TaskError::HardwareUnavailable(e.to_string()))?;
        if let Some(last) = self.last_raw {
            if raw < last {
                self.high += 1 << 32;
            }
        }
        self.last_raw = Some(raw);
        Ok(self.high + u64::from(raw))
    }
}

/// Software pulse source for sessions run without the scanner. Pulses are
/// computed from elapsed time on the session clock at the configured rate,
/// starting from `start()`; before that the count is 0.
pub struct EmulatedPulseSource<C: Clock> {
    clock: C,
    pulses_per_tr: u64,
    tr: Duration,
    started_at: Option<Duration>,
}

impl<C: Clock> EmulatedPulseSource<C> {
    pub fn new(clock: C, pulses_per_tr: u64, tr: Duration) -> Self {
        Self { clock, pulses_per_tr, tr, started_at: None }
    }
}

impl<C: Clock> PulseSource for EmulatedPulseSource<C> {
    fn read_count(&mut self) -> Result<u64> {
        let Some(t0) = self.started_at else {
            return Ok(0);
        };
        let elapsed = self.clock.now().saturating_sub(t0);
        // Integer arithmetic so counts land exactly on TR boundaries.
        Ok((elapsed.as_nanos() * u128::from(self.pulses_per_tr) / self.tr.as_nanos()) as u64)
    }

    fn start(&mut self) {
        self.started_at = Some(self.clock.now());
    }
}
