pub mod clock;
pub mod counter;
pub mod pulse;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use counter::PulseCounter;
pub use pulse::{CounterRegister, EmulatedPulseSource, HardwarePulseSource, PulseSource};
