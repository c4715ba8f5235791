//! Free-running pulse timer used by the busy-wait state machines.

/// Counter measuring elapsed ticks since the last [`start`](VpwClock::start).
///
/// No overflow handling is expected: every window the driver waits for is
/// far below the counter range once converted by
/// [`Timing`](crate::infra::timing::Timing).
pub trait VpwClock {
    /// Reset the counter to zero and start counting.
    fn start(&mut self);
    /// Freeze the counter; the value is kept until the next `start`.
    fn stop(&mut self);
    /// Current counter value.
    fn ticks(&mut self) -> u16;
}
