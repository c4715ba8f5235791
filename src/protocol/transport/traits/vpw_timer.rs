//! Asynchronous timer abstraction used by the changer service between
//! polling rounds. The pulse-level driver never awaits; see [`super::vpw_clock`].
use embassy_time::Duration;

/// Sleep provider for the changer runner, usually backed by the executor's
/// time driver. The bus is not sampled while it waits.
pub trait VpwTimer {
    /// Asynchronously wait for `duration`.
    fn delay<'a>(&'a mut self, duration: Duration) -> impl core::future::Future<Output = ()> + 'a;
}
