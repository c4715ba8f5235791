//! VPW transmitter: encodes bytes into alternating timed symbols and watches
//! the line for collisions during the passive ones.
use crate::{
    core::{BusState, MAX_FRAME_LEN},
    error::VpwError,
    protocol::transport::traits::{bus_line::BusLine, vpw_clock::VpwClock},
};

use super::VpwBus;

impl<L: BusLine, C: VpwClock> VpwBus<L, C> {
    /// Transmit `frame` (1 to 12 bytes, checksum included by the caller).
    ///
    /// Waits for an idle bus, sends SOF, every bit most significant first,
    /// then holds the bus passive for EOF. The line is passive on return,
    /// success or not.
    ///
    /// # Errors
    ///
    /// - [`VpwError::DataError`] for an empty or over-long frame; the bus and
    ///   the clock are not touched.
    /// - [`VpwError::BusError`] when another node drives the bus active
    ///   during one of our passive symbols. Nothing else is sent.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), VpwError> {
        if frame.is_empty() || frame.len() > MAX_FRAME_LEN {
            return Err(VpwError::DataError);
        }
        let timing = self.config.timing;

        self.wait_idle();

        // SOF: our own active drive dominates, nothing to check.
        self.clock.start();
        self.line.drive_active();
        while self.clock.ticks() < timing.tx_sof {}

        for &byte in frame {
            let mut bits = byte;
            for index in 0..8 {
                let state = BusState::for_bit_index(index);
                let width = timing.symbol_width(state, bits & 0x80 != 0);

                self.line.drive(state);
                self.clock.start();
                while self.clock.ticks() <= width {
                    if state == BusState::Passive && self.line.is_active() {
                        return Err(self.abort_collision());
                    }
                }
                bits <<= 1;
            }
        }

        // EOF
        self.line.drive_passive();
        self.clock.start();
        while self.clock.ticks() <= timing.tx_eof {}
        self.clock.stop();
        Ok(())
    }

    /// Block until the bus has stayed passive for the minimum inter-frame
    /// separation. Any activity restarts the wait.
    pub fn wait_idle(&mut self) {
        let ifs = self.config.timing.rx_ifs_min;
        self.clock.start();
        while self.clock.ticks() < ifs {
            if self.line.is_active() {
                self.clock.start();
            }
        }
    }

    fn abort_collision(&mut self) -> VpwError {
        self.clock.stop();
        self.line.drive_passive();
        #[cfg(feature = "defmt")]
        defmt::warn!("collision detected, transmission aborted");
        VpwError::BusError
    }
}
