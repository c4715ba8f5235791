//! [`BusLine`] implementation over `embedded-hal` digital pins.
//!
//! J1850 transceivers commonly invert one or both paths (an open-collector
//! driver pulls the MCU side low to make the bus active). The inversion is
//! chosen once at construction instead of at every call site.
use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};

use crate::protocol::transport::traits::bus_line::BusLine;

/// Electrical level representing the active state on one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Active is a high level.
    Normal,
    /// Active is a low level.
    Inverted,
}

/// Bus line driven through an output pin and sampled through an input pin.
///
/// Pins must be infallible, which is the case for on-chip GPIO on the
/// microcontrollers this driver targets.
pub struct PinBusLine<O, I> {
    output: O,
    input: I,
    output_polarity: Polarity,
    input_polarity: Polarity,
}

impl<O, I> PinBusLine<O, I>
where
    O: OutputPin<Error = Infallible>,
    I: InputPin<Error = Infallible>,
{
    /// Wrap configured pins. The input pin should have its pull-up enabled so
    /// a disconnected bus reads passive. The line is released immediately.
    pub fn new(output: O, input: I, output_polarity: Polarity, input_polarity: Polarity) -> Self {
        let mut line = Self {
            output,
            input,
            output_polarity,
            input_polarity,
        };
        line.drive_passive();
        line
    }

    /// Both paths inverted by the transceiver.
    pub fn inverted(output: O, input: I) -> Self {
        Self::new(output, input, Polarity::Inverted, Polarity::Inverted)
    }

    /// Give the pins back.
    pub fn release(self) -> (O, I) {
        (self.output, self.input)
    }

    fn set_output(&mut self, high: bool) {
        let result = if high {
            self.output.set_high()
        } else {
            self.output.set_low()
        };
        infallible(result)
    }
}

impl<O, I> BusLine for PinBusLine<O, I>
where
    O: OutputPin<Error = Infallible>,
    I: InputPin<Error = Infallible>,
{
    fn drive_active(&mut self) {
        self.set_output(self.output_polarity == Polarity::Normal);
    }

    fn drive_passive(&mut self) {
        self.set_output(self.output_polarity == Polarity::Inverted);
    }

    fn is_active(&mut self) -> bool {
        let high = infallible(self.input.is_high());
        match self.input_polarity {
            Polarity::Normal => high,
            Polarity::Inverted => !high,
        }
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
