//! Changer service built on top of [`VpwBus`] and a [`FrameHandler`].
//!
//! It keeps the receive/dispatch/transmit loop alive and optionally offers:
//!
//! * a transmission handle (`ChangerHandle`) to queue frames from other tasks;
//! * a frame receiver (`ChangerFrames`) to observe the traffic heard on the bus.
//!
//! Firmware decides which features it needs by providing pre-allocated
//! [`embassy_sync::channel::Channel`] instances. No allocation is performed
//! by the library and there is no dependency on a particular BSP.
//!
//! Receiving blocks the task for up to the bus timeout and transmitting for
//! the duration of a frame; the runner only yields to the executor while the
//! bus is idle.

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Channel, Receiver, Sender},
};
use embassy_time::Duration;
use futures_util::{future::select, future::Either, pin_mut};

use crate::core::{Frame, MAX_FRAME_LEN};
use crate::error::VpwError;
use crate::protocol::changer::{FrameHandler, ReplyBatch};
use crate::protocol::transport::traits::{
    bus_line::BusLine, vpw_clock::VpwClock, vpw_timer::VpwTimer,
};
use crate::protocol::transport::vpw_bus::VpwBus;

/// Runner behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Pause after a listen round without traffic. Frames starting during the
    /// pause are missed, so keep it short on a busy bus.
    pub poll_gap: Duration,
    /// Drop received frames whose trailer is not a valid checksum.
    pub require_checksum: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            poll_gap: Duration::from_micros(0),
            require_checksum: true,
        }
    }
}

/// Commands queued by producer tasks.
#[derive(Clone, Debug)]
pub enum ChangerCommand {
    /// Transmit a frame as-is.
    Send(Frame),
    /// Change the response timeout of the bus.
    SetTimeoutMultiplier(u8),
}

/// Counters maintained by the runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    pub frames_received: u32,
    pub frames_sent: u32,
    pub bus_errors: u32,
    pub checksum_errors: u32,
    pub transmit_errors: u32,
    /// Received frames not forwarded because the frame channel was full.
    pub frames_dropped: u32,
}

/// Result of one [`ChangerRunner::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing heard and no command pending.
    Idle,
    /// A queued command was executed.
    Command,
    /// A frame was received and `replies` answers were transmitted.
    Handled { replies: usize },
    /// A frame was received but discarded (empty or bad checksum).
    Rejected,
    /// The receiver reported a timing violation.
    BusError,
}

//==================================================================================SERVICE
/// Service assembling the runner components.
pub struct ChangerService<
    'a,
    L: BusLine,
    C: VpwClock,
    T: VpwTimer,
    H: FrameHandler,
    M: RawMutex,
    const CMD_CAP: usize,
    const FRAME_CAP: usize,
> {
    bus: VpwBus<L, C>,
    timer: T,
    handler: H,
    config: ServiceConfig,
    command_channel: Option<&'a Channel<M, ChangerCommand, CMD_CAP>>,
    frame_channel: Option<&'a Channel<M, Frame, FRAME_CAP>>,
}

impl<'a, L, C, T, H, M, const CMD_CAP: usize, const FRAME_CAP: usize>
    ChangerService<'a, L, C, T, H, M, CMD_CAP, FRAME_CAP>
where
    L: BusLine,
    C: VpwClock,
    T: VpwTimer,
    H: FrameHandler,
    M: RawMutex,
{
    pub fn new(
        bus: VpwBus<L, C>,
        timer: T,
        handler: H,
        config: ServiceConfig,
        command_channel: Option<&'a Channel<M, ChangerCommand, CMD_CAP>>,
        frame_channel: Option<&'a Channel<M, Frame, FRAME_CAP>>,
    ) -> Self {
        Self {
            bus,
            timer,
            handler,
            config,
            command_channel,
            frame_channel,
        }
    }

    /// Split into handle/receiver/runner components.
    pub fn into_parts(self) -> ChangerServiceParts<'a, L, C, T, H, M, CMD_CAP, FRAME_CAP> {
        let handle = self.command_channel.map(|channel| ChangerHandle {
            sender: channel.sender(),
        });
        let frames = self.frame_channel.map(|channel| ChangerFrames {
            receiver: channel.receiver(),
        });
        ChangerServiceParts {
            handle,
            frames,
            runner: ChangerRunner {
                bus: self.bus,
                timer: self.timer,
                handler: self.handler,
                config: self.config,
                command_channel: self.command_channel,
                frame_channel: self.frame_channel,
                stats: BusStats::default(),
            },
        }
    }
}

/// Bundle returned by [`ChangerService::into_parts`].
pub struct ChangerServiceParts<
    'a,
    L: BusLine,
    C: VpwClock,
    T: VpwTimer,
    H: FrameHandler,
    M: RawMutex,
    const CMD_CAP: usize,
    const FRAME_CAP: usize,
> {
    pub handle: Option<ChangerHandle<'a, M, CMD_CAP>>,
    pub frames: Option<ChangerFrames<'a, M, FRAME_CAP>>,
    pub runner: ChangerRunner<'a, L, C, T, H, M, CMD_CAP, FRAME_CAP>,
}

//==================================================================================RUNNER
/// Runner that drives the changer loop.
pub struct ChangerRunner<
    'a,
    L: BusLine,
    C: VpwClock,
    T: VpwTimer,
    H: FrameHandler,
    M: RawMutex,
    const CMD_CAP: usize,
    const FRAME_CAP: usize,
> {
    bus: VpwBus<L, C>,
    timer: T,
    handler: H,
    config: ServiceConfig,
    command_channel: Option<&'a Channel<M, ChangerCommand, CMD_CAP>>,
    frame_channel: Option<&'a Channel<M, Frame, FRAME_CAP>>,
    stats: BusStats,
}

impl<'a, L, C, T, H, M, const CMD_CAP: usize, const FRAME_CAP: usize>
    ChangerRunner<'a, L, C, T, H, M, CMD_CAP, FRAME_CAP>
where
    L: BusLine,
    C: VpwClock,
    T: VpwTimer,
    H: FrameHandler,
    M: RawMutex,
{
    pub async fn drive(mut self) {
        loop {
            self.step().await;
        }
    }

    /// Listen for up to the bus timeout (`timeout_multiplier` × 4 ms), then
    /// either answer the received frame or, on an idle bus, wait for a queued
    /// command or the poll gap.
    ///
    /// The timeout multiplier therefore sets how often queued commands are
    /// served while the bus is silent.
    pub async fn step(&mut self) -> StepOutcome {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        match self.bus.receive_timeout(&mut buffer) {
            Ok(len) => self.dispatch(&buffer[..len]),
            Err(VpwError::NoData) => self.idle().await,
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("receive failed: {}", _err);
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                StepOutcome::BusError
            }
        }
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn bus(&self) -> &VpwBus<L, C> {
        &self.bus
    }

    fn dispatch(&mut self, bytes: &[u8]) -> StepOutcome {
        let Ok(frame) = Frame::new(bytes) else {
            return StepOutcome::Rejected;
        };
        self.stats.frames_received = self.stats.frames_received.wrapping_add(1);

        if self.config.require_checksum && !frame.has_valid_checksum() {
            #[cfg(feature = "defmt")]
            defmt::debug!("dropping frame with bad checksum ({} bytes)", frame.len());
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
            return StepOutcome::Rejected;
        }

        // The bus cannot wait for a slow consumer.
        if let Some(channel) = self.frame_channel {
            if channel.try_send(frame).is_err() {
                self.stats.frames_dropped = self.stats.frames_dropped.wrapping_add(1);
            }
        }

        let mut replies = ReplyBatch::new();
        if let Err(_err) = self.handler.respond(&frame, &mut replies) {
            #[cfg(feature = "defmt")]
            defmt::warn!("handler failed: {}, sending {} queued replies", _err, replies.len());
        }

        let mut sent = 0;
        for reply in replies.iter() {
            if self.send(reply) {
                sent += 1;
            }
        }
        StepOutcome::Handled { replies: sent }
    }

    async fn idle(&mut self) -> StepOutcome {
        let command = match self.command_channel {
            Some(channel) => {
                let command_future = channel.receive();
                let gap_future = self.timer.delay(self.config.poll_gap);
                pin_mut!(command_future);
                pin_mut!(gap_future);

                match select(command_future, gap_future).await {
                    Either::Left((command, _)) => Some(command),
                    Either::Right(_) => None,
                }
            }
            None => {
                self.timer.delay(self.config.poll_gap).await;
                None
            }
        };

        match command {
            Some(command) => {
                self.apply(command);
                StepOutcome::Command
            }
            None => StepOutcome::Idle,
        }
    }

    fn apply(&mut self, command: ChangerCommand) {
        match command {
            ChangerCommand::Send(frame) => {
                self.send(&frame);
            }
            ChangerCommand::SetTimeoutMultiplier(multiplier) => {
                self.bus.set_timeout_multiplier(multiplier)
            }
        }
    }

    fn send(&mut self, frame: &Frame) -> bool {
        match self.bus.transmit_frame(frame) {
            Ok(()) => {
                self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
                true
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("transmit failed: {}", _err);
                self.stats.transmit_errors = self.stats.transmit_errors.wrapping_add(1);
                false
            }
        }
    }
}

//==================================================================================HANDLES
/// Transmission handle (optional).
pub struct ChangerHandle<'a, M: RawMutex, const CMD_CAP: usize> {
    sender: Sender<'a, M, ChangerCommand, CMD_CAP>,
}

impl<'a, M: RawMutex, const CMD_CAP: usize> ChangerHandle<'a, M, CMD_CAP> {
    pub async fn send_frame(&self, frame: Frame) {
        self.sender.send(ChangerCommand::Send(frame)).await;
    }

    /// Queue `payload` followed by its checksum.
    pub async fn send_payload(&self, payload: &[u8]) -> Result<(), VpwError> {
        let frame = Frame::with_checksum(payload)?;
        self.send_frame(frame).await;
        Ok(())
    }

    pub async fn set_timeout_multiplier(&self, multiplier: u8) {
        self.sender
            .send(ChangerCommand::SetTimeoutMultiplier(multiplier))
            .await;
    }
}

/// Optional receiver returning the frames heard on the bus.
pub struct ChangerFrames<'a, M: RawMutex, const FRAME_CAP: usize> {
    receiver: Receiver<'a, M, Frame, FRAME_CAP>,
}

impl<'a, M: RawMutex, const FRAME_CAP: usize> ChangerFrames<'a, M, FRAME_CAP> {
    pub async fn recv(&mut self) -> Frame {
        self.receiver.receive().await
    }

    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_receive().ok()
    }
}
