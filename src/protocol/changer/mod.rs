//! Application layer: what to answer to a received frame.
//!
//! The transport only moves bytes; a [`FrameHandler`] inspects each received
//! frame and queues the replies to send. [`CdChanger`] answers the head unit
//! queries of a Chrysler/Jeep radio the way a factory CD changer does.
use crate::{core::Frame, error::VpwError};

pub mod service;

/// Maximum number of replies a handler may queue for one request.
pub const MAX_REPLIES: usize = 4;

//==================================================================================REPLY_BATCH
/// Fixed-capacity list of reply frames, sent in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ReplyBatch {
    frames: [Option<Frame>; MAX_REPLIES],
    len: usize,
}

impl ReplyBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply. Fails with [`VpwError::DataError`] when full.
    pub fn push(&mut self, frame: Frame) -> Result<(), VpwError> {
        let slot = self.frames.get_mut(self.len).ok_or(VpwError::DataError)?;
        *slot = Some(frame);
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.frames = [None; MAX_REPLIES];
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames[..self.len].iter().flatten()
    }
}

//==================================================================================FRAME_HANDLER
/// Dispatcher seam between the transport and the application.
pub trait FrameHandler {
    /// Inspect `request` and push the frames to send back into `replies`.
    /// Leaving `replies` empty ignores the request.
    fn respond(&mut self, request: &Frame, replies: &mut ReplyBatch) -> Result<(), VpwError>;
}

//==================================================================================CD_CHANGER
/// Header byte shared by the radio queries and the changer replies.
pub const CHANGER_HEADER: u8 = 0x8D;
/// Second byte of a query sent by the radio to the changer.
pub const RADIO_QUERY: u8 = 0x0F;
/// Query asking for the changer presence and disc information.
pub const CMD_ANNOUNCE: u8 = 0x21;
/// Query asking for the current play position.
pub const CMD_POSITION: u8 = 0x24;

const STATUS_REPLY: [u8; 5] = [CHANGER_HEADER, 0x93, 0x01, 0x01, 0x80];
const DISC_REPLY: [u8; 5] = [CHANGER_HEADER, 0x92, 0xC0, 0x00, 0x00];
const TRACK_REPLY: [u8; 5] = [CHANGER_HEADER, 0x92, 0xE1, 0x01, 0x03];
const POSITION_REPLY: [u8; 4] = [CHANGER_HEADER, 0x94, 0x00, 0x00];

/// CD changer emulator answering radio queries `8D 0F <cmd> ...`.
///
/// | Command | Replies                                  |
/// |---------|------------------------------------------|
/// | `0x21`  | disc info, track info, status            |
/// | `0x24`  | play position                            |
/// | other   | status                                   |
///
/// Frames not addressed to the changer are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct CdChanger {
    queries: u32,
}

impl CdChanger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of radio queries answered so far.
    pub fn queries(&self) -> u32 {
        self.queries
    }
}

impl FrameHandler for CdChanger {
    fn respond(&mut self, request: &Frame, replies: &mut ReplyBatch) -> Result<(), VpwError> {
        let command = match request.as_bytes() {
            [CHANGER_HEADER, RADIO_QUERY, command, ..] => *command,
            _ => return Ok(()),
        };
        self.queries = self.queries.wrapping_add(1);

        match command {
            CMD_ANNOUNCE => {
                replies.push(Frame::with_checksum(&DISC_REPLY)?)?;
                replies.push(Frame::with_checksum(&TRACK_REPLY)?)?;
                replies.push(Frame::with_checksum(&STATUS_REPLY)?)?;
            }
            CMD_POSITION => replies.push(Frame::with_checksum(&POSITION_REPLY)?)?,
            _ => replies.push(Frame::with_checksum(&STATUS_REPLY)?)?,
        }
        Ok(())
    }
}
