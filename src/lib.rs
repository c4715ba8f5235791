//! `korri-j1850` library: a software-timed SAE J1850 VPW bus driver for
//! `no_std` targets. The crate exposes the shared frame types, the stateless
//! building blocks (checksum, timing table), the bus transport (receiver,
//! transmitter, capability traits), and a CD changer emulator built on top.
#![no_std]
//==================================================================================
/// Core data types shared by the transport and the application layer.
pub mod core;
/// Error taxonomy returned by the bus driver and its legacy status codes.
pub mod error;
/// Stateless helpers: J1850 frame checksum and VPW timing windows.
pub mod infra;
/// J1850 protocol implementation: VPW transport and the CD changer layer.
pub mod protocol;
//==================================================================================
