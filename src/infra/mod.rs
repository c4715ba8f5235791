//! Stateless infrastructure shared by the transport: the J1850 frame checksum
//! and the VPW timing table.
pub mod crc;
pub mod timing;
