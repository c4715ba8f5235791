//! High-level components of the J1850 stack: the VPW transport and the
//! CD changer application built on top of it.
pub mod changer;
pub mod transport;
