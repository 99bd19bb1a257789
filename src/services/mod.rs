//! Channel services built on the transport layer.

pub mod channel;
