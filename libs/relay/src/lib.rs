//! Relay infrastructure for the VMC bridge

pub use relay_core as core;
