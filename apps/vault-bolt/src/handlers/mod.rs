//! Request handlers

pub mod chunks;
