//! Request and response bodies

pub mod chunks;
