//! Adapter implementations for port traits.
//!
//! - `qrcode_encoder` — symbol encoding backed by the `qrcode` crate

pub mod qrcode_encoder;
