//! Programmer and telemetry link for a single-chamber rate-adaptive pacemaker.
//!
//! Outbound, a validated parameter set becomes an 18-byte command frame.
//! Inbound, a byte stream is cut into 20-byte telemetry frames, decoded to
//! millivolts, and kept in rolling per-channel windows for display.
pub mod cli;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod recorder;
pub mod session;
pub mod types;
pub mod waveform;
