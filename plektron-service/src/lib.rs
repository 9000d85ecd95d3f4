//! Async runtime glue for the Plektron deck engine
//!
//! `plektron-core` is deliberately runtime-free; this crate supplies
//! the serialization point the core's concurrency model requires:
//! hardware edges and timer ticks are funneled through one select loop
//! over embassy-sync channels, so edge handling, timer synthesis, and
//! redraw flushing never interleave. The edge reader runs as its own
//! service so a blocked upload can never stall edge intake.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod channels;
pub mod service;

pub use service::{deck_service, edge_pump, request_flush, TICK_INTERVAL_MS};
