//! Device-agnostic core logic for a pushbutton deck engine
//!
//! This crate contains everything that does not depend on a concrete
//! device transport, composition engine, or async runtime:
//!
//! - Timer primitives for auto-repeat and long-press synthesis
//! - Per-button press state machine and event synthesis
//! - Deck manager: slot binding, edge interpretation, redraw batching
//! - Pressed-effect compositing for rendered button frames
//! - Typed button configuration
//! - Collaborator traits (transport, edge source, compositor)
//!
//! All logic is tick-driven: callers pass the current time as
//! `now_ms` and the crate never reads a clock, which keeps every
//! component deterministic and host-testable.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod button;
pub mod config;
pub mod deck;
pub mod event;
pub mod mock;
pub mod render;
pub mod timer;
pub mod traits;

pub use button::{ButtonHandler, Visual};
pub use config::{ButtonConfig, RepeatPolicy};
pub use deck::{Deck, DeckError, FlushStats};
pub use event::{ButtonEvent, EdgeEvent};
pub use render::{Frame, PixelFormat, RenderError};
pub use traits::{Compositor, ControlDescriptor, ControlKind, EdgeSource, Transport};
