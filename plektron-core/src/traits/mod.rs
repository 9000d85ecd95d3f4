//! Collaborator traits
//!
//! The deck engine talks to three external collaborators, each behind
//! a trait so the core stays device- and engine-agnostic:
//!
//! - [`Transport`]: framebuffer upload half of the device link
//! - [`EdgeSource`]: key-down/key-up edge stream (separate trait so
//!   the reader half can live in its own task)
//! - [`Compositor`]: declarative image description to raw pixels

mod compose;
mod transport;

pub use compose::Compositor;
pub use transport::{ControlDescriptor, ControlKind, EdgeSource, Transport};
