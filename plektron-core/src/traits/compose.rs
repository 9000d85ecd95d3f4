//! Composition engine trait.

use core::fmt::Debug;

use crate::render::Frame;

/// Turns a declarative image description into raw pixels.
///
/// The engine is external; the core only requires that a description
/// plus an optional named visual state renders to a frame of exactly
/// the requested size. Implementations are free to rasterize SVGs,
/// draw text, or fetch bitmaps.
pub trait Compositor {
    /// Image description type, opaque to the deck engine
    type Spec;
    /// Rendering error (malformed description, missing asset, ...)
    type Error: Debug;

    /// Render `spec` in visual state `state` at the given dimensions.
    async fn compose(
        &mut self,
        spec: &Self::Spec,
        state: Option<&str>,
        width: u16,
        height: u16,
    ) -> Result<Frame, Self::Error>;
}
