//! In-memory collaborator doubles
//!
//! Deterministic stand-ins for the device transport, edge stream, and
//! composition engine. Used by this crate's tests and available to
//! downstream crates for driving a deck without hardware.

use alloc::string::String;
use alloc::vec::Vec;

use crate::event::EdgeEvent;
use crate::render::Frame;
use crate::traits::{Compositor, ControlDescriptor, ControlKind, EdgeSource, Transport};

/// Descriptors for a dense grid of `count` buttons, all `width` x
/// `height` pixels.
pub fn button_grid(count: u8, width: u16, height: u16) -> Vec<ControlDescriptor> {
    (0..count)
        .map(|index| ControlDescriptor {
            index,
            kind: ControlKind::Button,
            width,
            height,
        })
        .collect()
}

/// One recorded [`MockCompositor`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCall {
    /// Image description that was rendered
    pub spec: &'static str,
    /// Named visual state, if any
    pub state: Option<String>,
    /// Requested width
    pub width: u16,
    /// Requested height
    pub height: u16,
}

/// Error returned for specs listed in [`MockCompositor::fail_specs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockComposeError;

/// Compositor double: renders every spec/state pair to a solid color
/// derived from its content, so distinct inputs produce distinct
/// pixels and identical inputs produce bit-identical frames.
#[derive(Default)]
pub struct MockCompositor {
    /// Every invocation, in order
    pub calls: Vec<ComposeCall>,
    /// Specs that fail to render
    pub fail_specs: Vec<&'static str>,
}

impl MockCompositor {
    /// Compositor that renders everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn tint(spec: &str, state: Option<&str>) -> [u8; 3] {
        let mut acc: u32 = 17;
        for byte in spec.bytes().chain(state.unwrap_or("").bytes()) {
            acc = acc.wrapping_mul(31).wrapping_add(byte as u32);
        }
        [(acc & 0xff) as u8, ((acc >> 8) & 0xff) as u8, ((acc >> 16) & 0xff) as u8]
    }
}

impl Compositor for MockCompositor {
    type Spec = &'static str;
    type Error = MockComposeError;

    async fn compose(
        &mut self,
        spec: &Self::Spec,
        state: Option<&str>,
        width: u16,
        height: u16,
    ) -> Result<Frame, Self::Error> {
        self.calls.push(ComposeCall {
            spec: *spec,
            state: state.map(String::from),
            width,
            height,
        });
        if self.fail_specs.contains(spec) {
            return Err(MockComposeError);
        }
        Ok(Frame::solid(width, height, Self::tint(spec, state)))
    }
}

/// Error injected by [`MockTransport::fail_uploads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTransportError;

/// Transport double recording every device operation.
pub struct MockTransport {
    controls: Vec<ControlDescriptor>,
    /// `(index, frame)` per successful upload, in order
    pub uploads: Vec<(u8, Frame)>,
    /// Indices blanked, in order
    pub clears: Vec<u8>,
    /// Number of `clear_all` calls
    pub clear_all_calls: usize,
    /// Button indices whose uploads fail
    pub fail_uploads: Vec<u8>,
}

impl MockTransport {
    /// Transport exposing the given control list.
    pub fn new(controls: Vec<ControlDescriptor>) -> Self {
        Self {
            controls,
            uploads: Vec::new(),
            clears: Vec::new(),
            clear_all_calls: 0,
            fail_uploads: Vec::new(),
        }
    }
}

impl Transport for MockTransport {
    type Error = MockTransportError;

    fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    async fn clear_all(&mut self) -> Result<(), Self::Error> {
        self.clear_all_calls += 1;
        Ok(())
    }

    async fn clear(&mut self, index: u8) -> Result<(), Self::Error> {
        self.clears.push(index);
        Ok(())
    }

    async fn upload(&mut self, index: u8, frame: &Frame) -> Result<(), Self::Error> {
        if self.fail_uploads.contains(&index) {
            return Err(MockTransportError);
        }
        self.uploads.push((index, frame.clone()));
        Ok(())
    }
}

/// Edge source replaying a fixed script, then pending forever.
pub struct ScriptedEdges {
    events: Vec<EdgeEvent>,
    cursor: usize,
}

impl ScriptedEdges {
    /// Source yielding `events` in order.
    pub fn new(events: Vec<EdgeEvent>) -> Self {
        Self { events, cursor: 0 }
    }
}

impl EdgeSource for ScriptedEdges {
    type Error = core::convert::Infallible;

    async fn next_edge(&mut self) -> Result<EdgeEvent, Self::Error> {
        let Some(event) = self.events.get(self.cursor).copied() else {
            return core::future::pending().await;
        };
        self.cursor += 1;
        Ok(event)
    }
}
