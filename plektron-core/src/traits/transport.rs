//! Device transport traits and control enumeration.

use core::fmt::Debug;

use crate::event::EdgeEvent;
use crate::render::Frame;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of physical control on the device.
///
/// The deck engine only drives [`ControlKind::Button`]; other kinds
/// are enumerated so descriptors can be filtered, not consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ControlKind {
    /// Pushbutton with a per-key display surface
    Button,
    /// Rotary encoder (not driven by this engine)
    Encoder,
    /// Auxiliary display strip (not driven by this engine)
    Display,
}

/// Static description of one physical control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlDescriptor {
    /// Control index within its kind
    pub index: u8,
    /// What sort of control this is
    pub kind: ControlKind,
    /// Display surface width in pixels
    pub width: u16,
    /// Display surface height in pixels
    pub height: u16,
}

/// Upload half of the device link.
///
/// Implementations wrap the concrete device protocol (USB HID, a
/// simulator, a test double). All methods target a single device; the
/// deck serializes calls through one `&mut` reference.
pub trait Transport {
    /// Transport-level error
    type Error: Debug;

    /// Static list of the device's controls.
    fn controls(&self) -> &[ControlDescriptor];

    /// Blank every button display on the device.
    async fn clear_all(&mut self) -> Result<(), Self::Error>;

    /// Blank a single button display.
    async fn clear(&mut self, index: u8) -> Result<(), Self::Error>;

    /// Upload a rendered frame to a button display.
    async fn upload(&mut self, index: u8, frame: &Frame) -> Result<(), Self::Error>;
}

/// Edge stream half of the device link.
pub trait EdgeSource {
    /// Source-level error
    type Error: Debug;

    /// Wait for the next hardware edge. Edges for a given button must
    /// be delivered in arrival order.
    async fn next_edge(&mut self) -> Result<EdgeEvent, Self::Error>;
}
