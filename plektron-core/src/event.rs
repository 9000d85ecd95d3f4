//! Event types flowing through the deck engine.

/// Raw hardware edge for one control.
///
/// Delivered by the device transport; `pressed == true` is a key-down
/// edge, `false` a key-up edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    /// Physical control index
    pub index: u8,
    /// Key-down (`true`) or key-up (`false`)
    pub pressed: bool,
}

/// Synthesized button event delivered to application callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// Index of the button that produced the event
    pub index: u8,
    /// Whether the button is held at the time of the event
    pub pressed: bool,
    /// `true` when this is a timer-synthesized auto-repeat of a press
    pub repeat: bool,
}
