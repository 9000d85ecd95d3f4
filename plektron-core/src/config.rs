//! Typed button configuration
//!
//! The configuration carries everything a button needs before it is
//! bound into a deck: its index, image description, timing policies,
//! and application callbacks. Defaults follow the reference device
//! behavior: no auto-repeat, no long-press, automatic press effect on.

use alloc::boxed::Box;

use crate::button::Visual;
use crate::event::ButtonEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Application callback invoked for press/release/long-press events.
///
/// The callback receives the button's [`Visual`] so it can switch the
/// displayed image variant; any mutation is picked up as a redraw
/// before the dispatching operation returns.
pub type Callback<S> = Box<dyn FnMut(&mut Visual<S>, ButtonEvent)>;

/// Auto-repeat policy for a held button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RepeatPolicy {
    /// No synthetic repeats
    #[default]
    Disabled,
    /// First repeat one period after the press, then every period
    Every(u64),
    /// First repeat after `initial_delay_ms`, then every `period_ms`
    After {
        /// Delay before the first repeat, in milliseconds
        initial_delay_ms: u64,
        /// Interval between subsequent repeats, in milliseconds
        period_ms: u64,
    },
}

/// Configuration for one logical button.
///
/// `S` is the image description type understood by the application's
/// compositor.
pub struct ButtonConfig<S> {
    /// Button index this handler activates at
    pub index: u8,
    /// Image description for the rest state
    pub image: S,
    /// Auto-repeat policy (default: disabled)
    pub repeat: RepeatPolicy,
    /// Long-press delay in milliseconds (default: no long-press)
    pub long_press_delay_ms: Option<u64>,
    /// Apply the automatic pressed inset effect (default: true)
    pub auto_press_effect: bool,
    /// Invoked on press and on each auto-repeat
    pub on_press: Option<Callback<S>>,
    /// Invoked on release
    pub on_release: Option<Callback<S>>,
    /// Invoked once when the long-press delay elapses
    pub on_long_press: Option<Callback<S>>,
}

impl<S> ButtonConfig<S> {
    /// Configuration with defaults for `index` showing `image`.
    pub fn new(index: u8, image: S) -> Self {
        Self {
            index,
            image,
            repeat: RepeatPolicy::Disabled,
            long_press_delay_ms: None,
            auto_press_effect: true,
            on_press: None,
            on_release: None,
            on_long_press: None,
        }
    }

    /// Set the auto-repeat policy.
    pub fn repeat(mut self, policy: RepeatPolicy) -> Self {
        self.repeat = policy;
        self
    }

    /// Enable long-press synthesis with the given delay.
    pub fn long_press_delay_ms(mut self, delay_ms: u64) -> Self {
        self.long_press_delay_ms = Some(delay_ms);
        self
    }

    /// Enable or disable the automatic pressed inset effect.
    pub fn auto_press_effect(mut self, enabled: bool) -> Self {
        self.auto_press_effect = enabled;
        self
    }

    /// Set the press callback (also invoked for auto-repeats).
    pub fn on_press(mut self, cb: impl FnMut(&mut Visual<S>, ButtonEvent) + 'static) -> Self {
        self.on_press = Some(Box::new(cb));
        self
    }

    /// Set the release callback.
    pub fn on_release(mut self, cb: impl FnMut(&mut Visual<S>, ButtonEvent) + 'static) -> Self {
        self.on_release = Some(Box::new(cb));
        self
    }

    /// Set the long-press callback.
    pub fn on_long_press(mut self, cb: impl FnMut(&mut Visual<S>, ButtonEvent) + 'static) -> Self {
        self.on_long_press = Some(Box::new(cb));
        self
    }
}

impl RepeatPolicy {
    /// Resolve the policy into `(initial_delay_ms, period_ms)`.
    pub(crate) fn timing(&self) -> Option<(u64, u64)> {
        match *self {
            RepeatPolicy::Disabled => None,
            RepeatPolicy::Every(period_ms) => Some((period_ms, period_ms)),
            RepeatPolicy::After {
                initial_delay_ms,
                period_ms,
            } => Some((initial_delay_ms, period_ms)),
        }
    }
}
