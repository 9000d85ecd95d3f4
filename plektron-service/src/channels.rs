//! Inter-task communication channels
//!
//! Static embassy-sync primitives connecting the edge pump, the deck
//! loop, and application code running outside callbacks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use plektron_core::EdgeEvent;

/// Channel capacity for hardware edges. Deep enough to absorb a burst
/// of simultaneous key activity without dropping arrival order.
const EDGE_CHANNEL_SIZE: usize = 16;

/// Hardware edges from the device, in arrival order.
pub static EDGE_CHANNEL: Channel<CriticalSectionRawMutex, EdgeEvent, EDGE_CHANNEL_SIZE> =
    Channel::new();

/// Kick signal for redraws requested outside the deck loop (e.g. an
/// application mutating a visual from another task). Coalesces
/// naturally: multiple signals before the loop wakes collapse to one.
pub static FLUSH_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();
