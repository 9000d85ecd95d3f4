//! Deck manager
//!
//! Single authority over slot-to-handler binding, hardware edge
//! interpretation, and redraw batching for one device. The deck is
//! tick-driven and single-owner: edges arrive via [`Deck::handle_edge`],
//! timers advance via [`Deck::poll`], and both funnel through `&mut
//! self`, so serialization falls out of ownership. Redraws are
//! coalesced: invalidations accumulate in per-slot dirty flags and a
//! later [`Deck::flush`] renders and uploads the whole batch.

use alloc::vec::Vec;

use crate::button::{ButtonHandler, Visual};
use crate::traits::{Compositor, ControlDescriptor, ControlKind, Transport};

/// Deck-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeckError {
    /// Button index outside `[0, button_count)`
    InvalidIndex,
}

/// Outcome counters for one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushStats {
    /// Buttons rendered and uploaded
    pub rendered: usize,
    /// Unbound buttons blanked
    pub cleared: usize,
    /// Buttons whose render or upload failed
    pub failed: usize,
    /// Buttons skipped for lack of a control descriptor
    pub skipped: usize,
}

/// One physical button position.
struct Slot<S> {
    handler: Option<ButtonHandler<S>>,
    /// Hardware press tracking, independent of any bound handler
    pressed: bool,
    /// Armed: the next release edge is consumed without dispatch
    suppress_release: bool,
    /// Membership in the pending invalidation set
    dirty: bool,
}

impl<S> Slot<S> {
    fn empty() -> Self {
        Self {
            handler: None,
            pressed: false,
            suppress_release: false,
            dirty: false,
        }
    }
}

/// Manager for one device's button grid.
///
/// `S` is the image description type shared by the bound handlers and
/// the compositor.
pub struct Deck<S> {
    /// Button-kind control descriptors, as enumerated by the device
    controls: Vec<ControlDescriptor>,
    slots: Vec<Slot<S>>,
}

impl<S> Deck<S> {
    /// Build a deck from the device's control list. Only button-kind
    /// controls are retained; the slot count is fixed here for the
    /// lifetime of the deck.
    pub fn new(controls: &[ControlDescriptor]) -> Self {
        let buttons: Vec<ControlDescriptor> = controls
            .iter()
            .filter(|c| c.kind == ControlKind::Button)
            .copied()
            .collect();
        let count = buttons.len();
        for c in &buttons {
            if c.index as usize >= count {
                log::warn!(
                    "button descriptor index {} outside dense range 0..{}",
                    c.index,
                    count
                );
            }
        }
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(Slot::empty());
        }
        Self {
            controls: buttons,
            slots,
        }
    }

    /// Number of button slots.
    pub fn button_count(&self) -> usize {
        self.slots.len()
    }

    /// Install `handler` in slot `index`, returning the previous
    /// occupant so the caller can restore it later.
    ///
    /// If the slot is currently pressed and occupied, the next release
    /// edge is suppressed: the outgoing handler's half-finished press
    /// must not produce a phantom release on the incoming one. The
    /// returned occupant is reset (pressed cleared, timers cancelled)
    /// so restoring it is clean. Always schedules a redraw for `index`.
    pub fn bind(
        &mut self,
        index: u8,
        handler: ButtonHandler<S>,
    ) -> Result<Option<ButtonHandler<S>>, DeckError> {
        self.install(index, Some(handler))
    }

    /// Remove the handler in slot `index`, if any. The slot renders
    /// blank on the next flush.
    pub fn unbind(&mut self, index: u8) -> Option<ButtonHandler<S>> {
        self.install(index, None).ok().flatten()
    }

    /// Bind `handler` at its configured index. Activation-framework
    /// sugar for [`Deck::bind`].
    pub fn activate(
        &mut self,
        handler: ButtonHandler<S>,
    ) -> Result<Option<ButtonHandler<S>>, DeckError> {
        let index = handler.index();
        self.bind(index, handler)
    }

    fn install(
        &mut self,
        index: u8,
        handler: Option<ButtonHandler<S>>,
    ) -> Result<Option<ButtonHandler<S>>, DeckError> {
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(DeckError::InvalidIndex)?;
        if slot.pressed && slot.handler.is_some() {
            slot.suppress_release = true;
        }
        let mut previous = core::mem::replace(&mut slot.handler, handler);
        slot.dirty = true;
        if let Some(prev) = previous.as_mut() {
            prev.reset();
        }
        Ok(previous)
    }

    /// Idempotently arm release suppression for `index`: the next
    /// release edge is consumed without reaching the bound handler.
    pub fn suppress_next_release(&mut self, index: u8) {
        match self.slots.get_mut(index as usize) {
            Some(slot) => slot.suppress_release = true,
            None => log::debug!("suppress_next_release for unknown index {}", index),
        }
    }

    /// Sole ingress for raw device edges.
    ///
    /// Order: slot press tracking, suppression consumption, handler
    /// dispatch, redraw scheduling. Unknown indices are logged and
    /// ignored; a misbehaving edge never corrupts other slots.
    pub fn handle_edge(&mut self, index: u8, pressed: bool, now_ms: u64) {
        let Some(slot) = self.slots.get_mut(index as usize) else {
            log::warn!("edge for unknown button index {}", index);
            return;
        };
        slot.pressed = pressed;

        if !pressed && slot.suppress_release {
            slot.suppress_release = false;
            // Settle the handler silently so its pressed flag and
            // timers agree with the slot again; repaint if the
            // pressed effect was showing.
            if let Some(handler) = slot.handler.as_mut() {
                handler.reset();
                if handler.auto_press_effect() {
                    slot.dirty = true;
                }
            }
            return;
        }

        let Some(handler) = slot.handler.as_mut() else {
            return;
        };
        handler.input(now_ms, pressed);
        if handler.take_dirty() || handler.auto_press_effect() {
            slot.dirty = true;
        }
    }

    /// Advance every bound handler's timers to `now_ms`, delivering
    /// auto-repeat and long-press events. Must be called from the same
    /// serialization context as [`Deck::handle_edge`].
    pub fn poll(&mut self, now_ms: u64) {
        for slot in self.slots.iter_mut() {
            let Some(handler) = slot.handler.as_mut() else {
                continue;
            };
            let outcome = handler.poll(now_ms);
            if outcome.long_press_fired {
                slot.suppress_release = true;
            }
            if handler.take_dirty() {
                slot.dirty = true;
            }
        }
    }

    /// Mutate a bound button's visual state, scheduling a redraw if
    /// anything changed. Returns `None` when the slot is empty or out
    /// of range.
    pub fn with_visual<R>(
        &mut self,
        index: u8,
        f: impl FnOnce(&mut Visual<S>) -> R,
    ) -> Option<R> {
        let slot = self.slots.get_mut(index as usize)?;
        let handler = slot.handler.as_mut()?;
        let out = f(handler.visual_mut());
        if handler.take_dirty() {
            slot.dirty = true;
        }
        Some(out)
    }

    /// Add `index` to the pending invalidation set.
    pub fn invalidate(&mut self, index: u8) {
        match self.slots.get_mut(index as usize) {
            Some(slot) => slot.dirty = true,
            None => log::debug!("invalidate for unknown index {}", index),
        }
    }

    /// Whether any redraws are pending.
    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(|s| s.dirty)
    }

    /// Drain the invalidation set. The set is cleared here, before any
    /// render is awaited, so invalidations raised during a flush start
    /// a fresh batch instead of being lost or double-counted.
    fn take_batch(&mut self) -> Vec<u8> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| core::mem::take(&mut slot.dirty).then_some(i as u8))
            .collect()
    }

    /// Render and upload every pending button.
    ///
    /// Per-button failures (missing descriptor, compose error, upload
    /// error) are logged and counted but never abort the rest of the
    /// batch; the next invalidation retries naturally.
    pub async fn flush<C, T>(&mut self, compositor: &mut C, transport: &mut T) -> FlushStats
    where
        C: Compositor<Spec = S>,
        T: Transport,
    {
        let batch = self.take_batch();
        let mut stats = FlushStats::default();
        for index in batch {
            let Some(control) = self
                .controls
                .iter()
                .find(|c| c.index == index)
                .copied()
            else {
                log::warn!("button {}: no control descriptor, skipping redraw", index);
                stats.skipped += 1;
                continue;
            };
            let slot = &mut self.slots[index as usize];
            match slot.handler.as_mut() {
                None => match transport.clear(index).await {
                    Ok(()) => stats.cleared += 1,
                    Err(err) => {
                        log::warn!("button {}: clear failed: {:?}", index, err);
                        stats.failed += 1;
                    }
                },
                Some(handler) => {
                    match handler.render(compositor, control.width, control.height).await {
                        Ok(frame) => match transport.upload(index, &frame).await {
                            Ok(()) => stats.rendered += 1,
                            Err(err) => {
                                log::warn!("button {}: upload failed: {:?}", index, err);
                                stats.failed += 1;
                            }
                        },
                        Err(err) => {
                            log::warn!("button {}: render failed: {:?}", index, err);
                            stats.failed += 1;
                        }
                    }
                }
            }
        }
        stats
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use crate::config::ButtonConfig;
    use crate::mock::button_grid;
    use alloc::rc::Rc;
    use core::cell::Cell;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Edge(bool),
        Suppress,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => any::<bool>().prop_map(Op::Edge),
            1 => Just(Op::Suppress),
        ]
    }

    proptest! {
        /// For every operation sequence on one button, a release is
        /// delivered only when a press was delivered and not yet
        /// released, and suppression consumes exactly one release.
        #[test]
        fn releases_only_follow_delivered_presses(
            ops in proptest::collection::vec(op_strategy(), 1..64)
        ) {
            let controls = button_grid(1, 72, 72);
            let mut deck = Deck::new(&controls);

            let presses = Rc::new(Cell::new(0u32));
            let releases = Rc::new(Cell::new(0u32));
            let (p, r) = (presses.clone(), releases.clone());
            let config = ButtonConfig::new(0, "icon")
                .on_press(move |_, _| p.set(p.get() + 1))
                .on_release(move |_, _| r.set(r.get() + 1));
            deck.bind(0, ButtonHandler::new(config)).unwrap();

            let mut delivered_press = false;
            let mut suppress_armed = false;
            let mut now_ms = 0;

            for op in ops {
                now_ms += 10;
                match op {
                    Op::Suppress => {
                        deck.suppress_next_release(0);
                        suppress_armed = true;
                    }
                    Op::Edge(true) => {
                        let before = presses.get();
                        deck.handle_edge(0, true, now_ms);
                        if delivered_press {
                            prop_assert_eq!(presses.get(), before);
                        } else {
                            prop_assert_eq!(presses.get(), before + 1);
                            delivered_press = true;
                        }
                    }
                    Op::Edge(false) => {
                        let before = releases.get();
                        deck.handle_edge(0, false, now_ms);
                        if suppress_armed {
                            // Consumed without dispatch; handler settles.
                            prop_assert_eq!(releases.get(), before);
                            suppress_armed = false;
                            delivered_press = false;
                        } else if delivered_press {
                            prop_assert_eq!(releases.get(), before + 1);
                            delivered_press = false;
                        } else {
                            prop_assert_eq!(releases.get(), before);
                        }
                    }
                }
                prop_assert!(releases.get() <= presses.get());
            }
        }
    }
}
