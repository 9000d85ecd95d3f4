//! Per-button press state machine
//!
//! Converts the binary press/release edge stream for one button into a
//! richer event vocabulary: tap, timer-driven auto-repeat, long-press.
//! The handler owns its visual state and pressed-effect cache; it never
//! talks to the device directly. Timer-driven transitions happen in
//! [`ButtonHandler::poll`], which the deck funnels through the same
//! serialization point as hardware edges.

use crate::config::{ButtonConfig, Callback, RepeatPolicy};
use crate::event::ButtonEvent;
use crate::render::{self, Frame, RenderError};
use crate::timer::{Deadline, RepeatTimer};
use crate::traits::Compositor;

/// Visual state of one button: the image description plus an optional
/// named variant (e.g. `"pressed"`), with explicit dirty tracking.
///
/// Mutating either field marks the visual dirty; the deck converts
/// dirty into a redraw request before the dispatching operation
/// returns. This is the only path by which application logic
/// participates in the render loop.
pub struct Visual<S> {
    spec: S,
    state: Option<&'static str>,
    dirty: bool,
}

impl<S> Visual<S> {
    fn new(spec: S) -> Self {
        Self {
            spec,
            state: None,
            dirty: false,
        }
    }

    /// Current image description.
    pub fn spec(&self) -> &S {
        &self.spec
    }

    /// Replace the image description.
    pub fn set_spec(&mut self, spec: S) {
        self.spec = spec;
        self.dirty = true;
    }

    /// Current named visual state, if any.
    pub fn state(&self) -> Option<&'static str> {
        self.state
    }

    /// Switch to a named visual state (`None` = rest state). Setting
    /// the state already in effect is a no-op.
    pub fn set_state(&mut self, state: Option<&'static str>) {
        if self.state != state {
            self.state = state;
            self.dirty = true;
        }
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }
}

/// Press lifecycle. `Held` covers the pressed-with/without-timers
/// states; the tokens present decide which synthetic events can still
/// fire. `LongPressFired` means the terminating release is to be
/// suppressed.
enum Phase {
    Idle,
    Held {
        long_press: Option<Deadline>,
        repeat: Option<RepeatTimer>,
    },
    LongPressFired,
}

/// Result of advancing a handler's timers.
#[derive(Default)]
pub(crate) struct PollOutcome {
    /// The long-press delay elapsed; the deck must arm release
    /// suppression for this button's slot.
    pub long_press_fired: bool,
}

/// One logical button: behavior, visuals, and press lifecycle.
pub struct ButtonHandler<S> {
    index: u8,
    visual: Visual<S>,
    repeat: RepeatPolicy,
    long_press_delay_ms: Option<u64>,
    auto_press_effect: bool,
    pressed: bool,
    phase: Phase,
    pressed_cache: Option<Frame>,
    on_press: Option<Callback<S>>,
    on_release: Option<Callback<S>>,
    on_long_press: Option<Callback<S>>,
}

impl<S> ButtonHandler<S> {
    /// Build a handler from its configuration.
    pub fn new(config: ButtonConfig<S>) -> Self {
        Self {
            index: config.index,
            visual: Visual::new(config.image),
            repeat: config.repeat,
            long_press_delay_ms: config.long_press_delay_ms,
            auto_press_effect: config.auto_press_effect,
            pressed: false,
            phase: Phase::Idle,
            pressed_cache: None,
            on_press: config.on_press,
            on_release: config.on_release,
            on_long_press: config.on_long_press,
        }
    }

    /// Button index this handler activates at.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Whether the button is currently held.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Whether the automatic pressed inset effect is enabled.
    pub fn auto_press_effect(&self) -> bool {
        self.auto_press_effect
    }

    /// Read-only view of the visual state.
    pub fn visual(&self) -> &Visual<S> {
        &self.visual
    }

    pub(crate) fn visual_mut(&mut self) -> &mut Visual<S> {
        &mut self.visual
    }

    /// Process a debounced hardware edge.
    ///
    /// Duplicate press edges and releases with no delivered press are
    /// ignored, so a release can never be observed without a matching
    /// press having been delivered first.
    pub(crate) fn input(&mut self, now_ms: u64, pressed: bool) {
        if pressed {
            if !matches!(self.phase, Phase::Idle) {
                return;
            }
            self.pressed = true;
            self.fire_press(false);
            let repeat = self
                .repeat
                .timing()
                .map(|(delay, period)| RepeatTimer::starting(now_ms, delay, period));
            let long_press = self
                .long_press_delay_ms
                .map(|delay| Deadline::after(now_ms, delay));
            self.phase = Phase::Held { long_press, repeat };
        } else {
            match self.phase {
                Phase::Idle => {}
                Phase::Held { .. } => {
                    self.pressed = false;
                    self.fire_release();
                    self.phase = Phase::Idle;
                    self.pressed_cache = None;
                }
                // The terminating release normally gets consumed by the
                // deck's suppress flag; if it reaches us anyway, settle
                // without callbacks.
                Phase::LongPressFired => self.reset(),
            }
        }
    }

    /// Advance timers to `now_ms`, firing synthetic events.
    ///
    /// When a poll crosses the long-press boundary, repeats scheduled
    /// strictly before the deadline still fire (in order), then the
    /// long-press fires and cancels both timers. A repeat landing on
    /// the deadline instant itself loses to the long-press.
    pub(crate) fn poll(&mut self, now_ms: u64) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        let long_press_at = match &self.phase {
            Phase::Held { long_press, .. } => {
                long_press.filter(|d| d.due(now_ms)).map(|d| d.at_ms())
            }
            _ => return outcome,
        };

        if let Some(deadline_ms) = long_press_at {
            let fired = match &mut self.phase {
                Phase::Held {
                    repeat: Some(timer),
                    ..
                } => timer.poll(deadline_ms.saturating_sub(1)),
                _ => 0,
            };
            for _ in 0..fired {
                self.fire_press(true);
            }
            self.phase = Phase::LongPressFired;
            outcome.long_press_fired = true;
            self.fire_long_press();
            return outcome;
        }

        let fired = match &mut self.phase {
            Phase::Held {
                repeat: Some(timer),
                ..
            } => timer.poll(now_ms),
            _ => 0,
        };
        for _ in 0..fired {
            self.fire_press(true);
        }
        outcome
    }

    /// Return the handler to a clean idle state without firing
    /// callbacks: pressed cleared, timers cancelled, pressed-effect
    /// cache dropped. Used on deactivation and on suppressed releases.
    pub(crate) fn reset(&mut self) {
        self.pressed = false;
        self.phase = Phase::Idle;
        self.pressed_cache = None;
    }

    /// Collect the dirty flag, dropping the stale pressed cache along
    /// with it.
    pub(crate) fn take_dirty(&mut self) -> bool {
        if self.visual.take_dirty() {
            self.pressed_cache = None;
            true
        } else {
            false
        }
    }

    /// Produce the frame to upload for this button at the given
    /// dimensions, applying and caching the pressed effect while held.
    pub(crate) async fn render<C>(
        &mut self,
        compositor: &mut C,
        width: u16,
        height: u16,
    ) -> Result<Frame, RenderError<C::Error>>
    where
        C: Compositor<Spec = S>,
    {
        if self.auto_press_effect && self.pressed {
            if let Some(cached) = &self.pressed_cache {
                return Ok(cached.clone());
            }
            let rest = self.compose_rest(compositor, width, height).await?;
            let pressed = render::pressed_frame(&rest);
            self.pressed_cache = Some(pressed.clone());
            return Ok(pressed);
        }
        self.compose_rest(compositor, width, height).await
    }

    async fn compose_rest<C>(
        &mut self,
        compositor: &mut C,
        width: u16,
        height: u16,
    ) -> Result<Frame, RenderError<C::Error>>
    where
        C: Compositor<Spec = S>,
    {
        let frame = compositor
            .compose(&self.visual.spec, self.visual.state, width, height)
            .await
            .map_err(RenderError::Compose)?;
        if frame.width != width || frame.height != height {
            return Err(RenderError::WrongSize {
                expected: (width, height),
                got: (frame.width, frame.height),
            });
        }
        let expected = Frame::expected_len(frame.width, frame.height, frame.format);
        if frame.data.len() != expected {
            return Err(RenderError::Malformed {
                expected,
                got: frame.data.len(),
            });
        }
        Ok(frame)
    }

    fn fire_press(&mut self, repeat: bool) {
        let ev = ButtonEvent {
            index: self.index,
            pressed: self.pressed,
            repeat,
        };
        if let Some(cb) = self.on_press.as_mut() {
            cb(&mut self.visual, ev);
        }
    }

    fn fire_release(&mut self) {
        let ev = ButtonEvent {
            index: self.index,
            pressed: false,
            repeat: false,
        };
        if let Some(cb) = self.on_release.as_mut() {
            cb(&mut self.visual, ev);
        }
    }

    fn fire_long_press(&mut self) {
        let ev = ButtonEvent {
            index: self.index,
            pressed: true,
            repeat: false,
        };
        if let Some(cb) = self.on_long_press.as_mut() {
            cb(&mut self.visual, ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(&'static str, ButtonEvent)>>>;

    fn recording_handler(
        repeat: RepeatPolicy,
        long_press_delay_ms: Option<u64>,
    ) -> (ButtonHandler<&'static str>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (p, r, l) = (log.clone(), log.clone(), log.clone());
        let mut config = ButtonConfig::new(0, "icon")
            .repeat(repeat)
            .on_press(move |_, ev| p.borrow_mut().push(("press", ev)))
            .on_release(move |_, ev| r.borrow_mut().push(("release", ev)))
            .on_long_press(move |_, ev| l.borrow_mut().push(("long_press", ev)));
        if let Some(delay) = long_press_delay_ms {
            config = config.long_press_delay_ms(delay);
        }
        (ButtonHandler::new(config), log)
    }

    fn names(log: &Log) -> Vec<&'static str> {
        log.borrow().iter().map(|(name, _)| *name).collect()
    }

    #[test]
    fn press_then_release_fires_callbacks() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, None);
        h.input(0, true);
        assert!(h.is_pressed());
        h.input(10, false);
        assert!(!h.is_pressed());

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, "press");
        assert!(events[0].1.pressed);
        assert!(!events[0].1.repeat);
        assert_eq!(events[1].0, "release");
        assert!(!events[1].1.pressed);
    }

    #[test]
    fn duplicate_press_edges_are_ignored() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, None);
        h.input(0, true);
        h.input(5, true);
        h.input(10, true);
        assert_eq!(names(&log), ["press"]);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, None);
        h.input(0, false);
        assert!(log.borrow().is_empty());
        assert!(!h.is_pressed());
    }

    #[test]
    fn fixed_period_repeat_timing() {
        let (mut h, log) = recording_handler(RepeatPolicy::Every(100), None);
        h.input(0, true);
        h.poll(99);
        assert_eq!(names(&log), ["press"]);
        h.poll(100);
        h.poll(200);
        h.poll(300);
        assert_eq!(names(&log), ["press", "press", "press", "press"]);
        assert!(log.borrow()[1].1.repeat);
        assert!(!log.borrow()[0].1.repeat);

        h.input(350, false);
        h.poll(400);
        assert_eq!(log.borrow().len(), 5); // + release, no repeat after
        assert_eq!(log.borrow()[4].0, "release");
    }

    #[test]
    fn split_delay_repeat_timing() {
        let policy = RepeatPolicy::After {
            initial_delay_ms: 1000,
            period_ms: 50,
        };
        let (mut h, log) = recording_handler(policy, None);
        h.input(0, true);
        h.poll(999);
        assert_eq!(log.borrow().len(), 1);
        h.poll(1000);
        assert_eq!(log.borrow().len(), 2);
        h.poll(1050);
        h.poll(1100);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn late_polls_catch_up_on_repeats() {
        let (mut h, log) = recording_handler(RepeatPolicy::Every(100), None);
        h.input(0, true);
        h.poll(350);
        // press + repeats at 100, 200, 300
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn long_press_fires_once_and_requests_suppression() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, Some(500));
        h.input(0, true);
        assert!(!h.poll(499).long_press_fired);
        let outcome = h.poll(500);
        assert!(outcome.long_press_fired);
        assert_eq!(names(&log), ["press", "long_press"]);

        // No second firing, and the eventual release stays silent.
        assert!(!h.poll(600).long_press_fired);
        h.input(600, false);
        assert_eq!(names(&log), ["press", "long_press"]);
        assert!(!h.is_pressed());
    }

    #[test]
    fn release_before_long_press_cancels_it() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, Some(500));
        h.input(0, true);
        h.input(400, false);
        h.poll(500);
        assert_eq!(names(&log), ["press", "release"]);
    }

    #[test]
    fn long_press_beats_repeat_on_the_same_instant() {
        let (mut h, log) = recording_handler(RepeatPolicy::Every(250), Some(500));
        h.input(0, true);
        h.poll(250);
        assert_eq!(names(&log), ["press", "press"]);
        h.poll(500);
        assert_eq!(names(&log), ["press", "press", "long_press"]);
        // Repeat timer was cancelled along with the long-press firing.
        h.poll(750);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn late_poll_fires_repeats_due_before_the_long_press() {
        let (mut h, log) = recording_handler(RepeatPolicy::Every(100), Some(500));
        h.input(0, true);
        // One poll landing past the deadline: the repeats at 100..400
        // catch up first, the one coinciding with the deadline loses.
        let outcome = h.poll(700);
        assert!(outcome.long_press_fired);
        assert_eq!(
            names(&log),
            ["press", "press", "press", "press", "press", "long_press"]
        );
        assert!(log.borrow()[1].1.repeat);
        // Timers are cancelled along with the firing.
        h.poll(1000);
        assert_eq!(log.borrow().len(), 6);
    }

    #[test]
    fn repress_after_long_press_works_normally() {
        let (mut h, log) = recording_handler(RepeatPolicy::Disabled, Some(500));
        h.input(0, true);
        h.poll(500);
        h.input(600, false);
        h.input(700, true);
        h.input(800, false);
        assert_eq!(names(&log), ["press", "long_press", "press", "release"]);
    }

    #[test]
    fn set_state_marks_dirty_once() {
        let (mut h, _) = recording_handler(RepeatPolicy::Disabled, None);
        assert!(!h.take_dirty());
        h.visual_mut().set_state(Some("alt"));
        assert!(h.take_dirty());
        assert!(!h.take_dirty());
        // Setting the state already in effect stays clean.
        h.visual_mut().set_state(Some("alt"));
        assert!(!h.take_dirty());
    }

    #[test]
    fn callback_can_switch_visual_state() {
        let config = ButtonConfig::new(0, "icon")
            .on_press(|visual, _| visual.set_state(Some("pressed")))
            .on_release(|visual, _| visual.set_state(None));
        let mut h = ButtonHandler::new(config);
        h.input(0, true);
        assert_eq!(h.visual().state(), Some("pressed"));
        assert!(h.take_dirty());
        h.input(10, false);
        assert_eq!(h.visual().state(), None);
        assert!(h.take_dirty());
    }

    #[test]
    fn reset_clears_pressed_state_and_timers() {
        let (mut h, log) = recording_handler(RepeatPolicy::Every(100), Some(500));
        h.input(0, true);
        h.reset();
        assert!(!h.is_pressed());
        h.poll(1000);
        assert_eq!(names(&log), ["press"]);
    }
}
