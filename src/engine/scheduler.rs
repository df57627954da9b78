use crate::{
    animation::modulator::{Modulator, ModulatorId, Modulators},
    effects::fx::{Effect, EffectChain, EffectId},
    effects::transitions::Transition,
    foundation::core::{ColorBuffer, Grid},
    foundation::error::{LxError, LxResult},
    pattern::{FrameCtx, Pattern},
};

/// Glide time used by [`Engine::set_base_hue`].
pub const BASE_HUE_GLIDE_MS: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
enum Outgoing {
    /// The active pattern keeps running underneath the blend.
    Active,
    /// Frozen composed frame captured when a running transition was interrupted.
    Snapshot(ColorBuffer),
}

/// An in-flight transition toward `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionState {
    target: usize,
    transition: Transition,
    progress: f64,
    elapsed_ms: u64,
    outgoing: Outgoing,
}

impl TransitionState {
    /// Playlist index of the incoming pattern.
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Raw (uneased) progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Milliseconds since the transition started.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Whether the outgoing side is a frozen frame from an interrupted transition.
    pub fn is_from_snapshot(&self) -> bool {
        matches!(self.outgoing, Outgoing::Snapshot(_))
    }
}

struct PatternSlot {
    pattern: Box<dyn Pattern>,
    colors: ColorBuffer,
}

/// Scheduler and compositor.
///
/// Every [`Engine::advance`] call runs the same fixed sequence: advance modulators and effect
/// timers, update transition progress (and the auto-transition policy), run the live
/// patterns, blend, apply the effect chain, and keep the result as [`Engine::colors`].
pub struct Engine {
    grid: Grid,
    slots: Vec<PatternSlot>,
    active: usize,
    active_elapsed_ms: u64,
    transition: Option<TransitionState>,
    default_transition: Transition,
    auto_transition_ms: Option<u64>,
    modulators: Modulators,
    base_hue: Option<ModulatorId>,
    effects: EffectChain,
    composed: ColorBuffer,
    colors: ColorBuffer,
}

fn build_slots(grid: Grid, patterns: Vec<Box<dyn Pattern>>) -> LxResult<Vec<PatternSlot>> {
    if patterns.is_empty() {
        return Err(LxError::configuration("playlist must contain at least one pattern"));
    }
    Ok(patterns
        .into_iter()
        .map(|pattern| PatternSlot {
            pattern,
            colors: ColorBuffer::new(grid.total()),
        })
        .collect())
}

impl Engine {
    pub fn new(grid: Grid, patterns: Vec<Box<dyn Pattern>>) -> LxResult<Self> {
        let mut slots = build_slots(grid, patterns)?;
        slots[0].pattern.on_active();
        Ok(Self {
            grid,
            slots,
            active: 0,
            active_elapsed_ms: 0,
            transition: None,
            default_transition: Transition::default(),
            auto_transition_ms: None,
            modulators: Modulators::new(),
            base_hue: None,
            effects: EffectChain::new(),
            composed: ColorBuffer::new(grid.total()),
            colors: ColorBuffer::new(grid.total()),
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Replace the playlist. The first pattern becomes active immediately; any transition is
    /// dropped. An empty playlist is rejected and leaves the engine unchanged.
    pub fn set_patterns(&mut self, patterns: Vec<Box<dyn Pattern>>) -> LxResult<()> {
        let mut slots = build_slots(self.grid, patterns)?;
        slots[0].pattern.on_active();
        self.slots = slots;
        self.active = 0;
        self.active_elapsed_ms = 0;
        self.transition = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &dyn Pattern> {
        self.slots.iter().map(|s| s.pattern.as_ref())
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_pattern(&self) -> &dyn Pattern {
        self.slots[self.active].pattern.as_ref()
    }

    pub fn next_pattern(&self) -> Option<&dyn Pattern> {
        self.transition
            .as_ref()
            .map(|t| self.slots[t.target].pattern.as_ref())
    }

    pub fn active_transition(&self) -> Option<&TransitionState> {
        self.transition.as_ref()
    }

    /// Milliseconds since the active pattern became active.
    pub fn active_elapsed_ms(&self) -> u64 {
        self.active_elapsed_ms
    }

    /// Output of the most recent [`Engine::advance`] (black before the first tick).
    pub fn colors(&self) -> &ColorBuffer {
        &self.colors
    }

    pub fn default_transition(&self) -> Transition {
        self.default_transition
    }

    pub fn set_default_transition(&mut self, transition: Transition) {
        self.default_transition = transition;
    }

    /// Move to the next pattern once the active one has run for `threshold_ms`.
    ///
    /// With a single-pattern playlist there is no next pattern, so nothing starts.
    pub fn enable_auto_transition(&mut self, threshold_ms: u64) {
        self.auto_transition_ms = Some(threshold_ms);
    }

    pub fn disable_auto_transition(&mut self) {
        self.auto_transition_ms = None;
    }

    pub fn is_auto_transition_enabled(&self) -> bool {
        self.auto_transition_ms.is_some()
    }

    pub fn auto_transition_ms(&self) -> Option<u64> {
        self.auto_transition_ms
    }

    // -- navigation --

    fn destination(&self) -> usize {
        self.transition.as_ref().map_or(self.active, |t| t.target)
    }

    pub fn go_next(&mut self) {
        let i = (self.destination() + 1) % self.slots.len();
        self.begin_transition(i);
    }

    pub fn go_prev(&mut self) {
        let n = self.slots.len();
        let i = (self.destination() + n - 1) % n;
        self.begin_transition(i);
    }

    /// Start a transition to pattern `i`, replacing any transition in progress.
    pub fn go_index(&mut self, i: usize) -> LxResult<()> {
        if i >= self.slots.len() {
            return Err(LxError::invalid_input(format!(
                "pattern index {i} out of range (playlist has {})",
                self.slots.len()
            )));
        }
        self.begin_transition(i);
        Ok(())
    }

    fn begin_transition(&mut self, target: usize) {
        let previous = self.transition.take();
        if previous.is_none() && target == self.active {
            return;
        }

        let outgoing = match &previous {
            None => Outgoing::Active,
            Some(_) => Outgoing::Snapshot(self.composed.clone()),
        };
        let previous_target = previous.as_ref().map(|t| t.target);
        if let Some(dropped) = previous_target {
            if dropped != target && dropped != self.active {
                self.slots[dropped].pattern.on_inactive();
            }
        }
        if target != self.active && previous_target != Some(target) {
            self.slots[target].pattern.on_active();
        }

        let transition = self.slots[target]
            .pattern
            .transition()
            .unwrap_or(self.default_transition);
        tracing::debug!(
            from = self.active,
            to = target,
            duration_ms = transition.duration_ms,
            interrupted = previous.is_some(),
            "transition started"
        );
        self.transition = Some(TransitionState {
            target,
            transition,
            progress: if transition.duration_ms == 0 { 1.0 } else { 0.0 },
            elapsed_ms: 0,
            outgoing,
        });
    }

    fn finish_transition(&mut self) {
        let Some(t) = self.transition.take() else {
            return;
        };
        let previous = self.active;
        self.active = t.target;
        self.active_elapsed_ms = 0;
        if previous != t.target {
            self.slots[previous].pattern.on_inactive();
        }
        tracing::debug!(from = previous, to = t.target, "transition complete");
    }

    // -- modulators --

    /// Register a global modulator; it is advanced every tick until removed.
    pub fn add_modulator(&mut self, modulator: Modulator) -> ModulatorId {
        self.modulators.add(modulator)
    }

    pub fn remove_modulator(&mut self, id: ModulatorId) -> Option<Modulator> {
        if self.base_hue == Some(id) {
            self.base_hue = None;
        }
        self.modulators.remove(id)
    }

    pub fn modulator(&self, id: ModulatorId) -> Option<&Modulator> {
        self.modulators.get(id)
    }

    pub fn modulator_mut(&mut self, id: ModulatorId) -> Option<&mut Modulator> {
        self.modulators.get_mut(id)
    }

    pub fn modulators(&self) -> &Modulators {
        &self.modulators
    }

    /// Shared base hue in `[0, 360)`; 0 when no base-hue modulator is installed.
    pub fn base_hue(&self) -> f64 {
        self.base_hue
            .and_then(|id| self.modulators.value(id))
            .map_or(0.0, |v| v.rem_euclid(360.0))
    }

    /// Swap the base-hue modulator; the previous one is detached.
    pub fn replace_base_hue(&mut self, modulator: Modulator) -> ModulatorId {
        if let Some(old) = self.base_hue.take() {
            self.modulators.remove(old);
        }
        let id = self.modulators.add(modulator);
        self.base_hue = Some(id);
        id
    }

    /// Glide to a fixed hue.
    pub fn set_base_hue(&mut self, hue: f64) -> ModulatorId {
        let current = self.base_hue();
        self.replace_base_hue(
            Modulator::linear_envelope(current, hue, BASE_HUE_GLIDE_MS).triggered(),
        )
    }

    /// Cycle through the spectrum every `period_ms`, continuing from the current hue.
    pub fn cycle_base_hue(&mut self, period_ms: f64) -> ModulatorId {
        let current = self.base_hue();
        self.replace_base_hue(
            Modulator::saw(0.0, 360.0, period_ms)
                .with_value(current)
                .started(),
        )
    }

    /// Oscillate between two hues, continuing from the current hue when it lies in range.
    pub fn oscillate_base_hue(&mut self, low: f64, high: f64, period_ms: f64) -> ModulatorId {
        let current = self.base_hue();
        self.replace_base_hue(
            Modulator::triangle(low, high, period_ms)
                .with_value(current)
                .started(),
        )
    }

    // -- effects --

    pub fn add_effect(&mut self, effect: Box<dyn Effect>) -> EffectId {
        self.effects.add(effect)
    }

    pub fn remove_effect(&mut self, id: EffectId) -> Option<Box<dyn Effect>> {
        self.effects.remove(id)
    }

    pub fn set_effect_enabled(&mut self, id: EffectId, enabled: bool) -> bool {
        self.effects.set_enabled(id, enabled)
    }

    pub fn trigger_effect(&mut self, id: EffectId) -> bool {
        self.effects.trigger(id)
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    // -- tick --

    /// Advance the whole pipeline by `delta_ms` and return the final frame.
    ///
    /// A negative `delta_ms` is rejected before any state changes.
    pub fn advance(&mut self, delta_ms: i64) -> LxResult<&ColorBuffer> {
        let delta = u64::try_from(delta_ms).map_err(|_| {
            LxError::invalid_input(format!("delta_ms must be >= 0, got {delta_ms}"))
        })?;

        self.run_modulators(delta);
        self.effects.run(delta);

        self.active_elapsed_ms = self.active_elapsed_ms.saturating_add(delta);
        if let Some(t) = &mut self.transition {
            t.elapsed_ms = t.elapsed_ms.saturating_add(delta);
            t.progress = if t.transition.duration_ms == 0 {
                1.0
            } else {
                (t.elapsed_ms as f64 / t.transition.duration_ms as f64).min(1.0)
            };
        }
        if let Some(threshold) = self.auto_transition_ms {
            if self.transition.is_none() && self.active_elapsed_ms >= threshold {
                self.go_next();
            }
        }

        self.compose(delta)?;

        self.colors.copy_from(&self.composed);
        self.effects.apply(self.grid, &mut self.colors);
        Ok(&self.colors)
    }

    fn run_modulators(&mut self, delta: u64) {
        self.modulators.run(delta);

        let active_is_live = self
            .transition
            .as_ref()
            .is_none_or(|t| t.outgoing == Outgoing::Active);
        if active_is_live {
            if let Some(m) = self.slots[self.active].pattern.modulators() {
                m.run(delta);
            }
        }
        if let Some(t) = &self.transition {
            if let Some(m) = self.slots[t.target].pattern.modulators() {
                m.run(delta);
            }
        }
    }

    fn compose(&mut self, delta: u64) -> LxResult<()> {
        let base_hue = self.base_hue();
        let ctx = |elapsed_ms| FrameCtx {
            grid: self.grid,
            elapsed_ms,
            delta_ms: delta,
            base_hue,
        };

        let Some(t) = &self.transition else {
            let slot = &mut self.slots[self.active];
            slot.pattern
                .run(&ctx(self.active_elapsed_ms), &mut slot.colors);
            self.composed.copy_from(&slot.colors);
            return Ok(());
        };

        if t.outgoing == Outgoing::Active {
            let slot = &mut self.slots[self.active];
            slot.pattern
                .run(&ctx(self.active_elapsed_ms), &mut slot.colors);
        }
        let incoming = &mut self.slots[t.target];
        incoming.pattern.run(&ctx(t.elapsed_ms), &mut incoming.colors);

        let outgoing = match &t.outgoing {
            Outgoing::Active => &self.slots[self.active].colors,
            Outgoing::Snapshot(frame) => frame,
        };
        t.transition.blend_into(
            self.grid,
            outgoing,
            &self.slots[t.target].colors,
            t.progress,
            &mut self.composed,
        )?;

        if t.progress >= 1.0 {
            self.finish_transition();
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("grid", &self.grid)
            .field(
                "patterns",
                &self.patterns().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("active", &self.active)
            .field("transition", &self.transition)
            .field("auto_transition_ms", &self.auto_transition_ms)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scheduler.rs"]
mod tests;
