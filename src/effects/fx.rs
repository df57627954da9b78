use crate::{
    animation::modulator::Modulator,
    foundation::core::{Color, ColorBuffer, Grid},
    foundation::math::constrain,
};

/// A post-composition transform over the final frame.
pub trait Effect {
    fn name(&self) -> &str;

    /// Transform `colors` in place. Called only while the effect is enabled.
    fn apply(&mut self, grid: Grid, colors: &mut ColorBuffer);

    /// Advance internal timers. Called every tick, enabled or not.
    fn run(&mut self, _delta_ms: u64) {}

    /// Momentary activation for effects that have one; others ignore it.
    fn trigger(&mut self) {}
}

/// Pulls every cell toward gray at its own brightness.
#[derive(Clone, Debug)]
pub struct DesaturationEffect {
    amount: f64,
}

impl DesaturationEffect {
    /// `amount` in `[0, 1]`; 1 removes all saturation.
    pub fn new(amount: f64) -> Self {
        Self {
            amount: constrain(amount, 0.0, 1.0),
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl Default for DesaturationEffect {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Effect for DesaturationEffect {
    fn name(&self) -> &str {
        "desaturation"
    }

    fn apply(&mut self, _grid: Grid, colors: &mut ColorBuffer) {
        if self.amount <= 0.0 {
            return;
        }
        for c in colors.as_mut_slice() {
            let max = c.r().max(c.g()).max(c.b());
            *c = c.lerp(Color::argb(c.a(), max, max, max), self.amount);
        }
    }
}

/// Flashes to white on trigger, then decays back to pass-through.
#[derive(Clone, Debug)]
pub struct FlashEffect {
    envelope: Modulator,
    active: bool,
}

impl FlashEffect {
    pub const DEFAULT_DECAY_MS: f64 = 1000.0;

    pub fn new(decay_ms: f64) -> Self {
        Self {
            envelope: Modulator::linear_envelope(1.0, 0.0, decay_ms),
            active: false,
        }
    }

    /// Current white mix in `[0, 1]`.
    pub fn intensity(&self) -> f64 {
        if self.active {
            constrain(self.envelope.value(), 0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for FlashEffect {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DECAY_MS)
    }
}

impl Effect for FlashEffect {
    fn name(&self) -> &str {
        "flash"
    }

    fn apply(&mut self, _grid: Grid, colors: &mut ColorBuffer) {
        let intensity = self.intensity();
        if intensity <= 0.0 {
            return;
        }
        for c in colors.as_mut_slice() {
            *c = c.lerp(Color::WHITE, intensity);
        }
    }

    fn run(&mut self, delta_ms: u64) {
        if !self.active {
            return;
        }
        self.envelope.run(delta_ms);
        if !self.envelope.is_running() {
            self.active = false;
        }
    }

    fn trigger(&mut self) {
        self.envelope.trigger();
        self.active = true;
    }
}

/// Handle to an effect installed in an [`EffectChain`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

struct EffectSlot {
    id: EffectId,
    enabled: bool,
    effect: Box<dyn Effect>,
}

/// Ordered effect chain; effects compose left to right.
#[derive(Default)]
pub struct EffectChain {
    next_id: u64,
    slots: Vec<EffectSlot>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enabled effect to the end of the chain.
    pub fn add(&mut self, effect: Box<dyn Effect>) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        self.slots.push(EffectSlot {
            id,
            enabled: true,
            effect,
        });
        id
    }

    pub fn remove(&mut self, id: EffectId) -> Option<Box<dyn Effect>> {
        let pos = self.slots.iter().position(|s| s.id == id)?;
        Some(self.slots.remove(pos).effect)
    }

    /// Returns `false` when `id` is not in the chain.
    pub fn set_enabled(&mut self, id: EffectId, enabled: bool) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, id: EffectId) -> Option<bool> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.enabled)
    }

    /// Returns `false` when `id` is not in the chain.
    pub fn trigger(&mut self, id: EffectId) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.effect.trigger();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(id, name, enabled)` in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (EffectId, &str, bool)> {
        self.slots
            .iter()
            .map(|s| (s.id, s.effect.name(), s.enabled))
    }

    pub fn run(&mut self, delta_ms: u64) {
        for slot in &mut self.slots {
            slot.effect.run(delta_ms);
        }
    }

    pub fn apply(&mut self, grid: Grid, colors: &mut ColorBuffer) {
        for slot in self.slots.iter_mut().filter(|s| s.enabled) {
            slot.effect.apply(grid, colors);
        }
    }
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/fx.rs"]
mod tests;
