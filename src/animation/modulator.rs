use std::f64::consts::TAU;

/// Periodic waveform shapes, all sweeping `start -> end` over one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Linear ramp from start to end, then wraps.
    Saw,
    /// Rises to end at half period, falls back to start.
    Triangle,
    /// Cosine-shaped rise and fall, starting at start.
    Sine,
    /// Holds start for the first half period and end for the second.
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModulatorKind {
    Lfo { waveform: Waveform, period_ms: f64 },
    LinearEnvelope { duration_ms: f64 },
}

/// A time-driven scalar generator.
///
/// Internally the modulator tracks a normalized `basis` in `[0, 1]`. Each [`Modulator::run`]
/// advances the basis by `delta / span`; looping modulators wrap, one-shot ones clamp at 1,
/// stop, and hold their terminal value.
#[derive(Clone, Debug, PartialEq)]
pub struct Modulator {
    kind: ModulatorKind,
    start: f64,
    end: f64,
    basis: f64,
    value: f64,
    running: bool,
    looping: bool,
}

fn sanitize_span(ms: f64) -> f64 {
    if ms.is_finite() { ms.max(0.0) } else { 0.0 }
}

impl Modulator {
    fn lfo(waveform: Waveform, start: f64, end: f64, period_ms: f64) -> Self {
        Self {
            kind: ModulatorKind::Lfo {
                waveform,
                period_ms: sanitize_span(period_ms),
            },
            start,
            end,
            basis: 0.0,
            value: start,
            running: false,
            looping: true,
        }
    }

    pub fn saw(start: f64, end: f64, period_ms: f64) -> Self {
        Self::lfo(Waveform::Saw, start, end, period_ms)
    }

    pub fn triangle(start: f64, end: f64, period_ms: f64) -> Self {
        Self::lfo(Waveform::Triangle, start, end, period_ms)
    }

    pub fn sine(start: f64, end: f64, period_ms: f64) -> Self {
        Self::lfo(Waveform::Sine, start, end, period_ms)
    }

    pub fn square(start: f64, end: f64, period_ms: f64) -> Self {
        Self::lfo(Waveform::Square, start, end, period_ms)
    }

    /// One-shot ramp from `start` to `end` over `duration_ms`.
    pub fn linear_envelope(start: f64, end: f64, duration_ms: f64) -> Self {
        Self {
            kind: ModulatorKind::LinearEnvelope {
                duration_ms: sanitize_span(duration_ms),
            },
            start,
            end,
            basis: 0.0,
            value: start,
            running: false,
            looping: false,
        }
    }

    pub fn started(mut self) -> Self {
        self.start();
        self
    }

    pub fn triggered(mut self) -> Self {
        self.trigger();
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn kind(&self) -> ModulatorKind {
        self.kind
    }

    pub fn range(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn basis(&self) -> f64 {
        self.basis
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Resume advancing from the current basis.
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restart from the beginning of the cycle and run.
    pub fn trigger(&mut self) {
        self.basis = 0.0;
        self.value = self.compute(0.0);
        self.running = true;
    }

    /// Jump to `value`, mapped onto the rising segment of the waveform.
    pub fn set_value(&mut self, value: f64) {
        let span = self.end - self.start;
        let t = if span == 0.0 || !value.is_finite() {
            0.0
        } else {
            ((value - self.start) / span).clamp(0.0, 1.0)
        };
        self.basis = match self.kind {
            ModulatorKind::LinearEnvelope { .. } => t,
            ModulatorKind::Lfo { waveform, .. } => match waveform {
                Waveform::Saw => t,
                Waveform::Triangle => t / 2.0,
                Waveform::Sine => (1.0 - 2.0 * t).acos() / TAU,
                Waveform::Square => {
                    if t < 0.5 {
                        0.0
                    } else {
                        0.5
                    }
                }
            },
        };
        self.value = self.compute(self.basis);
    }

    fn span_ms(&self) -> f64 {
        match self.kind {
            ModulatorKind::Lfo { period_ms, .. } => period_ms,
            ModulatorKind::LinearEnvelope { duration_ms } => duration_ms,
        }
    }

    fn lerp(&self, t: f64) -> f64 {
        self.start + (self.end - self.start) * t
    }

    fn compute(&self, basis: f64) -> f64 {
        match self.kind {
            ModulatorKind::LinearEnvelope { .. } => self.lerp(basis),
            ModulatorKind::Lfo { waveform, .. } => match waveform {
                Waveform::Saw => self.lerp(basis),
                Waveform::Triangle => {
                    if basis < 0.5 {
                        self.lerp(2.0 * basis)
                    } else {
                        self.lerp(2.0 - 2.0 * basis)
                    }
                }
                Waveform::Sine => self.lerp((1.0 - (TAU * basis).cos()) / 2.0),
                Waveform::Square => {
                    if basis < 0.5 {
                        self.start
                    } else {
                        self.end
                    }
                }
            },
        }
    }

    /// Advance by `delta_ms`. Stopped modulators are left untouched.
    pub fn run(&mut self, delta_ms: u64) {
        if !self.running {
            return;
        }
        let span = self.span_ms();
        if span <= 0.0 {
            if !self.looping {
                self.basis = 1.0;
                self.running = false;
            }
        } else {
            self.basis += delta_ms as f64 / span;
            if self.basis >= 1.0 {
                if self.looping {
                    self.basis = self.basis.fract();
                } else {
                    self.basis = 1.0;
                    self.running = false;
                }
            }
        }
        self.value = self.compute(self.basis);
    }
}

/// Handle to a modulator registered in a [`Modulators`] bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulatorId(u64);

/// An ordered bank of modulators, advanced together in registration order.
#[derive(Clone, Debug, Default)]
pub struct Modulators {
    next_id: u64,
    entries: Vec<(ModulatorId, Modulator)>,
}

impl Modulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modulator: Modulator) -> ModulatorId {
        let id = ModulatorId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, modulator));
        id
    }

    /// Detach a modulator. Unknown ids are ignored.
    pub fn remove(&mut self, id: ModulatorId) -> Option<Modulator> {
        let pos = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, id: ModulatorId) -> Option<&Modulator> {
        self.entries
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, m)| m)
    }

    pub fn get_mut(&mut self, id: ModulatorId) -> Option<&mut Modulator> {
        self.entries
            .iter_mut()
            .find(|(eid, _)| *eid == id)
            .map(|(_, m)| m)
    }

    pub fn value(&self, id: ModulatorId) -> Option<f64> {
        self.get(id).map(Modulator::value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModulatorId, &Modulator)> {
        self.entries.iter().map(|(id, m)| (*id, m))
    }

    pub fn run(&mut self, delta_ms: u64) {
        for (_, m) in &mut self.entries {
            m.run(delta_ms);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/modulator.rs"]
mod tests;
