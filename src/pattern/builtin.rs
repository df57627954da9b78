use crate::{
    animation::modulator::{Modulator, ModulatorId, Modulators},
    effects::transitions::Transition,
    foundation::core::{Color, ColorBuffer, Grid},
    pattern::{FrameCtx, Pattern},
};

/// Fills every cell with one color.
#[derive(Clone, Debug)]
pub struct SolidPattern {
    color: Color,
    transition: Option<Transition>,
}

impl SolidPattern {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            transition: None,
        }
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }
}

impl Pattern for SolidPattern {
    fn name(&self) -> &str {
        "solid"
    }

    fn run(&mut self, _ctx: &FrameCtx, colors: &mut ColorBuffer) {
        colors.fill(self.color);
    }

    fn transition(&self) -> Option<Transition> {
        self.transition
    }
}

/// Lights the cells one at a time in index order; useful for checking a node map.
#[derive(Clone, Debug)]
pub struct IteratorPattern {
    modulators: Modulators,
    index: ModulatorId,
}

impl IteratorPattern {
    pub const STEP_MS: f64 = 100.0;

    pub fn new(grid: Grid) -> Self {
        let total = grid.total() as f64;
        let mut modulators = Modulators::new();
        let index = modulators.add(Modulator::saw(0.0, total, total * Self::STEP_MS).triggered());
        Self { modulators, index }
    }

    /// Index of the lit cell for the current modulator state.
    pub fn active_cell(&self) -> usize {
        self.modulators.value(self.index).unwrap_or(0.0).floor().max(0.0) as usize
    }
}

impl Pattern for IteratorPattern {
    fn name(&self) -> &str {
        "iterator"
    }

    fn run(&mut self, _ctx: &FrameCtx, colors: &mut ColorBuffer) {
        let active = self.active_cell();
        for (i, c) in colors.as_mut_slice().iter_mut().enumerate() {
            *c = if i == active {
                Color::WHITE
            } else {
                Color::BLACK
            };
        }
    }

    fn modulators(&mut self) -> Option<&mut Modulators> {
        Some(&mut self.modulators)
    }
}

/// Horizontal rainbow offset by the shared base hue.
#[derive(Clone, Debug)]
pub struct HueGradientPattern {
    spread: f64,
    brightness: f64,
}

impl HueGradientPattern {
    /// `spread` is the hue range in degrees covered from the left to the right column.
    pub fn new(spread: f64) -> Self {
        Self {
            spread,
            brightness: 100.0,
        }
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = brightness;
        self
    }
}

impl Pattern for HueGradientPattern {
    fn name(&self) -> &str {
        "hue-gradient"
    }

    fn run(&mut self, ctx: &FrameCtx, colors: &mut ColorBuffer) {
        for (i, c) in colors.as_mut_slice().iter_mut().enumerate() {
            let hue = ctx.base_hue + self.spread * ctx.grid.xpos(i);
            *c = Color::hsb(hue, 100.0, self.brightness);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pattern/builtin.rs"]
mod tests;
