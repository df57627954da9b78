//! Pattern contract and the built-in patterns.
//!
//! A pattern owns its modulators; the engine advances them only while the pattern is active
//! or incoming, so an idle pattern resumes exactly where it left off.

mod builtin;

pub use builtin::{HueGradientPattern, IteratorPattern, SolidPattern};

use crate::{
    animation::modulator::Modulators,
    effects::transitions::Transition,
    foundation::core::{ColorBuffer, Grid},
};

/// Per-frame context handed to [`Pattern::run`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCtx {
    pub grid: Grid,
    /// Milliseconds since this pattern became active (or started transitioning in).
    pub elapsed_ms: u64,
    pub delta_ms: u64,
    /// Shared base hue in degrees, `[0, 360)`.
    pub base_hue: f64,
}

/// A unit of visual behavior producing one frame per tick.
pub trait Pattern {
    fn name(&self) -> &str;

    /// Write this frame's colors. `colors` has exactly `grid.total()` entries and keeps the
    /// values written on the previous frame.
    fn run(&mut self, ctx: &FrameCtx, colors: &mut ColorBuffer);

    /// Modulators the engine advances while this pattern is live.
    fn modulators(&mut self) -> Option<&mut Modulators> {
        None
    }

    /// Transition used when switching to this pattern; `None` uses the engine default.
    fn transition(&self) -> Option<Transition> {
        None
    }

    /// Called when the pattern starts transitioning in.
    fn on_active(&mut self) {}

    /// Called once the pattern has been fully replaced.
    fn on_inactive(&mut self) {}
}
