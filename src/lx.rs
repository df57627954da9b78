use std::net::UdpSocket;

use crate::{
    effects::fx::{DesaturationEffect, EffectId, FlashEffect},
    engine::Engine,
    foundation::core::{ColorBuffer, Grid},
    foundation::error::{LxError, LxResult},
    foundation::math::constrain,
    output::node_map::NodeMap,
    output::throttle::{DatagramSink, ThrottledOutput},
    pattern::Pattern,
};

/// Period of the default base-hue cycle.
pub const BASE_HUE_PERIOD_MS: f64 = 30_000.0;

/// Handles for the effects installed by [`Lx::enable_basic_effects`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicEffects {
    pub desaturation: EffectId,
    pub flash: EffectId,
}

/// Host-facing entry point: one [`Engine`] plus the optional network output.
///
/// The host calls [`Lx::tick`] once per frame. Brightness scaling only touches the frame that
/// goes to the network; [`Lx::colors`] always reports the engine's own output.
pub struct Lx<S = UdpSocket> {
    engine: Engine,
    brightness: f64,
    output: Option<ThrottledOutput<S>>,
    basic_effects: Option<BasicEffects>,
    dimmed: ColorBuffer,
}

impl<S: DatagramSink> Lx<S> {
    pub fn new(grid: Grid, patterns: Vec<Box<dyn Pattern>>) -> LxResult<Self> {
        let mut engine = Engine::new(grid, patterns)?;
        engine.cycle_base_hue(BASE_HUE_PERIOD_MS);
        Ok(Self {
            engine,
            brightness: 1.0,
            output: None,
            basic_effects: None,
            dimmed: ColorBuffer::new(grid.total()),
        })
    }

    pub fn grid(&self) -> Grid {
        self.engine.grid()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn colors(&self) -> &ColorBuffer {
        self.engine.colors()
    }

    /// Install a disabled desaturation and a flash effect. Repeated calls return the same ids.
    pub fn enable_basic_effects(&mut self) -> BasicEffects {
        if let Some(fx) = self.basic_effects {
            return fx;
        }
        let desaturation = self.engine.add_effect(Box::new(DesaturationEffect::default()));
        self.engine.set_effect_enabled(desaturation, false);
        let flash = self.engine.add_effect(Box::new(FlashEffect::default()));
        let fx = BasicEffects {
            desaturation,
            flash,
        };
        self.basic_effects = Some(fx);
        fx
    }

    pub fn basic_effects(&self) -> Option<BasicEffects> {
        self.basic_effects
    }

    /// Trigger the basic flash. Returns `false` when basic effects are not enabled.
    pub fn flash(&mut self) -> bool {
        match self.basic_effects {
            Some(fx) => self.engine.trigger_effect(fx.flash),
            None => false,
        }
    }

    pub fn set_desaturated(&mut self, on: bool) -> bool {
        match self.basic_effects {
            Some(fx) => self.engine.set_effect_enabled(fx.desaturation, on),
            None => false,
        }
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Network brightness in `[0, 1]`; out-of-range values are clamped.
    pub fn set_brightness(&mut self, brightness: f64) {
        self.brightness = constrain(brightness, 0.0, 1.0);
    }

    /// Attach an output built for the same grid, replacing any previous one.
    pub fn attach_output(&mut self, output: ThrottledOutput<S>) -> LxResult<()> {
        if output.grid() != self.grid() {
            return Err(LxError::configuration(format!(
                "output grid {:?} does not match engine grid {:?}",
                output.grid(),
                self.grid()
            )));
        }
        self.output = Some(output);
        Ok(())
    }

    pub fn detach_output(&mut self) -> Option<ThrottledOutput<S>> {
        self.output.take()
    }

    pub fn output(&self) -> Option<&ThrottledOutput<S>> {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> Option<&mut ThrottledOutput<S>> {
        self.output.as_mut()
    }

    pub fn set_node_map(&mut self, map: NodeMap) -> LxResult<()> {
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| LxError::configuration("no output attached"))?;
        output.set_node_map(map)
    }

    /// Advance the engine by `delta_ms` and offer the frame to the output at `now_ms`.
    pub fn tick(&mut self, delta_ms: i64, now_ms: u64) -> LxResult<&ColorBuffer> {
        let colors = self.engine.advance(delta_ms)?;
        if let Some(output) = &mut self.output {
            let frame = if self.brightness < 1.0 {
                for (dst, src) in self.dimmed.as_mut_slice().iter_mut().zip(colors.iter()) {
                    *dst = src.scale_brightness(self.brightness);
                }
                &self.dimmed
            } else {
                colors
            };
            output.submit(frame, now_ms)?;
        }
        Ok(self.engine.colors())
    }
}

impl<S> std::fmt::Debug for Lx<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lx")
            .field("engine", &self.engine)
            .field("brightness", &self.brightness)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/lx.rs"]
mod tests;
