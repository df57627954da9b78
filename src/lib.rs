//! lxgrid drives a rectangular grid of addressable lights in real time.
//!
//! Each host tick advances an [`Engine`]: modulators run, the active [`Pattern`] renders,
//! transitions blend the outgoing and incoming patterns, and the effect chain post-processes
//! the frame. A [`ThrottledOutput`] then maps cells to KiNET ports and streams UDP datagrams
//! at a bounded rate, dropping frames that arrive before the next send is due.
//!
//! - Build a playlist of [`Pattern`]s and an [`Lx`] (or a bare [`Engine`])
//! - Attach a [`ThrottledOutput`] with a [`NodeMap`]
//! - Call [`Lx::tick`] once per host frame
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod config;
pub mod effects;
pub mod engine;
pub mod lx;
pub mod output;
pub mod pattern;

pub use crate::foundation::core::{Color, ColorBuffer, Grid};
pub use crate::foundation::error::{LxError, LxResult};
pub use crate::foundation::math::constrain;

pub use crate::animation::ease::Ease;
pub use crate::animation::modulator::{Modulator, ModulatorId, ModulatorKind, Modulators, Waveform};
pub use crate::config::{LxConfig, NodeConfig, PortConfig};
pub use crate::effects::fx::{DesaturationEffect, Effect, EffectChain, EffectId, FlashEffect};
pub use crate::effects::transitions::{Transition, TransitionKind, WipeDir, blend, blend_into};
pub use crate::engine::{Engine, TransitionState};
pub use crate::lx::{BasicEffects, Lx};
pub use crate::output::{
    DEFAULT_FRAMERATE, DatagramSink, KINET_UDP_PORT, NodeAddr, NodeMap, OutputStats, Port,
    PortAddr, PortOut, ThrottledOutput,
};
pub use crate::pattern::{FrameCtx, HueGradientPattern, IteratorPattern, Pattern, SolidPattern};
