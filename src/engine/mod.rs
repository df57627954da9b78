//! Playlist scheduling, transition blending and effect composition.

mod scheduler;

pub use scheduler::{BASE_HUE_GLIDE_MS, Engine, TransitionState};
