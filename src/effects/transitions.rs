use crate::{
    animation::ease::Ease,
    foundation::core::{Color, ColorBuffer, Grid},
    foundation::error::{LxError, LxResult},
    foundation::math::{add_sat_u8, mix_u8, mul_div255_u16, unit_to_u8_weight},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeDir {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

/// Blend function between an outgoing and an incoming frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionKind {
    /// Linear channel interpolation.
    Crossfade,
    /// Incoming is added on top during the first half, outgoing fades out during the second.
    Add,
    /// A hard edge sweeps across the grid revealing the incoming frame.
    Wipe { dir: WipeDir },
}

/// A transition as installed on the engine or declared by a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    #[serde(flatten)]
    pub kind: TransitionKind,
    pub duration_ms: u64,
    #[serde(default)]
    pub ease: Ease,
}

impl Default for Transition {
    fn default() -> Self {
        Self::crossfade(1000)
    }
}

impl Transition {
    pub fn crossfade(duration_ms: u64) -> Self {
        Self {
            kind: TransitionKind::Crossfade,
            duration_ms,
            ease: Ease::Linear,
        }
    }

    pub fn add(duration_ms: u64) -> Self {
        Self {
            kind: TransitionKind::Add,
            duration_ms,
            ease: Ease::Linear,
        }
    }

    pub fn wipe(dir: WipeDir, duration_ms: u64) -> Self {
        Self {
            kind: TransitionKind::Wipe { dir },
            duration_ms,
            ease: Ease::Linear,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Blend at raw `progress`; the transition's ease is applied first.
    pub fn blend_into(
        &self,
        grid: Grid,
        outgoing: &ColorBuffer,
        incoming: &ColorBuffer,
        progress: f64,
        out: &mut ColorBuffer,
    ) -> LxResult<()> {
        blend_into(
            self.kind,
            grid,
            outgoing,
            incoming,
            self.ease.apply(progress),
            out,
        )
    }
}

fn add_channels(a: u8, b: u8, a_weight: u16, b_weight: u16) -> u8 {
    add_sat_u8(
        mul_div255_u16(u16::from(a), a_weight),
        mul_div255_u16(u16::from(b), b_weight),
    )
}

fn add_color(a: Color, b: Color, progress: f64) -> Color {
    let (aw, bw) = if progress < 0.5 {
        (255, unit_to_u8_weight(2.0 * progress))
    } else {
        (unit_to_u8_weight(2.0 - 2.0 * progress), 255)
    };
    Color::argb(
        mix_u8(a.a(), b.a(), unit_to_u8_weight(progress)),
        add_channels(a.r(), b.r(), aw, bw),
        add_channels(a.g(), b.g(), aw, bw),
        add_channels(a.b(), b.b(), aw, bw),
    )
}

fn wipe_position(grid: Grid, i: usize, dir: WipeDir) -> f64 {
    let w = f64::from(grid.width());
    let h = f64::from(grid.height());
    let col = grid.column(i) as f64;
    let row = grid.row(i) as f64;
    match dir {
        WipeDir::LeftToRight => (col + 0.5) / w,
        WipeDir::RightToLeft => (w - col - 0.5) / w,
        WipeDir::TopToBottom => (row + 0.5) / h,
        WipeDir::BottomToTop => (h - row - 0.5) / h,
    }
}

/// Blend two equal-length frames. Progress 0 reproduces `outgoing` exactly and progress 1
/// reproduces `incoming` exactly; every cell is blended independently.
pub fn blend_into(
    kind: TransitionKind,
    grid: Grid,
    outgoing: &ColorBuffer,
    incoming: &ColorBuffer,
    progress: f64,
    out: &mut ColorBuffer,
) -> LxResult<()> {
    if outgoing.len() != incoming.len() || out.len() != outgoing.len() {
        return Err(LxError::invalid_input(
            "transition blend expects equal-length color buffers",
        ));
    }
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };

    let cells = out
        .as_mut_slice()
        .iter_mut()
        .zip(outgoing.iter().zip(incoming.iter()))
        .enumerate();
    match kind {
        TransitionKind::Crossfade => {
            for (_, (dst, (a, b))) in cells {
                *dst = a.lerp(*b, progress);
            }
        }
        TransitionKind::Add => {
            for (_, (dst, (a, b))) in cells {
                *dst = add_color(*a, *b, progress);
            }
        }
        TransitionKind::Wipe { dir } => {
            for (i, (dst, (a, b))) in cells {
                *dst = if wipe_position(grid, i, dir) < progress {
                    *b
                } else {
                    *a
                };
            }
        }
    }
    Ok(())
}

/// Allocating variant of [`blend_into`].
pub fn blend(
    kind: TransitionKind,
    grid: Grid,
    outgoing: &ColorBuffer,
    incoming: &ColorBuffer,
    progress: f64,
) -> LxResult<ColorBuffer> {
    let mut out = ColorBuffer::new(outgoing.len());
    blend_into(kind, grid, outgoing, incoming, progress, &mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
