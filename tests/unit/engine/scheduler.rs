use super::*;
use crate::{
    effects::fx::FlashEffect,
    effects::transitions::{Transition, TransitionKind},
    foundation::core::Color,
    pattern::SolidPattern,
};
use std::{cell::RefCell, rc::Rc};

const RED: Color = Color::rgb(255, 0, 0);
const GREEN: Color = Color::rgb(0, 255, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

fn grid() -> Grid {
    Grid::new(4, 1).unwrap()
}

fn solids(colors: &[Color]) -> Vec<Box<dyn Pattern>> {
    colors
        .iter()
        .map(|c| Box::new(SolidPattern::new(*c)) as Box<dyn Pattern>)
        .collect()
}

fn engine(colors: &[Color]) -> Engine {
    Engine::new(grid(), solids(colors)).unwrap()
}

#[derive(Default)]
struct Log {
    elapsed: Vec<u64>,
    events: Vec<&'static str>,
}

/// Records what the engine tells it; paints one fixed color.
struct Recorder {
    color: Color,
    log: Rc<RefCell<Log>>,
    modulators: Modulators,
}

impl Recorder {
    fn new(color: Color) -> (Self, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut modulators = Modulators::new();
        modulators.add(Modulator::linear_envelope(0.0, 1000.0, 1000.0).triggered());
        (
            Self {
                color,
                log: log.clone(),
                modulators,
            },
            log,
        )
    }
}

impl Pattern for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn run(&mut self, ctx: &FrameCtx, colors: &mut ColorBuffer) {
        self.log.borrow_mut().elapsed.push(ctx.elapsed_ms);
        colors.fill(self.color);
    }

    fn modulators(&mut self) -> Option<&mut Modulators> {
        Some(&mut self.modulators)
    }

    fn on_active(&mut self) {
        self.log.borrow_mut().events.push("active");
    }

    fn on_inactive(&mut self) {
        self.log.borrow_mut().events.push("inactive");
    }
}

#[test]
fn empty_playlist_is_rejected() {
    let err = Engine::new(grid(), Vec::new()).unwrap_err();
    assert!(matches!(err, LxError::Configuration(_)));

    let mut e = engine(&[RED]);
    assert!(e.set_patterns(Vec::new()).is_err());
    assert_eq!(e.len(), 1);
}

#[test]
fn advance_returns_full_length_buffer_for_any_delta() {
    let mut e = engine(&[RED, GREEN]);
    e.enable_auto_transition(30);
    for delta in [0, 1, 7, 16, 33, 1000, 0, 250, 5000] {
        let out = e.advance(delta).unwrap();
        assert_eq!(out.len(), grid().total());
    }
}

#[test]
fn negative_delta_is_rejected_without_state_change() {
    let mut e = engine(&[RED, GREEN]);
    e.advance(10).unwrap();
    e.go_next();
    e.advance(100).unwrap();
    let before_colors = e.colors().clone();
    let before_transition = e.active_transition().cloned();

    let err = e.advance(-1).unwrap_err();
    assert!(matches!(err, LxError::InvalidInput(_)));
    assert_eq!(e.colors(), &before_colors);
    assert_eq!(e.active_transition().cloned(), before_transition);
    assert_eq!(e.active_elapsed_ms(), 110);
}

#[test]
fn without_transition_output_is_active_pattern() {
    let mut e = engine(&[RED, GREEN]);
    assert!(e.colors().iter().all(|c| *c == Color::BLACK));
    let out = e.advance(16).unwrap();
    assert!(out.iter().all(|c| *c == RED));
    assert_eq!(e.active_index(), 0);
    assert!(e.next_pattern().is_none());
}

#[test]
fn crossfade_runs_to_completion_and_swaps_active() {
    let mut e = engine(&[RED, BLUE]);
    e.set_default_transition(Transition::crossfade(100));
    e.advance(0).unwrap();

    e.go_next();
    assert_eq!(e.active_transition().map(|t| t.target()), Some(1));

    let out = e.advance(50).unwrap().clone();
    assert!(out[0].r() > 0 && out[0].b() > 0);
    assert_eq!(e.active_index(), 0);

    let out = e.advance(50).unwrap();
    assert!(out.iter().all(|c| *c == BLUE));
    assert_eq!(e.active_index(), 1);
    assert!(e.active_transition().is_none());
    assert_eq!(e.active_elapsed_ms(), 0);
}

#[test]
fn transition_completes_on_tick_reaching_duration() {
    let mut e = engine(&[RED, GREEN]);
    e.set_default_transition(Transition::crossfade(1000));
    e.go_next();
    for _ in 0..9 {
        e.advance(100).unwrap();
    }
    assert_eq!(e.active_index(), 0);
    assert_eq!(e.active_transition().map(|t| t.elapsed_ms()), Some(900));

    let out = e.advance(100).unwrap();
    assert!(out.iter().all(|c| *c == GREEN));
    assert_eq!(e.active_index(), 1);
    assert!(e.active_transition().is_none());
}

#[test]
fn zero_duration_transition_completes_on_next_tick() {
    let mut e = engine(&[RED, GREEN]);
    e.set_default_transition(Transition::crossfade(0));
    e.advance(10).unwrap();
    e.go_index(1).unwrap();
    let out = e.advance(0).unwrap();
    assert!(out.iter().all(|c| *c == GREEN));
    assert_eq!(e.active_index(), 1);
}

#[test]
fn pattern_transition_overrides_default() {
    let patterns: Vec<Box<dyn Pattern>> = vec![
        Box::new(SolidPattern::new(RED)),
        Box::new(SolidPattern::new(GREEN).with_transition(Transition::add(200))),
    ];
    let mut e = Engine::new(grid(), patterns).unwrap();
    e.go_next();
    let t = e.active_transition().unwrap().transition();
    assert_eq!(t.kind, TransitionKind::Add);
    assert_eq!(t.duration_ms, 200);

    e.go_next();
    let t = e.active_transition().unwrap().transition();
    assert_eq!(t, Transition::default());
}

#[test]
fn auto_transition_starts_once_threshold_is_reached() {
    let mut e = engine(&[RED, GREEN, BLUE]);
    e.enable_auto_transition(100);
    assert!(e.is_auto_transition_enabled());

    e.advance(99).unwrap();
    assert!(e.active_transition().is_none());

    let out = e.advance(1).unwrap();
    assert!(out.iter().all(|c| *c == RED));
    let t = e.active_transition().unwrap();
    assert_eq!(t.target(), 1);
    assert_eq!(t.progress(), 0.0);

    e.disable_auto_transition();
    assert!(!e.is_auto_transition_enabled());
}

#[test]
fn auto_transition_fires_within_one_large_tick_and_wraps() {
    let mut e = engine(&[RED, GREEN]);
    e.set_default_transition(Transition::crossfade(10));
    e.enable_auto_transition(50);
    e.go_index(1).unwrap();
    e.advance(10).unwrap();
    assert_eq!(e.active_index(), 1);

    e.advance(500).unwrap();
    assert_eq!(e.active_transition().map(|t| t.target()), Some(0));
}

#[test]
fn single_pattern_auto_transition_never_starts() {
    let mut e = engine(&[RED]);
    e.enable_auto_transition(100);
    e.advance(500).unwrap();
    let out = e.advance(500).unwrap();
    assert!(out.iter().all(|c| *c == RED));
    assert!(e.active_transition().is_none());
    assert_eq!(e.active_index(), 0);
}

#[test]
fn auto_transition_waits_for_running_transition() {
    let mut e = engine(&[RED, GREEN, BLUE]);
    e.set_default_transition(Transition::crossfade(1000));
    e.enable_auto_transition(10);
    e.go_index(2).unwrap();
    e.advance(500).unwrap();
    assert_eq!(e.active_transition().map(|t| t.target()), Some(2));
}

#[test]
fn navigation_wraps_and_validates_index() {
    let mut e = engine(&[RED, GREEN, BLUE]);
    e.go_prev();
    assert_eq!(e.active_transition().map(|t| t.target()), Some(2));
    e.go_next();
    assert_eq!(e.active_transition().map(|t| t.target()), Some(0));

    let err = e.go_index(3).unwrap_err();
    assert!(matches!(err, LxError::InvalidInput(_)));
    assert_eq!(e.active_transition().map(|t| t.target()), Some(0));
}

#[test]
fn going_to_active_pattern_without_transition_is_noop() {
    let mut e = engine(&[RED, GREEN]);
    e.go_index(0).unwrap();
    assert!(e.active_transition().is_none());
}

#[test]
fn interrupting_transition_starts_from_current_output() {
    let mut e = engine(&[RED, GREEN, BLUE]);
    e.set_default_transition(Transition::crossfade(100));
    e.advance(0).unwrap();
    e.go_index(1).unwrap();
    let mid = e.advance(50).unwrap().clone();

    e.go_index(2).unwrap();
    let t = e.active_transition().unwrap();
    assert!(t.is_from_snapshot());
    assert_eq!(t.progress(), 0.0);

    // First frame of the new transition matches the last composed frame.
    let out = e.advance(0).unwrap();
    assert_eq!(out, &mid);

    e.advance(100).unwrap();
    assert_eq!(e.active_index(), 2);
    assert!(e.colors().iter().all(|c| *c == BLUE));
}

#[test]
fn pattern_elapsed_resets_on_activation() {
    let (recorder, log) = Recorder::new(GREEN);
    let patterns: Vec<Box<dyn Pattern>> = vec![Box::new(SolidPattern::new(RED)), Box::new(recorder)];
    let mut e = Engine::new(grid(), patterns).unwrap();
    e.set_default_transition(Transition::crossfade(20));

    e.advance(500).unwrap();
    e.go_next();
    e.advance(10).unwrap();
    e.advance(10).unwrap();
    e.advance(10).unwrap();

    assert_eq!(log.borrow().elapsed, vec![10, 20, 10]);
    assert_eq!(log.borrow().events, vec!["active"]);

    e.go_prev();
    e.advance(20).unwrap();
    assert_eq!(log.borrow().events, vec!["active", "inactive"]);
}

#[test]
fn pattern_modulators_only_advance_while_live() {
    let (recorder, _log) = Recorder::new(GREEN);
    let patterns: Vec<Box<dyn Pattern>> = vec![Box::new(SolidPattern::new(RED)), Box::new(recorder)];
    let mut e = Engine::new(grid(), patterns).unwrap();
    e.set_default_transition(Transition::crossfade(0));

    e.advance(300).unwrap();
    e.go_next();
    e.advance(100).unwrap();
    e.advance(100).unwrap();

    // Envelope only saw the two ticks after it went live.
    let bank = e.slots[1].pattern.modulators().unwrap();
    let value = bank.iter().next().map(|(_, m)| m.value()).unwrap();
    assert!((value - 200.0).abs() < 1e-9);
}

#[test]
fn effects_apply_in_chain_order_and_only_when_enabled() {
    let mut e = engine(&[RED]);
    let flash = e.add_effect(Box::new(FlashEffect::new(100.0)));
    assert!(e.advance(10).unwrap().iter().all(|c| *c == RED));

    assert!(e.trigger_effect(flash));
    assert!(e.advance(0).unwrap().iter().all(|c| *c == Color::WHITE));

    assert!(e.set_effect_enabled(flash, false));
    assert!(e.advance(0).unwrap().iter().all(|c| *c == RED));

    assert!(e.remove_effect(flash).is_some());
    assert!(e.effects().is_empty());
}

#[test]
fn flash_restores_pass_through_after_decay() {
    let mut e = engine(&[RED]);
    let flash = e.add_effect(Box::new(FlashEffect::new(100.0)));
    e.trigger_effect(flash);
    e.advance(50).unwrap();
    assert_ne!(e.colors()[0], RED);
    e.advance(60).unwrap();
    assert_eq!(e.colors()[0], RED);
}

#[test]
fn base_hue_slot_is_replaced_atomically() {
    let mut e = engine(&[RED]);
    assert_eq!(e.base_hue(), 0.0);

    let first = e.cycle_base_hue(3600.0);
    e.advance(900).unwrap();
    assert!((e.base_hue() - 90.0).abs() < 1e-9);

    let second = e.set_base_hue(200.0);
    assert!(e.modulator(first).is_none());
    assert_eq!(e.modulators().len(), 1);
    e.advance(25).unwrap();
    assert!((e.base_hue() - 145.0).abs() < 1e-9);
    e.advance(100).unwrap();
    assert!((e.base_hue() - 200.0).abs() < 1e-9);

    e.cycle_base_hue(3600.0);
    assert!(e.modulator(second).is_none());
    assert!((e.base_hue() - 200.0).abs() < 1e-9);
}

#[test]
fn removing_base_hue_modulator_clears_slot() {
    let mut e = engine(&[RED]);
    let id = e.set_base_hue(120.0);
    e.advance(100).unwrap();
    assert!(e.remove_modulator(id).is_some());
    assert_eq!(e.base_hue(), 0.0);
}

#[test]
fn global_modulators_advance_every_tick() {
    let mut e = engine(&[RED]);
    let id = e.add_modulator(Modulator::saw(0.0, 10.0, 100.0).started());
    e.advance(30).unwrap();
    assert!((e.modulator(id).unwrap().value() - 3.0).abs() < 1e-9);
    e.modulator_mut(id).unwrap().stop();
    e.advance(30).unwrap();
    assert!((e.modulator(id).unwrap().value() - 3.0).abs() < 1e-9);
}

#[test]
fn set_patterns_resets_playlist() {
    let mut e = engine(&[RED, GREEN]);
    e.go_next();
    e.advance(10).unwrap();
    e.set_patterns(solids(&[BLUE])).unwrap();
    assert_eq!(e.len(), 1);
    assert_eq!(e.active_index(), 0);
    assert!(e.active_transition().is_none());
    assert!(e.advance(0).unwrap().iter().all(|c| *c == BLUE));
    assert_eq!(e.active_pattern().name(), "solid");
    assert_eq!(e.patterns().count(), 1);
}
