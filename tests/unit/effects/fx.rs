use super::*;

fn grid() -> Grid {
    Grid::new(2, 1).unwrap()
}

#[test]
fn desaturation_removes_saturation_but_keeps_brightness() {
    let mut colors = ColorBuffer::from_colors(vec![Color::rgb(200, 40, 0), Color::rgb(0, 0, 90)]);
    DesaturationEffect::default().apply(grid(), &mut colors);
    assert_eq!(colors[0], Color::rgb(200, 200, 200));
    assert_eq!(colors[1], Color::rgb(90, 90, 90));
    assert_eq!(colors[0].saturation(), 0.0);
}

#[test]
fn desaturation_is_idempotent() {
    let mut once = ColorBuffer::from_colors(vec![Color::rgb(10, 120, 250), Color::rgb(9, 8, 7)]);
    let mut fx = DesaturationEffect::new(0.5);
    fx.apply(grid(), &mut once);
    let mut twice = once.clone();
    DesaturationEffect::new(1.0).apply(grid(), &mut twice);
    let mut again = twice.clone();
    DesaturationEffect::new(1.0).apply(grid(), &mut again);
    assert_eq!(twice, again);
}

#[test]
fn flash_is_pass_through_until_triggered() {
    let mut fx = FlashEffect::new(100.0);
    let mut colors = ColorBuffer::filled(2, Color::rgb(10, 20, 30));
    fx.run(50);
    fx.apply(grid(), &mut colors);
    assert_eq!(colors[0], Color::rgb(10, 20, 30));
}

#[test]
fn flash_decays_and_restores_pass_through() {
    let mut fx = FlashEffect::new(100.0);
    fx.trigger();
    assert_eq!(fx.intensity(), 1.0);

    let mut colors = ColorBuffer::filled(2, Color::BLACK);
    fx.apply(grid(), &mut colors);
    assert_eq!(colors[0], Color::WHITE);

    fx.run(50);
    assert!((fx.intensity() - 0.5).abs() < 1e-9);

    fx.run(60);
    assert_eq!(fx.intensity(), 0.0);
    let mut colors = ColorBuffer::filled(2, Color::rgb(1, 2, 3));
    fx.apply(grid(), &mut colors);
    assert_eq!(colors[1], Color::rgb(1, 2, 3));
}

#[derive(Default)]
struct Tag(u8);

impl Effect for Tag {
    fn name(&self) -> &str {
        "tag"
    }

    fn apply(&mut self, _grid: Grid, colors: &mut ColorBuffer) {
        for c in colors.as_mut_slice() {
            *c = Color::rgb(c.r(), c.g(), c.b().wrapping_mul(2).wrapping_add(self.0));
        }
    }
}

#[test]
fn chain_applies_enabled_effects_left_to_right() {
    let mut chain = EffectChain::new();
    let one = chain.add(Box::new(Tag(1)));
    let two = chain.add(Box::new(Tag(2)));

    let mut colors = ColorBuffer::filled(2, Color::BLACK);
    chain.apply(grid(), &mut colors);
    // (0 * 2 + 1) * 2 + 2
    assert_eq!(colors[0].b(), 4);

    assert!(chain.set_enabled(one, false));
    let mut colors = ColorBuffer::filled(2, Color::BLACK);
    chain.apply(grid(), &mut colors);
    assert_eq!(colors[0].b(), 2);

    assert!(chain.remove(two).is_some());
    assert!(!chain.set_enabled(two, true));
    assert!(!chain.trigger(two));
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.is_enabled(one), Some(false));
}

#[test]
fn chain_runs_timers_of_disabled_effects() {
    let mut chain = EffectChain::new();
    let flash = chain.add(Box::new(FlashEffect::new(100.0)));
    assert!(chain.trigger(flash));
    chain.set_enabled(flash, false);
    chain.run(200);
    chain.set_enabled(flash, true);

    let mut colors = ColorBuffer::filled(2, Color::rgb(5, 5, 5));
    chain.apply(grid(), &mut colors);
    assert_eq!(colors[0], Color::rgb(5, 5, 5));
}
