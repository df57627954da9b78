use super::*;

fn ctx(grid: Grid, base_hue: f64) -> FrameCtx {
    FrameCtx {
        grid,
        elapsed_ms: 0,
        delta_ms: 0,
        base_hue,
    }
}

#[test]
fn solid_fills_every_cell() {
    let grid = Grid::new(3, 2).unwrap();
    let mut colors = ColorBuffer::new(grid.total());
    SolidPattern::new(Color::rgb(1, 2, 3)).run(&ctx(grid, 0.0), &mut colors);
    assert!(colors.iter().all(|c| *c == Color::rgb(1, 2, 3)));
}

#[test]
fn iterator_lights_exactly_one_cell() {
    let grid = Grid::new(4, 1).unwrap();
    let mut pattern = IteratorPattern::new(grid);
    let mut colors = ColorBuffer::new(grid.total());

    for step in 0..4 {
        pattern.run(&ctx(grid, 0.0), &mut colors);
        let lit: Vec<usize> = colors
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Color::WHITE)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(lit, vec![step]);
        if let Some(mods) = pattern.modulators() {
            mods.run(100);
        }
    }

    // Wraps back to the first cell after a full sweep.
    assert_eq!(pattern.active_cell(), 0);
}

#[test]
fn hue_gradient_follows_base_hue() {
    let grid = Grid::new(2, 1).unwrap();
    let mut colors = ColorBuffer::new(grid.total());
    let mut pattern = HueGradientPattern::new(120.0);
    pattern.run(&ctx(grid, 0.0), &mut colors);
    assert_eq!(colors[0], Color::rgb(255, 0, 0));
    assert_eq!(colors[1], Color::rgb(0, 255, 0));

    pattern.run(&ctx(grid, 240.0), &mut colors);
    assert_eq!(colors[0], Color::rgb(0, 0, 255));
    assert_eq!(colors[1], Color::rgb(255, 0, 0));
}
