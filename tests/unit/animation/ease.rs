use super::*;

const ALL: [Ease; 8] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::InOutSine,
];

#[test]
fn endpoints_are_exact() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
    }
}

#[test]
fn input_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-1.0), 0.0);
        assert_eq!(ease.apply(2.0), 1.0);
        assert_eq!(ease.apply(f64::NAN), 0.0);
    }
}

#[test]
fn curves_are_monotonic() {
    for ease in ALL {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = ease.apply(f64::from(i) / 100.0);
            assert!(v + 1e-12 >= prev, "{ease:?} at {i}");
            prev = v;
        }
    }
}
