pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn add_sat_u8(a: u16, b: u16) -> u8 {
    (a + b).min(255) as u8
}

/// Map `t` in `[0, 1]` to an 8-bit weight; 0 and 1 map to 0 and 255 exactly.
pub(crate) fn unit_to_u8_weight(t: f64) -> u16 {
    if !t.is_finite() {
        return 0;
    }
    ((t.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// Weighted mix of two 8-bit channels. `tt == 0` yields `a`, `tt == 255` yields `b`.
pub(crate) fn mix_u8(a: u8, b: u8, tt: u16) -> u8 {
    let it = 255u16 - tt;
    add_sat_u8(
        mul_div255_u16(u16::from(a), it),
        mul_div255_u16(u16::from(b), tt),
    )
}

/// Clamp `v` into `[lo, hi]`, mapping NaN to `lo`.
pub fn constrain(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
