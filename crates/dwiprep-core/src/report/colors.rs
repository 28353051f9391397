//! Colormaps for the carpet and side bar, and the confound palette.

use plotters::style::{Color, HSLColor, RGBColor};

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const PLASMA: [(u8, u8, u8); 9] = [
    (13, 8, 135),
    (84, 2, 163),
    (139, 10, 165),
    (185, 50, 137),
    (219, 92, 104),
    (244, 136, 73),
    (254, 188, 43),
    (240, 249, 33),
    (240, 249, 33),
];

/// Color used for missing (NaN) cells.
pub const MISSING: RGBColor = RGBColor(235, 235, 235);
pub const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);
pub const DIM_GRAY: RGBColor = RGBColor(105, 105, 105);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);

fn sample(stops: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (stops.len() - 1) as f64;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let frac = pos - i as f64;
    let (a, b) = (stops[i], stops[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

pub fn viridis(t: f64) -> RGBColor {
    sample(&VIRIDIS, t)
}

pub fn plasma(t: f64) -> RGBColor {
    sample(&PLASMA, t)
}

/// Map `value` from `[lo, hi]` onto `[0, 1]`; a flat range maps to 0.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Finite min/max of `values`, `(0, 0)` when nothing is finite.
pub fn finite_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    let mut range: Option<(f64, f64)> = None;
    for &v in values {
        if v.is_finite() {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    range.unwrap_or((0.0, 0.0))
}

/// `n` evenly spaced hues, one per confound band.
pub fn palette(n: usize) -> Vec<RGBColor> {
    (0..n)
        .map(|i| {
            let hue = (0.01 + i as f64 / n as f64).fract();
            let (r, g, b) = HSLColor(hue, 0.9, 0.45).rgb();
            RGBColor(r, g, b)
        })
        .collect()
}
