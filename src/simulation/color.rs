//! Cell colors and creation jitter
//!
//! Colors are kept as floating point RGBA in the 0-255 range so repeated
//! lerps (combustion tinting) converge smoothly instead of stalling on u8
//! rounding. They are packed to `[u8; 4]` only when handed to a renderer.

use glam::Vec4;

use crate::world::WorldRng;

/// RGBA color, each channel in 0.0..=255.0
pub type Color = Vec4;

pub const fn rgb(r: f32, g: f32, b: f32) -> Color {
    Vec4::new(r, g, b, 255.0)
}

/// Pack a color for the render adapter
pub fn to_rgba8(color: Color) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::splat(255.0)).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// Move `from` toward `to` by `t` (0 = unchanged, 1 = target)
pub fn lerp(from: Color, to: Color, t: f32) -> Color {
    from.lerp(to, t.clamp(0.0, 1.0))
}

/// Creation jitter: floor the hue, then darken and desaturate by up to ten
/// percentage points each.
pub fn jitter<R: WorldRng>(color: Color, rng: &mut R) -> Color {
    let (h, s, l) = rgb_to_hsl(color.x / 255.0, color.y / 255.0, color.z / 255.0);

    let l = (l + rng.gen_range(-0.10, 0.0)).clamp(0.0, 1.0);
    let s = (s + rng.gen_range(-0.10, 0.0)).clamp(0.0, 1.0);

    let (r, g, b) = hsl_to_rgb(h.floor(), s, l);
    Vec4::new(r * 255.0, g * 255.0, b * 255.0, color.w)
}

/// RGB (0..1) to HSL with hue in degrees
fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;

    if delta <= f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h * 60.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s <= f32::EPSILON {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
