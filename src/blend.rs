use std::str::FromStr;

use crate::error::{RemixelError, RemixelResult};

pub type PremulRgba8 = [u8; 4];

/// Pixel-compositing operator for the overlay layer.
///
/// The twelve separable modes and the two non-separable modes (`Hue`,
/// `Saturation`) follow the standard CSS/PDF blend formulas: the source color
/// is mixed with `B(Cb, Cs)` by backdrop alpha, then composited source-over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
}

impl BlendMode {
    pub const ALL: [BlendMode; 14] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
    ];

    /// CSS name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
        }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Normal
    }
}

impl FromStr for BlendMode {
    type Err = RemixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RemixelError::validation(format!("unknown blend mode '{s}'")))
    }
}

/// Blend one premultiplied source pixel over a premultiplied backdrop pixel.
pub fn blend_pixel(dst: PremulRgba8, src: PremulRgba8, mode: BlendMode) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }

    let ab = f32::from(dst[3]) / 255.0;
    let sa = f32::from(src[3]) / 255.0;
    let cb = unpremul(dst);
    let cs = unpremul(src);

    let mixed = match mode {
        BlendMode::Normal => cs,
        BlendMode::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        BlendMode::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        _ => {
            let f = separable_fn(mode);
            [f(cb[0], cs[0]), f(cb[1], cs[1]), f(cb[2], cs[2])]
        }
    };

    let ao = sa + ab * (1.0 - sa);
    let mut out = [0u8; 4];
    for i in 0..3 {
        // Premultiplied result of mixing Cs toward B(Cb, Cs) by backdrop
        // alpha, composited source-over.
        let co = sa * (1.0 - ab) * cs[i] + sa * ab * mixed[i] + (1.0 - sa) * ab * cb[i];
        out[i] = to_u8(co);
    }
    out[3] = to_u8(ao);
    out
}

/// Blend `src` over `dst` in place. Both buffers are premultiplied RGBA8 of
/// equal length.
pub fn blend_in_place(dst: &mut [u8], src: &[u8], mode: BlendMode) -> RemixelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(RemixelError::composite(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = blend_pixel([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], mode);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn unpremul(px: PremulRgba8) -> [f32; 3] {
    let a = f32::from(px[3]);
    if a == 0.0 {
        return [0.0; 3];
    }
    [
        f32::from(px[0]) / a,
        f32::from(px[1]) / a,
        f32::from(px[2]) / a,
    ]
}

fn to_u8(v: f32) -> u8 {
    ((v * 255.0).round() as i32).clamp(0, 255) as u8
}

fn separable_fn(mode: BlendMode) -> fn(f32, f32) -> f32 {
    match mode {
        BlendMode::Multiply => |cb, cs| cb * cs,
        BlendMode::Screen => screen,
        BlendMode::Overlay => |cb, cs| hard_light(cs, cb),
        BlendMode::Darken => |cb, cs| cb.min(cs),
        BlendMode::Lighten => |cb, cs| cb.max(cs),
        BlendMode::ColorDodge => color_dodge,
        BlendMode::ColorBurn => color_burn,
        BlendMode::HardLight => hard_light,
        BlendMode::SoftLight => soft_light,
        BlendMode::Difference => |cb, cs| (cb - cs).abs(),
        BlendMode::Exclusion => |cb, cs| cb + cs - 2.0 * cb * cs,
        // Normal, Hue and Saturation are handled before dispatch.
        _ => |_, cs| cs,
    }
}

fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * (2.0 * cs)
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

fn color_dodge(cb: f32, cs: f32) -> f32 {
    if cb == 0.0 {
        0.0
    } else if cs >= 1.0 {
        1.0
    } else {
        (cb / (1.0 - cs)).min(1.0)
    }
}

fn color_burn(cb: f32, cs: f32) -> f32 {
    if cb >= 1.0 {
        1.0
    } else if cs == 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - cb) / cs).min(1.0)
    }
}

fn soft_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn clip_color(mut c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    if n < 0.0 && l - n != 0.0 {
        for ch in &mut c {
            *ch = l + (*ch - l) * l / (l - n);
        }
    }
    if x > 1.0 && x - l != 0.0 {
        for ch in &mut c {
            *ch = l + (*ch - l) * (1.0 - l) / (x - l);
        }
    }
    c
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    // Order the channel indices so min/mid/max can be rewritten in place.
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].partial_cmp(&c[b]).unwrap_or(std::cmp::Ordering::Equal));
    let [lo, mid, hi] = idx;

    let mut out = [0.0f32; 3];
    if c[hi] > c[lo] {
        out[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        out[hi] = s;
    }
    out[lo] = 0.0;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: PremulRgba8 = [255, 255, 255, 255];
    const BLACK: PremulRgba8 = [0, 0, 0, 255];
    const RED: PremulRgba8 = [255, 0, 0, 255];

    #[test]
    fn src_alpha_0_is_noop_for_all_modes() {
        let dst = [10, 20, 30, 40];
        for mode in BlendMode::ALL {
            assert_eq!(blend_pixel(dst, [255, 255, 255, 0], mode), dst);
        }
    }

    #[test]
    fn normal_opaque_src_replaces_dst() {
        assert_eq!(blend_pixel(BLACK, RED, BlendMode::Normal), RED);
    }

    #[test]
    fn normal_over_transparent_dst_is_src() {
        let src = [100, 110, 120, 200];
        assert_eq!(blend_pixel([0, 0, 0, 0], src, BlendMode::Normal), src);
    }

    #[test]
    fn multiply_by_white_keeps_backdrop() {
        assert_eq!(blend_pixel(RED, WHITE, BlendMode::Multiply), RED);
    }

    #[test]
    fn multiply_by_black_is_black() {
        assert_eq!(blend_pixel(RED, BLACK, BlendMode::Multiply), BLACK);
    }

    #[test]
    fn screen_with_white_is_white() {
        assert_eq!(blend_pixel(RED, WHITE, BlendMode::Screen), WHITE);
        assert_eq!(blend_pixel(WHITE, RED, BlendMode::Screen), WHITE);
    }

    #[test]
    fn screen_with_black_keeps_backdrop() {
        assert_eq!(blend_pixel(RED, BLACK, BlendMode::Screen), RED);
    }

    #[test]
    fn difference_of_equal_colors_is_black() {
        assert_eq!(blend_pixel(RED, RED, BlendMode::Difference), BLACK);
    }

    #[test]
    fn darken_and_lighten_pick_extremes() {
        let grey: PremulRgba8 = [128, 128, 128, 255];
        assert_eq!(blend_pixel(grey, WHITE, BlendMode::Darken), grey);
        assert_eq!(blend_pixel(grey, WHITE, BlendMode::Lighten), WHITE);
        assert_eq!(blend_pixel(grey, BLACK, BlendMode::Darken), BLACK);
        assert_eq!(blend_pixel(grey, BLACK, BlendMode::Lighten), grey);
    }

    #[test]
    fn hue_preserves_backdrop_luminosity() {
        // Hue takes the source hue but the backdrop's luminosity; a pure-red
        // source over a grey backdrop keeps the grey's luma.
        let grey: PremulRgba8 = [100, 100, 100, 255];
        let out = blend_pixel(grey, RED, BlendMode::Hue);
        let l_in = 0.3 * 100.0 + 0.59 * 100.0 + 0.11 * 100.0;
        let l_out =
            0.3 * f32::from(out[0]) + 0.59 * f32::from(out[1]) + 0.11 * f32::from(out[2]);
        assert!((l_in - l_out).abs() < 2.0, "luma drifted: {l_in} vs {l_out}");
    }

    #[test]
    fn saturation_of_grey_source_desaturates() {
        let grey: PremulRgba8 = [128, 128, 128, 255];
        let out = blend_pixel(RED, grey, BlendMode::Saturation);
        // A zero-saturation source forces the result achromatic.
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn blend_in_place_validates_lengths() {
        let mut dst = vec![0u8; 8];
        assert!(blend_in_place(&mut dst, &[0u8; 4], BlendMode::Normal).is_err());
        let mut odd = vec![0u8; 6];
        assert!(blend_in_place(&mut odd, &[0u8; 6], BlendMode::Normal).is_err());
        assert!(blend_in_place(&mut dst, &[0u8; 8], BlendMode::Multiply).is_ok());
    }

    #[test]
    fn css_names_roundtrip() {
        for mode in BlendMode::ALL {
            assert_eq!(mode.as_str().parse::<BlendMode>().unwrap(), mode);
        }
        assert!("plus-lighter".parse::<BlendMode>().is_err());
    }
}
