use std::str::FromStr;

use kurbo::{BezPath, Circle, Shape as _};

use crate::{
    error::{RemixelError, RemixelResult},
    overlay::{OverlayGeometry, SizeF},
    surface::RasterSurface,
};

/// Tessellation pattern for the halftone overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Hexagons,
    Circles,
    Crosses,
    Squares,
    Diamonds,
    Triangles,
    Lines,
    Waves,
    Dots,
    Stars,
    Rings,
    Checks,
}

impl ShapeType {
    pub const ALL: [ShapeType; 12] = [
        ShapeType::Hexagons,
        ShapeType::Circles,
        ShapeType::Crosses,
        ShapeType::Squares,
        ShapeType::Diamonds,
        ShapeType::Triangles,
        ShapeType::Lines,
        ShapeType::Waves,
        ShapeType::Dots,
        ShapeType::Stars,
        ShapeType::Rings,
        ShapeType::Checks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Hexagons => "hexagons",
            ShapeType::Circles => "circles",
            ShapeType::Crosses => "crosses",
            ShapeType::Squares => "squares",
            ShapeType::Diamonds => "diamonds",
            ShapeType::Triangles => "triangles",
            ShapeType::Lines => "lines",
            ShapeType::Waves => "waves",
            ShapeType::Dots => "dots",
            ShapeType::Stars => "stars",
            ShapeType::Rings => "rings",
            ShapeType::Checks => "checks",
        }
    }
}

impl Default for ShapeType {
    fn default() -> Self {
        ShapeType::Hexagons
    }
}

impl FromStr for ShapeType {
    type Err = RemixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RemixelError::validation(format!("unknown shape type '{s}'")))
    }
}

/// Shape spacing range the UI exposes; values outside are accepted but look odd.
pub const DISTANCE_MIN: f64 = 5.0;
pub const DISTANCE_MAX: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HalftoneParams {
    pub shape: ShapeType,
    /// Hex RGB fill, e.g. `#00FF00`.
    pub fill: String,
    /// Cell spacing in overlay units.
    pub distance: f64,
    pub width: f64,
    pub height: f64,
}

impl HalftoneParams {
    pub fn validate(&self) -> RemixelResult<()> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(RemixelError::validation(
                "halftone canvas must have finite positive width/height",
            ));
        }
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(RemixelError::validation(
                "halftone distance must be finite and > 0",
            ));
        }
        if self.fill.is_empty() {
            return Err(RemixelError::validation("halftone fill must be non-empty"));
        }
        Ok(())
    }
}

/// Generate the tessellated overlay for `params`.
///
/// When a foreground raster is given, each cell's size follows the inverse
/// luminance sampled under the cell center, so dark regions read as heavy
/// coverage in the print tradition. Without one every cell renders at full
/// size.
pub fn generate(
    params: &HalftoneParams,
    foreground: Option<&RasterSurface>,
) -> RemixelResult<OverlayGeometry> {
    params.validate()?;

    let d = params.distance;
    let mut path = BezPath::new();

    let cols = (params.width / d).ceil() as u32 + 1;
    let rows = (params.height / d).ceil() as u32 + 1;

    match params.shape {
        // Row-spanning patterns: one element per row, sized from the
        // coverage at the row's midpoint.
        ShapeType::Lines | ShapeType::Waves => {
            for row in 0..rows {
                let cy = f64::from(row) * d;
                let coverage = cell_coverage(params, foreground, params.width * 0.5, cy);
                let r = d * 0.5 * coverage;
                if r <= f64::EPSILON {
                    continue;
                }
                if params.shape == ShapeType::Lines {
                    rect(&mut path, 0.0, cy - r * 0.3, params.width, r * 0.6);
                } else {
                    wave_row(&mut path, cy, r, d, params.width);
                }
            }
        }
        _ => {
            for row in 0..rows {
                let cy = f64::from(row) * d;
                let stagger = matches!(
                    params.shape,
                    ShapeType::Hexagons | ShapeType::Circles | ShapeType::Dots | ShapeType::Rings
                );
                let x_off = if stagger && row % 2 == 1 { d * 0.5 } else { 0.0 };

                for col in 0..cols {
                    let cx = f64::from(col) * d + x_off;
                    let coverage = cell_coverage(params, foreground, cx, cy);
                    let r = d * 0.5 * coverage;
                    if r <= f64::EPSILON {
                        continue;
                    }
                    emit_cell(&mut path, params.shape, cx, cy, r, d, row, col);
                }
            }
        }
    }

    Ok(OverlayGeometry {
        content_width: params.width,
        content_height: params.height,
        visible: SizeF::new(params.width, params.height),
        renderer: SizeF::new(params.width, params.height),
        path,
        fill: params.fill.clone(),
        live_input: false,
    })
}

fn cell_coverage(
    params: &HalftoneParams,
    foreground: Option<&RasterSurface>,
    cx: f64,
    cy: f64,
) -> f64 {
    let Some(fg) = foreground else {
        return 1.0;
    };

    let u = (cx / params.width).clamp(0.0, 1.0);
    let v = (cy / params.height).clamp(0.0, 1.0);
    let x = ((u * f64::from(fg.width() - 1)).round() as u32).min(fg.width() - 1);
    let y = ((v * f64::from(fg.height() - 1)).round() as u32).min(fg.height() - 1);

    let px = fg.pixel(x, y);
    let a = f64::from(px[3]) / 255.0;
    // Composite over white before taking luma so transparent regions read as
    // light (small cells), matching the on-screen preview.
    let over_white = |c: u8| f64::from(c) + (1.0 - a) * 255.0;
    let luma =
        (0.2126 * over_white(px[0]) + 0.7152 * over_white(px[1]) + 0.0722 * over_white(px[2]))
            / 255.0;
    (1.0 - luma).clamp(0.08, 1.0)
}

fn emit_cell(
    path: &mut BezPath,
    shape: ShapeType,
    cx: f64,
    cy: f64,
    r: f64,
    d: f64,
    row: u32,
    col: u32,
) {
    match shape {
        ShapeType::Hexagons => polygon(path, cx, cy, r, 6, -std::f64::consts::FRAC_PI_2),
        ShapeType::Circles => circle(path, cx, cy, r * 0.95),
        ShapeType::Dots => circle(path, cx, cy, r * 0.45),
        ShapeType::Rings => {
            circle(path, cx, cy, r * 0.9);
            // Inner subpath hollows the ring under the even-odd fill rule.
            circle(path, cx, cy, r * 0.55);
        }
        ShapeType::Squares => rect(path, cx - r * 0.85, cy - r * 0.85, r * 1.7, r * 1.7),
        ShapeType::Diamonds => polygon(path, cx, cy, r, 4, 0.0),
        ShapeType::Triangles => polygon(path, cx, cy, r, 3, -std::f64::consts::FRAC_PI_2),
        ShapeType::Stars => star(path, cx, cy, r),
        ShapeType::Crosses => cross(path, cx, cy, r),
        ShapeType::Checks => {
            if (row + col) % 2 == 0 {
                rect(path, cx - d * 0.5, cy - d * 0.5, d, d);
            }
        }
        // Row-spanning patterns are emitted by the caller.
        ShapeType::Lines | ShapeType::Waves => {}
    }
}

fn circle(path: &mut BezPath, cx: f64, cy: f64, r: f64) {
    let c = Circle::new((cx, cy), r);
    for el in c.to_path(0.1).elements() {
        path.push(*el);
    }
}

fn polygon(path: &mut BezPath, cx: f64, cy: f64, r: f64, sides: u32, phase: f64) {
    let step = std::f64::consts::TAU / f64::from(sides);
    for i in 0..sides {
        let a = phase + f64::from(i) * step;
        let p = (cx + r * a.cos(), cy + r * a.sin());
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
}

fn star(path: &mut BezPath, cx: f64, cy: f64, r: f64) {
    let inner = r * 0.45;
    for i in 0..10 {
        let a = -std::f64::consts::FRAC_PI_2 + f64::from(i) * std::f64::consts::TAU / 10.0;
        let rad = if i % 2 == 0 { r } else { inner };
        let p = (cx + rad * a.cos(), cy + rad * a.sin());
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
}

fn cross(path: &mut BezPath, cx: f64, cy: f64, r: f64) {
    let arm = r * 0.35;
    path.move_to((cx - arm, cy - r));
    path.line_to((cx + arm, cy - r));
    path.line_to((cx + arm, cy - arm));
    path.line_to((cx + r, cy - arm));
    path.line_to((cx + r, cy + arm));
    path.line_to((cx + arm, cy + arm));
    path.line_to((cx + arm, cy + r));
    path.line_to((cx - arm, cy + r));
    path.line_to((cx - arm, cy + arm));
    path.line_to((cx - r, cy + arm));
    path.line_to((cx - r, cy - arm));
    path.line_to((cx - arm, cy - arm));
    path.close_path();
}

fn rect(path: &mut BezPath, x: f64, y: f64, w: f64, h: f64) {
    path.move_to((x, y));
    path.line_to((x + w, y));
    path.line_to((x + w, y + h));
    path.line_to((x, y + h));
    path.close_path();
}

fn wave_row(path: &mut BezPath, cy: f64, r: f64, d: f64, span: f64) {
    // Thin ribbon built from a sampled sine: top edge left-to-right, bottom
    // edge back, closed.
    let thickness = (r * 0.5).max(0.5);
    let steps = (span / (d * 0.5)).ceil().max(1.0) as u32;
    let sample = |i: u32| {
        let x = (f64::from(i) * d * 0.5).min(span);
        let y = cy + (x / d * std::f64::consts::PI).sin() * r * 0.4;
        (x, y)
    };

    let (x0, y0) = sample(0);
    path.move_to((x0, y0 - thickness * 0.5));
    for i in 1..=steps {
        let (x, y) = sample(i);
        path.line_to((x, y - thickness * 0.5));
    }
    for i in (0..=steps).rev() {
        let (x, y) = sample(i);
        path.line_to((x, y + thickness * 0.5));
    }
    path.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as _;

    fn params(shape: ShapeType) -> HalftoneParams {
        HalftoneParams {
            shape,
            fill: "#00FF00".to_string(),
            distance: 10.0,
            width: 64.0,
            height: 48.0,
        }
    }

    #[test]
    fn every_shape_generates_nonempty_geometry() {
        for shape in ShapeType::ALL {
            let overlay = generate(&params(shape), None).unwrap();
            assert!(
                !overlay.path.elements().is_empty(),
                "empty path for {shape:?}"
            );
            assert_eq!(overlay.content_width, 64.0);
            assert_eq!(overlay.content_height, 48.0);
        }
    }

    #[test]
    fn generated_documents_parse_as_svg() {
        for shape in ShapeType::ALL {
            let overlay = generate(&params(shape), None).unwrap();
            let svg = overlay.to_svg_document();
            usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default())
                .unwrap_or_else(|e| panic!("{shape:?} svg failed to parse: {e}"));
        }
    }

    #[test]
    fn dark_foreground_grows_cells() {
        let mut dark = RasterSurface::new(8, 8).unwrap();
        dark.fill([0, 0, 0, 255]);
        let mut light = RasterSurface::new(8, 8).unwrap();
        light.fill([255, 255, 255, 255]);

        let p = params(ShapeType::Squares);
        let heavy = generate(&p, Some(&dark)).unwrap();
        let sparse = generate(&p, Some(&light)).unwrap();
        // Same cell count either way, but inverse luminance shrinks the light
        // variant's cells; coverage floors at a visible minimum.
        assert!(heavy.path.area().abs() > sparse.path.area().abs() * 4.0);
        assert!(sparse.path.area().abs() > 0.0);
    }

    #[test]
    fn validate_rejects_bad_params() {
        let mut p = params(ShapeType::Hexagons);
        p.distance = 0.0;
        assert!(generate(&p, None).is_err());

        let mut p = params(ShapeType::Hexagons);
        p.width = -1.0;
        assert!(generate(&p, None).is_err());

        let mut p = params(ShapeType::Hexagons);
        p.fill.clear();
        assert!(generate(&p, None).is_err());
    }

    #[test]
    fn shape_names_roundtrip() {
        for shape in ShapeType::ALL {
            assert_eq!(shape.as_str().parse::<ShapeType>().unwrap(), shape);
        }
        assert!("blobs".parse::<ShapeType>().is_err());
        assert_eq!(ShapeType::default(), ShapeType::Hexagons);
    }

    #[test]
    fn distance_range_is_the_documented_ui_span() {
        assert_eq!(DISTANCE_MIN, 5.0);
        assert_eq!(DISTANCE_MAX, 20.0);
    }
}
