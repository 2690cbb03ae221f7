use crate::error::{RemixelError, RemixelResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SizeF {
    pub width: f64,
    pub height: f64,
}

impl SizeF {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(&self, what: &str) -> RemixelResult<()> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(RemixelError::validation(format!(
                "{what} must have finite positive width/height"
            )));
        }
        Ok(())
    }
}

/// Vector overlay produced by the halftone renderer.
///
/// Three coordinate spaces are in play and must not be conflated: `content`
/// is the overlay's natural layout size, `visible` is the on-screen viewport
/// rectangle actually shown, and `renderer` is the native resolution the
/// vector path is expressed in. Export scale factors are derived from the
/// ratios between them.
#[derive(Clone, Debug)]
pub struct OverlayGeometry {
    pub content_width: f64,
    pub content_height: f64,
    pub visible: SizeF,
    pub renderer: SizeF,
    pub path: kurbo::BezPath,
    /// Hex RGB fill, e.g. `#00FF00`.
    pub fill: String,
    /// True when the overlay is driven by a live camera input.
    pub live_input: bool,
}

impl OverlayGeometry {
    pub fn validate(&self) -> RemixelResult<()> {
        if !(self.content_width.is_finite() && self.content_height.is_finite())
            || self.content_width <= 0.0
            || self.content_height <= 0.0
        {
            return Err(RemixelError::validation(
                "overlay content must have finite positive width/height",
            ));
        }
        self.visible.validate("overlay visible rect")?;
        self.renderer.validate("overlay renderer size")?;
        if self.fill.is_empty() {
            return Err(RemixelError::validation("overlay fill must be non-empty"));
        }
        Ok(())
    }

    /// Emit the overlay as a standalone SVG document at native renderer size.
    ///
    /// Rasterizers scale this document; the path data itself stays in
    /// renderer coordinates. The even-odd fill rule keeps ring-style shapes
    /// (concentric subpaths) hollow.
    pub fn to_svg_document(&self) -> String {
        let w = self.renderer.width;
        let h = self.renderer.height;
        let d = self.path.to_svg();
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><path d="{d}" fill="{fill}" fill-rule="evenodd"/></svg>"#,
            fill = self.fill,
        )
    }
}
