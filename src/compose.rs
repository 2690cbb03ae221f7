use std::{
    io::Cursor,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;

use crate::{
    blend::{self, BlendMode},
    error::{RemixelError, RemixelResult},
    fit,
    overlay::OverlayGeometry,
    surface::RasterSurface,
};

/// Fixed basename of every exported file; not user-customizable.
pub const EXPORT_BASENAME: &str = "halftone";

// Avoid pathological allocations; larger exports need an explicit strategy
// change, not a bigger constant.
const MAX_DIM: u32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Jpg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            ExportFormat::Jpg => image::ImageFormat::Jpeg,
            ExportFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RemixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "png" => Ok(ExportFormat::Png),
            other => Err(RemixelError::validation(format!(
                "unknown export format '{other}' (expected jpg or png)"
            ))),
        }
    }
}

/// Flatten the overlay onto the background into one raster at background
/// resolution.
///
/// The export surface is the overlay's content rectangle scaled by
/// `background.width / overlay.content_width`, so output resolution follows
/// the background and never the overlay's native renderer size. The overlay
/// document is rasterized off-screen at
/// `(visible / renderer) * resolution_scale`, the background is painted first
/// in normal mode with centered cover placement, and the overlay layer is
/// blended on top with `mode`.
#[tracing::instrument(skip(overlay, background), fields(mode = mode.as_str()))]
pub fn composite_to_raster(
    overlay: &OverlayGeometry,
    background: &RasterSurface,
    mode: BlendMode,
) -> RemixelResult<RasterSurface> {
    overlay.validate()?;

    let resolution_scale = f64::from(background.width()) / overlay.content_width;

    let out_w = to_px(overlay.content_width * resolution_scale)?;
    let out_h = to_px(overlay.content_height * resolution_scale)?;
    let layer_w = to_px(overlay.visible.width * resolution_scale)?;
    let layer_h = to_px(overlay.visible.height * resolution_scale)?;

    let layer = rasterize_overlay(overlay, layer_w, layer_h)?;

    let mut out = RasterSurface::new(out_w, out_h)?;
    fit::draw_cover(
        &mut out,
        background,
        0.0,
        0.0,
        f64::from(out_w),
        f64::from(out_h),
        0.5,
        0.5,
    )?;

    blend_layer_at_origin(&mut out, &layer, mode);
    Ok(out)
}

fn to_px(v: f64) -> RemixelResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(RemixelError::composite(
            "computed raster dimension is not positive",
        ));
    }
    let px = (v.round() as u32).max(1);
    if px > MAX_DIM {
        return Err(RemixelError::composite(format!(
            "raster size too large: {px} (max {MAX_DIM})"
        )));
    }
    Ok(px)
}

/// Rasterize the overlay's standalone SVG document into a premultiplied
/// layer of exactly `width` x `height`.
fn rasterize_overlay(
    overlay: &OverlayGeometry,
    width: u32,
    height: u32,
) -> RemixelResult<RasterSurface> {
    let svg = overlay.to_svg_document();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default())
        .context("decode overlay document")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RemixelError::composite("failed to allocate overlay pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(&tree, xform, &mut pixmap.as_mut());
    RasterSurface::from_premul_parts(width, height, pixmap.data().to_vec())
}

fn blend_layer_at_origin(dst: &mut RasterSurface, layer: &RasterSurface, mode: BlendMode) {
    let w = dst.width().min(layer.width());
    let h = dst.height().min(layer.height());
    for y in 0..h {
        for x in 0..w {
            let under = dst.pixel(x, y);
            let over = layer.pixel(x, y);
            dst.put_pixel(x, y, blend::blend_pixel(under, over, mode));
        }
    }
}

/// Write the raster to `dir` under the fixed export name.
pub fn encode_for_download(
    raster: &RasterSurface,
    format: ExportFormat,
    dir: &Path,
) -> RemixelResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir '{}'", dir.display()))?;
    let path = dir.join(format!("{EXPORT_BASENAME}.{}", format.extension()));

    match format {
        ExportFormat::Png => {
            image::save_buffer_with_format(
                &path,
                &raster.to_straight_rgba(),
                raster.width(),
                raster.height(),
                image::ColorType::Rgba8,
                format.image_format(),
            )
            .with_context(|| format!("write png '{}'", path.display()))?;
        }
        ExportFormat::Jpg => {
            image::save_buffer_with_format(
                &path,
                &raster.to_rgb8(),
                raster.width(),
                raster.height(),
                image::ColorType::Rgb8,
                format.image_format(),
            )
            .with_context(|| format!("write jpg '{}'", path.display()))?;
        }
    }
    Ok(path)
}

/// Encode the raster as a JPEG byte blob for network submission.
pub fn encode_jpeg_blob(raster: &RasterSurface) -> RemixelResult<Vec<u8>> {
    let rgb = image::RgbImage::from_raw(raster.width(), raster.height(), raster.to_rgb8())
        .ok_or_else(|| RemixelError::composite("raster bytes did not form an rgb image"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .context("encode jpeg blob")?;
    Ok(buf)
}
