use crate::{
    blend::{self, BlendMode},
    error::{RemixelError, RemixelResult},
    surface::RasterSurface,
};

/// Draw `src` into the destination rectangle with "cover" placement.
///
/// The source is uniformly scaled until it fully covers the rectangle, a crop
/// matching the destination aspect ratio is derived, and the crop is blitted
/// into the full rectangle. The anchor `(offset_x, offset_y)` selects which
/// part of the source survives the crop; both offsets clamp to `[0, 1]` and
/// default-center is `(0.5, 0.5)`.
pub fn draw_cover(
    dst: &mut RasterSurface,
    src: &RasterSurface,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    offset_x: f64,
    offset_y: f64,
) -> RemixelResult<()> {
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Err(RemixelError::validation(
            "cover rectangle must have finite positive size",
        ));
    }

    let ox = offset_x.clamp(0.0, 1.0);
    let oy = offset_y.clamp(0.0, 1.0);

    let iw = f64::from(src.width());
    let ih = f64::from(src.height());

    let r = (w / iw).min(h / ih);
    let mut nw = iw * r;
    let nh = ih * r;

    let mut ar = 1.0;
    if nw < w {
        ar = w / nw;
    }
    // Near-square sources can round to a one-pixel gap on the short axis;
    // re-derive the ratio height-first in that case.
    if (ar - 1.0).abs() < 1e-14 && nh < h {
        ar = h / nh;
    }
    nw *= ar;
    let nh = nh * ar;

    let mut cw = iw / (nw / w);
    let mut ch = ih / (nh / h);
    let mut cx = (iw - cw) * ox;
    let mut cy = (ih - ch) * oy;

    if cx < 0.0 {
        cx = 0.0;
    }
    if cy < 0.0 {
        cy = 0.0;
    }
    if cw > iw {
        cw = iw;
    }
    if ch > ih {
        ch = ih;
    }

    blit_crop(dst, src, (cx, cy, cw, ch), (x, y, w, h));
    Ok(())
}

fn blit_crop(
    dst: &mut RasterSurface,
    src: &RasterSurface,
    crop: (f64, f64, f64, f64),
    rect: (f64, f64, f64, f64),
) {
    let (cx, cy, cw, ch) = crop;
    let (x, y, w, h) = rect;

    let px0 = x.floor().max(0.0) as u32;
    let py0 = y.floor().max(0.0) as u32;
    let px1 = ((x + w).ceil() as i64).clamp(0, i64::from(dst.width())) as u32;
    let py1 = ((y + h).ceil() as i64).clamp(0, i64::from(dst.height())) as u32;

    for py in py0..py1 {
        for px in px0..px1 {
            let u = (f64::from(px) + 0.5 - x) / w;
            let v = (f64::from(py) + 0.5 - y) / h;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }
            let sx = cx + u * cw - 0.5;
            let sy = cy + v * ch - 0.5;
            let sample = sample_bilinear(src, sx, sy);
            let under = dst.pixel(px, py);
            dst.put_pixel(px, py, blend::blend_pixel(under, sample, BlendMode::Normal));
        }
    }
}

fn sample_bilinear(src: &RasterSurface, sx: f64, sy: f64) -> [u8; 4] {
    let max_x = f64::from(src.width() - 1);
    let max_y = f64::from(src.height() - 1);
    let fx = sx.clamp(0.0, max_x);
    let fy = sy.clamp(0.0, max_y);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let tx = (fx - f64::from(x0)) as f32;
    let ty = (fy - f64::from(y0)) as f32;

    let p00 = src.pixel(x0, y0);
    let p10 = src.pixel(x1, y0);
    let p01 = src.pixel(x0, y1);
    let p11 = src.pixel(x1, y1);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f32::from(p00[i]) * (1.0 - tx) + f32::from(p10[i]) * tx;
        let bot = f32::from(p01[i]) * (1.0 - tx) + f32::from(p11[i]) * tx;
        out[i] = ((top * (1.0 - ty) + bot * ty).round() as i32).clamp(0, 255) as u8;
    }
    out
}

/// Produce a copy of `src` rescaled toward `requested_max_width` by repeated
/// 2x box reduction, finishing with one direct bilinear pass.
///
/// NOTE: the target keeps the larger of the request and the source width, so
/// the halving loop is inert whenever the request exceeds the source and the
/// final pass may upscale. Callers wanting a strict reduction must request a
/// width below the source's.
pub fn downscale_image(src: &RasterSurface, requested_max_width: u32) -> RemixelResult<RasterSurface> {
    if requested_max_width == 0 {
        return Err(RemixelError::validation(
            "downscale target width must be > 0",
        ));
    }

    let target_w = requested_max_width.max(src.width());
    let mut cur = src.clone();
    while cur.width() / 2 >= target_w {
        cur = halve(&cur)?;
    }
    if cur.width() != target_w {
        let target_h = ((f64::from(cur.height()) * f64::from(target_w) / f64::from(cur.width()))
            .round() as u32)
            .max(1);
        cur = resize_bilinear(&cur, target_w, target_h)?;
    }
    Ok(cur)
}

fn halve(src: &RasterSurface) -> RemixelResult<RasterSurface> {
    let w = (src.width() / 2).max(1);
    let h = (src.height() / 2).max(1);
    let mut out = RasterSurface::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let x0 = (x * 2).min(src.width() - 1);
            let y0 = (y * 2).min(src.height() - 1);
            let x1 = (x * 2 + 1).min(src.width() - 1);
            let y1 = (y * 2 + 1).min(src.height() - 1);
            let ps = [
                src.pixel(x0, y0),
                src.pixel(x1, y0),
                src.pixel(x0, y1),
                src.pixel(x1, y1),
            ];
            let mut px = [0u8; 4];
            for i in 0..4 {
                let sum: u16 = ps.iter().map(|p| u16::from(p[i])).sum();
                px[i] = ((sum + 2) / 4) as u8;
            }
            out.put_pixel(x, y, px);
        }
    }
    Ok(out)
}

fn resize_bilinear(src: &RasterSurface, w: u32, h: u32) -> RemixelResult<RasterSurface> {
    let mut out = RasterSurface::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let sx = (f64::from(x) + 0.5) * f64::from(src.width()) / f64::from(w) - 0.5;
            let sy = (f64::from(y) + 0.5) * f64::from(src.height()) / f64::from(h) - 0.5;
            out.put_pixel(x, y, sample_bilinear(src, sx, sy));
        }
    }
    Ok(out)
}
