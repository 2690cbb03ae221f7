use anyhow::Context as _;
use base64::Engine as _;

use crate::{
    error::{RemixelError, RemixelResult},
    surface::RasterSurface,
};

/// Decode encoded image bytes into a premultiplied surface.
pub fn decode_image(bytes: &[u8]) -> RemixelResult<RasterSurface> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8 = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8);

    RasterSurface::from_premul_parts(width, height, rgba8)
}

/// Extract the payload bytes of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> RemixelResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RemixelError::decode("not a data: URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RemixelError::decode("data: URI has no payload separator"))?;
    if !header.ends_with(";base64") {
        return Err(RemixelError::decode("data: URI payload is not base64"));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decode base64 payload")?;
    Ok(bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_image_png_dimensions_and_premul() {
        let buf = png_bytes(vec![100u8, 50, 200, 128], 1, 1);
        let surface = decode_image(&buf).unwrap();
        assert_eq!(surface.width(), 1);
        assert_eq!(surface.height(), 1);
        assert_eq!(
            surface.pixel(0, 0),
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_image_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn data_uri_roundtrip() {
        let png = png_bytes(vec![255u8, 0, 0, 255], 1, 1);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let bytes = decode_data_uri(&uri).unwrap();
        assert_eq!(bytes, png);

        let surface = decode_image(&bytes).unwrap();
        assert_eq!(surface.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn data_uri_requires_base64_header() {
        assert!(decode_data_uri("data:image/png,plain").is_err());
        assert!(decode_data_uri("image/png;base64,AAAA").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
    }
}
