use crate::error::{RemixelError, RemixelResult};

/// Owned raster surface.
///
/// Pixel bytes are row-major, tightly packed, premultiplied RGBA8, the
/// interchange form used across the compositing pipeline. Straight-alpha data
/// must be premultiplied before construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterSurface {
    /// Allocate a transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> RemixelResult<Self> {
        if width == 0 || height == 0 {
            return Err(RemixelError::validation("surface width/height must be > 0"));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| RemixelError::validation("surface size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Wrap existing premultiplied RGBA8 bytes.
    pub fn from_premul_parts(width: u32, height: u32, data: Vec<u8>) -> RemixelResult<Self> {
        if width == 0 || height == 0 {
            return Err(RemixelError::validation("surface width/height must be > 0"));
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(RemixelError::validation(
                "surface byte length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn fill(&mut self, rgba_premul: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba_premul);
        }
    }

    /// Read one pixel. Coordinates must be in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        debug_assert!(x < self.width && y < self.height);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba_premul: [u8; 4]) {
        debug_assert!(x < self.width && y < self.height);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba_premul);
    }

    /// Convert to straight (non-premultiplied) RGBA8 for encoders.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 || a == 255 {
                continue;
            }
            px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
            px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
            px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
        }
        out
    }

    /// Flatten to RGB8, dropping alpha after unpremultiplying.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let straight = self.to_straight_rgba();
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in straight.chunks_exact(4) {
            out.extend_from_slice(&px[..3]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_dims() {
        assert!(RasterSurface::new(0, 4).is_err());
        assert!(RasterSurface::new(4, 0).is_err());
    }

    #[test]
    fn from_parts_validates_length() {
        assert!(RasterSurface::from_premul_parts(2, 2, vec![0u8; 16]).is_ok());
        assert!(RasterSurface::from_premul_parts(2, 2, vec![0u8; 15]).is_err());
    }

    #[test]
    fn pixel_roundtrip() {
        let mut s = RasterSurface::new(3, 2).unwrap();
        s.put_pixel(2, 1, [10, 20, 30, 40]);
        assert_eq!(s.pixel(2, 1), [10, 20, 30, 40]);
        assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn straight_rgba_unpremultiplies() {
        let mut s = RasterSurface::new(1, 1).unwrap();
        s.put_pixel(0, 0, [64, 32, 16, 128]);
        let straight = s.to_straight_rgba();
        assert_eq!(straight[3], 128);
        assert_eq!(straight[0], ((64u16 * 255 + 64) / 128) as u8);
    }

    #[test]
    fn rgb8_drops_alpha() {
        let mut s = RasterSurface::new(2, 1).unwrap();
        s.fill([255, 0, 0, 255]);
        assert_eq!(s.to_rgb8(), vec![255, 0, 0, 255, 0, 0]);
    }
}
