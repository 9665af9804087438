use crate::foundation::{
    core::{Rect, Rgba8, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    error::{MemegenError, MemegenResult},
};

/// Fixed-size RGBA8 pixel surface, stored premultiplied.
///
/// Dimensions are limited to `u16` per axis so the buffer can be handed to the rasterizer
/// without conversion checks on the hot path.
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Transparent surface of `width × height`.
    pub fn new(width: u32, height: u32) -> MemegenResult<Self> {
        if width == 0 || height == 0 {
            return Err(MemegenError::validation("surface size must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(MemegenError::validation(format!(
                "surface size {width}x{height} exceeds {} per axis",
                u16::MAX
            )));
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable premultiplied pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Replace the whole surface with straight-alpha RGBA8 pixels of identical size.
    pub fn blit(&mut self, rgba8: &[u8]) -> MemegenResult<()> {
        if rgba8.len() != self.data.len() {
            return Err(MemegenError::render(format!(
                "blit buffer is {} bytes, surface needs {}",
                rgba8.len(),
                self.data.len()
            )));
        }
        self.data.copy_from_slice(rgba8);
        premultiply_rgba8_in_place(&mut self.data);
        Ok(())
    }

    /// Straight-alpha copy of the current pixels.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Straight-alpha color of one pixel, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        unpremultiply_rgba8_in_place(&mut px);
        Some(Rgba8::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Paint a one-pixel rectangle outline, clipped to the surface.
    pub fn stroke_rect(&mut self, rect: Rect, color: Rgba8) {
        let mut premul = [color.r, color.g, color.b, color.a];
        premultiply_rgba8_in_place(&mut premul);

        let clamp_x = |v: f64| v.floor().clamp(0.0, f64::from(self.width) - 1.0) as u32;
        let clamp_y = |v: f64| v.floor().clamp(0.0, f64::from(self.height) - 1.0) as u32;
        let (x0, x1) = (clamp_x(rect.x0), clamp_x(rect.x1));
        let (y0, y1) = (clamp_y(rect.y0), clamp_y(rect.y1));

        for x in x0..=x1 {
            self.put(x, y0, premul);
            self.put(x, y1, premul);
        }
        for y in y0..=y1 {
            self.put(x0, y, premul);
            self.put(x1, y, premul);
        }
    }

    fn put(&mut self, x: u32, y: u32, premul: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let dst = &mut self.data[i..i + 4];
        let inv = 255 - u16::from(premul[3]);
        for c in 0..4 {
            dst[c] = (u16::from(premul[c]) + (u16::from(dst[c]) * inv + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
