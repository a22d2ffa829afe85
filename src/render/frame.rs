/// A rendered frame in CPU memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Opaque frame filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = crate::foundation::core::Rgba8Premul::from_straight_rgba(
            rgba[0], rgba[1], rgba[2], rgba[3],
        )
        .to_array();
        let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
        for d in data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
        Self {
            width,
            height,
            data,
            premultiplied: true,
        }
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}
