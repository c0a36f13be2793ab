/// Axis-aligned rectangle in screen pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole surface of the given size.
    pub fn full(size: (u32, u32)) -> Self {
        Self::new(0.0, 0.0, size.0 as f32, size.1 as f32)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// The display surface shared by the director, stages and cutscenes.
///
/// Images are addressed by key (an asset path, or a synthetic key for
/// streamed pixels). Draws queue up until `present`, which shows the frame.
pub trait RenderTarget {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Draw the image behind `image_key`, stretched to `dest`.
    fn blit(&mut self, image_key: &str, dest: Rect);

    /// Upload raw RGBA8 pixels under `key` and draw them stretched to `dest`.
    /// Repeated calls with the same key reuse the underlying texture.
    fn blit_pixels(&mut self, key: &str, width: u32, height: u32, rgba: &[u8], dest: Rect);

    fn present(&mut self);

    fn set_title(&mut self, title: &str);
}
