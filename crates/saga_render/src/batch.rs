//! CPU-side sprite mesh. Quads are appended in draw order and consecutive
//! quads sharing a texture collapse into one indexed draw call.

use std::sync::Arc;

use saga_core::render::Rect;

use crate::vertex::SpriteVertex;

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Default)]
pub struct SpriteBatch {
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_quad(&mut self, texture_key: &str, dest: Rect, color: [f32; 4]) {
        let base_index = self.vertices.len() as u32;
        let (left, top) = (dest.x, dest.y);
        let (right, bottom) = (dest.right(), dest.bottom());

        self.vertices.extend_from_slice(&[
            SpriteVertex::new([left, top], [0.0, 0.0], color),
            SpriteVertex::new([right, top], [1.0, 0.0], color),
            SpriteVertex::new([right, bottom], [1.0, 1.0], color),
            SpriteVertex::new([left, bottom], [0.0, 1.0], color),
        ]);

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.push_draw_call(texture_key, draw_start, 6);
    }

    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }
}
