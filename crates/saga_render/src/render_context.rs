//! The display surface handed to the director.
//!
//! Every `blit` appends a quad to a CPU-side batch; `present` streams the
//! batch into GPU buffers, draws it in a single render pass and clears it
//! for the next frame. Textures are loaded from disk the first time an image
//! key is blitted and stay resident for the rest of the session.

use std::collections::HashMap;
use std::sync::Arc;

use saga_core::render::{Rect, RenderTarget};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::batch::{SpriteBatch, WHITE};
use crate::camera::Camera2D;
use crate::gpu_context::{GpuContext, RenderError};
use crate::sprite_pipeline::SpritePipeline;
use crate::texture::{rgba_len, Texture};
use crate::vertex::SpriteVertex;

const FALLBACK_PIXEL: [u8; 4] = [255, 255, 255, 255];
const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

pub struct RenderContext {
    window: Arc<Window>,
    gpu: GpuContext,
    sprite_pipeline: SpritePipeline,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,
    batch: SpriteBatch,

    // Buffers grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    _camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl RenderContext {
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);

        let camera = Camera2D::new(gpu.size.0, gpu.size.1);
        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let mesh_vertex_capacity = 64;
        let mesh_index_capacity = 96;
        let vertex_buffer = create_vertex_buffer(&gpu.device, mesh_vertex_capacity);
        let index_buffer = create_index_buffer(&gpu.device, mesh_index_capacity);

        log::info!("Renderer ready ({}x{})", gpu.size.0, gpu.size.1);

        Ok(Self {
            window,
            gpu,
            sprite_pipeline,
            textures: HashMap::new(),
            batch: SpriteBatch::new(),
            vertex_buffer,
            index_buffer,
            mesh_vertex_capacity,
            mesh_index_capacity,
            _camera_buffer: camera_buffer,
            camera_bind_group,
        })
    }

    fn ensure_texture(&mut self, image_key: &str) {
        if self.textures.contains_key(image_key) {
            return;
        }
        let texture = load_texture_asset(&self.gpu.device, &self.gpu.queue, image_key);
        let bind_group = self
            .sprite_pipeline
            .create_texture_bind_group(&self.gpu.device, &texture);
        self.textures.insert(
            Arc::from(image_key),
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
    }

    fn upload_mesh(&mut self) {
        self.ensure_mesh_capacity(self.batch.vertices().len(), self.batch.indices().len());
        if !self.batch.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.batch.vertices()),
            );
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(self.batch.indices()),
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn draw_frame(&self, view: &wgpu::TextureView) {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in self.batch.draw_calls() {
                if let Some(texture) = self.textures.get(&draw.texture_key) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw_indexed(
                        draw.index_start..(draw.index_start + draw.index_count),
                        0,
                        0..1,
                    );
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderTarget for RenderContext {
    fn size(&self) -> (u32, u32) {
        self.gpu.size
    }

    fn blit(&mut self, image_key: &str, dest: Rect) {
        self.ensure_texture(image_key);
        self.batch.push_quad(image_key, dest, WHITE);
    }

    fn blit_pixels(&mut self, key: &str, width: u32, height: u32, rgba: &[u8], dest: Rect) {
        if width == 0 || height == 0 || rgba.len() != rgba_len(width, height) {
            log::warn!(
                "Dropping frame '{}': {} bytes for {}x{}",
                key,
                rgba.len(),
                width,
                height
            );
            return;
        }

        let reusable = self
            .textures
            .get(key)
            .is_some_and(|existing| existing.texture.size == (width, height));

        if reusable {
            if let Some(existing) = self.textures.get(key) {
                existing.texture.write_rgba(&self.gpu.queue, rgba);
            }
        } else {
            let texture =
                Texture::from_rgba8(&self.gpu.device, &self.gpu.queue, rgba, width, height, key);
            let bind_group = self
                .sprite_pipeline
                .create_texture_bind_group(&self.gpu.device, &texture);
            self.textures.insert(
                Arc::from(key),
                GpuSpriteTexture {
                    texture,
                    bind_group,
                },
            );
        }
        self.batch.push_quad(key, dest, WHITE);
    }

    fn present(&mut self) {
        self.upload_mesh();
        if let Some((output, view)) = self.gpu.begin_frame() {
            self.draw_frame(&view);
            output.present();
        }
        self.batch.clear();
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

fn load_texture_asset(device: &wgpu::Device, queue: &wgpu::Queue, asset_path: &str) -> Texture {
    let loaded = std::fs::read(asset_path)
        .map_err(|err| err.to_string())
        .and_then(|bytes| {
            Texture::from_bytes(device, queue, &bytes, asset_path).map_err(|err| err.to_string())
        });
    match loaded {
        Ok(texture) => texture,
        Err(err) => {
            log::warn!(
                "Failed to load texture '{}': {}. Falling back to a white quad.",
                asset_path,
                err
            );
            Texture::solid(device, queue, FALLBACK_PIXEL, asset_path)
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
