use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Screen-space camera. World units are pixels, origin at the top-left
/// corner of the viewport, y growing downwards.
pub struct Camera2D {
    /// World position shown at the top-left corner.
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        let width = self.viewport.0 as f32 / self.zoom;
        let height = self.viewport.1 as f32 / self.zoom;

        Mat4::orthographic_rh(
            self.position.x,
            self.position.x + width,
            self.position.y + height,
            self.position.y,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ndc(camera: &Camera2D, x: f32, y: f32) -> Vec3 {
        camera.projection().project_point3(Vec3::new(x, y, 0.0))
    }

    #[test]
    fn top_left_pixel_maps_to_upper_left_corner() {
        let camera = Camera2D::new(1280, 720);
        let p = ndc(&camera, 0.0, 0.0);
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bottom_right_pixel_maps_to_lower_right_corner() {
        let camera = Camera2D::new(1280, 720);
        let p = ndc(&camera, 1280.0, 720.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn scrolling_shifts_the_visible_window() {
        let mut camera = Camera2D::new(1280, 720);
        camera.position = Vec2::new(640.0, 0.0);
        let p = ndc(&camera, 640.0, 360.0);
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
    }
}
