use glam::{Mat4, Vec2};
use rift_shared::mesh::Mesh;
use rift_shared::rect::ScreenRect;

use crate::assets::{Material, Shader};
use crate::context::RenderContext;
use crate::gfx::{ClearTarget, Device, StencilFunc, StencilMode, StencilOp};

const MIN_CLIP_W: f32 = 1e-6;

/// One recorded draw submission with the ambient state it was issued under.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub shader: String,
    pub material: Option<String>,
    pub model: Mat4,
    pub triangle_count: usize,
    pub depth: usize,
    pub time_s: f32,
    pub color_write: bool,
    pub depth_write: bool,
    pub stencil: Option<StencilMode>,
    pub scissor: ScreenRect,
}

/// Headless device: keeps the full graphics-state record, rasterizes
/// stencil-mutating draws into a real stencil buffer, and logs every
/// submission. Backs the viewer binary and the test suite.
#[derive(Debug)]
pub struct SoftwareDevice {
    width: u32,
    height: u32,
    color_write: bool,
    depth_write: bool,
    stencil_mode: Option<StencilMode>,
    scissor: ScreenRect,
    stencil_buf: Vec<u8>,
    pub draws: Vec<DrawRecord>,
    pub color_clears: u32,
    pub depth_clears: u32,
    pub stencil_clears: u32,
    pub transform_uploads: u32,
}

impl SoftwareDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color_write: true,
            depth_write: true,
            stencil_mode: None,
            scissor: ScreenRect::full(width, height),
            stencil_buf: vec![0; (width * height) as usize],
            draws: Vec::new(),
            color_clears: 0,
            depth_clears: 0,
            stencil_clears: 0,
            transform_uploads: 0,
        }
    }

    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        self.stencil_buf[(y * self.width + x) as usize]
    }

    pub fn stencil_marked_count(&self) -> usize {
        self.stencil_buf.iter().filter(|v| **v >= 1).count()
    }

    pub fn draws_at_depth(&self, depth: usize) -> impl Iterator<Item = &DrawRecord> {
        self.draws.iter().filter(move |d| d.depth == depth)
    }

    pub fn entity_draws_at_depth(&self, depth: usize) -> impl Iterator<Item = &DrawRecord> {
        self.draws_at_depth(depth).filter(|d| d.material.is_some())
    }

    fn apply_stencil_op(value: &mut u8, op: StencilOp) {
        match op {
            StencilOp::Keep => {}
            StencilOp::Incr => *value = value.saturating_add(1),
            StencilOp::Decr => *value = value.saturating_sub(1),
        }
    }

    fn stencil_test(mode: &StencilMode, value: u8) -> bool {
        match mode.func {
            StencilFunc::Never => false,
            StencilFunc::Always => true,
            StencilFunc::Equal => value == mode.reference,
            StencilFunc::AtLeast => value >= mode.reference,
        }
    }

    fn rasterize_stencil(&mut self, mvp: Mat4, mesh: &Mesh, mode: StencilMode) {
        let bounds = self
            .scissor
            .intersect(&ScreenRect::full(self.width, self.height));
        if bounds.is_empty() {
            return;
        }

        for tri in mesh.triangles() {
            let mut screen = [Vec2::ZERO; 3];
            let mut behind = false;
            for (corner, pos) in screen.iter_mut().zip(tri) {
                let clip = mvp * pos.extend(1.0);
                if clip.w <= MIN_CLIP_W {
                    behind = true;
                    break;
                }
                let ndc = clip.truncate() / clip.w;
                *corner = Vec2::new(
                    (ndc.x * 0.5 + 0.5) * self.width as f32,
                    (0.5 - ndc.y * 0.5) * self.height as f32,
                );
            }
            // Triangles reaching behind the eye would need clipping to
            // rasterize correctly; silhouettes that matter sit in front.
            if behind {
                continue;
            }

            let min_x = screen.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
            let max_x = screen.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
            let min_y = screen.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
            let max_y = screen.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);

            let x0 = (min_x.floor() as i32).max(bounds.x);
            let x1 = (max_x.ceil() as i32).min(bounds.right());
            let y0 = (min_y.floor() as i32).max(bounds.y);
            let y1 = (max_y.ceil() as i32).min(bounds.bottom());

            for py in y0..y1 {
                for px in x0..x1 {
                    let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                    if !point_in_triangle(p, &screen) {
                        continue;
                    }
                    let index = (py as u32 * self.width + px as u32) as usize;
                    let value = &mut self.stencil_buf[index];
                    let op = if Self::stencil_test(&mode, *value) {
                        mode.pass_op
                    } else {
                        mode.fail_op
                    };
                    Self::apply_stencil_op(value, op);
                }
            }
        }
    }
}

impl Device for SoftwareDevice {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn color_write(&self) -> bool {
        self.color_write
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
    }

    fn depth_write(&self) -> bool {
        self.depth_write
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn stencil_mode(&self) -> Option<StencilMode> {
        self.stencil_mode
    }

    fn set_stencil_mode(&mut self, mode: Option<StencilMode>) {
        self.stencil_mode = mode;
    }

    fn scissor(&self) -> ScreenRect {
        self.scissor
    }

    fn set_scissor(&mut self, rect: ScreenRect) {
        self.scissor = rect;
    }

    fn clear(&mut self, targets: ClearTarget) {
        if targets.contains(ClearTarget::COLOR) {
            self.color_clears += 1;
        }
        if targets.contains(ClearTarget::DEPTH) {
            self.depth_clears += 1;
        }
        if targets.contains(ClearTarget::STENCIL) {
            self.stencil_clears += 1;
            let bounds = self
                .scissor
                .intersect(&ScreenRect::full(self.width, self.height));
            for y in bounds.y..bounds.bottom() {
                for x in bounds.x..bounds.right() {
                    self.stencil_buf[(y as u32 * self.width + x as u32) as usize] = 0;
                }
            }
        }
    }

    fn draw_mesh(
        &mut self,
        ctx: &RenderContext,
        shader: &Shader,
        model: Mat4,
        mesh: &Mesh,
        material: Option<&Material>,
    ) {
        if ctx.consume_proj_dirty() {
            self.transform_uploads += 1;
        }
        if ctx.consume_view_dirty() {
            self.transform_uploads += 1;
        }

        if let Some(mode) = self.stencil_mode {
            if mode.mutates() {
                let mvp = *ctx.current_proj() * *ctx.current_view() * model;
                self.rasterize_stencil(mvp, mesh, mode);
            }
        }

        self.draws.push(DrawRecord {
            shader: shader.name.clone(),
            material: material.map(|m| m.name.clone()),
            model,
            triangle_count: mesh.triangle_count(),
            depth: ctx.depth(),
            time_s: ctx.time_seconds(),
            color_write: self.color_write,
            depth_write: self.depth_write,
            stencil: self.stencil_mode,
            scissor: self.scissor,
        });
    }
}

fn point_in_triangle(p: Vec2, tri: &[Vec2; 3]) -> bool {
    let e0 = edge(tri[0], tri[1], p);
    let e1 = edge(tri[1], tri[2], p);
    let e2 = edge(tri[2], tri[0], p);
    // Accept both windings: portal transforms are free to mirror.
    let eps = 1e-6;
    (e0 >= -eps && e1 >= -eps && e2 >= -eps) || (e0 <= eps && e1 <= eps && e2 <= eps)
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use rift_shared::mesh::Mesh;
    use rift_shared::pose::Pose;
    use rift_shared::rect::ScreenRect;

    use crate::assets::Assets;
    use crate::camera::VirtualCamera;
    use crate::context::RenderContext;
    use crate::gfx::{ClearTarget, Device, StencilMode};

    use super::SoftwareDevice;

    fn straight_on_context() -> RenderContext {
        // Eye four units out on +z, square frustum: a quad vertex at x = s
        // lands at ndc x = s / 4.
        let camera = VirtualCamera::new(
            Pose::from_position(Vec3::new(0.0, 0.0, 4.0)),
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        );
        let mut ctx = RenderContext::new(4);
        ctx.reset(&camera, 0.0);
        ctx
    }

    #[test]
    fn stencil_write_marks_the_projected_quad_only() {
        let ctx = straight_on_context();
        let mut device = SoftwareDevice::new(64, 64);
        device.set_stencil_mode(Some(StencilMode::write_everywhere()));

        let assets = Assets::with_defaults();
        let shader = assets.shader("whitefill").unwrap().clone();
        let quad = Mesh::unit_quad();
        let model = Mat4::from_scale(Vec3::splat(2.0));
        device.draw_mesh(&ctx, &shader, model, &quad, None);

        // Scaled quad spans ndc [-0.5, 0.5]: pixels 16..48 on both axes.
        assert_eq!(device.stencil_at(32, 32), 1);
        assert_eq!(device.stencil_at(17, 17), 1);
        assert_eq!(device.stencil_at(8, 32), 0);
        assert_eq!(device.stencil_at(32, 56), 0);
    }

    #[test]
    fn stencil_clear_respects_the_scissor_rect() {
        let ctx = straight_on_context();
        let mut device = SoftwareDevice::new(64, 64);
        device.set_stencil_mode(Some(StencilMode::write_everywhere()));

        let assets = Assets::with_defaults();
        let shader = assets.shader("whitefill").unwrap().clone();
        let quad = Mesh::unit_quad();
        device.draw_mesh(&ctx, &shader, Mat4::from_scale(Vec3::splat(2.0)), &quad, None);

        device.set_scissor(ScreenRect::new(0, 0, 32, 64));
        device.clear(ClearTarget::STENCIL);
        assert_eq!(device.stencil_at(20, 32), 0);
        assert_eq!(device.stencil_at(40, 32), 1);
    }

    #[test]
    fn non_mutating_stencil_draws_leave_the_buffer_alone() {
        let ctx = straight_on_context();
        let mut device = SoftwareDevice::new(64, 64);
        device.set_stencil_mode(Some(StencilMode::pass_inside_mask()));

        let assets = Assets::with_defaults();
        let shader = assets.shader("diffuse").unwrap().clone();
        let quad = Mesh::unit_quad();
        device.draw_mesh(&ctx, &shader, Mat4::IDENTITY, &quad, None);

        assert_eq!(device.stencil_marked_count(), 0);
        assert_eq!(device.draws.len(), 1);
    }

    #[test]
    fn dirty_transforms_upload_once_per_change() {
        let ctx = straight_on_context();
        let mut device = SoftwareDevice::new(16, 16);
        let assets = Assets::with_defaults();
        let shader = assets.shader("diffuse").unwrap().clone();
        let quad = Mesh::unit_quad();

        device.draw_mesh(&ctx, &shader, Mat4::IDENTITY, &quad, None);
        device.draw_mesh(&ctx, &shader, Mat4::IDENTITY, &quad, None);
        // Both flags were dirty for the first draw only.
        assert_eq!(device.transform_uploads, 2);
    }
}
