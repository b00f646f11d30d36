pub mod clip;
pub mod entity_pass;
pub mod portal_camera;
pub mod stencil;

use rift_shared::rect::ScreenRect;
use tracing::debug;

use crate::assets::{AssetError, Assets, FLAT_FILL_SHADER};
use crate::camera::VirtualCamera;
use crate::context::{ActivePortalRecord, RenderContext};
use crate::gfx::{ClearTarget, Device, StateScope, WriteMaskScope};
use crate::stats::FrameStats;
use crate::world::{FrameScene, World};

/// Recursive traversal engine. One `render` call walks the whole portal
/// tree for a frame: every nesting level renders its nested portal content
/// first, then masks itself to the silhouette intersection of its ancestor
/// chain, then draws its own entities.
pub struct SceneRenderer {
    ctx: RenderContext,
    frame_camera: VirtualCamera,
    frame_viewport: (u32, u32),
    time_s: f32,
}

impl SceneRenderer {
    pub fn new(max_depth: usize) -> Self {
        Self {
            ctx: RenderContext::new(max_depth),
            frame_camera: VirtualCamera::default(),
            frame_viewport: (0, 0),
            time_s: 0.0,
        }
    }

    /// Renders the world as seen by `camera` for one frame. All draw
    /// submission goes through `device`; the only failure mode is a missing
    /// asset, which aborts the frame.
    pub fn render<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        assets: &Assets,
        world: &World,
        camera: &VirtualCamera,
        dt_seconds: f32,
    ) -> Result<FrameStats, AssetError> {
        self.time_s += dt_seconds;

        let (width, height) = device.viewport_size();
        self.frame_viewport = (width, height);
        let mut camera = camera.clone();
        camera.set_aspect(width as f32 / height.max(1) as f32);
        self.frame_camera = camera;

        let full = ScreenRect::full(width, height);
        device.set_color_write(true);
        device.set_depth_write(true);
        device.set_stencil_mode(None);
        device.set_scissor(full);
        device.clear(ClearTarget::COLOR | ClearTarget::DEPTH);

        self.ctx.reset(&self.frame_camera, self.time_s);
        let scene = FrameScene::capture(world);
        let mut stats = FrameStats::default();
        let outcome = self.render_scene(device, assets, &scene, full, &mut stats);

        // An unbalanced stack would silently corrupt every later frame.
        assert_eq!(self.ctx.view_depth(), 1, "view stack unbalanced after frame");
        assert_eq!(self.ctx.depth(), 0, "portal stack unbalanced after frame");

        outcome?;
        Ok(stats)
    }

    /// One recursion level. Returns without drawing when past the depth
    /// limit or when the portal being entered has no visible screen area
    /// left inside `enclosing`.
    fn render_scene<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        assets: &Assets,
        scene: &FrameScene<'_>,
        enclosing: ScreenRect,
        stats: &mut FrameStats,
    ) -> Result<(), AssetError> {
        let depth = self.ctx.depth();
        debug_assert_eq!(self.ctx.view_depth(), depth + 1, "stacks out of step");

        if depth > self.ctx.max_depth() {
            stats.depth_limited += 1;
            return Ok(());
        }

        let rect = match self.ctx.current_portal() {
            Some(record) => {
                // The opening's on-screen footprint is its silhouette as the
                // enclosing level saw it.
                let outer = depth - 1;
                let bound = clip::silhouette_scissor(
                    self.ctx.proj_at(outer),
                    self.ctx.view_at(outer),
                    &record.transform,
                    &record.mesh,
                    self.frame_viewport,
                    enclosing,
                );
                match bound {
                    Some(rect) => rect,
                    None => {
                        stats.culled_subtrees += 1;
                        debug!(depth, "portal subtree clipped out");
                        return Ok(());
                    }
                }
            }
            None => enclosing,
        };

        stats.note_scene_pass(depth);

        // Each nesting level starts from a fresh depth range so nested
        // content never z-fights the enclosing level.
        device.clear(ClearTarget::DEPTH);

        let mut scope = StateScope::capture(device);
        self.render_portals(&mut *scope, assets, scene, rect, stats)?;

        scope.set_scissor(rect);
        if self.ctx.depth() > 0 {
            stencil::apply(&mut self.ctx, &mut *scope, assets, stats)?;
        }
        entity_pass::render_entities(&self.ctx, &mut *scope, assets, scene, stats)?;
        Ok(())
    }

    /// Recurses into every portal reachable from this level, then writes the
    /// ancestor chain's portal surfaces into the depth buffer only, strictly
    /// after the nested content they frame.
    fn render_portals<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        assets: &Assets,
        scene: &FrameScene<'_>,
        rect: ScreenRect,
        stats: &mut FrameStats,
    ) -> Result<(), AssetError> {
        for &(pose, link) in &scene.portals {
            let mesh = assets.mesh(&link.mesh)?.clone();
            let mut outer = self.frame_camera.clone();
            outer.set_view_matrix(*self.ctx.current_view());
            let derived = portal_camera::build_portal_camera(&outer, pose, &link.destination);

            self.ctx.push_portal(ActivePortalRecord {
                mesh,
                transform: pose.model_matrix(),
            });
            self.ctx.push_camera(&derived);
            let nested = self.render_scene(device, assets, scene, rect, stats);
            self.ctx.pop_view();
            self.ctx.pop_portal();
            nested?;
        }

        device.clear(ClearTarget::DEPTH);
        let shader = assets.shader(FLAT_FILL_SHADER)?.clone();
        let records = self.ctx.portal_chain().to_vec();
        let mut masks = WriteMaskScope::new(device, false, true);
        for (level, record) in records.iter().enumerate() {
            let view = *self.ctx.view_at(level);
            self.ctx.push_view(view);
            masks.draw_mesh(&self.ctx, &shader, record.transform, &record.mesh, None);
            self.ctx.pop_view();
            stats.portal_depth_draws += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rift_shared::pose::Pose;
    use rift_shared::rect::ScreenRect;

    use crate::assets::Assets;
    use crate::camera::VirtualCamera;
    use crate::gfx::soft::SoftwareDevice;
    use crate::gfx::Device;
    use crate::world::{Entity, World};

    use super::SceneRenderer;

    fn test_camera() -> VirtualCamera {
        VirtualCamera::new(
            Pose::from_position(Vec3::new(0.0, 0.0, 3.0)),
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            200.0,
        )
    }

    /// Camera-facing source portal at the origin, destination frame far off
    /// to the side, cube two units beyond the destination plane.
    fn linked_pair_world() -> World {
        let source = Pose::from_position(Vec3::ZERO);
        let destination = Pose::from_position(Vec3::new(50.0, 0.0, 0.0));
        let mut world = World::new();
        world.spawn(Entity::portal("source", source, "portal_opening", destination));
        world.spawn(Entity::portal("exit", destination, "portal_opening", source));
        world.spawn(Entity::drawable(
            "crate",
            Pose::from_position(Vec3::new(50.0, 0.0, 2.0)),
            "cube",
            "concrete",
        ));
        world
    }

    fn corridor_world(pairs: usize) -> World {
        let mut world = World::new();
        for i in 0..pairs {
            let x = i as f32 * 0.5 - 0.75;
            let front = Pose::from_position(Vec3::new(x, 0.0, 0.0));
            let back = Pose::from_position(Vec3::new(x, 0.0, -6.0));
            world.spawn(Entity::portal(
                &format!("front_{i}"),
                front,
                "portal_opening",
                back,
            ));
            world.spawn(Entity::portal(
                &format!("back_{i}"),
                back,
                "portal_opening",
                front,
            ));
        }
        world
    }

    #[test]
    fn linked_pair_end_to_end() {
        let world = linked_pair_world();
        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(1);

        let stats = renderer
            .render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0)
            .unwrap();

        // One pass at the root, exactly one recursive pass through the
        // source portal; the exit portal is culled at the root and both
        // portals hit the depth guard below level one.
        assert_eq!(stats.passes_per_depth, vec![1, 1]);
        assert_eq!(stats.culled_subtrees, 1);
        assert_eq!(stats.depth_limited, 2);

        // The cube is drawn once per surviving level and never at depth 2.
        assert_eq!(stats.entity_draw_calls, 2);
        assert_eq!(device.entity_draws_at_depth(1).count(), 1);
        assert_eq!(device.draws_at_depth(2).count(), 0);
        assert_eq!(
            device
                .entity_draws_at_depth(1)
                .next()
                .unwrap()
                .material
                .as_deref(),
            Some("concrete")
        );
    }

    #[test]
    fn depth_bound_holds_for_mutually_facing_portals() {
        // Eight portals staring at each other recurse without end; only the
        // depth guard terminates the walk.
        let world = corridor_world(4);
        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(2);

        let stats = renderer
            .render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0)
            .unwrap();

        assert!(stats.max_depth_reached() <= 2);
        assert!(stats.depth_limited > 0);
        assert_eq!(renderer.ctx.view_depth(), 1);
        assert_eq!(renderer.ctx.depth(), 0);
        assert!(device.draws.iter().all(|d| d.depth <= 2));
    }

    #[test]
    fn portal_surfaces_land_after_their_nested_content() {
        // A single one-way portal looking at its own frame: one subtree per
        // level, so draw order is unambiguous.
        let mut world = World::new();
        world.spawn(Entity::portal(
            "loop",
            Pose::from_position(Vec3::ZERO),
            "portal_opening",
            Pose::from_position(Vec3::new(0.0, 0.0, -6.0)),
        ));
        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(2);

        renderer
            .render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0)
            .unwrap();

        let depth_only_at_one = device
            .draws
            .iter()
            .position(|d| d.depth == 1 && !d.color_write && d.depth_write)
            .expect("depth-only portal surface draw at depth 1");
        let last_nested = device
            .draws
            .iter()
            .rposition(|d| d.depth == 2)
            .expect("draws at depth 2");
        assert!(last_nested < depth_only_at_one);

        let record = &device.draws[depth_only_at_one];
        assert_eq!(record.shader, "whitefill");
        assert_eq!(record.material, None);
    }

    #[test]
    fn offscreen_portal_short_circuits_without_recursive_draws() {
        let mut world = World::new();
        world.spawn(Entity::portal(
            "hidden",
            Pose::from_position(Vec3::new(100.0, 0.0, 0.0)),
            "portal_opening",
            Pose::from_position(Vec3::new(0.0, 0.0, -20.0)),
        ));
        world.spawn(Entity::drawable("crate", Pose::default(), "cube", "concrete"));

        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(4);

        let stats = renderer
            .render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0)
            .unwrap();

        assert_eq!(stats.culled_subtrees, 1);
        assert_eq!(stats.passes_per_depth, vec![1]);
        assert_eq!(device.draws_at_depth(1).count(), 0);
        assert_eq!(stats.entity_draw_calls, 1);
    }

    #[test]
    fn stacks_stay_balanced_when_a_nested_pass_fails() {
        let mut world = linked_pair_world();
        // The crate's material only resolves at draw time, inside the
        // recursion.
        world.entities[2].drawable.as_mut().unwrap().material = "missing".to_string();

        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(1);

        let result = renderer.render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0);
        assert!(result.is_err());
        assert_eq!(renderer.ctx.view_depth(), 1);
        assert_eq!(renderer.ctx.depth(), 0);
    }

    #[test]
    fn frame_leaves_the_device_in_its_configured_state() {
        let world = linked_pair_world();
        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(2);

        renderer
            .render(&mut device, &assets, &world, &test_camera(), 1.0 / 60.0)
            .unwrap();

        assert!(device.color_write());
        assert!(device.depth_write());
        assert_eq!(device.stencil_mode(), None);
        assert_eq!(device.scissor(), ScreenRect::full(64, 64));
    }

    #[test]
    fn time_accumulates_across_frames() {
        let world = linked_pair_world();
        let mut device = SoftwareDevice::new(64, 64);
        let assets = Assets::with_defaults();
        let mut renderer = SceneRenderer::new(1);

        renderer
            .render(&mut device, &assets, &world, &test_camera(), 0.5)
            .unwrap();
        renderer
            .render(&mut device, &assets, &world, &test_camera(), 0.25)
            .unwrap();

        let last = device.draws.last().unwrap();
        assert!((last.time_s - 0.75).abs() < 1e-6);
    }
}
