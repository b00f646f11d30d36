use glam::{Mat4, Vec3};

use crate::assets::{
    AssetError, Assets, Material, DEFAULT_SHADER, PLAYER_TOKEN_MATERIAL, PLAYER_TOKEN_MESH,
};
use crate::context::RenderContext;
use crate::gfx::Device;
use crate::stats::FrameStats;
use crate::world::FrameScene;

const PLAYER_TOKEN_OFFSET: Vec3 = Vec3::new(0.0, -0.5, 0.0);
const PLAYER_TOKEN_SCALE: f32 = 1.3;

/// Maps a material to its shader variant. A fixed, small table; anything
/// without a specialized variant takes the generic lit shader.
fn shader_variant(material: &Material) -> &'static str {
    match material.name.as_str() {
        "metal_tiles" => "metal",
        _ => DEFAULT_SHADER,
    }
}

/// Draws every plain drawable at the current level, constrained by whatever
/// scissor rectangle and stencil mask are active on the device.
pub fn render_entities<D: Device + ?Sized>(
    ctx: &RenderContext,
    device: &mut D,
    assets: &Assets,
    scene: &FrameScene<'_>,
    stats: &mut FrameStats,
) -> Result<(), AssetError> {
    for (pose, drawable) in &scene.drawables {
        let material = assets.material(&drawable.material)?;
        let mesh = assets.mesh(&drawable.mesh)?;
        let shader = assets.shader(shader_variant(material))?;
        device.draw_mesh(ctx, shader, pose.model_matrix(), mesh, Some(material));
        stats.entity_draw_calls += 1;
    }

    if let Some(player) = scene.player {
        let mesh = assets.mesh(PLAYER_TOKEN_MESH)?;
        let material = assets.material(PLAYER_TOKEN_MATERIAL)?;
        let shader = assets.shader(DEFAULT_SHADER)?;
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(PLAYER_TOKEN_SCALE),
            player.orientation,
            player.position + PLAYER_TOKEN_OFFSET,
        );
        device.draw_mesh(ctx, shader, model, mesh, Some(material));
        stats.player_draw_calls += 1;
    }

    Ok(())
}
