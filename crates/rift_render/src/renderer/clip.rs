use glam::Mat4;
use rift_shared::mesh::Mesh;
use rift_shared::rect::ScreenRect;

const MIN_CLIP_W: f32 = 1e-6;

/// Screen-space bound of a portal silhouette, intersected with the
/// enclosing scissor rectangle. `None` means nothing behind the portal can
/// be visible and the subtree can be skipped. A silhouette that reaches
/// behind the eye cannot be bounded tightly and falls back to the enclosing
/// rectangle.
pub fn silhouette_scissor(
    proj: &Mat4,
    view: &Mat4,
    model: &Mat4,
    mesh: &Mesh,
    viewport: (u32, u32),
    enclosing: ScreenRect,
) -> Option<ScreenRect> {
    if enclosing.is_empty() || mesh.positions.is_empty() {
        return None;
    }

    let mvp = *proj * *view * *model;
    let (width, height) = viewport;

    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut any_in_front = false;
    let mut any_behind = false;

    for pos in &mesh.positions {
        let clip = mvp * pos.extend(1.0);
        if clip.w <= MIN_CLIP_W {
            any_behind = true;
            continue;
        }
        any_in_front = true;
        let ndc = clip.truncate() / clip.w;
        min_x = min_x.min(ndc.x);
        max_x = max_x.max(ndc.x);
        min_y = min_y.min(ndc.y);
        max_y = max_y.max(ndc.y);
    }

    if !any_in_front {
        return None;
    }
    if any_behind {
        return Some(enclosing);
    }

    let x0 = ((min_x * 0.5 + 0.5) * width as f32).floor() as i32;
    let x1 = ((max_x * 0.5 + 0.5) * width as f32).ceil() as i32;
    let y0 = ((0.5 - max_y * 0.5) * height as f32).floor() as i32;
    let y1 = ((0.5 - min_y * 0.5) * height as f32).ceil() as i32;

    let bound = ScreenRect::new(x0, y0, x1 - x0, y1 - y0);
    let clipped = bound.intersect(&enclosing);
    if clipped.is_empty() {
        None
    } else {
        Some(clipped)
    }
}
