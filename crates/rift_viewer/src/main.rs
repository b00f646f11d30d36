mod config;
mod scene;

use std::path::PathBuf;
use std::process::ExitCode;

use rift_render::assets::Assets;
use rift_render::camera::VirtualCamera;
use rift_render::gfx::soft::SoftwareDevice;
use rift_render::renderer::SceneRenderer;
use tracing::{error, info};

use crate::config::RenderSettings;
use crate::scene::SceneFile;

const FRAME_DT_SECONDS: f32 = 1.0 / 60.0;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut settings_path: Option<PathBuf> = None;
    let mut scene_path: Option<PathBuf> = None;
    let mut frames_override: Option<u32> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let Some(value) = args.next() else {
                    eprintln!("--settings expects a path argument");
                    return ExitCode::from(2);
                };
                settings_path = Some(PathBuf::from(value));
            }
            "--scene" => {
                let Some(value) = args.next() else {
                    eprintln!("--scene expects a path argument");
                    return ExitCode::from(2);
                };
                scene_path = Some(PathBuf::from(value));
            }
            "--frames" => {
                let Some(value) = args.next() else {
                    eprintln!("--frames expects a numeric argument");
                    return ExitCode::from(2);
                };
                match value.parse::<u32>() {
                    Ok(parsed) => frames_override = Some(parsed),
                    Err(err) => {
                        eprintln!("invalid frame count '{value}': {err}");
                        return ExitCode::from(2);
                    }
                }
            }
            "--help" | "-h" => {
                println!(
                    "Usage: rift_viewer [--settings <path>] [--scene <path>] [--frames <u32>]"
                );
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("unknown argument: {other}");
                return ExitCode::from(2);
            }
        }
    }

    let settings = match settings_path {
        Some(path) => match RenderSettings::load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                error!("could not load settings from {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => RenderSettings::default(),
    };

    let scene = match scene_path {
        Some(path) => match SceneFile::load(&path) {
            Ok(scene) => scene,
            Err(err) => {
                error!("could not load scene from {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SceneFile::demo(),
    };

    let world = scene.build_world();
    let camera = match scene.camera_pose() {
        Some(pose) => VirtualCamera::new(
            pose,
            settings.fovy_degrees.to_radians(),
            settings.width as f32 / settings.height.max(1) as f32,
            settings.near,
            settings.far,
        ),
        None => VirtualCamera::default(),
    };

    let assets = Assets::with_defaults();
    let mut device = SoftwareDevice::new(settings.width, settings.height);
    let mut renderer = SceneRenderer::new(settings.max_recursion_depth);
    let frames = frames_override.unwrap_or(settings.frames);

    info!(
        width = settings.width,
        height = settings.height,
        max_depth = settings.max_recursion_depth,
        entities = world.entities.len(),
        "rendering {frames} frame(s)"
    );

    for frame in 0..frames {
        match renderer.render(&mut device, &assets, &world, &camera, FRAME_DT_SECONDS) {
            Ok(stats) => {
                info!(
                    frame,
                    draws = stats.total_draw_calls(),
                    entity_draws = stats.entity_draw_calls,
                    player_draws = stats.player_draw_calls,
                    stencil_draws = stats.stencil_draws,
                    portal_surfaces = stats.portal_depth_draws,
                    culled = stats.culled_subtrees,
                    depth_limited = stats.depth_limited,
                    max_depth = stats.max_depth_reached(),
                    "frame complete"
                );
            }
            Err(err) => {
                error!("frame {frame} aborted: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    info!(
        draws = device.draws.len(),
        uploads = device.transform_uploads,
        "done"
    );
    ExitCode::SUCCESS
}
