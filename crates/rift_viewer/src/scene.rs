use std::fs;
use std::io;
use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use rift_render::world::{Entity, World};
use rift_shared::pose::Pose;
use serde::{Deserialize, Serialize};

/// Scene description: poses are position arrays plus yaw/pitch in degrees,
/// which keeps hand-written files readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub camera: Option<PoseDesc>,
    #[serde(default)]
    pub player: Option<PoseDesc>,
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDesc>,
    #[serde(default, rename = "portal")]
    pub portals: Vec<PortalDesc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDesc {
    pub position: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub scale: [f32; 3],
}

impl Default for PoseDesc {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            scale: [1.0; 3],
        }
    }
}

impl PoseDesc {
    pub fn to_pose(&self) -> Pose {
        let orientation = Quat::from_euler(
            EulerRot::YXZ,
            self.yaw_degrees.to_radians(),
            self.pitch_degrees.to_radians(),
            0.0,
        );
        Pose::new(Vec3::from_array(self.position), orientation)
            .with_scale(Vec3::from_array(self.scale))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDesc {
    pub name: String,
    pub mesh: String,
    pub material: String,
    #[serde(flatten)]
    pub pose: PoseDesc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalDesc {
    pub name: String,
    #[serde(default = "default_portal_mesh")]
    pub mesh: String,
    #[serde(flatten)]
    pub pose: PoseDesc,
    pub destination: PoseDesc,
}

fn default_portal_mesh() -> String {
    "portal_opening".to_string()
}

impl SceneFile {
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse scene: {}", e),
            )
        })
    }

    pub fn build_world(&self) -> World {
        let mut world = World::new();
        for desc in &self.entities {
            world.spawn(Entity::drawable(
                &desc.name,
                desc.pose.to_pose(),
                &desc.mesh,
                &desc.material,
            ));
        }
        for desc in &self.portals {
            world.spawn(Entity::portal(
                &desc.name,
                desc.pose.to_pose(),
                &desc.mesh,
                desc.destination.to_pose(),
            ));
        }
        world.player = self.player.as_ref().map(PoseDesc::to_pose);
        world
    }

    pub fn camera_pose(&self) -> Option<Pose> {
        self.camera.as_ref().map(PoseDesc::to_pose)
    }

    /// Built-in demo: two mutually linked doorways across a small room,
    /// with a crate visible through the far one.
    pub fn demo() -> Self {
        let front = PoseDesc {
            position: [0.0, 1.0, 0.0],
            ..PoseDesc::default()
        };
        let back = PoseDesc {
            position: [0.0, 1.0, -12.0],
            yaw_degrees: 180.0,
            ..PoseDesc::default()
        };
        Self {
            camera: Some(PoseDesc {
                position: [0.0, 1.6, 5.0],
                ..PoseDesc::default()
            }),
            player: Some(PoseDesc {
                position: [0.0, 0.9, 5.0],
                ..PoseDesc::default()
            }),
            entities: vec![
                EntityDesc {
                    name: "floor".to_string(),
                    mesh: "cube".to_string(),
                    material: "concrete".to_string(),
                    pose: PoseDesc {
                        position: [0.0, -0.05, -4.0],
                        scale: [16.0, 0.1, 24.0],
                        ..PoseDesc::default()
                    },
                },
                EntityDesc {
                    name: "crate".to_string(),
                    mesh: "cube".to_string(),
                    material: "metal_tiles".to_string(),
                    pose: PoseDesc {
                        position: [0.0, 0.5, -14.0],
                        yaw_degrees: 30.0,
                        ..PoseDesc::default()
                    },
                },
            ],
            portals: vec![
                PortalDesc {
                    name: "front".to_string(),
                    mesh: default_portal_mesh(),
                    pose: front.clone(),
                    destination: back.clone(),
                },
                PortalDesc {
                    name: "back".to_string(),
                    mesh: default_portal_mesh(),
                    pose: back,
                    destination: front,
                },
            ],
        }
    }
}
