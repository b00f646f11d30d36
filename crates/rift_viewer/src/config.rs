use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Viewer render settings, loaded from a TOML file next to the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fovy_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub max_recursion_depth: usize,
    pub frames: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            fovy_degrees: 70.0,
            near: 0.1,
            far: 1000.0,
            max_recursion_depth: 4,
            frames: 3,
        }
    }
}

impl RenderSettings {
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse render settings: {}", e),
            )
        })
    }
}
