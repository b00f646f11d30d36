use std::fmt;
use std::sync::Arc;

use rift_shared::mesh::Mesh;
use rustc_hash::FxHashMap;

pub const FLAT_FILL_SHADER: &str = "whitefill";
pub const DEFAULT_SHADER: &str = "diffuse";
pub const PLAYER_TOKEN_MESH: &str = "player_token";
pub const PLAYER_TOKEN_MATERIAL: &str = "player_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    pub texture: Option<String>,
}

/// A missing asset is a load-time contract violation, never a runtime
/// condition; the frame that hits one is aborted.
#[derive(Debug)]
pub enum AssetError {
    MissingShader { name: String },
    MissingMesh { name: String },
    MissingMaterial { name: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::MissingShader { name } => {
                write!(f, "shader '{name}' is not registered")
            }
            AssetError::MissingMesh { name } => {
                write!(f, "mesh '{name}' is not registered")
            }
            AssetError::MissingMaterial { name } => {
                write!(f, "material '{name}' is not registered")
            }
        }
    }
}

impl std::error::Error for AssetError {}

/// In-memory registries resolving symbolic names to loaded assets.
#[derive(Debug, Default)]
pub struct Assets {
    shaders: FxHashMap<String, Shader>,
    meshes: FxHashMap<String, Arc<Mesh>>,
    materials: FxHashMap<String, Material>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the shaders, silhouette meshes, and
    /// materials the renderer itself depends on.
    pub fn with_defaults() -> Self {
        let mut assets = Self::new();
        assets.register_shader(FLAT_FILL_SHADER);
        assets.register_shader(DEFAULT_SHADER);
        assets.register_shader("metal");
        assets.register_mesh("portal_opening", Mesh::unit_quad());
        assets.register_mesh("cube", Mesh::unit_cube());
        assets.register_mesh(PLAYER_TOKEN_MESH, Mesh::unit_cube());
        assets.register_material("concrete", None);
        assets.register_material("metal_tiles", Some("metal_tiles.png"));
        assets.register_material(PLAYER_TOKEN_MATERIAL, Some("player_token.png"));
        assets
    }

    pub fn register_shader(&mut self, name: &str) {
        self.shaders.insert(
            name.to_string(),
            Shader {
                name: name.to_string(),
            },
        );
    }

    pub fn register_mesh(&mut self, name: &str, mesh: Mesh) {
        self.meshes.insert(name.to_string(), Arc::new(mesh));
    }

    pub fn register_material(&mut self, name: &str, texture: Option<&str>) {
        self.materials.insert(
            name.to_string(),
            Material {
                name: name.to_string(),
                texture: texture.map(str::to_string),
            },
        );
    }

    pub fn shader(&self, name: &str) -> Result<&Shader, AssetError> {
        self.shaders.get(name).ok_or_else(|| AssetError::MissingShader {
            name: name.to_string(),
        })
    }

    pub fn mesh(&self, name: &str) -> Result<&Arc<Mesh>, AssetError> {
        self.meshes.get(name).ok_or_else(|| AssetError::MissingMesh {
            name: name.to_string(),
        })
    }

    pub fn material(&self, name: &str) -> Result<&Material, AssetError> {
        self.materials.get(name).ok_or_else(|| AssetError::MissingMaterial {
            name: name.to_string(),
        })
    }
}
