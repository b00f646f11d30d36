use rift_shared::pose::Pose;

/// Mesh-plus-material capability of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawable {
    pub mesh: String,
    pub material: String,
}

/// Directed portal capability: the shape of the opening and the transform
/// whose viewpoint is shown through it. A mutually-linked pair is two
/// entities, each carrying the link for one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalLink {
    pub mesh: String,
    pub destination: Pose,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub pose: Pose,
    pub drawable: Option<Drawable>,
    pub portal: Option<PortalLink>,
}

impl Entity {
    pub fn drawable(name: &str, pose: Pose, mesh: &str, material: &str) -> Self {
        Self {
            name: name.to_string(),
            pose,
            drawable: Some(Drawable {
                mesh: mesh.to_string(),
                material: material.to_string(),
            }),
            portal: None,
        }
    }

    pub fn portal(name: &str, pose: Pose, mesh: &str, destination: Pose) -> Self {
        Self {
            name: name.to_string(),
            pose,
            drawable: None,
            portal: Some(PortalLink {
                mesh: mesh.to_string(),
                destination,
            }),
        }
    }

    pub fn role(&self) -> EntityRole<'_> {
        match (&self.drawable, &self.portal) {
            (Some(drawable), None) => EntityRole::Drawable(drawable),
            (None, Some(portal)) => EntityRole::Portal(portal),
            (Some(drawable), Some(portal)) => EntityRole::Both(drawable, portal),
            (None, None) => EntityRole::Inert,
        }
    }
}

/// Role of an entity in the current frame, evaluated once per entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRole<'a> {
    Drawable(&'a Drawable),
    Portal(&'a PortalLink),
    Both(&'a Drawable, &'a PortalLink),
    Inert,
}

#[derive(Debug, Default)]
pub struct World {
    pub entities: Vec<Entity>,
    pub player: Option<Pose>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: Entity) {
        self.entities.push(entity);
    }
}

/// Per-frame snapshot of entity roles, in world insertion order. Entities
/// carrying a portal capability are excluded from the plain draw list; their
/// surfaces are produced by the depth-only portal pass instead.
#[derive(Debug)]
pub struct FrameScene<'a> {
    pub drawables: Vec<(&'a Pose, &'a Drawable)>,
    pub portals: Vec<(&'a Pose, &'a PortalLink)>,
    pub player: Option<&'a Pose>,
}

impl<'a> FrameScene<'a> {
    pub fn capture(world: &'a World) -> Self {
        let mut drawables = Vec::new();
        let mut portals = Vec::new();
        for entity in &world.entities {
            match entity.role() {
                EntityRole::Drawable(drawable) => drawables.push((&entity.pose, drawable)),
                EntityRole::Portal(portal) => portals.push((&entity.pose, portal)),
                EntityRole::Both(_, portal) => portals.push((&entity.pose, portal)),
                EntityRole::Inert => {}
            }
        }
        Self {
            drawables,
            portals,
            player: world.player.as_ref(),
        }
    }
}
