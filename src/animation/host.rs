use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Shape of the primitive the host instantiates for each particle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    #[default]
    Cube,
    Sphere,
}

/// Object API of the engine that owns the renderables.
///
/// The exploder never creates or destroys scene objects itself. It asks the
/// host for one renderable per particle and afterwards only toggles
/// visibility and moves them. Handles stay owned by the host; the host must
/// not free a handle while the exploder still holds it.
pub trait ExploderHost {
    /// Opaque reference to a host renderable
    type Handle;

    /// Allocate a visual primitive
    fn create_renderable(&mut self, kind: PrimitiveKind) -> Result<Self::Handle, HostError>;

    /// Attach a renderable under the effect's owning object
    fn set_parent(&mut self, handle: &Self::Handle);

    fn set_visible(&mut self, handle: &Self::Handle, visible: bool);

    fn set_position(&mut self, handle: &Self::Handle, position: Vec3);

    /// Emission origin, read when the pool is (re)initialized
    fn owner_position(&self) -> Vec3;
}
