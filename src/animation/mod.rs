/// Explosion effect module
///
/// This module handles the pooled primitives of the exploder effect:
/// launch directions, the closed-form trajectory and the start/stop
/// lifecycle. The engine side is reached only through `ExploderHost`.

pub mod config;
pub mod exploder;
pub mod host;
pub mod trajectory;

pub use config::{DirectionMode, ExploderConfig};
pub use exploder::{Exploder, FrameOutcome, Particle, Reinitialize, StartOutcome};
pub use host::{ExploderHost, PrimitiveKind};
