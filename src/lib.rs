use godot::prelude::*;

pub mod animation;
pub mod error;
mod exploder_node;
mod logging;

pub use animation::{Exploder, ExploderConfig, ExploderHost};
pub use error::{ExploderError, HostError, Result};

struct ExploderExtension;

#[gdextension]
unsafe impl ExtensionLibrary for ExploderExtension {
    fn on_level_init(level: InitLevel) {
        if level == InitLevel::Scene {
            logging::install();
            godot_print!("Exploder v0.1.0 - GDExtension loaded successfully!");
        }
    }
}
