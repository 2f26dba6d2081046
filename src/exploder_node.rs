use glam::Vec3;
use godot::classes::{BoxMesh, INode3D, MeshInstance3D, Node3D, SphereMesh};
use godot::prelude::*;

use crate::animation::config::{pool_size_from_signed, pool_size_to_signed};
use crate::animation::{
    DirectionMode, Exploder, ExploderConfig, ExploderHost, FrameOutcome, PrimitiveKind,
    Reinitialize, StartOutcome,
};
use crate::error::{HostError, Result};

fn to_godot(v: Vec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

fn from_godot(v: Vector3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Scene tree backed host: one MeshInstance3D child per particle
pub struct GodotHost {
    owner: Gd<Node3D>,
}

impl GodotHost {
    pub fn new(owner: Gd<Node3D>) -> Self {
        Self { owner }
    }
}

impl ExploderHost for GodotHost {
    type Handle = Gd<MeshInstance3D>;

    fn create_renderable(&mut self, kind: PrimitiveKind) -> std::result::Result<Self::Handle, HostError> {
        if !self.owner.is_instance_valid() {
            return Err(HostError::CreationFailed {
                kind,
                reason: "owner node was freed".to_string(),
            });
        }

        let mut instance = MeshInstance3D::new_alloc();
        match kind {
            PrimitiveKind::Cube => instance.set_mesh(&BoxMesh::new_gd()),
            PrimitiveKind::Sphere => instance.set_mesh(&SphereMesh::new_gd()),
        }
        Ok(instance)
    }

    fn set_parent(&mut self, handle: &Self::Handle) {
        self.owner.add_child(handle);
    }

    fn set_visible(&mut self, handle: &Self::Handle, visible: bool) {
        let mut instance = handle.clone();
        instance.set_visible(visible);
    }

    fn set_position(&mut self, handle: &Self::Handle, position: Vec3) {
        let mut instance = handle.clone();
        instance.set_global_position(to_godot(position));
    }

    fn owner_position(&self) -> Vec3 {
        from_godot(self.owner.get_global_position())
    }
}

/// Explosion effect node
///
/// Spawns `pool_size` primitives as children and throws them outward when
/// `start_animation` is called. The children hide again after `reset_time`
/// seconds and `animation_finished` is emitted.
///
/// Usage in GDScript:
/// ```gdscript
/// if not $Exploder3D.is_playing():
///     $Exploder3D.start_animation(2.0)
/// ```
#[derive(GodotClass)]
#[class(base=Node3D)]
pub struct Exploder3D {
    #[export]
    pool_size: i32,
    #[export]
    gravity: f32,
    #[export]
    speed: f32,
    #[export]
    impulse: f32,
    #[export]
    vertical_min: f32,
    #[export]
    vertical_max: f32,
    #[export(enum = (Simple = 0, Radial = 1, Static = 2))]
    direction_mode: i32,
    #[export]
    legacy_angles: bool,
    #[export]
    use_spheres: bool,
    /// Build the pool in `ready` instead of on the first start
    #[export]
    auto_initialize: bool,

    exploder: Option<Exploder<GodotHost>>,
    base: Base<Node3D>,
}

#[godot_api]
impl INode3D for Exploder3D {
    fn init(base: Base<Node3D>) -> Self {
        let defaults = ExploderConfig::default();
        let mut node = Self {
            pool_size: 0,
            gravity: 0.0,
            speed: 0.0,
            impulse: 0.0,
            vertical_min: 0.0,
            vertical_max: 0.0,
            direction_mode: 0,
            legacy_angles: false,
            use_spheres: false,
            auto_initialize: true,
            exploder: None,
            base,
        };
        if let Err(err) = node.write_config(&defaults) {
            log::error!("[EXPLODER] Cannot apply default config: {}", err);
        }
        node
    }

    fn ready(&mut self) {
        if !self.auto_initialize {
            return;
        }
        let result = self.exploder_mut().and_then(|exploder| exploder.initialize());
        if let Err(err) = result {
            log::error!("[EXPLODER] Cannot initialize pool: {}", err);
        }
    }

    fn process(&mut self, delta: f64) {
        let Some(exploder) = self.exploder.as_mut() else {
            return;
        };
        let outcome = exploder.update(delta as f32);
        if outcome == FrameOutcome::Finished {
            self.base_mut().emit_signal("animation_finished", &[]);
        }
    }
}

#[godot_api]
impl Exploder3D {
    /// Emitted when the pool hides, on expiry or on `stop_animation`
    #[signal]
    fn animation_finished();

    /// Start the animation (if it's not started yet)
    /// Returns true only when a new animation began
    #[func]
    pub fn start_animation(&mut self, reset_time: f32) -> bool {
        self.start(reset_time, Reinitialize::No)
    }

    /// Same as `start_animation` but re-rolls every launch direction first
    #[func]
    pub fn start_animation_reinit(&mut self, reset_time: f32) -> bool {
        self.start(reset_time, Reinitialize::Yes)
    }

    /// Hide the pool now. Returns false if nothing was playing
    #[func]
    pub fn stop_animation(&mut self) -> bool {
        let stopped = self
            .exploder
            .as_mut()
            .map(|exploder| exploder.stop())
            .unwrap_or(false);
        if stopped {
            self.base_mut().emit_signal("animation_finished", &[]);
        }
        stopped
    }

    /// If the animation is still playing
    #[func]
    pub fn is_playing(&self) -> bool {
        self.exploder
            .as_ref()
            .map(|exploder| exploder.is_playing())
            .unwrap_or(false)
    }

    /// Load settings from JSON, e.g. `{"pool_size": 64, "direction_mode": "radial"}`
    #[func]
    pub fn apply_config_json(&mut self, json: GString) -> bool {
        let config = match ExploderConfig::from_json(&json.to_string()) {
            Ok(config) => config,
            Err(err) => {
                log::error!("[EXPLODER] Rejected config: {}", err);
                return false;
            }
        };
        // Check that the size fits the inspector property before touching the pool
        if let Err(err) = pool_size_to_signed(config.pool_size) {
            log::error!("[EXPLODER] Rejected config: {}", err);
            return false;
        }
        if let Some(exploder) = self.exploder.as_mut() {
            if let Err(err) = exploder.set_config(config.clone()) {
                log::error!("[EXPLODER] Rejected config: {}", err);
                return false;
            }
        }
        self.write_config(&config).is_ok()
    }

    /// Current settings as JSON, empty on failure
    #[func]
    pub fn get_config_json(&self) -> GString {
        match self.read_config().and_then(|config| config.to_json()) {
            Ok(json) => GString::from(json),
            Err(err) => {
                log::warn!("[EXPLODER] Cannot serialize config: {}", err);
                GString::new()
            }
        }
    }
}

impl Exploder3D {
    fn start(&mut self, reset_time: f32, reinitialize: Reinitialize) -> bool {
        let result = self.read_config().and_then(|config| {
            let exploder = self.exploder_mut()?;
            if !exploder.is_playing() {
                // Inspector edits since the last run take effect on the next start
                exploder.apply_settings(config)?;
            }
            exploder.start_with(reset_time, reinitialize)
        });
        // Show the live pool size in the inspector once the pool exists
        if let Some(exploder) = self.exploder.as_ref().filter(|e| e.is_initialized()) {
            if let Ok(live) = pool_size_to_signed(exploder.particles().len()) {
                self.pool_size = live;
            }
        }
        match result {
            Ok(StartOutcome::Started) => true,
            Ok(StartOutcome::AlreadyPlaying) => false,
            Err(err) => {
                log::error!("[EXPLODER] Cannot start animation: {}", err);
                false
            }
        }
    }

    fn exploder_mut(&mut self) -> Result<&mut Exploder<GodotHost>> {
        let exploder = match self.exploder.take() {
            Some(exploder) => exploder,
            None => {
                let config = self.read_config()?;
                let host = GodotHost::new(self.to_gd().upcast::<Node3D>());
                Exploder::new(host, config)?
            }
        };
        Ok(self.exploder.insert(exploder))
    }

    fn read_config(&self) -> Result<ExploderConfig> {
        let direction_mode = match self.direction_mode {
            1 => DirectionMode::Radial,
            2 => DirectionMode::Static,
            _ => DirectionMode::Simple,
        };
        let primitive = if self.use_spheres {
            PrimitiveKind::Sphere
        } else {
            PrimitiveKind::Cube
        };
        let config = ExploderConfig {
            pool_size: pool_size_from_signed(self.pool_size.into())?,
            gravity: self.gravity,
            speed: self.speed,
            impulse: self.impulse,
            vertical_spread: [self.vertical_min, self.vertical_max],
            direction_mode,
            legacy_angles: self.legacy_angles,
            primitive,
        };
        config.validate()?;
        Ok(config)
    }

    fn write_config(&mut self, config: &ExploderConfig) -> Result<()> {
        self.pool_size = pool_size_to_signed(config.pool_size)?;
        self.gravity = config.gravity;
        self.speed = config.speed;
        self.impulse = config.impulse;
        self.vertical_min = config.vertical_spread[0];
        self.vertical_max = config.vertical_spread[1];
        self.direction_mode = match config.direction_mode {
            DirectionMode::Simple => 0,
            DirectionMode::Radial => 1,
            DirectionMode::Static => 2,
        };
        self.legacy_angles = config.legacy_angles;
        self.use_spheres = config.primitive == PrimitiveKind::Sphere;
        Ok(())
    }
}
