use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::ExploderConfig;
use super::host::ExploderHost;
use super::trajectory;
use crate::error::{ExploderError, Result};

/// One pooled primitive and its trajectory parameters
#[derive(Clone, Debug)]
pub struct Particle<H> {
    /// Host renderable, owned by the host
    pub handle: H,
    /// Emission origin
    pub original_position: Vec3,
    /// Launch direction, unit length unless the mode is static
    pub direction: Vec3,
}

/// Whether `start` rebuilds the launch directions first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reinitialize {
    #[default]
    No,
    Yes,
}

/// Result of a start request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The request was ignored, nothing changed
    AlreadyPlaying,
}

/// What a frame update did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not playing, no work done
    Idle,
    /// Positions were pushed to the host
    Animating,
    /// The reset time was reached this frame and the pool is hidden
    Finished,
}

/// Explosion effect driven by a per-frame clock
///
/// Owns a fixed pool of host renderables. `start` shows the pool and resets
/// the clock, every `update` moves the particles along their ballistic arcs,
/// and the pool hides itself once the reset time has elapsed.
pub struct Exploder<H: ExploderHost> {
    host: H,
    config: ExploderConfig,
    particles: Vec<Particle<H::Handle>>,
    initialized: bool,
    elapsed: f32,
    reset_time: f32,
    playing: bool,
    rng: StdRng,
}

impl<H: ExploderHost> Exploder<H> {
    /// Create an exploder; the pool is built on `initialize` or on the first start
    pub fn new(host: H, config: ExploderConfig) -> Result<Self> {
        Self::with_rng(host, config, StdRng::from_os_rng())
    }

    /// Create an exploder with a caller supplied random source
    pub fn with_rng(host: H, config: ExploderConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            host,
            config,
            particles: Vec::new(),
            initialized: false,
            elapsed: 0.0,
            reset_time: 0.0,
            playing: false,
            rng,
        })
    }

    /// Allocate the pool. Calling it again on a live pool re-initializes it
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            self.reinitialize();
            return Ok(());
        }

        let origin = self.host.owner_position();
        let pool_size = self.config.pool_size;
        let mut particles = Vec::with_capacity(pool_size);

        for i in 0..pool_size {
            let handle = self.host.create_renderable(self.config.primitive).map_err(|err| {
                log::error!(
                    "[EXPLODER] Failed to create particle {}/{}: {}",
                    i + 1,
                    pool_size,
                    err
                );
                err
            })?;
            self.host.set_parent(&handle);
            self.host.set_visible(&handle, false);

            let direction = trajectory::launch_direction(&self.config, i, &mut self.rng);
            particles.push(Particle {
                handle,
                original_position: origin,
                direction,
            });
        }

        self.particles = particles;
        self.initialized = true;
        log::info!(
            "[EXPLODER] Initialized {} particles at {:?} ({:?})",
            pool_size,
            origin,
            self.config.direction_mode
        );
        Ok(())
    }

    /// Recompute origin and directions in place, keeping the renderables
    pub fn reinitialize(&mut self) {
        let origin = self.host.owner_position();
        for (i, particle) in self.particles.iter_mut().enumerate() {
            particle.original_position = origin;
            particle.direction = trajectory::launch_direction(&self.config, i, &mut self.rng);
        }
        log::debug!("[EXPLODER] Re-initialized {} particles", self.particles.len());
    }

    /// Start the animation unless it is already playing
    pub fn start(&mut self, duration: f32) -> Result<StartOutcome> {
        self.start_with(duration, Reinitialize::No)
    }

    pub fn start_with(&mut self, duration: f32, reinitialize: Reinitialize) -> Result<StartOutcome> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ExploderError::InvalidArgument(format!(
                "duration must be a positive number of seconds, got {}",
                duration
            )));
        }

        if self.playing {
            log::debug!("[EXPLODER] Start ignored, animation already playing");
            return Ok(StartOutcome::AlreadyPlaying);
        }

        if !self.initialized {
            self.initialize()?;
        } else if reinitialize == Reinitialize::Yes {
            self.reinitialize();
        }

        self.elapsed = 0.0;
        self.reset_time = duration;
        self.playing = true;
        self.set_pool_visible(true);

        log::debug!(
            "[EXPLODER] Started {} particles for {}s",
            self.particles.len(),
            duration
        );
        Ok(StartOutcome::Started)
    }

    /// Hide the pool immediately. Returns false when nothing was playing
    pub fn stop(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        self.playing = false;
        self.set_pool_visible(false);
        log::debug!("[EXPLODER] Stopped after {}s", self.elapsed);
        true
    }

    /// Advance the clock by `dt` seconds and move the pool
    pub fn update(&mut self, dt: f32) -> FrameOutcome {
        if !self.playing {
            return FrameOutcome::Idle;
        }

        // NaN and negative deltas must not rewind the clock
        self.elapsed += dt.max(0.0);

        if self.elapsed >= self.reset_time {
            self.playing = false;
            self.set_pool_visible(false);
            log::debug!("[EXPLODER] Finished after {}s", self.elapsed);
            return FrameOutcome::Finished;
        }

        let t = self.elapsed;
        for particle in &self.particles {
            let position = trajectory::position_at(
                &self.config,
                particle.original_position,
                particle.direction,
                t,
            );
            self.host.set_position(&particle.handle, position);
        }
        FrameOutcome::Animating
    }

    /// Replace the configuration. The pool size is locked once the pool exists
    pub fn set_config(&mut self, config: ExploderConfig) -> Result<()> {
        config.validate()?;
        if self.initialized && config.pool_size != self.particles.len() {
            return Err(ExploderError::AlreadyInitialized {
                allocated: self.particles.len(),
                requested: config.pool_size,
            });
        }
        let rebuild = self.initialized && !self.config.same_launch_distribution(&config);
        self.config = config;
        if rebuild {
            // Directions derived from the old distribution are stale
            self.reinitialize();
        }
        Ok(())
    }

    /// Replace the configuration, keeping the allocated pool size if there is one
    pub fn apply_settings(&mut self, mut config: ExploderConfig) -> Result<()> {
        if self.initialized && config.pool_size != self.particles.len() {
            log::warn!(
                "[EXPLODER] Pool size {} ignored, pool already holds {} particles",
                config.pool_size,
                self.particles.len()
            );
            config.pool_size = self.particles.len();
        }
        self.set_config(config)
    }

    /// Current formula position of particle `index`
    pub fn position_at(&self, index: usize) -> Option<Vec3> {
        self.particles.get(index).map(|particle| {
            trajectory::position_at(
                &self.config,
                particle.original_position,
                particle.direction,
                self.elapsed,
            )
        })
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seconds since the last successful start
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn reset_time(&self) -> f32 {
        self.reset_time
    }

    pub fn particles(&self) -> &[Particle<H::Handle>] {
        &self.particles
    }

    pub fn config(&self) -> &ExploderConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn set_pool_visible(&mut self, visible: bool) {
        for particle in &self.particles {
            self.host.set_visible(&particle.handle, visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::config::DirectionMode;
    use crate::animation::host::mock::MockHost;
    use crate::animation::host::PrimitiveKind;
    use crate::error::HostError;

    fn config(mode: DirectionMode, pool_size: usize) -> ExploderConfig {
        ExploderConfig {
            pool_size,
            direction_mode: mode,
            ..ExploderConfig::default()
        }
    }

    fn exploder(host: MockHost, config: ExploderConfig) -> Exploder<MockHost> {
        Exploder::with_rng(host, config, StdRng::seed_from_u64(42)).expect("valid config")
    }

    #[test]
    fn initialize_builds_hidden_pool_of_requested_size() {
        for pool_size in [0, 1, 7, 64] {
            for mode in [DirectionMode::Simple, DirectionMode::Radial, DirectionMode::Static] {
                let origin = Vec3::new(1.0, 2.0, 3.0);
                let mut exploder = exploder(MockHost::at(origin), config(mode, pool_size));
                exploder.initialize().unwrap();

                assert_eq!(exploder.particles().len(), pool_size);
                assert_eq!(exploder.host().renderables.len(), pool_size);
                assert!(exploder.host().all_hidden());
                assert!(exploder.host().renderables.iter().all(|r| r.parented));
                for particle in exploder.particles() {
                    assert_eq!(particle.original_position, origin);
                    match mode {
                        DirectionMode::Static => assert_eq!(particle.direction, Vec3::ZERO),
                        _ => assert!(particle.direction.length() > 0.0),
                    }
                }
            }
        }
    }

    #[test]
    fn primitive_kind_is_forwarded_to_host() {
        let mut config = config(DirectionMode::Simple, 3);
        config.primitive = PrimitiveKind::Sphere;
        let mut exploder = exploder(MockHost::default(), config);
        exploder.initialize().unwrap();

        assert!(exploder
            .host()
            .renderables
            .iter()
            .all(|r| r.kind == PrimitiveKind::Sphere));
    }

    #[test]
    fn host_failure_aborts_initialization() {
        let host = MockHost {
            fail_at: Some(2),
            ..MockHost::default()
        };
        let mut exploder = exploder(host, config(DirectionMode::Radial, 5));

        let err = exploder.initialize().unwrap_err();
        assert!(matches!(err, ExploderError::Host(HostError::CreationFailed { .. })));
        assert!(!exploder.is_initialized());
        assert!(exploder.particles().is_empty());

        let err = exploder.start(1.0).unwrap_err();
        assert!(matches!(err, ExploderError::Host(_)));
        assert!(!exploder.is_playing());
    }

    #[test]
    fn first_start_initializes_lazily_and_shows_pool() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 4));
        assert!(!exploder.is_initialized());

        assert_eq!(exploder.start(2.0).unwrap(), StartOutcome::Started);
        assert!(exploder.is_initialized());
        assert!(exploder.is_playing());
        assert_eq!(exploder.elapsed(), 0.0);
        assert_eq!(exploder.reset_time(), 2.0);
        assert!(exploder.host().all_visible());
    }

    #[test]
    fn start_while_playing_changes_nothing() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 6));
        exploder.start(3.0).unwrap();
        exploder.update(0.5);
        let directions: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();

        let outcome = exploder.start_with(10.0, Reinitialize::Yes).unwrap();

        assert_eq!(outcome, StartOutcome::AlreadyPlaying);
        assert_eq!(exploder.elapsed(), 0.5);
        assert_eq!(exploder.reset_time(), 3.0);
        let after: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();
        assert_eq!(directions, after);
    }

    #[test]
    fn invalid_durations_are_rejected() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 2));
        for duration in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                exploder.start(duration),
                Err(ExploderError::InvalidArgument(_))
            ));
        }
        assert!(!exploder.is_playing());
        assert!(!exploder.is_initialized());
    }

    #[test]
    fn update_moves_particles_along_formula() {
        let mut config = config(DirectionMode::Simple, 3);
        config.gravity = -10.0;
        config.speed = 5.0;
        let mut exploder = exploder(MockHost::default(), config);
        exploder.start(5.0).unwrap();

        assert_eq!(exploder.update(0.25), FrameOutcome::Animating);
        assert_eq!(exploder.update(0.75), FrameOutcome::Animating);

        for (i, particle) in exploder.particles().iter().enumerate() {
            let expected = particle.direction * 5.0 + Vec3::new(0.0, -5.0, 0.0);
            let actual = exploder.host().renderables[particle.handle].position;
            assert!(actual.abs_diff_eq(expected, 1e-5), "particle {}", i);
            assert_eq!(exploder.position_at(i), Some(actual));
        }
    }

    #[test]
    fn static_particles_stay_at_origin() {
        let origin = Vec3::new(-4.0, 1.0, 9.0);
        let mut exploder = exploder(MockHost::at(origin), config(DirectionMode::Static, 5));
        exploder.start(1.0).unwrap();
        exploder.update(0.4);
        exploder.update(0.4);

        assert!(exploder.host().renderables.iter().all(|r| r.position == origin));
    }

    #[test]
    fn expiry_hides_pool_without_moving_it() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 4));
        exploder.start(1.0).unwrap();
        exploder.update(0.5);
        let writes = exploder.host().position_writes;

        assert_eq!(exploder.update(0.5), FrameOutcome::Finished);
        assert!(!exploder.is_playing());
        assert!(exploder.host().all_hidden());
        assert_eq!(exploder.host().position_writes, writes);

        assert_eq!(exploder.update(0.5), FrameOutcome::Idle);
        assert_eq!(exploder.host().position_writes, writes);
    }

    #[test]
    fn playing_until_deltas_reach_duration() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 2));
        exploder.start(1.0).unwrap();
        for _ in 0..3 {
            exploder.update(0.25);
        }
        assert!(exploder.is_playing());

        exploder.update(0.3);
        assert!(!exploder.is_playing());
    }

    #[test]
    fn negative_delta_does_not_rewind() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 1));
        exploder.start(2.0).unwrap();
        exploder.update(0.5);
        exploder.update(-0.3);
        exploder.update(f32::NAN);

        assert_eq!(exploder.elapsed(), 0.5);
        assert!(exploder.is_playing());
    }

    #[test]
    fn restart_after_finish_resets_clock() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 3));
        exploder.start(0.5).unwrap();
        exploder.update(0.6);
        assert!(!exploder.is_playing());

        assert_eq!(exploder.start(4.0).unwrap(), StartOutcome::Started);
        assert_eq!(exploder.elapsed(), 0.0);
        assert_eq!(exploder.reset_time(), 4.0);
        assert!(exploder.host().all_visible());
        // Renderables are reused
        assert_eq!(exploder.host().renderables.len(), 3);
    }

    #[test]
    fn reinitialize_on_start_rerolls_directions_and_origin() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 8));
        exploder.initialize().unwrap();
        let before: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();

        let moved = Vec3::new(10.0, 0.0, -10.0);
        exploder.host_mut().origin = moved;
        exploder.start_with(1.0, Reinitialize::Yes).unwrap();

        let after: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();
        assert_ne!(before, after);
        assert_eq!(exploder.host().renderables.len(), 8);
        assert!(exploder.particles().iter().all(|p| p.original_position == moved));
    }

    #[test]
    fn start_without_reinitialize_keeps_directions() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 8));
        exploder.initialize().unwrap();
        let before: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();

        exploder.start(1.0).unwrap();

        let after: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn stop_hides_pool_immediately() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 5));
        assert!(!exploder.stop());

        exploder.start(10.0).unwrap();
        exploder.update(0.1);
        assert!(exploder.stop());

        assert!(!exploder.is_playing());
        assert!(exploder.host().all_hidden());
        assert_eq!(exploder.update(0.1), FrameOutcome::Idle);
        assert!(!exploder.stop());
    }

    #[test]
    fn empty_pool_still_runs_lifecycle() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 0));
        assert_eq!(exploder.start(0.5).unwrap(), StartOutcome::Started);
        assert_eq!(exploder.update(0.25), FrameOutcome::Animating);
        assert_eq!(exploder.update(0.25), FrameOutcome::Finished);
        assert!(exploder.host().renderables.is_empty());
    }

    #[test]
    fn pool_size_is_locked_after_allocation() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 4));
        exploder.initialize().unwrap();

        let err = exploder
            .set_config(config(DirectionMode::Radial, 6))
            .unwrap_err();
        assert!(matches!(
            err,
            ExploderError::AlreadyInitialized { allocated: 4, requested: 6 }
        ));

        exploder.set_config(config(DirectionMode::Radial, 4)).unwrap();
        assert_eq!(exploder.config().direction_mode, DirectionMode::Radial);
    }

    #[test]
    fn apply_settings_pins_allocated_pool_size() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 4));
        exploder.initialize().unwrap();

        let mut edited = config(DirectionMode::Simple, 9);
        edited.speed = 6.0;
        exploder.apply_settings(edited).unwrap();

        assert_eq!(exploder.config().pool_size, 4);
        assert_eq!(exploder.config().speed, 6.0);
        assert_eq!(exploder.start(1.0).unwrap(), StartOutcome::Started);
        assert_eq!(exploder.host().renderables.len(), 4);
    }

    #[test]
    fn apply_settings_before_allocation_takes_new_size() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Simple, 4));
        exploder.apply_settings(config(DirectionMode::Simple, 9)).unwrap();
        exploder.initialize().unwrap();
        assert_eq!(exploder.particles().len(), 9);
    }

    #[test]
    fn switching_mode_rerolls_directions() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Static, 4));
        exploder.initialize().unwrap();
        assert!(exploder.particles().iter().all(|p| p.direction == Vec3::ZERO));

        exploder.set_config(config(DirectionMode::Radial, 4)).unwrap();
        exploder.start(2.0).unwrap();
        exploder.update(0.5);

        for (i, particle) in exploder.particles().iter().enumerate() {
            assert!(particle.direction.length() > 0.0, "particle {} has no direction", i);
            // A pure gravity drop would leave no horizontal travel
            let moved = exploder.host().renderables[particle.handle].position;
            assert!((moved * Vec3::new(1.0, 0.0, 1.0)).length() > 0.1, "particle {}", i);
        }
    }

    #[test]
    fn physics_only_change_keeps_directions() {
        let mut exploder = exploder(MockHost::default(), config(DirectionMode::Radial, 6));
        exploder.initialize().unwrap();
        let before: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();

        let mut tweaked = config(DirectionMode::Radial, 6);
        tweaked.gravity = -20.0;
        tweaked.speed = 8.0;
        exploder.set_config(tweaked).unwrap();

        let after: Vec<Vec3> = exploder.particles().iter().map(|p| p.direction).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn overflowing_spread_is_rejected_at_construction() {
        let mut config = config(DirectionMode::Radial, 2);
        config.vertical_spread = [-f32::MAX, f32::MAX];
        let result = Exploder::with_rng(MockHost::default(), config, StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(ExploderError::InvalidArgument(_))));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = config(DirectionMode::Radial, 2);
        config.vertical_spread = [5.0, 1.0];
        let result = Exploder::with_rng(MockHost::default(), config, StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(ExploderError::InvalidArgument(_))));
    }
}
