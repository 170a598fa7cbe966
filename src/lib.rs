pub mod agent;
pub mod config;
pub mod error;
pub mod flock;
pub mod math;
pub mod render;
pub mod schedule;
pub mod target;

#[cfg(target_arch = "wasm32")]
pub mod host;

use glam::Vec2;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;

use crate::agent::{Agent, Pose, Viewport};
use crate::config::{FlockConfig, FlockVariant};
use crate::error::ConfigError;
use crate::flock::FlockSimulation;
use crate::target::TargetPolicy;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[wasm_bindgen]
pub struct Sim {
    flock: FlockSimulation,
    policy: TargetPolicy,
    rng: StdRng,
    render_buffer: Vec<f32>,
    disposed: bool,
}

#[wasm_bindgen]
impl Sim {
    /// `variant` is 0 for pointer-following fish and 1 for ambient wanderers.
    #[wasm_bindgen(constructor)]
    pub fn new(
        count: usize,
        seed: Option<u32>,
        width: f32,
        height: f32,
        variant: u32,
        now_ms: f64,
    ) -> Sim {
        let variant = FlockVariant::from_u32(variant);
        Self::spawn(
            count,
            seed.map(u64::from),
            Viewport::new(width, height),
            variant,
            now_ms,
            variant.default_config(),
        )
    }

    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(
        count: usize,
        seed: Option<u32>,
        width: f32,
        height: f32,
        variant: u32,
        now_ms: f64,
        config: JsValue,
    ) -> Result<Sim, JsError> {
        let config: FlockConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;
        let sim = Self::from_config(
            count,
            seed.map(u64::from),
            Viewport::new(width, height),
            FlockVariant::from_u32(variant),
            now_ms,
            config,
        )?;
        Ok(sim)
    }

    pub fn step(&mut self, now_ms: f64) {
        self.tick(now_ms);
    }

    pub fn poses(&self) -> Vec<f32> {
        self.render_buffer.clone()
    }

    #[wasm_bindgen(js_name = poseObjects)]
    pub fn pose_objects(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(self.flock.poses())?)
    }

    #[wasm_bindgen(js_name = posesPtr)]
    pub fn poses_ptr(&self) -> *const f32 {
        self.render_buffer.as_ptr()
    }

    #[wasm_bindgen(js_name = posesLen)]
    pub fn poses_len(&self) -> usize {
        self.render_buffer.len()
    }

    pub fn transform(&self, index: usize) -> Option<String> {
        self.flock.poses().get(index).map(render::css_transform)
    }

    /// Pointer position in viewport pixels. Returns `false` if the event was ignored.
    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32, now_ms: f64) -> bool {
        if self.disposed {
            return false;
        }
        self.policy
            .on_pointer_move(Vec2::new(x, y), now_ms, &mut self.flock)
    }

    #[wasm_bindgen(js_name = isPointerMoving)]
    pub fn is_pointer_moving(&self, now_ms: f64) -> bool {
        self.policy.is_pointer_moving(now_ms)
    }

    #[wasm_bindgen(js_name = setBounds)]
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.flock.set_viewport(Viewport::new(width, height));
    }

    pub fn count(&self) -> usize {
        self.flock.len()
    }

    pub fn variant(&self) -> u32 {
        self.policy.variant().as_u32()
    }

    /// Stops the simulation; later steps and pointer events are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.flock.clear();
        self.render_buffer.clear();
        info!(variant = ?self.policy.variant(), "flock disposed");
    }

    #[wasm_bindgen(js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Sim {
    pub fn from_config(
        count: usize,
        seed: Option<u64>,
        viewport: Viewport,
        variant: FlockVariant,
        now_ms: f64,
        config: FlockConfig,
    ) -> Result<Sim, ConfigError> {
        config.validate()?;
        Ok(Self::spawn(count, seed, viewport, variant, now_ms, config))
    }

    fn spawn(
        count: usize,
        seed: Option<u64>,
        viewport: Viewport,
        variant: FlockVariant,
        now_ms: f64,
        config: FlockConfig,
    ) -> Sim {
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(entropy_seed));
        let policy = TargetPolicy::for_variant(variant, viewport, now_ms);

        let agents: Vec<Agent> = (0..count)
            .map(|_| {
                let target = policy.initial_target(viewport, &mut rng);
                Agent::spawn(&mut rng, &config, viewport, target)
            })
            .collect();

        info!(
            fish = count,
            ?variant,
            width = viewport.width,
            height = viewport.height,
            "flock created"
        );

        let mut sim = Sim {
            flock: FlockSimulation::new(agents, viewport, config),
            policy,
            rng,
            render_buffer: Vec::with_capacity(count * 3),
            disposed: false,
        };
        sim.sync_render_buffer();
        sim
    }

    pub fn tick(&mut self, now_ms: f64) -> &[Pose] {
        if !self.disposed {
            self.policy.advance(now_ms, &mut self.flock, &mut self.rng);
            self.flock.step();
            self.sync_render_buffer();
        }
        self.flock.poses()
    }

    pub fn flock(&self) -> &FlockSimulation {
        &self.flock
    }

    fn sync_render_buffer(&mut self) {
        render::pack_poses(self.flock.poses(), &mut self.render_buffer);
    }
}

const FALLBACK_SEED: u64 = 0x5eed_f15e;

fn entropy_seed() -> u64 {
    match getrandom::u64() {
        Ok(seed) => seed,
        Err(err) => {
            warn!(%err, "entropy unavailable, falling back to a fixed seed");
            FALLBACK_SEED
        }
    }
}
