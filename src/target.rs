use glam::Vec2;
use rand::Rng;
use tracing::{debug, warn};

use crate::agent::Viewport;
use crate::config::{FlockVariant, DEFAULT_POINTER_IDLE_MS, DEFAULT_RETARGET_PERIOD_MS};
use crate::flock::FlockSimulation;
use crate::schedule::{Interval, TrailingTimeout};

#[derive(Clone, Debug)]
pub struct PointerFollow {
    pointer: Vec2,
    moving: TrailingTimeout,
}

impl PointerFollow {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            pointer: viewport.center(),
            moving: TrailingTimeout::new(DEFAULT_POINTER_IDLE_MS),
        }
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn on_pointer_move(
        &mut self,
        pointer: Vec2,
        now_ms: f64,
        flock: &mut FlockSimulation,
    ) -> bool {
        if !pointer.is_finite() {
            warn!(x = pointer.x, y = pointer.y, "ignoring non-finite pointer position");
            return false;
        }

        self.pointer = pointer;
        self.moving.touch(now_ms);
        flock.set_all_targets(pointer);
        true
    }

    /// Display hint only; steering does not read it.
    pub fn is_moving(&self, now_ms: f64) -> bool {
        self.moving.is_active(now_ms)
    }
}

#[derive(Clone, Debug)]
pub struct AmbientWander {
    interval: Interval,
}

impl AmbientWander {
    pub fn new(start_ms: f64) -> Self {
        Self::with_period(start_ms, DEFAULT_RETARGET_PERIOD_MS)
    }

    pub fn with_period(start_ms: f64, period_ms: f64) -> Self {
        Self {
            interval: Interval::new(start_ms, period_ms),
        }
    }

    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        now_ms: f64,
        flock: &mut FlockSimulation,
        rng: &mut R,
    ) -> bool {
        if !self.interval.poll(now_ms) {
            return false;
        }

        scatter_targets(flock, rng);
        debug!(
            now_ms,
            next_ms = self.interval.next_deadline_ms(),
            "ambient fish retargeted"
        );
        true
    }
}

fn scatter_targets<R: Rng + ?Sized>(flock: &mut FlockSimulation, rng: &mut R) {
    let viewport = flock.viewport();
    for target in flock.targets_mut() {
        *target = viewport.random_point(rng);
    }
}

#[derive(Clone, Debug)]
pub enum TargetPolicy {
    PointerFollow(PointerFollow),
    AmbientWander(AmbientWander),
}

impl TargetPolicy {
    pub fn for_variant(variant: FlockVariant, viewport: Viewport, start_ms: f64) -> Self {
        match variant {
            FlockVariant::Interactive => Self::PointerFollow(PointerFollow::new(viewport)),
            FlockVariant::Ambient => Self::AmbientWander(AmbientWander::new(start_ms)),
        }
    }

    pub fn variant(&self) -> FlockVariant {
        match self {
            Self::PointerFollow(_) => FlockVariant::Interactive,
            Self::AmbientWander(_) => FlockVariant::Ambient,
        }
    }

    pub fn initial_target<R: Rng + ?Sized>(&self, viewport: Viewport, rng: &mut R) -> Vec2 {
        match self {
            Self::PointerFollow(follow) => follow.pointer(),
            Self::AmbientWander(_) => viewport.random_point(rng),
        }
    }

    pub fn on_pointer_move(
        &mut self,
        pointer: Vec2,
        now_ms: f64,
        flock: &mut FlockSimulation,
    ) -> bool {
        match self {
            Self::PointerFollow(follow) => follow.on_pointer_move(pointer, now_ms, flock),
            Self::AmbientWander(_) => false,
        }
    }

    pub fn is_pointer_moving(&self, now_ms: f64) -> bool {
        match self {
            Self::PointerFollow(follow) => follow.is_moving(now_ms),
            Self::AmbientWander(_) => false,
        }
    }

    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        now_ms: f64,
        flock: &mut FlockSimulation,
        rng: &mut R,
    ) -> bool {
        match self {
            Self::PointerFollow(_) => false,
            Self::AmbientWander(wander) => wander.poll(now_ms, flock, rng),
        }
    }
}
