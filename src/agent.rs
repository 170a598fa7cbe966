use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::config::FlockConfig;
use crate::math::clamp_finite;

const MIN_BOUND: f32 = 1.0;
const MAX_BOUND: f32 = 1.0e6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: clamp_finite(width, MIN_BOUND, MAX_BOUND, MIN_BOUND),
            height: clamp_finite(height, MIN_BOUND, MAX_BOUND, MIN_BOUND),
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }

    pub fn to_percent(&self, position: Vec2) -> Vec2 {
        position / self.size() * 100.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Radians, unwrapped.
    pub heading: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    pub heading: f32,
    pub target: Vec2,

    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub personal_space: f32,
    pub avoid_factor: f32,
}

impl Agent {
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        config: &FlockConfig,
        viewport: Viewport,
        target: Vec2,
    ) -> Self {
        let position = viewport.random_point(rng);
        Self {
            position,
            velocity: Vec2::ZERO,
            heading: 0.0,
            target,
            speed: config.speed.sample(rng),
            max_speed: config.max_speed.sample(rng),
            acceleration: config.acceleration.sample(rng),
            personal_space: config.personal_space.sample(rng),
            avoid_factor: config.avoid_factor.sample(rng),
        }
    }

    pub fn pose(&self, viewport: Viewport) -> Pose {
        let percent = viewport.to_percent(self.position);
        Pose {
            x: percent.x,
            y: percent.y,
            heading: self.heading,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.heading.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlockConfig;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn degenerate_viewport_is_clamped() {
        let viewport = Viewport::new(0.0, f32::NAN);
        assert_eq!(viewport.width, 1.0);
        assert_eq!(viewport.height, 1.0);
    }

    #[test]
    fn spawned_fish_is_complete_and_inside_the_viewport() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = FlockConfig::ambient();
        let viewport = Viewport::new(640.0, 480.0);

        for _ in 0..100 {
            let agent = Agent::spawn(&mut rng, &config, viewport, viewport.center());
            assert!(agent.position.x >= 0.0 && agent.position.x < 640.0);
            assert!(agent.position.y >= 0.0 && agent.position.y < 480.0);
            assert_eq!(agent.velocity, Vec2::ZERO);
            assert_eq!(agent.heading, 0.0);
            assert!((1.0..1.5).contains(&agent.max_speed));
            assert!((100.0..200.0).contains(&agent.personal_space));
            assert!(agent.is_finite());
        }
    }

    #[test]
    fn pose_is_percent_of_viewport() {
        let mut rng = StdRng::seed_from_u64(3);
        let viewport = Viewport::new(800.0, 400.0);
        let mut agent = Agent::spawn(&mut rng, &FlockConfig::default(), viewport, Vec2::ZERO);
        agent.position = Vec2::new(200.0, 300.0);
        agent.heading = 1.25;

        let pose = agent.pose(viewport);
        assert!((pose.x - 25.0).abs() < 1.0e-4);
        assert!((pose.y - 75.0).abs() < 1.0e-4);
        assert_eq!(pose.heading, 1.25);
    }
}
