use std::cmp::Ordering;

use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::agent::{Agent, Pose, Viewport};
use crate::config::FlockConfig;
use crate::math::{self, EPSILON};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Steering {
    /// Inside the arrival radius: damp velocity, no new force.
    Coast,
    Force(Vec2),
}

pub struct FlockSimulation {
    agents: Vec<Agent>,
    config: FlockConfig,
    viewport: Viewport,
    snapshot: Vec<Vec2>,
    steering: Vec<Steering>,
    poses: Vec<Pose>,
    step_index: u64,
}

impl FlockSimulation {
    pub fn new(agents: Vec<Agent>, viewport: Viewport, config: FlockConfig) -> Self {
        let count = agents.len();
        let mut sim = Self {
            agents,
            config,
            viewport,
            snapshot: Vec::with_capacity(count),
            steering: Vec::with_capacity(count),
            poses: Vec::with_capacity(count),
            step_index: 0,
        };
        sim.sync_poses();
        sim
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Positions are not re-clamped; the new bounds apply from the next wrap.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            debug!(
                width = viewport.width,
                height = viewport.height,
                "flock viewport resized"
            );
            self.viewport = viewport;
        }
    }

    pub fn set_all_targets(&mut self, target: Vec2) {
        for agent in &mut self.agents {
            agent.target = target;
        }
    }

    pub fn targets_mut(&mut self) -> impl Iterator<Item = &mut Vec2> {
        self.agents.iter_mut().map(|agent| &mut agent.target)
    }

    pub(crate) fn clear(&mut self) {
        self.agents.clear();
        self.snapshot.clear();
        self.steering.clear();
        self.poses.clear();
    }

    pub fn step(&mut self) -> &[Pose] {
        self.step_index = self.step_index.wrapping_add(1);

        // Sorted so every fish sums repulsion in the same order no matter
        // how the flock is stored; float addition is not associative.
        self.snapshot.clear();
        self.snapshot
            .extend(self.agents.iter().map(|agent| agent.position));
        self.snapshot.sort_unstable_by(canonical_order);

        self.steering.clear();
        for agent in &self.agents {
            self.steering
                .push(compute_steering(agent, &self.snapshot, &self.config));
        }

        let center = self.viewport.center();
        for (i, agent) in self.agents.iter_mut().enumerate() {
            integrate(agent, self.steering[i], self.viewport, &self.config);

            if !agent.is_finite() {
                warn!(index = i, "fish state became non-finite, resetting at viewport center");
                agent.position = center;
                agent.velocity = Vec2::ZERO;
                agent.heading = 0.0;
            }
        }

        trace!(step = self.step_index, fish = self.agents.len(), "flock stepped");
        self.sync_poses();
        &self.poses
    }

    fn sync_poses(&mut self) {
        let viewport = self.viewport;
        self.poses.clear();
        self.poses
            .extend(self.agents.iter().map(|agent| agent.pose(viewport)));
    }
}

fn canonical_order(a: &Vec2, b: &Vec2) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// `positions` must include the agent itself; it is skipped as coincident.
pub fn compute_steering(agent: &Agent, positions: &[Vec2], config: &FlockConfig) -> Steering {
    let to_target = agent.target - agent.position;
    let distance = to_target.length();

    // Also catches a NaN distance.
    if !(distance > config.arrival_radius) {
        return Steering::Coast;
    }

    let ramp = (distance / config.accel_ramp_distance).min(1.0);
    let seek = math::normalize_to_magnitude(to_target, agent.acceleration * ramp);

    let dynamic_space = agent.personal_space * (1.0 + distance / config.space_growth_distance);
    let mut repulsion = Vec2::ZERO;

    for &other in positions {
        let offset = agent.position - other;
        let separation = offset.length();
        if separation <= EPSILON || !(separation < dynamic_space) {
            continue;
        }

        let strength = (dynamic_space - separation) / dynamic_space;
        repulsion += offset / separation * strength * config.repulsion_scale;
    }

    Steering::Force(seek + repulsion)
}

fn integrate(agent: &mut Agent, steering: Steering, viewport: Viewport, config: &FlockConfig) {
    match steering {
        Steering::Coast => agent.velocity *= config.arrival_damping,
        Steering::Force(force) => {
            agent.velocity = math::limit_magnitude(agent.velocity + force, agent.max_speed);
        }
    }

    agent.position += agent.velocity * agent.speed;
    agent.position.x = math::wrap_with_margin(agent.position.x, viewport.width, config.wrap_margin);
    agent.position.y =
        math::wrap_with_margin(agent.position.y, viewport.height, config.wrap_margin);

    if agent.velocity.length() > config.heading_min_speed {
        let travel_angle = agent.velocity.y.atan2(agent.velocity.x);
        agent.heading += math::shortest_angle(agent.heading, travel_angle) * config.heading_smoothing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f32::consts::PI;

    fn fish(position: Vec2, target: Vec2) -> Agent {
        Agent {
            position,
            velocity: Vec2::ZERO,
            heading: 0.0,
            target,
            speed: 0.5,
            max_speed: 2.0,
            acceleration: 0.1,
            personal_space: 50.0,
            avoid_factor: 0.3,
        }
    }

    fn big_viewport() -> Viewport {
        Viewport::new(2_000.0, 2_000.0)
    }

    #[test]
    fn velocity_never_exceeds_max_speed() {
        let agents = (0..12)
            .map(|i| {
                let mut agent = fish(
                    Vec2::new(100.0 + i as f32 * 7.0, 300.0),
                    Vec2::new(1_800.0, 1_700.0),
                );
                agent.max_speed = 1.0 + i as f32 * 0.1;
                agent.acceleration = 0.8;
                agent
            })
            .collect();
        let mut sim = FlockSimulation::new(agents, big_viewport(), FlockConfig::interactive());

        for _ in 0..500 {
            sim.step();
            for agent in sim.agents() {
                assert!(agent.velocity.length() <= agent.max_speed + 1.0e-4);
            }
        }
    }

    #[test]
    fn positions_stay_inside_the_margin_band() {
        let viewport = Viewport::new(300.0, 200.0);
        let agents = (0..8)
            .map(|i| {
                let mut agent = fish(Vec2::new(i as f32 * 30.0, 100.0), Vec2::new(5_000.0, -4_000.0));
                agent.speed = 5.0;
                agent.max_speed = 3.0;
                agent
            })
            .collect();
        let mut sim = FlockSimulation::new(agents, viewport, FlockConfig::interactive());

        for _ in 0..1_000 {
            sim.step();
            for agent in sim.agents() {
                assert!(agent.position.x >= -50.0 && agent.position.x <= 350.0);
                assert!(agent.position.y >= -50.0 && agent.position.y <= 250.0);
            }
        }
    }

    #[test]
    fn heading_turns_at_most_a_tenth_of_a_half_turn_per_tick() {
        let mut agent = fish(Vec2::new(1_000.0, 1_000.0), Vec2::new(0.0, 1_000.0));
        agent.velocity = Vec2::new(2.0, 0.0);
        let mut sim = FlockSimulation::new(vec![agent], big_viewport(), FlockConfig::interactive());

        let mut previous = sim.agents()[0].heading;
        for tick in 0..300 {
            if tick == 150 {
                sim.set_all_targets(Vec2::new(1_900.0, 1_000.0));
            }
            sim.step();
            let heading = sim.agents()[0].heading;
            assert!((heading - previous).abs() <= PI * 0.1 + 1.0e-4);
            previous = heading;
        }
    }

    #[test]
    fn arriving_fish_decays_monotonically() {
        let target = Vec2::new(500.0, 500.0);
        let mut agent = fish(target + Vec2::new(1.0, 0.0), target);
        agent.velocity = Vec2::new(0.01, 0.005);
        let mut sim = FlockSimulation::new(vec![agent], big_viewport(), FlockConfig::interactive());

        let mut previous = sim.agents()[0].velocity.length();
        for _ in 0..50 {
            sim.step();
            let agent = sim.agents()[0];
            assert!(agent.position.distance(target) <= 5.0);
            let speed = agent.velocity.length();
            assert!(speed <= previous);
            assert!((speed - previous * 0.98).abs() < 1.0e-6);
            previous = speed;
        }
    }

    #[test]
    fn coincident_fish_and_fish_on_target_stay_finite() {
        let spot = Vec2::new(400.0, 400.0);
        let agents = vec![
            fish(spot, Vec2::new(900.0, 900.0)),
            fish(spot, Vec2::new(900.0, 900.0)),
            fish(spot, spot),
        ];
        let mut sim = FlockSimulation::new(agents, big_viewport(), FlockConfig::interactive());

        for _ in 0..10 {
            sim.step();
            for agent in sim.agents() {
                assert!(agent.position.is_finite());
                assert!(agent.velocity.is_finite());
                assert!(agent.heading.is_finite());
            }
        }
    }

    #[test]
    fn storage_order_does_not_change_the_outcome() {
        let mut rng = StdRng::seed_from_u64(17);
        let target = Vec2::new(900.0, 700.0);
        let school: Vec<Agent> = (0..14)
            .map(|_| {
                let position = Vec2::new(
                    rng.random_range(80.0..140.0),
                    rng.random_range(80.0..140.0),
                );
                let mut agent = fish(position, target);
                agent.velocity = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
                agent.personal_space = rng.random_range(30.0..80.0);
                agent
            })
            .collect();
        let mut reversed_school = school.clone();
        reversed_school.reverse();

        let mut forward = FlockSimulation::new(school, big_viewport(), FlockConfig::interactive());
        let mut reversed =
            FlockSimulation::new(reversed_school, big_viewport(), FlockConfig::interactive());

        for _ in 0..20 {
            forward.step();
            reversed.step();
        }

        let count = forward.len();
        for (i, fwd) in forward.agents().iter().enumerate() {
            let rev = &reversed.agents()[count - 1 - i];
            assert_eq!(fwd.position, rev.position);
            assert_eq!(fwd.velocity, rev.velocity);
            assert_eq!(fwd.heading, rev.heading);
        }
    }

    #[test]
    fn repulsion_bends_the_seek_direction() {
        let target = Vec2::new(1_000.0, 1_000.0);
        let mut left = fish(Vec2::new(0.0, 0.0), target);
        left.personal_space = 100.0;
        let mut right = fish(Vec2::new(10.0, 0.0), target);
        right.personal_space = 100.0;
        let mut sim =
            FlockSimulation::new(vec![left, right], big_viewport(), FlockConfig::interactive());

        sim.step();
        let velocity = sim.agents()[0].velocity;
        assert!(velocity.length() > 0.0);
        // Pure seek would point along +x/+y equally; the neighbour at +x pushes it back.
        assert!(velocity.x < 0.0);
        assert!(velocity.y > 0.0);
    }

    #[test]
    fn distant_neighbours_do_not_repel() {
        let target = Vec2::new(1_000.0, 0.0);
        let agent = fish(Vec2::new(0.0, 0.0), target);
        let positions = [agent.position, Vec2::new(0.0, 500.0)];

        let steering = compute_steering(&agent, &positions, &FlockConfig::interactive());
        let Steering::Force(force) = steering else {
            panic!("expected a steering force");
        };
        assert!((force.x - agent.acceleration).abs() < 1.0e-6);
        assert!(force.y.abs() < 1.0e-6);
    }

    #[test]
    fn seek_ramps_up_with_distance() {
        let agent = fish(Vec2::ZERO, Vec2::new(100.0, 0.0));
        let positions = [agent.position];

        let Steering::Force(force) =
            compute_steering(&agent, &positions, &FlockConfig::interactive())
        else {
            panic!("expected a steering force");
        };
        assert!((force.length() - agent.acceleration * 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn resize_moves_the_wrap_bounds() {
        let mut agent = fish(Vec2::new(700.0, 100.0), Vec2::new(5_000.0, 100.0));
        agent.velocity = Vec2::new(2.0, 0.0);
        agent.speed = 1.0;
        let mut sim =
            FlockSimulation::new(vec![agent], Viewport::new(1_000.0, 500.0), FlockConfig::interactive());

        sim.set_viewport(Viewport::new(600.0, 500.0));
        sim.step();
        assert_eq!(sim.agents()[0].position.x, -50.0);
    }
}
