use eframe::egui::{Vec2, vec2};
use rand::Rng;
use tracing::{debug, warn};

use crate::util::{fallback_direction, is_finite_vec};

use super::config::LayoutConfig;

const COINCIDENT_EPSILON: f32 = 1e-3;

/// Simulation particle, alive for one layout pass only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
}

/// Pull between two members joined by an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationOutcome {
    pub positions: Vec<Vec2>,
    /// Local member indices whose state went non-finite and were reset.
    pub diverged: Vec<usize>,
}

/// Radius a hypernode with `member_count` members may lay its children out
/// in. Grows with the square root of the member count.
pub fn available_radius(member_count: usize, config: &LayoutConfig) -> f32 {
    let geometry = &config.geometry;
    let boundary = geometry.min_distance() * (0.5 + 0.6 * (member_count.max(1) as f32).sqrt());
    let unclamped = boundary / config.simulation.boundary_fraction;
    let base_size = geometry
        .min_hypernode_size
        .max(2.0 * (geometry.hypernode_margin + unclamped));
    (base_size / 2.0 - geometry.hypernode_margin).max(geometry.max_node_radius())
}

/// Force-directed placement of the members of one hypernode.
pub struct GroupSimulation<'a> {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    center: Vec2,
    available_radius: f32,
    config: &'a LayoutConfig,
    diverged: Vec<usize>,
}

impl<'a> GroupSimulation<'a> {
    /// Seeds `member_count` bodies on a grid around `center`, jittered by
    /// `rng`. `links` are local index pairs that become springs.
    pub fn seeded<R: Rng + ?Sized>(
        center: Vec2,
        member_count: usize,
        links: &[(usize, usize)],
        available_radius: f32,
        config: &'a LayoutConfig,
        rng: &mut R,
    ) -> Self {
        let min_distance = config.geometry.min_distance();
        let cols = (member_count as f32).sqrt().ceil().max(1.0) as usize;
        let rows = member_count.div_ceil(cols);
        let origin = center
            - vec2(
                (cols as f32 - 1.0) * min_distance / 2.0,
                (rows as f32 - 1.0) * min_distance / 2.0,
            );
        let jitter = (config.simulation.jitter_fraction * min_distance).max(0.0);

        let mut bodies: Vec<Body> = Vec::with_capacity(member_count);
        for index in 0..member_count {
            let slot = origin
                + vec2(
                    (index % cols) as f32 * min_distance,
                    (index / cols) as f32 * min_distance,
                );

            let (position, retries) =
                place_clear_of(slot, &bodies, jitter, config.simulation.coincidence_retries, rng);
            if retries > 0 {
                debug!(member = index, retries, "re-jittered coincident body");
            }

            bodies.push(Body {
                position,
                ..Body::default()
            });
        }

        let rest_length = config.simulation.spring_length * min_distance;
        let springs = links
            .iter()
            .filter(|(a, b)| a != b && *a < member_count && *b < member_count)
            .map(|&(a, b)| Spring { a, b, rest_length })
            .collect();

        Self {
            bodies,
            springs,
            center,
            available_radius,
            config,
            diverged: Vec::new(),
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    fn boundary(&self) -> f32 {
        self.config.simulation.boundary_fraction * self.available_radius
    }

    pub fn step(&mut self) {
        let simulation = &self.config.simulation;
        let min_distance = self.config.geometry.min_distance();
        let repulsion = simulation.repulsion * min_distance * min_distance;
        let soft_boundary = simulation.soft_boundary_fraction * self.available_radius;
        let max_speed = simulation.max_speed_fraction * min_distance;
        let count = self.bodies.len();

        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
        }

        for i in 0..count {
            for j in (i + 1)..count {
                let (direction, distance) =
                    separation(self.bodies[i].position, self.bodies[j].position, i, j);

                let softened = distance.max(min_distance * 0.1);
                let mut magnitude = repulsion / (softened * softened);
                if distance < min_distance {
                    magnitude = magnitude * simulation.overlap_boost + (min_distance - distance);
                }

                self.bodies[i].force += direction * magnitude;
                self.bodies[j].force -= direction * magnitude;
            }
        }

        for spring in &self.springs {
            let (direction, distance) = separation(
                self.bodies[spring.a].position,
                self.bodies[spring.b].position,
                spring.a,
                spring.b,
            );
            let pull = (distance - spring.rest_length) * simulation.spring;
            self.bodies[spring.a].force -= direction * pull;
            self.bodies[spring.b].force += direction * pull;
        }

        for body in &mut self.bodies {
            let offset = self.center - body.position;
            let mut strength = simulation.centering;
            if offset.length() > soft_boundary {
                strength *= simulation.edge_centering_boost;
            }
            body.force += offset * strength;
        }

        for body in &mut self.bodies {
            body.velocity = (body.velocity + body.force) * simulation.damping;
            let speed = body.velocity.length();
            if speed > max_speed {
                body.velocity *= max_speed / speed;
            }
            body.position += body.velocity;
        }

        self.clamp_to_boundary();
        self.reset_diverged();
    }

    /// Pushes every pair closer than `min_distance` apart by half the deficit
    /// each, then re-clamps.
    pub fn correct_overlaps(&mut self) {
        let min_distance = self.config.geometry.min_distance();
        let count = self.bodies.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let (direction, distance) =
                    separation(self.bodies[i].position, self.bodies[j].position, i, j);
                if distance >= min_distance {
                    continue;
                }

                let half = (min_distance - distance) / 2.0;
                self.bodies[i].position += direction * half;
                self.bodies[j].position -= direction * half;
            }
        }

        self.clamp_to_boundary();
        self.reset_diverged();
    }

    fn clamp_to_boundary(&mut self) {
        let limit = self.boundary();
        for body in &mut self.bodies {
            let offset = body.position - self.center;
            let distance = offset.length();
            if distance <= limit || distance == 0.0 || !distance.is_finite() {
                continue;
            }

            let outward = offset / distance;
            body.position = self.center + outward * limit;
            let radial = body.velocity.dot(outward);
            if radial > 0.0 {
                body.velocity -= outward * radial;
            }
        }
    }

    fn reset_diverged(&mut self) {
        for (index, body) in self.bodies.iter_mut().enumerate() {
            if is_finite_vec(body.position) && is_finite_vec(body.velocity) {
                continue;
            }

            warn!(member = index, "simulation produced a non-finite body; resetting to center");
            body.position = self.center;
            body.velocity = Vec2::ZERO;
            body.force = Vec2::ZERO;
            if !self.diverged.contains(&index) {
                self.diverged.push(index);
            }
        }
    }

    pub fn run(mut self) -> SimulationOutcome {
        if self.bodies.len() == 1 {
            self.bodies[0].position = self.center;
        } else if self.bodies.len() > 1 {
            for _ in 0..self.config.simulation.iterations {
                self.step();
            }
            self.correct_overlaps();
        }

        SimulationOutcome {
            positions: self.bodies.iter().map(|body| body.position).collect(),
            diverged: self.diverged,
        }
    }
}

/// Lays out one group. Single members sit exactly on `center`.
pub fn simulate_group<R: Rng + ?Sized>(
    center: Vec2,
    member_count: usize,
    links: &[(usize, usize)],
    config: &LayoutConfig,
    rng: &mut R,
) -> SimulationOutcome {
    let radius = available_radius(member_count, config);
    GroupSimulation::seeded(center, member_count, links, radius, config, rng).run()
}

/// Unit vector from `b` to `a` and their distance. Coincident points get a
/// deterministic fallback direction.
fn separation(a: Vec2, b: Vec2, i: usize, j: usize) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance < COINCIDENT_EPSILON || !distance.is_finite() {
        return (fallback_direction(i, j), distance.min(COINCIDENT_EPSILON));
    }
    (delta / distance, distance)
}

/// Jittered position around `slot`, re-drawn up to `retries` times while it
/// coincides with an already placed body. Returns the position and the number
/// of re-draws.
fn place_clear_of<R: Rng + ?Sized>(
    slot: Vec2,
    bodies: &[Body],
    jitter: f32,
    retries: usize,
    rng: &mut R,
) -> (Vec2, usize) {
    let coincides = |position: Vec2| {
        bodies
            .iter()
            .any(|body| (body.position - position).length() < COINCIDENT_EPSILON)
    };

    let mut position = slot + random_offset(rng, jitter);
    let mut used = 0;
    while used < retries && coincides(position) {
        position = slot + random_offset(rng, jitter.max(COINCIDENT_EPSILON * 10.0));
        used += 1;
    }
    (position, used)
}

fn random_offset<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> Vec2 {
    vec2(
        (rng.random::<f32>() * 2.0 - 1.0) * amplitude,
        (rng.random::<f32>() * 2.0 - 1.0) * amplitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn distances(positions: &[Vec2]) -> Vec<f32> {
        let mut out = Vec::new();
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                out.push((positions[i] - positions[j]).length());
            }
        }
        out
    }

    #[test]
    fn coincident_draw_is_retried() {
        let slot = vec2(10.0, -4.0);
        let jitter = 4.8;
        let mut rng = StdRng::seed_from_u64(11);
        let first_draw = slot + random_offset(&mut rng.clone(), jitter);
        let occupied = [Body {
            position: first_draw,
            ..Body::default()
        }];

        let (position, retries) = place_clear_of(slot, &occupied, jitter, 3, &mut rng.clone());
        assert!(retries >= 1);
        assert!((position - first_draw).length() >= COINCIDENT_EPSILON);
        assert!((position - slot).length() <= jitter * 2.0_f32.sqrt());

        let (kept, none) = place_clear_of(slot, &occupied, jitter, 0, &mut rng);
        assert_eq!(none, 0);
        assert_eq!(kept, first_draw);
    }

    #[test]
    fn single_member_sits_on_center() {
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = simulate_group(vec2(40.0, -25.0), 1, &[], &config, &mut rng);

        assert_eq!(outcome.positions, vec![vec2(40.0, -25.0)]);
        assert!(outcome.diverged.is_empty());
    }

    #[test]
    fn same_seed_gives_identical_positions() {
        let config = LayoutConfig::default();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            simulate_group(Vec2::ZERO, 5, &[(0, 1), (1, 2)], &config, &mut rng).positions
        };

        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn bodies_stay_inside_boundary() {
        let config = LayoutConfig::default();
        let center = vec2(100.0, 100.0);
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = simulate_group(center, 9, &[], &config, &mut rng);
        let limit = config.simulation.boundary_fraction * available_radius(9, &config);

        for position in outcome.positions {
            assert!((position - center).length() <= limit + 1e-3);
        }
    }

    #[test]
    fn pair_ends_at_least_min_distance_apart() {
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = simulate_group(Vec2::ZERO, 2, &[(0, 1)], &config, &mut rng);

        for distance in distances(&outcome.positions) {
            assert!(distance >= config.geometry.min_distance() - 1e-3);
        }
    }

    #[test]
    fn coincident_bodies_are_separated() {
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let radius = available_radius(2, &config);
        let mut simulation =
            GroupSimulation::seeded(Vec2::ZERO, 2, &[], radius, &config, &mut rng);
        for body in simulation.bodies_mut() {
            body.position = Vec2::ZERO;
        }

        simulation.correct_overlaps();

        let bodies = simulation.bodies();
        let distance = (bodies[0].position - bodies[1].position).length();
        assert!(distance >= config.geometry.min_distance() - 1e-3);
    }

    #[test]
    fn non_finite_body_is_reset_to_center() {
        let config = LayoutConfig::default();
        let center = vec2(-60.0, 15.0);
        let mut rng = StdRng::seed_from_u64(5);
        let radius = available_radius(3, &config);
        let mut simulation = GroupSimulation::seeded(center, 3, &[], radius, &config, &mut rng);
        simulation.bodies_mut()[1].position = vec2(f32::NAN, 0.0);

        simulation.step();

        for body in simulation.bodies() {
            assert!(is_finite_vec(body.position));
            assert!(is_finite_vec(body.velocity));
        }
        let outcome = simulation.run();
        assert_eq!(outcome.diverged, vec![1]);
        for position in outcome.positions {
            assert!(is_finite_vec(position));
        }
    }

    #[test]
    fn available_radius_grows_with_members() {
        let config = LayoutConfig::default();
        let small = available_radius(1, &config);
        let medium = available_radius(4, &config);
        let large = available_radius(16, &config);

        assert!(small < medium && medium < large);
        // Sub-linear growth.
        assert!(large - medium < 4.0 * (medium - small));
    }
}
