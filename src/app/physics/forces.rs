use eframe::egui::{Vec2, vec2};

use super::SimNode;

pub(super) const LINK_DISTANCE: f32 = 150.0;
pub(super) const LINK_STRENGTH: f32 = 0.02;
pub(super) const LINK_DAMPING: f32 = 0.2;
pub(super) const REPULSION_STRENGTH: f32 = 26_000.0;
pub(super) const REPULSION_SOFTENING: f32 = 480.0;
pub(super) const CENTER_PULL: f32 = 0.012;
pub(super) const COLLISION_STRENGTH: f32 = 0.9;
pub(super) const COLLISION_PADDING: f32 = 6.0;

fn repulsion_between(point_a: Vec2, point_b: Vec2) -> Vec2 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (REPULSION_STRENGTH / (distance_sq + REPULSION_SOFTENING))
}

/// All-pairs repulsion. The detail cap bounds the arena to ~200 nodes, so
/// the plain quadratic loop stays cheap at interactive frame rates.
pub(super) fn accumulate_repulsion(nodes: &[SimNode], forces: &mut [Vec2]) {
    for first in 0..nodes.len() {
        for second in (first + 1)..nodes.len() {
            let push = repulsion_between(nodes[first].pos, nodes[second].pos);
            forces[first] += push;
            forces[second] -= push;
        }
    }
}

/// Spring force pulling each connected pair toward a separation of
/// `LINK_DISTANCE` plus both visual radii, with relative-velocity damping so
/// linked nodes settle instead of oscillating.
pub(super) fn accumulate_links(nodes: &[SimNode], edges: &[(usize, usize)], forces: &mut [Vec2]) {
    for &(from, to) in edges {
        if from >= nodes.len() || to >= nodes.len() || from == to {
            continue;
        }

        let delta = nodes[from].pos - nodes[to].pos;
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let preferred = LINK_DISTANCE + nodes[from].radius + nodes[to].radius;
        let spring = (distance - preferred) * LINK_STRENGTH;
        let relative_velocity = nodes[from].vel - nodes[to].vel;
        let damping_force = relative_velocity.dot(direction) * LINK_DAMPING;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }
}

/// Weak pull of every node toward the viewport center.
pub(super) fn accumulate_centering(nodes: &[SimNode], center: Vec2, forces: &mut [Vec2]) {
    for (node, force) in nodes.iter().zip(forces.iter_mut()) {
        *force -= (node.pos - center) * CENTER_PULL;
    }
}

/// Minimum-separation push between overlapping nodes. Coincident nodes get
/// a deterministic separation direction derived from their indices.
pub(super) fn accumulate_collisions(nodes: &[SimNode], forces: &mut [Vec2]) {
    for first in 0..nodes.len() {
        for second in (first + 1)..nodes.len() {
            let delta = nodes[first].pos - nodes[second].pos;
            let distance_sq = delta.length_sq();
            let distance = distance_sq.sqrt();
            let min_distance = nodes[first].radius + nodes[second].radius + COLLISION_PADDING;
            if distance >= min_distance {
                continue;
            }

            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214)
                    * std::f32::consts::TAU;
                vec2(angle.cos(), angle.sin())
            };

            let overlap_push = (min_distance - distance) * COLLISION_STRENGTH;
            forces[first] += direction * overlap_push;
            forces[second] -= direction * overlap_push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(x: f32, y: f32, radius: f32) -> SimNode {
        SimNode {
            pos: vec2(x, y),
            vel: Vec2::ZERO,
            radius,
            pin: None,
        }
    }

    #[test]
    fn repulsion_pushes_pairs_apart_symmetrically() {
        let nodes = [node_at(0.0, 0.0, 10.0), node_at(50.0, 0.0, 10.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion(&nodes, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }

    #[test]
    fn link_force_pulls_distant_pairs_together() {
        let nodes = [node_at(0.0, 0.0, 10.0), node_at(500.0, 0.0, 10.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&nodes, &[(0, 1)], &mut forces);

        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
    }

    #[test]
    fn link_force_pushes_cramped_pairs_apart() {
        let nodes = [node_at(0.0, 0.0, 10.0), node_at(40.0, 0.0, 10.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&nodes, &[(0, 1)], &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
    }

    #[test]
    fn link_force_ignores_degenerate_edges() {
        let nodes = [node_at(0.0, 0.0, 10.0), node_at(100.0, 0.0, 10.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&nodes, &[(0, 0), (1, 7)], &mut forces);
        assert_eq!(forces[0], Vec2::ZERO);
        assert_eq!(forces[1], Vec2::ZERO);
    }

    #[test]
    fn centering_pulls_toward_the_given_center() {
        let nodes = [node_at(700.0, 300.0, 10.0)];
        let mut forces = vec![Vec2::ZERO];
        accumulate_centering(&nodes, vec2(400.0, 300.0), &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[0].y.abs() < 1e-6);
    }

    #[test]
    fn collision_only_fires_on_overlap() {
        let overlapping = [node_at(0.0, 0.0, 20.0), node_at(10.0, 0.0, 20.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_collisions(&overlapping, &mut forces);
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);

        let separated = [node_at(0.0, 0.0, 20.0), node_at(200.0, 0.0, 20.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_collisions(&separated, &mut forces);
        assert_eq!(forces[0], Vec2::ZERO);
        assert_eq!(forces[1], Vec2::ZERO);
    }

    #[test]
    fn coincident_nodes_separate_deterministically() {
        let nodes = [node_at(100.0, 100.0, 12.0), node_at(100.0, 100.0, 12.0)];
        let mut first_run = vec![Vec2::ZERO; 2];
        accumulate_collisions(&nodes, &mut first_run);
        let mut second_run = vec![Vec2::ZERO; 2];
        accumulate_collisions(&nodes, &mut second_run);

        assert!(first_run[0].length() > 0.0);
        assert_eq!(first_run[0], second_run[0]);
    }
}
