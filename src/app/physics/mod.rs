mod forces;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

use forces::{
    accumulate_centering, accumulate_collisions, accumulate_links, accumulate_repulsion,
};

/// Fixed inset keeping every node inside the layout bounds.
pub(in crate::app) const BOUNDS_MARGIN: f32 = 28.0;

/// Wall-clock simulation time after which the layout freezes.
const FREEZE_AFTER_SECS: f32 = 2.0;

const VELOCITY_DAMPING: f32 = 0.88;
const FORCE_TO_VELOCITY: f32 = 0.055;
const MAX_FORCE: f32 = 180.0;
const MAX_SPEED: f32 = 18.0;
const MIN_SLEEP_SPEED: f32 = 0.02;
const MIN_SLEEP_FORCE: f32 = 0.08;
const SEED_SPREAD: f32 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum PinKind {
    /// Applied to every free node when the layout freezes; released by the
    /// next drag reheat.
    Settled,
    /// Applied by a drag; survives reheats and re-freezes.
    Dragged,
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Pin {
    pub(in crate::app) target: Vec2,
    pub(in crate::app) kind: PinKind,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct SimNode {
    pub(in crate::app) pos: Vec2,
    pub(in crate::app) vel: Vec2,
    pub(in crate::app) radius: f32,
    pub(in crate::app) pin: Option<Pin>,
}

/// Force-directed layout over an arena of nodes. Coordinates live in layout
/// space `[0, width] x [0, height]`; edges are arena index pairs. A rebuild
/// constructs a fresh simulation, never carrying positions over.
pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    edges: Vec<(usize, usize)>,
    bounds: Vec2,
    clock: f32,
    frozen: bool,
    forces: Vec<Vec2>,
}

/// Deterministic seed position for an address: stable hash jitter around the
/// viewport center, so rebuilding the same neighborhood starts from the same
/// shape.
pub(in crate::app) fn seed_position(address: &str, width: f32, height: f32) -> Vec2 {
    let (jitter_x, jitter_y) = stable_pair(address);
    let center = vec2(width, height) * 0.5;
    let spread = ((width.min(height) * 0.5) - BOUNDS_MARGIN).max(1.0) * SEED_SPREAD;
    center + vec2(jitter_x, jitter_y) * spread
}

fn clamp_point(point: Vec2, bounds: Vec2) -> Vec2 {
    vec2(
        point.x.clamp(BOUNDS_MARGIN, bounds.x - BOUNDS_MARGIN),
        point.y.clamp(BOUNDS_MARGIN, bounds.y - BOUNDS_MARGIN),
    )
}

impl Simulation {
    /// `seeds` is one `(position, visual radius)` pair per arena node;
    /// `edges` holds arena index pairs.
    pub(in crate::app) fn new(
        seeds: Vec<(Vec2, f32)>,
        edges: Vec<(usize, usize)>,
        width: f32,
        height: f32,
    ) -> Self {
        let bounds = vec2(
            width.max(BOUNDS_MARGIN * 2.0 + 1.0),
            height.max(BOUNDS_MARGIN * 2.0 + 1.0),
        );
        let nodes = seeds
            .into_iter()
            .map(|(pos, radius)| SimNode {
                pos: clamp_point(pos, bounds),
                vel: Vec2::ZERO,
                radius,
                pin: None,
            })
            .collect();

        Self {
            nodes,
            edges,
            bounds,
            clock: 0.0,
            frozen: false,
            forces: Vec::new(),
        }
    }

    pub(in crate::app) fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub(in crate::app) fn node(&self, index: usize) -> Option<&SimNode> {
        self.nodes.get(index)
    }

    pub(in crate::app) fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub(in crate::app) fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Axis-aligned extent of all nodes inflated by their radii, for the
    /// fit-to-view transform.
    pub(in crate::app) fn extent(&self) -> Option<(Vec2, Vec2)> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for node in &self.nodes {
            min = min.min(node.pos - Vec2::splat(node.radius));
            max = max.max(node.pos + Vec2::splat(node.radius));
        }
        (min.x <= max.x).then_some((min, max))
    }

    /// Advances the simulation by `dt` seconds. Returns true while anything
    /// is still moving; once the stabilization window elapses the layout
    /// freezes and every subsequent call is a no-op.
    pub(in crate::app) fn step(&mut self, dt: f32) -> bool {
        if self.frozen || self.nodes.is_empty() {
            return false;
        }

        self.clock += dt;

        let node_count = self.nodes.len();
        self.forces.resize(node_count, Vec2::ZERO);
        self.forces.fill(Vec2::ZERO);

        accumulate_repulsion(&self.nodes, &mut self.forces);
        accumulate_links(&self.nodes, &self.edges, &mut self.forces);
        accumulate_centering(&self.nodes, self.bounds * 0.5, &mut self.forces);
        accumulate_collisions(&self.nodes, &mut self.forces);

        let time_step_scale = (dt * 60.0).clamp(0.25, 3.0);
        let damping_factor = VELOCITY_DAMPING.powf(time_step_scale);
        let mut any_motion = false;

        for (node, force_value) in self.nodes.iter_mut().zip(self.forces.iter()) {
            if let Some(pin) = node.pin {
                node.pos = clamp_point(pin.target, self.bounds);
                node.vel = Vec2::ZERO;
                continue;
            }

            let mut force = *force_value;
            let force_sq = force.length_sq();
            if force_sq > MAX_FORCE * MAX_FORCE {
                force *= MAX_FORCE / force_sq.sqrt();
            }

            let mut velocity =
                (node.vel + force * (FORCE_TO_VELOCITY * time_step_scale)) * damping_factor;
            let mut speed_sq = velocity.length_sq();
            if speed_sq > MAX_SPEED * MAX_SPEED {
                velocity *= MAX_SPEED / speed_sq.sqrt();
                speed_sq = MAX_SPEED * MAX_SPEED;
            }
            if speed_sq < MIN_SLEEP_SPEED * MIN_SLEEP_SPEED
                && force_sq < MIN_SLEEP_FORCE * MIN_SLEEP_FORCE
            {
                velocity = Vec2::ZERO;
                speed_sq = 0.0;
            }

            node.vel = velocity;
            node.pos = clamp_point(node.pos + velocity * time_step_scale, self.bounds);
            if speed_sq > 0.000_001 {
                any_motion = true;
            }
        }

        if self.clock >= FREEZE_AFTER_SECS {
            self.freeze();
            return false;
        }
        any_motion
    }

    fn freeze(&mut self) {
        for node in &mut self.nodes {
            node.vel = Vec2::ZERO;
            if node.pin.is_none() {
                node.pin = Some(Pin {
                    target: node.pos,
                    kind: PinKind::Settled,
                });
            }
        }
        self.frozen = true;
    }

    fn reheat(&mut self) {
        self.clock = 0.0;
        self.frozen = false;
    }

    /// Pins the node at its current position and reheats the simulation so
    /// neighbors react. Settled pins are released; dragged pins elsewhere
    /// stay put.
    pub(in crate::app) fn drag_start(&mut self, index: usize) {
        if index >= self.nodes.len() {
            return;
        }

        for node in &mut self.nodes {
            if node.pin.is_some_and(|pin| pin.kind == PinKind::Settled) {
                node.pin = None;
            }
        }
        let node = &mut self.nodes[index];
        node.pin = Some(Pin {
            target: node.pos,
            kind: PinKind::Dragged,
        });
        self.reheat();
    }

    pub(in crate::app) fn drag_move(&mut self, index: usize, target: Vec2) {
        let clamped = clamp_point(target, self.bounds);
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.pin = Some(Pin {
            target: clamped,
            kind: PinKind::Dragged,
        });
        node.pos = clamped;
        node.vel = Vec2::ZERO;
        self.reheat();
    }

    /// The drag pin is retained; the clock simply runs back down to a
    /// re-freeze.
    pub(in crate::app) fn drag_end(&mut self, _index: usize) {}
}
