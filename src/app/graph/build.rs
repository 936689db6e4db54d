use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use crate::graph::build_graph;

use super::super::physics::{Simulation, seed_position};
use super::super::render_utils::node_role_radius;
use super::super::{RenderGraph, ViewModel};

impl ViewModel {
    /// Rebuilds the scene from the current `(focus, transactions, detail)`
    /// triple. The old simulation is dropped before the build is attempted,
    /// so a failed build never leaves a stale layout ticking, and the
    /// revision bump invalidates every cache keyed on the old arena.
    pub(in crate::app) fn rebuild_render_graph(&mut self, size: Vec2) {
        self.revision = self.revision.wrapping_add(1);
        self.search_match_cache = None;
        self.drag = None;
        self.view_anim = None;
        self.graph_cache = None;
        self.build_error = None;
        self.visible_node_count = 0;
        self.visible_edge_count = 0;
        self.graph_dirty = false;

        let limit = self.detail.record_cap();
        match build_graph(
            &self.transactions,
            &self.focus_address,
            limit,
            &self.explored,
        ) {
            Ok(graph) => {
                let width = size.x.max(320.0);
                let height = size.y.max(240.0);

                let seeds = graph
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(index, node)| {
                        let radius = node_role_radius(node.role);
                        let pos = if index == graph.focus_index {
                            vec2(width, height) * 0.5
                        } else {
                            seed_position(&node.address, width, height)
                        };
                        (pos, radius)
                    })
                    .collect();
                let edges = graph
                    .edges
                    .iter()
                    .map(|edge| (edge.source, edge.target))
                    .collect();

                let sim = Simulation::new(seeds, edges, width, height);
                let (min_amount, max_amount) = graph.amount_bounds();

                debug!(
                    focus = %self.focus_address,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    limit,
                    "rebuilt neighborhood graph"
                );

                self.graph_cache = Some(RenderGraph {
                    graph,
                    sim,
                    min_amount,
                    max_amount,
                    screen_positions: Vec::new(),
                    screen_radii: Vec::new(),
                });
                self.pan = Vec2::ZERO;
                self.zoom = 1.0;
            }
            Err(error) => {
                warn!(focus = %self.focus_address, %error, "graph build failed");
                self.build_error = Some(error);
            }
        }
    }
}
