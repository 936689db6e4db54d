use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{BuildError, NodeRole, normalize_weight};
use crate::util::{canonical_address, format_ether, short_address};

use super::super::render_utils::{
    SEARCH_MATCH_COLOR, circle_visible, direction_color, draw_arrowhead, draw_background,
    draw_self_loop, edge_visible, role_color, screen_to_world, world_to_screen,
};
use super::super::{RenderGraph, SearchMatchCache, ViewModel};

const ETHERSCAN_TX_BASE: &str = "https://etherscan.io/tx/";

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, center: Vec2, cache: &mut RenderGraph) {
    cache.screen_positions.clear();
    cache.screen_radii.clear();
    for node in cache.sim.nodes() {
        cache
            .screen_positions
            .push(world_to_screen(rect, pan, zoom, center, node.pos));
        cache
            .screen_radii
            .push((node.radius * zoom.powf(0.5)).clamp(3.0, 52.0));
    }
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.revision == self.revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let cache = self.graph_cache.as_ref()?;
        let matcher = SkimMatcherV2::default();
        let matches = cache
            .graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, &node.address, query).map(|_score| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            revision: self.revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.graph_dirty {
            self.rebuild_render_graph(rect.size());
        }

        draw_background(&painter, rect, self.pan, self.zoom);

        if let Some(error) = self.build_error {
            let message = match error {
                BuildError::NoValidTransactions => "This address has no transactions to display.",
                BuildError::NoValidConnections => {
                    "No connections could be drawn from these transactions.\nTry a different address."
                }
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(15.0),
                Color32::from_gray(205),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        if self.pending_view_reset {
            self.pending_view_reset = false;
            self.start_view_reset(rect);
        }

        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let anim_active = self.advance_view_animation(frame_delta_seconds);
        let search_matches = self.cached_search_matches();

        let pan = self.pan;
        let zoom = self.zoom;
        let live_physics = self.live_physics;
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let drag_started = response.drag_started_by(egui::PointerButton::Primary);
        let drag_active = response.dragged_by(egui::PointerButton::Primary);
        let drag_stopped = response.drag_stopped();

        let mut physics_moving = false;
        let (hovered_node, hovered_edge) = {
            let Some(cache) = self.graph_cache.as_mut() else {
                self.visible_node_count = 0;
                self.visible_edge_count = 0;
                return;
            };
            let center = cache.sim.bounds() * 0.5;

            if live_physics {
                physics_moving = cache.sim.step(frame_delta_seconds);
            }
            update_screen_space(rect, pan, zoom, center, cache);

            let hovered_node =
                Self::hovered_node(pointer, &cache.screen_positions, &cache.screen_radii);
            let hovered_edge = if hovered_node.is_none() {
                Self::hovered_edge(pointer, &cache.graph.edges, &cache.screen_positions)
            } else {
                None
            };

            if drag_started && let Some(index) = hovered_node {
                self.drag = Some(index);
                cache.sim.drag_start(index);
            }
            if let Some(index) = self.drag {
                if drag_active && let Some(pointer_pos) = pointer {
                    cache
                        .sim
                        .drag_move(index, screen_to_world(rect, pan, zoom, center, pointer_pos));
                    update_screen_space(rect, pan, zoom, center, cache);
                }
                if drag_stopped {
                    cache.sim.drag_end(index);
                    self.drag = None;
                }
            }

            (hovered_node, hovered_edge)
        };

        self.handle_graph_pan(&response, self.drag.is_some());

        if hovered_node.is_some() || hovered_edge.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let Some(cache) = self.graph_cache.as_ref() else {
            return;
        };

        if response.clicked_by(egui::PointerButton::Primary) {
            if let Some(index) = hovered_node {
                let address = cache.graph.nodes[index].address.clone();
                self.explored.insert(canonical_address(&address));
                self.pending_expand = Some(address);
            } else if let Some(index) = hovered_edge {
                let url = format!(
                    "{ETHERSCAN_TX_BASE}{}",
                    cache.graph.edges[index].representative_tx
                );
                ui.ctx().open_url(egui::OpenUrl::new_tab(url));
            }
        }

        let zoom_sqrt = zoom.sqrt();
        let mut visible_edges = 0usize;
        for (index, edge) in cache.graph.edges.iter().enumerate() {
            let source_pos = cache.screen_positions[edge.source];
            let target_pos = cache.screen_positions[edge.target];
            let is_hovered = hovered_edge == Some(index);

            let weight = normalize_weight(edge.amount, cache.min_amount, cache.max_amount);
            let mut stroke_width = (weight * zoom_sqrt).clamp(0.6, 7.0);
            let mut stroke_color = direction_color(edge.direction);
            if is_hovered {
                stroke_width += 1.2;
                stroke_color = stroke_color.lerp_to_gamma(Color32::WHITE, 0.25);
            }

            if edge.source == edge.target {
                draw_self_loop(
                    &painter,
                    source_pos,
                    cache.screen_radii[edge.source],
                    Stroke::new(stroke_width, stroke_color),
                );
                visible_edges += 1;
                continue;
            }

            if !edge_visible(rect, source_pos, target_pos, 4.0) {
                continue;
            }

            let delta = target_pos - source_pos;
            let length = delta.length();
            if length <= 1.0 {
                continue;
            }
            let direction = delta / length;
            let start = source_pos + direction * cache.screen_radii[edge.source];
            let arrow_size = (6.0 + stroke_width * 1.6).min(16.0);
            let end = target_pos - direction * (cache.screen_radii[edge.target] + 2.0);

            painter.line_segment(
                [start, end - direction * (arrow_size * 0.5)],
                Stroke::new(stroke_width, stroke_color),
            );
            draw_arrowhead(&painter, end, direction, arrow_size, stroke_color);

            if is_hovered || zoom > 0.55 {
                let mid = start + (end - start) * 0.5;
                let (font, text_color) = if is_hovered {
                    (FontId::proportional(12.5), Color32::from_gray(245))
                } else {
                    (FontId::proportional(11.0), Color32::from_gray(200))
                };
                painter.text(
                    mid + vec2(0.0, -6.0),
                    Align2::CENTER_BOTTOM,
                    format_ether(edge.amount),
                    font,
                    text_color,
                );
            }
            visible_edges += 1;
        }

        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let focus_index = cache.graph.focus_index;
        let mut visible_nodes = 0usize;
        let draw_order = (0..cache.graph.nodes.len())
            .filter(|&index| index != focus_index)
            .chain(std::iter::once(focus_index));
        for index in draw_order {
            let position = cache.screen_positions[index];
            let radius = cache.screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }
            visible_nodes += 1;

            let node = &cache.graph.nodes[index];
            let is_hovered = hovered_node == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let mut fill = role_color(node.role);
            if search_active && !is_match {
                fill = fill.gamma_multiply(0.45);
            }
            if is_hovered {
                fill = fill.lerp_to_gamma(Color32::WHITE, 0.2);
            }

            painter.circle_filled(position, radius, fill);
            let ring = if is_match {
                Stroke::new(2.0, SEARCH_MATCH_COLOR)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(12, 14, 18, 200))
            };
            painter.circle_stroke(position, radius, ring);

            let show_label =
                is_hovered || is_match || node.role != NodeRole::Peripheral || zoom > 1.1;
            if show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_address(&node.address),
                    FontId::proportional(12.0),
                    Color32::from_gray(235),
                );
            }
        }
        self.visible_node_count = visible_nodes;
        self.visible_edge_count = visible_edges;

        if let Some(index) = hovered_node {
            let node = &cache.graph.nodes[index];
            let degree = cache
                .graph
                .edges
                .iter()
                .filter(|edge| edge.source == index || edge.target == index)
                .count();
            let role = match node.role {
                NodeRole::Focus => "focus",
                NodeRole::Explored => "explored",
                NodeRole::Peripheral => "peripheral",
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {role}  |  {degree} connections", node.address),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        } else if let Some(index) = hovered_edge {
            let edge = &cache.graph.edges[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{} {} across {} transfers  |  click to open {}",
                    format_ether(edge.amount),
                    edge.direction.label(),
                    edge.member_count,
                    short_address(&edge.representative_tx),
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if physics_moving || anim_active || response.dragged() {
            ui.ctx().request_repaint();
        }
    }
}
