use eframe::egui::{self, Pos2, Rect, Ui, Vec2, vec2};

use crate::graph::TxEdge;

use super::super::render_utils::{point_segment_distance_sq, screen_to_world};
use super::super::{ViewAnimation, ViewModel};

pub(in crate::app) const ZOOM_MIN: f32 = 0.1;
pub(in crate::app) const ZOOM_MAX: f32 = 4.0;
const RESET_ANIM_SECS: f32 = 0.35;
const EDGE_HOVER_DISTANCE: f32 = 7.0;
const FIT_PADDING: f32 = 60.0;

impl ViewModel {
    fn layout_center(&self) -> Vec2 {
        self.graph_cache
            .as_ref()
            .map(|cache| cache.sim.bounds() * 0.5)
            .unwrap_or(Vec2::ZERO)
    }

    /// Scroll zoom anchored at the pointer, clamped to the fixed range.
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        self.view_anim = None;
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let center = self.layout_center();
        let world_before = screen_to_world(rect, self.pan, self.zoom, center, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.pan = pointer - rect.center() - (world_before - center) * self.zoom;
    }

    /// Pan with secondary/middle drag anywhere, or primary drag on empty
    /// canvas. A primary drag that grabbed a node never pans.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response, dragging_node: bool) {
        let secondary = response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle);
        let primary_on_empty = response.dragged_by(egui::PointerButton::Primary) && !dragging_node;
        if !(secondary || primary_on_empty) {
            return;
        }

        let delta = response.drag_delta();
        if delta != Vec2::ZERO {
            self.view_anim = None;
            self.pan += delta;
        }
    }

    /// Transform that fits the full simulated extent into the canvas.
    pub(in crate::app) fn fit_transform(&self, rect: Rect) -> Option<(Vec2, f32)> {
        let cache = self.graph_cache.as_ref()?;
        let (min, max) = cache.sim.extent()?;
        let size = (max - min).max(vec2(1.0, 1.0));

        let zoom = (((rect.width() - FIT_PADDING) / size.x)
            .min((rect.height() - FIT_PADDING) / size.y))
        .clamp(ZOOM_MIN, ZOOM_MAX);
        let extent_center = min + size * 0.5;
        let pan = -(extent_center - self.layout_center()) * zoom;
        Some((pan, zoom))
    }

    /// Eases pan/zoom back to the fit transform over a short animation.
    pub(in crate::app) fn start_view_reset(&mut self, rect: Rect) {
        let Some((to_pan, to_zoom)) = self.fit_transform(rect) else {
            return;
        };
        self.view_anim = Some(ViewAnimation {
            from_pan: self.pan,
            from_zoom: self.zoom,
            to_pan,
            to_zoom,
            progress: 0.0,
        });
    }

    /// Returns true while the animation is still running.
    pub(in crate::app) fn advance_view_animation(&mut self, dt: f32) -> bool {
        let Some(mut anim) = self.view_anim.take() else {
            return false;
        };

        anim.progress = (anim.progress + dt / RESET_ANIM_SECS).min(1.0);
        let t = anim.progress;
        let eased = t * t * (3.0 - 2.0 * t);
        self.pan = anim.from_pan + (anim.to_pan - anim.from_pan) * eased;
        self.zoom = anim.from_zoom + (anim.to_zoom - anim.from_zoom) * eased;

        if anim.progress < 1.0 {
            self.view_anim = Some(anim);
            true
        } else {
            false
        }
    }

    pub(in crate::app) fn hovered_node(
        pointer: Option<Pos2>,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = pointer?;
        let mut best: Option<(usize, f32)> = None;
        for index in 0..screen_positions.len() {
            let distance = screen_positions[index].distance(pointer);
            if distance <= screen_radii[index] + 2.0
                && best.is_none_or(|(_, best_distance)| distance < best_distance)
            {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    pub(in crate::app) fn hovered_edge(
        pointer: Option<Pos2>,
        edges: &[TxEdge],
        screen_positions: &[Pos2],
    ) -> Option<usize> {
        let pointer = pointer?;
        let threshold_sq = EDGE_HOVER_DISTANCE * EDGE_HOVER_DISTANCE;
        let mut best: Option<(usize, f32)> = None;
        for (index, edge) in edges.iter().enumerate() {
            if edge.source == edge.target
                || edge.source >= screen_positions.len()
                || edge.target >= screen_positions.len()
            {
                continue;
            }
            let distance_sq = point_segment_distance_sq(
                pointer,
                screen_positions[edge.source],
                screen_positions[edge.target],
            );
            if distance_sq <= threshold_sq
                && best.is_none_or(|(_, best_distance)| distance_sq < best_distance)
            {
                best = Some((index, distance_sq));
            }
        }
        best.map(|(index, _)| index)
    }
}
