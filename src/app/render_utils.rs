use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

use crate::graph::NodeRole;
use crate::wallet::Direction;

pub(super) const FOCUS_COLOR: Color32 = Color32::from_rgb(242, 178, 62);
pub(super) const EXPLORED_COLOR: Color32 = Color32::from_rgb(158, 130, 233);
pub(super) const PERIPHERAL_COLOR: Color32 = Color32::from_rgb(116, 132, 150);
pub(super) const INCOMING_COLOR: Color32 = Color32::from_rgb(96, 196, 128);
pub(super) const OUTGOING_COLOR: Color32 = Color32::from_rgb(226, 108, 92);
pub(super) const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn role_color(role: NodeRole) -> Color32 {
    match role {
        NodeRole::Focus => FOCUS_COLOR,
        NodeRole::Explored => EXPLORED_COLOR,
        NodeRole::Peripheral => PERIPHERAL_COLOR,
    }
}

pub(super) fn direction_color(direction: Direction) -> Color32 {
    match direction {
        Direction::Incoming => INCOMING_COLOR,
        Direction::Outgoing => OUTGOING_COLOR,
    }
}

/// The focus node reads larger than its peers so the eye lands on it first.
pub(super) fn node_role_radius(role: NodeRole) -> f32 {
    match role {
        NodeRole::Focus => 26.0,
        NodeRole::Explored => 16.0,
        NodeRole::Peripheral => 13.0,
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 20, 27));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let grid_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(56, 66, 78, 64));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid_stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid_stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Coarse bounding-box cull; with the detail cap bounding edge counts, a
/// precise segment/rect intersection is not worth the extra geometry.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Layout space spans `[0, bounds]`; `center` is half the simulation bounds
/// so a zero pan at zoom 1 centers the layout in the canvas.
pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, center: Vec2, world: Vec2) -> Pos2 {
    rect.center() + pan + (world - center) * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, center: Vec2, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom + center
}

pub(super) fn point_segment_distance_sq(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length_sq();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    let projection = start + segment * t;
    (point - projection).length_sq()
}

pub(super) fn draw_arrowhead(painter: &Painter, tip: Pos2, direction: Vec2, size: f32, color: Color32) {
    if direction.length_sq() < 1e-6 {
        return;
    }
    let direction = direction.normalized();
    let back = tip - direction * size;
    let normal = vec2(-direction.y, direction.x) * (size * 0.55);
    painter.add(Shape::convex_polygon(
        vec![tip, back + normal, back - normal],
        color,
        Stroke::NONE,
    ));
}

/// Degenerate edges whose endpoints coincide render as a small loop anchored
/// at the node instead of a zero-length line.
pub(super) fn draw_self_loop(painter: &Painter, center: Pos2, node_radius: f32, stroke: Stroke) {
    let loop_radius = (node_radius * 0.8).max(6.0);
    let anchor = Pos2::new(center.x, center.y - node_radius - loop_radius * 0.6);
    painter.circle_stroke(anchor, loop_radius, stroke);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_mapping_round_trips() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), vec2(800.0, 600.0));
        let pan = vec2(12.0, -30.0);
        let zoom = 1.7;
        let center = vec2(400.0, 300.0);
        let world = vec2(231.0, 478.0);

        let screen = world_to_screen(rect, pan, zoom, center, world);
        let back = screen_to_world(rect, pan, zoom, center, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn point_segment_distance_handles_interior_and_endpoints() {
        let start = Pos2::new(0.0, 0.0);
        let end = Pos2::new(10.0, 0.0);
        assert!((point_segment_distance_sq(Pos2::new(5.0, 3.0), start, end) - 9.0).abs() < 1e-5);
        assert!((point_segment_distance_sq(Pos2::new(-4.0, 0.0), start, end) - 16.0).abs() < 1e-5);
        assert!((point_segment_distance_sq(Pos2::new(13.0, 4.0), start, end) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_segments_measure_distance_to_the_point() {
        let point = Pos2::new(3.0, 4.0);
        let at = Pos2::new(0.0, 0.0);
        assert!((point_segment_distance_sq(point, at, at) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn offscreen_edges_are_culled() {
        let rect = Rect::from_min_size(Pos2::new(0.0, 0.0), vec2(100.0, 100.0));
        assert!(!edge_visible(
            rect,
            Pos2::new(200.0, 200.0),
            Pos2::new(300.0, 300.0),
            2.0
        ));
        assert!(edge_visible(
            rect,
            Pos2::new(-50.0, 50.0),
            Pos2::new(150.0, 50.0),
            2.0
        ));
    }
}
