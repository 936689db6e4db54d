use std::collections::HashSet;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::util::{canonical_address, short_address};
use crate::wallet::{DetailLevel, TransactionRecord};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(
        focus_address: String,
        transactions: Vec<TransactionRecord>,
        detail: DetailLevel,
        mut explored: HashSet<String>,
    ) -> Self {
        explored.insert(canonical_address(&focus_address));

        Self {
            focus_address,
            transactions,
            detail,
            explored,
            search: String::new(),
            inspect_input: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            view_anim: None,
            pending_view_reset: false,
            live_physics: true,
            graph_dirty: true,
            revision: 0,
            graph_cache: None,
            build_error: None,
            drag: None,
            pending_expand: None,
            pending_inspect: None,
            search_match_cache: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, is_fetching: bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("txscope");
                    ui.separator();
                    ui.label(format!("focus: {}", short_address(&self.focus_address)))
                        .on_hover_text(&self.focus_address);
                    ui.label(format!("transactions: {}", self.transactions.len()));
                    if let Some(cache) = &self.graph_cache {
                        ui.label(format!("nodes: {}", cache.graph.node_count()));
                        ui.label(format!("edges: {}", cache.graph.edge_count()));
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if is_fetching {
                            ui.spinner();
                            ui.label("fetching...");
                        } else if self.visible_node_count > 0 {
                            ui.label(format!(
                                "visible: {} nodes / {} edges",
                                self.visible_node_count, self.visible_edge_count
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_fetching {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading transaction neighborhood...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_model_counts_its_focus_as_explored() {
        let model = ViewModel::new(
            "0xAbCd00000000000000000000000000000000Ef12".to_owned(),
            Vec::new(),
            DetailLevel::Medium,
            HashSet::new(),
        );
        assert!(model.explored.contains("0xabcd00000000000000000000000000000000ef12"));
        assert_eq!(model.explored.len(), 1);
        assert!(model.graph_dirty);
    }

    #[test]
    fn an_expanded_model_keeps_the_prior_explored_set() {
        let prior: HashSet<String> = ["0xaaa".to_owned(), "0xbbb".to_owned()]
            .into_iter()
            .collect();
        let model = ViewModel::new("0xccc".to_owned(), Vec::new(), DetailLevel::Low, prior);
        assert_eq!(model.explored.len(), 3);
        assert!(model.explored.contains("0xccc"));
        assert!(model.explored.contains("0xaaa"));
    }
}
