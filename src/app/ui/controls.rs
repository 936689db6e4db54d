use eframe::egui::{Color32, Key, Sense, Ui, vec2};

use crate::util::format_ether;
use crate::wallet::{DetailLevel, Direction};

use super::super::ViewModel;
use super::super::render_utils::{
    EXPLORED_COLOR, FOCUS_COLOR, INCOMING_COLOR, OUTGOING_COLOR, PERIPHERAL_COLOR,
};

fn legend_row(ui: &mut Ui, color: Color32, label: &str) {
    ui.horizontal(|ui| {
        let (rect, _response) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
        ui.painter().circle_filled(rect.center(), 4.5, color);
        ui.label(label);
    });
}

impl ViewModel {
    fn activity_span_days(&self) -> Option<i64> {
        let mut earliest = i64::MAX;
        let mut latest = i64::MIN;
        for record in &self.transactions {
            if record.timestamp <= 0 {
                continue;
            }
            earliest = earliest.min(record.timestamp);
            latest = latest.max(record.timestamp);
        }
        (earliest <= latest).then(|| (latest - earliest) / 86_400)
    }

    fn outgoing_gas_cost(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|record| record.direction == Direction::Outgoing)
            .map(|record| record.gas_cost)
            .sum()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Neighborhood");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Inspect address")
            .on_hover_text("Start a fresh exploration session from this address.");
        let input_response = ui.text_edit_singleline(&mut self.inspect_input);
        let submitted =
            input_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
        if (submitted || ui.button("Inspect").clicked())
            && !self.inspect_input.trim().is_empty()
        {
            self.pending_inspect = Some(self.inspect_input.trim().to_owned());
        }

        ui.separator();

        ui.label("Detail level")
            .on_hover_text("Caps how many transaction records feed the graph.");
        ui.horizontal(|ui| {
            for level in [DetailLevel::Low, DetailLevel::Medium, DetailLevel::High] {
                let changed = ui
                    .selectable_value(&mut self.detail, level, level.label())
                    .on_hover_text(format!("Consider up to {} records.", level.record_cap()))
                    .changed();
                if changed {
                    self.graph_dirty = true;
                }
            }
        });

        ui.separator();

        ui.label("Search (address fragment)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live layout")
            .on_hover_text("Advance the force simulation each frame until it settles.");
        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.pending_view_reset = true;
            }
            if ui.button("Re-run layout").clicked() {
                self.graph_dirty = true;
            }
        });

        ui.separator();

        ui.label("Legend");
        legend_row(ui, FOCUS_COLOR, "focus address");
        legend_row(ui, EXPLORED_COLOR, "explored");
        legend_row(ui, PERIPHERAL_COLOR, "peripheral");
        legend_row(ui, INCOMING_COLOR, "incoming value");
        legend_row(ui, OUTGOING_COLOR, "outgoing value");

        ui.separator();

        ui.label(format!("Explored addresses: {}", self.explored.len()));
        if let Some(days) = self.activity_span_days() {
            ui.label(format!("Activity span: {days} days"));
        }
        let gas = self.outgoing_gas_cost();
        if gas > 0.0 {
            ui.label(format!("Gas spent (outgoing): {}", format_ether(gas)));
        }

        if let Some(error) = self.build_error {
            ui.add_space(6.0);
            ui.colored_label(Color32::from_rgb(235, 130, 100), error.to_string());
        }
    }
}
