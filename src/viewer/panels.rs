use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, RichText, Ui};

use aop_layout::GroupingMode;
use aop_layout::util::short_label;

use super::{ViewModel, loading_screen};

impl ViewModel {
    pub(in crate::viewer) fn show(
        &mut self,
        ctx: &Context,
        path: &Path,
        is_loading: bool,
    ) -> bool {
        let mut reload_requested = false;
        if self.layout_dirty {
            self.rebuild_layout();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("aop-layout");
                    ui.separator();
                    ui.label(format!("file: {}", path.display()));
                    ui.label(format!("records: {} nodes", self.graph.nodes.len()));
                    ui.label(format!("{} edges", self.graph.edges.len()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload file"));
                    reload_requested = reload_button.clicked();
                    if ui.button("Re-run layout").clicked() {
                        self.layout_dirty = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(layout) = &self.layout {
                            ui.label(format!(
                                "{} nodes in {} hypernodes",
                                layout.model.node_count(),
                                layout.result.hypernodes.len()
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                loading_screen(ui, "Reloading AOP graph...");
            } else {
                self.draw_graph(ui);
            }
        });

        reload_requested
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;

        changed |= ui
            .add(egui::Slider::new(&mut self.config.max_group_size, 1..=16).text("Max group size"))
            .on_hover_text("Type groups larger than this are split into numbered hypernodes.")
            .changed();

        ui.horizontal_wrapped(|ui| {
            changed |= ui
                .selectable_value(&mut self.config.grouping_mode, GroupingMode::ByType, "By type")
                .on_hover_text("One hypernode per node type, split by the max group size.")
                .changed();
            changed |= ui
                .selectable_value(
                    &mut self.config.grouping_mode,
                    GroupingMode::ByConnectedComponent,
                    "By component",
                )
                .on_hover_text("One hypernode per connected component.")
                .changed();
        });

        changed |= ui
            .checkbox(&mut self.config.include_chemicals, "Group chemicals")
            .on_hover_text("When off, every chemical gets a standalone container.")
            .changed();
        changed |= ui
            .checkbox(&mut self.config.drop_isolated, "Drop isolated events")
            .on_hover_text("Chemical and weight-of-evidence nodes are always kept.")
            .changed();

        ui.collapsing("Simulation", |ui| {
            changed |= ui
                .add(egui::Slider::new(&mut self.config.simulation.iterations, 0..=400).text("Iterations"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut self.config.simulation.damping, 0.5..=1.0).text("Damping"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut self.config.geometry.size_boost, 0.0..=2.0).text("Centrality size boost"))
                .changed();
            changed |= ui
                .add(egui::DragValue::new(&mut self.config.seed).prefix("seed "))
                .changed();
        });

        if changed {
            self.layout_dirty = true;
        }

        ui.separator();
        ui.label("Search (id or label)");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.refresh_search();
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("search_hits")
            .max_height(220.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for hit in &self.search_hits {
                    let is_selected = self.selected.as_deref() == Some(hit.id.as_str());
                    let text = format!("{}  [{}]", short_label(&hit.label, 36), hit.kind.short_label());
                    if ui
                        .selectable_label(is_selected, text)
                        .on_hover_text(hit.id.as_str())
                        .clicked()
                    {
                        clicked = Some(hit.id.clone());
                    }
                }
            });
        if let Some(id) = clicked {
            self.set_selected(Some(id));
        }

        ui.separator();
        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
    }

    fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.separator();

        if let Some(error) = &self.layout_error {
            ui.label(RichText::new(error.as_str()).color(egui::Color32::from_rgb(228, 102, 96)));
            return;
        }

        let Some(layout) = &self.layout else {
            ui.label("No layout yet.");
            return;
        };

        if let Some(selected) = &self.selected
            && let Some(node) = layout.model.node(selected)
        {
            let record = layout.result.centrality.get(selected).copied().unwrap_or_default();
            ui.label(RichText::new(node.label.as_str()).strong());
            ui.label(format!("id: {}", node.id));
            ui.label(format!("type: {}", node.group_key()));
            ui.label(format!("degree: {}", record.degree));
            ui.label(format!("betweenness: {:.2}", record.betweenness));

            if let Some(highlight) = &self.highlight {
                ui.add_space(4.0);
                ui.label(format!(
                    "on path: {} nodes, {} edges, {} hypernodes",
                    highlight.nodes.len(),
                    highlight.edges.len(),
                    highlight.hypernodes.len()
                ));
            }
            ui.separator();
        } else {
            ui.label("Click a node to highlight its pathway.");
            ui.separator();
        }

        if let Some(summary) = &self.summary {
            ui.label(RichText::new("Network").strong());
            ui.label(format!("nodes: {}  edges: {}", summary.nodes, summary.edges));
            ui.label(format!("density: {:.3}", summary.density));
            ui.label(format!("components: {}", summary.connected_components));
            ui.label(format!("avg degree: {:.2}", summary.average_degree));
            ui.label(format!("avg clustering: {:.3}", summary.average_clustering));
            for (kind, count) in &summary.type_distribution {
                ui.label(format!("  {kind}: {count}"));
            }
        }

        let report = layout.model.report();
        let dropped = report.nodes_without_id
            + report.duplicate_nodes
            + report.isolated_nodes_dropped
            + report.dangling_edges
            + report.duplicate_edges;
        if dropped > 0 || !layout.result.diagnostics.is_empty() {
            ui.separator();
            ui.label(RichText::new("Diagnostics").strong());
            ui.label(format!(
                "dropped: {} isolated, {} dangling edges, {} duplicates",
                report.isolated_nodes_dropped,
                report.dangling_edges,
                report.duplicate_nodes + report.duplicate_edges
            ));
            for diagnostic in &layout.result.diagnostics {
                ui.label(format!("{diagnostic:?}"));
            }
        }
    }
}
