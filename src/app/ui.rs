use super::{ResultTab, SheetChecker};
use crate::analysis::{Action, DisplayModel, Severity};
use crate::utils::color::{severity_color, tone_color};
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Color32, RichText};

impl SheetChecker {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_status(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Analyse de fichiers Excel");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Détection des erreurs et des doublons de coordonnées")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_drop_zone(ui);

                ui.add_space(20.0);
                self.render_actions(ui);

                if self.state.display().is_some() {
                    ui.add_space(20.0);
                    self.render_results(ui);
                }

                ui.add_space(20.0);
            });
        });
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui) {
        let stroke_color = if self.drop_hover {
            severity_color(Severity::Loading)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };

        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.5, stroke_color))
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label("Glissez-déposez votre fichier Excel ici");
                    ui.add_space(6.0);
                    if ui.button("📁 Parcourir").clicked() {
                        self.pick_file();
                    }
                });

                let mut clear = false;
                if let Some(file) = self.state.file() {
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.label("📄");
                        ui.label(file.name.as_str());
                        ui.label(
                            RichText::new(format!("({})", FileSizeUtils::format_size(file.size_bytes)))
                                .color(Color32::GRAY),
                        );
                        if ui.small_button("✖").on_hover_text("Retirer le fichier").clicked() {
                            clear = true;
                        }
                    });
                }
                if clear {
                    self.state.clear_file();
                }

                self.render_sheet_picker(ui);
            });
    }

    fn render_sheet_picker(&mut self, ui: &mut egui::Ui) {
        if self.state.sheets().is_empty() {
            return;
        }
        let sheets = self.state.sheets().to_vec();
        let selected = self.state.selected_sheet().unwrap_or_default().to_string();
        let mut chosen = None;

        ui.add_space(6.0);
        egui::ComboBox::from_label("Feuille")
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for name in &sheets {
                    if ui.selectable_label(*name == selected, name.as_str()).clicked() {
                        chosen = Some(name.clone());
                    }
                }
            });
        if let Some(name) = chosen {
            self.state.select_sheet(&name);
        }
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_analyzing();
        ui.horizontal(|ui| {
            for action in Action::ALL {
                let button = egui::Button::new(action.label()).min_size(egui::vec2(200.0, 40.0));
                if ui.add_enabled(!busy, button).clicked() {
                    self.run_action(action);
                }
            }
        });
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        let Some(display) = self.state.display().cloned() else {
            return;
        };

        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.colored_label(
                tone_color(display.summary.tone),
                RichText::new(&display.summary.text).strong().size(16.0),
            );

            if display.table.is_some() {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.state.active_tab, ResultTab::Summary, "Résumé");
                    ui.selectable_value(&mut self.state.active_tab, ResultTab::Details, "Détails");
                });
                ui.separator();

                match self.state.active_tab {
                    ResultTab::Summary => render_groups(ui, &display),
                    ResultTab::Details => render_table(ui, &display),
                }
            }

            if display.download_enabled {
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    let button = egui::Button::new("📥 Télécharger le fichier annoté");
                    if ui.add_enabled(self.state.can_download(), button).clicked() {
                        self.start_download();
                    }
                    if let Some(path) = self.state.last_download() {
                        if ui.button("📂 Ouvrir").clicked() {
                            if let Err(e) = open::that(path) {
                                log::warn!("Failed to open {:?}: {}", path, e);
                            }
                        }
                    }
                });
                ui.label(
                    RichText::new(format!("Dossier: {}", self.state.download_dir().display()))
                        .small()
                        .color(Color32::GRAY),
                );
            }
        });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        let notice = self.state.status();
        if notice.text.is_empty() {
            return;
        }
        ui.horizontal(|ui| {
            if notice.severity == Severity::Loading {
                ui.spinner();
            }
            ui.colored_label(severity_color(notice.severity), notice.text.as_str());
        });
    }
}

fn render_groups(ui: &mut egui::Ui, display: &DisplayModel) {
    ui.horizontal_wrapped(|ui| {
        for group in &display.groups {
            egui::Frame::group(ui.style())
                .stroke(egui::Stroke::new(1.0, tone_color(group.tone)))
                .show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.label(RichText::new(group.headline()).strong());
                        if let Some(lines) = group.lines_label() {
                            ui.label(RichText::new(lines).small());
                        }
                    });
                });
        }
    });
}

fn render_table(ui: &mut egui::Ui, display: &DisplayModel) {
    let Some(table) = &display.table else {
        return;
    };
    egui::ScrollArea::both().max_height(320.0).show(ui, |ui| {
        egui::Grid::new("result_table")
            .striped(true)
            .num_columns(table.columns.len())
            .show(ui, |ui| {
                for column in &table.columns {
                    ui.label(RichText::new(column.label()).strong());
                }
                ui.end_row();
                for row in &table.rows {
                    for cell in row {
                        ui.label(cell.as_str());
                    }
                    ui.end_row();
                }
            });
    });
}
