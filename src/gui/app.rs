use eframe::egui;
use std::time::{Duration, Instant};

use photo_matting::view::{MattingView, ToastKind};

use crate::fonts::install_cjk_fallback;
use crate::preview::PreviewPane;

const BUTTON_SIZE: egui::Vec2 = egui::vec2(96.0, 32.0);
const PANE_GAP: f32 = 12.0;
const FIELD_WIDTH: f32 = 260.0;

enum DialogAction {
    PickSavePath,
    Confirm,
    Cancel,
}

pub struct MattingApp {
    view: MattingView,
    source_preview: PreviewPane,
    result_preview: PreviewPane,
}

impl MattingApp {
    pub fn new(cc: &eframe::CreationContext<'_>, view: MattingView) -> Self {
        install_cjk_fallback(&cc.egui_ctx);
        Self {
            view,
            source_preview: PreviewPane::new("source"),
            result_preview: PreviewPane::new("result"),
        }
    }

    fn render_previews(&self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let pane = egui::vec2(
            ((available.x - PANE_GAP) / 2.0 - 8.0).max(120.0),
            (available.y - 8.0).max(120.0),
        );

        ui.horizontal(|ui| {
            self.source_preview.show(ui, pane);
            ui.add_space(PANE_GAP);
            self.result_preview.show(ui, pane);
        });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let spacing = ui.spacing().item_spacing.x;
            let row_width = BUTTON_SIZE.x * 3.0 + spacing * 2.0;
            ui.add_space(((ui.available_width() - row_width) / 2.0).max(0.0));

            if ui
                .add(egui::Button::new("打开文件").min_size(BUTTON_SIZE))
                .clicked()
            {
                self.view.open_image();
            }

            let cutout = egui::Button::new("抠图").min_size(BUTTON_SIZE);
            if ui
                .add_enabled(!self.view.is_cutout_in_flight(), cutout)
                .clicked()
            {
                self.view.cutout();
            }

            if ui
                .add(egui::Button::new("设置").min_size(BUTTON_SIZE))
                .clicked()
            {
                self.view.open_settings();
            }
        });
    }

    fn render_settings_dialog(&mut self, ctx: &egui::Context) {
        if !self.view.dialog().is_open() {
            return;
        }

        let mut action = None;
        let modal = egui::Modal::new(egui::Id::new("settings_dialog")).show(ctx, |ui| {
            ui.set_width(FIELD_WIDTH + 160.0);
            ui.heading("设置");
            ui.add_space(8.0);

            let dialog = self.view.dialog_mut();
            egui::Grid::new("settings_form")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("保存地址");
                    ui.horizontal(|ui| {
                        // Only the folder picker may change the path
                        let mut save_path = dialog.draft().save_path.clone();
                        ui.add_enabled(
                            false,
                            egui::TextEdit::singleline(&mut save_path).desired_width(FIELD_WIDTH),
                        );
                        if ui.button("请选择").clicked() {
                            action = Some(DialogAction::PickSavePath);
                        }
                    });
                    ui.end_row();

                    if let Some(message) = dialog.errors().save_path {
                        ui.label("");
                        ui.colored_label(ui.visuals().error_fg_color, message);
                        ui.end_row();
                    }

                    ui.label("Api Key");
                    let response = ui.add(
                        egui::TextEdit::singleline(dialog.api_key_mut()).desired_width(FIELD_WIDTH),
                    );
                    if response.changed() {
                        dialog.revalidate_api_key();
                    }
                    ui.end_row();

                    if let Some(message) = dialog.errors().api_key {
                        ui.label("");
                        ui.colored_label(ui.visuals().error_fg_color, message);
                        ui.end_row();
                    }
                });

            ui.add_space(12.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("确定").clicked() {
                    action = Some(DialogAction::Confirm);
                }
                if ui.button("取消").clicked() {
                    action = Some(DialogAction::Cancel);
                }
            });
        });

        // Escape or a click outside counts as cancel
        if action.is_none() && modal.should_close() {
            action = Some(DialogAction::Cancel);
        }

        match action {
            Some(DialogAction::PickSavePath) => self.view.pick_save_path(),
            Some(DialogAction::Confirm) => {
                self.view.confirm_settings();
            }
            Some(DialogAction::Cancel) => self.view.cancel_settings(),
            None => {}
        }
    }

    fn render_spinner(&self, ctx: &egui::Context) {
        if !self.view.state().is_spinner_visible {
            return;
        }

        let screen = ctx.screen_rect();
        egui::Area::new(egui::Id::new("cutout_spinner"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(140));
                // Swallow input so nothing underneath reacts while the cutout runs
                ui.allocate_rect(screen, egui::Sense::click_and_drag());
                ui.put(
                    egui::Rect::from_center_size(screen.center(), egui::vec2(48.0, 48.0)),
                    egui::Spinner::new().size(48.0),
                );
            });
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        self.view.toasts_mut().expire(Instant::now());
        if self.view.toasts().is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .order(egui::Order::Tooltip)
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 16.0))
            .interactable(false)
            .show(ctx, |ui| {
                for toast in self.view.toasts().iter() {
                    let color = match toast.kind {
                        ToastKind::Success => egui::Color32::from_rgb(82, 196, 26),
                        ToastKind::Error => ui.visuals().error_fg_color,
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, &toast.message);
                    });
                    ui.add_space(6.0);
                }
            });
    }
}

impl eframe::App for MattingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up replies from backend workers
        self.view.poll();

        self.source_preview
            .sync(ctx, &self.view.state().source_image);
        self.result_preview
            .sync(ctx, &self.view.state().result_image);

        egui::TopBottomPanel::bottom("actions").show(ctx, |ui| {
            ui.add_space(8.0);
            self.render_actions(ui);
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_previews(ui);
        });

        self.render_settings_dialog(ctx);
        self.render_spinner(ctx);
        self.render_toasts(ctx);

        if self.view.is_busy() || !self.view.toasts().is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
