//! Frontend module - the eframe application
//!
//! One rendered frame does everything the cooperative model requires:
//! drain host events (list responses feed the synchronizer), fire the
//! periodic list request when due, report focus transitions, draw the
//! trace canvas, and render the control table. All callback dispatch is
//! serialized on the UI thread; the host side only ever touches the
//! channel bridge.

pub mod traces;

use crate::config::{AppConfig, AppState};
use crate::decode::KindMemory;
use crate::host::{HostBridge, HostEvent};
use crate::protocol::{ClientMessage, WatcherCommand};
use crate::sync::{GroupEdit, WatcherSync};

/// The WatchVis eframe application
pub struct WatchVisApp {
    bridge: HostBridge,
    sync: WatcherSync,
    kinds: KindMemory,
    config: AppConfig,
    app_state: AppState,
    /// Clock mark for the next periodic list request
    next_list_request_ms: f64,
    /// Last reported focus state; `None` until first frame
    window_active: Option<bool>,
}

impl WatchVisApp {
    /// Create the application and issue the initial list request
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        bridge: HostBridge,
        config: AppConfig,
        app_state: AppState,
    ) -> Self {
        if app_state.ui_preferences.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }

        bridge.send(ClientMessage::command(WatcherCommand::list()));
        let next_list_request_ms = bridge.clock().now_ms() + config.list_period_ms as f64;

        Self {
            bridge,
            sync: WatcherSync::new(),
            kinds: KindMemory::new(),
            config,
            app_state,
            next_list_request_ms,
            window_active: None,
        }
    }

    /// Report focus transitions to the host as activity events
    fn report_activity(&mut self, active: bool) {
        if self.window_active != Some(active) {
            self.window_active = Some(active);
            self.bridge.send(ClientMessage::activity(active));
        }
    }

    /// Issue the periodic list request when due. The timer fires on a
    /// fixed period whether or not a response ever arrived.
    fn poll_list_request(&mut self, now_ms: f64) {
        if now_ms >= self.next_list_request_ms {
            self.bridge.send(ClientMessage::command(WatcherCommand::list()));
            self.next_list_request_ms = now_ms + self.config.list_period_ms as f64;
        }
    }

    fn process_host_events(&mut self, now_ms: f64) {
        for event in self.bridge.drain() {
            match event {
                HostEvent::Control(envelope) => match envelope.watcher {
                    Some(payload) => {
                        self.sync.on_list_received(&payload);
                        // remember per-channel kinds for untagged buffers
                        for (index, group) in self.sync.groups().iter().enumerate() {
                            let kind = group
                                .type_code
                                .chars()
                                .next()
                                .and_then(crate::types::WatcherKind::from_code);
                            self.kinds.record(index, kind);
                        }
                        // re-arm the request timer after each processed response
                        self.next_list_request_ms = now_ms + self.config.list_period_ms as f64;
                    }
                    None => tracing::debug!("Control message without watcher payload"),
                },
            }
        }
    }

    fn header(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label(format!("{}Hz", self.sync.sample_rate()));
            ui.label(self.sync.latest_timestamp().to_string());
            if self.kinds.compat_mode() {
                ui.label("(compat)");
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .checkbox(&mut self.app_state.ui_preferences.dark_mode, "Dark")
                    .changed()
                {
                    if self.app_state.ui_preferences.dark_mode {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }
            });
        });
    }

    fn control_table(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        // deferred edits to avoid emitting commands mid-iteration
        let mut edits: Vec<(String, GroupEdit)> = Vec::new();

        egui::Grid::new("watcher-controls")
            .striped(true)
            .min_col_width(30.0)
            .show(ui, |ui| {
                ui.label("");
                ui.label("W");
                ui.label("C");
                ui.label("L");
                ui.label("control value");
                ui.label("control mask");
                ui.label("type");
                ui.label("list value");
                ui.label("monitor interval");
                ui.label("monitor timestamp");
                ui.label("monitor value");
                ui.end_row();

                for group in self.sync.groups_mut() {
                    ui.label(group.name.as_str());

                    if ui.checkbox(&mut group.watched, "").changed() {
                        edits.push((group.name.clone(), GroupEdit::Watched(group.watched)));
                    }
                    if ui.checkbox(&mut group.controlled, "").changed() {
                        edits.push((group.name.clone(), GroupEdit::Controlled(group.controlled)));
                    }
                    let logged = ui
                        .checkbox(&mut group.logged, "")
                        .on_hover_text(group.log_file_name.as_str());
                    if logged.changed() {
                        edits.push((group.name.clone(), GroupEdit::Logged(group.logged)));
                    }

                    if ui
                        .add(egui::TextEdit::singleline(&mut group.value_input).desired_width(110.0))
                        .changed()
                    {
                        edits.push((group.name.clone(), GroupEdit::Value(group.value_input.clone())));
                    }

                    if group.has_mask() {
                        if ui
                            .add(
                                egui::TextEdit::singleline(&mut group.mask_input)
                                    .desired_width(110.0),
                            )
                            .changed()
                        {
                            edits.push((group.name.clone(), GroupEdit::Mask(group.mask_input.clone())));
                        }
                    } else {
                        ui.label("");
                    }

                    ui.label(group.type_code.as_str());
                    ui.label(group.value_display.as_str());

                    if ui
                        .add(
                            egui::TextEdit::singleline(&mut group.monitor_input)
                                .desired_width(110.0),
                        )
                        .changed()
                    {
                        edits.push((
                            group.name.clone(),
                            GroupEdit::MonitorPeriod(group.monitor_input.clone()),
                        ));
                    }

                    ui.label(group.monitor_timestamp.as_str());
                    ui.label(group.monitor_value.as_str());
                    ui.end_row();
                }
            });

        for (name, edit) in edits {
            if let Some(cmd) = self.sync.on_user_edit(&name, edit, now_ms) {
                tracing::debug!("Sending {:?}", cmd);
                self.bridge.send(ClientMessage::command(cmd));
            }
        }
    }
}

impl eframe::App for WatchVisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now_ms = self.bridge.clock().now_ms();

        let active = ctx.input(|i| i.focused);
        self.report_activity(active);

        self.poll_list_request(now_ms);
        self.process_host_events(now_ms);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.header(ui, ctx);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            // the canvas rect tracks the panel, so resizes are picked up
            // on the next frame
            let rect = ui.max_rect();
            let buffers = self.bridge.buffers();
            traces::draw_traces(
                ui.painter(),
                rect,
                &buffers,
                &mut self.sync,
                &mut self.kinds,
                now_ms,
                self.config.trace_scale,
                self.config.trace_offset,
            );
            self.control_table(ui, now_ms);
        });

        // buffers refresh outside the event loop, keep drawing
        ctx.request_repaint();
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }
    }
}
