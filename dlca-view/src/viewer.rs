//! Interactive 2D DLCA viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a 2D simulation and its
//! configuration and implements [`eframe::App`] to render and control the
//! aggregation through an egui UI.

use dlca_core::{
    Boundary, Config, Dlca, Geometry, Label, Square2, SquareLattice, StepPolicy,
};
use eframe::App;
use glam::Vec2;
use log::warn;

type Sim = Dlca<SquareLattice<Square2>>;

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the occupied cells coloured by cluster.
///
/// ### Fields
/// - `sim` - Current simulation, `None` if `cfg` could not be built.
/// - `cfg` - Configuration used by the next reset.
/// - `error` - Why the last reset failed, shown in the config panel.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Pixels per lattice cell.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `steps_per_frame` - Engine steps taken per automatic or manual step.
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
pub struct Viewer {
    sim: Option<Sim>,
    cfg: Config,
    error: Option<String>,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    steps_per_frame: u64,
    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer running [`Config::default`].
    pub fn new() -> Self {
        let mut viewer = Self {
            sim: None,
            cfg: Config::default(),
            error: None,
            running: false,
            zoom: 8.0,
            pan: egui::vec2(0.0, 0.0),
            steps_per_frame: 100,
            step_interval: 0.02,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.reset();
        viewer
    }

    /// Builds a fresh simulation from `cfg` and stops auto-running.
    ///
    /// On an invalid configuration the old simulation is dropped and the
    /// error is kept for display.
    fn reset(&mut self) {
        self.running = false;
        match build(&self.cfg) {
            Ok(sim) => {
                self.sim = Some(sim);
                self.error = None;
            }
            Err(err) => {
                warn!("cannot start simulation: {err}");
                self.sim = None;
                self.error = Some(err);
            }
        }
    }

    /// Advances the simulation by `steps_per_frame` steps.
    ///
    /// Stops auto-running once a single cluster is left.
    fn step_once(&mut self) {
        let Some(sim) = self.sim.as_mut() else {
            return;
        };
        sim.run_until(1, self.steps_per_frame);
        if sim.is_converged() {
            self.running = false;
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running && self.sim.is_some();
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=40.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (step counter, clusters, largest cluster).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                if let Some(sim) = &self.sim {
                    ui.label(format!("largest = {}", sim.largest_cluster()));
                    ui.label(format!("clusters = {}", sim.num_clusters()));
                    ui.label(format!("step = {}", sim.counter()));
                    if sim.is_converged() {
                        ui.label("converged");
                    }
                }
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                ui.label("Changes apply on Reset.");

                ui.separator();
                ui.label("Lattice");
                Self::labeled_drag_u32(ui, "extent:", &mut self.cfg.extent, 2..=512, 1.0);
                Self::labeled_drag_usize(
                    ui,
                    "particles:",
                    &mut self.cfg.particles,
                    1..=100_000,
                    1.0,
                );

                ui.separator();
                ui.label("Boundary");
                ui.radio_value(&mut self.cfg.boundary, Boundary::Periodic, "periodic");
                ui.radio_value(&mut self.cfg.boundary, Boundary::Closed, "closed");

                ui.separator();
                ui.label("Moves per step");
                ui.radio_value(
                    &mut self.cfg.policy,
                    StepPolicy::RandomCluster,
                    "one random cluster",
                );
                ui.radio_value(&mut self.cfg.policy, StepPolicy::AllClusters, "all clusters");

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("steps per frame:");
                    ui.add(
                        egui::DragValue::new(&mut self.steps_per_frame)
                            .range(1..=1_000_000)
                            .speed(10.0),
                    );
                });

                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }
            });
    }

    /// Builds the central panel where the lattice is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 40.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if let Some(sim) = &self.sim {
                let geometry = sim.lattice().geometry();
                let extent = geometry.extent();

                // Lattice outline.
                let half = extent as f32 * 0.5;
                let corners = [
                    Vec2::new(-half, -half),
                    Vec2::new(half, -half),
                    Vec2::new(half, half),
                    Vec2::new(-half, half),
                ];
                let points: Vec<egui::Pos2> = corners
                    .iter()
                    .map(|&c| self.world_to_screen(c, rect))
                    .collect();
                painter.add(egui::Shape::closed_line(
                    points,
                    egui::Stroke::new(1.0, egui::Color32::GRAY),
                ));

                // Particles, one square per occupied cell.
                let size = egui::vec2(self.zoom, self.zoom);
                for &label in sim.labels() {
                    let color = label_color(label);
                    for pid in sim.members(label) {
                        let cell = geometry.point(sim.site_of(pid));
                        let p = self.world_to_screen(cell_center(cell, extent), rect);
                        painter.rect_filled(egui::Rect::from_center_size(p, size), 0.0, color);
                    }
                }
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

/// Builds a 2D simulation from `cfg`; the error is rendered for the UI.
fn build(cfg: &Config) -> Result<Sim, String> {
    let cfg = Config { dim: 2, ..*cfg };
    let lattice = SquareLattice::<Square2>::from_config(&cfg).map_err(|e| e.to_string())?;
    Dlca::new(lattice, cfg.particles).map_err(|e| e.to_string())
}

/// World position of the centre of a lattice cell, with the lattice
/// centred on the origin.
fn cell_center(cell: glam::IVec2, extent: u32) -> Vec2 {
    let half = extent as f32 * 0.5;
    cell.as_vec2() + Vec2::splat(0.5 - half)
}

/// A stable, well-spread colour per cluster label.
fn label_color(label: Label) -> egui::Color32 {
    // Golden-ratio hue walk keeps consecutive labels far apart.
    let hue = (label as f32 * 0.618_034).fract();
    egui::ecolor::Hsva::new(hue, 0.65, 0.95, 1.0).into()
}
