use std::sync::Arc;
use std::time::Duration;

use glam::IVec2;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use super::{panel_frame, PanelWindow};
use crate::clock::Timer;
use crate::error::RenderError;
use crate::metrics::{self, Level, MetricsSampler, Snapshot};
use crate::render::GpuContext;

pub const STATUS_SIZE: LogicalSize<f64> = LogicalSize::new(250.0, 180.0);
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Passive system-load panel. Dropping it stops sampling.
pub struct StatusPanel {
    host: PanelWindow,
    sampler: MetricsSampler,
    timer: Timer,
    snapshot: Snapshot,
}

impl StatusPanel {
    pub fn attributes(at: IVec2) -> WindowAttributes {
        WindowAttributes::default()
            .with_title("Status")
            .with_decorations(false)
            .with_resizable(false)
            .with_active(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(STATUS_SIZE)
            .with_position(PhysicalPosition::new(at.x, at.y))
    }

    pub fn new(gpu: &GpuContext, window: Arc<Window>, now: Duration) -> Result<Self, RenderError> {
        let host = PanelWindow::new(gpu, window)?;
        let mut sampler = MetricsSampler::new(now);
        let snapshot = sampler.sample(now);
        let mut timer = Timer::periodic(SAMPLE_INTERVAL);
        timer.start(now);
        host.window().request_redraw();
        Ok(Self {
            host,
            sampler,
            timer,
            snapshot,
        })
    }

    pub fn id(&self) -> WindowId {
        self.host.id()
    }

    pub fn host(&mut self) -> &mut PanelWindow {
        &mut self.host
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }

    /// Take a new sample when the refresh timer is due.
    pub fn poll(&mut self, now: Duration) {
        if self.timer.poll(now) {
            self.snapshot = self.sampler.sample(now);
            self.host.window().request_redraw();
        }
    }

    pub fn move_to(&self, at: IVec2) {
        self.host
            .window()
            .set_outer_position(PhysicalPosition::new(at.x, at.y));
    }

    pub fn redraw(&mut self, gpu: &GpuContext) {
        let snapshot = self.snapshot;
        self.host.redraw(gpu, |ctx| draw_ui(ctx, &snapshot));
    }
}

fn level_color(level: Level) -> egui::Color32 {
    match level {
        Level::Normal => egui::Color32::from_rgb(80, 200, 120),
        Level::Elevated => egui::Color32::from_rgb(255, 165, 0),
        Level::Critical => egui::Color32::from_rgb(255, 100, 80),
    }
}

/// Blocky percentage bar.
fn usage_bar(ui: &mut egui::Ui, label: &str, percent: Option<f32>) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{label:<4}")).monospace());
        let (response, painter) =
            ui.allocate_painter(egui::vec2(120.0, 12.0), egui::Sense::hover());
        let r = response.rect;
        painter.rect_filled(r, 0.0, egui::Color32::from_gray(50));
        match percent {
            Some(pct) => {
                let frac = (pct / 100.0).clamp(0.0, 1.0);
                painter.rect_filled(
                    egui::Rect::from_min_max(
                        r.left_top(),
                        egui::pos2(r.left() + r.width() * frac, r.bottom()),
                    ),
                    0.0,
                    level_color(metrics::level(pct)),
                );
                ui.label(egui::RichText::new(format!("{pct:>3.0}%")).monospace());
            }
            None => {
                ui.label(egui::RichText::new(" n/a").monospace());
            }
        }
    });
}

fn rate_label(rate: Option<f64>) -> String {
    rate.map(metrics::format_rate)
        .unwrap_or_else(|| "n/a".to_string())
}

fn draw_ui(ctx: &egui::Context, s: &Snapshot) {
    egui::CentralPanel::default()
        .frame(panel_frame())
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            ui.heading("System");
            ui.add_space(4.0);
            usage_bar(ui, "CPU", s.cpu_percent);
            usage_bar(ui, "MEM", s.memory_percent);
            ui.add_space(8.0);

            ui.heading("Network");
            ui.label(egui::RichText::new(format!("down {}", rate_label(s.down_rate))).monospace());
            ui.label(egui::RichText::new(format!("up   {}", rate_label(s.up_rate))).monospace());
        });
}
