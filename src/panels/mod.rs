pub mod notes;
pub mod status;

use std::sync::Arc;

use winit::window::{Window, WindowId};

use crate::error::RenderError;
use crate::render::{self, GpuContext, WindowSurface};

/// Background behind every panel.
const PANEL_FILL: egui::Color32 = egui::Color32::from_rgb(24, 24, 28);

/// Auxiliary egui window shown beside the companion: a winit window with
/// its own surface and egui state.
pub struct PanelWindow {
    window: Arc<Window>,
    surface: WindowSurface,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl PanelWindow {
    pub fn new(gpu: &GpuContext, window: Arc<Window>) -> Result<Self, RenderError> {
        let surface = WindowSurface::new(gpu, window.clone())?;
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            surface.format(),
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Ok(Self {
            window,
            surface,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Forward a winit event to egui, asking for a redraw when egui wants one.
    pub fn on_window_event(&mut self, event: &winit::event::WindowEvent) {
        let response = self.egui_state.on_window_event(&self.window, event);
        if response.repaint {
            self.window.request_redraw();
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        self.surface.resize(&gpu.device, width, height);
        self.window.request_redraw();
    }

    /// Run one egui frame with `ui` and present it.
    pub fn redraw(&mut self, gpu: &GpuContext, ui: impl FnMut(&egui::Context)) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, ui);

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let wants_repaint = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());

        let pixels_per_point = full_output.pixels_per_point;
        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, pixels_per_point);
        let textures_delta = full_output.textures_delta;

        let Some(mut frame) = self.surface.begin_frame(&gpu.device) else {
            self.window.request_redraw();
            return;
        };

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface.config.width, self.surface.config.height],
            pixels_per_point,
        };

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let extra = self.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut frame.encoder,
            &primitives,
            &screen_descriptor,
        );

        {
            // egui covers the whole window; the clear only shows during resizes.
            let clear = wgpu::Color {
                r: PANEL_FILL.r() as f64 / 255.0,
                g: PANEL_FILL.g() as f64 / 255.0,
                b: PANEL_FILL.b() as f64 / 255.0,
                a: 1.0,
            };
            let mut pass = render::begin_pass(&mut frame.encoder, &frame.view, "panel_pass", clear);
            self.egui_renderer
                .render(&mut pass, &primitives, &screen_descriptor);
        }

        gpu.finish_frame(frame, extra);

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        if wants_repaint {
            self.window.request_redraw();
        }
    }
}

/// The frame every panel draws its content in.
fn panel_frame() -> egui::Frame {
    egui::Frame::NONE.fill(PANEL_FILL).inner_margin(10.0)
}
