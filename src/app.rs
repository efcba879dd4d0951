use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use glam::IVec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::clock;
use crate::config::{self, Settings};
use crate::error::AppError;
use crate::frames::FrameStore;
use crate::menu::{self, MenuCommand};
use crate::notes::NoteStore;
use crate::panels::notes::NotesPanel;
use crate::panels::status::StatusPanel;
use crate::pet::{Companion, Desktop, PointerButton, Request};
use crate::platform;
use crate::render::sprite::SpritePipeline;
use crate::render::{self, GpuContext, WindowSurface};

/// Gap between the companion and the bottom-right corner at startup.
const START_MARGIN: i32 = 50;

/// The desktop as seen at the start of one handler.
struct Screen {
    bounds: IVec2,
    origin: IVec2,
    cursor: Option<IVec2>,
}

impl Desktop for Screen {
    fn available_bounds(&self) -> IVec2 {
        self.bounds
    }

    fn companion_origin(&self) -> IVec2 {
        self.origin
    }

    fn cursor_position(&self) -> Option<IVec2> {
        self.cursor
    }
}

/// Everything that exists once the companion window is up.
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    surface: WindowSurface,
    sprite: SpritePipeline,
}

/// Top-level application state.
struct App {
    settings: Settings,
    settings_path: Option<PathBuf>,
    notes_path: PathBuf,
    frames: FrameStore,
    companion: Companion,
    start: Instant,

    gfx: Option<Graphics>,
    status: Option<StatusPanel>,
    notes: Option<NotesPanel>,
    /// Kept between openings of the notes panel.
    note_store: Option<NoteStore>,

    /// Companion window's top-left corner in screen pixels, as last requested.
    origin: IVec2,
    /// Where the window manager last reported the window. Cursor events are
    /// relative to this, which lags `origin` until the move lands.
    window_at: IVec2,
    /// Pointer inside the companion window, window-local.
    pointer: Option<IVec2>,

    requests: Vec<Request>,
    fatal: Option<AppError>,
}

impl App {
    fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        notes_path: PathBuf,
        frames: FrameStore,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let (w, h) = frames.frame_size();
        let companion = Companion::new(
            frames.lengths(),
            IVec2::new(w as i32, h as i32),
            settings.motion(),
            rng,
        );
        Self {
            settings,
            settings_path,
            notes_path,
            frames,
            companion,
            start: Instant::now(),
            gfx: None,
            status: None,
            notes: None,
            note_store: None,
            origin: IVec2::ZERO,
            window_at: IVec2::ZERO,
            pointer: None,
            requests: Vec::new(),
            fatal: None,
        }
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn screen(&self) -> Screen {
        let bounds = self
            .gfx
            .as_ref()
            .and_then(|gfx| platform::work_area(&gfx.window))
            .map(|(origin, size)| origin + size)
            .unwrap_or(IVec2::new(1920, 1080));
        let cursor = platform::cursor_position().or(self.pointer.map(|p| self.window_at + p));
        Screen {
            bounds,
            origin: self.origin,
            cursor,
        }
    }

    fn global_pointer(&self, local: IVec2) -> IVec2 {
        global_pointer(platform::cursor_position(), self.window_at, local)
    }

    fn create_companion_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or(AppError::NoMonitor)?;

        let size = self.companion.sprite_size();
        let (area_origin, area_size) = {
            let pos = monitor.position();
            let dims = monitor.size();
            (
                IVec2::new(pos.x, pos.y),
                IVec2::new(dims.width as i32, dims.height as i32),
            )
        };
        #[cfg(windows)]
        let (area_origin, area_size) = platform::win32::work_area().unwrap_or((area_origin, area_size));
        let origin = area_origin + area_size - size - IVec2::splat(START_MARGIN);

        // On Windows transparency comes from DxgiFromVisual; with_transparent
        // would add WS_EX_LAYERED and break it.
        let attrs = WindowAttributes::default()
            .with_title("PixelPal")
            .with_decorations(false)
            .with_resizable(false)
            .with_transparent(cfg!(not(windows)))
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(PhysicalSize::new(size.x as u32, size.y as u32))
            .with_position(PhysicalPosition::new(origin.x, origin.y));

        let window = Arc::new(event_loop.create_window(attrs)?);
        platform::setup_companion(&window);

        let (gpu, surface) = GpuContext::new(window.clone())?;
        let sprite = SpritePipeline::new(&gpu.device, &gpu.queue, surface.format(), &self.frames);

        self.origin = window
            .outer_position()
            .map(|p| IVec2::new(p.x, p.y))
            .unwrap_or(origin);
        self.window_at = self.origin;

        log::info!(
            "Companion window {}x{} at {} on {:?}",
            size.x,
            size.y,
            self.origin,
            monitor.name().unwrap_or_default()
        );

        // Show only after styles and GPU resources are ready so DWM never
        // caches a white frame.
        window.set_visible(true);
        window.request_redraw();

        self.gfx = Some(Graphics {
            window,
            gpu,
            surface,
            sprite,
        });
        Ok(())
    }

    fn draw_companion(&mut self) {
        let Some(gfx) = &mut self.gfx else {
            return;
        };
        let Some(mut frame) = gfx.surface.begin_frame(&gfx.gpu.device) else {
            gfx.window.request_redraw();
            return;
        };
        gfx.sprite
            .set_mirrored(&gfx.gpu.queue, self.companion.direction().is_mirrored());
        {
            let mut pass = render::begin_pass(
                &mut frame.encoder,
                &frame.view,
                "sprite_pass",
                wgpu::Color::TRANSPARENT,
            );
            gfx.sprite
                .draw(&mut pass, self.companion.state(), self.companion.frame_index());
        }
        gfx.gpu.finish_frame(frame, Vec::new());
    }

    fn run_command(&mut self, event_loop: &ActiveEventLoop, command: MenuCommand) {
        log::debug!("Menu command {command:?}");
        let out = &mut self.requests;
        match command {
            MenuCommand::OpenNotes => self.companion.open_notes(out),
            MenuCommand::SetState(state) => self.companion.set_state(state, out),
            MenuCommand::Bigger => self.companion.step_scale(1, out),
            MenuCommand::Smaller => self.companion.step_scale(-1, out),
            MenuCommand::Faster => self.companion.step_frame_rate(1),
            MenuCommand::Slower => self.companion.step_frame_rate(-1),
            MenuCommand::SpeedUp => self.companion.step_speed(1),
            MenuCommand::SpeedDown => self.companion.step_speed(-1),
            MenuCommand::Quit => {
                log::info!("Quit requested");
                event_loop.exit();
            }
        }
    }

    /// Carry out queued requests in order.
    fn apply_requests(&mut self, event_loop: &ActiveEventLoop) {
        let requests = std::mem::take(&mut self.requests);
        for request in &requests {
            self.apply(event_loop, *request);
        }
        // Hand the allocation back.
        self.requests = requests;
        self.requests.clear();
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, request: Request) {
        match request {
            Request::Repaint => {
                if let Some(gfx) = &self.gfx {
                    gfx.window.request_redraw();
                }
            }
            Request::MoveTo(pos) => {
                self.origin = pos;
                if let Some(gfx) = &self.gfx {
                    gfx.window
                        .set_outer_position(PhysicalPosition::new(pos.x, pos.y));
                }
            }
            Request::Resize(size) => {
                if let Some(gfx) = &mut self.gfx {
                    let requested = PhysicalSize::new(size.x as u32, size.y as u32);
                    if let Some(applied) = gfx.window.request_inner_size(requested) {
                        gfx.surface
                            .resize(&gfx.gpu.device, applied.width, applied.height);
                    }
                }
            }
            Request::ShowNotes => self.show_notes(event_loop),
            Request::CloseNotes => {
                if let Some(panel) = self.notes.take() {
                    self.note_store = Some(panel.close());
                    log::info!("Notes closed");
                }
            }
            Request::ShowStatus { at } => self.show_status(event_loop, at),
            Request::CloseStatus => {
                if self.status.take().is_some() {
                    log::debug!("Status panel closed");
                }
            }
        }
    }

    fn show_notes(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(panel) = &self.notes {
            panel.focus();
            return;
        }
        let Some(gfx) = &self.gfx else {
            return;
        };
        let store = self
            .note_store
            .take()
            .unwrap_or_else(|| NoteStore::open(self.notes_path.clone()));
        let result = event_loop
            .create_window(NotesPanel::attributes())
            .map_err(AppError::from)
            .and_then(|window| Ok(NotesPanel::new(&gfx.gpu, Arc::new(window), store)?));
        match result {
            Ok(panel) => self.notes = Some(panel),
            Err(e) => {
                log::error!("Could not open notes: {e}");
                self.companion.notes_closed();
            }
        }
    }

    fn show_status(&mut self, event_loop: &ActiveEventLoop, at: IVec2) {
        if let Some(panel) = &self.status {
            panel.move_to(at);
            return;
        }
        let Some(gfx) = &self.gfx else {
            return;
        };
        let now = self.now();
        let result = event_loop
            .create_window(StatusPanel::attributes(at))
            .map_err(AppError::from)
            .and_then(|window| Ok(StatusPanel::new(&gfx.gpu, Arc::new(window), now)?));
        match result {
            Ok(panel) => {
                log::debug!("Status panel shown at {at}");
                self.status = Some(panel);
            }
            Err(e) => {
                log::error!("Could not open status panel: {e}");
                self.companion.status_closed();
            }
        }
    }

    fn companion_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        let now = self.now();
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.surface
                        .resize(&gfx.gpu.device, new_size.width, new_size.height);
                    gfx.window.request_redraw();
                }
            }
            WindowEvent::Moved(pos) => {
                self.window_at = IVec2::new(pos.x, pos.y);
                self.origin = self.window_at;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let local = IVec2::new(position.x as i32, position.y as i32);
                self.pointer = Some(local);
                let global = self.global_pointer(local);
                self.companion.pointer_moved(now, global, &mut self.requests);
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
                self.companion.pointer_left(&mut self.requests);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    _ => PointerButton::Other,
                };
                match state {
                    ElementState::Pressed => {
                        let local = self.pointer.unwrap_or(IVec2::ZERO);
                        let global = self.global_pointer(local);
                        self.companion
                            .pointer_pressed(now, button, local, global, &mut self.requests);
                        if button == PointerButton::Secondary {
                            // The popup blocks; settle pending effects first.
                            self.apply_requests(event_loop);
                            let chosen = self.gfx.as_ref().and_then(|gfx| menu::popup(&gfx.window));
                            if let Some(command) = chosen {
                                self.run_command(event_loop, command);
                            }
                        }
                    }
                    ElementState::Released => {
                        if let Some(gesture) =
                            self.companion.pointer_released(button, &mut self.requests)
                        {
                            log::debug!("{gesture:?}, paused={}", self.companion.is_paused());
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let Some(command) = menu::command_for_key(&event.logical_key) {
                        self.run_command(event_loop, command);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.draw_companion(),
            _ => {}
        }
    }

    /// Route an event to the notes or status panel. Returns false if the
    /// window belongs to neither.
    fn panel_event(&mut self, window_id: WindowId, event: &WindowEvent) -> bool {
        let Some(gfx) = &self.gfx else {
            return false;
        };

        if let Some(panel) = self.notes.as_mut().filter(|p| p.id() == window_id) {
            match event {
                WindowEvent::CloseRequested => {
                    if let Some(panel) = self.notes.take() {
                        self.note_store = Some(panel.close());
                    }
                    self.companion.notes_closed();
                    log::info!("Notes closed by user");
                }
                WindowEvent::Resized(size) => panel.host().resize(&gfx.gpu, size.width, size.height),
                WindowEvent::RedrawRequested => panel.redraw(&gfx.gpu),
                other => panel.host().on_window_event(other),
            }
            return true;
        }

        if let Some(panel) = self.status.as_mut().filter(|p| p.id() == window_id) {
            match event {
                WindowEvent::CloseRequested => {
                    self.status = None;
                    self.companion.status_closed();
                }
                WindowEvent::Resized(size) => panel.host().resize(&gfx.gpu, size.width, size.height),
                WindowEvent::RedrawRequested => panel.redraw(&gfx.gpu),
                other => panel.host().on_window_event(other),
            }
            return true;
        }

        false
    }

    /// Sleep until the earliest armed timer.
    fn schedule(&self, event_loop: &ActiveEventLoop) {
        let deadline = clock::earliest([
            self.companion.next_deadline(),
            self.status.as_ref().and_then(StatusPanel::next_deadline),
        ]);
        match deadline {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(self.start + at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    /// Stop the clock, close every panel and persist adjustments. Runs once.
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        self.companion.teardown(&mut self.requests);
        self.apply_requests(event_loop);
        // Panels the coordinator never knew about (e.g. a create failure race).
        self.status = None;
        if let Some(panel) = self.notes.take() {
            self.note_store = Some(panel.close());
        }

        self.settings.set_motion(self.companion.params());
        if let Some(path) = &self.settings_path {
            match config::save_settings_atomic(path, &self.settings) {
                Ok(()) => log::info!("Settings saved to {}", path.display()),
                Err(e) => log::error!("Could not save settings to {}: {e}", path.display()),
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        if let Err(e) = self.create_companion_window(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        let now = self.now();
        self.companion.start(now);
        self.schedule(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_none() {
            return;
        }
        let now = self.now();
        let screen = self.screen();
        self.companion.update(now, &screen, &mut self.requests);
        if let Some(status) = &mut self.status {
            status.poll(now);
        }
        self.apply_requests(event_loop);
        self.schedule(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let is_companion = self
            .gfx
            .as_ref()
            .is_some_and(|gfx| gfx.window.id() == window_id);
        if is_companion {
            self.companion_event(event_loop, event);
        } else {
            self.panel_event(window_id, &event);
        }
        self.apply_requests(event_loop);
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.teardown(event_loop);
        log::info!("Goodbye");
    }
}

/// Screen position of a window-local pointer. Prefers the OS cursor, and
/// otherwise offsets from where the window actually is.
fn global_pointer(cursor: Option<IVec2>, window_at: IVec2, local: IVec2) -> IVec2 {
    cursor.unwrap_or(window_at + local)
}

/// Load settings and frames, then run the event loop until quit.
pub fn run(frames_dir: Option<PathBuf>) -> Result<(), AppError> {
    let paths = config::project_paths();
    let settings_path = paths.as_ref().map(|p| p.settings.clone());
    let mut settings = match &settings_path {
        Some(path) => config::load_settings(path),
        None => {
            log::warn!("No config directory; using default settings");
            Settings::default()
        }
    };
    if let Some(dir) = frames_dir {
        settings.frames_dir = dir;
    }
    let notes_path = settings
        .notes_file
        .clone()
        .or_else(|| paths.map(|p| p.notes))
        .unwrap_or_else(|| PathBuf::from("memos.json"));

    let (frames, warnings) = FrameStore::load_dir(&settings.frames_dir, settings.frame_counts())?;
    for warning in &warnings {
        log::warn!("{} frame unavailable: {}", warning.state, warning.error);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, settings_path, notes_path, frames);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::movement::MotionParams;

    fn companion() -> Companion {
        let mut c = Companion::new(
            [5, 6],
            IVec2::new(16, 16),
            MotionParams::default(),
            fastrand::Rng::with_seed(3),
        );
        c.start(Duration::ZERO);
        c
    }

    fn moves(out: &[Request]) -> Vec<IVec2> {
        out.iter()
            .filter_map(|r| match r {
                Request::MoveTo(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn os_cursor_wins_over_window_offset() {
        let g = global_pointer(Some(IVec2::new(5, 6)), IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(g, IVec2::new(5, 6));
        let g = global_pointer(None, IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(g, IVec2::new(110, 110));
    }

    #[test]
    fn drag_does_not_overshoot_while_window_lags() {
        let mut c = companion();
        let mut out = Vec::new();
        let window_at = IVec2::new(300, 200);
        let press = IVec2::new(20, 20);
        let d = IVec2::new(10, 0);

        c.pointer_pressed(
            Duration::from_millis(0),
            PointerButton::Primary,
            press,
            global_pointer(None, window_at, press),
            &mut out,
        );

        // The window manager has not applied any move yet, so locals keep
        // growing relative to the old position.
        for step in 1..=3 {
            let local = press + d * step;
            let global = global_pointer(None, window_at, local);
            c.pointer_moved(Duration::from_millis(step as u64), global, &mut out);
        }

        assert_eq!(
            moves(&out),
            vec![window_at + d, window_at + d * 2, window_at + d * 3]
        );
    }
}
