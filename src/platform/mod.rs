#[cfg(windows)]
pub mod win32;

use glam::IVec2;
use winit::window::Window;

/// Usable desktop area as (origin, size).
///
/// Windows reports the work area minus the taskbar; elsewhere the
/// companion's current monitor is the best answer winit can give.
pub fn work_area(window: &Window) -> Option<(IVec2, IVec2)> {
    #[cfg(windows)]
    {
        if let Some(area) = win32::work_area() {
            return Some(area);
        }
    }

    let monitor = window.current_monitor().or_else(|| window.primary_monitor())?;
    let pos = monitor.position();
    let size = monitor.size();
    Some((
        IVec2::new(pos.x, pos.y),
        IVec2::new(size.width as i32, size.height as i32),
    ))
}

/// Global cursor position, even outside our own windows.
#[cfg(windows)]
pub fn cursor_position() -> Option<IVec2> {
    win32::cursor_pos()
}

/// winit only reports the cursor while it is over one of our windows.
#[cfg(not(windows))]
pub fn cursor_position() -> Option<IVec2> {
    None
}

/// Platform-specific styling for the companion window.
#[cfg(windows)]
pub fn setup_companion(window: &Window) {
    win32::setup_companion(window);
}

#[cfg(not(windows))]
pub fn setup_companion(_window: &Window) {}
