use winit::keyboard::{Key, NamedKey};

use crate::pet::animation::AnimationState;

/// Explicit user actions, from the right-click popup menu or a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    OpenNotes,
    SetState(AnimationState),
    Bigger,
    Smaller,
    Faster,
    Slower,
    SpeedUp,
    SpeedDown,
    Quit,
}

/// Menu layout. `None` entries are separators.
const ITEMS: &[Option<(MenuCommand, &str)>] = &[
    Some((MenuCommand::OpenNotes, "Notes\tN")),
    None,
    Some((MenuCommand::SetState(AnimationState::Walk), "Walk\tW")),
    Some((MenuCommand::SetState(AnimationState::Idle), "Idle\tI")),
    None,
    Some((MenuCommand::Bigger, "Bigger\t+")),
    Some((MenuCommand::Smaller, "Smaller\t-")),
    Some((MenuCommand::Faster, "Animate faster\t]")),
    Some((MenuCommand::Slower, "Animate slower\t[")),
    Some((MenuCommand::SpeedUp, "Walk faster\t.")),
    Some((MenuCommand::SpeedDown, "Walk slower\t,")),
    None,
    Some((MenuCommand::Quit, "Quit\tEsc")),
];

/// Win32 menu ids start here; id = base + index into `ITEMS`.
#[cfg_attr(not(windows), allow(dead_code))]
const ID_BASE: u16 = 1000;

#[cfg_attr(not(windows), allow(dead_code))]
fn command_for_id(id: u16) -> Option<MenuCommand> {
    let index = id.checked_sub(ID_BASE)? as usize;
    ITEMS.get(index).copied().flatten().map(|(cmd, _)| cmd)
}

/// Keyboard shortcut for a logical key.
pub fn command_for_key(key: &Key) -> Option<MenuCommand> {
    match key {
        Key::Named(NamedKey::Escape) => Some(MenuCommand::Quit),
        Key::Character(c) => match c.to_ascii_lowercase().as_str() {
            "n" => Some(MenuCommand::OpenNotes),
            "w" => Some(MenuCommand::SetState(AnimationState::Walk)),
            "i" => Some(MenuCommand::SetState(AnimationState::Idle)),
            "+" | "=" => Some(MenuCommand::Bigger),
            "-" | "_" => Some(MenuCommand::Smaller),
            "]" => Some(MenuCommand::Faster),
            "[" => Some(MenuCommand::Slower),
            "." | ">" => Some(MenuCommand::SpeedUp),
            "," | "<" => Some(MenuCommand::SpeedDown),
            _ => None,
        },
        _ => None,
    }
}

/// Show the context menu at the cursor and wait for a choice.
#[cfg(windows)]
pub fn popup(window: &winit::window::Window) -> Option<MenuCommand> {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, SetForegroundWindow,
        TrackPopupMenu, MF_SEPARATOR, MF_STRING, TPM_LEFTALIGN, TPM_NONOTIFY, TPM_RETURNCMD,
        TPM_TOPALIGN,
    };

    let hwnd = crate::platform::win32::get_hwnd(window)?;
    unsafe {
        let hmenu = match CreatePopupMenu() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Could not create popup menu: {e}");
                return None;
            }
        };

        for (i, item) in ITEMS.iter().enumerate() {
            match item {
                Some((_, label)) => {
                    let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
                    let _ = AppendMenuW(
                        hmenu,
                        MF_STRING,
                        (ID_BASE as usize) + i,
                        PCWSTR(wide.as_ptr()),
                    );
                }
                None => {
                    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, PCWSTR::null());
                }
            }
        }

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        // Required so the menu closes when clicking elsewhere.
        let _ = SetForegroundWindow(hwnd);

        let chosen = TrackPopupMenu(
            hmenu,
            TPM_LEFTALIGN | TPM_TOPALIGN | TPM_RETURNCMD | TPM_NONOTIFY,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        let _ = DestroyMenu(hmenu);

        u16::try_from(chosen.0).ok().and_then(command_for_id)
    }
}

/// No native popup here; the keyboard shortcuts cover every command.
#[cfg(not(windows))]
pub fn popup(_window: &winit::window::Window) -> Option<MenuCommand> {
    log::debug!("No context menu on this platform; use the keyboard shortcuts");
    None
}
