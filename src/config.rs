use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::pet::movement::MotionParams;

/// User settings, persisted as JSON in the platform config directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `idle_<n>.png` and `walk_<n>.png`.
    pub frames_dir: PathBuf,
    pub idle_frames: usize,
    pub walk_frames: usize,
    pub scale_factor: u32,
    pub frame_rate_hz: u32,
    pub speed: u32,
    /// Fixed seed for the random source; random per run when absent.
    pub seed: Option<u64>,
    /// Overrides where notes are stored.
    pub notes_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let motion = MotionParams::default();
        Self {
            frames_dir: PathBuf::from("frames"),
            idle_frames: 5,
            walk_frames: 6,
            scale_factor: motion.scale_factor,
            frame_rate_hz: motion.frame_rate_hz,
            speed: motion.speed,
            seed: None,
            notes_file: None,
        }
    }
}

impl Settings {
    pub fn motion(&self) -> MotionParams {
        MotionParams {
            speed: self.speed,
            scale_factor: self.scale_factor,
            frame_rate_hz: self.frame_rate_hz,
        }
        .clamped()
    }

    pub fn set_motion(&mut self, motion: MotionParams) {
        self.speed = motion.speed;
        self.scale_factor = motion.scale_factor;
        self.frame_rate_hz = motion.frame_rate_hz;
    }

    /// Frame counts indexed by animation state.
    pub fn frame_counts(&self) -> [usize; 2] {
        [self.idle_frames, self.walk_frames]
    }
}

pub struct Paths {
    pub settings: PathBuf,
    pub notes: PathBuf,
}

pub fn project_paths() -> Option<Paths> {
    let proj = ProjectDirs::from("com", "pixelpal", "PixelPal")?;
    let config = proj.config_dir();
    let data = proj.data_local_dir();
    if let Err(e) = fs::create_dir_all(config).and_then(|_| fs::create_dir_all(data)) {
        log::warn!("Could not create app directories: {e}");
    }
    Some(Paths {
        settings: config.join("settings.json"),
        notes: data.join("memos.json"),
    })
}

/// Read settings, falling back to defaults on any problem.
pub fn load_settings(path: &Path) -> Settings {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No settings at {}, using defaults", path.display());
            return Settings::default();
        }
        Err(e) => {
            log::warn!("Could not read {}: {e}", path.display());
            return Settings::default();
        }
    };
    match serde_json::from_str::<Settings>(&text) {
        Ok(mut settings) => {
            let motion = settings.motion();
            settings.set_motion(motion);
            settings
        }
        Err(e) => {
            log::warn!("Ignoring malformed {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings_atomic(path: &Path, settings: &Settings) -> io::Result<()> {
    let data = serde_json::to_vec_pretty(settings)?;
    write_atomic(path, &data)
}

/// Write to a sibling temp file, then rename over the target.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    // Rename-over-existing fails on Windows.
    if cfg!(windows) && path.exists() {
        fs::remove_file(path)?;
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixelpal-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = load_settings(&scratch("nope.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults_and_clamps() {
        let path = scratch("partial.json");
        fs::write(&path, r#"{ "scale_factor": 40, "frame_rate_hz": 2, "seed": 99 }"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.scale_factor, 8);
        assert_eq!(s.frame_rate_hz, 6);
        assert_eq!(s.seed, Some(99));
        assert_eq!(s.idle_frames, 5);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let path = scratch("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let path = scratch("saved.json");
        let mut s = Settings::default();
        s.set_motion(MotionParams {
            speed: 7,
            scale_factor: 2,
            frame_rate_hz: 25,
        });
        save_settings_atomic(&path, &s).unwrap();
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
    }
}
