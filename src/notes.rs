use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::write_atomic;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub content: String,
    /// Unix seconds.
    pub timestamp: f64,
}

impl Note {
    /// Local-time label, e.g. `2024-05-01 18:03:12`.
    pub fn formatted_time(&self) -> String {
        let secs = self.timestamp.floor() as i64;
        let nanos = ((self.timestamp - self.timestamp.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
            .map(|utc| {
                utc.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

/// Newest-first list of notes backed by a JSON file.
pub struct NoteStore {
    path: PathBuf,
    notes: Vec<Note>,
}

impl NoteStore {
    /// Open the store. Unreadable or malformed files start empty.
    pub fn open(path: PathBuf) -> Self {
        let notes = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed notes file {}: {e}", path.display());
                Vec::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::warn!("Could not read {}: {e}", path.display());
                Vec::new()
            }
        };
        Self { path, notes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Add a note at the front. Blank text is ignored; returns whether a
    /// note was added.
    pub fn add(&mut self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.notes.insert(
            0,
            Note {
                content: content.to_string(),
                timestamp,
            },
        );
        self.save_logged();
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Note> {
        if index >= self.notes.len() {
            return None;
        }
        let note = self.notes.remove(index);
        self.save_logged();
        Some(note)
    }

    pub fn save(&self) -> io::Result<()> {
        let data = serde_json::to_vec_pretty(&self.notes)?;
        write_atomic(&self.path, &data)
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            log::error!("Could not save notes to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixelpal-notes-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn add_is_newest_first_and_persists() {
        let path = scratch("order.json");
        let mut store = NoteStore::open(path.clone());
        assert!(store.add("buy milk"));
        assert!(store.add("  call mum \n"));
        assert_eq!(store.notes()[0].content, "call mum");
        assert_eq!(store.notes()[1].content, "buy milk");

        let reopened = NoteStore::open(path);
        assert_eq!(reopened.notes(), store.notes());
    }

    #[test]
    fn reload_keeps_exact_timestamps() {
        let path = scratch("timestamps.json");
        let notes = vec![
            Note {
                content: "a".to_string(),
                timestamp: 1766016393.1241279,
            },
            Note {
                content: "b".to_string(),
                timestamp: 1766016393.124128,
            },
            Note {
                content: "c".to_string(),
                timestamp: 1700000000.0 + 1.0 / 3.0,
            },
        ];
        write_atomic(&path, serde_json::to_string_pretty(&notes).unwrap().as_bytes()).unwrap();

        let store = NoteStore::open(path);
        let loaded: Vec<f64> = store.notes().iter().map(|n| n.timestamp).collect();
        assert_eq!(loaded, notes.iter().map(|n| n.timestamp).collect::<Vec<_>>());
        assert_ne!(loaded[0], loaded[1]);
    }

    #[test]
    fn blank_notes_are_rejected() {
        let mut store = NoteStore::open(scratch("blank.json"));
        assert!(!store.add("   \n\t"));
        assert!(store.notes().is_empty());
    }

    #[test]
    fn remove_by_index() {
        let path = scratch("remove.json");
        let mut store = NoteStore::open(path.clone());
        store.add("a");
        store.add("b");
        assert_eq!(store.remove(0).map(|n| n.content), Some("b".to_string()));
        assert_eq!(store.remove(5), None);
        assert_eq!(NoteStore::open(path).notes().len(), 1);
    }

    #[test]
    fn reads_existing_file_format() {
        let path = scratch("existing.json");
        std::fs::write(
            &path,
            r#"[{"content": "hello", "timestamp": 1700000000.5}]"#,
        )
        .unwrap();
        let store = NoteStore::open(path);
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].formatted_time().len(), 19);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let path = scratch("bad.json");
        std::fs::write(&path, "nope").unwrap();
        assert!(NoteStore::open(path).notes().is_empty());
    }
}
