use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::AssetError;
use crate::pet::animation::AnimationState;

/// Ordered, non-empty list of frames for one animation state.
pub struct FrameSequence {
    frames: Vec<RgbaImage>,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Frame at `index`, wrapping around the sequence length.
    #[cfg(test)]
    pub fn get(&self, index: usize) -> &RgbaImage {
        &self.frames[index % self.frames.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RgbaImage> {
        self.frames.iter()
    }
}

/// A frame that failed to load while the rest of its sequence survived.
#[derive(Debug)]
pub struct PartialAssetWarning {
    pub state: AnimationState,
    pub error: AssetError,
}

/// Every animation state's frames, all the same pixel size.
pub struct FrameStore {
    sequences: [FrameSequence; 2],
    frame_size: (u32, u32),
}

impl FrameStore {
    /// Load `<prefix>_<n>.png` for every state from `dir`.
    ///
    /// `counts` is the number of frames declared per state, indexed by
    /// [`AnimationState::index`].
    pub fn load_dir(
        dir: &Path,
        counts: [usize; 2],
    ) -> Result<(Self, Vec<PartialAssetWarning>), AssetError> {
        Self::load_with(dir, counts, decode_png)
    }

    /// Same as [`FrameStore::load_dir`] with a custom per-file loader.
    pub fn load_with<F>(
        dir: &Path,
        counts: [usize; 2],
        mut load: F,
    ) -> Result<(Self, Vec<PartialAssetWarning>), AssetError>
    where
        F: FnMut(&Path) -> Result<RgbaImage, AssetError>,
    {
        let mut warnings = Vec::new();
        let mut frame_size = None;
        let mut loaded: [Vec<RgbaImage>; 2] = [Vec::new(), Vec::new()];

        for state in AnimationState::ALL {
            for i in 0..counts[state.index()] {
                let path = frame_path(dir, state, i);
                let result = load(&path).and_then(|img| {
                    let size = img.dimensions();
                    match frame_size {
                        Some(expected) if expected != size => Err(AssetError::SizeMismatch {
                            path: path.clone(),
                            expected,
                            actual: size,
                        }),
                        _ => Ok(img),
                    }
                });
                match result {
                    Ok(img) => {
                        frame_size.get_or_insert(img.dimensions());
                        loaded[state.index()].push(img);
                    }
                    Err(error) => {
                        log::warn!("Skipping {state} frame: {error}");
                        warnings.push(PartialAssetWarning { state, error });
                    }
                }
            }
        }

        let [idle, walk] = loaded;
        for (state, frames) in [(AnimationState::Idle, &idle), (AnimationState::Walk, &walk)] {
            if frames.is_empty() {
                return Err(AssetError::Missing {
                    state,
                    dir: dir.to_path_buf(),
                });
            }
        }

        let store = Self {
            sequences: [FrameSequence { frames: idle }, FrameSequence { frames: walk }],
            // Both sequences are non-empty, so a size was recorded.
            frame_size: frame_size.unwrap_or((1, 1)),
        };
        log::info!(
            "Loaded {} idle + {} walk frames ({}x{}) from {}",
            store.sequence(AnimationState::Idle).len(),
            store.sequence(AnimationState::Walk).len(),
            store.frame_size.0,
            store.frame_size.1,
            dir.display()
        );
        if !warnings.is_empty() {
            log::warn!(
                "{} frame(s) missing; animation will run with fewer frames",
                warnings.len()
            );
        }
        Ok((store, warnings))
    }

    pub fn sequence(&self, state: AnimationState) -> &FrameSequence {
        &self.sequences[state.index()]
    }

    /// Sequence lengths indexed by [`AnimationState::index`].
    pub fn lengths(&self) -> [usize; 2] {
        [self.sequences[0].len(), self.sequences[1].len()]
    }

    /// Native (unscaled) frame size in pixels.
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }
}

pub fn frame_path(dir: &Path, state: AnimationState, index: usize) -> PathBuf {
    dir.join(format!("{}_{}.png", state.asset_prefix(), index))
}

fn decode_png(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).map_err(
        |source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        },
    )?;
    Ok(img.to_rgba8())
}
