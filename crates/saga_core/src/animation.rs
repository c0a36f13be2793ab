//! Frame-based sprite animation types and tick logic.
//!
//! An animation clip is a sequence of image frames with per-frame durations.
//! Timing uses integer microseconds (`u64`) so advancing a clip never drifts,
//! whatever the frame delta looks like.
//!
//! The JSON format stores `duration_ms` for readability; on load this is
//! converted to `duration_us`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("failed to read animation file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse animation file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("animation validation failed: {0}")]
    Invalid(String),
}

/// A single frame in an animation clip.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: String,
    pub duration_us: u64,
}

/// A named sequence of frames that can loop or play once.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
    pub looping: bool,
}

impl AnimationClip {
    /// Total duration of one full cycle in microseconds.
    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }
}

/// Top-level animation definition file (deserialized from JSON).
#[derive(Debug, Clone)]
pub struct AnimationFile {
    pub animation_id: String,
    pub animations: HashMap<String, AnimationClip>,
}

impl AnimationFile {
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.get(name)
    }

    pub fn require_clips(&self, names: &[&str]) -> Result<(), AnimationError> {
        for name in names {
            if !self.animations.contains_key(*name) {
                return Err(AnimationError::Invalid(format!(
                    "'{}' has no clip named '{}'",
                    self.animation_id, name
                )));
            }
        }
        Ok(())
    }
}

/// Runtime state for one active animation instance.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub clip_name: String,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new(clip_name: &str) -> Self {
        Self {
            clip_name: clip_name.to_string(),
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Switch to another clip, restarting it. Playing the current clip again
    /// is a no-op so walk cycles are not reset every frame.
    pub fn play(&mut self, clip_name: &str) {
        if self.clip_name != clip_name {
            *self = Self::new(clip_name);
        }
    }

    /// Advance the animation by `dt_us` microseconds and return the image key
    /// of the current frame.
    pub fn tick<'a>(&mut self, dt_us: u64, clip: &'a AnimationClip) -> &'a str {
        if clip.frames.is_empty() || self.finished {
            return if let Some(frame) = clip.frames.get(self.frame_index) {
                &frame.image
            } else if let Some(frame) = clip.frames.last() {
                &frame.image
            } else {
                ""
            };
        }

        // A clip swapped underneath us may be shorter than the old one.
        if self.frame_index >= clip.frames.len() {
            self.frame_index = 0;
        }

        self.elapsed_us += dt_us;

        loop {
            let current_frame = &clip.frames[self.frame_index];
            if self.elapsed_us < current_frame.duration_us {
                break;
            }

            self.elapsed_us -= current_frame.duration_us;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        &clip.frames[self.frame_index].image
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    version: String,
    animation_id: String,
    animations: HashMap<String, AnimationClipJson>,
}

#[derive(Debug, Deserialize)]
struct AnimationClipJson {
    frames: Vec<AnimationFrameJson>,
    #[serde(default)]
    looping: bool,
}

#[derive(Debug, Deserialize)]
struct AnimationFrameJson {
    image: String,
    duration_ms: u64,
}

/// Load an animation definition file from disk.
pub fn load_animation_file(path: &Path) -> Result<AnimationFile, AnimationError> {
    let raw = fs::read_to_string(path).map_err(|source| AnimationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let json: AnimationFileJson =
        serde_json::from_str(&raw).map_err(|source| AnimationError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_animation_json(&json)?;

    let animations = json
        .animations
        .into_iter()
        .map(|(name, clip_json)| {
            let frames = clip_json
                .frames
                .into_iter()
                .map(|f| AnimationFrame {
                    image: f.image,
                    duration_us: f.duration_ms * 1000,
                })
                .collect();
            (
                name,
                AnimationClip {
                    frames,
                    looping: clip_json.looping,
                },
            )
        })
        .collect();

    Ok(AnimationFile {
        animation_id: json.animation_id,
        animations,
    })
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), AnimationError> {
    if json.version != "0.1" {
        return Err(AnimationError::Invalid(format!(
            "unsupported version '{}'",
            json.version
        )));
    }
    if json.animation_id.is_empty() {
        return Err(AnimationError::Invalid("animation_id is empty".to_string()));
    }
    for (name, clip) in &json.animations {
        if clip.frames.is_empty() {
            return Err(AnimationError::Invalid(format!(
                "clip '{}' has no frames",
                name
            )));
        }
        for (i, frame) in clip.frames.iter().enumerate() {
            if frame.image.is_empty() {
                return Err(AnimationError::Invalid(format!(
                    "clip '{}' frame {} has empty image",
                    name, i
                )));
            }
            if frame.duration_ms == 0 {
                return Err(AnimationError::Invalid(format!(
                    "clip '{}' frame {} has zero duration",
                    name, i
                )));
            }
        }
    }
    Ok(())
}
