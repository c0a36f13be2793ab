//! Frame-sequence cutscene clips.
//!
//! A clip is a directory holding a `clip.json` manifest and a numbered run
//! of PNG frames:
//!
//! ```json
//! { "fps": 24, "frame_count": 96, "frame_pattern": "frame_{n}.png", "pad": 4,
//!   "audio": "soundtrack.ogg" }
//! ```
//!
//! Frames are paced against wall-clock time from the first draw, decoded on
//! demand and streamed to the render target as raw RGBA. The optional
//! soundtrack starts with the first frame and stops when the clip closes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use saga_core::cutscene::{Clip, ClipSource, CutsceneError};
use saga_core::render::{Rect, RenderTarget};
use serde::Deserialize;

use crate::audio::{AudioTrack, RodioTrack};

/// Streaming texture key shared by every cutscene frame.
pub const CUTSCENE_TEXTURE_KEY: &str = "__cutscene";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClipManifest {
    pub fps: u32,
    pub frame_count: u32,
    /// File name of each frame, `{n}` replaced by the frame number.
    pub frame_pattern: String,
    /// Minimum digits of the frame number, zero padded.
    #[serde(default)]
    pub pad: usize,
    /// Number of the first frame on disk.
    #[serde(default)]
    pub first_frame: u32,
    /// Soundtrack file next to the manifest.
    #[serde(default)]
    pub audio: Option<String>,
}

impl ClipManifest {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.frame_count) / f64::from(self.fps))
    }

    pub fn frame_file(&self, index: u32) -> String {
        let number = format!("{:0width$}", self.first_frame + index, width = self.pad);
        self.frame_pattern.replace("{n}", &number)
    }

    /// Index of the frame on screen `elapsed` after playback started.
    pub fn frame_at(&self, elapsed: Duration) -> u32 {
        (elapsed.as_secs_f64() * f64::from(self.fps)).floor() as u32
    }

    fn validate(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err("fps must be > 0".to_string());
        }
        if self.frame_count == 0 {
            return Err("frame_count must be > 0".to_string());
        }
        if !self.frame_pattern.contains("{n}") {
            return Err(format!(
                "frame_pattern '{}' has no {{n}} placeholder",
                self.frame_pattern
            ));
        }
        Ok(())
    }
}

/// Read and validate a clip manifest.
pub fn load_manifest(path: &Path) -> Result<ClipManifest, CutsceneError> {
    let open_error = |reason: String| CutsceneError::Open {
        path: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| open_error(e.to_string()))?;
    let manifest: ClipManifest = serde_json::from_str(&raw).map_err(|e| open_error(e.to_string()))?;
    manifest.validate().map_err(open_error)?;
    Ok(manifest)
}

#[derive(Debug, Default)]
pub struct FrameSequenceSource;

impl FrameSequenceSource {
    pub fn new() -> Self {
        Self
    }

    /// Check a clip can be opened without starting playback.
    pub fn probe(path: &Path) -> Result<ClipManifest, CutsceneError> {
        let manifest = load_manifest(path)?;
        log::info!(
            "Cutscene '{}': {} frames at {} fps ({:.1}s)",
            path.display(),
            manifest.frame_count,
            manifest.fps,
            manifest.duration().as_secs_f64()
        );
        Ok(manifest)
    }
}

impl ClipSource for FrameSequenceSource {
    type Clip = FrameSequenceClip;

    fn open(&mut self, path: &Path) -> Result<FrameSequenceClip, CutsceneError> {
        let manifest = load_manifest(path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let soundtrack = manifest.audio.as_ref().map(|file| dir.join(file));
        let mut clip = FrameSequenceClip::new(manifest, dir);

        if let Some(soundtrack) = soundtrack {
            match RodioTrack::open(&soundtrack) {
                Ok(track) => clip.attach_audio(Box::new(track)),
                Err(reason) => log::warn!("Cutscene plays without sound: {}", reason),
            }
        }
        Ok(clip)
    }
}

struct DecodedFrame {
    index: u32,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub struct FrameSequenceClip {
    manifest: ClipManifest,
    dir: PathBuf,
    size: (u32, u32),
    volume: f32,
    audio: Option<Box<dyn AudioTrack>>,
    started: Option<Instant>,
    frame: Option<DecodedFrame>,
    failed_index: Option<u32>,
    closed: bool,
}

impl FrameSequenceClip {
    pub fn new(manifest: ClipManifest, dir: PathBuf) -> Self {
        Self {
            manifest,
            dir,
            size: (0, 0),
            volume: 1.0,
            audio: None,
            started: None,
            frame: None,
            failed_index: None,
            closed: false,
        }
    }

    pub fn attach_audio(&mut self, mut track: Box<dyn AudioTrack>) {
        track.set_volume(self.volume);
        self.audio = Some(track);
    }

    fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Decode frame `index` unless it is already on hand. An undecodable
    /// frame keeps the previous one on screen.
    fn load_frame(&mut self, index: u32) {
        if self.frame.as_ref().is_some_and(|f| f.index == index)
            || self.failed_index == Some(index)
        {
            return;
        }
        let path = self.dir.join(self.manifest.frame_file(index));
        match image::open(&path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                self.frame = Some(DecodedFrame {
                    index,
                    width,
                    height,
                    rgba: rgba.into_raw(),
                });
            }
            Err(err) => {
                self.failed_index = Some(index);
                log::warn!("Skipping cutscene frame '{}': {}", path.display(), err);
            }
        }
    }

    fn draw_at(&mut self, index: u32, target: &mut dyn RenderTarget, position: (f32, f32)) {
        if index >= self.manifest.frame_count {
            return;
        }
        self.load_frame(index);
        if let Some(frame) = &self.frame {
            let (width, height) = if self.size == (0, 0) {
                (frame.width, frame.height)
            } else {
                self.size
            };
            let dest = Rect::new(position.0, position.1, width as f32, height as f32);
            target.blit_pixels(CUTSCENE_TEXTURE_KEY, frame.width, frame.height, &frame.rgba, dest);
        }
    }
}

impl Clip for FrameSequenceClip {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(audio) = self.audio.as_mut() {
            audio.set_volume(self.volume);
        }
    }

    fn duration(&self) -> Duration {
        self.manifest.duration()
    }

    fn is_active(&self) -> bool {
        !self.closed && self.manifest.frame_at(self.elapsed()) < self.manifest.frame_count
    }

    fn draw(&mut self, target: &mut dyn RenderTarget, position: (f32, f32)) {
        if self.closed {
            return;
        }
        let start = match self.started {
            Some(start) => start,
            None => {
                if let Some(audio) = self.audio.as_mut() {
                    audio.play();
                }
                *self.started.insert(Instant::now())
            }
        };
        let index = self.manifest.frame_at(start.elapsed());
        self.draw_at(index, target, position);
    }

    fn close(&mut self) {
        self.closed = true;
        self.frame = None;
        if let Some(mut audio) = self.audio.take() {
            audio.stop();
        }
    }
}
