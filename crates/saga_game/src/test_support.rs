use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use saga_core::animation::{AnimationClip, AnimationFile, AnimationFrame};
use saga_core::render::{Rect, RenderTarget};

fn unique_name(name_hint: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    format!("cell_saga_test_{}_{}_{}", name_hint, std::process::id(), nanos)
}

pub fn temp_dir(name_hint: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(unique_name(name_hint));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn write_temp(name_hint: &str, extension: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}.{}", unique_name(name_hint), extension));
    std::fs::write(&path, contents).expect("write temp file");
    path
}

/// One looping single-frame clip per fighter action, images named
/// `{prefix}/{clip}_0.png`.
pub fn animation_set(prefix: &str) -> AnimationFile {
    let animations: HashMap<String, AnimationClip> = ["idle", "walk", "run"]
        .iter()
        .map(|name| {
            let clip = AnimationClip {
                frames: vec![AnimationFrame {
                    image: format!("{}/{}_0.png", prefix, name),
                    duration_us: 100_000,
                }],
                looping: true,
            };
            (name.to_string(), clip)
        })
        .collect();
    AnimationFile {
        animation_id: prefix.to_string(),
        animations,
    }
}

/// (key, width, height, first byte of pixel data, destination)
pub type PixelCall = (String, u32, u32, u8, Rect);

#[derive(Default)]
pub struct RecordingTarget {
    pub blits: Vec<String>,
    pub pixels: Vec<PixelCall>,
    pub presents: usize,
    pub title: Option<String>,
}

impl RenderTarget for RecordingTarget {
    fn size(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn blit(&mut self, image_key: &str, _dest: Rect) {
        self.blits.push(image_key.to_string());
    }

    fn blit_pixels(&mut self, key: &str, width: u32, height: u32, rgba: &[u8], dest: Rect) {
        let first = rgba.first().copied().unwrap_or_default();
        self.pixels.push((key.to_string(), width, height, first, dest));
    }

    fn present(&mut self) {
        self.presents += 1;
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }
}
