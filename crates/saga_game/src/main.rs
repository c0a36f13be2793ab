mod audio;
mod player;
mod stage;
mod video;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};

use anyhow::Context;
use saga_core::config::load_stage_config;
use saga_core::director::{Director, DirectorSettings, TickContext};
use saga_core::stage::StageId;
use saga_core::time::FrameClock;
use saga_platform::{Platform, PlatformConfig};
use saga_render::RenderContext;

use crate::player::Fighter;
use crate::stage::LevelFactory;
use crate::video::FrameSequenceSource;

const WINDOW_TITLE: &str = "Cell Saga";
const SCREEN_WIDTH: u32 = 1280;
const SCREEN_HEIGHT: u32 = 720;
const FPS: u32 = 60;
const CONFIG_PATH: &str = "configs/config.json";
const BASE_ANIMATIONS: &str = "assets/animations/player_base.json";
const TRANSFORMED_ANIMATIONS: &str = "assets/animations/player_ssj2.json";
const TRANSFORMATION_CLIP: &str = "assets/video/player_ssj2_transition/clip.json";
const FINALE_CLIP: &str = "assets/video/player_ssj2_end_battle/clip.json";

fn run() -> anyhow::Result<()> {
    let stats = load_stage_config(Path::new(CONFIG_PATH), StageId::Stage1)
        .context("failed to load starting player stats")?
        .player;

    for clip in [TRANSFORMATION_CLIP, FINALE_CLIP] {
        FrameSequenceSource::probe(Path::new(clip))
            .with_context(|| format!("cutscene '{}' is unavailable", clip))?;
    }

    let player = Fighter::load(Path::new(BASE_ANIMATIONS), Path::new(TRANSFORMED_ANIMATIONS))
        .context("failed to load fighter animations")?;

    let mut platform = Platform::new(PlatformConfig {
        title: WINDOW_TITLE.to_string(),
        width: SCREEN_WIDTH,
        height: SCREEN_HEIGHT,
    })
    .context("failed to open the game window")?;
    let window = platform
        .window()
        .context("event loop reported no window")?;
    let mut renderer = RenderContext::new(window).context("failed to initialize the renderer")?;
    let mut clock = FrameClock::new(FPS);

    let settings = DirectorSettings {
        transformation_clip: PathBuf::from(TRANSFORMATION_CLIP),
        finale_clip: PathBuf::from(FINALE_CLIP),
        screen_size: (SCREEN_WIDTH, SCREEN_HEIGHT),
        ..DirectorSettings::default()
    };
    let mut director = Director::new(
        settings,
        player,
        stats,
        LevelFactory::new(CONFIG_PATH, SCREEN_WIDTH as f32),
        FrameSequenceSource::new(),
    );

    let mut ctx = TickContext {
        target: &mut renderer,
        input: &mut platform,
        clock: &mut clock,
    };
    director.run(&mut ctx).context("game loop aborted")?;

    log::info!(
        "Session over after {} frames ({:.1} fps average)",
        clock.frame_count,
        clock.smoothed_fps
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Cell Saga starting...");

    if let Err(err) = run() {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
