use std::path::PathBuf;

use saga_core::config::{load_stage_config, StageLayout};
use saga_core::render::RenderTarget;
use saga_core::stage::{Stage, StageError, StageFactory, StageFrame, StageId};

use crate::player::{Fighter, MoveInput};

/// A side-scrolling level: the stage is cleared once the fighter walks past
/// the goal line.
pub struct LevelStage {
    id: StageId,
    background: String,
    layout: StageLayout,
    screen_width: f32,
    passed: bool,
}

impl LevelStage {
    pub fn new(id: StageId, layout: StageLayout, screen_width: f32) -> Self {
        let background = layout
            .background
            .clone()
            .unwrap_or_else(|| default_background(id));
        Self {
            id,
            background,
            layout,
            screen_width,
            passed: false,
        }
    }

    pub fn goal_x(&self) -> f32 {
        self.layout.goal_x
    }
}

impl Stage<Fighter> for LevelStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn background_image(&self) -> &str {
        &self.background
    }

    fn stage_passed(&self) -> bool {
        self.passed
    }

    fn run(&mut self, frame: &StageFrame<'_>, player: &mut Fighter, target: &mut dyn RenderTarget) {
        let input = MoveInput::from_keys(frame.keys);
        let dt_us = frame.delta.as_micros() as u64;
        player.update(input, dt_us, self.screen_width);

        if !self.passed && player.position().x >= self.layout.goal_x {
            self.passed = true;
            log::info!(
                "{} cleared at x={:.0} (hp {}, transformed: {})",
                self.id,
                player.position().x,
                player.stats().hp,
                player.is_transformed()
            );
        }

        player.draw(target);
    }
}

fn default_background(id: StageId) -> String {
    format!("assets/images/stages/{}.png", id)
}

/// Builds a `LevelStage` from the configuration file, re-reading it for
/// every stage.
///
/// Only the `stage` section of each entry is used here. Player stats come
/// from `stage_1.player` alone, applied once when the session starts; the
/// `player` sections of later stages are never applied.
pub struct LevelFactory {
    config_path: PathBuf,
    screen_width: f32,
}

impl LevelFactory {
    pub fn new(config_path: impl Into<PathBuf>, screen_width: f32) -> Self {
        Self {
            config_path: config_path.into(),
            screen_width,
        }
    }
}

impl StageFactory<Fighter> for LevelFactory {
    type Stage = LevelStage;

    fn create(&mut self, id: StageId, player: &mut Fighter) -> Result<LevelStage, StageError> {
        let config = load_stage_config(&self.config_path, id)?;
        if config.stage.goal_x > self.screen_width {
            return Err(StageError::Assets {
                stage: id,
                reason: format!(
                    "goal_x {} lies beyond the {}px wide screen",
                    config.stage.goal_x, self.screen_width
                ),
            });
        }
        player.enter_stage(config.stage.floor_y);
        Ok(LevelStage::new(id, config.stage, self.screen_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{animation_set, write_temp, RecordingTarget};
    use saga_core::input::{Key, KeyState};
    use saga_core::stage::Player;
    use std::time::Duration;

    const CONFIG: &str = r#"{
        "stage_1": { "player": { "hp": 100, "mp": 50 } },
        "stage_2": {
            "player": { "hp": 120, "mp": 60 },
            "stage": { "background": "bg/two.png", "goal_x": 200.0, "floor_y": 300.0 }
        },
        "stage_3": {
            "player": { "hp": 120, "mp": 60 },
            "stage": { "goal_x": 5000.0 }
        }
    }"#;

    fn fighter() -> Fighter {
        Fighter::new(animation_set("base"), animation_set("ssj2"))
    }

    fn run_frame(stage: &mut LevelStage, player: &mut Fighter, held: &[Key]) -> RecordingTarget {
        let keys: KeyState = held.iter().copied().collect();
        let frame = StageFrame {
            delta: Duration::from_millis(16),
            keys: &keys,
            events: &[],
        };
        let mut target = RecordingTarget::default();
        stage.run(&frame, player, &mut target);
        target
    }

    #[test]
    fn factory_reads_layout_for_each_stage() {
        let path = write_temp("stages", "json", CONFIG);
        let mut factory = LevelFactory::new(&path, 1280.0);
        let mut player = fighter();

        let first = factory.create(StageId::Stage1, &mut player).expect("stage 1");
        assert_eq!(first.background_image(), "assets/images/stages/stage_1.png");
        assert_eq!(first.goal_x(), 1180.0);

        let second = factory.create(StageId::Stage2, &mut player).expect("stage 2");
        assert_eq!(second.background_image(), "bg/two.png");
        assert_eq!(player.position().y, 300.0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn later_stages_keep_session_stats() {
        let path = write_temp("stages_stats", "json", CONFIG);
        let mut factory = LevelFactory::new(&path, 1280.0);
        let mut player = fighter();
        player.initial_config(saga_core::config::PlayerStats { hp: 100, mp: 50 });

        // stage_2 lists hp 120 / mp 60 but only its layout is taken.
        factory.create(StageId::Stage2, &mut player).expect("stage 2");
        assert_eq!(
            player.stats(),
            saga_core::config::PlayerStats { hp: 100, mp: 50 }
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_stage_entry_is_an_error() {
        let path = write_temp("stages_missing", "json", CONFIG);
        let mut factory = LevelFactory::new(&path, 1280.0);
        let err = factory
            .create(StageId::Stage4, &mut fighter())
            .err()
            .expect("stage_4 missing");
        assert!(matches!(err, StageError::Config(_)));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unreachable_goal_is_rejected() {
        let path = write_temp("stages_goal", "json", CONFIG);
        let mut factory = LevelFactory::new(&path, 1280.0);
        let err = factory
            .create(StageId::Stage3, &mut fighter())
            .err()
            .expect("goal beyond screen");
        assert!(matches!(err, StageError::Assets { stage: StageId::Stage3, .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn stage_passes_when_fighter_reaches_goal() {
        let layout = StageLayout {
            goal_x: 150.0,
            ..StageLayout::default()
        };
        let mut stage = LevelStage::new(StageId::Stage1, layout, 1280.0);
        let mut player = fighter();
        player.initial_config(saga_core::config::PlayerStats { hp: 100, mp: 50 });

        run_frame(&mut stage, &mut player, &[]);
        assert!(!stage.stage_passed());

        // 50 -> 90 -> 130 -> 170
        for _ in 0..2 {
            run_frame(&mut stage, &mut player, &[Key::Right, Key::LShift]);
            assert!(!stage.stage_passed());
        }
        run_frame(&mut stage, &mut player, &[Key::Right, Key::LShift]);
        assert!(stage.stage_passed());

        // Walking back does not un-pass the stage.
        run_frame(&mut stage, &mut player, &[Key::Left]);
        assert!(stage.stage_passed());
    }

    #[test]
    fn run_draws_the_fighter() {
        let mut stage = LevelStage::new(StageId::Stage1, StageLayout::default(), 1280.0);
        let mut player = fighter();
        let target = run_frame(&mut stage, &mut player, &[Key::Right]);
        assert_eq!(target.blits, vec!["base/walk_0.png".to_string()]);
    }
}
