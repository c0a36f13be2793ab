//! The controllable fighter.
//!
//! Movement is frame-locked: every stage frame moves the fighter a fixed
//! number of pixels, doubled while LShift is held. Sprites come from two
//! animation sets, the base form and the transformed form; transforming
//! swaps the set for the rest of the session.

use std::path::Path;

use glam::Vec2;
use saga_core::animation::{load_animation_file, AnimationError, AnimationFile, AnimationState};
use saga_core::config::PlayerStats;
use saga_core::input::{Key, KeyState};
use saga_core::render::{Rect, RenderTarget};
use saga_core::stage::Player;

pub const SPAWN_POSITION: Vec2 = Vec2::new(50.0, 350.0);
/// Pixels per frame.
pub const WALK_SPEED: f32 = 20.0;
pub const RUN_SPEED: f32 = 40.0;
pub const SPRITE_SIZE: Vec2 = Vec2::new(96.0, 128.0);

const IDLE: &str = "idle";
const WALK: &str = "walk";
const RUN: &str = "run";
const REQUIRED_CLIPS: &[&str] = &[IDLE, WALK, RUN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Movement intent for one frame, decoded from held keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveInput {
    pub move_x: f32,
    pub running: bool,
}

impl MoveInput {
    pub fn from_keys(keys: &KeyState) -> Self {
        let left = keys.is_down(Key::Left) || keys.is_down(Key::A);
        let right = keys.is_down(Key::Right) || keys.is_down(Key::D);
        let move_x = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Self {
            move_x,
            running: keys.is_down(Key::LShift),
        }
    }
}

pub struct Fighter {
    stats: PlayerStats,
    position: Vec2,
    facing: Facing,
    transformed: bool,
    base_animations: AnimationFile,
    transformed_animations: AnimationFile,
    animation: AnimationState,
    current_image: String,
}

impl Fighter {
    pub fn new(base_animations: AnimationFile, transformed_animations: AnimationFile) -> Self {
        Self {
            stats: PlayerStats { hp: 1, mp: 0 },
            position: SPAWN_POSITION,
            facing: Facing::Right,
            transformed: false,
            base_animations,
            transformed_animations,
            animation: AnimationState::new(IDLE),
            current_image: String::new(),
        }
    }

    /// Load both animation sets and check each has the clips the fighter plays.
    pub fn load(base_path: &Path, transformed_path: &Path) -> Result<Self, AnimationError> {
        let base = load_animation_file(base_path)?;
        base.require_clips(REQUIRED_CLIPS)?;
        let transformed = load_animation_file(transformed_path)?;
        transformed.require_clips(REQUIRED_CLIPS)?;
        log::info!(
            "Loaded fighter animations '{}' and '{}'",
            base.animation_id,
            transformed.animation_id
        );
        Ok(Self::new(base, transformed))
    }

    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    pub fn current_image(&self) -> &str {
        &self.current_image
    }

    /// Put the fighter back at the spawn point, standing on `floor_y`.
    pub fn enter_stage(&mut self, floor_y: f32) {
        self.position = Vec2::new(SPAWN_POSITION.x, floor_y);
        self.facing = Facing::Right;
        self.animation = AnimationState::new(IDLE);
    }

    /// Apply one frame of movement, keeping the sprite within `[0, max_x]`,
    /// and advance the animation.
    pub fn update(&mut self, input: MoveInput, dt_us: u64, max_x: f32) {
        let speed = if input.running { RUN_SPEED } else { WALK_SPEED };
        let limit = (max_x - SPRITE_SIZE.x).max(0.0);
        self.position.x = (self.position.x + input.move_x * speed).clamp(0.0, limit);

        if input.move_x < 0.0 {
            self.facing = Facing::Left;
        } else if input.move_x > 0.0 {
            self.facing = Facing::Right;
        }

        let clip_name = match (input.move_x != 0.0, input.running) {
            (false, _) => IDLE,
            (true, false) => WALK,
            (true, true) => RUN,
        };
        self.animation.play(clip_name);

        let animations = if self.transformed {
            &self.transformed_animations
        } else {
            &self.base_animations
        };
        if let Some(clip) = animations.clip(clip_name) {
            self.current_image = self.animation.tick(dt_us, clip).to_string();
        }
    }

    /// Destination rectangle of the sprite. Facing left mirrors the quad by
    /// giving it a negative width.
    pub fn sprite_rect(&self) -> Rect {
        match self.facing {
            Facing::Right => Rect::new(self.position.x, self.position.y, SPRITE_SIZE.x, SPRITE_SIZE.y),
            Facing::Left => Rect::new(
                self.position.x + SPRITE_SIZE.x,
                self.position.y,
                -SPRITE_SIZE.x,
                SPRITE_SIZE.y,
            ),
        }
    }

    pub fn draw(&self, target: &mut dyn RenderTarget) {
        if !self.current_image.is_empty() {
            target.blit(&self.current_image, self.sprite_rect());
        }
    }
}

impl Player for Fighter {
    fn initial_config(&mut self, stats: PlayerStats) {
        log::info!("Player stats: hp={} mp={}", stats.hp, stats.mp);
        self.stats = stats;
    }

    fn do_transformation(&mut self) {
        if self.transformed {
            return;
        }
        self.transformed = true;
        self.animation = AnimationState::new(IDLE);
        log::info!("Fighter switched to '{}'", self.transformed_animations.animation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::animation_set;

    fn fighter() -> Fighter {
        Fighter::new(animation_set("base"), animation_set("ssj2"))
    }

    fn keys(held: &[Key]) -> KeyState {
        held.iter().copied().collect()
    }

    #[test]
    fn move_input_from_keys() {
        assert_eq!(MoveInput::from_keys(&keys(&[Key::Right])).move_x, 1.0);
        assert_eq!(MoveInput::from_keys(&keys(&[Key::A])).move_x, -1.0);
        assert_eq!(MoveInput::from_keys(&keys(&[Key::Left, Key::Right])).move_x, 0.0);
        assert!(MoveInput::from_keys(&keys(&[Key::LShift])).running);
    }

    #[test]
    fn walking_and_running_speeds() {
        let mut f = fighter();
        f.update(MoveInput { move_x: 1.0, running: false }, 16_000, 1280.0);
        assert_eq!(f.position().x, SPAWN_POSITION.x + WALK_SPEED);
        f.update(MoveInput { move_x: 1.0, running: true }, 16_000, 1280.0);
        assert_eq!(f.position().x, SPAWN_POSITION.x + WALK_SPEED + RUN_SPEED);
    }

    #[test]
    fn position_is_clamped_to_screen() {
        let mut f = fighter();
        for _ in 0..10 {
            f.update(MoveInput { move_x: -1.0, running: true }, 16_000, 1280.0);
        }
        assert_eq!(f.position().x, 0.0);
        assert_eq!(f.facing(), Facing::Left);

        for _ in 0..100 {
            f.update(MoveInput { move_x: 1.0, running: true }, 16_000, 1280.0);
        }
        assert_eq!(f.position().x, 1280.0 - SPRITE_SIZE.x);
    }

    #[test]
    fn animation_follows_movement_and_form() {
        let mut f = fighter();
        f.update(MoveInput { move_x: 0.0, running: false }, 16_000, 1280.0);
        assert_eq!(f.current_image(), "base/idle_0.png");
        f.update(MoveInput { move_x: 1.0, running: true }, 16_000, 1280.0);
        assert_eq!(f.current_image(), "base/run_0.png");

        f.do_transformation();
        assert!(f.is_transformed());
        f.update(MoveInput { move_x: 1.0, running: false }, 16_000, 1280.0);
        assert_eq!(f.current_image(), "ssj2/walk_0.png");
    }

    #[test]
    fn facing_left_mirrors_sprite() {
        let mut f = fighter();
        f.update(MoveInput { move_x: -1.0, running: false }, 16_000, 1280.0);
        let rect = f.sprite_rect();
        assert!(rect.width < 0.0);
        assert_eq!(rect.x, f.position().x + SPRITE_SIZE.x);
    }

    #[test]
    fn enter_stage_resets_position() {
        let mut f = fighter();
        f.update(MoveInput { move_x: 1.0, running: true }, 16_000, 1280.0);
        f.enter_stage(300.0);
        assert_eq!(f.position(), Vec2::new(SPAWN_POSITION.x, 300.0));
    }

    #[test]
    fn initial_config_stores_stats() {
        let mut f = fighter();
        f.initial_config(PlayerStats { hp: 100, mp: 50 });
        assert_eq!(f.stats(), PlayerStats { hp: 100, mp: 50 });
    }
}
