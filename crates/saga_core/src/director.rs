//! Stage director: the top-level game loop and stage-progression state machine.
//!
//! Each `tick` runs, in order:
//!
//!   1. `clock.tick()` -- frame delta, capped to the target frame rate
//!   2. transition policy, when no stage exists yet or the active one passed
//!   3. drain the event queue once; `Quit` ends the session before anything
//!      else is drawn this tick
//!   4. sample held keys once
//!   5. draw the stage background, then hand the frame to `Stage::run`
//!   6. present
//!
//! Cutscenes triggered by the transition policy block inside step 2. While
//! one plays, only its own input poll is live.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::PlayerStats;
use crate::cutscene::{
    ClipSource, CutsceneError, CutsceneOutcome, CutscenePlayer, CutsceneRequest,
};
use crate::input::{EventSource, GameEvent};
use crate::render::{Rect, RenderTarget};
use crate::stage::{Player, Stage, StageError, StageFactory, StageFrame, StageId, TitleTable};
use crate::time::Clock;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("failed to construct {stage}: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: StageError,
    },
    #[error(transparent)]
    Cutscene(#[from] CutsceneError),
    #[error("stage index {0} has no matching stage")]
    UnknownStage(u32),
}

#[derive(Debug, Clone)]
pub struct DirectorSettings {
    /// Stages are instantiated while the next index is below this bound.
    pub max_stage_index: u32,
    /// Passing this stage plays the transformation cutscene and transforms
    /// the player before the next stage starts.
    pub transformation_stage: StageId,
    /// Passing this stage plays the finale cutscene, once.
    pub finale_stage: StageId,
    pub transformation_clip: PathBuf,
    pub finale_clip: PathBuf,
    pub screen_size: (u32, u32),
    pub titles: TitleTable,
}

impl Default for DirectorSettings {
    fn default() -> Self {
        Self {
            max_stage_index: StageId::ALL.len() as u32 + 1,
            transformation_stage: StageId::Stage3,
            finale_stage: StageId::Stage4,
            transformation_clip: PathBuf::from("assets/video/player_ssj2_transition/clip.json"),
            finale_clip: PathBuf::from("assets/video/player_ssj2_end_battle/clip.json"),
            screen_size: (1280, 720),
            titles: TitleTable::default(),
        }
    }
}

/// Observable state of the session between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorState {
    Uninitialized,
    StageActive(StageId),
    StagePassed(StageId),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    Quit,
}

/// The display surface, event source and clock, owned by the caller and lent
/// to the director for one tick (or one whole `run`).
pub struct TickContext<'a> {
    pub target: &'a mut dyn RenderTarget,
    pub input: &'a mut dyn EventSource,
    pub clock: &'a mut dyn Clock,
}

enum Transition {
    Continue,
    Quit,
}

pub struct Director<P, F, S>
where
    F: StageFactory<P>,
{
    settings: DirectorSettings,
    player: P,
    player_stats: PlayerStats,
    factory: F,
    cutscenes: CutscenePlayer<S>,
    stage: Option<F::Stage>,
    running: bool,
    next_stage_index: u32,
    has_played_finale: bool,
}

impl<P, F, S> Director<P, F, S>
where
    P: Player,
    F: StageFactory<P>,
    S: ClipSource,
{
    pub fn new(
        settings: DirectorSettings,
        mut player: P,
        player_stats: PlayerStats,
        factory: F,
        clip_source: S,
    ) -> Self {
        player.initial_config(player_stats);
        Self {
            settings,
            player,
            player_stats,
            factory,
            cutscenes: CutscenePlayer::new(clip_source),
            stage: None,
            running: true,
            next_stage_index: 1,
            has_played_finale: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the stage the next transition will instantiate.
    pub fn next_stage_index(&self) -> u32 {
        self.next_stage_index
    }

    pub fn stage(&self) -> Option<&F::Stage> {
        self.stage.as_ref()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_stats(&self) -> PlayerStats {
        self.player_stats
    }

    pub fn has_played_finale(&self) -> bool {
        self.has_played_finale
    }

    pub fn cutscenes(&self) -> &CutscenePlayer<S> {
        &self.cutscenes
    }

    pub fn state(&self) -> DirectorState {
        if !self.running {
            return DirectorState::Finished;
        }
        match &self.stage {
            None => DirectorState::Uninitialized,
            Some(stage) if stage.stage_passed() => DirectorState::StagePassed(stage.id()),
            Some(stage) => DirectorState::StageActive(stage.id()),
        }
    }

    /// Tick until a quit request ends the session.
    pub fn run(&mut self, ctx: &mut TickContext<'_>) -> Result<(), DirectorError> {
        while self.running {
            self.tick(ctx)?;
        }
        log::info!("Game loop finished");
        Ok(())
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<TickOutcome, DirectorError> {
        let delta = ctx.clock.tick();

        let needs_transition = self.stage.as_ref().map_or(true, |s| s.stage_passed());
        if needs_transition {
            if let Transition::Quit = self.evaluate_transition(ctx)? {
                log::info!("Quit requested during cutscene, closing the game");
                self.running = false;
                return Ok(TickOutcome::Quit);
            }
        }

        let events = ctx.input.poll_events();
        for event in &events {
            match event {
                GameEvent::Quit => {
                    log::info!("Quit requested, closing the game");
                    self.running = false;
                    return Ok(TickOutcome::Quit);
                }
                GameEvent::PointerPressed { x, y, .. } => {
                    log::debug!("Click coords: ({:.0}, {:.0})", x, y);
                }
                _ => {}
            }
        }

        let keys = ctx.input.key_state();

        if let Some(stage) = self.stage.as_mut() {
            ctx.target
                .blit(stage.background_image(), Rect::full(self.settings.screen_size));
            let frame = StageFrame {
                delta,
                keys: &keys,
                events: &events,
            };
            stage.run(&frame, &mut self.player, &mut *ctx.target);
        }

        ctx.target.present();
        Ok(TickOutcome::Rendered)
    }

    fn evaluate_transition(&mut self, ctx: &mut TickContext<'_>) -> Result<Transition, DirectorError> {
        if self.next_stage_index < self.settings.max_stage_index {
            if let Some(passed) = self.passed_stage() {
                if passed == self.settings.transformation_stage {
                    let clip = self.settings.transformation_clip.clone();
                    if self.play_cutscene(clip, ctx)? == CutsceneOutcome::QuitRequested {
                        return Ok(Transition::Quit);
                    }
                    self.player.do_transformation();
                    log::info!("Player transformed after clearing {}", passed);
                }
            }

            let id = StageId::from_index(self.next_stage_index)
                .ok_or(DirectorError::UnknownStage(self.next_stage_index))?;
            let stage = self
                .factory
                .create(id, &mut self.player)
                .map_err(|source| DirectorError::Stage { stage: id, source })?;
            self.stage = Some(stage);

            if let Some(title) = self.settings.titles.lookup(id) {
                ctx.target.set_title(title);
            }
            log::info!("Entered {}", id);
            self.next_stage_index += 1;
        }

        if !self.has_played_finale && self.passed_stage() == Some(self.settings.finale_stage) {
            self.has_played_finale = true;
            let clip = self.settings.finale_clip.clone();
            if self.play_cutscene(clip, ctx)? == CutsceneOutcome::QuitRequested {
                return Ok(Transition::Quit);
            }
        }

        Ok(Transition::Continue)
    }

    /// Id of the active stage, if it reports passed.
    fn passed_stage(&self) -> Option<StageId> {
        self.stage
            .as_ref()
            .filter(|stage| stage.stage_passed())
            .map(|stage| stage.id())
    }

    fn play_cutscene(
        &mut self,
        path: PathBuf,
        ctx: &mut TickContext<'_>,
    ) -> Result<CutsceneOutcome, DirectorError> {
        let (target_width, target_height) = self.settings.screen_size;
        let request = CutsceneRequest {
            path,
            target_width,
            target_height,
        };
        let outcome = self.cutscenes.play(
            &request,
            &mut *ctx.target,
            &mut *ctx.input,
            &mut *ctx.clock,
        )?;
        Ok(outcome)
    }
}
