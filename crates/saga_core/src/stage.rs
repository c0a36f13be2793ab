//! Stage and player contracts consumed by the director.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, PlayerStats};
use crate::input::{GameEvent, KeyState};
use crate::render::RenderTarget;

/// Playable stages, in the order the director visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    Stage1,
    Stage2,
    Stage3,
    Stage4,
}

impl StageId {
    pub const ALL: &'static [StageId] = &[
        StageId::Stage1,
        StageId::Stage2,
        StageId::Stage3,
        StageId::Stage4,
    ];

    /// One-based stage index.
    pub fn index(self) -> u32 {
        match self {
            Self::Stage1 => 1,
            Self::Stage2 => 2,
            Self::Stage3 => 3,
            Self::Stage4 => 4,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.index() == index)
    }

    /// Key of this stage in the configuration file.
    pub fn key(self) -> &'static str {
        match self {
            Self::Stage1 => "stage_1",
            Self::Stage2 => "stage_2",
            Self::Stage3 => "stage_3",
            Self::Stage4 => "stage_4",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Window titles shown while a stage is active. Stages without an entry keep
/// whatever title was set before them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleTable {
    entries: Vec<(StageId, &'static str)>,
}

impl TitleTable {
    pub fn new(entries: Vec<(StageId, &'static str)>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, stage: StageId) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(id, _)| *id == stage)
            .map(|(_, title)| *title)
    }
}

impl Default for TitleTable {
    fn default() -> Self {
        Self::new(vec![
            (StageId::Stage1, "Saga de Androides"),
            (StageId::Stage2, "Inicio Saga de Cell"),
            (StageId::Stage3, "Batalla Contra Cell"),
            (StageId::Stage4, "Batalla Final Contra Cell"),
        ])
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("stage {stage} failed to load assets: {reason}")]
    Assets { stage: StageId, reason: String },
}

/// Per-frame input handed to the active stage.
#[derive(Debug, Clone)]
pub struct StageFrame<'a> {
    pub delta: Duration,
    pub keys: &'a KeyState,
    pub events: &'a [GameEvent],
}

/// The controllable character. One instance lives for the whole session and
/// is lent to whichever stage is active.
pub trait Player {
    /// One-time stat initialization at session start.
    fn initial_config(&mut self, stats: PlayerStats);

    /// Permanent upgrade applied at the pre-transformation stage boundary.
    fn do_transformation(&mut self);
}

/// One level of the game.
pub trait Stage<P> {
    fn id(&self) -> StageId;

    /// Image key of the full-screen background.
    fn background_image(&self) -> &str;

    /// Whether the stage's win condition is satisfied. Must not change state.
    fn stage_passed(&self) -> bool;

    /// Simulate and draw one frame. The background has already been drawn.
    fn run(&mut self, frame: &StageFrame<'_>, player: &mut P, target: &mut dyn RenderTarget);
}

/// Builds stages on demand as the director advances.
pub trait StageFactory<P> {
    type Stage: Stage<P>;

    fn create(&mut self, id: StageId, player: &mut P) -> Result<Self::Stage, StageError>;
}
