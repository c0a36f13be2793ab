//! Fakes for every seam the director and cutscene player talk through.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::PlayerStats;
use crate::cutscene::{Clip, ClipSource, CutsceneError};
use crate::input::{EventSource, GameEvent, KeyState};
use crate::render::{Rect, RenderTarget};
use crate::stage::{Player, Stage, StageError, StageFactory, StageFrame, StageId};

pub fn temp_file_path(name_hint: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "saga_test_{}_{}_{}.{}",
        name_hint,
        std::process::id(),
        nanos,
        extension
    ))
}

// --- Render target ---

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Blit(String),
    Pixels(String),
    Present,
    Title(String),
}

pub struct FakeTarget {
    pub calls: Vec<RenderCall>,
    pub title: String,
    pub size: (u32, u32),
}

impl FakeTarget {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            title: "Cell Saga".to_string(),
            size: (1280, 720),
        }
    }

    pub fn presents(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Present))
            .count()
    }

    pub fn titles_set(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Title(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RenderTarget for FakeTarget {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn blit(&mut self, image_key: &str, _dest: Rect) {
        self.calls.push(RenderCall::Blit(image_key.to_string()));
    }

    fn blit_pixels(&mut self, key: &str, _width: u32, _height: u32, _rgba: &[u8], _dest: Rect) {
        self.calls.push(RenderCall::Pixels(key.to_string()));
    }

    fn present(&mut self) {
        self.calls.push(RenderCall::Present);
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.calls.push(RenderCall::Title(title.to_string()));
    }
}

// --- Input ---

/// Hands out one scripted batch per poll, then nothing.
pub struct ScriptedInput {
    batches: VecDeque<Vec<GameEvent>>,
    pub polls: usize,
    pub keys: KeyState,
}

impl ScriptedInput {
    pub fn new(batches: Vec<Vec<GameEvent>>) -> Self {
        Self {
            batches: batches.into(),
            polls: 0,
            keys: KeyState::default(),
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new())
    }
}

impl EventSource for ScriptedInput {
    fn poll_events(&mut self) -> Vec<GameEvent> {
        self.polls += 1;
        self.batches.pop_front().unwrap_or_default()
    }

    fn key_state(&self) -> KeyState {
        self.keys.clone()
    }
}

// --- Clock ---

/// Advances by a fixed step on every tick.
pub struct StepClock {
    pub now: Duration,
    pub step: Duration,
    pub ticks: u32,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            step,
            ticks: 0,
        }
    }
}

impl crate::time::Clock for StepClock {
    fn tick(&mut self) -> Duration {
        self.now += self.step;
        self.ticks += 1;
        self.step
    }

    fn now(&self) -> Duration {
        self.now
    }
}

// --- Clips ---

#[derive(Debug, Default)]
pub struct ClipLog {
    pub opened: Vec<PathBuf>,
    pub draws: u32,
    pub closed: u32,
    pub volume: Option<f32>,
    pub size: Option<(u32, u32)>,
}

pub struct FakeClipSource {
    pub log: Rc<RefCell<ClipLog>>,
    pub active_frames: u32,
    /// Duration reported by the n-th opened clip; the last entry repeats.
    pub durations: Vec<Duration>,
    pub missing: bool,
}

impl FakeClipSource {
    pub fn new(active_frames: u32, duration: Duration) -> Self {
        Self {
            log: Rc::new(RefCell::new(ClipLog::default())),
            active_frames,
            durations: vec![duration],
            missing: false,
        }
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.log.borrow().opened.clone()
    }
}

impl ClipSource for FakeClipSource {
    type Clip = FakeClip;

    fn open(&mut self, path: &Path) -> Result<FakeClip, CutsceneError> {
        if self.missing {
            return Err(CutsceneError::Open {
                path: path.to_path_buf(),
                reason: "not found".to_string(),
            });
        }
        let mut log = self.log.borrow_mut();
        let index = log.opened.len().min(self.durations.len() - 1);
        log.opened.push(path.to_path_buf());
        Ok(FakeClip {
            log: self.log.clone(),
            remaining: self.active_frames,
            duration: self.durations[index],
        })
    }
}

pub struct FakeClip {
    log: Rc<RefCell<ClipLog>>,
    remaining: u32,
    duration: Duration,
}

impl Clip for FakeClip {
    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = Some((width, height));
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().volume = Some(volume);
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn is_active(&self) -> bool {
        self.remaining > 0
    }

    fn draw(&mut self, target: &mut dyn RenderTarget, _position: (f32, f32)) {
        self.remaining = self.remaining.saturating_sub(1);
        self.log.borrow_mut().draws += 1;
        let dest = Rect::full(target.size());
        target.blit_pixels("__cutscene", 1, 1, &[0, 0, 0, 255], dest);
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

// --- Player and stages ---

#[derive(Debug, Default)]
pub struct FakePlayer {
    pub stats: Option<PlayerStats>,
    pub init_calls: u32,
    pub transformations: u32,
    pub frames: u32,
}

impl Player for FakePlayer {
    fn initial_config(&mut self, stats: PlayerStats) {
        self.stats = Some(stats);
        self.init_calls += 1;
    }

    fn do_transformation(&mut self) {
        self.transformations += 1;
    }
}

#[derive(Debug, Default)]
pub struct StageLog {
    pub created: Vec<StageId>,
    pub passed: HashSet<StageId>,
    /// (stage, number of events) for every `run` call.
    pub runs: Vec<(StageId, usize)>,
    pub fail_on: Option<StageId>,
}

pub type SharedStageLog = Rc<RefCell<StageLog>>;

pub struct FakeStage {
    id: StageId,
    background: String,
    log: SharedStageLog,
}

impl Stage<FakePlayer> for FakeStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn background_image(&self) -> &str {
        &self.background
    }

    fn stage_passed(&self) -> bool {
        self.log.borrow().passed.contains(&self.id)
    }

    fn run(
        &mut self,
        frame: &StageFrame<'_>,
        player: &mut FakePlayer,
        _target: &mut dyn RenderTarget,
    ) {
        player.frames += 1;
        self.log.borrow_mut().runs.push((self.id, frame.events.len()));
    }
}

pub struct FakeFactory {
    pub log: SharedStageLog,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(StageLog::default())),
        }
    }
}

impl StageFactory<FakePlayer> for FakeFactory {
    type Stage = FakeStage;

    fn create(&mut self, id: StageId, _player: &mut FakePlayer) -> Result<FakeStage, StageError> {
        if self.log.borrow().fail_on == Some(id) {
            return Err(StageError::Assets {
                stage: id,
                reason: "background missing".to_string(),
            });
        }
        self.log.borrow_mut().created.push(id);
        Ok(FakeStage {
            id,
            background: format!("bg/{}.png", id),
            log: self.log.clone(),
        })
    }
}
