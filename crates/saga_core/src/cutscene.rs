//! Modal full-motion-video playback.
//!
//! `CutscenePlayer::play` runs its own poll/draw/present loop and only
//! returns once the clip is done, so the game loop is frozen for the whole
//! cutscene. Three things end playback:
//!
//!   1. the clip reports itself inactive (decoding finished)
//!   2. wall-clock time since the start reaches the cached clip duration
//!   3. a pointer press (skip) or a quit request
//!
//! The duration is measured on the first playback and reused for every later
//! clip.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::input::{EventSource, GameEvent};
use crate::render::RenderTarget;
use crate::time::Clock;

/// Playback volume applied to every clip.
pub const CUTSCENE_VOLUME: f32 = 0.9;

#[derive(Debug, Error)]
pub enum CutsceneError {
    #[error("failed to open cutscene {path}: {reason}")]
    Open { path: PathBuf, reason: String },
}

/// A decoded video clip drawn frame by frame onto the display surface.
pub trait Clip {
    fn set_size(&mut self, width: u32, height: u32);

    fn set_volume(&mut self, volume: f32);

    fn duration(&self) -> Duration;

    /// False once the clip has run out of frames.
    fn is_active(&self) -> bool;

    fn draw(&mut self, target: &mut dyn RenderTarget, position: (f32, f32));

    fn close(&mut self);
}

pub trait ClipSource {
    type Clip: Clip;

    fn open(&mut self, path: &Path) -> Result<Self::Clip, CutsceneError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutsceneRequest {
    pub path: PathBuf,
    pub target_width: u32,
    pub target_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneOutcome {
    /// The clip ran out of frames.
    Finished,
    /// The cached duration elapsed first.
    Expired,
    /// A pointer press skipped the rest.
    Skipped,
    /// The user asked to close the game mid-cutscene.
    QuitRequested,
}

pub struct CutscenePlayer<S> {
    source: S,
    cached_duration: Option<Duration>,
    started_at: Duration,
}

impl<S: ClipSource> CutscenePlayer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached_duration: None,
            started_at: Duration::ZERO,
        }
    }

    /// Duration captured on the first playback, if any clip has played yet.
    pub fn cached_duration(&self) -> Option<Duration> {
        self.cached_duration
    }

    /// Clock timestamp at which the latest cutscene started.
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn play(
        &mut self,
        request: &CutsceneRequest,
        target: &mut dyn RenderTarget,
        input: &mut dyn EventSource,
        clock: &mut dyn Clock,
    ) -> Result<CutsceneOutcome, CutsceneError> {
        let mut clip = self.source.open(&request.path)?;
        clip.set_size(request.target_width, request.target_height);
        clip.set_volume(CUTSCENE_VOLUME);

        self.started_at = clock.now();
        let duration = match self.cached_duration {
            Some(duration) => duration,
            None => {
                let duration = clip.duration();
                self.cached_duration = Some(duration);
                log::debug!("Cutscene duration: {:.2}s", duration.as_secs_f64());
                duration
            }
        };
        log::debug!(
            "Cutscene '{}' started {:.2}s into the session",
            request.path.display(),
            self.started_at.as_secs_f64()
        );

        let outcome = loop {
            if !clip.is_active() {
                break CutsceneOutcome::Finished;
            }
            clip.draw(target, (0.0, 0.0));

            if clock.now().saturating_sub(self.started_at) >= duration {
                break CutsceneOutcome::Expired;
            }

            if let Some(outcome) = interrupting_event(&input.poll_events()) {
                break outcome;
            }

            target.present();
            clock.tick();
        };

        clip.close();
        if outcome != CutsceneOutcome::QuitRequested {
            target.present();
        }

        log::info!(
            "Cutscene '{}' ended: {:?}",
            request.path.display(),
            outcome
        );
        Ok(outcome)
    }
}

/// Quit wins over skip when both arrive in the same batch.
fn interrupting_event(events: &[GameEvent]) -> Option<CutsceneOutcome> {
    if events.iter().any(|e| matches!(e, GameEvent::Quit)) {
        return Some(CutsceneOutcome::QuitRequested);
    }
    if events
        .iter()
        .any(|e| matches!(e, GameEvent::PointerPressed { .. }))
    {
        return Some(CutsceneOutcome::Skipped);
    }
    None
}
