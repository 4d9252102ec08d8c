//! Caller-owned playback sessions.
//!
//! A session bundles the voice pool, the configured defaults and a control
//! channel. Each `play_*` call claims the pool, selects the voice for its
//! mode and runs a fresh [`Scheduler`].

use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use asciitab::{TimeSlice, Tuning};
use fretconf::{FretConfig, PlaybackConfig, VoiceConfig};

use crate::control::{ControlReceiver, PlaybackControl, StopCondition};
use crate::duration::Tempo;
use crate::emitter::Envelope;
use crate::error::PlaybackError;
use crate::scheduler::{PlaybackOutcome, Progress, Scheduler};
use crate::unit::{tab_steps, NoteEvent, PlayableUnit};
use crate::voice::{VoiceId, VoicePool};

/// Which kind of content a session is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Tab,
    Events,
}

impl PlaybackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackMode::Tab => "tab",
            PlaybackMode::Events => "events",
        }
    }
}

pub struct PlaybackSession {
    id: Uuid,
    pool: VoicePool,
    playback: PlaybackConfig,
    voices: VoiceConfig,
    envelope: Envelope,
    tuning: Tuning,
    control: PlaybackControl,
    controls: ControlReceiver,
}

impl PlaybackSession {
    pub fn new(pool: VoicePool, config: &FretConfig) -> Self {
        let (control, controls) = PlaybackControl::channel();
        PlaybackSession {
            id: Uuid::new_v4(),
            pool,
            playback: config.playback.clone(),
            voices: config.voices.clone(),
            envelope: Envelope::from_config(&config.envelope),
            tuning: Tuning::standard(),
            control,
            controls,
        }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Sender for stop, loop and retune requests. Messages sent while no
    /// playback is running are discarded when the next one starts.
    pub fn control(&self) -> PlaybackControl {
        self.control.clone()
    }

    /// Play parsed tab slices. `tempo_bpm` and `looping` fall back to the
    /// configured values.
    pub async fn play_tab<P>(
        &self,
        slices: &[TimeSlice],
        tempo_bpm: Option<f64>,
        looping: Option<bool>,
        on_progress: P,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        P: FnMut(Progress) + Send,
    {
        let steps = tab_steps(slices, &self.tuning);
        self.run(PlaybackMode::Tab, &steps, tempo_bpm, looping, on_progress)
            .await
    }

    /// Parse and play tab text. Malformed text plays nothing.
    pub async fn play_tab_text<P>(
        &self,
        text: &str,
        tempo_bpm: Option<f64>,
        looping: Option<bool>,
        on_progress: P,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        P: FnMut(Progress) + Send,
    {
        let slices = asciitab::parse(text);
        if slices.is_empty() {
            debug!(session = %self.id, "Tab text produced no notes");
        }
        self.play_tab(&slices, tempo_bpm, looping, on_progress).await
    }

    /// Play instrument note events. Every event is validated first.
    pub async fn play_events<P>(
        &self,
        events: &[NoteEvent],
        tempo_bpm: Option<f64>,
        looping: Option<bool>,
        on_progress: P,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        P: FnMut(Progress) + Send,
    {
        for (index, event) in events.iter().enumerate() {
            event.validate(index)?;
        }
        self.run(PlaybackMode::Events, events, tempo_bpm, looping, on_progress)
            .await
    }

    async fn run<U, P>(
        &self,
        mode: PlaybackMode,
        units: &[U],
        tempo_bpm: Option<f64>,
        looping: Option<bool>,
        on_progress: P,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        U: PlayableUnit,
        P: FnMut(Progress) + Send,
    {
        let span = info_span!("playback", session = %self.id, mode = mode.as_str());
        self.run_claimed(mode, units, tempo_bpm, looping, on_progress)
            .instrument(span)
            .await
    }

    async fn run_claimed<U, P>(
        &self,
        mode: PlaybackMode,
        units: &[U],
        tempo_bpm: Option<f64>,
        looping: Option<bool>,
        on_progress: P,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        U: PlayableUnit,
        P: FnMut(Progress) + Send,
    {
        let tempo = Tempo::new(tempo_bpm.unwrap_or(self.playback.tempo))?;
        let looping = looping.unwrap_or(self.playback.looping);
        if units.is_empty() {
            return Ok(PlaybackOutcome::Empty);
        }

        let stale = self.controls.drain();
        if !stale.is_empty() {
            debug!(count = stale.len(), "Discarding stale control messages");
        }

        let permit = self.pool.claim().await?;
        let (voice, strum_ms) = match mode {
            PlaybackMode::Tab => (&self.voices.tab, self.playback.tab_strum_ms),
            PlaybackMode::Events => (&self.voices.events, self.playback.event_strum_ms),
        };
        self.pool.select_voice(&VoiceId::new(voice.as_str())).await?;

        let mut scheduler = Scheduler::new(self.pool.emitter(), Duration::from_millis(strum_ms))
            .with_envelope(self.envelope)
            .with_controls(self.controls.clone());
        let outcome = scheduler
            .play(units, tempo, looping, on_progress, permit.token())
            .await?;

        if let PlaybackOutcome::Stopped { index, .. } = outcome {
            if permit.token().should_stop() {
                warn!(index, "Preempted by another session");
            }
            self.pool.emitter().silence_all().await;
        }
        Ok(outcome)
    }
}
