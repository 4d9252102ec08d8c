//! The playback loop.
//!
//! Units are played strictly in order. Each one is emitted, then the
//! scheduler sleeps for its length. Stop requests, loop changes and
//! retunes are only looked at between units, so a chord already being
//! strummed always finishes.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, instrument, trace, warn};

use crate::control::{ControlMessage, ControlReceiver, PlaybackControl, StopCondition};
use crate::duration::Tempo;
use crate::emitter::{Envelope, NoteEmitter, NoteHandle, Strike};
use crate::error::PlaybackError;
use crate::unit::PlayableUnit;

/// Position report. `index == total` marks a completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.index == self.total
    }
}

/// How a `play` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Nothing to play
    Empty,
    /// Every requested pass finished
    Completed { passes: u32 },
    /// Stopped before unit `index` of pass `passes + 1`
    Stopped { index: usize, passes: u32 },
}

/// Mutable state of one `play` call. Dropped when it returns.
#[derive(Debug)]
struct SessionState {
    tempo: Tempo,
    looping: bool,
    stop_requested: bool,
    passes: u32,
}

impl SessionState {
    /// Apply one control message. A retune is ignored if any unit would
    /// become unschedulable at the new tempo.
    fn apply<U: PlayableUnit>(&mut self, message: ControlMessage, units: &[U]) {
        match message {
            ControlMessage::Stop => self.stop_requested = true,
            ControlMessage::SetLoop(looping) => {
                debug!(looping, "Loop flag changed");
                self.looping = looping;
            }
            ControlMessage::Retune(tempo) => {
                if let Err(e) = check_lengths(units, tempo) {
                    warn!(bpm = tempo.bpm(), error = %e, "Retune ignored");
                    return;
                }
                debug!(from = self.tempo.bpm(), to = tempo.bpm(), "Retuned");
                self.tempo = tempo;
            }
        }
    }
}

/// Every unit must resolve to a representable duration at `tempo`.
fn check_lengths<U: PlayableUnit>(units: &[U], tempo: Tempo) -> Result<(), PlaybackError> {
    for unit in units {
        unit.length().duration(tempo)?;
    }
    Ok(())
}

/// Drives one emitter through a sequence of units.
pub struct Scheduler {
    emitter: Arc<dyn NoteEmitter>,
    strum: Duration,
    envelope: Envelope,
    controls: Option<ControlReceiver>,
}

impl Scheduler {
    /// `strum` is the gap between successive pitches of a chord.
    pub fn new(emitter: Arc<dyn NoteEmitter>, strum: Duration) -> Self {
        Scheduler {
            emitter,
            strum,
            envelope: Envelope::default(),
            controls: None,
        }
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_controls(mut self, controls: ControlReceiver) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Open a fresh control channel for this scheduler.
    pub fn control(&mut self) -> PlaybackControl {
        let (control, rx) = PlaybackControl::channel();
        self.controls = Some(rx);
        control
    }

    /// Play `units` at `tempo`.
    ///
    /// Every unit length is resolved at `tempo` before anything sounds.
    /// `stop` is polled before each unit; once it fires no further
    /// progress is reported. A finished pass reports `(total, total)` and starts over
    /// if looping is still on.
    #[instrument(skip_all, fields(units = units.len(), bpm = tempo.bpm(), looping = looping))]
    pub async fn play<U, P, S>(
        &mut self,
        units: &[U],
        tempo: Tempo,
        looping: bool,
        mut on_progress: P,
        stop: &S,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        U: PlayableUnit,
        P: FnMut(Progress) + Send,
        S: StopCondition + ?Sized,
    {
        check_lengths(units, tempo)?;
        if units.is_empty() {
            debug!("Nothing to play");
            return Ok(PlaybackOutcome::Empty);
        }

        let total = units.len();
        let mut state = SessionState {
            tempo,
            looping,
            stop_requested: false,
            passes: 0,
        };
        let mut sounding: Vec<Box<dyn NoteHandle>> = Vec::new();

        loop {
            for (index, unit) in units.iter().enumerate() {
                self.apply_controls(&mut state, units);
                if state.stop_requested || stop.should_stop() {
                    release(&mut sounding);
                    info!(index, passes = state.passes, "Playback stopped");
                    return Ok(PlaybackOutcome::Stopped {
                        index,
                        passes: state.passes,
                    });
                }

                on_progress(Progress { index, total });

                let hold = unit.length().duration(state.tempo)?;
                sounding = self.emit(unit, hold).await;
                sleep(hold).await;
            }

            state.passes += 1;
            on_progress(Progress {
                index: total,
                total,
            });

            self.apply_controls(&mut state, units);
            if !state.looping {
                info!(passes = state.passes, "Playback complete");
                return Ok(PlaybackOutcome::Completed {
                    passes: state.passes,
                });
            }
            debug!(passes = state.passes, "Looping");
        }
    }

    fn apply_controls<U: PlayableUnit>(&self, state: &mut SessionState, units: &[U]) {
        if let Some(controls) = &self.controls {
            for message in controls.drain() {
                state.apply(message, units);
            }
        }
    }

    /// Trigger every pitch of `unit`, spreading chords by the strum gap.
    /// Failed triggers are logged and skipped.
    async fn emit<U: PlayableUnit>(&self, unit: &U, hold: Duration) -> Vec<Box<dyn NoteHandle>> {
        let mut envelope = self.envelope.held_for(hold);
        if let Some(velocity) = unit.velocity() {
            envelope = envelope.with_velocity(velocity);
        }

        let pitches = unit.pitches();
        let mut handles = Vec::with_capacity(pitches.len());
        for (i, &pitch) in pitches.iter().enumerate() {
            let strike = Strike {
                pitch,
                at: self.strum * i as u32,
                envelope,
                articulation: unit.articulation(),
            };
            trace!(pitch, at_ms = strike.at.as_millis() as u64, "trigger");
            match self.emitter.trigger(strike).await {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(pitch, error = %e, "Note trigger failed, skipping"),
            }
        }
        handles
    }
}

fn release(sounding: &mut Vec<Box<dyn NoteHandle>>) {
    for handle in sounding.drain(..) {
        handle.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::NeverStop;
    use crate::emitter::DetachedNote;
    use crate::error::EmitError;
    use crate::unit::NoteEvent;
    use crate::voice::VoiceId;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorder {
        strikes: Mutex<Vec<(u8, Duration, f32)>>,
        reject: Option<u8>,
    }

    impl Recorder {
        fn pitches(&self) -> Vec<u8> {
            self.strikes.lock().unwrap().iter().map(|s| s.0).collect()
        }
    }

    #[async_trait]
    impl NoteEmitter for Recorder {
        async fn load_voice(&self, _voice: &VoiceId) -> bool {
            true
        }

        async fn trigger(&self, strike: Strike<'_>) -> Result<Box<dyn NoteHandle>, EmitError> {
            if self.reject == Some(strike.pitch) {
                return Err(EmitError::new(strike.pitch, "sample missing"));
            }
            self.strikes
                .lock()
                .unwrap()
                .push((strike.pitch, strike.at, strike.envelope.gain));
            Ok(Box::new(DetachedNote))
        }

        async fn silence_all(&self) {}
    }

    fn quarter(pitches: &[u8]) -> NoteEvent {
        NoteEvent::new(pitches.to_vec(), 4)
    }

    #[tokio::test(start_paused = true)]
    async fn test_chord_is_strummed() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::from_millis(15));

        let outcome = scheduler
            .play(&[quarter(&[60, 64, 67])], Tempo::new(120.0).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { passes: 1 });
        let strikes = recorder.strikes.lock().unwrap().clone();
        let offsets: Vec<Duration> = strikes.iter().map(|s| s.1).collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_millis(15), Duration::from_millis(30)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_for_each_unit() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder, Duration::from_millis(20));
        let units = vec![quarter(&[60]), NoteEvent::new(vec![62], 1), quarter(&[64])];

        let start = Instant::now();
        scheduler
            .play(&units, Tempo::new(120.0).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap();

        // 0.5 + 2.0 + 0.5 seconds
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trigger_does_not_abort() {
        let recorder = Arc::new(Recorder {
            reject: Some(64),
            ..Default::default()
        });
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::from_millis(15));
        let units = vec![quarter(&[60, 64]), quarter(&[67])];

        let outcome = scheduler
            .play(&units, Tempo::new(120.0).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { passes: 1 });
        assert_eq!(recorder.pitches(), vec![60, 67]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_length_rejected_before_emission() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::ZERO);
        let units = vec![quarter(&[60]), NoteEvent::new(vec![62], 0)];

        let err = scheduler
            .play(&units, Tempo::new(120.0).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap_err();

        assert!(matches!(err, PlaybackError::InvalidDuration(_)));
        assert!(recorder.pitches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_velocity_scales_gain() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::ZERO);
        let units = vec![quarter(&[60]).with_velocity(0)];

        scheduler
            .play(&units, Tempo::new(120.0).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap();

        assert_eq!(recorder.strikes.lock().unwrap()[0].2, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_message_applies_at_boundary() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::ZERO);
        let control = scheduler.control();
        let units = vec![quarter(&[60]), quarter(&[62]), quarter(&[64])];

        let mut seen = Vec::new();
        let outcome = scheduler
            .play(
                &units,
                Tempo::new(120.0).unwrap(),
                false,
                |p: Progress| {
                    seen.push(p.index);
                    if p.index == 0 {
                        control.stop();
                    }
                },
                &NeverStop,
            )
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Stopped { index: 1, passes: 0 });
        assert_eq!(seen, vec![0]);
        assert_eq!(recorder.pitches(), vec![60]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_tempo_is_an_error() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::ZERO);

        let err = scheduler
            .play(&[quarter(&[60])], Tempo::new(1e-18).unwrap(), false, |_| {}, &NeverStop)
            .await
            .unwrap_err();

        assert!(matches!(err, PlaybackError::InvalidDuration(_)));
        assert!(recorder.pitches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_retune_is_ignored() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = Scheduler::new(recorder.clone(), Duration::ZERO);
        let control = scheduler.control();
        let units = vec![quarter(&[60]), quarter(&[62]), quarter(&[64])];

        let start = Instant::now();
        let outcome = scheduler
            .play(
                &units,
                Tempo::new(120.0).unwrap(),
                false,
                |p: Progress| {
                    if p.index == 0 {
                        control.retune(Tempo::new(1e-18).unwrap());
                    }
                },
                &NeverStop,
            )
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { passes: 1 });
        assert_eq!(recorder.pitches(), vec![60, 62, 64]);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }
}
