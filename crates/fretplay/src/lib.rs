//! Timed playback of guitar tabs and instrument note events.
//!
//! The pieces, bottom up:
//!
//! - [`duration`] turns duration codes and tempo into wall-clock time.
//! - [`unit`] adapts parsed tab slices and note events to [`PlayableUnit`].
//! - [`emitter`] is the contract for whatever actually makes sound.
//! - [`voice`] shares one emitter safely: single-flight voice loads and an
//!   exclusive playback permit.
//! - [`scheduler`] walks units in order, strums chords, sleeps, loops and
//!   stops at unit boundaries.
//! - [`session`] ties it together for callers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fretconf::FretConfig;
//! use fretplay::{LoggingEmitter, PlaybackSession, VoicePool};
//!
//! # async fn demo() -> Result<(), fretplay::PlaybackError> {
//! let pool = VoicePool::new(Arc::new(LoggingEmitter));
//! let session = PlaybackSession::new(pool, &FretConfig::default());
//!
//! let tab = "e|--0--2--|\nB|--3-----|\nG|-------|\nD|-------|\nA|-------|\nE|-------|";
//! let outcome = session
//!     .play_tab_text(tab, Some(100.0), None, |p| println!("{}/{}", p.index, p.total))
//!     .await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod control;
pub mod duration;
pub mod emitter;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod unit;
pub mod voice;

pub use control::{ControlMessage, ControlReceiver, NeverStop, PlaybackControl, StopCondition};
pub use duration::{seconds_for, tab_step_seconds, NoteLength, Tempo, TAB_STEP_CODE};
pub use emitter::{DetachedNote, Envelope, LoggingEmitter, NoteEmitter, NoteHandle, Strike};
pub use error::{EmitError, PlaybackError};
pub use scheduler::{PlaybackOutcome, Progress, Scheduler};
pub use session::{PlaybackMode, PlaybackSession};
pub use unit::{events_from_json, tab_steps, NoteEvent, PlayableUnit, TabStep};
pub use voice::{PlaybackPermit, VoiceId, VoicePool};
