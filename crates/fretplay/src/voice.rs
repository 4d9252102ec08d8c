//! The shared voice pool.
//!
//! One emitter backs every session. The pool makes sure each voice is
//! loaded at most once at a time, that switching voices silences the old
//! one first, and that only one session drives the emitter at any moment.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::emitter::NoteEmitter;
use crate::error::PlaybackError;

/// Name of a sampled instrument, e.g. `acoustic_guitar_steel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(name: impl Into<String>) -> Self {
        VoiceId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(name: &str) -> Self {
        VoiceId::new(name)
    }
}

enum LoadSlot {
    /// A load is in flight; resolves to `Some(ready)`.
    Loading(watch::Receiver<Option<bool>>),
    Ready,
}

struct Owner {
    generation: u64,
    token: CancellationToken,
}

struct PoolInner {
    emitter: Arc<dyn NoteEmitter>,
    slots: Mutex<HashMap<VoiceId, LoadSlot>>,
    active: tokio::sync::Mutex<Option<VoiceId>>,
    permit: Arc<Semaphore>,
    owner: Mutex<Option<Owner>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to the voice pool.
#[derive(Clone)]
pub struct VoicePool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("loaded", &self.loaded_voices())
            .finish_non_exhaustive()
    }
}

enum Role {
    Lead(watch::Sender<Option<bool>>),
    Wait(watch::Receiver<Option<bool>>),
}

/// Clears an in-flight slot if the leading load is dropped before it
/// finishes, so a waiter can take over.
struct SlotGuard<'a> {
    inner: &'a PoolInner,
    voice: &'a VoiceId,
    armed: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(voice = %self.voice, "Voice load abandoned");
            lock(&self.inner.slots).remove(self.voice);
        }
    }
}

impl VoicePool {
    pub fn new(emitter: Arc<dyn NoteEmitter>) -> Self {
        VoicePool {
            inner: Arc::new(PoolInner {
                emitter,
                slots: Mutex::new(HashMap::new()),
                active: tokio::sync::Mutex::new(None),
                permit: Arc::new(Semaphore::new(1)),
                owner: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn emitter(&self) -> Arc<dyn NoteEmitter> {
        Arc::clone(&self.inner.emitter)
    }

    /// Load `voice` unless it is already loaded.
    ///
    /// Concurrent callers for the same voice share one load and all see
    /// its result. A failed load is not remembered, so the next call
    /// tries again.
    pub async fn ensure_loaded(&self, voice: &VoiceId) -> bool {
        loop {
            let role = {
                let mut slots = lock(&self.inner.slots);
                match slots.get(voice) {
                    Some(LoadSlot::Ready) => return true,
                    Some(LoadSlot::Loading(rx)) => Role::Wait(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        slots.insert(voice.clone(), LoadSlot::Loading(rx));
                        Role::Lead(tx)
                    }
                }
            };

            match role {
                Role::Lead(tx) => {
                    let mut guard = SlotGuard {
                        inner: &self.inner,
                        voice,
                        armed: true,
                    };
                    debug!(voice = %voice, "Loading voice");
                    let ready = self.inner.emitter.load_voice(voice).await;
                    guard.armed = false;

                    {
                        let mut slots = lock(&self.inner.slots);
                        if ready {
                            slots.insert(voice.clone(), LoadSlot::Ready);
                        } else {
                            slots.remove(voice);
                        }
                    }
                    if ready {
                        info!(voice = %voice, "Voice ready");
                    } else {
                        warn!(voice = %voice, "Voice failed to load");
                    }
                    // Receivers may all be gone; nothing to report then
                    let _ = tx.send(Some(ready));
                    return ready;
                }
                Role::Wait(mut rx) => {
                    debug!(voice = %voice, "Waiting for in-flight voice load");
                    match rx.wait_for(|state| state.is_some()).await {
                        Ok(state) => return (*state).unwrap_or(false),
                        // Leader went away without an answer
                        Err(_) => continue,
                    }
                }
            }
        }
    }

    /// Make `voice` the active voice. The previous voice is silenced
    /// before the new one is loaded.
    pub async fn select_voice(&self, voice: &VoiceId) -> Result<(), PlaybackError> {
        let mut active = self.inner.active.lock().await;
        if active.as_ref() == Some(voice) {
            return Ok(());
        }

        if let Some(previous) = active.take() {
            debug!(from = %previous, to = %voice, "Switching voice");
            self.inner.emitter.silence_all().await;
        }

        if !self.ensure_loaded(voice).await {
            return Err(PlaybackError::VoiceUnavailable(voice.clone()));
        }
        *active = Some(voice.clone());
        Ok(())
    }

    pub async fn active_voice(&self) -> Option<VoiceId> {
        self.inner.active.lock().await.clone()
    }

    pub fn loaded_voices(&self) -> Vec<VoiceId> {
        let slots = lock(&self.inner.slots);
        let mut loaded: Vec<VoiceId> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, LoadSlot::Ready))
            .map(|(voice, _)| voice.clone())
            .collect();
        loaded.sort_by(|a, b| a.0.cmp(&b.0));
        loaded
    }

    /// Take exclusive ownership of the emitter.
    ///
    /// Whoever holds the pool now is told to stop and the emitter is
    /// silenced, then this waits for the permit. The latest claimer wins.
    pub async fn claim(&self) -> Result<PlaybackPermit, PlaybackError> {
        if self.inner.permit.is_closed() {
            return Err(PlaybackError::PoolClosed);
        }

        let token = CancellationToken::new();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = lock(&self.inner.owner).replace(Owner {
            generation,
            token: token.clone(),
        });

        if let Some(previous) = previous {
            debug!(generation = previous.generation, "Preempting active playback");
            previous.token.cancel();
            self.inner.emitter.silence_all().await;
        }

        let permit = Arc::clone(&self.inner.permit)
            .acquire_owned()
            .await
            .map_err(|_| PlaybackError::PoolClosed)?;

        Ok(PlaybackPermit {
            _permit: permit,
            token,
            generation,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Stop the current owner and refuse further claims.
    pub fn close(&self) {
        self.inner.permit.close();
        if let Some(owner) = lock(&self.inner.owner).take() {
            owner.token.cancel();
        }
    }
}

/// Exclusive right to drive the emitter. Released on drop.
pub struct PlaybackPermit {
    _permit: OwnedSemaphorePermit,
    token: CancellationToken,
    generation: u64,
    inner: Arc<PoolInner>,
}

impl PlaybackPermit {
    /// Cancelled when another session claims the pool.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_preempted(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl fmt::Debug for PlaybackPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackPermit")
            .field("generation", &self.generation)
            .field("preempted", &self.is_preempted())
            .finish()
    }
}

impl Drop for PlaybackPermit {
    fn drop(&mut self) {
        let mut owner = lock(&self.inner.owner);
        if owner.as_ref().map(|o| o.generation) == Some(self.generation) {
            *owner = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{DetachedNote, NoteHandle, Strike};
    use crate::error::EmitError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct SlowLoader {
        loads: AtomicUsize,
        silences: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl NoteEmitter for SlowLoader {
        async fn load_voice(&self, _voice: &VoiceId) -> bool {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            !(self.fail_first && n == 0)
        }

        async fn trigger(&self, _strike: Strike<'_>) -> Result<Box<dyn NoteHandle>, EmitError> {
            Ok(Box::new(DetachedNote))
        }

        async fn silence_all(&self) {
            self.silences.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_attempt() {
        let emitter = Arc::new(SlowLoader::default());
        let pool = VoicePool::new(emitter.clone());
        let voice = VoiceId::new("nylon");

        let (a, b, c) = tokio::join!(
            pool.ensure_loaded(&voice),
            pool.ensure_loaded(&voice),
            pool.ensure_loaded(&voice)
        );

        assert!(a && b && c);
        assert_eq!(emitter.loads.load(Ordering::SeqCst), 1);
        assert_eq!(pool.loaded_voices(), vec![voice.clone()]);

        assert!(pool.ensure_loaded(&voice).await);
        assert_eq!(emitter.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_is_shared_then_retried() {
        let emitter = Arc::new(SlowLoader {
            fail_first: true,
            ..Default::default()
        });
        let pool = VoicePool::new(emitter.clone());
        let voice = VoiceId::new("banjo");

        let (a, b) = tokio::join!(pool.ensure_loaded(&voice), pool.ensure_loaded(&voice));
        assert!(!a && !b);
        assert_eq!(emitter.loads.load(Ordering::SeqCst), 1);

        assert!(pool.ensure_loaded(&voice).await);
        assert_eq!(emitter.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_leader_hands_over() {
        let emitter = Arc::new(SlowLoader::default());
        let pool = VoicePool::new(emitter.clone());
        let voice = VoiceId::new("cello");

        let leader = {
            let pool = pool.clone();
            let voice = voice.clone();
            tokio::spawn(async move { pool.ensure_loaded(&voice).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        leader.abort();
        let _ = leader.await;

        assert!(pool.ensure_loaded(&voice).await);
        assert_eq!(emitter.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_voice_silences_previous() {
        let emitter = Arc::new(SlowLoader::default());
        let pool = VoicePool::new(emitter.clone());

        pool.select_voice(&VoiceId::new("piano")).await.unwrap();
        assert_eq!(emitter.silences.load(Ordering::SeqCst), 0);

        pool.select_voice(&VoiceId::new("piano")).await.unwrap();
        assert_eq!(emitter.silences.load(Ordering::SeqCst), 0);

        pool.select_voice(&VoiceId::new("guitar")).await.unwrap();
        assert_eq!(emitter.silences.load(Ordering::SeqCst), 1);
        assert_eq!(pool.active_voice().await, Some(VoiceId::new("guitar")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_preempts_current_owner() {
        let emitter = Arc::new(SlowLoader::default());
        let pool = VoicePool::new(emitter.clone());

        let first = pool.claim().await.unwrap();
        assert!(!first.is_preempted());

        let second = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.claim().await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(first.is_preempted());
        assert_eq!(emitter.silences.load(Ordering::SeqCst), 1);
        assert!(!second.is_finished());

        drop(first);
        let second = second.await.unwrap().unwrap();
        assert!(!second.is_preempted());
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_claims() {
        let pool = VoicePool::new(Arc::new(SlowLoader::default()));
        let permit = pool.claim().await.unwrap();
        pool.close();

        assert!(permit.is_preempted());
        assert!(matches!(pool.claim().await, Err(PlaybackError::PoolClosed)));
    }
}
