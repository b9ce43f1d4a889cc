//! Score persistence
//!
//! `ScoreStore` is the key-value seam; `ScoreKeeper` sits on top of it and
//! never fails: read errors and corrupt values fall back to defaults, write
//! errors are logged and dropped.

use crate::error::{Error, Result};
use numlab_common::events::ScoreRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Running correct/total record, stored as JSON
pub const SCORE_KEY: &str = "numlab.score";

/// Best streak, stored as a decimal integer
pub const BEST_STREAK_KEY: &str = "numlab.best_streak";

/// Persistent string key-value store
#[allow(async_fn_in_trait)]
pub trait ScoreStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store for tests and `--no-persist`
///
/// Clones share the same map, so a test can keep a handle while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing the failure switch
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Storage("store unavailable".to_string()));
        }
        Ok(())
    }

    fn map(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))
    }
}

impl ScoreStore for MemoryScoreStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.map()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.map()?.remove(key);
        Ok(())
    }
}

/// Typed, infallible access to the persisted scores
pub struct ScoreKeeper<S> {
    store: S,
}

impl<S: ScoreStore> ScoreKeeper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Best streak, 0 when absent or unreadable
    pub async fn load_high_score(&self) -> u32 {
        match self.store.get(BEST_STREAK_KEY).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring corrupt {} value: {:?}", BEST_STREAK_KEY, raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!("Failed to load high score: {}", e);
                0
            }
        }
    }

    pub async fn save_high_score(&self, high_score: u32) {
        match self.store.set(BEST_STREAK_KEY, &high_score.to_string()).await {
            Ok(()) => debug!("Saved high score {}", high_score),
            Err(e) => warn!("Failed to save high score: {}", e),
        }
    }

    pub async fn clear_high_score(&self) {
        if let Err(e) = self.store.remove(BEST_STREAK_KEY).await {
            warn!("Failed to clear high score: {}", e);
        }
    }

    /// Correct/total record, zeroed when absent or unreadable
    pub async fn load_score(&self) -> ScoreRecord {
        match self.store.get(SCORE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<ScoreRecord>(&raw) {
                Ok(score) if score.correct <= score.total => score,
                Ok(score) => {
                    warn!(
                        "Ignoring inconsistent {} value: {} correct of {}",
                        SCORE_KEY, score.correct, score.total
                    );
                    ScoreRecord::default()
                }
                Err(e) => {
                    warn!("Ignoring corrupt {} value: {}", SCORE_KEY, e);
                    ScoreRecord::default()
                }
            },
            Ok(None) => ScoreRecord::default(),
            Err(e) => {
                warn!("Failed to load score: {}", e);
                ScoreRecord::default()
            }
        }
    }

    pub async fn save_score(&self, score: ScoreRecord) {
        let json = match serde_json::to_string(&score) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode score: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(SCORE_KEY, &json).await {
            warn!("Failed to save score: {}", e);
        }
    }

    pub async fn clear_score(&self) {
        if let Err(e) = self.store.remove(SCORE_KEY).await {
            warn!("Failed to clear score: {}", e);
        }
    }
}
