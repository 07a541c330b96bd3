//! Application state shared by all handlers.
//!
//! This module owns:
//!   - the vocabulary bank (built-in tables + configured extras)
//!   - tuning constants and prompts (from TOML or defaults)
//!   - the delegated services
//!   - server-held sessions for the HTTP API (WebSocket connections own theirs)
//!
//! HTTP sessions idle longer than `session_idle_ttl` are dropped lazily on the
//! next create/lookup; `max_sessions` caps the map by evicting the least
//! recently used entry.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_tutor_config_from_env, Tuning, TutorConfig};
use crate::error::TutorError;
use crate::services::Services;
use crate::session::TutorSession;
use crate::vocabulary::VocabularyBank;

pub type SharedSession = Arc<Mutex<TutorSession>>;

pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionSlot {
    handle: SharedSession,
    last_used: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub vocabulary: Arc<VocabularyBank>,
    pub tuning: Tuning,
    pub services: Services,
    /// Fixed RNG seed for new sessions (TUTOR_SEED); entropy when absent.
    pub seed: Option<u64>,
    pub session_idle_ttl: Duration,
    pub max_sessions: usize,
    sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
}

impl AppState {
    /// Build state from env: load config, build vocabulary, init services.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_tutor_config_from_env().unwrap_or_default();
        let services = Services::from_env(&cfg.prompts);
        let seed = std::env::var("TUTOR_SEED").ok().and_then(|s| s.parse::<u64>().ok());
        let idle_secs = std::env::var("SESSION_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);
        let max_sessions = std::env::var("MAX_SESSIONS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        Self::with_services(cfg, services, seed).with_session_limits(Duration::from_secs(idle_secs), max_sessions)
    }

    pub fn with_services(cfg: TutorConfig, services: Services, seed: Option<u64>) -> Self {
        let vocabulary = Arc::new(VocabularyBank::with_extras(&cfg.vocabulary));
        info!(
            target: "lingo_tutor",
            review_probability = cfg.tuning.review_probability,
            similarity_threshold = cfg.tuning.similarity_threshold,
            points_per_correct = cfg.tuning.points_per_correct,
            "Tuning loaded"
        );
        Self {
            vocabulary,
            tuning: cfg.tuning,
            services,
            seed,
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_session_limits(mut self, idle_ttl: Duration, max_sessions: usize) -> Self {
        self.session_idle_ttl = idle_ttl;
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// A fresh, uninitialized session that nobody else can see.
    pub fn new_session(&self) -> TutorSession {
        TutorSession::new(
            Uuid::new_v4().to_string(),
            self.vocabulary.clone(),
            self.tuning,
            self.seed,
        )
    }

    /// Create a server-held session; returns its id and handle.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> (String, SharedSession) {
        let session = self.new_session();
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, now);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    info!(target: "lingo_tutor", session = %oldest, "Session evicted (capacity)");
                }
                None => break,
            }
        }
        sessions.insert(id.clone(), SessionSlot { handle: handle.clone(), last_used: now });
        info!(target: "lingo_tutor", session = %id, active = sessions.len(), "Session created");
        (id, handle)
    }

    /// Look up a session and mark it used. Idle sessions are gone.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<SharedSession, TutorError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, now);
        let slot = sessions.get_mut(id).ok_or_else(|| TutorError::UnknownSession(id.to_string()))?;
        slot.last_used = now;
        Ok(slot.handle.clone())
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, SessionSlot>, now: Instant) {
        let ttl = self.session_idle_ttl;
        sessions.retain(|id, slot| {
            let keep = now.saturating_duration_since(slot.last_used) <= ttl;
            if !keep {
                info!(target: "lingo_tutor", session = %id, "Session expired (idle)");
            }
            keep
        });
    }

    /// Drop a session entirely, learned words included.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> Result<(), TutorError> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                info!(target: "lingo_tutor", session = %id, "Session removed");
                Ok(())
            }
            None => Err(TutorError::UnknownSession(id.to_string())),
        }
    }
}
