// src/state.rs

use axum::extract::FromRef;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::content::ContentProvider;
use crate::engine::LessonSession;
use crate::ledger::LessonOutcome;
use crate::models::lesson::LessonResult;

/// A finished attempt kept alongside the session so a duplicate finish call
/// gets the same response instead of a second ledger write.
#[derive(Debug, Clone)]
pub struct CompletedLesson {
    pub result: LessonResult,
    pub outcome: LessonOutcome,
}

/// One user's live lesson attempt. Ephemeral: dropped on abandon or when a
/// new lesson is started; only a finished session reaches the ledger.
pub struct SessionEntry {
    pub session: LessonSession,
    pub completed: Option<CompletedLesson>,
}

/// Active lesson sessions, keyed by uid. One session per user at a time.
pub type Sessions = Arc<RwLock<HashMap<String, SessionEntry>>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub provider: Option<Arc<dyn ContentProvider>>,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, provider: Option<Arc<dyn ContentProvider>>) -> Self {
        Self {
            pool,
            config,
            provider,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
