use crate::model::{
    SessionPatch,
    UserSession,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::PathBuf,
};
use tokio::sync::watch;
use tracing::warn;

const SESSION_FILE: &str = "session.json";

/// What survives a restart: the last session snapshot and the bearer token,
/// always stored and cleared together.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    session: Option<UserSession>,
    token: Option<String>,
}

/// Single source of truth for "who is logged in". All reads go through
/// [`SessionStore::current`] or a subscription; all writes go through
/// `set_authenticated`/`update`/`clear`. Persistence is best-effort: if the
/// state file cannot be written the in-memory snapshot stays authoritative
/// for this run and is simply lost on restart.
pub struct SessionStore {
    tx: watch::Sender<Option<UserSession>>,
    token: Option<String>,
    state_path: Option<PathBuf>,
}

impl SessionStore {
    /// Open the store backed by `state_dir`, loading any persisted session.
    /// An unreadable or corrupt state file is discarded, not an error.
    pub fn open(state_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&state_dir) {
            warn!(dir = %state_dir.display(), error = %e, "cannot create state dir; session will not persist");
            return Self::in_memory();
        }
        let state_path = state_dir.join(SESSION_FILE);
        let loaded = match fs::read(&state_path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedState>(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "discarding corrupt session file");
                    let _ = fs::remove_file(&state_path);
                    PersistedState::default()
                }
            },
            Err(_) => PersistedState::default(),
        };
        let (tx, _) = watch::channel(loaded.session);
        Self {
            tx,
            token: loaded.token,
            state_path: Some(state_path),
        }
    }

    pub fn in_memory() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            token: None,
            state_path: None,
        }
    }

    /// Current snapshot, or none when logged out. No side effects.
    pub fn current(&self) -> Option<UserSession> {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.token.clone()
    }

    /// Hot, replay-one stream: the receiver sees the current value
    /// immediately and every change after.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserSession>> {
        self.tx.subscribe()
    }

    /// Replace the snapshot and token after login/registration.
    pub fn set_authenticated(&mut self, session: UserSession, token: String) {
        self.token = Some(token);
        self.tx.send_replace(Some(session));
        self.persist();
    }

    /// Merge a partial update into the existing snapshot, favoring new
    /// values and keeping previous ones for absent fields. A no-op when
    /// logged out. Returns the merged snapshot.
    pub fn update(&mut self, patch: SessionPatch) -> Option<UserSession> {
        let mut merged = None;
        self.tx.send_if_modified(|slot| match slot {
            Some(session) => {
                session.apply(patch.clone());
                merged = Some(session.clone());
                true
            }
            None => false,
        });
        if merged.is_some() {
            self.persist();
        }
        merged
    }

    /// Drop the snapshot and token together; used on logout and on any
    /// authorization failure.
    pub fn clear(&mut self) {
        self.token = None;
        self.tx.send_replace(None);
        if let Some(path) = &self.state_path {
            let _ = fs::remove_file(path);
        }
    }

    #[cfg(test)]
    pub fn set_token_for_tests(&mut self, token: String) {
        self.token = Some(token);
    }

    fn persist(&self) {
        let Some(path) = &self.state_path else {
            return;
        };
        let state = PersistedState {
            session: self.current(),
            token: self.token.clone(),
        };
        match serde_json::to_vec_pretty(&state) {
            Ok(bytes) => {
                if let Err(e) = fs::write(path, bytes) {
                    warn!(path = %path.display(), error = %e, "failed to persist session");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AccountStatus,
        GameStats,
    };

    fn sample_session() -> UserSession {
        UserSession {
            id: "7".into(),
            username: "rupa".into(),
            email: "rupa@example.com".into(),
            balance: 1500,
            roles: vec!["ROLE_USER".into()],
            status: AccountStatus::Active,
            created_at: crate::model::parse_timestamp("2024-03-01T10:30:00Z"),
            stats: GameStats {
                total_games: 9,
                games_won: 4,
                games_lost: 5,
                lifetime_earnings: -100,
                highest_win: 2000,
            },
        }
    }

    #[test]
    fn persisted_session_round_trips_with_numbers_intact() {
        let dir = tempfile::tempdir().unwrap();
        let session = sample_session();

        let mut store = SessionStore::open(dir.path().to_path_buf());
        store.set_authenticated(session.clone(), "jwt-abc".into());
        drop(store);

        let reloaded = SessionStore::open(dir.path().to_path_buf());
        assert_eq!(reloaded.current(), Some(session));
        assert_eq!(reloaded.token().as_deref(), Some("jwt-abc"));
    }

    #[test]
    fn clear_removes_snapshot_and_token_together() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path().to_path_buf());
        store.set_authenticated(sample_session(), "jwt-abc".into());

        store.clear();
        assert!(store.current().is_none());
        assert!(store.token().is_none());

        let reloaded = SessionStore::open(dir.path().to_path_buf());
        assert!(reloaded.current().is_none());
        assert!(reloaded.token().is_none());
    }

    #[test]
    fn corrupt_state_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE), b"{not json").unwrap();
        let store = SessionStore::open(dir.path().to_path_buf());
        assert!(store.current().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn update_is_a_no_op_when_logged_out() {
        let mut store = SessionStore::in_memory();
        assert!(store.update(SessionPatch::balance_only(100)).is_none());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_replay_the_current_value_then_changes() {
        let mut store = SessionStore::in_memory();
        store.set_authenticated(sample_session(), "jwt".into());

        let mut rx = store.subscribe();
        assert_eq!(
            rx.borrow().as_ref().map(|s| s.balance),
            Some(1500),
            "subscription replays the current value"
        );

        store.update(SessionPatch::balance_only(900));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|s| s.balance), Some(900));
    }
}
