use crate::{
    api::ProfileApi,
    ledger::BalanceLedger,
    model::UserSession,
    session::SessionStore,
};
use tracing::{
    debug,
    warn,
};

/// Reconcile the local session with the server's view of the profile.
///
/// Without a stored token this returns immediately; no request is made.
/// On success the fetched fields are merged over the current snapshot,
/// except that the server balance is ignored while a bet is in flight so
/// the refresh cannot stomp on the optimistic debit. An authorization
/// failure means the token is dead and the whole session is cleared; any
/// other failure leaves the last known snapshot untouched.
///
/// Returns the refreshed snapshot on success, or none on any failure.
/// Only an authorization failure clears the store; after a transient
/// failure `SessionStore::current` still serves the stale snapshot.
pub async fn refresh<P: ProfileApi>(
    api: &P,
    store: &mut SessionStore,
    ledger: &mut BalanceLedger,
) -> Option<UserSession> {
    let token = store.token()?;

    match api.refresh_profile().await {
        Ok(patch) => {
            let patch = if ledger.bet_in_flight() {
                debug!("bet in flight, refresh keeps the local balance");
                patch.without_balance()
            } else {
                patch
            };
            let merged = match store.update(patch.clone()) {
                Some(merged) => merged,
                None => {
                    // Token survived a restart without a snapshot; rebuild
                    // the session from the fetched profile.
                    let mut session = UserSession::default();
                    session.apply(patch);
                    store.set_authenticated(session.clone(), token);
                    session
                }
            };
            ledger.adopt_server_balance(merged.balance);
            Some(merged)
        }
        Err(e) if e.is_auth_failure() => {
            warn!("session rejected by server, logging out");
            store.clear();
            None
        }
        Err(e) => {
            warn!(error = %e, "profile refresh failed, keeping last known session");
            None
        }
    }
}
