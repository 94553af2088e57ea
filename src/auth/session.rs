//! Session guard
//!
//! Owns the bearer-token lifecycle for the client: validity checks, a
//! single-flight refresh, and the authenticated-request wrapper that retries
//! exactly once after a forced refresh.
//!
//! ## Refresh coordination
//! The guard is either `Idle` or `Refreshing`. The first caller that needs a
//! new token while `Idle` becomes the refresher and issues the one remote
//! call; every caller arriving while `Refreshing` is queued and receives the
//! refresher's outcome, token or failure, in the order it enrolled. The
//! `in_flight` check and the enrollment happen under the same lock, and the
//! lock is never held across an `.await`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::jwt::{is_token_valid_at, Token, DEFAULT_EXPIRY_MARGIN_SECS};
use crate::auth::models::TokenResponse;
use crate::auth::store::TokenStore;
use crate::client::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{Result, SessionError};

pub const REFRESH_PATH: &str = "/refresh_token";

const EVENT_CAPACITY: usize = 16;
const MIN_CHECK_PERIOD: std::time::Duration = std::time::Duration::from_millis(1);

/// Lifecycle notifications for whatever renders the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut,
}

type Waiter = oneshot::Sender<Result<Token>>;

/// `waiters` is only non-empty while `in_flight` is set.
#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

enum Enrollment {
    Refresher,
    Waiter(oneshot::Receiver<Result<Token>>),
}

pub struct SessionGuard {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    refresh: Mutex<RefreshState>,
    events: broadcast::Sender<SessionEvent>,
    expiry_margin: Duration,
}

impl SessionGuard {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            store,
            refresh: Mutex::new(RefreshState::default()),
            events,
            expiry_margin: Duration::seconds(DEFAULT_EXPIRY_MARGIN_SECS),
        }
    }

    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn current_token(&self) -> Option<Token> {
        self.store.get()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.lock().in_flight
    }

    /// Callers currently queued behind the in-flight refresh.
    pub fn pending_waiters(&self) -> usize {
        self.refresh.lock().waiters.len()
    }

    /// Fails closed: undecodable tokens are invalid.
    pub fn is_token_valid(&self, token: &Token) -> bool {
        is_token_valid_at(token, Utc::now(), self.expiry_margin)
    }

    /// Store a freshly issued token after a successful login.
    pub fn set_token(&self, token: Token) {
        self.store.set(token);
        info!("Session started");
        let _ = self.events.send(SessionEvent::LoggedIn);
    }

    /// Drop the stored token and announce the end of the session.
    ///
    /// Callers waiting on an in-flight refresh still receive its outcome.
    pub fn logout(&self) {
        self.store.remove();
        info!("Session terminated");
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    /// The stored token, refreshed first if it is expired or about to expire.
    pub async fn get_valid_token(&self) -> Result<Token> {
        let token = self.store.get().ok_or(SessionError::NoToken)?;
        if self.is_token_valid(&token) {
            return Ok(token);
        }

        debug!("Stored token expired or expiring soon, refreshing");
        self.refresh().await.map_err(|e| match e {
            SessionError::Auth(_) => e,
            other => SessionError::Auth(other.to_string()),
        })
    }

    /// Obtain a new token, sharing one remote call among concurrent callers.
    pub async fn refresh(&self) -> Result<Token> {
        let enrollment = {
            let mut state = self.refresh.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Enrollment::Waiter(rx)
            } else {
                state.in_flight = true;
                Enrollment::Refresher
            }
        };

        match enrollment {
            Enrollment::Waiter(rx) => {
                debug!("Token refresh already in flight, waiting for its outcome");
                rx.await.unwrap_or_else(|_| Err(abandoned()))
            }
            Enrollment::Refresher => {
                let flight = RefreshFlight {
                    guard: self,
                    settled: false,
                };
                let outcome = self.request_new_token().await;
                flight.settle(outcome)
            }
        }
    }

    async fn request_new_token(&self) -> Result<Token> {
        let current = self.store.get().ok_or(SessionError::NoToken)?;
        let request = ApiRequest::post(REFRESH_PATH).with_bearer(current);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| SessionError::Auth(format!("token refresh failed: {e}")))?;

        if !response.is_success() {
            return Err(SessionError::Auth(format!(
                "token refresh failed with status {}",
                response.status
            )));
        }

        response
            .json::<TokenResponse>()
            .ok()
            .and_then(|body| body.token)
            .ok_or_else(|| SessionError::Auth("token refresh response carried no token".into()))
    }

    /// Store the outcome, hand it to every waiter and return to `Idle`.
    fn settle_refresh(&self, outcome: Result<Token>) -> Result<Token> {
        let waiters = {
            let mut state = self.refresh.lock();
            if let Ok(token) = &outcome {
                self.store.set(token.clone());
            }
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        match &outcome {
            Ok(_) => {
                info!(waiters = waiters.len(), "Token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
            }
            Err(e) => warn!(waiters = waiters.len(), "Token refresh failed: {}", e),
        }

        for waiter in waiters {
            // a waiter whose task went away has nobody left to tell
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    /// Send `request` with the current bearer token.
    ///
    /// An unauthorized response triggers one forced refresh and one retry; a
    /// second unauthorized response is returned as an `Auth` failure.
    pub async fn authenticated_request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let token = self.get_valid_token().await?;
        let response = self
            .transport
            .send(request.clone().with_bearer(token))
            .await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        warn!(path = %request.path, "Request unauthorized, forcing a token refresh");
        let token = self.refresh().await?;
        let method = request.method.clone();
        let path = request.path.clone();
        let retry = self.transport.send(request.with_bearer(token)).await?;
        if retry.is_unauthorized() {
            return Err(SessionError::Auth(format!(
                "{method} {path} still unauthorized after token refresh"
            )));
        }
        Ok(retry)
    }

    /// Refresh a stored token that is no longer valid; log out if that fails.
    pub async fn check_token(&self) {
        let Some(token) = self.store.get() else {
            return;
        };
        if self.is_token_valid(&token) {
            return;
        }
        if let Err(e) = self.refresh().await {
            warn!("Periodic token refresh failed: {}", e);
            self.logout();
        }
    }

    /// Run [`check_token`](Self::check_token) every `period` in the background.
    ///
    /// Periods under one millisecond are raised to one millisecond.
    pub fn spawn_token_check(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let period = period.max(MIN_CHECK_PERIOD);
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                guard.check_token().await;
            }
        })
    }
}

fn abandoned() -> SessionError {
    SessionError::Auth("token refresh abandoned".into())
}

/// Settles the refresh even if the refresher's future is dropped mid-call.
struct RefreshFlight<'a> {
    guard: &'a SessionGuard,
    settled: bool,
}

impl RefreshFlight<'_> {
    fn settle(mut self, outcome: Result<Token>) -> Result<Token> {
        self.settled = true;
        self.guard.settle_refresh(outcome)
    }
}

impl Drop for RefreshFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.guard.settle_refresh(Err(abandoned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::testing::token_expiring_in;
    use crate::auth::store::MemoryTokenStore;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// In-memory API: `/refresh_token` hands out `fresh` (or fails when it is
    /// `None`, or errors out with `refresh_error`); every other path answers
    /// with the next queued status, 200 once the queue is empty.
    #[derive(Default)]
    struct ScriptedTransport {
        fresh: Mutex<Option<Token>>,
        statuses: Mutex<VecDeque<StatusCode>>,
        refresh_gate: Option<Arc<Semaphore>>,
        refresh_delay: Option<std::time::Duration>,
        refresh_error: Option<SessionError>,
        refresh_calls: AtomicUsize,
        log: Mutex<Vec<(String, Option<Token>)>>,
    }

    impl ScriptedTransport {
        fn issuing(token: Token) -> Self {
            Self {
                fresh: Mutex::new(Some(token)),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn unreachable(error: SessionError) -> Self {
            Self {
                refresh_error: Some(error),
                ..Default::default()
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.refresh_gate = Some(gate);
            self
        }

        fn delayed(mut self, delay: std::time::Duration) -> Self {
            self.refresh_delay = Some(delay);
            self
        }

        fn queue_statuses(&self, statuses: &[StatusCode]) {
            self.statuses.lock().extend(statuses.iter().copied());
        }

        fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        fn requests_to(&self, path: &str) -> Vec<Option<Token>> {
            self.log
                .lock()
                .iter()
                .filter(|(p, _)| p == path)
                .map(|(_, bearer)| bearer.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.log
                .lock()
                .push((request.path.clone(), request.bearer.clone()));

            if request.path == REFRESH_PATH {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.refresh_gate {
                    gate.acquire().await.unwrap().forget();
                }
                if let Some(delay) = self.refresh_delay {
                    tokio::time::sleep(delay).await;
                }
                if let Some(error) = &self.refresh_error {
                    return Err(error.clone());
                }
                let fresh = self.fresh.lock().clone();
                return Ok(match fresh {
                    Some(token) => ApiResponse::new(
                        StatusCode::OK,
                        serde_json::json!({ "token": token }).to_string(),
                    ),
                    None => ApiResponse::new(StatusCode::UNAUTHORIZED, r#"{"message": "expired"}"#),
                });
            }

            let status = self.statuses.lock().pop_front().unwrap_or(StatusCode::OK);
            Ok(ApiResponse::new(status, r#"{"ok": true}"#))
        }
    }

    fn guard_with(transport: Arc<ScriptedTransport>, stored: Option<Token>) -> Arc<SessionGuard> {
        let store = match stored {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        Arc::new(SessionGuard::new(transport, Arc::new(store)))
    }

    async fn wait_for_waiters(guard: &SessionGuard, count: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while guard.pending_waiters() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("waiters never enrolled");
    }

    #[tokio::test]
    async fn test_get_valid_token_without_token() {
        let transport = Arc::new(ScriptedTransport::failing());
        let guard = guard_with(transport.clone(), None);

        assert_eq!(guard.get_valid_token().await, Err(SessionError::NoToken));
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_valid_token_keeps_valid_token() {
        let token = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::failing());
        let guard = guard_with(transport.clone(), Some(token.clone()));

        assert_eq!(guard.get_valid_token().await.unwrap(), token);
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_valid_token_refreshes_expiring_token() {
        let stale = token_expiring_in(4 * 60, "dreamer");
        let fresh = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()));
        let guard = guard_with(transport.clone(), Some(stale.clone()));

        assert_eq!(guard.get_valid_token().await.unwrap(), fresh);
        assert_eq!(guard.current_token(), Some(fresh));
        // the refresh call authenticates with the stale token
        assert_eq!(transport.requests_to(REFRESH_PATH), vec![Some(stale)]);
    }

    #[tokio::test]
    async fn test_get_valid_token_reports_refresh_failure_as_auth() {
        let stale = token_expiring_in(-10, "dreamer");
        let transport = Arc::new(ScriptedTransport::failing());
        let guard = guard_with(transport.clone(), Some(stale.clone()));

        let err = guard.get_valid_token().await.unwrap_err();
        assert!(err.is_auth(), "{err:?}");
        // a failed refresh leaves the stored token alone
        assert_eq!(guard.current_token(), Some(stale));
        assert!(!guard.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_call() {
        let fresh = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(
            ScriptedTransport::issuing(fresh.clone()).delayed(std::time::Duration::from_millis(20)),
        );
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "dreamer")));

        let outcomes = futures::future::join_all((0..8).map(|_| guard.refresh())).await;

        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|o| o.as_ref() == Ok(&fresh)));
        assert!(!guard.is_refreshing());
        assert_eq!(guard.pending_waiters(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_across_threads() {
        let gate = Arc::new(Semaphore::new(0));
        let fresh = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()).gated(gate.clone()));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "dreamer")));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.refresh().await })
            })
            .collect();

        wait_for_waiters(&guard, 7).await;
        assert!(guard.is_refreshing());
        gate.add_permits(1);

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(fresh.clone()));
        }
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(guard.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_reaches_every_waiter() {
        let transport = Arc::new(
            ScriptedTransport::failing().delayed(std::time::Duration::from_millis(10)),
        );
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "dreamer")));

        let outcomes = futures::future::join_all((0..5).map(|_| guard.refresh())).await;

        assert_eq!(transport.refresh_calls(), 1);
        let first = outcomes[0].clone().unwrap_err();
        assert!(first.is_auth());
        assert!(outcomes.iter().all(|o| o.as_ref().unwrap_err() == &first));
    }

    #[tokio::test]
    async fn test_refresh_transport_error_reaches_every_waiter() {
        let stale = token_expiring_in(-10, "dreamer");
        let transport = Arc::new(
            ScriptedTransport::unreachable(SessionError::Transport("timed out".into()))
                .delayed(std::time::Duration::from_millis(10)),
        );
        let guard = guard_with(transport.clone(), Some(stale.clone()));

        let outcomes = futures::future::join_all((0..6).map(|_| guard.refresh())).await;

        assert_eq!(transport.refresh_calls(), 1);
        let expected = Err(SessionError::Auth(
            "token refresh failed: transport error: timed out".into(),
        ));
        assert!(outcomes.iter().all(|o| o == &expected), "{outcomes:?}");
        assert!(!guard.is_refreshing());
        assert_eq!(guard.pending_waiters(), 0);
        assert_eq!(guard.current_token(), Some(stale));
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_call_remote() {
        let transport = Arc::new(ScriptedTransport::issuing(token_expiring_in(3600, "a")));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "a")));

        guard.refresh().await.unwrap();
        guard.refresh().await.unwrap();
        assert_eq!(transport.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn test_dropped_refresher_releases_waiters() {
        let gate = Arc::new(Semaphore::new(0));
        let fresh = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()).gated(gate.clone()));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "dreamer")));

        let mut refresher = Box::pin(guard.refresh());
        assert!(futures::poll!(&mut refresher).is_pending());
        assert!(guard.is_refreshing());

        let waiter = tokio::spawn({
            let guard = Arc::clone(&guard);
            async move { guard.refresh().await }
        });
        wait_for_waiters(&guard, 1).await;

        drop(refresher);
        let outcome = waiter.await.unwrap();
        assert_eq!(outcome, Err(abandoned()));
        assert!(!guard.is_refreshing());

        // the guard is usable again
        gate.add_permits(1);
        assert_eq!(guard.refresh().await, Ok(fresh));
        assert_eq!(transport.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn test_logout_does_not_cancel_waiters() {
        let gate = Arc::new(Semaphore::new(0));
        let fresh = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()).gated(gate.clone()));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(-10, "dreamer")));

        let refresher = tokio::spawn({
            let guard = Arc::clone(&guard);
            async move { guard.refresh().await }
        });
        let waiter = tokio::spawn({
            let guard = Arc::clone(&guard);
            async move {
                while !guard.is_refreshing() {
                    tokio::task::yield_now().await;
                }
                guard.refresh().await
            }
        });
        wait_for_waiters(&guard, 1).await;

        guard.logout();
        assert!(guard.current_token().is_none());
        assert_eq!(guard.pending_waiters(), 1);

        gate.add_permits(1);
        assert_eq!(refresher.await.unwrap(), Ok(fresh.clone()));
        assert_eq!(waiter.await.unwrap(), Ok(fresh));
    }

    #[tokio::test]
    async fn test_authenticated_request_sets_bearer() {
        let token = token_expiring_in(3600, "dreamer");
        let transport = Arc::new(ScriptedTransport::failing());
        let guard = guard_with(transport.clone(), Some(token.clone()));

        let response = guard
            .authenticated_request(ApiRequest::get("/get_dreams"))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(transport.requests_to("/get_dreams"), vec![Some(token)]);
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_authenticated_request_retries_once_after_unauthorized() {
        let old = token_expiring_in(3600, "old");
        let new = token_expiring_in(7200, "new");
        let transport = Arc::new(ScriptedTransport::issuing(new.clone()));
        transport.queue_statuses(&[StatusCode::UNAUTHORIZED]);
        let guard = guard_with(transport.clone(), Some(old.clone()));

        let response = guard
            .authenticated_request(ApiRequest::get("/get_dreams"))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(transport.requests_to("/get_dreams"), vec![Some(old), Some(new)]);
    }

    #[tokio::test]
    async fn test_authenticated_request_gives_up_after_second_unauthorized() {
        let transport = Arc::new(ScriptedTransport::issuing(token_expiring_in(7200, "new")));
        transport.queue_statuses(&[StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED]);
        let guard = guard_with(transport.clone(), Some(token_expiring_in(3600, "old")));

        let err = guard
            .authenticated_request(ApiRequest::get("/get_dreams"))
            .await
            .unwrap_err();

        assert!(err.is_auth(), "{err:?}");
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(transport.requests_to("/get_dreams").len(), 2);
    }

    #[tokio::test]
    async fn test_authenticated_request_passes_other_errors_through() {
        let transport = Arc::new(ScriptedTransport::failing());
        transport.queue_statuses(&[StatusCode::INTERNAL_SERVER_ERROR]);
        let guard = guard_with(transport.clone(), Some(token_expiring_in(3600, "a")));

        let response = guard
            .authenticated_request(ApiRequest::get("/get_dreams"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_session_events() {
        let transport = Arc::new(ScriptedTransport::issuing(token_expiring_in(3600, "a")));
        let guard = guard_with(transport, None);
        let mut events = guard.subscribe();

        guard.set_token(token_expiring_in(-10, "a"));
        guard.refresh().await.unwrap();
        guard.logout();

        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    }

    #[tokio::test]
    async fn test_check_token_logs_out_when_refresh_fails() {
        let transport = Arc::new(ScriptedTransport::failing());
        let guard = guard_with(transport.clone(), Some(token_expiring_in(60, "a")));

        guard.check_token().await;

        assert_eq!(transport.refresh_calls(), 1);
        assert!(guard.current_token().is_none());
    }

    #[tokio::test]
    async fn test_periodic_check_replaces_expiring_token() {
        let fresh = token_expiring_in(3600, "a");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(60, "a")));

        let handle = guard.spawn_token_check(std::time::Duration::from_millis(10));
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while guard.current_token() != Some(fresh.clone()) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("token was never refreshed");
        handle.abort();

        // once valid, later ticks leave it alone
        assert_eq!(transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_check_period_still_runs() {
        let fresh = token_expiring_in(3600, "a");
        let transport = Arc::new(ScriptedTransport::issuing(fresh.clone()));
        let guard = guard_with(transport.clone(), Some(token_expiring_in(60, "a")));

        let handle = guard.spawn_token_check(std::time::Duration::ZERO);
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while guard.current_token() != Some(fresh.clone()) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("token was never refreshed");

        assert!(!handle.is_finished());
        handle.abort();
    }
}
