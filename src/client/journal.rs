//! Dream journal client
//!
//! The application shell: logs in, submits dreams, loads the history and
//! turns it into insights. Every authenticated call goes through the
//! [`SessionGuard`]; an authentication failure that reaches this layer ends
//! the session.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::analysis::{analyze_dream, build_report, DreamEntry, InsightsReport};
use crate::auth::models::{validate_password, Credentials, TokenResponse};
use crate::auth::SessionGuard;
use crate::client::models::{AddDreamRequest, AddDreamResponse, DreamsResponse};
use crate::client::transport::ApiRequest;
use crate::error::{Result, SessionError};

pub struct DreamJournal {
    guard: Arc<SessionGuard>,
}

impl DreamJournal {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        Self { guard }
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let request = ApiRequest::post("/login")
            .with_json(serde_json::to_value(Credentials::new(username, password))?);
        let response = self.guard.transport().send(request).await?;

        // the server answers failed logins with a message and no token
        let body: TokenResponse = response.json().unwrap_or_default();
        match body.token {
            Some(token) => {
                info!(username, "Logged in");
                self.guard.set_token(token);
                Ok(())
            }
            None => {
                let message = body.message.unwrap_or_else(|| "Unknown error".to_string());
                warn!(username, "Login rejected: {}", message);
                // a rejected login must not leave an earlier session behind
                self.teardown_on_auth(Err(SessionError::Auth(format!("login failed: {message}"))))
            }
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        validate_password(password)?;

        let request = ApiRequest::post("/register")
            .with_json(serde_json::to_value(Credentials::new(username, password))?);
        let response = self.guard.transport().send(request).await?;

        if !response.is_success() {
            let message = response
                .message()
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(SessionError::Transport(format!(
                "registration failed ({}): {message}",
                response.status
            )));
        }
        info!(username, "Registered");
        Ok(())
    }

    /// Analyze and store a dream; returns the id assigned by the server.
    pub async fn add_dream(&self, text: &str) -> Result<i64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput(
                "dream text must not be empty".to_string(),
            ));
        }

        let analysis = analyze_dream(text);
        debug!(
            score = analysis.sentiment.score,
            themes = analysis.themes.len(),
            "Submitting dream"
        );
        let body = AddDreamRequest {
            dream_text: text,
            mood_score: analysis.sentiment.score,
            analysis: &analysis,
        };
        let request = ApiRequest::post("/add_dream").with_json(serde_json::to_value(&body)?);

        let response = self.teardown_on_auth(self.guard.authenticated_request(request).await)?;
        if !response.is_success() {
            return Err(SessionError::Transport(format!(
                "saving dream failed with status {}",
                response.status
            )));
        }

        let saved: AddDreamResponse = response.json()?;
        let dream_id = saved
            .dream_id
            .ok_or_else(|| SessionError::Format("no dream_id in response".to_string()))?;
        info!(dream_id, "Dream saved");
        Ok(dream_id)
    }

    pub async fn get_dreams(&self) -> Result<Vec<DreamEntry>> {
        let request = ApiRequest::get("/get_dreams");
        let response = self.teardown_on_auth(self.guard.authenticated_request(request).await)?;
        if !response.is_success() {
            return Err(SessionError::Transport(format!(
                "failed to fetch dreams: {}",
                response.status
            )));
        }

        let body: DreamsResponse = response.json()?;
        debug!(count = body.dreams.len(), "Loaded dreams");
        Ok(body.dreams)
    }

    pub async fn load_insights(&self) -> Result<InsightsReport> {
        let dreams = self.get_dreams().await?;
        Ok(build_report(&dreams))
    }

    /// Load the history and the insights concurrently.
    pub async fn load_dashboard(&self) -> Result<(Vec<DreamEntry>, InsightsReport)> {
        futures::try_join!(self.get_dreams(), self.load_insights())
    }

    pub fn logout(&self) {
        self.guard.logout();
    }

    fn teardown_on_auth<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth() {
                warn!("Authentication lost, ending session: {}", e);
                self.guard.logout();
            }
        }
        result
    }
}

/// Analyze a dream without talking to the server.
pub fn preview_analysis(text: &str) -> serde_json::Value {
    let analysis = analyze_dream(text);
    json!({
        "dream_text": text.trim(),
        "mood_score": analysis.sentiment.score,
        "analysis": analysis,
    })
}
