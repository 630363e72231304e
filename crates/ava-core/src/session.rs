//! Session gate: decides once, at startup, whether the chat widget is shown.

use crate::api::{ApiError, SessionApi};
use crate::message::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// The session request is still in flight
    Checking,
    SignedIn(User),
    /// No user, or the check failed. Nothing is rendered.
    SignedOut,
}

#[derive(Debug)]
pub struct SessionGate {
    state: GateState,
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Checking,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            GateState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Apply the result of the session check.
    ///
    /// Only the first resolution counts; the gate never re-checks. Returns
    /// the user when this call signed someone in.
    pub fn resolve(&mut self, result: Result<Option<User>, ApiError>) -> Option<&User> {
        if self.state != GateState::Checking {
            log::debug!("[session] ignoring late session result");
            return None;
        }

        self.state = match result {
            Ok(Some(user)) => {
                log::info!("[session] signed in as {} <{}>", user.name, user.email);
                GateState::SignedIn(user)
            }
            Ok(None) => {
                log::info!("[session] no active session");
                GateState::SignedOut
            }
            Err(err) => {
                log::error!("[session] error fetching session: {}", err);
                GateState::SignedOut
            }
        };
        self.user()
    }

    pub fn sign_out(&mut self) {
        self.state = GateState::SignedOut;
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the single session check against `api`
pub async fn check_session(api: &dyn SessionApi) -> Result<Option<User>, ApiError> {
    api.current_user().await
}
