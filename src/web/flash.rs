//! Transient flash notices, stored in the session until the next render

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppResult;

const FLASHES_KEY: &str = "_flashes";

/// Severity of a flash notice; rendered as a CSS class suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        };
        write!(f, "{}", s)
    }
}

/// A single flash notice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { level: Level::Danger, message: message.into() }
    }
}

/// Queue a notice for display on the next rendered page
pub async fn flash(session: &Session, message: FlashMessage) -> AppResult<()> {
    let mut pending: Vec<FlashMessage> = session
        .get(FLASHES_KEY)
        .await?
        .unwrap_or_default();
    pending.push(message);
    session.insert(FLASHES_KEY, pending).await?;
    Ok(())
}

/// Drain all pending notices; each notice is shown exactly once
pub async fn take_flashes(session: &Session) -> AppResult<Vec<FlashMessage>> {
    Ok(session
        .remove::<Vec<FlashMessage>>(FLASHES_KEY)
        .await?
        .unwrap_or_default())
}
