//! Observation payload and the observer capability.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::screen::ScreenState;

/// Sent to observers after every confirmed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Actor the screen belongs to
    pub nickname: String,
    /// Screen the verifier just confirmed
    pub screen: ScreenState,
    /// Final target of the running navigation
    pub target: ScreenState,
    /// Suggested file name for a capture of this screen
    pub capture_file: String,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(nickname: impl Into<String>, screen: ScreenState, target: ScreenState) -> Self {
        Self {
            nickname: nickname.into(),
            capture_file: format!("{}.png", screen),
            screen,
            target,
            observed_at: Utc::now(),
        }
    }
}

/// Receives confirmed screens. Failures are logged by the caller and never
/// interrupt navigation.
#[async_trait]
pub trait ScreenObserver: Send + Sync {
    async fn observe(&self, observation: &Observation) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_file_follows_screen() {
        let obs = Observation::new("a1", "mail_wars".into(), "mail_wars".into());
        assert_eq!(obs.capture_file, "mail_wars.png");

        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["screen"], "mail_wars");
        assert_eq!(json["nickname"], "a1");
    }
}
