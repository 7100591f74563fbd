use foundation::math::{Coordinates, round_to};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{TransportError, ValidationError};

pub const SUCCESS_MESSAGE: &str = "Submitted!";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Image,
    Song,
}

impl ContentKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(ContentKind::Text),
            "image" => Some(ContentKind::Image),
            "song" => Some(ContentKind::Song),
            _ => None,
        }
    }
}

/// JSON body posted to the content endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl ContentPayload {
    /// Fill in coordinates rounded to six decimals.
    pub fn with_coordinates(mut self, coords: Option<Coordinates>) -> Self {
        if let Some(c) = coords {
            self.lat = Some(round_to(c.lat_deg, 6));
            self.lng = Some(round_to(c.lng_deg, 6));
        }
        self
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encode {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Editing,
    Submitting,
    Succeeded,
    Failed { message: String },
}

/// Why `begin` refused to start a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRefused {
    Invalid(ValidationError),
    /// One is already in flight (or its success is still on display).
    Busy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmitTicket(u64);

#[derive(Debug, Clone)]
pub struct SubmissionMachine {
    state: SubmissionState,
    inline_error: Option<ValidationError>,
    in_flight: Option<SubmitTicket>,
    next_ticket: u64,
}

impl Default for SubmissionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionMachine {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Editing,
            inline_error: None,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Validation error shown next to the message field.
    pub fn inline_error(&self) -> Option<ValidationError> {
        self.inline_error
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Editing | SubmissionState::Failed { .. }
        )
    }

    pub fn status_text(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Editing => None,
            SubmissionState::Submitting => Some("Submitting..."),
            SubmissionState::Succeeded => Some(SUCCESS_MESSAGE),
            SubmissionState::Failed { message } => Some(message),
        }
    }

    /// Validate `message` and enter `Submitting`.
    pub fn begin(&mut self, message: &str) -> Result<SubmitTicket, SubmitRefused> {
        if !self.can_submit() {
            debug!(state = ?self.state, "submit ignored while busy");
            return Err(SubmitRefused::Busy);
        }
        if message.trim().is_empty() {
            self.inline_error = Some(ValidationError::EmptyMessage);
            self.state = SubmissionState::Editing;
            return Err(SubmitRefused::Invalid(ValidationError::EmptyMessage));
        }
        let ticket = SubmitTicket(self.next_ticket);
        self.next_ticket += 1;
        self.inline_error = None;
        self.in_flight = Some(ticket);
        self.state = SubmissionState::Submitting;
        info!(ticket = ticket.0, "submitting content");
        Ok(ticket)
    }

    /// Record the network outcome. Returns `false` for a stale ticket.
    pub fn finish(&mut self, ticket: SubmitTicket, outcome: Result<(), TransportError>) -> bool {
        if self.in_flight != Some(ticket) || self.state != SubmissionState::Submitting {
            debug!(ticket = ticket.0, "discarding stale submission result");
            return false;
        }
        self.state = match outcome {
            Ok(()) => {
                info!(ticket = ticket.0, "content submitted");
                SubmissionState::Succeeded
            }
            Err(err) => {
                self.in_flight = None;
                warn!(ticket = ticket.0, error = ?err, "submission failed");
                SubmissionState::Failed {
                    message: err.to_string(),
                }
            }
        };
        true
    }

    /// The success display delay elapsed. Returns `true` when the caller
    /// should clear the form fields.
    pub fn success_shown(&mut self, ticket: SubmitTicket) -> bool {
        if self.in_flight != Some(ticket) || self.state != SubmissionState::Succeeded {
            return false;
        }
        self.in_flight = None;
        self.state = SubmissionState::Editing;
        debug!(ticket = ticket.0, "form reset after success");
        true
    }

    /// Any field edit. Leaves `Failed` and drops a stale inline error.
    pub fn edited(&mut self) {
        if matches!(self.state, SubmissionState::Failed { .. }) {
            self.state = SubmissionState::Editing;
        }
        self.inline_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ContentKind, ContentPayload, SubmissionMachine, SubmissionState, SubmitRefused,
    };
    use crate::error::{TransportError, ValidationError};
    use foundation::math::Coordinates;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_messages_never_submit() {
        let mut m = SubmissionMachine::new();
        for msg in ["", "   ", "\n\t "] {
            assert_eq!(
                m.begin(msg),
                Err(SubmitRefused::Invalid(ValidationError::EmptyMessage))
            );
            assert_eq!(m.state(), &SubmissionState::Editing);
        }
        assert_eq!(m.inline_error(), Some(ValidationError::EmptyMessage));
        m.edited();
        assert_eq!(m.inline_error(), None);
    }

    #[test]
    fn success_path_returns_to_editing() {
        let mut m = SubmissionMachine::new();
        let t = m.begin("hello").unwrap();
        assert_eq!(m.state(), &SubmissionState::Submitting);
        assert_eq!(m.begin("hello"), Err(SubmitRefused::Busy));
        assert!(m.finish(t, Ok(())));
        assert_eq!(m.status_text(), Some("Submitted!"));
        assert_eq!(m.begin("again"), Err(SubmitRefused::Busy));
        assert!(m.success_shown(t));
        assert_eq!(m.state(), &SubmissionState::Editing);
        assert!(!m.success_shown(t));
    }

    #[test]
    fn failure_then_edit_returns_to_editing() {
        let mut m = SubmissionMachine::new();
        let t = m.begin("hello").unwrap();
        m.finish(t, Err(TransportError::Status { status: 500 }));
        assert_eq!(
            m.state(),
            &SubmissionState::Failed {
                message: "Failed to submit".to_string()
            }
        );
        assert!(!m.finish(t, Ok(())));
        m.edited();
        assert_eq!(m.state(), &SubmissionState::Editing);
    }

    #[test]
    fn retry_is_allowed_straight_from_failed() {
        let mut m = SubmissionMachine::new();
        let t = m.begin("hello").unwrap();
        m.finish(
            t,
            Err(TransportError::Network {
                reason: "offline".to_string(),
            }),
        );
        let retry = m.begin("hello").unwrap();
        assert_ne!(retry, t);
        assert!(!m.finish(t, Ok(())));
        assert!(m.finish(retry, Ok(())));
    }

    #[test]
    fn payload_omits_empty_optionals_and_rounds_coordinates() {
        let bare = ContentPayload {
            kind: ContentKind::Text,
            content: "hi".to_string(),
            description: None,
            lat: None,
            lng: None,
            link: None,
            media: None,
        };
        assert_eq!(bare.to_json().unwrap(), r#"{"type":"text","content":"hi"}"#);

        let located = ContentPayload {
            kind: ContentKind::Song,
            ..bare
        }
        .with_coordinates(Some(Coordinates::new(48.208_176_54, 16.373_819_11)));
        let value: serde_json::Value = serde_json::from_str(&located.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "song");
        assert_eq!(value["lat"], 48.208177);
        assert_eq!(value["lng"], 16.373819);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(ContentKind::parse("Image"), Some(ContentKind::Image));
        assert_eq!(ContentKind::parse("poem"), None);
    }
}
