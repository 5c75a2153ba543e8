use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

pub const AUDIENCE_DISPLAY_MODE: &str = "audienceDisplayMode";
pub const RELOAD: &str = "reload";
pub const ERROR: &str = "error";

/// The `{"type": ..., "data": ...}` frame every display websocket message is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Raw screen name; validation happens at the orchestrator boundary.
    AudienceDisplayMode(String),
    Reload,
    ServerError(String),
    Other { message_type: String, data: Value },
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::try_from(envelope)
    }

    pub fn message_type(&self) -> &str {
        match self {
            ServerMessage::AudienceDisplayMode(_) => AUDIENCE_DISPLAY_MODE,
            ServerMessage::Reload => RELOAD,
            ServerMessage::ServerError(_) => ERROR,
            ServerMessage::Other { message_type, .. } => message_type,
        }
    }
}

impl TryFrom<Envelope> for ServerMessage {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, ProtocolError> {
        match envelope.message_type.as_str() {
            AUDIENCE_DISPLAY_MODE => match envelope.data {
                Value::String(name) => Ok(ServerMessage::AudienceDisplayMode(name)),
                other => Err(ProtocolError::payload(
                    AUDIENCE_DISPLAY_MODE,
                    format!("expected a screen name string, got {other}"),
                )),
            },
            RELOAD => Ok(ServerMessage::Reload),
            ERROR => Ok(ServerMessage::ServerError(match envelope.data {
                Value::String(message) => message,
                other => other.to_string(),
            })),
            _ => Ok(ServerMessage::Other {
                message_type: envelope.message_type,
                data: envelope.data,
            }),
        }
    }
}

/// One entry of `/api/sponsor_slides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SponsorSlide {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub image: String,
    pub display_time_sec: u32,
}

impl SponsorSlide {
    pub fn is_image(&self) -> bool {
        !self.image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_audience_display_mode() {
        let message = ServerMessage::parse(r#"{"type":"audienceDisplayMode","data":"sponsor"}"#)
            .expect("parse");
        assert_eq!(message, ServerMessage::AudienceDisplayMode("sponsor".into()));
        assert_eq!(message.message_type(), AUDIENCE_DISPLAY_MODE);
    }

    #[test]
    fn keeps_unknown_screen_names_for_the_caller_to_reject() {
        let message = ServerMessage::parse(r#"{"type":"audienceDisplayMode","data":"halftime"}"#)
            .expect("parse");
        assert_eq!(message, ServerMessage::AudienceDisplayMode("halftime".into()));
    }

    #[test]
    fn rejects_non_string_display_mode_payload() {
        let err = ServerMessage::parse(r#"{"type":"audienceDisplayMode","data":3}"#)
            .expect_err("number payload");
        assert!(matches!(err, ProtocolError::Payload { .. }));
    }

    #[test]
    fn passes_through_unrelated_telemetry() {
        let message = ServerMessage::parse(r#"{"type":"matchTime","data":{"MatchTimeSec":12}}"#)
            .expect("parse");
        match message {
            ServerMessage::Other { message_type, data } => {
                assert_eq!(message_type, "matchTime");
                assert_eq!(data["MatchTimeSec"], 12);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn reload_needs_no_payload() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"reload"}"#).expect("parse"),
            ServerMessage::Reload
        );
    }

    #[test]
    fn rejects_garbage_envelopes() {
        assert!(matches!(
            ServerMessage::parse("not json"),
            Err(ProtocolError::Envelope(_))
        ));
    }

    #[test]
    fn sponsor_slide_uses_pascal_case_fields() {
        let slide: SponsorSlide = serde_json::from_str(
            r#"{"Id":4,"Subtitle":"Thanks to","Line1":"Acme","Line2":"","Image":"","DisplayTimeSec":10}"#,
        )
        .expect("slide");
        assert_eq!(slide.line1, "Acme");
        assert_eq!(slide.display_time_sec, 10);
        assert!(!slide.is_image());
    }
}
