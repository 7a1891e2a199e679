use crate::scratch::{DeviceRect, Point};
use crate::snapshot::GameSnapshot;
use crate::types::PayoutAccount;
use serde::{Deserialize, Serialize};

// Message shapes for a front end driving the game over JSON. These stay simple to keep the
// serde boundary stable.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ClientCommand {
    GetSnapshot,
    Start { name: String, role: String },
    Answer { index: usize },
    PointerDown { rect: DeviceRect, point: Point },
    PointerMove { rect: DeviceRect, point: Point },
    PointerUp,
    SavePayoutAccount(PayoutAccount),
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ServerReply {
    Snapshot(GameSnapshot),
    Error(String),
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Envelope<T> {
    pub id: Option<String>,
    #[serde(flatten)]
    pub message: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_tagged_json() {
        let raw = r#"{"id":"7","type":"Start","data":{"name":"An","role":"Dev"}}"#;
        let envelope: Envelope<ClientCommand> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.id.as_deref(), Some("7"));
        assert_eq!(
            envelope.message,
            ClientCommand::Start {
                name: "An".into(),
                role: "Dev".into()
            }
        );
        let up: Envelope<ClientCommand> = serde_json::from_str(r#"{"id":null,"type":"PointerUp"}"#).unwrap();
        assert_eq!(up.message, ClientCommand::PointerUp);
    }
}
