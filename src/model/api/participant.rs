use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::participant::{NewParticipant, Participant},
};

/// A new participant, as submitted by an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSpec {
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<ParticipantSpec> for NewParticipant {
    fn from(spec: ParticipantSpec) -> Self {
        NewParticipant::new(
            spec.name.trim().to_string(),
            normalise(spec.nickname),
            spec.is_active,
        )
    }
}

/// A partial participant update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantUpdate {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub is_active: Option<bool>,
}

/// A participant as returned by the public roster search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub id: ApiId,
    pub name: String,
    pub nickname: Option<String>,
}

impl From<Participant> for ParticipantSummary {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id.into(),
            name: participant.participant.name,
            nickname: participant.participant.nickname,
        }
    }
}

/// A participant as listed to admins, including the active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDescription {
    pub id: ApiId,
    pub name: String,
    pub nickname: Option<String>,
    pub is_active: bool,
}

impl From<Participant> for ParticipantDescription {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id.into(),
            name: participant.participant.name,
            nickname: participant.participant.nickname,
            is_active: participant.participant.is_active,
        }
    }
}

/// A bulk import of participants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticipantImportRequest {
    pub participants: Vec<ParticipantImportEntry>,
}

/// One entry of a participant import: either a structured object or a
/// `"Name|Nickname"` line pasted from a spreadsheet export.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParticipantImportEntry {
    Text(String),
    Entry {
        name: String,
        #[serde(default)]
        nickname: Option<String>,
    },
}

impl ParticipantImportEntry {
    /// Split the entry into a trimmed name and optional nickname.
    pub fn into_parts(self) -> (String, Option<String>) {
        match self {
            Self::Text(line) => match line.split_once('|') {
                Some((name, nickname)) => (
                    name.trim().to_string(),
                    normalise(Some(nickname.to_string())),
                ),
                None => (line.trim().to_string(), None),
            },
            Self::Entry { name, nickname } => (name.trim().to_string(), normalise(nickname)),
        }
    }
}

/// Trim an optional field, mapping whitespace-only values to `None`.
fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_entries_on_pipe() {
        let entry = ParticipantImportEntry::Text("José Maria | Zé".to_string());
        assert_eq!(
            entry.into_parts(),
            ("José Maria".to_string(), Some("Zé".to_string()))
        );

        let entry = ParticipantImportEntry::Text("Bruno Lima".to_string());
        assert_eq!(entry.into_parts(), ("Bruno Lima".to_string(), None));

        let entry = ParticipantImportEntry::Text("Carla Dias|".to_string());
        assert_eq!(entry.into_parts(), ("Carla Dias".to_string(), None));
    }

    #[test]
    fn structured_entries_pass_through() {
        let entry = ParticipantImportEntry::Entry {
            name: " Ana Souza ".to_string(),
            nickname: Some("  ".to_string()),
        };
        assert_eq!(entry.into_parts(), ("Ana Souza".to_string(), None));
    }
}
