use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::device::DeviceId,
    mongodb::{serde_string_map, Id},
};

/// A vote as submitted by a device. The group may arrive through either
/// `participantIds` or the single-`participantId` shorthand.
///
/// `categoryId` and `deviceId` are deliberately loose here; their presence is
/// checked in the route so that a missing field is a 400, not a 422.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub category_id: Option<Id>,
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant_ids: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<Id>,
}

impl VoteRequest {
    /// The submitted group, whichever field carried it.
    pub fn group(&self) -> Vec<Id> {
        if self.participant_ids.is_empty() {
            self.participant_id.into_iter().collect()
        } else {
            self.participant_ids.clone()
        }
    }
}

/// Query parameters of the my-ballots lookup.
#[derive(Debug, FromForm)]
pub struct BallotsQuery {
    #[field(name = "deviceId")]
    pub device_id: DeviceId,
}

/// Confirmation body for an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub message: String,
}

impl VoteReceipt {
    pub fn new() -> Self {
        Self {
            message: "Vote recorded".to_string(),
        }
    }
}

impl Default for VoteReceipt {
    fn default() -> Self {
        Self::new()
    }
}

/// Map from category ID to the participant IDs a device has voted for,
/// exactly as stored on its ballots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VotedGroups {
    #[serde(with = "serde_string_map")]
    pub groups: HashMap<Id, Vec<ApiId>>,
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn group_prefers_the_array_form() {
        let single = Id::new();
        let pair = vec![Id::new(), Id::new()];

        let request = VoteRequest {
            participant_ids: pair.clone(),
            participant_id: Some(single),
            ..VoteRequest::default()
        };
        assert_eq!(request.group(), pair);

        let request = VoteRequest {
            participant_id: Some(single),
            ..VoteRequest::default()
        };
        assert_eq!(request.group(), vec![single]);

        assert_eq!(VoteRequest::default().group(), vec![]);
    }

    #[test]
    fn accepts_the_single_id_shorthand() {
        let id = Id::new();
        let json = format!(
            r#"{{"categoryId": "{}", "deviceId": "abc123", "participantId": "{}"}}"#,
            Id::new(),
            id
        );
        let request: VoteRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.group(), vec![id]);
    }

    #[test]
    fn voted_groups_serialise_with_string_keys() {
        let category = Id::new();
        let participant = Id::new();
        let mut groups = HashMap::new();
        groups.insert(category, vec![ApiId::from(participant)]);

        let json = serde_json::to_value(VotedGroups { groups }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ category.to_string(): [participant.to_string()] })
        );
    }
}
