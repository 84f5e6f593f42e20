use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::device::DeviceId;
use crate::model::mongodb::Id;

/// Core ballot data: the record of one device's vote(s) in one category.
///
/// There is at most one ballot per (category, device), enforced by a unique
/// index. For multi-winner categories, later groups are appended onto
/// `participant_ids`, so the array is the device's full voting history in
/// that category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCore {
    pub category_id: Id,
    pub device_id: DeviceId,
    pub participant_ids: Vec<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl BallotCore {
    /// Create a ballot holding the canonical form of the given group.
    pub fn new(category_id: Id, device_id: DeviceId, group: Vec<Id>) -> Self {
        Self {
            category_id,
            device_id,
            participant_ids: canonical_group(group),
            cast_at: Utc::now(),
        }
    }

    /// The canonical form of the full stored array. This is what incoming
    /// groups are compared against for the duplicate-group check.
    pub fn canonical_ids(&self) -> Vec<Id> {
        canonical_group(self.participant_ids.clone())
    }
}

/// A ballot without an ID.
pub type NewBallot = BallotCore;

/// A ballot from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}

impl DerefMut for Ballot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ballot
    }
}

/// Sort and de-duplicate a group of participant IDs. The canonical form is
/// the group's identity for equality and aggregation.
pub fn canonical_group(mut ids: Vec<Id>) -> Vec<Id> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
