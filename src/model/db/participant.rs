use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::text;
use crate::model::mongodb::Id;

/// Core participant (candidate) data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCore {
    pub name: String,
    pub nickname: Option<String>,
    pub is_active: bool,
    /// Folded forms of name and nickname, kept in sync on every write and
    /// matched against folded queries by the roster search. Never exposed
    /// through the API.
    pub search_terms: Vec<String>,
}

impl ParticipantCore {
    /// Build a participant, deriving the folded search terms.
    pub fn new(name: String, nickname: Option<String>, is_active: bool) -> Self {
        let search_terms = search_terms(&name, nickname.as_deref());
        Self {
            name,
            nickname,
            is_active,
            search_terms,
        }
    }
}

/// The folded search terms for the given name and nickname.
pub fn search_terms(name: &str, nickname: Option<&str>) -> Vec<String> {
    let mut terms = vec![text::fold(name)];
    if let Some(nickname) = nickname {
        terms.push(text::fold(nickname));
    }
    terms
}

/// A participant without an ID.
pub type NewParticipant = ParticipantCore;

/// A participant from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub participant: ParticipantCore,
}

impl Deref for Participant {
    type Target = ParticipantCore;

    fn deref(&self) -> &Self::Target {
        &self.participant
    }
}

impl DerefMut for Participant {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.participant
    }
}
