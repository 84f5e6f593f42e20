//! Client-side voting flow state machine.
//!
//! This is pure bookkeeping over the public API types; the `voting-cli`
//! binary drives it against a running server. Categories are presented in
//! fixed-size steps, a device resumes at the first step it has not fully
//! voted, and submitting a step casts each pending selection in order.

use std::collections::{HashMap, HashSet};

use crate::model::{api::category::CategorySummary, mongodb::Id};

/// How many categories are presented per step.
pub const CATEGORIES_PER_STEP: usize = 6;

/// Where the voting flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is open for voting.
    NoCategories,
    /// Voting, on the given zero-based step.
    InProgress { step: usize },
    /// Every category has a recorded ballot.
    Completed,
}

/// Outcome of casting one category's selection against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastOutcome {
    /// The server recorded the vote.
    Accepted,
    /// The server already had this vote; the category counts as voted.
    Duplicate,
    /// Any other failure. Aborts the step, leaving the user on it.
    Failed(String),
}

/// A device's progress through the voting flow.
#[derive(Debug, Clone)]
pub struct VotingSession {
    categories: Vec<CategorySummary>,
    /// Categories with a server-recorded ballot.
    voted: HashSet<Id>,
    /// Local selections, keyed by category.
    selections: HashMap<Id, Vec<Id>>,
    step: usize,
    state: SessionState,
}

impl VotingSession {
    /// Build a session from the server's view and the local cache.
    ///
    /// Server-recorded ballots take precedence over cached selections, and
    /// the session resumes at the first step with an unvoted category.
    pub fn resume(
        categories: Vec<CategorySummary>,
        server_votes: HashMap<Id, Vec<Id>>,
        cached: HashMap<Id, Vec<Id>>,
    ) -> Self {
        let mut voted = HashSet::new();
        let mut selections = cached;
        for (category_id, group) in server_votes {
            voted.insert(category_id);
            selections.insert(category_id, group);
        }

        let first_unvoted = categories
            .chunks(CATEGORIES_PER_STEP)
            .position(|step| step.iter().any(|category| !voted.contains(&*category.id)));
        let state = if categories.is_empty() {
            SessionState::NoCategories
        } else {
            match first_unvoted {
                Some(step) => SessionState::InProgress { step },
                None => SessionState::Completed,
            }
        };

        Self {
            categories,
            voted,
            selections,
            step: first_unvoted.unwrap_or(0),
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        (self.categories.len() + CATEGORIES_PER_STEP - 1) / CATEGORIES_PER_STEP
    }

    /// The categories shown on the current step.
    pub fn step_categories(&self) -> &[CategorySummary] {
        let start = self.step * CATEGORIES_PER_STEP;
        let end = (start + CATEGORIES_PER_STEP).min(self.categories.len());
        &self.categories[start..end]
    }

    pub fn is_voted(&self, category_id: Id) -> bool {
        self.voted.contains(&category_id)
    }

    pub fn selection(&self, category_id: Id) -> Option<&[Id]> {
        self.selections.get(&category_id).map(Vec::as_slice)
    }

    /// All local selections, for persisting to the state file.
    pub fn selections(&self) -> &HashMap<Id, Vec<Id>> {
        &self.selections
    }

    /// Record a local selection. An empty group clears the selection.
    pub fn select(&mut self, category_id: Id, group: Vec<Id>) {
        if group.is_empty() {
            self.selections.remove(&category_id);
        } else {
            self.selections.insert(category_id, group);
        }
    }

    /// Categories on the current step that still need a selection before the
    /// step can be submitted. Already-voted categories are satisfied.
    pub fn missing_selections(&self) -> Vec<&CategorySummary> {
        self.step_categories()
            .iter()
            .filter(|category| {
                !self.voted.contains(&*category.id) && !self.selections.contains_key(&*category.id)
            })
            .collect()
    }

    /// The casts a step submission will perform, in step order.
    pub fn pending_submissions(&self) -> Vec<(Id, Vec<Id>)> {
        self.step_categories()
            .iter()
            .filter(|category| !self.voted.contains(&*category.id))
            .filter_map(|category| {
                let group = self.selections.get(&*category.id)?;
                Some((*category.id, group.clone()))
            })
            .collect()
    }

    /// Record the outcome of one cast. Returns whether the step submission
    /// may continue: duplicates are non-fatal, anything else failing is.
    pub fn record_outcome(&mut self, category_id: Id, outcome: &CastOutcome) -> bool {
        match outcome {
            CastOutcome::Accepted | CastOutcome::Duplicate => {
                self.voted.insert(category_id);
                true
            }
            CastOutcome::Failed(_) => false,
        }
    }

    /// Move on after a fully successful step submission.
    pub fn advance(&mut self) {
        if self.step + 1 < self.total_steps() {
            self.step += 1;
            self.state = SessionState::InProgress { step: self.step };
        } else {
            self.state = SessionState::Completed;
        }
    }

    /// Step back for review. Returns false when already on the first step.
    pub fn back(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step -= 1;
        self.state = SessionState::InProgress { step: self.step };
        true
    }
}
