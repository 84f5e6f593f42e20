use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{ballot::Ballot, category::Category},
    mongodb::Id,
};

/// One ranked group in a category's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: u32,
    pub participant_ids: Vec<ApiId>,
    pub names: Vec<String>,
    pub votes: u64,
}

/// Aggregated results for one category: the distinct groups voted for,
/// ranked by ballot count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResults {
    pub category_id: ApiId,
    pub category_name: String,
    pub allow_multiple_winners: bool,
    pub total_votes: u64,
    pub ranking: Vec<RankingEntry>,
}

/// Per-group tallies accumulated while walking the ballots.
struct GroupTally {
    votes: u64,
    first_cast_at: DateTime<Utc>,
}

impl CategoryResults {
    /// Aggregate the ballots cast in one category.
    ///
    /// Each ballot row counts once, keyed by the canonical (sorted,
    /// de-duplicated) form of its full stored array; a multi-winner array
    /// that grew over time is therefore a single group. Groups are ordered
    /// by vote count descending, then by earliest ballot ascending, then by
    /// id-list order, so results are deterministic; ranks are the sequential
    /// positions in that order, with no rank sharing between equal counts.
    /// Ids missing from `names` resolve to the "Unknown" placeholder.
    pub fn compute(category: &Category, ballots: &[Ballot], names: &HashMap<Id, String>) -> Self {
        // BTreeMap so equal tallies iterate in id-list order.
        let mut groups: BTreeMap<Vec<Id>, GroupTally> = BTreeMap::new();
        for ballot in ballots {
            let tally = groups
                .entry(ballot.canonical_ids())
                .or_insert_with(|| GroupTally {
                    votes: 0,
                    first_cast_at: ballot.cast_at,
                });
            tally.votes += 1;
            tally.first_cast_at = tally.first_cast_at.min(ballot.cast_at);
        }

        let mut ordered: Vec<(Vec<Id>, GroupTally)> = groups.into_iter().collect();
        ordered.sort_by(|(ids_a, tally_a), (ids_b, tally_b)| {
            tally_b
                .votes
                .cmp(&tally_a.votes)
                .then_with(|| tally_a.first_cast_at.cmp(&tally_b.first_cast_at))
                .then_with(|| ids_a.cmp(ids_b))
        });

        let ranking = ordered
            .into_iter()
            .enumerate()
            .map(|(position, (ids, tally))| RankingEntry {
                rank: position as u32 + 1,
                names: ids
                    .iter()
                    .map(|id| {
                        names
                            .get(id)
                            .cloned()
                            .unwrap_or_else(|| "Unknown".to_string())
                    })
                    .collect(),
                participant_ids: ids.into_iter().map(ApiId::from).collect(),
                votes: tally.votes,
            })
            .collect();

        Self {
            category_id: category.id.into(),
            category_name: category.name.clone(),
            allow_multiple_winners: category.allow_multiple_winners,
            total_votes: ballots.len() as u64,
            ranking,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::model::{common::device::DeviceId, db::ballot::BallotCore, db::category::CategoryCore};

    use super::*;

    fn category() -> Category {
        Category {
            id: Id::new(),
            category: CategoryCore::example(),
        }
    }

    fn ballot(category_id: Id, device: &str, group: Vec<Id>, cast_at: DateTime<Utc>) -> Ballot {
        Ballot {
            id: Id::new(),
            ballot: BallotCore {
                category_id,
                device_id: device.parse::<DeviceId>().unwrap(),
                participant_ids: group,
                cast_at,
            },
        }
    }

    fn name_map(entries: &[(Id, &str)]) -> HashMap<Id, String> {
        entries
            .iter()
            .map(|(id, name)| (*id, name.to_string()))
            .collect()
    }

    #[test]
    fn ranks_groups_by_vote_count() {
        let category = category();
        let p1 = Id::new();
        let p2 = Id::new();
        let now = Utc::now();

        // Three ballots for p1, two for p2.
        let ballots = vec![
            ballot(category.id, "d1", vec![p1], now),
            ballot(category.id, "d2", vec![p1], now),
            ballot(category.id, "d3", vec![p1], now),
            ballot(category.id, "d4", vec![p2], now),
            ballot(category.id, "d5", vec![p2], now),
        ];
        let names = name_map(&[(p1, "Ana Souza"), (p2, "Bruno Lima")]);

        let results = CategoryResults::compute(&category, &ballots, &names);
        assert_eq!(results.total_votes, 5);
        assert_eq!(results.ranking.len(), 2);

        assert_eq!(results.ranking[0].rank, 1);
        assert_eq!(results.ranking[0].participant_ids, vec![ApiId::from(p1)]);
        assert_eq!(results.ranking[0].names, vec!["Ana Souza"]);
        assert_eq!(results.ranking[0].votes, 3);

        assert_eq!(results.ranking[1].rank, 2);
        assert_eq!(results.ranking[1].participant_ids, vec![ApiId::from(p2)]);
        assert_eq!(results.ranking[1].votes, 2);
    }

    #[test]
    fn group_identity_ignores_submission_order() {
        let category = category();
        let p1 = Id::new();
        let p2 = Id::new();
        let now = Utc::now();

        // Same pair stored in opposite orders on two devices' ballots.
        let ballots = vec![
            ballot(category.id, "d1", vec![p1, p2], now),
            ballot(category.id, "d2", vec![p2, p1], now),
        ];
        let names = name_map(&[(p1, "Ana Souza"), (p2, "Bruno Lima")]);

        let results = CategoryResults::compute(&category, &ballots, &names);
        assert_eq!(results.ranking.len(), 1);
        assert_eq!(results.ranking[0].votes, 2);
    }

    #[test]
    fn grown_array_counts_as_one_group() {
        let category = category();
        let p1 = Id::new();
        let p2 = Id::new();
        let p3 = Id::new();
        let now = Utc::now();

        // One device whose multi-winner ballot grew to three ids.
        let ballots = vec![ballot(category.id, "d1", vec![p1, p2, p3], now)];
        let names = name_map(&[(p1, "Ana Souza"), (p2, "Bruno Lima"), (p3, "Carla Dias")]);

        let results = CategoryResults::compute(&category, &ballots, &names);
        assert_eq!(results.total_votes, 1);
        assert_eq!(results.ranking.len(), 1);
        assert_eq!(results.ranking[0].votes, 1);
        assert_eq!(results.ranking[0].participant_ids.len(), 3);
    }

    #[test]
    fn ties_break_by_earliest_ballot() {
        let category = category();
        let p1 = Id::new();
        let p2 = Id::new();
        let now = Utc::now();

        let ballots = vec![
            ballot(category.id, "d1", vec![p2], now),
            ballot(category.id, "d2", vec![p1], now - Duration::minutes(5)),
        ];
        let names = name_map(&[(p1, "Ana Souza"), (p2, "Bruno Lima")]);

        let results = CategoryResults::compute(&category, &ballots, &names);
        // p1's ballot was cast first, so it takes rank 1; ranks stay sequential.
        assert_eq!(results.ranking[0].participant_ids, vec![ApiId::from(p1)]);
        assert_eq!(results.ranking[0].rank, 1);
        assert_eq!(results.ranking[1].rank, 2);
    }

    #[test]
    fn missing_names_get_a_placeholder() {
        let category = category();
        let known = Id::new();
        let deleted = Id::new();
        let now = Utc::now();

        let ballots = vec![ballot(category.id, "d1", vec![known, deleted], now)];
        let names = name_map(&[(known, "Ana Souza")]);

        let results = CategoryResults::compute(&category, &ballots, &names);
        assert!(results.ranking[0].names.contains(&"Ana Souza".to_string()));
        assert!(results.ranking[0].names.contains(&"Unknown".to_string()));
    }

    #[test]
    fn recomputation_is_stable() {
        let category = category();
        let p1 = Id::new();
        let p2 = Id::new();
        let now = Utc::now();

        let ballots = vec![
            ballot(category.id, "d1", vec![p1], now),
            ballot(category.id, "d2", vec![p2], now + Duration::seconds(1)),
            ballot(category.id, "d3", vec![p1], now + Duration::seconds(2)),
        ];
        let names = name_map(&[(p1, "Ana Souza"), (p2, "Bruno Lima")]);

        let first = CategoryResults::compute(&category, &ballots, &names);
        let second = CategoryResults::compute(&category, &ballots, &names);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_category_yields_empty_ranking() {
        let category = category();
        let results = CategoryResults::compute(&category, &[], &HashMap::new());
        assert_eq!(results.total_votes, 0);
        assert!(results.ranking.is_empty());
    }
}
