use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{DuplicateVote, Error, Result},
    model::{
        api::{
            ballot::{BallotsQuery, VoteReceipt, VoteRequest, VotedGroups},
            category::CategorySummary,
            id::ApiId,
            participant::ParticipantSummary,
        },
        common::{device::DeviceId, text},
        db::{
            ballot::{canonical_group, Ballot, NewBallot},
            category::Category,
            participant::Participant,
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

/// Maximum number of participants returned by a roster search.
const SEARCH_LIMIT: i64 = 20;

pub fn routes() -> Vec<Route> {
    routes![
        active_categories,
        participant_by_id,
        search_participants,
        my_ballots,
        my_ballots_missing_device,
        cast_vote,
    ]
}

#[get("/categories")]
async fn active_categories(categories: Coll<Category>) -> Result<Json<Vec<CategorySummary>>> {
    let active = doc! {
        "is_active": true,
    };
    let by_order = FindOptions::builder().sort(doc! { "order": 1 }).build();
    let active_categories = categories
        .find(active, by_order)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(active_categories.into_iter().map(Into::into).collect()))
}

#[get("/participants/search?<id>", rank = 1)]
async fn participant_by_id(
    id: Id,
    participants: Coll<Participant>,
) -> Result<Json<ParticipantSummary>> {
    let participant = participants
        .find_one(id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No participant with ID '{id}'")))?;
    Ok(Json(participant.into()))
}

#[get("/participants/search?<query>", rank = 2)]
async fn search_participants(
    query: Option<String>,
    participants: Coll<Participant>,
) -> Result<Json<Vec<ParticipantSummary>>> {
    let filter = match query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => {
            // Queries are folded like the stored search terms, so matching is
            // case- and diacritic-insensitive.
            let pattern = text::regex_escape(&text::fold(query));
            doc! {
                "is_active": true,
                "search_terms": { "$regex": pattern },
            }
        }
        None => doc! { "is_active": true },
    };
    let options = FindOptions::builder()
        .sort(doc! { "name": 1 })
        .limit(SEARCH_LIMIT)
        .build();

    let matches = participants
        .find(filter, options)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(matches.into_iter().map(Into::into).collect()))
}

#[get("/my-ballots?<query..>")]
async fn my_ballots(query: BallotsQuery, ballots: Coll<Ballot>) -> Result<Json<VotedGroups>> {
    let for_device = doc! {
        "device_id": &query.device_id,
    };
    let device_ballots = ballots
        .find(for_device, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let groups = device_ballots
        .into_iter()
        .map(|ballot| {
            let group = ballot
                .participant_ids
                .iter()
                .copied()
                .map(ApiId::from)
                .collect();
            (ballot.category_id, group)
        })
        .collect();

    Ok(Json(VotedGroups { groups }))
}

/// Catch requests that failed the query guard above, so a missing or empty
/// device ID is a 400 rather than a 404.
#[get("/my-ballots", rank = 2)]
fn my_ballots_missing_device() -> Error {
    Error::Validation("Missing required query parameter: deviceId".to_string())
}

#[post("/vote", data = "<request>", format = "json")]
async fn cast_vote(
    request: Json<VoteRequest>,
    categories: Coll<Category>,
    participants: Coll<Participant>,
    ballots: Coll<Ballot>,
    new_ballots: Coll<NewBallot>,
) -> Result<(Status, Json<VoteReceipt>)> {
    // Presence checks first: these are 400s, not lookup failures.
    let category_id = request
        .category_id
        .ok_or_else(|| Error::Validation("Missing required field: categoryId".to_string()))?;
    let device_id = request
        .device_id
        .as_deref()
        .unwrap_or_default()
        .parse::<DeviceId>()
        .map_err(|_| Error::Validation("Missing required field: deviceId".to_string()))?;
    let submitted = request.group();
    if submitted.is_empty() {
        return Err(Error::Validation(
            "Missing required field: participantIds".to_string(),
        ));
    }

    let category = categories
        .find_one(category_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No category with ID '{category_id}'")))?;
    if !category.is_active {
        return Err(Error::Inactive(format!(
            "Category '{}' is not open for voting",
            category.name
        )));
    }

    // Every submitted participant must exist and be active.
    for participant_id in &submitted {
        let active = doc! {
            "_id": *participant_id,
            "is_active": true,
        };
        if participants.find_one(active, None).await?.is_none() {
            return Err(Error::NotFound(format!(
                "Participant not found or inactive: {participant_id}"
            )));
        }
    }

    // The canonical form is the group's identity from here on.
    let group = canonical_group(submitted);

    let existing = ballots
        .find_one(
            doc! {
                "category_id": category_id,
                "device_id": &device_id,
            },
            None,
        )
        .await?;

    match existing {
        None => {
            let ballot = NewBallot::new(category_id, device_id, group);
            let result = new_ballots.insert_one(&ballot, None).await;
            if is_duplicate_key_error(result.as_ref()) {
                // Lost the unique-index race to a concurrent vote from the
                // same device.
                return Err(Error::DuplicateVote(DuplicateVote::Category));
            }
            result?;
        }
        Some(_) if !category.allow_multiple_winners => {
            return Err(Error::DuplicateVote(DuplicateVote::Category));
        }
        Some(ballot) => {
            // Set-compare against the device's full voting history in this
            // category, not just the last cast group.
            if ballot.canonical_ids() == group {
                return Err(Error::DuplicateVote(DuplicateVote::Group));
            }
            // Guard the append on the array we read; a concurrent append
            // empties the match and surfaces as a duplicate.
            let read_state = doc! {
                "_id": ballot.id,
                "participant_ids": &ballot.participant_ids,
            };
            let append = doc! {
                "$push": { "participant_ids": { "$each": &group } },
            };
            let updated = ballots.update_one(read_state, append, None).await?;
            if updated.modified_count == 0 {
                return Err(Error::DuplicateVote(DuplicateVote::Group));
            }
        }
    }

    Ok((Status::Created, Json(VoteReceipt::new())))
}
