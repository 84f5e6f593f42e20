use std::collections::{HashMap, HashSet};

use mongodb::{
    bson::doc,
    options::{FindOneOptions, FindOptions},
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AdminAuth,
            category::{
                CategoryDescription, CategoryImportRequest, CategorySpec, CategoryUpdate,
                ImportReport,
            },
            participant::{
                ParticipantDescription, ParticipantImportRequest, ParticipantSpec,
                ParticipantUpdate,
            },
            results::CategoryResults,
        },
        common::text,
        db::{
            ballot::Ballot,
            category::{Category, NewCategory},
            participant::{NewParticipant, Participant},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_categories,
        create_category,
        modify_category,
        delete_category,
        import_categories,
        get_participants,
        create_participant,
        modify_participant,
        delete_participant,
        import_participants,
        get_results,
    ]
}

#[get("/admin/categories")]
async fn get_categories(
    _auth: AdminAuth,
    categories: Coll<Category>,
) -> Result<Json<Vec<CategoryDescription>>> {
    let by_order = FindOptions::builder().sort(doc! { "order": 1 }).build();
    let all_categories = categories
        .find(None, by_order)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(all_categories.into_iter().map(Into::into).collect()))
}

#[post("/admin/categories", data = "<spec>", format = "json")]
async fn create_category(
    _auth: AdminAuth,
    spec: Json<CategorySpec>,
    categories: Coll<Category>,
    new_categories: Coll<NewCategory>,
) -> Result<(Status, Json<CategoryDescription>)> {
    let spec = spec.into_inner();
    if spec.name.trim().is_empty() {
        return Err(Error::Validation(
            "Category name must not be empty".to_string(),
        ));
    }

    let order = match spec.order {
        Some(order) => order,
        None => next_order(&categories).await?,
    };
    let category = spec.into_category(order);

    let result = new_categories.insert_one(&category, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Conflict(format!(
            "A category named '{}' already exists",
            category.name
        )));
    }
    let id: Id = result?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = Category { id, category };
    Ok((Status::Created, Json(created.into())))
}

#[put("/admin/categories/<category_id>", data = "<update>", format = "json")]
async fn modify_category(
    _auth: AdminAuth,
    category_id: Id,
    update: Json<CategoryUpdate>,
    categories: Coll<Category>,
    new_categories: Coll<NewCategory>,
) -> Result<Json<CategoryDescription>> {
    let category = categories
        .find_one(category_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No category with ID '{category_id}'")))?;

    let update = update.into_inner();
    let mut core = category.category;
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "Category name must not be empty".to_string(),
            ));
        }
        core.name = name;
    }
    if let Some(order) = update.order {
        core.order = order;
    }
    if let Some(is_active) = update.is_active {
        core.is_active = is_active;
    }
    if let Some(allow) = update.allow_multiple_winners {
        core.allow_multiple_winners = allow;
    }

    let result = new_categories
        .replace_one(category_id.as_doc(), &core, None)
        .await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Conflict(format!(
            "A category named '{}' already exists",
            core.name
        )));
    }
    result?;

    let modified = Category {
        id: category_id,
        category: core,
    };
    Ok(Json(modified.into()))
}

#[delete("/admin/categories/<category_id>")]
async fn delete_category(
    _auth: AdminAuth,
    category_id: Id,
    categories: Coll<Category>,
) -> Result<()> {
    let result = categories.delete_one(category_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        Err(Error::NotFound(format!(
            "No category with ID '{category_id}'"
        )))
    } else {
        Ok(())
    }
}

#[post("/admin/categories/import", data = "<request>", format = "json")]
async fn import_categories(
    _auth: AdminAuth,
    request: Json<CategoryImportRequest>,
    categories: Coll<Category>,
    new_categories: Coll<NewCategory>,
) -> Result<Json<ImportReport>> {
    let existing = categories
        .find(None, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    // Dedup on the folded name, against the database and within the batch.
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|category| text::fold(&category.name))
        .collect();
    let mut order = existing
        .iter()
        .map(|category| category.order)
        .max()
        .unwrap_or(0);

    let mut imported = 0;
    let mut skipped = 0;
    for name in request.into_inner().names {
        let name = name.trim().to_string();
        if name.is_empty() || !seen.insert(text::fold(&name)) {
            skipped += 1;
            continue;
        }
        order += 1;
        let category = NewCategory {
            name,
            order,
            is_active: true,
            allow_multiple_winners: false,
        };
        let result = new_categories.insert_one(category, None).await;
        if is_duplicate_key_error(result.as_ref()) {
            // A concurrent import got there first.
            skipped += 1;
            continue;
        }
        result?;
        imported += 1;
    }

    Ok(Json(ImportReport::new(imported, skipped)))
}

#[get("/admin/participants")]
async fn get_participants(
    _auth: AdminAuth,
    participants: Coll<Participant>,
) -> Result<Json<Vec<ParticipantDescription>>> {
    let by_name = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let all_participants = participants
        .find(None, by_name)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(all_participants.into_iter().map(Into::into).collect()))
}

#[post("/admin/participants", data = "<spec>", format = "json")]
async fn create_participant(
    _auth: AdminAuth,
    spec: Json<ParticipantSpec>,
    new_participants: Coll<NewParticipant>,
) -> Result<(Status, Json<ParticipantDescription>)> {
    if spec.name.trim().is_empty() {
        return Err(Error::Validation(
            "Participant name must not be empty".to_string(),
        ));
    }

    let participant: NewParticipant = spec.into_inner().into();
    let id: Id = new_participants
        .insert_one(&participant, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = Participant { id, participant };
    Ok((Status::Created, Json(created.into())))
}

#[put("/admin/participants/<participant_id>", data = "<update>", format = "json")]
async fn modify_participant(
    _auth: AdminAuth,
    participant_id: Id,
    update: Json<ParticipantUpdate>,
    participants: Coll<Participant>,
    new_participants: Coll<NewParticipant>,
) -> Result<Json<ParticipantDescription>> {
    let participant = participants
        .find_one(participant_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No participant with ID '{participant_id}'")))?;

    let update = update.into_inner();
    let core = participant.participant;
    let name = match update.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Validation(
                    "Participant name must not be empty".to_string(),
                ));
            }
            name
        }
        None => core.name,
    };
    let nickname = match update.nickname {
        // An empty value clears the nickname.
        Some(nickname) => {
            let nickname = nickname.trim();
            if nickname.is_empty() {
                None
            } else {
                Some(nickname.to_string())
            }
        }
        None => core.nickname,
    };
    let is_active = update.is_active.unwrap_or(core.is_active);

    // Rebuilding the core keeps the search terms in sync with the new name
    // and nickname.
    let core = NewParticipant::new(name, nickname, is_active);
    new_participants
        .replace_one(participant_id.as_doc(), &core, None)
        .await?;

    let modified = Participant {
        id: participant_id,
        participant: core,
    };
    Ok(Json(modified.into()))
}

#[delete("/admin/participants/<participant_id>")]
async fn delete_participant(
    _auth: AdminAuth,
    participant_id: Id,
    participants: Coll<Participant>,
) -> Result<()> {
    let result = participants
        .delete_one(participant_id.as_doc(), None)
        .await?;
    if result.deleted_count == 0 {
        Err(Error::NotFound(format!(
            "No participant with ID '{participant_id}'"
        )))
    } else {
        Ok(())
    }
}

#[post("/admin/participants/import", data = "<request>", format = "json")]
async fn import_participants(
    _auth: AdminAuth,
    request: Json<ParticipantImportRequest>,
    participants: Coll<Participant>,
    new_participants: Coll<NewParticipant>,
) -> Result<Json<ImportReport>> {
    let existing = participants
        .find(None, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|participant| text::fold(&participant.name))
        .collect();

    let mut imported = 0;
    let mut skipped = 0;
    for entry in request.into_inner().participants {
        let (name, nickname) = entry.into_parts();
        if name.is_empty() || !seen.insert(text::fold(&name)) {
            skipped += 1;
            continue;
        }
        let participant = NewParticipant::new(name, nickname, true);
        new_participants.insert_one(participant, None).await?;
        imported += 1;
    }

    Ok(Json(ImportReport::new(imported, skipped)))
}

#[get("/admin/results")]
async fn get_results(
    _auth: AdminAuth,
    categories: Coll<Category>,
    participants: Coll<Participant>,
    ballots: Coll<Ballot>,
) -> Result<Json<Vec<CategoryResults>>> {
    // One name map serves every category.
    let names: HashMap<Id, String> = participants
        .find(None, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .map(|participant| (participant.id, participant.participant.name))
        .collect();

    let active = doc! { "is_active": true };
    let by_order = FindOptions::builder().sort(doc! { "order": 1 }).build();
    let active_categories = categories
        .find(active, by_order)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let mut all_results = Vec::with_capacity(active_categories.len());
    for category in active_categories {
        let category_ballots = ballots
            .find(doc! { "category_id": category.id }, None)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        all_results.push(CategoryResults::compute(&category, &category_ballots, &names));
    }

    Ok(Json(all_results))
}

/// The next free order value (max existing + 1).
async fn next_order(categories: &Coll<Category>) -> Result<u32> {
    let highest = FindOneOptions::builder().sort(doc! { "order": -1 }).build();
    let max = categories
        .find_one(None, highest)
        .await?
        .map(|category| category.order);
    Ok(max.map_or(1, |order| order + 1))
}

#[cfg(test)]
mod tests {
    use mongodb::{
        bson::{doc, Document},
        Database,
    };
    use rocket::{
        http::ContentType, local::asynchronous::Client, serde::json::serde_json::json,
    };

    use crate::model::{
        api::{admin::AdminCredentials, id::ApiId, results::RankingEntry},
        db::{category::CategoryCore, participant::ParticipantCore},
        mongodb::MongoCollection,
    };

    use super::*;

    #[backend_test]
    async fn admin_routes_require_credentials(client: Client) {
        let response = client.get(uri!(get_categories)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .get(uri!(get_results))
            .header(AdminCredentials::example2().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(admin)]
    async fn category_crud_lifecycle(client: Client, db: Database) {
        // Create without an explicit order.
        let response = client
            .post(uri!(create_category))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "Melhor Esquete" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let first = response.into_json::<CategoryDescription>().await.unwrap();
        assert_eq!(first.name, "Melhor Esquete");
        assert_eq!(first.order, 1);
        assert!(first.is_active);
        assert!(!first.allow_multiple_winners);

        // The next create continues the order sequence.
        let response = client
            .post(uri!(create_category))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "Noite do Talento", "allowMultipleWinners": true }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let second = response.into_json::<CategoryDescription>().await.unwrap();
        assert_eq!(second.order, 2);
        assert!(second.allow_multiple_winners);

        // Partial update: rename and deactivate.
        let response = client
            .put(format!("/admin/categories/{}", first.id))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "Melhor Esquete 2025", "isActive": false }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let modified = response.into_json::<CategoryDescription>().await.unwrap();
        assert_eq!(modified.name, "Melhor Esquete 2025");
        assert!(!modified.is_active);
        assert_eq!(modified.order, 1);

        let count = count_matches::<Category>(
            &db,
            doc! { "name": "Melhor Esquete 2025", "is_active": false },
        )
        .await;
        assert_eq!(count, 1);

        // The admin listing shows both, order ascending.
        let response = client
            .get(uri!(get_categories))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let listed = response
            .into_json::<Vec<CategoryDescription>>()
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Melhor Esquete 2025", "Noite do Talento"]);

        // Delete, then confirm a second delete is a 404.
        let response = client
            .delete(format!("/admin/categories/{}", first.id))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_no_matches::<Category>(&db, doc! { "name": "Melhor Esquete 2025" }).await;

        let response = client
            .delete(format!("/admin/categories/{}", first.id))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn create_category_rejects_bad_input(client: Client, db: Database) {
        let response = client
            .post(uri!(create_category))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "   " }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        insert_category(&db, CategoryCore::example()).await;
        let response = client
            .post(uri!(create_category))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "Mais Animado" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let count = count_matches::<Category>(&db, doc! {}).await;
        assert_eq!(count, 1);
    }

    #[backend_test(admin)]
    async fn modify_category_resolves_the_id(client: Client, db: Database) {
        let response = client
            .put(format!("/admin/categories/{}", Id::new()))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "isActive": false }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        assert_no_matches::<Category>(&db, doc! {}).await;
    }

    #[backend_test(admin)]
    async fn import_reports_imported_and_skipped(client: Client, db: Database) {
        insert_category(&db, CategoryCore::example()).await; // order 1

        let response = client
            .post(uri!(import_categories))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "names": ["Melhor Esquete", "MAIS ANIMADO"] }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let report = response.into_json::<ImportReport>().await.unwrap();
        assert_eq!(report, ImportReport::new(1, 1));

        // The new category continues the order sequence.
        let count =
            count_matches::<Category>(&db, doc! { "name": "Melhor Esquete", "order": 2 }).await;
        assert_eq!(count, 1);
    }

    #[backend_test(admin)]
    async fn import_dedups_within_the_batch(client: Client, db: Database) {
        let response = client
            .post(uri!(import_categories))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "names": ["Noite do Talento", "noite do talento", "  "] }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let report = response.into_json::<ImportReport>().await.unwrap();
        assert_eq!(report, ImportReport::new(1, 2));

        let count = count_matches::<Category>(&db, doc! {}).await;
        assert_eq!(count, 1);
    }

    #[backend_test(admin)]
    async fn participant_crud_lifecycle(client: Client, db: Database) {
        let response = client
            .post(uri!(create_participant))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "name": "Ana Souza", "nickname": "Aninha" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let created = response
            .into_json::<ParticipantDescription>()
            .await
            .unwrap();
        assert_eq!(created.name, "Ana Souza");
        assert_eq!(created.nickname.as_deref(), Some("Aninha"));
        assert!(created.is_active);

        // Changing the nickname refreshes the search terms.
        let response = client
            .put(format!("/admin/participants/{}", created.id))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "nickname": "Ana" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let count = count_matches::<Participant>(&db, doc! { "search_terms": "ana" }).await;
        assert_eq!(count, 1);

        // An empty nickname clears it.
        let response = client
            .put(format!("/admin/participants/{}", created.id))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(json!({ "nickname": "" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let modified = response
            .into_json::<ParticipantDescription>()
            .await
            .unwrap();
        assert_eq!(modified.nickname, None);

        let response = client
            .delete(format!("/admin/participants/{}", created.id))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_no_matches::<Participant>(&db, doc! {}).await;

        let response = client
            .delete(format!("/admin/participants/{}", created.id))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn import_participants_accepts_both_entry_forms(client: Client, db: Database) {
        let body = json!({
            "participants": [
                "José Maria | Zé",
                { "name": "Bruno Lima" },
                "jose maria",
            ],
        });
        let response = client
            .post(uri!(import_participants))
            .header(AdminCredentials::example1().basic_header())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let report = response.into_json::<ImportReport>().await.unwrap();
        assert_eq!(report, ImportReport::new(2, 1));

        let count =
            count_matches::<Participant>(&db, doc! { "name": "José Maria", "nickname": "Zé" })
                .await;
        assert_eq!(count, 1);
    }

    #[backend_test(admin)]
    async fn results_rank_groups_by_votes(client: Client, db: Database) {
        let single = insert_category(&db, CategoryCore::example()).await;
        insert_category(&db, CategoryCore::example_multi()).await;
        insert_category(&db, CategoryCore::example_inactive()).await;
        let ana = insert_participant(&db, ParticipantCore::example()).await;
        let jose = insert_participant(&db, ParticipantCore::example2()).await;

        // Three devices for Ana, two for José.
        for device in ["turma-a-1", "turma-a-2", "turma-a-3"] {
            cast(&client, single, device, &[ana]).await;
        }
        for device in ["turma-b-1", "turma-b-2"] {
            cast(&client, single, device, &[jose]).await;
        }

        let response = client
            .get(uri!(get_results))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let results = response.into_json::<Vec<CategoryResults>>().await.unwrap();

        // Active categories only, in listing order.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].category_name, "Mais Animado");
        assert_eq!(results[0].total_votes, 5);
        assert_eq!(
            results[0].ranking,
            vec![
                RankingEntry {
                    rank: 1,
                    participant_ids: vec![ApiId::from(ana)],
                    names: vec!["Ana Souza".to_string()],
                    votes: 3,
                },
                RankingEntry {
                    rank: 2,
                    participant_ids: vec![ApiId::from(jose)],
                    names: vec!["José Maria".to_string()],
                    votes: 2,
                },
            ]
        );

        // A category without ballots still appears, with an empty ranking.
        assert_eq!(results[1].category_name, "Melhor Dupla");
        assert_eq!(results[1].total_votes, 0);
        assert!(results[1].ranking.is_empty());
    }

    #[backend_test(admin)]
    async fn results_count_a_grown_array_once(client: Client, db: Database) {
        let multi = insert_category(&db, CategoryCore::example_multi()).await;
        let p1 = insert_participant(&db, ParticipantCore::example()).await;
        let p2 = insert_participant(&db, ParticipantCore::example2()).await;
        let p3 = insert_participant(&db, ParticipantCore::example3()).await;

        // One device grows its group in two submissions, the other casts the
        // full group at once. Both end up recording the same set.
        cast(&client, multi, "barraca-7", &[p1, p2]).await;
        cast(&client, multi, "barraca-7", &[p3]).await;
        cast(&client, multi, "barraca-9", &[p1, p2, p3]).await;

        let response = client
            .get(uri!(get_results))
            .header(AdminCredentials::example1().basic_header())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let results = response.into_json::<Vec<CategoryResults>>().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_votes, 2);
        assert_eq!(results[0].ranking.len(), 1);
        assert_eq!(results[0].ranking[0].votes, 2);
        assert_eq!(results[0].ranking[0].names.len(), 3);
    }

    async fn insert_category(db: &Database, category: NewCategory) -> Id {
        Coll::<NewCategory>::from_db(db)
            .insert_one(category, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    async fn insert_participant(db: &Database, participant: NewParticipant) -> Id {
        Coll::<NewParticipant>::from_db(db)
            .insert_one(participant, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    /// Cast a vote through the public endpoint.
    async fn cast(client: &Client, category: Id, device: &str, group: &[Id]) {
        let body = json!({
            "categoryId": category.to_string(),
            "deviceId": device,
            "participantIds": group.iter().map(Id::to_string).collect::<Vec<_>>(),
        });
        let response = client
            .post("/vote")
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
    }

    async fn count_matches<T: MongoCollection>(db: &Database, filter: Document) -> u64 {
        Coll::<T>::from_db(db)
            .count_documents(filter, None)
            .await
            .unwrap()
    }

    async fn assert_no_matches<T: MongoCollection>(db: &Database, filter: Document) {
        let matches = count_matches::<T>(db, filter).await;
        assert_eq!(matches, 0);
    }
}
