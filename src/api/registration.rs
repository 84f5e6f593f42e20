use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AdminAuth,
            registration::{PaymentUpdate, RegistrationDescription, RegistrationRequest},
        },
        common::finance::PaymentStatus,
        db::registration::{NewRegistration, Registration},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        register,
        get_registrations,
        update_payment,
        delete_registration,
    ]
}

#[post("/register", data = "<request>", format = "json")]
async fn register(
    request: Json<RegistrationRequest>,
    new_registrations: Coll<NewRegistration>,
) -> Result<(Status, Json<RegistrationDescription>)> {
    let request = request.into_inner();
    if let Some(field) = request.first_empty_field() {
        return Err(Error::Validation(format!(
            "Missing required field: {field}"
        )));
    }

    let registration: NewRegistration = request.into();
    let result = new_registrations.insert_one(&registration, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Conflict(
            "A registration with this email already exists".to_string(),
        ));
    }
    let id: Id = result?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = Registration { id, registration };
    Ok((Status::Created, Json(created.into())))
}

#[get("/admin/registrations")]
async fn get_registrations(
    _auth: AdminAuth,
    registrations: Coll<Registration>,
) -> Result<Json<Vec<RegistrationDescription>>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "registered_at": -1 })
        .build();
    let all_registrations = registrations
        .find(None, newest_first)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(
        all_registrations.into_iter().map(Into::into).collect(),
    ))
}

#[put(
    "/admin/registrations/<registration_id>/payment",
    data = "<update>",
    format = "json"
)]
async fn update_payment(
    _auth: AdminAuth,
    registration_id: Id,
    update: Json<PaymentUpdate>,
    registrations: Coll<Registration>,
    new_registrations: Coll<NewRegistration>,
) -> Result<Json<RegistrationDescription>> {
    let registration = registrations
        .find_one(registration_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No registration with ID '{registration_id}'")))?;

    let update = update.into_inner();
    let mut core = registration.registration;
    // `paid_at` tracks the current Paid status: stamped on the transition
    // into Paid, cleared when payment is reopened.
    if update.payment_status == PaymentStatus::Paid {
        if core.payment_status != PaymentStatus::Paid {
            core.paid_at = Some(Utc::now());
        }
    } else {
        core.paid_at = None;
    }
    core.payment_status = update.payment_status;
    if let Some(payment_type) = update.payment_type {
        core.payment_type = Some(payment_type);
    }
    if let Some(amount_paid) = update.amount_paid {
        core.amount_paid = Some(amount_paid);
    }

    new_registrations
        .replace_one(registration_id.as_doc(), &core, None)
        .await?;

    let modified = Registration {
        id: registration_id,
        registration: core,
    };
    Ok(Json(modified.into()))
}

#[delete("/admin/registrations/<registration_id>")]
async fn delete_registration(
    _auth: AdminAuth,
    registration_id: Id,
    registrations: Coll<Registration>,
) -> Result<()> {
    let result = registrations
        .delete_one(registration_id.as_doc(), None)
        .await?;
    if result.deleted_count == 0 {
        Err(Error::NotFound(format!(
            "No registration with ID '{registration_id}'"
        )))
    } else {
        Ok(())
    }
}
