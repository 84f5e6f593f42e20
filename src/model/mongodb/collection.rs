use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    admin::{Admin, NewAdmin},
    ballot::{Ballot, NewBallot},
    category::{Category, NewCategory},
    expense::{Expense, NewExpense},
    participant::{NewParticipant, Participant},
    purchase::{NewPurchase, Purchase},
    registration::{NewRegistration, Registration},
    shop::{NewShop, Shop},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Admin collections
const ADMINS: &str = "admins";
impl MongoCollection for Admin {
    const NAME: &'static str = ADMINS;
}
impl MongoCollection for NewAdmin {
    const NAME: &'static str = ADMINS;
}

// Category collections
const CATEGORIES: &str = "vote_categories";
impl MongoCollection for Category {
    const NAME: &'static str = CATEGORIES;
}
impl MongoCollection for NewCategory {
    const NAME: &'static str = CATEGORIES;
}

// Participant collections
const PARTICIPANTS: &str = "vote_participants";
impl MongoCollection for Participant {
    const NAME: &'static str = PARTICIPANTS;
}
impl MongoCollection for NewParticipant {
    const NAME: &'static str = PARTICIPANTS;
}

// Ballot collections
const BALLOTS: &str = "ballots";
impl MongoCollection for Ballot {
    const NAME: &'static str = BALLOTS;
}
impl MongoCollection for NewBallot {
    const NAME: &'static str = BALLOTS;
}

// Registration collections
const REGISTRATIONS: &str = "registrations";
impl MongoCollection for Registration {
    const NAME: &'static str = REGISTRATIONS;
}
impl MongoCollection for NewRegistration {
    const NAME: &'static str = REGISTRATIONS;
}

// Expense collections
const EXPENSES: &str = "expenses";
impl MongoCollection for Expense {
    const NAME: &'static str = EXPENSES;
}
impl MongoCollection for NewExpense {
    const NAME: &'static str = EXPENSES;
}

// Shop collections
const SHOPS: &str = "shops";
impl MongoCollection for Shop {
    const NAME: &'static str = SHOPS;
}
impl MongoCollection for NewShop {
    const NAME: &'static str = SHOPS;
}

// Purchase collections
const PURCHASES: &str = "purchases";
impl MongoCollection for Purchase {
    const NAME: &'static str = PURCHASES;
}
impl MongoCollection for NewPurchase {
    const NAME: &'static str = PURCHASES;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Ballot collection: at most one ballot per device per category. This is
    // the serialization point for racing votes from the same device.
    let ballot_index = IndexModel::builder()
        .keys(doc! {"category_id": 1, "device_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Ballot>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Category collection.
    let category_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique.clone())
        .build();
    Coll::<Category>::from_db(db)
        .create_index(category_index, None)
        .await?;

    // Admin collection.
    let admin_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique.clone())
        .build();
    Coll::<Admin>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    // Registration collection: emails are stored lowercased, so this index
    // makes the duplicate-email check atomic.
    let registration_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique.clone())
        .build();
    Coll::<Registration>::from_db(db)
        .create_index(registration_index, None)
        .await?;

    // Shop collection.
    let shop_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique)
        .build();
    Coll::<Shop>::from_db(db)
        .create_index(shop_index, None)
        .await?;

    Ok(())
}
