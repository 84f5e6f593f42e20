use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, Document},
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AdminAuth,
            expense::{ExpenseDescription, ExpenseFilter, ExpenseSpec},
            purchase::{PurchaseDescription, PurchaseFilter, PurchaseSpec},
            shop::{ShopDescription, ShopSpec, ShopUpdate, ShopsQuery},
        },
        db::{
            expense::{Expense, NewExpense},
            purchase::{NewPurchase, Purchase},
            shop::{NewShop, Shop},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

/// How many purchases each shop listing carries.
const RECENT_PURCHASES: i64 = 5;

pub fn routes() -> Vec<Route> {
    routes![
        get_expenses,
        create_expense,
        modify_expense,
        delete_expense,
        get_shops,
        create_shop,
        modify_shop,
        get_purchases,
        create_purchase,
        delete_purchase,
    ]
}

#[get("/admin/expenses?<filter..>")]
async fn get_expenses(
    _auth: AdminAuth,
    filter: ExpenseFilter,
    expenses: Coll<Expense>,
) -> Result<Json<Vec<ExpenseDescription>>> {
    let mut query = Document::new();
    if let Some(category) = filter.category {
        query.insert("category", category);
    }
    if let Some(range) = date_range(filter.start_date.as_deref(), filter.end_date.as_deref()) {
        query.insert("date", range);
    }

    let newest_first = FindOptions::builder().sort(doc! { "date": -1 }).build();
    let matches = expenses
        .find(query, newest_first)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(matches.into_iter().map(Into::into).collect()))
}

#[post("/admin/expenses", data = "<spec>", format = "json")]
async fn create_expense(
    _auth: AdminAuth,
    spec: Json<ExpenseSpec>,
    new_expenses: Coll<NewExpense>,
) -> Result<(Status, Json<ExpenseDescription>)> {
    let spec = spec.into_inner();
    check_expense(&spec)?;

    let expense: NewExpense = spec.into();
    let id: Id = new_expenses
        .insert_one(&expense, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = Expense { id, expense };
    Ok((Status::Created, Json(created.into())))
}

#[put("/admin/expenses/<expense_id>", data = "<spec>", format = "json")]
async fn modify_expense(
    _auth: AdminAuth,
    expense_id: Id,
    spec: Json<ExpenseSpec>,
    new_expenses: Coll<NewExpense>,
) -> Result<Json<ExpenseDescription>> {
    let spec = spec.into_inner();
    check_expense(&spec)?;

    let expense: NewExpense = spec.into();
    let result = new_expenses
        .replace_one(expense_id.as_doc(), &expense, None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::NotFound(format!(
            "No expense with ID '{expense_id}'"
        )));
    }

    let modified = Expense {
        id: expense_id,
        expense,
    };
    Ok(Json(modified.into()))
}

#[delete("/admin/expenses/<expense_id>")]
async fn delete_expense(_auth: AdminAuth, expense_id: Id, expenses: Coll<Expense>) -> Result<()> {
    let result = expenses.delete_one(expense_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        Err(Error::NotFound(format!(
            "No expense with ID '{expense_id}'"
        )))
    } else {
        Ok(())
    }
}

#[get("/admin/shops?<query..>")]
async fn get_shops(
    _auth: AdminAuth,
    query: ShopsQuery,
    shops: Coll<Shop>,
    purchases: Coll<Purchase>,
) -> Result<Json<Vec<ShopDescription>>> {
    let filter = if query.include_inactive {
        doc! {}
    } else {
        doc! { "is_active": true }
    };
    let by_name = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let matching_shops = shops
        .find(filter, by_name)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let mut descriptions = Vec::with_capacity(matching_shops.len());
    for shop in matching_shops {
        let recent = recent_purchases(&purchases, &shop).await?;
        descriptions.push(ShopDescription::new(shop, recent));
    }
    Ok(Json(descriptions))
}

#[post("/admin/shops", data = "<spec>", format = "json")]
async fn create_shop(
    _auth: AdminAuth,
    spec: Json<ShopSpec>,
    new_shops: Coll<NewShop>,
) -> Result<(Status, Json<ShopDescription>)> {
    if spec.name.trim().is_empty() {
        return Err(Error::Validation("Shop name must not be empty".to_string()));
    }

    let shop: NewShop = spec.into_inner().into();
    let result = new_shops.insert_one(&shop, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Conflict(format!(
            "A shop named '{}' already exists",
            shop.name
        )));
    }
    let id: Id = result?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = ShopDescription::new(Shop { id, shop }, vec![]);
    Ok((Status::Created, Json(created)))
}

#[put("/admin/shops/<shop_id>", data = "<update>", format = "json")]
async fn modify_shop(
    _auth: AdminAuth,
    shop_id: Id,
    update: Json<ShopUpdate>,
    shops: Coll<Shop>,
    new_shops: Coll<NewShop>,
    purchases: Coll<Purchase>,
) -> Result<Json<ShopDescription>> {
    let shop = shops
        .find_one(shop_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No shop with ID '{shop_id}'")))?;

    let update = update.into_inner();
    let mut core = shop.shop;
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Shop name must not be empty".to_string()));
        }
        core.name = name;
    }
    if let Some(is_active) = update.is_active {
        core.is_active = is_active;
    }

    let result = new_shops.replace_one(shop_id.as_doc(), &core, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Conflict(format!(
            "A shop named '{}' already exists",
            core.name
        )));
    }
    result?;

    let modified = Shop {
        id: shop_id,
        shop: core,
    };
    let recent = recent_purchases(&purchases, &modified).await?;
    Ok(Json(ShopDescription::new(modified, recent)))
}

#[get("/admin/purchases?<filter..>")]
async fn get_purchases(
    _auth: AdminAuth,
    filter: PurchaseFilter,
    purchases: Coll<Purchase>,
    shops: Coll<Shop>,
) -> Result<Json<Vec<PurchaseDescription>>> {
    let mut query = Document::new();
    if let Some(shop_id) = filter.shop_id {
        query.insert("shop_id", shop_id);
    }
    if let Some(range) = date_range(filter.start_date.as_deref(), filter.end_date.as_deref()) {
        query.insert("date", range);
    }

    let newest_first = FindOptions::builder().sort(doc! { "date": -1 }).build();
    let matches = purchases
        .find(query, newest_first)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let shop_names: HashMap<Id, String> = shops
        .find(None, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .map(|shop| (shop.id, shop.shop.name))
        .collect();

    let descriptions = matches
        .into_iter()
        .map(|purchase| {
            let name = shop_names
                .get(&purchase.shop_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            PurchaseDescription::new(purchase, name)
        })
        .collect();
    Ok(Json(descriptions))
}

#[post("/admin/purchases", data = "<spec>", format = "json")]
async fn create_purchase(
    _auth: AdminAuth,
    spec: Json<PurchaseSpec>,
    shops: Coll<Shop>,
    new_purchases: Coll<NewPurchase>,
) -> Result<(Status, Json<PurchaseDescription>)> {
    let spec = spec.into_inner();
    if spec.items.is_empty() {
        return Err(Error::Validation(
            "Purchase must contain at least one item".to_string(),
        ));
    }

    let shop = shops
        .find_one(spec.shop_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No shop with ID '{}'", spec.shop_id)))?;

    let purchase: NewPurchase = spec.into();
    let id: Id = new_purchases
        .insert_one(&purchase, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let created = PurchaseDescription::new(Purchase { id, purchase }, shop.shop.name);
    Ok((Status::Created, Json(created)))
}

#[delete("/admin/purchases/<purchase_id>")]
async fn delete_purchase(
    _auth: AdminAuth,
    purchase_id: Id,
    purchases: Coll<Purchase>,
) -> Result<()> {
    let result = purchases.delete_one(purchase_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        Err(Error::NotFound(format!(
            "No purchase with ID '{purchase_id}'"
        )))
    } else {
        Ok(())
    }
}

/// The most recent purchases recorded against the given shop.
async fn recent_purchases(
    purchases: &Coll<Purchase>,
    shop: &Shop,
) -> Result<Vec<PurchaseDescription>> {
    let options = FindOptions::builder()
        .sort(doc! { "date": -1 })
        .limit(RECENT_PURCHASES)
        .build();
    let recent = purchases
        .find(doc! { "shop_id": shop.id }, options)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(recent
        .into_iter()
        .map(|purchase| PurchaseDescription::new(purchase, shop.name.clone()))
        .collect())
}

fn check_expense(spec: &ExpenseSpec) -> Result<()> {
    if spec.description.trim().is_empty() {
        return Err(Error::Validation(
            "Expense description must not be empty".to_string(),
        ));
    }
    if spec.amount <= 0.0 {
        return Err(Error::Validation(
            "Expense amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// A `$gte`/`$lte` BSON range over the optional filter bounds.
fn date_range(start: Option<&DateTime<Utc>>, end: Option<&DateTime<Utc>>) -> Option<Document> {
    let mut range = Document::new();
    if let Some(start) = start {
        range.insert("$gte", bson::DateTime::from_chrono(*start));
    }
    if let Some(end) = end {
        range.insert("$lte", bson::DateTime::from_chrono(*end));
    }
    (!range.is_empty()).then_some(range)
}
