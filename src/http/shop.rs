//! Item, store, stock, and category handlers

use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::http::error::AppError;
use crate::http::middleware::{is_admin, AuthenticatedUser};
use crate::store::shop::{
    Category, Item, ItemFields, NewStore, StockRecord, StoreRecord, StoreWithStock,
};

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Deserialize)]
pub struct ItemsQuery {
    /// When present, list the store's stock levels instead of the catalog
    #[serde(rename = "storeID", alias = "store_id")]
    pub store_id: Option<i32>,
}

pub async fn get_items_handler(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Response, AppError> {
    match query.store_id {
        Some(store_id) => {
            let stock = state.shop.stock_for_store(store_id).await?;
            Ok(Json(stock).into_response())
        }
        None => {
            let items = state.shop.get_items().await?;
            Ok(Json(items).into_response())
        }
    }
}

pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<Json<Item>, AppError> {
    let item = state
        .shop
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {}", item_id)))?;

    Ok(Json(item))
}

pub async fn create_item_handler(
    State(state): State<AppState>,
    Json(fields): Json<ItemFields>,
) -> Result<Json<Item>, AppError> {
    let item = state.shop.create_item(fields).await?;
    Ok(Json(item))
}

pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Json(fields): Json<ItemFields>,
) -> Result<Json<Item>, AppError> {
    let item = state
        .shop
        .update_item(item_id, fields)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {}", item_id)))?;

    Ok(Json(item))
}

pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.shop.delete_item(item_id).await? {
        return Err(AppError::NotFound(format!("item {}", item_id)));
    }

    Ok(Json(DeletedResponse { deleted: true }))
}

// ============================================================================
// Stores
// ============================================================================

pub async fn get_stores_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoreRecord>>, AppError> {
    let stores = state.shop.get_stores().await?;
    Ok(Json(stores))
}

pub async fn get_store_handler(
    State(state): State<AppState>,
    Path(store_id): Path<i32>,
) -> Result<Json<StoreWithStock>, AppError> {
    let store = state
        .shop
        .get_store_with_stock(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {}", store_id)))?;

    Ok(Json(store))
}

pub async fn create_store_handler(
    State(state): State<AppState>,
    Json(fields): Json<NewStore>,
) -> Result<Json<StoreRecord>, AppError> {
    let store = state.shop.create_store(fields).await?;

    info!(store_id = store.store_id, "store created");
    Ok(Json(store))
}

pub async fn update_store_handler(
    State(state): State<AppState>,
    Json(store): Json<StoreRecord>,
) -> Result<Json<StoreRecord>, AppError> {
    let store_id = store.store_id;
    let updated = state
        .shop
        .update_store(store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {}", store_id)))?;

    Ok(Json(updated))
}

pub async fn delete_store_handler(
    State(state): State<AppState>,
    Path(store_id): Path<i32>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.shop.delete_store(store_id).await? {
        return Err(AppError::NotFound(format!("store {}", store_id)));
    }

    info!(store_id, "store deleted");
    Ok(Json(DeletedResponse { deleted: true }))
}

// ============================================================================
// Stock
// ============================================================================

/// Replace the request's target store with the caller's affiliation unless
/// the caller is an admin. Staff can only touch their own store's stock.
async fn effective_store_id(
    state: &AppState,
    auth: &AuthenticatedUser,
    requested: i32,
) -> Result<i32, AppError> {
    if is_admin(&auth.groups) {
        return Ok(requested);
    }

    let profile = state
        .profiles
        .get_profile(&auth.username)
        .await?
        .ok_or_else(|| AppError::Internal(format!("no profile for caller {}", auth.username)))?;

    Ok(profile.store_id)
}

pub async fn create_stock_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(mut record): Json<StockRecord>,
) -> Result<Json<StockRecord>, AppError> {
    if record.quantity < 0 {
        return Err(AppError::BadRequest("quantity must be non-negative".to_string()));
    }

    record.store_id = effective_store_id(&state, &auth, record.store_id).await?;

    info!(
        store_id = record.store_id,
        item_id = record.item_id,
        by = %auth.username,
        "stock created"
    );

    let created = state.shop.create_stock(record).await?;
    Ok(Json(created))
}

pub async fn edit_stock_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(mut record): Json<StockRecord>,
) -> Result<Json<StockRecord>, AppError> {
    if record.quantity < 0 {
        return Err(AppError::BadRequest("quantity must be non-negative".to_string()));
    }

    record.store_id = effective_store_id(&state, &auth, record.store_id).await?;

    let updated = state
        .shop
        .update_stock(record.clone())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "stock for store {} item {}",
                record.store_id, record.item_id
            ))
        })?;

    Ok(Json(updated))
}

pub async fn delete_stock_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((store_id, item_id)): Path<(i32, i32)>,
) -> Result<Json<DeletedResponse>, AppError> {
    let store_id = effective_store_id(&state, &auth, store_id).await?;

    if !state.shop.delete_stock(store_id, item_id).await? {
        return Err(AppError::NotFound(format!(
            "stock for store {} item {}",
            store_id, item_id
        )));
    }

    Ok(Json(DeletedResponse { deleted: true }))
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub async fn get_categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.shop.get_categories().await?;
    Ok(Json(categories))
}

pub async fn create_category_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let category = state.shop.create_category(&req.name).await?;
    Ok(Json(category))
}

pub async fn update_category_handler(
    State(state): State<AppState>,
    Json(category): Json<Category>,
) -> Result<Json<Category>, AppError> {
    let category_id = category.category_id;
    let updated = state
        .shop
        .update_category(category)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {}", category_id)))?;

    Ok(Json(updated))
}

pub async fn delete_category_handler(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.shop.delete_category(category_id).await? {
        return Err(AppError::NotFound(format!("category {}", category_id)));
    }

    Ok(Json(DeletedResponse { deleted: true }))
}
