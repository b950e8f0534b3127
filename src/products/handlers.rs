use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    products::{
        dto::{CreateProduct, DeleteAck, ListParams, ProductPage, UpdateProduct},
        repo::Product,
    },
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product)
                .put(update_product)
                .delete(delete_product),
        )
}

/// GET /products?q&page&limit — every authenticated user sees the whole
/// catalog; the listing is never ownership-scoped.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>, ApiError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (page, limit) = params.clamped();

    let total = Product::count(&state.db, q).await?;
    let items = Product::search(&state.db, q, limit, (page - 1) * limit).await?;

    Ok(Json(ProductPage {
        items,
        total,
        page,
        limit,
    }))
}

/// GET /products/:id — reads are open to any authenticated caller.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(product))
}

/// POST /products — owner and timestamps are stamped server-side.
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let new = payload.validate().map_err(ApiError::Validation)?;
    let product = Product::insert(&state.db, &new, &claims.email, &claims.name).await?;
    info!(product_id = %product.id, created_by = %product.created_by, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/:id — partial update, owner only.
#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(raw_id): Path<String>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let patch = payload.validate().map_err(ApiError::Validation)?;

    let existing = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    check_owner(&existing, &claims.email)?;

    // The record can vanish between the ownership check and the update;
    // that race reads as not-found.
    let updated = Product::apply_patch(&state.db, id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(product_id = %updated.id, "product updated");
    Ok(Json(updated))
}

/// DELETE /products/:id — owner only; deleting twice yields 404 the second time.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    let id = parse_id(&raw_id)?;

    let existing = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    check_owner(&existing, &claims.email)?;

    if !Product::delete(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    info!(product_id = %id, "product deleted");
    Ok(Json(DeleteAck { ok: true }))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid ID".to_string()))
}

/// Mutations are restricted to the record's creator. Reads are not.
fn check_owner(product: &Product, caller_email: &str) -> Result<(), ApiError> {
    if product.created_by != caller_email {
        warn!(
            product_id = %product.id,
            owner = %product.created_by,
            caller = %caller_email,
            "mutation by non-owner rejected"
        );
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn widget(owner: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            price: 9.99,
            category: "Home".into(),
            sku: "W-1".into(),
            description: None,
            created_by: owner.into(),
            created_by_name: "A".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn parse_id_rejects_malformed_identifiers() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.to_string(), "Invalid ID");
        assert!(parse_id("123e4567-e89b-12d3-a456-426614174000").is_ok());
    }

    #[test]
    fn owner_check_allows_creator_and_rejects_others() {
        let product = widget("a@x.com");
        assert!(check_owner(&product, "a@x.com").is_ok());
        let err = check_owner(&product, "b@x.com").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }
}
