//! Storefront catalog endpoints

use axum::extract::{Path, State};
use axum::Json;
use shared::models::{Category, MenuSection, Product};

use super::ApiResult;
use crate::services::catalog;
use crate::state::AppState;

/// GET /api/menu
pub async fn get_menu(State(state): State<AppState>) -> ApiResult<Vec<MenuSection>> {
    Ok(Json(catalog::menu(&state).await?))
}

/// GET /api/categories - active categories only
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = catalog::categories(&state).await?;
    Ok(Json(categories.into_iter().filter(|c| c.is_active).collect()))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    Ok(Json(catalog::product(&state, id).await?))
}
