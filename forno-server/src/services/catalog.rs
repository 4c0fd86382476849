//! Menu, categories and products

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, MenuSection, Product, ProductCreate, ProductUpdate,
};

use crate::cache::keys;
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_non_negative, validate_optional_text,
    validate_required_text,
};

/// Group menu products under their categories, dropping empty sections.
pub fn build_menu(categories: Vec<Category>, products: Vec<Product>) -> Vec<MenuSection> {
    let mut by_category: HashMap<i64, Vec<Product>> = HashMap::new();
    for product in products {
        by_category.entry(product.category_id).or_default().push(product);
    }
    categories
        .into_iter()
        .filter_map(|category| {
            let products = by_category.remove(&category.id)?;
            Some(MenuSection { category, products })
        })
        .collect()
}

/// Storefront menu (cached)
pub async fn menu(state: &AppState) -> ServiceResult<Vec<MenuSection>> {
    super::cached(&state.cache, keys::MENU, || load_menu(state)).await
}

async fn load_menu(state: &AppState) -> ServiceResult<Vec<MenuSection>> {
    let categories = db::categories::list_active(&state.pool).await?;
    let products = db::products::list_on_menu(&state.pool).await?;
    Ok(build_menu(categories, products))
}

pub async fn categories(state: &AppState) -> ServiceResult<Vec<Category>> {
    super::cached(&state.cache, keys::CATEGORIES_ALL, || async {
        db::categories::list_all(&state.pool)
            .await
            .map_err(ServiceError::from)
    })
    .await
}

pub async fn products(state: &AppState) -> ServiceResult<Vec<Product>> {
    super::cached(&state.cache, keys::PRODUCTS_ALL, || async {
        db::products::list_all(&state.pool)
            .await
            .map_err(ServiceError::from)
    })
    .await
}

pub async fn product(state: &AppState, id: i64) -> ServiceResult<Product> {
    super::cached(&state.cache, &keys::product(id), || load_product(state, id)).await
}

async fn load_product(state: &AppState, id: i64) -> ServiceResult<Product> {
    db::products::find(&state.pool, id)
        .await?
        .ok_or_else(|| product_not_found(id).into())
}

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        .with_detail("product_id", id)
}

fn category_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
        .with_detail("category_id", id)
}

fn invalidate_catalog(state: &AppState) {
    match state.cache.invalidate_pattern(keys::CATALOG_PATTERN) {
        Ok(n) => tracing::debug!(removed = n, "Catalog cache invalidated"),
        Err(e) => tracing::error!(error = %e, "Catalog cache pattern rejected"),
    }
}

// ── Categories ──

pub async fn create_category(state: &AppState, data: CategoryCreate) -> ServiceResult<Category> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    let category = db::categories::create(&state.pool, &data, shared::util::now_millis()).await?;
    invalidate_catalog(state);
    tracing::info!(category_id = category.id, name = %category.name, "Category created");
    Ok(category)
}

pub async fn update_category(
    state: &AppState,
    id: i64,
    data: CategoryUpdate,
) -> ServiceResult<Category> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let category = db::categories::update(&state.pool, id, &data, shared::util::now_millis())
        .await?
        .ok_or_else(|| category_not_found(id))?;
    invalidate_catalog(state);
    Ok(category)
}

/// Refuses while products still reference the category.
pub async fn delete_category(state: &AppState, id: i64) -> ServiceResult<()> {
    let products = db::categories::count_products(&state.pool, id).await?;
    if products > 0 {
        return Err(AppError::with_message(
            ErrorCode::CategoryHasProducts,
            format!("Category {id} still has {products} products"),
        )
        .with_detail("product_count", products)
        .into());
    }
    if !db::categories::delete(&state.pool, id).await? {
        return Err(category_not_found(id).into());
    }
    invalidate_catalog(state);
    tracing::info!(category_id = id, "Category deleted");
    Ok(())
}

// ── Products ──

fn validate_product_fields(
    name: Option<&str>,
    description: &Option<String>,
    image_url: &Option<String>,
    price: Option<rust_decimal::Decimal>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(image_url, "image_url", MAX_URL_LEN)?;
    if let Some(price) = price {
        validate_non_negative(price, "price")?;
    }
    Ok(())
}

pub async fn create_product(state: &AppState, data: ProductCreate) -> ServiceResult<Product> {
    validate_product_fields(
        Some(&data.name),
        &data.description,
        &data.image_url,
        Some(data.price),
    )?;
    if db::categories::find(&state.pool, data.category_id)
        .await?
        .is_none()
    {
        return Err(category_not_found(data.category_id).into());
    }
    let product = db::products::create(&state.pool, &data, shared::util::now_millis()).await?;
    invalidate_catalog(state);
    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    id: i64,
    data: ProductUpdate,
) -> ServiceResult<Product> {
    validate_product_fields(
        data.name.as_deref(),
        &data.description,
        &data.image_url,
        data.price,
    )?;
    if let Some(category_id) = data.category_id
        && db::categories::find(&state.pool, category_id)
            .await?
            .is_none()
    {
        return Err(category_not_found(category_id).into());
    }
    let product = db::products::update(&state.pool, id, &data, shared::util::now_millis())
        .await?
        .ok_or_else(|| product_not_found(id))?;
    invalidate_catalog(state);
    Ok(product)
}

pub async fn delete_product(state: &AppState, id: i64) -> ServiceResult<()> {
    if !db::products::delete(&state.pool, id).await? {
        return Err(product_not_found(id).into());
    }
    invalidate_catalog(state);
    tracing::info!(product_id = id, "Product deleted");
    Ok(())
}
