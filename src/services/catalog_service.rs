use axum::body::Bytes;
use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    dto::products::{NewProduct, ProductList, ProductPatch},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    repository::{product_images, products},
    routes::params::ProductQuery,
    state::AppState,
};

/// One file of an upload batch, as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

pub async fn list_products(state: &AppState, query: ProductQuery) -> AppResult<ProductList> {
    let (filter, page) = query.normalize();
    let (total, products) = products::list_products(&state.orm, &filter, page).await?;
    Ok(ProductList { total, products })
}

pub async fn get_product(state: &AppState, id: i32) -> AppResult<Product> {
    products::get_product(&state.orm, id).await
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    fields: NewProduct,
) -> AppResult<Product> {
    ensure_admin(user)?;
    fields.validate()?;

    let product = products::create_product(&state.orm, fields, Some(user.email.clone())).await?;
    tracing::info!(product_id = product.id, created_by = %user.email, "product created");
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    patch: ProductPatch,
) -> AppResult<Product> {
    ensure_admin(user)?;
    patch.validate()?;

    let product = products::update_product(&state.orm, id, patch).await?;
    tracing::info!(product_id = id, "product updated");
    Ok(product)
}

/// Store a batch of images for a product and return their URLs in
/// submission order.
///
/// The product must exist before the batch is looked at. Files are then
/// saved and recorded one by one inside a single transaction. If
/// any step fails, including the commit, the transaction is rolled back and
/// every file this batch already wrote is deleted again.
pub async fn upload_images(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
    files: Vec<ImageUpload>,
) -> AppResult<Vec<String>> {
    ensure_admin(user)?;
    products::find_product_model(&state.orm, product_id).await?;
    if files.is_empty() {
        return Err(AppError::Validation("No images provided".into()));
    }
    for file in &files {
        state
            .assets
            .validate_image(&file.filename, Some(file.data.len() as u64))?;
    }

    let txn = state.orm.begin().await?;
    let start = product_images::next_image_order(&txn, product_id).await?;

    let mut saved = Vec::with_capacity(files.len());
    let outcome = match store_batch(state, &txn, product_id, start, &files, &mut saved).await {
        Ok(()) => txn.commit().await.map_err(AppError::from),
        Err(err) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(error = %rollback, "rollback of image upload failed");
            }
            Err(err)
        }
    };

    if let Err(err) = outcome {
        tracing::warn!(
            product_id,
            stored = saved.len(),
            error = %err,
            "image upload failed, removing stored files"
        );
        for url in &saved {
            state.assets.delete_image(url).await;
        }
        return Err(err);
    }

    tracing::info!(product_id, count = saved.len(), "images uploaded");
    Ok(saved)
}

async fn store_batch(
    state: &AppState,
    txn: &DatabaseTransaction,
    product_id: i32,
    start: i32,
    files: &[ImageUpload],
    saved: &mut Vec<String>,
) -> AppResult<()> {
    for (offset, file) in files.iter().enumerate() {
        let url = state
            .assets
            .save_image(product_id, &file.data[..], &file.filename)
            .await?;
        saved.push(url.clone());
        product_images::add_image_record(txn, product_id, &url, start + offset as i32 + 1).await?;
    }
    Ok(())
}

/// Files go first and best-effort, then the rows. A leftover directory is an
/// invisible leak; a row pointing at a deleted file would be a broken link.
pub async fn delete_product(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    ensure_admin(user)?;
    products::find_product_model(&state.orm, id).await?;

    state.assets.delete_all_images(id).await;
    products::delete_product(&state.orm, id).await?;

    tracing::info!(product_id = id, "product deleted");
    Ok(())
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
    image_id: i32,
) -> AppResult<()> {
    ensure_admin(user)?;
    let image = product_images::find_image(&state.orm, product_id, image_id).await?;

    state.assets.delete_image(&image.url).await;
    product_images::delete_image_record(&state.orm, product_id, image_id).await?;

    tracing::info!(product_id, image_id, "product image deleted");
    Ok(())
}
