use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;

use crate::{
    entity::{
        ProductImages,
        product_images::{ActiveModel, Column, Model as ImageModel},
    },
    error::{AppError, AppResult},
    models::ProductImage,
};

pub async fn list_images<C: ConnectionTrait>(db: &C, product_id: i32) -> AppResult<Vec<ImageModel>> {
    let images = ProductImages::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_asc(Column::SortOrder)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(images)
}

/// Highest display order among the product's images, or 0 when it has none.
/// A batch of uploads takes `next + 1`, `next + 2`, ...
pub async fn next_image_order<C: ConnectionTrait>(db: &C, product_id: i32) -> AppResult<i32> {
    let last = ProductImages::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::SortOrder)
        .one(db)
        .await?;
    Ok(last.map(|image| image.sort_order).unwrap_or(0))
}

pub async fn add_image_record<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    url: &str,
    order: i32,
) -> AppResult<ProductImage> {
    let model = ActiveModel {
        id: NotSet,
        product_id: Set(product_id),
        url: Set(url.to_string()),
        sort_order: Set(order),
        uploaded_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;
    Ok(model.into())
}

fn image_condition(product_id: i32, image_id: i32) -> Condition {
    Condition::all()
        .add(Column::Id.eq(image_id))
        .add(Column::ProductId.eq(product_id))
}

pub async fn find_image<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    image_id: i32,
) -> AppResult<ImageModel> {
    ProductImages::find()
        .filter(image_condition(product_id, image_id))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Image"))
}

pub async fn delete_image_record<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    image_id: i32,
) -> AppResult<()> {
    let result = ProductImages::delete_many()
        .filter(image_condition(product_id, image_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Image"));
    }
    Ok(())
}
