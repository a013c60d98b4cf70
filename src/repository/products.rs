use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;

use crate::{
    dto::products::{NewProduct, ProductPatch},
    entity::{
        ProductImages, Products, product_images,
        products::{ActiveModel, Column, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::Product,
    repository::product_images::list_images,
    routes::params::{Page, ProductFilter},
};

pub async fn create_product<C: ConnectionTrait>(
    db: &C,
    fields: NewProduct,
    created_by: Option<String>,
) -> AppResult<Product> {
    let now = Utc::now().fixed_offset();
    let model = ActiveModel {
        id: NotSet,
        name: Set(fields.name),
        description: Set(fields.description),
        price: Set(fields.price),
        category: Set(fields.category),
        available: Set(fields.available),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(Product::from_entity(model, Vec::new()))
}

pub async fn find_product_model<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

pub async fn get_product<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Product> {
    let model = find_product_model(db, id).await?;
    let images = list_images(db, id).await?;
    Ok(Product::from_entity(model, images))
}

/// Returns the number of matching products ignoring pagination, and the
/// requested page ordered by id.
pub async fn list_products<C: ConnectionTrait>(
    db: &C,
    filter: &ProductFilter,
    page: Page,
) -> AppResult<(u64, Vec<Product>)> {
    let mut condition = Condition::all();
    if let Some(category) = &filter.category {
        condition = condition.add(Column::Category.eq(category.clone()));
    }
    if let Some(available) = filter.available {
        condition = condition.add(Column::Available.eq(available));
    }

    let finder = Products::find().filter(condition).order_by_asc(Column::Id);
    let total = finder.clone().count(db).await?;

    let models = finder
        .offset(page.skip)
        .limit(page.limit)
        .all(db)
        .await?;
    let images = models.load_many(ProductImages, db).await?;

    let products = models
        .into_iter()
        .zip(images)
        .map(|(model, images)| Product::from_entity(model, images))
        .collect();
    Ok((total, products))
}

pub async fn update_product<C: ConnectionTrait>(
    db: &C,
    id: i32,
    patch: ProductPatch,
) -> AppResult<Product> {
    let existing = find_product_model(db, id).await?;
    if patch.is_empty() {
        let images = list_images(db, id).await?;
        return Ok(Product::from_entity(existing, images));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(price) = patch.price {
        active.price = Set(price);
    }
    if let Some(category) = patch.category {
        active.category = Set(category);
    }
    if let Some(available) = patch.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let model = active.update(db).await?;
    let images = list_images(db, id).await?;
    Ok(Product::from_entity(model, images))
}

/// Delete a product and its image rows atomically.
pub async fn delete_product<C>(db: &C, id: i32) -> AppResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    ProductImages::delete_many()
        .filter(product_images::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    let result = Products::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound("Product"));
    }

    txn.commit().await?;
    Ok(())
}
