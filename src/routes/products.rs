use axum::{
    Json, Router,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    dto::products::{
        CreateProductForm, NewProduct, ProductList, ProductPatch, UpdateProductForm,
        UploadImagesForm,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ErrorBody, MessageResponse},
    routes::{form::FormFields, params::ProductQuery},
    services::catalog_service::{self, ImageUpload},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/productos", get(list_products).post(create_product))
        .route("/productos/", get(list_products).post(create_product))
        .route(
            "/productos/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/productos/{id}/imagenes", post(upload_images))
        .route("/productos/{id}/imagenes/{image_id}", delete(delete_image))
}

#[utoipa::path(
    get,
    path = "/productos/",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products with their images", body = ProductList)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> AppResult<Json<ProductList>> {
    let Query(query) = query?;
    let list = catalog_service::list_products(&state, query).await?;
    Ok(Json(list))
}

#[utoipa::path(
    get,
    path = "/productos/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = Product),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Product>> {
    let Path(id) = id?;
    let product = catalog_service::get_product(&state, id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/productos/",
    request_body(content = CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Create product", body = Product),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin privileges required", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    form: FormFields,
) -> AppResult<(StatusCode, Json<Product>)> {
    let fields = NewProduct::try_from(form)?;
    let product = catalog_service::create_product(&state, &user, fields).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/productos/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body(content = UpdateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    form: FormFields,
) -> AppResult<Json<Product>> {
    let Path(id) = id?;
    let patch = ProductPatch::try_from(form)?;
    let product = catalog_service::update_product(&state, &user, id, patch).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/productos/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product and its images deleted", body = MessageResponse),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    catalog_service::delete_product(&state, &user, id).await?;
    Ok(Json(MessageResponse::new(
        "Product deleted successfully",
        serde_json::json!({ "producto_id": id }),
    )))
}

#[utoipa::path(
    post,
    path = "/productos/{id}/imagenes",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body(content = UploadImagesForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images stored", body = MessageResponse),
        (status = 400, description = "Invalid image", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<MessageResponse>> {
    ensure_admin(&user)?;
    let Path(id) = id?;
    let mut multipart = multipart?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart request: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
        files.push(ImageUpload { filename, data });
    }

    let urls = catalog_service::upload_images(&state, &user, id, files).await?;
    Ok(Json(MessageResponse::new(
        format!("{} image(s) uploaded successfully", urls.len()),
        serde_json::json!({ "urls": urls }),
    )))
}

#[utoipa::path(
    delete,
    path = "/productos/{id}/imagenes/{image_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("image_id" = i32, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 404, description = "Image not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    ids: Result<Path<(i32, i32)>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path((id, image_id)) = ids?;
    catalog_service::delete_image(&state, &user, id, image_id).await?;
    Ok(Json(MessageResponse::new(
        "Image deleted successfully",
        serde_json::json!({ "imagen_id": image_id }),
    )))
}
