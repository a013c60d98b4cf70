use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, UserInfo},
        products::{CreateProductForm, ProductList, UpdateProductForm, UploadImagesForm},
    },
    models::{Product, ProductImage},
    response::{ErrorBody, MessageResponse},
    routes::{auth, health, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::root,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_images,
        products::delete_image,
    ),
    components(
        schemas(
            Product,
            ProductImage,
            ProductList,
            CreateProductForm,
            UpdateProductForm,
            UploadImagesForm,
            LoginRequest,
            LoginResponse,
            UserInfo,
            MessageResponse,
            ErrorBody,
            params::ProductQuery,
            health::HealthData,
            health::ServiceInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
