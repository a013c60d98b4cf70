use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{product_images, products};

/// A catalog product as exposed by the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "disponible")]
    pub available: i32,
    #[serde(rename = "creado_por")]
    pub created_by: Option<String>,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fecha_actualizacion")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "imagenes")]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: i32,
    #[serde(rename = "producto_id")]
    pub product_id: i32,
    #[serde(rename = "url_imagen")]
    pub url: String,
    #[serde(rename = "orden")]
    pub order: i32,
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: DateTime<Utc>,
}

impl Product {
    /// Build the API view of a product; images are sorted by display order.
    pub fn from_entity(model: products::Model, images: Vec<product_images::Model>) -> Self {
        let mut images: Vec<ProductImage> = images.into_iter().map(ProductImage::from).collect();
        images.sort_by_key(|image| (image.order, image.id));

        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            available: model.available,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            images,
        }
    }
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            url: model.url,
            order: model.sort_order,
            uploaded_at: model.uploaded_at.with_timezone(&Utc),
        }
    }
}
