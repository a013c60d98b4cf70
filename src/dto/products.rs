use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Product,
    routes::form::FormFields,
};

pub const NAME_MAX_CHARS: usize = 200;
pub const CATEGORY_MAX_CHARS: usize = 100;

/// Form body accepted by `POST /productos/`.
#[allow(dead_code)]
#[derive(Debug, ToSchema)]
pub struct CreateProductForm {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: f64,
    pub categoria: String,
    pub disponible: Option<i32>,
}

/// Form body accepted by `PUT /productos/{id}`; every field is optional.
#[allow(dead_code)]
#[derive(Debug, ToSchema)]
pub struct UpdateProductForm {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
    pub categoria: Option<String>,
    pub disponible: Option<i32>,
}

/// Multipart body accepted by `POST /productos/{id}/imagenes`.
#[allow(dead_code)]
#[derive(Debug, ToSchema)]
pub struct UploadImagesForm {
    #[schema(value_type = Vec<String>)]
    pub imagenes: Vec<Vec<u8>>,
}

/// Validated fields of a product about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub available: i32,
}

impl NewProduct {
    pub fn validate(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_category(&self.category)?;
        validate_available(self.available)
    }
}

impl TryFrom<FormFields> for NewProduct {
    type Error = AppError;

    fn try_from(mut form: FormFields) -> AppResult<Self> {
        let product = NewProduct {
            name: form.required("nombre")?,
            description: form.take("descripcion").filter(|d| !d.trim().is_empty()),
            price: form
                .parse::<f64>("precio")?
                .ok_or_else(|| AppError::Validation("Field 'precio' is required".into()))?,
            category: form.required("categoria")?,
            available: form.parse::<i32>("disponible")?.unwrap_or(1),
        };
        product.validate()?;
        Ok(product)
    }
}

/// Partial update of a product. `None` leaves the stored value untouched.
///
/// `description` distinguishes "not sent" (`None`) from "cleared"
/// (`Some(None)`), which is what an empty `descripcion` field means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub available: Option<i32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.available.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(available) = self.available {
            validate_available(available)?;
        }
        Ok(())
    }
}

impl TryFrom<FormFields> for ProductPatch {
    type Error = AppError;

    fn try_from(mut form: FormFields) -> AppResult<Self> {
        let patch = ProductPatch {
            name: form.take("nombre"),
            description: form
                .take("descripcion")
                .map(|d| if d.trim().is_empty() { None } else { Some(d) }),
            price: form.parse::<f64>("precio")?,
            category: form.take("categoria"),
            available: form.parse::<i32>("disponible")?,
        };
        patch.validate()?;
        Ok(patch)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub total: u64,
    #[serde(rename = "productos")]
    pub products: Vec<Product>,
}

fn validate_name(name: &str) -> AppResult<()> {
    validate_text("nombre", name, NAME_MAX_CHARS)
}

fn validate_category(category: &str) -> AppResult<()> {
    validate_text("categoria", category, CATEGORY_MAX_CHARS)
}

fn validate_text(field: &str, value: &str, max_chars: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Field '{field}' must not be empty")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "Field '{field}' must be at most {max_chars} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Validation(
            "Field 'precio' must be greater than 0".into(),
        ));
    }
    Ok(())
}

fn validate_available(available: i32) -> AppResult<()> {
    if available != 0 && available != 1 {
        return Err(AppError::Validation(
            "Field 'disponible' must be 0 or 1".into(),
        ));
    }
    Ok(())
}
