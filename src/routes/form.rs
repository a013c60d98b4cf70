use std::{collections::HashMap, str::FromStr};

use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

use crate::error::{AppError, AppResult};

/// Text fields of a form body, sent either as `multipart/form-data` or
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Default, Clone)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn take(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn required(&mut self, name: &str) -> AppResult<String> {
        self.take(name)
            .ok_or_else(|| AppError::Validation(format!("Field '{name}' is required")))
    }

    /// Parse an optional field; an absent field is `Ok(None)`.
    pub fn parse<T: FromStr>(&mut self, name: &str) -> AppResult<Option<T>> {
        match self.take(name) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Field '{name}' has an invalid value"))),
            None => Ok(None),
        }
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // A bare request without a body carries no fields at all.
        let Some(content_type) = content_type else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|err| AppError::Validation(err.body_text()))?;
            if body.is_empty() {
                return Ok(Self::default());
            }
            return Err(AppError::Validation(
                "Form requests must have `Content-Type: application/x-www-form-urlencoded` \
                 or `multipart/form-data`"
                    .into(),
            ));
        };

        if !content_type.starts_with("multipart/form-data") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|err| AppError::Validation(err.body_text()))?;
            return Ok(Self(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|err| AppError::Validation(err.body_text()))?;
        let mut fields = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::Validation(format!("Invalid multipart request: {err}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field
                .text()
                .await
                .map_err(|err| AppError::Validation(format!("Invalid field '{name}': {err}")))?;
            fields.insert(name, value);
        }
        Ok(Self(fields))
    }
}
