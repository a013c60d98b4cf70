#![allow(dead_code)]

use std::{io::Cursor, sync::Arc};

use axum::body::Bytes;
use axum_catalog_api::{
    assets::AssetStore,
    config::{AuthConfig, MediaConfig},
    entity::{ProductImages, Products},
    middleware::auth::AuthUser,
    services::{auth_service::AccessGate, catalog_service::ImageUpload},
    state::AppState,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use jsonwebtoken::Algorithm;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const JWT_SECRET: &str = "test-secret";

pub struct TestContext {
    pub state: AppState,
    pub media: TempDir,
    _db_dir: TempDir,
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JWT_SECRET.to_string(),
        jwt_algorithm: Algorithm::HS256,
        access_token_expire_minutes: 30,
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        admin_password_hash: None,
    }
}

pub fn media_config(root: &std::path::Path) -> MediaConfig {
    MediaConfig {
        root: root.to_path_buf(),
        ..MediaConfig::default()
    }
}

// SQLite on a temp file stands in for Postgres; the schema comes from the
// entity definitions, including the cascading foreign key.
pub async fn setup() -> anyhow::Result<TestContext> {
    let db_dir = tempfile::tempdir()?;
    let media = tempfile::tempdir()?;

    let url = format!(
        "sqlite://{}?mode=rwc",
        db_dir.path().join("catalog.db").display()
    );
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).sqlx_logging(false);
    let orm = Database::connect(options).await?;
    create_schema(&orm).await?;

    let state = AppState {
        orm,
        assets: Arc::new(AssetStore::new(media_config(media.path()))),
        gate: Arc::new(AccessGate::new(&auth_config())),
    };

    Ok(TestContext {
        state,
        media,
        _db_dir: db_dir,
    })
}

async fn create_schema(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = orm.get_database_backend();
    let schema = Schema::new(backend);
    orm.execute(backend.build(&schema.create_table_from_entity(Products)))
        .await?;
    orm.execute(backend.build(&schema.create_table_from_entity(ProductImages)))
        .await?;
    Ok(())
}

pub fn admin() -> AuthUser {
    AuthUser {
        email: ADMIN_EMAIL.to_string(),
        role: "admin".to_string(),
    }
}

pub fn viewer() -> AuthUser {
    AuthUser {
        email: ADMIN_EMAIL.to_string(),
        role: "viewer".to_string(),
    }
}

pub fn png_bytes(width: u32, height: u32, with_alpha: bool) -> Vec<u8> {
    let img = if with_alpha {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 0])))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 10])))
    };
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png fixture");
    buffer
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("encode jpeg fixture");
    buffer
}

pub fn upload(filename: &str, data: Vec<u8>) -> ImageUpload {
    ImageUpload {
        filename: filename.to_string(),
        data: Bytes::from(data),
    }
}

pub fn files_in(dir: &std::path::Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
