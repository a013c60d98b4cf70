use axum_catalog_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::products::NewProduct,
    repository::products,
    routes::params::{Page, ProductFilter},
};
use sea_orm::DatabaseConnection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    seed_products(&orm, &config.auth.admin_email).await?;
    println!("Seed completed");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection, admin_email: &str) -> anyhow::Result<()> {
    let catalog = vec![
        ("Torta de chocolate", "Bizcocho húmedo con ganache", 25.0, "postres"),
        ("Cheesecake de fresa", "Base de galleta y coulis de fresa", 22.5, "postres"),
        ("Galletas de avena", "Docena de galletas caseras", 8.0, "galletas"),
        ("Pan de masa madre", "Fermentación lenta de 24 horas", 6.5, "panes"),
    ];

    for (name, description, price, category) in catalog {
        let filter = ProductFilter {
            category: Some(category.to_string()),
            available: None,
        };
        let (_, existing) = products::list_products(orm, &filter, Page::default()).await?;
        if existing.iter().any(|p| p.name == name) {
            continue;
        }

        let fields = NewProduct {
            name: name.to_string(),
            description: Some(description.to_string()),
            price,
            category: category.to_string(),
            available: 1,
        };
        products::create_product(orm, fields, Some(admin_email.to_string())).await?;
        println!("Seeded product {name}");
    }

    Ok(())
}
