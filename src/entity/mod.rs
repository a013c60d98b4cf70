pub mod product_images;
pub mod products;

pub use product_images::Entity as ProductImages;
pub use products::Entity as Products;
