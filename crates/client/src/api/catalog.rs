//! Category and product operations.

use std::fmt::Write;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use saleso_core::catalog::CategoryTree;
use saleso_core::{
    Category, CategoryId, NewCategory, NewProduct, Product, ProductId, ProductPage, ProductQuery,
};
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use super::{CATEGORY_TREE_KEY, SalesoClient, segment};
use crate::error::GatewayError;

/// Largest accepted product image (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// A product image ready for upload.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check the upload before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for empty, oversized or
    /// non-image content.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.bytes.is_empty() {
            return Err(GatewayError::Validation("image is empty".to_string()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(GatewayError::Validation(format!(
                "image is {} bytes; the limit is {MAX_IMAGE_BYTES}",
                self.bytes.len()
            )));
        }
        if !self.content_type.starts_with("image/") {
            return Err(GatewayError::Validation(format!(
                "unsupported content type '{}'",
                self.content_type
            )));
        }
        Ok(())
    }

    fn to_form(&self) -> Result<Form, GatewayError> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?;
        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SalesoClient {
    /// The category tree, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<CategoryTree>, GatewayError> {
        if let Some(tree) = self.inner.categories.get(CATEGORY_TREE_KEY).await {
            debug!("Cache hit for category tree");
            return Ok(tree);
        }

        let roots: Vec<Category> = self.gateway().get("/category").await?;
        let tree = Arc::new(CategoryTree::new(roots));
        self.inner
            .categories
            .insert(CATEGORY_TREE_KEY, Arc::clone(&tree))
            .await;

        Ok(tree)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for a blank name, or the request
    /// error.
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, GatewayError> {
        if category.name.trim().is_empty() {
            return Err(GatewayError::Validation("category name is required".to_string()));
        }

        let created = self.gateway().post("/category", category).await?;
        self.invalidate_categories().await;
        Ok(created)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), GatewayError> {
        let path = format!("/category/{}", segment(id.as_str()));
        let _: IgnoredAny = self.gateway().delete(&path).await?;
        self.invalidate_categories().await;
        Ok(())
    }

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, GatewayError> {
        self.gateway().get(&products_path(query)).await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, GatewayError> {
        self.gateway()
            .get(&format!("/product/{}", segment(id.as_str())))
            .await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for a blank name, or the request
    /// error.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, GatewayError> {
        validate_product(product)?;
        self.gateway().post("/product", product).await
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for a blank name, or the request
    /// error.
    #[instrument(skip(self, product), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        product: &NewProduct,
    ) -> Result<Product, GatewayError> {
        validate_product(product)?;
        self.gateway()
            .put(&format!("/product/{}", segment(id.as_str())), product)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), GatewayError> {
        let path = format!("/product/{}", segment(id.as_str()));
        let _: IgnoredAny = self.gateway().delete(&path).await?;
        Ok(())
    }

    /// Upload an image for a product and return the updated product.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the image fails
    /// [`ImageUpload::validate`], or the request error.
    #[instrument(skip(self, image), fields(product_id = %id, image = ?image))]
    pub async fn upload_product_image(
        &self,
        id: &ProductId,
        image: &ImageUpload,
    ) -> Result<Product, GatewayError> {
        image.validate()?;
        let path = format!("/product/{}/image", segment(id.as_str()));
        self.gateway()
            .send_multipart(&path, || image.to_form())
            .await
    }
}

fn products_path(query: &ProductQuery) -> String {
    let mut path = format!("/product?page={}&limit={}", query.page.max(1), query.limit.max(1));
    if let Some(category) = &query.category {
        let _ = write!(path, "&category={}", segment(category.as_str()));
    }
    path
}

fn validate_product(product: &NewProduct) -> Result<(), GatewayError> {
    if product.name.trim().is_empty() {
        return Err(GatewayError::Validation("product name is required".to_string()));
    }
    Ok(())
}
