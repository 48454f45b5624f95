// core/src/catalog.rs

//! Products and categories.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{StoreError, StoreResult};
use crate::model::{money, Category, CategoryId, NewCategory, NewProduct, Product, ProductId};
use crate::store::Storefront;

pub struct CatalogService {
  store: Arc<dyn Storefront>,
}

impl CatalogService {
  pub fn new<S: Storefront + 'static>(store: Arc<S>) -> Self {
    Self { store }
  }

  pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
    self.store.list_products().await
  }

  pub async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
    self
      .store
      .find_product(id)
      .await?
      .ok_or_else(|| StoreError::not_found("Product", id))
  }

  pub async fn products_in_category(&self, category_id: CategoryId) -> StoreResult<Vec<Product>> {
    self.get_category(category_id).await?;
    self.store.products_in_category(category_id).await
  }

  pub async fn search_products(&self, name: &str) -> StoreResult<Vec<Product>> {
    self.store.search_products(name.trim()).await
  }

  #[instrument(name = "catalog::create_product", skip(self, product), fields(name = %product.name), err(Display))]
  pub async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
    let product = self.validate_product(product).await?;
    let created = self.store.insert_product(product).await?;
    info!(product_id = created.id, "Product created.");
    Ok(created)
  }

  /// Replaces a product's editable fields. Existing order lines keep their own prices.
  #[instrument(name = "catalog::update_product", skip(self, changes), err(Display))]
  pub async fn update_product(&self, id: ProductId, changes: NewProduct) -> StoreResult<Product> {
    let changes = self.validate_product(changes).await?;
    let updated = self
      .store
      .update_product(id, changes)
      .await?
      .ok_or_else(|| StoreError::not_found("Product", id))?;
    info!(product_id = id, "Product updated.");
    Ok(updated)
  }

  /// Deleting an unknown product is a no-op; deleting an ordered one is a conflict.
  #[instrument(name = "catalog::delete_product", skip(self), err(Display))]
  pub async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
    if !self.store.delete_product(id).await? {
      warn!(product_id = id, "Delete requested for a product that does not exist.");
    }
    Ok(())
  }

  pub async fn list_categories(&self) -> StoreResult<Vec<Category>> {
    self.store.list_categories().await
  }

  pub async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
    self
      .store
      .find_category(id)
      .await?
      .ok_or_else(|| StoreError::not_found("Category", id))
  }

  #[instrument(name = "catalog::create_category", skip(self, category), fields(name = %category.name), err(Display))]
  pub async fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
    let name = category.name.trim().to_string();
    if name.is_empty() {
      return Err(StoreError::Validation("Category name is required.".to_string()));
    }
    if self.store.find_category_by_name(&name).await?.is_some() {
      return Err(StoreError::DuplicateCategory(name));
    }
    let created = self
      .store
      .insert_category(NewCategory {
        name,
        description: category.description,
      })
      .await?;
    info!(category_id = created.id, "Category created.");
    Ok(created)
  }

  pub async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
    if !self.store.delete_category(id).await? {
      warn!(category_id = id, "Delete requested for a category that does not exist.");
    }
    Ok(())
  }

  async fn validate_product(&self, product: NewProduct) -> StoreResult<NewProduct> {
    let name = product.name.trim().to_string();
    if name.is_empty() {
      return Err(StoreError::Validation("Product name is required.".to_string()));
    }
    if product.stock < 0 {
      return Err(StoreError::Validation(format!(
        "Stock cannot be negative, got {}.",
        product.stock
      )));
    }
    let price = money::normalize_price(product.price)?;
    if let Some(category_id) = product.category_id {
      self.get_category(category_id).await?;
    }
    Ok(NewProduct {
      name,
      price,
      ..product
    })
  }
}
