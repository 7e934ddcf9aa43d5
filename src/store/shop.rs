//! Shop data access - items, stores, stock levels, categories

use serde::{Deserialize, Serialize};

use super::supabase::{SupabaseClient, SupabaseError};

/// Catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i32,
    pub name: String,
    pub category_id: Option<i32>,
    pub price_cents: i32,
}

/// Item fields for insertion or update (id comes from the route)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFields {
    pub name: String,
    #[serde(default)]
    pub category_id: Option<i32>,
    pub price_cents: i32,
}

/// Retail store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_id: i32,
    pub name: String,
    pub location: String,
}

/// Store fields for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub location: String,
}

/// Stock level row (composite key store_id + item_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub store_id: i32,
    pub item_id: i32,
    pub quantity: i32,
}

/// Stock level with item details (joined)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: i32,
    pub quantity: i32,
    #[serde(rename = "items")]
    pub item: Option<Item>,
}

/// Store with its stock levels (joined)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreWithStock {
    pub store_id: i32,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub stock: Vec<StockLevel>,
}

/// Item category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: i32,
    pub name: String,
}

/// Shop store operations
#[derive(Clone)]
pub struct ShopStore {
    client: SupabaseClient,
}

impl ShopStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    pub async fn get_items(&self) -> Result<Vec<Item>, SupabaseError> {
        self.client.get("items", "select=*&order=item_id").await
    }

    pub async fn get_item(&self, item_id: i32) -> Result<Option<Item>, SupabaseError> {
        let query = format!("item_id=eq.{}", item_id);
        self.client.get_one("items", &query).await
    }

    pub async fn create_item(&self, fields: ItemFields) -> Result<Item, SupabaseError> {
        self.client.insert("items", &fields).await
    }

    pub async fn update_item(
        &self,
        item_id: i32,
        fields: ItemFields,
    ) -> Result<Option<Item>, SupabaseError> {
        let query = format!("item_id=eq.{}", item_id);
        let updated: Vec<Item> = self.client.update_returning("items", &query, &fields).await?;
        Ok(updated.into_iter().next())
    }

    pub async fn delete_item(&self, item_id: i32) -> Result<bool, SupabaseError> {
        let query = format!("item_id=eq.{}", item_id);
        let deleted: Vec<Item> = self.client.delete("items", &query).await?;
        Ok(!deleted.is_empty())
    }

    // ------------------------------------------------------------------
    // Stores
    // ------------------------------------------------------------------

    pub async fn get_stores(&self) -> Result<Vec<StoreRecord>, SupabaseError> {
        self.client.get("stores", "select=*&order=store_id").await
    }

    /// Fetch a store together with its stock levels and their item details
    pub async fn get_store_with_stock(
        &self,
        store_id: i32,
    ) -> Result<Option<StoreWithStock>, SupabaseError> {
        let query = format!(
            "store_id=eq.{}&select=*,stock(item_id,quantity,items(item_id,name,category_id,price_cents))",
            store_id
        );
        self.client.get_one("stores", &query).await
    }

    pub async fn create_store(&self, fields: NewStore) -> Result<StoreRecord, SupabaseError> {
        self.client.insert("stores", &fields).await
    }

    pub async fn update_store(
        &self,
        store: StoreRecord,
    ) -> Result<Option<StoreRecord>, SupabaseError> {
        let query = format!("store_id=eq.{}", store.store_id);
        let fields = NewStore {
            name: store.name,
            location: store.location,
        };
        let updated: Vec<StoreRecord> = self
            .client
            .update_returning("stores", &query, &fields)
            .await?;
        Ok(updated.into_iter().next())
    }

    pub async fn delete_store(&self, store_id: i32) -> Result<bool, SupabaseError> {
        let query = format!("store_id=eq.{}", store_id);
        let deleted: Vec<StoreRecord> = self.client.delete("stores", &query).await?;
        Ok(!deleted.is_empty())
    }

    // ------------------------------------------------------------------
    // Stock
    // ------------------------------------------------------------------

    /// Stock levels for one store, with item details
    pub async fn stock_for_store(&self, store_id: i32) -> Result<Vec<StockLevel>, SupabaseError> {
        let query = format!(
            "store_id=eq.{}&select=item_id,quantity,items(item_id,name,category_id,price_cents)&order=item_id",
            store_id
        );
        self.client.get("stock", &query).await
    }

    pub async fn create_stock(&self, record: StockRecord) -> Result<StockRecord, SupabaseError> {
        self.client.insert("stock", &record).await
    }

    pub async fn update_stock(
        &self,
        record: StockRecord,
    ) -> Result<Option<StockRecord>, SupabaseError> {
        #[derive(Serialize)]
        struct QuantityUpdate {
            quantity: i32,
        }

        let query = format!(
            "store_id=eq.{}&item_id=eq.{}",
            record.store_id, record.item_id
        );
        let updated: Vec<StockRecord> = self
            .client
            .update_returning(
                "stock",
                &query,
                &QuantityUpdate {
                    quantity: record.quantity,
                },
            )
            .await?;
        Ok(updated.into_iter().next())
    }

    pub async fn delete_stock(&self, store_id: i32, item_id: i32) -> Result<bool, SupabaseError> {
        let query = format!("store_id=eq.{}&item_id=eq.{}", store_id, item_id);
        let deleted: Vec<StockRecord> = self.client.delete("stock", &query).await?;
        Ok(!deleted.is_empty())
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn get_categories(&self) -> Result<Vec<Category>, SupabaseError> {
        self.client
            .get("categories", "select=*&order=category_id")
            .await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, SupabaseError> {
        #[derive(Serialize)]
        struct NewCategory<'a> {
            name: &'a str,
        }

        self.client
            .insert("categories", &NewCategory { name })
            .await
    }

    pub async fn update_category(
        &self,
        category: Category,
    ) -> Result<Option<Category>, SupabaseError> {
        #[derive(Serialize)]
        struct CategoryUpdate {
            name: String,
        }

        let query = format!("category_id=eq.{}", category.category_id);
        let updated: Vec<Category> = self
            .client
            .update_returning(
                "categories",
                &query,
                &CategoryUpdate {
                    name: category.name,
                },
            )
            .await?;
        Ok(updated.into_iter().next())
    }

    pub async fn delete_category(&self, category_id: i32) -> Result<bool, SupabaseError> {
        let query = format!("category_id=eq.{}", category_id);
        let deleted: Vec<Category> = self.client.delete("categories", &query).await?;
        Ok(!deleted.is_empty())
    }
}
