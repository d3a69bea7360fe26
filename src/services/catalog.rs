use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::item,
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub item_code: String,
    pub item_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// Registry of catalog item definitions. Items are created once and read many
/// times; there is no update or delete path.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a catalog item. Fails with a Conflict when the `item_code` is
    /// already taken; required-field validation happens before any storage
    /// access.
    #[instrument(skip(self, input), fields(item_code = %input.item_code))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<Uuid, ServiceError> {
        if input.item_code.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "item_code must not be empty".into(),
            ));
        }
        if input.item_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "item_name must not be empty".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let existing = item::Entity::find()
            .filter(item::Column::ItemCode.eq(input.item_code.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "item_code {} already exists",
                input.item_code
            )));
        }

        let now = Utc::now();
        let model = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set(input.item_code.clone()),
            item_name: Set(input.item_name),
            description: Set(input.description),
            category: Set(input.category),
            unit_price: Set(input.unit_price),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(&txn).await?;

        txn.commit().await?;

        // The row is committed; a dead event channel must not fail the request.
        if let Err(e) = self
            .event_sender
            .send(Event::ItemCreated {
                item_id: inserted.id,
                item_code: input.item_code,
            })
            .await
        {
            warn!("failed to publish ItemCreated event: {}", e);
        }

        Ok(inserted.id)
    }

    /// Looks up an item by its business key.
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_code: &str) -> Result<item::Model, ServiceError> {
        item::Entity::find()
            .filter(item::Column::ItemCode.eq(item_code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_code)))
    }

    /// Lists all items, most recently created first.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<item::Model>, ServiceError> {
        Ok(item::Entity::find()
            .order_by_desc(item::Column::CreatedAt)
            .order_by_desc(item::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
