use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        item, rfid_tag,
        tag_movement::{self, MOVEMENT_TYPE_MOVE, MOVEMENT_TYPE_RECEIVING},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::CatalogService,
};

/// Current location of a tag, derived from its movement history.
///
/// The history must be ordered newest-first; the derived location is the
/// destination of the latest movement, or `None` for a tag that has never
/// been received. Location is never stored as mutable state anywhere else, so
/// this function cannot disagree with the audit trail.
pub fn derive_current_location(history: &[tag_movement::Model]) -> Option<&str> {
    history.first().map(|movement| movement.to_location.as_str())
}

#[derive(Debug, Clone)]
pub struct RegisterTagInput {
    pub tag_uid: String,
    pub item_code: String,
    pub batch_no: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Tag enriched with item metadata and its derived location, as returned by
/// item-code search.
#[derive(Debug, Clone, Serialize)]
pub struct TagWithLocation {
    #[serde(flatten)]
    pub tag: rfid_tag::Model,
    pub item_name: String,
    pub category: Option<String>,
    pub current_location: Option<String>,
}

/// Full answer to "where is this tag": the tag row, its item, the derived
/// location, and the complete movement history newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct TagLocation {
    pub tag: rfid_tag::Model,
    pub item: item::Model,
    pub current_location: Option<String>,
    pub movement_history: Vec<tag_movement::Model>,
}

/// Tag registry and append-only movement ledger.
///
/// Every write path validates referential integrity first and executes inside
/// one transaction, so a precondition failure leaves no partial rows. The
/// read-latest-then-append sequence of `receive` and `move_tag` runs under a
/// per-`tag_uid` mutex; operations on different tags proceed in parallel.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    catalog: Arc<CatalogService>,
    event_sender: EventSender,
    // Lock entries are created on first use and kept for the process lifetime
    // (bounded by tag cardinality).
    tag_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl LedgerService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: Arc<CatalogService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            catalog,
            event_sender,
            tag_locks: Arc::new(DashMap::new()),
        }
    }

    fn tag_lock(&self, tag_uid: &str) -> Arc<Mutex<()>> {
        self.tag_locks
            .entry(tag_uid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Registers an RFID tag against an existing catalog item. The tag starts
    /// with no location; it acquires one on first `receive`.
    #[instrument(skip(self, input), fields(tag_uid = %input.tag_uid, item_code = %input.item_code))]
    pub async fn register_tag(&self, input: RegisterTagInput) -> Result<Uuid, ServiceError> {
        if input.tag_uid.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "tag_uid must not be empty".into(),
            ));
        }

        // Referential integrity against the catalog before any write.
        self.catalog.get_item(&input.item_code).await?;

        let txn = self.db.begin().await?;

        let existing = rfid_tag::Entity::find()
            .filter(rfid_tag::Column::TagUid.eq(input.tag_uid.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "tag_uid {} is already registered",
                input.tag_uid
            )));
        }

        let model = rfid_tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            tag_uid: Set(input.tag_uid.clone()),
            item_code: Set(input.item_code.clone()),
            batch_no: Set(input.batch_no),
            expiry_date: Set(input.expiry_date),
            created_at: Set(Utc::now()),
        };
        let inserted = model.insert(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::TagRegistered {
                tag_id: inserted.id,
                tag_uid: input.tag_uid,
                item_code: input.item_code,
            })
            .await
        {
            warn!("failed to publish TagRegistered event: {}", e);
        }

        Ok(inserted.id)
    }

    /// Records a tag entering the warehouse. Receiving always restarts the
    /// movement chain: `from_location` is NULL regardless of prior history.
    #[instrument(skip(self))]
    pub async fn receive(
        &self,
        tag_uid: &str,
        to_location: &str,
        quantity: i32,
    ) -> Result<i64, ServiceError> {
        if to_location.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "to_location must not be empty".into(),
            ));
        }

        let lock = self.tag_lock(tag_uid);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        self.ensure_tag_exists(&txn, tag_uid).await?;

        let movement = tag_movement::ActiveModel {
            tag_uid: Set(tag_uid.to_string()),
            from_location: Set(None),
            to_location: Set(to_location.to_string()),
            movement_type: Set(MOVEMENT_TYPE_RECEIVING.to_string()),
            quantity: Set(quantity),
            movement_time: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = movement.insert(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::ItemReceived {
                movement_id: inserted.id,
                tag_uid: tag_uid.to_string(),
                to_location: to_location.to_string(),
                quantity,
            })
            .await
        {
            warn!("failed to publish ItemReceived event: {}", e);
        }

        Ok(inserted.id)
    }

    /// Appends a movement for a tag. `from_location` is derived from the
    /// latest prior event (NULL if the tag was never received);
    /// `movement_type` defaults to MOVE.
    #[instrument(skip(self))]
    pub async fn move_tag(
        &self,
        tag_uid: &str,
        to_location: &str,
        movement_type: Option<&str>,
        quantity: i32,
    ) -> Result<i64, ServiceError> {
        if to_location.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "to_location must not be empty".into(),
            ));
        }

        let lock = self.tag_lock(tag_uid);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        self.ensure_tag_exists(&txn, tag_uid).await?;

        // Continuity of the chain: from = current derived location.
        let from_location = Self::latest_movement(&txn, tag_uid)
            .await?
            .map(|movement| movement.to_location);

        let movement = tag_movement::ActiveModel {
            tag_uid: Set(tag_uid.to_string()),
            from_location: Set(from_location.clone()),
            to_location: Set(to_location.to_string()),
            movement_type: Set(movement_type.unwrap_or(MOVEMENT_TYPE_MOVE).to_string()),
            quantity: Set(quantity),
            movement_time: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = movement.insert(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::ItemMoved {
                movement_id: inserted.id,
                tag_uid: tag_uid.to_string(),
                from_location,
                to_location: to_location.to_string(),
                quantity,
            })
            .await
        {
            warn!("failed to publish ItemMoved event: {}", e);
        }

        Ok(inserted.id)
    }

    /// Derives the current location of a tag, or `None` when it has no
    /// movements yet. Does not check that the tag exists.
    #[instrument(skip(self))]
    pub async fn current_location(&self, tag_uid: &str) -> Result<Option<String>, ServiceError> {
        Ok(Self::latest_movement(&*self.db, tag_uid)
            .await?
            .map(|movement| movement.to_location))
    }

    /// Returns the tag, its item metadata, the derived current location, and
    /// the complete movement history newest-first.
    #[instrument(skip(self))]
    pub async fn locate(&self, tag_uid: &str) -> Result<TagLocation, ServiceError> {
        let (tag, item) = rfid_tag::Entity::find()
            .filter(rfid_tag::Column::TagUid.eq(tag_uid))
            .find_also_related(item::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFID tag {} not found", tag_uid)))?;

        let item = item.ok_or_else(|| {
            ServiceError::InternalError(format!("catalog item missing for tag {}", tag_uid))
        })?;

        let movement_history = tag_movement::Entity::find()
            .filter(tag_movement::Column::TagUid.eq(tag_uid))
            .order_by_desc(tag_movement::Column::MovementTime)
            .order_by_desc(tag_movement::Column::Id)
            .all(&*self.db)
            .await?;

        let current_location =
            derive_current_location(&movement_history).map(|location| location.to_string());

        Ok(TagLocation {
            tag,
            item,
            current_location,
            movement_history,
        })
    }

    /// Every tag bound to an item, each with item metadata and its derived
    /// location. An unknown `item_code` yields NotFound.
    #[instrument(skip(self))]
    pub async fn search_by_item(
        &self,
        item_code: &str,
    ) -> Result<Vec<TagWithLocation>, ServiceError> {
        let item = self.catalog.get_item(item_code).await?;

        let tags = rfid_tag::Entity::find()
            .filter(rfid_tag::Column::ItemCode.eq(item_code))
            .order_by_asc(rfid_tag::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut results = Vec::with_capacity(tags.len());
        for tag in tags {
            let current_location = self.current_location(&tag.tag_uid).await?;
            results.push(TagWithLocation {
                tag,
                item_name: item.item_name.clone(),
                category: item.category.clone(),
                current_location,
            });
        }

        Ok(results)
    }

    /// Lists every registered tag.
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<rfid_tag::Model>, ServiceError> {
        Ok(rfid_tag::Entity::find()
            .order_by_asc(rfid_tag::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn ensure_tag_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        tag_uid: &str,
    ) -> Result<rfid_tag::Model, ServiceError> {
        rfid_tag::Entity::find()
            .filter(rfid_tag::Column::TagUid.eq(tag_uid))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFID tag {} not found", tag_uid)))
    }

    async fn latest_movement<C: ConnectionTrait>(
        conn: &C,
        tag_uid: &str,
    ) -> Result<Option<tag_movement::Model>, ServiceError> {
        Ok(tag_movement::Entity::find()
            .filter(tag_movement::Column::TagUid.eq(tag_uid))
            .order_by_desc(tag_movement::Column::MovementTime)
            .order_by_desc(tag_movement::Column::Id)
            .one(conn)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movement(id: i64, to: &str, minute: u32) -> tag_movement::Model {
        tag_movement::Model {
            id,
            tag_uid: "RF001".into(),
            from_location: None,
            to_location: to.into(),
            movement_type: MOVEMENT_TYPE_MOVE.into(),
            quantity: 1,
            movement_time: Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn empty_history_has_no_location() {
        assert_eq!(derive_current_location(&[]), None);
    }

    #[test]
    fn latest_movement_wins() {
        let history = vec![movement(3, "ZONE-B", 30), movement(2, "REC-01", 10)];
        assert_eq!(derive_current_location(&history), Some("ZONE-B"));
    }

    #[test]
    fn single_receiving_sets_location() {
        let history = vec![tag_movement::Model {
            movement_type: MOVEMENT_TYPE_RECEIVING.into(),
            ..movement(1, "REC-01", 0)
        }];
        assert_eq!(derive_current_location(&history), Some("REC-01"));
    }
}
