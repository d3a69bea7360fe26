use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Movement type recorded when a tag enters the warehouse.
pub const MOVEMENT_TYPE_RECEIVING: &str = "RECEIVING";
/// Default movement type for location transfers.
pub const MOVEMENT_TYPE_MOVE: &str = "MOVE";

/// One entry in the append-only movement ledger. Rows are inserted and then
/// never touched again; the auto-increment `id` breaks ordering ties between
/// movements recorded within the same timestamp.
///
/// `from_location` is NULL for RECEIVING movements and for the first-ever
/// movement of a tag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tag_uid: String,
    pub from_location: Option<String>,
    pub to_location: String,
    pub movement_type: String,
    pub quantity: i32,
    pub movement_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rfid_tag::Entity",
        from = "Column::TagUid",
        to = "super::rfid_tag::Column::TagUid"
    )]
    RfidTag,
}

impl Related<super::rfid_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RfidTag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
