//! sea-orm entity definitions for the warehouse schema.

pub mod item;
pub mod rfid_tag;
pub mod tag_movement;
