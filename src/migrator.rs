//! Embedded schema migrations, applied at startup when `auto_migrate` is set.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_items_table::Migration),
            Box::new(m20250301_000002_create_rfid_tags_table::Migration),
            Box::new(m20250301_000003_create_tag_movements_table::Migration),
        ]
    }
}

mod m20250301_000001_create_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Items::ItemCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Items::ItemName).string().not_null())
                        .col(ColumnDef::new(Items::Description).string().null())
                        .col(ColumnDef::new(Items::Category).string().null())
                        .col(ColumnDef::new(Items::UnitPrice).decimal().null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_created_at")
                        .table(Items::Table)
                        .col(Items::CreatedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        ItemCode,
        ItemName,
        Description,
        Category,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_rfid_tags_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_rfid_tags_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RfidTags::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RfidTags::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(RfidTags::TagUid)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(RfidTags::ItemCode).string().not_null())
                        .col(ColumnDef::new(RfidTags::BatchNo).string().null())
                        .col(ColumnDef::new(RfidTags::ExpiryDate).date().null())
                        .col(ColumnDef::new(RfidTags::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rfid_tags_item_code")
                        .table(RfidTags::Table)
                        .col(RfidTags::ItemCode)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RfidTags::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RfidTags {
        Table,
        Id,
        TagUid,
        ItemCode,
        BatchNo,
        ExpiryDate,
        CreatedAt,
    }
}

mod m20250301_000003_create_tag_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_tag_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Append-only ledger: big-integer auto-increment id doubles as the
            // ordering tiebreaker for movements in the same timestamp.
            manager
                .create_table(
                    Table::create()
                        .table(TagMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TagMovements::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TagMovements::TagUid).string().not_null())
                        .col(ColumnDef::new(TagMovements::FromLocation).string().null())
                        .col(
                            ColumnDef::new(TagMovements::ToLocation)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TagMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TagMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(TagMovements::MovementTime)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tag_movements_tag_uid_time")
                        .table(TagMovements::Table)
                        .col(TagMovements::TagUid)
                        .col(TagMovements::MovementTime)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TagMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TagMovements {
        Table,
        Id,
        TagUid,
        FromLocation,
        ToLocation,
        MovementType,
        Quantity,
        MovementTime,
    }
}
