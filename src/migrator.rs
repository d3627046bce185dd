use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_batches_table::Migration),
            Box::new(m20240301_000003_create_stocks_table::Migration),
            Box::new(m20240301_000004_create_stock_movement_tables::Migration),
            Box::new(m20240301_000005_create_reorder_policies_table::Migration),
            Box::new(m20240301_000006_create_inventory_alerts_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(ColumnDef::new(Products::UnitOfMeasure).string().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::WhType).string().null())
                        .col(
                            ColumnDef::new(Warehouses::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Sku,
        Name,
        Category,
        UnitOfMeasure,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Warehouses {
        Table,
        Id,
        Name,
        WhType,
        Active,
        CreatedAt,
    }
}

mod m20240301_000002_create_batches_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Batches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Batches::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Batches::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Batches::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(Batches::BatchNumber).string().not_null())
                        .col(
                            ColumnDef::new(Batches::Quantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Batches::ManufactureDate).date().null())
                        .col(ColumnDef::new(Batches::ExpiryDate).date().null())
                        .col(ColumnDef::new(Batches::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // Batch numbers are unique within a (product, warehouse) pair
            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_product_warehouse_number")
                        .table(Batches::Table)
                        .col(Batches::ProductId)
                        .col(Batches::WarehouseId)
                        .col(Batches::BatchNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_product_warehouse")
                        .table(Batches::Table)
                        .col(Batches::ProductId)
                        .col(Batches::WarehouseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_expiry_date")
                        .table(Batches::Table)
                        .col(Batches::ExpiryDate)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Batches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Batches {
        Table,
        Id,
        ProductId,
        WarehouseId,
        BatchNumber,
        Quantity,
        ManufactureDate,
        ExpiryDate,
        CreatedAt,
    }
}

mod m20240301_000003_create_stocks_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stocks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Stocks::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Stocks::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Stocks::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(Stocks::QuantityOnHand)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Stocks::Status).string().not_null())
                        .col(ColumnDef::new(Stocks::LastUpdated).timestamp().not_null())
                        .col(ColumnDef::new(Stocks::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // One aggregate row per (product, warehouse); absence means zero
            manager
                .create_index(
                    Index::create()
                        .name("idx_stocks_product_warehouse")
                        .table(Stocks::Table)
                        .col(Stocks::ProductId)
                        .col(Stocks::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stocks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Stocks {
        Table,
        Id,
        ProductId,
        WarehouseId,
        QuantityOnHand,
        Status,
        LastUpdated,
        CreatedAt,
    }
}

mod m20240301_000004_create_stock_movement_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_stock_movement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::TotalQuantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ReferenceNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::Notes).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovementBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovementBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovementBatches::StockMovementId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovementBatches::BatchId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovementBatches::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovementBatches::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movement_batches_movement")
                        .table(StockMovementBatches::Table)
                        .col(StockMovementBatches::StockMovementId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movement_batches_batch")
                        .table(StockMovementBatches::Table)
                        .col(StockMovementBatches::BatchId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovementBatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMovements {
        Table,
        Id,
        MovementType,
        TotalQuantity,
        ReferenceNumber,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMovementBatches {
        Table,
        Id,
        StockMovementId,
        BatchId,
        Quantity,
        CreatedAt,
    }
}

mod m20240301_000005_create_reorder_policies_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_reorder_policies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReorderPolicies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReorderPolicies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReorderPolicies::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ReorderPolicies::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::MinStockLevel)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::ReorderQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::LeadTimeDays)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::SafetyStock)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::RetrievalMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(ReorderPolicies::CreatedBy).string().null())
                        .col(ColumnDef::new(ReorderPolicies::UpdatedBy).string().null())
                        .col(
                            ColumnDef::new(ReorderPolicies::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderPolicies::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reorder_policies_product_warehouse")
                        .table(ReorderPolicies::Table)
                        .col(ReorderPolicies::ProductId)
                        .col(ReorderPolicies::WarehouseId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReorderPolicies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ReorderPolicies {
        Table,
        Id,
        ProductId,
        WarehouseId,
        MinStockLevel,
        ReorderQuantity,
        LeadTimeDays,
        SafetyStock,
        RetrievalMethod,
        IsActive,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_inventory_alerts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_inventory_alerts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryAlerts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryAlerts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryAlerts::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryAlerts::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAlerts::ReorderPolicyId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAlerts::AlertType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryAlerts::Status).string().not_null())
                        .col(
                            ColumnDef::new(InventoryAlerts::CurrentQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryAlerts::TriggeredBy)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryAlerts::Message).string().not_null())
                        .col(
                            ColumnDef::new(InventoryAlerts::AcknowledgedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryAlerts::AcknowledgedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryAlerts::ResolvedBy).string().null())
                        .col(ColumnDef::new(InventoryAlerts::ResolvedAt).timestamp().null())
                        .col(
                            ColumnDef::new(InventoryAlerts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_alerts_pair_type_status")
                        .table(InventoryAlerts::Table)
                        .col(InventoryAlerts::ProductId)
                        .col(InventoryAlerts::WarehouseId)
                        .col(InventoryAlerts::AlertType)
                        .col(InventoryAlerts::Status)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryAlerts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryAlerts {
        Table,
        Id,
        ProductId,
        WarehouseId,
        ReorderPolicyId,
        AlertType,
        Status,
        CurrentQuantity,
        TriggeredBy,
        Message,
        AcknowledgedBy,
        AcknowledgedAt,
        ResolvedBy,
        ResolvedAt,
        CreatedAt,
    }
}
