use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_master_tables::Migration),
            Box::new(m20250101_000002_create_procurement_tables::Migration),
            Box::new(m20250101_000003_create_inventory_tables::Migration),
            Box::new(m20250101_000004_create_billing_tables::Migration),
            Box::new(m20250101_000005_create_shop_floor_tables::Migration),
        ]
    }
}

/// Columns shared by every soft-deletable business table.
#[derive(DeriveIden)]
enum Audit {
    Status,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

fn with_audit_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(
            ColumnDef::new(Audit::Status)
                .string_len(16)
                .not_null()
                .default("active"),
        )
        .col(ColumnDef::new(Audit::CreatedBy).uuid().null())
        .col(ColumnDef::new(Audit::UpdatedBy).uuid().null())
        .col(
            ColumnDef::new(Audit::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Audit::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).decimal_len(14, 2).not_null().default(0).to_owned()
}

mod m20250101_000001_create_master_tables {
    use super::{money, with_audit_columns};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_master_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Companies::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Companies::Name).string().not_null())
                            .col(ColumnDef::new(Companies::LegalName).string().null())
                            .col(ColumnDef::new(Companies::GstNumber).string().null())
                            .col(ColumnDef::new(Companies::Email).string().null())
                            .col(ColumnDef::new(Companies::Phone).string().null())
                            .col(ColumnDef::new(Companies::Address).text().null())
                            .col(ColumnDef::new(Companies::City).string().null())
                            .col(ColumnDef::new(Companies::State).string().null())
                            .col(ColumnDef::new(Companies::Country).string().null())
                            .col(ColumnDef::new(Companies::Pincode).string().null()),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Clients::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Clients::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(Clients::ClientCode).string().not_null())
                            .col(ColumnDef::new(Clients::Name).string().not_null())
                            .col(ColumnDef::new(Clients::ContactPerson).string().null())
                            .col(ColumnDef::new(Clients::Email).string().null())
                            .col(ColumnDef::new(Clients::Phone).string().null())
                            .col(ColumnDef::new(Clients::GstNumber).string().null())
                            .col(ColumnDef::new(Clients::BillingAddress).text().null())
                            .col(ColumnDef::new(Clients::ShippingAddress).text().null())
                            .col(ColumnDef::new(Clients::CreditLimit).decimal_len(14, 2).null())
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_clients_company_id")
                                    .from(Clients::Table, Clients::CompanyId)
                                    .to(Companies::Table, Companies::Id),
                            ),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_company_id")
                        .table(Clients::Table)
                        .col(Clients::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Skus::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Skus::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Skus::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(Skus::ClientId).uuid().null())
                            .col(ColumnDef::new(Skus::SkuCode).string().not_null())
                            .col(ColumnDef::new(Skus::Name).string().not_null())
                            .col(ColumnDef::new(Skus::Description).text().null())
                            .col(ColumnDef::new(Skus::Ply).integer().not_null())
                            .col(ColumnDef::new(Skus::LengthMm).decimal_len(10, 2).not_null())
                            .col(ColumnDef::new(Skus::WidthMm).decimal_len(10, 2).not_null())
                            .col(ColumnDef::new(Skus::HeightMm).decimal_len(10, 2).not_null())
                            .col(money(Skus::UnitPrice))
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_skus_company_id")
                                    .from(Skus::Table, Skus::CompanyId)
                                    .to(Companies::Table, Companies::Id),
                            ),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Users::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Users::CompanyId).uuid().null())
                            .col(ColumnDef::new(Users::Name).string().not_null())
                            .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                            .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                            .col(ColumnDef::new(Users::Role).string_len(16).not_null()),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(IdSequences::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(IdSequences::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(IdSequences::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(IdSequences::Prefix).string_len(16).not_null())
                        .col(
                            ColumnDef::new(IdSequences::NextValue)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(IdSequences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_id_sequences_company_prefix")
                        .table(IdSequences::Table)
                        .col(IdSequences::CompanyId)
                        .col(IdSequences::Prefix)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IdSequences::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Skus::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        LegalName,
        GstNumber,
        Email,
        Phone,
        Address,
        City,
        State,
        Country,
        Pincode,
    }

    #[derive(DeriveIden)]
    pub(super) enum Clients {
        Table,
        Id,
        CompanyId,
        ClientCode,
        Name,
        ContactPerson,
        Email,
        Phone,
        GstNumber,
        BillingAddress,
        ShippingAddress,
        CreditLimit,
    }

    #[derive(DeriveIden)]
    pub(super) enum Skus {
        Table,
        Id,
        CompanyId,
        ClientId,
        SkuCode,
        Name,
        Description,
        Ply,
        LengthMm,
        WidthMm,
        HeightMm,
        UnitPrice,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        CompanyId,
        Name,
        Email,
        PasswordHash,
        Role,
    }

    #[derive(DeriveIden)]
    enum IdSequences {
        Table,
        Id,
        CompanyId,
        Prefix,
        NextValue,
        UpdatedAt,
    }
}

mod m20250101_000002_create_procurement_tables {
    use super::{money, with_audit_columns};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(PurchaseOrders::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(PurchaseOrders::Id)
                                    .uuid()
                                    .primary_key()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(PurchaseOrders::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(PurchaseOrders::PoNumber).string().not_null())
                            .col(ColumnDef::new(PurchaseOrders::SupplierName).string().not_null())
                            .col(ColumnDef::new(PurchaseOrders::PoDate).date().not_null())
                            .col(ColumnDef::new(PurchaseOrders::ExpectedDeliveryDate).date().null())
                            .col(
                                ColumnDef::new(PurchaseOrders::PoStatus)
                                    .string_len(32)
                                    .not_null()
                                    .default("open"),
                            )
                            .col(money(PurchaseOrders::TotalAmount))
                            .col(ColumnDef::new(PurchaseOrders::Notes).text().null()),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_company_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::SkuId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrderItems::Quantity).integer().not_null())
                        .col(money(PurchaseOrderItems::Rate))
                        .col(money(PurchaseOrderItems::Amount))
                        .col(
                            ColumnDef::new(PurchaseOrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_po_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Grns::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Grns::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Grns::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(Grns::PurchaseOrderId).uuid().not_null())
                            .col(ColumnDef::new(Grns::GrnNumber).string().not_null())
                            .col(ColumnDef::new(Grns::GrnDate).date().not_null())
                            .col(ColumnDef::new(Grns::ReceivedBy).string().null())
                            .col(ColumnDef::new(Grns::VehicleNumber).string().null())
                            .col(ColumnDef::new(Grns::InvoiceReference).string().null())
                            .col(ColumnDef::new(Grns::Notes).text().null())
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_grns_purchase_order_id")
                                    .from(Grns::Table, Grns::PurchaseOrderId)
                                    .to(PurchaseOrders::Table, PurchaseOrders::Id),
                            ),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GrnItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GrnItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(GrnItems::GrnId).uuid().not_null())
                        .col(ColumnDef::new(GrnItems::PurchaseOrderItemId).uuid().not_null())
                        .col(ColumnDef::new(GrnItems::SkuId).uuid().not_null())
                        .col(ColumnDef::new(GrnItems::ReceivedQuantity).integer().not_null())
                        .col(ColumnDef::new(GrnItems::AcceptedQuantity).integer().not_null())
                        .col(ColumnDef::new(GrnItems::RejectedQuantity).integer().not_null())
                        .col(
                            ColumnDef::new(GrnItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_grn_items_grn_id")
                                .from(GrnItems::Table, GrnItems::GrnId)
                                .to(Grns::Table, Grns::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_grn_items_po_item_id")
                        .table(GrnItems::Table)
                        .col(GrnItems::PurchaseOrderItemId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GrnItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Grns::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        CompanyId,
        PoNumber,
        SupplierName,
        PoDate,
        ExpectedDeliveryDate,
        PoStatus,
        TotalAmount,
        Notes,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        SkuId,
        Quantity,
        Rate,
        Amount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Grns {
        Table,
        Id,
        CompanyId,
        PurchaseOrderId,
        GrnNumber,
        GrnDate,
        ReceivedBy,
        VehicleNumber,
        InvoiceReference,
        Notes,
    }

    #[derive(DeriveIden)]
    enum GrnItems {
        Table,
        Id,
        GrnId,
        PurchaseOrderItemId,
        SkuId,
        ReceivedQuantity,
        AcceptedQuantity,
        RejectedQuantity,
        CreatedAt,
    }
}

mod m20250101_000003_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Inventory::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Inventory::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Inventory::SkuId).uuid().not_null())
                        .col(
                            ColumnDef::new(Inventory::QuantityOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Inventory::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(Expr::col(Inventory::QuantityOnHand).gte(0))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_inventory_company_sku")
                        .table(Inventory::Table)
                        .col(Inventory::CompanyId)
                        .col(Inventory::SkuId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::InventoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::BalanceAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Reason).string().not_null())
                        .col(
                            ColumnDef::new(InventoryTransactions::ReferenceType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::ReferenceId).uuid().null())
                        .col(ColumnDef::new(InventoryTransactions::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_transactions_inventory_id")
                                .from(
                                    InventoryTransactions::Table,
                                    InventoryTransactions::InventoryId,
                                )
                                .to(Inventory::Table, Inventory::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_inventory_id")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::InventoryId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventory {
        Table,
        Id,
        CompanyId,
        SkuId,
        QuantityOnHand,
        ReorderLevel,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryTransactions {
        Table,
        Id,
        InventoryId,
        QuantityChange,
        BalanceAfter,
        Reason,
        ReferenceType,
        ReferenceId,
        CreatedBy,
        CreatedAt,
    }
}

mod m20250101_000004_create_billing_tables {
    use super::{money, with_audit_columns};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_billing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(WorkOrderInvoices::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(WorkOrderInvoices::Id)
                                    .uuid()
                                    .primary_key()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(WorkOrderInvoices::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(WorkOrderInvoices::ClientId).uuid().not_null())
                            .col(
                                ColumnDef::new(WorkOrderInvoices::InvoiceNumber)
                                    .string()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(WorkOrderInvoices::InvoiceDate).date().not_null())
                            .col(ColumnDef::new(WorkOrderInvoices::DueDate).date().null())
                            .col(money(WorkOrderInvoices::SubTotal))
                            .col(
                                ColumnDef::new(WorkOrderInvoices::TaxRate)
                                    .decimal_len(5, 2)
                                    .not_null()
                                    .default(0),
                            )
                            .col(money(WorkOrderInvoices::TaxAmount))
                            .col(money(WorkOrderInvoices::TotalAmount))
                            .col(money(WorkOrderInvoices::PaidAmount))
                            .col(money(WorkOrderInvoices::CreditedAmount))
                            .col(money(WorkOrderInvoices::BalanceAmount))
                            .col(
                                ColumnDef::new(WorkOrderInvoices::PaymentStatus)
                                    .string_len(32)
                                    .not_null()
                                    .default("unpaid"),
                            )
                            .col(ColumnDef::new(WorkOrderInvoices::Notes).text().null())
                            .check(Expr::col(WorkOrderInvoices::BalanceAmount).gte(0)),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_order_invoices_client_id")
                        .table(WorkOrderInvoices::Table)
                        .col(WorkOrderInvoices::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderInvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderInvoiceItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrderInvoiceItems::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrderInvoiceItems::SkuId).uuid().null())
                        .col(
                            ColumnDef::new(WorkOrderInvoiceItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrderInvoiceItems::Quantity).integer().not_null())
                        .col(money(WorkOrderInvoiceItems::Rate))
                        .col(money(WorkOrderInvoiceItems::Amount))
                        .col(
                            ColumnDef::new(WorkOrderInvoiceItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice_id")
                                .from(WorkOrderInvoiceItems::Table, WorkOrderInvoiceItems::InvoiceId)
                                .to(WorkOrderInvoices::Table, WorkOrderInvoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(PartialPayments::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(PartialPayments::Id)
                                    .uuid()
                                    .primary_key()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(PartialPayments::InvoiceId).uuid().not_null())
                            .col(money(PartialPayments::Amount))
                            .col(ColumnDef::new(PartialPayments::PaymentDate).date().not_null())
                            .col(
                                ColumnDef::new(PartialPayments::PaymentMethod)
                                    .string_len(32)
                                    .not_null(),
                            )
                            .col(ColumnDef::new(PartialPayments::ReferenceNumber).string().null())
                            .col(ColumnDef::new(PartialPayments::Notes).text().null())
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_partial_payments_invoice_id")
                                    .from(PartialPayments::Table, PartialPayments::InvoiceId)
                                    .to(WorkOrderInvoices::Table, WorkOrderInvoices::Id),
                            ),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(CreditNotes::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(CreditNotes::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(CreditNotes::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(CreditNotes::InvoiceId).uuid().not_null())
                            .col(ColumnDef::new(CreditNotes::CreditNoteNumber).string().not_null())
                            .col(ColumnDef::new(CreditNotes::CreditDate).date().not_null())
                            .col(money(CreditNotes::Amount))
                            .col(ColumnDef::new(CreditNotes::Reason).text().null())
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_credit_notes_invoice_id")
                                    .from(CreditNotes::Table, CreditNotes::InvoiceId)
                                    .to(WorkOrderInvoices::Table, WorkOrderInvoices::Id),
                            ),
                    )
                    .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CreditNotes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartialPayments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderInvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WorkOrderInvoices {
        Table,
        Id,
        CompanyId,
        ClientId,
        InvoiceNumber,
        InvoiceDate,
        DueDate,
        SubTotal,
        TaxRate,
        TaxAmount,
        TotalAmount,
        PaidAmount,
        CreditedAmount,
        BalanceAmount,
        PaymentStatus,
        Notes,
    }

    #[derive(DeriveIden)]
    enum WorkOrderInvoiceItems {
        Table,
        Id,
        InvoiceId,
        SkuId,
        Description,
        Quantity,
        Rate,
        Amount,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PartialPayments {
        Table,
        Id,
        InvoiceId,
        Amount,
        PaymentDate,
        PaymentMethod,
        ReferenceNumber,
        Notes,
    }

    #[derive(DeriveIden)]
    enum CreditNotes {
        Table,
        Id,
        CompanyId,
        InvoiceId,
        CreditNoteNumber,
        CreditDate,
        Amount,
        Reason,
    }
}

mod m20250101_000005_create_shop_floor_tables {
    use super::with_audit_columns;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_shop_floor_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(ProcessNames::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(ProcessNames::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(ProcessNames::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(ProcessNames::ProcessName).string().not_null())
                            .col(ColumnDef::new(ProcessNames::Description).text().null()),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProcessFields::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ProcessFields::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ProcessFields::ProcessId).uuid().not_null())
                        .col(ColumnDef::new(ProcessFields::FieldKey).string_len(64).not_null())
                        .col(ColumnDef::new(ProcessFields::Label).string().not_null())
                        .col(ColumnDef::new(ProcessFields::FieldType).string_len(16).not_null())
                        .col(ColumnDef::new(ProcessFields::Options).json().null())
                        .col(
                            ColumnDef::new(ProcessFields::Required)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProcessFields::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProcessFields::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcessFields::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_process_fields_process_id")
                                .from(ProcessFields::Table, ProcessFields::ProcessId)
                                .to(ProcessNames::Table, ProcessNames::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_process_fields_process_key")
                        .table(ProcessFields::Table)
                        .col(ProcessFields::ProcessId)
                        .col(ProcessFields::FieldKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    with_audit_columns(
                        Table::create()
                            .table(Machines::Table)
                            .if_not_exists()
                            .col(ColumnDef::new(Machines::Id).uuid().primary_key().not_null())
                            .col(ColumnDef::new(Machines::CompanyId).uuid().not_null())
                            .col(ColumnDef::new(Machines::MachineName).string().not_null())
                            .col(ColumnDef::new(Machines::MachineCode).string().null())
                            .col(ColumnDef::new(Machines::MachineType).string().null())
                            .col(ColumnDef::new(Machines::Manufacturer).string().null())
                            .col(ColumnDef::new(Machines::CapacityPerHour).decimal_len(12, 2).null()),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MachineProcesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MachineProcesses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MachineProcesses::MachineId).uuid().not_null())
                        .col(ColumnDef::new(MachineProcesses::ProcessId).uuid().not_null())
                        .col(ColumnDef::new(MachineProcesses::FieldValues).json().not_null())
                        .col(
                            ColumnDef::new(MachineProcesses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MachineProcesses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_machine_processes_machine_id")
                                .from(MachineProcesses::Table, MachineProcesses::MachineId)
                                .to(Machines::Table, Machines::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_machine_processes_process_id")
                                .from(MachineProcesses::Table, MachineProcesses::ProcessId)
                                .to(ProcessNames::Table, ProcessNames::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_machine_processes_machine_process")
                        .table(MachineProcesses::Table)
                        .col(MachineProcesses::MachineId)
                        .col(MachineProcesses::ProcessId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MachineProcesses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Machines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProcessFields::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProcessNames::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProcessNames {
        Table,
        Id,
        CompanyId,
        ProcessName,
        Description,
    }

    #[derive(DeriveIden)]
    enum ProcessFields {
        Table,
        Id,
        ProcessId,
        FieldKey,
        Label,
        FieldType,
        Options,
        Required,
        Position,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Machines {
        Table,
        Id,
        CompanyId,
        MachineName,
        MachineCode,
        MachineType,
        Manufacturer,
        CapacityPerHour,
    }

    #[derive(DeriveIden)]
    enum MachineProcesses {
        Table,
        Id,
        MachineId,
        ProcessId,
        FieldValues,
        CreatedAt,
        UpdatedAt,
    }
}
