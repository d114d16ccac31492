use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_organizations_table::Migration),
            Box::new(m20240101_000002_create_consignors_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_item_categories_table::Migration),
            Box::new(m20240101_000005_create_items_table::Migration),
            Box::new(m20240101_000006_create_payouts_table::Migration),
            Box::new(m20240101_000007_create_transactions_table::Migration),
            Box::new(m20240101_000008_create_statements_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_organizations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_organizations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Organizations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Organizations::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Organizations::Name).string().not_null())
                        .col(
                            ColumnDef::new(Organizations::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Organizations::StoreCode)
                                .string_len(16)
                                .null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Organizations::DefaultSplitPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(50),
                        )
                        .col(
                            ColumnDef::new(Organizations::AutoApproveConsignors)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Organizations::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Organizations::SubscriptionStatus)
                                .string()
                                .not_null()
                                .default("none"),
                        )
                        .col(
                            ColumnDef::new(Organizations::StripeCustomerId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Organizations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Organizations::UpdatedAt)
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
                        .name("idx_organizations_stripe_customer_id")
                        .table(Organizations::Table)
                        .col(Organizations::StripeCustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Organizations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
        Name,
        Slug,
        StoreCode,
        DefaultSplitPercentage,
        AutoApproveConsignors,
        IsActive,
        SubscriptionStatus,
        StripeCustomerId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_consignors_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_consignors_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Consignors::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Consignors::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Consignors::OrganizationId).uuid().not_null())
                        .col(
                            ColumnDef::new(Consignors::ConsignorNumber)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Consignors::FirstName).string().not_null())
                        .col(ColumnDef::new(Consignors::LastName).string().not_null())
                        .col(ColumnDef::new(Consignors::Email).string().null())
                        .col(ColumnDef::new(Consignors::Phone).string().null())
                        .col(
                            ColumnDef::new(Consignors::SplitPercentage)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Consignors::Status)
                                .string()
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(Consignors::ApprovalStatus)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Consignors::Notes).text().null())
                        .col(
                            ColumnDef::new(Consignors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Consignors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_consignors_organization_id")
                                .from(Consignors::Table, Consignors::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_consignors_org_number")
                        .table(Consignors::Table)
                        .col(Consignors::OrganizationId)
                        .col(Consignors::ConsignorNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Consignors::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Consignors {
        Table,
        Id,
        OrganizationId,
        ConsignorNumber,
        FirstName,
        LastName,
        Email,
        Phone,
        SplitPercentage,
        Status,
        ApprovalStatus,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // consignor_id and approved_by are plain columns; users can outlive both
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Users::OrganizationId).uuid().null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::FullName).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::ApprovalStatus)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Users::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(Users::ApprovedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Users::RejectedReason).text().null())
                        .col(ColumnDef::new(Users::ConsignorId).uuid().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_organization_id")
                                .from(Users::Table, Users::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role_approval")
                        .table(Users::Table)
                        .col(Users::Role)
                        .col(Users::ApprovalStatus)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        OrganizationId,
        Email,
        FullName,
        PasswordHash,
        Role,
        ApprovalStatus,
        ApprovedBy,
        ApprovedAt,
        RejectedReason,
        ConsignorId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_item_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_item_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemCategories::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ItemCategories::OrganizationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemCategories::Name).string().not_null())
                        .col(ColumnDef::new(ItemCategories::Description).text().null())
                        .col(
                            ColumnDef::new(ItemCategories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ItemCategories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemCategories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_categories_organization_id")
                                .from(ItemCategories::Table, ItemCategories::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_categories_organization_id")
                        .table(ItemCategories::Table)
                        .col(ItemCategories::OrganizationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemCategories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum ItemCategories {
        Table,
        Id,
        OrganizationId,
        Name,
        Description,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_items_table"
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
                        .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Items::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(Items::ConsignorId).uuid().not_null())
                        .col(ColumnDef::new(Items::CategoryId).uuid().null())
                        .col(ColumnDef::new(Items::Sku).string_len(64).not_null())
                        .col(ColumnDef::new(Items::Title).string().not_null())
                        .col(ColumnDef::new(Items::Description).text().null())
                        .col(ColumnDef::new(Items::Price).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Items::Status)
                                .string()
                                .not_null()
                                .default("available"),
                        )
                        .col(
                            ColumnDef::new(Items::IsPublic)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Items::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::SoldAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_organization_id")
                                .from(Items::Table, Items::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_consignor_id")
                                .from(Items::Table, Items::ConsignorId)
                                .to(Consignors::Table, Consignors::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_category_id")
                                .from(Items::Table, Items::CategoryId)
                                .to(ItemCategories::Table, ItemCategories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_org_sku")
                        .table(Items::Table)
                        .col(Items::OrganizationId)
                        .col(Items::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_consignor_id")
                        .table(Items::Table)
                        .col(Items::ConsignorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category_id")
                        .table(Items::Table)
                        .col(Items::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Consignors {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum ItemCategories {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        OrganizationId,
        ConsignorId,
        CategoryId,
        Sku,
        Title,
        Description,
        Price,
        Status,
        IsPublic,
        ReceivedAt,
        SoldAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_payouts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_payouts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payouts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payouts::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Payouts::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(Payouts::ConsignorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Payouts::PayoutNumber)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payouts::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Payouts::TransactionCount).integer().not_null())
                        .col(ColumnDef::new(Payouts::PeriodStart).date().not_null())
                        .col(ColumnDef::new(Payouts::PeriodEnd).date().not_null())
                        .col(ColumnDef::new(Payouts::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Payouts::PaymentReference).string().null())
                        .col(ColumnDef::new(Payouts::Notes).text().null())
                        .col(
                            ColumnDef::new(Payouts::PaidAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payouts::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Payouts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payouts_organization_id")
                                .from(Payouts::Table, Payouts::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payouts_consignor_id")
                                .from(Payouts::Table, Payouts::ConsignorId)
                                .to(Consignors::Table, Consignors::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payouts_consignor_period")
                        .table(Payouts::Table)
                        .col(Payouts::ConsignorId)
                        .col(Payouts::PeriodStart)
                        .col(Payouts::PeriodEnd)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payouts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Consignors {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Payouts {
        Table,
        Id,
        OrganizationId,
        ConsignorId,
        PayoutNumber,
        Amount,
        TransactionCount,
        PeriodStart,
        PeriodEnd,
        PaymentMethod,
        PaymentReference,
        Notes,
        PaidAt,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000007_create_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Transactions::OrganizationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::ItemId).uuid().not_null())
                        .col(ColumnDef::new(Transactions::ConsignorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Transactions::SalePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::SplitPercentage)
                                .decimal_len(5, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::ConsignorAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::ShopAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::PaymentMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::PayoutStatus)
                                .string()
                                .not_null()
                                .default("Pending"),
                        )
                        .col(ColumnDef::new(Transactions::PayoutId).uuid().null())
                        .col(
                            ColumnDef::new(Transactions::ConsignorPaidOut)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Transactions::IsVoided)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Transactions::VoidedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Transactions::VoidReason).text().null())
                        .col(
                            ColumnDef::new(Transactions::SoldAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_organization_id")
                                .from(Transactions::Table, Transactions::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_item_id")
                                .from(Transactions::Table, Transactions::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_consignor_id")
                                .from(Transactions::Table, Transactions::ConsignorId)
                                .to(Consignors::Table, Consignors::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_payout_id")
                                .from(Transactions::Table, Transactions::PayoutId)
                                .to(Payouts::Table, Payouts::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_consignor_sold_at")
                        .table(Transactions::Table)
                        .col(Transactions::ConsignorId)
                        .col(Transactions::SoldAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_payout_id")
                        .table(Transactions::Table)
                        .col(Transactions::PayoutId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Consignors {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Payouts {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Transactions {
        Table,
        Id,
        OrganizationId,
        ItemId,
        ConsignorId,
        SalePrice,
        SplitPercentage,
        ConsignorAmount,
        ShopAmount,
        PaymentMethod,
        PayoutStatus,
        PayoutId,
        ConsignorPaidOut,
        IsVoided,
        VoidedAt,
        VoidReason,
        SoldAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000008_create_statements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_statements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Statements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Statements::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Statements::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(Statements::ConsignorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Statements::StatementNumber)
                                .string_len(48)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Statements::PeriodStart).date().not_null())
                        .col(ColumnDef::new(Statements::PeriodEnd).date().not_null())
                        .col(
                            ColumnDef::new(Statements::OpeningBalance)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Statements::TotalSales)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Statements::TotalEarnings)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Statements::TotalPayouts)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Statements::ClosingBalance)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Statements::ItemsSold).integer().not_null())
                        .col(ColumnDef::new(Statements::PayoutCount).integer().not_null())
                        .col(
                            ColumnDef::new(Statements::GeneratedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Statements::GeneratedBy).uuid().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_statements_organization_id")
                                .from(Statements::Table, Statements::OrganizationId)
                                .to(Organizations::Table, Organizations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_statements_consignor_id")
                                .from(Statements::Table, Statements::ConsignorId)
                                .to(Consignors::Table, Consignors::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_statements_org_consignor_period")
                        .table(Statements::Table)
                        .col(Statements::OrganizationId)
                        .col(Statements::ConsignorId)
                        .col(Statements::PeriodStart)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Statements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Consignors {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Statements {
        Table,
        Id,
        OrganizationId,
        ConsignorId,
        StatementNumber,
        PeriodStart,
        PeriodEnd,
        OpeningBalance,
        TotalSales,
        TotalEarnings,
        TotalPayouts,
        ClosingBalance,
        ItemsSold,
        PayoutCount,
        GeneratedAt,
        GeneratedBy,
    }
}
