use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Title).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text().not_null())
                    .col(ColumnDef::new(Projects::GoalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Projects::RaisedAmount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Projects::InvestorCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Projects::Deadline).date().null())
                    .col(ColumnDef::new(Projects::Status).string().not_null().default("active"))
                    .col(ColumnDef::new(Projects::ImageUrl).string().null())
                    .col(ColumnDef::new(Projects::ViewCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Keyed by the delegated-auth user id, so no auto increment.
        manager
            .create_table(
                Table::create()
                    .table(InvestorProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvestorProfiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvestorProfiles::InvestorName).string().not_null())
                    .col(ColumnDef::new(InvestorProfiles::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(InvestorProfiles::Phone).string().null())
                    .col(ColumnDef::new(InvestorProfiles::Address).text().null())
                    .col(
                        ColumnDef::new(InvestorProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Investments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Investments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Investments::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Investments::InvestorId).uuid().null())
                    .col(ColumnDef::new(Investments::InvestorName).string().not_null())
                    .col(ColumnDef::new(Investments::Email).string().not_null())
                    .col(ColumnDef::new(Investments::Phone).string().not_null())
                    .col(ColumnDef::new(Investments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Investments::InvestmentType).string().not_null())
                    .col(ColumnDef::new(Investments::InvestmentDeadline).date().null())
                    .col(ColumnDef::new(Investments::Message).text().null())
                    .col(ColumnDef::new(Investments::Status).string().not_null().default("pending"))
                    .col(
                        ColumnDef::new(Investments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Investments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_investments_project")
                            .from(Investments::Table, Investments::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_investments_investor")
                            .from(Investments::Table, Investments::InvestorId)
                            .to(InvestorProfiles::Table, InvestorProfiles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_investments_project_status")
                    .table(Investments::Table)
                    .col(Investments::ProjectId)
                    .col(Investments::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Investments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InvestorProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    GoalAmount,
    RaisedAmount,
    InvestorCount,
    Deadline,
    Status,
    ImageUrl,
    ViewCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InvestorProfiles {
    Table,
    Id,
    InvestorName,
    Email,
    Phone,
    Address,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Investments {
    Table,
    Id,
    ProjectId,
    InvestorId,
    InvestorName,
    Email,
    Phone,
    Amount,
    InvestmentType,
    InvestmentDeadline,
    Message,
    Status,
    CreatedAt,
    UpdatedAt,
}
