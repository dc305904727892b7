use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cattle::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cattle::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cattle::Name).string().not_null())
                    .col(ColumnDef::new(Cattle::Breed).string().not_null())
                    .col(ColumnDef::new(Cattle::Weight).double().not_null().default(0.0))
                    .col(ColumnDef::new(Cattle::Age).integer().not_null().default(0))
                    .col(ColumnDef::new(Cattle::Price).big_integer().not_null())
                    .col(ColumnDef::new(Cattle::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Cattle::Location).string().not_null().default(""))
                    .col(ColumnDef::new(Cattle::Status).string().not_null().default("available"))
                    .col(ColumnDef::new(Cattle::Images).json_binary().not_null())
                    .col(ColumnDef::new(Cattle::Videos).json_binary().not_null())
                    .col(
                        ColumnDef::new(Cattle::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Cattle::UpdatedAt)
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
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::CattleId).integer().not_null())
                    .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                    .col(ColumnDef::new(Orders::Phone).string().not_null())
                    .col(ColumnDef::new(Orders::Email).string().null())
                    .col(ColumnDef::new(Orders::Address).text().not_null())
                    .col(ColumnDef::new(Orders::DeliveryDate).date().null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string().not_null().default("cash"))
                    .col(ColumnDef::new(Orders::Message).text().null())
                    .col(ColumnDef::new(Orders::Status).string().not_null().default("pending"))
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_cattle")
                            .from(Orders::Table, Orders::CattleId)
                            .to(Cattle::Table, Cattle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contacts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contacts::Name).string().not_null())
                    .col(ColumnDef::new(Contacts::Email).string().not_null())
                    .col(ColumnDef::new(Contacts::Phone).string().null())
                    .col(ColumnDef::new(Contacts::Subject).string().not_null())
                    .col(ColumnDef::new(Contacts::Message).text().not_null())
                    .col(ColumnDef::new(Contacts::Status).string().not_null().default("new"))
                    .col(
                        ColumnDef::new(Contacts::CreatedAt)
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
                    .table(BlogPosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogPosts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogPosts::Title).string().not_null())
                    .col(ColumnDef::new(BlogPosts::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(BlogPosts::Content).text().not_null())
                    .col(ColumnDef::new(BlogPosts::Excerpt).text().null())
                    .col(ColumnDef::new(BlogPosts::FeaturedImage).string().null())
                    .col(ColumnDef::new(BlogPosts::Author).string().not_null().default("Admin"))
                    .col(ColumnDef::new(BlogPosts::Published).boolean().not_null().default(false))
                    .col(ColumnDef::new(BlogPosts::PublishedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(BlogPosts::ViewCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(BlogPosts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BlogPosts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogPosts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cattle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Cattle {
    Table,
    Id,
    Name,
    Breed,
    Weight,
    Age,
    Price,
    Description,
    Location,
    Status,
    Images,
    Videos,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CattleId,
    CustomerName,
    Phone,
    Email,
    Address,
    DeliveryDate,
    PaymentMethod,
    Message,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Subject,
    Message,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BlogPosts {
    Table,
    Id,
    Title,
    Slug,
    Content,
    Excerpt,
    FeaturedImage,
    Author,
    Published,
    PublishedAt,
    ViewCount,
    CreatedAt,
    UpdatedAt,
}
