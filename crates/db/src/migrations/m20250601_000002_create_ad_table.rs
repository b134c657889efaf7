//! Create ad table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ad::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ad::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ad::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Ad::Description).text().not_null())
                    .col(ColumnDef::new(Ad::Price).big_integer().not_null())
                    .col(ColumnDef::new(Ad::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Ad::Location).string_len(256))
                    .col(ColumnDef::new(Ad::Phone).string_len(32))
                    .col(ColumnDef::new(Ad::ImageUrls).json_binary().not_null())
                    .col(ColumnDef::new(Ad::ImageKeys).json_binary().not_null())
                    .col(ColumnDef::new(Ad::AffiliateLink).string_len(2048))
                    .col(ColumnDef::new(Ad::AuthorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Ad::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Ad::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Ad::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ad_author")
                            .from(Ad::Table, Ad::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (profile views, cascade deletes)
        manager
            .create_index(
                Index::create()
                    .name("idx_ad_author_id")
                    .table(Ad::Table)
                    .col(Ad::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) (public listing and moderation queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_ad_status_created_at")
                    .table(Ad::Table)
                    .col(Ad::Status)
                    .col(Ad::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ad::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ad {
    Table,
    Id,
    Title,
    Description,
    Price,
    Category,
    Location,
    Phone,
    ImageUrls,
    ImageKeys,
    AffiliateLink,
    AuthorId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
