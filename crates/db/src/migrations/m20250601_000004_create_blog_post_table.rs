//! Create blog post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogPost::Title).string_len(256).not_null())
                    .col(ColumnDef::new(BlogPost::Content).text().not_null())
                    .col(ColumnDef::new(BlogPost::ImageUrl).string_len(2048))
                    .col(ColumnDef::new(BlogPost::ImageKey).string_len(512))
                    .col(
                        ColumnDef::new(BlogPost::AuthorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlogPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BlogPost::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_post_author")
                            .from(BlogPost::Table, BlogPost::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (public listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_blog_post_created_at")
                    .table(BlogPost::Table)
                    .col(BlogPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BlogPost {
    Table,
    Id,
    Title,
    Content,
    ImageUrl,
    ImageKey,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
