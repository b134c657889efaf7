//! Create testimonial table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Testimonial::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Testimonial::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Testimonial::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Testimonial::Message).text().not_null())
                    .col(ColumnDef::new(Testimonial::Rating).small_integer().not_null())
                    .col(
                        ColumnDef::new(Testimonial::CreatedAt)
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
            .drop_table(Table::drop().table(Testimonial::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Testimonial {
    Table,
    Id,
    Name,
    Message,
    Rating,
    CreatedAt,
}
