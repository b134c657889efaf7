//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_table;
mod m20250601_000002_create_ad_table;
mod m20250601_000003_create_notification_table;
mod m20250601_000004_create_blog_post_table;
mod m20250601_000005_create_testimonial_table;
mod m20250601_000006_create_session_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_table::Migration),
            Box::new(m20250601_000002_create_ad_table::Migration),
            Box::new(m20250601_000003_create_notification_table::Migration),
            Box::new(m20250601_000004_create_blog_post_table::Migration),
            Box::new(m20250601_000005_create_testimonial_table::Migration),
            Box::new(m20250601_000006_create_session_table::Migration),
        ]
    }
}
