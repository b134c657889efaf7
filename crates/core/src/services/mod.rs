//! Business logic services.

#![allow(missing_docs)]

pub mod ad;
pub mod blog;
pub mod moderation;
pub mod notification;
pub mod session;
pub mod sitemap;
pub mod stats;
pub mod testimonial;
pub mod user;

pub use ad::{AdService, AuthorAds, CreateAdInput, ImageUpload, PaginatedAds, UpdateAdInput};
pub use blog::{BlogService, CreateBlogPostInput, UpdateBlogPostInput};
pub use moderation::ModerationService;
pub use notification::NotificationService;
pub use session::SessionService;
pub use sitemap::SitemapService;
pub use stats::{DashboardStats, MonthlyCount, StatsService, StatusCount};
pub use testimonial::{CreateTestimonialInput, TestimonialService};
pub use user::{RegisterInput, UpdateProfileInput, UserService};
