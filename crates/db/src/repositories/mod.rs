//! Database repositories.

pub mod ad;
pub mod blog_post;
pub mod notification;
pub mod session;
pub mod testimonial;
pub mod user;

pub use ad::AdRepository;
pub use blog_post::BlogPostRepository;
pub use notification::NotificationRepository;
pub use session::SessionRepository;
pub use testimonial::TestimonialRepository;
pub use user::UserRepository;
