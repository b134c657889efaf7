//! Database entities.

pub mod ad;
pub mod blog_post;
pub mod notification;
pub mod session;
pub mod testimonial;
pub mod user;

pub use ad::Entity as Ad;
pub use blog_post::Entity as BlogPost;
pub use notification::Entity as Notification;
pub use session::Entity as Session;
pub use testimonial::Entity as Testimonial;
pub use user::Entity as User;
