pub mod blog_post;
pub mod cattle;
pub mod contact;
pub mod investment;
pub mod investor_profile;
pub mod order;
pub mod project;

pub use blog_post::Entity as BlogPost;
pub use cattle::Entity as Cattle;
pub use contact::Entity as Contact;
pub use investment::Entity as Investment;
pub use investor_profile::Entity as InvestorProfile;
pub use order::Entity as Order;
pub use project::Entity as Project;
