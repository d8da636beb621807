//! Database entities.

pub mod comment;
pub mod post;
pub mod profile;
pub mod reaction;

pub use comment::Entity as Comment;
pub use post::Entity as Post;
pub use profile::Entity as Profile;
pub use reaction::Entity as Reaction;
