//! Database repositories.

pub mod comment;
pub mod keyset;
pub mod post;
pub mod profile;
pub mod reaction;

pub use comment::CommentRepository;
pub use keyset::keyset_before;
pub use post::{PostOrder, PostRepository, PostScope};
pub use profile::ProfileRepository;
pub use reaction::ReactionRepository;
