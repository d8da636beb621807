//! Core business logic for folio.
//!
//! - [`pagination`]: keyset paginator shaping store rows into pages
//! - [`thread`]: comment reply-tree builder
//! - [`services`]: post, comment, reaction and profile operations

pub mod pagination;
pub mod services;
pub mod thread;

pub use pagination::{Paginator, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use services::*;
pub use thread::{CommentThread, MAX_RENDER_DEPTH, ThreadItem, build_threads, forest_size};
