//! Entity module - row models and column identifiers for every table.
//! Tables are per content kind, so these models are loaded with
//! `FromQueryResult` from statements built against the kind's table names.

pub mod comment;
pub mod content;
pub mod media;

pub use comment::{Comment, CommentColumn, CommentView, PublicComment};
pub use content::{ContentColumn, ContentItem};
pub use media::{Media, MediaColumn};
