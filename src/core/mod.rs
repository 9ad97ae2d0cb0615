//! Core business logic - framework-agnostic content lifecycle, comment
//! moderation, pagination and the expiry sweep.

/// Descriptors mapping each content kind onto its tables
pub mod kind;
/// Archive/unarchive, completion and the mutation guard
pub mod lifecycle;
/// Role-based policy layer in front of the engines
pub mod moderation;
/// Generic comment store
pub mod comment;
/// Page/limit handling shared by every listing
pub mod pager;
/// Periodic auto-archival of expired content
pub mod sweeper;

mod query;
