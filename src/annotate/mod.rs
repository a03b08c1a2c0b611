//! Annotation synchronization core.
//!
//! - [`resolver`] computes fully qualified names of declarations.
//! - [`signature`] builds the `name(T1,T2)` keys methods are configured by.
//! - [`merge`] reconciles an annotation list with the desired tags.
//! - [`walker`] drives the above over one compilation unit.

pub mod merge;
pub mod resolver;
pub mod signature;
pub mod walker;

pub use merge::merge;
pub use resolver::{resolve, IdentityError};
pub use walker::walk;
