//! The Tree Store.
//!
//! Documents are arenas of typed nodes ([`Tree`]) checked against a
//! [`Language`]. Nodes are addressed from the outside by [`Path`]s and
//! leave the arena as owned [`Subtree`] values.

mod path;
mod schema;
mod store;
mod subtree;

pub use path::Path;
pub use schema::{ANY_SORT, Arity, Construct, HOLE, Language};
pub use store::{NodeId, Tree};
pub use subtree::Subtree;
