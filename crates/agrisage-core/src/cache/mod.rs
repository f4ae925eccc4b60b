// ── Query cache ──
//
// Typed keys, the cache itself, and the mutation graph that decides which
// keys a write makes stale.

pub mod invalidation;
pub mod key;
mod store;

pub use invalidation::Mutation;
pub use key::{KeyPattern, QueryKey, QueryKind};
pub use store::{CacheEvent, DEFAULT_STALE_TIME, QueryCache, QueryState};
