//! Persisted key-value store.
//!
//! ```text
//!   PersistedStore (one per tab)
//!     ├── StoreKey<T>          typed key, JSON value
//!     ├── Arc<dyn KvBackend>   shared by every tab of the origin
//!     └── CrossTabChannel      signalled after each successful write
//! ```
//!
//! The backend stores raw JSON text per key, the way a browser's local
//! storage does. Encoding and decoding happen in [`PersistedStore`], so every
//! backend sees the same bytes.

mod backend;
mod file;
pub mod keys;
mod records;
mod store;

pub use backend::{KvBackend, MemoryBackend, SharedBackend};
pub use file::FileBackend;
pub use keys::StoreKey;
pub use store::PersistedStore;
