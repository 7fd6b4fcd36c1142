//! fuzzwatch Client - Queries, Mutations and Sibling Consumers
//!
//! The dashboard-facing half of the consistency layer:
//!
//! - An [`Origin`] owns the persisted backend and the cross-tab channel;
//!   each [`Tab`] opened from it gets its own bus and request cache.
//! - [`Query`] reads through the tab's cache, [`Mutation`] writes through
//!   the transport then invalidates, mirrors into the store and publishes.
//! - [`api`] expresses the scanning service's resources in those terms.
//! - [`consumers`] are the views that keep each other current without a
//!   shared parent.

pub mod api;
pub mod config;
pub mod consumers;
pub mod http;
pub mod mutation;
pub mod notifications;
pub mod origin;
pub mod query;
pub mod tab;
pub mod telemetry;
pub mod validation;

pub use config::{CacheSection, ClientConfig, LoggingConfig};
pub use consumers::{DomainListWatcher, LayoutState, PersistedView, Session, ThemeState};
pub use http::HttpTransport;
pub use mutation::Mutation;
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
pub use origin::{Origin, OriginSettings};
pub use query::{Query, QueryOptions, QuerySnapshot, QueryStatus};
pub use tab::Tab;
pub use telemetry::init_tracing;
pub use validation::{is_valid_domain, normalize_domain, validate_new_domain};
