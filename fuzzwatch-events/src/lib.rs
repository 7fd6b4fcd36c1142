//! fuzzwatch Events - Same-Tab Bus and Cross-Tab Signalling
//!
//! Consumers that share no parent keep each other up to date through two
//! delivery paths:
//!
//! ```text
//!   tab A                                   tab B
//!   ─────                                   ─────
//!   EventBus::publish ──► A's handlers       (nothing)
//!
//!   store.set(key) ──► CrossTabChannel ──► CrossTabListener::pump
//!                                              └─► B's EventBus (Topic::Storage)
//! ```
//!
//! Same-tab delivery is synchronous and ordered by subscription. Cross-tab
//! delivery is best-effort: it happens when the receiving tab pumps its
//! listener, and a listener that fell behind receives one keyless
//! [`StorageChange`] in place of everything it missed.
//!
//! Every topic is a variant of the closed [`BusMessage`] union, so a publisher
//! and a subscriber cannot disagree on a payload shape.

mod bus;
mod cross_tab;
mod topic;

pub use bus::{EventBus, Subscription};
pub use cross_tab::{CrossTabChannel, CrossTabListener, DEFAULT_CROSS_TAB_CAPACITY};
pub use topic::{BusMessage, StorageChange, Topic};
