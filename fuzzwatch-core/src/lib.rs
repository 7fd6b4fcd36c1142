//! fuzzwatch Core - Shared Types
//!
//! Data records exchanged with the scanning service, the error taxonomy of the
//! consistency layer, the clock abstraction every time-dependent component is
//! built on, and the network boundary trait. All other crates depend on this
//! one.

pub mod clock;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod transport;

pub use clock::{elapsed_since, Clock, ManualClock, SharedClock, SystemClock};
pub use entities::{
    CountResponse, CreateDomainResponse, CreateScheduleRequest, CreateScheduleResponse,
    CreateUserResponse, DeleteSchedulesResponse, Domain, DomainsResponse, Identity,
    MessageResponse, Permutation, RiskCounts, Schedule, SchedulesResponse, UpdateScheduleRequest,
    UpdateScheduleResponse, UpdateUserSettingsRequest, User, UserSettings, UsersResponse,
};
pub use enums::{RiskLevel, SidebarMode, Theme};
pub use error::{ClientError, ConfigError, FuzzwatchError, FuzzwatchResult, StorageError};
pub use identity::{new_tab_id, TabId, Timestamp};
pub use transport::{ApiRequest, HttpMethod, SharedTransport, Transport};
