//! Recurring scans.
//!
//! The persisted schedule list is kept in step with every successful write,
//! so views that read it directly see changes before the next list fetch.

use super::endpoints::{self, list_options};
use super::{reject, require_user, storage_changed};
use crate::mutation::Mutation;
use crate::query::Query;
use crate::tab::Tab;
use fuzzwatch_core::{
    ApiRequest, ClientError, CreateScheduleRequest, CreateScheduleResponse,
    DeleteSchedulesResponse, SchedulesResponse, UpdateScheduleRequest, UpdateScheduleResponse,
};
use fuzzwatch_events::BusMessage;
use fuzzwatch_storage::keys::DOMAIN_SCHEDULES;
use fuzzwatch_storage::InvalidationPattern;
use serde_json::json;

pub fn schedules(tab: &Tab, user_id: &str) -> Query<SchedulesResponse> {
    Query::new(tab, ApiRequest::get(endpoints::schedules(user_id)), list_options(tab))
        .requires("user_id", user_id)
        .on_success(|response: &SchedulesResponse, store| {
            let _ = store.set_schedules(&response.schedules);
        })
}

/// Schedule a scan of each domain every `hours` hours.
pub async fn create_schedules(
    tab: &Tab,
    user_id: &str,
    hours: u32,
    domain_names: Vec<String>,
) -> Result<CreateScheduleResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    if hours == 0 {
        return Err(reject(
            tab,
            ClientError::validation("hours", "Interval must be at least one hour"),
        ));
    }
    if domain_names.is_empty() {
        return Err(reject(
            tab,
            ClientError::validation("domain_names", "Select at least one domain"),
        ));
    }
    let path = endpoints::schedules(user_id);
    let request = ApiRequest::post(&path).with_body(&CreateScheduleRequest {
        hours,
        domain_names,
    })?;

    Mutation::new("creating schedule", request)
        .invalidates(InvalidationPattern::resource(&path))
        .mirror(|response: &CreateScheduleResponse, store| {
            store.upsert_schedules(&response.schedules)
        })
        .publishes(BusMessage::SchedulesUpdated)
        .publishes(storage_changed(tab, DOMAIN_SCHEDULES.name()))
        .success("Schedule created successfully")
        .describe(|response| format!("Created {} schedule(s)", response.schedules.len()))
        .run(tab)
        .await
}

pub async fn delete_schedules(
    tab: &Tab,
    user_id: &str,
    schedule_ids: Vec<String>,
) -> Result<DeleteSchedulesResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let path = endpoints::schedules(user_id);
    let request = ApiRequest::delete(&path).with_json(json!({ "schedule_ids": schedule_ids }));

    Mutation::new("deleting schedules", request)
        .invalidates(InvalidationPattern::resource(&path))
        .mirror(|response: &DeleteSchedulesResponse, store| {
            store.remove_schedules(&response.deleted_schedules)
        })
        .publishes(BusMessage::SchedulesUpdated)
        .publishes(storage_changed(tab, DOMAIN_SCHEDULES.name()))
        .success("Schedules deleted successfully")
        .describe(|response| {
            format!("Deleted {} schedule(s)", response.deleted_schedules.len())
        })
        .run(tab)
        .await
}

pub async fn update_schedule(
    tab: &Tab,
    user_id: &str,
    update: UpdateScheduleRequest,
) -> Result<UpdateScheduleResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let path = endpoints::schedules(user_id);
    let request = ApiRequest::patch(&path).with_body(&update)?;

    Mutation::new("updating schedule", request)
        .invalidates(InvalidationPattern::resource(&path))
        .mirror(|response: &UpdateScheduleResponse, store| {
            store.upsert_schedules(std::slice::from_ref(&response.schedule))
        })
        .publishes(BusMessage::SchedulesUpdated)
        .publishes(storage_changed(tab, DOMAIN_SCHEDULES.name()))
        .success("Schedule updated successfully")
        .describe(|response| {
            format!("Updated schedule \"{}\"", response.schedule.schedule_name)
        })
        .run(tab)
        .await
}
