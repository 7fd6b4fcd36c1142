//! Users and per-user settings.

use super::endpoints::{self, list_options};
use super::{reject, require_user};
use crate::mutation::Mutation;
use crate::query::Query;
use crate::tab::Tab;
use fuzzwatch_core::{
    ApiRequest, ClientError, CreateUserResponse, Identity, UpdateUserSettingsRequest,
    UserSettings, UsersResponse,
};
use fuzzwatch_events::{BusMessage, StorageChange};
use fuzzwatch_storage::InvalidationPattern;
use serde_json::{json, Value};
use tracing::warn;

/// All users. A rejected listing means the stored identity can no longer be
/// trusted, so it is forgotten and the tab told.
pub fn users(tab: &Tab) -> Query<UsersResponse> {
    let owner = tab.clone();
    Query::new(tab, ApiRequest::get(endpoints::users()), list_options(tab)).on_error(
        move |error: &ClientError, store| {
            if let ClientError::Http { status, .. } = error {
                warn!(status, "User listing rejected, clearing identity");
                if store.clear_identity().is_ok() {
                    owner.publish(BusMessage::UserUpdated);
                    owner.publish(BusMessage::Storage(StorageChange::from_source(owner.id())));
                }
            }
        },
    )
}

pub fn user_settings(tab: &Tab, user_id: &str) -> Query<UserSettings> {
    Query::new(tab, ApiRequest::get(endpoints::user(user_id)), list_options(tab))
        .requires("user_id", user_id)
}

/// Create a user and sign in as them.
pub async fn create_user(tab: &Tab, username: &str) -> Result<CreateUserResponse, ClientError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(reject(
            tab,
            ClientError::validation("username", "Please enter a username"),
        ));
    }

    Mutation::new(
        "creating user",
        ApiRequest::post(endpoints::users()).with_json(json!({ "username": username })),
    )
    .invalidates(InvalidationPattern::resource(&endpoints::users()))
    .mirror(|response: &CreateUserResponse, store| {
        store.set_identity(&Identity::new(&response.username, &response.user_id))
    })
    .publishes(BusMessage::UserUpdated)
    .publishes(BusMessage::Storage(StorageChange::from_source(tab.id())))
    .success("User created successfully")
    .run(tab)
    .await
}

/// Rename a user, keeping the stored id.
pub async fn update_username(
    tab: &Tab,
    user_id: &str,
    username: &str,
) -> Result<CreateUserResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let username = username.trim();
    if username.is_empty() {
        return Err(reject(
            tab,
            ClientError::validation("username", "Please enter a username"),
        ));
    }

    Mutation::new(
        "updating username",
        ApiRequest::patch(endpoints::user(user_id)).with_json(json!({ "username": username })),
    )
    .invalidates(InvalidationPattern::resource(&endpoints::users()))
    .mirror(|response: &CreateUserResponse, store| store.set_username(&response.username))
    .publishes(BusMessage::UserUpdated)
    .publishes(BusMessage::Storage(StorageChange::from_source(tab.id())))
    .success("Username updated successfully")
    .run(tab)
    .await
}

pub async fn update_user_settings(
    tab: &Tab,
    user_id: &str,
    settings: UpdateUserSettingsRequest,
) -> Result<Value, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let path = endpoints::user(user_id);

    Mutation::new(
        "updating settings",
        ApiRequest::patch(&path).with_body(&settings)?,
    )
    .invalidates(InvalidationPattern::resource(&endpoints::users()))
    .invalidates(InvalidationPattern::resource(&path))
    .success("Settings updated successfully")
    .run(tab)
    .await
}

pub async fn delete_user(tab: &Tab, user_id: &str) -> Result<Value, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let path = endpoints::user(user_id);

    Mutation::new("deleting user", ApiRequest::delete(&path))
        .invalidates(InvalidationPattern::resource(&endpoints::users()))
        .invalidates(InvalidationPattern::resource(&path))
        .success("User deleted successfully")
        .run(tab)
        .await
}
