//! Monitored root domains.

use super::endpoints::{self, list_options};
use super::{reject, require_user, storage_changed};
use crate::mutation::Mutation;
use crate::query::Query;
use crate::tab::Tab;
use crate::validation::validate_new_domain;
use fuzzwatch_core::{
    ApiRequest, ClientError, CreateDomainResponse, DomainsResponse, MessageResponse,
};
use fuzzwatch_events::BusMessage;
use fuzzwatch_storage::keys::DOMAIN_ROOTS;
use fuzzwatch_storage::InvalidationPattern;
use serde_json::json;

/// The user's domains. Every network fetch rewrites the known roots.
pub fn domains(tab: &Tab, user_id: &str) -> Query<DomainsResponse> {
    Query::new(tab, ApiRequest::get(endpoints::domains(user_id)), list_options(tab))
        .requires("user_id", user_id)
        .on_success(|response: &DomainsResponse, store| {
            // Failures are logged by the store.
            let _ = store.set_domain_roots(&response.domain_names());
        })
}

/// Validate and add a root domain.
pub async fn create_domain(
    tab: &Tab,
    user_id: &str,
    input: &str,
) -> Result<CreateDomainResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let domain_name = validate_new_domain(input, &tab.store().domain_roots())
        .map_err(|e| reject(tab, e))?;
    let path = endpoints::domains(user_id);

    let root = domain_name.clone();
    let described = domain_name.clone();
    Mutation::new(
        "adding domain",
        ApiRequest::post(&path).with_json(json!({ "domain_name": domain_name })),
    )
    .invalidates(InvalidationPattern::resource(&path))
    .mirror(move |_, store| store.add_domain_root(&root).map(|_| ()))
    .publishes(BusMessage::DomainListUpdated)
    .publishes(storage_changed(tab, DOMAIN_ROOTS.name()))
    .success("Domain added successfully")
    .describe(move |_| format!("Domain \"{}\" has been saved", described))
    .run(tab)
    .await
}

pub async fn delete_domain(
    tab: &Tab,
    user_id: &str,
    domain_name: &str,
) -> Result<Option<MessageResponse>, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    let path = endpoints::domains(user_id);

    let root = domain_name.to_string();
    let described = domain_name.to_string();
    Mutation::new(
        "deleting domain",
        ApiRequest::delete(&path).with_json(json!({ "domain_name": domain_name })),
    )
    .invalidates(InvalidationPattern::resource(&path))
    .mirror(move |_, store| store.remove_domain_root(&root).map(|_| ()))
    .publishes(BusMessage::DomainListUpdated)
    .publishes(storage_changed(tab, DOMAIN_ROOTS.name()))
    .success("Domain deleted successfully")
    .describe(move |_| format!("Domain \"{}\" has been removed", described))
    .run(tab)
    .await
}
