//! Generated look-alike domains.

use super::endpoints::{self, PERMUTATION_OPTIONS};
use super::{reject, require_user};
use crate::mutation::Mutation;
use crate::query::Query;
use crate::tab::Tab;
use fuzzwatch_core::{ApiRequest, ClientError, CountResponse, MessageResponse, Permutation};
use fuzzwatch_storage::InvalidationPattern;
use serde::Deserialize;

/// The service answers either with a bare list or with `{permutations}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PermutationsPayload {
    List(Vec<Permutation>),
    Wrapped {
        #[serde(default)]
        permutations: Vec<Permutation>,
    },
}

impl PermutationsPayload {
    pub fn as_slice(&self) -> &[Permutation] {
        match self {
            Self::List(list) | Self::Wrapped { permutations: list } => list,
        }
    }

    pub fn into_vec(self) -> Vec<Permutation> {
        match self {
            Self::List(list) | Self::Wrapped { permutations: list } => list,
        }
    }
}

pub fn permutations(tab: &Tab, user_id: &str, domain_name: &str) -> Query<PermutationsPayload> {
    Query::new(
        tab,
        ApiRequest::get(endpoints::permutations(user_id, domain_name)),
        PERMUTATION_OPTIONS,
    )
    .requires("user_id", user_id)
    .requires("domain_name", domain_name)
}

pub fn permutations_count(tab: &Tab, user_id: &str) -> Query<CountResponse> {
    Query::new(
        tab,
        ApiRequest::get(endpoints::permutations_count(user_id)),
        PERMUTATION_OPTIONS,
    )
    .requires("user_id", user_id)
}

/// Ask the service to regenerate a domain's permutations. Refreshes the
/// domain list too, since risk counts change with it.
pub async fn generate_permutations(
    tab: &Tab,
    user_id: &str,
    domain_name: &str,
) -> Result<MessageResponse, ClientError> {
    let user_id = require_user(user_id).map_err(|e| reject(tab, e))?;
    if domain_name.trim().is_empty() {
        return Err(reject(
            tab,
            ClientError::validation("domain_name", "A domain is required"),
        ));
    }
    let path = endpoints::permutations(user_id, domain_name);
    let described = domain_name.to_string();

    Mutation::new("generating permutations", ApiRequest::post(&path))
        .invalidates(InvalidationPattern::resource(&path))
        .invalidates(InvalidationPattern::resource(&endpoints::domains(user_id)))
        .success("Permutations generated")
        .describe(move |_| {
            format!(
                "Domain permutations for \"{}\" have been generated",
                described
            )
        })
        .run(tab)
        .await
}
