//! Handler for `POST /login`.
//!
//! The private key is checked before the name lookup, so a wrong key is `401`
//! whether or not the name exists.

use axum::{Json, extract::State};
use lineage_core::{person::Person, photo::PhotoStore, store::RegistryStore};
use serde::Deserialize;

use crate::{AppState, auth::verify_secret, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub firstname:   String,
  pub surname:     String,
  #[serde(rename = "privateKey")]
  pub private_key: String,
}

/// `POST /login`, body: `{"firstname":"…","surname":"…","privateKey":"…"}`
pub async fn handler<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  if let Err(e) = verify_secret(&body.private_key, &state.secret) {
    tracing::warn!(firstname = %body.firstname, surname = %body.surname, "login rejected");
    return Err(e);
  }

  let person = state
    .store
    .find_person_by_name(body.firstname.trim(), body.surname.trim())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no person named {} {}", body.firstname, body.surname))
    })?;

  tracing::info!(person_id = %person.person_id, "login");
  Ok(Json(person))
}
