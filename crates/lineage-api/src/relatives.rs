//! Handlers for the `/add-{relation}/:id` mutators.
//!
//! Each creates a new person already linked to the target. The editor must be
//! allowed to edit the target; the store plans and applies the new person and
//! its edges in one transaction.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use lineage_core::{
  mutation::MutationOutcome,
  person::NewPerson,
  photo::PhotoStore,
  relation::Relation,
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  identity::{Editor, authorize},
  persons::parse_gender,
};

/// JSON body accepted by every mutator. `gender` is ignored for
/// `add-father` and `add-mother`.
#[derive(Debug, Deserialize)]
pub struct RelativeBody {
  pub firstname: String,
  pub surname:   String,
  pub dob:       NaiveDate,
  pub gender:    Option<String>,
}

async fn add<S, P>(
  state: AppState<S, P>,
  editor: Editor,
  target: Uuid,
  relation: Relation,
  body: RelativeBody,
) -> Result<(StatusCode, Json<MutationOutcome>), ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  let input = NewPerson {
    firstname:   body.firstname.trim().to_owned(),
    surname:     body.surname.trim().to_owned(),
    dob:         body.dob,
    gender:      parse_gender(body.gender)?,
    profile_pic: None,
  };
  input.validate()?;

  let grant = authorize(state.store.as_ref(), editor, target).await?;

  let outcome = state
    .store
    .add_relative(target, relation, input)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {target} not found")))?;

  tracing::info!(
    editor = %editor.0,
    %target,
    %relation,
    %grant,
    created = %outcome.person.person_id,
    edges = outcome.parent_child.len(),
    married = outcome.marriage.is_some(),
    "relative added"
  );
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `POST /add-father/:id`
pub async fn add_father<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(target): Path<Uuid>,
  Json(body): Json<RelativeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  add(state, editor, target, Relation::Father, body).await
}

/// `POST /add-mother/:id`
pub async fn add_mother<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(target): Path<Uuid>,
  Json(body): Json<RelativeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  add(state, editor, target, Relation::Mother, body).await
}

/// `POST /add-spouse/:id`
pub async fn add_spouse<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(target): Path<Uuid>,
  Json(body): Json<RelativeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  add(state, editor, target, Relation::Spouse, body).await
}

/// `POST /add-sibling/:id`
pub async fn add_sibling<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(target): Path<Uuid>,
  Json(body): Json<RelativeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  add(state, editor, target, Relation::Sibling, body).await
}

/// `POST /add-child/:id`
pub async fn add_child<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(target): Path<Uuid>,
  Json(body): Json<RelativeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  add(state, editor, target, Relation::Child, body).await
}
