//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Every person plus all edges, for tree rendering |
//! | `POST` | `/persons` | Body: [`CreateBody`]; returns 201 + stored person |
//! | `GET`  | `/persons/:id` | 404 if not found |
//! | `PUT`  | `/persons/:id` | `userid` header + edit permission; partial merge |
//!
//! Photos are written to the [`PhotoStore`] before the row that refers to
//! them. If the store write then fails the file is left unreferenced; names are
//! content hashes, so a retry reuses it.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use lineage_core::{
  person::{Gender, NewPerson, Person, PersonPatch},
  photo::PhotoStore,
  relation::FamilyGraph,
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  identity::{Editor, authorize},
  photo::{PhotoUpload, store_upload},
};

// ─── Field parsing ────────────────────────────────────────────────────────────

/// Empty strings count as "not supplied".
pub(crate) fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

pub(crate) fn parse_gender(s: Option<String>) -> Result<Option<Gender>, ApiError> {
  non_blank(s)
    .map(|g| {
      g.parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown gender {g:?}")))
    })
    .transpose()
}

fn parse_date(field: &str, s: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
  non_blank(s)
    .map(|d| {
      NaiveDate::parse_from_str(&d, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{field} must be YYYY-MM-DD, got {d:?}")))
    })
    .transpose()
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<FamilyGraph>, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  let graph = state
    .store
    .family_graph()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(graph))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /persons`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub firstname: String,
  pub surname:   String,
  pub dob:       NaiveDate,
  pub gender:    Option<String>,
  pub photo:     Option<PhotoUpload>,
}

/// `POST /persons`: returns 201 + the stored [`Person`].
pub async fn create<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  let mut input = NewPerson {
    firstname:   body.firstname.trim().to_owned(),
    surname:     body.surname.trim().to_owned(),
    dob:         body.dob,
    gender:      parse_gender(body.gender)?,
    profile_pic: None,
  };
  // Reject bad input before anything reaches the photo store.
  input.validate()?;

  if let Some(upload) = body.photo {
    input.profile_pic = Some(store_upload(state.photos.as_ref(), upload).await?);
  }

  let person = state
    .store
    .create_person(input)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(person_id = %person.person_id, "person created");
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /persons/:id`. Omitted, null and empty-string
/// fields are all left unchanged. A new profile photo can only arrive as an
/// upload; the stored URI is never client-supplied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub firstname:   Option<String>,
  pub surname:     Option<String>,
  pub dob:         Option<String>,
  pub gender:      Option<String>,
  pub instagram:   Option<String>,
  pub anniversary: Option<String>,
  pub photo:       Option<PhotoUpload>,
}

impl UpdateBody {
  /// Split into the field patch and the optional photo upload.
  fn into_parts(self) -> Result<(PersonPatch, Option<PhotoUpload>), ApiError> {
    let patch = PersonPatch {
      firstname:   non_blank(self.firstname),
      surname:     non_blank(self.surname),
      dob:         parse_date("dob", self.dob)?,
      gender:      parse_gender(self.gender)?,
      profile_pic: None,
      instagram:   non_blank(self.instagram),
      anniversary: parse_date("anniversary", self.anniversary)?,
    }
    .normalized();
    Ok((patch, self.photo))
  }
}

/// `PUT /persons/:id`: returns the merged person.
pub async fn update<S, P>(
  State(state): State<AppState<S, P>>,
  editor: Editor,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  let (mut patch, photo) = body.into_parts()?;
  let grant = authorize(state.store.as_ref(), editor, id).await?;

  if let Some(upload) = photo {
    patch.profile_pic = Some(store_upload(state.photos.as_ref(), upload).await?);
  }

  let person = state
    .store
    .update_person(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  tracing::info!(editor = %editor.0, person_id = %id, %grant, "person updated");
  Ok(Json(person))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_body_blanks_become_none() {
    let (patch, photo) = UpdateBody {
      instagram: Some("@ada".into()),
      firstname: Some("".into()),
      dob: Some("".into()),
      gender: Some(" ".into()),
      ..Default::default()
    }
    .into_parts()
    .unwrap();

    assert_eq!(patch, PersonPatch {
      instagram: Some("@ada".into()),
      ..Default::default()
    });
    assert!(photo.is_none());
  }

  #[test]
  fn update_body_rejects_bad_dates_and_genders() {
    let bad_date = UpdateBody { anniversary: Some("June".into()), ..Default::default() };
    assert!(matches!(bad_date.into_parts(), Err(ApiError::BadRequest(_))));

    let bad_gender = UpdateBody { gender: Some("robot".into()), ..Default::default() };
    assert!(matches!(bad_gender.into_parts(), Err(ApiError::BadRequest(_))));
  }

  #[test]
  fn gender_accepts_any_case() {
    assert_eq!(parse_gender(Some("Female".into())).unwrap(), Some(Gender::Female));
    assert_eq!(parse_gender(None).unwrap(), None);
  }
}
