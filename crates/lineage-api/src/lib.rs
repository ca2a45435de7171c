//! JSON REST API for the family registry.
//!
//! Exposes an axum [`Router`] backed by any [`RegistryStore`] and
//! [`PhotoStore`]. TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lineage_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod auth;
pub mod error;
pub mod identity;
pub mod login;
pub mod persons;
pub mod photo;
pub mod relatives;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use lineage_core::{photo::PhotoStore, store::RegistryStore};

pub use auth::SecretConfig;
pub use error::ApiError;
pub use photo::FsPhotoStore;

/// Requests carry inline photos, so bodies may be large.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers. Built once at startup.
pub struct AppState<S, P> {
  pub store:  Arc<S>,
  pub photos: Arc<P>,
  pub secret: Arc<SecretConfig>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      photos: Arc::clone(&self.photos),
      secret: Arc::clone(&self.secret),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: AppState<S, P>) -> Router<()>
where
  S: RegistryStore + Clone + 'static,
  P: PhotoStore + Clone + 'static,
{
  Router::new()
    // Session
    .route("/login", post(login::handler::<S, P>))
    // Persons
    .route("/persons", get(persons::list::<S, P>).post(persons::create::<S, P>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S, P>).put(persons::update::<S, P>),
    )
    // Mutators
    .route("/add-father/{id}", post(relatives::add_father::<S, P>))
    .route("/add-mother/{id}", post(relatives::add_mother::<S, P>))
    .route("/add-spouse/{id}", post(relatives::add_spouse::<S, P>))
    .route("/add-sibling/{id}", post(relatives::add_sibling::<S, P>))
    .route("/add-child/{id}", post(relatives::add_child::<S, P>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use lineage_core::person::Role;
  use lineage_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  type State = AppState<SqliteStore, FsPhotoStore>;

  const SECRET: &str = "family-secret";

  async fn make_state() -> State {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(SECRET.as_bytes(), &salt)
      .unwrap()
      .to_string();
    let photo_dir =
      std::env::temp_dir().join(format!("lineage-api-photos-{}", Uuid::new_v4()));

    AppState {
      store:  Arc::new(store),
      photos: Arc::new(FsPhotoStore::new(photo_dir, "http://photos.test")),
      secret: Arc::new(SecretConfig { private_key_hash: hash }),
    }
  }

  async fn send(
    state: &State,
    method: &str,
    uri: &str,
    editor: Option<Uuid>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(editor) = editor {
      builder = builder.header(identity::USER_ID_HEADER, editor.to_string());
    }
    let req = match body {
      Some(body) => builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn create(state: &State, firstname: &str, surname: &str) -> Uuid {
    let (status, body) = send(
      state,
      "POST",
      "/persons",
      None,
      Some(json!({ "firstname": firstname, "surname": surname, "dob": "1970-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["person_id"].as_str().unwrap().parse().unwrap()
  }

  fn relative(firstname: &str) -> Value {
    json!({ "firstname": firstname, "surname": "Doe", "dob": "2000-05-05" })
  }

  async fn person_count(state: &State) -> usize {
    let (_, graph) = send(state, "GET", "/persons", None, None).await;
    graph["persons"].as_array().unwrap().len()
  }

  // ── Login ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_with_correct_secret_returns_person() {
    let state = make_state().await;
    let id = create(&state, "Ada", "Lovelace").await;

    let (status, body) = send(
      &state,
      "POST",
      "/login",
      None,
      Some(json!({ "firstname": "Ada", "surname": "Lovelace", "privateKey": SECRET })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["person_id"], id.to_string());
    assert_eq!(body["married"], false);
  }

  #[tokio::test]
  async fn login_with_wrong_secret_is_401_even_for_unknown_names() {
    let state = make_state().await;
    create(&state, "Ada", "Lovelace").await;

    for (first, last) in [("Ada", "Lovelace"), ("Nobody", "Here")] {
      let (status, body) = send(
        &state,
        "POST",
        "/login",
        None,
        Some(json!({ "firstname": first, "surname": last, "privateKey": "guess" })),
      )
      .await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
      assert!(body["error"].is_string());
    }
  }

  #[tokio::test]
  async fn login_with_unknown_name_is_404() {
    let state = make_state().await;
    let (status, _) = send(
      &state,
      "POST",
      "/login",
      None,
      Some(json!({ "firstname": "Nobody", "surname": "Here", "privateKey": SECRET })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Persons ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_get_and_list() {
    let state = make_state().await;
    let id = create(&state, "Grace", "Hopper").await;

    let (status, body) = send(&state, "GET", &format!("/persons/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstname"], "Grace");
    assert_eq!(body["dob"], "1970-01-01");

    assert_eq!(person_count(&state).await, 1);
  }

  #[tokio::test]
  async fn get_unknown_person_is_404() {
    let state = make_state().await;
    let (status, _) =
      send(&state, "GET", &format!("/persons/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn create_rejects_blank_name() {
    let state = make_state().await;
    let (status, _) = send(
      &state,
      "POST",
      "/persons",
      None,
      Some(json!({ "firstname": "  ", "surname": "X", "dob": "1970-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(person_count(&state).await, 0);
  }

  #[tokio::test]
  async fn create_with_photo_stores_uri() {
    let state = make_state().await;
    let (status, body) = send(
      &state,
      "POST",
      "/persons",
      None,
      Some(json!({
        "firstname": "Ada",
        "surname": "Lovelace",
        "dob": "1815-12-10",
        "gender": "Female",
        "photo": { "media_type": "image/png", "data": B64.encode(b"\x89PNG") },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["gender"], "female");
    let uri = body["profile_pic"].as_str().unwrap();
    assert!(uri.starts_with("http://photos.test/") && uri.ends_with(".png"), "{uri}");
  }

  #[tokio::test]
  async fn rejected_create_stores_no_photo() {
    let dir = std::env::temp_dir().join(format!("lineage-api-photos-{}", Uuid::new_v4()));
    let state = AppState {
      photos: Arc::new(FsPhotoStore::new(&dir, "http://photos.test")),
      ..make_state().await
    };

    let (status, _) = send(
      &state,
      "POST",
      "/persons",
      None,
      Some(json!({
        "firstname": "",
        "surname": "Lovelace",
        "dob": "1815-12-10",
        "photo": { "media_type": "image/png", "data": B64.encode(b"\x89PNG") },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!dir.exists());
  }

  #[tokio::test]
  async fn update_uploads_photo_and_ignores_raw_uri() {
    let state = make_state().await;
    let id = create(&state, "Ada", "Lovelace").await;
    let path = format!("/persons/{id}");

    let (status, body) = send(
      &state,
      "PUT",
      &path,
      Some(id),
      Some(json!({ "profile_pic": "http://elsewhere/evil.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_pic"], Value::Null);

    let (status, body) = send(
      &state,
      "PUT",
      &path,
      Some(id),
      Some(json!({
        "photo": { "media_type": "image/jpeg", "data": B64.encode(b"\xff\xd8jpeg") },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let uri = body["profile_pic"].as_str().unwrap();
    assert!(uri.starts_with("http://photos.test/") && uri.ends_with(".jpg"), "{uri}");
    assert_eq!(body["firstname"], "Ada");
  }

  #[tokio::test]
  async fn update_with_bad_photo_changes_nothing() {
    let state = make_state().await;
    let id = create(&state, "Ada", "Lovelace").await;

    let (status, _) = send(
      &state,
      "PUT",
      &format!("/persons/{id}"),
      Some(id),
      Some(json!({
        "instagram": "@ada",
        "photo": { "media_type": "text/plain", "data": B64.encode("hi") },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&state, "GET", &format!("/persons/{id}"), None, None).await;
    assert_eq!(body["instagram"], Value::Null);
  }

  #[tokio::test]
  async fn update_requires_userid_header() {
    let state = make_state().await;
    let id = create(&state, "Ada", "Lovelace").await;
    let (status, _) = send(
      &state,
      "PUT",
      &format!("/persons/{id}"),
      None,
      Some(json!({ "instagram": "@ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn self_update_merges_only_supplied_fields() {
    let state = make_state().await;
    let id = create(&state, "Ada", "Lovelace").await;
    let (_, before) = send(&state, "GET", &format!("/persons/{id}"), None, None).await;

    let (status, after) = send(
      &state,
      "PUT",
      &format!("/persons/{id}"),
      Some(id),
      Some(json!({ "instagram": "@ada", "firstname": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["instagram"], "@ada");
    for field in ["firstname", "surname", "dob", "gender", "profile_pic", "anniversary"] {
      assert_eq!(after[field], before[field], "{field} changed");
    }
  }

  #[tokio::test]
  async fn stranger_cannot_update_but_admin_can() {
    let state = make_state().await;
    let target = create(&state, "Ada", "Lovelace").await;
    let stranger = create(&state, "Charles", "Babbage").await;

    let path = format!("/persons/{target}");
    let body = json!({ "instagram": "@ada" });

    let (status, _) = send(&state, "PUT", &path, Some(stranger), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    state
      .store
      .set_role(stranger, Some(Role::Admin))
      .await
      .unwrap();
    let (status, _) = send(&state, "PUT", &path, Some(stranger), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_editor_is_forbidden() {
    let state = make_state().await;
    let target = create(&state, "Ada", "Lovelace").await;
    let (status, _) = send(
      &state,
      "PUT",
      &format!("/persons/{target}"),
      Some(Uuid::new_v4()),
      Some(json!({ "instagram": "@ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Mutators ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_father_links_and_grants_edit_both_ways() {
    let state = make_state().await;
    let child = create(&state, "Jane", "Doe").await;

    let (status, outcome) = send(
      &state,
      "POST",
      &format!("/add-father/{child}"),
      Some(child),
      Some(relative("John")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{outcome}");
    assert_eq!(outcome["person"]["gender"], "male");
    let father: Uuid = outcome["person"]["person_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(outcome["parent_child"][0]["parent_id"], father.to_string());
    assert_eq!(outcome["parent_child"][0]["child_id"], child.to_string());

    let update = json!({ "instagram": "@x" });
    let (status, _) =
      send(&state, "PUT", &format!("/persons/{child}"), Some(father), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
      send(&state, "PUT", &format!("/persons/{father}"), Some(child), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn add_sibling_without_parents_is_412_and_creates_nobody() {
    let state = make_state().await;
    let target = create(&state, "Jane", "Doe").await;

    let (status, body) = send(
      &state,
      "POST",
      &format!("/add-sibling/{target}"),
      Some(target),
      Some(relative("Jim")),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(body["error"].is_string());
    assert_eq!(person_count(&state).await, 1);
  }

  #[tokio::test]
  async fn add_child_to_a_couple_links_both_partners() {
    let state = make_state().await;
    let mum = create(&state, "Mary", "Doe").await;

    let (status, spouse) = send(
      &state,
      "POST",
      &format!("/add-spouse/{mum}"),
      Some(mum),
      Some(relative("Joe")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(spouse["person"]["married"], true);
    assert!(spouse["marriage"].is_object());

    let (status, outcome) = send(
      &state,
      "POST",
      &format!("/add-child/{mum}"),
      Some(mum),
      Some(relative("Kid")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["parent_child"].as_array().unwrap().len(), 2);

    let (_, graph) = send(&state, "GET", "/persons", None, None).await;
    assert_eq!(graph["persons"].as_array().unwrap().len(), 3);
    assert_eq!(graph["relationships"].as_array().unwrap().len(), 2);
    assert_eq!(graph["marriages"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn mutator_requires_permission_on_target() {
    let state = make_state().await;
    let target = create(&state, "Jane", "Doe").await;
    let stranger = create(&state, "Sam", "Smith").await;

    let (status, _) = send(
      &state,
      "POST",
      &format!("/add-mother/{target}"),
      Some(stranger),
      Some(relative("Ann")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(person_count(&state).await, 2);
  }

  #[tokio::test]
  async fn admin_mutator_on_unknown_target_is_404() {
    let state = make_state().await;
    let admin = create(&state, "Root", "Admin").await;
    state.store.set_role(admin, Some(Role::Admin)).await.unwrap();

    let (status, _) = send(
      &state,
      "POST",
      &format!("/add-child/{}", Uuid::new_v4()),
      Some(admin),
      Some(relative("Kid")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(person_count(&state).await, 1);
  }
}
