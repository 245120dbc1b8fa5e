//! Integration tests for `SqliteStore` against an in-memory database, driven
//! through the artifact gateway where possible.

use std::sync::Arc;

use curio_core::{
  ArtifactGateway, Error as GatewayError,
  artifact::{ArtifactPayload, NewArImage, NewImage},
  client::{Filter, RemoteTableClient, Select, Table},
  context::{AccessToken, RequestContext},
};
use serde_json::json;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn gateway(store: &SqliteStore) -> ArtifactGateway<SqliteStore> {
  ArtifactGateway::new(RequestContext::new(Arc::new(store.clone())))
}

fn token() -> AccessToken { AccessToken::new("editor-token") }

fn payload(name: &str, object_id: &str) -> ArtifactPayload {
  ArtifactPayload {
    name:        name.into(),
    object_id:   object_id.into(),
    date:        "c. 500 BC".into(),
    dimensions:  "30 x 20 cm".into(),
    description: format!("{name}, excavated near the river"),
  }
}

fn is_permission_denied(err: &GatewayError) -> bool {
  match err {
    GatewayError::Remote(inner) => {
      matches!(inner.downcast_ref::<Error>(), Some(Error::PermissionDenied(_)))
    }
    _ => false,
  }
}

fn is_database_error(err: &GatewayError) -> bool {
  match err {
    GatewayError::Remote(inner) => {
      matches!(inner.downcast_ref::<Error>(), Some(Error::Database(_)))
    }
    _ => false,
  }
}

// ─── Create / read ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_round_trips_payload() {
  let s = store().await;
  let gw = gateway(&s);
  let input = payload("Amphora", "A-001");

  let id = gw.create_artifact(&input, &token()).await.unwrap();
  let artifact = gw.get_artifact(id).await.unwrap();

  assert_eq!(artifact.id, id);
  assert_eq!(artifact.name, input.name);
  assert_eq!(artifact.object_id, input.object_id);
  assert_eq!(artifact.date, input.date);
  assert_eq!(artifact.dimensions, input.dimensions);
  assert_eq!(artifact.description, input.description);
  assert!(artifact.images.is_empty());
  assert_eq!(artifact.ar_image, None);
  assert_eq!(artifact.like_count, 0);
}

#[tokio::test]
async fn create_without_usable_token_leaves_no_row() {
  let s = store().await;
  let gw = gateway(&s);

  let err = gw
    .create_artifact(&payload("Amphora", "A-001"), &AccessToken::new("  "))
    .await
    .unwrap_err();
  assert!(is_permission_denied(&err), "{err:?}");

  let direct = s
    .insert(Table::Artifacts, json!({ "name": "Ghost" }), None)
    .await;
  assert!(matches!(direct, Err(Error::PermissionDenied(Table::Artifacts))));

  assert!(gw.list_artifacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn configured_tokens_restrict_writes() {
  let s = store().await.with_tokens(["service-key".to_owned()]);
  let gw = gateway(&s);

  let err = gw
    .create_artifact(&payload("Amphora", "A-001"), &token())
    .await
    .unwrap_err();
  assert!(is_permission_denied(&err));

  gw.create_artifact(&payload("Amphora", "A-001"), &AccessToken::new("service-key"))
    .await
    .unwrap();
  assert_eq!(gw.list_artifacts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
  let s = store().await;
  assert!(matches!(
    gateway(&s).get_artifact(404).await,
    Err(GatewayError::NotFound(404))
  ));
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_sorted_by_name_with_first_image() {
  let s = store().await;
  let gw = gateway(&s);
  let coin = gw.create_artifact(&payload("Coin", "C-1"), &token()).await.unwrap();
  gw.create_artifact(&payload("Amphora", "A-1"), &token()).await.unwrap();
  gw.create_artifact(&payload("Brooch", "B-1"), &token()).await.unwrap();

  for caption in ["Obverse", "Reverse"] {
    let image = NewImage {
      artifact_id: coin,
      caption:     caption.into(),
      url:         format!("https://img.example/{caption}.jpg"),
    };
    gw.add_image_to_artifact(&image, &token()).await.unwrap();
  }

  let list = gw.list_artifacts().await.unwrap();
  let names: Vec<_> = list.iter().map(|a| a.name.as_str()).collect();
  assert_eq!(names, ["Amphora", "Brooch", "Coin"]);
  assert_eq!(list[0].image, None);
  assert_eq!(list[2].image.as_ref().map(|i| i.caption.as_str()), Some("Obverse"));
  assert_eq!(list[2].object_id, "C-1");
}

#[tokio::test]
async fn empty_text_is_rejected_on_write() {
  let s = store().await;
  let gw = gateway(&s);

  let err = gw
    .create_artifact(&payload("", "X-1"), &token())
    .await
    .unwrap_err();
  assert!(is_database_error(&err), "{err:?}");
  assert!(gw.list_artifacts().await.unwrap().is_empty());

  let id = gw.create_artifact(&payload("Vase", "V-1"), &token()).await.unwrap();
  let image = NewImage { artifact_id: id, caption: String::new(), url: "v.jpg".into() };
  let err = gw.add_image_to_artifact(&image, &token()).await.unwrap_err();
  assert!(is_database_error(&err), "{err:?}");

  let ar = NewArImage { artifact_id: id, url: String::new() };
  assert!(gw.add_ar_image_to_artifact(&ar, &token()).await.is_err());

  let artifact = gw.get_artifact(id).await.unwrap();
  assert!(artifact.images.is_empty());
  assert_eq!(artifact.ar_image, None);
}

// ─── Images ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn images_are_returned_in_insertion_order() {
  let s = store().await;
  let gw = gateway(&s);
  let id = gw.create_artifact(&payload("Vase", "V-1"), &token()).await.unwrap();

  for caption in ["Front", "Back", "Base"] {
    let image = NewImage {
      artifact_id: id,
      caption:     caption.into(),
      url:         format!("{caption}.jpg"),
    };
    gw.add_image_to_artifact(&image, &token()).await.unwrap();
  }

  let captions: Vec<_> = gw
    .get_artifact(id)
    .await
    .unwrap()
    .images
    .into_iter()
    .map(|i| i.caption)
    .collect();
  assert_eq!(captions, ["Front", "Back", "Base"]);
}

#[tokio::test]
async fn ar_image_upsert_overwrites_instead_of_duplicating() {
  let s = store().await;
  let gw = gateway(&s);
  let id = gw.create_artifact(&payload("Helmet", "H-1"), &token()).await.unwrap();

  for url in ["first.usdz", "second.usdz"] {
    let image = NewArImage { artifact_id: id, url: url.into() };
    gw.add_ar_image_to_artifact(&image, &token()).await.unwrap();
  }

  let rows = s
    .select(
      &Select::table(Table::ArtifactArImages)
        .columns(["id", "url"])
        .eq("artifact_id", id),
      None,
    )
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["url"], "second.usdz");

  let artifact = gw.get_artifact(id).await.unwrap();
  assert_eq!(artifact.ar_image.map(|a| a.url), Some("second.usdz".to_owned()));
}

#[tokio::test]
async fn image_for_missing_artifact_is_rejected() {
  let s = store().await;
  let image = NewImage {
    artifact_id: 77,
    caption:     "Orphan".into(),
    url:         "orphan.jpg".into(),
  };
  let err = gateway(&s)
    .add_image_to_artifact(&image, &token())
    .await
    .unwrap_err();
  assert!(matches!(err, GatewayError::Remote(_)));
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn likes_accumulate_per_call() {
  let s = store().await;
  let gw = gateway(&s);
  let id = gw.create_artifact(&payload("Mask", "M-1"), &token()).await.unwrap();

  assert_eq!(gw.like_artifact(id).await.unwrap(), json!(1));
  assert_eq!(gw.like_artifact(id).await.unwrap(), json!(2));
  assert_eq!(gw.get_artifact(id).await.unwrap().like_count, 2);
}

#[tokio::test]
async fn unknown_procedure_is_reported() {
  let s = store().await;
  let result = s.call("drop_everything", json!({}), None).await;
  assert!(matches!(result, Err(Error::UnknownProcedure(p)) if p == "drop_everything"));
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_changes_only_the_matching_row() {
  let s = store().await;
  let gw = gateway(&s);
  let a = gw.create_artifact(&payload("Amphora", "A-1"), &token()).await.unwrap();
  let b = gw.create_artifact(&payload("Brooch", "B-1"), &token()).await.unwrap();

  let mut edited = payload("Amphora (restored)", "A-1R");
  edited.dimensions = "31 x 20 cm".into();
  gw.update_artifact(a, &edited, &token()).await.unwrap();

  let updated = gw.get_artifact(a).await.unwrap();
  assert_eq!(updated.name, "Amphora (restored)");
  assert_eq!(updated.object_id, "A-1R");
  assert_eq!(updated.dimensions, "31 x 20 cm");
  assert_eq!(gw.get_artifact(b).await.unwrap().name, "Brooch");
}

#[tokio::test]
async fn delete_removes_artifact_and_children() {
  let s = store().await;
  let gw = gateway(&s);
  let id = gw.create_artifact(&payload("Lamp", "L-1"), &token()).await.unwrap();
  let image = NewImage { artifact_id: id, caption: "Lit".into(), url: "lit.jpg".into() };
  gw.add_image_to_artifact(&image, &token()).await.unwrap();
  gw.like_artifact(id).await.unwrap();

  gw.delete_artifact(id, &token()).await.unwrap();

  assert!(matches!(gw.get_artifact(id).await, Err(GatewayError::NotFound(_))));
  let images = s
    .select(&Select::table(Table::ArtifactImages).columns(["id"]), None)
    .await
    .unwrap();
  assert!(images.is_empty());
}

#[tokio::test]
async fn delete_without_token_keeps_row() {
  let s = store().await;
  let gw = gateway(&s);
  let id = gw.create_artifact(&payload("Lamp", "L-1"), &token()).await.unwrap();

  let err = gw.delete_artifact(id, &AccessToken::new("")).await.unwrap_err();
  assert!(is_permission_denied(&err));
  assert!(gw.get_artifact(id).await.is_ok());
}

#[tokio::test]
async fn unfiltered_update_is_refused() {
  let s = store().await;
  let result = s
    .update(Table::Artifacts, json!({ "name": "Everything" }), &[], Some(&token()))
    .await;
  assert!(matches!(result, Err(Error::MissingFilter { action: "update", .. })));
}

// ─── Query validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_columns_are_rejected() {
  let s = store().await;

  let select = s
    .select(&Select::table(Table::Artifacts).columns(["password"]), None)
    .await;
  assert!(matches!(
    select,
    Err(Error::UnknownColumn { table: Table::Artifacts, column }) if column == "password"
  ));

  let filters = [Filter::eq("1 = 1; --", 1)];
  let delete = s.delete(Table::Artifacts, &filters, Some(&token())).await;
  assert!(matches!(delete, Err(Error::UnknownColumn { .. })));
}

#[tokio::test]
async fn unrelated_embed_is_rejected() {
  let s = store().await;
  let result = s
    .select(
      &Select::table(Table::Likes).embed(Table::ArtifactImages, ["id"]),
      None,
    )
    .await;
  assert!(matches!(result, Err(Error::UnknownRelation { .. })));
}
