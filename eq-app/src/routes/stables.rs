use crate::server::AppState;
use axum::routing::get;
use axum::{Extension, Json};
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/stable/stables", get(list_stables))
}

/// Dashboard listing: every stable with the horses boarded there.
#[tracing::instrument(level = "debug", skip_all)]
async fn list_stables(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    let stables: Vec<serde_json::Value> = store
        .stables()
        .iter()
        .map(|stable| {
            let horses: Vec<serde_json::Value> = store
                .horses()
                .iter()
                .filter(|h| h.stable_id == stable.id)
                .map(|h| {
                    serde_json::json!({
                        "id": h.id,
                        "name": h.name,
                        "image_url": h.image_url,
                        "owners": h.owners.iter().map(|o| o.name.clone()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            serde_json::json!({
                "id": stable.id,
                "name": stable.name,
                "location": stable.location,
                "horses": horses,
            })
        })
        .collect();

    Json(serde_json::json!({ "stables": stables }))
}
