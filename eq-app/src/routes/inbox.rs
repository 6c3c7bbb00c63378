//! Pending-message inbox: listing, AI review, apply and ignore.

use crate::server::AppState;
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Extension, Json};
use chrono::Utc;
use eq_core::{ActionProposal, InboundMessage, MessageId, directory, reconcile};
use eq_llm::{EXTRACTION_FAILED_MESSAGE, RosterContext};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReceiveMessageRequest {
    from: String,
    text: String,
}

pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/api/v1/stable/inbox", get(list_inbox).post(receive_message))
        .route("/api/v1/stable/inbox/{id}/review", post(review_message))
        .route("/api/v1/stable/inbox/{id}/apply", post(apply_proposal))
        .route("/api/v1/stable/inbox/{id}/ignore", post(ignore_message))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn list_inbox(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    let messages: Vec<serde_json::Value> = store
        .pending_messages()
        .iter()
        .map(|m| {
            let sender = directory::find_owner_by_phone(&store, &m.from);
            serde_json::json!({
                "id": m.id,
                "from": m.from,
                "sender_name": sender.map(|o| o.name.clone()),
                "text": m.text,
                "received_at": m.received_at,
            })
        })
        .collect();
    Json(serde_json::json!({ "messages": messages }))
}

/// Enqueue a pending message, standing in for the inbound channel.
#[tracing::instrument(level = "info", skip_all)]
async fn receive_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<ReceiveMessageRequest>,
) -> Json<serde_json::Value> {
    if req.text.trim().is_empty() {
        return Json(serde_json::json!({ "status": "error", "error": "text is required" }));
    }
    let message = InboundMessage {
        id: MessageId::fresh(),
        from: req.from,
        text: req.text,
        received_at: Utc::now(),
    };
    let id = message.id.clone();
    let mut store = state.store.write().await;
    store.receive_message(message);
    Json(serde_json::json!({ "status": "ok", "message_id": id }))
}

/// Run extraction for one message. At most one review per message id may be
/// outstanding; extraction failure leaves all state untouched and the caller
/// retries by calling again.
#[tracing::instrument(level = "info", skip_all, fields(message_id = %id))]
async fn review_message(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let message_id = MessageId::from(id.as_str());

    // Snapshot under the read lock; the network call happens without it.
    let (text, roster) = {
        let store = state.store.read().await;
        let Some(message) = store.message(&message_id) else {
            return Json(serde_json::json!({ "status": "not_found" }));
        };
        (message.text.clone(), RosterContext::from_store(&store))
    };

    // The guard is held across the extraction await and releases the slot on
    // drop, so a request dropped mid-flight never leaves the message wedged.
    let Some(_review) = state.begin_review(&message_id) else {
        return Json(serde_json::json!({ "status": "busy" }));
    };

    let result = state.extractor.extract(&text, &roster, Utc::now()).await;

    match result {
        Ok(proposal) => Json(serde_json::json!({ "status": "ok", "proposal": proposal })),
        Err(e) => {
            tracing::warn!(error = %e, "extraction failed");
            Json(serde_json::json!({ "status": "error", "error": EXTRACTION_FAILED_MESSAGE }))
        }
    }
}

/// Reconcile a reviewed proposal into a concrete record. On success the
/// message leaves the inbox; on rejection it stays pending.
#[tracing::instrument(level = "info", skip_all, fields(message_id = %id))]
async fn apply_proposal(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(proposal): Json<ActionProposal>,
) -> Json<serde_json::Value> {
    let message_id = MessageId::from(id.as_str());
    let mut store = state.store.write().await;
    if store.message(&message_id).is_none() {
        return Json(serde_json::json!({ "status": "not_found" }));
    }

    match reconcile(&mut store, &message_id, &proposal, Utc::now()) {
        Ok(outcome) => Json(serde_json::json!({ "status": "ok", "outcome": outcome })),
        Err(e) => {
            tracing::info!(error = %e, "proposal rejected");
            Json(serde_json::json!({ "status": "rejected", "error": e.to_string() }))
        }
    }
}

/// Dispose a message without acting on it. Idempotent.
#[tracing::instrument(level = "info", skip_all, fields(message_id = %id))]
async fn ignore_message(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let message_id = MessageId::from(id.as_str());
    let mut store = state.store.write().await;
    let removed = store.dispose_message(&message_id);
    Json(serde_json::json!({ "status": "ok", "removed": removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use eq_core::SessionStore;
    use eq_llm::ExtractorClient;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};
    use std::time::Instant;
    use tokio::sync::RwLock;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            store: RwLock::new(SessionStore::seeded(Utc::now())),
            extractor: ExtractorClient::new("test-key", "gemini-2.5-flash").expect("client"),
            reviews_in_flight: DashMap::new(),
            started_at: Instant::now(),
        })
    }

    #[tokio::test]
    async fn second_review_of_same_message_reports_busy() {
        let state = test_state();
        let message_id = MessageId::new("msg-1");
        let _outstanding = state.begin_review(&message_id).expect("first claim");

        let Json(body) = review_message(Extension(state.clone()), Path("msg-1".to_string())).await;
        assert_eq!(body["status"], "busy");
    }

    #[tokio::test]
    async fn review_of_unknown_message_reports_not_found() {
        let state = test_state();
        let Json(body) =
            review_message(Extension(state.clone()), Path("msg-999".to_string())).await;
        assert_eq!(body["status"], "not_found");
        assert!(state.reviews_in_flight.is_empty());
    }

    #[tokio::test]
    async fn dropped_review_releases_the_slot() {
        let state = test_state();
        let message_id = MessageId::new("msg-1");

        {
            let mut review = pin!(review_message(
                Extension(state.clone()),
                Path("msg-1".to_string()),
            ));
            let mut cx = Context::from_waker(Waker::noop());
            let mut claimed = false;
            for _ in 0..16 {
                if state.reviews_in_flight.contains_key(&message_id) {
                    claimed = true;
                    break;
                }
                if let Poll::Ready(_) = review.as_mut().poll(&mut cx) {
                    break;
                }
            }
            assert!(claimed, "slot should be claimed while extraction is outstanding");
        }

        assert!(
            !state.reviews_in_flight.contains_key(&message_id),
            "dropping the request mid-extraction must release the slot"
        );
        let Json(body) = review_message(Extension(state.clone()), Path("msg-1".to_string())).await;
        assert_ne!(body["status"], "busy");
    }

    #[tokio::test]
    async fn extraction_failure_leaves_the_inbox_untouched() {
        let state = test_state();
        let message_id = MessageId::new("msg-1");
        let pending_before = state.store.read().await.pending_messages().len();

        let Json(body) = review_message(Extension(state.clone()), Path("msg-1".to_string())).await;

        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], EXTRACTION_FAILED_MESSAGE);
        let store = state.store.read().await;
        assert_eq!(store.pending_messages().len(), pending_before);
        assert!(store.message(&message_id).is_some());
        assert!(state.reviews_in_flight.is_empty());
    }
}
