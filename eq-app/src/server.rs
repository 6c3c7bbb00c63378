//! EquiManage server: seeds the session store and mounts the API.

use crate::config::EquiManageConfig;
use crate::routes;
use anyhow::Result;
use axum::Extension;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::response::Response;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use eq_core::{MessageId, SessionStore};
use eq_llm::{ExtractorClient, RosterContext};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    /// All session state. Mutated only through the interaction handlers.
    pub store: RwLock<SessionStore>,
    pub extractor: ExtractorClient,
    /// Per-message review guard: while an extraction is outstanding for a
    /// message id, further reviews of that id are refused instead of issuing
    /// a duplicate call. Independent messages are not serialized.
    pub reviews_in_flight: DashMap<MessageId, ()>,
    pub started_at: Instant,
}

impl AppState {
    /// Claim the review slot for one message. `None` means a review for this
    /// id is already outstanding; the returned guard releases the slot on
    /// drop, so a request future dropped mid-extraction (client disconnect,
    /// request timeout) cannot wedge the message.
    pub fn begin_review(self: &Arc<Self>, message_id: &MessageId) -> Option<ReviewGuard> {
        match self.reviews_in_flight.entry(message_id.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(ReviewGuard {
                    state: Arc::clone(self),
                    message_id: message_id.clone(),
                })
            }
        }
    }
}

pub struct ReviewGuard {
    state: Arc<AppState>,
    message_id: MessageId,
}

impl Drop for ReviewGuard {
    fn drop(&mut self) {
        self.state.reviews_in_flight.remove(&self.message_id);
    }
}

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = EquiManageConfig::load(config_path).await?;
    let extractor = build_extractor(&cfg)?;
    tracing::info!(
        model = %cfg.general.model,
        provider = ?extractor.provider(),
        port = cfg.server.port,
        "config ok"
    );
    Ok(())
}

pub async fn extract_one_shot(config_path: Option<PathBuf>, message: &str) -> Result<()> {
    let cfg = EquiManageConfig::load(config_path).await?;
    let extractor = build_extractor(&cfg)?;
    let store = SessionStore::seeded(Utc::now());
    let roster = RosterContext::from_store(&store);

    let proposal = extractor.extract(message, &roster, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&proposal)?);
    Ok(())
}

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = EquiManageConfig::load(config_path).await?;
    let started_at = Instant::now();
    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.server.port));
    tracing::info!(
        bind_addr = %addr,
        model = %cfg.general.model,
        http_timeout_seconds = cfg.server.http_timeout_seconds,
        http_max_in_flight = cfg.server.http_max_in_flight,
        "server configuration loaded"
    );
    let listener = preflight_bind_listener(addr).await?;

    let extractor = build_extractor(&cfg)?;
    let store = SessionStore::seeded(Utc::now());
    tracing::info!(
        stables = store.stables().len(),
        horses = store.horses().len(),
        pending_messages = store.pending_messages().len(),
        "session store seeded"
    );

    let state = Arc::new(AppState {
        store: RwLock::new(store),
        extractor,
        reviews_in_flight: DashMap::new(),
        started_at,
    });

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id_from_headers(request.headers())
            )
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                tracing::error!(
                    error_class = %error,
                    latency_ms = latency.as_millis() as u64,
                    "http request failed"
                );
            },
        );

    let app = routes::router()
        .layer(Extension(state))
        .layer(GlobalConcurrencyLimitLayer::new(cfg.server.http_max_in_flight))
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.server.http_timeout_seconds,
        )))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    tracing::info!(%addr, "equimanage serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("http server shutdown completed");

    Ok(())
}

fn build_extractor(cfg: &EquiManageConfig) -> Result<ExtractorClient> {
    let api_key = cfg.api_key_for_model().ok_or_else(|| {
        anyhow::anyhow!(
            "no api key configured for model {:?}; set keys.gemini_api_key or keys.openai_api_key",
            cfg.general.model
        )
    })?;
    Ok(ExtractorClient::new(&api_key, &cfg.general.model)?)
}

async fn preflight_bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tracing::info!(%addr, "preflight bind check starting");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("preflight bind failed for {addr}: {e}"))?;
    tracing::info!(%addr, "preflight bind check passed");
    Ok(listener)
}

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
                if let Err(ctrlc_err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %ctrlc_err, "failed to await ctrl-c signal");
                }
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("received ctrl-c; beginning graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::warn!("received SIGTERM; beginning graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to await ctrl-c signal");
        } else {
            tracing::warn!("received ctrl-c; beginning graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            store: RwLock::new(SessionStore::seeded(Utc::now())),
            extractor: ExtractorClient::new("test-key", "gemini-2.5-flash").expect("client"),
            reviews_in_flight: DashMap::new(),
            started_at: Instant::now(),
        })
    }

    #[test]
    fn review_slot_is_exclusive_per_message_and_released_on_drop() {
        let state = state();
        let id = MessageId::new("msg-1");

        let held = state.begin_review(&id).expect("first claim");
        assert!(state.begin_review(&id).is_none());
        assert!(
            state.begin_review(&MessageId::new("msg-2")).is_some(),
            "independent messages must not be serialized"
        );

        drop(held);
        assert!(
            state.begin_review(&id).is_some(),
            "a released slot must be claimable again"
        );
    }
}
