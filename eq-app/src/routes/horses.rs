use crate::server::AppState;
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Extension, Json};
use chrono::{NaiveDateTime, Utc};
use eq_core::{
    Appointment, AppointmentId, HorseId, Recurrence, StoreError, Task, TaskId,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateAppointmentRequest {
    title: String,
    #[serde(default)]
    date: Option<NaiveDateTime>,
    #[serde(default)]
    recurring: Option<Recurrence>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateTaskRequest {
    description: String,
    #[serde(default)]
    due_date: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompleteTaskRequest {
    #[serde(default = "default_completed")]
    completed: bool,
}

fn default_completed() -> bool {
    true
}

pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/api/v1/stable/horses", get(list_horses))
        .route("/api/v1/stable/horses/{id}", get(get_horse))
        .route(
            "/api/v1/stable/horses/{id}/appointments",
            post(create_appointment),
        )
        .route("/api/v1/stable/horses/{id}/tasks", post(create_task))
        .route(
            "/api/v1/stable/horses/{id}/tasks/{task_id}/complete",
            post(complete_task),
        )
}

#[tracing::instrument(level = "debug", skip_all)]
async fn list_horses(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    let horses: Vec<serde_json::Value> = store
        .horses()
        .iter()
        .map(|h| {
            serde_json::json!({
                "id": h.id,
                "name": h.name,
                "stable_id": h.stable_id,
                "image_url": h.image_url,
                "owners": h.owners.iter().map(|o| o.name.clone()).collect::<Vec<_>>(),
                "appointments": h.appointments.len(),
                "tasks": h.tasks.len(),
                "attachments": h.attachments.len(),
            })
        })
        .collect();
    Json(serde_json::json!({ "horses": horses }))
}

/// Detail view: the full record with appointments, tasks and attachments.
#[tracing::instrument(level = "debug", skip_all)]
async fn get_horse(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    match store.horse(&HorseId::from(id.as_str())) {
        Some(horse) => Json(serde_json::json!({ "status": "ok", "horse": horse })),
        None => Json(serde_json::json!({ "status": "not_found" })),
    }
}

#[tracing::instrument(level = "info", skip_all)]
async fn create_appointment(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Json<serde_json::Value> {
    if req.title.trim().is_empty() {
        return Json(serde_json::json!({ "status": "error", "error": "title is required" }));
    }
    let appointment = Appointment {
        id: AppointmentId::fresh(),
        title: req.title,
        date: req.date.map(|d| d.and_utc()).unwrap_or_else(Utc::now),
        recurring: req.recurring.unwrap_or(Recurrence::None),
    };
    let appointment_id = appointment.id.clone();

    let mut store = state.store.write().await;
    match store.append_appointment(&HorseId::from(id.as_str()), appointment) {
        Ok(()) => Json(serde_json::json!({ "status": "ok", "appointment_id": appointment_id })),
        Err(e @ StoreError::HorseNotFound(_)) => {
            tracing::warn!(error = %e, "appointment creation against unknown horse");
            Json(serde_json::json!({ "status": "not_found" }))
        }
        Err(e) => Json(serde_json::json!({ "status": "error", "error": e.to_string() })),
    }
}

#[tracing::instrument(level = "info", skip_all)]
async fn create_task(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> Json<serde_json::Value> {
    if req.description.trim().is_empty() {
        return Json(serde_json::json!({ "status": "error", "error": "description is required" }));
    }
    let task = Task {
        id: TaskId::fresh(),
        description: req.description,
        due_date: req.due_date.map(|d| d.and_utc()).unwrap_or_else(Utc::now),
        completed: false,
    };
    let task_id = task.id.clone();

    let mut store = state.store.write().await;
    match store.append_task(&HorseId::from(id.as_str()), task) {
        Ok(()) => Json(serde_json::json!({ "status": "ok", "task_id": task_id })),
        Err(e @ StoreError::HorseNotFound(_)) => {
            tracing::warn!(error = %e, "task creation against unknown horse");
            Json(serde_json::json!({ "status": "not_found" }))
        }
        Err(e) => Json(serde_json::json!({ "status": "error", "error": e.to_string() })),
    }
}

#[tracing::instrument(level = "info", skip_all)]
async fn complete_task(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, task_id)): Path<(String, String)>,
    Json(req): Json<CompleteTaskRequest>,
) -> Json<serde_json::Value> {
    let mut store = state.store.write().await;
    match store.set_task_completed(
        &HorseId::from(id.as_str()),
        &TaskId::from(task_id.as_str()),
        req.completed,
    ) {
        Ok(()) => Json(serde_json::json!({ "status": "ok", "completed": req.completed })),
        Err(e) => {
            tracing::warn!(error = %e, "task completion toggle failed");
            Json(serde_json::json!({ "status": "not_found" }))
        }
    }
}
