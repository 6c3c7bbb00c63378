//! Turns a validated proposal into a concrete domain mutation.

use crate::directory;
use crate::model::{Appointment, AppointmentId, HorseId, MessageId, Recurrence, Task, TaskId};
use crate::proposal::{ActionKind, ActionProposal};
use crate::store::{SessionStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The proposal does not mention a horse; creation is blocked until it
    /// does, the user may only ignore the message.
    #[error("proposal does not name a horse")]
    MissingHorse,

    #[error("no horse named {0:?} in the roster")]
    UnknownHorse(String),

    /// Queries have no automatic action; they are shown for manual follow-up.
    #[error("a query has no automatic action")]
    NotActionable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    AppointmentCreated {
        horse_id: HorseId,
        appointment_id: AppointmentId,
    },
    TaskCreated {
        horse_id: HorseId,
        task_id: TaskId,
    },
}

/// Apply a proposal to the store.
///
/// Preconditions are checked before any mutation: the horse mention must be
/// present and resolve exactly against the roster. On success exactly one
/// record is appended to the resolved horse and the originating message is
/// disposed. On any error the store is untouched and the message stays
/// pending.
#[tracing::instrument(level = "info", skip(store, proposal))]
pub fn reconcile(
    store: &mut SessionStore,
    message_id: &MessageId,
    proposal: &ActionProposal,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = proposal
        .horse_name
        .as_deref()
        .ok_or(ReconcileError::MissingHorse)?;
    let horse_id = directory::find_horse_by_name(store, name)
        .map(|h| h.id.clone())
        .ok_or_else(|| ReconcileError::UnknownHorse(name.to_string()))?;

    // Wire dates are timezone-less; records carry UTC.
    let date = proposal.date.map(|d| d.and_utc()).unwrap_or(now);

    let outcome = match proposal.kind {
        ActionKind::Query => return Err(ReconcileError::NotActionable),
        ActionKind::Appointment => {
            let appointment = Appointment {
                id: AppointmentId::fresh(),
                title: proposal.details.clone(),
                date,
                recurring: Recurrence::None,
            };
            let appointment_id = appointment.id.clone();
            store.append_appointment(&horse_id, appointment)?;
            ReconcileOutcome::AppointmentCreated {
                horse_id,
                appointment_id,
            }
        }
        ActionKind::Task => {
            let task = Task {
                id: TaskId::fresh(),
                description: proposal.details.clone(),
                due_date: date,
                completed: false,
            };
            let task_id = task.id.clone();
            store.append_task(&horse_id, task)?;
            ReconcileOutcome::TaskCreated { horse_id, task_id }
        }
    };

    store.dispose_message(message_id);
    tracing::info!(message_id = %message_id, outcome = ?outcome, "message reconciled");
    Ok(outcome)
}
