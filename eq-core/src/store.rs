//! In-memory session state for the process lifetime.
//!
//! The store is an explicitly owned object: constructed once (seeded or
//! empty), passed by reference to whoever mutates it. Mutation is append-only
//! on horse records plus filter-removal from the inbox; nothing is edited in
//! place except the task completion flag.

use crate::model::{
    Appointment, Horse, HorseId, InboundMessage, MessageId, Owner, Stable, Task, TaskId,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("horse not found: {0}")]
    HorseNotFound(HorseId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    stables: Vec<Stable>,
    owners: Vec<Owner>,
    horses: Vec<Horse>,
    inbox: Vec<InboundMessage>,
}

impl SessionStore {
    pub fn new(
        stables: Vec<Stable>,
        owners: Vec<Owner>,
        horses: Vec<Horse>,
        inbox: Vec<InboundMessage>,
    ) -> Self {
        Self {
            stables,
            owners,
            horses,
            inbox,
        }
    }

    pub fn stables(&self) -> &[Stable] {
        &self.stables
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn horses(&self) -> &[Horse] {
        &self.horses
    }

    pub fn horse(&self, id: &HorseId) -> Option<&Horse> {
        self.horses.iter().find(|h| &h.id == id)
    }

    pub fn pending_messages(&self) -> &[InboundMessage] {
        &self.inbox
    }

    pub fn message(&self, id: &MessageId) -> Option<&InboundMessage> {
        self.inbox.iter().find(|m| &m.id == id)
    }

    /// Enqueue a message into the pending inbox, simulating the inbound
    /// channel delivering it.
    pub fn receive_message(&mut self, message: InboundMessage) {
        self.inbox.push(message);
    }

    pub fn append_appointment(&mut self, horse_id: &HorseId, appointment: Appointment) -> Result<()> {
        let horse = self.horse_mut(horse_id)?;
        horse.appointments.push(appointment);
        Ok(())
    }

    pub fn append_task(&mut self, horse_id: &HorseId, task: Task) -> Result<()> {
        let horse = self.horse_mut(horse_id)?;
        horse.tasks.push(task);
        Ok(())
    }

    pub fn set_task_completed(
        &mut self,
        horse_id: &HorseId,
        task_id: &TaskId,
        completed: bool,
    ) -> Result<()> {
        let horse = self.horse_mut(horse_id)?;
        let task = horse
            .tasks
            .iter_mut()
            .find(|t| &t.id == task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))?;
        task.completed = completed;
        Ok(())
    }

    /// Remove a message from the pending inbox. Disposal is final within the
    /// session; disposing an id that is already gone is a no-op.
    pub fn dispose_message(&mut self, id: &MessageId) -> bool {
        let before = self.inbox.len();
        self.inbox.retain(|m| &m.id != id);
        self.inbox.len() != before
    }

    fn horse_mut(&mut self, id: &HorseId) -> Result<&mut Horse> {
        self.horses
            .iter_mut()
            .find(|h| &h.id == id)
            .ok_or_else(|| StoreError::HorseNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppointmentId, Recurrence, TaskId};
    use chrono::Utc;

    fn store_with_one_horse() -> SessionStore {
        SessionStore::seeded(Utc::now())
    }

    fn appointment(title: &str) -> Appointment {
        Appointment {
            id: AppointmentId::fresh(),
            title: title.to_string(),
            date: Utc::now(),
            recurring: Recurrence::None,
        }
    }

    #[test]
    fn append_appointment_grows_the_horse_record() {
        let mut store = store_with_one_horse();
        let id = HorseId::new("horse-1");
        let before = store.horse(&id).expect("seeded horse").appointments.len();

        store
            .append_appointment(&id, appointment("Vet check"))
            .expect("append");

        let horse = store.horse(&id).expect("seeded horse");
        assert_eq!(horse.appointments.len(), before + 1);
        assert_eq!(horse.appointments.last().expect("appended").title, "Vet check");
    }

    #[test]
    fn append_against_unknown_horse_is_an_explicit_failure() {
        let mut store = store_with_one_horse();
        let id = HorseId::new("horse-999");
        let err = store
            .append_appointment(&id, appointment("Vet check"))
            .expect_err("unknown horse must fail");
        assert_eq!(err, StoreError::HorseNotFound(id));
    }

    #[test]
    fn dispose_message_is_idempotent() {
        let mut store = store_with_one_horse();
        let id = MessageId::new("msg-1");
        assert!(store.dispose_message(&id));
        let pending_after_first = store.pending_messages().len();
        assert!(!store.dispose_message(&id));
        assert_eq!(store.pending_messages().len(), pending_after_first);
    }

    #[test]
    fn received_messages_join_the_pending_inbox() {
        let mut store = store_with_one_horse();
        let before = store.pending_messages().len();
        let id = MessageId::fresh();
        store.receive_message(InboundMessage {
            id: id.clone(),
            from: "+15550002222".to_string(),
            text: "Is the arena open on Sunday?".to_string(),
            received_at: Utc::now(),
        });
        assert_eq!(store.pending_messages().len(), before + 1);
        assert!(store.message(&id).is_some());
    }

    #[test]
    fn set_task_completed_toggles_only_that_task() {
        let mut store = store_with_one_horse();
        let horse_id = HorseId::new("horse-1");
        let task_id = TaskId::new("task-1");
        store
            .set_task_completed(&horse_id, &task_id, true)
            .expect("toggle");

        let horse = store.horse(&horse_id).expect("seeded horse");
        let toggled = horse
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .expect("seeded task");
        assert!(toggled.completed);

        let err = store
            .set_task_completed(&horse_id, &TaskId::new("task-999"), true)
            .expect_err("unknown task must fail");
        assert_eq!(err, StoreError::TaskNotFound(TaskId::new("task-999")));
    }
}
