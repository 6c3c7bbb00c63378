//! EquiManage domain core.
//!
//! Plain records for the stable roster, the in-memory session store, exact
//! directory lookup, and the reconciler that turns an extracted proposal into
//! a concrete appointment or task. No I/O lives here.

pub mod directory;
pub mod model;
pub mod proposal;
pub mod reconcile;
mod seed;
pub mod store;

pub use model::{
    Appointment, AppointmentId, Attachment, AttachmentId, AttachmentKind, Horse, HorseId,
    InboundMessage, MessageId, Owner, OwnerId, Recurrence, Stable, StableId, Task, TaskId,
};
pub use proposal::{ActionKind, ActionProposal};
pub use reconcile::{ReconcileError, ReconcileOutcome, reconcile};
pub use store::{SessionStore, StoreError};
