//! Demo dataset: the roster and pending inbox the server starts with.
//!
//! There is no durable storage; every process starts from this seed and loses
//! everything at exit. Dates are placed relative to `now` so the dashboard
//! always shows a mix of upcoming and overdue records.

use crate::model::{
    Appointment, AppointmentId, Attachment, AttachmentId, AttachmentKind, Horse, HorseId,
    InboundMessage, MessageId, Owner, OwnerId, Recurrence, Stable, StableId, Task, TaskId,
};
use crate::store::SessionStore;
use chrono::{DateTime, Duration, Utc};

impl SessionStore {
    /// Build the demo session: three owners, two stables, three horses and
    /// four pending messages (one from an unknown number).
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let owners = vec![
            Owner {
                id: OwnerId::new("owner-1"),
                name: "Alice Johnson".to_string(),
                phone: "+15551234567".to_string(),
            },
            Owner {
                id: OwnerId::new("owner-2"),
                name: "Bob Williams".to_string(),
                phone: "+15557654321".to_string(),
            },
            Owner {
                id: OwnerId::new("owner-3"),
                name: "Charlie Brown".to_string(),
                phone: "+15559876543".to_string(),
            },
        ];

        let stables = vec![
            Stable {
                id: StableId::new("stable-1"),
                name: "Sunrise Meadows".to_string(),
                location: "Willow Creek".to_string(),
            },
            Stable {
                id: StableId::new("stable-2"),
                name: "Oakhaven Equestrian".to_string(),
                location: "Maple Ridge".to_string(),
            },
        ];

        let horses = vec![
            Horse {
                id: HorseId::new("horse-1"),
                name: "Comet".to_string(),
                stable_id: StableId::new("stable-1"),
                owners: vec![owners[0].clone()],
                appointments: vec![
                    Appointment {
                        id: AppointmentId::new("apt-1"),
                        title: "Vet Check-up".to_string(),
                        date: now + Duration::days(10),
                        recurring: Recurrence::Annually,
                    },
                    Appointment {
                        id: AppointmentId::new("apt-2"),
                        title: "Farrier Visit".to_string(),
                        date: now - Duration::days(5),
                        recurring: Recurrence::Monthly,
                    },
                ],
                tasks: vec![
                    Task {
                        id: TaskId::new("task-1"),
                        description: "Administer dewormer".to_string(),
                        due_date: now + Duration::days(2),
                        completed: false,
                    },
                    Task {
                        id: TaskId::new("task-2"),
                        description: "Check blanket fit".to_string(),
                        due_date: now - Duration::days(1),
                        completed: true,
                    },
                ],
                attachments: vec![
                    Attachment {
                        id: AttachmentId::new("att-1"),
                        name: "Coggins_Test_2023.pdf".to_string(),
                        url: "#".to_string(),
                        kind: AttachmentKind::Medical,
                        uploaded_at: now - Duration::days(330),
                    },
                    Attachment {
                        id: AttachmentId::new("att-2"),
                        name: "Digital_Passport.pdf".to_string(),
                        url: "#".to_string(),
                        kind: AttachmentKind::Passport,
                        uploaded_at: now - Duration::days(570),
                    },
                ],
                image_url: "https://picsum.photos/seed/Comet/400/300".to_string(),
            },
            Horse {
                id: HorseId::new("horse-2"),
                name: "Stardust".to_string(),
                stable_id: StableId::new("stable-1"),
                owners: vec![owners[1].clone(), owners[2].clone()],
                appointments: vec![],
                tasks: vec![Task {
                    id: TaskId::new("task-3"),
                    description: "Practice dressage routine".to_string(),
                    due_date: now + Duration::days(5),
                    completed: false,
                }],
                attachments: vec![],
                image_url: "https://picsum.photos/seed/Stardust/400/300".to_string(),
            },
            Horse {
                id: HorseId::new("horse-3"),
                name: "Mustang".to_string(),
                stable_id: StableId::new("stable-2"),
                owners: vec![owners[2].clone()],
                appointments: vec![Appointment {
                    id: AppointmentId::new("apt-3"),
                    title: "Dental Floating".to_string(),
                    date: now + Duration::days(30),
                    recurring: Recurrence::Annually,
                }],
                tasks: vec![],
                attachments: vec![Attachment {
                    id: AttachmentId::new("att-3"),
                    name: "Vet_Report_Jan24.pdf".to_string(),
                    url: "#".to_string(),
                    kind: AttachmentKind::Medical,
                    uploaded_at: now - Duration::days(210),
                }],
                image_url: "https://picsum.photos/seed/Mustang/400/300".to_string(),
            },
        ];

        let inbox = vec![
            InboundMessage {
                id: MessageId::new("msg-1"),
                from: "+15551234567".to_string(),
                text: "Hi, can I book a vet appointment for Comet for next Tuesday afternoon?"
                    .to_string(),
                received_at: now - Duration::hours(2),
            },
            InboundMessage {
                id: MessageId::new("msg-2"),
                from: "+15557654321".to_string(),
                text: "Just a reminder to schedule Stardust's grooming for this weekend."
                    .to_string(),
                received_at: now - Duration::hours(5),
            },
            InboundMessage {
                id: MessageId::new("msg-3"),
                from: "+15559876543".to_string(),
                text: "Hey there! Could you add a task for Mustang to get his new saddle fitted tomorrow? Thanks!"
                    .to_string(),
                received_at: now - Duration::hours(24),
            },
            InboundMessage {
                id: MessageId::new("msg-4"),
                from: "+15550001111".to_string(),
                text: "Hi, I was wondering about boarding costs?".to_string(),
                received_at: now - Duration::hours(48),
            },
        ];

        Self::new(stables, owners, horses, inbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_matches_the_expected_roster() {
        let store = SessionStore::seeded(Utc::now());
        assert_eq!(store.stables().len(), 2);
        assert_eq!(store.owners().len(), 3);
        assert_eq!(store.horses().len(), 3);
        assert_eq!(store.pending_messages().len(), 4);

        let names: Vec<&str> = store.horses().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Comet", "Stardust", "Mustang"]);

        let stardust = &store.horses()[1];
        assert_eq!(stardust.owners.len(), 2, "Stardust is co-owned");

        // msg-4 comes from a number no owner has.
        let unknown = store.message(&MessageId::new("msg-4")).expect("seeded");
        assert!(
            store.owners().iter().all(|o| o.phone != unknown.from),
            "msg-4 sender must be unknown"
        );
    }
}
