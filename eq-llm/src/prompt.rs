//! Prompt template and the roster context embedded in it.

use chrono::{DateTime, SecondsFormat, Utc};
use eq_core::SessionStore;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorseEntry {
    pub name: String,
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerEntry {
    pub name: String,
    pub phone: String,
}

/// Textual directory the model matches mentions against: horse names with
/// their owners, owner names with phone numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterContext {
    pub horses: Vec<HorseEntry>,
    pub owners: Vec<OwnerEntry>,
}

impl RosterContext {
    pub fn from_store(store: &SessionStore) -> Self {
        Self {
            horses: store
                .horses()
                .iter()
                .map(|h| HorseEntry {
                    name: h.name.clone(),
                    owners: h.owners.iter().map(|o| o.name.clone()).collect(),
                })
                .collect(),
            owners: store
                .owners()
                .iter()
                .map(|o| OwnerEntry {
                    name: o.name.clone(),
                    phone: o.phone.clone(),
                })
                .collect(),
        }
    }
}

pub(crate) fn build_prompt(message: &str, roster: &RosterContext, now: DateTime<Utc>) -> String {
    let mut horse_context = String::new();
    for h in &roster.horses {
        let _ = writeln!(horse_context, "- {} (owners: {})", h.name, h.owners.join(", "));
    }
    let mut owner_context = String::new();
    for o in &roster.owners {
        let _ = writeln!(owner_context, "- {} ({})", o.name, o.phone);
    }

    format!(
        "Analyze the following message sent to a horse stable. Extract the key \
information based on the provided context of horses and owners.\n\
\n\
Message to analyze:\n\
\"{message}\"\n\
\n\
Contextual information:\n\
- Today's date is: {now}\n\
- Horses at the stable:\n\
{horse_context}\
- Owners:\n\
{owner_context}\
\n\
Instructions:\n\
1. Identify the horse the message is about. The name must match one from the list exactly.\n\
2. Identify the owner associated with that horse.\n\
3. Determine the requested action: creating an APPOINTMENT, a TASK, or a general QUERY.\n\
4. Summarize the request in the details field.\n\
5. If a date or time is mentioned, convert it to an ISO 8601 string (YYYY-MM-DDTHH:mm:ss). \
Resolve relative dates like \"next Tuesday\" against today's date. Leave the field unset if no date is mentioned.\n\
6. Return the data in the specified JSON format. If a horse cannot be confidently identified, leave horseName unset.\n",
        message = message,
        now = now.to_rfc3339_opts(SecondsFormat::Secs, true),
        horse_context = horse_context,
        owner_context = owner_context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> RosterContext {
        RosterContext {
            horses: vec![HorseEntry {
                name: "Comet".to_string(),
                owners: vec!["Alice Johnson".to_string(), "Bob Williams".to_string()],
            }],
            owners: vec![OwnerEntry {
                name: "Alice Johnson".to_string(),
                phone: "+15551234567".to_string(),
            }],
        }
    }

    #[test]
    fn prompt_embeds_message_date_and_directory() {
        let now = Utc::now();
        let prompt = build_prompt("Book a vet visit for Comet", &roster(), now);

        assert!(prompt.contains("\"Book a vet visit for Comet\""));
        assert!(prompt.contains("- Comet (owners: Alice Johnson, Bob Williams)"));
        assert!(prompt.contains("- Alice Johnson (+15551234567)"));
        assert!(prompt.contains(&now.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }

    #[test]
    fn roster_context_reads_the_whole_store() {
        let store = SessionStore::seeded(Utc::now());
        let roster = RosterContext::from_store(&store);
        assert_eq!(roster.horses.len(), 3);
        assert_eq!(roster.owners.len(), 3);
        assert_eq!(roster.horses[0].owners, ["Alice Johnson"]);
    }
}
