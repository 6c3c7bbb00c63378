//! Roster resolution for free-text mentions.

use crate::model::{Horse, Owner};
use crate::store::SessionStore;

/// Resolve a horse mention against the roster.
///
/// Matching is exact string equality, first match wins. No case folding, no
/// partial or phonetic matching: an ambiguous or unknown name must surface as
/// not-found, never a guess.
pub fn find_horse_by_name<'a>(store: &'a SessionStore, name: &str) -> Option<&'a Horse> {
    store.horses().iter().find(|h| h.name == name)
}

/// Resolve a sender phone number to a known owner, for labeling inbox
/// messages. Unknown numbers stay unresolved.
pub fn find_owner_by_phone<'a>(store: &'a SessionStore, phone: &str) -> Option<&'a Owner> {
    store.owners().iter().find(|o| o.phone == phone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn lookup_matches_exact_names_only() {
        let store = SessionStore::seeded(Utc::now());

        let horse = find_horse_by_name(&store, "Comet").expect("Comet is seeded");
        assert_eq!(horse.id.as_str(), "horse-1");

        assert!(find_horse_by_name(&store, "comet").is_none());
        assert!(find_horse_by_name(&store, "Com").is_none());
        assert!(find_horse_by_name(&store, "Unicorn").is_none());
        assert!(find_horse_by_name(&store, "").is_none());
    }

    #[test]
    fn sender_resolution_by_phone() {
        let store = SessionStore::seeded(Utc::now());

        let owner = find_owner_by_phone(&store, "+15551234567").expect("seeded owner");
        assert_eq!(owner.name, "Alice Johnson");

        assert!(find_owner_by_phone(&store, "+15550001111").is_none());
    }
}
