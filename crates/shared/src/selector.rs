use crate::models::ContentItem;
use crate::store::ProcessedSetStore;

/// Oldest item in a newest-first list that hasn't been processed yet.
///
/// Only one item is picked per run, so the publishing rate stays bounded no
/// matter how many items are fetched.
pub fn select_oldest_unseen<'a>(
    items: &'a [ContentItem],
    processed: &dyn ProcessedSetStore,
) -> Option<&'a ContentItem> {
    items.iter().rev().find(|item| !processed.contains(&item.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use crate::store::{MemoryStore, PersistentProcessedSet};

    fn text(id: &str) -> ContentItem {
        ContentItem::new(id, None, ContentKind::Text { body: id.into() })
    }

    fn processed(ids: &[&str]) -> PersistentProcessedSet<MemoryStore> {
        let mut store = PersistentProcessedSet::load(MemoryStore::new(), "test", 200).unwrap();
        for id in ids {
            store.add(id).unwrap();
        }
        store
    }

    #[test]
    fn test_picks_unseen_between_seen() {
        let items = vec![text("C"), text("B"), text("A")];
        let store = processed(&["A", "C"]);
        assert_eq!(select_oldest_unseen(&items, &store).map(|i| i.id.as_str()), Some("B"));
    }

    #[test]
    fn test_prefers_oldest_unseen() {
        let items = vec![text("C"), text("B"), text("A")];
        let store = processed(&[]);
        assert_eq!(select_oldest_unseen(&items, &store).map(|i| i.id.as_str()), Some("A"));
    }

    #[test]
    fn test_nothing_when_all_seen() {
        let items = vec![text("C"), text("B"), text("A")];
        let store = processed(&["A", "B", "C"]);
        assert!(select_oldest_unseen(&items, &store).is_none());
    }

    #[test]
    fn test_nothing_when_feed_empty() {
        let store = processed(&[]);
        assert!(select_oldest_unseen(&[], &store).is_none());
    }
}
