//! Results chosen for comparison
//!
//! A [`SelectionSet`] is an immutable snapshot: every mutation returns a new
//! set and leaves the old one untouched, and a no-op mutation returns the same
//! snapshot, so callers can detect changes with [`SelectionSet::same_snapshot`].
//! Membership is decided by result `id` throughout.

use crate::data::ResultItem;
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered set of selected results, unique by `id`
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    items: Arc<Vec<ResultItem>>,
}

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    fn replaced(items: Vec<ResultItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Append `result` unless a result with the same id is already selected
    pub fn select(&self, result: &ResultItem) -> Self {
        if self.is_selected(result) {
            return self.clone();
        }
        let mut items = self.items.as_ref().clone();
        items.push(result.clone());
        Self::replaced(items)
    }

    /// Remove every entry sharing `result`'s id
    pub fn unselect(&self, result: &ResultItem) -> Self {
        if !self.is_selected(result) {
            return self.clone();
        }
        Self::replaced(
            self.items
                .iter()
                .filter(|r| r.id != result.id)
                .cloned()
                .collect(),
        )
    }

    pub fn is_selected(&self, result: &ResultItem) -> bool {
        self.contains_id(&result.id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.items.iter().any(|r| r.id == id)
    }

    /// Add every item of the page that is not selected yet, in page order
    pub fn select_all(&self, page_items: &[ResultItem]) -> Self {
        let mut seen: HashSet<&str> = self.items.iter().map(|r| r.id.as_str()).collect();
        let missing: Vec<&ResultItem> = page_items
            .iter()
            .filter(|r| seen.insert(r.id.as_str()))
            .collect();

        if missing.is_empty() {
            return self.clone();
        }

        let mut items = self.items.as_ref().clone();
        items.extend(missing.into_iter().cloned());
        Self::replaced(items)
    }

    /// Toggle every item of the page.
    ///
    /// Selected page items are dropped, unselected ones are appended in page
    /// order, and selections from other pages are kept.
    pub fn invert_selection(&self, page_items: &[ResultItem]) -> Self {
        if page_items.is_empty() {
            return self.clone();
        }

        let on_page: HashSet<&str> = page_items.iter().map(|r| r.id.as_str()).collect();
        let mut items: Vec<ResultItem> = self
            .items
            .iter()
            .filter(|r| !on_page.contains(r.id.as_str()))
            .cloned()
            .collect();

        let mut added = HashSet::new();
        for result in page_items {
            if !self.contains_id(&result.id) && added.insert(result.id.as_str()) {
                items.push(result.clone());
            }
        }

        Self::replaced(items)
    }

    /// Drop everything
    pub fn clear(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::new()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ResultItem] {
        &self.items
    }

    /// Selected ids, in selection order
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.id.as_str()).collect()
    }

    /// Whether both sets are the same snapshot (no mutation in between)
    pub fn same_snapshot(&self, other: &SelectionSet) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn item(id: &str) -> ResultItem {
        ResultItem::new(id)
    }

    fn sorted_ids(set: &SelectionSet) -> Vec<String> {
        let mut ids: Vec<String> = set.ids().into_iter().map(String::from).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_select_twice_keeps_size() {
        let r = item("a");
        let once = SelectionSet::new().select(&r);
        let twice = once.select(&r);

        assert_eq!(twice.len(), 1);
        assert!(twice.same_snapshot(&once));
    }

    #[test]
    fn test_select_matches_by_id_not_content() {
        let original = item("a").with_field("score", json!(1));
        let refetched = item("a").with_field("score", json!(2));

        let set = SelectionSet::new().select(&original);
        assert!(set.is_selected(&refetched));
        assert_eq!(set.select(&refetched).len(), 1);
    }

    #[test]
    fn test_select_then_unselect_restores() {
        let before = SelectionSet::new().select(&item("a")).select(&item("b"));
        let after = before.select(&item("c")).unselect(&item("c"));

        assert_eq!(sorted_ids(&after), sorted_ids(&before));
        assert!(!after.is_selected(&item("c")));
    }

    #[test]
    fn test_unselect_absent_is_noop() {
        let set = SelectionSet::new().select(&item("a"));
        let same = set.unselect(&item("zzz"));
        assert!(same.same_snapshot(&set));
    }

    #[test]
    fn test_mutation_leaves_old_snapshot() {
        let empty = SelectionSet::new();
        let one = empty.select(&item("a"));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert!(!one.same_snapshot(&empty));
    }

    #[test]
    fn test_select_all_unions_page() {
        let set = SelectionSet::new().select(&item("b"));
        let page = vec![item("a"), item("b"), item("c")];

        let all = set.select_all(&page);
        assert_eq!(all.ids(), vec!["b", "a", "c"]);
        assert!(all.select_all(&page).same_snapshot(&all));
    }

    #[test]
    fn test_invert_selection_is_page_scoped() {
        let set = SelectionSet::new()
            .select(&item("other-page"))
            .select(&item("a"));
        let page = vec![item("a"), item("b"), item("c")];

        let inverted = set.invert_selection(&page);
        assert_eq!(inverted.ids(), vec!["other-page", "b", "c"]);

        let back = inverted.invert_selection(&page);
        assert_eq!(back.ids(), vec!["other-page", "a"]);
    }

    #[test]
    fn test_clear() {
        let set = SelectionSet::new().select(&item("a"));
        assert!(set.clear().is_empty());

        let empty = SelectionSet::new();
        assert!(empty.clear().same_snapshot(&empty));
    }
}
