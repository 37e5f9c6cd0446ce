//! Categorisation: default missing categories and group items for display.
//!
//! Group order is the order in which each category is first seen in the
//! item list; within a group, items keep their document order. Concatenating
//! the groups is therefore a stable partition of the input.

use crate::model::{ExtractionRecord, LineItem, PersistedOutput};

/// A category and the items in it, borrowed from the item list.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub items: Vec<&'a LineItem>,
}

/// Replace absent or whitespace-only categories with `fallback`.
pub fn apply_default_categories(items: &mut [LineItem], fallback: &str) {
    for item in items.iter_mut().filter(|i| i.category.trim().is_empty()) {
        item.category = fallback.to_string();
    }
}

/// Group items by category in first-seen order.
pub fn group_by_category(items: &[LineItem]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.name == item.category) {
            Some(group) => group.items.push(item),
            None => groups.push(CategoryGroup {
                name: &item.category,
                items: vec![item],
            }),
        }
    }
    groups
}

/// Distinct categories in first-seen order.
pub fn category_names(items: &[LineItem]) -> Vec<String> {
    group_by_category(items)
        .into_iter()
        .map(|g| g.name.to_string())
        .collect()
}

/// `(category, item count)` pairs in first-seen order.
pub fn breakdown(items: &[LineItem]) -> Vec<(String, usize)> {
    group_by_category(items)
        .into_iter()
        .map(|g| (g.name.to_string(), g.items.len()))
        .collect()
}

impl PersistedOutput {
    /// Build the on-disk record: default categories, derive the category
    /// list and carry every collection over unchanged.
    pub fn from_record(record: ExtractionRecord, method_tag: &str, fallback: &str) -> Self {
        let ExtractionRecord {
            mut items,
            technical_sections,
            images,
            document_metadata,
        } = record;

        apply_default_categories(&mut items, fallback);
        let categories = category_names(&items);

        PersistedOutput {
            extraction_method: method_tag.to_string(),
            items,
            technical_sections,
            images,
            document_metadata,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EXTRACTION_METHOD, FALLBACK_CATEGORY};

    fn item(category: &str, name: &str) -> LineItem {
        LineItem {
            category: category.into(),
            item_name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_categories_get_fallback() {
        let mut items = vec![item("", "a"), item("  \t", "b"), item("Options", "c")];
        apply_default_categories(&mut items, FALLBACK_CATEGORY);
        let cats: Vec<&str> = items.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(cats, vec!["Main Items", "Main Items", "Options"]);
    }

    #[test]
    fn groups_in_first_seen_order() {
        let items = vec![
            item("Options", "o1"),
            item("Main Equipment", "m1"),
            item("Options", "o2"),
            item("Packing", "p1"),
            item("Main Equipment", "m2"),
        ];
        let groups = group_by_category(&items);
        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Options", "Main Equipment", "Packing"]);

        let o: Vec<&str> = groups[0].items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(o, vec!["o1", "o2"]);
    }

    #[test]
    fn grouping_is_a_stable_partition() {
        let items = vec![
            item("B", "1"),
            item("A", "2"),
            item("B", "3"),
            item("C", "4"),
            item("A", "5"),
        ];
        let groups = group_by_category(&items);
        let flattened: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.items.iter().map(|i| i.item_name.as_str()))
            .collect();
        assert_eq!(flattened, vec!["1", "3", "2", "5", "4"]);
        assert_eq!(
            groups.iter().map(|g| g.items.len()).sum::<usize>(),
            items.len()
        );
    }

    #[test]
    fn names_are_distinct() {
        let items = vec![item("A", "1"), item("A", "2"), item("B", "3")];
        assert_eq!(category_names(&items), vec!["A", "B"]);
        assert_eq!(
            breakdown(&items),
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
    }

    #[test]
    fn empty_items_have_no_categories() {
        assert!(category_names(&[]).is_empty());
    }

    #[test]
    fn from_record_defaults_and_keeps_values() {
        let mut sensor = item("", "Label sensor");
        sensor.unit_price = "€1.000,00".into();
        let record = ExtractionRecord {
            items: vec![sensor],
            ..Default::default()
        };
        let out = PersistedOutput::from_record(record, EXTRACTION_METHOD, FALLBACK_CATEGORY);
        assert_eq!(out.extraction_method, "direct_vision_single_pass");
        assert_eq!(out.categories, vec!["Main Items"]);
        assert_eq!(out.items[0].category, "Main Items");
        assert_eq!(out.items[0].unit_price, "€1.000,00");
    }
}
