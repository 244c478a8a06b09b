use std::cmp::Reverse;
use std::collections::HashSet;

use crate::catalog::{Catalog, Dish, DishId, TagId};
use crate::preferences::{Preference, TagPreference};

/// Free-text search re-ranked by tag preferences.
///
/// Candidates are dishes, in catalog order, whose names, descriptions or tag
/// names contain `query` (case-sensitive). Dishes carrying a DISLIKE tag are
/// dropped; if any LIKE tags are given the rest are stable-sorted by how many
/// of them each dish carries. OTHER entries and tag names missing from the
/// catalog have no effect.
pub fn search(catalog: &Catalog, query: &str, filters: &[TagPreference]) -> Vec<DishId> {
    let disliked = resolve_tags(catalog, filters, Preference::Dislike);
    let liked = resolve_tags(catalog, filters, Preference::Like);

    let mut candidates = catalog
        .dishes()
        .iter()
        .filter(|dish| contains_query(catalog, dish, query))
        .filter(|dish| !dish.tags.iter().any(|tag| disliked.contains(tag)))
        .collect::<Vec<_>>();

    if !liked.is_empty() {
        candidates.sort_by_key(|dish| Reverse(like_count(dish, &liked)));
    }

    candidates.into_iter().map(|dish| dish.id).collect()
}

/// Dishes carrying every named tag. Any unknown name (or no names at all)
/// yields an empty result.
pub fn search_by_tags<S: AsRef<str>>(catalog: &Catalog, names: &[S]) -> Vec<DishId> {
    if names.is_empty() {
        return Vec::new();
    }
    let mut required = Vec::with_capacity(names.len());
    for name in names {
        match catalog.tag_by_name(name.as_ref()) {
            Some(tag) => required.push(tag.id),
            None => return Vec::new(),
        }
    }
    catalog
        .dishes()
        .iter()
        .filter(|dish| required.iter().all(|tag| dish.has_tag(*tag)))
        .map(|dish| dish.id)
        .collect()
}

fn resolve_tags(catalog: &Catalog, filters: &[TagPreference], wanted: Preference) -> HashSet<TagId> {
    filters
        .iter()
        .filter(|filter| filter.preference == wanted)
        .filter_map(|filter| catalog.tag_by_name(&filter.tag))
        .map(|tag| tag.id)
        .collect()
}

fn contains_query(catalog: &Catalog, dish: &Dish, query: &str) -> bool {
    let fields = [
        dish.name.as_str(),
        dish.name_en.as_str(),
        dish.description.as_str(),
        dish.description_en.as_str(),
    ];
    if fields.iter().any(|field| field.contains(query)) {
        return true;
    }
    catalog
        .dish_tags(dish)
        .any(|tag| tag.name.contains(query) || tag.name_en.contains(query))
}

fn like_count(dish: &Dish, liked: &HashSet<TagId>) -> usize {
    dish.tags.iter().filter(|tag| liked.contains(tag)).count()
}
