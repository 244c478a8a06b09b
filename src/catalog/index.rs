use serde::Serialize;
use std::collections::HashMap;

use super::{Dish, DishId, Tag, TagId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntryRef {
    Dish(DishId),
    Tag(TagId),
}

impl EntryRef {
    pub fn id(&self) -> u32 {
        match self {
            EntryRef::Dish(id) | EntryRef::Tag(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EntryRef::Dish(_) => "dish",
            EntryRef::Tag(_) => "tag",
        }
    }
}

/// Exact-name lookup over dishes and tags.
///
/// Keys are the primary names, compared byte for byte. Dishes are inserted
/// before tags, each in id order, and the first entry for a name wins.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    names: HashMap<String, EntryRef>,
}

impl CatalogIndex {
    pub(crate) fn build(dishes: &[Dish], tags: &[Tag]) -> Self {
        let mut names = HashMap::with_capacity(dishes.len() + tags.len());
        for dish in dishes {
            names
                .entry(dish.name.clone())
                .or_insert(EntryRef::Dish(dish.id));
        }
        for tag in tags {
            names.entry(tag.name.clone()).or_insert(EntryRef::Tag(tag.id));
        }
        Self { names }
    }

    pub fn lookup_exact(&self, name: &str) -> Option<EntryRef> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
