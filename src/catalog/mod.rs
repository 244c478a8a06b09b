//! Dish and tag catalog.
//!
//! A [`Catalog`] is an immutable snapshot: it is built once (from fixtures or
//! from records handed in by the caller), validated, indexed, and then shared
//! read-only behind an `Arc` for the lifetime of any number of matching or
//! search passes. Reloading produces a new snapshot rather than mutating the
//! current one.

mod fixtures;
mod index;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use fixtures::{embedded_catalog, from_fixture_json, load_catalog, load_catalog_dir};
pub use index::{CatalogIndex, EntryRef};

pub type DishId = u32;
pub type TagId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub name_en: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl Dish {
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    pub fn display_name(&self) -> &str {
        if self.name_en.trim().is_empty() {
            &self.name
        } else {
            &self.name_en
        }
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

impl Tag {
    pub fn display_name(&self) -> &str {
        if self.name_en.trim().is_empty() {
            &self.name
        } else {
            &self.name_en
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate dish id {0}")]
    DuplicateDishId(DishId),

    #[error("duplicate tag id {0}")]
    DuplicateTagId(TagId),

    #[error("dish {dish} references unknown tag id {tag}")]
    UnknownTagId { dish: DishId, tag: TagId },

    #[error("dish {dish:?} references unknown tag {tag:?}")]
    UnknownTagName { dish: String, tag: String },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    dishes: Vec<Dish>,
    tags: Vec<Tag>,
    dish_pos: HashMap<DishId, usize>,
    tag_pos: HashMap<TagId, usize>,
    tag_names: HashMap<String, TagId>,
    index: CatalogIndex,
}

impl Catalog {
    /// Validates the records and builds the lookup tables. Dishes and tags are
    /// kept in id order; a dish's tag list is deduplicated.
    pub fn new(mut tags: Vec<Tag>, mut dishes: Vec<Dish>) -> Result<Self, CatalogError> {
        tags.sort_by_key(|tag| tag.id);
        dishes.sort_by_key(|dish| dish.id);

        let mut tag_pos = HashMap::with_capacity(tags.len());
        let mut tag_names = HashMap::with_capacity(tags.len());
        for (pos, tag) in tags.iter().enumerate() {
            if tag_pos.insert(tag.id, pos).is_some() {
                return Err(CatalogError::DuplicateTagId(tag.id));
            }
            tag_names.entry(tag.name.clone()).or_insert(tag.id);
        }

        let mut dish_pos = HashMap::with_capacity(dishes.len());
        for (pos, dish) in dishes.iter_mut().enumerate() {
            if dish_pos.insert(dish.id, pos).is_some() {
                return Err(CatalogError::DuplicateDishId(dish.id));
            }
            let mut seen = Vec::with_capacity(dish.tags.len());
            for tag in &dish.tags {
                if !tag_pos.contains_key(tag) {
                    return Err(CatalogError::UnknownTagId {
                        dish: dish.id,
                        tag: *tag,
                    });
                }
                if !seen.contains(tag) {
                    seen.push(*tag);
                }
            }
            dish.tags = seen;
        }

        let index = CatalogIndex::build(&dishes, &tags);
        Ok(Self {
            dishes,
            tags,
            dish_pos,
            tag_pos,
            tag_names,
            index,
        })
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            dishes: Vec::new(),
            tags: Vec::new(),
            dish_pos: HashMap::new(),
            tag_pos: HashMap::new(),
            tag_names: HashMap::new(),
            index: CatalogIndex::default(),
        }
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn dish(&self, id: DishId) -> Option<&Dish> {
        self.dish_pos.get(&id).map(|pos| &self.dishes[*pos])
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tag_pos.get(&id).map(|pos| &self.tags[*pos])
    }

    /// Exact name lookup; with duplicate names the lowest id wins.
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tag_names.get(name).and_then(|id| self.tag(*id))
    }

    pub fn dish_tags<'a>(&'a self, dish: &'a Dish) -> impl Iterator<Item = &'a Tag> + 'a {
        dish.tags.iter().filter_map(|id| self.tag(*id))
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn tag(id: TagId, name: &str, name_en: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            name_en: name_en.to_string(),
        }
    }

    pub(crate) fn dish(id: DishId, name: &str, name_en: &str, tags: &[TagId]) -> Dish {
        Dish {
            id,
            name: name.to_string(),
            name_en: name_en.to_string(),
            description: String::new(),
            description_en: String::new(),
            images: vec![format!("https://img.example.com/{id}.jpg")],
            tags: tags.to_vec(),
        }
    }

    /// A small Sichuan menu used across module tests.
    pub(crate) fn sample_catalog() -> Catalog {
        let tags = vec![
            tag(1, "辣", "Spicy"),
            tag(2, "素食", "Vegetarian"),
            tag(3, "猪肉", "Pork"),
            tag(4, "鸡肉", "Chicken"),
            tag(5, "海鲜", "Seafood"),
        ];
        let mut dishes = vec![
            dish(1, "宫保鸡丁", "Kung Pao Chicken", &[1, 4]),
            dish(2, "鸡丁", "Diced Chicken", &[4]),
            dish(3, "麻婆豆腐", "Mapo Tofu", &[1, 3]),
            dish(4, "清炒时蔬", "Stir-fried Greens", &[2]),
            dish(5, "回锅肉", "Twice-cooked Pork", &[1, 3]),
            dish(6, "水煮鱼", "Boiled Fish in Chili Oil", &[1, 5]),
        ];
        dishes[3].description = "Seasonal greens, lightly salted".to_string();
        Catalog::new(tags, dishes).expect("sample catalog")
    }
}
