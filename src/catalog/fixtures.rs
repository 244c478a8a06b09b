use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::{Catalog, CatalogError, Dish, DishId, Tag, TagId};

const TAGS_FILE: &str = "tags.json";
const DISHES_FILE: &str = "dishes.json";

const EMBEDDED_TAGS_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/tags.json"));
const EMBEDDED_DISHES_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/dishes.json"));

#[derive(Debug, Deserialize)]
struct TagFixture {
    id: Option<TagId>,
    name: String,
    #[serde(default)]
    name_en: String,
}

#[derive(Debug, Deserialize)]
struct DishFixture {
    id: Option<DishId>,
    name: String,
    #[serde(default)]
    name_en: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    description_en: String,
    #[serde(default)]
    tags: Vec<TagRef>,
    #[serde(default)]
    images: Vec<String>,
}

/// Dish fixtures may reference tags either by id or by primary name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagRef {
    Id(TagId),
    Name(String),
}

/// The catalog bundled with the binary.
pub fn embedded_catalog() -> Result<Catalog> {
    from_fixture_json(EMBEDDED_TAGS_JSON, EMBEDDED_DISHES_JSON)
        .with_context(|| "failed to load embedded catalog")
}

/// Loads `tags.json` and `dishes.json` from `dir`, or the embedded catalog
/// when no directory is configured.
pub fn load_catalog(dir: Option<&Path>) -> Result<Catalog> {
    let catalog = match dir {
        Some(dir) => load_catalog_dir(dir)?,
        None => embedded_catalog()?,
    };
    info!(
        "catalog: loaded {} dishes, {} tags",
        catalog.dishes().len(),
        catalog.tags().len()
    );
    Ok(catalog)
}

pub fn load_catalog_dir(dir: &Path) -> Result<Catalog> {
    if !dir.is_dir() {
        return Err(anyhow!("catalog directory not found: {}", dir.display()));
    }
    let tags_path = dir.join(TAGS_FILE);
    let dishes_path = dir.join(DISHES_FILE);
    let tags = fs::read_to_string(&tags_path)
        .with_context(|| format!("failed to read tags: {}", tags_path.display()))?;
    let dishes = fs::read_to_string(&dishes_path)
        .with_context(|| format!("failed to read dishes: {}", dishes_path.display()))?;
    from_fixture_json(&tags, &dishes)
        .with_context(|| format!("failed to load catalog: {}", dir.display()))
}

/// Builds a catalog from fixture JSON.
///
/// Records without an explicit id are numbered after the largest id seen so
/// far, in file order. Tags are deduplicated by name (the first record wins);
/// dishes are kept as given.
pub fn from_fixture_json(tags_json: &str, dishes_json: &str) -> Result<Catalog> {
    let tag_fixtures: Vec<TagFixture> =
        serde_json::from_str(tags_json).with_context(|| "failed to parse tags fixture")?;
    let dish_fixtures: Vec<DishFixture> =
        serde_json::from_str(dishes_json).with_context(|| "failed to parse dishes fixture")?;

    let mut tags = Vec::with_capacity(tag_fixtures.len());
    let mut tag_ids_by_name: HashMap<String, TagId> = HashMap::new();
    let mut next_tag_id = 1;
    for fixture in tag_fixtures {
        if tag_ids_by_name.contains_key(&fixture.name) {
            continue;
        }
        let id = fixture.id.unwrap_or(next_tag_id);
        next_tag_id = next_tag_id.max(id.saturating_add(1));
        tag_ids_by_name.insert(fixture.name.clone(), id);
        tags.push(Tag {
            id,
            name: fixture.name,
            name_en: fixture.name_en,
        });
    }

    let mut dishes = Vec::with_capacity(dish_fixtures.len());
    let mut next_dish_id = 1;
    for fixture in dish_fixtures {
        let id = fixture.id.unwrap_or(next_dish_id);
        next_dish_id = next_dish_id.max(id.saturating_add(1));
        let mut tag_ids = Vec::with_capacity(fixture.tags.len());
        for tag in fixture.tags {
            let tag_id = match tag {
                TagRef::Id(tag_id) => tag_id,
                TagRef::Name(name) => *tag_ids_by_name.get(&name).ok_or_else(|| {
                    CatalogError::UnknownTagName {
                        dish: fixture.name.clone(),
                        tag: name.clone(),
                    }
                })?,
            };
            tag_ids.push(tag_id);
        }
        dishes.push(Dish {
            id,
            name: fixture.name,
            name_en: fixture.name_en,
            description: fixture.description,
            description_en: fixture.description_en,
            images: fixture.images,
            tags: tag_ids,
        });
    }

    Ok(Catalog::new(tags, dishes)?)
}
