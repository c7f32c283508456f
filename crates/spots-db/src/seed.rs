//! Bulk-load fixture documents, keeping their ids.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use spots_types::models::{Identifiable, Review, Spot, User};
use tracing::info;

use crate::repository;
use crate::store::DocumentStore;

/// Load `spots.json`, `reviews.json` and `users.json` from `dir`. Each file
/// is a JSON object mapping document id to record.
pub fn populate(store: &dyn DocumentStore, dir: &Path) -> Result<()> {
    let spots = load::<Spot>(store, &dir.join("spots.json"))?;
    let reviews = load::<Review>(store, &dir.join("reviews.json"))?;
    let users = load::<User>(store, &dir.join("users.json"))?;

    info!(
        "Seeded {} spots, {} reviews, {} users from {}",
        spots,
        reviews,
        users,
        dir.display()
    );
    Ok(())
}

fn load<T: Identifiable>(store: &dyn DocumentStore, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let items: BTreeMap<String, T> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    let count = items.len();
    for (id, mut item) in items {
        item.set_id(id);
        repository::put(store, &item)?;
    }
    Ok(count)
}
