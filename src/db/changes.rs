use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use super::photos;
use crate::models::Photo;

/// Grid changes between two snapshots of a pin's photos, in batch-update
/// convention: `deleted` and `updated` index the old snapshot, `inserted`
/// indexes the new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub inserted: Vec<usize>,
    pub deleted: Vec<usize>,
    pub updated: Vec<usize>,
}

impl ChangeSet {
    pub fn between(old: &[Photo], new: &[Photo]) -> Self {
        let new_by_id: HashMap<&str, &Photo> = new.iter().map(|p| (p.id.as_str(), p)).collect();
        let old_ids: HashSet<&str> = old.iter().map(|p| p.id.as_str()).collect();

        let mut change_set = ChangeSet::default();
        for (index, photo) in old.iter().enumerate() {
            match new_by_id.get(photo.id.as_str()) {
                None => change_set.deleted.push(index),
                Some(current) if current.image_path != photo.image_path => {
                    change_set.updated.push(index)
                }
                Some(_) => {}
            }
        }
        change_set.inserted = new
            .iter()
            .enumerate()
            .filter(|(_, p)| !old_ids.contains(p.id.as_str()))
            .map(|(index, _)| index)
            .collect();

        change_set
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }
}

/// Last seen photos of one pin; each refresh reports what changed since.
#[derive(Debug, Clone)]
pub struct PhotoFeed {
    pin_id: String,
    snapshot: Vec<Photo>,
}

impl PhotoFeed {
    pub async fn load(pool: &SqlitePool, pin_id: &str) -> Result<Self, sqlx::Error> {
        let snapshot = photos::photos_for_pin(pool, pin_id).await?;
        Ok(Self {
            pin_id: pin_id.to_string(),
            snapshot,
        })
    }

    pub fn pin_id(&self) -> &str {
        &self.pin_id
    }

    pub fn photos(&self) -> &[Photo] {
        &self.snapshot
    }

    pub async fn refresh(&mut self, pool: &SqlitePool) -> Result<ChangeSet, sqlx::Error> {
        let current = photos::photos_for_pin(pool, &self.pin_id).await?;
        let change_set = ChangeSet::between(&self.snapshot, &current);
        self.snapshot = current;
        Ok(change_set)
    }
}
