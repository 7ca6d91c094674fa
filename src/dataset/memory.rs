use std::collections::HashMap;

use crate::dataset::{PropertyId, PropertyRecord, PropertyStore, StoreError, UserId};

/// A [`PropertyStore`] backed by plain vectors.
///
/// Listings keep their insertion order, which doubles as the tie-breaker for
/// popularity ranking. Favorites are kept per user in insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPropertyStore {
    properties: Vec<PropertyRecord>,
    favorites: HashMap<UserId, Vec<PropertyId>>,
}

impl InMemoryPropertyStore {
    pub fn new(properties: Vec<PropertyRecord>) -> Self {
        Self {
            properties,
            favorites: HashMap::new(),
        }
    }

    /// Mark `property_id` as a favorite of `user_id`. Repeated marks are ignored.
    pub fn with_favorite(mut self, user_id: UserId, property_id: PropertyId) -> Self {
        self.add_favorite(user_id, property_id);
        self
    }

    pub fn add_favorite(&mut self, user_id: UserId, property_id: PropertyId) {
        let entry = self.favorites.entry(user_id).or_default();
        if !entry.contains(&property_id) {
            entry.push(property_id);
        }
    }

    pub fn insert(&mut self, record: PropertyRecord) {
        self.properties.push(record);
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn fetch_all_properties(&self) -> Result<Vec<PropertyRecord>, StoreError> {
        Ok(self.properties.clone())
    }

    fn fetch_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>, StoreError> {
        Ok(self.properties.iter().find(|p| p.id == id).cloned())
    }

    fn fetch_favorite_property_ids(&self, user_id: UserId) -> Result<Vec<PropertyId>, StoreError> {
        Ok(self.favorites.get(&user_id).cloned().unwrap_or_default())
    }

    fn fetch_top_by_popularity(&self, limit: usize) -> Result<Vec<PropertyRecord>, StoreError> {
        let mut ranked: Vec<&PropertyRecord> = self.properties.iter().collect();
        // Stable sort keeps insertion order among equal view counts.
        ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        Ok(ranked.into_iter().take(limit).cloned().collect())
    }

    fn fetch_properties_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.properties.iter().find(|p| p.id == *id))
            .cloned()
            .collect())
    }
}
