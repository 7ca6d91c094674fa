//! Property records and the read interface of the listing store.
//!
//! The learning code never owns listing storage. It reads a value snapshot
//! through [`PropertyStore`] at the start of every training run and looks up
//! individual records when answering recommendation queries.
//!
//! # Core Concepts
//!
//! - **PropertyRecord**: one rental listing: categorical location attributes,
//!   numerical layout attributes, the asking price and a view counter.
//! - **PropertyStore**: the narrow, read-only contract the services consume.
//! - **InMemoryPropertyStore**: a reference store for tests and demos.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod split;

pub use self::memory::InMemoryPropertyStore;
pub use self::split::{train_test_split, TrainTestSplit};

/// Identifier of a listing in the store.
pub type PropertyId = i64;

/// Identifier of a user in the store.
pub type UserId = i64;

/// A rental listing as exposed by the data layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    /// Nearest transit station.
    pub transit_station: String,
    /// How the station is reached (on foot, by transport, ...).
    pub access_mode: String,
    /// Minutes from the listing to the station.
    pub commute_minutes: f64,
    pub floor: f64,
    pub building_floors: f64,
    pub room_count: f64,
    pub total_area: f64,
    #[serde(default)]
    pub living_area: Option<f64>,
    #[serde(default)]
    pub kitchen_area: Option<f64>,
    /// Monthly rent.
    pub price: f64,
    #[serde(default)]
    pub view_count: u64,
}

impl PropertyRecord {
    /// Whether the record may take part in training.
    ///
    /// The price has to be a positive finite number and every numerical
    /// attribute that is present must be finite.
    pub fn is_usable(&self) -> bool {
        let required = [
            self.commute_minutes,
            self.floor,
            self.building_floors,
            self.room_count,
            self.total_area,
        ];
        let optional = [self.living_area, self.kitchen_area];

        self.price.is_finite()
            && self.price > 0.0
            && required.iter().all(|v| v.is_finite())
            && optional.iter().flatten().all(|v| v.is_finite())
    }
}

/// Failure reported by the data layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The query was rejected or failed while running.
    #[error("Query failed: {0}")]
    Query(String),
}

/// Read-only access to listings, favorites and popularity.
///
/// Implementations must be safe to share between request handlers; the
/// services only ever take `&self`.
pub trait PropertyStore {
    /// Every listing in the store's default order.
    fn fetch_all_properties(&self) -> Result<Vec<PropertyRecord>, StoreError>;

    /// A single listing, or `None` when the id is unknown.
    fn fetch_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>, StoreError>;

    /// Ids of the listings a user marked as favorite, in the store's default order.
    fn fetch_favorite_property_ids(&self, user_id: UserId) -> Result<Vec<PropertyId>, StoreError>;

    /// The `limit` most viewed listings, most viewed first.
    fn fetch_top_by_popularity(&self, limit: usize) -> Result<Vec<PropertyRecord>, StoreError>;

    /// Listings for the given ids. Unknown ids are skipped.
    fn fetch_properties_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<Vec<PropertyRecord>, StoreError>;
}

impl<T: PropertyStore + ?Sized> PropertyStore for Arc<T> {
    fn fetch_all_properties(&self) -> Result<Vec<PropertyRecord>, StoreError> {
        (**self).fetch_all_properties()
    }

    fn fetch_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>, StoreError> {
        (**self).fetch_property_by_id(id)
    }

    fn fetch_favorite_property_ids(&self, user_id: UserId) -> Result<Vec<PropertyId>, StoreError> {
        (**self).fetch_favorite_property_ids(user_id)
    }

    fn fetch_top_by_popularity(&self, limit: usize) -> Result<Vec<PropertyRecord>, StoreError> {
        (**self).fetch_top_by_popularity(limit)
    }

    fn fetch_properties_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        (**self).fetch_properties_by_ids(ids)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::listing;
    use super::*;

    #[test]
    fn test_usable_record() {
        assert!(listing(0).is_usable());
    }

    #[test]
    fn test_zero_price_is_not_usable() {
        let mut record = listing(1);
        record.price = 0.0;
        assert!(!record.is_usable());
    }

    #[test]
    fn test_non_finite_optional_area_is_not_usable() {
        let mut record = listing(2);
        record.kitchen_area = Some(f64::NAN);
        assert!(!record.is_usable());

        record.kitchen_area = None;
        assert!(record.is_usable());
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{
            "id": 7, "transit_station": "Sokol", "access_mode": "walk",
            "commute_minutes": 10, "floor": 3, "building_floors": 9,
            "room_count": 2, "total_area": 54.0, "price": 45000
        }"#;
        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.living_area, None);
        assert_eq!(record.view_count, 0);
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
    }
}
