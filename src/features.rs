//! Typed feature rows and the tabular frame fed to preprocessing.
//!
//! Each consumer has a fixed key set:
//!
//! | Consumer    | Categorical                        | Numerical |
//! |-------------|------------------------------------|-----------|
//! | predictor   | transit_station, access_mode       | commute_minutes, floor, building_floors, room_count, total_area, living_area, kitchen_area |
//! | recommender | transit_station, access_mode       | price, commute_minutes, room_count, total_area |
//!
//! Missing optional areas become `0.0`. No row is ever dropped here.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::dataset::PropertyRecord;
use crate::preprocessing::PreprocessingError;

/// A row type with a fixed categorical / numerical column layout.
pub trait FeatureRow {
    /// Names of the categorical columns, in output order.
    const CATEGORICAL: &'static [&'static str];
    /// Names of the numerical columns, in output order.
    const NUMERICAL: &'static [&'static str];

    fn categorical_values(&self) -> Vec<String>;
    fn numerical_values(&self) -> Vec<f64>;
}

/// Inputs of the price model. Also the shape of a prediction request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceFeatures {
    pub transit_station: String,
    pub access_mode: String,
    pub commute_minutes: f64,
    pub floor: f64,
    pub building_floors: f64,
    pub room_count: f64,
    pub total_area: f64,
    #[serde(default)]
    pub living_area: Option<f64>,
    #[serde(default)]
    pub kitchen_area: Option<f64>,
}

impl PriceFeatures {
    /// Reject non-finite numerical inputs.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        for (name, value) in Self::NUMERICAL.iter().zip(self.numerical_values()) {
            if !value.is_finite() {
                return Err(PreprocessingError::NonFinite {
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl From<&PropertyRecord> for PriceFeatures {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            transit_station: record.transit_station.clone(),
            access_mode: record.access_mode.clone(),
            commute_minutes: record.commute_minutes,
            floor: record.floor,
            building_floors: record.building_floors,
            room_count: record.room_count,
            total_area: record.total_area,
            living_area: record.living_area,
            kitchen_area: record.kitchen_area,
        }
    }
}

impl FeatureRow for PriceFeatures {
    const CATEGORICAL: &'static [&'static str] = &["transit_station", "access_mode"];
    const NUMERICAL: &'static [&'static str] = &[
        "commute_minutes",
        "floor",
        "building_floors",
        "room_count",
        "total_area",
        "living_area",
        "kitchen_area",
    ];

    fn categorical_values(&self) -> Vec<String> {
        vec![self.transit_station.clone(), self.access_mode.clone()]
    }

    fn numerical_values(&self) -> Vec<f64> {
        vec![
            self.commute_minutes,
            self.floor,
            self.building_floors,
            self.room_count,
            self.total_area,
            self.living_area.unwrap_or(0.0),
            self.kitchen_area.unwrap_or(0.0),
        ]
    }
}

/// Inputs of the similarity index. The price is a feature here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityFeatures {
    pub transit_station: String,
    pub access_mode: String,
    pub price: f64,
    pub commute_minutes: f64,
    pub room_count: f64,
    pub total_area: f64,
}

impl From<&PropertyRecord> for SimilarityFeatures {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            transit_station: record.transit_station.clone(),
            access_mode: record.access_mode.clone(),
            price: record.price,
            commute_minutes: record.commute_minutes,
            room_count: record.room_count,
            total_area: record.total_area,
        }
    }
}

impl FeatureRow for SimilarityFeatures {
    const CATEGORICAL: &'static [&'static str] = &["transit_station", "access_mode"];
    const NUMERICAL: &'static [&'static str] =
        &["price", "commute_minutes", "room_count", "total_area"];

    fn categorical_values(&self) -> Vec<String> {
        vec![self.transit_station.clone(), self.access_mode.clone()]
    }

    fn numerical_values(&self) -> Vec<f64> {
        vec![
            self.price,
            self.commute_minutes,
            self.room_count,
            self.total_area,
        ]
    }
}

/// Column-split table of feature rows.
///
/// Categorical and numerical columns are stored in separate matrices so each
/// preprocessing branch can take its block without copying the other.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureFrame {
    categorical_names: &'static [&'static str],
    numerical_names: &'static [&'static str],
    categorical: Array2<String>,
    numerical: Array2<f64>,
}

impl FeatureFrame {
    /// Build a frame with one row per input row.
    pub fn from_rows<R: FeatureRow>(rows: &[R]) -> Self {
        let n_cat = R::CATEGORICAL.len();
        let n_num = R::NUMERICAL.len();

        // Implementors return exactly one value per declared column.
        let cat_rows: Vec<Vec<String>> = rows.iter().map(|r| r.categorical_values()).collect();
        let num_rows: Vec<Vec<f64>> = rows.iter().map(|r| r.numerical_values()).collect();

        Self {
            categorical_names: R::CATEGORICAL,
            numerical_names: R::NUMERICAL,
            categorical: Array2::from_shape_fn((rows.len(), n_cat), |(r, c)| {
                cat_rows[r][c].clone()
            }),
            numerical: Array2::from_shape_fn((rows.len(), n_num), |(r, c)| num_rows[r][c]),
        }
    }

    /// A single-row frame.
    pub fn from_row<R: FeatureRow>(row: &R) -> Self {
        Self::from_rows(std::slice::from_ref(row))
    }

    /// A new frame holding the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            categorical_names: self.categorical_names,
            numerical_names: self.numerical_names,
            categorical: self.categorical.select(Axis(0), rows),
            numerical: self.numerical.select(Axis(0), rows),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.numerical.nrows()
    }

    pub fn categorical(&self) -> &Array2<String> {
        &self.categorical
    }

    pub fn numerical(&self) -> &Array2<f64> {
        &self.numerical
    }

    pub fn categorical_names(&self) -> &'static [&'static str] {
        self.categorical_names
    }

    pub fn numerical_names(&self) -> &'static [&'static str] {
        self.numerical_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::listing;

    #[test]
    fn test_price_features_default_missing_areas_to_zero() {
        let mut record = listing(3);
        record.living_area = None;
        record.kitchen_area = None;
        let features = PriceFeatures::from(&record);

        let values = features.numerical_values();
        assert_eq!(values.len(), PriceFeatures::NUMERICAL.len());
        assert_eq!(values[5], 0.0);
        assert_eq!(values[6], 0.0);
    }

    #[test]
    fn test_similarity_features_carry_price() {
        let record = listing(1);
        let features = SimilarityFeatures::from(&record);
        assert_eq!(features.numerical_values()[0], record.price);
    }

    #[test]
    fn test_frame_shape_matches_rows() {
        let rows: Vec<PriceFeatures> = (0..5).map(|i| PriceFeatures::from(&listing(i))).collect();
        let frame = FeatureFrame::from_rows(&rows);

        assert_eq!(frame.n_rows(), 5);
        assert_eq!(frame.categorical().dim(), (5, 2));
        assert_eq!(frame.numerical().dim(), (5, 7));
        assert_eq!(frame.categorical()[[2, 0]], rows[2].transit_station);
    }

    #[test]
    fn test_empty_frame_keeps_column_count() {
        let frame = FeatureFrame::from_rows::<SimilarityFeatures>(&[]);
        assert_eq!(frame.n_rows(), 0);
        assert_eq!(frame.numerical().ncols(), 4);
    }

    #[test]
    fn test_select_rows_reorders() {
        let rows: Vec<PriceFeatures> = (0..4).map(|i| PriceFeatures::from(&listing(i))).collect();
        let frame = FeatureFrame::from_rows(&rows);
        let picked = frame.select_rows(&[3, 0]);

        assert_eq!(picked.n_rows(), 2);
        assert_eq!(picked.numerical()[[0, 4]], rows[3].total_area);
        assert_eq!(picked.numerical()[[1, 4]], rows[0].total_area);
    }

    #[test]
    fn test_request_rejects_missing_required_key() {
        let json = r#"{"transit_station": "Sokol", "access_mode": "walk", "floor": 2}"#;
        assert!(serde_json::from_str::<PriceFeatures>(json).is_err());
    }

    #[test]
    fn test_request_accepts_missing_optional_areas() {
        let json = r#"{
            "transit_station": "Sokol", "access_mode": "walk", "commute_minutes": 7,
            "floor": 2, "building_floors": 9, "room_count": 1, "total_area": 33.5
        }"#;
        let request: PriceFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(request.living_area, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut request = PriceFeatures::from(&listing(0));
        request.total_area = f64::INFINITY;
        assert!(matches!(
            request.validate(),
            Err(PreprocessingError::NonFinite { ref column }) if column == "total_area"
        ));
    }
}
