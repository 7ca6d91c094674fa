//! Price predictor: compares the candidate models and serves the winner.
//!
//! A training run takes a snapshot of listing records, holds out a seeded
//! share of them, fits every [`Candidate`] behind its own preprocessing, and
//! keeps the candidate with the highest held-out R². The winner is refitted
//! on all records before it is installed, and the metrics of every
//! candidate stay available through [`PricePredictor::performance_report`]
//! until the next run.
//!
//! Inference never trains implicitly. Callers that want lazy training call
//! [`PricePredictor::ensure_trained`] first.

use ndarray::{Array1, Axis};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PredictorConfig;
use crate::dataset::{train_test_split, PropertyRecord, PropertyStore, StoreError};
use crate::evaluation::{evaluate, ModelMetrics, PerformanceReport};
use crate::features::{FeatureFrame, PriceFeatures};
use crate::lifecycle::{LifecycleState, ModelSlot};
use crate::model::{Candidate, ModelError};
use crate::pipeline::{PipelineError, PricePipeline};
use crate::preprocessing::PreprocessingError;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Insufficient data: need at least {required} usable records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Model not trained")]
    NotTrained,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Every candidate failed to fit or score.
    #[error("No candidate model could be fitted")]
    NoViableCandidate,

    #[error("Model produced a non-finite prediction")]
    NonFinitePrediction,

    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PipelineError> for PredictorError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Preprocessing(e) => PredictorError::Preprocessing(e),
            PipelineError::Model(e) => PredictorError::Model(e),
        }
    }
}

/// Outcome of a successful training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    /// Usable records the winner was refitted on.
    pub records: usize,
    pub selected: String,
    pub test_r2: f64,
}

struct TrainedPredictor {
    pipeline: PricePipeline,
    report: PerformanceReport,
    records: usize,
}

pub struct PricePredictor {
    config: PredictorConfig,
    slot: ModelSlot<TrainedPredictor>,
}

impl Default for PricePredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl PricePredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            slot: ModelSlot::new(),
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.slot.is_trained()
    }

    pub fn state(&self) -> LifecycleState {
        self.slot.state()
    }

    /// Train on `records`, replacing any installed model on success.
    ///
    /// # Errors
    /// [`PredictorError::InsufficientData`] when fewer than
    /// `min_records` records are usable. A failed run leaves the previously
    /// installed model, if any, in place.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn train(&self, records: &[PropertyRecord]) -> Result<TrainingSummary, PredictorError> {
        let trained = self.slot.retrain(|| self.fit(records))?;
        Ok(summary(&trained))
    }

    /// Fetch every listing from `store` and train on it.
    pub fn train_from_store(
        &self,
        store: &dyn PropertyStore,
    ) -> Result<TrainingSummary, PredictorError> {
        let records = store.fetch_all_properties()?;
        self.train(&records)
    }

    /// Train from `store` unless a model is already installed. Concurrent
    /// callers share one training run.
    pub fn ensure_trained(&self, store: &dyn PropertyStore) -> Result<(), PredictorError> {
        self.slot.get_or_train(|| {
            let records = store.fetch_all_properties()?;
            info!(records = records.len(), "training price model on demand");
            self.fit(&records)
        })?;
        Ok(())
    }

    /// Predict the rent of one listing.
    ///
    /// The result is rounded to cents and never below the configured price
    /// floor.
    pub fn predict(&self, features: &PriceFeatures) -> Result<f64, PredictorError> {
        features
            .validate()
            .map_err(|e| PredictorError::MalformedInput(e.to_string()))?;

        let Some(trained) = self.slot.snapshot() else {
            warn!("price prediction requested before training");
            return Err(PredictorError::NotTrained);
        };

        let raw = trained
            .pipeline
            .predict(&FeatureFrame::from_row(features))?
            .get(0)
            .copied()
            .ok_or(PredictorError::NonFinitePrediction)?;
        if !raw.is_finite() {
            return Err(PredictorError::NonFinitePrediction);
        }

        Ok(round_cents(raw.max(self.config.price_floor)))
    }

    /// [`predict`](Self::predict) for a loosely-typed request body.
    pub fn predict_json(&self, request: &serde_json::Value) -> Result<f64, PredictorError> {
        let features: PriceFeatures = serde_json::from_value(request.clone())
            .map_err(|e| PredictorError::MalformedInput(e.to_string()))?;
        self.predict(&features)
    }

    /// Metrics of every candidate from the last successful run. Empty before
    /// the first one.
    pub fn performance_report(&self) -> PerformanceReport {
        self.slot
            .snapshot()
            .map(|t| t.report.clone())
            .unwrap_or_default()
    }

    /// Name of the installed model.
    pub fn best_model(&self) -> Option<String> {
        self.slot.snapshot().map(|t| t.pipeline.name().to_string())
    }

    fn fit(&self, records: &[PropertyRecord]) -> Result<TrainedPredictor, PredictorError> {
        let usable: Vec<&PropertyRecord> = records.iter().filter(|r| r.is_usable()).collect();
        if usable.len() < records.len() {
            debug!(
                skipped = records.len() - usable.len(),
                "ignoring records without a usable price or numeric fields"
            );
        }
        if usable.len() < self.config.min_records {
            warn!(
                required = self.config.min_records,
                actual = usable.len(),
                "not enough records to train the price model"
            );
            return Err(PredictorError::InsufficientData {
                required: self.config.min_records,
                actual: usable.len(),
            });
        }

        let rows: Vec<PriceFeatures> = usable.iter().map(|r| PriceFeatures::from(*r)).collect();
        let targets: Array1<f64> = usable.iter().map(|r| r.price).collect();
        let frame = FeatureFrame::from_rows(&rows);

        let split = train_test_split(rows.len(), self.config.test_ratio, self.config.seed);
        let train_frame = frame.select_rows(&split.train);
        let test_frame = frame.select_rows(&split.test);
        let y_train = targets.select(Axis(0), &split.train);
        let y_test = targets.select(Axis(0), &split.test);

        info!(
            train = split.train.len(),
            test = split.test.len(),
            "comparing price model candidates"
        );

        let candidates = Candidate::default_set(self.config.seed);
        let mut report = PerformanceReport::new();

        for candidate in &candidates {
            let scored = PricePipeline::fit(candidate, &train_frame, &y_train).and_then(|p| {
                let x_train = p.features(&train_frame)?;
                let x_test = p.features(&test_frame)?;
                Ok(evaluate(p.model(), &x_train, &y_train, &x_test, &y_test)?)
            });

            match scored {
                Ok(metrics) => {
                    debug!(
                        model = candidate.name(),
                        test_r2 = metrics.test_r2,
                        test_rmse = metrics.test_rmse,
                        test_rel_error = metrics.test_rel_error,
                        "candidate scored"
                    );
                    report.push(candidate.name(), metrics);
                }
                Err(e) => {
                    error!(model = candidate.name(), error = %e, "candidate failed");
                    report.push(candidate.name(), ModelMetrics::failed());
                }
            }
        }

        let best = report
            .best_index()
            .filter(|&i| !report.entries()[i].metrics.is_failed())
            .ok_or(PredictorError::NoViableCandidate)?;
        let winner = &candidates[best];

        let pipeline = PricePipeline::fit(winner, &frame, &targets)?;
        let report = report.with_selected(winner.name());

        info!(
            model = winner.name(),
            test_r2 = report.entries()[best].metrics.test_r2,
            "selected price model"
        );

        Ok(TrainedPredictor {
            pipeline,
            report,
            records: rows.len(),
        })
    }
}

fn summary(trained: &TrainedPredictor) -> TrainingSummary {
    let name = trained.pipeline.name();
    TrainingSummary {
        records: trained.records,
        selected: name.to_string(),
        test_r2: trained
            .report
            .get(name)
            .map_or(f64::NAN, |m| m.test_r2),
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{listing, listings};
    use crate::dataset::InMemoryPropertyStore;
    use serde_json::json;

    #[test]
    fn test_train_requires_min_records() {
        let predictor = PricePredictor::default();
        let result = predictor.train(&listings(9));

        assert!(matches!(
            result,
            Err(PredictorError::InsufficientData {
                required: 10,
                actual: 9
            })
        ));
        assert!(!predictor.is_trained());
        assert_eq!(predictor.state(), LifecycleState::Untrained);
    }

    #[test]
    fn test_unusable_records_do_not_count() {
        let mut records = listings(10);
        records[0].price = 0.0;

        let predictor = PricePredictor::default();
        assert!(matches!(
            predictor.train(&records),
            Err(PredictorError::InsufficientData { actual: 9, .. })
        ));
    }

    #[test]
    fn test_train_reports_all_candidates() {
        let predictor = PricePredictor::default();
        let summary = predictor.train(&listings(12)).unwrap();

        assert!(predictor.is_trained());
        assert_eq!(summary.records, 12);

        let report = predictor.performance_report();
        assert_eq!(report.len(), 7);
        assert_eq!(report.selected(), Some(summary.selected.as_str()));
        assert_eq!(predictor.best_model(), Some(summary.selected.clone()));

        // The winner has the best held-out score.
        let best = report.get(&summary.selected).unwrap().test_r2;
        assert!(!report.entries().iter().any(|e| e.metrics.test_r2 > best));
    }

    #[test]
    fn test_predict_before_training() {
        let predictor = PricePredictor::default();
        assert!(matches!(
            predictor.predict(&PriceFeatures::from(&listing(0))),
            Err(PredictorError::NotTrained)
        ));
        assert!(predictor.performance_report().is_empty());
        assert_eq!(predictor.best_model(), None);
    }

    #[test]
    fn test_predict_is_deterministic_and_rounded() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(20)).unwrap();

        let request = PriceFeatures::from(&listing(3));
        let a = predictor.predict(&request).unwrap();
        let b = predictor.predict(&request).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, round_cents(a));
        assert!(a >= 10_000.0);
    }

    #[test]
    fn test_predict_respects_floor() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(15)).unwrap();

        let mut request = PriceFeatures::from(&listing(0));
        request.total_area = 1.0;
        request.room_count = 0.0;
        request.commute_minutes = 500.0;
        assert!(predictor.predict(&request).unwrap() >= 10_000.0);
    }

    #[test]
    fn test_floor_result_is_rounded() {
        let config = PredictorConfig {
            price_floor: 10_000_000.678,
            ..PredictorConfig::default()
        };
        let predictor = PricePredictor::new(config);
        predictor.train(&listings(12)).unwrap();

        let price = predictor.predict(&PriceFeatures::from(&listing(4))).unwrap();
        assert_eq!(price, 10_000_000.68);
        assert_eq!(price, round_cents(price));
    }

    #[test]
    fn test_unknown_station_still_predicts() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(12)).unwrap();

        let mut request = PriceFeatures::from(&listing(1));
        request.transit_station = "Unheard Of".to_string();
        assert!(predictor.predict(&request).is_ok());
    }

    #[test]
    fn test_predict_json_malformed() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(12)).unwrap();

        let missing = json!({"transit_station": "Sokol", "access_mode": "walk"});
        assert!(matches!(
            predictor.predict_json(&missing),
            Err(PredictorError::MalformedInput(_))
        ));

        let wrong_type = json!({
            "transit_station": "Sokol", "access_mode": "walk", "commute_minutes": "ten",
            "floor": 1, "building_floors": 5, "room_count": 1, "total_area": 30
        });
        assert!(matches!(
            predictor.predict_json(&wrong_type),
            Err(PredictorError::MalformedInput(_))
        ));

        let ok = json!({
            "transit_station": "Sokol", "access_mode": "walk", "commute_minutes": 10,
            "floor": 1, "building_floors": 5, "room_count": 1, "total_area": 30
        });
        assert!(predictor.predict_json(&ok).is_ok());
    }

    #[test]
    fn test_predict_rejects_non_finite_input() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(12)).unwrap();

        let mut request = PriceFeatures::from(&listing(2));
        request.kitchen_area = Some(f64::NAN);
        assert!(matches!(
            predictor.predict(&request),
            Err(PredictorError::MalformedInput(_))
        ));
        // The installed model is unaffected.
        assert!(predictor.predict(&PriceFeatures::from(&listing(2))).is_ok());
    }

    #[test]
    fn test_failed_retrain_keeps_model() {
        let predictor = PricePredictor::default();
        predictor.train(&listings(12)).unwrap();
        let before = predictor.best_model();

        assert!(predictor.train(&listings(3)).is_err());
        assert!(predictor.is_trained());
        assert_eq!(predictor.best_model(), before);
    }

    #[test]
    fn test_ensure_trained_from_store() {
        let store = InMemoryPropertyStore::new(listings(14));
        let predictor = PricePredictor::default();

        predictor.ensure_trained(&store).unwrap();
        assert!(predictor.is_trained());
        let selected = predictor.best_model();

        // Second call is a no-op.
        predictor.ensure_trained(&store).unwrap();
        assert_eq!(predictor.best_model(), selected);
        assert_eq!(predictor.performance_report().len(), 7);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12_345.678), 12_345.68);
        assert_eq!(round_cents(-0.004), -0.0);
    }
}
