//! Similarity-based listing recommendations.
//!
//! Listings are embedded with the same two-branch preprocessing as the price
//! model (with the price as an extra numerical feature) and indexed for
//! Euclidean nearest-neighbor queries.
//!
//! Queries come in two forms. The `try_*` methods report every failure as a
//! [`RecommendError`]. The plain methods apply the serving policy on top:
//! [`Recommender::similar`] degrades to an empty list and
//! [`Recommender::recommendations_for_user`] degrades to the most popular
//! listings.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RecommenderConfig;
use crate::dataset::{PropertyId, PropertyRecord, PropertyStore, StoreError, UserId};
use crate::features::{FeatureFrame, SimilarityFeatures};
use crate::lifecycle::{LifecycleState, ModelSlot};
use crate::preprocessing::{
    FeatureTransformer, FittedFeatureTransformer, FittedTransformer, PreprocessingError,
    Transformer,
};

pub mod neighbors;

pub use neighbors::{IndexedRow, Neighbor, NeighborIndex};

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Recommender not trained")]
    NotTrained,

    #[error("Insufficient data: need at least {required} usable records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Unknown property {0}")]
    UnknownProperty(PropertyId),

    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct TrainedIndex {
    transformer: FittedFeatureTransformer,
    index: NeighborIndex,
}

/// Recommendation service over a [`PropertyStore`].
pub struct Recommender<S> {
    store: S,
    config: RecommenderConfig,
    slot: ModelSlot<TrainedIndex>,
}

impl<S: PropertyStore> Recommender<S> {
    pub fn new(store: S, config: RecommenderConfig) -> Self {
        Self {
            store,
            config,
            slot: ModelSlot::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.slot.is_trained()
    }

    pub fn state(&self) -> LifecycleState {
        self.slot.state()
    }

    /// Number of listings in the installed index, 0 when untrained.
    pub fn index_len(&self) -> usize {
        self.slot.snapshot().map_or(0, |t| t.index.len())
    }

    /// Fit the preprocessing and the neighbor index on `records`.
    ///
    /// Returns the number of indexed listings. A failed run leaves the
    /// previous index, if any, in place.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn train(&self, records: &[PropertyRecord]) -> Result<usize, RecommendError> {
        let trained = self.slot.retrain(|| self.fit(records))?;
        Ok(trained.index.len())
    }

    pub fn train_from_store(&self) -> Result<usize, RecommendError> {
        let records = self.store.fetch_all_properties()?;
        self.train(&records)
    }

    /// Train from the store unless an index is already installed.
    pub fn ensure_trained(&self) -> Result<(), RecommendError> {
        self.slot.get_or_train(|| {
            let records = self.store.fetch_all_properties()?;
            info!(records = records.len(), "building similarity index on demand");
            self.fit(&records)
        })?;
        Ok(())
    }

    /// Listings most similar to `property_id`, nearest first, never
    /// including `property_id` itself.
    ///
    /// At most `max_neighbors - 1` listings come back regardless of `limit`.
    pub fn try_similar(
        &self,
        property_id: PropertyId,
        limit: usize,
    ) -> Result<Vec<PropertyRecord>, RecommendError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let trained = self.slot.snapshot().ok_or(RecommendError::NotTrained)?;
        let target = self
            .store
            .fetch_property_by_id(property_id)?
            .ok_or(RecommendError::UnknownProperty(property_id))?;

        let query = trained
            .transformer
            .transform(&FeatureFrame::from_row(&SimilarityFeatures::from(&target)))?;

        let ids: Vec<PropertyId> = trained
            .index
            .kneighbors(query.row(0))
            .into_iter()
            .map(|n| n.id)
            .filter(|&id| id != property_id)
            .take(limit)
            .collect();

        // Reorder by rank; the store does not promise to keep request order.
        let mut by_id: HashMap<PropertyId, PropertyRecord> = self
            .store
            .fetch_properties_by_ids(&ids)?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// [`try_similar`](Self::try_similar), with every failure reported as an
    /// empty list.
    pub fn similar(&self, property_id: PropertyId, limit: usize) -> Vec<PropertyRecord> {
        match self.try_similar(property_id, limit) {
            Ok(records) => records,
            Err(RecommendError::NotTrained) => {
                debug!(property_id, "similarity query before training");
                Vec::new()
            }
            Err(e) => {
                warn!(property_id, error = %e, "similarity query failed");
                Vec::new()
            }
        }
    }

    /// Personalised recommendations for `user_id`.
    ///
    /// Users without favorites get the `limit` most popular listings. Others
    /// get listings similar to each favorite in turn, without duplicates or
    /// favorites, padded with popular listings up to `limit`. If the padding
    /// lookup fails, the similar listings found so far are returned as is.
    pub fn try_recommendations_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<PropertyRecord>, RecommendError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let favorites = self.store.fetch_favorite_property_ids(user_id)?;
        if favorites.is_empty() {
            return Ok(self.store.fetch_top_by_popularity(limit)?);
        }
        if !self.is_trained() {
            return Err(RecommendError::NotTrained);
        }

        let favorite_set: HashSet<PropertyId> = favorites.iter().copied().collect();
        let mut seen: HashSet<PropertyId> = HashSet::new();
        let mut selected: Vec<PropertyRecord> = Vec::with_capacity(limit);

        'favorites: for &favorite in &favorites {
            for record in self.similar(favorite, self.config.similar_per_favorite) {
                if favorite_set.contains(&record.id) || !seen.insert(record.id) {
                    continue;
                }
                selected.push(record);
                if selected.len() >= limit {
                    break 'favorites;
                }
            }
        }

        if selected.len() < limit {
            let wanted = limit + favorites.len() + selected.len();
            let padding = match self.store.fetch_top_by_popularity(wanted) {
                Ok(padding) => padding,
                Err(e) if !selected.is_empty() => {
                    warn!(
                        user_id,
                        similar = selected.len(),
                        error = %e,
                        "popular listings unavailable, returning similar listings only"
                    );
                    return Ok(selected);
                }
                Err(e) => return Err(e.into()),
            };
            debug!(
                user_id,
                similar = selected.len(),
                "padding recommendations with popular listings"
            );
            for record in padding {
                if selected.len() >= limit {
                    break;
                }
                if favorite_set.contains(&record.id) || !seen.insert(record.id) {
                    continue;
                }
                selected.push(record);
            }
        }

        Ok(selected)
    }

    /// [`try_recommendations_for_user`](Self::try_recommendations_for_user),
    /// falling back to the most popular listings on any failure.
    pub fn recommendations_for_user(&self, user_id: UserId, limit: usize) -> Vec<PropertyRecord> {
        match self.try_recommendations_for_user(user_id, limit) {
            Ok(records) => records,
            Err(e) => {
                warn!(user_id, error = %e, "falling back to popular listings");
                self.popular(limit)
            }
        }
    }

    fn popular(&self, limit: usize) -> Vec<PropertyRecord> {
        self.store.fetch_top_by_popularity(limit).unwrap_or_else(|e| {
            error!(error = %e, "popularity fallback failed");
            Vec::new()
        })
    }

    fn fit(&self, records: &[PropertyRecord]) -> Result<TrainedIndex, RecommendError> {
        let usable: Vec<&PropertyRecord> = records.iter().filter(|r| r.is_usable()).collect();
        if usable.len() < self.config.min_records {
            warn!(
                required = self.config.min_records,
                actual = usable.len(),
                "not enough records to build the similarity index"
            );
            return Err(RecommendError::InsufficientData {
                required: self.config.min_records,
                actual: usable.len(),
            });
        }

        let ids: Vec<PropertyId> = usable.iter().map(|r| r.id).collect();
        let rows: Vec<SimilarityFeatures> =
            usable.iter().map(|r| SimilarityFeatures::from(*r)).collect();
        let frame = FeatureFrame::from_rows(&rows);

        let transformer = FeatureTransformer::new().fit(&frame)?;
        let matrix = transformer.transform(&frame)?;

        let k = self.config.max_neighbors.min(ids.len());
        let index = NeighborIndex::fit(&ids, &matrix, k).ok_or(
            PreprocessingError::FeatureMismatch {
                expected_features: ids.len(),
                got_features: matrix.nrows(),
            },
        )?;

        info!(listings = index.len(), k, "similarity index built");
        Ok(TrainedIndex { transformer, index })
    }
}
