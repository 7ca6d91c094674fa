//! # rental-ml
//!
//! Price prediction and similarity recommendations for rental listings.
//!
//! ## Core Design Principles
//!
//! - **Fitted state is a separate type**: transformers and estimators return a
//!   new fitted value from `fit`; only fitted values can transform or predict.
//! - **Snapshot swaps**: a retrain builds a complete new pipeline and installs
//!   it atomically. Inference always sees a whole old or a whole new model.
//! - **Explicit training**: inference never trains implicitly. Services offer
//!   `ensure_trained` for callers that want train-if-needed behavior.
//! - **Errors are typed, degradation is policy**: every fallible step returns
//!   a `Result`; the recommender's plain query methods choose the fallback.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rental_ml::{InMemoryPropertyStore, MlConfig, PricePredictor, Recommender};
//!
//! let store = InMemoryPropertyStore::new(records);
//! let config = MlConfig::default();
//!
//! let predictor = PricePredictor::new(config.predictor.clone());
//! predictor.train_from_store(&store)?;
//! let rent = predictor.predict(&request)?;
//!
//! let recommender = Recommender::new(store, config.recommender);
//! recommender.train_from_store()?;
//! let picks = recommender.recommendations_for_user(user_id, 5);
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: Listing records, the store interface and the seeded split
//! - `features`: Typed feature rows and the tabular frame
//! - `preprocessing`: One-hot encoding, standard scaling, the column transformer
//! - `model`: The seven candidate regressors
//! - `evaluation`: Regression metrics and the performance report
//! - `pipeline`: Fitted preprocessing plus fitted regressor
//! - `lifecycle`: The trained-state slot shared by both services
//! - `predictor`: Candidate comparison and price inference
//! - `recommender`: Nearest-neighbor index and recommendation queries
//! - `config`: Service configuration

pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod features;
pub mod lifecycle;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod preprocessing;
pub mod recommender;

pub use config::{ConfigError, MlConfig, PredictorConfig, RecommenderConfig};
pub use dataset::{
    InMemoryPropertyStore, PropertyId, PropertyRecord, PropertyStore, StoreError, UserId,
};
pub use evaluation::{ModelMetrics, PerformanceReport, RegressionMetrics};
pub use features::{FeatureFrame, PriceFeatures, SimilarityFeatures};
pub use lifecycle::LifecycleState;
pub use predictor::{PricePredictor, PredictorError, TrainingSummary};
pub use recommender::{RecommendError, Recommender};
