//! End-to-end scenarios against the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rental_ml::{
    InMemoryPropertyStore, LifecycleState, PredictorConfig, PredictorError, PriceFeatures,
    PricePredictor, PropertyRecord, PropertyStore, Recommender, RecommenderConfig,
};

const STATIONS: [&str; 3] = ["Belorusskaya", "Kurskaya", "Paveletskaya"];
const ACCESS: [&str; 2] = ["walk", "transport"];

/// `n` listings with prices spread evenly over [20000, 80000].
fn synthetic(n: usize) -> Vec<PropertyRecord> {
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let rooms = 1.0 + (i % 3) as f64;
            PropertyRecord {
                id: i as i64 + 1,
                transit_station: STATIONS[i % STATIONS.len()].to_string(),
                access_mode: ACCESS[(i / 2) % ACCESS.len()].to_string(),
                commute_minutes: 3.0 + (i * 5 % 17) as f64,
                floor: 1.0 + (i % 12) as f64,
                building_floors: 12.0 + (i % 2) as f64 * 5.0,
                room_count: rooms,
                total_area: 30.0 + 60.0 * t + rooms * 2.0,
                living_area: if i % 4 == 3 { None } else { Some(20.0 + 40.0 * t) },
                kitchen_area: Some(6.0 + 6.0 * t),
                price: 20_000.0 + 60_000.0 * t,
                view_count: ((i * 13) % 29) as u64,
            }
        })
        .collect()
}

fn ids(records: &[PropertyRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

#[test]
fn predictor_trains_on_twelve_listings() {
    let predictor = PricePredictor::default();
    let summary = predictor.train(&synthetic(12)).unwrap();

    assert!(predictor.is_trained());
    let report = predictor.performance_report();
    assert_eq!(
        report.names(),
        vec![
            "Linear Regression",
            "Ridge",
            "Lasso",
            "ElasticNet",
            "SVR",
            "Random Forest",
            "Gradient Boosting"
        ]
    );
    assert_eq!(report.selected(), Some(summary.selected.as_str()));
    for entry in report.entries() {
        // Held-out R² is reported for every candidate.
        assert!(!entry.metrics.test_r2.is_nan(), "{}", entry.model);
    }
    assert!(summary.test_r2.is_finite());
}

#[test]
fn predictor_rejects_small_datasets() {
    for n in 0..10 {
        let predictor = PricePredictor::default();
        assert!(matches!(
            predictor.train(&synthetic(n)),
            Err(PredictorError::InsufficientData { .. })
        ));
        assert!(!predictor.is_trained());
    }
}

#[test]
fn predictor_report_serializes_to_json() {
    let predictor = PricePredictor::default();
    predictor.train(&synthetic(15)).unwrap();

    let map = predictor.performance_report().to_map();
    let json = serde_json::to_value(&map).unwrap();
    assert!(json["Ridge"]["test_r2"].is_number());
    assert!(json["Gradient Boosting"]["train_rel_error"].is_number());
}

#[test]
fn predictor_respects_configured_floor() {
    let config = PredictorConfig {
        price_floor: 1_000_000.0,
        ..PredictorConfig::default()
    };
    let predictor = PricePredictor::new(config);
    predictor.train(&synthetic(12)).unwrap();

    let request = PriceFeatures::from(&synthetic(12)[5]);
    assert_eq!(predictor.predict(&request).unwrap(), 1_000_000.0);
}

#[test]
fn predictor_retrain_is_reproducible() {
    let a = PricePredictor::default();
    let b = PricePredictor::default();
    a.train(&synthetic(20)).unwrap();
    b.train(&synthetic(20)).unwrap();

    let request = PriceFeatures::from(&synthetic(20)[7]);
    assert_eq!(a.best_model(), b.best_model());
    assert_eq!(a.predict(&request).unwrap(), b.predict(&request).unwrap());
}

#[test]
fn predictor_serves_during_concurrent_retrains() {
    let predictor = Arc::new(PricePredictor::default());
    predictor.train(&synthetic(12)).unwrap();
    let request = PriceFeatures::from(&synthetic(12)[2]);

    let trainer = {
        let predictor = Arc::clone(&predictor);
        thread::spawn(move || {
            for n in [14, 16] {
                predictor.train(&synthetic(n)).unwrap();
            }
        })
    };
    for _ in 0..20 {
        assert!(predictor.predict(&request).unwrap() >= 10_000.0);
    }
    trainer.join().unwrap();
    assert_eq!(predictor.state(), LifecycleState::Trained);
}

#[test]
fn recommender_similar_on_six_listings() {
    let recommender = Recommender::new(
        InMemoryPropertyStore::new(synthetic(6)),
        RecommenderConfig::default(),
    );
    assert_eq!(recommender.train_from_store().unwrap(), 6);
    assert_eq!(recommender.index_len(), 6);

    let result = recommender.similar(3, 5);
    assert!(result.len() <= 5);
    assert!(!ids(&result).contains(&3));
}

#[test]
fn recommender_user_with_two_favorites() {
    let store = InMemoryPropertyStore::new(synthetic(12))
        .with_favorite(42, 2)
        .with_favorite(42, 9);
    let recommender = Recommender::new(store, RecommenderConfig::default());
    recommender.train_from_store().unwrap();

    let result = ids(&recommender.recommendations_for_user(42, 5));
    assert_eq!(result.len(), 5);
    assert!(!result.contains(&2) && !result.contains(&9));
    assert_eq!(result.iter().collect::<HashSet<_>>().len(), 5);
}

#[test]
fn recommender_cold_start_is_popularity() {
    let store = InMemoryPropertyStore::new(synthetic(10));
    let expected = store.fetch_top_by_popularity(4).unwrap();

    let recommender = Recommender::new(store, RecommenderConfig::default());
    recommender.train_from_store().unwrap();
    assert_eq!(recommender.recommendations_for_user(1, 4), expected);
}

#[test]
fn recommender_shares_store_through_arc() {
    let store: Arc<dyn PropertyStore + Send + Sync> =
        Arc::new(InMemoryPropertyStore::new(synthetic(8)));
    let recommender = Recommender::new(Arc::clone(&store), RecommenderConfig::default());

    recommender.ensure_trained().unwrap();
    assert!(recommender.is_trained());
    assert!(!recommender.similar(1, 3).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prediction_never_below_floor(
        station in 0usize..4,
        minutes in 0.0f64..240.0,
        floor in 0.0f64..40.0,
        rooms in 0.0f64..8.0,
        area in 0.0f64..400.0,
    ) {
        static PREDICTOR: std::sync::OnceLock<PricePredictor> = std::sync::OnceLock::new();
        let predictor = PREDICTOR.get_or_init(|| {
            let p = PricePredictor::default();
            p.train(&synthetic(16)).unwrap();
            p
        });

        let request = PriceFeatures {
            transit_station: ["Belorusskaya", "Kurskaya", "Paveletskaya", "Elsewhere"][station]
                .to_string(),
            access_mode: "walk".to_string(),
            commute_minutes: minutes,
            floor,
            building_floors: 40.0,
            room_count: rooms,
            total_area: area,
            living_area: None,
            kitchen_area: None,
        };
        let price = predictor.predict(&request).unwrap();
        prop_assert!(price >= predictor.config().price_floor);
        prop_assert_eq!(price, (price * 100.0).round() / 100.0);
    }

    #[test]
    fn similar_excludes_query_and_respects_limit(id in 1i64..=10, limit in 0usize..8) {
        let recommender = Recommender::new(
            InMemoryPropertyStore::new(synthetic(10)),
            RecommenderConfig::default(),
        );
        recommender.train_from_store().unwrap();

        let result = ids(&recommender.similar(id, limit));
        prop_assert!(result.len() <= limit);
        prop_assert!(!result.contains(&id));
    }
}
