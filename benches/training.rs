use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rental_ml::model::{Candidate, FittedRegressor};
use rental_ml::{InMemoryPropertyStore, PricePredictor, PropertyRecord, Recommender, RecommenderConfig};

fn listings(n: usize) -> Vec<PropertyRecord> {
    (0..n)
        .map(|i| {
            let area = 30.0 + (i % 50) as f64;
            PropertyRecord {
                id: i as i64 + 1,
                transit_station: format!("station-{}", i % 8),
                access_mode: if i % 2 == 0 { "walk" } else { "transport" }.to_string(),
                commute_minutes: (i % 20) as f64,
                floor: (i % 10 + 1) as f64,
                building_floors: 12.0,
                room_count: (i % 4 + 1) as f64,
                total_area: area,
                living_area: Some(area * 0.6),
                kitchen_area: Some(7.0),
                price: 15_000.0 + area * 600.0,
                view_count: (i * 17 % 113) as u64,
            }
        })
        .collect()
}

fn bench_candidates(c: &mut Criterion) {
    let x = Array2::from_shape_fn((200, 12), |(i, j)| ((i * (j + 3)) % 17) as f64 / 17.0);
    let y: Array1<f64> = x.rows().into_iter().map(|r| r.sum() * 1000.0).collect();

    for candidate in Candidate::default_set(42) {
        c.bench_function(&format!("fit {}", candidate.name()), |b| {
            b.iter(|| {
                let fitted = candidate.fit(black_box(&x), black_box(&y)).unwrap();
                black_box(fitted.n_features_in());
            });
        });
    }
}

fn bench_predictor_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("predictor_train");
    group.sample_size(10);
    for size in [20, 100].iter() {
        let records = listings(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let predictor = PricePredictor::default();
                black_box(predictor.train(black_box(&records)).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_recommendations(c: &mut Criterion) {
    for size in [50, 500].iter() {
        let store = InMemoryPropertyStore::new(listings(*size))
            .with_favorite(1, 3)
            .with_favorite(1, 10);
        let recommender = Recommender::new(store, RecommenderConfig::default());
        recommender.train_from_store().unwrap();

        c.bench_with_input(BenchmarkId::new("recommendations_for_user", size), size, |b, _| {
            b.iter(|| black_box(recommender.recommendations_for_user(black_box(1), 5)));
        });
    }
}

criterion_group!(
    benches,
    bench_candidates,
    bench_predictor_train,
    bench_recommendations
);
criterion_main!(benches);
