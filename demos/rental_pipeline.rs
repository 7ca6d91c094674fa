// Train both services on a synthetic listing set and query them.
//
//     RUST_LOG=rental_ml=debug cargo run --example rental_pipeline

use std::error::Error;

use rental_ml::{
    InMemoryPropertyStore, MlConfig, PriceFeatures, PricePredictor, PropertyRecord, Recommender,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STATIONS: [&str; 5] = ["Sokol", "Aeroport", "Dinamo", "Belorusskaya", "Mayakovskaya"];

fn listings(n: usize) -> Vec<PropertyRecord> {
    (0..n)
        .map(|i| {
            let rooms = (i % 3 + 1) as f64;
            let area = 25.0 + rooms * 15.0 + (i % 5) as f64 * 2.5;
            let minutes = (3 + i * 7 % 25) as f64;
            PropertyRecord {
                id: i as i64 + 1,
                transit_station: STATIONS[i % STATIONS.len()].to_string(),
                access_mode: if i % 3 == 0 { "transport" } else { "walk" }.to_string(),
                commute_minutes: minutes,
                floor: (i % 16 + 1) as f64,
                building_floors: 17.0,
                room_count: rooms,
                total_area: area,
                living_area: Some(area * 0.55),
                kitchen_area: if i % 4 == 0 { None } else { Some(8.0) },
                price: 18_000.0 + area * 520.0 - minutes * 250.0 + (i % STATIONS.len()) as f64 * 2_000.0,
                view_count: (i * 31 % 97) as u64,
            }
        })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_ml=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => MlConfig::from_file(path)?,
        None => MlConfig::default(),
    };

    let store = InMemoryPropertyStore::new(listings(40))
        .with_favorite(1, 4)
        .with_favorite(1, 17);

    let predictor = PricePredictor::new(config.predictor.clone());
    let summary = predictor.train(&listings(40))?;
    println!("selected {} (held-out R² {:.3})", summary.selected, summary.test_r2);
    println!(
        "{}",
        serde_json::to_string_pretty(&predictor.performance_report().to_map())?
    );

    let request = PriceFeatures {
        transit_station: "Dinamo".to_string(),
        access_mode: "walk".to_string(),
        commute_minutes: 6.0,
        floor: 4.0,
        building_floors: 17.0,
        room_count: 2.0,
        total_area: 58.0,
        living_area: None,
        kitchen_area: Some(9.0),
    };
    println!("predicted rent: {:.2}", predictor.predict(&request)?);

    let recommender = Recommender::new(store, config.recommender);
    recommender.train_from_store()?;

    for record in recommender.similar(4, 3) {
        println!("similar to 4: #{} {} {:.0}", record.id, record.transit_station, record.price);
    }
    for user in [1, 2] {
        let picks: Vec<i64> = recommender
            .recommendations_for_user(user, 5)
            .iter()
            .map(|r| r.id)
            .collect();
        println!("user {user}: {picks:?}");
    }

    Ok(())
}
