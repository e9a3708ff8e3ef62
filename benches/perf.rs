use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use mlb_features::contention::{BinomialTable, RaceInputs, TieRule};
use mlb_features::fake_season::{self, SeasonPlan};
use mlb_features::{EngineConfig, FeatureEngine};

fn bench_engine_run(c: &mut Criterion) {
    let synthetic = fake_season::generate(&SeasonPlan::new(2017, 150, 1));
    let engine = FeatureEngine::new(EngineConfig::default(), &synthetic.reference);

    c.bench_function("engine_run_full_season", |b| {
        b.iter(|| {
            let mut records = synthetic.records.clone();
            let summary = engine.run(black_box(&mut records)).unwrap();
            black_box(summary.records);
        })
    });
}

fn bench_binomial_race(c: &mut Criterion) {
    let race = RaceInputs {
        games_remaining: 80,
        win_pct: 0.543,
        games_behind: 3,
        contender_games_remaining: 81,
        contender_pct: 0.571,
    };

    c.bench_function("binomial_race_cold", |b| {
        b.iter(|| {
            let mut table = BinomialTable::new();
            black_box(table.race(black_box(race), TieRule::TeamHolds));
        })
    });

    let mut warm = BinomialTable::new();
    warm.race(race, TieRule::TeamHolds);
    c.bench_function("binomial_race_memoized", |b| {
        b.iter(|| {
            black_box(warm.race(black_box(race), TieRule::TeamHolds));
        })
    });
}

criterion_group!(benches, bench_engine_run, bench_binomial_race);
criterion_main!(benches);
