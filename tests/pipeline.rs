use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use mlb_features::fake_season::{self, SeasonPlan};
use mlb_features::{EngineConfig, FeatureEngine, FeatureError, GameRecord, Metric, ReferenceData};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_season() -> (Vec<GameRecord>, ReferenceData) {
    let records = serde_json::from_str(&read_fixture("mini_season.json"))
        .expect("season fixture should parse");
    let reference = serde_json::from_str(&read_fixture("mini_reference.json"))
        .expect("reference fixture should parse");
    (records, reference)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn enriches_fixture_season() {
    let (mut records, reference) = fixture_season();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let summary = engine.run(&mut records).expect("fixture run should succeed");

    assert_eq!(summary.records, 6);
    assert_eq!(summary.seasons, vec![2017]);
    assert_eq!(summary.renamed_teams, 2);
    assert_eq!(summary.standings_snapshots, 3);
    assert!(summary.weather_applied);
    assert!(summary.ticket_prices_applied);
    assert!(!summary.salaries_applied);
    assert!(!summary.player_ages_applied);
    assert!(!summary.player_stats_applied);

    // CAL was renamed before the division join.
    assert_eq!(records[1].visiting.team, "ANA");
    assert_eq!(records[1].visiting.division.as_deref(), Some("West"));

    let losses = |i: usize| {
        (
            records[i].home.features.loss_count,
            records[i].visiting.features.loss_count,
        )
    };
    assert_eq!(losses(0), (Some(0), Some(0)));
    assert_eq!(losses(2), (Some(1), Some(0)));
    assert_eq!(losses(3), (Some(1), Some(1)));
    assert_eq!(losses(5), (Some(1), Some(2)));

    assert_eq!(records[2].features.winning_team.as_deref(), Some("BOS"));
    assert_eq!(records[3].features.winning_team.as_deref(), Some("NYA"));
    assert_eq!(records[3].home.features.streak, Some(1));
    assert_eq!(records[3].visiting.features.streak, Some(-1));

    // NYA totals entering game 4: 5 + 1 + 7.
    assert_eq!(records[5].home.features.cumulative[&Metric::Runs], 13.0);
    for r in &records {
        assert_eq!(r.home.features.cumulative_normalized[&Metric::Runs], 0.0);
        assert_eq!(r.home.features.contention_score, Some(0.5));
    }
}

#[test]
fn standings_fields_follow_the_daily_snapshot() {
    let (mut records, reference) = fixture_season();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    engine.run(&mut records).expect("fixture run should succeed");

    // Opening day: everyone level, contender is the division rival.
    let nya = &records[0].home.features;
    assert_eq!(nya.rank_in_division, Some(1));
    assert_eq!(nya.games_behind, Some(0));
    assert_eq!(nya.contender_pct, Some(0.5));
    assert_eq!(nya.contender_games_remaining, Some(162));

    // April 4, first leg: BOS one loss behind NYA.
    let bos = &records[2].home.features;
    assert_eq!(bos.rank_in_division, Some(2));
    assert_eq!(bos.games_behind, Some(1));
    assert_eq!(bos.contender_pct, Some(1.0));
    assert_eq!(bos.contender_games_remaining, Some(160));
    let nya = &records[2].visiting.features;
    assert_eq!(nya.rank_in_division, Some(1));
    assert_eq!(nya.games_behind, Some(-1));
    assert_eq!(nya.contender_pct, Some(0.0));

    // The nightcap reads the same snapshot.
    let bos = &records[3].home.features;
    assert_eq!(bos.rank_in_division, Some(2));
    assert_eq!(bos.games_behind, Some(1));

    // July 4: NYA 1 loss in 3, BOS 2 in 3.
    let nya = &records[5].home.features;
    assert_eq!(nya.rank_in_division, Some(1));
    assert_eq!(nya.games_behind, Some(-1));
    assert!(close(nya.contender_pct.expect("set"), 0.333));
    assert_eq!(nya.contender_games_remaining, Some(159));
    let bos = &records[5].visiting.features;
    assert_eq!(bos.rank_in_division, Some(2));
    assert!(close(bos.contender_pct.expect("set"), 0.667));
}

#[test]
fn game_context_and_weather() {
    let (mut records, reference) = fixture_season();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    engine.run(&mut records).expect("fixture run should succeed");

    let opener = &records[0].features;
    assert_eq!(opener.rivalry, Some(true));
    assert_eq!(opener.is_intradivision, Some(true));
    assert_eq!(opener.interleague, Some(false));
    assert_eq!(opener.holiday, Some(false));
    assert_eq!(opener.park_capacity, Some(47_309));
    assert!(close(opener.avg_ticket_price_normalized.expect("set"), 1.633));
    assert_eq!(opener.temp, Some(45.0));
    assert_eq!(opener.condition_score, Some(0.0));

    // Domed park with no wind reading: mean of every wind reading.
    let dome = &records[1].features;
    assert!(close(dome.wind.expect("set"), 20.0 / 3.0));
    assert_eq!(dome.condition_score, Some(0.0));
    assert!(close(dome.avg_ticket_price_normalized.expect("set"), -0.816));

    assert_eq!(records[2].features.condition_score, Some(5.0));
    assert_eq!(records[5].features.holiday, Some(true));
}

#[test]
fn out_of_order_records_are_rejected() {
    let (mut records, reference) = fixture_season();
    records.swap(0, 5);
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let err = engine.run(&mut records).unwrap_err();
    assert!(matches!(err, FeatureError::OutOfOrder { index: 1, .. }));
}

#[test]
fn season_going_backwards_is_out_of_order() {
    let (mut records, reference) = fixture_season();
    records.truncate(2);
    records[0].date = NaiveDate::from_ymd_opt(2017, 4, 2).expect("valid date");
    records[0].season = 2017;
    records[1].date = NaiveDate::from_ymd_opt(2017, 4, 3).expect("valid date");
    records[1].season = 2016;
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let err = engine.run(&mut records).unwrap_err();
    assert!(matches!(err, FeatureError::OutOfOrder { index: 1, .. }));
}

#[test]
fn unknown_team_is_a_missing_reference() {
    let (mut records, reference) = fixture_season();
    records[4].home.team = "XXX".to_string();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let err = engine.run(&mut records).unwrap_err();
    assert!(matches!(err, FeatureError::MissingReference { table: "division", .. }));
}

#[test]
fn optional_tables_are_skipped_when_empty() {
    let (mut records, mut reference) = fixture_season();
    reference.weather.clear();
    reference.ticket_prices.clear();
    reference.park_capacities.clear();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let summary = engine.run(&mut records).expect("run without optional tables");
    assert!(!summary.weather_applied);
    assert!(!summary.ticket_prices_applied);
    assert!(records.iter().all(|r| r.features.temp.is_none()));
    assert!(records.iter().all(|r| r.features.park_capacity.is_none()));
    assert_eq!(records[0].features.rivalry, Some(true));
}

#[test]
fn synthetic_season_runs_end_to_end() {
    let synthetic = fake_season::generate(&SeasonPlan::new(2017, 60, 5));
    let mut records = synthetic.records;
    let engine = FeatureEngine::new(EngineConfig::default(), &synthetic.reference);
    let summary = engine.run(&mut records).expect("synthetic run should succeed");
    assert_eq!(summary.standings_snapshots, 60);

    for r in &records {
        for line in [&r.home, &r.visiting] {
            let score = line.features.contention_score.expect("score set");
            assert!((0.0..=1.0 + 1e-9).contains(&score), "score {score} out of range");
            assert_eq!(line.features.cumulative.len(), 3);
        }
        assert!(r.features.temp.is_some());
        assert!(r.features.avg_ticket_price_normalized.is_some());
        for line in [&r.home, &r.visiting] {
            let f = &line.features;
            assert!(f.max_salary_normalized.is_some());
            assert!(f.starter_salary_normalized.is_some());
            assert!(f.avg_player_age_normalized.is_some());
            assert!(f.avg_ops_normalized.is_some());
            if line.game_number <= 10 {
                assert_eq!(f.starter_era_normalized, Some(0.0));
            }
        }
    }
    assert!(summary.salaries_applied);
    assert!(summary.player_ages_applied);
    assert!(summary.player_stats_applied);
    // Late-season scores move off the cold-start value.
    assert!(
        records
            .iter()
            .filter(|r| r.home.game_number > 10)
            .any(|r| r.home.features.contention_score != Some(0.5))
    );
}

#[test]
fn repeated_runs_are_independent() {
    let (records, reference) = fixture_season();
    let engine = FeatureEngine::new(EngineConfig::default(), &reference);
    let mut first = records.clone();
    let mut second = records;
    engine.run(&mut first).expect("first run");
    engine.run(&mut second).expect("second run");
    assert_eq!(first, second);
}
