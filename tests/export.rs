use std::fs;

use serde_json::Value;

use mlb_features::export;
use mlb_features::fake_season::{self, SeasonPlan};
use mlb_features::{EngineConfig, FeatureEngine, GameRecord};

fn enriched(days: u32) -> Vec<GameRecord> {
    let synthetic = fake_season::generate(&SeasonPlan::new(2017, days, 9));
    let mut records = synthetic.records;
    FeatureEngine::new(EngineConfig::default(), &synthetic.reference)
        .run(&mut records)
        .expect("synthetic run should succeed");
    records
}

#[test]
fn jsonl_has_one_row_per_game() {
    let records = enriched(5);
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("2017.features.jsonl");

    let written = export::write_jsonl(&path, &records).expect("write jsonl");
    assert_eq!(written, records.len());

    let raw = fs::read_to_string(&path).expect("read back");
    let rows = raw
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).expect("each line is json"))
        .collect::<Vec<_>>();
    assert_eq!(rows.len(), records.len());
    assert_eq!(rows[0]["home_team"], Value::from(records[0].home.team.clone()));
    assert_eq!(rows[0]["home_team_loss_count"], Value::from(0));
    assert_eq!(rows[0]["home_team_contention_score"], Value::from(0.5));
    assert!(rows[0]["cumulative_visiting_team_home_runs_normalized"].is_number());
    assert!(rows[0]["winning_team"].is_string());
}

#[test]
fn sqlite_upserts_by_game() {
    let records = enriched(4);
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("features.sqlite");

    let mut conn = export::open_db(&path).expect("open db");
    export::write_features(&mut conn, &records).expect("first write");
    export::write_features(&mut conn, &records).expect("second write replaces rows");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM game_features", [], |row| row.get(0))
        .expect("count rows");
    assert_eq!(count, records.len() as i64);

    let first = &records[0];
    let stored: String = conn
        .query_row(
            "SELECT features_json FROM game_features
             WHERE season = ?1 AND date = ?2 AND number_of_game = ?3 AND home_team = ?4",
            rusqlite::params![
                first.season,
                first.date.to_string(),
                first.number_of_game as i64,
                first.home.team,
            ],
            |row| row.get(0),
        )
        .expect("row for first game");
    let row: Value = serde_json::from_str(&stored).expect("stored json parses");
    assert_eq!(row["visiting_team"], Value::from(first.visiting.team.clone()));
    assert_eq!(row["park_capacity"], Value::from(first.features.park_capacity));
}
