use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde_json::{Map, Value, json};

use crate::record::{GameRecord, Metric, Side, TeamLine};

fn put<T: Into<Value>>(row: &mut Map<String, Value>, key: String, value: Option<T>) {
    row.insert(key, value.map(Into::into).unwrap_or(Value::Null));
}

fn side_columns(row: &mut Map<String, Value>, side: Side, line: &TeamLine) {
    let prefix = side.prefix();
    let f = &line.features;
    row.insert(prefix.to_string(), json!(line.team));
    row.insert(format!("{prefix}_game_number"), json!(line.game_number));
    row.insert(format!("{prefix}_league"), json!(line.league));
    row.insert(format!("{prefix}_division"), json!(line.division));
    put(row, format!("{prefix}_loss_count"), f.loss_count);
    put(row, format!("{prefix}_streak"), f.streak);
    for metric in Metric::ALL {
        if let Some(v) = f.cumulative.get(&metric) {
            row.insert(format!("cumulative_{prefix}_{metric}"), json!(v));
        }
        if let Some(v) = f.cumulative_normalized.get(&metric) {
            row.insert(format!("cumulative_{prefix}_{metric}_normalized"), json!(v));
        }
    }
    put(row, format!("{prefix}_rank_in_division"), f.rank_in_division);
    put(row, format!("{prefix}_games_behind"), f.games_behind);
    put(row, format!("{prefix}_contender_pct"), f.contender_pct);
    put(
        row,
        format!("{prefix}_contender_games_remaining"),
        f.contender_games_remaining,
    );
    put(row, format!("{prefix}_contention_score"), f.contention_score);

    let lineup = [
        ("max_salary_normalized", f.max_salary_normalized),
        ("avg_salary_normalized", f.avg_salary_normalized),
        ("starter_salary_normalized", f.starter_salary_normalized),
        ("average_player_age_normalized", f.avg_player_age_normalized),
        ("max_player_age_normalized", f.max_player_age_normalized),
        ("max_slg_normalized", f.max_slg_normalized),
        ("avg_slg_normalized", f.avg_slg_normalized),
        ("max_ops_normalized", f.max_ops_normalized),
        ("avg_ops_normalized", f.avg_ops_normalized),
        ("starter_era_normalized", f.starter_era_normalized),
        ("starter_wpa_normalized", f.starter_wpa_normalized),
    ];
    for (name, value) in lineup {
        if value.is_some() {
            put(row, format!("{prefix}_{name}"), value);
        }
    }
}

/// Flat feature row for one game, keyed by the column names downstream
/// models train on.
pub fn feature_row(record: &GameRecord) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("season".into(), json!(record.season));
    row.insert("date".into(), json!(record.date.to_string()));
    row.insert("number_of_game".into(), json!(record.number_of_game));
    row.insert("park_id".into(), json!(record.park_id));
    for side in Side::BOTH {
        side_columns(&mut row, side, record.side(side));
    }

    let g = &record.features;
    put(&mut row, "winning_team".into(), g.winning_team.clone());
    put(&mut row, "is_intradivision".into(), g.is_intradivision);
    put(&mut row, "interleague".into(), g.interleague);
    put(&mut row, "holiday".into(), g.holiday);
    put(&mut row, "rivalry".into(), g.rivalry);
    put(&mut row, "park_capacity".into(), g.park_capacity);
    put(
        &mut row,
        "avg_ticket_price_normalized".into(),
        g.avg_ticket_price_normalized,
    );
    put(&mut row, "temp".into(), g.temp);
    put(&mut row, "wind".into(), g.wind);
    put(&mut row, "condition_score".into(), g.condition_score);
    row
}

/// One JSON object per line. Returns the number of rows written.
pub fn write_jsonl(path: &Path, records: &[GameRecord]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut out, &feature_row(record)).context("encode feature row")?;
        out.write_all(b"\n")?;
    }
    out.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(records.len())
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS game_features (
            season INTEGER NOT NULL,
            date TEXT NOT NULL,
            number_of_game INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            visiting_team TEXT NOT NULL,
            features_json TEXT NOT NULL,
            PRIMARY KEY (season, date, number_of_game, home_team)
        );
        CREATE INDEX IF NOT EXISTS idx_game_features_date ON game_features(date);
        CREATE INDEX IF NOT EXISTS idx_game_features_visiting ON game_features(visiting_team);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Upserts every record inside one transaction. Re-running a season
/// replaces its rows.
pub fn write_features(conn: &mut Connection, records: &[GameRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin export transaction")?;
    for record in records {
        upsert_row(&tx, record)?;
    }
    tx.commit().context("commit export transaction")?;
    Ok(records.len())
}

fn upsert_row(tx: &rusqlite::Transaction<'_>, record: &GameRecord) -> Result<()> {
    let features_json =
        serde_json::to_string(&feature_row(record)).context("encode feature row")?;
    tx.execute(
        r#"
        INSERT INTO game_features (
            season, date, number_of_game, home_team, visiting_team, features_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(season, date, number_of_game, home_team) DO UPDATE SET
            visiting_team = excluded.visiting_team,
            features_json = excluded.features_json
        "#,
        params![
            record.season,
            record.date.to_string(),
            record.number_of_game as i64,
            record.home.team,
            record.visiting.team,
            features_json,
        ],
    )
    .with_context(|| {
        format!(
            "upsert {} {} {}@{}",
            record.date, record.number_of_game, record.visiting.team, record.home.team
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn row_uses_flat_column_names() {
        let date = NaiveDate::from_ymd_opt(2017, 4, 2).expect("valid date");
        let mut record =
            GameRecord::new(2017, date, TeamLine::new("NYA", 3, 12), TeamLine::new("BOS", 5, 12));
        record.home.features.loss_count = Some(4);
        record.home.features.cumulative.insert(Metric::Runs, 50.0);
        record
            .home
            .features
            .cumulative_normalized
            .insert(Metric::Runs, 1.25);
        record.features.winning_team = Some("BOS".into());

        let row = feature_row(&record);
        assert_eq!(row["home_team"], json!("NYA"));
        assert_eq!(row["home_team_loss_count"], json!(4));
        assert_eq!(row["cumulative_home_team_runs"], json!(50.0));
        assert_eq!(row["cumulative_home_team_runs_normalized"], json!(1.25));
        assert_eq!(row["visiting_team_loss_count"], Value::Null);
        assert_eq!(row["winning_team"], json!("BOS"));
        assert_eq!(row["date"], json!("2017-04-02"));
        assert!(!row.contains_key("cumulative_visiting_team_runs"));
        assert!(!row.contains_key("home_team_max_salary_normalized"));
    }

    #[test]
    fn lineup_columns_appear_once_computed() {
        let date = NaiveDate::from_ymd_opt(2017, 4, 2).expect("valid date");
        let mut record =
            GameRecord::new(2017, date, TeamLine::new("NYA", 3, 12), TeamLine::new("BOS", 5, 12));
        record.visiting.features.starter_era_normalized = Some(-0.5);
        record.home.features.avg_player_age_normalized = Some(1.5);
        let row = feature_row(&record);
        assert_eq!(row["visiting_team_starter_era_normalized"], json!(-0.5));
        assert_eq!(row["home_team_average_player_age_normalized"], json!(1.5));
    }

    #[test]
    fn open_db_reports_unusable_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").expect("write blocker file");
        let err = open_db(&blocker.join("features.sqlite")).unwrap_err();
        assert!(format!("{err:#}").contains("create db dir"), "{err:#}");
    }
}
