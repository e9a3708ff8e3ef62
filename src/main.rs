use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use tracing::{error, info};

use mlb_features::{EngineConfig, FeatureEngine, GameRecord, ReferenceData, RunSummary, export};

const USAGE: &str = "usage: mlb_features [--reference FILE] [--out-dir DIR] [--db FILE] GAMES.json...";

#[derive(Debug, Default)]
struct Args {
    reference: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    db: Option<PathBuf>,
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    mlb_features::logging::init_logging();

    let args = parse_args(std::env::args().skip(1))?;
    if args.inputs.is_empty() {
        return Err(anyhow!("no game files given\n{USAGE}"));
    }

    let reference = match args.reference.as_deref() {
        Some(path) => load_reference(path)?,
        None => ReferenceData::default(),
    };
    let config = EngineConfig::from_env();
    info!(
        min_games = config.min_games,
        season_length = config.season_length,
        tie_rule = ?config.tie_rule,
        "engine configured"
    );
    let engine = FeatureEngine::new(config, &reference);

    // Files are independent runs; each gets its own trackers and caches.
    let results = args
        .inputs
        .par_iter()
        .map(|path| (path, process_file(&engine, path)))
        .collect::<Vec<_>>();

    let out_dir = args.out_dir.unwrap_or_else(|| PathBuf::from("features"));
    let mut conn = match args.db.as_deref() {
        Some(path) => Some(export::open_db(path)?),
        None => None,
    };

    let mut failed = 0usize;
    for (path, result) in results {
        let (records, summary) = match result {
            Ok(ok) => ok,
            Err(err) => {
                error!(file = %path.display(), "{err:#}");
                failed += 1;
                continue;
            }
        };
        let out_path = out_dir.join(output_name(path));
        let written = export::write_jsonl(&out_path, &records)?;
        if let Some(conn) = conn.as_mut() {
            export::write_features(conn, &records)?;
        }
        println!(
            "{}: {} rows -> {} (seasons {:?}, snapshots {})",
            path.display(),
            written,
            out_path.display(),
            summary.seasons,
            summary.standings_snapshots
        );
    }

    if failed > 0 {
        return Err(anyhow!("{failed} file(s) failed"));
    }
    Ok(())
}

fn process_file(engine: &FeatureEngine, path: &Path) -> Result<(Vec<GameRecord>, RunSummary)> {
    let mut records = load_records(path)?;
    let summary = engine
        .run(&mut records)
        .with_context(|| format!("build features for {}", path.display()))?;
    Ok((records, summary))
}

fn load_records(path: &Path) -> Result<Vec<GameRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse game records {}", path.display()))
}

fn load_reference(path: &Path) -> Result<ReferenceData> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse reference data {}", path.display()))
}

fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("games");
    format!("{stem}.features.jsonl")
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args> {
    let raw = raw.collect::<Vec<_>>();
    let mut args = Args::default();
    let mut idx = 0;
    while idx < raw.len() {
        let arg = &raw[idx];
        idx += 1;
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let slot = match flag {
            "--reference" => &mut args.reference,
            "--out-dir" => &mut args.out_dir,
            "--db" => &mut args.db,
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            other if other.starts_with("--") => {
                return Err(anyhow!("unknown flag {other}\n{USAGE}"));
            }
            _ => {
                args.inputs.push(PathBuf::from(arg));
                continue;
            }
        };
        let value = match inline {
            Some(value) => value,
            None => {
                let Some(next) = raw.get(idx) else {
                    return Err(anyhow!("{flag} needs a value"));
                };
                idx += 1;
                next.clone()
            }
        };
        if value.trim().is_empty() {
            return Err(anyhow!("{flag} needs a value"));
        }
        *slot = Some(PathBuf::from(value.trim()));
    }
    Ok(args)
}
