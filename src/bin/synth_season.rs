use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use mlb_features::fake_season::{self, SeasonPlan};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    mlb_features::logging::init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let out_dir = arg_value(&args, "--out-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("synthetic"));
    let season = arg_value(&args, "--season")
        .and_then(|val| val.parse::<i32>().ok())
        .unwrap_or(2017);
    let days = arg_value(&args, "--days")
        .and_then(|val| val.parse::<u32>().ok())
        .unwrap_or(150)
        .clamp(1, 200);
    let seed = arg_value(&args, "--seed")
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(42);

    let plan = SeasonPlan::new(season, days, seed);
    let synthetic = fake_season::generate(&plan);

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir {}", out_dir.display()))?;
    let games_path = out_dir.join(format!("games_{season}.json"));
    let reference_path = out_dir.join("reference.json");
    fs::write(
        &games_path,
        serde_json::to_vec_pretty(&synthetic.records).context("encode games")?,
    )
    .with_context(|| format!("write {}", games_path.display()))?;
    fs::write(
        &reference_path,
        serde_json::to_vec_pretty(&synthetic.reference).context("encode reference data")?,
    )
    .with_context(|| format!("write {}", reference_path.display()))?;

    info!(season, days, seed, games = synthetic.records.len(), "synthetic season written");
    println!("Games: {}", games_path.display());
    println!("Reference: {}", reference_path.display());
    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
