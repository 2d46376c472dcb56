use backend_api::{run_server, MemoryRepository};
use chrono::NaiveDate;
use models::{AppSettings, StrategyDefaults};
use std::sync::Arc;
use std::{env, path::PathBuf};

/// Single-tenant default: requests for other user ids still work once their
/// data is seeded through the API.
const DEFAULT_USER: &str = "demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments or environment variables (with sane defaults)
    let settings_path_raw =
        env::var("SETTINGS_PATH").unwrap_or_else(|_| "settings.json".to_string());
    let settings_path = PathBuf::from(&settings_path_raw);

    let settings = settings_loader::load_settings_with_fallback(Some(&settings_path))?
        .unwrap_or_else(default_settings);

    let host = env::var("HOST").unwrap_or_else(|_| settings.host.clone());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(settings.port);
    let seed_path = env::var("SEED_PATH")
        .ok()
        .or_else(|| settings.seed_file.clone())
        .map(PathBuf::from);

    println!("Paycheck Plan API Server");
    println!("========================");
    println!("Settings path: {}", settings_path.display());
    println!(
        "Reference paycheck date: {}",
        settings.reference_paycheck_date
    );
    match &seed_path {
        Some(path) => println!("Seed file: {}", path.display()),
        None => println!("Seed file: (none; POST records through the API)"),
    }
    println!("Listening on: {}:{}", host, port);
    println!();

    let repo = Arc::new(MemoryRepository::from_settings(&settings));

    if let Some(path) = &seed_path {
        if !path.exists() {
            eprintln!("[FATAL] seed file not found at: {}", path.display());
            eprintln!("        Set SEED_PATH or settings.seedFile to a UserData JSON file.");
            std::process::exit(1);
        }
        repo.load_seed_file(DEFAULT_USER, path)
            .await
            .map_err(|e| anyhow::anyhow!("loading seed file: {}", e))?;
    }

    // Start the server
    run_server(repo, &host, port).await?;

    Ok(())
}

/// Settings when no settings.json exists anywhere: biweekly paychecks
/// anchored on 2025-11-26, localhost binding.
fn default_settings() -> AppSettings {
    AppSettings {
        reference_paycheck_date: NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(),
        host: "127.0.0.1".to_string(),
        port: 3000,
        seed_file: None,
        defaults: StrategyDefaults::default(),
    }
}
