mod analysis;
mod api;
mod cache;
mod config;
mod display;
mod error;
mod history;
mod rankings_file;
mod rate_limit;

use analysis::losses::FightCategory;
use anyhow::Context;
use api::client::LeekWarsClient;
use cache::FightCache;
use clap::Parser;
use config::{Config, TrackedConfig};
use display::output::{
    display_error, display_info, display_ranking, display_subject_summary, display_success,
    display_warning,
};
use history::{fetch_new_fights, TrackedSubject};
use rankings_file::Rankings;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "Dalton Rankings")]
#[command(about = "Collect the fights your Daltons lost and rank who beat them", long_about = None)]
struct Args {
    /// Tracked leeks/farmer file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Where cache.json and rankings.json live (default: ~/.dalton_rankings)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Do not process the tracked farmer's history
    #[arg(long)]
    skip_farmer: bool,

    /// Rows shown per ranking table (default: 10)
    #[arg(short, long, default_value = "10")]
    top: usize,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dalton_rankings")
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env().context("loading credentials")?;
    let tracked = TrackedConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

    let mut cache = FightCache::load(&data_dir).context("loading fight cache")?;
    let mut rankings = Rankings::load(&data_dir).context("loading rankings")?;

    let mut client = LeekWarsClient::new(&config);
    let me = client
        .login(&config.login, &config.password)
        .context("authenticating")?;
    display_success(&format!("Logged in as {} (#{})", me.login, me.id));

    for placeholder in tracked.placeholder_leeks() {
        display_warning(&format!("Skipping {} (placeholder ID 0)", placeholder.name));
    }

    for dalton in tracked.active_leeks() {
        let subject = TrackedSubject::Leek {
            id: dalton.leek_id,
            name: dalton.name.clone(),
        };
        display_info(&format!("Processing {} (ID: {})...", subject.name(), subject.id()));

        let own_id: HashSet<u64> = [dalton.leek_id].into_iter().collect();
        let losses = fetch_new_fights(
            &client,
            &subject,
            &mut cache,
            &own_id,
            Some(FightCategory::Solo),
        );
        let new_losses = losses.len();

        rankings.merge_character(dalton.leek_id, &dalton.name, losses);
        let table_size = rankings
            .daltons
            .get(&dalton.leek_id.to_string())
            .map(|r| r.solo.len())
            .unwrap_or(0);
        display_subject_summary(subject.name(), new_losses, table_size);

        // Progress of finished subjects survives a crash later in the run
        if let Err(e) = cache.save(&data_dir) {
            log::warn!("Could not save cache after {}: {}", subject.name(), e);
        }
    }

    match (&tracked.farmer, args.skip_farmer) {
        (Some(farmer), false) if farmer.farmer_id == 0 => {
            display_warning(&format!("Skipping farmer {} (placeholder ID 0)", farmer.name));
        }
        (Some(farmer), false) => {
            let subject = TrackedSubject::Farmer {
                id: farmer.farmer_id,
                name: farmer.name.clone(),
            };
            display_info(&format!(
                "Processing farmer {} (ID: {})...",
                subject.name(),
                subject.id()
            ));

            let all_daltons: HashSet<u64> = tracked.tracked_ids().into_iter().collect();
            let losses = fetch_new_fights(
                &client,
                &subject,
                &mut cache,
                &all_daltons,
                Some(FightCategory::Farmer),
            );
            let new_losses = losses.len();

            rankings.merge_farmer(losses);
            display_subject_summary(subject.name(), new_losses, rankings.farmer.len());
        }
        (Some(_), true) => log::info!("Farmer history skipped (--skip-farmer)"),
        (None, _) => log::debug!("No tracked farmer configured"),
    }

    rankings.stamp(&tracked);
    cache.save(&data_dir).context("saving fight cache")?;
    rankings.save(&data_dir).context("saving rankings")?;

    for dalton in tracked.active_leeks() {
        if let Some(ranking) = rankings.daltons.get(&dalton.leek_id.to_string()) {
            display_ranking(&format!("Solo losses of {}", dalton.name), &ranking.solo, args.top);
        }
    }
    if tracked.farmer.is_some() {
        display_ranking("Farmer losses", &rankings.farmer, args.top);
    }

    display_success(&format!(
        "Rankings saved to {}",
        Rankings::get_rankings_path(&data_dir).display()
    ));

    Ok(())
}
