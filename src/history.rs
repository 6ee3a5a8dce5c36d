use crate::analysis::losses::{extract_loss, FightCategory, LossEntry};
use crate::api::models::{FightRecord, FightSummary};
use crate::cache::FightCache;
use crate::error::AppError;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;

/// Whose fight history is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedSubject {
    Leek { id: u64, name: String },
    Farmer { id: u64, name: String },
}

impl TrackedSubject {
    pub fn cache_key(&self) -> String {
        match self {
            TrackedSubject::Leek { id, .. } => format!("leek_{}", id),
            TrackedSubject::Farmer { id, .. } => format!("farmer_{}", id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TrackedSubject::Leek { name, .. } | TrackedSubject::Farmer { name, .. } => name,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            TrackedSubject::Leek { id, .. } | TrackedSubject::Farmer { id, .. } => *id,
        }
    }
}

/// Read access to the remote fight API.
pub trait FightSource {
    fn history(&self, subject: &TrackedSubject) -> Result<Vec<FightSummary>, AppError>;
    fn fight(&self, fight_id: u64) -> Result<FightRecord, AppError>;
}

/// Fetches the fights of `subject` not yet in `cache`, records them as
/// processed and returns the losses among them.
///
/// A failed history request skips the subject. A failed detail request still
/// marks the fight as processed so a broken record is not retried forever.
pub fn fetch_new_fights<S: FightSource>(
    source: &S,
    subject: &TrackedSubject,
    cache: &mut FightCache,
    tracked_ids: &HashSet<u64>,
    category_filter: Option<FightCategory>,
) -> Vec<LossEntry> {
    let summaries = match source.history(subject) {
        Ok(summaries) => summaries,
        Err(e) => {
            log::warn!("Skipping {}: history request failed: {}", subject.name(), e);
            return Vec::new();
        }
    };

    let cache_key = subject.cache_key();
    let uncached: Vec<&FightSummary> = summaries
        .iter()
        .filter(|f| !cache.contains(&cache_key, f.id))
        .collect();
    // Fights of the wrong category are marked processed without fetching.
    let skipped: Vec<u64> = uncached
        .iter()
        .filter(|f| !matches_filter(f, category_filter))
        .map(|f| f.id)
        .collect();
    let new_ids: Vec<u64> = uncached
        .iter()
        .filter(|f| matches_filter(f, category_filter))
        .map(|f| f.id)
        .collect();

    log::info!(
        "{}: {} fights in history, {} new to fetch, {} skipped by category",
        subject.name(),
        summaries.len(),
        new_ids.len(),
        skipped.len()
    );

    let pb = ProgressBar::new(new_ids.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(format!("fights of {}", subject.name()));

    let mut losses = Vec::new();
    let mut processed = Vec::with_capacity(new_ids.len());

    for fight_id in new_ids {
        match source.fight(fight_id) {
            Ok(fight) => {
                if let Some(entry) = extract_loss(&fight, tracked_ids) {
                    log::debug!(
                        "Loss in {} fight {}: {} with {} in {} turns",
                        entry.fight_type.label(),
                        fight_id,
                        entry.farmer_name,
                        entry.leek_names(),
                        entry.turns
                    );
                    losses.push(entry);
                }
            }
            Err(e) => log::warn!("Fight {} could not be fetched: {}", fight_id, e),
        }
        processed.push(fight_id);
        pb.inc(1);
    }

    pb.finish_and_clear();

    cache.add_fights(&cache_key, processed.into_iter().chain(skipped));
    log::debug!("{} now has {} cached fights", cache_key, cache.len(&cache_key));
    losses
}

fn matches_filter(summary: &FightSummary, category_filter: Option<FightCategory>) -> bool {
    category_filter
        .map(|category| FightCategory::from_code(summary.kind) == category)
        .unwrap_or(true)
}
