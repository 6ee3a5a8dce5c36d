use crate::analysis::losses::LossEntry;
use chrono::{TimeZone, Utc};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct LossRow {
    rank: String,
    farmer: String,
    leeks: String,
    level: String,
    turns: String,
    date: String,
    fight: String,
}

fn format_date(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .filter(|_| timestamp > 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn display_ranking(title: &str, entries: &[LossEntry], top_n: usize) {
    println!("\n{}", format!("🏆 {}", title).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if entries.is_empty() {
        println!("{}", "No losses recorded yet".yellow());
        return;
    }

    let rows: Vec<LossRow> = entries
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, entry)| LossRow {
            rank: format!("#{}", idx + 1),
            farmer: entry.farmer_name.clone(),
            leeks: entry.leek_names(),
            level: entry.total_level.to_string(),
            turns: entry.turns.to_string(),
            date: format_date(entry.date),
            fight: entry.fight_id.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if entries.len() > top_n {
        println!("  … and {} more", entries.len() - top_n);
    }
}

pub fn display_subject_summary(name: &str, new_losses: usize, table_size: usize) {
    if new_losses == 0 {
        println!("  {} {}: no new losses ({} in table)", "•".dimmed(), name, table_size);
    } else {
        println!(
            "  {} {}: {} new losses ({} in table)",
            "•".red(),
            name,
            new_losses.to_string().red().bold(),
            table_size
        );
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_render_as_days() {
        assert_eq!(format_date(1_700_000_000), "2023-11-14");
        assert_eq!(format_date(0), "-");
    }
}
