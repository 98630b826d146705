//! Elimination trajectory report
//!
//! Collects what each round saw and removed, plus the final per-attribute
//! ranking, for display and JSON export. The report is bookkeeping only:
//! the durable outcome of a run is the pruned attribute set and training
//! data.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Table};
use console::style;
use serde::Serialize;

use crate::crossval::AttributeLossRecord;

/// One attribute's primary loss inside an iteration's ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedLoss {
    pub attribute: String,
    pub loss: f64,
}

/// What a single elimination round observed and removed.
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    /// 1-based round number.
    pub iteration: usize,
    /// Attributes evaluated this round (sentinel included).
    pub attributes_evaluated: usize,
    /// Loss map of the no-removal baseline for this round.
    pub baseline_losses: BTreeMap<String, f64>,
    /// Primary losses, most-important-first.
    pub ranked_losses: Vec<RankedLoss>,
    /// Names pruned at the end of this round (empty on the final round).
    pub removed: Vec<String>,
}

/// Full trajectory of one elimination run.
#[derive(Debug, Clone, Serialize, Default)]
pub struct EliminationReport {
    pub primary_loss: String,
    pub created_at: String,
    pub iterations: Vec<IterationRecord>,
    /// Per-attribute losses from the final round, most-important-first.
    pub final_ranking: Vec<AttributeLossRecord>,
    /// Attribute names still in play after the final round, sorted.
    pub surviving_attributes: Vec<String>,
}

impl EliminationReport {
    pub fn new(primary_loss: &str) -> Self {
        Self {
            primary_loss: primary_loss.to_string(),
            created_at: Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    pub fn push_iteration(&mut self, record: IterationRecord) {
        self.iterations.push(record);
    }

    pub fn set_outcome(
        &mut self,
        final_ranking: Vec<AttributeLossRecord>,
        mut surviving_attributes: Vec<String>,
    ) {
        surviving_attributes.sort();
        self.final_ranking = final_ranking;
        self.surviving_attributes = surviving_attributes;
    }

    /// Total attributes removed across all rounds.
    pub fn total_removed(&self) -> usize {
        self.iterations.iter().map(|i| i.removed.len()).sum()
    }

    /// Baseline primary loss per round, for trend inspection.
    pub fn baseline_trajectory(&self) -> Vec<Option<f64>> {
        self.iterations
            .iter()
            .map(|i| i.baseline_losses.get(&self.primary_loss).copied())
            .collect()
    }

    /// Print a styled trajectory and final-ranking summary.
    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📉").cyan(),
            style("ELIMINATION TRAJECTORY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Round").add_attribute(Attribute::Bold),
            Cell::new("Attributes").add_attribute(Attribute::Bold),
            Cell::new(format!("Baseline {}", self.primary_loss)).add_attribute(Attribute::Bold),
            Cell::new("Removed").add_attribute(Attribute::Bold),
        ]);

        for record in &self.iterations {
            let baseline = record
                .baseline_losses
                .get(&self.primary_loss)
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(record.iteration),
                Cell::new(record.attributes_evaluated),
                Cell::new(baseline),
                Cell::new(record.removed.len()),
            ]);
        }

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "    {} {}",
            style("🏁").cyan(),
            style("FINAL RANKING").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());

        let mut ranking_table = Table::new();
        ranking_table.load_preset(UTF8_FULL_CONDENSED);
        ranking_table.set_header(vec![
            Cell::new("Attribute").add_attribute(Attribute::Bold),
            Cell::new(self.primary_loss.as_str()).add_attribute(Attribute::Bold),
        ]);

        for record in &self.final_ranking {
            let loss = record
                .losses
                .get(&self.primary_loss)
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "-".to_string());
            ranking_table.add_row(vec![Cell::new(record.attribute.as_str()), Cell::new(loss)]);
        }

        for line in ranking_table.to_string().lines() {
            println!("    {}", line);
        }

        println!(
            "      {} surviving, {} removed in total",
            style(self.surviving_attributes.len()).green().bold(),
            style(self.total_removed()).yellow().bold()
        );
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize elimination report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}
