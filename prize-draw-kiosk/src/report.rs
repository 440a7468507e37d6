//! Console and JSON rendering of session state and command results.
use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use prize_draw_core::{
    BoostParams, DrawCounts, DrawSession, Eligibility, Inventory, PrizeTargets, ProbRow, Weights,
};
use serde::Serialize;
use std::io::Write;

use crate::simulate::SimulationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable tables
    Console,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport<'a> {
    pub inventory: &'a Inventory,
    pub base_stock: &'a Inventory,
    pub draw_counts: DrawCounts,
    pub total_stock: u64,
    pub weights: &'a Weights,
    pub params: BoostParams,
    pub targets: &'a PrizeTargets,
}

impl<'a> StatusReport<'a> {
    #[must_use]
    pub fn from_session(session: &'a DrawSession) -> Self {
        Self {
            inventory: session.displayed_inventory(),
            base_stock: session.base_stock(),
            draw_counts: session.draw_counts(),
            total_stock: session.total_stock(),
            weights: session.weights(),
            params: session.config().params,
            targets: &session.config().targets,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsReport {
    pub visits: u32,
    pub multiplier: f64,
    pub can_draw: bool,
    pub eligibility: String,
    pub rows: Vec<ProbRow>,
}

impl OddsReport {
    #[must_use]
    pub fn from_session(session: &DrawSession, visits: u32) -> Self {
        Self {
            visits,
            multiplier: session.config().multiplier(visits),
            can_draw: session.can_draw(visits),
            eligibility: session.eligibility(visits).to_string(),
            rows: session.prob_rows(visits),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawReport {
    pub prize: String,
    pub rank: Option<usize>,
    pub winning: bool,
    pub visits: u32,
    pub seed: u64,
    pub drawn_at: String,
    pub total_stock: u64,
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

fn heading(out: &mut dyn Write, title: &str) -> Result<()> {
    writeln!(out, "{}", title.bright_cyan().bold())?;
    writeln!(out, "{}", "=".repeat(title.chars().count().max(8)).cyan())?;
    Ok(())
}

pub fn write_status(
    out: &mut dyn Write,
    format: ReportFormat,
    report: &StatusReport<'_>,
) -> Result<()> {
    if format == ReportFormat::Json {
        return write_json(out, report);
    }
    heading(out, "🎁 Prize Stock")?;
    for (prize, &stock) in report.inventory.iter() {
        let base = report.base_stock.stock_of(prize);
        let drawn = report.draw_counts.get(prize);
        let stock_text = if stock == 0 {
            stock.to_string().red()
        } else {
            stock.to_string().green()
        };
        writeln!(
            out,
            "  {prize:<10} {stock_text:>5} left  (base {base}, drawn {drawn}, weight {:.2})",
            report.weights.weight_of(prize)
        )?;
    }
    writeln!(out, "Total stock: {}", report.total_stock.to_string().bold())?;
    writeln!(
        out,
        "Params: N={} beta={} Mcap={}",
        report.params.threshold, report.params.beta, report.params.mcap
    )?;
    writeln!(out, "Gain targets: {}", report.targets.gain_targets.join(", "))?;
    writeln!(out, "Lose names: {}", report.targets.lose_names.join(", "))?;
    Ok(())
}

pub fn write_odds(out: &mut dyn Write, format: ReportFormat, report: &OddsReport) -> Result<()> {
    if format == ReportFormat::Json {
        return write_json(out, report);
    }
    heading(out, "📊 Current Odds")?;
    writeln!(
        out,
        "Visits: {} (boost x{:.2})",
        report.visits, report.multiplier
    )?;
    for row in &report.rows {
        writeln!(
            out,
            "  {:<10} {:>5} in stock  {:>6.2}%",
            row.prize, row.stock, row.probability
        )?;
    }
    let status = if report.can_draw {
        report.eligibility.green()
    } else {
        report.eligibility.yellow()
    };
    writeln!(out, "{status}")?;
    Ok(())
}

pub fn write_draw(out: &mut dyn Write, format: ReportFormat, report: &DrawReport) -> Result<()> {
    if format == ReportFormat::Json {
        return write_json(out, report);
    }
    let prize = if report.winning {
        format!("🎉 {}", report.prize).bright_yellow().bold()
    } else {
        report.prize.normal()
    };
    writeln!(out, "Result: {prize}")?;
    writeln!(
        out,
        "Visits: {}  Seed: {}  Remaining stock: {}",
        report.visits, report.seed, report.total_stock
    )?;
    Ok(())
}

pub fn write_eligibility(
    out: &mut dyn Write,
    format: ReportFormat,
    visits: u32,
    eligibility: Eligibility,
) -> Result<()> {
    if format == ReportFormat::Json {
        return write_json(
            out,
            &serde_json::json!({
                "visits": visits,
                "canDraw": eligibility.is_eligible(),
                "eligibility": eligibility.to_string(),
            }),
        );
    }
    writeln!(out, "Visits since last prize: {}", visits.to_string().bold())?;
    writeln!(out, "{eligibility}")?;
    Ok(())
}

pub fn write_simulation(
    out: &mut dyn Write,
    format: ReportFormat,
    report: &SimulationReport,
) -> Result<()> {
    if format == ReportFormat::Json {
        return write_json(out, report);
    }
    heading(out, "🎲 Draw Simulation")?;
    writeln!(
        out,
        "Draws: {}  Visits: {}  Boost: x{:.2}  Seed: {}",
        report.draws, report.visits, report.multiplier, report.seed
    )?;
    for row in &report.rows {
        writeln!(
            out,
            "  {:<10} expected {:>6.2}%  observed {:>6.2}%  ({} hits)",
            row.prize, row.expected, row.observed, row.hits
        )?;
    }
    let drift = format!("{:.2}", report.max_drift());
    writeln!(out, "Max drift: {} pp", drift.yellow())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prize_draw_core::{SessionOptions, SessionStores};

    fn session() -> DrawSession {
        DrawSession::open(SessionOptions::default(), SessionStores::in_memory())
    }

    fn render(write: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn status_json_has_camel_case_fields() {
        let session = session();
        let report = StatusReport::from_session(&session);
        let text = render(|out| write_status(out, ReportFormat::Json, &report));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["totalStock"], 550);
        assert_eq!(value["params"]["N"], 3);
        assert_eq!(value["targets"]["loseNames"][0], "はずれ");
        assert_eq!(value["inventory"]["大当たり"], 3);
    }

    #[test]
    fn status_console_lists_every_prize() {
        let session = session();
        let report = StatusReport::from_session(&session);
        let text = render(|out| write_status(out, ReportFormat::Console, &report));
        for prize in ["大当たり", "中当たり", "小当たり", "はずれ"] {
            assert!(text.contains(prize), "{prize} missing from {text}");
        }
        assert!(text.contains("550"));
    }

    #[test]
    fn odds_report_carries_eligibility() {
        let session = session();
        let report = OddsReport::from_session(&session, 1);
        assert!(!report.can_draw);
        let text = render(|out| write_odds(out, ReportFormat::Console, &report));
        assert!(text.contains("抽選はできません（あと 2 回）"));
        let json = render(|out| write_odds(out, ReportFormat::Json, &report));
        assert!(json.contains("\"prob\""));
    }

    #[test]
    fn eligibility_json_is_machine_readable() {
        let text = render(|out| {
            write_eligibility(out, ReportFormat::Json, 4, Eligibility::Eligible)
        });
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["visits"], 4);
        assert_eq!(value["canDraw"], true);
    }
}
