//! Renders extracted gyms as JSON, CSV or a plain-text table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::models::{Gym, SectionOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Table,
}

/// Flat CSV row, one per package.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    gym: &'a str,
    title: &'a str,
    category: &'a str,
    tags: String,
    currency_symbol: &'a str,
    price: u32,
    validity: &'a str,
}

/// Write to `path`, or stdout when none is given.
pub fn emit(gyms: &[Gym], format: OutputFormat, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            let mut out = BufWriter::new(file);
            render(gyms, format, &mut out)?;
            out.flush()?;
            info!("Wrote {} gyms to {:?}", gyms.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            render(gyms, format, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

pub fn render<W: Write>(gyms: &[Gym], format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Json => render_json(gyms, out),
        OutputFormat::Csv => render_csv(gyms, out),
        OutputFormat::Table => render_table(gyms, out),
    }
}

fn render_json<W: Write>(gyms: &[Gym], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, gyms).context("Failed to serialise gyms")?;
    writeln!(out)?;
    Ok(())
}

fn render_csv<W: Write>(gyms: &[Gym], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for gym in gyms {
        for p in &gym.packages {
            writer.serialize(CsvRow {
                gym: &gym.name,
                title: &p.title,
                category: p.category.as_str(),
                tags: p.tags.iter().map(String::as_str).collect::<Vec<_>>().join("|"),
                currency_symbol: &p.currency_symbol,
                price: p.price,
                validity: p.validity.as_deref().unwrap_or(""),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn render_table<W: Write>(gyms: &[Gym], mut out: W) -> Result<()> {
    for gym in gyms {
        writeln!(
            out,
            "── {} ── {} packages, {} errors",
            gym.name,
            gym.packages.len(),
            gym.error_count()
        )?;
        for p in &gym.packages {
            writeln!(
                out,
                "  {:<13} {:>9}  {}{}",
                p.category.as_str(),
                p.price_tag(),
                p.title,
                p.validity
                    .as_deref()
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default()
            )?;
        }
        for report in &gym.sections {
            if let SectionOutcome::Failed { reason } = &report.outcome {
                writeln!(out, "  ! {}: {}", report.section, reason)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Package, PriceTag, SectionReport};
    use chrono::NaiveDate;

    fn gym() -> Gym {
        let month = Package::new("Month Pass Adult", Category::MonthPass, PriceTag::dollars(1200))
            .unwrap()
            .with_tags(["無限次入場", "包攀石鞋"])
            .with_validity("一個月");
        let day = Package::new("Day Pass Adult", Category::DayPass, PriceTag::dollars(150)).unwrap();
        Gym {
            name: "Just Climb".into(),
            link: None,
            scraped_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            packages: vec![month, day],
            sections: vec![
                SectionReport {
                    section: "month-pass".into(),
                    outcome: SectionOutcome::Extracted {
                        packages: 2,
                        skipped: vec![],
                    },
                },
                SectionReport {
                    section: "membership".into(),
                    outcome: SectionOutcome::Failed {
                        reason: "missing fragment at `div#just-climber`".into(),
                    },
                },
            ],
        }
    }

    fn rendered(format: OutputFormat) -> String {
        let mut buf = Vec::new();
        render(&[gym()], format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_csv_rows() {
        let text = rendered(OutputFormat::Csv);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "gym,title,category,tags,currency_symbol,price,validity"
        );
        assert_eq!(
            lines[1],
            "Just Climb,Month Pass Adult,month-pass,包攀石鞋|無限次入場,$,1200,一個月"
        );
        assert_eq!(lines[2], "Just Climb,Day Pass Adult,day-pass,,$,150,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_round_trips() {
        let text = rendered(OutputFormat::Json);
        let back: Vec<Gym> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec![gym()]);
        assert!(text.contains("\"category\": \"month-pass\""));
        assert!(text.contains("\"status\": \"failed\""));
    }

    #[test]
    fn test_table_lists_failures() {
        let text = rendered(OutputFormat::Table);
        assert!(text.starts_with("── Just Climb ── 2 packages, 1 errors"));
        assert!(text.contains("$1,200  Month Pass Adult (一個月)"));
        assert!(text.contains("! membership: missing fragment"));
    }
}
