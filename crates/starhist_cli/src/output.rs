//! Output rendering for collected star history.
//!
//! Both formats pair each star event with the running total at that
//! moment, which is the shape charting tools want.

use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use starhist::Stargazer;

/// Output format for collected history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `starred_at,total` rows with a header line.
    Csv,
    /// JSON array of `{starred_at, total}` objects.
    Json,
}

#[derive(Serialize)]
struct HistoryPoint {
    starred_at: DateTime<Utc>,
    total: usize,
}

/// Write star history as CSV.
pub fn write_csv(out: &mut impl Write, stars: &[Stargazer]) -> io::Result<()> {
    writeln!(out, "starred_at,total")?;
    for (i, star) in stars.iter().enumerate() {
        writeln!(
            out,
            "{},{}",
            star.starred_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            i + 1
        )?;
    }
    Ok(())
}

/// Write star history as a JSON array.
pub fn write_json(out: &mut impl Write, stars: &[Stargazer]) -> io::Result<()> {
    let points: Vec<HistoryPoint> = stars
        .iter()
        .enumerate()
        .map(|(i, star)| HistoryPoint {
            starred_at: star.starred_at,
            total: i + 1,
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &points).map_err(io::Error::other)?;
    writeln!(out)
}
