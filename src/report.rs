use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::api_models::{Attack, Member, SideSelector, WarReport};

/// Number of columns in every roster row.
pub const REPORT_COLUMNS: usize = 12;

/// Attacks shown per member; later attacks only count towards the totals.
pub const SHOWN_ATTACKS: usize = 2;

pub const HEADER: [&str; REPORT_COLUMNS] = [
    "Tag",
    "Name",
    "Townhall",
    "Map Pos",
    "Total Stars",
    "Total Destruction",
    "1st Attack",
    "1st Stars",
    "1st Destruction",
    "2nd Attack",
    "2nd Stars",
    "2nd Destruction",
];

const API_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const NOT_AVAILABLE: &str = "N/A";

/// A single spreadsheet cell.
///
/// Serializes untagged, so the Sheets API receives plain JSON strings and
/// numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Decimal(f64),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn optional(value: Option<u32>) -> Self {
        value.map_or_else(Cell::empty, |v| Cell::Integer(i64::from(v)))
    }
}

pub type ReportRow = Vec<Cell>;

/// Rows to write into one destination range, header first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Formats one side of the war as a roster table.
///
/// Totals cover every attack a member made, while only the first
/// [`SHOWN_ATTACKS`] are broken out. Total destruction is the sum of the
/// per-attack percentages, not their average.
pub fn format_side(report: &WarReport, selector: SideSelector) -> ReportTable {
    let side = report.side(selector);
    let mut rows: Vec<ReportRow> = Vec::with_capacity(side.members.len() + 1);
    rows.push(HEADER.iter().map(|h| Cell::text(*h)).collect());

    for member in &side.members {
        rows.push(member_row(member, &report.attacks_by(member)));
    }

    ReportTable { rows }
}

fn member_row(member: &Member, attacks: &[&Attack]) -> ReportRow {
    let total_stars: u32 = attacks.iter().map(|a| a.stars).sum();
    // Folding from +0.0 keeps an empty total from printing as "-0.0".
    let total_destruction = attacks
        .iter()
        .fold(0.0_f64, |acc, a| acc + a.destruction_percentage);

    let mut row = Vec::with_capacity(REPORT_COLUMNS);
    row.extend([
        Cell::text(member.tag.as_str()),
        Cell::text(member.name.as_str()),
        Cell::optional(member.townhall_level),
        Cell::optional(member.map_position),
        Cell::Integer(i64::from(total_stars)),
        Cell::Text(format!("{total_destruction:.1}")),
    ]);

    for slot in 0..SHOWN_ATTACKS {
        match attacks.get(slot) {
            Some(attack) => row.extend([
                Cell::text(attack.defender_tag.as_str()),
                Cell::Integer(i64::from(attack.stars)),
                Cell::Decimal(attack.destruction_percentage),
            ]),
            None => row.extend([Cell::empty(), Cell::empty(), Cell::empty()]),
        }
    }

    debug_assert_eq!(row.len(), REPORT_COLUMNS);
    row
}

/// Formats the war-level summary as a two-column key/value table.
pub fn format_summary(report: &WarReport, now: DateTime<Utc>) -> ReportTable {
    let end = report.end_time.as_deref().and_then(parse_api_time);

    let pair = |key: &str, value: Cell| vec![Cell::text(key), value];
    let text_or_na = |value: Option<&str>| Cell::text(value.unwrap_or(NOT_AVAILABLE));
    let count_or_na = |value: Option<u32>| {
        value.map_or_else(|| Cell::text(NOT_AVAILABLE), |v| Cell::Integer(i64::from(v)))
    };
    let percent_or_na = |value: Option<f64>| {
        Cell::Text(value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}%")))
    };

    let rows = vec![
        pair("War State", text_or_na(report.state.as_deref())),
        pair("Team Size", count_or_na(report.team_size)),
        pair("Start Time", Cell::Text(display_time(report.start_time.as_deref()))),
        pair("End Time", Cell::Text(display_time(report.end_time.as_deref()))),
        pair("Time Left", Cell::Text(time_left(end, now))),
        pair("Our Clan", text_or_na(report.clan.name.as_deref())),
        pair("Opponent", text_or_na(report.opponent.name.as_deref())),
        pair("Our Stars", count_or_na(report.clan.stars)),
        pair("Enemy Stars", count_or_na(report.opponent.stars)),
        pair("Our Destruction", percent_or_na(report.clan.destruction_percentage)),
        pair("Enemy Destruction", percent_or_na(report.opponent.destruction_percentage)),
        pair("Updated At", Cell::Text(now.format(DISPLAY_TIME_FORMAT).to_string())),
    ];

    ReportTable { rows }
}

fn parse_api_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, API_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn display_time(raw: Option<&str>) -> String {
    raw.and_then(parse_api_time)
        .map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn time_left(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(end) = end else {
        return NOT_AVAILABLE.to_string();
    };
    let remaining = (end - now).num_seconds();
    if remaining <= 0 {
        return "ended".to_string();
    }
    format!(
        "{:02}:{:02}:{:02}",
        remaining / 3600,
        (remaining % 3600) / 60,
        remaining % 60
    )
}
