use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx_sqlite::NewOutage;

lazy_static! {
    static ref TABLE_ROW_REGEX: Regex =
        Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr>").expect("TABLE_ROW_REGEX to compile");
    static ref CELL_REGEX: Regex =
        Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("CELL_REGEX to compile");
    static ref CLASS_ATTR_REGEX: Regex =
        Regex::new(r#"(?i)class\s*=\s*"([^"]*)""#).expect("CLASS_ATTR_REGEX to compile");
    static ref TAG_REGEX: Regex = Regex::new(r"(?s)<[^>]*>").expect("TAG_REGEX to compile");
}

/// What became of a single table row. Rows that do not carry at least the
/// four expected cells are skipped, never treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Parsed(ParsedRow),
    Skipped { cells: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub outage: NewOutage,
    /// The date exactly as printed in the source, dotted `DD.MM.YYYY`.
    pub printed_date: String,
}

/// An outage whose address matched one of the configured locations of
/// interest. Carries the date as printed in the source, not the canonical
/// form the store uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutageMatch {
    pub location: String,
    pub address: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Default)]
pub struct OutageTable {
    /// Every row for the target city and municipality, for persistence.
    pub outages: Vec<NewOutage>,
    /// The subset whose address exactly matches a location of interest
    /// (all rows when no locations are configured).
    pub matches: Vec<OutageMatch>,
    pub skipped_rows: usize,
}

pub fn extract_outages(
    html: &str,
    target_city: &str,
    target_municipality: &str,
    target_locations: &[String],
) -> OutageTable {
    let normalized_locations = target_locations
        .iter()
        .map(|location| location.to_lowercase())
        .collect_vec();

    let mut table = OutageTable::default();
    for captures in TABLE_ROW_REGEX.captures_iter(html) {
        if !row_is_for(&captures[1], target_city, target_municipality) {
            continue;
        }

        match parse_row(&captures[2], target_city, target_municipality) {
            RowOutcome::Parsed(row) => {
                let is_of_interest = normalized_locations.is_empty()
                    || normalized_locations
                        .iter()
                        .any(|location| row.outage.address.to_lowercase() == *location);

                if is_of_interest {
                    table.matches.push(OutageMatch {
                        location: row.outage.location.clone(),
                        address: row.outage.address.clone(),
                        date: row.printed_date,
                        start_time: row.outage.start_time.clone(),
                        end_time: row.outage.end_time.clone(),
                    });
                }
                table.outages.push(row.outage);
            }
            RowOutcome::Skipped { .. } => table.skipped_rows += 1,
        }
    }

    table
}

fn row_is_for(attributes: &str, city: &str, municipality: &str) -> bool {
    let is_item_row = CLASS_ATTR_REGEX
        .captures(attributes)
        .map_or(false, |captures| {
            captures[1].split_whitespace().any(|class| class == "item")
        });

    is_item_row
        && attributes.contains(&format!(r#"data-ed="{city}""#))
        && attributes.contains(&format!(r#"data-opcina="{municipality}""#))
}

fn parse_row(row_markup: &str, city: &str, municipality: &str) -> RowOutcome {
    let cells = CELL_REGEX
        .captures_iter(row_markup)
        .map(|captures| cell_text(&captures[1]))
        .collect_vec();

    if cells.len() < 4 {
        return RowOutcome::Skipped { cells: cells.len() };
    }

    let printed_date = cells[2].clone();
    let (start_time, end_time) = split_time_range(&cells[3]);

    RowOutcome::Parsed(ParsedRow {
        outage: NewOutage {
            city: city.to_string(),
            municipality: municipality.to_string(),
            location: cells[0].clone(),
            address: cells[1].clone(),
            date: reverse_dotted_date(&printed_date),
            start_time,
            end_time,
        },
        printed_date,
    })
}

fn cell_text(cell_markup: &str) -> String {
    let text = TAG_REGEX.replace_all(cell_markup, "");
    decode_entities(&text).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// `DD.MM.YYYY` → `YYYY-MM-DD`, by reversing the dot-delimited segments.
fn reverse_dotted_date(date: &str) -> String {
    date.split('.').rev().join("-")
}

/// Splits on the first `-`; a range with no dash keeps the whole text as the
/// start and an empty end.
fn split_time_range(time_range: &str) -> (String, String) {
    match time_range.split_once('-') {
        Some((start, end)) => (start.trim().to_string(), end.trim().to_string()),
        None => (time_range.trim().to_string(), String::new()),
    }
}
