// Field derivation: schema detection over normalized labels, per-row
// cleaning, derived fields (YEAR, CASE_COUNT, ARTICLE_KEY, short
// description) and post-normalization deduplication.
use crate::error::LoadError;
use crate::normalize::{normalize_cell, normalize_label, FieldPolicy};
use crate::types::{CanonicalRecord, LoadStats, RawTable};
use crate::util::{parse_count_safe, parse_date_safe, year_of};
use chrono::Datelike;
use log::{debug, info};
use std::collections::HashSet;

const SHORT_DESCRIPTION_LIMIT: usize = 40;

/// Column positions for the semantic fields, resolved once per table from
/// the normalized labels. The source schema varies across revisions
/// (`FECHA HECHO` vs `FECHA_HECHO`, `DEPARTAMENTO` vs `REGION`), so
/// detection is token-based rather than exact-name.
#[derive(Debug, Clone)]
pub struct Schema {
    pub date: usize,
    pub region: usize,
    pub municipality: usize,
    pub zone: usize,
    pub conduct: usize,
    pub quantity: Option<usize>,
}

impl Schema {
    pub fn detect(raw_labels: &[String]) -> Result<Schema, LoadError> {
        let labels: Vec<String> = raw_labels.iter().map(|l| normalize_label(l)).collect();
        let find = |tokens: &[&str]| -> Option<usize> {
            labels
                .iter()
                .position(|l| tokens.iter().any(|t| l.contains(t)))
        };

        let date = find(&["FECHA", "DATE"]).ok_or(LoadError::MissingColumn("date"))?;
        let region =
            find(&["DEPARTAMENTO", "REGION"]).ok_or(LoadError::MissingColumn("region"))?;
        let municipality =
            find(&["MUNICIP"]).ok_or(LoadError::MissingColumn("municipality"))?;
        let zone = find(&["ZONA", "ZONE"]).ok_or(LoadError::MissingColumn("zone"))?;
        let conduct = find(&["CONDUCTA", "CONDUCT", "DESCRIPCION"])
            .ok_or(LoadError::MissingColumn("conduct description"))?;
        // First column carrying a quantity token, scanning header order.
        let quantity = find(&["CANTIDAD", "QUANTITY"]);

        Ok(Schema {
            date,
            region,
            municipality,
            zone,
            conduct,
            quantity,
        })
    }
}

/// Build the canonical table from a raw one.
///
/// Cell-level failures never abort: an unparseable date yields a null date
/// and YEAR 0, a non-numeric quantity yields 0 and a missing quantity column
/// defaults every row to 1 case. Rows that are identical across all
/// canonical fields after cleaning are collapsed to one, keeping the first
/// occurrence so downstream tie-breaking stays deterministic.
pub fn derive_records(table: &RawTable) -> Result<(Vec<CanonicalRecord>, LoadStats), LoadError> {
    let schema = Schema::detect(&table.columns)?;

    let identifier = FieldPolicy::identifier();
    let category = FieldPolicy::category();
    let verbatim = FieldPolicy::verbatim();

    let mut stats = LoadStats {
        total_rows: table.rows.len(),
        ..LoadStats::default()
    };
    let mut seen: HashSet<CanonicalRecord> = HashSet::new();
    let mut records: Vec<CanonicalRecord> = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        let raw_date = normalize_cell(cell(schema.date), &verbatim);
        let date_of_incident = parse_date_safe(&raw_date);
        let year = match date_of_incident {
            Some(d) => d.year(),
            None => {
                if !raw_date.is_empty() {
                    stats.unparsed_dates += 1;
                }
                year_of(&raw_date)
            }
        };

        let conduct_description = normalize_cell(cell(schema.conduct), &category);
        let article_key = article_key_of(&conduct_description);
        let conduct_description_short = shorten(&conduct_description);

        let case_count = match schema.quantity {
            Some(i) => parse_count_safe(cell(i)).unwrap_or(0),
            None => 1,
        };

        let record = CanonicalRecord {
            date_of_incident,
            year,
            region: normalize_cell(cell(schema.region), &identifier),
            municipality: normalize_cell(cell(schema.municipality), &identifier),
            zone: normalize_cell(cell(schema.zone), &identifier),
            conduct_description,
            conduct_description_short,
            article_key,
            case_count,
        };

        if seen.insert(record.clone()) {
            records.push(record);
        } else {
            debug!("dropped duplicate canonical row");
            stats.duplicates_removed += 1;
        }
    }

    stats.canonical_rows = records.len();
    info!(
        "derived {} canonical rows from {} raw rows ({} duplicates removed)",
        stats.canonical_rows, stats.total_rows, stats.duplicates_removed
    );
    Ok((records, stats))
}

/// Offense-type key: text before the first `.` of the cleaned description.
fn article_key_of(description: &str) -> String {
    description
        .split('.')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// First 40 characters plus an ellipsis when the description runs longer.
fn shorten(description: &str) -> String {
    let chars: Vec<char> = description.chars().collect();
    if chars.len() > SHORT_DESCRIPTION_LIMIT {
        let head: String = chars[..SHORT_DESCRIPTION_LIMIT].iter().collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}
