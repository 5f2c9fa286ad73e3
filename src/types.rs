use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// Raw tabular input as read from disk: verbatim column labels plus rows of
/// text cells, padded to header width. No invariants beyond rectangularity.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One cleaned incident row. This is the durable in-memory artifact of a
/// load: every aggregate and KPI is a pure function of a slice of these.
///
/// Text fields are never `None`-like: normalization maps missing markers to
/// the empty string so grouping treats "missing" as a visible category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalRecord {
    pub date_of_incident: Option<NaiveDate>,
    /// 0 means unknown/unparseable.
    pub year: i32,
    pub region: String,
    pub municipality: String,
    pub zone: String,
    pub conduct_description: String,
    /// First 40 chars of the description, `...`-suffixed when truncated.
    pub conduct_description_short: String,
    /// Text before the first `.` of the description; offense-type group key.
    pub article_key: String,
    pub case_count: u64,
}

/// Diagnostics from one full ingest→normalize→derive run.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStats {
    pub total_rows: usize,
    pub canonical_rows: usize,
    pub duplicates_removed: usize,
    pub unparsed_dates: usize,
}

/// Overall trend between the earliest and latest known year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "class", content = "pct_change")]
pub enum Trend {
    Growth(f64),
    Decline(f64),
    Stable(f64),
    /// Initial-year sum was zero; the ratio is undefined, so no percentage
    /// is reported.
    ExplosiveGrowth,
    InsufficientData,
}

/// Named summary indicators computed once per load.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSet {
    pub total_cases: u64,
    pub records_analyzed: usize,
    /// (min, max) over known years; `None` when every year is unknown.
    pub year_range: Option<(i32, i32)>,
    pub top_article: Option<String>,
    pub top_region: Option<String>,
    pub trend: Trend,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AggregateRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Cases")]
    #[tabled(rename = "Cases")]
    pub cases: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearArticleRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Article")]
    #[tabled(rename = "Article")]
    pub article: String,
    #[serde(rename = "Cases")]
    #[tabled(rename = "Cases")]
    pub cases: u64,
}
