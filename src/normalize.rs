// Text normalization: mojibake repair, accent stripping, and the per-field
// cleaning policy applied to every cell before derivation.
//
// The source CSVs arrive with mixed encodings and previously-corrupted
// accented characters baked into the data, so repair runs on the decoded
// text regardless of which encoding won during ingest.
use once_cell::sync::Lazy;

/// Known mis-encoded sequence → correct character substitutions.
///
/// Covers UTF-8 byte pairs that were decoded as Latin-1 somewhere upstream
/// (the classic `Ã¡` family) plus stray artifacts the dataset revisions
/// carry. Patterns are scanned longest-first: a corrupted multi-character
/// sequence must win over any shorter pattern that happens to be its prefix
/// or suffix, otherwise a partial replacement leaves residual garbage.
const REPAIRS: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã¼", "ü"),
    ("Ã±", "ñ"),
    ("Ã\u{81}", "Á"),
    ("Ã‰", "É"),
    ("Ã\u{8d}", "Í"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
    ("Ã‘", "Ñ"),
    // Stray artifacts: non-breaking-space prefix bytes, lone smart quote
    // (the original exports carry it inside date strings), replacement char.
    ("Â", ""),
    ("’", ""),
    ("\u{fffd}", ""),
];

/// `REPAIRS` sorted by pattern length descending, so a left-to-right scan
/// is longest-match-first by construction.
static ORDERED_REPAIRS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut v: Vec<_> = REPAIRS.to_vec();
    v.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    v
});

/// Single-pass transliteration over the substitution table.
///
/// At each position the longest matching pattern is consumed; unmatched
/// characters pass through. Idempotent: no replacement text re-introduces a
/// pattern.
pub fn repair_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    'outer: while !rest.is_empty() {
        for (pat, rep) in ORDERED_REPAIRS.iter() {
            if rest.starts_with(pat) {
                out.push_str(rep);
                rest = &rest[pat.len()..];
                continue 'outer;
            }
        }
        let c = rest.chars().next().unwrap();
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Map accented Spanish letters to their ASCII base letter.
pub fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Per-field cleaning policy. Field-specific exceptions (identifier fields
/// keep their spaces, category fields may not) are data here, not scattered
/// conditionals, so schema variants can swap policies without code changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub uppercase: bool,
    pub strip_accents: bool,
    /// Drop characters that are neither letters nor spaces.
    pub letters_only: bool,
    pub spaces_to_underscores: bool,
}

impl FieldPolicy {
    /// Region/municipality names: uppercase, ASCII letters and spaces only.
    pub fn identifier() -> Self {
        FieldPolicy {
            uppercase: true,
            strip_accents: true,
            letters_only: true,
            spaces_to_underscores: false,
        }
    }

    /// Free-text and category fields: cleaned and case-folded, punctuation
    /// kept (the article split needs the `.`).
    pub fn category() -> Self {
        FieldPolicy {
            uppercase: true,
            strip_accents: true,
            letters_only: false,
            spaces_to_underscores: false,
        }
    }

    /// Date-like fields: repair and whitespace cleanup only; the parser
    /// needs the digits and separators untouched.
    pub fn verbatim() -> Self {
        FieldPolicy {
            uppercase: false,
            strip_accents: false,
            letters_only: false,
            spaces_to_underscores: false,
        }
    }
}

/// Normalize a raw column label: `" fecha  Hecho "` → `"FECHA_HECHO"`.
pub fn normalize_label(raw: &str) -> String {
    let repaired = strip_accents(&repair_text(raw));
    let collapsed = collapse_whitespace(&repaired);
    collapsed.to_uppercase().replace(' ', "_")
}

/// Normalize one cell under a field policy.
///
/// Values that clean down to a missing-value marker (`NAN`, `NONE`, `NULL`
/// or nothing at all) become the canonical empty string, so "missing" is a
/// visible category downstream rather than an error. Never fails; garbage in
/// degrades to the empty string.
pub fn normalize_cell(raw: &str, policy: &FieldPolicy) -> String {
    let mut s = repair_text(raw);
    if policy.strip_accents {
        s = strip_accents(&s);
    }
    if policy.letters_only {
        s.retain(|c| c.is_alphabetic() || c.is_whitespace());
    }
    let mut s = collapse_whitespace(&s);
    if policy.uppercase {
        s = s.to_uppercase();
    }
    if policy.spaces_to_underscores {
        s = s.replace(' ', "_");
    }
    if is_missing_marker(&s) {
        return String::new();
    }
    s
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_missing_marker(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("none")
        || s.eq_ignore_ascii_case("null")
}
