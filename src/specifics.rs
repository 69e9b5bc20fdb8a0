use regex::Regex;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Per-institution row rewrite applied before role mapping. Every `run` is a
/// pure function of its input row, so adapters may chain several specifics
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecificKind {
    PresidentsChoice,
    Belfius,
    IngBelgium,
    Sns,
}

impl SpecificKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::PresidentsChoice => "presidents_choice",
            Self::Belfius => "belfius",
            Self::IngBelgium => "ing_belgium",
            Self::Sns => "sns",
        }
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresidentsChoice => "President's Choice Financial",
            Self::Belfius => "Belfius",
            Self::IngBelgium => "ING Belgium",
            Self::Sns => "SNS Bank",
        }
    }

    #[allow(dead_code)]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::PresidentsChoice => {
                "Rebuilds the missing signed amount from the unsigned column and frees it up for the description"
            }
            Self::Belfius => "Fills an empty description with the counterparty name",
            Self::IngBelgium => "Trims fields and collapses the padding ING puts inside descriptions",
            Self::Sns => "Strips the single quotes SNS wraps around every field",
        }
    }

    pub fn run(&self, row: Vec<String>) -> Vec<String> {
        match self {
            Self::PresidentsChoice => run_presidents_choice(row),
            Self::Belfius => run_belfius(row),
            Self::IngBelgium => run_ing_belgium(row),
            Self::Sns => run_sns(row),
        }
    }

    /// Kept in lockstep with `run`: a specific that changes row arity must
    /// adjust the header row the same way. None of the current kinds do.
    pub fn run_on_headers(&self, headers: Vec<String>) -> Vec<String> {
        headers
    }
}

pub const ALL_SPECIFICS: &[SpecificKind] = &[
    SpecificKind::PresidentsChoice,
    SpecificKind::Belfius,
    SpecificKind::IngBelgium,
    SpecificKind::Sns,
];

pub fn get_by_key(key: &str) -> Option<SpecificKind> {
    ALL_SPECIFICS.iter().find(|s| s.key() == key).copied()
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// PC Financial exports leave column 3 (the signed amount) blank and put the
/// unsigned amount in column 2. Synthesize the signed amount, then reuse the
/// freed column for the description so role mapping stays positional.
fn run_presidents_choice(mut row: Vec<String>) -> Vec<String> {
    if row.len() > 3 && row[3].is_empty() && !row[2].is_empty() {
        row[3] = flip_sign(&row[2]);
    }
    if row.len() > 2 {
        row[2] = row[1].clone();
    }
    row
}

/// Belfius leaves the description column (14) blank for transfers; the
/// counterparty name in column 5 is the only usable text.
fn run_belfius(mut row: Vec<String>) -> Vec<String> {
    if row.len() > 14 && row[14].trim().is_empty() && !row[5].trim().is_empty() {
        row[14] = row[5].trim().to_string();
    }
    row
}

/// ING pads fixed-width description fragments with runs of spaces.
fn run_ing_belgium(row: Vec<String>) -> Vec<String> {
    let collapse = Regex::new(r"\s{2,}").ok();
    row.into_iter()
        .map(|field| {
            let trimmed = field.trim().to_string();
            match &collapse {
                Some(re) => re.replace_all(&trimmed, " ").into_owned(),
                None => trimmed,
            }
        })
        .collect()
}

/// SNS wraps every field in single quotes.
fn run_sns(row: Vec<String>) -> Vec<String> {
    row.into_iter()
        .map(|field| {
            let trimmed = field.trim();
            trimmed
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .unwrap_or(trimmed)
                .to_string()
        })
        .collect()
}

fn flip_sign(amount: &str) -> String {
    match amount.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{amount}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_get_by_key() {
        assert_eq!(get_by_key("presidents_choice"), Some(SpecificKind::PresidentsChoice));
        assert_eq!(get_by_key("sns"), Some(SpecificKind::Sns));
        assert_eq!(get_by_key("no_such_bank"), None);
    }

    #[test]
    fn test_presidents_choice_synthesizes_signed_amount() {
        let out = SpecificKind::PresidentsChoice.run(row(&["2021-01-01", "desc", "12.34", ""]));
        assert_eq!(out, row(&["2021-01-01", "desc", "desc", "-12.34"]));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_presidents_choice_leaves_filled_amount_alone() {
        let out = SpecificKind::PresidentsChoice.run(row(&["2021-01-01", "desc", "12.34", "56.78"]));
        assert_eq!(out[3], "56.78");
        assert_eq!(out[2], "desc");
    }

    #[test]
    fn test_presidents_choice_flips_negative_companion() {
        let out = SpecificKind::PresidentsChoice.run(row(&["2021-01-01", "desc", "-12.34", ""]));
        assert_eq!(out[3], "12.34");
    }

    #[test]
    fn test_presidents_choice_short_row_is_untouched() {
        let out = SpecificKind::PresidentsChoice.run(row(&["2021-01-01", "desc"]));
        assert_eq!(out, row(&["2021-01-01", "desc"]));
    }

    #[test]
    fn test_belfius_fills_empty_description() {
        let mut fields = vec![String::new(); 16];
        fields[5] = " ACME NV ".to_string();
        let out = SpecificKind::Belfius.run(fields);
        assert_eq!(out[14], "ACME NV");
    }

    #[test]
    fn test_belfius_keeps_existing_description() {
        let mut fields = vec![String::new(); 16];
        fields[5] = "ACME NV".to_string();
        fields[14] = "Rent january".to_string();
        let out = SpecificKind::Belfius.run(fields);
        assert_eq!(out[14], "Rent january");
    }

    #[test]
    fn test_ing_belgium_collapses_padding() {
        let out = SpecificKind::IngBelgium.run(row(&["  2025-01-15 ", "TRANSFER    TO     SAVINGS"]));
        assert_eq!(out, row(&["2025-01-15", "TRANSFER TO SAVINGS"]));
    }

    #[test]
    fn test_sns_strips_single_quotes() {
        let out = SpecificKind::Sns.run(row(&["'2025-01-15'", "'ALBERT HEIJN'", "12.50"]));
        assert_eq!(out, row(&["2025-01-15", "ALBERT HEIJN", "12.50"]));
    }

    #[test]
    fn test_runs_are_pure() {
        let input = row(&["2021-01-01", "desc", "12.34", ""]);
        let first = SpecificKind::PresidentsChoice.run(input.clone());
        let second = SpecificKind::PresidentsChoice.run(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_disjoint_specifics_compose_in_any_order() {
        // sns rewrites quoting, ing collapses whitespace; targets don't overlap
        // on this row, so order must not matter.
        let input = row(&["'2025-01-15'", "PAY    ROLL"]);
        let ab = SpecificKind::IngBelgium.run(SpecificKind::Sns.run(input.clone()));
        let ba = SpecificKind::Sns.run(SpecificKind::IngBelgium.run(input));
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_header_neutral_specifics() {
        let headers = row(&["Date", "Description", "Amount"]);
        for specific in ALL_SPECIFICS {
            assert_eq!(specific.run_on_headers(headers.clone()), headers);
        }
    }

    #[test]
    fn test_every_specific_has_description() {
        for specific in ALL_SPECIFICS {
            assert!(!specific.describe().is_empty());
            assert!(!specific.key().is_empty());
        }
    }
}
