//! Title Canonicalizer (spec.md §4.1).
//!
//! Maps a raw job title to `(canon_category, short_form, snake_form,
//! tokens)`. Deterministic, no external calls: same input always produces
//! the same output (spec.md §8's canonicalizer-determinism invariant).
//!
//! Rule-cascade order is grounded in
//! `original_source/scripts/assign_job_titles.py`'s `categorize_raw`.

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canon {
    pub category: String,
    pub short: String,
    pub snake: String,
    pub tokens: Vec<String>,
}

/// Lowercase, replace `/`, `-`, `+`, `&`, and whitespace with a single
/// separator, split, drop empties — spec.md §4.1's token rule.
pub fn tokenize_title(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| c == '/' || c == '-' || c == '+' || c == '&' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn contains_any(base: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| base.contains(n))
}

/// The rule cascade. Category names are rendered in the `Founder/Ceo` /
/// `SoftwareEngineer` style spec.md's examples use: each `/`-segment of a
/// multi-part category is title-cased independently, the slash kept.
fn categorize(base: &str) -> String {
    let base = base.trim();
    if base.is_empty() {
        return "Other".to_string();
    }
    if base == "student" || base == "unemployed" {
        return base.to_string();
    }

    let cat: &str = if contains_any(base, &["co-founder", "cofounder", "founder", "ceo", "chief executive officer"]) {
        "founder/ceo"
    } else if contains_any(
        base,
        &[
            "chief technology officer",
            "cto",
            "chief operating officer",
            "svp",
            "vice president",
        ],
    ) {
        "executive"
    } else if contains_any(
        base,
        &[
            "recruit",
            "talent acquisition",
            "technical recruiter",
            "recruiter",
            "hrbp",
            "human resources",
            "hr ",
            " hr",
            "people",
        ],
    ) {
        "recruiting/hr"
    } else if base.contains("product") {
        "product"
    } else if base.contains("design") && !base.contains("product") {
        "design"
    } else if contains_any(
        base,
        &[
            "ml ",
            " ml",
            "machine learning",
            "ai/",
            "ai ",
            " ai",
            "artificial intelligence",
            "applied scientist",
            "research scientist",
            "data and applied scientist",
        ],
    ) {
        if base.contains("data scientist") {
            if contains_any(base, &["ml", "machine learning", "ai"]) {
                "ml engineer"
            } else {
                "data scientist"
            }
        } else if contains_any(base, &["intern", "trainee", "co-op", "co op"]) {
            "intern"
        } else {
            "ml engineer"
        }
    } else if base.contains("data scientist") {
        "data scientist"
    } else if contains_any(base, &["data engineer", "big data engineer", "cloud data engineer"]) {
        "data engineer"
    } else if base.contains("analyst") {
        "analyst"
    } else if contains_any(base, &["devops", "site reliability engineer", "sre", "system engineer - devops"]) {
        "devops/sre"
    } else if contains_any(
        base,
        &[
            "software engineer",
            "sde",
            "developer",
            "programmer",
            "member of technical staff",
            "mots",
            "mts",
            ".net developer",
            "full stack",
            "frontend",
            "backend",
            "react developer",
            "zoho developer",
            "solutions engineer",
            "software qa engineer",
            "software quality engineer",
            "software project developer",
            "software development engineer",
            "software engineering manager",
            "software engineering specialist",
        ],
    ) {
        "software engineer"
    } else if contains_any(base, &["cloud engineer", "cloud support engineer", "azure cloud engineer"]) {
        "cloud engineer"
    } else if base.contains("security") {
        "security"
    } else if contains_any(base, &["solutions architect", "architect"]) {
        "architect"
    } else if contains_any(base, &["quality", "qa "]) {
        "qa"
    } else if contains_any(base, &["consultant", "advisor"]) {
        "consultant/advisor"
    } else if contains_any(
        base,
        &[
            "manager",
            "program manager",
            "project manager",
            "operations manager",
            "lead ",
            "lead,",
            "lead-",
            "lead/",
        ],
    ) {
        "management"
    } else if contains_any(
        base,
        &["marketing", "sales", "business development", "account executive", "public relations"],
    ) {
        "sales/marketing"
    } else if contains_any(
        base,
        &[
            "professor",
            "lecturer",
            "teaching assistant",
            "graduate",
            "adjunct",
            "visiting graduate student",
            "student research",
            "faculty",
        ],
    ) {
        "academic"
    } else if base.contains("research") {
        "research"
    } else if base.contains("engineer") {
        "engineer"
    } else if contains_any(base, &["intern", "trainee", "co-op", "co op"]) {
        "intern"
    } else if contains_any(base, &["customer", "support", "assistant"]) {
        "support"
    } else if base.contains("network") {
        "network engineer"
    } else if base.contains("supply chain") {
        "supply chain"
    } else if contains_any(base, &["quantitative", "investment banking", "finance", "financial"]) {
        "finance/quant"
    } else if base.contains("human resources") || base == "hr" {
        "recruiting/hr"
    } else if contains_any(base, &["writer", "content creator", "writing"]) {
        "content/writing"
    } else if contains_any(base, &["operations", "admin", "administrator"]) {
        "operations"
    } else {
        "other"
    };

    if cat == "student" || cat == "unemployed" {
        return cat.to_string();
    }
    cat.split('/')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join("/")
}

fn title_case_word(word: &str) -> String {
    word.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

fn snake_case(category: &str) -> String {
    category
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Canonicalize a raw job title. `title_lookup` is the precomputed
/// exact-match table built from the ingestion dataset (spec.md §4.1's "if
/// the exact lowercased title is present in a precomputed lookup, return
/// its stored canonical category").
pub fn canonicalize(title: &str, title_lookup: &std::collections::HashMap<String, String>) -> Canon {
    let lower = title.to_lowercase().trim().to_string();
    let category = if let Some(known) = title_lookup.get(&lower) {
        known.clone()
    } else {
        categorize(&lower)
    };

    let words: Vec<String> = category
        .replace('/', " ")
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let short = if words.len() >= 2 {
        words[..2].join(" ")
    } else {
        words.first().cloned().unwrap_or_else(|| category.to_lowercase())
    };

    Canon {
        snake: snake_case(&category),
        short,
        tokens: tokenize_title(&category),
        category,
    }
}

/// Derives a canonical classification for a person with no raw job title,
/// composing the student/unemployed rule spec.md §4.1 describes: `student`
/// when `school_range` indicates an active end date (via `school_active`),
/// else `unemployed`. When `raw` is present and non-empty, falls through to
/// the ordinary `canonicalize` rule cascade.
pub fn derive_job_title(
    raw: Option<&str>,
    school_range: &str,
    today: NaiveDate,
    title_lookup: &std::collections::HashMap<String, String>,
) -> Canon {
    match raw.map(str::trim) {
        Some(title) if !title.is_empty() => canonicalize(title, title_lookup),
        _ => {
            let category = if school_active(school_range, today) { "student" } else { "unemployed" };
            Canon {
                snake: category.to_string(),
                short: category.to_string(),
                tokens: vec![category.to_string()],
                category: category.to_string(),
            }
        }
    }
}

/// Parses a school date-range string (`"YYYY-MM - YYYY-MM"`, `"YYYY"`, or an
/// open-ended `"present"`/`"current"`/`"now"` end) and decides whether it
/// still indicates active enrollment as of `today`.
pub fn school_active(range: &str, today: NaiveDate) -> bool {
    if range.trim().is_empty() {
        return false;
    }
    let normalized = range.replace('\u{2013}', "-").replace('\u{2014}', "-");
    let mut parts = normalized.splitn(2, '-').map(|p| p.trim());
    let _start = parts.next();
    let end = match parts.next() {
        Some(e) => e,
        None => return false,
    };
    let end_lower = end.to_lowercase();
    if end_lower.is_empty() || matches!(end_lower.as_str(), "present" | "current" | "now") {
        return true;
    }
    match parse_date_piece(&end_lower) {
        Some(end_date) => end_date >= today.with_day(1).unwrap_or(today),
        None => false,
    }
}

fn parse_date_piece(piece: &str) -> Option<NaiveDate> {
    if piece.len() == 7 && piece.as_bytes()[4] == b'-' {
        let year: i32 = piece[0..4].parse().ok()?;
        let month: u32 = piece[5..7].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    if piece.len() == 4 {
        let year: i32 = piece.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn canonicalizer_is_deterministic() {
        let lookup = HashMap::new();
        let a = canonicalize("Senior Software Engineer", &lookup);
        let b = canonicalize("Senior Software Engineer", &lookup);
        assert_eq!(a, b);
    }

    #[test]
    fn software_engineer_variants_collapse_to_same_category() {
        let lookup = HashMap::new();
        assert_eq!(categorize("software engineer"), "SoftwareEngineer");
        assert_eq!(categorize("full stack developer"), "SoftwareEngineer");
        let _ = lookup;
    }

    #[test]
    fn founder_variants_become_slash_category() {
        assert_eq!(categorize("co-founder & ceo"), "Founder/Ceo");
    }

    #[test]
    fn unknown_title_falls_back_to_other() {
        assert_eq!(categorize("dog walker"), "Other");
    }

    #[test]
    fn tokenize_splits_on_separators_and_drops_empties() {
        let tokens = tokenize_title("Full-Stack/Backend + Data  Engineer");
        assert_eq!(
            tokens,
            vec!["full", "stack", "backend", "data", "engineer"]
        );
    }

    #[test]
    fn school_active_treats_present_as_active() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        assert!(school_active("2022 - present", today));
        assert!(!school_active("2018 - 2020", today));
        assert!(school_active("2022 - 2027", today));
    }

    #[test]
    fn derive_job_title_classifies_missing_title_by_school_activity() {
        let lookup = HashMap::new();
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();

        let student = derive_job_title(None, "2022 - present", today, &lookup);
        assert_eq!(student.category, "student");

        let unemployed = derive_job_title(Some(""), "2018 - 2020", today, &lookup);
        assert_eq!(unemployed.category, "unemployed");
    }

    #[test]
    fn derive_job_title_falls_through_to_canonicalize_when_raw_present() {
        let lookup = HashMap::new();
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let canon = derive_job_title(Some("Software Engineer"), "2022 - present", today, &lookup);
        assert_eq!(canon.category, "SoftwareEngineer");
    }

    #[test]
    fn exact_lookup_overrides_rule_cascade() {
        let mut lookup = HashMap::new();
        lookup.insert("chief bagel officer".to_string(), "Founder/Ceo".to_string());
        let canon = canonicalize("Chief Bagel Officer", &lookup);
        assert_eq!(canon.category, "Founder/Ceo");
    }
}
