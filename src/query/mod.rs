//! Query Parser (spec.md §4.4): free text → `goal_skills` / `goal_job_tokens`
//! / `goal_companies`. Pure and cacheable; the role-root vocabulary is
//! grounded on `original_source/graph-processor-api/rank_my_connections.py`'s
//! `_ROLE_ROOTS` constant.

pub mod levenshtein;

use std::collections::BTreeSet;

/// Fixed role-root vocabulary a job-token must reduce to (or contain, when
/// the token is long enough) to be recognized as a goal job token.
pub const ROLE_ROOTS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "designer",
    "scientist",
    "architect",
    "software",
    "backend",
    "front",
    "frontend",
    "fullstack",
    "full-stack",
    "data",
    "ml",
    "ai",
    "qa",
    "sre",
    "devops",
    "security",
    "mobile",
    "ios",
    "android",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub tokens: Vec<String>,
    pub goal_skills: BTreeSet<String>,
    pub goal_job_tokens: BTreeSet<String>,
    pub goal_companies: BTreeSet<String>,
}

/// Lowercase, strip punctuation except ` / + & -`, collapse whitespace,
/// split into tokens — spec.md §4.4 step 1.
fn tokenize(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '/' || c == '+' || c == '&' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split(|c: char| c == ' ' || c == '/' || c == '+' || c == '&' || c == '-')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Strips a trailing `s` (and `es` after sibilants) — enough to turn
/// `engineers` into `engineer` without pulling in a real stemmer.
fn singularize(token: &str) -> String {
    if let Some(stripped) = token.strip_suffix("ies") {
        return format!("{stripped}y");
    }
    if token.ends_with("ses") || token.ends_with("xes") || token.ends_with("ches") {
        return token[..token.len() - 2].to_string();
    }
    if let Some(stripped) = token.strip_suffix('s') {
        if !stripped.is_empty() {
            return stripped.to_string();
        }
    }
    token.to_string()
}

fn is_goal_job_token(token: &str) -> bool {
    if ROLE_ROOTS.contains(&token) {
        return true;
    }
    token.ends_with("engineer")
}

/// Expands a candidate's job tokens: any token ≥6 chars that contains a
/// known role root as a substring (and isn't exactly that root) gets the
/// root added alongside it — spec.md §4.5's `job(p)` expansion rule.
pub fn expand_job_tokens(tokens: &[String]) -> BTreeSet<String> {
    let mut expanded: BTreeSet<String> = tokens.iter().cloned().collect();
    for token in tokens {
        if token.len() < 6 {
            continue;
        }
        for root in ROLE_ROOTS {
            if token != root && token.contains(root) {
                expanded.insert(root.to_string());
            }
        }
    }
    expanded
}

fn extract_companies(normalized: &str, known_companies: &BTreeSet<String>) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for company in known_companies {
        if company.is_empty() {
            continue;
        }
        if contains_whole_word(normalized, company) {
            found.insert(company.clone());
            continue;
        }
        for prefix in ["at ", "company "] {
            if let Some(rest) = find_phrase_after(normalized, prefix) {
                if rest.starts_with(company.as_str()) {
                    found.insert(company.clone());
                }
            }
        }
    }

    // Raw terms following "at "/"company ", word-count-matched to each known
    // company, so a misspelled company name in the query (no exact hit above)
    // still has a seed to fuzzy-match against below.
    let mut raw_seeds: Vec<String> = Vec::new();
    for prefix in ["at ", "company "] {
        if let Some(rest) = find_phrase_after(normalized, prefix) {
            let rest_words: Vec<&str> = rest.split_whitespace().collect();
            for company in known_companies {
                let word_count = company.split_whitespace().count().max(1);
                if rest_words.len() >= word_count {
                    raw_seeds.push(rest_words[..word_count].join(" "));
                }
            }
        }
    }

    // Fuzzy expansion: for each directly-extracted or raw seed term, pull in
    // any other universe entry that equals/prefixes/is-prefixed-by/is-close-to it.
    let seeds: Vec<String> = found.iter().cloned().chain(raw_seeds).collect();
    for seed in &seeds {
        for candidate in known_companies {
            if found.contains(candidate) {
                continue;
            }
            let max_distance = if candidate.len() <= 8 { 2 } else { 3 };
            if candidate == seed
                || candidate.starts_with(seed.as_str())
                || seed.starts_with(candidate.as_str())
                || levenshtein::distance(candidate, seed) <= max_distance
            {
                found.insert(candidate.clone());
            }
        }
    }

    found
}

fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let words: Vec<&str> = haystack.split_whitespace().collect();
    let needle_words: Vec<&str> = needle.split_whitespace().collect();
    if needle_words.is_empty() {
        return false;
    }
    words.windows(needle_words.len()).any(|w| w == needle_words.as_slice())
}

fn find_phrase_after<'a>(haystack: &'a str, prefix: &str) -> Option<&'a str> {
    haystack.find(prefix).map(|idx| &haystack[idx + prefix.len()..])
}

/// Parses free text against the cached skill/company vocabularies.
pub fn parse(query: &str, all_skills: &BTreeSet<String>, all_companies: &BTreeSet<String>) -> ParsedQuery {
    let tokens = tokenize(query);
    let normalized = tokens.join(" ");

    let goal_skills: BTreeSet<String> = tokens
        .iter()
        .filter(|t| all_skills.contains(t.as_str()))
        .cloned()
        .collect();

    let goal_job_tokens: BTreeSet<String> = tokens
        .iter()
        .map(|t| singularize(t))
        .filter(|t| is_goal_job_token(t))
        .collect();

    let goal_companies = extract_companies(&normalized, all_companies);

    ParsedQuery {
        tokens,
        goal_skills,
        goal_job_tokens,
        goal_companies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills() -> BTreeSet<String> {
        ["rust", "python", "kubernetes"].iter().map(|s| s.to_string()).collect()
    }

    fn companies() -> BTreeSet<String> {
        ["stripe", "google", "acme corp"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_skills_present_in_vocabulary() {
        let parsed = parse("looking for a rust and kubernetes expert", &skills(), &companies());
        assert!(parsed.goal_skills.contains("rust"));
        assert!(parsed.goal_skills.contains("kubernetes"));
        assert!(!parsed.goal_skills.contains("python"));
    }

    #[test]
    fn singularizes_plural_role_roots() {
        let parsed = parse("backend engineers who know rust", &skills(), &companies());
        assert!(parsed.goal_job_tokens.contains("engineer"));
        assert!(parsed.goal_job_tokens.contains("backend"));
    }

    #[test]
    fn matches_company_as_whole_word() {
        let parsed = parse("someone who worked at stripe", &skills(), &companies());
        assert!(parsed.goal_companies.contains("stripe"));
    }

    #[test]
    fn fuzzy_expands_company_matches() {
        let mut universe = companies();
        universe.insert("stryp".to_string());
        let parsed = parse("worked at stripe", &skills(), &universe);
        assert!(parsed.goal_companies.contains("stryp"));
    }

    #[test]
    fn fuzzy_matches_misspelled_company_in_query_against_universe() {
        let parsed = parse("at gogle", &skills(), &companies());
        assert!(parsed.goal_companies.contains("google"));
    }

    #[test]
    fn expand_job_tokens_adds_contained_role_root() {
        let expanded = expand_job_tokens(&["backendengineer".to_string()]);
        assert!(expanded.contains("engineer"));
        assert!(expanded.contains("backendengineer"));
    }
}
