// src/normalize.rs
//
// Pure text heuristics that turn raw upstream fields into canonical Job
// fields. Keyword/regex scanning is best-effort by design: false positives
// and negatives are accepted, documented behavior.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ExperienceLevel;

const SENIOR_KEYWORDS: &[&str] = &[
    "senior", "lead", "principal", "staff", "expert", "architect", "5+ years", "6+ years",
    "7+ years",
];
const ENTRY_KEYWORDS: &[&str] = &[
    "junior",
    "entry-level",
    "intern",
    "trainee",
    "associate",
    "graduate",
    "0-2 years",
    "less than 2 years",
];
const MID_KEYWORDS: &[&str] = &["mid-level", "intermediate", "2-5 years", "3+ years"];

const SPONSORSHIP_KEYWORDS: &[&str] =
    &["sponsorship", "visa", "h1b", "work authorization provided"];

/// Fixed skill taxonomy; extraction preserves this order.
const COMMON_SKILLS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "sql",
    "react",
    "aws",
    "docker",
    "kubernetes",
    "machine learning",
    "data analysis",
];

const US_STATES: &[(&str, &str)] = &[
    ("al", "alabama"),
    ("ak", "alaska"),
    ("az", "arizona"),
    ("ar", "arkansas"),
    ("ca", "california"),
    ("co", "colorado"),
    ("ct", "connecticut"),
    ("de", "delaware"),
    ("fl", "florida"),
    ("ga", "georgia"),
    ("hi", "hawaii"),
    ("id", "idaho"),
    ("il", "illinois"),
    ("in", "indiana"),
    ("ia", "iowa"),
    ("ks", "kansas"),
    ("ky", "kentucky"),
    ("la", "louisiana"),
    ("me", "maine"),
    ("md", "maryland"),
    ("ma", "massachusetts"),
    ("mi", "michigan"),
    ("mn", "minnesota"),
    ("ms", "mississippi"),
    ("mo", "missouri"),
    ("mt", "montana"),
    ("ne", "nebraska"),
    ("nv", "nevada"),
    ("nh", "new hampshire"),
    ("nj", "new jersey"),
    ("nm", "new mexico"),
    ("ny", "new york"),
    ("nc", "north carolina"),
    ("nd", "north dakota"),
    ("oh", "ohio"),
    ("ok", "oklahoma"),
    ("or", "oregon"),
    ("pa", "pennsylvania"),
    ("ri", "rhode island"),
    ("sc", "south carolina"),
    ("sd", "south dakota"),
    ("tn", "tennessee"),
    ("tx", "texas"),
    ("ut", "utah"),
    ("vt", "vermont"),
    ("va", "virginia"),
    ("wa", "washington"),
    ("wv", "west virginia"),
    ("wi", "wisconsin"),
    ("wy", "wyoming"),
];

const US_CITIES: &[&str] = &[
    "new york",
    "los angeles",
    "chicago",
    "houston",
    "phoenix",
    "philadelphia",
    "san antonio",
    "san diego",
    "dallas",
    "san jose",
];

const EXCLUDED_COUNTRIES: &[&str] = &["india", "vietnam", "italy"];

lazy_static! {
    static ref YEARS_RE: Regex = Regex::new(r"(\d+)(?:[-+]\d+)?\s*years?").unwrap();
    static ref CITY_STATE_RE: Regex = Regex::new(r"\b[a-zA-Z\s]+,\s*[a-zA-Z]{2}\b").unwrap();
    static ref SALARY_RE: Regex =
        Regex::new(r"(\d+\.?\d*)\s*(k)?\s*(?:-\s*(\d+\.?\d*)\s*(k)?)?").unwrap();
    static ref DESC_SALARY_RE: Regex = Regex::new(
        r"(?i)(?:salary|compensation|pay|earn)?\s*\$?(\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+\.?\d*k)(?:\s*[-–—]\s*\$?(\d{1,3}(?:,\d{3})*(?:\.\d{2})?|\d+\.?\d*k))?(?:\s*(per\s*(?:hour|year)|hourly|annually))?"
    )
    .unwrap();
}

/// Tier keywords first (senior before entry before mid, first match wins),
/// then bucket by the largest "N years" figure, then default to mid.
pub fn infer_experience_level(title: &str, description: &str) -> ExperienceLevel {
    let text = format!("{} {}", title, description).to_lowercase();
    if SENIOR_KEYWORDS.iter().any(|k| text.contains(k)) {
        return ExperienceLevel::Senior;
    }
    if ENTRY_KEYWORDS.iter().any(|k| text.contains(k)) {
        return ExperienceLevel::Entry;
    }
    if MID_KEYWORDS.iter().any(|k| text.contains(k)) {
        return ExperienceLevel::Mid;
    }
    let max_years = YEARS_RE
        .captures_iter(&text)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max();
    match max_years {
        Some(y) if y >= 5 => ExperienceLevel::Senior,
        Some(y) if y >= 2 => ExperienceLevel::Mid,
        Some(_) => ExperienceLevel::Entry,
        None => ExperienceLevel::Mid,
    }
}

pub fn infer_sponsorship(description: &str) -> bool {
    let text = description.to_lowercase();
    SPONSORSHIP_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Substring match against the fixed taxonomy, in taxonomy order.
pub fn extract_skills(description: &str) -> Vec<String> {
    let text = description.to_lowercase();
    COMMON_SKILLS
        .iter()
        .filter(|skill| text.contains(*skill))
        .map(|s| s.to_string())
        .collect()
}

/// Best-effort US-location check: explicit country mention, then state
/// abbreviation/name, then major city, then a "City, XX" shape that is not
/// on the excluded-country list.
pub fn is_us_location(location: &str) -> bool {
    if location.is_empty() {
        return false;
    }
    let loc = location.to_lowercase();
    if loc.contains("united states") || loc.contains("usa") || loc.contains("u.s.") {
        return true;
    }
    // Two-letter abbreviations only count as standalone tokens; a plain
    // substring check would accept "bangalore" via "al".
    let has_state = US_STATES.iter().any(|(abbr, full)| {
        loc.contains(full)
            || loc
                .split(|c: char| !c.is_ascii_alphabetic())
                .any(|tok| tok == *abbr)
    });
    if has_state {
        return true;
    }
    if US_CITIES.iter().any(|city| loc.contains(city)) {
        return true;
    }
    if CITY_STATE_RE.is_match(&loc) && !EXCLUDED_COUNTRIES.iter().any(|c| loc.contains(c)) {
        return true;
    }
    tracing::debug!(location, "location rejected as non-US");
    false
}

/// Parse "$50,000 - $60,000", "50k", "$25/hour" into an annualized figure.
/// Hourly figures are annualized at 40 h/week over 52 weeks. A range yields
/// the midpoint. 0.0 when nothing numeric is present.
pub fn parse_salary(salary_str: &str) -> f64 {
    if salary_str.is_empty() || salary_str.to_lowercase().contains("not listed") {
        return 0.0;
    }
    let cleaned = salary_str
        .replace('$', "")
        .replace(',', "")
        .to_lowercase()
        .trim()
        .to_string();
    let hourly = cleaned.contains("per hour") || cleaned.contains("hourly") || cleaned.contains("/hour");
    let caps = match SALARY_RE.captures(&cleaned) {
        Some(c) => c,
        None => return 0.0,
    };
    let mut low: f64 = match caps[1].parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    if caps.get(2).is_some() {
        low *= 1000.0;
    }
    if hourly {
        low *= 40.0 * 52.0;
    }
    if let Some(high_m) = caps.get(3) {
        let mut high: f64 = high_m.as_str().parse().unwrap_or(low);
        if caps.get(4).is_some() {
            high *= 1000.0;
        }
        if hourly {
            high *= 40.0 * 52.0;
        }
        return (low + high) / 2.0;
    }
    low
}

/// Pull a salary-shaped substring out of free text, for sources without a
/// structured salary field. Returns an empty string when nothing matches.
///
/// Deliberately narrow on the leading figure: it must be comma-grouped
/// ("90,000") or carry a "k" suffix ("90k"). A bare "$90000" is skipped,
/// since a loose `\d+` would also truncate it to "900".
pub fn extract_salary_from_description(description: &str) -> String {
    if description.is_empty() {
        return String::new();
    }
    let caps = match DESC_SALARY_RE.captures(description) {
        Some(c) => c,
        None => return String::new(),
    };
    let low = &caps[1];
    let high = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let period = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let mut out = low.to_string();
    if !high.is_empty() {
        out.push_str(" - ");
        out.push_str(high);
    }
    if !period.is_empty() {
        out.push(' ');
        out.push_str(period);
    }
    out.trim().to_string()
}
