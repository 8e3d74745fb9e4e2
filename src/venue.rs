use regex::Regex;

pub const DEFAULT_VENUE: &str = "arXiv";

const CONFERENCES: &[&str] = &[
    "icse", "fse", "ase", "issta", "neurips", "iclr", "icml", "cvpr", "iccv", "eccv", "acl",
    "emnlp", "naacl", "sigmod", "vldb", "kdd", "www", "chi", "uist",
];

const JOURNALS: &[&str] = &[
    "ieee transactions on software engineering",
    "acm transactions on software engineering",
    "ieee transactions on pattern analysis and machine intelligence",
    "ieee software",
    "journal of systems and software",
    "empirical software engineering",
    "software testing",
    "nature",
    "science",
];

const ACCEPTANCE_WORDS: &[&str] = &["accepted", "published", "appear", "conference", "journal"];

const ACCEPTANCE_PATTERNS: &[&str] = &[
    r"accepted (?:to|at|by|for)\s+([A-Z][A-Za-z0-9\s]+?)(?:\d{4}|,|\.|$)",
    r"published (?:in|at)\s+([A-Z][A-Za-z0-9\s]+?)(?:\d{4}|,|\.|$)",
    r"appear (?:in|at)\s+([A-Z][A-Za-z0-9\s]+?)(?:\d{4}|,|\.|$)",
];

/// Rule-based publication venue lookup over an arXiv comment string.
#[derive(Debug, Clone)]
pub struct VenueExtractor {
    conferences: Vec<Regex>,
    acceptance: Vec<Regex>,
}

impl Default for VenueExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueExtractor {
    pub fn new() -> Self {
        let conferences = CONFERENCES
            .iter()
            .filter_map(|name| Regex::new(&format!(r"\b{name}\s*\d{{4}}")).ok())
            .collect();
        let acceptance = ACCEPTANCE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();
        Self {
            conferences,
            acceptance,
        }
    }

    pub fn extract(&self, comment: Option<&str>) -> String {
        let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
            return DEFAULT_VENUE.to_owned();
        };
        let lower = comment.to_lowercase();

        for re in &self.conferences {
            if let Some(found) = re.find(&lower) {
                return found.as_str().to_uppercase();
            }
        }

        if let Some(journal) = JOURNALS.iter().find(|j| lower.contains(*j)) {
            return title_case(journal);
        }

        if ACCEPTANCE_WORDS.iter().any(|w| lower.contains(w)) {
            for re in &self.acceptance {
                let Some(venue) = re.captures(comment).and_then(|c| c.get(1)) else {
                    continue;
                };
                let venue = venue.as_str().trim();
                if venue.chars().count() > 3 {
                    return venue.to_owned();
                }
            }
        }

        DEFAULT_VENUE.to_owned()
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
