//! Message-thread cleanup and word-cloud tokenization.
//!
//! Message threads exported from the hosting platform are interleaved with
//! notification boilerplate ("RATED THEIR STAY 5 STARS!", community-center
//! links, "6 min read" teasers). [`clean_thread`] strips those segments so only
//! the guest's own words are displayed or counted.
//!
//! [`tokenize_for_cloud`] and [`rank_words`] turn free text into the ranked
//! `(word, count)` list a word-cloud layout consumes.

use indexmap::IndexMap;
use regex::RegexSet;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default number of words kept for the word cloud.
pub const DEFAULT_CLOUD_LIMIT: usize = 50;

const MIN_CLOUD_FONT: usize = 10;
const MAX_CLOUD_FONT: usize = 60;

const BOILERPLATE_PATTERNS: [&str; 14] = [
    r"^[A-Z ]+RATED THEIR STAY \d STARS!?$",
    r"to find tips and tricks from hosts around the world",
    r"had great things to say about their stay",
    r"read on for a snapshot",
    r"now that you and your guest have both written reviews",
    r"we've posted them to your airbnb profiles",
    r"keep hosting 5-star stays",
    r"get more 5-star reviews",
    r"add details guests will love",
    r"connect with other hosts",
    r"visit the airbnb community center",
    r"airbnb, inc\.",
    r"10 min read",
    r"6 min read",
];

static BOILERPLATE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(BOILERPLATE_PATTERNS.iter().map(|p| format!("(?i){}", p)))
        .expect("boilerplate patterns are valid")
});

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORD_LIST.iter().copied().collect());

// Generic English stop words followed by hospitality/geography noise words.
const STOP_WORD_LIST: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "that",
    "this", "with", "have", "will", "your", "from", "they", "know", "want", "been", "good",
    "much", "some", "time", "very", "when", "come", "here", "just", "like", "long", "make",
    "many", "over", "such", "take", "than", "them", "well", "were", "what", "word", "said",
    "each", "which", "do", "their", "if", "up", "then", "these", "so", "would", "into", "more",
    "go", "no", "could", "my", "first", "call", "find", "down", "made", "may", "part",
    // domain noise
    "review", "stay", "nice", "clean", "comfortable", "host", "guest", "room", "house",
    "apartment", "place", "location", "area", "neighborhood", "city", "town", "street",
    "address", "check", "in", "checkin", "checkout", "arrival", "departure", "booking",
    "reservation", "airbnb", "bnb", "hosting", "rental", "property", "accommodation", "lodging",
    "hotel", "motel", "inn", "suite", "studio", "loft", "cottage", "cabin", "chalet", "villa",
    "mansion", "castle", "palace", "tower", "building", "structure", "facility",
    "establishment", "venue", "site", "spot", "destination", "attraction", "landmark",
    "monument", "statue", "fountain", "park", "garden", "beach", "mountain", "lake", "river",
    "ocean", "sea", "island", "peninsula", "bay", "cove", "harbor", "port", "marina", "dock",
    "pier", "wharf", "jetty", "breakwater", "seawall", "bulkhead", "revetment", "groyne", "spur",
    "dike", "levee", "dam", "reservoir", "pond", "stream", "creek", "brook", "rivulet",
    "tributary", "estuary", "delta", "mouth", "source", "headwaters", "spring", "aquifer",
    "groundwater", "surface", "water", "liquid", "fluid", "moisture", "humidity", "dampness",
    "wetness", "dryness", "aridity", "desiccation", "dehydration", "hydration", "saturation",
    "soaking", "drenching", "flooding", "overflow", "spill", "leak", "drip", "drop", "trickle",
    "flow", "current", "tide", "wave", "surge", "swell", "breaker", "whitecap", "foam", "spray",
    "mist", "fog", "vapor", "steam", "smoke", "fume", "gas", "air", "wind", "breeze", "gust",
    "draft",
];

/// Strip platform boilerplate from a message thread.
///
/// The thread is split on newlines and on `---` separators; each segment is
/// trimmed, and empty or boilerplate segments are dropped. Survivors are
/// joined with single spaces.
pub fn clean_thread(text: &str) -> String {
    text.split('\n')
        .flat_map(|line| line.split("---"))
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && !is_boilerplate(segment))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a single trimmed segment is a known notification phrase.
pub fn is_boilerplate(segment: &str) -> bool {
    BOILERPLATE.is_match(segment)
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Count words for the word cloud, in first-occurrence order.
///
/// Text is lower-cased, every character other than ASCII letters, digits,
/// `_` and whitespace becomes a space, and tokens of two characters or fewer
/// or on the stop list are discarded.
pub fn tokenize_for_cloud(text: &str) -> IndexMap<String, usize> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let mut counts = IndexMap::new();
    for token in normalized.split_whitespace() {
        if token.len() <= 2 || is_stop_word(token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

/// A ranked word-cloud entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordWeight {
    pub word: String,
    pub count: usize,
}

impl WordWeight {
    /// Font size used when laying the word out: three points per occurrence,
    /// clamped to a readable range.
    pub fn font_size(&self) -> usize {
        (self.count * 3).clamp(MIN_CLOUD_FONT, MAX_CLOUD_FONT)
    }
}

/// Rank counted words by frequency, keeping first-occurrence order for ties.
pub fn rank_words(counts: IndexMap<String, usize>, limit: usize) -> Vec<WordWeight> {
    let mut ranked: Vec<WordWeight> = counts
        .into_iter()
        .map(|(word, count)| WordWeight { word, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
