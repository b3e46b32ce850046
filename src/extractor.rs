//! Chat-to-form autofill.
//!
//! Turns one chat exchange (the rep's raw message plus the backend's reply)
//! into a `RecordPatch` using keyword and regex rules. The rules run in a
//! fixed order over the same normalized input and each one either writes its
//! field into the patch or leaves it out. Nothing here fails: a message that
//! matches nothing still yields a patch carrying `ai_description`.
//!
//! Known quirks kept on purpose:
//! - materials/samples replace the whole list whenever any keyword hits,
//!   they never append to what the record already holds;
//! - attendees run from "with" to the next period, so a trailing clause
//!   ("with Dr Lee to discuss pricing") is captured along with the name.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{InteractionRecord, InteractionType, RecordPatch, Sentiment};

/// "Dr Smith" / "dr. smith" anywhere in the raw message
static HCP_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:dr)\.?\s+([A-Za-z]+)").expect("valid HCP name pattern"));

static ATTENDEES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)with\s+([^.]+)").expect("valid attendees pattern"));

/// Tried in order, first match wins
static TOPIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)discuss(?:ed)?\s+(.+?)(?:\.|,|$)",
        r"(?i)talk(?:ed)?\s+about\s+(.+?)(?:\.|,|$)",
        r"(?i)about\s+(.+?)(?:\.|,|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid topic pattern"))
    .collect()
});

/// A set of keywords that maps to one value when any of them occurs
pub struct KeywordGroup<T> {
    pub keywords: &'static [&'static str],
    pub value: T,
}

impl<T> KeywordGroup<T> {
    fn hits(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

pub const INTERACTION_TYPE_GROUPS: &[KeywordGroup<InteractionType>] = &[
    KeywordGroup { keywords: &["met", "meeting"], value: InteractionType::Meeting },
    KeywordGroup { keywords: &["call", "phone"], value: InteractionType::Call },
    KeywordGroup { keywords: &["visit", "visited"], value: InteractionType::Visit },
    KeywordGroup { keywords: &["email"], value: InteractionType::Email },
];

pub const MATERIAL_GROUPS: &[KeywordGroup<&str>] = &[
    KeywordGroup { keywords: &["brochure"], value: "Product Brochure" },
    KeywordGroup { keywords: &["pdf"], value: "PDF Document" },
    KeywordGroup { keywords: &["oncoboost"], value: "OncoBoost Phase III PDF" },
    KeywordGroup { keywords: &["study", "research"], value: "Clinical Study Data" },
    KeywordGroup { keywords: &["presentation"], value: "Product Presentation" },
];

pub const SAMPLE_GROUPS: &[KeywordGroup<&str>] = &[
    KeywordGroup { keywords: &["sample"], value: "Product Sample" },
    KeywordGroup { keywords: &["trial pack"], value: "Trial Pack" },
];

pub const SENTIMENT_GROUPS: &[KeywordGroup<Sentiment>] = &[
    KeywordGroup {
        keywords: &["positive", "good", "great", "excellent", "interested", "happy"],
        value: Sentiment::Positive,
    },
    KeywordGroup {
        keywords: &["negative", "bad", "poor", "disappointed", "unhappy"],
        value: Sentiment::Negative,
    },
    KeywordGroup {
        keywords: &["neutral", "okay", "fine"],
        value: Sentiment::Neutral,
    },
];

pub const OUTCOME_GROUPS: &[KeywordGroup<&str>] = &[
    KeywordGroup {
        keywords: &[
            "agreed",
            "interested",
            "positive response",
            "showed interest",
            "very interested",
            "keen",
            "excited",
            "enthusiastic",
            "impressed",
        ],
        value: "Positive engagement and interest shown",
    },
    KeywordGroup {
        keywords: &["declined", "not interested", "rejected", "refused", "hesitant", "skeptical"],
        value: "Declined or showed limited interest",
    },
    KeywordGroup {
        keywords: &["will consider", "thinking", "review", "discuss internally", "need time"],
        value: "Will consider and get back",
    },
    KeywordGroup {
        keywords: &["trial", "pilot", "test"],
        value: "Agreed to trial or pilot program",
    },
    KeywordGroup {
        keywords: &["questions", "concerns", "clarification"],
        value: "Had questions and concerns addressed",
    },
    KeywordGroup {
        keywords: &["meeting", "discussion", "conversation"],
        value: "Productive discussion held",
    },
];

pub const FOLLOW_UP_MEETING: &str = "Schedule follow-up meeting in 2 weeks";
pub const FOLLOW_UP_SEND_PDF: &str = "Send OncoBoost Phase III PDF";
pub const FOLLOW_UP_ADVISORY_BOARD: &str = "Add Dr. to advisory board invite list";

/// Normalized view of one exchange shared by every rule
pub struct ExchangeText<'a> {
    /// Raw user message, original casing
    pub user: &'a str,
    pub user_lower: String,
    pub response_lower: String,
}

impl<'a> ExchangeText<'a> {
    pub fn new(user: &'a str, response: &str) -> Self {
        Self {
            user,
            user_lower: user.to_lowercase(),
            response_lower: response.to_lowercase(),
        }
    }
}

type RuleFn = fn(&ExchangeText<'_>, &InteractionRecord, &DateTime<FixedOffset>, &mut RecordPatch);

/// A named extraction step. Rules are independent; each writes at most the
/// fields it owns.
pub struct Rule {
    pub name: &'static str,
    apply: RuleFn,
}

impl Rule {
    pub fn run(
        &self,
        text: &ExchangeText<'_>,
        record: &InteractionRecord,
        now: &DateTime<FixedOffset>,
        patch: &mut RecordPatch,
    ) {
        (self.apply)(text, record, now, patch)
    }
}

/// Evaluation order of the autofill rules
pub const RULES: &[Rule] = &[
    Rule { name: "date_time", apply: rule_date_time },
    Rule { name: "hcp_name", apply: rule_hcp_name },
    Rule { name: "interaction_type", apply: rule_interaction_type },
    Rule { name: "attendees", apply: rule_attendees },
    Rule { name: "topics_discussed", apply: rule_topics },
    Rule { name: "materials_shared", apply: rule_materials },
    Rule { name: "samples_distributed", apply: rule_samples },
    Rule { name: "hcp_sentiment", apply: rule_sentiment },
    Rule { name: "outcomes", apply: rule_outcomes },
    Rule { name: "follow_up_actions", apply: rule_follow_up },
    Rule { name: "ai_description", apply: rule_ai_description },
];

/// Derive the autofill patch for one exchange.
///
/// `record` is the snapshot the patch will be merged into; only `date` is
/// read from it. `now` is the processing instant in the caller's local offset.
pub fn extract_patch(
    record: &InteractionRecord,
    user_text: &str,
    response_text: &str,
    now: DateTime<FixedOffset>,
) -> RecordPatch {
    let text = ExchangeText::new(user_text, response_text);
    let mut patch = RecordPatch::default();
    for rule in RULES {
        rule.run(&text, record, &now, &mut patch);
    }
    patch
}

/// First group with any keyword present in `text`
pub fn first_match<T: Copy>(groups: &[KeywordGroup<T>], text: &str) -> Option<T> {
    groups.iter().find(|g| g.hits(text)).map(|g| g.value)
}

/// Values of every group that hits, in table order
pub fn all_matches(groups: &[KeywordGroup<&str>], text: &str) -> Vec<String> {
    groups
        .iter()
        .filter(|g| g.hits(text))
        .map(|g| g.value.to_string())
        .collect()
}

/// "Dr. <word>" from the first doctor mention, casing as typed
pub fn extract_hcp_name(raw: &str) -> Option<String> {
    HCP_NAME_PATTERN
        .captures(raw)
        .map(|caps| format!("Dr. {}", &caps[1]))
}

pub fn extract_attendees(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    if !lower.contains("with") || lower.contains("discussed with") {
        return None;
    }
    ATTENDEES_PATTERN
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
}

pub fn extract_topics(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    if !(lower.contains("discuss") || lower.contains("talk") || lower.contains("about")) {
        return None;
    }
    TOPIC_PATTERNS
        .iter()
        .find_map(|p| p.captures(raw))
        .map(|caps| caps[1].trim().to_string())
}

pub fn classify_follow_up(text: &ExchangeText<'_>) -> Option<&'static str> {
    let response = text.response_lower.as_str();
    if response.contains("follow-up")
        || response.contains("meeting")
        || text.user_lower.contains("schedule")
    {
        Some(FOLLOW_UP_MEETING)
    } else if response.contains("send") && response.contains("pdf") {
        Some(FOLLOW_UP_SEND_PDF)
    } else if response.contains("advisory board") {
        Some(FOLLOW_UP_ADVISORY_BOARD)
    } else {
        None
    }
}

fn rule_date_time(
    _text: &ExchangeText<'_>,
    record: &InteractionRecord,
    now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if record.date.is_empty() {
        patch.date = Some(now.naive_utc().date().format("%Y-%m-%d").to_string());
        patch.time = Some(now.format("%H:%M").to_string());
    }
}

fn rule_hcp_name(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(name) = extract_hcp_name(text.user) {
        patch.hcp_name = Some(name);
    }
}

fn rule_interaction_type(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(kind) = first_match(INTERACTION_TYPE_GROUPS, &text.user_lower) {
        patch.interaction_type = Some(kind);
    }
}

fn rule_attendees(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(attendees) = extract_attendees(text.user) {
        patch.attendees = Some(attendees);
    }
}

fn rule_topics(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(topics) = extract_topics(text.user) {
        patch.topics_discussed = Some(topics);
    }
}

fn rule_materials(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    let materials = all_matches(MATERIAL_GROUPS, &text.user_lower);
    if !materials.is_empty() {
        patch.materials_shared = Some(materials);
    }
}

fn rule_samples(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    let samples = all_matches(SAMPLE_GROUPS, &text.user_lower);
    if !samples.is_empty() {
        patch.samples_distributed = Some(samples);
    }
}

fn rule_sentiment(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(sentiment) = first_match(SENTIMENT_GROUPS, &text.user_lower) {
        patch.hcp_sentiment = Some(sentiment);
    }
}

fn rule_outcomes(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(outcome) = first_match(OUTCOME_GROUPS, &text.user_lower) {
        patch.outcomes = Some(outcome.to_string());
    }
}

fn rule_follow_up(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    if let Some(action) = classify_follow_up(text) {
        patch.follow_up_actions = Some(action.to_string());
    }
}

fn rule_ai_description(
    text: &ExchangeText<'_>,
    _record: &InteractionRecord,
    _now: &DateTime<FixedOffset>,
    patch: &mut RecordPatch,
) {
    patch.ai_description = Some(text.user.to_string());
}
