//! Interaction record and chat transcript types.
//!
//! `InteractionRecord` is the canonical HCP interaction log that both the
//! chat autofill and manual form edits write into. Writers never assign the
//! record directly; they build a `RecordPatch` and let `InteractionRecord::apply`
//! merge only the keys the patch carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FieldError;

/// Kind of HCP interaction being logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    #[default]
    Meeting,
    Call,
    Visit,
    Virtual,
    Conference,
    Email,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Meeting => "meeting",
            InteractionType::Call => "call",
            InteractionType::Visit => "visit",
            InteractionType::Virtual => "virtual",
            InteractionType::Conference => "conference",
            InteractionType::Email => "email",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "meeting" => Ok(InteractionType::Meeting),
            "call" => Ok(InteractionType::Call),
            "visit" => Ok(InteractionType::Visit),
            "virtual" => Ok(InteractionType::Virtual),
            "conference" => Ok(InteractionType::Conference),
            "email" => Ok(InteractionType::Email),
            _ => Err(FieldError::InvalidValue {
                field: "interaction_type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// HCP sentiment as observed by the rep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(FieldError::InvalidValue {
                field: "hcp_sentiment".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// The structured HCP interaction log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub hcp_name: String,
    pub interaction_type: InteractionType,
    /// YYYY-MM-DD, empty until the first exchange fills it
    pub date: String,
    /// HH:MM, filled together with `date`
    pub time: String,
    pub attendees: String,
    pub topics_discussed: String,
    pub materials_shared: Vec<String>,
    pub samples_distributed: Vec<String>,
    pub hcp_sentiment: Sentiment,
    pub outcomes: String,
    /// May hold several newline-separated actions
    pub follow_up_actions: String,
    /// Last raw user message, verbatim
    pub ai_description: String,
}

impl InteractionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge a patch. Only keys present in the patch are written.
    /// Returns the fields that were written, in declaration order.
    pub fn apply(&mut self, patch: &RecordPatch) -> Vec<RecordField> {
        if let Some(ref v) = patch.hcp_name {
            self.hcp_name = v.clone();
        }
        if let Some(v) = patch.interaction_type {
            self.interaction_type = v;
        }
        if let Some(ref v) = patch.date {
            self.date = v.clone();
        }
        if let Some(ref v) = patch.time {
            self.time = v.clone();
        }
        if let Some(ref v) = patch.attendees {
            self.attendees = v.clone();
        }
        if let Some(ref v) = patch.topics_discussed {
            self.topics_discussed = v.clone();
        }
        if let Some(ref v) = patch.materials_shared {
            self.materials_shared = v.clone();
        }
        if let Some(ref v) = patch.samples_distributed {
            self.samples_distributed = v.clone();
        }
        if let Some(v) = patch.hcp_sentiment {
            self.hcp_sentiment = v;
        }
        if let Some(ref v) = patch.outcomes {
            self.outcomes = v.clone();
        }
        if let Some(ref v) = patch.follow_up_actions {
            self.follow_up_actions = v.clone();
        }
        if let Some(ref v) = patch.ai_description {
            self.ai_description = v.clone();
        }
        patch.fields()
    }
}

/// Names of the record's fields, as used by form inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    HcpName,
    InteractionType,
    Date,
    Time,
    Attendees,
    TopicsDiscussed,
    MaterialsShared,
    SamplesDistributed,
    HcpSentiment,
    Outcomes,
    FollowUpActions,
    AiDescription,
}

impl RecordField {
    pub const ALL: [RecordField; 12] = [
        RecordField::HcpName,
        RecordField::InteractionType,
        RecordField::Date,
        RecordField::Time,
        RecordField::Attendees,
        RecordField::TopicsDiscussed,
        RecordField::MaterialsShared,
        RecordField::SamplesDistributed,
        RecordField::HcpSentiment,
        RecordField::Outcomes,
        RecordField::FollowUpActions,
        RecordField::AiDescription,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecordField::HcpName => "hcp_name",
            RecordField::InteractionType => "interaction_type",
            RecordField::Date => "date",
            RecordField::Time => "time",
            RecordField::Attendees => "attendees",
            RecordField::TopicsDiscussed => "topics_discussed",
            RecordField::MaterialsShared => "materials_shared",
            RecordField::SamplesDistributed => "samples_distributed",
            RecordField::HcpSentiment => "hcp_sentiment",
            RecordField::Outcomes => "outcomes",
            RecordField::FollowUpActions => "follow_up_actions",
            RecordField::AiDescription => "ai_description",
        }
    }

    /// List-valued fields accept comma-separated text
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            RecordField::MaterialsShared | RecordField::SamplesDistributed
        )
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RecordField::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| FieldError::UnknownField(wanted.to_string()))
    }
}

/// Value supplied by a manual edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

/// Split a comma-joined list as typed into a form input
pub fn split_list_text(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Partial update to an `InteractionRecord`. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<InteractionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_discussed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_shared: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_distributed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcp_sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_actions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
}

impl RecordPatch {
    /// Build a single-field patch from a form edit, validating enum fields
    pub fn for_field(field: RecordField, value: FieldValue) -> Result<Self, FieldError> {
        let mut patch = RecordPatch::default();
        let text = match (field.is_list(), value) {
            (true, value) => {
                let list = match value {
                    FieldValue::List(items) => items,
                    FieldValue::Text(text) => split_list_text(&text),
                };
                if field == RecordField::MaterialsShared {
                    patch.materials_shared = Some(list);
                } else {
                    patch.samples_distributed = Some(list);
                }
                return Ok(patch);
            }
            (false, FieldValue::Text(text)) => text,
            (false, FieldValue::List(items)) => {
                return Err(FieldError::InvalidValue {
                    field: field.name().to_string(),
                    value: items.join(", "),
                })
            }
        };

        match field {
            RecordField::HcpName => patch.hcp_name = Some(text),
            RecordField::InteractionType => patch.interaction_type = Some(text.parse()?),
            RecordField::Date => patch.date = Some(text),
            RecordField::Time => patch.time = Some(text),
            RecordField::Attendees => patch.attendees = Some(text),
            RecordField::TopicsDiscussed => patch.topics_discussed = Some(text),
            RecordField::HcpSentiment => patch.hcp_sentiment = Some(text.parse()?),
            RecordField::Outcomes => patch.outcomes = Some(text),
            RecordField::FollowUpActions => patch.follow_up_actions = Some(text),
            RecordField::AiDescription => patch.ai_description = Some(text),
            // List fields returned above
            RecordField::MaterialsShared | RecordField::SamplesDistributed => {}
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields present in this patch, in declaration order
    pub fn fields(&self) -> Vec<RecordField> {
        let present = [
            self.hcp_name.is_some(),
            self.interaction_type.is_some(),
            self.date.is_some(),
            self.time.is_some(),
            self.attendees.is_some(),
            self.topics_discussed.is_some(),
            self.materials_shared.is_some(),
            self.samples_distributed.is_some(),
            self.hcp_sentiment.is_some(),
            self.outcomes.is_some(),
            self.follow_up_actions.is_some(),
            self.ai_description.is_some(),
        ];
        RecordField::ALL
            .iter()
            .zip(present)
            .filter(|(_, set)| *set)
            .map(|(field, _)| *field)
            .collect()
    }
}

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Ai,
    Error,
}

/// One entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content.into())
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, content.into())
    }

    pub fn ai(
        content: impl Into<String>,
        action_taken: Option<String>,
        tools_used: Option<Vec<String>>,
    ) -> Self {
        Self {
            action_taken,
            tools_used,
            ..Self::new(MessageKind::Ai, content.into())
        }
    }

    fn new(kind: MessageKind, content: String) -> Self {
        Self {
            kind,
            content,
            timestamp: Utc::now(),
            action_taken: None,
            tools_used: None,
        }
    }
}
