//! Data models for the vocabulary system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::memory::{MemoryState, ReviewOutcome};

/// One dictionary sense of a word, opaque translation metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub part_of_speech: String,
    pub meanings: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A sentence the word was encountered in, with its page of origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordContext {
    pub id: Uuid,
    pub source: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl WordContext {
    pub fn new(source: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            content,
            created_at: now,
        }
    }
}

/// A record of a single review attempt, appended to the item history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub result: ReviewOutcome,
    pub from_state: MemoryState,
    pub to_state: MemoryState,
}

/// The reviewable unit: a captured word with translation metadata and
/// its spaced repetition state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordItem {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub alternative_translations: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub contexts: Vec<WordContext>,
    /// Number of times the word was encountered, always >= 1
    pub count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_encountered_at: DateTime<Utc>,
    pub state: MemoryState,
    /// Interval of the current state, in milliseconds. Carried on the
    /// wire as `interval`.
    #[serde(rename = "interval")]
    pub interval_ms: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review_at: DateTime<Utc>,
    /// Append-only review log, never truncated
    #[serde(default)]
    pub history: Vec<ReviewLogEntry>,
}

impl WordItem {
    /// Check if the word is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Build a complete item from a capture.
    ///
    /// A fresh capture starts in `Learning` and is scheduled by that
    /// state's interval, so the first review comes up 10 minutes after
    /// the word was saved.
    pub fn from_capture(capture: CapturedWord, now: DateTime<Utc>) -> Self {
        let state = MemoryState::Learning;
        let interval = state.interval();

        Self {
            id: Uuid::new_v4(),
            original_text: capture.original_text,
            translated_text: capture.translated_text,
            pronunciation: capture.pronunciation,
            definitions: capture.definitions,
            alternative_translations: capture.alternative_translations,
            synonyms: capture.synonyms,
            examples: capture.examples,
            contexts: vec![WordContext::new(capture.source, capture.context, now)],
            count: 1,
            created_at: now,
            last_encountered_at: now,
            state,
            interval_ms: interval.num_milliseconds(),
            next_review_at: now + interval,
            history: Vec::new(),
        }
    }
}

/// Payload of a word capture: translation metadata plus the sentence and
/// page the word was selected on. Translation happened upstream; the core
/// stores the result verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedWord {
    pub original_text: String,
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub alternative_translations: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    /// The sentence the word was selected in
    pub context: String,
    /// Origin of the capture, usually a page URL or hostname
    pub source: String,
}

/// Partial update merged over a stored item by `WordStore::update`.
/// Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Vec<Definition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_translations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl WordPatch {
    /// Merge this patch over an item, field by field
    pub fn apply(self, item: &mut WordItem) {
        if let Some(translated_text) = self.translated_text {
            item.translated_text = translated_text;
        }
        if let Some(pronunciation) = self.pronunciation {
            item.pronunciation = Some(pronunciation);
        }
        if let Some(definitions) = self.definitions {
            item.definitions = definitions;
        }
        if let Some(alts) = self.alternative_translations {
            item.alternative_translations = alts;
        }
        if let Some(synonyms) = self.synonyms {
            item.synonyms = synonyms;
        }
        if let Some(examples) = self.examples {
            item.examples = examples;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn capture() -> CapturedWord {
        CapturedWord {
            original_text: "ubiquitous".to_string(),
            translated_text: "无处不在的".to_string(),
            pronunciation: Some("juːˈbɪkwɪtəs".to_string()),
            definitions: vec![Definition {
                part_of_speech: "adjective".to_string(),
                meanings: vec!["present everywhere".to_string()],
                examples: vec![],
            }],
            alternative_translations: vec!["普遍存在的".to_string()],
            synonyms: vec!["omnipresent".to_string()],
            examples: vec![],
            context: "This pattern is ubiquitous in distributed systems.".to_string(),
            source: "example.com".to_string(),
        }
    }

    #[test]
    fn test_from_capture_sets_every_field() {
        let now = Utc::now();
        let item = WordItem::from_capture(capture(), now);

        assert_eq!(item.original_text, "ubiquitous");
        assert_eq!(item.count, 1);
        assert_eq!(item.state, MemoryState::Learning);
        assert_eq!(item.created_at, now);
        assert_eq!(item.last_encountered_at, now);
        assert_eq!(item.interval_ms, Duration::minutes(10).num_milliseconds());
        assert_eq!(item.next_review_at, now + Duration::minutes(10));
        assert_eq!(item.contexts.len(), 1);
        assert_eq!(item.contexts[0].source, "example.com");
        assert!(item.history.is_empty());
        assert!(!item.is_due(now));
        assert!(item.is_due(now + Duration::minutes(10)));
    }

    #[test]
    fn test_item_roundtrips_with_epoch_ms_timestamps() {
        let now = Utc::now();
        let item = WordItem::from_capture(capture(), now);

        let json = serde_json::to_string(&item).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["createdAt"], serde_json::json!(now.timestamp_millis()));
        assert_eq!(value["state"], serde_json::json!("learning"));

        let back: WordItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.next_review_at.timestamp_millis(), item.next_review_at.timestamp_millis());
    }

    #[test]
    fn test_interval_wire_name() {
        let now = Utc::now();
        let item = WordItem::from_capture(capture(), now);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value["interval"],
            serde_json::json!(Duration::minutes(10).num_milliseconds())
        );
        assert!(value.get("intervalMs").is_none());

        // A full item written by another instance parses back, interval
        // field included
        let foreign = serde_json::json!({
            "id": item.id,
            "originalText": "ubiquitous",
            "translatedText": "无处不在的",
            "count": 2,
            "createdAt": now.timestamp_millis(),
            "lastEncounteredAt": now.timestamp_millis(),
            "state": "review1",
            "interval": Duration::days(1).num_milliseconds(),
            "nextReviewAt": (now + Duration::days(1)).timestamp_millis(),
        });
        let parsed: WordItem = serde_json::from_value(foreign).unwrap();
        assert_eq!(parsed.interval_ms, Duration::days(1).num_milliseconds());
        assert_eq!(parsed.state, MemoryState::Review1);
    }

    #[test]
    fn test_patch_leaves_absent_fields_untouched() {
        let now = Utc::now();
        let mut item = WordItem::from_capture(capture(), now);

        let patch = WordPatch {
            translated_text: Some("普及的".to_string()),
            ..Default::default()
        };
        patch.apply(&mut item);

        assert_eq!(item.translated_text, "普及的");
        assert_eq!(item.pronunciation.as_deref(), Some("juːˈbɪkwɪtəs"));
        assert_eq!(item.synonyms, vec!["omnipresent".to_string()]);
    }
}
