//! Handlers for the word command surface
//!
//! Each action gets a closure that parses its payload, calls the store
//! (or a port), and returns the value the bus wraps into the reply
//! envelope. Payload problems inside a registered handler are soft
//! failures reported through `{ok: false, error}`, not drops.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::events::{EventQueue, WordbookEvent};
use crate::ports::{BlobStore, NotifiedSet, TranslationProvider};
use crate::vocab::{CapturedWord, ReviewOutcome, StoreError, WordItem, WordStore};

use super::{Action, CommandBus};

fn parse_payload<T: DeserializeOwned>(payload: Option<Value>) -> Result<T, String> {
    serde_json::from_value(payload.unwrap_or(Value::Null))
        .map_err(|e| format!("Invalid payload: {}", e))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct TranslatePayload {
    text: String,
}

#[derive(Deserialize)]
struct OriginalPayload {
    original: String,
}

#[derive(Deserialize)]
struct IdPayload {
    id: Uuid,
}

#[derive(Deserialize)]
struct EncounterPayload {
    id: Uuid,
    context: String,
    source: String,
}

#[derive(Deserialize)]
struct ReviewPayload {
    id: Uuid,
    result: ReviewOutcome,
}

/// Register the full command surface on a bus
pub fn register_all_handlers(
    bus: &CommandBus,
    store: Arc<WordStore>,
    events: Arc<EventQueue>,
    blobs: Arc<dyn BlobStore>,
    translator: Arc<dyn TranslationProvider>,
    target_language: String,
) {
    {
        let store = Arc::clone(&store);
        let events = Arc::clone(&events);
        bus.register_fn(Action::SaveWord, move |payload, _ctx| {
            let store = Arc::clone(&store);
            let events = Arc::clone(&events);
            async move {
                let capture: CapturedWord = parse_payload(payload)?;
                let item = WordItem::from_capture(capture, chrono::Utc::now());
                store.add(&item).map_err(|e| e.to_string())?;
                log::info!("Saved word '{}' ({})", item.original_text, item.id);
                events.push(WordbookEvent::VocabularyChanged);
                to_value(&item)
            }
        });
    }

    {
        let translator = Arc::clone(&translator);
        bus.register_fn(Action::Translate, move |payload, _ctx| {
            let translator = Arc::clone(&translator);
            let target_language = target_language.clone();
            async move {
                let TranslatePayload { text } = parse_payload(payload)?;
                let result = translator
                    .translate(&text, &target_language)
                    .await
                    .map_err(|e| e.to_string())?;
                to_value(&result)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        bus.register_fn(Action::GetWordByOriginal, move |payload, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let OriginalPayload { original } = parse_payload(payload)?;
                let word = store
                    .get_by_original_text(&original)
                    .map_err(|e| e.to_string())?;
                to_value(&word)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        bus.register_fn(Action::GetWordById, move |payload, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let IdPayload { id } = parse_payload(payload)?;
                let word = store.get_by_id(id).map_err(|e| e.to_string())?;
                to_value(&word)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        bus.register_fn(Action::GetAllWords, move |_payload, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let words = store.get_all().map_err(|e| e.to_string())?;
                to_value(&words)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        let events = Arc::clone(&events);
        bus.register_fn(Action::IncreaseCount, move |payload, _ctx| {
            let store = Arc::clone(&store);
            let events = Arc::clone(&events);
            async move {
                let EncounterPayload { id, context, source } = parse_payload(payload)?;
                store
                    .increase_encounter_count(id, &context, &source)
                    .map_err(|e| e.to_string())?;
                events.push(WordbookEvent::VocabularyChanged);
                Ok(Value::Null)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        bus.register_fn(Action::ApplyReviewAction, move |payload, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let ReviewPayload { id, result } = parse_payload(payload)?;
                match store.apply_review(id, result) {
                    Ok(item) => to_value(&item),
                    Err(StoreError::NotFound(_)) => Err("Word not found".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        });
    }

    {
        let store = Arc::clone(&store);
        bus.register_fn(Action::GetWordsDueForReview, move |_payload, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let due = store.get_due(chrono::Utc::now()).map_err(|e| e.to_string())?;
                to_value(&due)
            }
        });
    }

    {
        let store = Arc::clone(&store);
        let events = Arc::clone(&events);
        bus.register_fn(Action::ImportWord, move |payload, _ctx| {
            let store = Arc::clone(&store);
            let events = Arc::clone(&events);
            async move {
                let item: WordItem = parse_payload(payload)?;
                store.add(&item).map_err(|e| e.to_string())?;
                log::info!("Imported word '{}' ({})", item.original_text, item.id);
                events.push(WordbookEvent::VocabularyChanged);
                Ok(json!({ "id": item.id }))
            }
        });
    }

    {
        let store = Arc::clone(&store);
        let events = Arc::clone(&events);
        bus.register_fn(Action::ClearAllWords, move |_payload, _ctx| {
            let store = Arc::clone(&store);
            let events = Arc::clone(&events);
            let blobs = Arc::clone(&blobs);
            async move {
                store.clear_all().map_err(|e| e.to_string())?;
                // The notified set must not outlive the words it refers to
                NotifiedSet::clear(blobs.as_ref())
                    .await
                    .map_err(|e| e.to_string())?;
                events.push(WordbookEvent::VocabularyChanged);
                Ok(Value::Null)
            }
        });
    }
}
