//! wordbook — vocabulary capture and spaced-repetition core
//!
//! The embedded service behind a word-capture tool: UI surfaces send
//! commands to the [`bus::CommandBus`], words live in the
//! [`vocab::WordStore`], and the [`scheduler::ReviewScheduler`]
//! periodically surfaces words that are due for review. Translation,
//! notification delivery, and raw key/value persistence come in through
//! the traits in [`ports`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

pub mod bus;
pub mod config;
pub mod events;
pub mod ports;
pub mod scheduler;
pub mod vocab;

use bus::{register_all_handlers, CallerContext, CommandBus, Request, Response};
use config::ServiceConfig;
use events::EventQueue;
use ports::{BlobStore, FileBlobStore, NotificationSink, PortError, TranslationProvider};
use scheduler::ReviewScheduler;
use vocab::{StoreError, WordStore};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

/// The assembled core service: store, bus, event queue, and scheduler,
/// constructed once and shared by reference. No global state.
pub struct WordbookService {
    pub store: Arc<WordStore>,
    pub bus: CommandBus,
    pub events: Arc<EventQueue>,
    scheduler: Mutex<ReviewScheduler>,
}

impl WordbookService {
    /// Build the service with the default file-backed blob store under
    /// the configured data directory.
    pub fn new(
        config: ServiceConfig,
        translator: Arc<dyn TranslationProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, ServiceError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => WordStore::default_data_dir()?,
        };
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(data_dir)?);
        Self::with_blob_store(config, translator, sink, blobs)
    }

    /// Build the service with a caller-supplied blob store
    pub fn with_blob_store(
        config: ServiceConfig,
        translator: Arc<dyn TranslationProvider>,
        sink: Arc<dyn NotificationSink>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self, ServiceError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => WordStore::default_data_dir()?,
        };

        let store = Arc::new(WordStore::new(data_dir));
        store.open()?;

        let events = Arc::new(EventQueue::new(config.event_queue_capacity));

        let bus = CommandBus::new();
        register_all_handlers(
            &bus,
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&blobs),
            translator,
            config.target_language.clone(),
        );

        let scheduler = ReviewScheduler::new(
            Arc::clone(&store),
            sink,
            blobs,
            Arc::clone(&events),
            Duration::from_secs(config.review_tick_secs),
        );

        Ok(Self {
            store,
            bus,
            events,
            scheduler: Mutex::new(scheduler),
        })
    }

    /// Start the background review scheduler. Must be called from within
    /// a tokio runtime.
    pub fn start(&self) {
        self.scheduler.lock().unwrap().start();
        log::info!("Review scheduler started");
    }

    /// Force a due-review scan outside the regular cadence
    pub fn tick_now(&self) {
        self.scheduler.lock().unwrap().tick_now();
    }

    /// Stop the background scheduler
    pub fn shutdown(&self) {
        self.scheduler.lock().unwrap().shutdown();
    }

    /// Dispatch one command through the bus
    pub async fn dispatch(&self, request: Request, ctx: CallerContext) -> Option<Response> {
        self.bus.dispatch(request, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ports::{ReviewDueNotification, TranslationResult};
    use serde_json::json;
    use tempfile::TempDir;

    struct StubTranslator;

    #[async_trait]
    impl TranslationProvider for StubTranslator {
        async fn translate(
            &self,
            text: &str,
            _target_lang: &str,
        ) -> ports::Result<TranslationResult> {
            Ok(TranslationResult {
                translated_text: text.chars().rev().collect(),
                pronunciation: None,
                definitions: vec![],
                alternative_translations: vec![],
                synonyms: vec![],
                examples: vec![],
            })
        }
    }

    struct SilentSink;

    #[async_trait]
    impl NotificationSink for SilentSink {
        async fn notify(&self, _n: ReviewDueNotification) -> ports::Result<()> {
            Ok(())
        }
    }

    fn service(dir: &TempDir) -> WordbookService {
        let config = ServiceConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        WordbookService::new(config, Arc::new(StubTranslator), Arc::new(SilentSink)).unwrap()
    }

    #[tokio::test]
    async fn test_service_capture_and_query_roundtrip() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let saved = svc
            .dispatch(
                Request {
                    action: "SAVE_WORD".to_string(),
                    payload: Some(json!({
                        "originalText": "ubiquitous",
                        "translatedText": "无处不在的",
                        "context": "This pattern is ubiquitous in distributed systems.",
                        "source": "example.com",
                    })),
                },
                CallerContext::default(),
            )
            .await
            .unwrap();
        assert!(saved.ok);

        let all = svc
            .dispatch(
                Request {
                    action: "GET_ALL_WORDS".to_string(),
                    payload: None,
                },
                CallerContext {
                    origin: Some("sidepanel".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(all.data.unwrap().as_array().unwrap().len(), 1);
        assert_eq!(svc.events.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_service_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let svc = service(&dir);
            svc.dispatch(
                Request {
                    action: "SAVE_WORD".to_string(),
                    payload: Some(json!({
                        "originalText": "persistent",
                        "translatedText": "持久的",
                        "context": "State must be persistent across restarts.",
                        "source": "example.com",
                    })),
                },
                CallerContext::default(),
            )
            .await
            .unwrap();
        }

        let svc = service(&dir);
        let item = svc.store.get_by_original_text("persistent").unwrap();
        assert!(item.is_some());
    }
}
