//! Entry lifecycle orchestration
//!
//! The controller owns the repository and is the only place entries change.
//! Remote calls run on spawned tasks and report back over a channel; their
//! results are applied in [`DiaryController::next_completion`], so every
//! mutation happens on the caller's context.

use crate::application::repository::EntryRepository;
use crate::domain::{classify, Entry, EntryState};
use crate::error::{DiaryError, Result, TransformFailure};
use crate::infrastructure::{KeyValueStore, Transformer};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives the entry list and change notices
pub trait Presenter {
    /// Full list, sent once at startup
    fn show_all(&mut self, entries: &[Entry]);

    /// A single entry changed
    fn refresh(&mut self, index: usize, entry: &Entry);

    /// Transient user-visible notice
    fn notify(&mut self, notification: &Notification);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SubmissionFailed {
        index: usize,
        failure: TransformFailure,
    },
    Busy {
        index: usize,
    },
    PersistenceWarning {
        message: String,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::SubmissionFailed { failure, .. } => {
                write!(f, "Failed to transform text ({})", failure.category())
            }
            Notification::Busy { .. } => write!(f, "Still transforming this entry, please wait"),
            Notification::PersistenceWarning { message } => {
                write!(f, "Entry was not saved: {}", message)
            }
        }
    }
}

/// Per-entry state as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    AwaitingInput,
    Submitting,
    Recorded,
}

/// Result of applying one finished transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Recorded { index: usize },
    Failed { index: usize, failure: TransformFailure },
    /// Result arrived for an entry that no longer exists
    Discarded { index: usize },
}

#[derive(Debug)]
struct Completion {
    index: usize,
    result: std::result::Result<String, TransformFailure>,
}

pub struct DiaryController<S, T, P> {
    repository: EntryRepository<S>,
    client: Option<Arc<T>>,
    presenter: P,
    today: String,
    in_flight: HashSet<usize>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<S, T, P> DiaryController<S, T, P>
where
    S: KeyValueStore,
    T: Transformer,
    P: Presenter,
{
    pub fn new(
        repository: EntryRepository<S>,
        client: T,
        presenter: P,
        today: impl Into<String>,
    ) -> Self {
        Self::with_client(repository, Some(Arc::new(client)), presenter, today.into())
    }

    /// Controller that renders entries but cannot submit
    pub fn read_only(
        repository: EntryRepository<S>,
        presenter: P,
        today: impl Into<String>,
    ) -> Self {
        Self::with_client(repository, None, presenter, today.into())
    }

    fn with_client(
        repository: EntryRepository<S>,
        client: Option<Arc<T>>,
        presenter: P,
        today: String,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        DiaryController {
            repository,
            client,
            presenter,
            today,
            in_flight: HashSet::new(),
            completions_tx,
            completions_rx,
        }
    }

    /// Load entries, make sure today's entry exists and render the list.
    ///
    /// Returns the index of today's entry. Call once, before any submission.
    pub fn start(&mut self) -> usize {
        self.repository.initialize();
        let (index, created) = self.repository.ensure_today_entry(&self.today);
        info!(
            "Loaded {} entries, today's entry at {} (new: {})",
            self.repository.len(),
            index,
            created
        );

        self.presenter.show_all(self.repository.entries());
        index
    }

    /// Hand `text` for entry `index` to the transformer.
    ///
    /// Must be called from within a tokio runtime. The entry is not touched
    /// until the result is applied by [`Self::next_completion`].
    pub fn submit(&mut self, index: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(DiaryError::EmptyInput);
        }

        let len = self.repository.len();
        let entry = self
            .repository
            .get(index)
            .ok_or(DiaryError::IndexOutOfRange { index, len })?;

        if self.in_flight.contains(&index) {
            self.presenter.notify(&Notification::Busy { index });
            return Err(DiaryError::Busy(index));
        }

        if classify(entry, &self.today) != EntryState::AwaitingInput {
            return Err(DiaryError::NotAwaitingInput(index));
        }

        let client = match &self.client {
            Some(client) => Arc::clone(client),
            None => {
                return Err(DiaryError::Config(
                    "Diary was opened read-only; submissions are disabled".to_string(),
                ))
            }
        };

        self.in_flight.insert(index);
        debug!("Submitting entry {} ({} chars)", index, text.len());

        let tx = self.completions_tx.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            // A panicking transformer must still release the entry
            let call = tokio::spawn(async move { client.transform(&text).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Transformer task for entry {} failed: {}", index, e);
                    Err(TransformFailure::Protocol {
                        message: format!("transformer task failed: {}", e),
                    })
                }
            };
            if tx.send(Completion { index, result }).is_err() {
                debug!("Controller gone before entry {} completed", index);
            }
        });

        Ok(())
    }

    /// Wait for the next in-flight transformation and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<SubmissionOutcome> {
        if self.in_flight.is_empty() {
            return None;
        }

        let completion = self.completions_rx.recv().await?;
        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> SubmissionOutcome {
        let Completion { index, result } = completion;
        self.in_flight.remove(&index);

        match result {
            Ok(text) => self.record(index, text),
            Err(failure) => {
                warn!("Transformation for entry {} failed: {}", index, failure);
                self.presenter.notify(&Notification::SubmissionFailed {
                    index,
                    failure: failure.clone(),
                });
                SubmissionOutcome::Failed { index, failure }
            }
        }
    }

    fn record(&mut self, index: usize, text: String) -> SubmissionOutcome {
        debug_assert!(
            index < self.repository.len(),
            "completion for missing entry {}",
            index
        );

        match self.repository.record_transformation(index, text) {
            Ok(_) => {}
            Err(DiaryError::IndexOutOfRange { index, len }) => {
                error!("Dropping result for entry {} (only {} entries)", index, len);
                return SubmissionOutcome::Discarded { index };
            }
            Err(e) => {
                error!("Failed to save entry {}: {}", index, e);
                self.presenter.notify(&Notification::PersistenceWarning {
                    message: e.to_string(),
                });
            }
        }

        if let Some(entry) = self.repository.get(index) {
            self.presenter.refresh(index, entry);
        }
        SubmissionOutcome::Recorded { index }
    }

    pub fn phase(&self, index: usize) -> Option<EntryPhase> {
        if self.in_flight.contains(&index) {
            return Some(EntryPhase::Submitting);
        }

        self.repository
            .get(index)
            .map(|entry| match classify(entry, &self.today) {
                EntryState::AwaitingInput => EntryPhase::AwaitingInput,
                EntryState::Recorded => EntryPhase::Recorded,
            })
    }

    pub fn entries(&self) -> &[Entry] {
        self.repository.entries()
    }

    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn repository(&self) -> &EntryRepository<S> {
        &self.repository
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
