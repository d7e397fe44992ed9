//! In-memory GitHub double shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use labelsync::{
    ContentSource, LabelMutation, LabelService, LabelSpec, LabelSyncError, RemoteLabel,
    RepoContent, RepositoryCoordinates, Result, SpecReference,
};

/// Every call the engine made, in order of arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    List,
    Probe(String),
    Create(String),
    Update(String),
    Delete(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update(_) | Self::Delete(_))
    }
}

struct RemoteFile {
    kind: &'static str,
    text: String,
    delay: Duration,
}

#[derive(Default)]
pub struct FakeGitHub {
    files: Mutex<HashMap<String, RemoteFile>>,
    labels: Mutex<Vec<RemoteLabel>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashMap<String, u16>>,
    mutation_delay: Mutex<Duration>,
    fetches_in_flight: AtomicUsize,
    max_fetches_in_flight: AtomicUsize,
    upserts_in_flight: AtomicUsize,
    max_upserts_in_flight: AtomicUsize,
    deletes_in_flight: AtomicUsize,
    max_deletes_in_flight: AtomicUsize,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, tag: &str, text: &str) -> Self {
        self.with_slow_file(tag, text, Duration::ZERO)
    }

    /// Serve `text` for `tag` after `delay`.
    pub fn with_slow_file(self, tag: &str, text: &str, delay: Duration) -> Self {
        self.files.lock().unwrap().insert(
            tag.to_string(),
            RemoteFile {
                kind: "file",
                text: text.to_string(),
                delay,
            },
        );
        self
    }

    pub fn with_directory(self, tag: &str) -> Self {
        self.files.lock().unwrap().insert(
            tag.to_string(),
            RemoteFile {
                kind: "dir",
                text: String::new(),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_labels(self, labels: &[(&str, &str)]) -> Self {
        *self.labels.lock().unwrap() = labels
            .iter()
            .map(|(name, color)| RemoteLabel {
                name: (*name).to_string(),
                color: (*color).to_string(),
                description: None,
            })
            .collect();
        self
    }

    /// Answer mutations of `name` with `status` instead of applying them.
    pub fn failing(self, name: &str, status: u16) -> Self {
        self.failing
            .lock()
            .unwrap()
            .insert(name.to_string(), status);
        self
    }

    pub fn with_mutation_delay(self, delay: Duration) -> Self {
        *self.mutation_delay.lock().unwrap() = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .labels
            .lock()
            .unwrap()
            .iter()
            .map(|label| label.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn label(&self, name: &str) -> Option<RemoteLabel> {
        self.labels
            .lock()
            .unwrap()
            .iter()
            .find(|label| label.name == name)
            .cloned()
    }

    pub fn max_fetches_in_flight(&self) -> usize {
        self.max_fetches_in_flight.load(Ordering::SeqCst)
    }

    pub fn max_upserts_in_flight(&self) -> usize {
        self.max_upserts_in_flight.load(Ordering::SeqCst)
    }

    pub fn max_deletes_in_flight(&self) -> usize {
        self.max_deletes_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure_for(&self, name: &str) -> Option<u16> {
        self.failing.lock().unwrap().get(name).copied()
    }

    async fn pause(&self) {
        let delay = *self.mutation_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn tracked<T>(
        &self,
        in_flight: &AtomicUsize,
        max: &AtomicUsize,
        apply: impl FnOnce() -> T,
    ) -> T {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        self.pause().await;
        let result = apply();
        in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn to_remote(label: &LabelSpec) -> RemoteLabel {
        RemoteLabel {
            name: label.name.clone(),
            color: label.color.clone(),
            description: Some(label.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Base64 with a line break every 60 characters, like the contents API.
fn encode_wrapped(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ContentSource for FakeGitHub {
    async fn get_content(&self, reference: &SpecReference) -> Result<RepoContent> {
        let tag = reference.to_string();
        self.record(Call::Fetch(tag.clone()));

        let found = self
            .files
            .lock()
            .unwrap()
            .get(&tag)
            .map(|file| (file.kind, encode_wrapped(&file.text), file.delay));

        let Some((kind, content, delay)) = found else {
            return Err(LabelSyncError::FetchFailed {
                reference: tag,
                status: 404,
            });
        };

        let now = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_fetches_in_flight.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(RepoContent {
            kind: kind.to_string(),
            content: Some(content),
            encoding: Some("base64".to_string()),
        })
    }
}

#[async_trait]
impl LabelService for FakeGitHub {
    async fn list_labels(&self, _repo: &RepositoryCoordinates) -> Result<Vec<RemoteLabel>> {
        self.record(Call::List);
        Ok(self.labels.lock().unwrap().clone())
    }

    async fn get_label(
        &self,
        _repo: &RepositoryCoordinates,
        name: &str,
    ) -> Result<Option<RemoteLabel>> {
        self.record(Call::Probe(name.to_string()));
        Ok(self.label(name))
    }

    async fn create_label(
        &self,
        _repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        self.record(Call::Create(label.name.clone()));
        let status = self.failure_for(&label.name);
        let status = self
            .tracked(&self.upserts_in_flight, &self.max_upserts_in_flight, || {
                if status.is_none() {
                    self.labels.lock().unwrap().push(Self::to_remote(label));
                }
                status.unwrap_or(201)
            })
            .await;
        Ok(LabelMutation {
            status,
            label: label.clone(),
        })
    }

    async fn update_label(
        &self,
        _repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        self.record(Call::Update(label.name.clone()));
        let status = self.failure_for(&label.name);
        let status = self
            .tracked(&self.upserts_in_flight, &self.max_upserts_in_flight, || {
                if status.is_none() {
                    let mut labels = self.labels.lock().unwrap();
                    if let Some(existing) = labels.iter_mut().find(|l| l.name == label.name) {
                        *existing = Self::to_remote(label);
                    }
                }
                status.unwrap_or(200)
            })
            .await;
        Ok(LabelMutation {
            status,
            label: label.clone(),
        })
    }

    async fn delete_label(
        &self,
        _repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        self.record(Call::Delete(label.name.clone()));
        let status = self.failure_for(&label.name);
        let status = self
            .tracked(&self.deletes_in_flight, &self.max_deletes_in_flight, || {
                if status.is_none() {
                    self.labels.lock().unwrap().retain(|l| l.name != label.name);
                }
                status.unwrap_or(204)
            })
            .await;
        Ok(LabelMutation {
            status,
            label: label.clone(),
        })
    }
}

pub fn repo() -> RepositoryCoordinates {
    RepositoryCoordinates::new("acme", "app")
}

pub fn label(name: &str, color: &str) -> LabelSpec {
    LabelSpec::new(name, color, "")
}

pub fn names(labels: &[LabelSpec]) -> Vec<&str> {
    labels.iter().map(|label| label.name.as_str()).collect()
}
