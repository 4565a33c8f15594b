use crate::client::{JetStreamPublishClient, PublishClient};
use async_nats::HeaderMap;
use async_nats::subject::ToSubject;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// Records every publish, core or JetStream, in order.
///
/// [`fail_publish_count`](Self::fail_publish_count) makes the next `n`
/// publishes fail without being recorded.
#[derive(Clone, Debug, Default)]
pub struct MockNatsClient {
    published: Arc<Mutex<Vec<(String, Bytes)>>>,
    fail_remaining: Arc<Mutex<u32>>,
}

impl MockNatsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_publish_count(&self, n: u32) {
        *self.fail_remaining.lock().unwrap() = n;
    }

    pub fn published_subjects(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }

    pub fn published_payloads(&self) -> Vec<Bytes> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn record<S: ToSubject>(&self, subject: S, payload: Bytes) -> Result<(), MockError> {
        {
            let mut remaining = self.fail_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MockError("simulated publish failure".to_string()));
            }
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.to_subject().to_string(), payload));
        Ok(())
    }
}

impl PublishClient for MockNatsClient {
    type PublishError = MockError;

    async fn publish_with_headers<S: ToSubject + Send>(
        &self,
        subject: S,
        _headers: HeaderMap,
        payload: Bytes,
    ) -> Result<(), MockError> {
        self.record(subject, payload)
    }
}

impl JetStreamPublishClient for MockNatsClient {
    type PublishError = MockError;

    async fn publish_durable<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), MockError> {
        self.record(subject, payload)
    }
}
