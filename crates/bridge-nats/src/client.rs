use async_nats::jetstream::{self, context::PublishError as JetStreamPublishError};
use async_nats::subject::ToSubject;
use async_nats::{Client as NatsAsyncClient, HeaderMap};
use bytes::Bytes;
use std::error::Error;
use std::future::Future;

/// Core NATS publish. Returns once the message is in the client's outbound
/// buffer; nothing is awaited from subscribers.
pub trait PublishClient: Send + Sync + Clone + 'static {
    type PublishError: Error + Send + Sync;

    fn publish_with_headers<S: ToSubject + Send>(
        &self,
        subject: S,
        headers: HeaderMap,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), Self::PublishError>> + Send;
}

/// JetStream publish. Returns once the stream has acknowledged storing the
/// message.
pub trait JetStreamPublishClient: Send + Sync + Clone + 'static {
    type PublishError: Error + Send + Sync;

    fn publish_durable<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), Self::PublishError>> + Send;
}

impl PublishClient for NatsAsyncClient {
    type PublishError = async_nats::client::PublishError;

    async fn publish_with_headers<S: ToSubject + Send>(
        &self,
        subject: S,
        headers: HeaderMap,
        payload: Bytes,
    ) -> Result<(), Self::PublishError> {
        self.publish_with_headers(subject, headers, payload).await
    }
}

impl JetStreamPublishClient for jetstream::Context {
    type PublishError = JetStreamPublishError;

    async fn publish_durable<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), Self::PublishError> {
        // First await sends, second waits for the stream's ack.
        self.publish(subject, payload).await?.await?;
        Ok(())
    }
}
