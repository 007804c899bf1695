//! Test doubles for the delivery ports
//!
//! - [`InMemorySink`]: keeps published records, can be told to fail
//! - [`RecordingPublisher`]: keeps broker messages
//! - [`ScriptedSender`]: replays a fixed sequence of attempt results

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use courier_domain::{CourierError, DeliveryResponse, ResponseRecord, Result};
use parking_lot::Mutex;

use crate::delivery::RequestSender;
use crate::sink_ports::{BrokerMessage, MessagePublisher, ResponseSink, SinkError};

/// Sink that stores records in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Vec<ResponseRecord>>,
    fail: bool,
    closed: AtomicBool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every publish fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn records(&self) -> Vec<ResponseRecord> {
        self.records.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseSink for InMemorySink {
    async fn publish(&self, record: &ResponseRecord) -> std::result::Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if self.fail {
            return Err(SinkError::Io("disk full".to_string()));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn close(&self) -> std::result::Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Publisher that records every message it is given.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<BrokerMessage>>,
    fail: bool,
    closed: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publisher whose every publish fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn messages(&self) -> Vec<BrokerMessage> {
        self.messages.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, message: BrokerMessage) -> std::result::Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Publish("broker unavailable".to_string()));
        }
        self.messages.lock().push(message);
        Ok(())
    }

    async fn close(&self) -> std::result::Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Sender that replays scripted results, repeating the last one forever.
#[derive(Debug)]
pub struct ScriptedSender {
    script: Mutex<VecDeque<Result<DeliveryResponse>>>,
    last: Mutex<Option<Result<DeliveryResponse>>>,
    calls: AtomicUsize,
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedSender {
    pub fn new(script: impl IntoIterator<Item = Result<DeliveryResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
        }
    }

    /// Sender that always answers with `status`.
    pub fn always(status: u16) -> Self {
        Self::new([Ok(DeliveryResponse::new(status))])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Request bodies in the order they were sent.
    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.bodies.lock().clone()
    }
}

#[async_trait]
impl RequestSender for ScriptedSender {
    async fn send(&self, body: &[u8]) -> Result<DeliveryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().push(body.to_vec());

        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(CourierError::Internal("empty script".to_string())))
    }
}
