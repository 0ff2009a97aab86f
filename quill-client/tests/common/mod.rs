//! Scripted test doubles for operation executor tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use quill_client::{
    Binding, Connection, PooledConnection, SelectionCriteria, ServerDescription, ServerVersion,
    WriteConcern, WriteResult,
};
use quill_core::protocol::constants::MESSAGE_HEADER_SIZE;
use quill_core::{
    Decoder, Document, DocumentCodec, Encoder, Namespace, QuillError, ReplyHeader, RequestMessage,
    ResponseBuffers, Result,
};

pub const MOCK_ADDRESS: &str = "127.0.0.1:27017";

pub fn mock_address() -> SocketAddr {
    MOCK_ADDRESS.parse().unwrap()
}

/// One scripted reply, materialized against the actual request id at
/// exchange time so correlation works (or deliberately fails).
pub struct ScriptedReply {
    pub flags: i32,
    pub documents: Vec<Document>,
    pub cursor_id: i64,
    pub starting_from: i32,
    /// Added to the request id when echoing it back; non-zero breaks
    /// correlation.
    pub response_to_offset: i32,
    /// Bytes cut from the end of the encoded body to provoke decode errors.
    pub truncate_body: usize,
    /// Incremented when the reply's buffers are released.
    pub reclaims: Option<Arc<AtomicUsize>>,
}

impl ScriptedReply {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            flags: 0,
            documents,
            cursor_id: 0,
            starting_from: 0,
            response_to_offset: 0,
            truncate_body: 0,
            reclaims: None,
        }
    }

    /// An `{ok: 1}` command reply.
    pub fn ok_command() -> Self {
        Self::with_documents(vec![Document::new().with("ok", 1)])
    }
}

pub enum ScriptedExchange {
    Reply(ScriptedReply),
    TransportError(String),
}

/// A request observed by the mock, with the interesting wire fields parsed
/// back out of the encoded buffer.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request_id: i32,
    pub opcode: i32,
    pub flags: i32,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct InsertCall {
    pub namespace: String,
    pub ordered: bool,
    pub write_concern: WriteConcern,
    pub documents: Vec<Document>,
}

/// A connection double that replays scripted exchanges and records every
/// request and legacy insert it sees.
pub struct MockConnection {
    description: ServerDescription,
    exchanges: Mutex<VecDeque<ScriptedExchange>>,
    insert_results: Mutex<VecDeque<WriteResult>>,
    sent: Arc<Mutex<Vec<SentRequest>>>,
    inserts: Arc<Mutex<Vec<InsertCall>>>,
}

impl MockConnection {
    pub fn new(version: ServerVersion) -> Self {
        Self {
            description: ServerDescription::new(mock_address(), version),
            exchanges: Mutex::new(VecDeque::new()),
            insert_results: Mutex::new(VecDeque::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            inserts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script(&self, exchange: ScriptedExchange) {
        self.exchanges.lock().unwrap().push_back(exchange);
    }

    pub fn script_reply(&self, reply: ScriptedReply) {
        self.script(ScriptedExchange::Reply(reply));
    }

    pub fn script_insert_result(&self, result: WriteResult) {
        self.insert_results.lock().unwrap().push_back(result);
    }

    /// Shared log of observed wire requests.
    pub fn sent_log(&self) -> Arc<Mutex<Vec<SentRequest>>> {
        Arc::clone(&self.sent)
    }

    /// Shared log of observed legacy inserts.
    pub fn insert_log(&self) -> Arc<Mutex<Vec<InsertCall>>> {
        Arc::clone(&self.inserts)
    }

    fn record_request(&self, message: &RequestMessage) {
        let bytes = message.bytes();
        let flags = i32::from_le_bytes(
            bytes[MESSAGE_HEADER_SIZE..MESSAGE_HEADER_SIZE + 4]
                .try_into()
                .unwrap(),
        );
        let name_start = MESSAGE_HEADER_SIZE + 4;
        let name_end = bytes[name_start..]
            .iter()
            .position(|b| *b == 0)
            .map(|p| name_start + p)
            .unwrap_or(bytes.len());
        let collection = String::from_utf8_lossy(&bytes[name_start..name_end]).into_owned();

        self.sent.lock().unwrap().push(SentRequest {
            request_id: message.request_id(),
            opcode: message.opcode(),
            flags,
            collection,
        });
    }

    fn materialize(&self, reply: ScriptedReply, request_id: i32) -> ResponseBuffers {
        let mut body = BytesMut::new();
        for document in &reply.documents {
            DocumentCodec.encode(document, &mut body).unwrap();
        }
        if reply.truncate_body > 0 {
            let keep = body.len().saturating_sub(reply.truncate_body);
            body.truncate(keep);
        }

        let header = ReplyHeader::new(
            1,
            request_id + reply.response_to_offset,
            reply.flags,
            reply.cursor_id,
            reply.starting_from,
            reply.documents.len() as i32,
        );
        match reply.reclaims {
            Some(counter) => ResponseBuffers::with_reclaim(header, body, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            None => ResponseBuffers::new(header, body),
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn description(&self) -> &ServerDescription {
        &self.description
    }

    fn address(&self) -> SocketAddr {
        self.description.address()
    }

    async fn send_and_receive(&mut self, message: RequestMessage) -> Result<ResponseBuffers> {
        self.record_request(&message);
        let exchange = self.exchanges.lock().unwrap().pop_front();
        match exchange {
            Some(ScriptedExchange::Reply(reply)) => {
                Ok(self.materialize(reply, message.request_id()))
            }
            Some(ScriptedExchange::TransportError(message)) => {
                Err(QuillError::Transport(message))
            }
            None => Err(QuillError::Transport(
                "mock connection has no scripted reply".to_string(),
            )),
        }
    }

    async fn insert(
        &mut self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: WriteConcern,
        documents: Vec<Document>,
    ) -> Result<WriteResult> {
        self.inserts.lock().unwrap().push(InsertCall {
            namespace: namespace.full_name(),
            ordered,
            write_concern,
            documents,
        });
        let scripted = self.insert_results.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            WriteResult::acknowledged(
                Document::new()
                    .with("ok", 1)
                    .with("n", 1)
                    .with("err", quill_core::Value::Null),
            )
        }))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A binding double that hands out one connection and counts releases.
pub struct TestBinding {
    connection: Mutex<Option<Box<dyn Connection>>>,
    releases: Arc<AtomicUsize>,
    acquire_error: Option<String>,
}

impl TestBinding {
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
            releases: Arc::new(AtomicUsize::new(0)),
            acquire_error: None,
        }
    }

    /// A binding whose acquisition always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            connection: Mutex::new(None),
            releases: Arc::new(AtomicUsize::new(0)),
            acquire_error: Some(message.to_string()),
        }
    }

    pub fn releases(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

#[async_trait]
impl Binding for TestBinding {
    async fn acquire(&self, _criteria: SelectionCriteria) -> Result<PooledConnection> {
        if let Some(message) = &self.acquire_error {
            return Err(QuillError::Acquisition(message.clone()));
        }
        let connection = self
            .connection
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| QuillError::Acquisition("connection already taken".to_string()))?;
        let releases = Arc::clone(&self.releases);
        Ok(PooledConnection::new(connection, move |_| {
            releases.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// A decoder that counts how often the executor invokes it.
pub struct CountingDecoder {
    calls: Arc<AtomicUsize>,
}

impl CountingDecoder {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Decoder<Document> for CountingDecoder {
    fn decode(&self, src: &mut BytesMut) -> Result<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DocumentCodec.decode(src)
    }
}
