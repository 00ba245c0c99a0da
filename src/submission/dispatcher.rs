//! Request dispatch.
//!
//! One entry point, [`RequestDispatcher::handle`], maps an inbound event to
//! the response to write (or none) and performs the message sends the event
//! calls for. Handling runs to completion synchronously; writing the response
//! is the transport's job.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};

use crate::http::response::{OutboundResponse, ResponseWriter};
use crate::message::{now_millis, MessageTranslator};
use crate::observability::MetricsRecorder;
use crate::producer::Producer;
use crate::submission::error::{classify, SubmissionError};
use crate::submission::obsolete::{ObsoleteDocumentProcessor, HEADER_OBSOLETE_DOCUMENT};
use crate::submission::request::InboundRequest;
use crate::submission::validator::ENDPOINT_SUBMIT;

/// Methods advertised on 405 answers.
pub const ALLOWED_METHODS: &str = "POST, PUT, DELETE, OPTIONS";

/// Something that happened on a connection.
#[derive(Debug)]
pub enum InboundEvent {
    /// A parsed request.
    Request(InboundRequest),
    /// Traffic that is not a submission at all (tunnels, protocol upgrades).
    Unsupported { client_addr: IpAddr },
    /// A failure raised while receiving or parsing the request.
    Failure(SubmissionError),
}

/// Routes events to the store, delete and preflight handlers.
pub struct RequestDispatcher {
    producer: Arc<dyn Producer>,
    translator: MessageTranslator,
    obsolete: ObsoleteDocumentProcessor,
    writer: ResponseWriter,
    metrics: MetricsRecorder,
}

impl RequestDispatcher {
    pub fn new(producer: Arc<dyn Producer>, metrics: MetricsRecorder) -> Self {
        Self {
            producer,
            translator: MessageTranslator::new(),
            obsolete: ObsoleteDocumentProcessor::new(),
            writer: ResponseWriter::new(metrics.clone()),
            metrics,
        }
    }

    /// Handle one event. `None` means the connection is closed without a reply.
    pub fn handle(&self, event: InboundEvent) -> Option<OutboundResponse> {
        match event {
            InboundEvent::Request(request) => Some(self.handle_request(&request)),
            InboundEvent::Unsupported { client_addr } => {
                tracing::debug!(client = %client_addr, "Rejecting non-submission traffic");
                Some(self.writer.write(StatusCode::INTERNAL_SERVER_ERROR, None, None))
            }
            InboundEvent::Failure(error) => self.handle_failure(&error),
        }
    }

    fn handle_request(&self, request: &InboundRequest) -> OutboundResponse {
        if request.endpoint() != ENDPOINT_SUBMIT {
            tracing::warn!(
                "Tried to access invalid resource - \"{}\" \"{}\"",
                request.client_addr(),
                request.user_agent().unwrap_or("null")
            );
            return self.writer.write(StatusCode::NOT_FOUND, None, None);
        }

        let method = request.method();
        if method == Method::POST || method == Method::PUT {
            self.handle_store(request)
        } else if method == Method::DELETE {
            self.handle_delete(request)
        } else if method == Method::OPTIONS {
            self.writer.preflight()
        } else {
            self.writer
                .write(StatusCode::METHOD_NOT_ALLOWED, Some(request.namespace()), None)
                .with_header(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))
        }
    }

    fn handle_store(&self, request: &InboundRequest) -> OutboundResponse {
        let body = request.body();
        let id = request.id().unwrap_or_default();
        let mut status = StatusCode::BAD_REQUEST;

        if !body.is_empty() {
            let template = self.translator.template(request, now_millis());
            self.producer.send(template.store(id, body.clone()));

            let mut obsolete = request.header_values(HEADER_OBSOLETE_DOCUMENT).peekable();
            if obsolete.peek().is_some() {
                let deleted = self.obsolete.process(obsolete, &template, self.producer.as_ref());
                tracing::info!(
                    "IP {} {} HTTP_PUT {} HTTP_DELETE {}",
                    request.client_addr(),
                    request.namespace(),
                    id,
                    deleted
                );
            } else {
                tracing::info!("IP {} {} HTTP_PUT {}", request.client_addr(), request.namespace(), id);
            }

            status = StatusCode::CREATED;
        }

        self.metrics
            .record_request(request.namespace(), method_name(request), body.len());
        self.writer.write(status, Some(request.namespace()), Some(id))
    }

    fn handle_delete(&self, request: &InboundRequest) -> OutboundResponse {
        let template = self.translator.template_with_id(request, now_millis());
        let Some(message) = template.delete_self() else {
            // The validator refuses deletes without an id.
            return self.handle_failure_status(&SubmissionError::invalid_resource("delete without id"));
        };

        self.producer.send(message);
        tracing::info!(
            "IP {} {} HTTP_DELETE {}",
            request.client_addr(),
            request.namespace(),
            template.id().unwrap_or_default()
        );

        self.metrics
            .record_request(request.namespace(), method_name(request), 0);
        self.writer.write(StatusCode::OK, Some(request.namespace()), None)
    }

    fn handle_failure(&self, error: &SubmissionError) -> Option<OutboundResponse> {
        let classification = classify(error);
        if classification.log {
            tracing::error!("{}", error);
        }
        classification
            .status
            .map(|status| self.writer.write(status, None, None))
    }

    fn handle_failure_status(&self, error: &SubmissionError) -> OutboundResponse {
        self.handle_failure(error)
            .unwrap_or_else(|| self.writer.write(StatusCode::INTERNAL_SERVER_ERROR, None, None))
    }
}

fn method_name(request: &InboundRequest) -> &str {
    request.method().as_str()
}
