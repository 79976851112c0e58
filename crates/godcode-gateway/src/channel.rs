//! MessageChannel - the only caller-facing entry point.
//!
//! Requests name an operation from the catalog plus an optional JSON
//! payload. The name and payload are validated before anything runs, the
//! operation executes on its own task, and exactly one `Envelope` comes
//! back.

use std::sync::Arc;

use godcode_core::{
    Envelope, Operation, ResumeSessionRequest, RunQaRequest, SetPathRequest, SpecTargetRequest,
    StartSessionRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::ChannelError;
use crate::events::{EventBus, Subscription};
use crate::gateway::Gateway;

/// Wire form of a request: `{ "id"?: any, "op": <name>, "payload"?: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelRequest {
    /// Opaque correlation id, echoed back by transports that need one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// A validated request, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Ping,
    Status,
    ListSessions,
    ListSpecs,
    StartSession(StartSessionRequest),
    RunQa(RunQaRequest),
    ResumeSession(ResumeSessionRequest),
    MergeSpec(SpecTargetRequest),
    DiscardSpec(SpecTargetRequest),
    BackendVersion,
    GetLocation,
    SetRuntimePath(SetPathRequest),
    SetBackendRoot(SetPathRequest),
    ResolvePaths,
}

impl Request {
    /// Validate an operation name and its payload.
    pub fn parse(name: &str, payload: Option<Value>) -> Result<Self, ChannelError> {
        let operation: Operation = name
            .parse()
            .map_err(|_| ChannelError::UnknownOperation(name.to_string()))?;

        if !operation.takes_payload() {
            reject_payload(operation, payload.as_ref())?;
        }

        let request = match operation {
            Operation::Ping => Self::Ping,
            Operation::Status => Self::Status,
            Operation::ListSessions => Self::ListSessions,
            Operation::ListSpecs => Self::ListSpecs,
            Operation::BackendVersion => Self::BackendVersion,
            Operation::GetLocation => Self::GetLocation,
            Operation::ResolvePaths => Self::ResolvePaths,
            Operation::StartSession => {
                let req: StartSessionRequest = decode(operation, payload)?;
                req.validate().map_err(|r| ChannelError::invalid(operation, r))?;
                Self::StartSession(req)
            }
            Operation::RunQa => {
                let req: RunQaRequest = decode(operation, payload)?;
                req.validate().map_err(|r| ChannelError::invalid(operation, r))?;
                Self::RunQa(req)
            }
            Operation::ResumeSession => {
                let req: ResumeSessionRequest = decode(operation, payload)?;
                req.validate().map_err(|r| ChannelError::invalid(operation, r))?;
                Self::ResumeSession(req)
            }
            Operation::MergeSpec => {
                let req: SpecTargetRequest = decode(operation, payload)?;
                req.validate().map_err(|r| ChannelError::invalid(operation, r))?;
                Self::MergeSpec(req)
            }
            Operation::DiscardSpec => {
                let req: SpecTargetRequest = decode(operation, payload)?;
                req.validate().map_err(|r| ChannelError::invalid(operation, r))?;
                Self::DiscardSpec(req)
            }
            Operation::SetRuntimePath => Self::SetRuntimePath(decode(operation, payload)?),
            Operation::SetBackendRoot => Self::SetBackendRoot(decode(operation, payload)?),
        };
        Ok(request)
    }

    pub const fn operation(&self) -> Operation {
        match self {
            Self::Ping => Operation::Ping,
            Self::Status => Operation::Status,
            Self::ListSessions => Operation::ListSessions,
            Self::ListSpecs => Operation::ListSpecs,
            Self::StartSession(_) => Operation::StartSession,
            Self::RunQa(_) => Operation::RunQa,
            Self::ResumeSession(_) => Operation::ResumeSession,
            Self::MergeSpec(_) => Operation::MergeSpec,
            Self::DiscardSpec(_) => Operation::DiscardSpec,
            Self::BackendVersion => Operation::BackendVersion,
            Self::GetLocation => Operation::GetLocation,
            Self::SetRuntimePath(_) => Operation::SetRuntimePath,
            Self::SetBackendRoot(_) => Operation::SetBackendRoot,
            Self::ResolvePaths => Operation::ResolvePaths,
        }
    }
}

/// Payload-less operations accept nothing, `null`, or `{}`.
fn reject_payload(operation: Operation, payload: Option<&Value>) -> Result<(), ChannelError> {
    match payload {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(map)) if map.is_empty() => Ok(()),
        Some(_) => Err(ChannelError::invalid(operation, "operation takes no payload")),
    }
}

fn decode<T: DeserializeOwned>(
    operation: Operation,
    payload: Option<Value>,
) -> Result<T, ChannelError> {
    let payload = payload
        .filter(|v| !v.is_null())
        .ok_or_else(|| ChannelError::invalid(operation, "payload is required"))?;
    serde_json::from_value(payload).map_err(|e| ChannelError::invalid(operation, e.to_string()))
}

async fn dispatch(gateway: &Gateway, request: Request, cancel: &CancellationToken) -> Envelope<Value> {
    match request {
        Request::Ping => gateway.ping(cancel).await.into_json(),
        Request::Status => gateway.status(cancel).await.into_json(),
        Request::ListSessions => gateway.list_sessions(cancel).await.into_json(),
        Request::ListSpecs => gateway.list_specs(cancel).await.into_json(),
        Request::StartSession(req) => gateway.start_session(&req, cancel).await.into_json(),
        Request::RunQa(req) => gateway.run_qa(&req, cancel).await.into_json(),
        Request::ResumeSession(req) => gateway.resume_session(&req, cancel).await.into_json(),
        Request::MergeSpec(req) => gateway.merge_spec(&req, cancel).await.into_json(),
        Request::DiscardSpec(req) => gateway.discard_spec(&req, cancel).await.into_json(),
        Request::BackendVersion => gateway.backend_version(cancel).await.into_json(),
        Request::GetLocation => gateway.get_location().into_json(),
        Request::SetRuntimePath(req) => gateway.set_runtime_path(&req.path).into_json(),
        Request::SetBackendRoot(req) => gateway.set_backend_root(&req.path).into_json(),
        Request::ResolvePaths => gateway.re_resolve().await.into_json(),
    }
}

/// Request/response and publish/subscribe surface over a [`Gateway`].
#[derive(Debug, Clone)]
pub struct MessageChannel {
    gateway: Arc<Gateway>,
    bus: EventBus,
}

impl MessageChannel {
    pub const fn new(gateway: Arc<Gateway>, bus: EventBus) -> Self {
        Self { gateway, bus }
    }

    pub const fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run `name` with `payload` and return its envelope.
    pub async fn call(&self, name: &str, payload: Option<Value>) -> Envelope<Value> {
        self.call_with_cancel(name, payload, CancellationToken::new())
            .await
    }

    /// As [`call`](Self::call), abortable through `cancel`.
    pub async fn call_with_cancel(
        &self,
        name: &str,
        payload: Option<Value>,
        cancel: CancellationToken,
    ) -> Envelope<Value> {
        let request = match Request::parse(name, payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(operation = name, error = %e, "Rejected request");
                return Envelope::err(e.to_string());
            }
        };
        let operation = request.operation();
        debug!(%operation, "Dispatching request");

        let gateway = Arc::clone(&self.gateway);
        let task =
            tokio::spawn(async move { dispatch(&gateway, request, &cancel).await });

        match task.await {
            Ok(envelope) => envelope,
            Err(join) => {
                let reason = if join.is_panic() {
                    "operation panicked"
                } else {
                    "operation task was aborted"
                };
                let e = ChannelError::Internal(format!("{operation}: {reason}"));
                error!(%operation, error = %e, "Dispatch task failed");
                Envelope::err(e.to_string())
            }
        }
    }

    /// Handle a wire-form request.
    pub async fn handle(&self, request: ChannelRequest) -> Envelope<Value> {
        self.call(&request.op, request.payload).await
    }

    /// Register a listener for host → caller pushes on `channel`.
    pub fn subscribe<F>(&self, channel: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.bus.subscribe(channel, listener)
    }

    /// Push `payload` to every listener on `channel`.
    pub fn publish(&self, channel: &str, payload: &Value) -> usize {
        self.bus.publish(channel, payload)
    }
}
