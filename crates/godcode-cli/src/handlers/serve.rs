//! `godcode serve` - newline-delimited JSON over stdio.
//!
//! Each input line is a `ChannelRequest`. Requests run concurrently; each
//! produces exactly one response line carrying the request's `id`. Events
//! published on the bus are written as `{"event": .., "payload": ..}` lines
//! on the same stream. Logs never touch stdout.

use anyhow::Result;
use godcode_core::Envelope;
use godcode_gateway::events::names;
use godcode_gateway::{ChannelRequest, MessageChannel, PushEvent, Subscription};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::bootstrap::CliContext;

/// One response line.
#[derive(Debug, Serialize)]
struct ResponseFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(flatten)]
    envelope: Envelope<Value>,
}

/// Execute the serve command on the process's stdin/stdout.
///
/// Ctrl-C shuts the gateway down, which cancels every in-flight call.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    info!("Serving requests on stdin");
    let served = serve(ctx.channel.clone(), tokio::io::stdin(), tokio::io::stdout());

    tokio::select! {
        result = served => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            ctx.gateway().shutdown();
            Ok(())
        }
    }
}

/// Serve requests read from `input`, writing responses and events to `output`.
///
/// Returns once `input` reaches EOF and every accepted request has answered.
pub async fn serve<R, W>(channel: MessageChannel, input: R, output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_lines(rx, output));

    let subscriptions: Vec<Subscription> = names::ALL
        .iter()
        .map(|name| forward_events(&channel, name, tx.clone()))
        .collect();

    let mut in_flight = JoinSet::new();
    let mut lines = BufReader::new(input).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ChannelRequest>(line) {
            Ok(request) => {
                let channel = channel.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let id = request.id.clone();
                    let envelope = channel.handle(request).await;
                    send_frame(&tx, &ResponseFrame { id, envelope });
                });
            }
            Err(e) => {
                warn!(error = %e, "Malformed request line");
                let envelope = Envelope::err(format!("malformed request: {e}"));
                send_frame(&tx, &ResponseFrame { id: None, envelope });
            }
        }
    }

    debug!(pending = in_flight.len(), "Input closed, draining requests");
    while in_flight.join_next().await.is_some() {}

    for subscription in subscriptions {
        subscription.dispose();
    }
    drop(tx);

    writer.await??;
    Ok(())
}

fn forward_events(
    channel: &MessageChannel,
    name: &str,
    tx: mpsc::UnboundedSender<String>,
) -> Subscription {
    let event = name.to_string();
    channel.subscribe(name, move |payload| {
        let frame = PushEvent {
            event: event.clone(),
            payload: payload.clone(),
        };
        send_frame(&tx, &frame);
    })
}

fn send_frame<T: Serialize>(tx: &mpsc::UnboundedSender<String>, frame: &T) {
    match serde_json::to_string(frame) {
        // The receiver only goes away after every sender is done.
        Ok(line) => {
            let _ = tx.send(line);
        }
        Err(e) => warn!(error = %e, "Failed to serialize frame"),
    }
}

async fn write_lines<W>(mut rx: mpsc::UnboundedReceiver<String>, mut output: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
