//! Append-only JSON-lines log producer.
//!
//! `send` pushes onto an unbounded channel; a background task owns the file
//! and appends one record per line, flushing after each drained batch. The
//! task stops once every sender is dropped and the queue is empty.
//!
//! Records are the serde form of [`CanonicalMessage`]; the source address is
//! written as its raw octets (4 or 16 numbers).

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::CanonicalMessage;
use crate::producer::{Producer, ProducerError};

/// Producer writing to a local append-only file.
#[derive(Debug, Clone)]
pub struct LogProducer {
    tx: mpsc::UnboundedSender<CanonicalMessage>,
}

impl LogProducer {
    /// Open (or create) `path` for appending and start the writer task.
    pub async fn open(path: &Path) -> Result<(Self, JoinHandle<()>), ProducerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| ProducerError::Open {
                path: path.display().to_string(),
                source,
            })?;

        tracing::info!(path = %path.display(), "Backing log opened");
        Ok(Self::spawn(BufWriter::new(file)))
    }

    /// Start the writer task over an arbitrary sink.
    pub fn spawn<W>(writer: W) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(append_loop(writer, rx));
        (Self { tx }, handle)
    }
}

impl Producer for LogProducer {
    fn send(&self, message: CanonicalMessage) {
        if let Err(mpsc::error::SendError(message)) = self.tx.send(message) {
            tracing::error!(id = %message.id(), "Backing log writer stopped, message dropped");
        }
    }
}

async fn append_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<CanonicalMessage>)
where
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;

    while let Some(message) = rx.recv().await {
        let mut next = Some(message);
        while let Some(message) = next {
            match append(&mut writer, &message).await {
                Ok(()) => written += 1,
                Err(e) => tracing::error!(error = %e, "Failed to append message"),
            }
            next = rx.try_recv().ok();
        }

        if let Err(e) = writer.flush().await {
            tracing::error!(error = %e, "Failed to flush backing log");
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::error!(error = %e, "Failed to close backing log");
    }
    tracing::info!(messages = written, "Backing log writer stopped");
}

async fn append<W>(writer: &mut W, message: &CanonicalMessage) -> Result<(), ProducerError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(message).map_err(|source| ProducerError::Encode {
        id: message.id().to_string(),
        source,
    })?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageTemplate, Operation};
    use bytes::Bytes;
    use std::net::{IpAddr, Ipv4Addr};

    fn template() -> MessageTemplate {
        MessageTemplate::new("ns", None, vec![], IpAddr::V4(Ipv4Addr::LOCALHOST), 7)
    }

    #[tokio::test]
    async fn appends_one_line_per_message_in_order() {
        let path = std::env::temp_dir().join(format!("submission-log-{}.jsonl", uuid::Uuid::new_v4()));
        let (producer, handle) = LogProducer::open(&path).await.unwrap();

        let template = template();
        producer.send(template.store("a", Bytes::from_static(b"hello")));
        producer.send(template.delete("b"));
        producer.send(template.delete("c"));
        drop(producer);
        handle.await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let messages: Vec<CanonicalMessage> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let _ = tokio::fs::remove_file(&path).await;

        let ids: Vec<_> = messages.iter().map(|m| m.id()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(messages[0].operation(), Operation::Store);
        assert_eq!(messages[0].payload().unwrap().as_ref(), b"hello");
        assert_eq!(messages[2].operation(), Operation::Delete);
    }

    #[tokio::test]
    async fn open_reports_bad_path() {
        let err = LogProducer::open(Path::new("/nonexistent-dir/log.jsonl")).await.unwrap_err();
        assert!(matches!(err, ProducerError::Open { .. }));
    }

    #[tokio::test]
    async fn send_after_writer_stopped_does_not_panic() {
        let (producer, handle) = LogProducer::spawn(tokio::io::sink());
        handle.abort();
        let _ = handle.await;
        producer.send(template().delete("x"));
    }
}
