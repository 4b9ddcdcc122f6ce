use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use snafu::ResultExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};
use vessel_core::{Delta, DeltaInbound, error::error::EmitDeltaSnafu};

use crate::error::{
    Result,
    error::{SerializeSnafu, WriteSnafu},
};

/// Hands deltas to the writer task over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Delta>,
}

/// Drains the delta channel and writes each delta as one JSON line.
pub struct DeltaWriter<W> {
    receiver: Receiver<Delta>,
    writer: W,
}

impl ChannelSink {
    pub fn new(sender: Sender<Delta>) -> ChannelSink {
        ChannelSink { sender }
    }
}

#[async_trait]
impl DeltaInbound for ChannelSink {
    async fn emit(&self, delta: Delta) -> vessel_core::Result<()> {
        let context = delta.context.clone();
        self.sender
            .send(delta)
            .await
            .boxed()
            .context(EmitDeltaSnafu { context })
    }
}

impl<W: AsyncWrite + Unpin> DeltaWriter<W> {
    pub fn new(receiver: Receiver<Delta>, writer: W) -> DeltaWriter<W> {
        DeltaWriter { receiver, writer }
    }

    /// Runs until every sender is dropped, returning the underlying writer.
    #[instrument(skip_all, fields(app.written))]
    pub async fn run(mut self) -> Result<W> {
        let mut written = 0u64;

        while let Ok(delta) = self.receiver.recv().await {
            let mut line = serde_json::to_vec(&delta).context(SerializeSnafu)?;
            line.push(b'\n');

            self.writer.write_all(&line).await.context(WriteSnafu)?;
            self.writer.flush().await.context(WriteSnafu)?;
            written += 1;
        }

        debug!("delta channel closed");
        tracing::Span::current().record("app.written", written);

        Ok(self.writer)
    }
}
