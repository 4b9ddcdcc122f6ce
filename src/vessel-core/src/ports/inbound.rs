use async_trait::async_trait;

use crate::{Delta, Result};

#[async_trait]
pub trait DeltaInbound: Send + Sync {
    async fn emit(&self, delta: Delta) -> Result<()>;
}
