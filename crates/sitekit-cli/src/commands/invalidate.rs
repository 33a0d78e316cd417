// Evict cached responses of a resource family

use sitekit_api::cache_prefix;
use tracing::debug;

use super::Command;
use crate::{
    context::AppContext,
    error::{CliError, CliResult},
    output::OutputStyle,
};

pub struct InvalidateCommand {
    pub kind: String,
    pub identifier: Option<String>,
    pub datapoint: Option<String>,
}

impl InvalidateCommand {
    pub fn new(kind: impl Into<String>, identifier: Option<String>, datapoint: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            identifier,
            datapoint,
        }
    }

    /// Returns the number of evicted responses
    pub async fn run(&self, ctx: &AppContext) -> CliResult<usize> {
        if self.datapoint.is_some() && self.identifier.is_none() {
            return Err(CliError::InvalidArgument {
                message: "a datapoint requires an identifier".to_string(),
            });
        }

        let evicted = ctx
            .client
            .invalidate_cache(
                &self.kind,
                self.identifier.as_deref(),
                self.datapoint.as_deref(),
            )
            .await;

        let stats = ctx.client.cache().stats();
        debug!(
            evicted,
            invalidations = stats.invalidations,
            entries = stats.entry_count,
            hit_rate = stats.hit_rate(),
            "Cache invalidated"
        );
        Ok(evicted)
    }
}

#[async_trait::async_trait]
impl Command for InvalidateCommand {
    async fn execute(&self, ctx: &AppContext) -> CliResult<()> {
        let evicted = self.run(ctx).await?;
        let prefix = cache_prefix(
            &self.kind,
            self.identifier.as_deref(),
            self.datapoint.as_deref(),
        );
        println!(
            "{}",
            OutputStyle::default().success(&format!(
                "Invalidated {} cached response(s) under {}",
                evicted, prefix
            ))
        );
        Ok(())
    }
}
