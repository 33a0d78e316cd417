// Command handlers for the sitekit CLI

pub mod html;
pub mod invalidate;
pub mod settings;

pub use html::HtmlCommand;
pub use invalidate::InvalidateCommand;
pub use settings::SettingsCommand;

use crate::{context::AppContext, error::CliResult};

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self, ctx: &AppContext) -> CliResult<()>;
}
