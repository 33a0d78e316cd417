// sitekit CLI entry point

use sitekit_cli::{output, CommandRouter};

#[tokio::main]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        output::print_error(&e.user_message());
        tracing::debug!(details = %e.technical_details(), "Command failed");
        std::process::exit(1);
    }
}
