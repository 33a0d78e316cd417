// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{
    commands::{settings::SettingsEdits, Command, HtmlCommand, InvalidateCommand, SettingsCommand},
    context::AppContext,
    error::CliResult,
    logging,
};

/// sitekit - inspect a Site Kit enabled WordPress site
#[derive(Parser, Debug)]
#[command(name = "sitekit")]
#[command(bin_name = "sitekit")]
#[command(about = "Read page HTML and module settings through the Site Kit data stores")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: <config dir>/sitekit/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch a front-end page with tag verification enabled
    Html {
        /// Absolute page URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show module settings, or change and submit them
    Settings {
        /// Module slug
        #[arg(value_name = "MODULE")]
        module: String,

        #[arg(long = "publication-id", value_name = "ID")]
        publication_id: Option<String>,

        /// Newline-separated product names
        #[arg(long, value_name = "PRODUCTS")]
        products: Option<String>,

        #[arg(long = "revenue-model", value_name = "MODEL")]
        revenue_model: Option<String>,
    },

    /// Evict cached responses of a resource family
    Invalidate {
        /// Resource type, e.g. `modules` or `core`
        #[arg(value_name = "TYPE")]
        kind: String,

        #[arg(value_name = "IDENTIFIER")]
        identifier: Option<String>,

        #[arg(value_name = "DATAPOINT")]
        datapoint: Option<String>,
    },
}

impl Commands {
    fn handler(&self) -> Box<dyn Command> {
        match self {
            Commands::Html { url } => Box::new(HtmlCommand::new(url.clone())),
            Commands::Settings {
                module,
                publication_id,
                products,
                revenue_model,
            } => Box::new(SettingsCommand::new(
                module.clone(),
                SettingsEdits {
                    publication_id: publication_id.clone(),
                    products: products.clone(),
                    revenue_model: revenue_model.clone(),
                },
            )),
            Commands::Invalidate {
                kind,
                identifier,
                datapoint,
            } => Box::new(InvalidateCommand::new(
                kind.clone(),
                identifier.clone(),
                datapoint.clone(),
            )),
        }
    }
}

/// Route and execute commands
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to the handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();
        let config = AppContext::load(cli.config.clone())?;

        logging::init_logging(cli.verbose, &config.log.level);

        let ctx = AppContext::new(config)?;
        Self::execute(&cli, &ctx).await
    }

    /// Execute a parsed command against `ctx`
    pub async fn execute(cli: &Cli, ctx: &AppContext) -> CliResult<()> {
        cli.command.handler().execute(ctx).await
    }
}
