//! `notion-bootstrap run` command - import the CSV files into Notion

use console::style;
use dialoguer::{theme::ColorfulTheme, Password};
use miette::Result;
use std::io::{self, Write};

use crate::cli::{GlobalOpts, InputArgs};
use crate::core::collection::Collection;
use crate::core::config::{resolve_token, Config, TokenSource, TOKEN_ENV};
use crate::core::error::ImportError;
use crate::core::executor::{Executor, Mode};
use crate::core::lookup::DataSources;
use crate::core::planner::Planner;
use crate::core::sheet::SheetSet;
use crate::notion::{NotionClient, DEFAULT_API_BASE, DEFAULT_NOTION_VERSION};

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Create records (without this flag nothing is written)
    #[arg(long)]
    pub apply: bool,

    /// Notion integration token (default: $NOTION_TOKEN, then the config file)
    #[arg(long)]
    pub token: Option<String>,

    /// Fail instead of asking for a token interactively
    #[arg(long)]
    pub no_prompt: bool,

    #[command(flatten)]
    pub input: InputArgs,
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let mode = if args.apply { Mode::Apply } else { Mode::DryRun };

    // Local input problems are reported before any network traffic
    let sheets = SheetSet::load(&args.input.paths(&config))?;
    let token = obtain_token(&args, &config)?;

    let client = NotionClient::new(token, config.timeout())
        .map_err(ImportError::from)?
        .with_base_url(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))
        .with_version(
            config
                .notion_version
                .as_deref()
                .unwrap_or(DEFAULT_NOTION_VERSION),
        );

    let mut out = io::stdout().lock();
    if !global.quiet {
        writeln!(
            out,
            "{} Importing into Notion{}",
            style("→").blue(),
            if mode == Mode::DryRun {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        )
        .map_err(ImportError::from)?;
        writeln!(out).map_err(ImportError::from)?;
    }

    let sources = DataSources::discover(&client)?;
    let plan = Planner::new(&client, &sources).plan(&sheets)?;
    for collection in Collection::IMPORT_ORDER {
        let counts = plan.counts(collection);
        tracing::debug!(
            collection = collection.title(),
            create = counts.create,
            skip = counts.skip,
            error = counts.error,
            "planned"
        );
    }
    if plan.has_errors() {
        tracing::warn!(errors = plan.totals().error, "some rows cannot be imported");
    }

    let report = Executor::new(mode, &client, &sources)
        .with_delay(config.request_delay())
        .with_quiet(global.quiet)
        .execute(&plan, &mut out)?;

    report.into_result()?;
    Ok(())
}

fn obtain_token(args: &RunArgs, config: &Config) -> Result<String, ImportError> {
    let interactive = !args.no_prompt && console::user_attended_stderr();
    let prompt = interactive.then_some(|| {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Notion integration token")
            .interact()
            .ok()
    });

    let (token, source) = resolve_token(
        [
            (TokenSource::Flag, args.token.clone()),
            (TokenSource::Env, std::env::var(TOKEN_ENV).ok()),
            (TokenSource::ConfigFile, config.token.clone()),
        ],
        prompt,
    )?;
    tracing::debug!(%source, "using token");
    Ok(token)
}
