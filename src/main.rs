use std::str::FromStr;

use anyhow::{Result, bail};
use clap::Parser;

use custom_field_order::{
    cli::{self, RootCommand},
    logging::init_logging,
    settings::Settings,
    types::ParentType,
};

#[derive(Parser, Debug)]
#[command(
    name = "custom-field-order",
    about = "Reorder practice-management custom fields in bulk",
    long_about = "Lists, checks and repositions custom fields through the remote API, one confirmed display order update at a time.",
    version = env!("CUSTOM_FIELD_ORDER_BUILD_VERSION"),
    author
)]
struct Cli {
    #[arg(short, long, global = true, value_name = "matter|contact")]
    parent_type: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: RootCommand,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log = match init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err:#}");
            None
        }
    };

    let cli = Cli::parse();
    let settings = Settings::load();
    let parent_type = resolve_parent_type(cli.parent_type.as_deref(), &settings)?;

    let code = cli::run(&settings, parent_type, cli.command, cli.json, cli.quiet).await;
    if code != 0
        && !cli.json
        && let Some(guard) = log.as_ref()
    {
        eprintln!("log file: {}", guard.path().display());
    }
    // process::exit skips destructors; flush the log writer first.
    drop(log);
    std::process::exit(code);
}

fn resolve_parent_type(raw: Option<&str>, settings: &Settings) -> Result<ParentType> {
    let Some(raw) = raw else {
        return Ok(settings.parent_type());
    };
    match ParentType::from_str(raw) {
        Ok(parent_type) => Ok(parent_type),
        Err(()) => bail!("unknown parent type '{raw}'; expected matter or contact"),
    }
}
