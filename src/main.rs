//! fruitclash — headless autoplay for the tile-matching combat engine.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fruitclash::app::{App, Format, Outcome, Session};
use fruitclash::combat::Perk;
use fruitclash::{GameRng, Rules};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let rules = Rules::load(args.rules.as_deref())
        .with_context(|| format!("loading rules from {:?}", args.rules))?;
    let rng = match args.seed {
        Some(seed) => GameRng::seeded(seed),
        None => GameRng::from_entropy(),
    };
    let session = Session {
        floors: args.floors,
        max_actions: args.max_actions,
        perk: args.perk.map(Perk::from),
        format: args.format.into(),
    };
    info!(seed = ?args.seed, floors = session.floors, "starting autoplay");

    let stdout = std::io::stdout().lock();
    let mut app = App::new(rules, session, rng, stdout);
    let report = app.run()?;
    if let Outcome::Defeated { floor } = report.outcome {
        info!("defeated on floor {}", floor);
    }
    Ok(())
}

/// Stderr logging. `--log-level` wins over `RUST_LOG`; the default is `info`.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Autoplay a match-3 combat run and stream every cascade step.
#[derive(Debug, Parser)]
#[command(
    name = "fruitclash",
    version,
    about = "Headless match-3 combat: plays greedy swaps and skills floor by floor, printing every cascade pass.",
    long_about = "fruitclash drives the cascade-resolution engine without a UI.\n\n\
        Each turn it fires a full skill if one is ready, otherwise the swap that lines up the most \
        tiles. Every clear pass, gravity settle and turn summary is written to stdout, as text or \
        as JSON lines. Logs go to stderr.\n\n\
        Use --rules to override balance numbers from a `key = value` file."
)]
pub struct Args {
    /// Seed for the random source. A fixed seed replays the same run.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// Stop after clearing this many floors.
    #[arg(short, long, default_value = "3", value_name = "N")]
    pub floors: u32,

    /// Stop after this many player actions.
    #[arg(long, default_value = "500", value_name = "N")]
    pub max_actions: u32,

    /// Rules file (`key = value` per line). Defaults apply when not set.
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<std::path::PathBuf>,

    /// Perk taken after every victory. Cycles through all perks when not set.
    #[arg(short, long)]
    pub perk: Option<PerkArg>,

    /// Output format for the event stream.
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Log filter, e.g. `debug` or `fruitclash=trace`. Overrides RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PerkArg {
    #[value(alias = "vampirism")]
    Vampire,
    Pyro,
    Tank,
    #[value(alias = "luck")]
    Lucky,
}

impl From<PerkArg> for Perk {
    fn from(arg: PerkArg) -> Self {
        match arg {
            PerkArg::Vampire => Self::Vampire,
            PerkArg::Pyro => Self::Pyro,
            PerkArg::Tank => Self::Tank,
            PerkArg::Lucky => Self::Lucky,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Text,
    #[value(alias = "jsonl")]
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
