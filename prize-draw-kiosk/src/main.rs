mod report;
mod simulate;
mod state;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use prize_draw_core::admin::{
    parse_name_list, parse_params, parse_stock_delta, parse_weights, split_assignments,
};
use prize_draw_core::{DrawSession, KioskFlow, visits_from_json};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use report::{DrawReport, OddsReport, ReportFormat, StatusReport};
use simulate::{SimulationConfig, run_simulation};

#[derive(Debug, Parser)]
#[command(name = "prize-draw-kiosk", version)]
#[command(about = "Operator console for the event prize draw - stock, odds, draws and simulation")]
struct Cli {
    /// Directory holding the persisted session records
    #[arg(long, global = true, default_value = "kiosk-state")]
    state_dir: PathBuf,

    /// Optional JSON file with initial stock, weights and boost settings
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Output report format
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Console)]
    format: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where the visitor's visit count comes from.
#[derive(Debug, Clone, Args)]
struct VisitArgs {
    /// Visits since the visitor's last prize
    #[arg(long, conflicts_with = "history")]
    visits: Option<u32>,

    /// Visit history JSON as returned by the stamp service
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show displayed stock, counters, weights and boost settings
    Status,
    /// Show the odds table for a visitor
    Probs(VisitArgs),
    /// Draw a prize for an eligible visitor
    Draw {
        #[command(flatten)]
        visits: VisitArgs,
        /// Seed for a reproducible draw (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Adjust base stock, e.g. `大当たり=2 はずれ=-10`
    AddStock {
        #[arg(required = true, value_name = "PRIZE=DELTA")]
        deltas: Vec<String>,
    },
    /// Update the visit threshold and boost curve
    Params {
        /// Visits required before drawing
        #[arg(long = "n", value_name = "N")]
        threshold: Option<String>,
        /// Boost growth per visit beyond N
        #[arg(long)]
        beta: Option<String>,
        /// Boost ceiling
        #[arg(long)]
        mcap: Option<String>,
    },
    /// Update per-prize weights, e.g. `大当たり=1.5`
    Weights {
        #[arg(required = true, value_name = "PRIZE=WEIGHT")]
        weights: Vec<String>,
    },
    /// Replace boosted and non-winning prize lists (comma-separated)
    Targets {
        #[arg(long)]
        gain: String,
        #[arg(long, default_value = "")]
        lose: String,
    },
    /// Clear draw counters and restore the initial stock
    Reset {
        /// Confirm the irreversible reset
        #[arg(long)]
        yes: bool,
    },
    /// Count visits since the last prize from a history file
    Visits {
        #[arg(long)]
        history: PathBuf,
    },
    /// Simulate many draws against the current stock without consuming it
    Simulate {
        #[command(flatten)]
        visits: VisitArgs,
        /// Number of simulated draws
        #[arg(long, default_value_t = 10_000)]
        draws: u32,
        #[arg(long, default_value_t = 1337)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut output_target = OutputTarget::new(cli.output.clone())?;
    run(&cli, output_target.writer())?;
    output_target.flush_inner()?;
    Ok(())
}

fn read_history(path: &Path) -> Result<u32> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history {}", path.display()))?;
    Ok(visits_from_json(&raw))
}

impl VisitArgs {
    fn resolve(&self) -> Result<u32> {
        match (&self.history, self.visits) {
            (Some(path), _) => read_history(path),
            (None, Some(visits)) => Ok(visits),
            (None, None) => Ok(0),
        }
    }
}

fn open_session(cli: &Cli) -> Result<DrawSession> {
    let options = state::load_options(cli.options.as_deref())?;
    log::debug!("opening session in {}", cli.state_dir.display());
    Ok(DrawSession::open(options, state::open_stores(&cli.state_dir)))
}

/// Run an admin edit through the kiosk flow.
fn with_admin(session: DrawSession, edit: impl FnOnce(&mut DrawSession)) -> Result<DrawSession> {
    let mut flow = KioskFlow::new(session);
    flow.enter_admin()?;
    edit(flow.admin()?);
    flow.exit_admin()?;
    Ok(flow.into_session())
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let session = open_session(cli)?;
    let format = cli.format;

    match &cli.command {
        Command::Status => {
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Probs(visits) => {
            let visits = visits.resolve()?;
            report::write_odds(out, format, &OddsReport::from_session(&session, visits))?;
        }
        Command::Draw { visits, seed } => {
            let visits = visits.resolve()?;
            let seed = seed.unwrap_or_else(rand::random);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mut flow = KioskFlow::new(session);
            flow.start_draw(visits, &mut rng)?;
            let prize = flow.reveal()?;
            flow.acknowledge()?;
            let session = flow.into_session();
            let rank = session.prize_rank(&prize);
            let draw = DrawReport {
                winning: rank.is_some(),
                rank,
                prize,
                visits,
                seed,
                drawn_at: chrono::Utc::now().to_rfc3339(),
                total_stock: session.total_stock(),
            };
            report::write_draw(out, format, &draw)?;
        }
        Command::AddStock { deltas } => {
            let delta = parse_stock_delta(split_assignments(deltas));
            if delta.is_empty() {
                bail!("no valid PRIZE=DELTA pairs given");
            }
            let session = with_admin(session, |session| session.add_stock(&delta))?;
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Params {
            threshold,
            beta,
            mcap,
        } => {
            let field = |value: &Option<String>| value.clone().unwrap_or_default();
            let patch = parse_params(&field(threshold), &field(beta), &field(mcap));
            if patch.is_empty() {
                bail!("no valid parameter given");
            }
            let session = with_admin(session, |session| session.update_params(patch))?;
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Weights { weights } => {
            let next = parse_weights(session.weights(), split_assignments(weights));
            let session = with_admin(session, |session| session.update_weights(next))?;
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Targets { gain, lose } => {
            let (gain, lose) = (parse_name_list(gain), parse_name_list(lose));
            let session = with_admin(session, |session| session.update_targets(gain, lose))?;
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset clears every draw counter; pass --yes to confirm");
            }
            let session = with_admin(session, DrawSession::reset_all)?;
            if format == ReportFormat::Console {
                writeln!(out, "{}", "♻️  Session reset to initial stock".yellow())?;
            }
            report::write_status(out, format, &StatusReport::from_session(&session))?;
        }
        Command::Visits { history } => {
            let visits = read_history(history)?;
            report::write_eligibility(out, format, visits, session.eligibility(visits))?;
        }
        Command::Simulate {
            visits,
            draws,
            seed,
        } => {
            let config = SimulationConfig {
                draws: *draws,
                visits: visits.resolve()?,
                seed: *seed,
            };
            report::write_simulation(out, format, &run_simulation(&session, config))?;
        }
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
