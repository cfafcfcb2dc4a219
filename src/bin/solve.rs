//! Lambda Lifter Solver CLI
//!
//! Reads a map file, runs a pluggable planner against an iteration or
//! wall-clock budget, and reports the best action string found.

use std::io::IsTerminal;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use lambda_lifter::cave::action;
use lambda_lifter::cave::reader;
use lambda_lifter::logging;
use lambda_lifter::report;
use lambda_lifter::search::driver::Budget;
use lambda_lifter::search::driver::Driver;
use lambda_lifter::search::driver::Strategy;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// path to a Lambda Lifter map file
    map: PathBuf,

    /// hard cap on planner iterations; unset or negative means unlimited
    #[arg(long)]
    iterations: Option<i64>,

    /// wall-clock budget in seconds; 0 or unset means no deadline
    #[arg(long = "time-based", value_name = "SECS")]
    time_based: Option<u64>,

    /// search strategy: weighted | tree | ucb1 | beam[:WIDTH] | dive
    #[arg(long, default_value = "tree")]
    name: String,

    /// an action string pre-applied to the root world before search begins
    #[arg(long = "initial-path", default_value = "")]
    initial_path: String,

    /// optional scoreboard endpoint to POST the result to
    #[arg(long = "report-url")]
    report_url: Option<String>,

    /// bot name reported alongside a scoreboard submission
    #[arg(long, default_value = "lambda-lifter")]
    team: String,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut text = String::new();
    std::fs::File::open(&cli.map)
        .map_err(|err| anyhow::anyhow!("opening {}: {err}", cli.map.display()))?
        .read_to_string(&mut text)?;
    let world = reader::read_world(&text)?;
    log::info!("parsed map {} ({}x{})", cli.map.display(), world.grid().width(), world.grid().height());

    let strategy: Strategy = cli
        .name
        .parse()
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    let (initial_path, bad) = action::parse_path(&cli.initial_path);
    if let Some(bad) = bad {
        log::warn!("ignoring initial-path characters from {bad:?} onward");
    }

    let budget = match (cli.iterations, cli.time_based) {
        (Some(n), Some(secs)) if n >= 0 && secs > 0 => Budget {
            iterations: Some(n as u64),
            deadline: Some(std::time::Instant::now() + Duration::from_secs(secs)),
        },
        (Some(n), _) if n >= 0 => Budget::iterations(n as u64),
        (_, Some(secs)) if secs > 0 => Budget::time(Duration::from_secs(secs)),
        _ => Budget::default(),
    };

    let mut driver = Driver::new(world, strategy, &initial_path, budget);
    logging::install_shutdown_handler(driver.shutdown_handle());

    let interactive = std::io::stdout().is_terminal();
    let best = driver.run(|best| {
        if interactive {
            log::info!("new best score {}", best.score());
        }
    });

    let path = lambda_lifter::search::driver::report_path(&best);
    if let Some(url) = &cli.report_url {
        report::post_score(
            url,
            &cli.map.display().to_string(),
            &cli.team,
            best.num_moves(),
            best.score(),
            &format!("{:?}", best.state()),
        );
    }

    if interactive {
        println!("{path}");
        println!(
            "score {} | moves {} | lambdas {} | state {:?}",
            best.score().to_string().green(),
            best.num_moves(),
            best.lambdas_collected(),
            best.state(),
        );
    } else {
        println!("{path}");
    }
    Ok(())
}
