//! Command line front end for round-robin and knockout tournaments.
//!
//! Tournaments live as one JSON document per sport in the data directory.

mod commands;
mod config;

use anyhow::{Error, bail};
use log::{info, warn};
use pico_args::Arguments;
use scorekeeper::{JsonFileStore, TournamentManager, TournamentStore};
use std::path::PathBuf;

use config::CliConfig;

const HELP: &str = "\
Keep score of round-robin tournaments and their knockout brackets

USAGE:
  sk_cli <COMMAND> [OPTIONS] [ARGS]

COMMANDS:
  create NAME --teams A,B,C   Create a tournament and its full schedule
      --engine E              goals | football | shootout | sets | cricket  [default: goals]
      --best-of N             Sets per match (sets engine)                  [default: 3]
      --points N              Points per set (sets engine)                  [default: 25]
      --overs N               Overs per innings (cricket engine)            [default: 20]
      --advance N             Teams entering the knockouts (2 or 4)
      --third-place           Play a third-place match (needs --advance 4)
      --winner-mode M         table-topper | knockouts
  list                        List tournaments for the sport
  show ID [--json]            Show fixtures, results and the bracket
  standings ID                Show the group table
  score ID MATCH S1 S2        Record a goals result  [--shootout TEAM]
  sets ID MATCH 25-21,19-25   Record the sets played so far
  innings ID MATCH R/W/B R/W/B
                              Record both innings  [--no-result]
  reset ID MATCH              Clear a result
  live ID MATCH               Score a match point by point
      --target N              First to N points wins
      --time-limit SECS       Finish after SECS of play
      --no-draws              Refuse to finish level; level at the time limit plays on to a golden point
      --floor-zero            Never let a score drop below zero

  IDs may be shortened to any unique prefix. Knockout matches can also be
  named by round: semi-1, semi-2, final, third-place.

OPTIONS:
  --data-dir   DIR      Data directory  [default: env SCOREKEEPER_DATA_DIR or ./scorekeeper-data]
  --sport      KEY      Sport key       [default: env SCOREKEEPER_SPORT]

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  SCOREKEEPER_DATA_DIR              Data directory
  SCOREKEEPER_SPORT                 Sport key (e.g. volleyball)
  SCOREKEEPER_DEBOUNCE_MS           Ignore repeated live inputs closer than this  [default: 150]
  SCOREKEEPER_HISTORY_LIMIT         Undo steps kept in a live session             [default: 100]
  SCOREKEEPER_DRAFT_HISTORY_LIMIT   Undo steps kept in a saved draft              [default: 50]
  SCOREKEEPER_COMPLETION_DELAY_MS   Pause before saving an automatic finish       [default: 600]
  RUST_LOG                          Log filter (e.g. info, scorekeeper=debug)
  (A .env file in the working directory is read first)
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let Some(command) = pargs.subcommand()? else {
        print!("{HELP}");
        std::process::exit(2);
    };
    let data_dir: Option<PathBuf> = pargs.opt_value_from_str("--data-dir")?;
    let sport: Option<String> = pargs.opt_value_from_str("--sport")?;

    env_logger::builder().format_target(false).init();

    let config = CliConfig::from_env(data_dir, sport)?;
    info!(
        "Using {} tournaments in {}",
        config.sport,
        config.data_dir.display()
    );

    let store = TournamentStore::new(JsonFileStore::open(&config.data_dir)?);
    let mut manager =
        TournamentManager::load(store, config.sport.as_str())?.with_session_config(config.session);

    match command.as_str() {
        "create" => commands::create(&mut manager, pargs),
        "list" => {
            let leftover = pargs.finish();
            if !leftover.is_empty() {
                warn!("Ignoring arguments: {leftover:?}");
            }
            commands::list(&manager)
        }
        "show" => commands::show(&manager, pargs),
        "standings" => commands::standings(&manager, pargs),
        "score" => commands::score(&mut manager, pargs),
        "sets" => commands::sets(&mut manager, pargs),
        "innings" => commands::innings(&mut manager, pargs),
        "reset" => commands::reset(&mut manager, pargs),
        "live" => commands::live(&mut manager, pargs),
        other => bail!("Unknown command {other:?}. Run sk_cli --help for usage."),
    }
}
