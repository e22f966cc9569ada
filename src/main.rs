use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use lcu_autopilot_lib::commands::{
  init_logging, start_lcu_watcher, ChannelPublisher, Credentials, CredentialsStore, LcuApi,
  LcuClient, LcuError, LogFormat, WatcherConfig,
};

/// Auto-accepts League ready checks and reports teammates and enemies.
#[derive(Parser, Debug)]
#[command(name = "lcu-autopilot", author, version, about)]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Increase verbosity (-v info, -vv debug, -vvv trace).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  /// Log line format on stderr.
  #[arg(long, value_enum, default_value = "human", global = true)]
  log_format: LogFormat,

  /// JSON config file; flags below override it.
  #[arg(long, global = true, env = "LCU_AUTOPILOT_CONFIG")]
  config: Option<PathBuf>,

  /// League client API port.
  #[arg(long, global = true, env = "LCU_PORT")]
  port: Option<u16>,

  /// League client remoting token.
  #[arg(long, global = true, env = "LCU_TOKEN", hide_env_values = true)]
  token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the accept and analysis loops, printing events as JSON lines.
  Watch(WatchArgs),

  /// Print the current gameflow phase.
  Phase,

  /// Print recent games for a player.
  History(HistoryArgs),

  /// Print one full game, by id or by position in a player's history.
  Match(MatchArgs),

  /// Print both teams, the clock and recent kills of the running game.
  Live,

  /// Print the logged-in summoner.
  Whoami,
}

#[derive(Args, Debug)]
struct WatchArgs {
  /// Do not accept ready checks.
  #[arg(long)]
  no_accept: bool,

  /// Do not look up teammates and enemies.
  #[arg(long)]
  no_analyze: bool,

  /// Live-client attempts before giving up on enemies.
  #[arg(long)]
  max_enemy_retries: Option<u32>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
  /// Riot ID (`name#tag`) or summoner name.
  #[arg(long)]
  name: String,

  /// Number of games to fetch.
  #[arg(long)]
  count: Option<u32>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "name"])))]
struct MatchArgs {
  /// Game id.
  #[arg(long)]
  id: Option<i64>,

  /// Riot ID (`name#tag`) or summoner name whose history is searched.
  #[arg(long)]
  name: Option<String>,

  /// Position in that history, 0 = most recent.
  #[arg(long, default_value_t = 0, requires = "name")]
  index: usize,
}

#[tokio::main]
async fn main() -> Result<(), LcuError> {
  let cli = Cli::parse();
  init_logging(cli.log_format, cli.verbose);

  let mut config = WatcherConfig::load_or_default(cli.config.as_deref())?;
  if let Command::Watch(args) = &cli.command {
    if args.no_accept {
      config.accept_enabled = false;
    }
    if args.no_analyze {
      config.analyze_enabled = false;
    }
    if let Some(retries) = args.max_enemy_retries {
      config.max_enemy_retries = retries;
    }
  }
  config.validate()?;

  let credentials = match (cli.port, cli.token) {
    (Some(port), Some(token)) => CredentialsStore::with_credentials(Credentials { port, token }),
    _ => {
      tracing::warn!("[LCU Watcher] No --port/--token given; requests will fail until the client is known");
      CredentialsStore::new()
    }
  };
  let client = LcuClient::new(&config, credentials)?;

  match cli.command {
    Command::Watch(_) => watch(client, &config).await,
    Command::Phase => {
      let phase = client.read_phase().await?;
      println!("{}", phase);
      Ok(())
    }
    Command::History(args) => {
      let count = args.count.unwrap_or(config.history_count);
      match client.lookup_puuid(&args.name).await? {
        Some(puuid) => print_json(&client.match_history(&puuid, count).await?),
        None => {
          eprintln!("No player found for {}", args.name);
          Ok(())
        }
      }
    }
    Command::Match(args) => {
      let game = match (args.id, args.name) {
        (Some(id), _) => client.match_by_id(id).await?,
        (None, Some(name)) => match client.lookup_puuid(&name).await? {
          Some(puuid) => client.match_at_index(&puuid, args.index).await?,
          None => {
            eprintln!("No player found for {}", name);
            return Ok(());
          }
        },
        (None, None) => None,
      };
      match game {
        Some(game) => print_json(&game),
        None => {
          eprintln!("Match not found");
          Ok(())
        }
      }
    }
    Command::Live => print_json(&client.live_game().await?),
    Command::Whoami => print_json(&client.current_summoner().await?),
  }
}

async fn watch(client: LcuClient, config: &WatcherConfig) -> Result<(), LcuError> {
  let (publisher, mut events) = ChannelPublisher::new();
  let handles = start_lcu_watcher(Arc::new(client), Arc::new(publisher), config);

  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  let result = loop {
    tokio::select! {
      event = events.recv() => match event {
        Some(event) => match serde_json::to_string(&event) {
          Ok(line) => println!("{}", line),
          Err(e) => tracing::warn!("[LCU Watcher] Could not serialize {:?}: {}", event, e),
        },
        None => break Ok(()),
      },
      signal = &mut ctrl_c => {
        tracing::info!("[LCU Watcher] Shutting down");
        break signal.map_err(LcuError::from);
      }
    }
  };

  handles.stop().await;
  result
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LcuError> {
  let text = serde_json::to_string_pretty(value)?;
  println!("{}", text);
  Ok(())
}
