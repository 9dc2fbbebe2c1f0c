mod cmd;
mod config;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::{actor::Session, frame::FrameSubcommand};
use config::{ActorctlConfig, StoreOverrides};

#[derive(Parser)]
#[command(
    name = "actorctl",
    about = "Drive a leader-elected actor orchestrator: find the leader, start, stop, watch and invoke actors",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML config file (store, client, limits, invoke_endpoint)
    #[arg(long, global = true, env = "ACTORCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Talk to this leader address instead of reading the lease from the store
    #[arg(long, global = true, env = "ACTORCTL_LEADER")]
    leader: Option<String>,

    #[command(flatten)]
    store: StoreOverrides,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the leader answers
    Ping,

    /// Print the current leader address
    Leader,

    /// Look up a deployment id by name
    Deployment { name: String },

    /// List the actors of a deployment
    List {
        /// Deployment id or name
        deployment: String,
    },

    /// Start an actor
    Start {
        /// Deployment id or name
        deployment: String,
        /// CPU share to reserve
        #[arg(long, default_value = "1")]
        cpus: f32,
        /// Memory to reserve, in MiB
        #[arg(long, default_value = "128")]
        mem: f32,
        /// Opaque argument string handed to the actor
        #[arg(long, default_value = "")]
        args: String,
    },

    /// Show one actor
    Get { action_id: i64 },

    /// Stop an actor
    Stop { action_id: i64 },

    /// Wait until an actor is running
    Wait {
        action_id: i64,
        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Keep waiting through stopped/missing/unsatisfiable states
        #[arg(long)]
        running_only: bool,
    },

    /// Send arguments to a running actor's invoke endpoint
    Invoke {
        action_id: i64,
        args: Vec<String>,
    },

    /// Invoke a function through the invocation gateway
    Call {
        function_id: i64,
        args: Vec<String>,
        /// Gateway base URL (default: invoke_endpoint from the config)
        #[arg(long, env = "ACTORCTL_INVOKE_ENDPOINT")]
        endpoint: Option<String>,
        /// Interrupt the invocation after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Encode or decode multi-blob frames offline
    Frame {
        #[command(subcommand)]
        subcommand: FrameSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ActorctlConfig::load(cli.config.as_deref())?;
    cli.store.apply(&mut config.store);
    let json = cli.json;

    // Nothing connects until a cluster command runs.
    let session = Session {
        config,
        leader: cli.leader,
    };

    match cli.command {
        Commands::Ping => cmd::actor::ping(&session, json),
        Commands::Leader => cmd::actor::leader(&session, json),
        Commands::Deployment { name } => cmd::actor::deployment(&session, &name, json),
        Commands::List { deployment } => cmd::actor::list(&session, &deployment, json),
        Commands::Start {
            deployment,
            cpus,
            mem,
            args,
        } => cmd::actor::start(&session, &deployment, cpus, mem, &args, json),
        Commands::Get { action_id } => cmd::actor::get(&session, action_id, json),
        Commands::Stop { action_id } => cmd::actor::stop(&session, action_id, json),
        Commands::Wait {
            action_id,
            timeout_secs,
            running_only,
        } => cmd::actor::wait(&session, action_id, timeout_secs, running_only, json),
        Commands::Invoke { action_id, args } => {
            cmd::actor::invoke(&session, action_id, &args, json)
        }
        Commands::Call {
            function_id,
            args,
            endpoint,
            timeout_secs,
        } => cmd::call::run(&session.config, endpoint, function_id, &args, timeout_secs, json),
        Commands::Frame { subcommand } => cmd::frame::run(&session.config.limits, subcommand, json),
    }
}
