//! labkit binary: sensor dashboard, persona chat and postal lookups.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use labkit::chat::gemini::{DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_MODEL};
use labkit::chat::persona::DEFAULT_CATCHPHRASE_PROBABILITY;
use labkit::postal::client::DEFAULT_BASE_URL as POSTAL_BASE_URL;
use labkit::postal::BatchEntry;
use labkit::retry::{DEFAULT_BASE_WAIT, DEFAULT_MAX_ATTEMPTS};
use labkit::sensor::simulator::DEFAULT_STEP_C;
use labkit::sensor::DEFAULT_HISTORY_CAPACITY;
use labkit::{
    start_web_server, AgentReply, ChatAgent, ChatConfig, DashboardSnapshot, GeminiClient, LookupOutcome,
    Persona, PollerConfig, PostalClient, PostalConfig, RetryPolicy, SensorPoller, SensorSimulator,
    SimulatorConfig, WebConfig, DEFAULT_INTERVAL_MS, DEFAULT_WEB_PORT,
};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "labkit")]
#[command(about = "Sensor dashboard, persona chat and postal-code lookups")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Austin Couch")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Sensor polling interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Number of readings kept in the sensor history
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history: usize,

    /// Seed for the simulator noise (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the simulator and the web dashboard (default)
    Serve(ServeArgs),

    /// Print simulator readings to the console
    Watch(WatchArgs),

    /// Chat with the persona interactively
    Chat(GeminiArgs),

    /// Ask the persona a single question
    Ask(AskArgs),

    /// Look up postal codes
    Lookup(LookupArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Static files directory (optional)
    #[arg(long)]
    static_dir: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,

    /// Celsius applied by the heat and cool controls
    #[arg(long, default_value_t = DEFAULT_STEP_C)]
    step: f64,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            static_dir: None,
            no_cors: false,
            max_connections: 100,
            step: DEFAULT_STEP_C,
        }
    }
}

#[derive(Args)]
struct WatchArgs {
    /// Stop after this many readings
    #[arg(short, long)]
    ticks: Option<u64>,
}

#[derive(Args)]
struct GeminiArgs {
    /// API key for the generative-text service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Service base URL
    #[arg(long, default_value = GEMINI_BASE_URL)]
    base_url: String,

    /// Attempts per message on quota errors
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    attempts: u32,

    /// Base wait between attempts in seconds
    #[arg(long, default_value_t = DEFAULT_BASE_WAIT.as_secs())]
    wait: u64,
}

#[derive(Args)]
struct AskArgs {
    /// The question to ask
    #[arg(required = true)]
    question: Vec<String>,

    #[command(flatten)]
    gemini: GeminiArgs,
}

#[derive(Args)]
struct LookupArgs {
    /// Postal codes, with or without punctuation
    #[arg(required = true)]
    codes: Vec<String>,

    /// API token for the lookup service
    #[arg(long, env = "CEP_ABERTO_TOKEN", hide_env_values = true)]
    token: String,

    /// Service base URL
    #[arg(long, default_value = POSTAL_BASE_URL)]
    base_url: String,

    /// Seconds to wait between lookups
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Retry rate-limited lookups with linear backoff
    #[arg(long)]
    retry: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => {
            print_banner();
            serve_command(&cli, args).await?;
        }
        Some(Commands::Watch(args)) => {
            print_banner();
            watch_command(&cli, args).await?;
        }
        Some(Commands::Chat(args)) => chat_command(args).await?,
        Some(Commands::Ask(args)) => ask_command(args).await?,
        Some(Commands::Lookup(args)) => lookup_command(args).await?,
        None => {
            print_banner();
            serve_command(&cli, &ServeArgs::default()).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter = log_filter(log_level(cli), std::env::var(EnvFilter::DEFAULT_ENV).ok());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")?;

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` directives when given, otherwise everything at `level`.
fn log_filter(level: Level, directives: Option<String>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives.unwrap_or_default())
}

fn print_banner() {
    println!("🌡️  labkit - sensor simulator");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn spawn_poller(cli: &Cli) -> (labkit::PollerHandle, labkit::SensorControls) {
    let config = SimulatorConfig::default();
    let simulator = match cli.seed {
        Some(seed) => SensorSimulator::seeded(config, seed),
        None => SensorSimulator::new(config),
    };
    let controls = simulator.controls();

    let poller_config = PollerConfig::default()
        .with_interval(Duration::from_millis(cli.interval))
        .with_history_capacity(cli.history);
    info!(
        "Started sensor polling with {}ms interval, history of {}",
        cli.interval, cli.history
    );
    (SensorPoller::spawn(simulator, poller_config), controls)
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let (poller, controls) = spawn_poller(cli);

    let mut web_config = WebConfig::new(&cli.host, cli.port);
    if let Some(static_dir) = &args.static_dir {
        web_config = web_config.with_static_path(Some(static_dir.clone()));
        info!("Using static files from: {}", static_dir);
    }
    web_config = web_config
        .with_cors(!args.no_cors)
        .with_max_websocket_connections(args.max_connections)
        .with_control_step(args.step);

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - CORS enabled: {}", !args.no_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);

    println!("Dashboard: http://{}/", web_config.bind_address());

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let served = start_web_server(web_config, poller.subscribe(), controls, shutdown).await;
    poller.shutdown().await;
    served?;

    Ok(())
}

async fn watch_command(cli: &Cli, args: &WatchArgs) -> anyhow::Result<()> {
    let (poller, _controls) = spawn_poller(cli);
    let mut snapshots = poller.stream();

    loop {
        tokio::select! {
            next = snapshots.next() => {
                let Some(snapshot) = next else { break };
                if snapshot.ticks == 0 {
                    continue;
                }
                print_snapshot(&snapshot);
                if args.ticks.is_some_and(|limit| snapshot.ticks >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot) {
    let [line1, line2] = snapshot.lcd_lines();
    let severity = snapshot.severity().map(|s| s.label()).unwrap_or("-");
    let buzzer = if snapshot.alarm { " 🔔" } else { "" };
    println!("#{:<5} {} | {} | {}{}", snapshot.ticks, line1, line2, severity, buzzer);

    if let Some(stats) = snapshot.stats {
        println!(
            "       mean {:.1}°C, min {:.1}°C, max {:.1}°C over {} readings",
            stats.mean_c,
            stats.min_c,
            stats.max_c,
            snapshot.history.len()
        );
    }
}

fn build_agent(args: &GeminiArgs) -> anyhow::Result<ChatAgent<GeminiClient>> {
    let retry = RetryPolicy::new(args.attempts, Duration::from_secs(args.wait))?;
    let config = ChatConfig::new(&args.api_key)
        .with_model(&args.model)
        .with_base_url(&args.base_url);
    let client = GeminiClient::new(config).context("failed to create chat client")?;
    Ok(ChatAgent::new(client, Persona::default(), retry))
}

fn print_reply(persona: &Persona, reply: &AgentReply) {
    match reply {
        AgentReply::Text(text) => {
            println!("{}: {}", persona.name, text.trim());
            if let Some(phrase) =
                persona.maybe_catchphrase(&mut rand::thread_rng(), DEFAULT_CATCHPHRASE_PROBABILITY)
            {
                println!("{}: {}", persona.name, phrase);
            }
        }
        AgentReply::CapacityExhausted { attempts } => {
            println!(
                "The service is out of capacity after {} attempts. Try again in a few minutes.",
                attempts
            );
        }
    }
}

async fn ask_command(args: &AskArgs) -> anyhow::Result<()> {
    let agent = build_agent(&args.gemini)?;
    let question = args.question.join(" ");

    let reply = agent.ask(&question).await?;
    print_reply(agent.persona(), &reply);
    Ok(())
}

const EXIT_WORDS: [&str; 4] = ["sair", "exit", "quit", "tchau"];

fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

async fn chat_command(args: &GeminiArgs) -> anyhow::Result<()> {
    let mut agent = build_agent(args)?;
    agent.start_conversation();

    let name = agent.persona().name.clone();
    println!("Chatting with {}. Type one of {:?} to leave.", name, EXIT_WORDS);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else { break };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_exit_word(message) {
            break;
        }

        match agent.send(message).await {
            Ok(reply) => print_reply(agent.persona(), &reply),
            Err(e) => println!("Error: {}", e),
        }
    }

    if let Some(conversation) = agent.end_conversation() {
        info!(turns = conversation.turns().len(), "conversation closed");
    }
    println!("{}: Whatever. Later.", name);
    Ok(())
}

async fn lookup_command(args: &LookupArgs) -> anyhow::Result<()> {
    if args.format != "pretty" && args.format != "json" {
        bail!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
    }
    if !args.interval.is_finite() || args.interval < 0.0 {
        bail!("Interval must be a non-negative number of seconds");
    }

    let config = PostalConfig::new(&args.token).with_base_url(&args.base_url);
    let client = PostalClient::new(config).context("failed to create lookup client")?;
    let interval = Duration::from_secs_f64(args.interval);

    let entries = if args.retry {
        let policy = RetryPolicy::default();
        let mut entries = Vec::with_capacity(args.codes.len());
        for (idx, code) in args.codes.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(interval).await;
            }
            let result = match client.lookup_with_retry(code, &policy).await {
                Ok(report) => report.into_result(),
                Err(e) => Err(e),
            };
            entries.push(BatchEntry {
                input: code.clone(),
                result,
            });
        }
        entries
    } else {
        client.lookup_many(&args.codes, interval).await
    };

    let stats = client.stats();
    if args.format == "json" {
        let results: Vec<_> = entries.iter().map(entry_json).collect();
        let output = serde_json::json!({ "results": results, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for entry in &entries {
        print_entry(entry);
    }
    println!();
    println!(
        "Total: {}, found: {}, failed: {}, success rate: {:.2}%",
        stats.total, stats.successes, stats.failures, stats.success_rate
    );
    Ok(())
}

fn entry_json(entry: &BatchEntry) -> serde_json::Value {
    match &entry.result {
        Ok(LookupOutcome::Found(payload)) => serde_json::json!({
            "input": entry.input,
            "status": "found",
            "address": payload.raw,
            "validation": payload.validate(),
        }),
        Ok(LookupOutcome::NotFound(code)) => serde_json::json!({
            "input": entry.input,
            "status": "not_found",
            "code": code.formatted(),
        }),
        Err(e) => serde_json::json!({
            "input": entry.input,
            "status": "error",
            "kind": format!("{:?}", e.kind()),
            "error": e.to_string(),
        }),
    }
}

fn print_entry(entry: &BatchEntry) {
    match &entry.result {
        Ok(LookupOutcome::Found(payload)) => {
            println!("✅ {}: {}", entry.input, payload.address.summary());
            let report = payload.validate();
            if !report.valid {
                println!("   missing fields: {}", report.missing.join(", "));
            }
            for warning in &report.warnings {
                println!("   warning: {}", warning);
            }
        }
        Ok(LookupOutcome::NotFound(code)) => println!("❔ {}: no address for {}", entry.input, code.formatted()),
        Err(e) => println!("❌ {}: {}", entry.input, e),
    }
}
