use anyhow::{Result, bail};
use clap::Parser;
use fifa_agent::agent::{self, AgentCard, Session};
use fifa_agent::config::{Config, Variant};
use fifa_agent::repl::{self, Banner, ChatSession};
use fifa_agent::tools;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

/// Canned questions for `smoke`.
const SMOKE_QUERIES: &[&str] = &[
    "¿Quién ganó la Copa del Mundo 2022?",
    "¿Cuántas Copas del Mundo ha ganado Brasil?",
    "¿Quién es el máximo goleador en la historia de los Mundiales?",
    "Dame un dato curioso sobre la Copa del Mundo",
];

#[derive(Parser)]
#[command(
    name = "fifa-agent",
    about = "FIFA World Cup trivia agent backed by Gemini"
)]
struct Cli {
    /// Agent variant: classic (knowledge tools) or plus (Google Search)
    #[arg(long, global = true, value_enum)]
    variant: Option<Variant>,

    /// Path to config file (missing file means defaults)
    #[arg(short, long, global = true, default_value = "fifa-agent.toml")]
    config: PathBuf,

    /// Gemini model override
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Interactive question loop (default)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,
    },

    /// Run the canned smoke-test questions against the live model
    Smoke,

    /// Invoke a knowledge tool locally and print its result (no network)
    Tool {
        /// Tool name, e.g. get_fun_facts
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Print the agent card as JSON (no network)
    Card,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(variant) = cli.variant {
        config.agent.variant = variant;
    }
    if let Some(model) = &cli.model {
        config.model.name = Some(model.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fifa_agent=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&config).await,
        Command::Ask { question } => {
            let agent = agent::build_agent(&config).await?;
            let mut session = Session::new(0);
            let reply = agent.respond(&mut session, &question).await?;
            println!("{}", reply.render());
            Ok(())
        }
        Command::Smoke => run_smoke(&config).await,
        Command::Tool { name, args } => {
            let args: serde_json::Value = serde_json::from_str(&args)?;
            let (result, is_error) = tools::dispatch(&name, &args);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if is_error {
                bail!("tool '{name}' rejected the call");
            }
            Ok(())
        }
        Command::Card => {
            let card = AgentCard::from_config(&config);
            println!("{}", serde_json::to_string_pretty(&card)?);
            Ok(())
        }
    }
}

async fn run_chat(config: &Config) -> Result<()> {
    let agent = agent::build_agent(config).await?;
    let mut chat = ChatSession::new(agent, config.agent.max_history_exchanges);
    let banner = Banner::for_variant(config.variant());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let reason = repl::run(&mut chat, stdin, &mut stdout, &banner).await?;

    let stats = chat.session().stats;
    info!(
        ?reason,
        model_calls = stats.model_calls,
        tool_calls = stats.tool_calls,
        prompt_tokens = stats.prompt_tokens,
        output_tokens = stats.output_tokens,
        "chat ended"
    );
    Ok(())
}

async fn run_smoke(config: &Config) -> Result<()> {
    let agent = agent::build_agent(config).await?;

    println!(
        "🏆 Probando {} con {}",
        agent.card().name,
        agent.card().model
    );
    println!("{}", "=".repeat(60));

    let mut failures = 0;
    for (i, query) in SMOKE_QUERIES.iter().enumerate() {
        println!("\n{}. Pregunta: {query}", i + 1);
        println!("{}", "-".repeat(40));
        // Each canned question stands alone.
        let mut session = Session::new(0);
        match agent.respond(&mut session, query).await {
            Ok(reply) => println!("Respuesta: {}", reply.render()),
            Err(e) => {
                failures += 1;
                println!("❌ Error: {e}");
            }
        }
        println!();
    }

    if failures > 0 {
        bail!("{failures} of {} smoke queries failed", SMOKE_QUERIES.len());
    }
    Ok(())
}
