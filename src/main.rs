use anyhow::{anyhow, Context, Result};
use bat::PrettyPrinter;
use clap::Parser;
use console::style;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use react_agent::agent::{Agent, AgentConfig, AgentOutcome, ModelFailurePolicy};
use react_agent::providers::base::Provider;
use react_agent::providers::openai::OpenAiProvider;
use react_agent::tools::weather::WTTR_HOST;
use react_agent::tools::{ToolRegistry, WeatherTool};

const DEFAULT_TASK: &str = "What's the weather like in Shenzhen right now? Tell me the current \
temperature and conditions, and whether it is a good time to go out.";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Task for the agent
    #[arg(default_value = DEFAULT_TASK)]
    task: String,

    /// Maximum number of reasoning rounds
    #[arg(long, env = "AGENT_MAX_ITERATIONS", default_value_t = 5)]
    max_iterations: usize,

    /// What to do when the model call fails
    #[arg(long, value_enum, default_value = "degrade")]
    on_model_failure: FailureVariant,

    /// Keep replies without an Action or Final Answer in the conversation
    #[arg(long)]
    keep_unparsed_replies: bool,

    /// Seconds to wait for each model reply
    #[arg(long, env = "AGENT_MODEL_TIMEOUT_SECS", default_value_t = 120)]
    model_timeout_secs: u64,

    /// Seconds to wait for each tool call
    #[arg(long, env = "AGENT_TOOL_TIMEOUT_SECS", default_value_t = 60)]
    tool_timeout_secs: u64,

    /// Base url of the wttr.in compatible weather service
    #[arg(long, env = "WEATHER_URL", default_value = WTTR_HOST)]
    weather_url: String,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FailureVariant {
    Degrade,
    Abort,
}

impl From<FailureVariant> for ModelFailurePolicy {
    fn from(variant: FailureVariant) -> Self {
        match variant {
            FailureVariant::Degrade => ModelFailurePolicy::Degrade,
            FailureVariant::Abort => ModelFailurePolicy::Abort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let provider = OpenAiProvider::from_env()
        .context("OPENAI_API_KEY must be set, in the environment or a .env file")?;

    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool::with_base_url(&cli.weather_url)?)?;

    let config = AgentConfig {
        max_iterations: cli.max_iterations,
        model_failure: cli.on_model_failure.into(),
        retain_unparsed_replies: cli.keep_unparsed_replies,
        model_timeout: Some(Duration::from_secs(cli.model_timeout_secs)),
        tool_timeout: Some(Duration::from_secs(cli.tool_timeout_secs)),
        ..AgentConfig::default()
    };

    cliclack::intro(style(format!(" react-agent · {} ", provider.model())).on_cyan().black())?;
    println!("{} {}\n", style("Task:").bold(), cli.task);

    let agent = Agent::new(Box::new(provider), tools).with_config(config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match agent.run_with_cancel(&cli.task, &cancel).await? {
        AgentOutcome::FinalAnswer { answer, iterations } => {
            render(&answer)?;
            cliclack::outro(style(format!("answered after {} rounds", iterations)).dim())?;
        }
        outcome @ AgentOutcome::Exhausted { .. } => {
            cliclack::outro_cancel(style(outcome.to_string()).yellow())?;
        }
        outcome @ AgentOutcome::Cancelled { .. } => {
            cliclack::outro_cancel(outcome.to_string())?;
        }
    }

    Ok(())
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .map_err(|e| anyhow!("failed to render answer: {}", e))?;
    println!();
    Ok(())
}
