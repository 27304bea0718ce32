use std::io::Write as IoWrite;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckhand_agent::TurnDriver;
use deckhand_core::{Config, init_logging};
use deckhand_providers::{ScriptedLoop, TurnRequest};
use deckhand_skills::SkillRegistry;
use deckhand_stream::{StreamEvent, ToolUseInput};
use deckhand_tools::{
    FileReadTool, FileWriteTool, ShellTool, SkillTool, StorageDownloadTool, StorageUploadTool, ToolRegistry,
    WebSearchTool,
};
use owo_colors::OwoColorize;

/// Tool results longer than this are truncated in the terminal.
const RESULT_PREVIEW_CHARS: usize = 500;

/// Deckhand - a streaming harness for a presentation-building agent
#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(about = "Streaming presentation-agent harness", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to deckhand.toml (default: ./deckhand.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive turns against a scripted agent loop
    Run {
        /// Turn script (TOML) for the agent loop
        #[arg(short, long, value_name = "PATH")]
        script: PathBuf,

        /// One-shot prompt; omit for the interactive session
        #[arg(value_name = "PROMPT")]
        prompt: Option<String>,
    },
    /// List the discovered skill catalogue
    Skills,
    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from("deckhand.toml"));
    let config = load_or_create_config(&config_path)?;

    init_logging(Some(config.logging.clone().into())).context("Failed to initialize logging")?;

    if cli.verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
        println!("{} Model: {}", "Info:".blue().bold(), config.model_id.cyan());
    }

    match cli.command {
        Commands::Run { script, prompt } => cmd_run(config, &script, prompt, cli.verbose).await?,
        Commands::Skills => cmd_skills(config)?,
        Commands::Status => cmd_status(config)?,
    }

    Ok(())
}

/// Load config from file or create from example
fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    } else {
        println!("{} Config not found at {}", "Warning:".yellow().bold(), path.display());
        std::fs::write(path, Config::example()).context("Failed to create config")?;
        println!(
            "{} Created {} from the example. Edit it and run again.",
            "Info:".blue().bold(),
            path.display()
        );
        anyhow::bail!("Please review the generated config and run again")
    }
}

/// Discover skills and build the session tool registry.
fn build_tools(config: &Config) -> Result<(Arc<SkillRegistry>, Arc<ToolRegistry>)> {
    let registry = SkillRegistry::discover(&config.skills_dir)
        .map_err(|e| anyhow::anyhow!("Skill discovery failed: {}", e))?;
    let registry = Arc::new(registry);

    let mut tools = ToolRegistry::new();
    tools.register(SkillTool::new(registry.clone())).map_err(anyhow::Error::from)?;
    tools.register(ShellTool::new()).map_err(anyhow::Error::from)?;
    tools.register(FileReadTool).map_err(anyhow::Error::from)?;
    tools.register(FileWriteTool).map_err(anyhow::Error::from)?;
    tools
        .register(WebSearchTool::new(config.search.clone()))
        .map_err(anyhow::Error::from)?;
    tools
        .register(StorageUploadTool::new(config.storage.clone()))
        .map_err(anyhow::Error::from)?;
    tools
        .register(StorageDownloadTool::new(config.storage.clone()))
        .map_err(anyhow::Error::from)?;

    Ok((registry, Arc::new(tools)))
}

/// Assemble the system prompt: base instructions plus the skill catalogue.
fn build_system_prompt(registry: &SkillRegistry) -> String {
    let base = "You are a presentation-building agent. Use the `skill` tool to load the detailed \
                instructions for a skill before following it, run commands with the `shell` tool, \
                and upload finished decks with `upload_to_s3`.";

    if registry.is_empty() {
        return base.to_string();
    }

    format!("{}\n\n[Available Skills]\n{}", base, registry.render_catalogue())
}

/// Drive one or more turns against the scripted loop.
async fn cmd_run(config: Config, script: &Path, prompt: Option<String>, verbose: bool) -> Result<()> {
    let (registry, tools) = build_tools(&config)?;
    println!("Loaded {} skills.", registry.len());

    let system_prompt = build_system_prompt(&registry);
    tracing::debug!(chars = system_prompt.len(), "assembled system prompt");
    if verbose {
        println!("{} Tools: {}", "Info:".blue().bold(), tools.list().join(", ").cyan());
    }

    let agent_loop = Arc::new(ScriptedLoop::from_file(script).map_err(|e| anyhow::anyhow!("{}", e))?);
    let driver = TurnDriver::new(agent_loop, tools);
    let model_id = config.model_id.clone();

    if let Some(prompt) = prompt {
        run_one_turn(&driver, &model_id, &prompt).await?;
        return Ok(());
    }

    println!("Interactive session. Type 'exit' or 'quit' to leave.");
    let mut lines = BufReader::new(std::io::stdin()).lines();

    loop {
        print!("\n{} ", "User>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let input = line?.trim().to_string();

        if input.is_empty() {
            continue;
        }
        if matches!(input.as_str(), "exit" | "quit") {
            break;
        }

        run_one_turn(&driver, &model_id, &input).await?;
    }

    Ok(())
}

async fn run_one_turn(driver: &TurnDriver, model_id: &str, prompt: &str) -> Result<()> {
    println!("\n{}\n", "-".repeat(40));

    let request = TurnRequest::new(prompt).with_model_id(model_id);
    let mut handle = driver.run_turn(request).await.map_err(|e| anyhow::anyhow!("{}", e))?;

    while let Some(event) = handle.events.recv().await {
        render_event(&event)?;
    }
    println!();

    Ok(())
}

/// Print one normalized event to the terminal.
fn render_event(event: &StreamEvent) -> Result<()> {
    match event {
        StreamEvent::Text { data } => {
            print!("{}", data);
            std::io::stdout().flush()?;
        }
        StreamEvent::Reasoning { data } => {
            print!("{}", format!("[thinking] {}", data).dimmed());
            std::io::stdout().flush()?;
        }
        StreamEvent::CurrentToolUse { tool_name, tool_input } => {
            println!("\n\n{}", format!("[tool: {}]", tool_name).blue().bold());
            match tool_input {
                ToolUseInput::Pending => {}
                ToolUseInput::Parsed(value) => {
                    println!("input: {}", serde_json::to_string_pretty(value)?);
                }
                ToolUseInput::Partial(raw) => {
                    println!("input (partial): {}", raw);
                }
            }
        }
        StreamEvent::ToolStream { data } => {
            println!("{} {}", "[tool stream]".blue(), data);
        }
        StreamEvent::ToolResult { data } => {
            println!("{} {}\n", "[tool result]".blue(), truncate_preview(data));
        }
    }

    Ok(())
}

/// List the discovered skills.
fn cmd_skills(config: Config) -> Result<()> {
    let registry = SkillRegistry::discover(&config.skills_dir)
        .map_err(|e| anyhow::anyhow!("Skill discovery failed: {}", e))?;

    if registry.is_empty() {
        println!("No skills found under {}", config.skills_dir.display());
        return Ok(());
    }

    print!("{}", registry.render_catalogue());
    Ok(())
}

/// Show the effective configuration.
fn cmd_status(config: Config) -> Result<()> {
    println!("{}", "Deckhand Status".green().bold().underline());
    println!();
    println!("  Model: {}", config.model_id.cyan());
    println!("  Skills dir: {}", config.skills_dir.display().cyan());
    println!(
        "  Output bucket: {}",
        config
            .storage
            .resolved_bucket()
            .unwrap_or_else(|| format!("(scan for '{}…')", config.storage.bucket_prefix))
            .cyan()
    );
    println!("  Search backend: {:?}", config.search.backend);

    Ok(())
}

/// Truncate long tool output for terminal display.
fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= RESULT_PREVIEW_CHARS {
        return text.to_string();
    }

    let preview: String = text.chars().take(RESULT_PREVIEW_CHARS).collect();
    format!("{}... (truncated)", preview)
}
