//! intent-json CLI - structured JSON from images and text
//!
//! Prints a playground state (`data`, `error` or `fieldErrors`) as JSON on
//! stdout. Logs go to stderr.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use intent_json::form::{FormFields, InputMode};
use intent_json::invoker::StructuredInvoker;
use intent_json::llms::OpenAI;
use intent_json::message::ImageDetail;
use intent_json::playground::{PlaygroundState, analyze};
use intent_json::presets::Preset;
use intent_json::schema;
use intent_json_cli::config::{CliConfig, load_config};
use intent_json_cli::error::Result;
use intent_json_cli::input::{load_image, text_or_file};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Turn images or text into schema-validated JSON with an LLM
#[derive(Parser)]
#[command(name = "intent-json")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "INTENT_JSON_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image
    Image(ImageArgs),

    /// Analyze a piece of text
    Text(TextArgs),

    /// Compile a schema and print its JSON Schema form (no network)
    Schema(SchemaArgs),

    /// List the built-in presets
    Presets,
}

/// Where the image comes from
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ImageSource {
    /// Image URL (http(s) or data:image)
    #[arg(long)]
    url: Option<String>,

    /// Local image file, sent inline
    #[arg(long)]
    file: Option<PathBuf>,
}

/// Arguments for the image command
#[derive(Args)]
struct ImageArgs {
    #[command(flatten)]
    source: ImageSource,

    #[command(flatten)]
    invoke: InvokeArgs,
}

/// Arguments for the text command
#[derive(Args)]
struct TextArgs {
    /// Text to analyze
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// File containing the text to analyze
    #[arg(long)]
    text_file: Option<PathBuf>,

    #[command(flatten)]
    invoke: InvokeArgs,
}

/// Options shared by the analyzing commands
#[derive(Args)]
struct InvokeArgs {
    /// Instruction for the model (defaults to the preset)
    #[arg(short, long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// File containing the instruction
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Schema-source: JSON Schema or a `z.` expression (defaults to the preset)
    #[arg(short, long, conflicts_with = "schema_file")]
    schema: Option<String>,

    /// File containing the schema-source
    #[arg(long)]
    schema_file: Option<PathBuf>,

    /// Model to use (overrides config and OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Image detail level: auto, low or high
    #[arg(long)]
    detail: Option<ImageDetail>,
}

/// Arguments for the schema command
#[derive(Args)]
#[group(required = true, multiple = false)]
struct SchemaArgs {
    /// Schema-source
    #[arg(short, long)]
    schema: Option<String>,

    /// File containing the schema-source
    #[arg(long)]
    schema_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "intent_json={level},intent_json_cli={level},{}",
            if verbosity >= 2 { "info" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Image(args) => cmd_image(args, cli.config).await,
        Commands::Text(args) => cmd_text(args, cli.config).await,
        Commands::Schema(args) => cmd_schema(args).await,
        Commands::Presets => cmd_presets(),
    }
}

/// Analyze an image.
async fn cmd_image(args: ImageArgs, config_path: Option<PathBuf>) -> Result<ExitCode> {
    let image_url = match (args.source.url, args.source.file) {
        (Some(url), _) => url,
        (None, Some(path)) => load_image(&path).await?.url().to_owned(),
        (None, None) => String::new(),
    };

    let fields = FormFields {
        mode: InputMode::Image,
        image_url: Some(image_url),
        ..form_defaults(&args.invoke, Preset::ImageInventory).await?
    };
    let config = load_config(config_path.as_deref()).await?;
    print_state(&invoke(&config, &args.invoke, &fields).await)
}

/// Analyze text.
async fn cmd_text(args: TextArgs, config_path: Option<PathBuf>) -> Result<ExitCode> {
    let user_text = text_or_file(args.text, args.text_file.as_deref()).await?;

    let fields = FormFields {
        mode: InputMode::Text,
        user_text,
        ..form_defaults(&args.invoke, Preset::TextIntent).await?
    };
    let config = load_config(config_path.as_deref()).await?;
    print_state(&invoke(&config, &args.invoke, &fields).await)
}

/// Compile a schema without calling any model.
async fn cmd_schema(args: SchemaArgs) -> Result<ExitCode> {
    let source = text_or_file(args.schema, args.schema_file.as_deref())
        .await?
        .unwrap_or_default();

    match schema::compile(&source) {
        Ok(compiled) => {
            let output = json!({
                "format": compiled.format(),
                "jsonSchema": compiled.json_schema(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => print_state(&PlaygroundState::failure(e.into())),
    }
}

/// Print the built-in presets.
fn cmd_presets() -> Result<ExitCode> {
    let presets: Vec<_> = Preset::ALL
        .iter()
        .map(|preset| {
            json!({
                "name": preset.name(),
                "mode": preset.mode(),
                "systemPrompt": preset.system_prompt(),
                "jsonSchema": preset.schema(),
                "samples": preset.samples(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&presets)?);
    Ok(ExitCode::SUCCESS)
}

/// Prompt and schema from flags or files, falling back to `preset`.
async fn form_defaults(args: &InvokeArgs, preset: Preset) -> Result<FormFields> {
    let system_prompt = text_or_file(args.prompt.clone(), args.prompt_file.as_deref())
        .await?
        .unwrap_or_else(|| preset.system_prompt().to_owned());
    let json_schema = text_or_file(args.schema.clone(), args.schema_file.as_deref())
        .await?
        .unwrap_or_else(|| preset.schema().to_owned());

    Ok(FormFields {
        system_prompt: Some(system_prompt),
        json_schema: Some(json_schema),
        ..FormFields::default()
    })
}

/// Validate the form, configure the provider and run the invocation.
///
/// The credential is only checked once the fields pass, so field errors
/// are reported even without an API key.
async fn invoke(config: &CliConfig, args: &InvokeArgs, fields: &FormFields) -> PlaygroundState {
    if let Err(errors) = fields.validate() {
        return PlaygroundState::field_errors(errors);
    }

    let provider = match config
        .openai_config(|name| std::env::var(name).ok())
        .and_then(OpenAI::new)
    {
        Ok(provider) => provider,
        Err(e) => return PlaygroundState::failure(e),
    };

    let mut invoker = StructuredInvoker::new(provider)
        .with_image_detail(args.detail.unwrap_or_else(|| config.image_detail()));
    if let Some(model) = &args.model {
        invoker = invoker.with_model(model);
    }
    tracing::info!(model = invoker.model(), "invoking");

    analyze(&invoker, fields).await
}

fn print_state(state: &PlaygroundState) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(if state.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
