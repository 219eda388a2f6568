use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oav_core::document;
use oav_core::document::spec::OpenApiDocument;
use oav_core::example::generate_example;
use oav_core::inputs::resolve_initial_value;
use oav_core::navigation::{NavigationModel, build_navigation};
use oav_emulator::{
    CredentialStore, EmulatorOptions, RequestEmulator, SchemaLoader,
};

#[derive(Parser)]
#[command(name = "oav", about = "OpenAPI 3.x document viewer and request emulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an OpenAPI document
    Validate {
        /// Path or URL of the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        input: String,
    },

    /// List navigable endpoints and schemas
    Endpoints {
        /// Path or URL of the OpenAPI document
        #[arg(short, long)]
        input: String,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Print a generated example payload for a named schema
    Example {
        /// Path or URL of the OpenAPI document
        #[arg(short, long)]
        input: String,

        /// Schema name under components/schemas
        name: String,
    },

    /// Emulate a request against an operation and print the response
    Send {
        /// Path or URL of the OpenAPI document
        #[arg(short, long)]
        input: String,

        /// operationId of the endpoint to call
        operation_id: String,

        /// Parameter value as name=value (repeatable); prefix with
        /// location: to disambiguate, e.g. query:limit=5
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Credential as schemeKey=value (repeatable)
        #[arg(short, long = "credential")]
        credentials: Vec<String>,

        /// Raw request body text; replaces the generated example
        #[arg(long)]
        body: Option<String>,

        /// Base URL prefixed to relative endpoint paths
        #[arg(long, default_value = "")]
        base_url: String,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Directory holding persisted credentials
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Print the curl command instead of sending
        #[arg(long)]
        curl: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { input } => cmd_validate(&input).await,

        Commands::Endpoints { input, format } => cmd_endpoints(&input, format).await,

        Commands::Example { input, name } => cmd_example(&input, &name).await,

        Commands::Send {
            input,
            operation_id,
            params,
            credentials,
            body,
            base_url,
            timeout_ms,
            store_dir,
            curl,
        } => {
            cmd_send(SendArgs {
                input,
                operation_id,
                params,
                credentials,
                body,
                base_url,
                timeout_ms,
                store_dir,
                curl,
            })
            .await
        }

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oav", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load a document from a local file or, for http(s) sources, the network.
async fn load_document(source: &str) -> Result<OpenApiDocument> {
    let lower = source.trim().to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let loader = SchemaLoader::default();
        return Ok(loader.fetch(source).await?);
    }

    let path = PathBuf::from(source);
    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
    let parsed = match ext {
        "json" => document::from_json(&content)?,
        _ => document::from_yaml(&content)?,
    };
    Ok(parsed)
}

async fn cmd_validate(input: &str) -> Result<()> {
    let parsed = load_document(input).await?;

    eprintln!(
        "Valid OpenAPI {} document: {}",
        parsed.openapi, parsed.info.title
    );
    eprintln!("  Version: {}", parsed.info.version);
    eprintln!("  Paths: {}", parsed.paths.len());

    if let Some(ref components) = parsed.components {
        eprintln!("  Schemas: {}", components.schemas.len());
        eprintln!("  Security schemes: {}", components.security_schemes.len());
    }

    let navigation = build_navigation(&parsed);
    let endpoints: usize = navigation
        .endpoint_groups
        .iter()
        .map(|group| group.children.len())
        .sum();
    eprintln!("  Navigable endpoints: {endpoints}");

    eprintln!("Validation successful.");
    Ok(())
}

async fn cmd_endpoints(input: &str, format: OutputFormat) -> Result<()> {
    let parsed = load_document(input).await?;
    let navigation = build_navigation(&parsed);
    let summary = build_endpoints_summary(&navigation);

    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_endpoints_summary(navigation: &NavigationModel) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = navigation
        .endpoint_groups
        .iter()
        .map(|group| {
            let endpoints: Vec<serde_json::Value> = group
                .children
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "anchor": item.anchor,
                        "operation_id": item.operation_id,
                        "method": item.method.map(|method| method.as_upper_str()),
                        "title": item.title,
                    })
                })
                .collect();
            serde_json::json!({ "title": group.title, "endpoints": endpoints })
        })
        .collect();

    let schemas: Vec<&str> = navigation
        .schema_group
        .iter()
        .flat_map(|group| group.children.iter())
        .map(|item| item.title.as_str())
        .collect();

    serde_json::json!({ "groups": groups, "schemas": schemas })
}

async fn cmd_example(input: &str, name: &str) -> Result<()> {
    let parsed = load_document(input).await?;
    let components = parsed.components_or_default();

    let Some(schema) = components.schemas.get(name) else {
        let known: Vec<&str> = components.schemas.keys().map(String::as_str).collect();
        bail!(
            "schema \"{name}\" not found; available schemas: {}",
            known.join(", ")
        );
    };

    let example = generate_example(Some(schema), &components);
    println!("{}", serde_json::to_string_pretty(&example)?);
    Ok(())
}

struct SendArgs {
    input: String,
    operation_id: String,
    params: Vec<String>,
    credentials: Vec<String>,
    body: Option<String>,
    base_url: String,
    timeout_ms: Option<u64>,
    store_dir: Option<PathBuf>,
    curl: bool,
}

async fn cmd_send(args: SendArgs) -> Result<()> {
    let parsed = load_document(&args.input).await?;

    let mut emulator = RequestEmulator::new(
        Arc::new(parsed),
        EmulatorOptions {
            base_api_url: args.base_url.clone(),
            request_timeout: args.timeout_ms.map(Duration::from_millis),
        },
    );
    if let Some(dir) = &args.store_dir {
        emulator.attach_store(CredentialStore::new(dir));
    }

    if !emulator.select_operation(&args.operation_id) {
        bail!("operation \"{}\" not found in document", args.operation_id);
    }

    for entry in &args.credentials {
        let (key, value) = split_key_value(entry)
            .with_context(|| format!("invalid credential \"{entry}\"; expected key=value"))?;
        emulator.set_credential(key, value);
    }

    for entry in &args.params {
        let (key, value) = split_key_value(entry)
            .with_context(|| format!("invalid parameter \"{entry}\"; expected name=value"))?;
        apply_param(&mut emulator, key, value)?;
    }

    if let Some(body) = &args.body {
        emulator.set_body_text(body.clone());
    }

    let errors = emulator.validation_errors();
    if !errors.is_empty() {
        bail!("request is not ready:\n  {}", errors.join("\n  "));
    }

    let prepared = emulator
        .prepared_request()
        .context("no prepared request for the selected operation")?;
    if args.curl {
        println!("{}", prepared.curl);
        return Ok(());
    }
    eprintln!("{} {}", prepared.method.as_upper_str(), prepared.url);

    let state = emulator.send_request().await;
    if let Some(error) = &state.error {
        bail!("{} ({})", error.message, error.code.as_str());
    }

    let result = state
        .result
        .as_ref()
        .context("request finished without a result")?;
    eprintln!(
        "{} {} in {} ms",
        result.status, result.status_text, result.elapsed_ms
    );
    for (key, value) in &result.headers {
        eprintln!("  {key}: {value}");
    }
    if !result.body_text.is_empty() {
        println!("{}", result.body_text);
    }

    if result.ok { Ok(()) } else { bail!("request failed with status {}", result.status) }
}

fn split_key_value(entry: &str) -> Option<(&str, &str)> {
    entry
        .split_once('=')
        .map(|(key, value)| (key.trim(), value))
        .filter(|(key, _)| !key.is_empty())
}

/// Apply a parameter given either its bare name or a `location:name` key.
/// Values run through the same coercion as schema defaults, so arrays can be
/// passed comma-separated and numbers as plain digits.
fn apply_param(emulator: &mut RequestEmulator, key: &str, raw: &str) -> Result<()> {
    let matched = emulator
        .param_inputs()
        .iter()
        .find(|input| input.key == key || input.name == key)
        .map(|input| (input.key.clone(), input.spec.clone()));

    let Some((full_key, spec)) = matched else {
        let known: Vec<&str> = emulator
            .param_inputs()
            .iter()
            .map(|input| input.key.as_str())
            .collect();
        bail!(
            "parameter \"{key}\" not found; available parameters: {}",
            known.join(", ")
        );
    };

    let seed = serde_json::Value::String(raw.to_string());
    let value = resolve_initial_value(&spec, Some(&seed));
    emulator.set_param_value(&full_key, value);
    Ok(())
}
