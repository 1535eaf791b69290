//! haikei CLI - mail summary and business-style conversion
//!
//! Usage:
//!     haikei [OPTIONS] <COMMAND>
//!
//! Environment Variables:
//!     HAIKEI_MODEL: Model name (default: gpt-3.5-turbo)
//!     HAIKEI_BASE_URL: API base URL (default: https://api.openai.com/v1)
//!     HAIKEI_TIMEOUT_SECS: Request timeout in seconds (default: 60)
//!     HAIKEI_LANG: Message language, ja or en (default: ja)
//!     HAIKEI_STORE: Where the API key lives, file or keyring (default: file)
//!     HAIKEI_STORE_PATH: Path of the JSON store file
//!     HAIKEI_BRIDGED: Route requests through the bridge host
//!     RUST_LOG: Log filter (overrides -v)

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use haikei_core::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use haikei_core::{
    get_message, select_transport, AppError, Assistant, BridgeHost, BridgeStore, ChatMessage,
    ClientConfig, CompletionClient, CompletionTransport, ErrorKind, Feature, FileStore,
    HttpConfig, HttpTransport, KeyValueStore, KeyedSecret, KeyringStore, Language, SecretStore,
    TransportMode,
};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// haikei - summarize mail and rewrite text in polite business Japanese
#[derive(Parser, Debug)]
#[command(name = "haikei")]
#[command(about = "Summarize mail and rewrite text in polite business Japanese")]
#[command(after_help = r#"Examples:
    # Save the API key (stored in the config file by default)
    haikei set-key sk-xxxxx

    # Keep the key in the OS keyring instead
    haikei --store keyring set-key sk-xxxxx

    # Summarize a mail from stdin
    cat mail.txt | haikei summarize

    # Convert a sentence to business style
    haikei convert "明日行きます"

    # Route requests through the bridge host
    haikei --bridged summarize "..."

    # Interactive mode
    haikei interactive
"#)]
struct Cli {
    /// Model name
    #[arg(long, env = "HAIKEI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// API base URL
    #[arg(long, env = "HAIKEI_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "HAIKEI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,

    /// Message language (ja or en)
    #[arg(long, env = "HAIKEI_LANG", default_value = "ja", value_parser = ["ja", "en"], global = true)]
    lang: String,

    /// Where the API key is stored (keyring needs the native-keyring feature)
    #[arg(long, env = "HAIKEI_STORE", value_enum, default_value_t = StoreKind::File, global = true)]
    store: StoreKind,

    /// Path of the JSON store file (default: <config dir>/haikei/config.json)
    #[arg(long, env = "HAIKEI_STORE_PATH", global = true)]
    store_path: Option<PathBuf>,

    /// Send requests through the bridge host instead of directly
    #[arg(long, env = "HAIKEI_BRIDGED", global = true)]
    bridged: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a mail (reads stdin when TEXT is omitted)
    Summarize { text: Option<String> },

    /// Convert text to polite business style (reads stdin when TEXT is omitted)
    Convert { text: Option<String> },

    /// Save the API key
    SetKey { key: String },

    /// Show the saved API key, masked
    ShowKey,

    /// Delete the saved API key
    DeleteKey,

    /// Send a minimal request to verify the key and endpoint
    Check,

    /// Enter lines interactively; /summarize and /convert switch feature
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    File,
    Keyring,
}

/// Everything a command needs, wired once at startup
struct Runtime {
    client: Arc<CompletionClient>,
    assistant: Assistant,
    lang: Language,
    // Keeps the bridge host alive for the process lifetime
    _bridge: Option<JoinHandle<()>>,
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "warn,haikei_core=info",
        _ => "warn,haikei_core=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .compact()
        .init();
}

/// Parse language string to Language enum
fn parse_lang(lang: &str) -> Language {
    match lang.to_lowercase().as_str() {
        "en" => Language::English,
        _ => Language::Japanese,
    }
}

fn file_store(args: &Cli) -> Result<Arc<dyn KeyValueStore>> {
    let store = match &args.store_path {
        Some(path) => FileStore::new(path),
        None => FileStore::open_default()?,
    };
    Ok(Arc::new(store))
}

fn keyring_store() -> Result<Arc<dyn SecretStore>> {
    if !KeyringStore::backend_available() {
        anyhow::bail!(
            "--store keyring needs a build with the native-keyring feature; use --store file"
        );
    }
    Ok(Arc::new(KeyringStore::default()))
}

/// Pick the transport and secret store once, then build the client
async fn build_runtime(args: &Cli) -> Result<Runtime> {
    let lang = parse_lang(&args.lang);
    let http = HttpConfig::new(&args.base_url).with_timeout(Duration::from_secs(args.timeout_secs));
    let config = ClientConfig::new(&args.model);

    let (transport, secret, bridge): (
        Arc<dyn CompletionTransport>,
        Arc<dyn SecretStore>,
        Option<JoinHandle<()>>,
    ) = if args.bridged {
        let host = BridgeHost::new(
            Arc::new(HttpTransport::new(&http)?),
            file_store(args)?,
            config.clone(),
        );
        let (handle, task) = host.spawn();
        let secret: Arc<dyn SecretStore> = match args.store {
            StoreKind::File => Arc::new(KeyedSecret::api_key(Arc::new(BridgeStore::new(
                handle.clone(),
            )))),
            StoreKind::Keyring => keyring_store()?,
        };
        let transport = select_transport(TransportMode::Bridged, &http, Some(handle))?;
        (transport, secret, Some(task))
    } else {
        let secret: Arc<dyn SecretStore> = match args.store {
            StoreKind::File => Arc::new(KeyedSecret::api_key(file_store(args)?)),
            StoreKind::Keyring => keyring_store()?,
        };
        let transport = select_transport(TransportMode::Direct, &http, None)?;
        (transport, secret, None)
    };

    let client = Arc::new(CompletionClient::new(config, transport, secret));
    if let Err(e) = client.reload().await {
        warn!(error = %e, "Could not load API key");
        eprintln!("{}", get_message("api_key_load_failed", lang));
    }

    Ok(Runtime {
        assistant: Assistant::new(client.clone()),
        client,
        lang,
        _bridge: bridge,
    })
}

/// Message to show for a failed feature run
fn failure_message(feature: Feature, err: &AppError, lang: Language) -> &'static str {
    match err.kind {
        ErrorKind::Validation => feature.empty_input_message(lang),
        _ => err.message(lang),
    }
}

fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

async fn run_feature(runtime: &Runtime, feature: Feature, text: Option<String>) -> Result<bool> {
    let input = read_input(text)?;
    match runtime.assistant.run(feature, &input).await {
        Ok(result) => {
            println!("{}", result);
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}", failure_message(feature, &e, runtime.lang));
            Ok(false)
        }
    }
}

async fn set_key(runtime: &Runtime, key: &str) -> bool {
    match runtime.client.set_api_key(key).await {
        Ok(()) => {
            println!("{}", get_message("api_key_saved", runtime.lang));
            true
        }
        Err(e) => {
            warn!(error = %e, "set-key failed");
            eprintln!("{}", get_message("api_key_save_failed", runtime.lang));
            false
        }
    }
}

async fn delete_key(runtime: &Runtime) -> bool {
    match runtime.client.delete_api_key().await {
        Ok(()) => {
            println!("{}", get_message("api_key_deleted", runtime.lang));
            true
        }
        Err(e) => {
            warn!(error = %e, "delete-key failed");
            eprintln!("{}", get_message("api_key_delete_failed", runtime.lang));
            false
        }
    }
}

async fn show_key(runtime: &Runtime) -> bool {
    match runtime.client.api_key_preview().await {
        Some(preview) => {
            println!("{}", preview);
            true
        }
        None => {
            println!("{}", get_message("api_key_not_set", runtime.lang));
            false
        }
    }
}

/// Check model API connectivity with a one-word request
async fn check_model_api(runtime: &Runtime, base_url: &str) -> bool {
    println!("Checking model API...");
    println!("{}", "-".repeat(50));
    println!("Base URL: {}", base_url);
    println!("Model: {}", runtime.client.model().await);
    println!("Transport: {}", runtime.client.transport_mode().as_str());
    print!("Sending test request... ");
    io::stdout().flush().ok();

    match runtime
        .client
        .generate_text(vec![ChatMessage::user("Hi")])
        .await
    {
        Ok(_) => {
            println!("\u{2705} {}", get_message("connection_successful", runtime.lang));
            true
        }
        Err(e) => {
            let app_error = AppError::from(e);
            println!("\u{274C} {}", get_message("connection_failed", runtime.lang));
            println!("   {}", app_error.message(runtime.lang));
            println!("   Detail: {}", app_error.detail);
            false
        }
    }
}

/// One unit of interactive input
#[derive(Debug, PartialEq, Eq)]
enum Interactive {
    Quit,
    Switch(Feature),
    Message(String),
}

/// Read lines until a message is complete
///
/// A message may span several lines and is sent by a blank line, `/send`
/// or EOF. Commands are only recognized on the first line. Returns `None`
/// at EOF with nothing typed.
fn read_interactive<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    feature: Feature,
    lang: Language,
) -> io::Result<Option<Interactive>> {
    let mut lines: Vec<String> = Vec::new();

    loop {
        if lines.is_empty() {
            write!(out, "[{}] > ", feature.title(lang))?;
        } else {
            write!(out, "... ")?;
        }
        out.flush()?;

        let mut input = String::new();
        if reader.read_line(&mut input)? == 0 {
            return Ok((!lines.is_empty()).then(|| Interactive::Message(lines.join("\n"))));
        }
        let line = input.trim_end_matches(['\r', '\n']);
        let command = line.trim();

        if lines.is_empty() {
            if command.eq_ignore_ascii_case("quit")
                || command.eq_ignore_ascii_case("exit")
                || command.eq_ignore_ascii_case("q")
            {
                return Ok(Some(Interactive::Quit));
            }
            match command {
                "/summarize" => return Ok(Some(Interactive::Switch(Feature::Summarize))),
                "/convert" => return Ok(Some(Interactive::Switch(Feature::ConvertStyle))),
                "" | "/send" => continue,
                _ => {}
            }
        } else if command.is_empty() || command == "/send" {
            return Ok(Some(Interactive::Message(lines.join("\n"))));
        }

        lines.push(line.to_string());
    }
}

/// Run interactive mode
async fn run_interactive_mode(runtime: &Runtime) -> Result<()> {
    let lang = runtime.lang;
    let mut feature = Feature::Summarize;
    println!(
        "\nEntering interactive mode. Finish a message with a blank line or /send.\n\
         /summarize or /convert switches feature, 'quit' exits.\n"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let entry = read_interactive(&mut stdin.lock(), &mut stdout, feature, lang);
        let message = match entry {
            Ok(Some(Interactive::Message(message))) => message,
            Ok(Some(Interactive::Switch(next))) => {
                feature = next;
                continue;
            }
            Ok(Some(Interactive::Quit)) => {
                println!("Goodbye!");
                break;
            }
            Ok(None) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Err(_) => {
                println!("\n\nInterrupted. Goodbye!");
                break;
            }
        };

        match runtime.assistant.run(feature, &message).await {
            Ok(result) => println!("\n{}:\n{}\n", feature.result_label(lang), result),
            Err(e) => eprintln!("\n{}\n", failure_message(feature, &e, lang)),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let runtime = build_runtime(&args).await?;

    let ok = match &args.command {
        Command::Summarize { text } => {
            run_feature(&runtime, Feature::Summarize, text.clone()).await?
        }
        Command::Convert { text } => {
            run_feature(&runtime, Feature::ConvertStyle, text.clone()).await?
        }
        Command::SetKey { key } => set_key(&runtime, key).await,
        Command::ShowKey => show_key(&runtime).await,
        Command::DeleteKey => delete_key(&runtime).await,
        Command::Check => check_model_api(&runtime, &args.base_url).await,
        Command::Interactive => {
            run_interactive_mode(&runtime).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
