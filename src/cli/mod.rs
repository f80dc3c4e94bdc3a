//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;
pub mod settings;

use std::error::Error;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::controller::ConversationController;
use crate::core::gemini::GeminiBackend;
use crate::core::keyring::{self, ApiKey};
use crate::core::preferences::{Language, ThemeKind};
use crate::core::session::SessionManager;
use crate::core::translate::IdentityTranslator;
use crate::ui::app::AppSettings;
use crate::ui::chat_loop::run_chat;
use crate::ui::transcript::RenderOptions;
use crate::utils::logging::{self, LogTarget};
use settings::{set_value, unset_value, ConfigKey};

#[derive(Parser)]
#[command(name = "palaver")]
#[command(version)]
#[command(about = "A terminal chat assistant backed by Google Gemini")]
#[command(
    long_about = "Palaver is a full-screen terminal chat assistant. Messages are sent to a \
Gemini model and the replies are rendered as markdown.\n\n\
Authentication:\n\
  Use 'palaver auth' to store an API key in your system keyring.\n\n\
Environment Variables (checked before the keyring):\n\
  GEMINI_API_KEY    Your Gemini API key\n\
  GOOGLE_API_KEY    Alternative name for the same key\n\
  PALAVER_LOG       Log filter, e.g. 'palaver=debug'\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  Up/Down/Mouse     Scroll through the conversation\n\
  PgUp/PgDn         Scroll a page at a time\n\
  Ctrl+T            Switch between light and dark theme\n\
  Ctrl+L            Cycle the conversation language\n\
  Esc / Ctrl+C      Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to talk to (overrides the configured default)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Theme to start with: light or dark
    #[arg(long, global = true, value_name = "THEME")]
    pub theme: Option<ThemeKind>,

    /// Language to converse in: en, es or hi
    #[arg(long, global = true, value_name = "LANG")]
    pub language: Option<Language>,

    /// Read and write configuration at this path instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply without the chat interface
    Say {
        /// The message to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (model, base-url, theme, language, markdown, syntax, timeout)
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
    /// Store an API key in the system keyring
    Auth,
    /// Remove the stored API key from the system keyring
    Deauth,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let mut args = Args::parse();

    match args.command.take().unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let (config, _) = Config::load(args.config.as_deref())?;
            let target = args
                .log_file
                .clone()
                .or_else(logging::default_log_path)
                .map(LogTarget::File)
                .unwrap_or(LogTarget::Stderr);
            logging::init(&target, config.log_filter.as_deref())?;

            let api_key = keyring::resolve_api_key()?;
            let model = args.model.clone().unwrap_or_else(|| config.model().to_string());
            let language = args.language.unwrap_or_else(|| config.language());
            let controller = build_controller(&config, &model, &api_key, language)?;
            let settings = AppSettings {
                model,
                theme: args.theme.unwrap_or_else(|| config.theme()),
                language,
                render: RenderOptions {
                    markdown: config.markdown_enabled(),
                    syntax_highlighting: config.syntax_enabled(),
                },
            };
            run_chat(controller, settings).await
        }
        Commands::Say { prompt } => {
            let (config, _) = Config::load(args.config.as_deref())?;
            let target = args
                .log_file
                .clone()
                .map(LogTarget::File)
                .unwrap_or(LogTarget::Stderr);
            logging::init(&target, config.log_filter.as_deref())?;

            let api_key = keyring::resolve_api_key()?;
            let model = args.model.clone().unwrap_or_else(|| config.model().to_string());
            let language = args.language.unwrap_or_else(|| config.language());
            let controller = build_controller(&config, &model, &api_key, language)?;
            say::run_say(controller, prompt, config.markdown_enabled()).await
        }
        Commands::Set { key, value } => {
            let key: ConfigKey = key.parse()?;
            let (mut config, path) = Config::load(args.config.as_deref())?;
            let message = set_value(&mut config, key, &value.join(" "))?;
            config.save_to_path(&path)?;
            println!("{message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let key: ConfigKey = key.parse()?;
            let (mut config, path) = Config::load(args.config.as_deref())?;
            let message = unset_value(&mut config, key);
            config.save_to_path(&path)?;
            println!("{message}");
            Ok(())
        }
        Commands::Config => {
            let (config, path) = Config::load(args.config.as_deref())?;
            println!("Config file: {}", crate::core::config::path_display(&path));
            config.print_all();
            Ok(())
        }
        Commands::Auth => interactive_auth(),
        Commands::Deauth => {
            if keyring::remove_api_key()? {
                println!("✅ Removed the stored API key");
            } else {
                println!("No API key was stored in the keyring");
            }
            Ok(())
        }
    }
}

/// Wire the Gemini backend, session manager and controller together.
pub fn build_controller(
    config: &Config,
    model: &str,
    api_key: &ApiKey,
    language: Language,
) -> Result<ConversationController, Box<dyn Error>> {
    let timeout = config.request_timeout();
    let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
    let backend = GeminiBackend::new(api_key.expose(), model)
        .with_base_url(config.base_url())
        .with_generation(config.generation_config())
        .with_client(client);
    info!(model, source = %api_key.source(), "gemini backend ready");

    let sessions = SessionManager::new(Arc::new(backend), timeout);
    Ok(ConversationController::new(sessions, Arc::new(IdentityTranslator)).with_language(language))
}

fn interactive_auth() -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Paste your Gemini API key: ");
        io::stdout().flush()?;
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    keyring::store_api_key(&line)?;
    println!("✅ API key stored in the system keyring");
    if keyring::API_KEY_ENV_VARS
        .iter()
        .any(|var| std::env::var_os(var).is_some())
    {
        warn!("environment key takes precedence over the keyring");
        println!("⚠️  An API key in the environment will still be used first");
    }
    Ok(())
}
