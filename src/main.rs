//! Journal Translator - tails Elite Dangerous journals and translates chat.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use journal_translator::config::{Config, ConfigLoader};
use journal_translator::display;
use journal_translator::translate::{LibreTranslateClient, TranslateCommand, Translator};
use journal_translator::watcher::{ChatEvent, JournalWatcher, TailerOptions};

#[derive(Parser)]
#[command(
    name = "journal-translator",
    about = "Tails Elite Dangerous journal files and translates in-game chat",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the journal directory and translate incoming chat.
    Watch {
        /// Journal directory (overrides the config file).
        #[arg(short, long)]
        directory: Option<String>,
        /// Only print chat, do not call the translation endpoint.
        #[arg(long)]
        no_translate: bool,
        /// Print without colors.
        #[arg(long)]
        plain: bool,
    },
    /// Translate a piece of text.
    Translate {
        /// Target language (defaults to the configured user language).
        #[arg(short, long)]
        to: Option<String>,
        /// Text to translate.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Create the default config file if none exists and print its path.
    InitConfig,
}

fn init_tracing(verbosity: u8, debug_logging: bool) {
    let level = match (verbosity, debug_logging) {
        (0 | 1, true) | (2, _) => "debug",
        (0, false) => "warn",
        (1, false) => "info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);

    if matches!(cli.command, Commands::InitConfig) {
        init_tracing(cli.verbose, false);
        return match loader.load_or_create() {
            Ok((_, path)) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                display::print_error(&e.to_string());
                ExitCode::FAILURE
            }
        };
    }

    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.verbose, false);
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.verbose, config.journal.debug_logging);

    if let Err(e) = config.validate() {
        display::print_error(&e.to_string());
        return ExitCode::from(2);
    }

    match cli.command {
        Commands::Watch {
            directory,
            no_translate,
            plain,
        } => {
            if let Some(directory) = directory {
                config.journal.directory = directory;
            }
            run_watch(&config, !no_translate, plain).await
        }
        Commands::Translate { to, text } => {
            let client = match LibreTranslateClient::from_config(&config.translate) {
                Ok(client) => client,
                Err(e) => {
                    display::print_error(&e.to_string());
                    return ExitCode::FAILURE;
                }
            };
            let target = to.unwrap_or_else(|| config.translate.user_language.clone());
            if translate_manual(&client, &text.join(" "), &target).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::InitConfig => ExitCode::SUCCESS,
    }
}

async fn run_watch(config: &Config, translate: bool, plain: bool) -> ExitCode {
    let translator: Option<Arc<dyn Translator>> = if translate {
        match LibreTranslateClient::from_config(&config.translate) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                display::print_error(&e.to_string());
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let mut watcher = JournalWatcher::new(TailerOptions::from(&config.journal));

    let (chat_tx, chat_rx) = mpsc::unbounded_channel::<ChatEvent>();
    watcher.controller().subscribe_chat(move |event| {
        let _ = chat_tx.send(event.clone());
    });
    watcher
        .controller()
        .subscribe_new_file(|name| display::print_new_journal(name));

    let worker = tokio::spawn(chat_worker(chat_rx, translator.clone(), plain));

    watcher.start().await;
    tracing::info!(
        dir = %watcher.controller().directory().display(),
        notifier = watcher.has_notifier(),
        "Watching journal directory"
    );
    display::print_info(&format!(
        "Watching {} (type `{} <language> <text>` to translate, Ctrl-C to quit)",
        watcher.controller().directory().display(),
        config.translate.command
    ));

    let mut input_rx = spawn_stdin_reader();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = input_rx.recv(), if stdin_open => match line {
                Some(line) => {
                    handle_input(&line, &config.translate.command, translator.as_deref()).await;
                }
                None => stdin_open = false,
            },
        }
    }

    watcher.stop().await;
    // Dropping the watcher drops the chat subscriber and closes the channel.
    drop(watcher);
    if let Err(e) = worker.await {
        tracing::warn!(error = %e, "Chat worker ended abnormally");
    }
    ExitCode::SUCCESS
}

/// Read stdin lines on a plain thread so a pending read never blocks
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Print chat in arrival order, translating each message when enabled.
async fn chat_worker(
    mut chat_rx: mpsc::UnboundedReceiver<ChatEvent>,
    translator: Option<Arc<dyn Translator>>,
    plain: bool,
) {
    while let Some(event) = chat_rx.recv().await {
        if plain {
            println!("{}", display::format_chat(&event));
        } else {
            display::print_chat(&event);
        }

        let Some(translator) = &translator else {
            continue;
        };
        match translator.translate(&event.message).await {
            Ok(translation) if translation.is_success() => {
                if plain {
                    println!("{}", translation.render());
                } else {
                    display::print_translation(&translation);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, from = %event.from, "Translation failed"),
        }
    }
}

async fn handle_input(line: &str, command: &str, translator: Option<&dyn Translator>) {
    if !TranslateCommand::matches(line, command) {
        return;
    }
    let parsed = match TranslateCommand::parse(line, command) {
        Ok(parsed) => parsed,
        Err(e) => {
            display::print_error(&e.to_string());
            return;
        }
    };
    let Some(translator) = translator else {
        display::print_error("Translation is disabled (--no-translate)");
        return;
    };
    translate_manual(translator, &parsed.text, &parsed.target_language).await;
}

/// Translate and print the result; returns whether it succeeded.
async fn translate_manual(translator: &dyn Translator, text: &str, target: &str) -> bool {
    match translator.translate_to(text, target).await {
        Ok(translation) if translation.is_success() => {
            println!("{}", translation.translated_text);
            true
        }
        Ok(_) => {
            display::print_error("Translation failed.");
            false
        }
        Err(e) => {
            display::print_error(&format!("Translation failed: {e}"));
            false
        }
    }
}
