//! CLI binary for samantha.

use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use samantha::chat::{ChatClient, ChatReply, HttpChatClient, HttpEmotionClient};
use samantha::config::ChatMode;
use samantha::conversation::{ConversationState, Sender, TurnToken};
use samantha::emotion::{EmotionDetector, KeywordEmotionDetector};
use samantha::presentation::{self, StreamedReply};
use samantha::speech::{
    CommandSynthesizer, PrintSynthesizer, RecognitionEvent, SpeechCapture, SpeechOutput,
    SpeechSynthesizer, TypedRecognizer,
};
use samantha::{ConversationEvent, MemoryStore, Orchestrator, SamanthaConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Buffered conversation events per subscriber.
const EVENT_CAPACITY: usize = 64;

/// Samantha: your emotionally intelligent AI companion.
#[derive(Parser)]
#[command(name = "samantha", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Start a conversation (the default).
    Chat,

    /// Show the memory bank, newest first.
    Memories {
        /// Show every stored memory instead of the panel size.
        #[arg(long)]
        all: bool,

        /// Show the full exchange for each memory.
        #[arg(long)]
        detail: bool,
    },

    /// Print the emotion heuristic's reading of TEXT as JSON.
    Analyze {
        /// Text to classify.
        text: String,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// Also write it to the default config path.
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SamanthaConfig::load_or_default(cli.config.as_deref())?;
    let _log_guard = init_tracing(&config);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(config).await,
        Command::Memories { all, detail } => show_memories(&config, all, detail),
        Command::Analyze { text } => {
            println!("{}", serde_json::to_string_pretty(&samantha::analyze(&text))?);
            Ok(())
        }
        Command::Config { write } => show_config(&config, write),
    }
}

/// Console logs go to stderr so stdout stays the conversation. The file
/// layer is kept alive by the returned guard.
fn init_tracing(config: &SamanthaConfig) -> Option<WorkerGuard> {
    let default_filter = config
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| "samantha=info".to_owned());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = if config.logging.file {
        let appender =
            tracing_appender::rolling::daily(samantha::samantha_dirs::logs_dir(), "samantha.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

async fn run_chat(config: SamanthaConfig) -> anyhow::Result<()> {
    println!("Samantha v{}", env!("CARGO_PKG_VERSION"));

    // Speech backends
    let (synth_tx, mut synth_rx) = mpsc::unbounded_channel();
    let synth: Box<dyn SpeechSynthesizer> =
        match CommandSynthesizer::detect(config.voice.synth_command.as_deref(), synth_tx.clone()) {
            Some(cmd) => Box::new(cmd),
            None => {
                info!("no TTS command found, replies will be printed only");
                Box::new(PrintSynthesizer::new(synth_tx))
            }
        };
    let capture = SpeechCapture::new(Box::new(TypedRecognizer::new()));
    let output = SpeechOutput::new(synth, &config.voice);

    // Remote services
    let mut chat = HttpChatClient::new(&config.chat)?;
    let mut chunk_rx = None;
    if config.chat.mode == ChatMode::Stream {
        let (chunk_tx, rx) = mpsc::unbounded_channel();
        chat = chat.with_chunk_sink(chunk_tx);
        chunk_rx = Some(rx);
    }
    let detector: Arc<dyn EmotionDetector> = match &config.chat.emotion_endpoint {
        Some(url) => Arc::new(HttpEmotionClient::new(url.clone(), config.chat.timeout_secs)?),
        None => Arc::new(KeywordEmotionDetector),
    };

    let (event_tx, event_rx) = broadcast::channel(EVENT_CAPACITY);
    let memory = MemoryStore::from_config(&config.memory);
    info!("memory log: {}", memory.path().display());

    let mut orch = Orchestrator::new(capture, output, Arc::new(chat), detector, &config)
        .with_memory(memory)
        .with_events(event_tx);
    let renderer = tokio::spawn(render_events(event_rx, chunk_rx));

    println!(
        "\nType a message and press Enter. Commands: /status /memories /voice /quit. Press Ctrl+C to stop.\n"
    );
    if config.conversation.greet_on_start {
        orch.greet(Local::now().hour());
    }

    let (reply_tx, mut reply_rx) =
        mpsc::unbounded_channel::<(TurnToken, samantha::Result<ChatReply>)>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("received Ctrl+C, shutting down...");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                match line.trim() {
                    "/quit" | "/exit" => break,
                    "/voice" => {
                        let enabled = !orch.voice_enabled();
                        orch.set_voice_enabled(enabled);
                        println!("Voice output {}", if enabled { "on" } else { "off" });
                    }
                    "/status" => {
                        println!(
                            "{}\n{}",
                            presentation::status_panel(orch.state(), orch.voice_enabled(), orch.reflection()),
                            presentation::emotion_panel(orch.last_emotion())
                        );
                    }
                    "/memories" => match orch.memory().map(|m| m.recent(config.memory.panel_size)) {
                        Some(Ok(records)) => println!("{}", presentation::memory_panel(&records)),
                        Some(Err(e)) => eprintln!("! {e}"),
                        None => println!("{}", presentation::memory_panel(&[])),
                    },
                    "" => orch.toggle(),
                    text => {
                        if !presentation::orb_enabled(orch.state()) {
                            println!("  (one moment, {})", presentation::orb_label(orch.state()).to_lowercase());
                            continue;
                        }
                        if orch.state() == ConversationState::Idle {
                            orch.start_listening();
                        }
                        let event = RecognitionEvent::Result { transcript: text.to_owned(), is_final: true };
                        if let Some(pending) = orch.handle_recognition(event).await {
                            let chat = orch.chat_client();
                            let tx = reply_tx.clone();
                            tokio::spawn(async move {
                                let result = chat.send(&pending.request).await;
                                let _ = tx.send((pending.token, result));
                            });
                        }
                    }
                }
            }
            Some((token, result)) = reply_rx.recv() => {
                orch.complete_turn(token, result);
            }
            Some(event) = synth_rx.recv() => {
                orch.handle_synthesis(event);
            }
        }
    }

    drop(orch);
    let _ = renderer.await;
    println!("Goodbye.");
    Ok(())
}

/// Print streamed chunks, assistant bubbles and notices as the
/// conversation emits them.
///
/// Chunks are drained first so a reply's text is always printed before its
/// finished bubble.
async fn render_events(
    mut rx: broadcast::Receiver<ConversationEvent>,
    mut chunks: Option<mpsc::UnboundedReceiver<String>>,
) {
    let mut stream = StreamedReply::default();
    loop {
        let event = tokio::select! {
            biased;
            Some(chunk) = next_chunk(&mut chunks) => {
                print!("{}", stream.push(&chunk));
                let _ = std::io::stdout().flush();
                continue;
            }
            event = rx.recv() => event,
        };
        match event {
            Ok(ConversationEvent::MessageAdded(message)) if message.sender == Sender::Assistant => {
                println!("{}", stream.finish(&message));
            }
            Ok(ConversationEvent::StateChanged(state)) => {
                if state == ConversationState::Processing {
                    println!("  {}", presentation::orb_label(state));
                }
            }
            Ok(ConversationEvent::EmotionDetected(emotion)) => {
                info!("user mood: {}", emotion.summary());
            }
            Ok(ConversationEvent::Notice(notice)) => eprintln!("! {notice}"),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged = n, "renderer lagged; some events were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn next_chunk(chunks: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match chunks {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn show_memories(config: &SamanthaConfig, all: bool, detail: bool) -> anyhow::Result<()> {
    let store = MemoryStore::from_config(&config.memory);
    let limit = if all {
        store.capacity()
    } else {
        config.memory.panel_size
    };
    let records = store.recent(limit)?;
    if detail && !records.is_empty() {
        for record in &records {
            println!("{}\n", presentation::memory_detail(record));
        }
    } else {
        println!("{}", presentation::memory_panel(&records));
    }
    Ok(())
}

fn show_config(config: &SamanthaConfig, write: bool) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    if write {
        let path = SamanthaConfig::default_config_path();
        config.save_to_file(&path)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
