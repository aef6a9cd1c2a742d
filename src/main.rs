use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use sawt_gateway::{
    Config, ErpBackend, Gateway, OdooClient, OpenAiEnhancer, SessionState, SessionStore,
    SpeechSynthesizer, Synthesizer, Transcriber, VoiceRecognizer,
};

/// Sawt - Arabic voice commands for Odoo ERP
#[derive(Parser)]
#[command(name = "sawt", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable spoken replies (for headless use)
    #[arg(long, env = "SAWT_NO_SPEECH")]
    no_speech: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a single command from text
    Run {
        /// Command text, e.g. "كم مبيعات اليوم"
        text: String,
    },
    /// Interactive command loop
    Repl,
    /// Open one listening window fed from standard input
    Listen,
    /// Attempt an ERP login and report the outcome
    Login,
    /// Destroy the ERP session
    Logout,
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,sawt_gateway=info",
        1 => "info,sawt_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Run { text } => cmd_run(&config, cli.no_speech, &text).await,
            Command::Repl => cmd_repl(&config, cli.no_speech).await,
            Command::Listen => cmd_listen(&config, cli.no_speech).await,
            Command::Login => cmd_login(&config).await,
            Command::Logout => cmd_logout(&config).await,
            Command::Config => cmd_config(&config),
        };
    }

    tracing::info!(no_speech = cli.no_speech, "starting sawt gateway");
    cmd_repl(&config, cli.no_speech).await
}

/// Execute one command and print the resulting history entry
async fn cmd_run(config: &Config, no_speech: bool, text: &str) -> anyhow::Result<()> {
    let gateway = build_gateway(config, None, no_speech)?;
    gateway.initialize().await;

    gateway.execute_command(text).await;
    print_outcome(&gateway.state().await);

    Ok(())
}

/// Read commands from standard input until EOF or "exit"
async fn cmd_repl(config: &Config, no_speech: bool) -> anyhow::Result<()> {
    let gateway = build_gateway(config, None, no_speech)?;
    gateway.initialize().await;

    println!("sawt repl - type a voice command, \"exit\" to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                gateway.clear_commands().await;
                println!("history cleared");
                continue;
            }
            _ => {}
        }

        gateway.execute_command(line).await;
        print_outcome(&gateway.state().await);
    }

    Ok(())
}

/// Open one listening window, with standard input as the hypothesis source
async fn cmd_listen(config: &Config, no_speech: bool) -> anyhow::Result<()> {
    let (hypotheses, source) = mpsc::channel(8);
    let recognizer = Arc::new(VoiceRecognizer::new(
        source,
        Duration::from_secs(config.speech.listen_window_secs),
    ));

    let mut partials = recognizer.subscribe_partials();
    tokio::spawn(async move {
        while let Ok(partial) = partials.recv().await {
            tracing::debug!(partial = %partial, "partial transcript");
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if hypotheses.send(line).await.is_err() {
                break;
            }
        }
    });

    let transcriber: Arc<dyn Transcriber> = recognizer;
    let gateway = build_gateway(config, Some(transcriber), no_speech)?;
    gateway.initialize().await;

    println!(
        "listening - type your command within {} seconds",
        config.speech.listen_window_secs
    );
    gateway.start_listening(&config.speech.locale).await;
    print_outcome(&gateway.state().await);

    Ok(())
}

/// Attempt an ERP login and report the outcome
async fn cmd_login(config: &Config) -> anyhow::Result<()> {
    let client = build_erp(config)?;

    if client.login().await? {
        match client.user_id() {
            Some(uid) => println!("logged in (uid={uid})"),
            None => println!("logged in"),
        }
    } else {
        println!("credentials incomplete, login skipped");
    }

    Ok(())
}

/// Destroy the ERP session
async fn cmd_logout(config: &Config) -> anyhow::Result<()> {
    let client = build_erp(config)?;
    client.logout().await;
    println!("session destroyed");
    Ok(())
}

/// Show the effective configuration (secrets stay redacted)
fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("{config:#?}");
    Ok(())
}

fn build_erp(config: &Config) -> anyhow::Result<Arc<OdooClient>> {
    let store = SessionStore::new(&config.data_dir);
    let client = OdooClient::new(&config.erp, config.api_keys.odoo.clone(), store)?;
    Ok(Arc::new(client))
}

fn build_gateway(
    config: &Config,
    transcriber: Option<Arc<dyn Transcriber>>,
    no_speech: bool,
) -> anyhow::Result<Arc<Gateway>> {
    let mut gateway =
        Gateway::new(config.speech.reply_language.clone()).with_erp(build_erp(config)?);

    if let Some(transcriber) = transcriber {
        gateway = gateway.with_transcriber(transcriber);
    }

    if !no_speech
        && let Some(synthesizer) = build_synthesizer(config)
    {
        gateway = gateway.with_synthesizer(synthesizer);
    }

    if let Some(key) = &config.api_keys.openai {
        match OpenAiEnhancer::new(key.clone()) {
            Ok(enhancer) => gateway = gateway.with_enhancer(Arc::new(enhancer)),
            Err(e) => tracing::warn!(error = %e, "text enhancer unavailable"),
        }
    }

    Ok(Arc::new(gateway))
}

/// Build a synthesizer when TTS is configured, saving replies to disk
fn build_synthesizer(config: &Config) -> Option<Arc<dyn Synthesizer>> {
    let (sink, mut audio) = mpsc::channel::<Vec<u8>>(8);

    let synthesizer: Arc<dyn Synthesizer> = if let Some(url) = &config.speech.tts_url {
        Arc::new(SpeechSynthesizer::new_local(
            url.clone(),
            config.speech.tts_model.clone(),
            config.speech.tts_voice.clone(),
            sink,
        ))
    } else if let Some(key) = &config.api_keys.openai {
        match SpeechSynthesizer::new_openai(
            key.clone(),
            config.speech.tts_model.clone(),
            config.speech.tts_voice.clone(),
            sink,
        ) {
            Ok(synthesizer) => Arc::new(synthesizer),
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis unavailable");
                return None;
            }
        }
    } else {
        tracing::debug!("no TTS endpoint or API key, spoken replies disabled");
        return None;
    };

    let reply_path = config.data_dir.join("reply.mp3");
    tokio::spawn(async move {
        while let Some(bytes) = audio.recv().await {
            match tokio::fs::write(&reply_path, &bytes).await {
                Ok(()) => {
                    tracing::info!(
                        path = %reply_path.display(),
                        bytes = bytes.len(),
                        "spoken reply saved"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        path = %reply_path.display(),
                        error = %e,
                        "failed to write reply audio"
                    );
                }
            }
        }
    });

    Some(synthesizer)
}

/// Print the newest history entry, or the session error when nothing ran
fn print_outcome(state: &SessionState) {
    if let Some(command) = state.commands.first() {
        match serde_json::to_string_pretty(command) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to render command"),
        }
    } else if let Some(error) = &state.error {
        println!("error: {error}");
    }
}
