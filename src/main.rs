use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_chat_client::{
    Config, ConsoleView, FileMicrophone, Microphone, SessionController, SessionIdentity,
    UnavailableMicrophone, UserAction, WsConnector,
};

/// Terminal client for a real-time voice/text conversation backend
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Configuration file (TOML), extension optional
    #[arg(long, default_value = "config/voice-chat")]
    config: String,

    /// Backend base URL, overrides `server.url`
    #[arg(long)]
    server: Option<String>,

    /// WAV file used as the microphone when recording
    #[arg(long)]
    audio_file: Option<PathBuf>,

    /// Directory reply audio is saved to, overrides `audio.playback_dir`
    #[arg(long)]
    playback_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let mut session_config = cfg.session_config();
    if let Some(server) = args.server {
        session_config.server_url = server;
    }
    let playback_dir = args.playback_dir.unwrap_or_else(|| cfg.playback_dir());

    let microphone: Arc<dyn Microphone> = match &args.audio_file {
        Some(path) => Arc::new(FileMicrophone::new(path)),
        None => Arc::new(UnavailableMicrophone),
    };

    info!("Voice chat client v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", session_config.server_url);
    info!(
        "Speech languages: {} -> {}",
        session_config.speech.language_code, session_config.speech.target_language_code
    );
    info!("Microphone: {}", microphone.name());
    info!("Type a message and press Enter. /rec toggles recording, /quit exits.");

    let view = Arc::new(ConsoleView::new(playback_dir)?);
    let controller = SessionController::new(
        SessionIdentity::generate(),
        session_config,
        Arc::new(WsConnector),
        microphone,
        view,
    );

    let (action_tx, action_rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let action = match line.trim() {
                "/quit" => break,
                "/rec" => UserAction::ToggleRecording,
                text => UserAction::SubmitText(text.to_string()),
            };
            if action_tx.send(action).await.is_err() {
                break;
            }
        }
    });

    controller.run(action_rx).await;

    info!("Goodbye");
    Ok(())
}
