use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config_form::{ConfigDraft, PlaylistDraft},
    history::HistoryView,
    ClientError, SessionController, SyncApi, SyncClient,
};
use shared::domain::SessionStatus;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_server_url, SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(name = "uplink", about = "Control client for the playlist sync service")]
struct Cli {
    /// Base URL of the sync service; overrides settings file and environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    settings: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a sync run and follow its log until it ends. Ctrl-C stops the job.
    Run {
        /// Also write the log as HTML to this file when the run ends.
        #[arg(long)]
        html_log: Option<PathBuf>,
    },
    /// Ask the service to stop the running job.
    Stop,
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    History {
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    SetUrl {
        url: String,
    },
    SetInterval {
        #[arg(conflicts_with_all = ["increase", "decrease"], required_unless_present_any = ["increase", "decrease"])]
        value: Option<String>,
        #[arg(long, conflicts_with = "decrease")]
        increase: bool,
        #[arg(long)]
        decrease: bool,
    },
    AddPlaylist {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        folder: String,
        #[arg(long)]
        metube_folder: Option<String>,
    },
    RemovePlaylist {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.settings);
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    let server_url = normalize_server_url(&settings.server_url)?;
    let client = SyncClient::new(&server_url)?.with_request_timeout(settings.request_timeout());
    info!(server = %server_url, "using sync service");

    match cli.command {
        Command::Run { html_log } => {
            let status = run_session(Arc::new(client), html_log).await?;
            return Ok(if status.is_terminal_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
        Command::Stop => {
            let response = client.stop().await.context("중지 요청 실패")?;
            println!("{}", response.message);
        }
        Command::Config { action } => return edit_config(&client, action).await,
        Command::History { search } => {
            let entries = client
                .fetch_history()
                .await
                .context("기록을 불러오는 중 오류가 발생했습니다")?;
            print!("{}", render::history(&HistoryView::new(entries), search.as_deref()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_session<A: SyncApi>(api: Arc<A>, html_log: Option<PathBuf>) -> Result<SessionStatus> {
    let mut controller = SessionController::new(api);
    render::print_updates(&controller.start());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_requested = false;

    loop {
        tokio::select! {
            updates = controller.next_updates() => match updates {
                Some(updates) => render::print_updates(&updates),
                None => break,
            },
            signal = &mut ctrl_c, if !stop_requested => {
                stop_requested = true;
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for ctrl-c");
                    continue;
                }
                render::print_updates(&controller.stop().await);
            }
        }
    }

    if let Some(path) = html_log {
        tokio::fs::write(&path, controller.log().to_html())
            .await
            .with_context(|| format!("failed to write html log '{}'", path.display()))?;
        info!(path = %path.display(), "html log written");
    }

    Ok(controller.status())
}

async fn edit_config<A: SyncApi>(api: &A, action: ConfigCommand) -> Result<ExitCode> {
    let current = api
        .fetch_config()
        .await
        .context("설정을 불러오는 중 오류가 발생했습니다")?;
    let mut draft = ConfigDraft::from_config(&current);

    match action {
        ConfigCommand::Show => {
            print!("{}", render::config(&draft));
            return Ok(ExitCode::SUCCESS);
        }
        ConfigCommand::SetUrl { url } => draft.metube_url = url,
        ConfigCommand::SetInterval {
            value,
            increase,
            decrease,
        } => {
            if increase {
                draft.increment_interval();
            } else if decrease {
                draft.decrement_interval();
            } else if let Some(value) = value {
                draft.set_interval_input(&value);
            }
        }
        ConfigCommand::AddPlaylist {
            name,
            url,
            folder,
            metube_folder,
        } => draft.add_playlist(PlaylistDraft {
            name,
            url,
            folder,
            metube_folder: metube_folder.unwrap_or_default(),
        }),
        ConfigCommand::RemovePlaylist { name } => {
            let Some(index) = draft.position_of(&name) else {
                eprintln!("playlist '{name}' not found");
                return Ok(ExitCode::FAILURE);
            };
            draft.remove_playlist(index);
        }
    }

    save_config(api, &draft).await
}

async fn save_config<A: SyncApi>(api: &A, draft: &ConfigDraft) -> Result<ExitCode> {
    let config = draft.to_config();
    let dropped = draft.playlists.len() - config.playlists.len();
    if dropped > 0 {
        info!(dropped, "skipping playlists without name, url or folder");
    }

    match api.save_config(&config).await {
        Ok(()) => {
            println!("설정이 저장되었습니다.");
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::Rejected(rejection)) => {
            eprintln!("저장 실패: {}", rejection.message);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).context("저장 중 오류 발생"),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
