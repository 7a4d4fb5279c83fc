use anyhow::{Context, Result};
use chorus::client::{
    ClientConfig, ClientSession, IceState, LinkStatus, NoLocalMedia, Profile, SessionEvent,
    SessionHandle, WebRtcConnector, WsConnector,
};
use chorus::model::{DEFAULT_ROOM_CAPACITY, MediaPatch, MemberInfo};
use chorus::server::{ServerConfig, serve};
use chorus::ParticipantId;
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chorus")]
#[command(bin_name = "chorus")]
#[command(version, about = "Small-group voice rooms over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server
    Serve(ServeArgs),
    /// Join a room, or create one when no code is given
    Join(JoinArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    #[arg(long, default_value_t = DEFAULT_ROOM_CAPACITY)]
    max_room_size: usize,

    #[arg(long, default_value_t = 32)]
    max_id_attempts: usize,
}

#[derive(Args)]
struct JoinArgs {
    /// Six-character room code
    room: Option<String>,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Sample speaking activity at half rate
    #[arg(long)]
    constrained: bool,

    /// STUN/TURN urls; replaces the default STUN server
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chorus_server=info,chorus_client=info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => run_server(args).await,
        Commands::Join(args) => run_client(args).await,
    }
}

async fn run_server(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind_addr: args.bind,
        max_room_size: args.max_room_size,
        max_id_attempts: args.max_id_attempts,
        ..ServerConfig::default()
    };

    println!(
        "{} {}",
        "🎙  Chorus signaling on".green().bold(),
        format!("ws://{}/ws", config.bind_addr).bold()
    );

    serve(config, async {
        let _ = tokio::signal::ctrl_c().await;
        println!("{}", "Shutting down...".yellow());
    })
    .await
}

async fn run_client(args: JoinArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => tokio::task::spawn_blocking(prompt_name).await??,
    };

    let mut config = ClientConfig {
        server_url: args.server,
        ..ClientConfig::default()
    };
    if args.constrained {
        config.activity.profile = Profile::Constrained;
    }
    if !args.ice_servers.is_empty() {
        config.ice_servers = args.ice_servers;
    }

    let connector = Arc::new(WsConnector::new(config.server_url.clone()));
    let peers = Arc::new(
        WebRtcConnector::new(config.ice_servers.clone()).context("Failed to set up WebRTC")?,
    );
    let (session, handle, mut events) =
        ClientSession::new(config, connector, peers, Arc::new(NoLocalMedia::new()));
    tokio::spawn(session.run());

    match args.room {
        Some(code) => handle.join_room(code, name)?,
        None => handle.create_room(name)?,
    }
    println!("{}", "Commands: mute, unmute, leave, quit".dimmed());

    let mut roster = Roster::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                roster.print(&event);
            }

            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !run_command(&handle, line.trim())? {
                        stdin_open = false;
                    }
                }
                None => {
                    stdin_open = false;
                    let _ = handle.shutdown();
                }
            },

            _ = tokio::signal::ctrl_c() => {
                let _ = handle.shutdown();
            }
        }
    }

    Ok(())
}

fn prompt_name() -> Result<String> {
    Input::<String>::new()
        .with_prompt("Display name")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read display name")
}

/// Returns `false` once the user has asked to quit.
fn run_command(handle: &SessionHandle, command: &str) -> Result<bool> {
    match command {
        "" => {}
        "mute" => handle.set_media(MediaPatch::mic(false))?,
        "unmute" => handle.set_media(MediaPatch::mic(true))?,
        "leave" => handle.leave()?,
        "quit" | "exit" => {
            handle.shutdown()?;
            return Ok(false);
        }
        other => println!("{} {}", "Unknown command:".red(), other),
    }
    Ok(true)
}

/// Display names of the people in the room, keyed by participant id.
#[derive(Default)]
struct Roster {
    names: HashMap<ParticipantId, String>,
}

impl Roster {
    fn name(&self, id: &ParticipantId) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn reset(&mut self, members: &[MemberInfo]) {
        self.names = members
            .iter()
            .map(|m| (m.id.clone(), m.display_name.as_str().to_owned()))
            .collect();
    }

    fn print_members(&self, members: &[MemberInfo]) {
        if members.is_empty() {
            println!("   {}", "(nobody else here yet)".dimmed());
        }
        for member in members {
            let mic = if member.media.mic { "🎤" } else { "🔇" };
            println!("   {} {}", mic, member.display_name.as_str());
        }
    }

    fn print(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Connected => println!("{}", "Connected to signaling".dimmed()),
            SessionEvent::RoomCreated { room_code, .. } => {
                self.names.clear();
                println!(
                    "{} {}",
                    "✨ Created room".green().bold(),
                    room_code.as_str().bold()
                );
                println!("   {}", "Share the code to invite others".dimmed());
            }
            SessionEvent::RoomJoined {
                room_code, members, ..
            } => {
                self.reset(members);
                println!("{} {}", "✅ Joined room".green().bold(), room_code.as_str().bold());
                self.print_members(members);
            }
            SessionEvent::MemberJoined(member) => {
                self.names
                    .insert(member.id.clone(), member.display_name.as_str().to_owned());
                println!("{} {}", "+".green(), member.display_name.as_str());
            }
            SessionEvent::MemberLeft(id) => {
                println!("{} {}", "-".yellow(), self.name(id));
                self.names.remove(id);
            }
            SessionEvent::MediaChanged { id, media } => {
                if let Some(mic) = media.mic {
                    let state = if mic { "unmuted" } else { "muted" };
                    println!("   {} {}", self.name(id), state.dimmed());
                }
                if let Some(cam) = media.cam {
                    let state = if cam { "camera on" } else { "camera off" };
                    println!("   {} {}", self.name(id), state.dimmed());
                }
            }
            SessionEvent::PeerStatus(LinkStatus { remote, state, label }) => {
                let label = match state {
                    IceState::Failed => label.red(),
                    s if s.is_connected() => label.green(),
                    _ => label.yellow(),
                };
                println!("   {} {}", self.name(remote), label);
            }
            SessionEvent::Speaking(true) => println!("{}", "(speaking)".dimmed()),
            SessionEvent::Speaking(false) => {}
            SessionEvent::Disconnected => println!("{}", "⚠ Signaling connection lost".yellow()),
            SessionEvent::Reconnecting { attempt } => {
                println!("{} {}", "↻ Reconnecting, attempt".yellow(), attempt);
            }
            SessionEvent::Rejoined { members, .. } => {
                self.reset(members);
                println!("{}", "✅ Back in the room".green().bold());
                self.print_members(members);
            }
            SessionEvent::Left => {
                self.names.clear();
                println!("{}", "Left the room".dimmed());
            }
            SessionEvent::Error(e) => println!("{} {}", "Error:".red().bold(), e),
            SessionEvent::Terminated(e) => println!("{} {}", "Session ended:".red().bold(), e),
        }
    }
}
