use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, ClientError, PanelClient};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{clamp_to_slider, parse_command, Command, HELP};

#[derive(Parser, Debug)]
#[command(about = "Text control panel for a websocket-connected controller")]
struct Args {
    /// Panel settings file; defaults to ./panel.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Controller websocket URL or bare host, e.g. ws://192.168.1.40/ws.
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    decimals: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut config = load_settings(args.config.as_deref()).context("failed to load panel settings")?;
    if let Some(url) = args.url {
        config.gateway_url = url;
    }
    if let Some(decimals) = args.decimals {
        config.decimals = decimals;
    }
    config.validate()?;

    let client = PanelClient::connect(Arc::new(config))?;
    print!("{}", render::render_sliders(&client.sliders()));
    println!("{HELP}");

    let mut notices = client.subscribe_notices();
    let printer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => println!("{}", render::render_notice(&notice)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "panel: display fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = run(&client, command) {
            eprintln!("{err}");
        }
    }

    printer.abort();
    client.shutdown().await;
    Ok(())
}

fn run(client: &PanelClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Press(button) => client.press(button),
        Command::Toggle(channel) => client.toggle(channel),
        Command::Tune(channel, value) => {
            let value = clamp_to_slider(&client.sliders(), channel.as_str(), value);
            client.tune(channel, value)
        }
        Command::Set(name, value) => {
            let value = clamp_to_slider(&client.sliders(), name.as_str(), value);
            client.set(name, value)
        }
        Command::Show => {
            print!("{}", render::render_snapshot(&client.snapshot()));
            Ok(())
        }
        Command::Sliders => {
            print!("{}", render::render_sliders(&client.sliders()));
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}
