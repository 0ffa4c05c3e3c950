//! `sigflow control`: the interactive lifecycle controller.

use crate::cli::ControlArgs;
use colored::Colorize;
use sp_core::config::validate_settings;
use sp_core::control::{drive, LifecycleController};
use sp_protocol::config_models::Settings;
use sp_protocol::ipc::{Event, ShutdownReason};
use std::io::{self, Write};
use std::path::Path;
use tokio::io::BufReader;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

const HELP: &str = "Commands: C (create), S (suspend), G (continue), F (finish)";

pub fn run(mut settings: Settings, args: ControlArgs) -> color_eyre::Result<()> {
    if let Some(program) = args.program {
        settings.controller.program = program;
        settings.controller.args = args.args;
    } else if !args.args.is_empty() {
        settings.controller.args = args.args;
    }
    validate_settings(&settings, Path::new("command line"))?;

    // Signal masks and child reaping stay on this one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(session(settings, args.json));
    // A stdin read may still be parked on the blocking pool after an interrupt.
    runtime.shutdown_background();

    let reason = outcome?;
    info!(?reason, "controller finished");
    Ok(())
}

async fn session(settings: Settings, json: bool) -> color_eyre::Result<ShutdownReason> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut controller = LifecycleController::new(settings.controller, events_tx);

    if !json {
        println!("Controller (PID: {}) started.", std::process::id());
        println!("{HELP}");
    }

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for interrupts");
            std::future::pending::<()>().await;
        }
    };

    let input = BufReader::new(tokio::io::stdin());
    let reason = drive(&mut controller, input, interrupt, |_| {
        render_pending(&mut events_rx, json);
        if !json {
            print!("> ");
            let _ = io::stdout().flush();
        }
    })
    .await?;

    if !json {
        println!();
    }
    render_pending(&mut events_rx, json);
    Ok(reason)
}

fn render_pending(events_rx: &mut UnboundedReceiver<Event>, json: bool) {
    while let Ok(event) = events_rx.try_recv() {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to encode event"),
            }
        } else {
            println!("{}", styled(&event));
        }
    }
}

/// Message shown to the operator for `event`.
fn describe(event: &Event) -> String {
    match event {
        Event::ChildCreated { pid, created_at } => format!(
            "Child process created with PID {pid} at {}.",
            created_at.format("%H:%M:%S UTC")
        ),
        Event::ChildAlreadyExists { pid } => {
            format!("A child process already exists (PID {pid}).")
        }
        Event::SpawnFailed { error } => format!("Failed to create the child process: {error}"),
        Event::NoActiveChild { op } => format!("No active child process to {op}."),
        Event::ChildSuspended { pid } => format!("Sent SIGSTOP to child process {pid}."),
        Event::ChildResumed { pid } => format!("Sent SIGCONT to child process {pid}."),
        Event::SignalFailed { pid, signal, error } => {
            format!("Failed to send {signal} to child process {pid}: {error}")
        }
        Event::ChildTerminated { pid } => format!("Child process {pid} terminated."),
        Event::ChildExited { pid, code } => match code {
            Some(code) => format!("Child process {pid} exited with status {code}."),
            None => format!("Child process {pid} was killed by a signal."),
        },
        Event::UnknownCommand { input } => {
            format!("Unknown command: '{input}'. Please use C, S, G or F.")
        }
        Event::ShuttingDown { reason } => match reason {
            ShutdownReason::Terminate => "Controller exiting.".to_string(),
            ShutdownReason::EndOfInput => "End of input. Controller exiting.".to_string(),
            ShutdownReason::Interrupted => "Interrupted. Controller exiting.".to_string(),
        },
    }
}

fn styled(event: &Event) -> String {
    let message = describe(event);
    match event {
        Event::SpawnFailed { .. } | Event::SignalFailed { .. } => message.red().to_string(),
        Event::ChildAlreadyExists { .. }
        | Event::NoActiveChild { .. }
        | Event::UnknownCommand { .. } => message.yellow().to_string(),
        _ => message,
    }
}
