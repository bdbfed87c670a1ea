//! Terminal shell around the simulator
//!
//! Parses input lines into commands and turns simulator events into lines
//! of output. All I/O stays in `main`.

use crate::config::OutputMode;
use crate::responses::SUGGESTED_PROMPTS;
use crate::runtime::SimulatorEvent;
use crate::state_machine::{Phase, Speaker};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Reset,
    Prompts,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(name) = trimmed.strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };
    match name {
        "reset" => Command::Reset,
        "prompts" => Command::Prompts,
        "quit" | "exit" => Command::Quit,
        _ => name
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| SUGGESTED_PROMPTS.get(i))
            .map_or_else(
                || Command::Unknown(trimmed.to_string()),
                |p| Command::Submit(p.prompt.to_string()),
            ),
    }
}

pub fn prompt_menu() -> Vec<String> {
    SUGGESTED_PROMPTS
        .iter()
        .enumerate()
        .map(|(i, p)| format!("  /{} [{}] {}", i + 1, p.label, p.prompt))
        .collect()
}

/// Stateful renderer; remembers what it already printed
#[derive(Debug, Default)]
pub struct Renderer {
    mode: OutputMode,
    printed: usize,
    phase: Phase,
    queued: usize,
}

impl Renderer {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn render(&mut self, event: &SimulatorEvent) -> Vec<String> {
        match self.mode {
            OutputMode::Json => match serde_json::to_string(event) {
                Ok(line) => vec![line],
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode event");
                    vec![]
                }
            },
            OutputMode::Text => self.render_text(event),
        }
    }

    fn render_text(&mut self, event: &SimulatorEvent) -> Vec<String> {
        let mut lines = Vec::new();
        match event {
            SimulatorEvent::Snapshot(snapshot) => {
                if snapshot.transcript.len() < self.printed {
                    lines.push("(conversation cleared)".to_string());
                    self.printed = 0;
                }
                for turn in snapshot.transcript.iter().skip(self.printed) {
                    // the user already sees what they typed
                    if turn.speaker == Speaker::Bot {
                        lines.push(format!("bot> {}", turn.text));
                        if !turn.sources.is_empty() {
                            lines.push(format!("     sources: {}", turn.sources.join("; ")));
                        }
                    }
                }
                self.printed = snapshot.transcript.len();

                if snapshot.phase != self.phase {
                    if let Some(indicator) = snapshot.phase.indicator() {
                        lines.push(format!("     {indicator}"));
                    }
                    self.phase = snapshot.phase;
                }
                if snapshot.queued > self.queued {
                    lines.push(format!("     (queued: {})", snapshot.queued));
                }
                self.queued = snapshot.queued;
            }
            SimulatorEvent::TurnSettled { .. } => {}
            SimulatorEvent::Error { message } => lines.push(format!("error: {message}")),
        }
        lines
    }
}

/// Rendered output for each event from a subscription; lagged events are skipped
pub fn render_stream(
    events: broadcast::Receiver<SimulatorEvent>,
    mut renderer: Renderer,
) -> impl Stream<Item = Vec<String>> {
    BroadcastStream::new(events)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer fell behind");
                None
            }
        })
        .map(move |event| renderer.render(&event))
}
