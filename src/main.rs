//! Newsdesk demo - scripted conversational assistant
//!
//! A terminal shell around a simulated "Global News Network" assistant.
//! Answers come from a fixed catalog picked by keyword rules; searching and
//! typing are timed phases of a small state machine.

mod classifier;
mod config;
mod responses;
mod runtime;
mod shell;
mod state_machine;

use config::DemoConfig;
use runtime::{spawn_simulator, TokioScheduler};
use shell::{parse_command, prompt_menu, render_stream, Command, Renderer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the shell
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk_demo=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = DemoConfig::from_env()?;
    let context = config.build_context()?;
    tracing::info!(
        session_id = %context.session_id,
        rules = context.rules.rules().len(),
        responses = context.responses.len(),
        search_delay_ms = %context.search_delay.as_millis(),
        typing_delay_ms = %context.typing_delay.as_millis(),
        "Simulator configured"
    );

    let handle = spawn_simulator(context, TokioScheduler);

    // Render simulator events as they arrive
    let output = render_stream(handle.subscribe(), Renderer::new(config.output));
    let render_task = tokio::spawn(async move {
        tokio::pin!(output);
        while let Some(lines) = output.next().await {
            for line in lines {
                println!("{line}");
            }
        }
    });

    if config.output == config::OutputMode::Text {
        println!("bot> {}", responses::GREETING);
        for line in prompt_menu() {
            println!("{line}");
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Submit(text) => {
                handle.submit(text).await?;
            }
            Command::Reset => handle.reset().await?,
            Command::Prompts => {
                for line in prompt_menu() {
                    println!("{line}");
                }
            }
            Command::Quit => break,
            Command::Unknown(command) => {
                println!("unknown command {command}; try /prompts, /reset or /quit");
            }
        }
    }

    // Submitted turns always complete before the shell exits
    handle.settle().await?;
    tracing::info!(
        transcript_len = handle.snapshot().transcript.len(),
        "Shell input closed"
    );
    drop(handle);
    render_task.await?;

    Ok(())
}
