use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use taskrail_cli::{Engine, LineReport, parse_line};
use taskrail_infra::DispatchConfig;
use taskrail_observability::with_trace_id;

#[derive(Parser)]
#[command(name = "taskrail")]
#[command(about = "Submit and inspect background tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit entries read from stdin, one JSON object per line
    Submit {
        /// Bypass the queue and deliver on the notification channel
        #[arg(long)]
        immediate: bool,
        /// Skip invalid lines instead of reporting their violations
        #[arg(long)]
        lenient: bool,
        /// Trace id recorded by the log sink (default: a fresh UUID)
        #[arg(long)]
        trace_id: Option<String>,
    },
    /// Ask consumers to start draining the queue
    Start,
    /// Print the approximate number of queued entries
    Backlog,
    /// List registered processor types
    Types,
}

#[tokio::main]
async fn main() -> Result<()> {
    taskrail_observability::init();
    let cli = Cli::parse();

    let config = DispatchConfig::from_env()?;
    let engine = Engine::from_config(&config).await?;

    match cli.command {
        Commands::Submit {
            immediate,
            lenient,
            trace_id,
        } => {
            let trace_id = trace_id.unwrap_or_else(|| Uuid::now_v7().to_string());
            with_trace_id(trace_id, submit_stdin(&engine, immediate, lenient)).await
        }
        Commands::Start => {
            match engine.manager.fire_start_signal().await {
                Some(id) => println!("{id}"),
                None => anyhow::bail!("start signal was not delivered"),
            }
            Ok(())
        }
        Commands::Backlog => {
            println!("{}", engine.manager.backlog_size().await);
            Ok(())
        }
        Commands::Types => {
            for name in engine.dispatcher.registry().list_types() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn submit_stdin(engine: &Engine, immediate: bool, lenient: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut number = 0usize;

    while let Some(raw) = lines.next_line().await? {
        number += 1;
        let request = match parse_line(&raw) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                emit(&LineReport::Malformed {
                    line: number,
                    error: e.to_string(),
                })?;
                continue;
            }
        };

        let created = engine
            .manager
            .validator()
            .create(request.task_type, request.data, request.metadata, lenient)
            .await;

        let report = match created {
            Ok(None) => LineReport::Skipped { line: number },
            Err(e) => LineReport::Invalid {
                line: number,
                violations: e.violations,
            },
            Ok(Some(entry)) => {
                let id = if immediate {
                    engine.manager.fire_immediate(&entry).await
                } else {
                    engine.manager.submit(&entry).await
                };
                match id {
                    Some(id) => LineReport::Submitted { line: number, id },
                    None => LineReport::Unconfirmed { line: number },
                }
            }
        };
        emit(&report)?;
    }
    Ok(())
}

fn emit(report: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}
