//! Subcommand implementations.

use color_eyre::eyre::{eyre, Result};
use colored::Colorize;
use seq_core::config::{load_config, AppConfig};
use seq_core::steps::StepFactory;
use seq_core::{JsonFileStateProvider, Process, StateProvider, Step};
use seq_protocol::ipc::ProcessEvent;
use seq_protocol::process_models::ProcessingState;
use seq_protocol::step_models::ProcessDefinition;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

/// Print the declared processes.
pub async fn list(root: &Path) -> Result<()> {
    let config = load_config(root).await?;

    if config.processes.is_empty() {
        println!("{}", "No processes declared in .sequencer/processes".yellow());
        return Ok(());
    }

    for definition in &config.processes {
        println!("{}", definition.name.bold());
        for step in &definition.steps {
            let mut line = format!("  - {}", step.name);
            if !step.items.is_empty() {
                line.push_str(&format!(" [{}]", step.items.join(", ")));
            }
            if !step.depends_on.is_empty() {
                let deps: Vec<String> = step.depends_on.iter().map(ToString::to_string).collect();
                line.push_str(&format!(" <- {}", deps.join(", ")));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

/// Run a whole process, printing its events as JSON lines.
pub async fn run(root: &Path, process_name: &str, throw: bool) -> Result<()> {
    let config = load_config(root).await?;
    let throw = throw || config.global.throw_error;
    let mut process = build_process(root, &config, process_name)?;
    let printer = spawn_printer(process.subscribe());

    let outcome = process.run(throw).await;
    let state = process.processing_state();
    let error = process.error().map(str::to_string);
    drop(process);
    printer.await?;

    outcome?;
    report(state, error.as_deref());
    Ok(())
}

/// Run one step of a process and print its resulting record.
pub async fn run_step(
    root: &Path,
    process_name: &str,
    step_name: &str,
    item: Option<&str>,
    throw: bool,
    args: Option<&Value>,
) -> Result<()> {
    let config = load_config(root).await?;
    let throw = throw || config.global.throw_error;
    let mut process = build_process(root, &config, process_name)?;
    let printer = spawn_printer(process.subscribe());

    let outcome = process.run_step(step_name, item, throw, args).await;
    drop(process);
    printer.await?;

    match outcome? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(eyre!(
            "Step {}{} is not declared in process {}",
            step_name,
            item.map(|id| format!("[{id}]")).unwrap_or_default(),
            process_name
        )),
    }
}

/// Print the persisted state of every step, or of one step.
pub async fn status(root: &Path, process_name: &str, step_name: Option<&str>) -> Result<()> {
    let config = load_config(root).await?;
    let process = build_process(root, &config, process_name)?;

    let mut names: Vec<&str> = Vec::new();
    for step in process.steps() {
        if !names.contains(&step.name()) {
            names.push(step.name());
        }
    }
    if let Some(step_name) = step_name {
        if !names.contains(&step_name) {
            return Err(eyre!("Step {} is not declared in process {}", step_name, process_name));
        }
        names.retain(|name| *name == step_name);
    }

    let mut states = Map::new();
    for name in names {
        let state = process.get_step_state(name).await?;
        states.insert(name.to_string(), serde_json::to_value(state)?);
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(states))?);
    Ok(())
}

fn find_definition<'a>(config: &'a AppConfig, process_name: &str) -> Result<&'a ProcessDefinition> {
    config.process(process_name).ok_or_else(|| {
        eyre!(
            "Process {} not found in .sequencer/processes (available: {})",
            process_name,
            config
                .processes
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn build_process(root: &Path, config: &AppConfig, process_name: &str) -> Result<Process> {
    let definition = find_definition(config, process_name)?;
    let steps = StepFactory::build_process_steps(definition).map_err(|e| eyre!("{e:#}"))?;
    let state_file = config.state_file(root);
    debug!(state_file = %state_file.display(), "using JSON state provider");

    let provider: Arc<dyn StateProvider> = Arc::new(JsonFileStateProvider::new(state_file));
    let process = Process::new(definition.name.clone(), steps, provider, definition.input.clone())?;
    Ok(process)
}

/// Print every event as one JSON line until the process is dropped.
fn spawn_printer(mut rx: UnboundedReceiver<ProcessEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("{} {}", "failed to encode event:".red(), e),
            }
        }
    })
}

fn report(state: ProcessingState, error: Option<&str>) {
    match (state, error) {
        (ProcessingState::Failed, Some(error)) => {
            eprintln!("{} {}", "Process failed:".red().bold(), error)
        }
        (state, _) => eprintln!("{} {}", "Process".green(), state.to_string().green().bold()),
    }
}
