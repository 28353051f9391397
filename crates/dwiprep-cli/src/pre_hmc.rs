use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use dwiprep_core::workflow::{pre_hmc_workflow, ParamValue, PreHmcOptions, WorkflowDefinition};

use crate::OutputFormat;

pub struct PreHmcArgs {
    pub dwi: Vec<PathBuf>,
    pub rpe: Vec<PathBuf>,
    pub pedir: String,
    pub denoise_window: Option<u32>,
    pub denoise_after_combining: bool,
    pub omp_nthreads: Option<u32>,
    pub low_mem: bool,
    pub name: Option<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

pub fn run_pre_hmc(args: PreHmcArgs) -> Result<ExitCode> {
    let config = crate::load_config(args.config.as_deref())?;
    let options = merge_options(PreHmcOptions::from(config.preprocessing), &args);

    let wf = pre_hmc_workflow(&args.dwi, &args.rpe, &args.pedir, &options)
        .context("failed to assemble pre-HMC workflow")?;

    match args.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&wf).context("failed to serialize workflow")?
            );
        }
        OutputFormat::Dot => print!("{}", wf.to_dot()),
        OutputFormat::Text => print_workflow(&wf)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Command-line flags win over the config file.
fn merge_options(mut options: PreHmcOptions, args: &PreHmcArgs) -> PreHmcOptions {
    if let Some(window) = args.denoise_window {
        options.dwi_denoise_window = window;
    }
    if args.denoise_after_combining {
        options.denoise_before_combining = false;
    }
    if let Some(threads) = args.omp_nthreads {
        options.omp_nthreads = threads;
    }
    if args.low_mem {
        options.low_mem = true;
    }
    if let Some(name) = &args.name {
        options.name = name.clone();
    }
    options
}

fn print_workflow(wf: &WorkflowDefinition) -> Result<()> {
    println!("Workflow: {}", wf.name);
    println!("{}", "=".repeat(40));
    println!();

    println!("Nodes ({}):", wf.nodes.len());
    for node in &wf.nodes {
        let params: Vec<String> = node
            .params
            .iter()
            .map(|(k, v)| format!("{k}={}", format_param(v)))
            .collect();
        let params = if params.is_empty() {
            String::new()
        } else {
            format!(" [{}]", params.join(", "))
        };
        println!("  {:<24} {:<18}{params}", node.id, node.kind.as_str());
        for (slot, value) in &node.static_inputs {
            println!("    {slot} = {}", format_param(value));
        }
    }
    println!();

    println!("Connections ({}):", wf.connections.len());
    for c in &wf.connections {
        println!(
            "  {}.{} -> {}.{}",
            c.source, c.source_output, c.destination, c.destination_input
        );
    }
    println!();

    println!("Execution levels:");
    let levels = wf.resolve_order().context("workflow graph is not acyclic")?;
    for (i, level) in levels.iter().enumerate() {
        println!("  [{}] {}", i + 1, level.join(", "));
    }
    println!();

    println!("Outputs:");
    for (slot, (node, output)) in wf.output_bindings() {
        println!("  {slot:<16} <- {node}.{output}");
    }
    Ok(())
}

fn format_param(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Str(s) => s.clone(),
        ParamValue::Files(files) => {
            let names: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
            format!("[{}]", names.join(", "))
        }
    }
}
