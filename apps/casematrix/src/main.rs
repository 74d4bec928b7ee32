use anyhow::Result;
use casematrix_config::{EngineConfig, load_config};
use casematrix_distributor::InvocationContext;
use casematrix_engine::{ScenarioEngine, SelectionMode};
use casematrix_ids::MethodId;
use casematrix_logging::Logger;
use casematrix_resolver::{ParameterResolver, ResolverSpec};
use std::collections::HashMap;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "casematrix")]
#[command(about = "List, plan and validate scenario matrices.", long_about = None)]
struct Cli {
    /// Engine config (YAML or JSON). Its matrix list applies when no --matrix is given.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered methods with their scenario counts.
    Methods {
        /// Matrix file; repeat to merge several (later files win).
        #[arg(long = "matrix")]
        matrices: Vec<PathBuf>,
    },

    /// Show the invocations each method would produce.
    Plan {
        #[arg(long = "matrix")]
        matrices: Vec<PathBuf>,
        /// Only this method.
        #[arg(long)]
        method: Option<String>,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Validate matrix files.
    Check {
        #[arg(long = "matrix")]
        matrices: Vec<PathBuf>,
    },
}

/// Matrices loaded into a frozen engine, plus their naming templates.
struct Loaded {
    engine: ScenarioEngine,
    templates: HashMap<MethodId, String>,
}

impl Loaded {
    fn load(config: Option<&PathBuf>, matrices: Vec<PathBuf>) -> Result<Self> {
        let mut config = match config {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        if !matrices.is_empty() {
            config.matrices = matrices;
        }
        if config.matrices.is_empty() {
            anyhow::bail!("no matrix files given; pass --matrix or list them in --config");
        }

        let loaded = config.load_matrices()?;
        let engine = ScenarioEngine::new(loaded.store.freeze())
            .with_logger(Logger::new(config.logging.clone()));
        Ok(Self {
            engine,
            templates: loaded.templates,
        })
    }

    fn template(&self, method: &str) -> String {
        self.templates
            .get(method)
            .map_or(method, String::as_str)
            .to_string()
    }

    fn methods(&self) -> Vec<String> {
        self.engine
            .store()
            .method_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    fn plan(&self, method: &str) -> Result<MethodPlan> {
        let template = self.template(method);
        let invocations = self
            .engine
            .provide_invocations_with_template(method, template.clone())?;
        let mode = invocations.mode();

        let invocations = invocations
            .enumerate()
            .map(|(offset, distributor)| {
                let index = offset + 1;
                PlannedInvocation {
                    index,
                    label: distributor.label().to_string(),
                    display_name: distributor.display_name(index),
                    invocation_id: distributor.invocation_id().to_string(),
                    arguments: distributor
                        .parameter_resolvers()
                        .iter()
                        .map(ParameterResolver::spec)
                        .collect(),
                }
            })
            .collect();

        Ok(MethodPlan {
            method: method.to_string(),
            mode,
            template,
            invocations,
        })
    }
}

#[derive(Serialize)]
struct MethodPlan {
    method: String,
    #[serde(serialize_with = "serialize_mode")]
    mode: SelectionMode,
    template: String,
    invocations: Vec<PlannedInvocation>,
}

#[derive(Serialize)]
struct PlannedInvocation {
    index: usize,
    label: String,
    display_name: String,
    invocation_id: String,
    arguments: Vec<ResolverSpec>,
}

fn serialize_mode<S: serde::Serializer>(mode: &SelectionMode, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(mode)
}

fn print_plan(plan: &MethodPlan) -> Result<()> {
    println!(
        "{}: {} invocations ({})",
        plan.method,
        plan.invocations.len(),
        plan.mode
    );
    for inv in &plan.invocations {
        let arguments = inv
            .arguments
            .iter()
            .map(render_spec)
            .collect::<Result<Vec<_>>>()?;
        println!(
            "  [{}] {}  {}  [{}]",
            inv.index,
            inv.display_name,
            &inv.invocation_id[..inv.invocation_id.len().min(12)],
            arguments.join(", ")
        );
    }
    Ok(())
}

/// `index:value(typed|positional)`
fn render_spec(spec: &ResolverSpec) -> Result<String> {
    let binding = if spec.require_type_match {
        "typed"
    } else {
        "positional"
    };
    Ok(format!(
        "{}:{}({binding})",
        spec.position_index,
        serde_json::to_string(&spec.value)?
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Methods { matrices } => {
            let loaded = Loaded::load(cli.config.as_ref(), matrices)?;
            for method in loaded.methods() {
                let group = loaded.engine.store().lookup(&method)?;
                println!(
                    "{method}\t{} scenarios\t{}",
                    group.len(),
                    SelectionMode::for_group(group)
                );
            }
        }
        Command::Plan {
            matrices,
            method,
            json,
        } => {
            let loaded = Loaded::load(cli.config.as_ref(), matrices)?;
            let methods = match method {
                Some(method) => vec![method],
                None => loaded.methods(),
            };
            let plans = methods
                .iter()
                .map(|m| loaded.plan(m))
                .collect::<Result<Vec<_>>>()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                for plan in &plans {
                    print_plan(plan)?;
                }
            }
        }
        Command::Check { matrices } => {
            let loaded = Loaded::load(cli.config.as_ref(), matrices)?;
            let methods = loaded.methods();
            let mut scenarios = 0;
            for method in &methods {
                scenarios += loaded.engine.store().lookup(method)?.len();
            }
            println!("ok: {} methods, {scenarios} scenarios", methods.len());
        }
    }

    Ok(())
}
