use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use gantry::config::Config;
use gantry::planning::{annotate, apply_plan_change, overlap_score, Scheduler};
use gantry::{
    Error, JsonFileStore, Milestone, ProjectGraph, ProjectStage, Result, Task, TaskCategory,
    TeamType,
};

/// Gantry - dependency tracking and next-task recommendation for HW/SW programs
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    GANTRY_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.gantry/gantry.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Task file to use instead of the configured one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Risk inventory budget override
    #[arg(long, global = true)]
    pub budget: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new task
    Add {
        /// Unique task id (e.g. HW-3)
        id: String,

        /// Task name
        name: String,

        /// Stage: 1-5 or its name
        #[arg(long, default_value = "3")]
        stage: ProjectStage,

        /// hardware or software (defaults from the stage)
        #[arg(long)]
        team: Option<TeamType>,

        /// critical, infrastructure or support
        #[arg(long, default_value = "critical")]
        category: TaskCategory,

        /// Comma separated dependency ids
        #[arg(long, value_delimiter = ',')]
        deps: Vec<String>,

        #[arg(long, default_value_t = 0.1)]
        volatility: f64,

        /// Expected duration in hours
        #[arg(long, default_value_t = 4.0)]
        duration: f64,

        #[arg(long, default_value = "")]
        component: String,

        #[arg(long, default_value = "user")]
        assigner: String,

        /// Milestone as NAME:TRIGGER (e.g. interface:0.6)
        #[arg(long)]
        milestone: Option<String>,

        /// Context switch penalty, 0-5
        #[arg(long, default_value_t = 0)]
        switch_cost: u8,

        /// Task this one supports
        #[arg(long)]
        supports: Option<String>,
    },

    /// Update progress and status of a task
    Progress {
        id: String,

        /// Progress between 0.0 and 1.0
        progress: f64,

        /// pending, in_progress, waiting_for_validation, done or blocked
        #[arg(long, default_value = "in_progress")]
        status: String,
    },

    /// Record a plan change (new volatility)
    Volatility {
        id: String,

        volatility: f64,

        /// Reset downstream work if the change crosses the scrap threshold
        #[arg(long)]
        cascade: bool,
    },

    /// Reset all downstream work of a task
    Reset { id: String },

    /// List tasks that can be started now
    Ready,

    /// Print the lane recommendation report
    Report,

    /// Print the swarming recommendation
    Swarm,

    /// Print completion and per-task risk/readiness
    Status,

    /// Score starting DOWNSTREAM before UPSTREAM finishes
    Overlap { upstream: String, downstream: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    gantry::log::init_with_debug(cli.debug);

    let mut config = Config::load()?;
    if let Some(budget) = cli.budget {
        config.risk_budget = budget;
        config.validate()?;
    }
    let store_path = match cli.store {
        Some(path) => path,
        None => config.effective_store_path()?,
    };

    let mut project = ProjectGraph::open(JsonFileStore::new(store_path))?;
    let scheduler = Scheduler::from_config(&config)?;

    match cli.command {
        Command::Add {
            id,
            name,
            stage,
            team,
            category,
            deps,
            volatility,
            duration,
            component,
            assigner,
            milestone,
            switch_cost,
            supports,
        } => {
            let mut task = Task::new(id, &name, team.unwrap_or(stage.default_team()), stage)
                .with_category(category)
                .with_dependencies(deps.iter().map(|d| d.trim()).filter(|d| !d.is_empty()))
                .with_volatility(volatility)
                .with_expected_duration(duration)
                .with_component(&component)
                .with_assigner(&assigner)
                .with_switch_cost(switch_cost);
            if let Some(spec) = milestone {
                task.milestones.push(parse_milestone(&spec)?);
            }
            if let Some(target) = supports {
                task = task.with_target_support(target);
            }
            let id = task.id.clone();
            project.insert_task(task)?;
            print_json(&json!({
                "added": id,
                "swarming": scheduler.swarming_recommendation(&project),
            }))
        }
        Command::Progress {
            id,
            progress,
            status,
        } => {
            let status = project.update_progress(&id, progress, &status)?;
            print_json(&json!({ "task": id, "status": status }))
        }
        Command::Volatility {
            id,
            volatility,
            cascade,
        } => {
            let change =
                apply_plan_change(&mut project, &id, volatility, config.scrap_threshold, cascade)?;
            print_json(&json!({ "task": id, "change": change }))
        }
        Command::Reset { id } => {
            let reset = project.reset_downstream(&id)?;
            print_json(&json!({ "task": id, "reset": reset }))
        }
        Command::Ready => print_json(&project.get_ready_tasks()),
        Command::Report => print_json(&scheduler.report(&project)),
        Command::Swarm => print_json(&scheduler.swarming_recommendation(&project)),
        Command::Status => print_json(&json!({
            "completion": project.completion(),
            "complete": project.completion().is_complete(),
            "tasks": annotate(&project),
        })),
        Command::Overlap {
            upstream,
            downstream,
        } => {
            let score = match (project.get_task(&upstream), project.get_task(&downstream)) {
                (Some(up), Some(down)) => overlap_score(up, down),
                _ => None,
            };
            print_json(&json!({
                "upstream": upstream,
                "downstream": downstream,
                "score": score,
                "worthwhile": score.is_some_and(|s| s > 0.0),
            }))
        }
    }
}

fn parse_milestone(spec: &str) -> Result<Milestone> {
    let (name, trigger) = spec
        .rsplit_once(':')
        .ok_or_else(|| Error::Validation(format!("milestone must be NAME:TRIGGER, got {}", spec)))?;
    let trigger: f64 = trigger
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("invalid milestone trigger: {}", trigger)))?;
    Ok(Milestone::new(name.trim(), trigger))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
