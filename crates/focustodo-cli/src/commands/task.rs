//! Task management commands for CLI.

use std::path::Path;

use clap::Subcommand;
use focustodo_core::{Database, Priority, Task, TaskUpdate};
use serde::Serialize;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new task
    Add {
        /// Task title
        title: String,
        /// Estimated pomodoros (1-12)
        #[arg(long, short = 'e', default_value = "1")]
        estimate: u32,
        /// Priority: p1 (highest) to p4
        #[arg(long, short = 'p', default_value = "p2")]
        priority: Priority,
    },
    /// List tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New estimate
        #[arg(long, short = 'e')]
        estimate: Option<u32>,
        /// New priority
        #[arg(long, short = 'p')]
        priority: Option<Priority>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Mark a task done, or undone again
    Toggle {
        /// Task ID
        id: String,
    },
    /// Choose the task credited by completed focus sessions
    Activate {
        /// Task ID
        id: String,
    },
    /// Stop crediting focus sessions to any task
    Deactivate,
    /// Show the active task
    Active,
}

#[derive(Serialize)]
struct TaskRow<'a> {
    #[serde(flatten)]
    task: &'a Task,
    active: bool,
    /// Share of the estimate completed, 0.0 to 1.0
    progress: f64,
}

impl<'a> TaskRow<'a> {
    fn new(task: &'a Task, active: bool) -> Self {
        Self {
            task,
            active,
            progress: task.completion_percentage(),
        }
    }
}

fn print_task(task: &Task, active: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&TaskRow::new(task, active))?);
    Ok(())
}

pub fn run(action: TaskAction, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in(dir)?;

    match action {
        TaskAction::Add {
            title,
            estimate,
            priority,
        } => {
            let task = Task::new(title, estimate, priority)?;
            db.add_task(&task)?;
            println!("Task added: {}", task.id);
        }
        TaskAction::List { json } => {
            let tasks = db.list_tasks()?;
            let active = db.active_task_id()?;
            let is_active = |t: &Task| active.as_deref() == Some(t.id.as_str());

            if json {
                let rows: Vec<TaskRow> = tasks
                    .iter()
                    .map(|task| TaskRow::new(task, is_active(task)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    let marker = if is_active(task) { '*' } else { ' ' };
                    let check = if task.completed { 'x' } else { ' ' };
                    println!(
                        "{marker} [{check}] {}  {}  {}/{} ({:.0}%)  {}",
                        task.id,
                        task.priority,
                        task.completed_pomodoros,
                        task.estimated_pomodoros,
                        task.completion_percentage() * 100.0,
                        task.title
                    );
                }
            }
        }
        TaskAction::Update {
            id,
            title,
            estimate,
            priority,
        } => {
            let update = TaskUpdate {
                title,
                estimated_pomodoros: estimate,
                priority,
            };
            let task = db.update_task(&id, update)?;
            let active = db.active_task_id()?.as_deref() == Some(id.as_str());
            print_task(&task, active)?;
        }
        TaskAction::Delete { id } => {
            if !db.delete_task(&id)? {
                return Err(format!("task not found: {id}").into());
            }
            println!("Task deleted: {id}");
        }
        TaskAction::Toggle { id } => {
            let task = db.toggle_task_complete(&id)?;
            let active = db.active_task_id()?.as_deref() == Some(id.as_str());
            print_task(&task, active)?;
        }
        TaskAction::Activate { id } => {
            db.set_active_task(&id)?;
            println!("Active task: {id}");
        }
        TaskAction::Deactivate => {
            db.clear_active_task()?;
            println!("No active task.");
        }
        TaskAction::Active => match db.active_task_id()? {
            Some(id) => match db.get_task(&id)? {
                Some(task) => print_task(&task, true)?,
                None => println!("null"),
            },
            None => println!("null"),
        },
    }
    Ok(())
}
