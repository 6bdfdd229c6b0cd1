use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Subcommand;
use focustodo_core::storage::NotificationsConfig;
use focustodo_core::timer::Notifier;
use focustodo_core::{
    Collaborators, Config, Database, Event, IntervalTicker, LogNotifier, SessionCycle,
    TerminalNotifier,
};
use tracing::{debug, warn};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the current timer state as JSON
    Status,
    /// Run the current session in the foreground (Ctrl-C pauses)
    Start,
    /// Finish the current session now and move to the next one
    Complete,
    /// Back to a full focus session with the counter cleared
    Reset,
}

/// Terminal output unless every notification is switched off, in which case
/// they only reach the log.
fn notifier_for(config: &NotificationsConfig) -> Box<dyn Notifier> {
    if config.enabled || config.sound_enabled {
        Box::new(TerminalNotifier::stderr(config))
    } else {
        Box::new(LogNotifier)
    }
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Sets `stop` when the process receives Ctrl-C.
fn spawn_interrupt_listener(stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, pausing");
                stop.store(true, Ordering::SeqCst);
            }
        });
    });
}

pub fn run(action: TimerAction, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_in(dir)?;
    let cycle_config = config.cycle_config()?;
    let db = Database::open_in(dir)?;
    let notifier = notifier_for(&config.notifications);
    let collaborators = Collaborators {
        store: &db,
        notifier: notifier.as_ref(),
        tasks: &db,
        reports: &db,
    };
    let mut cycle = SessionCycle::load(cycle_config, collaborators);

    match action {
        TimerAction::Status => {
            print_event(&cycle.snapshot())?;
        }
        TimerAction::Start => {
            let started = cycle.start();
            if let Some(event) = &started {
                print_event(event)?;
            }
            if !cycle.is_running() {
                return Ok(());
            }

            let mut ticker = IntervalTicker::every_second();
            spawn_interrupt_listener(ticker.stop_handle());
            if let Some(event) = cycle.run(&mut ticker) {
                print_event(&event)?;
            }
        }
        TimerAction::Complete => {
            print_event(&cycle.complete())?;
        }
        TimerAction::Reset => {
            if let Some(event) = cycle.reset() {
                print_event(&event)?;
            }
        }
    }
    Ok(())
}
