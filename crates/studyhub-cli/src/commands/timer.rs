use std::io::Write;

use clap::Subcommand;
use studyhub_core::timer::{format_clock, parse_minutes};
use studyhub_core::{Command, Config, Event};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::common::{open_hub, print_json, report, Hub};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the timer and goals as JSON
    Status,
    /// Run the countdown in the foreground (reads commands from stdin)
    Run,
    /// Restart the current phase from its full length
    Reset,
    /// Back to a fresh study phase
    FullReset,
    /// Acknowledge a finished countdown and switch phase
    Confirm,
    /// Set the study length in minutes (saved to config)
    SetStudy {
        minutes: String,
    },
    /// Set the break length in minutes (saved to config)
    SetBreak {
        minutes: String,
    },
    /// Select the goal study time is credited to (omit to clear)
    Select {
        goal_id: Option<String>,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut hub = open_hub()?;

    match action {
        TimerAction::Status => print_json(&hub.engine().view())?,
        TimerAction::Run => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_interactive(&mut hub))?;
        }
        TimerAction::Reset => report(hub.apply(Command::ResetRound)?, "nothing to reset")?,
        TimerAction::FullReset => report(hub.apply(Command::FullReset)?, "nothing to reset")?,
        TimerAction::Confirm => report(hub.apply(Command::ConfirmTransition)?, "no transition pending")?,
        TimerAction::SetStudy { minutes } => {
            let minutes = parse_minutes(&minutes)
                .ok_or_else(|| format!("study length must be a positive whole number of minutes, got '{minutes}'"))?;
            let event = hub.apply(Command::SetStudyMinutes(minutes))?;
            if event.is_some() {
                Config::load()?.set("timer.study_minutes", &minutes.to_string())?;
            }
            report(event, "study length unchanged")?;
        }
        TimerAction::SetBreak { minutes } => {
            let minutes = parse_minutes(&minutes)
                .ok_or_else(|| format!("break length must be a positive whole number of minutes, got '{minutes}'"))?;
            let event = hub.apply(Command::SetBreakMinutes(minutes))?;
            if event.is_some() {
                Config::load()?.set("timer.break_minutes", &minutes.to_string())?;
            }
            report(event, "break length unchanged")?;
        }
        TimerAction::Select { goal_id } => {
            if let Some(id) = goal_id.as_deref() {
                if hub.engine().ledger().get(id).is_none() {
                    return Err(format!("no goal with id {id}").into());
                }
            }
            report(hub.apply(Command::SelectGoal(goal_id))?, "selection unchanged")?;
        }
    }
    Ok(())
}

enum Input {
    Tick,
    Line(String),
    Eof,
}

/// Foreground loop: starts the countdown, ticks once per second and reacts
/// to `start`, `pause`, `reset`, `full-reset`, `confirm` and `quit` on stdin.
/// The open span is credited on the way out.
async fn run_interactive(hub: &mut Hub) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if hub.engine().is_pending_transition() {
        eprintln!("countdown finished, type 'confirm' to switch phase");
    } else if let Some(event) = hub.apply(Command::Start)? {
        print_json(&event)?;
    }
    render(hub);

    loop {
        let input = tokio::select! {
            _ = hub.ticker_mut().next_tick() => Input::Tick,
            line = lines.next_line() => match line? {
                Some(line) => Input::Line(line),
                None => Input::Eof,
            },
        };

        let command = match input {
            Input::Tick => Command::Tick,
            Input::Eof => break,
            Input::Line(line) => match line.trim() {
                "" => continue,
                "start" | "s" => Command::Start,
                "pause" | "p" => Command::Pause,
                "reset" | "r" => Command::ResetRound,
                "full-reset" => Command::FullReset,
                "confirm" | "c" => Command::ConfirmTransition,
                "quit" | "q" => break,
                other => {
                    eprintln!("unknown command '{other}' (start, pause, reset, full-reset, confirm, quit)");
                    continue;
                }
            },
        };
        if let Some(event) = hub.apply(command)? {
            on_notification(&event);
            print_json(&event)?;
        }
        render(hub);
    }

    if let Some(event) = hub.apply(Command::Pause)? {
        print_json(&event)?;
    }
    Ok(())
}

fn on_notification(event: &Event) {
    match event {
        Event::TimerWarning { .. } => {
            eprint!("\x07");
        }
        Event::TransitionPending { phase, .. } => {
            eprintln!("\n{phase} finished, type 'confirm' to switch phase");
        }
        _ => {}
    }
}

fn render(hub: &Hub) {
    let engine = hub.engine();
    let goal = engine
        .selected_goal()
        .and_then(|id| engine.ledger().get(id))
        .map(|g| g.name.as_str())
        .unwrap_or("-");
    eprint!(
        "\r{:>5} {} [{:?}] goal: {goal}   ",
        engine.phase().to_string(),
        format_clock(engine.remaining_secs()),
        engine.status(),
    );
    let _ = std::io::stderr().flush();
}
