use std::io::Write;
use std::ops::ControlFlow;

use breathwork_core::error::Result;
use breathwork_core::{
    Config, DisplayFrame, Event, HapticPort, PatternId, SessionController, SessionDriver,
    TracingHaptics,
};
use clap::Args;
use tokio::sync::watch;

#[derive(Args)]
pub struct RunArgs {
    /// Pattern to breathe (coherence, relax-478, box-focus); defaults to config
    #[arg(short, long)]
    pattern: Option<String>,
    /// Disable haptic pulses for this session
    #[arg(long)]
    no_haptics: bool,
    /// Stop after this many full cycles (runs until Ctrl-C otherwise)
    #[arg(long)]
    cycles: Option<u32>,
    /// Print each session event (started, phase entered, stopped) as a JSON line
    #[arg(long)]
    json: bool,
    /// Ring the terminal bell as the haptic pulse
    #[arg(long)]
    bell: bool,
}

/// Terminal bell standing in for a vibration motor.
struct BellHaptics;

impl HapticPort for BellHaptics {
    fn pulse(&self) {
        let mut err = std::io::stderr();
        // A closed stderr just means no pulse.
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

fn print_frame(frame: &DisplayFrame) {
    println!(
        "{:<7} {:>4.1}s  scale {:.2} -> {:.2}",
        frame.instruction_text,
        frame.transition_duration_seconds,
        frame.scale_from,
        frame.scale_target
    );
}

fn print_event(event: &Event) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

/// Print a phase entry: the event itself in JSON mode, the display frame
/// otherwise.
fn print_phase(ctl: &SessionController, event: &Event, json: bool) {
    if !json {
        print_frame(ctl.display());
        return;
    }
    if let Err(e) = print_event(event) {
        tracing::warn!(error = %e, "failed to encode phase event");
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::load_or_default();
    if let Some(name) = &args.pattern {
        config.pattern = name.parse::<PatternId>()?;
    }
    if args.no_haptics {
        config.haptics_enabled = false;
    }
    if args.cycles.is_some() {
        config.cycles = args.cycles;
    }
    let cycle_limit = config.cycles.map(u64::from);

    let haptics: Box<dyn HapticPort> = if args.bell {
        Box::new(BellHaptics)
    } else {
        Box::new(TracingHaptics)
    };
    let mut controller = SessionController::from_config(&config, haptics);

    let json = args.json;
    if !json {
        let active = controller.active_pattern();
        println!(
            "{} -- {} ({}s per cycle)",
            active.label(),
            active.description(),
            active.cycle_secs()
        );
    }

    if let Some(event) = controller.start_session() {
        if json {
            print_event(&event)?;
        }
    }
    if let Some(event) = controller.current_phase_event() {
        print_phase(&controller, event, json);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut driver = SessionDriver::new(controller);
    runtime.block_on(async {
        let (tx, rx) = watch::channel(false);
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted");
                let _ = tx.send(true);
            }
        });

        driver
            .run(rx, |ctl, event| {
                if !matches!(event, Event::PhaseEntered { .. }) {
                    return ControlFlow::Continue(());
                }
                if cycle_limit.is_some_and(|limit| ctl.cycles_completed() >= limit) {
                    return ControlFlow::Break(());
                }
                print_phase(ctl, event, json);
                ControlFlow::Continue(())
            })
            .await;

        interrupt.abort();
    });

    if let Some(event) = driver.controller_mut().stop_session() {
        if json {
            print_event(&event)?;
        } else if let Event::SessionStopped {
            cycles_completed, ..
        } = event
        {
            println!("Session complete: {cycles_completed} cycle(s)");
        }
    }
    Ok(())
}
