mod app;
mod bridge;
mod keymap;
mod logging;

use anyhow::{Context, Result, anyhow};
use app::{App, SessionSeed, Worker};
use bridge::FrameRequest;
use clap::{Parser, ValueEnum};
use flanker_core::ParticipantId;
use flanker_experiment::{Messages, SessionOutcome, SessionReport, load_config};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, error, info, warn};
use winit::event_loop::EventLoop;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Sex {
    M,
    K,
    Nb,
}

impl Sex {
    fn code(self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::K => "K",
            Sex::Nb => "NB",
        }
    }
}

/// Eriksen flanker task.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Participant identifier.
    #[arg(long)]
    id: String,
    #[arg(long, value_enum, ignore_case = true)]
    sex: Sex,
    #[arg(long, default_value_t = 18)]
    age: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let participant = ParticipantId::from_fields(&args.id, args.sex.code(), &args.age.to_string());

    let config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    logging::init(&config.results_dir.join(format!("{participant}.log")))?;
    info!(%participant, config = %args.config.display(), "starting");

    let messages = Messages::load_dir(&config.messages_dir)
        .with_context(|| format!("loading messages from {}", config.messages_dir.display()))?;

    let event_loop = EventLoop::<FrameRequest>::with_user_event().build()?;
    let mut app = App::new(
        SessionSeed {
            config,
            messages,
            participant,
        },
        event_loop.create_proxy(),
    );
    let loop_result = panic::catch_unwind(AssertUnwindSafe(|| event_loop.run_app(&mut app)));

    let startup_error = app.take_startup_error();
    let worker = app.take_worker();
    // closes the ack and key channels so a blocked session thread returns
    drop(app);
    let report = settle(loop_result, startup_error, worker)?;
    match &report.outcome {
        SessionOutcome::Completed => info!(
            trials = report.trials_recorded,
            path = ?report.results_path,
            "session completed"
        ),
        SessionOutcome::Aborted(reason) => {
            warn!(trials = report.trials_recorded, "session aborted: {reason}")
        }
    }
    Ok(())
}

/// Joins the session thread, then reports whatever stopped the run. The
/// join comes first so an aborting session finishes writing its results
/// before the process exits or unwinds.
fn settle<E>(
    loop_result: thread::Result<Result<(), E>>,
    startup_error: Option<anyhow::Error>,
    worker: Option<Worker>,
) -> Result<SessionReport>
where
    E: Into<anyhow::Error>,
{
    let joined = worker.map(|handle| handle.join());
    match &joined {
        Some(Ok(Ok(report))) => debug!(trials = report.trials_recorded, "session thread joined"),
        Some(Ok(Err(err))) => debug!("session thread returned an error: {err:#}"),
        Some(Err(_)) => error!("session thread panicked"),
        None => {}
    }

    let loop_result = match loop_result {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    };
    loop_result.map_err(Into::into)?;
    if let Some(err) = startup_error {
        return Err(err);
    }
    match joined {
        Some(Ok(result)) => result,
        Some(Err(_)) => Err(anyhow!("session thread panicked")),
        None => Err(anyhow!("session never started")),
    }
}
