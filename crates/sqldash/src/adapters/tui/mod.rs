mod view;

use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::{
    adapters::Backend,
    cli::Args,
    core::controller::{Completion, Dashboard, PendingRequest},
    error::{AppError, AppResult},
};

use view::ViewContext;

// Input poll cap so spawned completions render promptly even while idle.
const POLL_CAP: Duration = Duration::from_millis(50);

pub fn run(args: Args) -> AppResult<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let backend = Arc::new(Backend::from_args(&args)?);
    let ctx = ViewContext {
        source: backend.describe(),
        refresh_ms: args.refresh_interval().as_millis() as u64,
    };

    let _screen = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut dash = Dashboard::new(&args.query, args.live);
    let mut clock = TickClock::new(args.refresh_interval());

    tracing::info!(source = %ctx.source, live = dash.live, "dashboard starting");

    // Initial load runs the configured query as a user action.
    if let Some(req) = dash.begin_user_run() {
        spawn_request(&rt, &backend, &tx, req);
    }
    clock.arm(Instant::now());

    loop {
        while let Ok(completion) = rx.try_recv() {
            dash.apply(completion);
        }

        terminal.draw(|frame| view::draw(frame, &dash, &ctx))?;

        let wait = if dash.live {
            clock.remaining(Instant::now()).min(POLL_CAP)
        } else {
            POLL_CAP
        };
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(key, &mut dash, &mut clock, &rt, &backend, &tx) {
                        break;
                    }
                }
                _ => {}
            }
        }

        if dash.live && clock.due(Instant::now()) {
            clock.arm(Instant::now());
            let req = dash.begin_refresh();
            spawn_request(&rt, &backend, &tx, req);
        }
    }

    tracing::info!("dashboard stopped");
    Ok(())
}

/// Returns false when the session should end. The input line owns plain
/// characters, so commands ride on control chords.
fn handle_key(
    key: KeyEvent,
    dash: &mut Dashboard,
    clock: &mut TickClock,
    rt: &tokio::runtime::Runtime,
    backend: &Arc<Backend>,
    tx: &mpsc::UnboundedSender<Completion>,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('c') if ctrl => return false,
        KeyCode::Char('l') if ctrl => {
            if dash.toggle_live() {
                // Rearming keeps two ticks from landing inside one interval
                // after a rapid off/on toggle.
                clock.arm(Instant::now());
            }
        }
        KeyCode::Char('u') if ctrl => dash.clear_input(),
        KeyCode::Enter => {
            if let Some(req) = dash.begin_user_run() {
                spawn_request(rt, backend, tx, req);
            }
        }
        KeyCode::Backspace => dash.backspace_input(),
        KeyCode::Char(c) if !ctrl => dash.push_input(c),
        _ => {}
    }
    true
}

fn spawn_request(
    rt: &tokio::runtime::Runtime,
    backend: &Arc<Backend>,
    tx: &mpsc::UnboundedSender<Completion>,
    req: PendingRequest,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    rt.spawn(async move {
        let outcome = match req.sql.as_deref() {
            Some(sql) => backend.submit(sql).await,
            None => backend.refresh().await,
        }
        .map_err(|e| {
            tracing::debug!(seq = req.seq, code = e.code(), "request failed");
            e.to_string()
        });
        // The UI may have quit already; a closed channel is fine.
        let _ = tx.send(Completion {
            seq: req.seq,
            kind: req.kind,
            outcome,
        });
    });
}

/// Raw mode plus alternate screen, undone in reverse on every exit path.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> AppResult<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Deadline bookkeeping for the live refresh. One clock exists per session;
/// rearming moves the deadline a full interval out.
struct TickClock {
    interval: Duration,
    last: Instant,
}

impl TickClock {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    fn arm(&mut self, now: Instant) {
        self.last = now;
    }

    fn due(&self, now: Instant) -> bool {
        now.duration_since(self.last) >= self.interval
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.interval.saturating_sub(now.duration_since(self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_fires_only_after_a_full_interval() {
        let t0 = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(2000));
        clock.arm(t0);
        assert!(!clock.due(t0 + Duration::from_millis(1999)));
        assert!(clock.due(t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn rearm_resets_the_phase() {
        let t0 = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(2000));
        clock.arm(t0);

        // Toggled off and back on just before the first tick would fire:
        // the old deadline must not produce an extra tick.
        let t1 = t0 + Duration::from_millis(1900);
        clock.arm(t1);
        assert!(!clock.due(t0 + Duration::from_millis(2100)));
        assert!(clock.due(t1 + Duration::from_millis(2000)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let t0 = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(2000));
        clock.arm(t0);
        assert_eq!(
            clock.remaining(t0 + Duration::from_millis(500)),
            Duration::from_millis(1500)
        );
        assert_eq!(
            clock.remaining(t0 + Duration::from_millis(2500)),
            Duration::ZERO
        );
    }
}
