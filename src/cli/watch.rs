use super::ui;
use crate::coordinator::{QuoteState, QuoteSyncCoordinator};
use crate::scheduler::RefreshScheduler;
use anyhow::Result;
use console::Term;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn draw(term: &Term, state: &QuoteState, interval: Duration) -> Result<()> {
    term.clear_screen()?;
    term.write_line(&state.display_as_table())?;
    let status = if state.is_loading {
        "Refreshing...".to_string()
    } else {
        format!(
            "Refreshing every {}s. Press Ctrl-C to quit.",
            interval.as_secs()
        )
    };
    term.write_line(&format!("\n{}", ui::style_text(&status, ui::StyleType::Subtle)))?;
    Ok(())
}

/// Redraws the quote table on every state change until Ctrl-C.
pub async fn run(coordinator: Arc<QuoteSyncCoordinator>, interval: Duration) -> Result<()> {
    let term = Term::stdout();
    let mut updates = coordinator.subscribe();
    let scheduler = RefreshScheduler::new(Arc::clone(&coordinator), interval);

    // Refresh right away; the scheduler takes over from the next interval.
    let initial = Arc::clone(&coordinator);
    tokio::spawn(async move { initial.refresh().await });
    scheduler.start();

    draw(&term, &coordinator.state(), interval)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                draw(&term, &state, interval)?;
            }
        }
    }

    info!("Shutting down watch mode");
    scheduler.stop();
    Ok(())
}
