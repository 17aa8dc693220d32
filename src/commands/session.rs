use crate::api::{self, Mode};
use crate::commands::{reconciler, Out};
use crate::console::Terminal;
use crate::session::{Session, SessionSummary};
use crate::{Config, Result};

/// Runs the interactive session on the terminal.
pub async fn session(config: Config, mode: Mode) -> Result<Out<SessionSummary>> {
    let mut sheet = api::sheet(&config, mode).await?;
    let mut console = Terminal::new();
    let summary = Session::new(sheet.as_mut(), &mut console, reconciler(&config, mode))
        .run()
        .await?;
    Ok(Out::new(
        format!(
            "Session ended: {} transaction(s) added, {} reconciliation(s)",
            summary.transactions_added(),
            summary.reconciliations()
        ),
        summary,
    ))
}
