use crate::api::{self, Mode};
use crate::commands::{reconciler, Out};
use crate::reconcile::Reconciliation;
use crate::{Config, Result};

/// Runs one reconciliation pass, the same as `update budget` in a session.
pub async fn reconcile(config: Config, mode: Mode) -> Result<Out<Reconciliation>> {
    let mut sheet = api::sheet(&config, mode).await?;
    let reconciliation = reconciler(&config, mode).run(sheet.as_mut()).await?;
    Ok(Out::new(reconciliation.summary(), reconciliation))
}
