use crate::aggregate::NetIncome;
use crate::api::{self, Mode};
use crate::commands::Out;
use crate::reconcile::net_income;
use crate::{Config, Result};

/// Reports total income, total expenses and net income. Nothing is written.
pub async fn report(config: Config, mode: Mode) -> Result<Out<NetIncome>> {
    let mut sheet = api::sheet(&config, mode).await?;
    let net = net_income(sheet.as_mut()).await?;
    Ok(Out::new(net.to_string(), net))
}
