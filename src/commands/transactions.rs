use crate::commands::Out;
use crate::model::TransactionRecord;
use crate::{Config, Result};

/// Lists the `limit` most recent transaction records, newest first.
pub async fn transactions(config: Config, limit: u32) -> Result<Out<Vec<TransactionRecord>>> {
    let records = config.db().recent_transactions(limit).await?;
    if records.is_empty() {
        return Ok(Out::new("No transactions recorded", records));
    }
    let lines: Vec<String> = records.iter().map(line).collect();
    Ok(Out::new(lines.join("\n"), records))
}

fn line(r: &TransactionRecord) -> String {
    format!(
        "{} {:<3} {} {} {} (total {}) by {} [{}]",
        r.created_at.format("%Y-%m-%d %H:%M"),
        r.kind.to_string(),
        r.quantity.normalize(),
        r.unit,
        r.item_name,
        r.total_cost.normalize(),
        r.actor_id,
        r.id
    )
}
