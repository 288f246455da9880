use crate::commands::Out;
use crate::model::TransactionRecord;
use crate::{Config, Result};
use chrono::Utc;
use rust_decimal::Decimal;

/// Checks `quantity` of `item` (an id or a name) out to `student_id`.
///
/// # Errors
/// The item does not exist, there is not enough stock, or the student would go over the item's
/// checkout limit. Nothing is changed in any of those cases.
pub async fn checkout(
    config: Config,
    item: &str,
    quantity: Decimal,
    student_id: &str,
) -> Result<Out<TransactionRecord>> {
    let (item, record) = config
        .db()
        .checkout(item, quantity, student_id, Utc::now())
        .await?;
    Ok(Out::new(
        format!(
            "Checked out {} {} of '{}' to {}, {} left",
            quantity.normalize(),
            item.unit,
            item.name,
            student_id,
            item.quantity.normalize()
        ),
        record,
    ))
}
