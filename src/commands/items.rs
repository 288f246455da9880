use crate::args::OutputFormat;
use crate::commands::{Out, Rows};
use crate::model::InventoryItem;
use crate::{Config, Result};

const HEADERS: &[&str] = &[
    "ID", "Name", "Category", "Quantity", "Unit", "Cost", "Limit", "Updated",
];

/// Lists every inventory item, ordered by name, rendered in `format`.
///
/// The rendered rows are the message, so they are what gets printed.
pub async fn items(config: Config, format: OutputFormat) -> Result<Out<Rows>> {
    let items = config.db().items().await?;
    let rows = Rows::render(format, HEADERS, &items, cells)?;
    let message = if items.is_empty() {
        "The inventory is empty".to_string()
    } else {
        rows.to_string()
    };
    Ok(Out::new(message, rows))
}

fn cells(item: &InventoryItem) -> Vec<String> {
    vec![
        item.id.clone(),
        item.name.clone(),
        item.category.clone(),
        item.quantity.normalize().to_string(),
        item.unit.to_string(),
        item.cost.normalize().to_string(),
        format!("{}/{}d", item.limit.quantity.normalize(), item.limit.days),
        item.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_items_empty() {
        let env = TestEnv::new().await;
        let out = items(env.config(), OutputFormat::Table).await.unwrap();
        assert_eq!(out.message(), "The inventory is empty");
    }

    #[tokio::test]
    async fn test_items_formats() {
        let env = TestEnv::new().await;
        env.seed_item("Rice", Decimal::new(2050, 2)).await;
        env.seed_item("apples", Decimal::from(4)).await;

        let out = items(env.config(), OutputFormat::Table).await.unwrap();
        let lines: Vec<&str> = out.message().lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("| ID"));
        assert!(lines[2].contains("apples"));
        assert!(lines[3].contains("| 20.5 "));

        let out = items(env.config(), OutputFormat::Csv).await.unwrap();
        assert!(out
            .message()
            .starts_with("ID,Name,Category,Quantity,Unit,Cost,Limit,Updated\n"));

        let out = items(env.config(), OutputFormat::Json).await.unwrap();
        let Some(Rows::Json(value)) = out.structure() else {
            panic!("expected json rows");
        };
        assert_eq!(value[1]["name"], "Rice");
    }
}
