use crate::commands::Out;
use crate::import::{process_csv_import, ImportResult};
use crate::model::read_import_rows;
use crate::store::MemoryStore;
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use std::path::Path;
use tracing::debug;

/// Reads the CSV purchase order at `file` and reconciles it against the inventory.
///
/// With `dry_run` the current inventory is copied into a `MemoryStore` and the import runs
/// against that, so the returned result shows what would happen without saving anything.
///
/// Failed rows do not make this function return an error; they are counted in the returned
/// `ImportResult`, whose `success` is false when any row failed.
///
/// # Errors
/// - The file cannot be read, has no product or quantity column, or has no data rows.
/// - The inventory cannot be read for a dry run.
pub async fn import(
    config: Config,
    file: &Path,
    actor: Option<&str>,
    dry_run: bool,
) -> Result<Out<ImportResult>> {
    let content = utils::read(file).await?;
    let rows = read_import_rows(content.as_bytes())
        .with_context(|| format!("Unable to read purchase order '{}'", file.display()))?;
    if rows.is_empty() {
        bail!("No rows to import in '{}'", file.display());
    }
    debug!("Read {} rows from {}", rows.len(), file.display());

    let options = config.import_options(actor);
    let result = if dry_run {
        let mut store = MemoryStore::new(config.db().items().await?);
        process_csv_import(&rows, &mut store, &options).await
    } else {
        let mut store = config.db().clone();
        process_csv_import(&rows, &mut store, &options).await
    };

    Ok(Out::new(summarize(&result, dry_run), result))
}

fn summarize(result: &ImportResult, dry_run: bool) -> String {
    let mut message = format!(
        "{}Processed {} rows: {} updated, {} added, {} failed",
        if dry_run { "(dry run) " } else { "" },
        result.processed(),
        result.updated,
        result.added,
        result.failed
    );
    for error in &result.errors {
        message.push_str("\n  ");
        message.push_str(error);
    }
    if !result.unlogged.is_empty() {
        message.push_str(&format!(
            "\n  {} stock changes were saved without a transaction record: {}",
            result.unlogged.len(),
            result.unlogged.join(", ")
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    const ORDER: &str = "\
Product,Weight,Price per unit,Order Quantities
Rice,5 lb bag,$8.50,4
Black Beans,,1.25,12
,,,3
";

    #[tokio::test]
    async fn test_import_writes_to_db() {
        let env = TestEnv::new().await;
        let file = env.write_file("order.csv", ORDER).await;

        let out = import(env.config(), &file, Some("sam"), false)
            .await
            .unwrap();
        let result = out.structure().unwrap();
        assert_eq!(result.added, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.success);
        assert!(out.message().contains("2 added, 1 failed"));
        assert!(out.message().contains("Row 3"));

        let items = env.config().db().items().await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Black Beans", "Rice"]);
        // 4 bags of 5 lb
        assert_eq!(items[1].quantity, Decimal::from(20));

        let log = env.config().db().recent_transactions(10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| r.actor_id == "sam"));
    }

    #[tokio::test]
    async fn test_import_dry_run_saves_nothing() {
        let env = TestEnv::new().await;
        env.seed_item("Rice", Decimal::from(3)).await;
        let file = env.write_file("order.csv", ORDER).await;

        let out = import(env.config(), &file, None, true).await.unwrap();
        let result = out.structure().unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.added, 1);
        assert!(out.message().starts_with("(dry run)"));

        let items = env.config().db().items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, Decimal::from(3));
        assert!(env
            .config()
            .db()
            .recent_transactions(10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_import_default_actor() {
        let env = TestEnv::new().await;
        let file = env
            .write_file("order.csv", "Product,Order Quantities\nOats,2\n")
            .await;

        let out = import(env.config(), &file, None, false).await.unwrap();
        assert!(out.structure().unwrap().success);

        let log = env.config().db().recent_transactions(1).await.unwrap();
        assert_eq!(log[0].actor_id, env.config().default_actor());
    }

    #[tokio::test]
    async fn test_import_empty_file() {
        let env = TestEnv::new().await;
        let file = env
            .write_file("order.csv", "Product,Order Quantities\n")
            .await;

        let err = import(env.config(), &file, None, false).await.unwrap_err();
        assert!(err.to_string().contains("No rows to import"));
    }

    #[tokio::test]
    async fn test_import_missing_columns() {
        let env = TestEnv::new().await;
        let file = env.write_file("order.csv", "Supplier,Notes\nAcme,1\n").await;

        assert!(import(env.config(), &file, None, false).await.is_err());
    }
}
