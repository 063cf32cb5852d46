use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tally_core::{ItemChanges, ItemId, NewReceiptItem, ReceiptItem};

pub type DbPool = Pool<Sqlite>;

type ItemRow = (i64, String, String, String, String, i64, DateTime<Utc>);

const SELECT_ITEM: &str =
    "SELECT id, shop, date, item, price, quantity, created_at FROM receipt_items";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

/// A private in-memory database. The single connection is never recycled, so
/// the data lives as long as the pool.
pub async fn create_memory_db() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS receipt_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shop TEXT NOT NULL,
            date TEXT NOT NULL,
            item TEXT NOT NULL,
            price TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn item_from_row(r: ItemRow) -> ReceiptItem {
    ReceiptItem {
        id: ItemId(r.0),
        shop: r.1,
        date: r.2,
        item: r.3,
        price: r.4,
        quantity: r.5,
        created_at: r.6,
    }
}

const INSERT_ITEM: &str = "INSERT INTO receipt_items (shop, date, item, price, quantity, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING id";

pub async fn insert_item(pool: &DbPool, item: &NewReceiptItem) -> Result<ItemId, sqlx::Error> {
    let id = sqlx::query_scalar::<_, i64>(INSERT_ITEM)
        .bind(&item.shop)
        .bind(&item.date)
        .bind(&item.item)
        .bind(&item.price)
        .bind(item.quantity)
        .bind(item.created_at)
        .fetch_one(pool)
        .await?;
    Ok(ItemId(id))
}

/// Store every item of one receipt, all or nothing.
pub async fn insert_receipt_items(
    pool: &DbPool,
    items: &[NewReceiptItem],
) -> Result<Vec<ItemId>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = sqlx::query_scalar::<_, i64>(INSERT_ITEM)
            .bind(&item.shop)
            .bind(&item.date)
            .bind(&item.item)
            .bind(&item.price)
            .bind(item.quantity)
            .bind(item.created_at)
            .fetch_one(&mut *tx)
            .await?;
        ids.push(ItemId(id));
    }
    tx.commit().await?;
    Ok(ids)
}

/// Newest first.
pub async fn get_all_items(pool: &DbPool) -> Result<Vec<ReceiptItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEM} ORDER BY id DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(item_from_row).collect())
}

pub async fn get_item_by_id(pool: &DbPool, id: ItemId) -> Result<Option<ReceiptItem>, sqlx::Error> {
    let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEM} WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(item_from_row))
}

/// Apply `changes` to a stored item. `None` when no such item exists.
pub async fn update_item(
    pool: &DbPool,
    id: ItemId,
    changes: &ItemChanges,
) -> Result<Option<ReceiptItem>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEM} WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(mut item) = row.map(item_from_row) else {
        return Ok(None);
    };

    changes.apply(&mut item);

    sqlx::query(
        "UPDATE receipt_items SET shop = ?, date = ?, item = ?, price = ?, quantity = ? WHERE id = ?",
    )
    .bind(&item.shop)
    .bind(&item.date)
    .bind(&item.item)
    .bind(&item.price)
    .bind(item.quantity)
    .bind(id.0)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(item))
}

/// `false` when there was nothing to delete.
pub async fn delete_item(pool: &DbPool, id: ItemId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM receipt_items WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (DbPool, Vec<ItemId>) {
        let pool = create_memory_db().await.unwrap();
        let items = NewReceiptItem::from_receipt(
            "SHOP MART",
            "05/06/2025",
            vec![("Milk", "2.50"), ("Bread", "1.20")],
        );
        let ids = insert_receipt_items(&pool, &items).await.unwrap();
        (pool, ids)
    }

    #[tokio::test]
    async fn create_db_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipts.db");

        let pool = create_db(&path).await.unwrap();
        insert_item(&pool, &NewReceiptItem::new("A B", "Not found", "Milk", "2.50"))
            .await
            .unwrap();
        pool.close().await;

        let pool = create_db(&path).await.unwrap();
        assert_eq!(get_all_items(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn receipt_items_share_shop_and_date() {
        let (pool, ids) = seeded().await;
        assert_eq!(ids.len(), 2);

        let all = get_all_items(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|i| i.shop == "SHOP MART" && i.date == "05/06/2025"));
        assert!(all.iter().all(|i| i.quantity == 1));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (pool, ids) = seeded().await;
        let all = get_all_items(&pool).await.unwrap();
        assert_eq!(all[0].id, ids[1]);
        assert_eq!(all[0].item, "Bread");
        assert_eq!(all[1].item, "Milk");
    }

    #[tokio::test]
    async fn manual_item_keeps_quantity_and_timestamp() {
        let pool = create_memory_db().await.unwrap();
        let new = NewReceiptItem::new("Corner Shop", "2025-06-05", "Eggs", "3.10").with_quantity(2);
        let id = insert_item(&pool, &new).await.unwrap();

        let stored = get_item_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
        assert_eq!(stored.price, "3.10");
        assert_eq!(stored.created_at.timestamp(), new.created_at.timestamp());
    }

    #[tokio::test]
    async fn get_missing_item_is_none() {
        let pool = create_memory_db().await.unwrap();
        assert!(get_item_by_id(&pool, ItemId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (pool, ids) = seeded().await;
        let changes = ItemChanges {
            item: Some("Whole Milk".into()),
            quantity: Some(3),
            ..Default::default()
        };

        let updated = update_item(&pool, ids[0], &changes).await.unwrap().unwrap();
        assert_eq!(updated.item, "Whole Milk");
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.price, "2.50");

        let stored = get_item_by_id(&pool, ids[0]).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn update_missing_item_is_none() {
        let pool = create_memory_db().await.unwrap();
        let changes = ItemChanges { shop: Some("X".into()), ..Default::default() };
        assert!(update_item(&pool, ItemId(1), &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let (pool, ids) = seeded().await;
        assert!(delete_item(&pool, ids[0]).await.unwrap());
        assert!(!delete_item(&pool, ids[0]).await.unwrap());
        assert_eq!(get_all_items(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_receipt_inserts_nothing() {
        let pool = create_memory_db().await.unwrap();
        let ids = insert_receipt_items(&pool, &[]).await.unwrap();
        assert!(ids.is_empty());
        assert!(get_all_items(&pool).await.unwrap().is_empty());
    }
}
