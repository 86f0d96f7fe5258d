//! # Transaction Repository
//!
//! Append-only `TransactionStore` over `transactions` + `transaction_items`.
//!
//! A transaction and its lines are written in one SQL transaction, so a
//! reader never sees a header without its items. Triggers in the schema
//! reject UPDATE and DELETE on both tables.
//!
//! Listing pushes the date range into SQL to narrow the scan, then applies
//! `TransactionFilter::matches` to every decoded row, so search semantics
//! are identical to the in-memory store.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use billbook_core::{
    BillItem, CoreResult, Money, StorageError, Transaction, TransactionFilter, TransactionStatus,
    TransactionStore,
};

use super::{decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};

const ENTITY: &str = "Transaction";

// =============================================================================
// Row Decoding
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    total_cents: i64,
    date: String,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    transaction_id: String,
    product_id: i64,
    product_title: String,
    purchase_price_cents: i64,
    selling_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl TryFrom<ItemRow> for BillItem {
    type Error = StorageError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        if row.quantity <= 0 {
            return Err(StorageError::corrupt(
                ENTITY,
                format!("{}: line quantity {} is not positive", row.transaction_id, row.quantity),
            ));
        }

        let selling_price = Money::from_cents(row.selling_price_cents);
        let line_total = Money::from_cents(row.line_total_cents);
        if selling_price.checked_mul(row.quantity) != Some(line_total) {
            return Err(StorageError::corrupt(
                ENTITY,
                format!("{}: line total {} does not match price × quantity", row.transaction_id, line_total),
            ));
        }

        Ok(BillItem {
            product_id: row.product_id,
            product_title: row.product_title,
            purchase_price: Money::from_cents(row.purchase_price_cents),
            selling_price,
            quantity: row.quantity,
            line_total,
        })
    }
}

/// Joins a header row with its decoded lines.
fn decode(row: TransactionRow, items: Vec<BillItem>) -> Result<Transaction, StorageError> {
    let status = match row.status.as_str() {
        "completed" => TransactionStatus::Completed,
        "cancelled" => TransactionStatus::Cancelled,
        other => {
            return Err(StorageError::corrupt(
                ENTITY,
                format!("{}: unknown status '{other}'", row.id),
            ))
        }
    };

    let transaction = Transaction {
        date: decode_timestamp(ENTITY, &row.date)?,
        total: Money::from_cents(row.total_cents),
        id: row.id,
        items,
        status,
    };

    if !transaction.is_balanced() {
        return Err(StorageError::corrupt(
            ENTITY,
            format!("{}: total does not match its lines", transaction.id),
        ));
    }
    Ok(transaction)
}

// =============================================================================
// Shared SQL
// =============================================================================

/// Inserts the header and every line. Caller owns the SQL transaction.
pub(crate) async fn insert(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    sqlx::query("INSERT INTO transactions (id, total_cents, date, status) VALUES (?1, ?2, ?3, ?4)")
        .bind(&transaction.id)
        .bind(transaction.total.cents())
        .bind(encode_timestamp(transaction.date))
        .bind(transaction.status)
        .execute(&mut *conn)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate(ENTITY, &transaction.id),
            other => other,
        })?;

    for (position, item) in transaction.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO transaction_items (
                transaction_id, position, product_id, product_title,
                purchase_price_cents, selling_price_cents, quantity, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&transaction.id)
        .bind(position as i64)
        .bind(item.product_id)
        .bind(&item.product_title)
        .bind(item.purchase_price.cents())
        .bind(item.selling_price.cents())
        .bind(item.quantity)
        .bind(item.line_total.cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Reads transactions matching `filter`, in insertion order.
pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    filter: &TransactionFilter,
) -> CoreResult<Vec<Transaction>> {
    let from = filter.date_range.map(|range| encode_timestamp(range.from()));
    let to = filter.date_range.map(|range| encode_timestamp(range.to()));

    let headers: Vec<TransactionRow> = sqlx::query_as(
        r#"
        SELECT id, total_cents, date, status
        FROM transactions
        WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
        ORDER BY seq
        "#,
    )
    .bind(&from)
    .bind(&to)
    .fetch_all(&mut *conn)
    .await
    .map_err(DbError::from)?;

    let item_rows: Vec<ItemRow> = sqlx::query_as(
        r#"
        SELECT ti.transaction_id, ti.product_id, ti.product_title,
               ti.purchase_price_cents, ti.selling_price_cents,
               ti.quantity, ti.line_total_cents
        FROM transaction_items ti
        JOIN transactions t ON t.id = ti.transaction_id
        WHERE (?1 IS NULL OR t.date >= ?1) AND (?2 IS NULL OR t.date <= ?2)
        ORDER BY t.seq, ti.position
        "#,
    )
    .bind(&from)
    .bind(&to)
    .fetch_all(&mut *conn)
    .await
    .map_err(DbError::from)?;

    let mut lines: HashMap<String, Vec<BillItem>> = HashMap::new();
    for row in item_rows {
        let key = row.transaction_id.clone();
        lines.entry(key).or_default().push(BillItem::try_from(row)?);
    }

    let mut transactions = Vec::with_capacity(headers.len());
    for header in headers {
        let items = lines.remove(&header.id).unwrap_or_default();
        let transaction = decode(header, items)?;
        if filter.matches(&transaction) {
            transactions.push(transaction);
        }
    }
    Ok(transactions)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the sales history.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Counts recorded transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn append(&self, transaction: Transaction) -> CoreResult<()> {
        debug!(id = %transaction.id, lines = transaction.items.len(), "Appending transaction");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        insert(&mut tx, &transaction).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    async fn list(&self, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let transactions = fetch(&mut conn, filter).await?;
        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use billbook_core::memory::InMemoryTransactionStore;
    use billbook_core::{
        to_millis, Bill, CoreError, DateRange, NewProduct, ProductStore, StockStatus,
    };
    use chrono::{DateTime, TimeZone, Utc};

    async fn repo() -> (Database, TransactionRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.transactions();
        (db, repo)
    }

    fn sale(id: &str, date: DateTime<Utc>, lines: &[(&str, i64, i64)]) -> Transaction {
        let items: Vec<BillItem> = lines
            .iter()
            .enumerate()
            .map(|(i, (title, price, qty))| BillItem {
                product_id: i as i64 + 1,
                product_title: title.to_string(),
                purchase_price: Money::from_cents(price / 2),
                selling_price: Money::from_cents(*price),
                quantity: *qty,
                line_total: Money::from_cents(price * qty),
            })
            .collect();
        Transaction {
            id: id.to_string(),
            total: items.iter().map(|item| item.line_total).sum(),
            items,
            date,
            status: TransactionStatus::Completed,
        }
    }

    #[tokio::test]
    async fn test_append_and_list_round_trip() {
        let (_db, repo) = repo().await;
        let date = Utc.timestamp_millis_opt(1_792_316_400_123).unwrap();
        let tx = sale("1792316400123", date, &[("Gel Pen", 1000, 3), ("Notebook", 4500, 1)]);

        repo.append(tx.clone()).await.unwrap();

        let listed = repo.list(&TransactionFilter::all()).await.unwrap();
        assert_eq!(listed, vec![tx]);
    }

    #[tokio::test]
    async fn test_dates_are_kept_to_the_millisecond() {
        let (_db, repo) = repo().await;
        let date = Utc.timestamp_opt(1_792_316_400, 123_456_789).unwrap();
        repo.append(sale("1", date, &[("Pen", 100, 1)])).await.unwrap();

        let memory = InMemoryTransactionStore::new();
        memory.append(sale("1", date, &[("Pen", 100, 1)])).await.unwrap();

        let stored = repo.list(&TransactionFilter::all()).await.unwrap();
        assert_eq!(stored[0].date, to_millis(date));
        assert_eq!(stored, memory.list(&TransactionFilter::all()).await.unwrap());
    }

    #[tokio::test]
    async fn test_insertion_order_is_kept() {
        let (_db, repo) = repo().await;
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();

        for (i, id) in ["30", "10", "20"].iter().enumerate() {
            let date = base + chrono::Duration::hours(i as i64);
            repo.append(sale(id, date, &[("Pen", 100, 1)])).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list(&TransactionFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, ["30", "10", "20"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let (_db, repo) = repo().await;
        let tx = sale("1", Utc::now(), &[("Pen", 100, 1)]);

        repo.append(tx.clone()).await.unwrap();
        let err = repo.append(tx).await.unwrap_err();

        match err {
            CoreError::Storage(StorageError::Duplicate { id, .. }) => assert_eq!(id, "1"),
            other => panic!("expected Duplicate, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filter_by_range_and_search() {
        let (_db, repo) = repo().await;
        let oct = |d: u32| Utc.with_ymd_and_hms(2026, 10, d, 12, 0, 0).unwrap();

        repo.append(sale("a", oct(1), &[("Gel Pen", 100, 1)])).await.unwrap();
        repo.append(sale("b", oct(5), &[("Stapler", 100, 1)])).await.unwrap();
        repo.append(sale("c", oct(9), &[("Gel Refill", 100, 1)])).await.unwrap();

        let range = DateRange::new(oct(1), oct(5)).unwrap();
        let in_range = repo
            .list(&TransactionFilter::all().with_range(range))
            .await
            .unwrap();
        assert_eq!(in_range.len(), 2);

        let gel = repo
            .list(&TransactionFilter::all().with_search("GEL"))
            .await
            .unwrap();
        assert_eq!(gel.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["a", "c"]);

        let by_date = repo
            .list(&TransactionFilter::all().with_search("10/05/2026"))
            .await
            .unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].id, "b");

        let both = repo
            .list(&TransactionFilter::all().with_range(range).with_search("gel"))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_immutable() {
        let (db, repo) = repo().await;
        repo.append(sale("1", Utc::now(), &[("Pen", 100, 1)])).await.unwrap();

        let update = sqlx::query("UPDATE transactions SET total_cents = 0")
            .execute(db.pool())
            .await;
        assert!(matches!(
            DbError::from(update.unwrap_err()),
            DbError::ConstraintViolation(_)
        ));

        let delete = sqlx::query("DELETE FROM transaction_items")
            .execute(db.pool())
            .await;
        assert!(delete.is_err());

        assert_eq!(repo.list(&TransactionFilter::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_is_corrupt() {
        let (db, repo) = repo().await;

        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO transactions (id, total_cents, date, status) \
             VALUES ('x', 0, '2026-10-18T00:00:00.000Z', 'refunded')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.list(&TransactionFilter::all()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::Deserialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_line_total_out_of_range_is_corrupt() {
        let (db, repo) = repo().await;

        // 100 × i64::MAX wraps to -100
        sqlx::query(
            "INSERT INTO transactions (id, total_cents, date, status) \
             VALUES ('x', -100, '2026-10-18T00:00:00.000Z', 'completed')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO transaction_items (transaction_id, position, product_id, product_title, \
             purchase_price_cents, selling_price_cents, quantity, line_total_cents) \
             VALUES ('x', 0, 1, 'Pen', 50, 100, ?1, -100)",
        )
        .bind(i64::MAX)
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.list(&TransactionFilter::all()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::Deserialization { .. })
        ));
    }

    async fn stocked(db: &Database, title: &str, quantity: i64) -> billbook_core::Product {
        db.products()
            .create(NewProduct {
                category: "Stationery".to_string(),
                title: title.to_string(),
                purchase_price: Money::from_cents(40),
                selling_price: Money::from_cents(100),
                quantity,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_decrements_stock_and_records_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let committer = db.committer();
        let a = stocked(&db, "Product A", 5).await;

        let mut bill = Bill::new();
        bill.add_item(&a, Money::from_cents(100), 3).unwrap();
        assert_eq!(bill.total(), Money::from_cents(300));

        let sale = committer.commit(&mut bill).await.unwrap();
        assert!(bill.is_empty());

        let a = db.products().get(a.id).await.unwrap().unwrap();
        assert_eq!(a.quantity, 2);
        assert_eq!(a.status, StockStatus::InStock);

        let history = db.transactions().list(&TransactionFilter::all()).await.unwrap();
        assert_eq!(history, vec![sale]);
        assert_eq!(history[0].total, Money::from_cents(300));
        assert_eq!(history[0].status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_commit_selling_last_units_marks_out_of_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let committer = db.committer();
        let b = stocked(&db, "Product B", 2).await;

        let mut bill = Bill::new();
        bill.add_item(&b, Money::from_cents(50), 2).unwrap();
        committer.commit(&mut bill).await.unwrap();

        let b = db.products().get(b.id).await.unwrap().unwrap();
        assert_eq!(b.quantity, 0);
        assert_eq!(b.status, StockStatus::OutOfStock);
    }
}
