use crate::date_utils::PeriodKey;
use crate::db::queries::cents_param;
use crate::error::ChartError;
use crate::models::transaction::{NewTransaction, Transaction, TransactionKind};
use crate::models::cents_to_decimal;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Period selector for retrieval: `{month?, year, categoryId?}`.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category_id: Option<i64>,
}

impl TransactionFilter {
    pub fn for_period(period: PeriodKey) -> Result<Self, ChartError> {
        let (from, to) = period.date_strings()?;
        Ok(Self {
            from_date: Some(from),
            to_date: Some(to),
            category_id: None,
        })
    }

    pub fn with_category(mut self, category_id: Option<i64>) -> Self {
        self.category_id = category_id;
        self
    }

    fn where_clause(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref from_date) = self.from_date {
            sql.push_str(" AND date >= ?");
            params_vec.push(Box::new(from_date.clone()));
        }
        if let Some(ref to_date) = self.to_date {
            sql.push_str(" AND date <= ?");
            params_vec.push(Box::new(to_date.clone()));
        }
        if let Some(category_id) = self.category_id {
            sql.push_str(" AND category_id = ?");
            params_vec.push(Box::new(category_id));
        }

        (sql, params_vec)
    }
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        amount: cents_to_decimal(row.get(3)?),
        date: row.get(4)?,
        description: row.get(5)?,
        tag_id: row.get(6)?,
    })
}

pub fn list_transactions(
    conn: &Connection,
    kind: TransactionKind,
    filter: &TransactionFilter,
) -> rusqlite::Result<Vec<Transaction>> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!(
        "SELECT id, category_id, name, amount_cents, date, description, tag_id
         FROM {}{} ORDER BY date, id",
        kind.table(),
        where_sql
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let transactions: Vec<Transaction> = stmt
        .query_map(params_refs.as_slice(), map_transaction)?
        .filter_map(|t| t.ok())
        .collect();

    debug!(table = kind.table(), count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

pub fn total_amount(
    conn: &Connection,
    kind: TransactionKind,
    filter: &TransactionFilter,
) -> rusqlite::Result<Decimal> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM {}{}",
        kind.table(),
        where_sql
    );
    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let cents: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(cents_to_decimal(cents))
}

/// Totals per calendar month of `year`, keyed 1..=12. Months without rows are absent.
pub fn monthly_totals(
    conn: &Connection,
    kind: TransactionKind,
    year: i32,
) -> rusqlite::Result<BTreeMap<u32, Decimal>> {
    let sql = format!(
        "SELECT CAST(strftime('%m', date) AS INTEGER) AS month, SUM(amount_cents)
         FROM {}
         WHERE strftime('%Y', date) = ?
         GROUP BY month",
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let totals = stmt
        .query_map([format!("{year:04}")], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?))
        })?
        .filter_map(|r| r.ok())
        .map(|(month, cents)| (month, cents_to_decimal(cents)))
        .collect::<BTreeMap<_, _>>();

    trace!(table = kind.table(), year, months = totals.len(), "Computed monthly totals");
    Ok(totals)
}

/// Totals per category for the rows matching `filter`.
pub fn totals_by_category(
    conn: &Connection,
    kind: TransactionKind,
    filter: &TransactionFilter,
) -> rusqlite::Result<BTreeMap<i64, Decimal>> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!(
        "SELECT category_id, SUM(amount_cents) FROM {}{} GROUP BY category_id",
        kind.table(),
        where_sql
    );
    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let totals = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?
        .filter_map(|r| r.ok())
        .map(|(category_id, cents)| (category_id, cents_to_decimal(cents)))
        .collect();
    Ok(totals)
}

pub fn create_transaction(
    conn: &Connection,
    kind: TransactionKind,
    transaction: &NewTransaction,
) -> rusqlite::Result<i64> {
    let amount_cents = cents_param(transaction.amount)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (category_id, name, amount_cents, date, description, tag_id)
             VALUES (?, ?, ?, ?, ?, ?)",
            kind.table()
        ),
        params![
            transaction.category_id,
            transaction.name,
            amount_cents,
            transaction.date,
            transaction.description,
            transaction.tag_id
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(table = kind.table(), id, amount_cents, "Created transaction");
    Ok(id)
}

pub fn delete_transaction(
    conn: &Connection,
    kind: TransactionKind,
    id: i64,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(&format!("DELETE FROM {} WHERE id = ?", kind.table()), [id])?;
    if rows > 0 {
        debug!(table = kind.table(), id, "Deleted transaction");
    }
    Ok(rows > 0)
}
