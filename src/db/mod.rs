use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::PathBuf;

use crate::models::{Invoice, InvoiceStatus, LineItem, Notification, Project};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> SqlResult<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_invoices.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_invoices.sql"
                )),
            ),
            (
                "002_create_projects_and_notifications.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_projects_and_notifications.sql"
                )),
            ),
            (
                "003_create_counters.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_counters.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    /// Next human-facing invoice number, e.g. "INV-00033". A single UPSERT
    /// against the counter row keeps the increment atomic; the counter is
    /// seeded from the current maximum on first use, so an existing
    /// INV-00032 is followed by INV-00033.
    pub fn next_invoice_number(&self) -> SqlResult<String> {
        let next: i64 = self.conn.query_row(
            "INSERT INTO counters (name, value)
             VALUES (
                'invoice_number',
                (SELECT COALESCE(MAX(CAST(substr(number, 5) AS INTEGER)), 0) + 1 FROM invoices)
             )
             ON CONFLICT(name) DO UPDATE SET value = value + 1
             RETURNING value",
            [],
            |row| row.get(0),
        )?;
        Ok(format!("INV-{:05}", next))
    }

    pub fn upsert_invoice(&self, invoice: &Invoice) -> SqlResult<()> {
        let line_items = serde_json::to_string(&invoice.line_items).unwrap_or_else(|_| "[]".into());
        let raw_parsed = invoice
            .raw_parsed_data
            .as_ref()
            .map(|v| v.to_string());

        self.conn.execute(
            "INSERT OR REPLACE INTO invoices (
                id, number, invoice_number, project_id, project_code, vendor,
                file_name, file_url, storage_path, file_size, file_type, file_hash,
                status, parsed, parsed_at, total_amount, subtotal, tax,
                invoice_date, due_date, paid_date, currency, description, po_number,
                payment_method, payment_reference, line_items, raw_parsed_data,
                uploaded_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28,
                      ?29, ?30, ?31)",
            params![
                invoice.id,
                invoice.number,
                invoice.invoice_number,
                invoice.project_id,
                invoice.project_code,
                invoice.vendor,
                invoice.file_name,
                invoice.file_url,
                invoice.storage_path,
                invoice.file_size,
                invoice.file_type,
                invoice.file_hash,
                invoice.status.as_str(),
                invoice.parsed,
                invoice.parsed_at,
                invoice.total_amount,
                invoice.subtotal,
                invoice.tax,
                invoice.invoice_date,
                invoice.due_date,
                invoice.paid_date,
                invoice.currency,
                invoice.description,
                invoice.po_number,
                invoice.payment_method,
                invoice.payment_reference,
                line_items,
                raw_parsed,
                invoice.uploaded_by,
                invoice.created_at,
                invoice.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn get_invoice(&self, id: &str) -> SqlResult<Option<Invoice>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INVOICE_SELECT} WHERE id = ?1"))?;
        stmt.query_row(params![id], row_to_invoice).optional()
    }

    pub fn list_invoices(&self) -> SqlResult<Vec<Invoice>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INVOICE_SELECT} ORDER BY created_at DESC"))?;
        let rows = stmt.query_map([], row_to_invoice)?;
        rows.collect()
    }

    pub fn delete_invoice(&self, id: &str) -> SqlResult<()> {
        self.conn
            .execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn insert_project(&self, project: &Project) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO projects (id, code, title, client_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.code,
                project.title,
                project.client_id,
                project.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> SqlResult<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, title, client_id, created_at FROM projects WHERE id = ?1",
        )?;
        stmt.query_row(params![id], row_to_project).optional()
    }

    pub fn list_projects(&self) -> SqlResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, title, client_id, created_at FROM projects ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        rows.collect()
    }

    pub fn insert_notification(&self, notification: &Notification) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO notifications (id, user_id, project_id, kind, message, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                notification.id,
                notification.user_id,
                notification.project_id,
                notification.kind,
                notification.message,
                notification.read,
                notification.created_at
            ],
        )?;
        Ok(())
    }

    pub fn list_notifications(&self, user_id: &str) -> SqlResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, project_id, kind, message, read, created_at
             FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Notification {
                id: row.get(0)?,
                user_id: row.get(1)?,
                project_id: row.get(2)?,
                kind: row.get(3)?,
                message: row.get(4)?,
                read: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect()
    }
}

const INVOICE_SELECT: &str = "SELECT id, number, invoice_number, project_id, project_code, vendor,
        file_name, file_url, storage_path, file_size, file_type, file_hash,
        status, parsed, parsed_at, total_amount, subtotal, tax,
        invoice_date, due_date, paid_date, currency, description, po_number,
        payment_method, payment_reference, line_items, raw_parsed_data,
        uploaded_by, created_at, updated_at
 FROM invoices";

fn row_to_invoice(row: &Row<'_>) -> SqlResult<Invoice> {
    let status: String = row.get(12)?;
    let line_items: String = row.get(26)?;
    let line_items: Vec<LineItem> = serde_json::from_str(&line_items).unwrap_or_default();
    let raw_parsed: Option<String> = row.get(27)?;
    let raw_parsed_data = raw_parsed.and_then(|s| serde_json::from_str(&s).ok());

    Ok(Invoice {
        id: row.get(0)?,
        number: row.get(1)?,
        invoice_number: row.get(2)?,
        project_id: row.get(3)?,
        project_code: row.get(4)?,
        vendor: row.get(5)?,
        file_name: row.get(6)?,
        file_url: row.get(7)?,
        storage_path: row.get(8)?,
        file_size: row.get(9)?,
        file_type: row.get(10)?,
        file_hash: row.get(11)?,
        status: InvoiceStatus::from_str(&status),
        parsed: row.get(13)?,
        parsed_at: row.get::<_, Option<DateTime<Utc>>>(14)?,
        total_amount: row.get(15)?,
        subtotal: row.get(16)?,
        tax: row.get(17)?,
        invoice_date: row.get::<_, Option<DateTime<Utc>>>(18)?,
        due_date: row.get::<_, Option<DateTime<Utc>>>(19)?,
        paid_date: row.get::<_, Option<DateTime<Utc>>>(20)?,
        currency: row.get(21)?,
        description: row.get(22)?,
        po_number: row.get(23)?,
        payment_method: row.get(24)?,
        payment_reference: row.get(25)?,
        line_items,
        raw_parsed_data,
        uploaded_by: row.get(28)?,
        created_at: row.get(29)?,
        updated_at: row.get(30)?,
    })
}

fn row_to_project(row: &Row<'_>) -> SqlResult<Project> {
    Ok(Project {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        client_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}
