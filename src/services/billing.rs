//! Billing snapshot computed on demand from the full invoice collection.
//! No caching and no incremental maintenance; every call is a full scan.

use chrono::{DateTime, Datelike, Utc};

use crate::models::{BillingStats, Invoice, InvoiceStatus};

/// Every invoice lands in exactly one bucket, evaluated in this precedence:
/// paid, then overdue (due strictly before `now`), then pending. Missing
/// amounts count as zero. The monthly series covers the current calendar
/// year of `now`, keyed by paid date.
pub fn compute_billing_stats(invoices: &[Invoice], now: DateTime<Utc>) -> BillingStats {
    let current_month = now.month();
    let current_year = now.year();

    let mut stats = BillingStats {
        monthly_revenue: vec![0.0; 12],
        ..BillingStats::default()
    };
    stats.total_count = invoices.len() as u32;

    for invoice in invoices {
        let amount = invoice.total_amount.unwrap_or(0.0);
        let is_overdue = invoice.status != InvoiceStatus::Paid
            && invoice.due_date.map(|due| due < now).unwrap_or(false);

        if invoice.status == InvoiceStatus::Paid {
            stats.paid_count += 1;
            stats.total_revenue += amount;

            if let Some(paid_date) = invoice.paid_date {
                if paid_date.year() == current_year {
                    stats.monthly_revenue[paid_date.month0() as usize] += amount;

                    if paid_date.month() == current_month {
                        stats.paid_this_month += amount;
                        stats.revenue_this_month += amount;
                    }
                }
            }
        } else if is_overdue {
            stats.overdue_count += 1;
            stats.overdue_amount += amount;
            stats.outstanding_amount += amount;
        } else {
            stats.pending_count += 1;
            stats.outstanding_amount += amount;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invoice(status: InvoiceStatus, total: Option<f64>) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            number: "INV-00001".to_string(),
            invoice_number: None,
            project_id: "proj-1".to_string(),
            project_code: "DOM-001".to_string(),
            vendor: String::new(),
            file_name: "scan.pdf".to_string(),
            file_url: String::new(),
            storage_path: String::new(),
            file_size: 0,
            file_type: "application/pdf".to_string(),
            file_hash: String::new(),
            status,
            parsed: false,
            parsed_at: None,
            total_amount: total,
            subtotal: None,
            tax: None,
            invoice_date: None,
            due_date: None,
            paid_date: None,
            currency: "PHP".to_string(),
            description: String::new(),
            po_number: String::new(),
            payment_method: None,
            payment_reference: None,
            line_items: Vec::new(),
            raw_parsed_data: None,
            uploaded_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn paid_this_month_contributes_to_revenue_only() {
        let now = Utc::now();
        let mut paid = invoice(InvoiceStatus::Paid, Some(500.0));
        paid.paid_date = Some(now);

        let stats = compute_billing_stats(&[paid], now);
        assert_eq!(stats.total_revenue, 500.0);
        assert_eq!(stats.revenue_this_month, 500.0);
        assert_eq!(stats.paid_this_month, 500.0);
        assert_eq!(stats.outstanding_amount, 0.0);
        assert_eq!(stats.overdue_amount, 0.0);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.monthly_revenue[now.month0() as usize], 500.0);
    }

    #[test]
    fn pending_past_due_counts_as_overdue_and_outstanding() {
        let now = Utc::now();
        let mut overdue = invoice(InvoiceStatus::Pending, Some(200.0));
        overdue.due_date = Some(now - Duration::days(1));

        let stats = compute_billing_stats(&[overdue], now);
        assert_eq!(stats.overdue_amount, 200.0);
        assert_eq!(stats.outstanding_amount, 200.0);
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.pending_count, 0);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.revenue_this_month, 0.0);
    }

    #[test]
    fn pending_not_yet_due_stays_pending() {
        let now = Utc::now();
        let mut pending = invoice(InvoiceStatus::Pending, Some(150.0));
        pending.due_date = Some(now + Duration::days(30));
        let no_due = invoice(InvoiceStatus::Pending, Some(50.0));

        let stats = compute_billing_stats(&[pending, no_due], now);
        assert_eq!(stats.pending_count, 2);
        assert_eq!(stats.overdue_count, 0);
        assert_eq!(stats.outstanding_amount, 200.0);
    }

    #[test]
    fn paid_invoice_is_never_double_counted() {
        // paid but with a long-gone due date: still only revenue
        let now = Utc::now();
        let mut paid = invoice(InvoiceStatus::Paid, Some(300.0));
        paid.due_date = Some(now - Duration::days(60));
        paid.paid_date = Some(now - Duration::days(10));

        let stats = compute_billing_stats(&[paid], now);
        assert_eq!(stats.total_revenue, 300.0);
        assert_eq!(stats.overdue_amount, 0.0);
        assert_eq!(stats.outstanding_amount, 0.0);
        assert_eq!(stats.overdue_count, 0);
    }

    #[test]
    fn monthly_series_restricted_to_current_year() {
        let now = Utc::now();
        let mut last_year = invoice(InvoiceStatus::Paid, Some(900.0));
        last_year.paid_date = Some(now - Duration::days(400));

        let stats = compute_billing_stats(&[last_year], now);
        assert_eq!(stats.total_revenue, 900.0);
        assert!(stats.monthly_revenue.iter().all(|v| *v == 0.0));
        assert_eq!(stats.revenue_this_month, 0.0);
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let now = Utc::now();
        let mut paid = invoice(InvoiceStatus::Paid, None);
        paid.paid_date = Some(now);

        let stats = compute_billing_stats(&[paid], now);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.total_count, 1);
    }
}
