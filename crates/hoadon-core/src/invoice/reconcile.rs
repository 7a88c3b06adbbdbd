//! Post-extraction repair of the grand total.

use std::fmt;

use tracing::warn;

use crate::models::invoice::InvoiceRecord;

/// A correction applied to a record's total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Repair {
    /// No total was found; derived from subtotal + VAT.
    MissingTotal { derived: f64 },
    /// The scanned total was below the subtotal and was replaced.
    TotalBelowSubtotal { scanned: f64, derived: f64 },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::MissingTotal { derived } => {
                write!(f, "Total missing, derived {derived} from subtotal + VAT")
            }
            Repair::TotalBelowSubtotal { scanned, derived } => write!(
                f,
                "Total {scanned} is below subtotal, replaced with subtotal + VAT = {derived}"
            ),
        }
    }
}

/// Enforce `total >= subtotal` whenever a subtotal is known.
///
/// Only `total` is ever changed. Records without a subtotal are left alone.
pub fn reconcile(record: &mut InvoiceRecord) -> Option<Repair> {
    if record.subtotal <= 0.0 {
        return None;
    }

    let derived = record.subtotal + record.vat;
    let repair = if record.total == 0.0 {
        Repair::MissingTotal { derived }
    } else if record.total < record.subtotal {
        Repair::TotalBelowSubtotal {
            scanned: record.total,
            derived,
        }
    } else {
        return None;
    };

    warn!("{}", repair);
    record.total = derived;
    Some(repair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::InvoiceDraft;
    use chrono::NaiveDate;

    fn record(subtotal: f64, vat: f64, total: f64) -> InvoiceRecord {
        let mut draft = InvoiceDraft::new("");
        if subtotal > 0.0 {
            draft.set_subtotal(subtotal);
        }
        if vat > 0.0 {
            draft.set_vat(vat);
        }
        if total > 0.0 {
            draft.set_total(total);
        }
        let now = NaiveDate::from_ymd_opt(2024, 5, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        draft.finish(now)
    }

    #[test]
    fn test_missing_total_is_derived() {
        let mut r = record(63_325.0, 5_066.0, 0.0);
        assert_eq!(
            reconcile(&mut r),
            Some(Repair::MissingTotal { derived: 68_391.0 })
        );
        assert_eq!(r.total, 68_391.0);
    }

    #[test]
    fn test_low_total_is_replaced() {
        let mut r = record(63_325.0, 5_066.0, 5_066.0);
        assert_eq!(
            reconcile(&mut r),
            Some(Repair::TotalBelowSubtotal {
                scanned: 5_066.0,
                derived: 68_391.0
            })
        );
        assert_eq!(r.total, 68_391.0);
        assert_eq!(r.subtotal, 63_325.0);
        assert_eq!(r.vat, 5_066.0);
    }

    #[test]
    fn test_consistent_records_untouched() {
        let mut r = record(63_325.0, 5_066.0, 68_391.0);
        assert_eq!(reconcile(&mut r), None);
        assert_eq!(r.total, 68_391.0);

        // Total without subtotal stays as scanned
        let mut r = record(0.0, 0.0, 50_000.0);
        assert_eq!(reconcile(&mut r), None);
        assert_eq!(r.total, 50_000.0);

        let mut r = record(0.0, 0.0, 0.0);
        assert_eq!(reconcile(&mut r), None);
        assert_eq!(r.total, 0.0);
    }

    #[test]
    fn test_total_never_below_subtotal() {
        for (subtotal, vat, total) in [
            (1_000.0, 0.0, 0.0),
            (1_000.0, 80.0, 999.0),
            (50_000.0, 4_000.0, 50_000.0),
            (50_000.0, 0.0, 1_000_000.0),
        ] {
            let mut r = record(subtotal, vat, total);
            reconcile(&mut r);
            assert!(r.total >= r.subtotal, "{subtotal} {vat} {total} -> {}", r.total);
        }
    }
}
