//! Queue repository — row-level commands for the `queue_jobs` table.
//!
//! A row is one pending delivery of a translation job. Claiming a row
//! reserves it until `reserved_until` (the visibility timeout) and bumps
//! its attempt counter; releasing it clears the reservation so another
//! worker can pick it up; acking deletes it.

use rusqlite::{params, OptionalExtension, Transaction};

use super::{Database, DatabaseError};

/// A claimed delivery row. Counters reflect the state after the claim,
/// so `attempts` is 1 on the first delivery.
#[derive(Debug, Clone)]
pub struct DeliveryRow {
    pub id: i64,
    pub translation_id: String,
    pub attempts: u32,
    pub exceptions: u32,
}

/// Enqueues one delivery for a translation inside an open transaction.
pub fn enqueue_tx(
    tx: &Transaction<'_>,
    translation_id: &str,
    available_at: &str,
) -> Result<(), DatabaseError> {
    tx.execute(
        "INSERT INTO queue_jobs (translation_id, available_at, created_at)
         VALUES (?1, ?2, ?2)",
        params![translation_id, available_at],
    )?;
    Ok(())
}

/// Claims the oldest due delivery, if any.
///
/// A delivery is due when it has become available and is not reserved by
/// another worker (or its reservation has lapsed). The select and the
/// reservation update run under the same connection lock, so two workers
/// can never claim the same row.
pub fn claim_due(
    db: &Database,
    now: &str,
    reserved_until: &str,
) -> Result<Option<DeliveryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let due = conn
            .query_row(
                "SELECT id, translation_id, attempts, exceptions FROM queue_jobs
                 WHERE available_at <= ?1
                   AND (reserved_until IS NULL OR reserved_until <= ?1)
                 ORDER BY id LIMIT 1",
                params![now],
                |r| {
                    Ok(DeliveryRow {
                        id: r.get(0)?,
                        translation_id: r.get(1)?,
                        attempts: r.get(2)?,
                        exceptions: r.get(3)?,
                    })
                },
            )
            .optional()?;

        let Some(mut delivery) = due else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE queue_jobs SET attempts = attempts + 1, reserved_until = ?2 WHERE id = ?1",
            params![delivery.id, reserved_until],
        )?;
        delivery.attempts += 1;

        Ok(Some(delivery))
    })
}

/// Releases a claimed delivery for redelivery after a failed attempt.
///
/// `count_exception` bumps the exception counter; `available_at` sets the
/// earliest redelivery time.
pub fn release(
    db: &Database,
    delivery_id: i64,
    count_exception: bool,
    available_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE queue_jobs SET exceptions = exceptions + ?2, reserved_until = NULL,
             available_at = ?3 WHERE id = ?1",
            params![delivery_id, count_exception as i64, available_at],
        )?;
        Ok(())
    })
}

/// Removes a delivery once it is finally handled (success or exhaustion).
pub fn ack(db: &Database, delivery_id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM queue_jobs WHERE id = ?1", params![delivery_id])?;
        Ok(())
    })
}

/// Counts deliveries still in the queue (claimed or not).
pub fn depth(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM queue_jobs", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Counts deliveries enqueued for a specific translation.
pub fn count_for_translation(db: &Database, translation_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM queue_jobs WHERE translation_id = ?1",
            params![translation_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
