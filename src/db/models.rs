use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use crate::gym::Utilization;

/// Mirrors a row of the `utilization` table.
///
/// Counts are `BIGINT` in Postgres, so they travel as `i64` and are
/// range-checked on the way in and out.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UtilizationRow {
    pub recorded_at: DateTime<Utc>,
    pub people: i64,
    pub capacity: i64,
}

impl TryFrom<&Utilization> for UtilizationRow {
    type Error = anyhow::Error;

    fn try_from(u: &Utilization) -> Result<Self> {
        Ok(Self {
            recorded_at: u.timestamp,
            people: i64::try_from(u.people)
                .with_context(|| format!("people count out of range at {}", rfc3339(u.timestamp)))?,
            capacity: i64::try_from(u.capacity)
                .with_context(|| format!("capacity out of range at {}", rfc3339(u.timestamp)))?,
        })
    }
}

impl TryFrom<UtilizationRow> for Utilization {
    type Error = anyhow::Error;

    fn try_from(r: UtilizationRow) -> Result<Self> {
        let at = rfc3339(r.recorded_at);
        let people = u64::try_from(r.people)
            .with_context(|| format!("parsing people field value at {at}"))?;
        let capacity = u64::try_from(r.capacity)
            .with_context(|| format!("parsing capacity field value at {at}"))?;

        if capacity == 0 {
            bail!("capacity at {at} is 0");
        }

        Ok(Utilization::new(r.recorded_at, people, capacity))
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(people: i64, capacity: i64) -> UtilizationRow {
        UtilizationRow {
            recorded_at: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            people,
            capacity,
        }
    }

    #[test]
    fn row_converts_to_utilization() {
        let u = Utilization::try_from(row(12, 150)).unwrap();
        assert_eq!(u.people, 12);
        assert_eq!(u.capacity, 150);
        assert_eq!(u.timestamp.timestamp(), 1_600_000_000);
    }

    #[test]
    fn zero_capacity_row_is_rejected() {
        let err = Utilization::try_from(row(3, 0)).unwrap_err();
        assert!(err.to_string().contains("capacity at 2020-09-13T12:26:40Z is 0"));
    }

    #[test]
    fn negative_count_row_is_rejected() {
        let err = Utilization::try_from(row(-1, 10)).unwrap_err();
        assert!(err.to_string().contains("parsing people field value"));
    }

    #[test]
    fn oversized_count_cannot_be_stored() {
        let u = Utilization::new(Utc.timestamp_opt(0, 0).unwrap(), u64::MAX, 10);
        let err = UtilizationRow::try_from(&u).unwrap_err();
        assert!(err.to_string().contains("people count out of range"));
    }

    #[test]
    fn utilization_converts_to_row() {
        let u = Utilization::new(Utc.timestamp_opt(60, 0).unwrap(), 4, 40);
        let r = UtilizationRow::try_from(&u).unwrap();
        assert_eq!(r.people, 4);
        assert_eq!(r.capacity, 40);
        assert_eq!(r.recorded_at, u.timestamp);
    }
}
