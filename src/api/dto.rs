use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::gym::Utilization;

#[derive(Debug, Serialize, ToSchema)]
pub struct UtilizationDto {
    pub timestamp: DateTime<Utc>,
    pub people: u64,
    pub capacity: u64,
    /// Occupancy in percent of capacity; `null` when capacity is zero.
    pub percent: Option<f64>,
}

impl From<Utilization> for UtilizationDto {
    fn from(u: Utilization) -> Self {
        Self {
            percent: u.percent(),
            timestamp: u.timestamp,
            people: u.people,
            capacity: u.capacity,
        }
    }
}

/// One `{t, y}` point of a chart series.
#[derive(Debug, Serialize)]
pub struct ChartPoint<T> {
    pub t: DateTime<Utc>,
    pub y: T,
}

/// Series embedded in `/chart.js`.
#[derive(Debug, Default, Serialize)]
pub struct ChartData {
    pub people: Vec<ChartPoint<u64>>,
    pub capacity: Vec<ChartPoint<u64>>,
    pub percent: Vec<ChartPoint<f64>>,
}

impl From<&[Utilization]> for ChartData {
    fn from(data: &[Utilization]) -> Self {
        let mut chart = Self::default();
        for u in data {
            chart.people.push(ChartPoint { t: u.timestamp, y: u.people });
            chart.capacity.push(ChartPoint { t: u.timestamp, y: u.capacity });
            chart.percent.push(ChartPoint {
                t: u.timestamp,
                y: u.percent().unwrap_or(0.0),
            });
        }
        chart
    }
}
