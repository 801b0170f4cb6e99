//! Daily resampling of the risk table.
//!
//! Buckets are UTC calendar days. Days without rows are skipped rather than
//! reported as gaps, so consecutive points may be more than a day apart.

use super::stats;
use crate::types::RiskRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Median and 10-90% band of one day's risk scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBand {
    pub date: NaiveDate,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
}

fn bucket_by_day<F>(rows: &[&RiskRecord], value: F) -> BTreeMap<NaiveDate, Vec<f64>>
where
    F: Fn(&RiskRecord) -> f64,
{
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in rows {
        days.entry(row.timestamp.date_naive())
            .or_default()
            .push(value(*row));
    }
    days
}

fn daily_mean<F>(rows: &[&RiskRecord], value: F) -> Vec<DailyPoint>
where
    F: Fn(&RiskRecord) -> f64,
{
    bucket_by_day(rows, value)
        .into_iter()
        .filter_map(|(date, values)| stats::mean(&values).map(|value| DailyPoint { date, value }))
        .collect()
}

/// Mean risk score per day, chronological.
pub fn daily_mean_risk(rows: &[&RiskRecord]) -> Vec<DailyPoint> {
    daily_mean(rows, |r| r.risk_score)
}

/// Share of confirmed fraud per day, chronological.
pub fn daily_fraud_share(rows: &[&RiskRecord]) -> Vec<DailyPoint> {
    daily_mean(rows, |r| if r.is_fraud { 1.0 } else { 0.0 })
}

pub fn daily_risk_bands(rows: &[&RiskRecord]) -> Vec<DailyBand> {
    bucket_by_day(rows, |r| r.risk_score)
        .into_iter()
        .filter_map(|(date, values)| {
            Some(DailyBand {
                date,
                median: stats::median(&values)?,
                p10: stats::quantile(&values, 0.1)?,
                p90: stats::quantile(&values, 0.9)?,
            })
        })
        .collect()
}

/// Day-over-day change, dated by the later day.
pub fn deltas(points: &[DailyPoint]) -> Vec<DailyPoint> {
    points
        .windows(2)
        .map(|pair| DailyPoint {
            date: pair[1].date,
            value: pair[1].value - pair[0].value,
        })
        .collect()
}

/// Values of a daily series, for the analytics helpers.
pub fn values(points: &[DailyPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(day: u32, hour: u32, risk: f64, fraud: bool) -> RiskRecord {
        RiskRecord {
            user_id: "u".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            amount: 10.0,
            risk_score: risk,
            is_fraud: fraud,
            cluster: 0,
            amount_zscore: 0.0,
            risk_momentum: 0.0,
            device_change_rolling: 0.0,
            cluster_risk: 0.0,
            risk_explanation: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_daily_mean_and_fraud_share() {
        let records = vec![
            record(2, 9, 0.6, true),
            record(1, 8, 0.2, false),
            record(1, 20, 0.4, true),
            record(4, 1, 0.9, false),
        ];
        let rows: Vec<&RiskRecord> = records.iter().collect();

        let trend = daily_mean_risk(&rows);
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].date, date(1));
        assert!((trend[0].value - 0.3).abs() < 1e-12);
        assert_eq!(trend[2].date, date(4));

        let share = daily_fraud_share(&rows);
        assert_eq!(values(&share), vec![0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_bands() {
        let records: Vec<RiskRecord> = (0..11).map(|h| record(1, h, h as f64 / 10.0, false)).collect();
        let rows: Vec<&RiskRecord> = records.iter().collect();
        let bands = daily_risk_bands(&rows);
        assert_eq!(bands.len(), 1);
        assert!((bands[0].median - 0.5).abs() < 1e-12);
        assert!((bands[0].p10 - 0.1).abs() < 1e-12);
        assert!((bands[0].p90 - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_deltas() {
        let points = vec![
            DailyPoint { date: date(1), value: 0.2 },
            DailyPoint { date: date(2), value: 0.5 },
            DailyPoint { date: date(5), value: 0.4 },
        ];
        let d = deltas(&points);
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].date, date(2));
        assert!((d[0].value - 0.3).abs() < 1e-12);
        assert!((d[1].value + 0.1).abs() < 1e-12);
        assert!(deltas(&points[..1]).is_empty());
    }
}
