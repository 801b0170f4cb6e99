//! Synthetic Risk Table Generator
//!
//! Writes a JSON Lines risk table with a mix of legitimate and suspicious
//! transactions for exercising the monitor without production data.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_monitor::RiskRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "generate_table", about = "Generate a synthetic risk table (JSON Lines)")]
struct Args {
    /// Number of rows
    #[arg(long, default_value_t = 5000)]
    rows: usize,

    /// Fraction of suspicious rows
    #[arg(long, default_value_t = 0.1)]
    fraud_rate: f64,

    /// Days covered, ending today
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Extra risk added per day over the last `days / 4` days
    #[arg(long, default_value_t = 0.0)]
    ramp: f64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file, stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Risk table row generator
struct TableGenerator {
    rng: StdRng,
    start: DateTime<Utc>,
    days: i64,
    ramp: f64,
}

impl TableGenerator {
    fn new(seed: u64, end: DateTime<Utc>, days: i64, ramp: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            start: end - Duration::days(days),
            days,
            ramp,
        }
    }

    fn timestamp(&mut self) -> (DateTime<Utc>, i64) {
        let day = self.rng.gen_range(0..self.days.max(1));
        let seconds = self.rng.gen_range(0..86_400);
        (self.start + Duration::days(day) + Duration::seconds(seconds), day)
    }

    /// Risk added for rows in the trailing ramp window
    fn ramp_boost(&self, day: i64) -> f64 {
        let ramp_days = (self.days / 4).max(1);
        let into_ramp = day - (self.days - ramp_days);
        if into_ramp >= 0 {
            self.ramp * (into_ramp + 1) as f64
        } else {
            0.0
        }
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> RiskRecord {
        let (timestamp, day) = self.timestamp();
        let risk = self.rng.gen_range(0.02..0.55) + self.ramp_boost(day);

        RiskRecord {
            user_id: format!("user_{:04}", self.rng.gen_range(0..400)),
            timestamp,
            amount: self.rng.gen_range(10.0..500.0),
            risk_score: risk.min(1.0),
            is_fraud: false,
            cluster: self.rng.gen_range(0..3),
            amount_zscore: self.rng.gen_range(-1.5..1.5),
            risk_momentum: self.rng.gen_range(-0.2..0.2),
            device_change_rolling: self.rng.gen_range(0.0..0.3),
            cluster_risk: self.rng.gen_range(0.05..0.3),
            risk_explanation: None,
        }
    }

    /// Generate a suspicious/fraudulent transaction
    fn generate_suspicious(&mut self) -> RiskRecord {
        let (timestamp, day) = self.timestamp();
        let risk = self.rng.gen_range(0.6..0.99) + self.ramp_boost(day);

        RiskRecord {
            user_id: format!("user_{:04}", self.rng.gen_range(380..420)), // small, shared set of accounts
            timestamp,
            amount: self.rng.gen_range(1000.0..10000.0), // High amount
            risk_score: risk.min(1.0),
            is_fraud: self.rng.gen_bool(0.7),
            cluster: self.rng.gen_range(3..5),
            amount_zscore: self.rng.gen_range(2.0..6.0),
            risk_momentum: self.rng.gen_range(0.2..1.0),
            device_change_rolling: self.rng.gen_range(0.4..1.0),
            cluster_risk: self.rng.gen_range(0.5..0.9),
            risk_explanation: None,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_table=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    info!(
        rows = args.rows,
        fraud_rate = args.fraud_rate,
        days = args.days,
        ramp = args.ramp,
        seed = args.seed,
        "Generating synthetic risk table"
    );

    let end = Utc.from_utc_datetime(&Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap_or_default());
    let mut generator = TableGenerator::new(args.seed, end, args.days, args.ramp);
    let fraud_rate = args.fraud_rate.clamp(0.0, 1.0);

    let mut rows: Vec<RiskRecord> = (0..args.rows)
        .map(|_| {
            if generator.rng.gen_bool(fraud_rate) {
                generator.generate_suspicious()
            } else {
                generator.generate_legitimate()
            }
        })
        .collect();
    rows.sort_by_key(|r| r.timestamp);

    let sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);
    for row in &rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    let suspicious = rows.iter().filter(|r| r.risk_score >= 0.6).count();
    info!(
        "Completed! Wrote {} rows ({} scored 0.6 or above)",
        rows.len(),
        suspicious
    );

    Ok(())
}
