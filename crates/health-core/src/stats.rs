//! Cumulative per-domain availability counters.
//!
//! Counters only ever grow. `record` bumps them with atomic adds, so the
//! aggregator can be shared through `&self` if probing is ever parallelised.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::endpoint::DomainKey;
use crate::prober::ProbeOutcome;

/// Running totals for one domain. `up_count <= total_count` at every observable point.
#[derive(Debug)]
pub struct DomainStats {
    first_seen: u64,
    up_count: AtomicU64,
    total_count: AtomicU64,
}

impl DomainStats {
    fn new(first_seen: u64) -> Self {
        Self {
            first_seen,
            up_count: AtomicU64::new(0),
            total_count: AtomicU64::new(0),
        }
    }

    // total is bumped before up, and read after it, so a reader never sees up > total.
    fn record(&self, outcome: ProbeOutcome) {
        self.total_count.fetch_add(1, Ordering::SeqCst);
        if outcome.is_up() {
            self.up_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn counts(&self) -> (u64, u64) {
        let up = self.up_count.load(Ordering::SeqCst);
        let total = self.total_count.load(Ordering::SeqCst);
        (up, total)
    }
}

#[derive(Debug, Default)]
pub struct DomainAggregator {
    domains: DashMap<DomainKey, DomainStats>,
    next_seq: AtomicU64,
}

impl DomainAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, domain: &DomainKey, outcome: ProbeOutcome) {
        if let Some(stats) = self.domains.get(domain) {
            stats.record(outcome);
            return;
        }
        self.domains
            .entry(domain.clone())
            .or_insert_with(|| DomainStats::new(self.next_seq.fetch_add(1, Ordering::SeqCst)))
            .record(outcome);
    }

    /// `(up_count, total_count)` for a domain, if it has been probed.
    pub fn stats(&self, domain: &DomainKey) -> Option<(u64, u64)> {
        self.domains.get(domain).map(|s| s.counts())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Availability of every domain seen so far, in first-seen order. Does not mutate counters.
    pub fn snapshot(&self) -> AvailabilityReport {
        let mut rows: Vec<(u64, DomainAvailability)> = self
            .domains
            .iter()
            .map(|entry| {
                let (up_count, total_count) = entry.value().counts();
                (
                    entry.value().first_seen,
                    DomainAvailability {
                        domain: entry.key().clone(),
                        up_count,
                        total_count,
                        availability_percent: availability_percent(up_count, total_count),
                    },
                )
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        AvailabilityReport {
            cycle: 0,
            generated_at: Utc::now(),
            domains: rows.into_iter().map(|(_, row)| row).collect(),
        }
    }
}

/// `round(100 * up / total)` with ties to even, or 0 when nothing has been recorded.
pub fn availability_percent(up: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = 100 * u128::from(up.min(total));
    let total = u128::from(total);
    let quotient = scaled / total;
    let remainder = scaled % total;
    let rounded = match (remainder * 2).cmp(&total) {
        CmpOrdering::Less => quotient,
        CmpOrdering::Greater => quotient + 1,
        CmpOrdering::Equal => quotient + (quotient & 1),
    };
    rounded as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAvailability {
    pub domain: DomainKey,
    pub up_count: u64,
    pub total_count: u64,
    pub availability_percent: u64,
}

impl fmt::Display for DomainAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has {}% availability percentage",
            self.domain, self.availability_percent
        )
    }
}

/// Per-cycle view over the aggregator. Recomputed on every cycle, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
    pub domains: Vec<DomainAvailability>,
}

impl AvailabilityReport {
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn get(&self, domain: &str) -> Option<&DomainAvailability> {
        self.domains.iter().find(|d| d.domain.as_str() == domain)
    }

    pub fn lines(&self) -> Vec<String> {
        self.domains.iter().map(|d| d.to_string()).collect()
    }
}

impl fmt::Display for AvailabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.domains {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
