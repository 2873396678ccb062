//! Concurrency policies for batches of generation calls.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

/// How a batch of generation calls is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPolicy {
    /// One call at a time, in order. Keeps request bursts under provider rate limits.
    Sequential,
    /// All calls in flight at once; each result lands independently.
    Concurrent,
}

impl GenerationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationPolicy::Sequential => "sequential",
            GenerationPolicy::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for GenerationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "serial" => Ok(GenerationPolicy::Sequential),
            "concurrent" | "parallel" => Ok(GenerationPolicy::Concurrent),
            other => Err(format!("unknown generation policy: {other}")),
        }
    }
}

/// Drive `jobs` under `policy`, returning their outputs in job order.
///
/// Jobs are lazy futures, so under [`GenerationPolicy::Sequential`] job `n + 1`
/// does not start until job `n` has settled.
pub async fn run_with_policy<F, T>(policy: GenerationPolicy, jobs: Vec<F>) -> Vec<T>
where
    F: Future<Output = T>,
{
    match policy {
        GenerationPolicy::Sequential => {
            let mut results = Vec::with_capacity(jobs.len());
            for job in jobs {
                results.push(job.await);
            }
            results
        }
        GenerationPolicy::Concurrent => join_all(jobs).await,
    }
}
