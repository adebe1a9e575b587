//! Per-iteration instrumentation hooks.
//!
//! A searcher reports one [`IterationRecord`] per finished iteration to an
//! optional [`IterationObserver`]. [`TimeDepthLog`] collects them and writes
//! the `iteration, max_depth, nanos` text format used by the benchmark
//! tooling.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// What one finished iteration reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationRecord {
    /// 1-based iteration index within the search
    pub iteration: u32,
    /// Deepest tree node selected so far in this search
    pub max_depth: u32,
    /// Wall time of this iteration
    pub elapsed: Duration,
}

/// Receives a record after every iteration.
pub trait IterationObserver {
    fn on_iteration(&mut self, record: &IterationRecord);
}

impl<F> IterationObserver for F
where
    F: FnMut(&IterationRecord),
{
    fn on_iteration(&mut self, record: &IterationRecord) {
        self(record)
    }
}

/// In-memory time/depth log, flushed to disk on demand.
#[derive(Debug, Clone, Default)]
pub struct TimeDepthLog {
    records: Vec<IterationRecord>,
}

impl TimeDepthLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append all records to `path`, one `iteration, max_depth, nanos` line
    /// each. Parent directories are created as needed.
    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut out = BufWriter::new(file);
        for r in &self.records {
            writeln!(out, "{}, {}, {}", r.iteration, r.max_depth, r.elapsed.as_nanos())?;
        }
        out.flush()
    }
}

impl IterationObserver for TimeDepthLog {
    fn on_iteration(&mut self, record: &IterationRecord) {
        self.push(*record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: u32, max_depth: u32, nanos: u64) -> IterationRecord {
        IterationRecord {
            iteration,
            max_depth,
            elapsed: Duration::from_nanos(nanos),
        }
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |r: &IterationRecord| seen.push(r.iteration);
            observer.on_iteration(&record(1, 1, 10));
            observer.on_iteration(&record(2, 3, 10));
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_log_collects_records() {
        let mut log = TimeDepthLog::new();
        assert!(log.is_empty());
        log.on_iteration(&record(1, 2, 500));
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].max_depth, 2);
    }

    #[test]
    fn test_append_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic").join("0.txt");

        let mut log = TimeDepthLog::new();
        log.push(record(1, 1, 1500));
        log.push(record(2, 4, 900));
        log.append_to(&path).unwrap();
        log.append_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1, 1, 1500");
        assert_eq!(lines[1], "2, 4, 900");
    }
}
