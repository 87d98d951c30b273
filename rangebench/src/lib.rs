//! Workload profiles for timing ranged-index operations.
//!
//! Each profile builds a fresh index, runs one operation `count` times and
//! times every call individually. The summed wall-clock time becomes a
//! [`Measurement`], printed as one throughput line.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use ranged_index::{Comparator, IndexRegistry, RangeQuery, RangedIndex, Value};
use tracing::{debug, info};

/// Bytes of randomness per generated string value (hex-encoded to twice this).
pub const STRING_VALUE_BYTES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookups,
    Insertion,
    Updates,
    Removes,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Lookups => "rangeRequest lookups",
            Operation::Insertion => "insert",
            Operation::Updates => "update",
            Operation::Removes => "remove",
        })
    }
}

/// Total time spent in `count` calls of one operation.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub operation: Operation,
    pub kind: ValueKind,
    pub total: Duration,
    pub count: usize,
}

impl Measurement {
    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1e3
    }

    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.count as f64 / secs
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} value) : {:.2}ms ({:.2}) ops/s ({} documents)",
            self.operation,
            self.kind,
            self.total_ms(),
            self.ops_per_sec(),
            self.count
        )
    }
}

// =============================================================================
// Value sources
// =============================================================================

/// Generates the values a workload stores.
pub trait ValueSource {
    type Value: Clone;

    fn kind(&self) -> ValueKind;

    /// Value for the `idx`-th entry (0-based) of a `count`-entry load.
    fn initial(&mut self, rng: &mut StdRng, idx: usize, count: usize) -> Self::Value;

    /// Value the `idx`-th update moves an entry to.
    fn replacement(&mut self, rng: &mut StdRng, idx: usize, count: usize) -> Self::Value;
}

/// Distinct descending integers; updates move entries above every initial
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberValues;

impl ValueSource for NumberValues {
    type Value = i64;

    fn kind(&self) -> ValueKind {
        ValueKind::Number
    }

    fn initial(&mut self, _rng: &mut StdRng, idx: usize, count: usize) -> i64 {
        count as i64 - idx as i64
    }

    fn replacement(&mut self, _rng: &mut StdRng, idx: usize, count: usize) -> i64 {
        count as i64 * 2 - idx as i64
    }
}

/// Random hex strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValues;

impl StringValues {
    pub fn random_string(rng: &mut StdRng) -> String {
        let mut bytes = [0u8; STRING_VALUE_BYTES];
        rng.fill(&mut bytes[..]);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl ValueSource for StringValues {
    type Value = String;

    fn kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn initial(&mut self, rng: &mut StdRng, _idx: usize, _count: usize) -> String {
        Self::random_string(rng)
    }

    fn replacement(&mut self, rng: &mut StdRng, _idx: usize, _count: usize) -> String {
        Self::random_string(rng)
    }
}

/// Wraps another source's values into the mixed-type [`Value`] domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dynamic<S>(pub S);

impl<S> ValueSource for Dynamic<S>
where
    S: ValueSource,
    S::Value: Into<Value>,
{
    type Value = Value;

    fn kind(&self) -> ValueKind {
        self.0.kind()
    }

    fn initial(&mut self, rng: &mut StdRng, idx: usize, count: usize) -> Value {
        self.0.initial(rng, idx, count).into()
    }

    fn replacement(&mut self, rng: &mut StdRng, idx: usize, count: usize) -> Value {
        self.0.replacement(rng, idx, count).into()
    }
}

// =============================================================================
// Profiler
// =============================================================================

/// Runs the four workload profiles for one value source.
pub struct Profiler<S: ValueSource> {
    source: S,
    indexes: IndexRegistry<u64, S::Value>,
    algorithm: String,
    comparator: Arc<dyn Comparator<S::Value>>,
    rng: StdRng,
}

impl<S: ValueSource> Profiler<S> {
    pub fn new(
        source: S,
        indexes: IndexRegistry<u64, S::Value>,
        algorithm: impl Into<String>,
        comparator: Arc<dyn Comparator<S::Value>>,
        rng: StdRng,
    ) -> Self {
        Self {
            source,
            indexes,
            algorithm: algorithm.into(),
            comparator,
            rng,
        }
    }

    /// Lookups, insertion, updates and removes, in that order.
    pub fn run_all(&mut self, count: usize) -> Result<Vec<Measurement>> {
        Ok(vec![
            self.lookups(count)?,
            self.insertion(count)?,
            self.updates(count)?,
            self.removes(count)?,
        ])
    }

    fn new_index(&self) -> Result<Box<dyn RangedIndex<u64, S::Value>>> {
        self.indexes
            .create(&self.algorithm, "last", Arc::clone(&self.comparator))
            .with_context(|| format!("creating `{}` index", self.algorithm))
    }

    /// Fill a fresh index with ids `1..=count`; returns the stored values.
    fn load(
        &mut self,
        index: &mut dyn RangedIndex<u64, S::Value>,
        count: usize,
    ) -> Result<Vec<S::Value>> {
        let mut values = Vec::with_capacity(count);
        for idx in 0..count {
            let value = self.source.initial(&mut self.rng, idx, count);
            index.insert(idx as u64 + 1, value.clone())?;
            values.push(value);
        }
        debug!(count, "loaded index");
        Ok(values)
    }

    fn measurement(&self, operation: Operation, total: Duration, count: usize) -> Measurement {
        Measurement {
            operation,
            kind: self.source.kind(),
            total,
            count,
        }
    }

    /// `$eq` lookup of every stored value; each must find exactly one id.
    pub fn lookups(&mut self, count: usize) -> Result<Measurement> {
        info!(kind = %self.source.kind(), count, "profiling lookups");
        let mut index = self.new_index()?;
        let values = self.load(index.as_mut(), count)?;

        let mut total = Duration::ZERO;
        for value in values {
            let query = RangeQuery::Eq(value);
            let start = Instant::now();
            let result = index.range_request(Some(&query));
            total += start.elapsed();
            if result.len() != 1 {
                bail!(
                    "did not find previously inserted value ({} matches)",
                    result.len()
                );
            }
        }
        Ok(self.measurement(Operation::Lookups, total, count))
    }

    pub fn insertion(&mut self, count: usize) -> Result<Measurement> {
        info!(kind = %self.source.kind(), count, "profiling insertion");
        let mut index = self.new_index()?;

        let mut total = Duration::ZERO;
        for idx in 0..count {
            let value = self.source.initial(&mut self.rng, idx, count);
            let start = Instant::now();
            index.insert(idx as u64 + 1, value)?;
            total += start.elapsed();
        }
        Ok(self.measurement(Operation::Insertion, total, count))
    }

    /// Move every entry, in random order, to a new value.
    pub fn updates(&mut self, count: usize) -> Result<Measurement> {
        info!(kind = %self.source.kind(), count, "profiling updates");
        let mut index = self.new_index()?;
        self.load(index.as_mut(), count)?;

        let mut ids = index.range_request(None);
        ids.shuffle(&mut self.rng);

        let mut total = Duration::ZERO;
        for (idx, id) in ids.into_iter().enumerate() {
            let value = self.source.replacement(&mut self.rng, idx, count);
            let start = Instant::now();
            index.update(id, value)?;
            total += start.elapsed();
        }
        Ok(self.measurement(Operation::Updates, total, count))
    }

    /// Remove every entry in random order.
    pub fn removes(&mut self, count: usize) -> Result<Measurement> {
        info!(kind = %self.source.kind(), count, "profiling removes");
        let mut index = self.new_index()?;
        self.load(index.as_mut(), count)?;

        let mut ids = index.range_request(None);
        ids.shuffle(&mut self.rng);

        let mut total = Duration::ZERO;
        for id in ids {
            let start = Instant::now();
            index.remove(&id)?;
            total += start.elapsed();
        }
        if !index.is_empty() {
            bail!("{} entries left after removing every id", index.len());
        }
        Ok(self.measurement(Operation::Removes, total, count))
    }
}
