use std::collections::HashMap;
use std::fmt;

use bucketq::Queue;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Priority and value as handed to the queue. A `None` priority is pushed
/// without one.
pub type Record = (Option<i64>, String);

/// Error type for dataset verification.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckError {
    /// Number of values drained differs from the number pushed
    Count { expected: usize, actual: usize },
    /// A value came out at the wrong position
    Position { position: usize, value: String },
    /// Priority went down between two consecutive pops
    Order { position: usize, previous: i64, priority: i64 },
    /// Two values of the same priority came out of push order
    Fifo { priority: i64, previous: u64, seq: u64 },
    /// Value does not have the `payload:priority:seq` shape
    Malformed(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Count { expected, actual } => {
                write!(f, "expected {} values, drained {}", expected, actual)
            }
            CheckError::Position { position, value } => {
                // Payloads are long, show only the end
                let tail = value
                    .char_indices()
                    .rev()
                    .nth(7)
                    .map_or(value.as_str(), |(i, _)| &value[i..]);
                write!(f, "value ...{} popped at position {}", tail, position)
            }
            CheckError::Order {
                position,
                previous,
                priority,
            } => write!(
                f,
                "priority {} popped after {} at position {}",
                priority, previous, position
            ),
            CheckError::Fifo {
                priority,
                previous,
                seq,
            } => write!(
                f,
                "priority {}: seq {} popped after seq {}",
                priority, seq, previous
            ),
            CheckError::Malformed(value) => write!(f, "malformed value: {}", value),
        }
    }
}

/// The values pushed into a queue during one run.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Ten values over mixed priorities. Each value ends in the digit of the
    /// position it must pop at.
    pub fn scenario(payload: &str) -> Self {
        let layout = [
            (Some(80), '8'),
            (Some(-10), '1'),
            (None, '3'),
            (Some(0), '4'),
            (None, '5'),
            (Some(10), '6'),
            (Some(100), '9'),
            (Some(50), '7'),
            (Some(-20), '0'),
            (Some(-10), '2'),
        ];
        let records = layout
            .into_iter()
            .map(|(priority, digit)| (priority, format!("{}{}", payload, digit)))
            .collect();
        Dataset { records }
    }

    /// `size` values with priorities drawn uniformly from `min..=max`. Values
    /// read `payload:priority:seq`; priority 0 is pushed without a priority.
    pub fn random(size: usize, min: i64, max: i64, payload: &str, seed: u64) -> Self {
        // Seeded so timings compare the same workload across runs
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let records = (0..size)
            .map(|seq| {
                let priority = rng.gen_range(min..=max);
                let value = format!("{}:{}:{}", payload, priority, seq);
                ((priority != 0).then_some(priority), value)
            })
            .collect();
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Push every record into `queue`.
    pub fn load<Q: Queue<i64, String> + ?Sized>(&self, queue: &mut Q) {
        for (priority, value) in &self.records {
            queue.push_opt(*priority, value.clone());
        }
    }
}

/// Pop until the queue reports empty.
pub fn drain<Q: Queue<i64, String> + ?Sized>(queue: &mut Q) -> Vec<String> {
    let mut popped = Vec::with_capacity(queue.len());
    while let Ok(value) = queue.pop() {
        popped.push(value);
    }
    popped
}

/// Check a drained [`Dataset::scenario`].
pub fn verify_scenario(popped: &[String]) -> Result<(), CheckError> {
    if popped.len() != 10 {
        return Err(CheckError::Count {
            expected: 10,
            actual: popped.len(),
        });
    }
    for (position, value) in popped.iter().enumerate() {
        if !value.ends_with(&position.to_string()) {
            return Err(CheckError::Position {
                position,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

fn parse_value(value: &str) -> Result<(i64, u64), CheckError> {
    let malformed = || CheckError::Malformed(value.to_string());
    let mut fields = value.rsplitn(3, ':');
    let seq = fields.next().ok_or_else(malformed)?;
    let priority = fields.next().ok_or_else(malformed)?;
    let seq = seq.parse().map_err(|_| malformed())?;
    let priority = priority.parse().map_err(|_| malformed())?;
    Ok((priority, seq))
}

/// Check a drained [`Dataset::random`]: priorities never go down and values
/// of one priority come out in push order.
pub fn verify_random(popped: &[String], expected: usize) -> Result<(), CheckError> {
    if popped.len() != expected {
        return Err(CheckError::Count {
            expected,
            actual: popped.len(),
        });
    }

    let mut previous_priority = i64::MIN;
    let mut last_seq: HashMap<i64, u64> = HashMap::new();
    for (position, value) in popped.iter().enumerate() {
        let (priority, seq) = parse_value(value)?;
        if priority < previous_priority {
            return Err(CheckError::Order {
                position,
                previous: previous_priority,
                priority,
            });
        }
        previous_priority = priority;

        if let Some(previous) = last_seq.insert(priority, seq) {
            if seq <= previous {
                return Err(CheckError::Fifo {
                    priority,
                    previous,
                    seq,
                });
            }
        }
    }
    Ok(())
}
