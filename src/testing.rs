use crate::Reclamation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const POLICIES: [Reclamation; 2] = [Reclamation::Eager, Reclamation::Lazy];

pub fn init_test() {
    drop(env_logger::try_init());
}

#[derive(Debug, Clone, Copy)]
pub enum Op {
    /// Push the given id, `None` meaning no priority given
    Push(Option<i32>, u32),
    Pop,
    Compact,
}

/// Seeded mix of pushes, pops and the occasional compact over priorities in
/// `lo..=hi`. Pushes outnumber pops so the queue grows and shrinks.
pub fn random_ops(seed: u64, count: usize, lo: i32, hi: i32) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ops = Vec::with_capacity(count);
    let mut next_id = 0;
    for _ in 0..count {
        let roll = rng.gen_range(0..100);
        let op = if roll < 55 {
            let priority = rng.gen_range(lo..=hi);
            next_id += 1;
            Op::Push((priority != 0).then_some(priority), next_id)
        } else if roll < 95 {
            Op::Pop
        } else {
            Op::Compact
        };
        ops.push(op);
    }
    ops
}
