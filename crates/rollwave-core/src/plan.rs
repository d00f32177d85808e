//! Batch planning.
//!
//! Given a worklist of length L and a concurrency cap B, the planner first
//! fixes the number of rounds at ceil(L/B) — the minimum possible under the
//! cap — then spreads targets evenly across them. This bounds the number of
//! sequential rounds instead of filling every batch to B: 25 targets at
//! cap 10 become three batches of 9, 9, 7 rather than 10, 10, 5.

/// Partition a worklist into consecutive batches.
///
/// Every batch is at most `concurrency` long, all batches except possibly
/// the last are equal in size, and concatenating the batches reproduces the
/// worklist in order. An empty worklist yields no batches. A concurrency of
/// zero is treated as one.
pub fn plan_batches<T>(worklist: Vec<T>, concurrency: usize) -> Vec<Vec<T>> {
    if worklist.is_empty() {
        return Vec::new();
    }
    let cap = concurrency.max(1);
    let rounds = worklist.len().div_ceil(cap);
    let chunk = worklist.len().div_ceil(rounds);

    let mut batches = Vec::with_capacity(rounds);
    let mut items = worklist.into_iter();
    loop {
        let batch: Vec<T> = items.by_ref().take(chunk).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }
    batches
}
