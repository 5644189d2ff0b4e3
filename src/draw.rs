//! Unique number drawing
//!
//! Draws without replacement from a shrinking candidate pool, so every
//! ordered selection of `count` numbers is equally likely under a uniform
//! generator and no retry loop is needed.

use rand::Rng;
use thiserror::Error;

/// Draw configuration that cannot be satisfied. These are programmer
/// errors, not something a user can recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("Empty range: {min} > {max}")]
    EmptyRange { min: u32, max: u32 },
    #[error("Cannot draw {count} unique numbers from a range of {available}")]
    RangeTooSmall { count: usize, available: u64 },
}

/// Draw `count` pairwise-distinct numbers from `[min, max]`.
///
/// The result is in draw order, not sorted.
pub fn draw<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    min: u32,
    max: u32,
) -> Result<Vec<u32>, DrawError> {
    check_range(count, min, max)?;

    let mut pool: Vec<u32> = (min..=max).collect();
    let mut drawn = Vec::with_capacity(count);

    while drawn.len() < count {
        let index = rng.gen_range(0..pool.len());
        drawn.push(pool.swap_remove(index));
    }

    Ok(drawn)
}

/// Validate that `count` unique numbers fit in `[min, max]`.
pub fn check_range(count: usize, min: u32, max: u32) -> Result<(), DrawError> {
    if min > max {
        return Err(DrawError::EmptyRange { min, max });
    }
    let available = u64::from(max - min) + 1;
    if count as u64 > available {
        return Err(DrawError::RangeTooSmall { count, available });
    }
    Ok(())
}
