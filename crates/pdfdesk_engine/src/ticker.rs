use std::sync::mpsc;
use std::time::Duration;

use rand_core::{OsRng, RngCore};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, RequestId};

/// Largest increment a single simulated tick may carry.
pub const MAX_TICK_INCREMENT: f32 = 10.0;

/// Uniform pseudo-random increment in `[0, MAX_TICK_INCREMENT)`.
pub fn random_increment() -> f32 {
    increment_from(OsRng.next_u32())
}

/// Maps raw random bits onto the tick range. Scaling can round the top
/// values up to the bound itself, so the result is held just below it.
fn increment_from(bits: u32) -> f32 {
    let unit = (bits >> 8) as f32 / (1u32 << 24) as f32;
    let below_max = f32::from_bits(MAX_TICK_INCREMENT.to_bits() - 1);
    (unit * MAX_TICK_INCREMENT).min(below_max)
}

/// Emits `Tick` events every `period` until cancelled or the receiver goes away.
///
/// The first tick fires one full period after start.
pub(crate) async fn run_progress_timer(
    request_id: RequestId,
    period: Duration,
    token: CancellationToken,
    tx: mpsc::Sender<EngineEvent>,
) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let event = EngineEvent::Tick {
                    request_id,
                    increment: random_increment(),
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_stay_in_range() {
        for _ in 0..1_000 {
            let inc = random_increment();
            assert!((0.0..MAX_TICK_INCREMENT).contains(&inc), "{inc}");
        }
    }

    #[test]
    fn extreme_bits_map_inside_half_open_range() {
        assert_eq!(increment_from(0), 0.0);
        let top = increment_from(u32::MAX);
        assert!(top < MAX_TICK_INCREMENT, "{top}");
        assert!(top > 9.99, "{top}");
    }
}
