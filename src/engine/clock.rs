/// Wall-clock epoch grid.
///
/// Boundaries are aligned to multiples of the epoch length since the Unix
/// epoch, never to process start, so independent instances observing the same
/// clock agree on every boundary.
#[derive(Debug, Clone, Copy)]
pub struct EpochClock {
    epoch_ms: i64,
}

impl EpochClock {
    pub fn new(epoch_ms: i64) -> Self {
        assert!(epoch_ms > 0, "epoch length must be positive");
        Self { epoch_ms }
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    /// Epoch index containing `now_ms`.
    pub fn epoch_index(&self, now_ms: i64) -> i64 {
        now_ms.div_euclid(self.epoch_ms)
    }

    /// Start timestamp of an epoch.
    pub fn epoch_start(&self, epoch: i64) -> i64 {
        epoch * self.epoch_ms
    }

    /// End timestamp of an epoch (equals the start of the next one).
    pub fn epoch_end(&self, epoch: i64) -> i64 {
        (epoch + 1) * self.epoch_ms
    }

    /// Milliseconds until the current epoch closes.
    pub fn time_remaining(&self, now_ms: i64) -> i64 {
        self.epoch_ms - now_ms.rem_euclid(self.epoch_ms)
    }

    /// Epoch-end timestamps for boundary markers: past ends back to the epoch
    /// containing `oldest_ms` (the extent of retained price history), plus the
    /// next `count` future ends. Deterministic given `now_ms` and the extent.
    pub fn boundaries(&self, now_ms: i64, oldest_ms: Option<i64>, count: usize) -> Vec<i64> {
        let current = self.epoch_index(now_ms);
        let first = oldest_ms.map_or(current, |o| self.epoch_index(o).min(current));
        (first..current + count as i64)
            .map(|e| self.epoch_end(e))
            .collect()
    }
}
