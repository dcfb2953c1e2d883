use crate::model::GameOutcomeRecord;

/// How many rounds the quick view next to the table keeps.
pub const QUICK_VIEW_CAP: usize = 10;

/// Newest-first log of settled rounds. The quick view is a bounded local
/// buffer fed by settlements as they happen; the full history is fetched
/// from the server on demand and paged locally.
#[derive(Debug, Default)]
pub struct HistoryLog {
    quick: Vec<GameOutcomeRecord>,
    full: Option<Vec<GameOutcomeRecord>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly settled round at the head of the log. Older rounds
    /// beyond the cap fall off the quick view but stay in the cached full
    /// history when one is loaded.
    pub fn prepend(&mut self, record: GameOutcomeRecord) {
        if let Some(full) = &mut self.full {
            full.insert(0, record.clone());
        }
        self.quick.insert(0, record);
        self.quick.truncate(QUICK_VIEW_CAP);
    }

    pub fn quick(&self) -> &[GameOutcomeRecord] {
        &self.quick
    }

    /// Replace the cached full history with a server fetch. Records arrive
    /// in whatever order the server sends them; they are kept newest-first,
    /// with ties left in arrival order.
    pub fn set_full(&mut self, mut records: Vec<GameOutcomeRecord>) {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if self.quick.is_empty() {
            self.quick = records.iter().take(QUICK_VIEW_CAP).cloned().collect();
        }
        self.full = Some(records);
    }

    pub fn full_loaded(&self) -> bool {
        self.full.is_some()
    }

    pub fn full_len(&self) -> usize {
        self.full.as_ref().map_or(0, Vec::len)
    }

    /// One page of the cached full history, zero-indexed. Pages past the
    /// end are empty rather than an error.
    pub fn page(&self, page: usize, page_size: usize) -> &[GameOutcomeRecord] {
        let Some(full) = &self.full else {
            return &[];
        };
        let start = page.saturating_mul(page_size).min(full.len());
        let end = start.saturating_add(page_size).min(full.len());
        &full[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        match &self.full {
            Some(full) if page_size > 0 => full.len().div_ceil(page_size),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CoinSide;
    use chrono::{
        TimeZone,
        Utc,
    };

    fn record(n: u32) -> GameOutcomeRecord {
        GameOutcomeRecord::settled(
            CoinSide::Heads,
            CoinSide::Heads,
            100,
            100,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, n).unwrap(),
            Some(u64::from(n)),
        )
    }

    #[test]
    fn quick_view_is_newest_first_and_capped() {
        let mut log = HistoryLog::new();
        for n in 0..15 {
            log.prepend(record(n));
        }
        assert_eq!(log.quick().len(), QUICK_VIEW_CAP);
        assert_eq!(log.quick()[0].server_id, Some(14));
        assert_eq!(log.quick()[9].server_id, Some(5));
    }

    #[test]
    fn set_full_sorts_newest_first() {
        let mut log = HistoryLog::new();
        log.set_full(vec![record(3), record(7), record(1)]);
        let ids: Vec<_> = log.page(0, 10).iter().map(|r| r.server_id).collect();
        assert_eq!(ids, [Some(7), Some(3), Some(1)]);
    }

    #[test]
    fn set_full_seeds_an_empty_quick_view() {
        let mut log = HistoryLog::new();
        log.set_full((0..15).map(record).collect());
        assert_eq!(log.quick().len(), QUICK_VIEW_CAP);
        assert_eq!(log.quick()[0].server_id, Some(14));
    }

    #[test]
    fn settlements_land_in_the_cached_full_history_too() {
        let mut log = HistoryLog::new();
        log.set_full(vec![record(1)]);
        log.prepend(record(2));
        assert_eq!(log.full_len(), 2);
        assert_eq!(log.page(0, 10)[0].server_id, Some(2));
    }

    #[test]
    fn paging_clamps_to_the_end() {
        let mut log = HistoryLog::new();
        log.set_full((0..5).map(record).collect());
        assert_eq!(log.page(0, 2).len(), 2);
        assert_eq!(log.page(2, 2).len(), 1);
        assert!(log.page(3, 2).is_empty());
        assert_eq!(log.page_count(2), 3);
    }

    #[test]
    fn no_full_history_means_empty_pages() {
        let log = HistoryLog::new();
        assert!(log.page(0, 10).is_empty());
        assert_eq!(log.page_count(10), 0);
        assert!(!log.full_loaded());
    }
}
