use std::collections::BTreeMap;

use chrono::NaiveDate;

use logdeck_types::{DateLevelCount, LevelCountRow, LevelSummary, LogLevel};

/// Counts per log level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub info: u64,
    pub debug: u64,
    pub warn: u64,
    pub error: u64,
}

impl LevelCounts {
    pub fn get(&self, level: LogLevel) -> u64 {
        match level {
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
        }
    }

    pub fn set(&mut self, level: LogLevel, count: u64) {
        match level {
            LogLevel::Info => self.info = count,
            LogLevel::Debug => self.debug = count,
            LogLevel::Warn => self.warn = count,
            LogLevel::Error => self.error = count,
        }
    }

    pub fn total(&self) -> u64 {
        self.info
            .saturating_add(self.debug)
            .saturating_add(self.warn)
            .saturating_add(self.error)
    }

    /// (level, count) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (LogLevel, u64)> + '_ {
        LogLevel::ALL.into_iter().map(|level| (level, self.get(level)))
    }
}

/// Dense date × level count matrix for charting
///
/// Every calendar day between the first and last date is present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartMatrix {
    days: BTreeMap<NaiveDate, LevelCounts>,
}

impl ChartMatrix {
    pub fn get(&self, date: NaiveDate) -> Option<&LevelCounts> {
        self.days.get(&date)
    }

    /// Dates in ascending order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &LevelCounts)> + '_ {
        self.days.iter().map(|(date, counts)| (*date, counts))
    }

    /// Counts of one level for every date, in date order
    pub fn series(&self, level: LogLevel) -> Vec<u64> {
        self.days.values().map(|counts| counts.get(level)).collect()
    }

    /// Largest per-day total (for stacked scales)
    pub fn max_total(&self) -> u64 {
        self.days.values().map(LevelCounts::total).max().unwrap_or(0)
    }

    /// Running totals per level in display order, for stacked charts
    ///
    /// The series of a level is the sum of that level and every level before
    /// it, so the last series equals the per-day total.
    pub fn stacked_series(&self) -> Vec<(LogLevel, Vec<u64>)> {
        let mut running = vec![0u64; self.days.len()];
        LogLevel::ALL
            .into_iter()
            .map(|level| {
                for (sum, counts) in running.iter_mut().zip(self.days.values()) {
                    *sum = sum.saturating_add(counts.get(level));
                }
                (level, running.clone())
            })
            .collect()
    }

    /// Largest single level count on any day
    pub fn max_count(&self) -> u64 {
        self.days
            .values()
            .flat_map(|counts| LogLevel::ALL.map(|level| counts.get(level)))
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Expand pre-aggregated rows into exactly one summary per level, in display order
///
/// Levels missing from `rows` get a zero count and no first timestamp.
pub fn summarize_by_level(rows: &[LevelCountRow]) -> [LevelSummary; 4] {
    let mut summaries = LogLevel::ALL.map(LevelSummary::empty);

    for row in rows {
        let summary = &mut summaries[row.level.index()];
        summary.count = row.count;
        summary.first_created = if row.count == 0 {
            None
        } else {
            row.first_created
        };
    }

    summaries
}

/// Whether any level has at least one record
pub fn has_data(summaries: &[LevelSummary]) -> bool {
    summaries.iter().any(|s| s.count > 0)
}

/// Build the chart matrix, filling calendar gaps with zero rows
///
/// Duplicate (date, level) rows overwrite earlier ones.
pub fn build_date_level_matrix(rows: &[DateLevelCount]) -> ChartMatrix {
    let (Some(min), Some(max)) = (
        rows.iter().map(|r| r.date).min(),
        rows.iter().map(|r| r.date).max(),
    ) else {
        return ChartMatrix::default();
    };

    let mut days: BTreeMap<NaiveDate, LevelCounts> = min
        .iter_days()
        .take_while(|day| *day <= max)
        .map(|day| (day, LevelCounts::default()))
        .collect();

    for row in rows {
        if let Some(counts) = days.get_mut(&row.date) {
            counts.set(row.level, row.count);
        }
    }

    ChartMatrix { days }
}

/// Last chart matrix handed to the chart, used to skip redundant redraws
#[derive(Debug, Default)]
pub struct ChartCache {
    current: Option<ChartMatrix>,
}

impl ChartCache {
    /// Store `matrix`; returns true when it differs from the cached one and a
    /// redraw is needed
    pub fn replace(&mut self, matrix: ChartMatrix) -> bool {
        if self.current.as_ref() == Some(&matrix) {
            return false;
        }
        self.current = Some(matrix);
        true
    }

    /// Drop the cached matrix; returns true when there was one to drop
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn matrix(&self) -> Option<&ChartMatrix> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summaries_always_have_four_levels() {
        let summaries = summarize_by_level(&[]);
        let levels: Vec<_> = summaries.iter().map(|s| s.level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert!(summaries.iter().all(|s| s.count == 0 && s.first_created.is_none()));
        assert!(!has_data(&summaries));
    }

    #[test]
    fn test_summaries_fill_present_levels() {
        let first = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let rows = vec![
            LevelCountRow {
                level: LogLevel::Error,
                count: 3,
                first_created: Some(first),
            },
            LevelCountRow {
                level: LogLevel::Info,
                count: 7,
                first_created: Some(first),
            },
        ];

        let summaries = summarize_by_level(&rows);
        assert_eq!(summaries[0].level, LogLevel::Info);
        assert_eq!(summaries[0].count, 7);
        assert_eq!(summaries[1].count, 0);
        assert_eq!(summaries[1].first_created, None);
        assert_eq!(summaries[3].count, 3);
        assert_eq!(summaries[3].first_created, Some(first));
        assert!(has_data(&summaries));
    }

    #[test]
    fn test_matrix_fills_gaps() {
        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Error, 2),
            DateLevelCount::new(date("2024-01-03"), LogLevel::Info, 1),
        ];

        let matrix = build_date_level_matrix(&rows);
        let dates: Vec<_> = matrix.dates().collect();
        assert_eq!(
            dates,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
        assert_eq!(matrix.get(date("2024-01-02")), Some(&LevelCounts::default()));
        assert_eq!(matrix.get(date("2024-01-01")).unwrap().error, 2);
        assert_eq!(matrix.get(date("2024-01-03")).unwrap().info, 1);
    }

    #[test]
    fn test_matrix_spans_min_to_max() {
        // Unordered input across a month boundary
        let rows = vec![
            DateLevelCount::new(date("2024-03-02"), LogLevel::Warn, 4),
            DateLevelCount::new(date("2024-02-27"), LogLevel::Debug, 1),
        ];

        let matrix = build_date_level_matrix(&rows);
        // 2024 is a leap year: Feb 27, 28, 29, Mar 1, 2
        assert_eq!(matrix.len(), 5);
        assert!(matrix.iter().all(|(_, counts)| counts.iter().count() == 4));
        assert_eq!(matrix.series(LogLevel::Warn), vec![0, 0, 0, 0, 4]);
    }

    #[test]
    fn test_matrix_empty_input() {
        assert!(build_date_level_matrix(&[]).is_empty());
    }

    #[test]
    fn test_matrix_duplicates_last_wins() {
        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 5),
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 9),
        ];
        let matrix = build_date_level_matrix(&rows);
        assert_eq!(matrix.get(date("2024-01-01")).unwrap().info, 9);
    }

    #[test]
    fn test_chart_cache_skips_identical_matrix() {
        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 5),
            DateLevelCount::new(date("2024-01-04"), LogLevel::Warn, 2),
        ];

        let mut cache = ChartCache::default();
        assert!(cache.replace(build_date_level_matrix(&rows)));
        assert!(!cache.replace(build_date_level_matrix(&rows)));

        let changed = vec![DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 6)];
        assert!(cache.replace(build_date_level_matrix(&changed)));
        assert_eq!(cache.matrix().unwrap().get(date("2024-01-01")).unwrap().info, 6);

        assert!(cache.clear());
        assert!(cache.matrix().is_none());
        assert!(!cache.clear());
        // Same matrix again after a clear counts as a change
        assert!(cache.replace(build_date_level_matrix(&changed)));
    }

    #[test]
    fn test_matrix_maxima() {
        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 5),
            DateLevelCount::new(date("2024-01-01"), LogLevel::Error, 3),
            DateLevelCount::new(date("2024-01-02"), LogLevel::Warn, 6),
        ];
        let matrix = build_date_level_matrix(&rows);
        assert_eq!(matrix.max_total(), 8);
        assert_eq!(matrix.max_count(), 6);
    }

    #[test]
    fn test_stacked_series_accumulate_levels() {
        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, 5),
            DateLevelCount::new(date("2024-01-01"), LogLevel::Error, 3),
            DateLevelCount::new(date("2024-01-02"), LogLevel::Warn, 6),
        ];
        let matrix = build_date_level_matrix(&rows);
        let stacked = matrix.stacked_series();

        let levels: Vec<_> = stacked.iter().map(|(level, _)| *level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert_eq!(stacked[0].1, vec![5, 0]);
        assert_eq!(stacked[1].1, vec![5, 0]);
        assert_eq!(stacked[2].1, vec![5, 6]);
        assert_eq!(stacked[3].1, vec![8, 6]);
        assert!(stacked[3].1.iter().all(|n| *n <= matrix.max_total()));
    }

    #[test]
    fn test_totals_saturate() {
        let counts = LevelCounts {
            info: u64::MAX,
            debug: 1,
            warn: 2,
            error: 3,
        };
        assert_eq!(counts.total(), u64::MAX);

        let rows = vec![
            DateLevelCount::new(date("2024-01-01"), LogLevel::Info, u64::MAX),
            DateLevelCount::new(date("2024-01-01"), LogLevel::Error, 7),
        ];
        let matrix = build_date_level_matrix(&rows);
        assert_eq!(matrix.max_total(), u64::MAX);
        assert_eq!(matrix.stacked_series()[3].1, vec![u64::MAX]);
    }
}
