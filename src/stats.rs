use crate::models::{
    DailyPoint, HistoryDay, LogRecord, SleepEntry, StatsResponse, StepEntry, TrendAverages,
    WaterEntry,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

pub const TREND_DAYS: i64 = 7;

/// First day of the trend window ending at `today`.
pub fn trend_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(TREND_DAYS - 1)
}

/// Seven daily points ending at `today`, oldest first. Water is summed per day;
/// sleep and steps take the last row of the day. Rows are bucketed by their
/// calendar date in `tz`.
pub fn build_stats_at<Tz: TimeZone>(
    today: NaiveDate,
    tz: &Tz,
    water: &[WaterEntry],
    sleep: &[SleepEntry],
    steps: &[StepEntry],
) -> StatsResponse {
    let day_of = |at: DateTime<Utc>| at.with_timezone(tz).date_naive();

    let mut days: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();
    let mut logged: BTreeMap<NaiveDate, (bool, bool, bool)> = BTreeMap::new();
    for offset in (0..TREND_DAYS).rev() {
        let date = today - Duration::days(offset);
        days.insert(
            date,
            DailyPoint {
                date: date.to_string(),
                water_ml: 0,
                sleep_hours: 0.0,
                steps: 0,
            },
        );
        logged.insert(date, (false, false, false));
    }

    // rows arrive oldest first, so later rows overwrite earlier ones
    for row in water {
        let date = day_of(row.recorded_at);
        if let (Some(point), Some(flags)) = (days.get_mut(&date), logged.get_mut(&date)) {
            point.water_ml = point.water_ml.saturating_add(u64::from(row.amount_ml));
            flags.0 = true;
        }
    }
    for row in sleep {
        let date = day_of(row.recorded_at);
        if let (Some(point), Some(flags)) = (days.get_mut(&date), logged.get_mut(&date)) {
            point.sleep_hours = row.hours;
            flags.1 = true;
        }
    }
    for row in steps {
        let date = day_of(row.recorded_at);
        if let (Some(point), Some(flags)) = (days.get_mut(&date), logged.get_mut(&date)) {
            point.steps = row.steps;
            flags.2 = true;
        }
    }

    let last_7_days: Vec<DailyPoint> = days.into_values().collect();
    let averages = averages(&last_7_days, logged.values());

    StatsResponse {
        last_7_days,
        averages,
    }
}

fn averages<'a>(
    points: &[DailyPoint],
    logged: impl Iterator<Item = &'a (bool, bool, bool)>,
) -> TrendAverages {
    let mut water = (0.0, 0u32);
    let mut sleep = (0.0, 0u32);
    let mut steps = (0.0, 0u32);
    let mut days_logged = 0u8;

    for (point, &(has_water, has_sleep, has_steps)) in points.iter().zip(logged) {
        if has_water {
            water = (water.0 + point.water_ml as f64, water.1 + 1);
        }
        if has_sleep {
            sleep = (sleep.0 + point.sleep_hours, sleep.1 + 1);
        }
        if has_steps {
            steps = (steps.0 + f64::from(point.steps), steps.1 + 1);
        }
        if has_water || has_sleep || has_steps {
            days_logged += 1;
        }
    }

    let mean = |(sum, count): (f64, u32)| if count == 0 { 0.0 } else { sum / f64::from(count) };

    TrendAverages {
        days_logged,
        avg_water_ml: mean(water),
        avg_sleep_hours: mean(sleep),
        avg_steps: mean(steps),
    }
}

/// Groups newest-first records by calendar date in `tz`, newest day first.
pub fn group_by_day<Tz: TimeZone>(records: Vec<LogRecord>, tz: &Tz) -> Vec<HistoryDay> {
    let mut grouped: BTreeMap<NaiveDate, Vec<LogRecord>> = BTreeMap::new();
    for record in records {
        let date = record.recorded_at().with_timezone(tz).date_naive();
        grouped.entry(date).or_default().push(record);
    }

    grouped
        .into_iter()
        .rev()
        .map(|(date, entries)| HistoryDay {
            date: date.to_string(),
            entries,
        })
        .collect()
}
