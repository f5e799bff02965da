use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument};

use crate::fetcher::SnowSource;
use crate::models::{HourSlot, MetricKind, Reading, ResultRow, Station};

/// Both metric readings for one station at one hour
#[derive(Debug, Clone, Default)]
struct Cell {
    tot: Reading,
    day: Reading,
}

/// Builds the hourly snow table for a day by fanning out upstream fetches
pub struct SnowService<S> {
    source: Arc<S>,
    fetch_workers: usize,
    utc_offset: FixedOffset,
}

impl<S> Clone for SnowService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            fetch_workers: self.fetch_workers,
            utc_offset: self.utc_offset,
        }
    }
}

impl<S: SnowSource> SnowService<S> {
    pub fn new(source: S, fetch_workers: usize, utc_offset: FixedOffset) -> Self {
        Self {
            source: Arc::new(source),
            fetch_workers: fetch_workers.max(1),
            utc_offset,
        }
    }

    /// Wall clock time in the service's configured offset
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Readings for every hour of `date` so far, grouped by station.
    ///
    /// Returns `None` when no reading at all was obtained for the window.
    pub async fn aggregate(&self, date: NaiveDate, stations: &[Station]) -> Option<Vec<ResultRow>> {
        self.aggregate_at(date, stations, self.local_now()).await
    }

    #[instrument(skip(self, stations), fields(date = %date, stations = stations.len()))]
    pub async fn aggregate_at(
        &self,
        date: NaiveDate,
        stations: &[Station],
        now: NaiveDateTime,
    ) -> Option<Vec<ResultRow>> {
        let slots = hour_window(date, now);
        let codes: Vec<String> = stations.iter().map(|s| s.code.clone()).collect();

        let tasks: Vec<(HourSlot, MetricKind)> = slots
            .iter()
            .flat_map(|slot| MetricKind::ALL.into_iter().map(move |metric| (*slot, metric)))
            .collect();
        info!(
            "Dispatching {} snow fetches over {} hours with {} workers",
            tasks.len(),
            slots.len(),
            self.fetch_workers
        );

        let source = &self.source;
        let codes_ref = &codes;
        let results: Vec<(HourSlot, MetricKind, HashMap<String, Reading>)> = stream::iter(tasks)
            .map(move |(slot, metric)| async move {
                let readings = source.fetch(slot, metric, codes_ref).await;
                (slot, metric, readings)
            })
            .buffer_unordered(self.fetch_workers)
            .collect()
            .await;
        debug!("Collected {} fetch results", results.len());

        let table = merge(&slots, &codes, results);
        let rows = order_by_station(&table, stations);

        if rows.iter().all(ResultRow::is_empty) {
            info!("No snow data for {} in any requested hour", date);
            return None;
        }

        info!("Built {} snow rows for {}", rows.len(), date);
        Some(rows)
    }
}

/// Hours to query for `date`: up to the current hour when `date` is today
/// in `now`, otherwise the whole day.
pub fn hour_window(date: NaiveDate, now: NaiveDateTime) -> Vec<HourSlot> {
    let last_hour = if date == now.date() { now.hour() } else { 23 };
    (0..=last_hour)
        .filter_map(|hour| HourSlot::new(date, hour))
        .collect()
}

fn merge(
    slots: &[HourSlot],
    codes: &[String],
    results: Vec<(HourSlot, MetricKind, HashMap<String, Reading>)>,
) -> BTreeMap<HourSlot, HashMap<String, Cell>> {
    let mut table: BTreeMap<HourSlot, HashMap<String, Cell>> = slots
        .iter()
        .map(|slot| {
            let cells = codes.iter().map(|c| (c.clone(), Cell::default())).collect();
            (*slot, cells)
        })
        .collect();

    for (slot, metric, readings) in results {
        let Some(cells) = table.get_mut(&slot) else {
            continue;
        };
        for (code, reading) in readings {
            let Some(cell) = cells.get_mut(&code) else {
                continue;
            };
            match metric {
                MetricKind::TotalSnow => cell.tot = reading,
                MetricKind::NewSnow => cell.day = reading,
            }
        }
    }

    table
}

/// All hours of the first station, then all hours of the next, and so on
fn order_by_station(
    table: &BTreeMap<HourSlot, HashMap<String, Cell>>,
    stations: &[Station],
) -> Vec<ResultRow> {
    stations
        .iter()
        .flat_map(|station| {
            table.iter().map(move |(slot, cells)| {
                let cell = cells.get(&station.code).cloned().unwrap_or_default();
                ResultRow {
                    hour: slot.hour_label(),
                    name: station.name.clone(),
                    tot: cell.tot,
                    day: cell.day,
                }
            })
        })
        .collect()
}
