//! Public holiday lookup.
//!
//! The evaluator consumes holidays through the narrow [`HolidaySource`] trait
//! and propagates its errors unchanged. Two implementations are provided:
//!
//! - [`StaticHolidays`] — fixed in-memory data per region.
//! - [`CachedHolidaySource`] — wraps a [`HolidayProvider`] (the system that
//!   actually knows the holidays, e.g. a remote API) with a per-region cache,
//!   coverage checks and a staggered periodic refresh.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::condition::RegionId;
use crate::dst::{local_midnight, next_day};
use crate::error::HolidayError;

/// Supplies the holidays of a region.
pub trait HolidaySource {
    /// Start-of-day instants of the holidays of `region` whose day intersects
    /// `[lower, upper)`, ascending.
    ///
    /// # Errors
    /// Implementations report unknown regions and windows outside their
    /// coverage; callers must not retry.
    fn holidays(
        &self,
        region: &RegionId,
        lower: &DateTime<Tz>,
        upper: &DateTime<Tz>,
    ) -> Result<Vec<DateTime<Tz>>, HolidayError>;
}

impl<T: HolidaySource + ?Sized> HolidaySource for &T {
    fn holidays(
        &self,
        region: &RegionId,
        lower: &DateTime<Tz>,
        upper: &DateTime<Tz>,
    ) -> Result<Vec<DateTime<Tz>>, HolidayError> {
        (**self).holidays(region, lower, upper)
    }
}

impl<T: HolidaySource + ?Sized> HolidaySource for Arc<T> {
    fn holidays(
        &self,
        region: &RegionId,
        lower: &DateTime<Tz>,
        upper: &DateTime<Tz>,
    ) -> Result<Vec<DateTime<Tz>>, HolidayError> {
        (**self).holidays(region, lower, upper)
    }
}

/// The holidays of one region over a contiguous range of covered days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionHolidays {
    /// Zone in which holiday days start and end.
    pub timezone: Tz,
    /// First covered day.
    pub valid_from: NaiveDate,
    /// First day after the covered range.
    pub valid_to: NaiveDate,
    /// Holiday dates within the covered range.
    pub days: BTreeSet<NaiveDate>,
}

impl RegionHolidays {
    pub fn new(
        timezone: Tz,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
        days: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            timezone,
            valid_from,
            valid_to,
            days: days.into_iter().collect(),
        }
    }

    /// Coverage of whole calendar years `from_year..=to_year`.
    pub fn for_years(
        timezone: Tz,
        from_year: i32,
        to_year: i32,
        days: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let first_of = |year: i32| NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        Self::new(timezone, first_of(from_year), first_of(to_year + 1), days)
    }

    /// Whether `[lower, upper)` lies within the covered days.
    pub fn covers(&self, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> bool {
        local_midnight(&self.timezone, self.valid_from) <= *lower
            && *upper <= local_midnight(&self.timezone, self.valid_to)
    }

    /// Midnights of the holidays from the day of `lower` through the day of
    /// `upper`, inclusive.
    pub fn days_in(&self, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> Vec<DateTime<Tz>> {
        let first = lower.with_timezone(&self.timezone).date_naive();
        let last = next_day(upper.with_timezone(&self.timezone).date_naive());
        if first >= last {
            return Vec::new();
        }
        self.days
            .range(first..last)
            .map(|day| local_midnight(&self.timezone, *day))
            .collect()
    }
}

/// Fixed holiday data, keyed by region.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays {
    regions: BTreeMap<RegionId, RegionHolidays>,
}

impl StaticHolidays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<RegionId>, holidays: RegionHolidays) -> Self {
        self.insert(region, holidays);
        self
    }

    pub fn insert(&mut self, region: impl Into<RegionId>, holidays: RegionHolidays) {
        self.regions.insert(region.into(), holidays);
    }
}

impl HolidaySource for StaticHolidays {
    fn holidays(
        &self,
        region: &RegionId,
        lower: &DateTime<Tz>,
        upper: &DateTime<Tz>,
    ) -> Result<Vec<DateTime<Tz>>, HolidayError> {
        let entry = self
            .regions
            .get(region)
            .ok_or_else(|| HolidayError::UnsupportedRegion(region.clone()))?;
        if !entry.covers(lower, upper) {
            return Err(out_of_coverage(region, lower, upper));
        }
        Ok(entry.days_in(lower, upper))
    }
}

/// Backing data for [`CachedHolidaySource`].
pub trait HolidayProvider {
    /// Every region this provider can fetch.
    fn regions(&self) -> Vec<RegionId>;

    /// Fetch the holidays of `region` for the years `from_year..=to_year`.
    ///
    /// # Errors
    /// `HolidayError::UnsupportedRegion` for unknown regions,
    /// `HolidayError::Provider` for transport or data failures.
    fn fetch(&self, region: &RegionId, from_year: i32, to_year: i32) -> Result<RegionHolidays, HolidayError>;
}

impl HolidayProvider for StaticHolidays {
    fn regions(&self) -> Vec<RegionId> {
        self.regions.keys().cloned().collect()
    }

    fn fetch(&self, region: &RegionId, _from_year: i32, _to_year: i32) -> Result<RegionHolidays, HolidayError> {
        self.regions
            .get(region)
            .cloned()
            .ok_or_else(|| HolidayError::UnsupportedRegion(region.clone()))
    }
}

/// Settings for [`CachedHolidaySource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HolidayCacheConfig {
    /// Full years before the current one that can be queried.
    pub past_years: i32,
    /// Full years after the current one that can be queried.
    pub future_years: i32,
    /// Length of one refresh cycle.
    pub refresh_interval_secs: u64,
}

impl Default for HolidayCacheConfig {
    fn default() -> Self {
        Self {
            past_years: 1,
            future_years: 2,
            refresh_interval_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl HolidayCacheConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    updated_at: DateTime<Utc>,
    holidays: RegionHolidays,
}

/// A [`HolidaySource`] caching a [`HolidayProvider`] per region.
///
/// Regions are fetched on first use and refetched when a query exceeds the
/// cached coverage or the entry's refresh cycle has elapsed. Refresh cycles
/// are staggered across regions so they do not all refetch at once. A failed
/// refresh is logged and the previous entry keeps serving.
pub struct CachedHolidaySource<P> {
    provider: P,
    config: HolidayCacheConfig,
    clock: fn() -> DateTime<Utc>,
    cache: RwLock<BTreeMap<RegionId, CacheEntry>>,
}

impl<P: HolidayProvider> CachedHolidaySource<P> {
    pub fn new(provider: P, config: HolidayCacheConfig) -> Self {
        Self {
            provider,
            config,
            clock: Utc::now,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Replace the system clock, e.g. to pin "now" in tests.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &HolidayCacheConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch every region the provider knows.
    ///
    /// # Errors
    /// Fails on the first region the provider cannot deliver.
    pub fn prepopulate(&self) -> Result<(), HolidayError> {
        let (from_year, to_year) = self.year_range(&(self.clock)());
        for region in self.provider.regions() {
            self.populate(&region, from_year, to_year)?;
        }
        Ok(())
    }

    /// Serialize the cache to JSON.
    ///
    /// # Errors
    /// Returns `HolidayError::Snapshot` if serialization fails.
    pub fn snapshot(&self) -> Result<String, HolidayError> {
        Ok(serde_json::to_string(&*self.read_cache())?)
    }

    /// Replace the cache with a snapshot produced by [`CachedHolidaySource::snapshot`].
    ///
    /// # Errors
    /// Returns `HolidayError::Snapshot` if `json` is not a valid snapshot.
    pub fn restore(&self, json: &str) -> Result<(), HolidayError> {
        let entries: BTreeMap<RegionId, CacheEntry> = serde_json::from_str(json)?;
        tracing::debug!(regions = entries.len(), "restored holiday cache");
        *self.write_cache() = entries;
        Ok(())
    }

    /// Regions currently held in the cache.
    pub fn cached_regions(&self) -> Vec<RegionId> {
        self.read_cache().keys().cloned().collect()
    }

    fn year_range(&self, now: &DateTime<Utc>) -> (i32, i32) {
        (
            now.year() - self.config.past_years,
            now.year() + self.config.future_years,
        )
    }

    fn populate(&self, region: &RegionId, from_year: i32, to_year: i32) -> Result<(), HolidayError> {
        let holidays = self.provider.fetch(region, from_year, to_year)?;
        tracing::debug!(
            %region,
            from = %holidays.valid_from,
            to = %holidays.valid_to,
            days = holidays.days.len(),
            "populated holiday cache"
        );
        self.write_cache().insert(
            region.clone(),
            CacheEntry {
                updated_at: (self.clock)(),
                holidays,
            },
        );
        Ok(())
    }

    /// End of the refresh cycle that contains `updated_at`, shifted by the
    /// region's position among all regions.
    fn next_refresh(&self, region: &RegionId, updated_at: &DateTime<Utc>) -> DateTime<Utc> {
        let interval = i64::try_from(self.config.refresh_interval_secs.max(1)).unwrap_or(i64::MAX);
        let updated = updated_at.timestamp();
        let cycle_start = updated - updated.rem_euclid(interval);

        let mut regions = self.provider.regions();
        regions.sort();
        let stagger = match (regions.binary_search(region), i64::try_from(regions.len())) {
            (Ok(index), Ok(count)) if count > 0 => {
                let index = i64::try_from(index).unwrap_or(0);
                (index.saturating_mul(interval) / count) % interval
            }
            _ => 0,
        };

        let next = cycle_start.saturating_add(interval).saturating_add(stagger);
        DateTime::from_timestamp(next, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, BTreeMap<RegionId, CacheEntry>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, BTreeMap<RegionId, CacheEntry>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: HolidayProvider> HolidaySource for CachedHolidaySource<P> {
    fn holidays(
        &self,
        region: &RegionId,
        lower: &DateTime<Tz>,
        upper: &DateTime<Tz>,
    ) -> Result<Vec<DateTime<Tz>>, HolidayError> {
        let now = (self.clock)();
        let (from_year, to_year) = self.year_range(&now);
        if lower.year() < from_year || last_year_before(upper) > to_year {
            return Err(out_of_coverage(region, lower, upper));
        }

        let state = self
            .read_cache()
            .get(region)
            .map(|entry| (entry.holidays.covers(lower, upper), entry.updated_at));

        match state {
            None | Some((false, _)) => self.populate(region, from_year, to_year)?,
            Some((true, updated_at)) if now >= self.next_refresh(region, &updated_at) => {
                if let Err(err) = self.populate(region, from_year, to_year) {
                    tracing::warn!(%region, error = %err, "holiday refresh failed; serving cached entry");
                }
            }
            Some(_) => {}
        }

        let cache = self.read_cache();
        let entry = cache
            .get(region)
            .ok_or_else(|| HolidayError::UnsupportedRegion(region.clone()))?;
        if !entry.holidays.covers(lower, upper) {
            return Err(out_of_coverage(region, lower, upper));
        }
        Ok(entry.holidays.days_in(lower, upper))
    }
}

/// Year of the last instant before `upper`; a window ending at New Year's
/// midnight needs nothing from the new year.
fn last_year_before(upper: &DateTime<Tz>) -> i32 {
    if upper.ordinal0() == 0 && upper.time() == NaiveTime::MIN {
        upper.year() - 1
    } else {
        upper.year()
    }
}

fn out_of_coverage(region: &RegionId, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> HolidayError {
    HolidayError::OutOfCoverage {
        region: region.clone(),
        lower: lower.to_rfc3339(),
        upper: upper.to_rfc3339(),
    }
}
