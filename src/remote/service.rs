//! Remote climate cache: series fetched on demand and kept for as long as the
//! service lives.

use crate::binding::FieldBinder;
use crate::climate::{Climate, NAME_COLUMN};
use crate::error::ClimateError;
use crate::remote::catalog::Catalog;
use crate::remote::transport::ClimateTransport;
use crate::types::into_timestamp::IntoTimestamp;
use crate::types::location::Location;
use crate::types::rain_pattern::RainPattern;
use crate::types::time_step::TimeStep;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

type Slot = Arc<AsyncMutex<Option<Arc<Climate>>>>;

/// Climate series from a remote service, fetched lazily and cached per name.
///
/// A series is only (re)fetched when the requested window is not inside what is
/// already cached, and then only the requested window is fetched. Concurrent
/// requests for the same name wait for a single fetch.
///
/// # Examples
///
/// ```no_run
/// use chrono::NaiveDate;
/// use climatestore::{ClimateError, ClimateService, HttpTransport, TransportConfig};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), ClimateError> {
/// let transport = HttpTransport::new(TransportConfig {
///     base_url: "https://climate.example.org/api".to_string(),
///     ..Default::default()
/// })?;
/// let service = ClimateService::builder()
///     .transport(Arc::new(transport))
///     .tag("alpine")
///     .build();
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// let davos = service.get("Davos", start, end).await?;
/// println!("{} has {} days", davos.name(), davos.len());
/// # Ok(())
/// # }
/// ```
pub struct ClimateService {
    transport: Arc<dyn ClimateTransport>,
    binder: FieldBinder,
    cache_folder: Option<PathBuf>,
    rain_pattern: Option<Arc<dyn RainPattern>>,
    tag: Option<String>,
    time_step: TimeStep,
    catalog: RwLock<Option<Catalog>>,
    entries: std::sync::Mutex<HashMap<String, Slot>>,
}

#[bon]
impl ClimateService {
    /// Creates a service on top of `transport`.
    ///
    /// * `binder` - binds fetched rows (default: invariant culture, no resolvers).
    /// * `cache_folder` - if set, the name → id catalog is persisted there.
    /// * `rain_pattern` - attached to every series the service creates.
    /// * `tag` - narrows the catalog to climates carrying this tag.
    /// * `time_step` - step of the cached series (default: [`TimeStep::Day`]).
    #[builder]
    pub fn new(
        transport: Arc<dyn ClimateTransport>,
        binder: Option<FieldBinder>,
        cache_folder: Option<PathBuf>,
        rain_pattern: Option<Arc<dyn RainPattern>>,
        #[builder(into)] tag: Option<String>,
        time_step: Option<TimeStep>,
    ) -> Self {
        Self {
            transport,
            binder: binder.unwrap_or_default(),
            cache_folder,
            rain_pattern,
            tag,
            time_step: time_step.unwrap_or_default(),
            catalog: RwLock::new(None),
            entries: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The platform cache directory to pass as `cache_folder`, e.g.
    /// `~/.cache/climatestore_cache` on Linux.
    pub fn default_cache_folder() -> Result<PathBuf, ClimateError> {
        get_cache_dir().map_err(ClimateError::CacheDirResolution)
    }

    /// Returns the series `name` covering at least `[start, end]`.
    ///
    /// # Errors
    ///
    /// [`ClimateError::UnknownClimate`] if the service does not offer `name`, or a
    /// transport/catalog error. Malformed fetched rows do not fail the call; see
    /// [`Climate::last_error`].
    pub async fn get(
        &self,
        name: &str,
        start: impl IntoTimestamp,
        end: impl IntoTimestamp,
    ) -> Result<Arc<Climate>, ClimateError> {
        let (start, end) = (start.into_timestamp(), end.into_timestamp());
        let id = self.climate_id(name).await?;

        let slot = self.slot(name);
        let mut entry = slot.lock().await;
        if let Some(climate) = entry.as_ref() {
            if climate.covers(start, end) {
                info!("Cache hit for climate '{}' from {} to {}", name, start, end);
                return Ok(Arc::clone(climate));
            }
        }

        info!(
            "Cache miss for climate '{}' from {} to {}. Fetching.",
            name, start, end
        );
        let mut records = self
            .transport
            .fetch_records(&id, start, end, self.time_step)
            .await?;
        for record in &mut records {
            record
                .entry(NAME_COLUMN.to_string())
                .or_insert_with(|| name.to_string());
        }

        let mut climate = match entry.as_deref() {
            Some(cached) => cached.clone(),
            None => self.new_climate(name, &id),
        };
        climate.load(records, &self.binder);

        let climate = Arc::new(climate);
        *entry = Some(Arc::clone(&climate));
        Ok(climate)
    }

    /// The cached series for `name`, without fetching.
    pub async fn cached(&self, name: &str) -> Option<Arc<Climate>> {
        let slot = self.slot(name);
        let entry = slot.lock().await;
        entry.clone()
    }

    /// Replaces the name → id catalog with a fresh listing from the service.
    ///
    /// Returns the number of climates listed.
    pub async fn refresh_catalog(&self) -> Result<usize, ClimateError> {
        let mut catalog = self.catalog.write().await;
        self.refresh_locked(&mut catalog).await
    }

    /// Fills in the location of series `name` from the service: base data if the
    /// series has no coordinates, then the altitude if it is missing.
    ///
    /// Returns the resulting location, which is also stored on the cached series.
    pub async fn complete_location(&self, name: &str) -> Result<Option<Location>, ClimateError> {
        let id = self.climate_id(name).await?;

        let slot = self.slot(name);
        let mut entry = slot.lock().await;
        let mut climate = match entry.as_deref() {
            Some(cached) => cached.clone(),
            None => self.new_climate(name, &id),
        };

        let mut location = climate.location().copied();
        let has_coordinates = location.as_ref().is_some_and(Location::has_coordinates);
        if !has_coordinates {
            location = self.transport.fetch_base_data(&id).await?.location.or(location);
        }
        if let Some(location) = location.as_mut() {
            if location.altitude.is_none() && location.has_coordinates() {
                location.altitude = self.transport.fetch_altitude(location).await?;
            }
        }

        if let Some(location) = location {
            climate.set_location(location);
            *entry = Some(Arc::new(climate));
        }
        Ok(location)
    }

    fn new_climate(&self, name: &str, id: &str) -> Climate {
        let mut climate = Climate::new(name, Some(id.to_string()), self.time_step);
        if let Some(rain_pattern) = &self.rain_pattern {
            climate.set_rain_pattern(Arc::clone(rain_pattern));
        }
        climate
    }

    fn slot(&self, name: &str) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(name.to_string()).or_default())
    }

    /// Resolves `name` to its service id. An unknown name first falls back to the
    /// persisted catalog (once), then to a fresh listing.
    async fn climate_id(&self, name: &str) -> Result<String, ClimateError> {
        if let Some(id) = self.catalog.read().await.as_ref().and_then(|c| c.id(name)) {
            return Ok(id.to_string());
        }

        let mut catalog = self.catalog.write().await;
        if catalog.is_none() {
            *catalog = self.load_persisted_catalog().await;
        }
        if let Some(id) = catalog.as_ref().and_then(|c| c.id(name)) {
            return Ok(id.to_string());
        }

        self.refresh_locked(&mut catalog).await?;
        catalog
            .as_ref()
            .and_then(|c| c.id(name))
            .map(str::to_string)
            .ok_or_else(|| ClimateError::UnknownClimate(name.to_string()))
    }

    async fn load_persisted_catalog(&self) -> Option<Catalog> {
        let cache_folder = self.cache_folder.as_ref()?;
        match Catalog::load(cache_folder).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Ignoring unreadable climate catalog cache: {}", e);
                None
            }
        }
    }

    async fn refresh_locked(&self, catalog: &mut Option<Catalog>) -> Result<usize, ClimateError> {
        let listings = self.transport.list_climates(self.tag.as_deref()).await?;
        let refreshed = Catalog::from_listings(listings);
        info!("Climate catalog refreshed with {} climates", refreshed.len());

        if let Some(cache_folder) = &self.cache_folder {
            if !refreshed.is_empty() {
                ensure_cache_dir_exists(cache_folder)
                    .await
                    .map_err(|e| ClimateError::CacheDirCreation(cache_folder.clone(), e))?;
                refreshed.save(cache_folder).await?;
            }
        }

        let count = refreshed.len();
        *catalog = Some(refreshed);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::error::TransportError;
    use crate::remote::transport::{BaseData, ClimateListing};
    use crate::source::RawRecord;
    use async_trait::async_trait;
    use chrono::{Datelike, NaiveDate, NaiveDateTime};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves daily rows for every requested window and counts calls.
    #[derive(Default)]
    struct MockTransport {
        listings: AtomicUsize,
        fetches: AtomicUsize,
        base_data: AtomicUsize,
        altitudes: AtomicUsize,
        delay: Option<Duration>,
        fail_fetches: bool,
    }

    #[async_trait]
    impl ClimateTransport for MockTransport {
        async fn list_climates(
            &self,
            tag: Option<&str>,
        ) -> Result<Vec<ClimateListing>, TransportError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            let mut listings = vec![ClimateListing {
                name: "Davos".to_string(),
                id: "DAV".to_string(),
            }];
            if tag != Some("alpine") {
                listings.push(ClimateListing {
                    name: "Basel".to_string(),
                    id: "BAS".to_string(),
                });
            }
            Ok(listings)
        }

        async fn fetch_records(
            &self,
            _id: &str,
            start: NaiveDateTime,
            end: NaiveDateTime,
            _time_step: TimeStep,
        ) -> Result<Vec<RawRecord>, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_fetches {
                return Err(TransportError::DownloadIo(std::io::Error::other("offline")));
            }
            Ok(start
                .date()
                .iter_days()
                .take_while(|day| *day <= end.date())
                .map(|day| {
                    RawRecord::from([
                        ("Date".to_string(), day.to_string()),
                        ("Precipitation".to_string(), format!("{}", day.day())),
                    ])
                })
                .collect())
        }

        async fn fetch_base_data(&self, _id: &str) -> Result<BaseData, TransportError> {
            self.base_data.fetch_add(1, Ordering::SeqCst);
            Ok(BaseData {
                location: Some(Location::new(9.83, 46.8)),
            })
        }

        async fn fetch_altitude(&self, _location: &Location) -> Result<Option<f64>, TransportError> {
            self.altitudes.fetch_add(1, Ordering::SeqCst);
            Ok(Some(1560.0))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(transport: Arc<MockTransport>) -> ClimateService {
        ClimateService::builder().transport(transport).build()
    }

    #[tokio::test]
    async fn test_first_request_fetches_once() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport::default());
        let service = service(Arc::clone(&transport));

        let davos = service.get("Davos", date(2023, 1, 1), date(2023, 1, 31)).await?;
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(davos.id(), Some("DAV"));
        assert_eq!(davos.len(), 31);
        assert_eq!(
            davos.get_values(date(2023, 1, 12)).unwrap().precipitation,
            Some(12.0)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_covered_window_is_served_from_cache() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport::default());
        let service = service(Arc::clone(&transport));

        service.get("Davos", date(2023, 1, 1), date(2023, 12, 31)).await?;
        let march = service.get("Davos", date(2023, 3, 1), date(2023, 3, 31)).await?;

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(transport.listings.load(Ordering::SeqCst), 1);
        assert_eq!(march.len(), 365);
        Ok(())
    }

    #[tokio::test]
    async fn test_uncovered_window_fetches_and_keeps_older_buckets() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport::default());
        let service = service(Arc::clone(&transport));

        let january = service.get("Davos", date(2023, 1, 1), date(2023, 1, 31)).await?;
        let june = service.get("Davos", date(2023, 6, 1), date(2023, 6, 30)).await?;

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(june.len(), 61);
        assert!(june.get_values(date(2023, 1, 15)).is_some());
        // Earlier handles keep their snapshot.
        assert_eq!(january.len(), 31);
        // The covered range spans both windows.
        assert!(june.covers(date(2023, 2, 1), date(2023, 5, 1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let service = Arc::new(service(Arc::clone(&transport)));

        let requests: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service.get("Davos", date(2023, 1, 1), date(2023, 1, 31)).await
                })
            })
            .collect();
        for request in requests {
            assert_eq!(request.await.map_err(TransportError::from)??.len(), 31);
        }

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_name_refreshes_catalog_then_fails() {
        let transport = Arc::new(MockTransport::default());
        let service = ClimateService::builder()
            .transport(Arc::clone(&transport) as Arc<dyn ClimateTransport>)
            .tag("alpine")
            .build();

        let result = service.get("Basel", date(2023, 1, 1), date(2023, 1, 2)).await;
        assert!(matches!(result, Err(ClimateError::UnknownClimate(name)) if name == "Basel"));
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_cached() {
        let transport = Arc::new(MockTransport {
            fail_fetches: true,
            ..Default::default()
        });
        let service = service(Arc::clone(&transport));

        let result = service.get("Davos", date(2023, 1, 1), date(2023, 1, 2)).await;
        assert!(matches!(
            result,
            Err(ClimateError::Transport(TransportError::DownloadIo(_)))
        ));
        assert!(service.cached("Davos").await.is_none());
    }

    #[tokio::test]
    async fn test_rain_pattern_is_attached_to_fetched_series() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport::default());
        let service = ClimateService::builder()
            .transport(transport as Arc<dyn ClimateTransport>)
            .time_step(TimeStep::Month)
            .rain_pattern(Arc::new(|_: NaiveDate, daily: f64| Some(daily * 2.0)) as Arc<dyn RainPattern>)
            .build();

        // Monthly buckets: the 1st and 2nd of January land in the same month and the
        // later row wins.
        let davos = service.get("Davos", date(2024, 1, 1), date(2024, 1, 2)).await?;
        let values = davos.get_values(date(2024, 1, 20)).unwrap();
        assert_eq!(values.precipitation, Some(2.0));
        assert_eq!(values.corrected_precipitation, Some(2.0 / 31.0 * 2.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_location_fetches_base_data_and_altitude() -> Result<(), ClimateError> {
        let transport = Arc::new(MockTransport::default());
        let service = service(Arc::clone(&transport));

        let location = service.complete_location("Davos").await?.unwrap();
        assert!(location.is_complete());
        assert_eq!(location.altitude, Some(1560.0));

        // Already complete: no further requests.
        service.complete_location("Davos").await?;
        assert_eq!(transport.base_data.load(Ordering::SeqCst), 1);
        assert_eq!(transport.altitudes.load(Ordering::SeqCst), 1);

        let cached = service.cached("Davos").await.unwrap();
        assert_eq!(cached.location(), Some(&location));
        Ok(())
    }

    #[tokio::test]
    async fn test_catalog_is_persisted_and_reused() -> Result<(), ClimateError> {
        let dir = tempfile::tempdir().map_err(ClimateError::CacheDirResolution)?;
        let cache_folder = dir.path().join("catalog");

        let first = Arc::new(MockTransport::default());
        let service = ClimateService::builder()
            .transport(Arc::clone(&first) as Arc<dyn ClimateTransport>)
            .cache_folder(cache_folder.clone())
            .build();
        assert_eq!(service.refresh_catalog().await?, 2);

        let second = Arc::new(MockTransport::default());
        let service = ClimateService::builder()
            .transport(Arc::clone(&second) as Arc<dyn ClimateTransport>)
            .cache_folder(cache_folder)
            .build();
        service.get("Basel", date(2023, 1, 1), date(2023, 1, 1)).await?;
        assert_eq!(second.listings.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
