//! Thin asynchronous client for the booking back end.
//!
//! - Typed accessors for every external collaborator the wizard consumes.
//! - Maintains a simple in-memory rate-table cache with stale fallbacks,
//!   backed by the on-disk cache in [`super::cache`].

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    BookingConfirmation, ConsignmentAvailability, DestinationRecord, DoxRate, DoxSlab, PerKgRate,
    PostalArea, RateTable, ReverseRate, ServiceTier, TransportMode, UploadedFile, Zone,
};
use crate::infra::cache::{load_rate_table_cache, save_rate_table_cache, RateTableCache};
use crate::workflow::BookingPayload;

const DEFAULT_BASE_URL: &str = "https://api.shipbook.example/v1/";
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
const USER_AGENT: &str = "shipbook/1.0.0";

#[derive(Debug, Error)]
pub enum BookingApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("contract violation: {0}")]
    Contract(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self { data, fetched_at, status }
    }
}

#[derive(Default)]
struct ApiCache {
    rate_table: Option<Cached<RateTable>>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct BookingApiClient {
    http: Client,
    base_url: Url,
    /// Injected session token; never read from ambient state.
    token: Option<String>,
    cache: Arc<Mutex<ApiCache>>,
    ttl: Duration,
    use_disk_cache: bool,
}

impl BookingApiClient {
    pub fn new() -> Result<Self, BookingApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, BookingApiError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            token: None,
            cache: Arc::new(Mutex::new(ApiCache::default())),
            ttl: DEFAULT_TTL,
            use_disk_cache: true,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn without_disk_cache(mut self) -> Self {
        self.use_disk_cache = false;
        self
    }

    /// Resolve a destination postal code to city/state/district plus area
    /// choices.
    pub async fn resolve_postal_code(&self, code: &str) -> Result<PostalArea, BookingApiError> {
        let url = self.url(&format!("pincode/{code}"))?;
        let dto: PostalAreaDto = self.fetch_data(self.http.get(url)).await?;
        Ok(PostalArea::from(dto))
    }

    /// Receivers the caller has shipped to before, keyed by phone number.
    pub async fn lookup_previous_destinations(
        &self,
        phone: &str,
    ) -> Result<Vec<DestinationRecord>, BookingApiError> {
        let mut url = self.url("destinations")?;
        url.query_pairs_mut().append_pair("phone", phone);
        let records: Vec<DestinationRecordDto> = self.fetch_data(self.http.get(url)).await?;
        Ok(records.into_iter().map(DestinationRecord::from).collect())
    }

    /// Load the rate table: memory cache, then disk, then the network, with
    /// a stale in-memory fallback when the fetch fails.
    pub async fn get_rate_table(&self) -> Result<CachedPayload<RateTable>, BookingApiError> {
        if let Some(payload) = self.cached_rate_table().await {
            return Ok(payload);
        }

        if self.use_disk_cache {
            if let Some(disk) = load_rate_table_cache() {
                return Ok(self.store_rate_table(disk.table, CacheStatus::Cached).await);
            }
        }

        let url = self.url("rates")?;
        match self.fetch_data::<RateTableDto>(self.http.get(url)).await {
            Ok(dto) => {
                let (table, tariff_version) = build_rate_table(dto);
                tracing::debug!(
                    version = %tariff_version,
                    dox_rows = table.dox.len(),
                    per_kg_rows = table.per_kg.len(),
                    reverse_rows = table.reverse.len(),
                    "fetched rate table"
                );
                if self.use_disk_cache {
                    let cache = RateTableCache::new(tariff_version, table.clone());
                    if let Err(e) = save_rate_table_cache(&cache) {
                        tracing::warn!("failed to save rate-table cache: {e}");
                    }
                }
                Ok(self.store_rate_table(table, CacheStatus::Fresh).await)
            }
            Err(error) => {
                if let Some(stale) = self.stale_rate_table().await {
                    tracing::warn!("rate-table fetch failed, serving stale copy: {error}");
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    pub async fn get_consignment_availability(
        &self,
    ) -> Result<ConsignmentAvailability, BookingApiError> {
        let url = self.url("consignments/availability")?;
        let dto: AvailabilityDto = self.fetch_data(self.http.get(url)).await?;
        Ok(ConsignmentAvailability::from(dto))
    }

    /// Push a local file to the upload collaborator; returns its URL.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, BookingApiError> {
        let mut url = self.url("uploads")?;
        url.query_pairs_mut().append_pair("filename", file_name);
        let dto: UploadDto = self.fetch_data(self.http.post(url).body(bytes)).await?;
        Ok(UploadedFile { url: dto.url })
    }

    /// Submit a finalized booking. A nominally successful response without a
    /// consignment number is a contract violation.
    pub async fn submit_booking(
        &self,
        payload: &BookingPayload,
    ) -> Result<BookingConfirmation, BookingApiError> {
        let url = self.url("bookings")?;
        let response = self
            .authorize(self.http.post(url).json(payload))
            .send()
            .await?
            .error_for_status()?;
        let dto: BookingResponseDto = response.json().await?;

        if !dto.success {
            return Err(BookingApiError::Api(
                dto.message.unwrap_or_else(|| "booking rejected".to_string()),
            ));
        }
        let consignment_number = dto.consignment_number.ok_or_else(|| {
            BookingApiError::Contract("successful response missing consignmentNumber".to_string())
        })?;

        Ok(BookingConfirmation {
            booking_reference: dto.booking_reference.unwrap_or_default(),
            consignment_number,
        })
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.rate_table = None;
    }

    async fn cached_rate_table(&self) -> Option<CachedPayload<RateTable>> {
        let cache = self.cache.lock().await;
        cache.rate_table.as_ref().and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn stale_rate_table(&self) -> Option<CachedPayload<RateTable>> {
        let cache = self.cache.lock().await;
        cache.rate_table.as_ref().map(Cached::stale)
    }

    async fn store_rate_table(
        &self,
        table: RateTable,
        status: CacheStatus,
    ) -> CachedPayload<RateTable> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(table.clone(), fetched_at, status);
        let mut cache = self.cache.lock().await;
        cache.rate_table = Some(Cached::new(table, fetched_at));
        payload
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_data<T>(&self, builder: reqwest::RequestBuilder) -> Result<T, BookingApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.authorize(builder).send().await?.error_for_status()?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        let ApiEnvelope { status, data, message } = envelope;

        if status.eq_ignore_ascii_case("ok") {
            data.ok_or_else(|| BookingApiError::Api("response missing data".into()))
        } else {
            Err(BookingApiError::Api(message.unwrap_or(status)))
        }
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload::new(self.value.clone(), self.fetched_at, CacheStatus::Stale)
    }
}

#[derive(Debug, Deserialize)]
struct PostalAreaDto {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    areas: Vec<String>,
}

impl From<PostalAreaDto> for PostalArea {
    fn from(dto: PostalAreaDto) -> Self {
        Self {
            city: dto.city.unwrap_or_default(),
            state: dto.state.unwrap_or_default(),
            district: dto.district.unwrap_or_default(),
            areas: dto.areas,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationRecordDto {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    mobile: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    building: Option<String>,
}

impl From<DestinationRecordDto> for DestinationRecord {
    fn from(dto: DestinationRecordDto) -> Self {
        Self {
            name: dto.name.unwrap_or_default(),
            company: dto.company.unwrap_or_default(),
            email: dto.email.unwrap_or_default(),
            mobile: dto.mobile.unwrap_or_default(),
            postal_code: dto.postal_code.unwrap_or_default(),
            area: dto.area.unwrap_or_default(),
            street: dto.street.unwrap_or_default(),
            building: dto.building.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityDto {
    #[serde(default)]
    has_assignment: bool,
    #[serde(default)]
    available_count: u32,
    #[serde(default)]
    message: Option<String>,
}

impl From<AvailabilityDto> for ConsignmentAvailability {
    fn from(dto: AvailabilityDto) -> Self {
        Self {
            has_assignment: dto.has_assignment,
            available_count: dto.available_count,
            message: dto.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadDto {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingResponseDto {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    booking_reference: Option<String>,
    #[serde(default)]
    consignment_number: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// Rate table wire format: nested maps keyed by zone/tier/mode, flattened
// into the typed rows the rating engine scans.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateTableDto {
    #[serde(default)]
    tariff_version: Option<String>,
    #[serde(default)]
    dox: HashMap<String, DoxZoneDto>,
    #[serde(default)]
    non_dox: HashMap<String, NonDoxZoneDto>,
    #[serde(default)]
    reverse: HashMap<String, ReverseZoneDto>,
}

#[derive(Debug, Deserialize)]
struct DoxZoneDto {
    #[serde(default)]
    priority: Option<DoxSlabsDto>,
    #[serde(default)]
    standard: Option<DoxSlabsDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoxSlabsDto {
    #[serde(default)]
    upto250g: Option<f64>,
    #[serde(default)]
    upto500g: Option<f64>,
    #[serde(default)]
    base500g: Option<f64>,
    #[serde(default)]
    add500g: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NonDoxZoneDto {
    #[serde(default)]
    air: Option<f64>,
    #[serde(default)]
    surface: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReverseZoneDto {
    #[serde(default)]
    air: Option<ReverseTierDto>,
    #[serde(default)]
    surface: Option<ReverseTierDto>,
    #[serde(default)]
    road: Option<ReverseTierDto>,
}

#[derive(Debug, Deserialize)]
struct ReverseTierDto {
    #[serde(default)]
    normal: Option<f64>,
    #[serde(default)]
    priority: Option<f64>,
}

fn parse_zone(key: &str) -> Option<Zone> {
    match key {
        "assam" => Some(Zone::Assam),
        "northEast" | "north_east" => Some(Zone::NorthEast),
        "restOfIndia" | "rest_of_india" => Some(Zone::RestOfIndia),
        other => {
            tracing::warn!(zone = other, "unknown zone key in rate table, skipping");
            None
        }
    }
}

fn build_rate_table(dto: RateTableDto) -> (RateTable, String) {
    let mut table = RateTable::default();

    for (key, zone_dto) in dto.dox {
        let Some(zone) = parse_zone(&key) else { continue };
        for (tier, slabs) in [
            (ServiceTier::Priority, zone_dto.priority),
            (ServiceTier::Standard, zone_dto.standard),
        ] {
            let Some(slabs) = slabs else { continue };
            for (slab, amount) in [
                (DoxSlab::UpTo250g, slabs.upto250g),
                (DoxSlab::UpTo500g, slabs.upto500g),
                (DoxSlab::Base500g, slabs.base500g),
                (DoxSlab::Add500g, slabs.add500g),
            ] {
                if let Some(amount) = amount {
                    table.dox.push(DoxRate { zone, tier, slab, amount });
                }
            }
        }
    }

    for (key, zone_dto) in dto.non_dox {
        let Some(zone) = parse_zone(&key) else { continue };
        for (mode, amount) in [
            (TransportMode::Air, zone_dto.air),
            (TransportMode::Surface, zone_dto.surface),
        ] {
            if let Some(amount) = amount {
                table.per_kg.push(PerKgRate { zone, mode, amount });
            }
        }
    }

    for (key, zone_dto) in dto.reverse {
        let Some(zone) = parse_zone(&key) else { continue };
        for (mode, tiers) in [
            (TransportMode::Air, zone_dto.air),
            (TransportMode::Surface, zone_dto.surface),
            (TransportMode::Road, zone_dto.road),
        ] {
            let Some(tiers) = tiers else { continue };
            for (tier, amount) in [
                (ServiceTier::Standard, tiers.normal),
                (ServiceTier::Priority, tiers.priority),
            ] {
                if let Some(amount) = amount {
                    table.reverse.push(ReverseRate { zone, mode, tier, amount });
                }
            }
        }
    }

    (table, dto.tariff_version.unwrap_or_else(|| "unknown".to_string()))
}
