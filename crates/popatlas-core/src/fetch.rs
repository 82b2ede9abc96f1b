// crates/popatlas-core/src/fetch.rs

//! # Fetch Orchestrator
//!
//! Issues the per-channel requests for a selection without waiting on each
//! other (`tokio::join!`), wraps each one in its own deadline and normalizes
//! the raw buffers before handing them to the [`Session`].
//!
//! The futures here only borrow the [`DataSource`]; the session is mutated
//! once they resolve, at the `apply_*` points. Nothing needs `Send`: the whole
//! pipeline runs on one thread of control (e.g. a current-thread runtime).

use crate::config::AtlasConfig;
use crate::demographics::reshape;
use crate::error::{AtlasError, Result};
use crate::model::{Channel, DemographicPyramid, GeoFeature, LoadState, PopulationRecord, Scope};
use crate::normalize::{demographic_rows, normalize_geography, normalize_statistics};
use crate::session::{Applied, DemographicsTicket, Session, Ticket};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Where raw datasets come from. Implementations return the decoded JSON
/// body; shape checks happen in the normalizers.
pub trait DataSource {
    /// Statistics for `year` in `scope` (`{ "items": [...] }`).
    fn statistics(&self, year: i32, scope: Scope) -> impl Future<Output = Result<Value>>;

    /// Demographic breakdown for refugees from `origin_code` in `year`.
    fn demographics(&self, year: i32, origin_code: &str) -> impl Future<Output = Result<Value>>;

    /// The geography FeatureCollection.
    fn geography(&self) -> impl Future<Output = Result<Value>>;
}

/// Runs `fut` with a deadline; expiry becomes [`AtlasError::Timeout`].
pub async fn with_timeout<T, F>(channel: Channel, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(AtlasError::Timeout { channel, after }),
    }
}

/// Both statistics channels of one selection, normalized.
#[derive(Debug)]
pub struct YearResponse {
    pub ticket: Ticket,
    pub host: Result<Vec<PopulationRecord>>,
    pub origin: Result<Vec<PopulationRecord>>,
}

async fn fetch_statistics<S: DataSource>(
    source: &S,
    year: i32,
    scope: Scope,
    timeout: Duration,
) -> Result<Vec<PopulationRecord>> {
    let raw = with_timeout(scope.channel(), timeout, source.statistics(year, scope)).await?;
    normalize_statistics(&raw, scope, year)
}

/// Fetches host and origin statistics for `ticket` in parallel.
/// Each channel fails independently.
pub async fn fetch_year<S: DataSource>(source: &S, ticket: Ticket, timeout: Duration) -> YearResponse {
    debug!(year = ticket.year, generation = ticket.generation, "fetching statistics");
    let (host, origin) = tokio::join!(
        fetch_statistics(source, ticket.year, Scope::Asylum, timeout),
        fetch_statistics(source, ticket.year, Scope::Origin, timeout),
    );
    YearResponse {
        ticket,
        host,
        origin,
    }
}

pub async fn fetch_geography<S: DataSource>(source: &S, timeout: Duration) -> Result<Vec<GeoFeature>> {
    let raw = with_timeout(Channel::Geography, timeout, source.geography()).await?;
    normalize_geography(&raw)
}

pub async fn fetch_demographics<S: DataSource>(
    source: &S,
    ticket: &DemographicsTicket,
    timeout: Duration,
) -> Result<DemographicPyramid> {
    let raw = with_timeout(
        Channel::Demographics,
        timeout,
        source.demographics(ticket.year, &ticket.origin_code),
    )
    .await?;
    Ok(reshape(&demographic_rows(&raw)?))
}

impl Session {
    /// Applies both channels of a [`YearResponse`].
    pub fn apply_year(&mut self, response: YearResponse) -> Applied {
        let host = self.apply_statistics(response.ticket, Scope::Asylum, response.host);
        let origin = self.apply_statistics(response.ticket, Scope::Origin, response.origin);
        if host == Applied::Current || origin == Applied::Current {
            Applied::Current
        } else {
            Applied::Stale
        }
    }
}

/// Drives a [`Session`] against a [`DataSource`].
pub struct Orchestrator<S> {
    source: S,
    timeout: Duration,
    session: Session,
}

impl<S: DataSource> Orchestrator<S> {
    pub fn new(source: S, config: &AtlasConfig) -> Self {
        Self {
            source,
            timeout: config.timeout(),
            session: Session::new(),
        }
    }

    pub fn with_deadline(source: S, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn load_state(&self) -> LoadState {
        self.session.load_state()
    }

    /// Loads the geography dataset on its own.
    pub async fn load_geography(&mut self) -> LoadState {
        self.session.begin_geography();
        let result = fetch_geography(&self.source, self.timeout).await;
        self.session.apply_geography(result);
        self.session.load_state()
    }

    /// Selects `year` and loads its statistics. Geography is fetched
    /// alongside if it has not been loaded successfully yet.
    pub async fn load_year(&mut self, year: i32) -> LoadState {
        let ticket = self.session.select_year(year);
        let needs_geography = self.session.channel_state(Channel::Geography) != LoadState::Ready;
        if needs_geography {
            self.session.begin_geography();
        }

        let source = &self.source;
        let timeout = self.timeout;
        let (statistics, geography) = tokio::join!(fetch_year(source, ticket, timeout), async {
            if needs_geography {
                Some(fetch_geography(source, timeout).await)
            } else {
                None
            }
        });

        if let Some(geography) = geography {
            self.session.apply_geography(geography);
        }
        self.session.apply_year(statistics);
        self.session.load_state()
    }

    /// Loads the demographic pyramid of `origin_code` for the selected year.
    pub async fn load_demographics(&mut self, origin_code: &str) -> Result<&DemographicPyramid> {
        let ticket = self
            .session
            .select_region(origin_code)
            .ok_or(AtlasError::NotReady(LoadState::Idle))?;
        let result = fetch_demographics(&self.source, &ticket, self.timeout).await;
        self.session.apply_demographics(&ticket, result);
        self.session.pyramid_for(origin_code)
    }
}

#[cfg(feature = "http")]
pub use http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use super::DataSource;
    use crate::config::AtlasConfig;
    use crate::error::{AtlasError, Result};
    use crate::loader;
    use crate::model::Scope;
    use serde_json::Value;
    use std::path::PathBuf;
    use tracing::debug;

    /// [`DataSource`] backed by the UNHCR population API over HTTPS.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        client: reqwest::Client,
        statistics_url: String,
        demographics_url: String,
        geography_url: String,
        geography_path: Option<PathBuf>,
    }

    impl HttpSource {
        pub fn new(config: &AtlasConfig) -> Self {
            Self::with_client(reqwest::Client::new(), config)
        }

        pub fn with_client(client: reqwest::Client, config: &AtlasConfig) -> Self {
            Self {
                client,
                statistics_url: config.statistics_url.clone(),
                demographics_url: config.demographics_url.clone(),
                geography_url: config.geography_url.clone(),
                geography_path: config.geography_path.clone(),
            }
        }

        async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
            debug!(url, ?query, "GET");
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| AtlasError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AtlasError::Network(format!("{url} returned {status}")));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| AtlasError::Schema(format!("{url}: {e}")))
        }
    }

    impl DataSource for HttpSource {
        async fn statistics(&self, year: i32, scope: Scope) -> Result<Value> {
            let selector = match scope {
                Scope::Asylum => "coa_all",
                Scope::Origin => "coo_all",
            };
            let query = [("year", year.to_string()), (selector, "true".to_string())];
            self.get_json(&self.statistics_url, &query).await
        }

        async fn demographics(&self, year: i32, origin_code: &str) -> Result<Value> {
            let query = [("year", year.to_string()), ("coo", origin_code.to_string())];
            self.get_json(&self.demographics_url, &query).await
        }

        async fn geography(&self) -> Result<Value> {
            match &self.geography_path {
                Some(path) => loader::read_json_async(path.clone()).await,
                None => self.get_json(&self.geography_url, &[]).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Never;

    impl DataSource for Never {
        async fn statistics(&self, _: i32, _: Scope) -> Result<Value> {
            std::future::pending().await
        }
        async fn demographics(&self, _: i32, _: &str) -> Result<Value> {
            std::future::pending().await
        }
        async fn geography(&self) -> Result<Value> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_requests_time_out_per_channel() {
        let ticket = Ticket {
            generation: 1,
            year: 2024,
        };
        let response = fetch_year(&Never, ticket, Duration::from_secs(5)).await;
        assert!(matches!(
            response.host,
            Err(AtlasError::Timeout { channel: Channel::Host, .. })
        ));
        assert!(matches!(
            response.origin,
            Err(AtlasError::Timeout { channel: Channel::Origin, .. })
        ));
    }

    const COLLECTION: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"DEU","properties":{"name":"Germany"},"geometry":null}
    ]}"#;

    fn write_collection(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("popatlas-{}-{name}", std::process::id()));
        std::fs::write(&path, COLLECTION).unwrap();
        path
    }

    /// Statistics inline, geography from a local file.
    struct LocalFile(std::path::PathBuf);

    impl DataSource for LocalFile {
        async fn statistics(&self, year: i32, _: Scope) -> Result<Value> {
            Ok(json!({ "items": [
                { "coa_iso": "DEU", "coa_name": "Germany",
                  "coo_iso": "DEU", "coo_name": "Germany", "year": year, "refugees": 42 }
            ]}))
        }
        async fn demographics(&self, _: i32, _: &str) -> Result<Value> {
            Ok(json!({ "items": [] }))
        }
        async fn geography(&self) -> Result<Value> {
            crate::loader::read_json_async(self.0.clone()).await
        }
    }

    #[tokio::test]
    async fn local_geography_loads_alongside_statistics() {
        let path = write_collection("orchestrated.geo.json");
        let mut orch = Orchestrator::with_deadline(LocalFile(path.clone()), Duration::from_secs(5));
        let state = orch.load_year(2024).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(state, LoadState::Ready);
        let features = orch.session().features().unwrap();
        assert_eq!(features[0].code(), "DEU");
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn http_source_reads_configured_geography_path() {
        let path = write_collection("http-local.geo.json");
        let config = AtlasConfig {
            geography_path: Some(path.clone()),
            ..AtlasConfig::default()
        };
        let raw = HttpSource::new(&config).geography().await;
        std::fs::remove_file(&path).ok();
        assert_eq!(raw.unwrap()["features"][0]["id"], "DEU");
    }

    #[tokio::test]
    async fn with_timeout_passes_through_results() {
        let ok = with_timeout(Channel::Host, Duration::from_secs(1), async { Ok(json!(1)) }).await;
        assert_eq!(ok.unwrap(), json!(1));
    }
}
