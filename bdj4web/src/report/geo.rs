//! Best-effort IP to country resolution

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::WebError;
use crate::http::client::HttpClient;
use crate::report::record::UNKNOWN_COUNTRY;

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Country code for `ip`, `None` when the service does not know it
    async fn country(&self, ip: IpAddr) -> Result<Option<String>, WebError>;
}

/// Lookup disabled: everything is unknown
#[derive(Debug, Clone, Default)]
pub struct DisabledLocator;

#[async_trait]
impl GeoLocator for DisabledLocator {
    async fn country(&self, _ip: IpAddr) -> Result<Option<String>, WebError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    #[serde(default)]
    country: Option<String>,
}

/// ipinfo.io style lookup: `GET <base>/<ip>?token=...` returning `{"country": "US"}`
#[derive(Debug, Clone)]
pub struct IpInfoLocator {
    client: HttpClient,
    token: Option<SecretString>,
}

impl IpInfoLocator {
    pub fn new(client: HttpClient, token: Option<SecretString>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl GeoLocator for IpInfoLocator {
    async fn country(&self, ip: IpAddr) -> Result<Option<String>, WebError> {
        let path = ip.to_string();
        let response: IpInfoResponse = match &self.token {
            Some(token) => {
                self.client
                    .get_json(&path, &[("token", token.expose_secret())])
                    .await?
            }
            None => self.client.get_json(&path, &[]).await?,
        };
        Ok(response.country.filter(|c| !c.is_empty()))
    }
}

/// Memoizing wrapper used for a single report render
pub struct CountryResolver<'a> {
    locator: &'a dyn GeoLocator,
    cache: HashMap<String, String>,
}

impl<'a> CountryResolver<'a> {
    pub fn new(locator: &'a dyn GeoLocator) -> Self {
        Self {
            locator,
            cache: HashMap::new(),
        }
    }

    /// Never fails; anything that goes wrong resolves to `unknown`
    pub async fn resolve(&mut self, ip: Option<&str>) -> String {
        let Some(raw) = ip.map(str::trim).filter(|ip| !ip.is_empty()) else {
            return UNKNOWN_COUNTRY.to_string();
        };
        if let Some(country) = self.cache.get(raw) {
            return country.clone();
        }

        let country = match raw.parse::<IpAddr>() {
            Ok(addr) => match self.locator.country(addr).await {
                Ok(Some(country)) => country,
                Ok(None) => UNKNOWN_COUNTRY.to_string(),
                Err(e) => {
                    warn!("Geolocation of {} failed: {}", raw, e);
                    UNKNOWN_COUNTRY.to_string()
                }
            },
            Err(_) => {
                debug!("Not an IP address: {:?}", raw);
                UNKNOWN_COUNTRY.to_string()
            }
        };

        self.cache.insert(raw.to_string(), country.clone());
        country
    }
}
