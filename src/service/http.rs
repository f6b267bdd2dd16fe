//! Places web-service implementation of the geodata service

use super::{
    AutocompletePredictionBuffer, AutocompleteRequest, ConnectionFailure, DataBuffer,
    DetailsRequest, GeoDataService, PlaceBuffer, ServiceError, Status,
};
use crate::config::ServiceSettings;
use crate::network::{HttpClient, HttpRequest, HttpResponse};
use crate::places::{LatLng, PlaceRecord, Prediction};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const AUTOCOMPLETE_PATH: &str = "maps/api/place/autocomplete/json";
const DETAILS_PATH: &str = "maps/api/place/details/json";
const DETAILS_FIELDS: &str =
    "place_id,name,formatted_address,international_phone_number,website,geometry";

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    main_text: String,
    #[serde(default)]
    secondary_text: String,
}

#[derive(Debug, Deserialize)]
struct AutocompletePrediction {
    place_id: String,
    description: String,
    structured_formatting: StructuredFormatting,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<AutocompletePrediction>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    international_phone_number: Option<String>,
    website: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    html_attributions: Vec<String>,
    result: Option<DetailsResult>,
}

/// `OK` and `ZERO_RESULTS` are successes; anything else carries its
/// status and optional message as the description.
fn parse_status(status: &str, error_message: Option<String>) -> Status {
    match status {
        "OK" | "ZERO_RESULTS" => Status::ok(),
        _ => match error_message {
            Some(message) => Status::error(format!("{}: {}", status, message)),
            None => Status::error(status),
        },
    }
}

/// Geodata service backed by the Places web service
pub struct HttpPlacesService {
    client: HttpClient,
    base_url: Url,
    api_key: Option<String>,
    language: Option<String>,
    probe_on_connect: bool,
}

impl HttpPlacesService {
    /// Create a service from its settings
    pub fn new(client: HttpClient, settings: &ServiceSettings) -> Result<Self> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            language: settings.language.clone(),
            probe_on_connect: settings.probe_on_connect,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Transport(format!("invalid endpoint URL: {}", e)))
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        request
            .param_opt("language", self.language.clone())
            .param_opt("key", self.api_key.clone())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ServiceError> {
        let response = self.client.execute(request).await?;
        if !response.is_success() {
            return Err(ServiceError::Http(response.status));
        }
        Ok(response)
    }
}

#[async_trait]
impl GeoDataService for HttpPlacesService {
    fn name(&self) -> &str {
        "places web service"
    }

    async fn connect(&self) -> Result<(), ConnectionFailure> {
        if self.api_key.is_none() {
            return Err(ConnectionFailure::new(
                ConnectionFailure::INVALID_ACCOUNT,
                "no API key configured",
            ));
        }

        if self.probe_on_connect {
            // Any HTTP answer means the service is reachable
            self.client
                .get(self.base_url.as_str())
                .await
                .map_err(|e| ConnectionFailure::new(ConnectionFailure::NETWORK_ERROR, e.to_string()))?;
        }

        Ok(())
    }

    async fn autocomplete(
        &self,
        request: AutocompleteRequest,
    ) -> Result<AutocompletePredictionBuffer, ServiceError> {
        debug!(
            "Autocomplete request on session {}",
            request.handle.session()
        );
        let url = self.endpoint(AUTOCOMPLETE_PATH)?;
        let http_request = HttpRequest::get(url.as_str())
            .param("input", request.input)
            .param("locationbias", request.bounds.to_location_bias())
            .param_opt(
                "types",
                request
                    .filter
                    .filter(|f| !f.is_empty())
                    .map(|f| f.to_param()),
            )
            .param_opt("sessiontoken", request.session_token);

        let response = self.send(self.authorize(http_request)).await?;
        let body: AutocompleteResponse = response.json()?;

        let status = parse_status(&body.status, body.error_message);
        let predictions = body
            .predictions
            .into_iter()
            .map(|p| {
                Prediction::new(
                    p.place_id,
                    p.structured_formatting.main_text,
                    p.structured_formatting.secondary_text,
                )
                .with_full_text(p.description)
                .with_types(p.types)
            })
            .collect();

        Ok(DataBuffer::new(status, predictions))
    }

    async fn place_by_id(&self, request: DetailsRequest) -> Result<PlaceBuffer, ServiceError> {
        debug!("Details request on session {}", request.handle.session());
        let url = self.endpoint(DETAILS_PATH)?;
        let http_request = HttpRequest::get(url.as_str())
            .param("place_id", request.place_id)
            .param("fields", DETAILS_FIELDS)
            .param_opt("sessiontoken", request.session_token);

        let response = self.send(self.authorize(http_request)).await?;
        let body: DetailsResponse = response.json()?;

        let status = parse_status(&body.status, body.error_message);
        let records = body
            .result
            .map(|r| PlaceRecord {
                id: r.place_id,
                name: r.name,
                address: r.formatted_address,
                phone_number: r.international_phone_number,
                website_uri: r.website,
                location: r.geometry.map(|g| g.location),
            })
            .into_iter()
            .collect();
        let attributions = if body.html_attributions.is_empty() {
            None
        } else {
            Some(body.html_attributions.join("\n"))
        };

        Ok(DataBuffer::new(status, records).with_attributions(attributions))
    }
}
