//! Client side of the external processing service
//!
//! Requests are fire-and-forget from the event loop's point of view: a
//! [`ProcessingService`] accepts the request and later delivers a
//! [`Completion`] through a channel that the app drains on each tick.

use crate::config::ServiceConfig;
use pickview_core::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{debug, info};

/// Curve model used by the trajectory endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplineMethod {
    CatmullRom,
    Bspline,
}

/// Body of `POST /segment_plane`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneSegmentationRequest {
    pub points: Vec<[f32; 3]>,
    pub threshold: f32,
    pub max_iterations: u32,
}

/// Plane found by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneFit {
    pub normal: [f32; 3],
    pub point: [f32; 3],
    #[serde(default)]
    pub d: Option<f32>,
}

/// Reply of `POST /segment_plane`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneSegmentationResponse {
    pub plane: PlaneFit,
    #[serde(default)]
    pub inliers: Vec<[f32; 3]>,
    pub num_inliers: usize,
}

/// Body of `POST /bspline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRequest {
    pub control_points: Vec<[f32; 3]>,
    pub degree: u32,
    pub num_samples: u32,
    pub method: SplineMethod,
}

/// Reply of `POST /bspline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResponse {
    pub curve_points: Vec<[f32; 3]>,
    pub num_points: usize,
}

/// The two remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PlaneSegmentation,
    TrajectoryFitting,
}

impl Operation {
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::PlaneSegmentation => "segment_plane",
            Operation::TrajectoryFitting => "bspline",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::PlaneSegmentation => "Plane segmentation",
            Operation::TrajectoryFitting => "Trajectory fitting",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingRequest {
    SegmentPlane(PlaneSegmentationRequest),
    FitTrajectory(TrajectoryRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResponse {
    Plane(PlaneSegmentationResponse),
    Trajectory(TrajectoryResponse),
}

/// Identifies the selection session a request was issued from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub session: u64,
    pub operation: Operation,
}

/// Outcome of a request, tagged with the ticket it was submitted under
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub result: Result<ProcessingResponse>,
}

/// Something that can run processing requests off the event loop
pub trait ProcessingService {
    /// Start a request and return immediately. The outcome must arrive later
    /// as a [`Completion`] carrying the same ticket.
    fn submit(&self, ticket: RequestTicket, request: ProcessingRequest) -> Result<()>;
}

/// HTTP/JSON implementation backed by reqwest on a tokio runtime
pub struct HttpProcessingService {
    client: reqwest::Client,
    base_url: String,
    runtime: tokio::runtime::Handle,
    completions: Sender<Completion>,
}

impl HttpProcessingService {
    pub fn new(
        config: &ServiceConfig,
        runtime: tokio::runtime::Handle,
        completions: Sender<Completion>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Remote(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            runtime,
            completions,
        })
    }

    pub fn url_for(&self, operation: Operation) -> String {
        format!("{}/{}", self.base_url, operation.endpoint())
    }
}

impl ProcessingService for HttpProcessingService {
    fn submit(&self, ticket: RequestTicket, request: ProcessingRequest) -> Result<()> {
        let client = self.client.clone();
        let url = self.url_for(ticket.operation);
        let completions = self.completions.clone();

        info!(%url, session = ticket.session, "submitting processing request");
        self.runtime.spawn(async move {
            let result = match request {
                ProcessingRequest::SegmentPlane(body) => post_json(&client, &url, &body)
                    .await
                    .map(ProcessingResponse::Plane),
                ProcessingRequest::FitTrajectory(body) => post_json(&client, &url, &body)
                    .await
                    .map(ProcessingResponse::Trajectory),
            };
            if completions.send(Completion { ticket, result }).is_err() {
                debug!("completion receiver dropped");
            }
        });

        Ok(())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

async fn post_json<B, R>(client: &reqwest::Client, url: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Remote(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Remote(e.to_string()))?;

    if !status.is_success() {
        return Err(Error::Remote(error_message(status, &bytes)));
    }

    decode_response(&bytes)
}

/// Parse a success body, reporting a malformed one as a remote failure
pub fn decode_response<R: DeserializeOwned>(bytes: &[u8]) -> Result<R> {
    serde_json::from_slice(bytes).map_err(|e| Error::Remote(format!("malformed response: {e}")))
}

fn error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { detail }) => format!("service returned {status}: {detail}"),
        Err(_) => format!("service returned {status}"),
    }
}
