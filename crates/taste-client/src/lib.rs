//! Taste client for communicating with the photo evaluation gRPC service.
//!
//! This crate provides a Rust client for the `taste.Taste` service. It handles:
//! - Connection management to the service
//! - Converting recommendation photos to protobuf messages
//! - Priming the service with a recommendation's primary photo
//! - Scoring photo sets and validating the response

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tonic::transport::Channel as GrpcChannel;
use tracing::{debug, error, info};

use recommendation::{Evaluation, Photo, Taste};

// Include the generated protobuf code
pub mod taste {
    tonic::include_proto!("taste");
}

use taste::{
    taste_client::TasteClient as GrpcTasteClient,
    CheckPhotosOutRequest,
    CheckPhotosOutResponse,
    FirstSightRequest,
};

/// Errors that can occur when interacting with the taste service
#[derive(Error, Debug)]
pub enum TasteClientError {
    #[error("Failed to connect to taste service: {0}")]
    ConnectionError(String),

    #[error("Failed to prime taste service: {0}")]
    FirstSightError(String),

    #[error("Failed to score photos: {0}")]
    ScoringError(String),

    #[error("Invalid response from taste service: {0}")]
    InvalidResponse(String),
}

/// Client for the taste service.
///
/// Wraps the generated gRPC client. Cheap to clone; clones share the
/// underlying connection.
#[derive(Clone)]
pub struct TasteClient {
    client: GrpcTasteClient<GrpcChannel>,
    service_addr: String,
}

impl TasteClient {
    /// Connect to the taste service.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50051")
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        info!("Connecting to taste service at {}", addr);

        let channel = GrpcChannel::from_shared(addr.clone())
            .context("Creating channel from address")?
            .connect()
            .await
            .map_err(|e| {
                error!("Could not reach taste service at {}: {}", addr, e);
                TasteClientError::ConnectionError(e.to_string())
            })?;

        Ok(TasteClient {
            client: GrpcTasteClient::new(channel),
            service_addr: addr,
        })
    }

    /// Build a client that connects on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let channel = GrpcChannel::from_shared(addr.clone())
            .context("Creating channel from address")?
            .connect_lazy();

        Ok(TasteClient {
            client: GrpcTasteClient::new(channel),
            service_addr: addr,
        })
    }

    /// Register the primary photo of a recommendation.
    pub async fn prime(&self, photo: &Photo) -> Result<(), TasteClientError> {
        debug!("Priming taste service with photo {}", photo.id);
        let request = tonic::Request::new(FirstSightRequest {
            photo: Some(photo.into()),
        });

        self.client
            .clone()
            .first_sight(request)
            .await
            .map_err(|status| {
                error!("gRPC error during first sight: {}", status);
                TasteClientError::FirstSightError(status.to_string())
            })?;
        Ok(())
    }

    /// Score a photo set.
    ///
    /// The similarity mean in the response must be a finite number.
    pub async fn score_photos(&self, photos: &[Photo]) -> Result<Evaluation, TasteClientError> {
        debug!("Scoring {} photos", photos.len());
        let request = tonic::Request::new(CheckPhotosOutRequest {
            photos: photos.iter().map(taste::Photo::from).collect(),
        });

        let response = self
            .client
            .clone()
            .check_photos_out(request)
            .await
            .map_err(|status| {
                error!("gRPC error while scoring photos: {}", status);
                TasteClientError::ScoringError(status.to_string())
            })?;

        evaluation_from_response(response.into_inner())
    }

    /// Get the address of the taste service this client talks to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

impl From<&Photo> for taste::Photo {
    fn from(photo: &Photo) -> Self {
        taste::Photo {
            id: photo.id.clone(),
            url: photo.url.clone(),
        }
    }
}

fn evaluation_from_response(
    response: CheckPhotosOutResponse,
) -> Result<Evaluation, TasteClientError> {
    if !response.face_similarity_mean.is_finite() {
        error!(
            "Taste service returned non-finite similarity mean: {}",
            response.face_similarity_mean
        );
        return Err(TasteClientError::InvalidResponse(format!(
            "face similarity mean is {}",
            response.face_similarity_mean
        )));
    }

    Ok(Evaluation {
        like: response.like,
        face_similarity_mean: response.face_similarity_mean,
    })
}

#[async_trait]
impl Taste for TasteClient {
    async fn first_sight(&self, photo: &Photo) -> Result<()> {
        self.prime(photo).await?;
        Ok(())
    }

    async fn check_photos_out(&self, photos: &[Photo]) -> Result<Evaluation> {
        Ok(self.score_photos(photos).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use taste::taste_server::{Taste as TasteService, TasteServer};
    use taste::FirstSightResponse;
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tonic::{Request, Response, Status};

    // ============================================================================
    // Mock Taste Service
    // ============================================================================

    /// Likes any set with more than one photo; similarity is 1 / photo count
    #[derive(Clone, Default)]
    struct MockTaste {
        primed: Arc<Mutex<Vec<String>>>,
    }

    #[tonic::async_trait]
    impl TasteService for MockTaste {
        async fn first_sight(
            &self,
            request: Request<FirstSightRequest>,
        ) -> Result<Response<FirstSightResponse>, Status> {
            let photo = request
                .into_inner()
                .photo
                .ok_or_else(|| Status::invalid_argument("missing photo"))?;
            self.primed.lock().unwrap().push(photo.id);
            Ok(Response::new(FirstSightResponse {}))
        }

        async fn check_photos_out(
            &self,
            request: Request<CheckPhotosOutRequest>,
        ) -> Result<Response<CheckPhotosOutResponse>, Status> {
            let count = request.get_ref().photos.len();
            if count == 0 {
                return Err(Status::invalid_argument("no photos"));
            }
            Ok(Response::new(CheckPhotosOutResponse {
                like: count > 1,
                face_similarity_mean: 1.0 / count as f64,
            }))
        }
    }

    /// Start a mock taste service on a random port
    async fn start_mock_taste_service(
        mock: MockTaste,
    ) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock taste service");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(TasteServer::new(mock))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("Mock taste service failed");
        });

        (format!("http://{}", addr), handle)
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[test]
    fn test_photo_conversion_drops_extra_fields() {
        let mut photo = Photo::new("p1", "https://img/p1.jpg");
        photo
            .extra
            .insert("width".to_string(), serde_json::json!(640));

        let wire = taste::Photo::from(&photo);

        assert_eq!(wire.id, "p1");
        assert_eq!(wire.url, "https://img/p1.jpg");
    }

    #[test]
    fn test_evaluation_from_valid_response() {
        let evaluation = evaluation_from_response(CheckPhotosOutResponse {
            like: true,
            face_similarity_mean: 0.82,
        })
        .unwrap();

        assert!(evaluation.like);
        assert_eq!(evaluation.face_similarity_mean, 0.82);
    }

    #[test]
    fn test_evaluation_rejects_nan_similarity() {
        let result = evaluation_from_response(CheckPhotosOutResponse {
            like: true,
            face_similarity_mean: f64::NAN,
        });

        assert!(matches!(result, Err(TasteClientError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_prime_and_score_against_mock_service() {
        let mock = MockTaste::default();
        let (addr, handle) = start_mock_taste_service(mock.clone()).await;
        let client = TasteClient::connect(addr).await.expect("Failed to connect");

        client.prime(&Photo::new("p1", "a")).await.unwrap();
        let evaluation = client
            .score_photos(&[Photo::new("p1", "a"), Photo::new("p2", "b")])
            .await
            .unwrap();

        assert_eq!(*mock.primed.lock().unwrap(), vec!["p1".to_string()]);
        assert!(evaluation.like);
        assert_eq!(evaluation.face_similarity_mean, 0.5);

        handle.abort();
    }

    #[tokio::test]
    async fn test_service_error_becomes_scoring_error() {
        let (addr, handle) = start_mock_taste_service(MockTaste::default()).await;
        let client = TasteClient::connect(addr).await.expect("Failed to connect");

        let result = client.score_photos(&[]).await;
        assert!(matches!(result, Err(TasteClientError::ScoringError(_))));

        handle.abort();
    }

    #[tokio::test]
    async fn test_connect_lazy_rejects_invalid_address() {
        assert!(TasteClient::connect_lazy("not a uri").is_err());
    }

    #[tokio::test]
    async fn test_connect_reports_unreachable_service() {
        let err = TasteClient::connect("http://127.0.0.1:1").await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<TasteClientError>(),
            Some(TasteClientError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_prime_fails_without_service() {
        let client = TasteClient::connect_lazy("http://127.0.0.1:1").unwrap();
        assert_eq!(client.service_address(), "http://127.0.0.1:1");

        let result = client.prime(&Photo::new("p1", "a")).await;
        assert!(matches!(result, Err(TasteClientError::FirstSightError(_))));
    }
}
