//! Collaborator seams
//!
//! The live loop talks to three black boxes:
//! - an image capture device
//! - a pose estimation service (image in, keypoints and form score out)
//! - a report generator (session summary in, artifact locator out)
//!
//! `FrameSource` is what the scheduler calls. `CameraPoseSource` composes a
//! capture device with an estimator; tests plug in scripted sources directly.

use std::future::Future;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use repsense_core::{ExerciseId, PoseFrame, TrackerError, TrackerResult};
use repsense_session::{ReportLocator, ReportRequest};

/// Acquire-frame request sent to the pose service
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRequest {
    pub exercise: ExerciseId,
    /// Encoded still image (JPEG in practice)
    pub image: Bytes,
}

/// Pose service reply
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseResponse {
    #[serde(default)]
    pub pose: PoseFrame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_score: Option<f64>,
}

impl PoseResponse {
    pub fn new(pose: PoseFrame) -> Self {
        PoseResponse {
            pose,
            form_score: None,
        }
    }

    pub fn with_form_score(mut self, score: f64) -> Self {
        self.form_score = Some(score);
        self
    }

    /// Parse the service's JSON body
    pub fn from_json(body: &[u8]) -> TrackerResult<Self> {
        serde_json::from_slice(body).map_err(|e| TrackerError::Decode(e.to_string()))
    }
}

/// Source of pose frames for a live session
pub trait FrameSource: Send + Sync + 'static {
    /// Acquire one frame for the given exercise
    fn acquire_for(
        &self,
        exercise: ExerciseId,
    ) -> impl Future<Output = TrackerResult<PoseResponse>> + Send;
}

/// Still-image capture device
pub trait ImageCapture: Send + Sync + 'static {
    fn capture(&self) -> impl Future<Output = TrackerResult<Bytes>> + Send;
}

/// Pose estimation service
pub trait PoseEstimator: Send + Sync + 'static {
    fn acquire(
        &self,
        request: FrameRequest,
    ) -> impl Future<Output = TrackerResult<PoseResponse>> + Send;
}

/// Report generation service
pub trait ReportGenerator: Send + Sync + 'static {
    fn generate(
        &self,
        request: ReportRequest,
    ) -> impl Future<Output = TrackerResult<ReportLocator>> + Send;
}

/// Capture device feeding a pose estimator
pub struct CameraPoseSource<C, E> {
    camera: C,
    estimator: E,
}

impl<C: ImageCapture, E: PoseEstimator> CameraPoseSource<C, E> {
    pub fn new(camera: C, estimator: E) -> Self {
        CameraPoseSource { camera, estimator }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }
}

impl<C: ImageCapture, E: PoseEstimator> FrameSource for CameraPoseSource<C, E> {
    async fn acquire_for(&self, exercise: ExerciseId) -> TrackerResult<PoseResponse> {
        let image = self.camera.capture().await?;
        if image.is_empty() {
            return Err(TrackerError::Acquisition("camera returned an empty image".into()));
        }
        self.estimator
            .acquire(FrameRequest { exercise, image })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedCamera(Bytes);

    impl ImageCapture for FixedCamera {
        async fn capture(&self) -> TrackerResult<Bytes> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct EchoEstimator {
        calls: Arc<AtomicUsize>,
    }

    impl PoseEstimator for EchoEstimator {
        async fn acquire(&self, request: FrameRequest) -> TrackerResult<PoseResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let x = request.image.len() as f64;
            Ok(PoseResponse::new(PoseFrame::from_keypoints([
                repsense_core::Keypoint::new(request.exercise.as_str(), x, 0.0),
            ]))
            .with_form_score(0.9))
        }
    }

    #[test]
    fn test_pose_response_from_service_json() {
        let body = br#"{
            "pose": {"keypoints": [
                {"name": "left_hip", "x": 0.4, "y": 0.5, "score": 0.98},
                {"name": "left_knee", "x": 0.42, "y": 0.7}
            ]},
            "form_score": 0.76
        }"#;
        let response = PoseResponse::from_json(body).unwrap();
        assert_eq!(response.pose.len(), 2);
        assert_eq!(response.form_score, Some(0.76));
    }

    #[test]
    fn test_pose_response_tolerates_missing_fields() {
        let response = PoseResponse::from_json(b"{}").unwrap();
        assert!(response.pose.is_empty());
        assert_eq!(response.form_score, None);

        let err = PoseResponse::from_json(b"not json").unwrap_err();
        assert!(matches!(err, TrackerError::Decode(_)));
    }

    #[tokio::test]
    async fn test_camera_pose_source_composes() {
        let estimator = EchoEstimator::default();
        let calls = Arc::clone(&estimator.calls);
        let source = CameraPoseSource::new(FixedCamera(Bytes::from_static(b"jpeg")), estimator);

        let response = source.acquire_for(ExerciseId::Squat).await.unwrap();
        let keypoint = response.pose.get("squat").unwrap();
        assert_eq!(keypoint.x, 4.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_camera_pose_source_rejects_empty_image() {
        let estimator = EchoEstimator::default();
        let calls = Arc::clone(&estimator.calls);
        let source = CameraPoseSource::new(FixedCamera(Bytes::new()), estimator);

        let err = source.acquire_for(ExerciseId::BicepCurl).await.unwrap_err();
        assert!(matches!(err, TrackerError::Acquisition(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
