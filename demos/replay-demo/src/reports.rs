//! Report sink writing JSON summaries to a directory

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use repsense_core::{TrackerError, TrackerResult};
use repsense_runtime::ReportGenerator;
use repsense_session::{ReportLocator, ReportRequest};

pub struct JsonFileReports {
    dir: PathBuf,
    issued: AtomicU32,
}

impl JsonFileReports {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileReports {
            dir: dir.into(),
            issued: AtomicU32::new(0),
        }
    }
}

impl ReportGenerator for JsonFileReports {
    async fn generate(&self, request: ReportRequest) -> TrackerResult<ReportLocator> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self
            .dir
            .join(format!("{}-{}-{}.json", request.patient_id, request.exercise, n));
        let dir = self.dir.clone();

        let body = serde_json::to_vec_pretty(&request).map_err(|e| TrackerError::Report(e.to_string()))?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&target, body)
        })
        .await
        .map_err(|e| TrackerError::Report(e.to_string()))?
        .map_err(|e| TrackerError::Report(e.to_string()))?;

        Ok(ReportLocator(path.display().to_string()))
    }
}
