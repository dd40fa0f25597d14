//! In-memory collaborators for driving the job processor in tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tempfile::TempDir;

use ingestion_client::{CallbackSender, JobStore, PartsValidationService, TaskTracker};
use ingestion_core::config::ingestion::IngestionConfig;
use ingestion_core::config::queue::QueueConfig;
use ingestion_core::config::validation::ValidationConfig;
use ingestion_core::config::worker::WorkerConfig;
use ingestion_core::error::AppError;
use ingestion_core::result::AppResult;
use ingestion_entity::callback::CallbackPayload;
use geo::{LineString, Polygon};
use ingestion_entity::feature::{Feature, Geometry};
use ingestion_entity::job::{IngestionJobParameters, Job};
use ingestion_entity::task::{Task, TaskParameters, TaskUpdate};
use ingestion_entity::validation::{PartValidationResult, ValidationRequest, ValidationResponse};
use ingestion_shapefile::MemoryFeatureSource;
use ingestion_validation::ReportBuilder;
use ingestion_worker::callback::CallbackNotifier;
use ingestion_worker::{IngestionJobHandler, JobExecutor, JobProcessor, JobQueue};

pub const JOB_ID: &str = "job-1";
pub const TASK_ID: &str = "task-1";
pub const SHAPEFILE: &str = "blue_marble/ShapeMetadata.shp";
pub const SIBLINGS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub task_id: String,
    pub resettable: bool,
    pub reason: String,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    pending: Mutex<HashMap<String, VecDeque<Task>>>,
    jobs: Mutex<HashMap<String, Job>>,
    pub updates: Mutex<Vec<TaskUpdate>>,
    pub acks: Mutex<Vec<String>>,
    pub rejects: Mutex<Vec<Rejection>>,
    failing_acks: AtomicBool,
    failing_rejects: AtomicBool,
}

impl InMemoryJobStore {
    pub fn push(&self, job: Job, task: Task) {
        self.pending
            .lock()
            .unwrap()
            .entry(job.job_type.clone())
            .or_default()
            .push_back(task);
        self.jobs.lock().unwrap().insert(job.id.clone(), job);
    }

    /// Make every ack fail after it is recorded.
    pub fn fail_acks(&self) {
        self.failing_acks.store(true, Ordering::SeqCst);
    }

    /// Make every reject fail after it is recorded.
    pub fn fail_rejects(&self) {
        self.failing_rejects.store(true, Ordering::SeqCst);
    }

    pub fn acks(&self) -> Vec<String> {
        self.acks.lock().unwrap().clone()
    }

    pub fn rejects(&self) -> Vec<Rejection> {
        self.rejects.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<TaskUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn dequeue(&self, job_type: &str, _task_type: &str) -> AppResult<Option<Task>> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .get_mut(job_type)
            .and_then(VecDeque::pop_front))
    }

    async fn get_job(&self, job_id: &str) -> AppResult<Job> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} not found")))
    }

    async fn update_task(&self, _job_id: &str, _task_id: &str, update: TaskUpdate) -> AppResult<()> {
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn ack(&self, _job_id: &str, task_id: &str) -> AppResult<()> {
        self.acks.lock().unwrap().push(task_id.to_string());
        if self.failing_acks.load(Ordering::SeqCst) {
            return Err(AppError::external_service("job manager returned 502 on ack"));
        }
        Ok(())
    }

    async fn reject(
        &self,
        _job_id: &str,
        task_id: &str,
        resettable: bool,
        reason: &str,
    ) -> AppResult<()> {
        self.rejects.lock().unwrap().push(Rejection {
            task_id: task_id.to_string(),
            resettable,
            reason: reason.to_string(),
        });
        if self.failing_rejects.load(Ordering::SeqCst) {
            return Err(AppError::external_service("job manager returned 502 on reject"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTracker {
    pub notified: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskTracker for RecordingTracker {
    async fn notify(&self, task_id: &str) -> AppResult<()> {
        self.notified.lock().unwrap().push(task_id.to_string());
        Ok(())
    }
}

/// Flags the configured part ids with the given error codes.
#[derive(Default)]
pub struct FakeValidationService {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<ValidationRequest>>,
    errors: HashMap<String, Vec<String>>,
    small_holes_per_call: u64,
    unavailable: bool,
}

impl FakeValidationService {
    pub fn flagging(errors: &[(&str, &str)]) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (id, code) in errors {
            map.entry(id.to_string()).or_default().push(code.to_string());
        }
        Self {
            errors: map,
            ..Self::default()
        }
    }

    /// Every call fails as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartsValidationService for FakeValidationService {
    async fn validate(&self, request: &ValidationRequest) -> AppResult<ValidationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.unavailable {
            return Err(AppError::external_service("polygon parts service returned 503"));
        }

        let parts = request
            .parts_data
            .features
            .iter()
            .filter_map(|f| f.property_id())
            .filter_map(|id| {
                self.errors.get(&id).map(|errors| PartValidationResult {
                    id,
                    errors: errors.clone(),
                })
            })
            .collect();

        Ok(ValidationResponse {
            parts,
            small_holes_count: self.small_holes_per_call,
        })
    }
}

#[derive(Default)]
pub struct RecordingCallbackSender {
    pub sent: Mutex<Vec<(String, CallbackPayload)>>,
    failing: AtomicBool,
}

impl RecordingCallbackSender {
    /// Make every delivery fail after it is recorded.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, CallbackPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackSender for RecordingCallbackSender {
    async fn send(&self, url: &str, payload: &CallbackPayload) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external_service(format!("{url} is unreachable")));
        }
        Ok(())
    }
}

pub fn job() -> Job {
    Job {
        id: JOB_ID.into(),
        job_type: "Ingestion_New".into(),
        resource_id: "blue_marble".into(),
        version: "1.0".into(),
        product_type: "Orthophoto".into(),
        parameters: IngestionJobParameters {
            shapefile_path: SHAPEFILE.into(),
            ingestion_resolution: 0.000171661376953125,
            callback_urls: vec!["http://subscriber/callback".into()],
            catalog_id: Some("catalog-7".into()),
            ..IngestionJobParameters::default()
        },
    }
}

pub fn task(attempts: u32, parameters: TaskParameters) -> Task {
    Task {
        id: TASK_ID.into(),
        job_id: JOB_ID.into(),
        task_type: "validation".into(),
        attempts,
        percentage: None,
        parameters,
    }
}

/// A valid polygon part with five vertices.
pub fn part(id: &str) -> Feature {
    let Value::Object(props) = json!({
        "id": id,
        "sourceName": "Satellite pass 12",
        "ep90": 3.5,
        "sourceRes": 0.5,
        "updateDate": "2023-11-02",
        "sensors": "WV02",
    }) else {
        unreachable!()
    };
    let ring = LineString::from(vec![
        (34.0, 31.0),
        (34.0, 31.1),
        (34.1, 31.1),
        (34.1, 31.0),
        (34.0, 31.0),
    ]);
    Feature::new(Some(Geometry::Polygon(Polygon::new(ring, vec![]))), props)
}

/// A part whose attributes fail mapping.
pub fn broken_part(id: &str) -> Feature {
    let mut props = Map::new();
    props.insert("id".into(), json!(id));
    let ring = LineString::from(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
    Feature::new(Some(Geometry::Polygon(Polygon::new(ring, vec![]))), props)
}

pub fn create_siblings(root: &Path, extensions: &[&str]) {
    let shapefile = root.join(SHAPEFILE);
    std::fs::create_dir_all(shapefile.parent().unwrap()).unwrap();
    for extension in extensions {
        std::fs::write(shapefile.with_extension(extension), b"").unwrap();
    }
}

pub struct Harness {
    pub store: Arc<InMemoryJobStore>,
    pub tracker: Arc<RecordingTracker>,
    pub validation: Arc<FakeValidationService>,
    pub callbacks: Arc<RecordingCallbackSender>,
    pub report_builder: Arc<ReportBuilder>,
    pub processor: JobProcessor,
    pub sources: TempDir,
    pub reports: TempDir,
}

pub struct HarnessOptions {
    pub features: Vec<Feature>,
    pub siblings: Vec<&'static str>,
    pub validation: FakeValidationService,
    pub max_vertices_per_chunk: u64,
    pub max_task_attempts: u32,
    pub thresholds: ValidationConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            siblings: SIBLINGS.to_vec(),
            validation: FakeValidationService::default(),
            max_vertices_per_chunk: 10,
            max_task_attempts: 3,
            thresholds: ValidationConfig::default(),
        }
    }
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        let sources = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        create_siblings(sources.path(), &options.siblings);

        let store = Arc::new(InMemoryJobStore::default());
        let tracker = Arc::new(RecordingTracker::default());
        let validation = Arc::new(options.validation);
        let callbacks = Arc::new(RecordingCallbackSender::default());
        let report_builder = Arc::new(ReportBuilder::new(reports.path(), options.thresholds));

        let queue = Arc::new(JobQueue::new(store.clone(), QueueConfig::default()));
        let ingestion = IngestionConfig {
            sources_root: sources.path().display().to_string(),
            max_vertices_per_chunk: options.max_vertices_per_chunk,
            ..IngestionConfig::default()
        };
        let handler = IngestionJobHandler::new(
            Arc::clone(&queue),
            validation.clone(),
            Arc::clone(&report_builder),
            &ingestion,
            options.thresholds,
        )
        .with_source(Arc::new(MemoryFeatureSource::new(options.features)));

        let mut executor = JobExecutor::new();
        executor.register(Arc::new(handler));

        let processor = JobProcessor::new(
            queue,
            Arc::new(executor),
            tracker.clone(),
            CallbackNotifier::new(callbacks.clone()),
            WorkerConfig {
                max_task_attempts: options.max_task_attempts,
                ..WorkerConfig::default()
            },
            "worker-test".into(),
        );

        Self {
            store,
            tracker,
            validation,
            callbacks,
            report_builder,
            processor,
            sources,
            reports,
        }
    }

    pub fn notified(&self) -> Vec<String> {
        self.tracker.notified.lock().unwrap().clone()
    }
}
