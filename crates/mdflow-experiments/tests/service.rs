//! ExperimentService end to end against in-process fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mdflow_config::Settings;
use mdflow_experiments::{ExperimentError, ExperimentService, RAW_WORKFLOW_PLACEHOLDER};
use mdflow_poller::{ArtifactLocator, ArtifactProbe};
use mdflow_store::{ExperimentStatus, ExperimentStore};
use mdflow_submit::{HttpWorkflowEngine, Submission, SubmitError, WorkflowEngine};
use mdflow_workflow::{SimulationParams, WorkflowTemplate};

/// Records every body it is given and answers with a fixed outcome.
struct FakeEngine {
  bodies: Mutex<Vec<String>>,
  reject_with: Option<u16>,
}

impl FakeEngine {
  fn accepting() -> Arc<Self> {
    Arc::new(Self {
      bodies: Mutex::new(Vec::new()),
      reject_with: None,
    })
  }

  fn rejecting(status: u16) -> Arc<Self> {
    Arc::new(Self {
      bodies: Mutex::new(Vec::new()),
      reject_with: Some(status),
    })
  }

  fn bodies(&self) -> Vec<String> {
    self.bodies.lock().unwrap().clone()
  }
}

#[async_trait]
impl WorkflowEngine for FakeEngine {
  async fn submit_raw(&self, body: String) -> Result<Submission, SubmitError> {
    let mut bodies = self.bodies.lock().unwrap();
    bodies.push(body);
    match self.reject_with {
      Some(status) => Err(SubmitError::Protocol {
        status,
        detail: "engine failure".to_string(),
      }),
      None => Ok(Submission {
        tracking_url: format!("http://engine.test/apps/{}", bodies.len()),
      }),
    }
  }
}

/// Reports a fixed status and counts calls.
struct FixedProbe {
  status: ExperimentStatus,
  calls: AtomicUsize,
}

impl FixedProbe {
  fn new(status: ExperimentStatus) -> Arc<Self> {
    Arc::new(Self {
      status,
      calls: AtomicUsize::new(0),
    })
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ArtifactProbe for FixedProbe {
  async fn probe(&self, _url: &str) -> ExperimentStatus {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.status
  }
}

fn settings() -> Settings {
  let mut settings = Settings::default();
  settings.poll.auto_watch = false;
  settings
}

fn service_with(
  engine: Arc<dyn WorkflowEngine>,
  probe: Arc<dyn ArtifactProbe>,
  settings: &Settings,
) -> ExperimentService {
  ExperimentService::new(
    WorkflowTemplate::builtin().unwrap(),
    engine,
    probe,
    Arc::new(ExperimentStore::new(settings.cache.retention())),
    ArtifactLocator::new("http://s3.test", "bucket", "results/"),
    settings,
  )
}

fn example_params() -> SimulationParams {
  SimulationParams {
    molecules: 1000,
    temperature: 85,
    simulation_end_time: 5.5,
    record_movie: false,
  }
}

#[tokio::test]
async fn test_submit_example_records_running_experiment() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  let submitted = service.submit(example_params()).await.unwrap();
  let record = &submitted.record;

  assert_eq!(submitted.tracking_url, "http://engine.test/apps/1");
  assert_eq!(record.status, ExperimentStatus::Running);
  assert_eq!(record.archive, format!("md-simulation-{}.tgz", record.id));
  assert_eq!(record.video, None);
  assert_eq!(
    submitted.artifact_url,
    format!("http://s3.test/bucket/results/md-simulation-{}.tgz", record.id)
  );

  let run = record.workflow.process("run-cmd-md-simulation").unwrap();
  assert_eq!(
    run.config.executor.args,
    vec!["1000", "5.5", "85", record.archive.as_str()]
  );
  assert!(record.workflow.process("make-movie").is_none());
  assert!(record.workflow.signals.iter().all(|s| !s.name.ends_with(".avi")));

  // The body on the wire is the stored description.
  let bodies = engine.bodies();
  assert_eq!(bodies.len(), 1);
  let sent: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
  assert_eq!(sent, serde_json::to_value(&record.workflow).unwrap());

  assert_eq!(service.list_active(), vec![record.clone()]);
  assert_eq!(service.get(&record.id).unwrap(), *record);
}

#[tokio::test]
async fn test_submit_with_movie_keeps_video() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine, FixedProbe::new(ExperimentStatus::Running), &settings());

  let params = SimulationParams {
    record_movie: true,
    ..example_params()
  };
  let record = service.submit(params).await.unwrap().record;

  let video = format!("md-simulation-{}.avi", record.id);
  assert_eq!(record.video.as_deref(), Some(video.as_str()));
  let movie = record.workflow.process("make-movie").unwrap();
  assert_eq!(movie.outs, vec![video.clone()]);
  assert!(record.workflow.outs.contains(&video));
}

#[tokio::test]
async fn test_rejected_submission_stores_nothing() {
  let engine = FakeEngine::rejecting(500);
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  let err = service.submit(example_params()).await.unwrap_err();

  assert!(matches!(
    err,
    ExperimentError::Submission(SubmitError::Protocol { status: 500, .. })
  ));
  assert_eq!(engine.bodies().len(), 1);
  assert!(service.list_active().is_empty());
  assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_unreachable_engine_stores_nothing() {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let engine =
    HttpWorkflowEngine::new(&format!("http://{}/apps", addr), Duration::from_secs(2)).unwrap();
  let service = service_with(
    Arc::new(engine),
    FixedProbe::new(ExperimentStatus::Running),
    &settings(),
  );

  let err = service.submit(example_params()).await.unwrap_err();

  match err {
    ExperimentError::Submission(e) => assert!(e.is_transport()),
    other => panic!("expected a transport error, got {:?}", other),
  }
  assert!(service.list_active().is_empty());
}

#[tokio::test]
async fn test_invalid_params_never_reach_engine() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  let params = SimulationParams {
    molecules: 0,
    temperature: 150,
    ..example_params()
  };
  let err = service.submit(params).await.unwrap_err();

  match err {
    ExperimentError::Validation(v) => {
      assert!(v.has("molecules"));
      assert!(v.has("temperature"));
      assert!(!v.has("simulation_end_time"));
    }
    other => panic!("expected a validation error, got {:?}", other),
  }
  assert!(engine.bodies().is_empty());
  assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_list_active_is_most_recent_first() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine, FixedProbe::new(ExperimentStatus::Running), &settings());

  let mut ids = Vec::new();
  for molecules in [10, 20, 30] {
    let params = SimulationParams {
      molecules,
      ..example_params()
    };
    ids.push(service.submit(params).await.unwrap().record.id);
  }

  let listed: Vec<String> = service.list_active().into_iter().map(|r| r.id).collect();
  ids.reverse();
  assert_eq!(listed, ids);

  let molecules: Vec<String> = service
    .list_active()
    .into_iter()
    .map(|r| r.molecules)
    .collect();
  assert_eq!(molecules, vec!["30", "20", "10"]);
}

#[tokio::test(start_paused = true)]
async fn test_experiments_expire_after_retention() {
  let mut settings = settings();
  settings.cache.retention_secs = 60;
  let service = service_with(
    FakeEngine::accepting(),
    FixedProbe::new(ExperimentStatus::Running),
    &settings,
  );

  let id = service.submit(example_params()).await.unwrap().record.id;
  tokio::time::advance(Duration::from_secs(61)).await;

  assert!(service.list_active().is_empty());
  assert!(matches!(service.get(&id), Err(ExperimentError::NotFound(_))));
  assert_eq!(service.check_status(&id).await, ExperimentStatus::Unknown);
}

#[tokio::test]
async fn test_check_status_unknown_for_missing_id() {
  let probe = FixedProbe::new(ExperimentStatus::Finished);
  let service = service_with(FakeEngine::accepting(), probe.clone(), &settings());

  assert_eq!(service.check_status("42").await, ExperimentStatus::Unknown);
  assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_check_status_marks_finished() {
  let probe = FixedProbe::new(ExperimentStatus::Finished);
  let service = service_with(FakeEngine::accepting(), probe.clone(), &settings());

  let id = service.submit(example_params()).await.unwrap().record.id;

  assert_eq!(service.check_status(&id).await, ExperimentStatus::Finished);
  assert!(service.get(&id).unwrap().is_finished());

  // Finished is final; no further probes are needed.
  assert_eq!(service.check_status(&id).await, ExperimentStatus::Finished);
  assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn test_check_status_running_while_artifact_missing() {
  let probe = FixedProbe::new(ExperimentStatus::Running);
  let service = service_with(FakeEngine::accepting(), probe.clone(), &settings());

  let id = service.submit(example_params()).await.unwrap().record.id;

  assert_eq!(service.check_status(&id).await, ExperimentStatus::Running);
  assert_eq!(service.get(&id).unwrap().status, ExperimentStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_auto_watch_finishes_in_background() {
  let mut settings = Settings::default();
  settings.poll.auto_watch = true;
  let probe = FixedProbe::new(ExperimentStatus::Finished);
  let service = service_with(FakeEngine::accepting(), probe, &settings);

  let id = service.submit(example_params()).await.unwrap().record.id;

  for _ in 0..10 {
    if service.get(&id).unwrap().is_finished() {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert!(service.get(&id).unwrap().is_finished());
  service.shutdown();
}

#[tokio::test]
async fn test_watch_unknown_experiment_is_not_found() {
  let service = service_with(
    FakeEngine::accepting(),
    FixedProbe::new(ExperimentStatus::Running),
    &settings(),
  );

  assert!(matches!(service.watch("7"), Err(ExperimentError::NotFound(_))));
  assert!(!service.stop_watching("7"));
}

#[tokio::test]
async fn test_watch_twice_is_reported() {
  let service = service_with(
    FakeEngine::accepting(),
    FixedProbe::new(ExperimentStatus::Running),
    &settings(),
  );
  let id = service.submit(example_params()).await.unwrap().record.id;

  assert!(service.watch(&id).unwrap());
  assert!(!service.watch(&id).unwrap());
  assert!(service.stop_watching(&id));
  service.shutdown();
}

#[tokio::test]
async fn test_submit_raw_rejects_placeholder() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  for body in ["", "   \n", RAW_WORKFLOW_PLACEHOLDER] {
    let err = service.submit_raw(body.to_string()).await.unwrap_err();
    match err {
      ExperimentError::Validation(v) => assert!(v.has("workflow")),
      other => panic!("expected a validation error, got {:?}", other),
    }
  }
  assert!(engine.bodies().is_empty());
}

#[tokio::test]
async fn test_submit_raw_forwards_body_verbatim() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  let body = r#"{"processes": [], "signals": [], "ins": [], "outs": []}"#;
  let submission = service.submit_raw(body.to_string()).await.unwrap();

  assert_eq!(submission.tracking_url, "http://engine.test/apps/1");
  assert_eq!(engine.bodies(), vec![body.to_string()]);
  assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_render_preview_does_not_submit() {
  let engine = FakeEngine::accepting();
  let service = service_with(engine.clone(), FixedProbe::new(ExperimentStatus::Running), &settings());

  let (filenames, description) = service.render_preview(&example_params()).unwrap();

  let run = description.process("run-cmd-md-simulation").unwrap();
  assert_eq!(run.config.executor.args[3], filenames.archive_filename);
  assert!(engine.bodies().is_empty());
  assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_from_settings_uses_template_path() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("workflow.json");
  std::fs::write(&path, "{{ missing_placeholder }}").unwrap();

  let mut settings = settings();
  settings.template_path = Some(path);
  let service = ExperimentService::from_settings(&settings).unwrap();

  // Strict rendering refuses the unknown placeholder.
  let err = service.render_preview(&example_params()).unwrap_err();
  assert!(matches!(err, ExperimentError::Template(_)));
}

#[tokio::test]
async fn test_from_settings_missing_template_fails() {
  let dir = tempfile::tempdir().unwrap();
  let mut settings = settings();
  settings.template_path = Some(dir.path().join("absent.json"));

  assert!(matches!(
    ExperimentService::from_settings(&settings),
    Err(ExperimentError::Template(_))
  ));
}
