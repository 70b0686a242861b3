use cloudship_cloud::client::{
    DeployError, EnsureOutcome, GcloudClient, RegistryError, ServiceStatus,
};
use cloudship_cloud::executor::CliExecutor;
use cloudship_cloud::tool::ToolError;
use cloudship_core::{ArtifactConfig, BuildContext, LookupPolicy, ServiceConfig};
use mockall::mock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

mock! {
    Executor {}

    impl CliExecutor for Executor {
        async fn exec(&self, args: &[String]) -> Result<String, ToolError>;
        async fn exec_streaming(&self, args: &[String]) -> Result<(), ToolError>;
    }
}

const BOLIVAR: &str = "test-bolivar-agendamiento";

fn context() -> BuildContext {
    BuildContext::new("my-proj", "us-east1", BOLIVAR, BOLIVAR, BOLIVAR, "latest").unwrap()
}

fn has(args: &[String], needle: &str) -> bool {
    args.iter().any(|a| a == needle)
}

fn is_describe(args: &[String]) -> bool {
    has(args, "repositories") && has(args, "describe")
}

fn is_create(args: &[String]) -> bool {
    has(args, "repositories") && has(args, "create")
}

fn failed(stderr: &str) -> ToolError {
    ToolError::CommandFailed {
        program: "gcloud",
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

fn not_found() -> ToolError {
    failed("ERROR: (gcloud.artifacts.repositories.describe) NOT_FOUND: Requested entity was not found.")
}

// ── Ensure Repository ──

#[tokio::test]
async fn existing_repository_is_not_recreated() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| is_describe(args))
        .times(1)
        .returning(|_| Ok(format!("projects/my-proj/locations/us-east1/repositories/{BOLIVAR}\n")));
    mock.expect_exec().withf(|args| is_create(args)).never();

    let client = GcloudClient::with_executor(mock);
    let outcome = client
        .ensure_repository(&context(), &ArtifactConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    assert!(!outcome.created());
}

#[tokio::test]
async fn absent_repository_is_created_as_docker() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| is_describe(args))
        .returning(|_| Err(not_found()));
    mock.expect_exec()
        .withf(|args| {
            is_create(args)
                && has(args, BOLIVAR)
                && args
                    .windows(2)
                    .any(|w| w[0] == "--repository-format" && w[1] == "DOCKER")
                && args
                    .windows(2)
                    .any(|w| w[0] == "--location" && w[1] == "us-east1")
                && args
                    .windows(2)
                    .any(|w| w[0] == "--description" && w[1] == "Docker repository")
        })
        .times(1)
        .returning(|_| Ok(String::new()));

    let client = GcloudClient::with_executor(mock);
    let outcome = client
        .ensure_repository(&context(), &ArtifactConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome, EnsureOutcome::Created);
}

#[tokio::test]
async fn ensure_repository_twice_creates_once() {
    let created = Arc::new(AtomicBool::new(false));
    let creates = Arc::new(AtomicUsize::new(0));
    let mut mock = MockExecutor::new();

    let seen = Arc::clone(&created);
    mock.expect_exec()
        .withf(|args| is_describe(args))
        .times(2)
        .returning(move |_| {
            if seen.load(Ordering::SeqCst) {
                Ok("repo\n".to_owned())
            } else {
                Err(not_found())
            }
        });

    let flag = Arc::clone(&created);
    let count = Arc::clone(&creates);
    mock.expect_exec()
        .withf(|args| is_create(args))
        .returning(move |_| {
            flag.store(true, Ordering::SeqCst);
            count.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        });

    let client = GcloudClient::with_executor(mock);
    let ctx = context();
    let artifact = ArtifactConfig::default();

    let first = client.ensure_repository(&ctx, &artifact).await.unwrap();
    let second = client.ensure_repository(&ctx, &artifact).await.unwrap();

    assert_eq!(first, EnsureOutcome::Created);
    assert_eq!(second, EnsureOutcome::AlreadyExists);
    assert_eq!(creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn strict_lookup_failure_aborts_without_create() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| is_describe(args))
        .returning(|_| Err(failed("ERROR: PERMISSION_DENIED: caller lacks permission")));
    mock.expect_exec().withf(|args| is_create(args)).never();

    let client = GcloudClient::with_executor(mock);
    let result = client
        .ensure_repository(&context(), &ArtifactConfig::default())
        .await;

    assert!(matches!(
        result,
        Err(RegistryError::Describe { ref repository, .. }) if repository == BOLIVAR
    ));
}

#[tokio::test]
async fn lenient_lookup_failure_attempts_create() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| is_describe(args))
        .returning(|_| Err(failed("ERROR: connection reset by peer")));
    mock.expect_exec()
        .withf(|args| is_create(args))
        .times(1)
        .returning(|_| Ok(String::new()));

    let artifact = ArtifactConfig {
        lookup: LookupPolicy::Lenient,
        ..ArtifactConfig::default()
    };
    let client = GcloudClient::with_executor(mock);
    let outcome = client.ensure_repository(&context(), &artifact).await.unwrap();

    assert!(outcome.created());
}

#[tokio::test]
async fn create_failure_is_fatal() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| is_describe(args))
        .returning(|_| Err(not_found()));
    mock.expect_exec()
        .withf(|args| is_create(args))
        .returning(|_| Err(failed("ERROR: RESOURCE_EXHAUSTED: quota exceeded")));

    let client = GcloudClient::with_executor(mock);
    let result = client
        .ensure_repository(&context(), &ArtifactConfig::default())
        .await;

    assert!(matches!(result, Err(RegistryError::Create { .. })));
}

#[tokio::test]
async fn configure_docker_targets_registry_host() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| has(args, "configure-docker") && has(args, "us-east1-docker.pkg.dev"))
        .times(1)
        .returning(|_| Ok(String::new()));

    let client = GcloudClient::with_executor(mock);
    client
        .configure_docker(&context().registry_host())
        .await
        .unwrap();
}

// ── Cloud Run ──

#[tokio::test]
async fn deploy_service_returns_url() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| {
            has(args, "run")
                && has(args, "deploy")
                && has(args, "--allow-unauthenticated")
                && args
                    .windows(2)
                    .any(|w| w[0] == "--platform" && w[1] == "managed")
                && args.windows(2).any(|w| {
                    w[0] == "--image"
                        && w[1] == "us-east1-docker.pkg.dev/my-proj/test-bolivar-agendamiento/test-bolivar-agendamiento:latest"
                })
        })
        .returning(|_| Ok("https://test-bolivar-agendamiento-abc123-ue.a.run.app\n".to_owned()));

    let client = GcloudClient::with_executor(mock);
    let url = client
        .deploy_service(&context(), &ServiceConfig::default())
        .await
        .unwrap();

    assert_eq!(url, "https://test-bolivar-agendamiento-abc123-ue.a.run.app");
}

#[tokio::test]
async fn deploy_service_can_require_auth() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| has(args, "--no-allow-unauthenticated") && !has(args, "--allow-unauthenticated"))
        .returning(|_| Ok("https://svc.a.run.app\n".to_owned()));

    let service = ServiceConfig {
        allow_unauthenticated: false,
        ..ServiceConfig::default()
    };
    let client = GcloudClient::with_executor(mock);

    assert!(client.deploy_service(&context(), &service).await.is_ok());
}

#[tokio::test]
async fn deploy_service_failure() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .returning(|_| Err(failed("revision failed to become ready")));

    let client = GcloudClient::with_executor(mock);
    let result = client
        .deploy_service(&context(), &ServiceConfig::default())
        .await;

    assert!(matches!(
        result,
        Err(DeployError::Deploy { ref service, .. }) if service == BOLIVAR
    ));
}

#[tokio::test]
async fn describe_service_parses_status() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| has(args, "services") && has(args, "describe") && has(args, "json"))
        .returning(|_| {
            Ok(r#"{
                "metadata": {"name": "api"},
                "status": {
                    "url": "https://api-xyz.a.run.app",
                    "latestReadyRevisionName": "api-00003-abc",
                    "conditions": [
                        {"type": "Ready", "status": "True"},
                        {"type": "RoutesReady", "status": "True"}
                    ]
                }
            }"#
            .to_owned())
        });

    let client = GcloudClient::with_executor(mock);
    let status = client
        .describe_service("api", "my-proj", "us-east1")
        .await
        .unwrap();

    assert_eq!(
        status,
        ServiceStatus {
            url: Some("https://api-xyz.a.run.app".to_owned()),
            latest_ready_revision: Some("api-00003-abc".to_owned()),
            ready: true,
        }
    );
}

#[tokio::test]
async fn describe_service_rejects_garbage() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_| Ok("not json".to_owned()));

    let client = GcloudClient::with_executor(mock);
    let result = client.describe_service("api", "my-proj", "us-east1").await;

    assert!(matches!(result, Err(DeployError::ParseStatus { .. })));
}

#[test]
fn service_without_conditions_is_not_ready() {
    let status = ServiceStatus::from_json(r#"{"status": {}}"#).unwrap();
    assert!(!status.ready);
    assert!(status.url.is_none());
}

// ── Doctor ──

#[tokio::test]
async fn doctor_all_checks_pass() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| args.len() == 1 && has(args, "version"))
        .returning(|_| Ok("Google Cloud SDK 495.0.0\nbq 2.1.8\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "account"))
        .returning(|_| Ok("dev@example.com\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "projects") && has(args, "describe"))
        .returning(|_| Ok("My Project\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "services") && has(args, "list"))
        .returning(|args| {
            let api = args
                .iter()
                .find_map(|a| a.strip_prefix("config.name="))
                .unwrap_or("");
            Ok(format!("{api}\n"))
        });

    let client = GcloudClient::with_executor(mock);
    let mut report = client.doctor(Some("my-proj")).await;
    report.docker = cloudship_cloud::CheckResult::ok("27.0.3");
    report.config_file = cloudship_cloud::CheckResult::ok("Found");

    assert_eq!(report.gcloud.detail, "495.0.0");
    assert_eq!(report.account.detail, "dev@example.com");
    assert_eq!(report.project.detail, "my-proj (My Project)");
    assert_eq!(report.apis.len(), 2);
    assert!(report.all_passed());
    assert!(report.to_string().contains("All checks passed."));
}

#[tokio::test]
async fn doctor_without_project_stops_after_account() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| has(args, "version"))
        .returning(|_| Ok("Google Cloud SDK 495.0.0\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "account"))
        .returning(|_| Ok("\n".to_owned()));

    let client = GcloudClient::with_executor(mock);
    let report = client.doctor(None).await;

    assert!(report.gcloud.passed);
    assert!(!report.account.passed);
    assert!(!report.project.passed);
    assert!(report.apis.is_empty());
    assert!(!report.all_passed());
}

#[tokio::test]
async fn doctor_reports_disabled_api() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|args| args.len() == 1 && has(args, "version"))
        .returning(|_| Ok("Google Cloud SDK 495.0.0\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "account"))
        .returning(|_| Ok("dev@example.com\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "projects") && has(args, "describe"))
        .returning(|_| Ok("My Project\n".to_owned()));
    mock.expect_exec()
        .withf(|args| has(args, "services") && has(args, "list"))
        .returning(|_| Ok("\n".to_owned()));

    let client = GcloudClient::with_executor(mock);
    let report = client.doctor(Some("my-proj")).await;

    assert!(report.apis.iter().all(|a| !a.result.passed));
    assert!(report.to_string().contains("[NG] Cloud Run"));
}
