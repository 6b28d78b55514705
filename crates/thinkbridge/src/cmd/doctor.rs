use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use thinkbridge_transport::{Endpoint, HomeDir};

use crate::cmd::resolve::{is_socket, path_exists};
use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[cfg(unix)]
const SOCKET_KIND: &str = "unix domain socket";
#[cfg(windows)]
const SOCKET_KIND: &str = "named pipe";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let checks = collect_checks(endpoint);
    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);

    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };
    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

/// Each check runs only when the ones it depends on passed.
fn collect_checks<H: HomeDir>(endpoint: &Endpoint<H>) -> Vec<CheckResult> {
    let mut checks = vec![platform_transport_check(), home_dir_check(endpoint)];

    let path = match endpoint.resolve() {
        Ok(path) => path,
        Err(err) => {
            checks.push(CheckResult::new("socket_path", CheckStatus::Fail, err.to_string()));
            for name in ["socket_present", "socket_type", "backend_connect"] {
                checks.push(CheckResult::new(name, CheckStatus::Skip, "no socket path"));
            }
            return checks;
        }
    };
    checks.push(CheckResult::new(
        "socket_path",
        CheckStatus::Pass,
        path.display().to_string(),
    ));

    if !path_exists(&path) {
        checks.push(CheckResult::new(
            "socket_present",
            CheckStatus::Fail,
            "nothing at socket path; is the Think app running?",
        ));
        checks.push(CheckResult::new("socket_type", CheckStatus::Skip, "socket missing"));
        checks.push(CheckResult::new("backend_connect", CheckStatus::Skip, "socket missing"));
        return checks;
    }
    checks.push(CheckResult::new("socket_present", CheckStatus::Pass, "found"));

    if !is_socket(&path) {
        checks.push(CheckResult::new(
            "socket_type",
            CheckStatus::Fail,
            "path exists but is not a socket",
        ));
        checks.push(CheckResult::new("backend_connect", CheckStatus::Skip, "not a socket"));
        return checks;
    }
    checks.push(CheckResult::new("socket_type", CheckStatus::Pass, SOCKET_KIND));

    checks.push(connect_check(&path));
    checks
}

fn home_dir_check<H: HomeDir>(endpoint: &Endpoint<H>) -> CheckResult {
    let home = match endpoint {
        Endpoint::Explicit(_) => {
            return CheckResult::new("home_dir", CheckStatus::Skip, "socket path set explicitly")
        }
        Endpoint::Home(home) => home,
    };
    match home.home_dir() {
        Some(dir) if dir.is_absolute() => {
            CheckResult::new("home_dir", CheckStatus::Pass, dir.display().to_string())
        }
        Some(dir) => CheckResult::new(
            "home_dir",
            CheckStatus::Fail,
            format!("not absolute: {}", dir.display()),
        ),
        None => CheckResult::new("home_dir", CheckStatus::Fail, "cannot determine home directory"),
    }
}

fn platform_transport_check() -> CheckResult {
    #[cfg(unix)]
    {
        CheckResult::new(
            "platform_transport",
            CheckStatus::Pass,
            "Unix domain sockets available",
        )
    }

    #[cfg(windows)]
    {
        CheckResult::new(
            "platform_transport",
            CheckStatus::Pass,
            "Windows named pipes available",
        )
    }
}

#[cfg(unix)]
fn connect_check(path: &std::path::Path) -> CheckResult {
    match thinkbridge_transport::UnixDomainSocket::connect(path) {
        Ok(_stream) => CheckResult::new("backend_connect", CheckStatus::Pass, "connected"),
        Err(err) => CheckResult::new("backend_connect", CheckStatus::Fail, err.to_string()),
    }
}

#[cfg(windows)]
fn connect_check(path: &std::path::Path) -> CheckResult {
    match thinkbridge_transport::NamedPipe::connect(path) {
        Ok(_stream) => CheckResult::new("backend_connect", CheckStatus::Pass, "connected"),
        Err(err) => CheckResult::new("backend_connect", CheckStatus::Fail, err.to_string()),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHECK", "STATUS", "DETAIL"]);
            for c in &output.checks {
                table.add_row(vec![
                    c.name.to_string(),
                    status_text(c.status).to_string(),
                    c.detail.clone(),
                ]);
            }
            println!("{table}");
            println!("overall: {}", output.overall);
        }
        OutputFormat::Pretty => {
            println!("thinkbridge doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<20} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => println!("{}", output.overall),
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Skip => "SKIP",
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;

    use thinkbridge_transport::{FixedHome, UnixDomainSocket};

    use super::*;

    struct NoHome;

    impl HomeDir for NoHome {
        fn home_dir(&self) -> Option<PathBuf> {
            None
        }
    }

    fn status_of(checks: &[CheckResult], name: &str) -> CheckStatus {
        checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status)
            .unwrap_or_else(|| panic!("missing check {name}"))
    }

    fn scratch_home(tag: &str) -> PathBuf {
        let home = PathBuf::from(format!("/tmp/tb-doc-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(home.join(".think")).unwrap();
        home
    }

    #[test]
    fn missing_home_fails_and_skips_the_rest() {
        let checks = collect_checks(&Endpoint::Home(NoHome));

        assert_eq!(status_of(&checks, "home_dir"), CheckStatus::Fail);
        assert_eq!(status_of(&checks, "socket_path"), CheckStatus::Fail);
        assert_eq!(status_of(&checks, "backend_connect"), CheckStatus::Skip);
    }

    #[test]
    fn missing_socket_fails_presence() {
        let home = scratch_home("missing");
        let checks = collect_checks(&Endpoint::Home(FixedHome(home.clone())));

        assert_eq!(status_of(&checks, "home_dir"), CheckStatus::Pass);
        assert_eq!(status_of(&checks, "socket_path"), CheckStatus::Pass);
        assert_eq!(status_of(&checks, "socket_present"), CheckStatus::Fail);
        assert_eq!(status_of(&checks, "socket_type"), CheckStatus::Skip);

        std::fs::remove_dir_all(&home).unwrap();
    }

    #[test]
    fn regular_file_fails_socket_type() {
        let home = scratch_home("file");
        std::fs::write(home.join(".think").join("native.sock"), b"").unwrap();
        let checks = collect_checks(&Endpoint::Home(FixedHome(home.clone())));

        assert_eq!(status_of(&checks, "socket_present"), CheckStatus::Pass);
        assert_eq!(status_of(&checks, "socket_type"), CheckStatus::Fail);

        std::fs::remove_dir_all(&home).unwrap();
    }

    #[test]
    fn listening_socket_passes_everything() {
        let home = scratch_home("ok");
        let listener = UnixDomainSocket::bind(home.join(".think").join("native.sock")).unwrap();
        let checks = collect_checks(&Endpoint::Home(FixedHome(home.clone())));

        assert!(checks.iter().all(|c| c.status == CheckStatus::Pass));

        drop(listener);
        std::fs::remove_dir_all(&home).unwrap();
    }

    #[test]
    fn explicit_endpoint_skips_home_check() {
        let checks = collect_checks(&Endpoint::<NoHome>::Explicit(PathBuf::from(
            "/tmp/tb-doctor-none.sock",
        )));
        assert_eq!(status_of(&checks, "home_dir"), CheckStatus::Skip);
        assert_eq!(status_of(&checks, "socket_present"), CheckStatus::Fail);
    }

    #[test]
    fn output_serializes_overall_status() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }
}
