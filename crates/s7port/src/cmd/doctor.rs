use serde::Serialize;

use crate::cmd::{open_backend, BackendArgs, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
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

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_backend_check(),
        library_source_check(&args.backend),
        library_load_check(&args.backend),
        command_table_check(),
        frame_limit_check(),
    ];

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

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let rows = output.checks.iter().map(|c| {
                vec![
                    status_text(c.status).to_string(),
                    c.name.clone(),
                    c.detail.clone(),
                ]
            });
            println!("{}", table(vec!["STATUS", "CHECK", "DETAIL"], rows));
        }
        OutputFormat::Pretty => {
            println!("s7port doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
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
        CheckStatus::Info => "INFO",
    }
}

fn platform_backend_check() -> CheckResult {
    if cfg!(unix) {
        CheckResult::new(
            "platform_backend",
            CheckStatus::Pass,
            "runtime library loading available",
        )
    } else {
        CheckResult::new(
            "platform_backend",
            CheckStatus::Fail,
            "no snap7 backend for this platform",
        )
    }
}

fn library_source_check(backend: &BackendArgs) -> CheckResult {
    let detail = match &backend.library {
        Some(path) => format!("{path} (--library / S7PORT_SNAP7_LIBRARY)"),
        None => format!("{} (default search path)", default_library()),
    };
    CheckResult::new("library_source", CheckStatus::Info, detail)
}

fn library_load_check(backend: &BackendArgs) -> CheckResult {
    match open_backend(backend) {
        Ok(_client) => CheckResult::new(
            "library_load",
            CheckStatus::Pass,
            "library loaded and client created",
        ),
        Err(err) => CheckResult::new("library_load", CheckStatus::Fail, err.to_string()),
    }
}

fn command_table_check() -> CheckResult {
    CheckResult::new(
        "command_table",
        CheckStatus::Info,
        format!("{} commands registered", s7port_command::COMMANDS.len()),
    )
}

fn frame_limit_check() -> CheckResult {
    CheckResult::new(
        "frame_limit",
        CheckStatus::Info,
        format!("{} bytes per frame", s7port_frame::MAX_PAYLOAD),
    )
}

#[cfg(unix)]
fn default_library() -> &'static str {
    s7port_client::snap7::DEFAULT_LIBRARY
}

#[cfg(not(unix))]
fn default_library() -> &'static str {
    "none"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }

    #[test]
    fn missing_library_fails_load_check() {
        let backend = BackendArgs {
            library: Some("/nonexistent/libsnap7.so".to_string()),
        };
        let check = library_load_check(&backend);
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(!check.detail.is_empty());
    }

    #[test]
    fn explicit_library_is_reported() {
        let backend = BackendArgs {
            library: Some("/opt/snap7/libsnap7.so".to_string()),
        };
        let check = library_source_check(&backend);
        assert!(check.detail.starts_with("/opt/snap7/libsnap7.so"));
    }
}
