//! Docker-based provisioner
//!
//! Runs the Ansible runner image once per deployment:
//! - Deployment fields are passed as environment variables
//! - The playbook workspace is mounted at /ansible
//! - The host kube config is mounted read-only when a home dir is configured

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bridge_core::domain::Deployment;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{ProvisionError, ProvisionOutcome, Provisioner};
use crate::config::ProvisionerConfig;

/// Upper bound on removing a leftover runner container
const REMOVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Provisioner that shells out to `docker run`
pub struct DockerProvisioner {
    config: ProvisionerConfig,
}

impl DockerProvisioner {
    pub fn new(config: ProvisionerConfig) -> Self {
        Self { config }
    }

    /// Builds the `docker` arguments for a deployment
    pub fn command_args(&self, deployment: &Deployment) -> Result<Vec<String>, ProvisionError> {
        let workspace = self
            .config
            .workspace_dir
            .as_ref()
            .ok_or(ProvisionError::NotConfigured("PROVISIONER_WORKSPACE_DIR"))?;

        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container_name(deployment),
        ];

        let env = [
            ("DEPLOYMENT_ID", deployment.id.to_string()),
            ("DOCKER_IMAGE", deployment.docker_image.clone()),
            ("DOMAIN", deployment.domain.clone()),
            ("BRIDGE_SERVER_URL", self.config.callback_url.clone()),
            ("ENV_CONFIG", deployment.env_config.clone()),
        ];
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push("-v".to_string());
        args.push(format!("{}:/ansible", workspace.display()));

        match &self.config.host_home_dir {
            Some(home) => {
                args.push("-v".to_string());
                args.push(format!("{}:/root/.kube:ro", home.join(".kube").display()));
            }
            None => warn!(
                deployment_id = deployment.id,
                "HOST_HOME_DIR is not set, running without kube config mount"
            ),
        }

        args.extend([
            "-w".to_string(),
            "/ansible".to_string(),
            self.config.image.clone(),
            "ansible-playbook".to_string(),
            self.config.playbook.clone(),
            "-v".to_string(),
        ]);

        Ok(args)
    }

    /// Force-removes the runner container of a deployment
    ///
    /// Killing the local `docker run` client leaves the daemon-side container
    /// running, so timed out and cancelled runs end up here.
    async fn remove_container(&self, deployment: &Deployment) {
        let name = container_name(deployment);
        let mut command = Command::new(&self.config.docker_bin);
        command.args(["rm", "-f", name.as_str()]);

        match run_bounded(command, REMOVE_TIMEOUT).await {
            Ok(_) => info!(
                deployment_id = deployment.id,
                container = %name,
                "Runner container removed"
            ),
            Err(e) => warn!(
                deployment_id = deployment.id,
                container = %name,
                error = %e,
                "Failed to remove runner container"
            ),
        }
    }
}

#[async_trait]
impl Provisioner for DockerProvisioner {
    async fn provision(&self, deployment: &Deployment) -> Result<ProvisionOutcome, ProvisionError> {
        let args = self.command_args(deployment)?;

        debug!(
            deployment_id = deployment.id,
            "{} {}",
            self.config.docker_bin,
            redacted(&args)
        );

        let mut command = Command::new(&self.config.docker_bin);
        command.args(&args);

        let result = run_bounded(command, self.config.timeout).await;
        if let Err(ProvisionError::Timeout(_)) = &result {
            self.remove_container(deployment).await;
        }

        result
    }

    async fn cleanup(&self, deployment: &Deployment) {
        self.remove_container(deployment).await;
    }
}

fn container_name(deployment: &Deployment) -> String {
    format!("ansible-runner-{}", deployment.id)
}

/// Joins arguments for logging with `-e` values left out
fn redacted(args: &[String]) -> String {
    let mut out = Vec::with_capacity(args.len());
    let mut env_value = false;

    for arg in args {
        if env_value {
            let key = arg.split_once('=').map_or(arg.as_str(), |(key, _)| key);
            out.push(format!("{}=***", key));
        } else {
            out.push(arg.clone());
        }
        env_value = arg == "-e";
    }

    out.join(" ")
}

/// Runs a command to completion, killing it once `timeout` elapses
pub(crate) async fn run_bounded(
    mut command: Command,
    timeout: Duration,
) -> Result<ProvisionOutcome, ProvisionError> {
    command.kill_on_drop(true);
    let started = Instant::now();

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(ProvisionError::Spawn)?,
        Err(_) => return Err(ProvisionError::Timeout(timeout)),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{}{}", stdout, stderr);

    if !output.status.success() {
        return Err(ProvisionError::Failed {
            code: output.status.code(),
            output: combined,
        });
    }

    Ok(ProvisionOutcome {
        output: combined,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::domain::DeploymentStatus;
    use std::path::PathBuf;

    fn deployment() -> Deployment {
        let now = chrono::Utc::now();
        Deployment {
            id: 42,
            name: "api".to_string(),
            status: DeploymentStatus::Pending,
            docker_image: "img:1".to_string(),
            env_config: "{\"replicas\":2}".to_string(),
            domain: "api.example.com".to_string(),
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        }
    }

    fn configured() -> ProvisionerConfig {
        ProvisionerConfig {
            workspace_dir: Some(PathBuf::from("/srv/ansible")),
            host_home_dir: Some(PathBuf::from("/home/deployer")),
            callback_url: "http://bridge:8080".to_string(),
            ..ProvisionerConfig::default()
        }
    }

    #[test]
    fn test_command_args_carry_deployment_env() {
        let provisioner = DockerProvisioner::new(configured());
        let args = provisioner.command_args(&deployment()).unwrap();

        assert_eq!(&args[..4], &["run", "--rm", "--name", "ansible-runner-42"]);
        for expected in [
            "DEPLOYMENT_ID=42",
            "DOCKER_IMAGE=img:1",
            "DOMAIN=api.example.com",
            "BRIDGE_SERVER_URL=http://bridge:8080",
            "ENV_CONFIG={\"replicas\":2}",
        ] {
            let pos = args.iter().position(|a| a == expected).unwrap();
            assert_eq!(args[pos - 1], "-e");
        }
        assert!(args.contains(&"/srv/ansible:/ansible".to_string()));
        assert!(args.contains(&"/home/deployer/.kube:/root/.kube:ro".to_string()));
        assert_eq!(
            &args[args.len() - 6..],
            &[
                "-w",
                "/ansible",
                "ansible-runner:latest",
                "ansible-playbook",
                "playbooks/deploy-production.yml",
                "-v"
            ]
        );
    }

    #[test]
    fn test_kube_mount_is_omitted_without_home_dir() {
        let config = ProvisionerConfig {
            host_home_dir: None,
            ..configured()
        };
        let args = DockerProvisioner::new(config)
            .command_args(&deployment())
            .unwrap();

        assert!(!args.iter().any(|a| a.contains(".kube")));
    }

    #[tokio::test]
    async fn test_unconfigured_workspace_is_refused() {
        let provisioner = DockerProvisioner::new(ProvisionerConfig::default());
        let result = provisioner.provision(&deployment()).await;

        assert!(matches!(
            result,
            Err(ProvisionError::NotConfigured("PROVISIONER_WORKSPACE_DIR"))
        ));
    }

    #[tokio::test]
    async fn test_provision_success_and_failure_exit() {
        let ok = DockerProvisioner::new(ProvisionerConfig {
            docker_bin: "true".to_string(),
            ..configured()
        });
        assert!(ok.provision(&deployment()).await.is_ok());

        let failing = DockerProvisioner::new(ProvisionerConfig {
            docker_bin: "false".to_string(),
            ..configured()
        });
        assert!(matches!(
            failing.provision(&deployment()).await,
            Err(ProvisionError::Failed { code: Some(1), .. })
        ));
    }

    #[tokio::test]
    async fn test_run_bounded_captures_combined_output() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err >&2; exit 3"]);

        match run_bounded(command, Duration::from_secs(5)).await {
            Err(ProvisionError::Failed { code, output }) => {
                assert_eq!(code, Some(3));
                assert!(output.contains("out"));
                assert!(output.contains("err"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_bounded_times_out() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let result = run_bounded(command, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(ProvisionError::Timeout(_))));
    }

    #[test]
    fn test_logged_command_hides_env_values() {
        let args = DockerProvisioner::new(configured())
            .command_args(&deployment())
            .unwrap();
        let logged = redacted(&args);

        assert!(logged.starts_with("run --rm --name ansible-runner-42 -e DEPLOYMENT_ID=***"));
        assert!(logged.contains("-e ENV_CONFIG=***"));
        assert!(!logged.contains("replicas"));
        assert!(logged.contains("/srv/ansible:/ansible"));
    }

    /// Writes an executable stand-in for the docker CLI that appends its
    /// arguments to `calls` and hangs on `run`
    #[cfg(unix)]
    fn fake_docker(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let calls = dir.join("calls");
        let bin = dir.join("docker");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> {}\nif [ \"$1\" = run ]; then sleep 5; fi\n",
            calls.display()
        );
        std::fs::write(&bin, script).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        (bin, calls)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_removes_runner_container() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, calls) = fake_docker(dir.path());

        let provisioner = DockerProvisioner::new(ProvisionerConfig {
            docker_bin: bin.display().to_string(),
            timeout: Duration::from_millis(300),
            ..configured()
        });

        let result = provisioner.provision(&deployment()).await;
        assert!(matches!(result, Err(ProvisionError::Timeout(_))));

        let calls = std::fs::read_to_string(calls).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert!(lines[0].starts_with("run --rm --name ansible-runner-42"));
        assert_eq!(lines.last(), Some(&"rm -f ansible-runner-42"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cleanup_removes_runner_container() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, calls) = fake_docker(dir.path());

        let provisioner = DockerProvisioner::new(ProvisionerConfig {
            docker_bin: bin.display().to_string(),
            ..configured()
        });
        provisioner.cleanup(&deployment()).await;

        let calls = std::fs::read_to_string(calls).unwrap();
        assert_eq!(calls.trim(), "rm -f ansible-runner-42");
    }

    #[tokio::test]
    async fn test_run_bounded_spawn_failure() {
        let command = Command::new("nonexistent_provisioner_12345");

        let result = run_bounded(command, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ProvisionError::Spawn(_))));
    }
}
