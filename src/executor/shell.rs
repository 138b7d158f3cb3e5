use async_trait::async_trait;

/// Output of a shell invocation. Failures of any kind are folded into
/// `output`; callers never see an error from this collaborator.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    pub output: String,
    pub exit_code: Option<i32>,
}

#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: Option<&str>) -> ShellOutput;
}

/// Runs commands through the platform shell. A non-zero exit code is
/// reported in the output, not raised; the action dispatcher logs it and
/// moves on.
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShellRunner for SystemShell {
    async fn run(&self, command: &str, cwd: Option<&str>) -> ShellOutput {
        tracing::info!(command = command, cwd = cwd.unwrap_or("default"), "shell command");

        #[cfg(target_os = "windows")]
        let mut builder = {
            let mut c = tokio::process::Command::new("cmd");
            c.args(["/C", command]);
            c
        };

        #[cfg(not(target_os = "windows"))]
        let mut builder = {
            let mut c = tokio::process::Command::new("sh");
            c.args(["-c", command]);
            c
        };

        if let Some(dir) = cwd {
            builder.current_dir(dir);
        }

        match builder.output().await {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let text = if !stdout.trim().is_empty() {
                    stdout.trim().to_string()
                } else if !stderr.trim().is_empty() {
                    stderr.trim().to_string()
                } else {
                    "Command executed (no output)".to_string()
                };
                ShellOutput {
                    output: text,
                    exit_code: output.status.code(),
                }
            }
            Err(e) => ShellOutput {
                output: format!("Shell spawn failed: {e}"),
                exit_code: None,
            },
        }
    }
}
