//! The compile pipeline run on every `init` and `update`.
//!
//! The input file is read, optionally piped through a shell command, and the
//! result is written to the output file or to stdout.

use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{WrapErr, bail, eyre};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Reads an entry point, transforms it and writes the result.
#[derive(Debug, Clone)]
pub struct Pipeline {
    input: Utf8PathBuf,
    output: Option<Utf8PathBuf>,
    command: Option<String>,
}

impl Pipeline {
    /// Creates a pipeline for `input`.
    pub const fn new(input: Utf8PathBuf, output: Option<Utf8PathBuf>, command: Option<String>) -> Self {
        Self {
            input,
            output,
            command,
        }
    }

    /// Returns the input path.
    pub fn input(&self) -> &Utf8Path {
        &self.input
    }

    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the command cannot be
    /// spawned or exits unsuccessfully, or the output cannot be written.
    pub async fn run(&self) -> color_eyre::Result<()> {
        let source = tokio::fs::read(&self.input)
            .await
            .wrap_err_with(|| format!("Failed to read {}", self.input))?;

        let compiled = match &self.command {
            Some(command) => run_command(command, source).await?,
            None => source,
        };

        if let Some(output) = &self.output {
            tokio::fs::write(output, &compiled)
                .await
                .wrap_err_with(|| format!("Failed to write {output}"))?;
            tracing::debug!(path = %output, bytes = compiled.len(), "Output written");
        } else {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&compiled).await?;
            stdout.flush().await?;
        }

        Ok(())
    }
}

/// Runs `command` through the platform shell with `input` on stdin.
async fn run_command(command: &str, input: Vec<u8>) -> color_eyre::Result<Vec<u8>> {
    let mut child = shell(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .wrap_err_with(|| format!("Failed to spawn `{command}`"))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| eyre!("stdin of `{command}` is not piped"))?;

    // Written concurrently so a command that fills its stdout pipe can't deadlock us.
    let writer = tokio::spawn(async move {
        stdin.write_all(&input).await?;
        stdin.shutdown().await
    });

    let output = child.wait_with_output().await?;

    match writer.await {
        Ok(Err(error)) if error.kind() != std::io::ErrorKind::BrokenPipe => {
            return Err(error).wrap_err_with(|| format!("Failed to write to `{command}`"));
        }
        Err(join_error) => return Err(eyre!("stdin writer failed: {join_error}")),
        Ok(_) => {}
    }

    if !output.status.success() {
        bail!("`{command}` exited with {}", output.status);
    }

    Ok(output.stdout)
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(contents: &str) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path").to_owned();
        let input = root.join("main.scss");
        std::fs::write(&input, contents).expect("write input");
        (dir, input)
    }

    #[tokio::test]
    async fn test_copies_input_without_command() {
        let (_dir, input) = fixture(".a { color: red; }");
        let output = input.with_file_name("main.css");

        Pipeline::new(input, Some(output.clone()), None)
            .run()
            .await
            .expect("pipeline");

        assert_eq!(
            std::fs::read_to_string(&output).expect("read output"),
            ".a { color: red; }"
        );
    }

    #[tokio::test]
    async fn test_missing_input_is_an_error() {
        let (_dir, input) = fixture("");
        let missing = input.with_file_name("missing.scss");

        let result = Pipeline::new(missing, None, None).run().await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_input_on_stdin() {
        let (_dir, input) = fixture("abc");
        let output = input.with_file_name("main.css");

        Pipeline::new(input, Some(output.clone()), Some("tr a-z A-Z".to_owned()))
            .run()
            .await
            .expect("pipeline");

        assert_eq!(std::fs::read_to_string(&output).expect("read output"), "ABC");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let (_dir, input) = fixture("abc");
        let output = input.with_file_name("main.css");

        let result = Pipeline::new(input, Some(output.clone()), Some("exit 3".to_owned()))
            .run()
            .await;

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
