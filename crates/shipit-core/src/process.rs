//! External process execution.
//!
//! Every side effect that leaves the local filesystem goes through
//! [`ProcessRunner`]: `git`, `scp` and `ssh` are invoked as child processes
//! with structured argument lists, never as shell strings.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Output sinks that receive a child's stdout and stderr.
pub struct Streams<'a> {
    pub out: &'a mut (dyn Write + Send),
    pub err: &'a mut (dyn Write + Send),
}

impl<'a> Streams<'a> {
    pub fn new(out: &'a mut (dyn Write + Send), err: &'a mut (dyn Write + Send)) -> Self {
        Self { out, err }
    }
}

/// Failure to run an external program to a successful exit.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program} {args:?}")]
    Spawn {
        program: String,
        args: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("{program} {args:?} failed: {}", describe_exit(.code))]
    Exit {
        program: String,
        args: Vec<String>,
        /// Exit code, `None` when the child was terminated by a signal.
        code: Option<i32>,
    },

    #[error("failed to relay output of {program}")]
    Relay {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Name of the program that failed.
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. }
            | Self::Exit { program, .. }
            | Self::Relay { program, .. } => program,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Runs an external program to completion.
///
/// Implementations block until the child exits and return `Ok(())` only for
/// a zero exit status. No retries, timeouts or output parsing.
pub trait ProcessRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<(), ProcessError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(
        &self,
        program: &str,
        args: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<(), ProcessError> {
        (**self).run(program, args, streams)
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<(), ProcessError> {
        tracing::debug!(program, ?args, "spawning process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                args: args.to_vec(),
                source,
            })?;

        let child_out = child.stdout.take();
        let child_err = child.stderr.take();
        let out: &mut (dyn Write + Send) = &mut *streams.out;
        let err: &mut (dyn Write + Send) = &mut *streams.err;

        // Both pipes must be drained concurrently or the child can stall.
        let relayed = std::thread::scope(|scope| {
            let err_relay = scope.spawn(move || relay(child_err, err));
            let out_result = relay(child_out, out);
            let err_result = err_relay
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stderr relay panicked")));
            out_result.and(err_result)
        });

        let status = child.wait().map_err(|source| ProcessError::Relay {
            program: program.to_string(),
            source,
        })?;
        relayed.map_err(|source| ProcessError::Relay {
            program: program.to_string(),
            source,
        })?;

        if !status.success() {
            return Err(ProcessError::Exit {
                program: program.to_string(),
                args: args.to_vec(),
                code: status.code(),
            });
        }

        tracing::debug!(program, "process exited successfully");
        Ok(())
    }
}

fn relay<R: Read>(pipe: Option<R>, sink: &mut (dyn Write + Send)) -> io::Result<()> {
    if let Some(mut pipe) = pipe {
        io::copy(&mut pipe, sink)?;
        sink.flush()?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn relays_stdout_and_stderr_to_sinks() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut streams = Streams::new(&mut out, &mut err);

        SystemRunner
            .run("sh", &args(&["-c", "echo hello; echo oops >&2"]), &mut streams)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
        assert_eq!(String::from_utf8(err).unwrap(), "oops\n");
    }

    #[test]
    fn non_zero_exit_is_an_error_with_code() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut streams = Streams::new(&mut out, &mut err);

        let result = SystemRunner.run("sh", &args(&["-c", "exit 3"]), &mut streams);

        match result {
            Err(ProcessError::Exit { program, code, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut streams = Streams::new(&mut out, &mut err);

        let result = SystemRunner.run("shipit-no-such-program", &[], &mut streams);

        let err = result.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(err.program(), "shipit-no-such-program");
    }
}
