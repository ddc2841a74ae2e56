#![allow(dead_code)]

use std::io::{self, Write};
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use shipit_core::process::{ProcessError, ProcessRunner, Streams, SystemRunner};

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

/// Create a repository with a single commit at `path`.
pub fn init_repo(path: &Path) {
    std::fs::create_dir_all(path).unwrap();
    std::fs::write(path.join("README.md"), "# test\n").unwrap();
    for args in [
        &["init", "-q"][..],
        &["add", "README.md"][..],
        &[
            "-c",
            "user.name=shipit",
            "-c",
            "user.email=shipit@example.com",
            "commit",
            "-q",
            "-m",
            "initial",
        ][..],
    ] {
        let status = git_command()
            .args(args)
            .current_dir(path)
            .status()
            .expect("Failed to invoke git");
        assert!(status.success(), "git command failed: {:?}", args);
    }
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    /// Whether the last argument named an existing path when the call was made.
    pub last_arg_existed: bool,
}

/// Process runner double that records calls instead of spawning processes.
///
/// Programs listed in `failing` report a non-zero exit; programs listed in
/// `passthrough` are really executed.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Call>>,
    failing: Vec<String>,
    passthrough: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, program: &str) -> Self {
        self.failing.push(program.to_string());
        self
    }

    pub fn passthrough(mut self, program: &str) -> Self {
        self.passthrough.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.program).collect()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<(), ProcessError> {
        let last_arg_existed = args.last().is_some_and(|arg| Path::new(arg).exists());
        self.calls.lock().unwrap().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            last_arg_existed,
        });

        if self.failing.iter().any(|p| p == program) {
            return Err(ProcessError::Exit {
                program: program.to_string(),
                args: args.to_vec(),
                code: Some(1),
            });
        }
        if self.passthrough.iter().any(|p| p == program) {
            return SystemRunner.run(program, args, streams);
        }
        Ok(())
    }
}

/// Runner that fails the test when any process would be started.
#[derive(Debug, Default)]
pub struct ForbiddenRunner;

impl ProcessRunner for ForbiddenRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _streams: &mut Streams<'_>,
    ) -> Result<(), ProcessError> {
        panic!("unexpected process invocation: {program} {args:?}");
    }
}

/// Captured stdout/stderr for a single service call.
#[derive(Debug, Default)]
pub struct Captured {
    pub out: Vec<u8>,
    pub err: Vec<u8>,
}

impl Captured {
    pub fn streams(&mut self) -> Streams<'_> {
        Streams::new(&mut self.out, &mut self.err)
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

/// Sink whose every write fails, standing in for a closed stdout.
#[derive(Debug, Default)]
pub struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
