//! Pass-through to the `ollama` executable.

use std::io;
use std::process::Command;

use crate::error::{Error, Result};

/// Name of the executable commands are forwarded to.
pub const OLLAMA_EXECUTABLE: &str = "ollama";

/// Message reported when the executable is not on `PATH`.
pub const MISSING_EXECUTABLE: &str = "Could not find ollama executable in PATH.";

/// Runs `ollama` with `args`, inheriting stdio, and returns its exit code.
///
/// A child killed by a signal reports 1.
pub fn forward_to_ollama(args: &[String]) -> Result<i32> {
    forward_to(OLLAMA_EXECUTABLE, args)
}

fn forward_to(program: &str, args: &[String]) -> Result<i32> {
    match Command::new(program).args(args).status() {
        Ok(status) => Ok(status.code().unwrap_or(1)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(Error::not_found(MISSING_EXECUTABLE, None, None))
        }
        Err(err) => Err(Error::io(format!("failed to run {program}: {err}"), err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_not_found() {
        let err = forward_to("owllama-test-no-such-program", &[]).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(MISSING_EXECUTABLE));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_propagated() {
        assert_eq!(forward_to("true", &[]).unwrap(), 0);
        assert_eq!(forward_to("false", &[]).unwrap(), 1);
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        assert_eq!(forward_to("sh", &args).unwrap(), 3);
    }
}
