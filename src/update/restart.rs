//! Swap-and-restart after an update has been downloaded.
//!
//! Best effort and not atomic: a crash between removing the old executable and
//! moving the new one into place leaves no executable behind. The running
//! process cannot replace its own image on every platform, so packaged
//! installs hand the swap to a small script that waits for this process to
//! exit.

use crate::error::{Result, UpdateError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const SCRIPT_NAME: &str = "chan-dl-update.bat";
#[cfg(not(windows))]
const SCRIPT_NAME: &str = "chan-dl-update.sh";

/// How to get from the running instance to the updated one
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestartPlan {
    /// Launch `script`, which waits for this process, replaces `executable`
    /// with `replacement` and relaunches it
    DeferredReplace {
        /// Generated script
        script: PathBuf,
        /// Executable being replaced
        executable: PathBuf,
        /// Downloaded replacement
        replacement: PathBuf,
    },
    /// Re-execute the current executable with the same arguments
    Reexec {
        /// Executable to run
        executable: PathBuf,
        /// Arguments, excluding the program name
        args: Vec<OsString>,
    },
}

/// Quote `path` for `sh`: single quotes, with embedded `'` spliced as `'\''`
#[cfg(not(windows))]
fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// Body of the script that replaces `old` with `new` once `pid` has exited
#[cfg(not(windows))]
pub fn deferred_replace_script(old: &Path, new: &Path, pid: u32) -> String {
    let old = sh_quote(old);
    let new = sh_quote(new);
    format!(
        "#!/bin/sh\n\
         while kill -0 {pid} 2>/dev/null; do sleep 1; done\n\
         rm -f {old}\n\
         mv {new} {old}\n\
         chmod +x {old}\n\
         {old} >/dev/null 2>&1 &\n\
         rm -f -- \"$0\"\n"
    )
}

/// Body of the script that replaces `old` with `new` once `pid` has exited
#[cfg(windows)]
pub fn deferred_replace_script(old: &Path, new: &Path, pid: u32) -> String {
    let old = old.display();
    let new = new.display();
    format!(
        "@echo off\r\n\
         :wait\r\n\
         tasklist /FI \"PID eq {pid}\" 2>NUL | find \"{pid}\" >NUL\r\n\
         if not errorlevel 1 (\r\n\
         timeout /t 1 /nobreak >NUL\r\n\
         goto wait\r\n\
         )\r\n\
         del \"{old}\"\r\n\
         move /Y \"{new}\" \"{old}\"\r\n\
         start \"\" \"{old}\"\r\n\
         del \"%~f0\"\r\n"
    )
}

/// Write `body` as an executable script in `dir`
pub fn write_script(dir: &Path, body: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(SCRIPT_NAME);
    std::fs::write(&path, body)?;
    make_executable(&path)?;
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Prepare a packaged install: mark the replacement executable and write the
/// swap script next to it
pub fn prepare_deferred_replace(
    executable: &Path,
    replacement: &Path,
    pid: u32,
) -> Result<RestartPlan> {
    let restart_err = |e: std::io::Error| UpdateError::Restart(e.to_string());

    make_executable(replacement).map_err(restart_err)?;

    let dir = replacement.parent().unwrap_or_else(|| Path::new("."));
    let body = deferred_replace_script(executable, replacement, pid);
    let script = write_script(dir, &body).map_err(restart_err)?;
    tracing::debug!(script = %script.display(), "Restart script written");

    Ok(RestartPlan::DeferredReplace {
        script,
        executable: executable.to_path_buf(),
        replacement: replacement.to_path_buf(),
    })
}

/// Move a downloaded build over the running executable.
///
/// Unix keeps the running image alive through its open inode, so the rename
/// is safe while this process is still executing the old file.
pub fn install_in_place(executable: &Path, replacement: &Path) -> Result<()> {
    let restart_err = |e: std::io::Error| UpdateError::Restart(e.to_string());

    make_executable(replacement).map_err(restart_err)?;
    std::fs::rename(replacement, executable).map_err(restart_err)?;
    tracing::debug!(executable = %executable.display(), "New build moved into place");
    Ok(())
}

/// Prepare a source install: relaunch the same executable with the same arguments
pub fn prepare_reexec(executable: &Path) -> RestartPlan {
    RestartPlan::Reexec {
        executable: executable.to_path_buf(),
        args: std::env::args_os().skip(1).collect(),
    }
}

/// Carry out `plan` and terminate the current process.
///
/// Only returns if launching the next process failed.
pub fn execute(plan: RestartPlan) -> std::result::Result<(), UpdateError> {
    match plan {
        RestartPlan::DeferredReplace { script, .. } => {
            tracing::info!(script = %script.display(), "Handing over to restart script");
            spawn_script(&script).map_err(|e| UpdateError::Restart(e.to_string()))?;
            std::process::exit(0);
        }
        RestartPlan::Reexec { executable, args } => {
            tracing::info!(executable = %executable.display(), "Re-executing");
            let err = reexec(&executable, &args);
            Err(UpdateError::Restart(err.to_string()))
        }
    }
}

#[cfg(windows)]
fn spawn_script(script: &Path) -> std::io::Result<()> {
    std::process::Command::new("cmd")
        .arg("/C")
        .arg(script)
        .spawn()
        .map(|_| ())
}

#[cfg(not(windows))]
fn spawn_script(script: &Path) -> std::io::Result<()> {
    std::process::Command::new("sh")
        .arg(script)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
}

/// Replace the process image; returns only on failure
#[cfg(unix)]
fn reexec(executable: &Path, args: &[OsString]) -> std::io::Error {
    use std::os::unix::process::CommandExt;

    std::process::Command::new(executable).args(args).exec()
}

#[cfg(not(unix))]
fn reexec(executable: &Path, args: &[OsString]) -> std::io::Error {
    match std::process::Command::new(executable).args(args).spawn() {
        Ok(_) => std::process::exit(0),
        Err(e) => e,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn script_waits_for_pid_then_swaps() {
        let body = deferred_replace_script(
            Path::new("/opt/chan-dl/chan-dl"),
            Path::new("/opt/chan-dl/chan-dl.new"),
            4242,
        );

        assert!(body.contains("4242"));
        assert!(body.contains("/opt/chan-dl/chan-dl.new"));

        let wait = body.find("4242").unwrap();
        let swap = body.find("chan-dl.new").unwrap();
        assert!(wait < swap, "must wait for the old process before swapping");
    }

    #[cfg(unix)]
    #[test]
    fn script_quotes_shell_metacharacters_in_paths() {
        let body = deferred_replace_script(
            Path::new("/home/o'neil/$HOME/`id`/chan-dl"),
            Path::new("/home/o'neil/$HOME/`id`/chan-dl.new"),
            7,
        );

        assert!(body.contains(r"mv '/home/o'\''neil/$HOME/`id`/chan-dl.new' '/home/o'\''neil/$HOME/`id`/chan-dl'"));
        assert!(!body.contains("\"/home"));
    }

    #[cfg(unix)]
    #[test]
    fn install_in_place_replaces_executable_contents() {
        let temp_dir = TempDir::new().unwrap();
        let executable = temp_dir.path().join("chan-dl");
        let replacement = temp_dir.path().join("chan-dl.new");
        std::fs::write(&executable, b"old").unwrap();
        std::fs::write(&replacement, b"new").unwrap();

        install_in_place(&executable, &replacement).unwrap();

        assert_eq!(std::fs::read(&executable).unwrap(), b"new");
        assert!(!replacement.exists());

        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&executable).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn written_script_is_executable() {
        let temp_dir = TempDir::new().unwrap();

        let path = write_script(temp_dir.path(), "echo hi\n").unwrap();

        assert_eq!(path.parent().unwrap(), temp_dir.path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "echo hi\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn deferred_plan_points_at_generated_script() {
        let temp_dir = TempDir::new().unwrap();
        let executable = temp_dir.path().join("chan-dl");
        let replacement = temp_dir.path().join("chan-dl.new");
        std::fs::write(&replacement, b"new").unwrap();

        let plan = prepare_deferred_replace(&executable, &replacement, 1).unwrap();

        match plan {
            RestartPlan::DeferredReplace {
                script,
                executable: old,
                replacement: new,
            } => {
                assert!(script.is_file());
                assert_eq!(old, executable);
                assert_eq!(new, replacement);
                let body = std::fs::read_to_string(script).unwrap();
                assert!(body.contains(&replacement.display().to_string()));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn deferred_plan_fails_when_replacement_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nothing.new");

        let result = prepare_deferred_replace(&temp_dir.path().join("chan-dl"), &missing, 1);

        #[cfg(unix)]
        assert!(matches!(
            result,
            Err(crate::error::Error::Update(UpdateError::Restart(_)))
        ));
        #[cfg(not(unix))]
        assert!(result.is_ok());
    }

    #[test]
    fn reexec_plan_targets_same_executable() {
        let plan = prepare_reexec(Path::new("/src/target/debug/chan-dl"));

        match plan {
            RestartPlan::Reexec { executable, .. } => {
                assert_eq!(executable, PathBuf::from("/src/target/debug/chan-dl"));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }
}
