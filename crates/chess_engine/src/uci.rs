//! UCI engine subprocess
//!
//! Speaks just enough of the Universal Chess Interface to get a move out of
//! an engine: the `uci`/`isready` handshake at startup, then one
//! `position` + `go movetime` exchange per request.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use shakmaty::uci::Uci;
use tracing::{debug, info, trace};

use crate::error::{EngineError, EngineResult};

/// A running UCI engine process
///
/// # Fields
///
/// - `path`: Binary the process was started from
/// - `movetime`: Search budget sent with every `go` command
pub struct UciEngine {
    path: PathBuf,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    movetime: Duration,
}

impl UciEngine {
    /// Start the engine and complete the UCI handshake
    ///
    /// # Errors
    ///
    /// - [`EngineError::Missing`] / [`EngineError::NotExecutable`] when the
    ///   binary cannot be run at all
    /// - [`EngineError::Terminated`] if the process exits during the handshake
    pub fn spawn(path: impl AsRef<Path>, movetime: Duration) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_executable(&path)?;

        let mut child = Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.clone(),
                source,
            })?;

        let stdin = BufWriter::new(
            child
                .stdin
                .take()
                .ok_or(EngineError::Pipe { stream: "stdin" })?,
        );
        let stdout = BufReader::new(
            child
                .stdout
                .take()
                .ok_or(EngineError::Pipe { stream: "stdout" })?,
        );

        let mut engine = Self {
            path,
            child,
            stdin,
            stdout,
            movetime,
        };

        engine.send("uci")?;
        engine.wait_for("uciok")?;
        engine.send("isready")?;
        engine.wait_for("readyok")?;

        info!(
            "[ENGINE] Ready: {} ({} ms per move)",
            engine.path.display(),
            engine.movetime.as_millis()
        );
        Ok(engine)
    }

    /// Search budget per move
    pub fn movetime(&self) -> Duration {
        self.movetime
    }

    /// Ask the engine for its move in the given game
    ///
    /// # Arguments
    ///
    /// * `start_fen` - Starting position, `None` for the standard one
    /// * `moves` - Moves played from the start, in UCI notation
    ///
    /// # Returns
    ///
    /// The engine's `bestmove`, still unresolved against any position.
    pub fn best_move(&mut self, start_fen: Option<&str>, moves: &[String]) -> EngineResult<Uci> {
        let mut command = match start_fen {
            Some(fen) => format!("position fen {fen}"),
            None => "position startpos".to_string(),
        };
        if !moves.is_empty() {
            command.push_str(" moves ");
            command.push_str(&moves.join(" "));
        }
        self.send(&command)?;
        self.send(&format!("go movetime {}", self.movetime.as_millis()))?;

        let line = self.wait_for_prefix("bestmove")?;
        let token = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| EngineError::Protocol {
                message: format!("bare bestmove line: {line:?}"),
            })?;
        if token == "(none)" {
            return Err(EngineError::Protocol {
                message: "engine has no move in this position".to_string(),
            });
        }
        let uci = Uci::from_ascii(token.as_bytes()).map_err(|err| EngineError::Protocol {
            message: format!("invalid bestmove {token:?}: {err}"),
        })?;
        debug!("[ENGINE] bestmove {}", uci);
        Ok(uci)
    }

    fn send(&mut self, command: &str) -> EngineResult<()> {
        trace!("engine <- {}", command);
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, expected: &'static str) -> EngineResult<String> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Terminated { expected });
        }
        trace!("engine -> {}", line.trim_end());
        Ok(line)
    }

    fn wait_for(&mut self, expected: &'static str) -> EngineResult<()> {
        loop {
            if self.read_line(expected)?.trim() == expected {
                return Ok(());
            }
        }
    }

    fn wait_for_prefix(&mut self, expected: &'static str) -> EngineResult<String> {
        loop {
            let line = self.read_line(expected)?;
            if line.trim_start().starts_with(expected) {
                return Ok(line.trim().to_string());
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let _ = self.child.wait();
    }
}

fn ensure_executable(path: &Path) -> EngineResult<()> {
    let metadata = std::fs::metadata(path).map_err(|_| EngineError::Missing {
        path: path.to_path_buf(),
    })?;
    if !metadata.is_file() {
        return Err(EngineError::NotExecutable {
            path: path.to_path_buf(),
        });
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(EngineError::NotExecutable {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_binary_is_reported() {
        //! A path that does not exist must fail before anything is spawned
        let temp_dir = TempDir::new().unwrap();
        let result = UciEngine::spawn(temp_dir.path().join("engine"), Duration::from_secs(1));
        assert!(matches!(result, Err(EngineError::Missing { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_binary_is_reported() {
        //! A plain data file is not an engine
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine");
        std::fs::write(&path, "not an engine").unwrap();

        let result = UciEngine::spawn(&path, Duration::from_secs(1));
        assert!(matches!(result, Err(EngineError::NotExecutable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_best_move_from_scripted_engine() {
        //! Handshake and one search against a shell script posing as an engine
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             while read line; do\n\
               case \"$line\" in\n\
                 uci) echo 'id name scripted'; echo 'uciok' ;;\n\
                 isready) echo 'readyok' ;;\n\
                 go*) echo 'info depth 1 score cp 20'; echo 'bestmove e7e5 ponder g1f3' ;;\n\
                 quit) exit 0 ;;\n\
               esac\n\
             done\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = UciEngine::spawn(&path, Duration::from_millis(50)).unwrap();
        let reply = engine.best_move(None, &["e2e4".to_string()]).unwrap();
        assert_eq!(reply.to_string(), "e7e5");
        assert_eq!(engine.movetime(), Duration::from_millis(50));
    }
}
