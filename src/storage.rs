use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// The session cookie kept between CLI invocations. Tasks are never stored.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        SessionFile { path: path.into() }
    }

    /// Resolves the session file path in the following order:
    /// 1. `TODUST_SESSION` environment variable.
    /// 2. `session_file` from the config.
    /// 3. `~/.local/share/todust/session` (on Linux).
    pub fn resolve(cfg: &Config) -> Self {
        if let Ok(p) = std::env::var("TODUST_SESSION") {
            return Self::at(p);
        }
        if let Some(p) = &cfg.session_file {
            return Self::at(p);
        }
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("todust");
        p.push("session");
        Self::at(p)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` if the file does not exist, cannot be read, or is blank.
    pub fn load(&self) -> Option<String> {
        let s = fs::read_to_string(&self.path).ok()?;
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }

    pub fn save(&self, cookie: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut opts = OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut f = opts.open(&self.path)?;
        f.write_all(cookie.as_bytes())?;
        Ok(())
    }

    pub fn clear(&self) -> std::io::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
