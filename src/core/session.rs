// This module provides the run session that accompanies one shader-analyzer invocation.
// RunSession records what the backend driver produced: how many platforms were
// processed, which files were written and how many bytes of ISA text they hold. The
// statistics are purely informational; the binary logs them at debug level once a
// generate run finishes. Keeping them in one place lets the integration tests assert
// on what a run did without scanning the output directory.

//! Run statistics for a generate pass.

use std::fmt;
use std::path::{Path, PathBuf};

/// Session for a single generate run.
#[derive(Debug, Default)]
pub struct RunSession {
    stats: SessionStats,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a platform's ISA was written to `path`.
    pub fn record_platform_written(&mut self, platform: &str, path: &Path, isa_size: usize) {
        let stats = &mut self.stats;
        stats.platforms_processed += 1;
        stats.isa_bytes_written += isa_size;
        stats.files_written.push(path.to_path_buf());

        if stats.largest_isa_size < isa_size {
            stats.largest_isa_size = isa_size;
            stats.largest_isa_platform = platform.to_string();
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn into_stats(self) -> SessionStats {
        self.stats
    }
}

/// Generate run statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Number of platforms whose ISA was written.
    pub platforms_processed: usize,

    /// Output files in the order they were written.
    pub files_written: Vec<PathBuf>,

    /// Total ISA text written (bytes).
    pub isa_bytes_written: usize,

    pub largest_isa_size: usize,
    pub largest_isa_platform: String,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generate Session Statistics:")?;
        writeln!(f, "  Platforms processed: {}", self.platforms_processed)?;
        writeln!(f, "  ISA text written: {} bytes", self.isa_bytes_written)?;

        if !self.largest_isa_platform.is_empty() {
            writeln!(f, "  Largest output: {} ({} bytes)",
                    self.largest_isa_platform, self.largest_isa_size)?;
        }

        for path in &self.files_written {
            writeln!(f, "    {}", path.display())?;
        }

        Ok(())
    }
}
