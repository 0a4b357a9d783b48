use std::path::PathBuf;

use crate::config::WORKER_MEMORY_BYTES;

/// Reports how much memory the host can still hand out.
pub trait MemoryProbe: Send + Sync {
    /// Available bytes, `None` when unknown.
    fn available_bytes(&self) -> Option<u64>;
}

/// Reads `MemAvailable` from `/proc/meminfo`.
pub struct ProcMeminfo {
    path: PathBuf,
}

impl Default for ProcMeminfo {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/proc/meminfo"),
        }
    }
}

impl MemoryProbe for ProcMeminfo {
    fn available_bytes(&self) -> Option<u64> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        parse_mem_available(&contents)
    }
}

/// Fixed answer, for tests and hosts without `/proc`.
pub struct FixedMemory(pub Option<u64>);

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> Option<u64> {
        self.0
    }
}

fn parse_mem_available(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with("MemAvailable:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

/// `clamp(available / per_worker, 1, max)`; unknown memory allows `max`.
pub fn recommended_workers(available: Option<u64>, per_worker: u64, max: usize) -> usize {
    let max = max.max(1);
    match available {
        Some(bytes) if per_worker > 0 => {
            let fit = usize::try_from(bytes / per_worker).unwrap_or(usize::MAX);
            fit.clamp(1, max)
        }
        _ => max,
    }
}

pub fn recommended_for(probe: &dyn MemoryProbe, max: usize) -> usize {
    recommended_workers(probe.available_bytes(), WORKER_MEMORY_BYTES, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn worker_limit_follows_memory() {
        assert_eq!(recommended_workers(Some(GIB), 2 * GIB, 3), 1);
        assert_eq!(recommended_workers(Some(5 * GIB), 2 * GIB, 3), 2);
        assert_eq!(recommended_workers(Some(64 * GIB), 2 * GIB, 3), 3);
        assert_eq!(recommended_workers(None, 2 * GIB, 3), 3);
        assert_eq!(recommended_workers(Some(0), 2 * GIB, 0), 1);
    }

    #[test]
    fn parses_meminfo() {
        let sample = "MemTotal:       16314680 kB\nMemFree:         1022000 kB\nMemAvailable:    8157340 kB\n";
        assert_eq!(parse_mem_available(sample), Some(8_157_340 * 1024));
        assert_eq!(parse_mem_available("MemTotal: 1 kB\n"), None);
    }

    #[test]
    fn fixed_probe() {
        assert_eq!(recommended_for(&FixedMemory(Some(4 * GIB)), 8), 2);
        assert_eq!(recommended_for(&FixedMemory(None), 8), 8);
    }
}
