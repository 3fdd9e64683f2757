//! Runtime resource readings fed into the decision engine.

/// Source of live resource readings.
pub trait MetricsSource: Send + Sync {
    /// Free memory estimate in KiB.
    fn free_memory_kb(&self) -> f32;

    /// Remaining stack headroom in bytes, when the platform can tell. Logged only; it is
    /// not a decision input.
    fn stack_headroom_bytes(&self) -> Option<u64>;
}

/// Readings from `/proc` on Linux. Other platforms report zero free memory and no headroom.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMetrics;

impl MetricsSource for SystemMetrics {
    fn free_memory_kb(&self) -> f32 {
        match std::fs::read_to_string("/proc/meminfo") {
            Ok(text) => parse_meminfo_available_kb(&text).map(|kb| kb as f32).unwrap_or(0.0),
            Err(e) => {
                log::debug!("free memory unavailable: {e}");
                0.0
            }
        }
    }

    fn stack_headroom_bytes(&self) -> Option<u64> {
        let limits = std::fs::read_to_string("/proc/self/limits").ok()?;
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let limit = parse_stack_limit_bytes(&limits)?;
        let used = parse_status_kb(&status, "VmStk:")? * 1024;
        Some(limit.saturating_sub(used))
    }
}

/// Fixed readings, for tests and for pinning the decision inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub free_kb: f32,
    pub stack_headroom: Option<u64>,
}

impl MetricsSource for FixedMetrics {
    fn free_memory_kb(&self) -> f32 {
        self.free_kb
    }

    fn stack_headroom_bytes(&self) -> Option<u64> {
        self.stack_headroom
    }
}

pub(crate) fn parse_meminfo_available_kb(text: &str) -> Option<u64> {
    parse_status_kb(text, "MemAvailable:").or_else(|| parse_status_kb(text, "MemFree:"))
}

pub(crate) fn parse_status_kb(text: &str, key: &str) -> Option<u64> {
    text.lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}

pub(crate) fn parse_stack_limit_bytes(limits: &str) -> Option<u64> {
    let line = limits.lines().find(|l| l.starts_with("Max stack size"))?;
    let soft = line.trim_start_matches("Max stack size").split_whitespace().next()?;
    soft.parse().ok()
}
