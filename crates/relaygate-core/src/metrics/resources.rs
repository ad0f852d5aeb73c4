//! Process resource readings (resident memory) via sysinfo.

use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub memory_bytes: u64,
}

pub struct ResourceSampler {
    system: System,
    pid: Option<Pid>,
}

impl ResourceSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot determine own pid, memory readings disabled: {}", e);
                None
            },
        };
        Self { system: System::new(), pid }
    }

    pub fn sample(&mut self) -> ResourceUsage {
        let Some(pid) = self.pid else {
            return ResourceUsage::default();
        };
        self.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
        let memory_bytes = self.system.process(pid).map_or(0, sysinfo::Process::memory);
        ResourceUsage { memory_bytes }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reads_own_process() {
        let mut sampler = ResourceSampler::new();
        let usage = sampler.sample();
        let visible = sampler.pid.is_some_and(|pid| sampler.system.process(pid).is_some());
        if visible {
            assert!(usage.memory_bytes > 0);
        }
    }
}
