// Process list probe backing the "paused, not stopped" heuristic

use sysinfo::System;

/// Looks for a running process by executable name
pub trait ProcessProbe {
    fn is_running(&mut self, executable: &str) -> bool;
}

/// Probe backed by the OS process table
pub struct SystemProcesses {
    system: System,
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SystemProcesses {
    fn is_running(&mut self, executable: &str) -> bool {
        self.system.refresh_processes();
        // Exact, case-sensitive match
        self.system
            .processes()
            .values()
            .any(|process| process.name() == executable)
    }
}
