// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The session banner written when a sink is registered.

use std::path::Path;
use std::path::PathBuf;

use sysinfo::ProcessRefreshKind;
use sysinfo::ProcessesToUpdate;
use sysinfo::System;
use sysinfo::Users;

const DIVIDER: &str = "------------------------------------------------------------";
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Process and host facts recorded at the start of a log session.
#[derive(Debug, Clone)]
pub struct SessionBanner {
    pub timestamp: String,
    pub path: PathBuf,
    pub working_directory: PathBuf,
    pub os: String,
    pub arch: String,
    pub os_version: Option<String>,
    pub runtime: String,
    pub pid: u32,
    pub uptime_secs: u64,
    pub user: String,
    pub host: String,
    pub total_memory: u64,
    pub free_memory: u64,
}

impl SessionBanner {
    /// Collect the banner facts for a session logging to `path`.
    pub fn collect(path: &Path, timestamp: String) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        let pid = sysinfo::get_current_pid().ok();
        if let Some(pid) = pid {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::everything(),
            );
        }
        let process = pid.and_then(|pid| sys.process(pid));

        let users = Users::new_with_refreshed_list();
        let user = process
            .and_then(|p| p.user_id())
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|u| u.name().to_string())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            timestamp,
            path: path.to_path_buf(),
            working_directory: std::env::current_dir().unwrap_or_default(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            os_version: System::long_os_version(),
            runtime: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            pid: std::process::id(),
            uptime_secs: process.map(|p| p.run_time()).unwrap_or_default(),
            user,
            host: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            total_memory: sys.total_memory(),
            free_memory: sys.free_memory(),
        }
    }

    /// Render the banner block, ending with a newline.
    pub fn render(&self) -> String {
        let platform = match &self.os_version {
            Some(version) => format!("platform: {} ({}) {version}", self.os, self.arch),
            None => format!("platform: {} ({})", self.os, self.arch),
        };
        let lines = [
            String::new(),
            String::new(),
            DIVIDER.to_string(),
            format!("[{}] new session started", self.timestamp),
            format!("log file: {}", self.path.display()),
            format!("working directory: {}", self.working_directory.display()),
            platform,
            format!("runtime: {}", self.runtime),
            format!("pid: {}", self.pid),
            format!("uptime: {}s", self.uptime_secs),
            format!("user: {}@{}", self.user, self.host),
            format!(
                "total memory: {} bytes ({:.2} GB)",
                self.total_memory,
                self.total_memory as f64 / BYTES_PER_GB
            ),
            format!(
                "free memory: {} bytes ({:.2} GB)",
                self.free_memory,
                self.free_memory as f64 / BYTES_PER_GB
            ),
            DIVIDER.to_string(),
        ];

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_field_order() {
        let banner = SessionBanner {
            timestamp: "2024-05-01 10:00:00.000".to_string(),
            path: PathBuf::from("x.log"),
            working_directory: PathBuf::from("/srv/app"),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            os_version: None,
            runtime: "logflush 0.1.0".to_string(),
            pid: 42,
            uptime_secs: 3,
            user: "svc".to_string(),
            host: "box".to_string(),
            total_memory: 2 * 1024 * 1024 * 1024,
            free_memory: 512 * 1024 * 1024,
        };

        let expected = format!(
            "\n\n{DIVIDER}\n\
             [2024-05-01 10:00:00.000] new session started\n\
             log file: x.log\n\
             working directory: /srv/app\n\
             platform: linux (x86_64)\n\
             runtime: logflush 0.1.0\n\
             pid: 42\n\
             uptime: 3s\n\
             user: svc@box\n\
             total memory: 2147483648 bytes (2.00 GB)\n\
             free memory: 536870912 bytes (0.50 GB)\n\
             {DIVIDER}\n"
        );
        assert_eq!(banner.render(), expected);
    }

    #[test]
    fn test_collect_current_process() {
        let banner = SessionBanner::collect(Path::new("app.log"), "now".to_string());
        assert_eq!(banner.pid, std::process::id());
        assert_eq!(banner.os, std::env::consts::OS);
        assert!(banner.render().contains("log file: app.log"));
    }
}
