//! Remediation strategy selection
//!
//! A strategy is an ordered list of remediation steps appropriate to a
//! privilege level and platform. Steps within one strategy execute strictly
//! sequentially; later steps may depend on effects of earlier ones.

use std::path::PathBuf;

use super::privilege::{Platform, PrivilegeLevel};
use super::step::RemediationStep;
use super::types::OptimizationKind;

/// Ordered list of steps selected for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationStrategy {
    /// Strategy name for logs and run messages
    pub name: String,
    pub steps: Vec<RemediationStep>,
}

impl RemediationStrategy {
    fn new(name: impl Into<String>, steps: Vec<RemediationStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Select the step list for a run kind, platform, and privilege level
pub fn select_strategy(
    kind: OptimizationKind,
    platform: Platform,
    privilege: PrivilegeLevel,
) -> RemediationStrategy {
    match (kind, privilege) {
        (OptimizationKind::Memory, PrivilegeLevel::Elevated) => elevated_memory(platform),
        (OptimizationKind::Memory, PrivilegeLevel::Standard) => standard_memory(),
        (OptimizationKind::Cache, PrivilegeLevel::Elevated) => elevated_cache(platform),
        (OptimizationKind::Cache, PrivilegeLevel::Standard) => standard_cache(platform),
    }
}

fn elevated_memory(platform: Platform) -> RemediationStrategy {
    let steps = match platform {
        Platform::Linux => vec![
            RemediationStep::shell(
                "drop_caches",
                "drop file system caches",
                "sync && echo 3 > /proc/sys/vm/drop_caches",
            ),
            RemediationStep::shell(
                "compact_memory",
                "compact fragmented memory",
                "echo 1 > /proc/sys/vm/compact_memory",
            ),
            RemediationStep::command(
                "swappiness",
                "reduce swapping frequency",
                "sysctl",
                &["-w", "vm.swappiness=10"],
            ),
        ],
        Platform::Windows => {
            let mut steps = vec![
                RemediationStep::command(
                    "trim_working_sets",
                    "clear process working sets",
                    "powershell",
                    &[
                        "-Command",
                        "Get-Process | ForEach-Object { [void][System.Runtime.InteropServices.Marshal]::SetProcessWorkingSetSize($_.Handle, -1, -1) }",
                    ],
                ),
                RemediationStep::command(
                    "flush_dns",
                    "flush the DNS resolver cache",
                    "ipconfig",
                    &["/flushdns"],
                ),
            ];
            if let Some(temp) = env_dir("TEMP") {
                steps.push(RemediationStep::clear_stale_files(
                    "clear_temp",
                    "clear stale files in %TEMP%",
                    temp,
                ));
            }
            steps
        }
        Platform::MacOs => vec![
            RemediationStep::command("purge", "purge inactive memory", "purge", &[]),
            RemediationStep::command(
                "flush_dns",
                "flush the DNS resolver cache",
                "dscacheutil",
                &["-flushcache"],
            ),
            RemediationStep::command(
                "restart_mdns",
                "restart the mDNS responder",
                "killall",
                &["-HUP", "mDNSResponder"],
            ),
        ],
        Platform::Unsupported => Vec::new(),
    };
    RemediationStrategy::new(format!("elevated-memory-{}", platform.as_str()), steps)
}

/// User-level memory remediation, the same on every platform
fn standard_memory() -> RemediationStrategy {
    let mut steps = vec![RemediationStep::collect_garbage(
        "collect_garbage",
        "release unused allocator pages",
    )];
    for var in ["TEMP", "TMP", "TMPDIR"] {
        if let Some(dir) = env_dir(var) {
            steps.push(RemediationStep::clear_stale_files(
                format!("clear_{}", var.to_lowercase()),
                format!("clear stale files in ${}", var),
                dir,
            ));
        }
    }
    RemediationStrategy::new("standard-memory", steps)
}

fn elevated_cache(platform: Platform) -> RemediationStrategy {
    let mut steps = match platform {
        Platform::Linux => vec![RemediationStep::shell(
            "balance_page_cache",
            "drop clean page cache entries",
            "sync && echo 1 > /proc/sys/vm/drop_caches",
        )],
        Platform::Windows => vec![
            RemediationStep::command(
                "flush_dns",
                "flush the DNS resolver cache",
                "ipconfig",
                &["/flushdns"],
            ),
            RemediationStep::shell(
                "restart_dns_service",
                "restart the DNS client service",
                "net stop \"DNS Client\" && net start \"DNS Client\"",
            ),
            RemediationStep::command(
                "trim_working_sets",
                "clear process working sets",
                "powershell",
                &[
                    "-Command",
                    "Get-Process | ForEach-Object { [void][System.Runtime.InteropServices.Marshal]::SetProcessWorkingSetSize($_.Handle, -1, -1) }",
                ],
            ),
        ],
        Platform::MacOs => vec![
            RemediationStep::command(
                "flush_dns",
                "flush the DNS resolver cache",
                "dscacheutil",
                &["-flushcache"],
            ),
            RemediationStep::command(
                "restart_mdns",
                "restart the mDNS responder",
                "killall",
                &["-HUP", "mDNSResponder"],
            ),
        ],
        Platform::Unsupported => Vec::new(),
    };
    if platform != Platform::Unsupported {
        steps.extend(browser_cache_steps(platform));
    }
    RemediationStrategy::new(format!("elevated-cache-{}", platform.as_str()), steps)
}

fn standard_cache(platform: Platform) -> RemediationStrategy {
    let mut steps = browser_cache_steps(platform);
    steps.push(RemediationStep::collect_garbage(
        "collect_garbage",
        "release unused allocator pages",
    ));
    RemediationStrategy::new("standard-cache", steps)
}

/// Browser cache directories for the current user, per platform
fn browser_cache_steps(platform: Platform) -> Vec<RemediationStep> {
    let Some(home) = home_dir() else {
        return Vec::new();
    };

    let cache_dirs: Vec<PathBuf> = match platform {
        Platform::Linux => vec![
            home.join(".cache/google-chrome/Default/Cache"),
            home.join(".cache/mozilla/firefox"),
        ],
        Platform::Windows => vec![
            home.join("AppData/Local/Google/Chrome/User Data/Default/Cache"),
            home.join("AppData/Local/Mozilla/Firefox/Profiles"),
        ],
        Platform::MacOs => vec![
            home.join("Library/Caches/Google/Chrome/Default/Cache"),
            home.join("Library/Caches/Firefox"),
        ],
        Platform::Unsupported => Vec::new(),
    };

    cache_dirs
        .into_iter()
        .enumerate()
        .map(|(i, dir)| {
            RemediationStep::clear_directory(
                format!("clear_browser_cache_{}", i),
                format!("clear browser cache at {}", dir.display()),
                dir,
            )
        })
        .collect()
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from).filter(|p| p.is_dir())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
