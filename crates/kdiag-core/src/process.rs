//! Facts about the running process and host
//!
//! Everything here is best effort: a value that cannot be read is reported
//! as `None` (or an empty string) and the command omits or blanks it.

use std::env;
use std::fs;

/// Number of open file descriptors (Linux only)
pub fn open_file_descriptors() -> Option<u64> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    fs::read_dir("/proc/self/fd")
        .ok()
        .map(|entries| entries.count() as u64)
}

/// Soft limit on open file descriptors (Linux only)
pub fn max_file_descriptors() -> Option<u64> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let limits = fs::read_to_string("/proc/self/limits").ok()?;
    parse_max_open_files(&limits)
}

/// Soft limit from the `Max open files` row of `/proc/<pid>/limits`
fn parse_max_open_files(limits: &str) -> Option<u64> {
    let row = limits
        .lines()
        .find(|line| line.starts_with("Max open files"))?;
    row.trim_start_matches("Max open files")
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

pub fn host_name() -> String {
    env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
        })
        .unwrap_or_default()
}

pub fn user_name() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_default()
}

pub fn user_home() -> String {
    dirs::home_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

pub fn working_dir() -> String {
    env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_open_files() {
        let limits = "Limit                     Soft Limit           Hard Limit           Units\n\
                      Max cpu time              unlimited            unlimited            seconds\n\
                      Max open files            1024                 524288               files\n";
        assert_eq!(parse_max_open_files(limits), Some(1024));
    }

    #[test]
    fn test_parse_max_open_files_unlimited() {
        let limits = "Max open files            unlimited            unlimited            files\n";
        assert_eq!(parse_max_open_files(limits), None);
    }

    #[test]
    fn test_cpu_count_positive() {
        assert!(cpu_count() >= 1);
    }

    #[test]
    fn test_user_home_follows_platform_home_dir() {
        let expected = dirs::home_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        assert_eq!(user_home(), expected);
    }
}
