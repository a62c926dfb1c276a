//! # pandoc-auto
//!
//! Locate, download and cache the [pandoc](https://pandoc.org) binary so that
//! Markdown → PDF conversion works without a manual install step.
//!
//! ## How it works
//!
//! [`find_pandoc`] never touches the network. It checks, in order:
//!
//! 1. `PANDOC_PATH` — explicit path to an existing binary.
//! 2. `~/.cache/docpress/pandoc-{VERSION}/pandoc` — a copy downloaded earlier.
//! 3. Every directory on `PATH`.
//!
//! [`ensure_pandoc`] runs the same lookup and, only if nothing is found,
//! downloads the release archive from
//! [jgm/pandoc](https://github.com/jgm/pandoc/releases), extracts
//! `bin/pandoc` into the cache dir and returns its path. Calling it again is
//! cheap: the second call finds the cached copy.
//!
//! Downloading is never implicit. Conversions call [`find_pandoc`]; the
//! caller decides when (and whether) to run [`ensure_pandoc`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pandoc_auto::{ensure_pandoc, find_pandoc};
//!
//! let pandoc = match find_pandoc() {
//!     Some(path) => path,
//!     None => ensure_pandoc(Some(&|downloaded, total| {
//!         if let Some(t) = total {
//!             eprint!("\rDownloading pandoc: {}/{} bytes", downloaded, t);
//!         }
//!     }))
//!     .expect("download failed"),
//! };
//! println!("pandoc at {}", pandoc.display());
//! ```
//!
//! ## Platform support for downloads
//!
//! | OS      | Arch    | Archive                              |
//! |---------|---------|--------------------------------------|
//! | Linux   | x86_64  | `pandoc-{VERSION}-linux-amd64.tar.gz` |
//! | Linux   | aarch64 | `pandoc-{VERSION}-linux-arm64.tar.gz` |
//!
//! Upstream ships macOS and Windows builds as `.zip`/installer packages; on
//! those platforms install pandoc yourself or point `PANDOC_PATH` at it.
//! Lookup works everywhere.
//!
//! ## Environment variable overrides
//!
//! - `PANDOC_PATH` — path to an existing pandoc binary; skips lookup and download.
//! - `PANDOC_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// The pandoc release downloaded by [`ensure_pandoc`].
pub const PANDOC_VERSION: &str = "3.6.4";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/jgm/pandoc/releases/download";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pandoc-auto operations.
#[derive(Error, Debug)]
pub enum PandocAutoError {
    /// No downloadable archive exists for this OS/architecture.
    #[error("No pandoc download available for {os}/{arch}; install pandoc and set PANDOC_PATH")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or write the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pandoc-3.6.4-linux-amd64.tar.gz`.
    archive_name: String,
    /// Relative path inside the archive, e.g. `pandoc-3.6.4/bin/pandoc`.
    bin_path_in_archive: String,
}

impl PlatformInfo {
    fn release_url(&self) -> String {
        format!("{BASE_URL}/{PANDOC_VERSION}/{}", self.archive_name)
    }
}

fn detect_platform() -> Result<PlatformInfo, PandocAutoError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let suffix = match (os, arch) {
        ("linux", "x86_64") => "linux-amd64",
        ("linux", "aarch64") => "linux-arm64",
        (os, arch) => {
            return Err(PandocAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(PlatformInfo {
        archive_name: format!("pandoc-{PANDOC_VERSION}-{suffix}.tar.gz"),
        bin_path_in_archive: format!("pandoc-{PANDOC_VERSION}/bin/pandoc"),
    })
}

/// File name of the pandoc executable on this platform.
pub fn binary_name() -> &'static str {
    if cfg!(windows) {
        "pandoc.exe"
    } else {
        "pandoc"
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the per-version cache directory for the pandoc binary.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/docpress/pandoc-{VERSION}/`
/// - **Linux**: `~/.cache/docpress/pandoc-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\docpress\pandoc-{VERSION}\`
///
/// Override by setting `PANDOC_AUTO_CACHE_DIR`.
pub fn pandoc_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("PANDOC_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("pandoc-{PANDOC_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("docpress").join(format!("pandoc-{PANDOC_VERSION}"))
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Looks for an installed pandoc without any network access.
///
/// Order: `PANDOC_PATH`, the download cache, then `PATH`.
pub fn find_pandoc() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PANDOC_PATH") {
        let pb = PathBuf::from(p);
        if pb.is_file() {
            return Some(pb);
        }
    }

    let cached = pandoc_cache_dir().join(binary_name());
    if cached.is_file() {
        return Some(cached);
    }

    find_on_path(binary_name())
}

/// Returns `true` if [`find_pandoc`] would succeed.
pub fn is_pandoc_available() -> bool {
    find_pandoc().is_some()
}

/// Ensures a pandoc binary is available, downloading it if necessary.
///
/// - If [`find_pandoc`] succeeds, that path is returned and nothing is downloaded.
/// - Otherwise the release archive for this platform is downloaded and
///   `bin/pandoc` is extracted into [`pandoc_cache_dir`].
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download. Pass `None` to suppress progress callbacks.
///
/// Idempotent: repeated calls return the same path, and the download
/// happens at most once per process.
pub fn ensure_pandoc(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PandocAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = match find_pandoc() {
        Some(path) => path,
        None => download_to_cache(on_progress)?,
    };

    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn download_to_cache(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PandocAutoError> {
    let info = detect_platform()?;
    let cache_dir = pandoc_cache_dir();
    let bin_path = cache_dir.join(binary_name());

    std::fs::create_dir_all(&cache_dir).map_err(PandocAutoError::CacheDir)?;

    let archive_bytes = fetch_release(&info, on_progress)?;
    extract_binary(&archive_bytes, &info.bin_path_in_archive, &bin_path)?;

    Ok(bin_path)
}

/// Downloads the release archive described by `info` into memory.
fn fetch_release(
    info: &PlatformInfo,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PandocAutoError> {
    let url = info.release_url();
    let failed = |what: String| PandocAutoError::Download(format!("pandoc {PANDOC_VERSION}: {what}"));

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pandoc-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client
        .get(&url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| failed(format!("GET {url}: {e}")))?;

    let total = response.content_length();
    let mut sink = ProgressSink {
        buf: Vec::with_capacity(total.unwrap_or(0) as usize),
        total,
        on_progress,
    };
    std::io::copy(&mut response, &mut sink).map_err(|e| failed(format!("reading {url}: {e}")))?;

    if matches!(total, Some(t) if t != sink.buf.len() as u64) {
        return Err(failed(format!(
            "truncated download: {} of {} bytes",
            sink.buf.len(),
            total.unwrap_or_default()
        )));
    }
    Ok(sink.buf)
}

/// In-memory writer that reports its running length after every write.
struct ProgressSink<'a> {
    buf: Vec<u8>,
    total: Option<u64>,
    on_progress: Option<&'a dyn Fn(u64, Option<u64>)>,
}

impl Write for ProgressSink<'_> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        if let Some(cb) = self.on_progress {
            cb(self.buf.len() as u64, self.total);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
///
/// The entry is unpacked next to `dest_path` and renamed into place, so an
/// interrupted extraction never leaves a truncated binary at `dest_path`.
fn extract_binary(
    archive_bytes: &[u8],
    bin_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PandocAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let gz = GzDecoder::new(archive_bytes);
    let mut archive = Archive::new(gz);

    for entry in archive
        .entries()
        .map_err(|e| PandocAutoError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PandocAutoError::Extract(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| PandocAutoError::Extract(e.to_string()))?;

        if entry_path.to_string_lossy() != bin_path_in_archive {
            continue;
        }

        let partial = dest_path.with_extension("partial");
        entry
            .unpack(&partial)
            .map_err(|e| PandocAutoError::Extract(format!("Unpack failed: {e}")))?;
        mark_executable(&partial)?;
        std::fs::rename(&partial, dest_path).map_err(PandocAutoError::CacheDir)?;
        return Ok(());
    }

    Err(PandocAutoError::Extract(format!(
        "'{}' not found in archive",
        bin_path_in_archive
    )))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), PandocAutoError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(PandocAutoError::CacheDir)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), PandocAutoError> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests below mutate process-wide env vars.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn tar_gz_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn cache_dir_is_deterministic() {
        let _guard = ENV_LOCK.lock().unwrap();
        let d1 = pandoc_cache_dir();
        let d2 = pandoc_cache_dir();
        assert_eq!(d1, d2);
        assert!(d1.to_str().unwrap().contains(PANDOC_VERSION));
    }

    #[test]
    fn cache_dir_override_via_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PANDOC_AUTO_CACHE_DIR", "/tmp/test_docpress_override");
        let d = pandoc_cache_dir();
        std::env::remove_var("PANDOC_AUTO_CACHE_DIR");
        assert!(d.starts_with("/tmp/test_docpress_override"));
        assert!(d.to_str().unwrap().contains(PANDOC_VERSION));
    }

    #[test]
    fn pandoc_path_env_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-pandoc");
        std::fs::write(&fake, b"").unwrap();

        std::env::set_var("PANDOC_PATH", &fake);
        let found = find_pandoc();
        std::env::remove_var("PANDOC_PATH");

        assert_eq!(found, Some(fake));
    }

    #[test]
    fn missing_pandoc_path_falls_through_to_cache() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join(format!("pandoc-{PANDOC_VERSION}"));
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join(binary_name()), b"").unwrap();

        std::env::set_var("PANDOC_PATH", dir.path().join("does-not-exist"));
        std::env::set_var("PANDOC_AUTO_CACHE_DIR", dir.path());
        let found = find_pandoc();
        std::env::remove_var("PANDOC_PATH");
        std::env::remove_var("PANDOC_AUTO_CACHE_DIR");

        assert_eq!(found, Some(cache.join(binary_name())));
    }

    #[test]
    fn release_url_points_at_tagged_asset() {
        let info = PlatformInfo {
            archive_name: format!("pandoc-{PANDOC_VERSION}-linux-amd64.tar.gz"),
            bin_path_in_archive: String::new(),
        };
        assert_eq!(
            info.release_url(),
            format!(
                "https://github.com/jgm/pandoc/releases/download/{PANDOC_VERSION}/pandoc-{PANDOC_VERSION}-linux-amd64.tar.gz"
            )
        );
    }

    #[test]
    fn progress_sink_reports_running_total() {
        let seen = Mutex::new(Vec::new());
        let report = |done: u64, total: Option<u64>| seen.lock().unwrap().push((done, total));
        let mut sink = ProgressSink {
            buf: Vec::new(),
            total: Some(10),
            on_progress: Some(&report),
        };

        std::io::copy(&mut &b"0123456789"[..6], &mut sink).unwrap();
        sink.write_all(b"6789").unwrap();

        assert_eq!(sink.buf, b"0123456789");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&(10, Some(10))));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn extract_binary_finds_entry() {
        let archive = tar_gz_with(&[
            ("pandoc-x/share/man/pandoc.1.gz", b"man page"),
            ("pandoc-x/bin/pandoc", b"#!/bin/sh\n"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pandoc");

        extract_binary(&archive, "pandoc-x/bin/pandoc", &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"#!/bin/sh\n");
        assert!(!dest.with_extension("partial").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn extract_binary_reports_missing_entry() {
        let archive = tar_gz_with(&[("pandoc-x/README", b"hi")]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pandoc");

        let err = extract_binary(&archive, "pandoc-x/bin/pandoc", &dest).unwrap_err();
        assert!(matches!(err, PandocAutoError::Extract(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn detect_platform_names_versioned_archive() {
        match detect_platform() {
            Ok(info) => {
                assert!(info.archive_name.contains(PANDOC_VERSION));
                assert!(info.archive_name.ends_with(".tar.gz"));
                assert!(info.bin_path_in_archive.ends_with("bin/pandoc"));
            }
            Err(PandocAutoError::UnsupportedPlatform { .. }) => {
                let supported = cfg!(target_os = "linux")
                    && (cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64"));
                assert!(!supported);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
