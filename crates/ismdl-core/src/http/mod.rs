//! Blocking HTTP GETs via libcurl with a fixed User-Agent.
//!
//! Every request honours an optional abort token: libcurl's progress callback
//! checks it and stops the transfer as soon as it is set.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::IsmConfig;
use crate::error::FetchError;

/// Suffix of a fragment file still being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Path a download streams into before it is renamed onto `dest`.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut o = dest.as_os_str().to_owned();
    o.push(PARTIAL_SUFFIX);
    PathBuf::from(o)
}

/// Request settings shared by all workers of a run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    user_agent: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(user_agent: impl Into<String>, connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            connect_timeout,
            timeout,
        }
    }

    pub fn from_config(cfg: &IsmConfig) -> Self {
        Self::new(
            cfg.user_agent.clone(),
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(FetchError::Curl)?;
        easy.useragent(&self.user_agent).map_err(FetchError::Curl)?;
        easy.follow_location(true).map_err(FetchError::Curl)?;
        easy.max_redirections(10).map_err(FetchError::Curl)?;
        easy.connect_timeout(self.connect_timeout).map_err(FetchError::Curl)?;
        easy.timeout(self.timeout).map_err(FetchError::Curl)?;
        // Needed for the progress callback that polls the abort token.
        easy.progress(true).map_err(FetchError::Curl)?;
        Ok(easy)
    }

    /// GETs `url` into memory.
    pub fn get_bytes(&self, url: &str, abort: Option<&AtomicBool>) -> Result<Vec<u8>, FetchError> {
        let mut easy = self.easy(url)?;
        let mut body = Vec::new();
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(FetchError::Curl)?;
            transfer
                .progress_function(|_, _, _, _| !is_aborted(abort))
                .map_err(FetchError::Curl)?;
            transfer.perform()
        };
        if let Err(e) = perform_result {
            return Err(map_perform_error(e, abort));
        }
        check_status(&mut easy)?;
        Ok(body)
    }

    /// GETs `url` into `dest`, streaming through `dest.partial` and renaming on
    /// success. Returns the number of bytes written.
    ///
    /// On HTTP or curl failure the partial file is removed. On abort it is left
    /// in place; it never occupies `dest`.
    pub fn download_to(
        &self,
        url: &str,
        dest: &Path,
        abort: Option<&AtomicBool>,
    ) -> Result<u64, FetchError> {
        let mut easy = self.easy(url)?;
        let partial = partial_path(dest);
        let mut file = File::create(&partial).map_err(FetchError::Storage)?;
        let mut written = 0u64;
        let mut storage_error: Option<std::io::Error> = None;

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(FetchError::Curl)?;
            transfer
                .progress_function(|_, _, _, _| !is_aborted(abort))
                .map_err(FetchError::Curl)?;
            transfer.perform()
        };

        let result = match perform_result {
            Err(e) => match storage_error.take() {
                Some(io_err) if e.is_write_error() => Err(FetchError::Storage(io_err)),
                _ => Err(map_perform_error(e, abort)),
            },
            Ok(()) => check_status(&mut easy),
        };

        if let Err(e) = result {
            drop(file);
            if !matches!(e, FetchError::Aborted) {
                let _ = std::fs::remove_file(&partial);
            }
            return Err(e);
        }

        file.flush().map_err(FetchError::Storage)?;
        drop(file);
        std::fs::rename(&partial, dest).map_err(FetchError::Storage)?;
        Ok(written)
    }
}

fn is_aborted(abort: Option<&AtomicBool>) -> bool {
    abort.map_or(false, |a| a.load(Ordering::Relaxed))
}

fn map_perform_error(e: curl::Error, abort: Option<&AtomicBool>) -> FetchError {
    if e.is_aborted_by_callback() || is_aborted(abort) {
        FetchError::Aborted
    } else {
        FetchError::Curl(e)
    }
}

fn check_status(easy: &mut curl::easy::Easy) -> Result<(), FetchError> {
    let code = easy.response_code().map_err(FetchError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(())
}
