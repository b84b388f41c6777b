//! HTTP byte source, built on `reqwest::blocking`.
//!
//! Downloading happens on a background thread that feeds chunks over a
//! bounded channel (the same bridge shape as the S3 source's
//! `ChannelReader`), since that's what gives a genuine per-chunk idle
//! timeout: `recv_timeout` resets on every chunk, where `reqwest`'s own
//! `ClientBuilder::timeout` instead bounds the *entire* request.

use super::{OriginKind, SourceMetadata};
use crate::error::{ExcelError, Result};
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

/// Tunables for the HTTP source, mirroring the reader facade's own
/// builder-style configuration knobs. Construct with [`HttpSourceConfig::default`]
/// and override only what's needed.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub max_redirects: usize,
    /// Idle timeout: reset every time a chunk arrives, not the whole body.
    pub read_timeout: Duration,
    /// Wall-clock budget for the whole download, checked on every read.
    pub total_deadline: Option<Duration>,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        HttpSourceConfig {
            max_redirects: 5,
            read_timeout: Duration::from_secs(30),
            total_deadline: None,
        }
    }
}

pub fn open(url: &str, headers: &[(String, String)], chunk_size: usize) -> Result<Box<dyn Read + Send>> {
    open_with_config(url, headers, &HttpSourceConfig::default(), chunk_size)
}

pub fn open_with_config(
    url: &str,
    headers: &[(String, String)],
    config: &HttpSourceConfig,
    chunk_size: usize,
) -> Result<Box<dyn Read + Send>> {
    let response = send(url, headers, config)?;
    let reader = DeadlineReader::spawn(response, url.to_string(), config.clone(), chunk_size)?;
    Ok(Box::new(reader))
}

pub fn metadata(url: &str, headers: &[(String, String)]) -> Result<SourceMetadata> {
    metadata_with_config(url, headers, &HttpSourceConfig::default())
}

pub fn metadata_with_config(
    url: &str,
    headers: &[(String, String)],
    config: &HttpSourceConfig,
) -> Result<SourceMetadata> {
    let response = send(url, headers, config)?;
    let size = response.content_length();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Ok(SourceMetadata {
        size,
        content_type,
        origin_kind: Some(OriginKind::Http),
    })
}

fn build_client(config: &HttpSourceConfig) -> Result<reqwest::blocking::Client> {
    // No `.timeout()` here: the whole-request timeout reqwest would apply
    // is exactly the blunt instrument `DeadlineReader` replaces with a
    // per-chunk idle timeout plus an independently-checked total deadline.
    reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| ExcelError::Network(e.to_string()))
}

fn send(
    url: &str,
    headers: &[(String, String)],
    config: &HttpSourceConfig,
) -> Result<reqwest::blocking::Response> {
    let client = build_client(config)?;
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(name, value);
    }

    let response = request.send().map_err(|e| map_reqwest_err(e, url, config.max_redirects))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExcelError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

fn map_reqwest_err(e: reqwest::Error, url: &str, max_redirects: usize) -> ExcelError {
    if e.is_timeout() {
        ExcelError::Timeout(url.to_string())
    } else if e.is_redirect() {
        ExcelError::TooManyRedirects(max_redirects)
    } else {
        ExcelError::Network(e.to_string())
    }
}

/// Bridges a blocking `reqwest::blocking::Response` body to a `Read` with a
/// genuine per-chunk idle timeout and a total-deadline check on every call,
/// neither of which `reqwest`'s own request-level timeout can express.
struct DeadlineReader {
    rx: Receiver<std::result::Result<Vec<u8>, ExcelError>>,
    buf: Vec<u8>,
    pos: usize,
    done: bool,
    url: String,
    read_timeout: Duration,
    total_deadline: Option<Duration>,
    started: Instant,
}

impl DeadlineReader {
    fn spawn(
        mut response: reqwest::blocking::Response,
        url: String,
        config: HttpSourceConfig,
        chunk_size: usize,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<std::result::Result<Vec<u8>, ExcelError>>(4);
        let fetch_buf_size = chunk_size.max(1);
        std::thread::Builder::new()
            .name("excelstream-http-fetch".into())
            .spawn(move || {
                let mut buf = vec![0u8; fetch_buf_size];
                loop {
                    match response.read(&mut buf) {
                        Ok(0) => {
                            let _ = tx.send(Ok(Vec::new()));
                            break;
                        }
                        Ok(n) => {
                            if tx.send(Ok(buf[..n].to_vec())).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(ExcelError::Network(e.to_string())));
                            break;
                        }
                    }
                }
            })
            .map_err(ExcelError::Io)?;
        Ok(DeadlineReader {
            rx,
            buf: Vec::new(),
            pos: 0,
            done: false,
            url,
            read_timeout: config.read_timeout,
            total_deadline: config.total_deadline,
            started: Instant::now(),
        })
    }
}

impl Read for DeadlineReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.buf.len() {
                let n = (self.buf.len() - self.pos).min(out.len());
                out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done {
                return Ok(0);
            }
            if let Some(deadline) = self.total_deadline {
                if self.started.elapsed() > deadline {
                    self.done = true;
                    return Err(to_io_err(ExcelError::Timeout(self.url.clone())));
                }
            }
            match self.rx.recv_timeout(self.read_timeout) {
                Ok(Ok(chunk)) => {
                    if chunk.is_empty() {
                        self.done = true;
                        return Ok(0);
                    }
                    self.buf = chunk;
                    self.pos = 0;
                }
                Ok(Err(e)) => {
                    self.done = true;
                    return Err(to_io_err(e));
                }
                Err(_) => {
                    self.done = true;
                    return Err(to_io_err(ExcelError::Timeout(self.url.clone())));
                }
            }
        }
    }
}

fn to_io_err(e: ExcelError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
