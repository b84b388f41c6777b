//! S3 (object store) byte source.
//!
//! `aws-sdk-s3`'s `GetObject` body is an async stream; the byte source
//! contract here is a blocking pull. A dedicated background thread runs a
//! single-threaded Tokio runtime that drives the download and forwards
//! chunks over a bounded channel, keeping the external contract a plain
//! synchronous `Read` as the concurrency model allows (§5).

use super::{OriginKind, SourceMetadata};
use crate::error::{ExcelError, Result};
use std::io::{self, Read};
use std::sync::mpsc::{self, SyncSender};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

pub fn open(
    bucket: &str,
    key: &str,
    region: Option<&str>,
    chunk_size: usize,
) -> Result<Box<dyn Read + Send>> {
    let (tx, rx) = mpsc::sync_channel::<std::result::Result<Vec<u8>, ExcelError>>(4);
    let bucket_owned = bucket.to_string();
    let key_owned = key.to_string();
    let region_owned = region.map(str::to_string);
    let chunk_size = if chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { chunk_size };

    std::thread::Builder::new()
        .name("excelstream-s3-fetch".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(Err(ExcelError::Io(e)));
                    return;
                }
            };
            runtime.block_on(fetch_and_stream(bucket_owned, key_owned, region_owned, chunk_size, tx));
        })
        .map_err(ExcelError::Io)?;

    Ok(Box::new(ChannelReader {
        rx,
        buf: Vec::new(),
        pos: 0,
        done: false,
    }))
}

pub fn metadata(bucket: &str, key: &str, region: Option<&str>) -> Result<SourceMetadata> {
    let runtime = tokio::runtime::Runtime::new().map_err(ExcelError::Io)?;
    runtime.block_on(async {
        let client = build_client(region).await?;
        let output = client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, bucket, key))?;
        Ok(SourceMetadata {
            size: output.content_length().map(|n| n.max(0) as u64),
            content_type: output.content_type().map(str::to_string),
            origin_kind: Some(OriginKind::ObjectStore),
        })
    })
}

async fn build_client(region: Option<&str>) -> Result<aws_sdk_s3::Client> {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_sdk_s3::config::Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;
    Ok(aws_sdk_s3::Client::new(&sdk_config))
}

async fn fetch_and_stream(
    bucket: String,
    key: String,
    region: Option<String>,
    chunk_size: usize,
    tx: SyncSender<std::result::Result<Vec<u8>, ExcelError>>,
) {
    let client = match build_client(region.as_deref()).await {
        Ok(c) => c,
        Err(e) => {
            let _ = tx.send(Err(e));
            return;
        }
    };

    let output = match client.get_object().bucket(&bucket).key(&key).send().await {
        Ok(o) => o,
        Err(e) => {
            let _ = tx.send(Err(map_sdk_err(e, &bucket, &key)));
            return;
        }
    };

    let mut reader = output.body.into_async_read();
    let mut buf = vec![0u8; chunk_size];
    loop {
        use tokio::io::AsyncReadExt;
        match reader.read(&mut buf).await {
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
}

/// Classifies an AWS SDK error by matching on its rendered message rather
/// than its generic service-error type, since `GetObjectError` and
/// `HeadObjectError` don't share a common error-code accessor without
/// unwrapping the `SdkError` first.
fn map_sdk_err<E: std::fmt::Display>(err: E, bucket: &str, key: &str) -> ExcelError {
    let message = err.to_string();
    if message.contains("NoSuchKey") || message.contains("NoSuchBucket") || message.contains("NotFound") {
        ExcelError::NotFound(format!("s3://{bucket}/{key}"))
    } else if message.contains("AccessDenied")
        || message.contains("InvalidAccessKeyId")
        || message.contains("SignatureDoesNotMatch")
        || message.contains("credentials")
    {
        ExcelError::Auth(format!("s3://{bucket}/{key}: {message}"))
    } else {
        ExcelError::Network(format!("s3://{bucket}/{key}: {message}"))
    }
}

struct ChannelReader {
    rx: mpsc::Receiver<std::result::Result<Vec<u8>, ExcelError>>,
    buf: Vec<u8>,
    pos: usize,
    done: bool,
}

impl Read for ChannelReader {
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
            match self.rx.recv() {
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
                    return Err(io::Error::new(io::ErrorKind::Other, e));
                }
                Err(_) => {
                    self.done = true;
                    return Ok(0);
                }
            }
        }
    }
}
