//! Tunnel management - exposing a local port under a public URL
//!
//! The tunnel itself is provided by an external `localtunnel` client process.
//! rflocal only spawns it, reads the public URL it announces and kills it when
//! the tunnel handle is closed or dropped.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use rflocal_common::{Error, Result};

use crate::config::TunnelConfig;

/// Marker the localtunnel client prints in front of the public URL
const URL_ANNOUNCEMENT: &str = "your url is:";

/// An open tunnel. Closing it releases the public endpoint.
pub trait Tunnel: Send {
    /// Public URL, read once when the tunnel was opened
    fn url(&self) -> &str;

    /// Tear the tunnel down. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

/// Something that can open tunnels
#[async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Expose `config.host:config.port` publicly. No retry is attempted.
    async fn open(&self, config: &TunnelConfig) -> Result<Box<dyn Tunnel>>;
}

/// Tunnel provider backed by the `lt` localtunnel client
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTunnelProvider;

#[async_trait]
impl TunnelProvider for LocalTunnelProvider {
    async fn open(&self, config: &TunnelConfig) -> Result<Box<dyn Tunnel>> {
        let (host, port) = (config.host.as_str(), config.port);
        let binary = which::which(&config.binary).map_err(|e| {
            Error::Tunnel(format!(
                "tunnel client {} not found ({}). Install with: npm install -g localtunnel",
                config.binary.display(),
                e
            ))
        })?;

        debug!("Spawning {} for {}:{}", binary.display(), host, port);

        let mut child = Command::new(&binary)
            .arg("--port")
            .arg(port.to_string())
            .arg("--local-host")
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Tunnel(format!("failed to spawn {}: {}", binary.display(), e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Tunnel("tunnel client stdout unavailable".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let url = match timeout(config.startup_timeout, read_public_url(&mut lines)).await {
            Ok(Ok(Some(url))) => url,
            Ok(Ok(None)) => {
                let output = timeout(Duration::from_secs(2), child.wait_with_output()).await;
                let stderr = match output {
                    Ok(Ok(output)) => String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    _ => String::new(),
                };
                return Err(Error::Tunnel(format!(
                    "tunnel client exited before announcing a URL: {}",
                    stderr
                )));
            }
            Ok(Err(e)) => {
                return Err(Error::Tunnel(format!("failed to read tunnel client output: {}", e)));
            }
            Err(_) => {
                return Err(Error::Tunnel(format!(
                    "no public URL announced within {}s",
                    config.startup_timeout.as_secs()
                )));
            }
        };

        // Keep draining output so the client never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("tunnel: {}", line);
            }
        });
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("tunnel: {}", line);
                }
            });
        }

        info!("Exposing {}:{} at {}", host, port, url);
        Ok(Box::new(LocalTunnel { child, url }))
    }
}

/// Handle to a running localtunnel client
pub struct LocalTunnel {
    child: Child,
    url: String,
}

impl Tunnel for LocalTunnel {
    fn url(&self) -> &str {
        &self.url
    }

    fn close(&mut self) -> Result<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }
        info!("Closing tunnel {}", self.url);
        self.child.start_kill()?;
        Ok(())
    }
}

impl Drop for LocalTunnel {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

async fn read_public_url<R>(lines: &mut Lines<BufReader<R>>) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if let Some(url) = parse_public_url(&line) {
            return Ok(Some(url));
        }
        debug!("tunnel: {}", line);
    }
    Ok(None)
}

/// Extract the URL from a localtunnel announcement line
fn parse_public_url(line: &str) -> Option<String> {
    let lower = line.to_ascii_lowercase();
    let start = lower.find(URL_ANNOUNCEMENT)? + URL_ANNOUNCEMENT.len();
    let url = line[start..].trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Some(url.to_string())
    } else {
        None
    }
}
