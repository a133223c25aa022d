use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Publishes whether the API host is reachable.
///
/// Starts out online and only publishes when reachability flips.
pub struct NetworkMonitor {
    online: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    pub fn start(base_url: &str, period: Duration, runtime: &Handle) -> Result<Self> {
        let (host, port) = probe_target(base_url)?;
        let (tx, online) = watch::channel(true);
        info!("Watching connectivity to {}:{} every {:?}", host, port, period);

        let task = runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reachable = probe(&host, port).await;
                let changed = tx.send_if_modified(|online| {
                    if *online == reachable {
                        return false;
                    }
                    *online = reachable;
                    true
                });
                if changed {
                    if reachable {
                        info!("Connectivity restored");
                    } else {
                        warn!("{}:{} is unreachable", host, port);
                    }
                }
            }
        });

        Ok(Self { online, task })
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn probe_target(base_url: &str) -> Result<(String, u16)> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Base URL has no host: {}", base_url))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("Base URL has no port: {}", base_url))?;
    Ok((host, port))
}

async fn probe(host: &str, port: u16) -> bool {
    match timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Probe of {}:{} failed: {}", host, port, e);
            false
        }
        Err(_) => {
            debug!("Probe of {}:{} timed out", host, port);
            false
        }
    }
}
