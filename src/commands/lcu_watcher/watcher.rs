// Poll loops for ready-check acceptance and teammate/enemy analysis

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::commands::config::WatcherConfig;
use crate::commands::lcu_communication::LcuApi;
use crate::commands::types::{Phase, WatcherEvent};

use super::publisher::Publisher;
use super::retry::RetryPolicy;
use super::tracker::{ConnectionStatus, SessionTracker};

/// Enable switch checked at the top of every tick. A disabled loop keeps
/// running and idles, so it can be switched back on without a respawn.
#[derive(Debug, Clone)]
pub struct LoopControl {
  enabled: Arc<AtomicBool>,
}

impl LoopControl {
  pub fn new(enabled: bool) -> Self {
    Self {
      enabled: Arc::new(AtomicBool::new(enabled)),
    }
  }

  pub fn set_enabled(&self, enabled: bool) {
    self.enabled.store(enabled, Ordering::Relaxed);
  }

  pub fn enable(&self) {
    self.set_enabled(true);
  }

  pub fn disable(&self) {
    self.set_enabled(false);
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled.load(Ordering::Relaxed)
  }
}

/// Accepts ready checks, at most once per cooldown window.
pub struct ReadyCheckAcceptor {
  cooldown: Duration,
  last_accept: Option<Instant>,
  connection: ConnectionStatus,
}

impl ReadyCheckAcceptor {
  pub fn new(cooldown: Duration) -> Self {
    Self {
      cooldown,
      last_accept: None,
      connection: ConnectionStatus::default(),
    }
  }

  pub async fn tick<A>(&mut self, api: &A, publisher: &dyn Publisher)
  where
    A: LcuApi + ?Sized,
  {
    let phase = match api.read_phase().await {
      Ok(phase) => {
        self.connection.report_ok("Ready Check");
        phase
      }
      Err(e) => {
        self.connection.report_failure("Ready Check", &e, publisher);
        return;
      }
    };

    if phase != Phase::ReadyCheck {
      self.last_accept = None;
      return;
    }

    if let Some(at) = self.last_accept {
      if at.elapsed() < self.cooldown {
        tracing::debug!("[Ready Check] Accepted {:?} ago, waiting", at.elapsed());
        return;
      }
    }

    match api.accept_ready_check().await {
      Ok(()) => {
        tracing::info!("[Ready Check] Match accepted");
        self.last_accept = Some(Instant::now());
        publisher.publish(WatcherEvent::ReadyCheckAccepted);
      }
      Err(e) => {
        tracing::warn!("[Ready Check] Accept failed: {}", e);
        publisher.publish(WatcherEvent::status(format!(
          "Failed to accept match: {}",
          e
        )));
      }
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

/// Runs one tick with panic isolation. Returns `false` if shutdown was
/// requested while the tick was in flight.
async fn run_tick<F>(
  component: &str,
  tick: F,
  publisher: &dyn Publisher,
  shutdown: &CancellationToken,
) -> bool
where
  F: std::future::Future<Output = ()>,
{
  tokio::select! {
    result = AssertUnwindSafe(tick).catch_unwind() => {
      if let Err(payload) = result {
        let message = panic_message(payload.as_ref());
        tracing::error!("[{}] Tick panicked: {}", component, message);
        publisher.publish(WatcherEvent::status(format!(
          "{} tick failed: {}",
          component, message
        )));
      }
      true
    }
    _ = shutdown.cancelled() => false,
  }
}

/// Sleeps for `duration`; `false` means shutdown arrived first.
async fn sleep_or_shutdown(duration: Duration, shutdown: &CancellationToken) -> bool {
  tokio::select! {
    _ = tokio::time::sleep(duration) => true,
    _ = shutdown.cancelled() => false,
  }
}

pub async fn run_accept_loop<A>(
  api: Arc<A>,
  publisher: Arc<dyn Publisher>,
  control: LoopControl,
  config: WatcherConfig,
  shutdown: CancellationToken,
) where
  A: LcuApi + ?Sized,
{
  tracing::info!("[Ready Check] Loop started");
  let mut acceptor = ReadyCheckAcceptor::new(config.accept_cooldown());

  loop {
    if !control.is_enabled() {
      if !sleep_or_shutdown(config.disabled_interval(), &shutdown).await {
        break;
      }
      continue;
    }

    let tick = acceptor.tick(api.as_ref(), publisher.as_ref());
    if !run_tick("Ready Check", tick, publisher.as_ref(), &shutdown).await {
      break;
    }
    if !sleep_or_shutdown(config.accept_interval(), &shutdown).await {
      break;
    }
  }
  tracing::info!("[Ready Check] Loop stopped");
}

pub async fn run_analyze_loop<A>(
  api: Arc<A>,
  publisher: Arc<dyn Publisher>,
  control: LoopControl,
  config: WatcherConfig,
  shutdown: CancellationToken,
) where
  A: LcuApi + ?Sized,
{
  tracing::info!("[Analyzer] Loop started");
  let mut tracker = SessionTracker::new(RetryPolicy::new(config.max_enemy_retries));

  loop {
    if !control.is_enabled() {
      if !sleep_or_shutdown(config.disabled_interval(), &shutdown).await {
        break;
      }
      continue;
    }

    let tick = tracker.tick(api.as_ref(), publisher.as_ref());
    if !run_tick("Analyzer", tick, publisher.as_ref(), &shutdown).await {
      break;
    }
    if !sleep_or_shutdown(config.analyze_interval(), &shutdown).await {
      break;
    }
  }
  tracing::info!("[Analyzer] Loop stopped");
}

/// Handles to the two background loops started by [`start_lcu_watcher`].
pub struct WatcherHandles {
  pub accept: LoopControl,
  pub analyze: LoopControl,
  shutdown: CancellationToken,
  tasks: Vec<JoinHandle<()>>,
}

impl WatcherHandles {
  /// Cancels both loops and waits for them to return.
  pub async fn stop(self) {
    self.shutdown.cancel();
    for task in self.tasks {
      if let Err(e) = task.await {
        tracing::error!("[LCU Watcher] Loop task ended abnormally: {}", e);
      }
    }
  }
}

/// Spawns the ready-check and analysis loops on the current runtime.
pub fn start_lcu_watcher<A>(
  api: Arc<A>,
  publisher: Arc<dyn Publisher>,
  config: &WatcherConfig,
) -> WatcherHandles
where
  A: LcuApi + 'static,
{
  let shutdown = CancellationToken::new();
  let accept = LoopControl::new(config.accept_enabled);
  let analyze = LoopControl::new(config.analyze_enabled);

  let tasks = vec![
    tokio::spawn(run_accept_loop(
      api.clone(),
      publisher.clone(),
      accept.clone(),
      config.clone(),
      shutdown.clone(),
    )),
    tokio::spawn(run_analyze_loop(
      api,
      publisher,
      analyze.clone(),
      config.clone(),
      shutdown.clone(),
    )),
  ];

  tracing::info!(
    "[LCU Watcher] Started (accept: {}, analyze: {})",
    config.accept_enabled,
    config.analyze_enabled
  );

  WatcherHandles {
    accept,
    analyze,
    shutdown,
    tasks,
  }
}
