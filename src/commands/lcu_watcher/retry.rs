// Bounded "try up to N times, then give up" policy shared by dispatcher actions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
  /// Attempt `attempt` failed; another one is allowed on a later tick.
  Retry { attempt: u32 },
  /// The budget is spent; callers must stop trying for this session.
  Exhausted { attempts: u32 },
}

impl RetryPolicy {
  pub fn new(max_attempts: u32) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
    }
  }

  /// Counts one failed attempt against `counter`.
  pub fn record_failure(&self, counter: &mut u32) -> RetryOutcome {
    *counter = counter.saturating_add(1);
    if *counter >= self.max_attempts {
      RetryOutcome::Exhausted { attempts: *counter }
    } else {
      RetryOutcome::Retry { attempt: *counter }
    }
  }
}
