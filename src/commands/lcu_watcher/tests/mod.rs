// Tests for the LCU watcher loops and session tracking

#[cfg(test)]
mod test_session_tracker;
