use ulid::Ulid;

/// Monotonic milliseconds since the agent started.
pub type Millis = i64;

/// Milliseconds elapsed from `since` to `now`, never negative.
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    (now - since).max(0)
}

/// Generates a new ULID.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}
