use rand::distributions::Alphanumeric;
use rand::Rng;

pub fn correlation_id_with_length(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Short random tag correlating a save file with the log lines that
/// produced it.
pub fn correlation_id() -> String {
    correlation_id_with_length(6)
}
