use thiserror::Error;

/// Errors that can occur while executing a request through the transport
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// Network error occurred during the underlying round trip
    #[error("Network error while executing request: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport was shut down while a request was waiting for a
    /// concurrency slot. This cannot happen through the public API since
    /// the semaphore is never closed; it exists so slot acquisition does
    /// not need to panic.
    #[error("Transport is closed")]
    Closed,
}
