pub mod batcher;
pub mod client;
pub mod device;
pub mod retry;
pub mod signer;

pub use batcher::{partition, BatchError};
pub use client::{BatchOutcome, ClientError, TelemetryClient, Transport};
pub use device::{generate_population, DeviceRecord, QueryRequest, QueryResponse};
pub use retry::RetryPolicy;
pub use signer::{sign, SignError, Signer};
