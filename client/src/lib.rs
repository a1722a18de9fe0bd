//! Client-side orchestration for crop disease detection: take one image from
//! the user, send it to the public or authenticated prediction route, and turn
//! whatever comes back into a validated result or a user-facing error.

pub mod classify;
pub mod config;
pub mod credentials;
pub mod endpoint;
pub mod intake;
pub mod normalize;
pub mod report;
pub mod transport;
pub mod workflow;

pub use classify::{ErrorKind, WorkflowError};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{Anonymous, CredentialResolver, SharedToken};
pub use intake::{FileSource, IncomingFile, PreviewHandle, PreviewStore, UploadCandidate};
pub use normalize::InferenceResult;
pub use transport::{InferenceClient, RawResponse, TransportFailure};
pub use workflow::{
    InferenceRequest, LogObserver, PendingSubmission, Phase, Workflow, WorkflowObserver,
    WorkflowState,
};
