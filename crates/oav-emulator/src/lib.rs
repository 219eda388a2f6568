//! Request emulation on top of `oav-core`: schema loading, credential
//! persistence, request preparation, and live execution.

pub mod engine;
pub mod loader;
pub mod prepare;
pub mod response;
pub mod store;

pub use engine::{
    BodyEditorMode, EmulatorOptions, EndpointSelection, GroupedInputs, ParamInput,
    PreparedRequest, RequestEmulator,
};
pub use loader::{SchemaLoadError, SchemaLoader, document_from_value};
pub use response::{BodyKind, ExecutionError, ExecutionErrorCode, ExecutionState, ResponseResult};
pub use store::CredentialStore;
