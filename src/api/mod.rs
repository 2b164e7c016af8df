// Re-export the API module components
pub use self::{
    client::{get_load_stats, ApiClient},
    errors::ApiClientError,
    models::{Job, LoadStat, Solution},
    polling::{SolveState, SolveWorkflow},
    transport::{HttpTransport, Transport, TransportError},
    types::{ClassifiedResponse, PollStatus, NOT_READY, NO_SLOT_AVAILABLE, OK_PREFIX},
};

// Module declarations
mod client;
mod errors;
mod models;
mod polling;
mod stop;
mod transport;
mod types;
