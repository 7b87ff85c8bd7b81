//! Command orchestration for a logistics dashboard: a pure state fold, an
//! ordered action bus, and long-lived listeners that call the remote API.

mod action;
pub use action::{Action, ActionKind, LABEL_NAMESPACE};
mod api;
pub use api::{RemoteApi, decode_response};
mod bus;
pub use bus::{Bus, Subscription};
mod dashboard;
mod error;
mod listener;
mod reducer;
pub use reducer::fold;
mod session;
mod state;

pub use dashboard::{Dashboard, DashboardBuilder, DashboardConfig};
pub use error::{ActionError, RemoteError, WorkflowError};
pub use listener::{
    AcknowledgeListener, AdminDataListener, CommandListener, ListenerFailure, StormListener,
};
pub use session::{SessionProvider, SharedToken};
pub use state::{
    AdminData, DashboardState, HIDDEN_INFO_BOX, InfoBox, Recommendation, WeatherRecord,
};
