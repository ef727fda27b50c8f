//! Client half of the submission and polling protocols.
//!
//! All request-level state (base URL, auth token) lives in an explicit
//! [`ClientSession`] passed into every request builder; nothing is stored
//! globally. The session is initialized on startup and cleared on logout.

pub mod poller;
pub mod session;
pub mod submission;

pub use poller::{JobPoller, JobSnapshot, PollCursor};
pub use session::ClientSession;
pub use submission::SubmissionClient;
