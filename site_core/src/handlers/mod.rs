pub mod jobs;
pub mod routes;
pub mod submissions;
