pub mod project;
pub mod pull_request;
pub mod registry;
pub mod repo;
