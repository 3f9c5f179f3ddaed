pub mod github;
pub mod mapping;
pub mod pull_request;
pub mod push;
pub mod tracker;
pub mod youtrack;
