pub mod gallery;
pub mod headless;
pub mod history;
pub mod orchestrator;
pub mod player;
pub mod request;
pub mod session;
pub mod source;
