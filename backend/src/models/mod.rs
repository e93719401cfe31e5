//! Domain model: accounts, directory data, maintenance requests and the
//! scheduling window shared by the availability engine.

pub mod macros;

pub mod account;
pub mod directory;
pub mod maintenance;
pub mod window;
