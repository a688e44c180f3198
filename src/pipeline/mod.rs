pub mod context;
pub mod controller;
pub mod session;
pub mod tools;
pub mod workspace;
