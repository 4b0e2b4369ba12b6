pub mod endpoints;
pub mod middleware;
pub mod rest;
pub mod security;
pub mod state;
