// handlers/mod.rs - HTTP handlers
//
// Every route runs behind the auth gate, which attaches an identity when a
// valid bearer token is present. Handlers opt into requiring one via
// `RequireUser`; the rest read it through `MaybeUser`.

pub mod auth;
pub mod entity;
pub mod health;
pub mod integrations;
