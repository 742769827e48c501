// Managed-store REST client
//
// PostgREST-style interface of the backend-as-a-service: tables are exposed
// under `/rest/v1/{table}`, filters are query parameters (`user_id=eq.X`),
// and exact counts come back in the `Content-Range` header.

pub mod client;
pub mod models;

pub use client::StoreClient;
