//! TeamPulse database layer
//!
//! sqlx repositories over the relational HR tables. Survey data is not stored here; it
//! lives behind the Supabase client in `teampulse-services`.

pub mod db;

pub use db::*;
