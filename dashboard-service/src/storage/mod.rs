//! Storage Gateway (spec §4.1): the only module that talks SQL.

pub mod gateway;
pub mod models;
pub mod schema;

pub use gateway::StorageGateway;
pub use models::{DailyAggregate, Game, GameDetails, HourlyAggregate, PlayerSample, WatchlistEntry};
pub use schema::{SchemaNames, Table};
