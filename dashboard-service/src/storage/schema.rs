//! Schema-qualified identifier construction.
//!
//! Every identifier the gateway emits is built by joining a whitelisted
//! constant with the configured schema name -- callers never get to
//! construct a table name from untrusted input (spec §4.1, §6
//! "Persisted state layout").

/// Whitelisted table name suffixes. Not an enum of strings callers can
/// extend; adding a table means adding a variant here.
#[derive(Debug, Clone, Copy)]
pub enum Table {
    Watchlist,
    PlayerSamplesRaw,
    PlayerSamplesHourly,
    PlayerSamplesDaily,
    Games,
    GameGenres,
    GameCategories,
}

impl Table {
    const fn suffix(self) -> &'static str {
        match self {
            Table::Watchlist => "watchlist",
            Table::PlayerSamplesRaw => "player_samples_raw",
            Table::PlayerSamplesHourly => "player_samples_hourly",
            Table::PlayerSamplesDaily => "player_samples_daily",
            Table::Games => "games",
            Table::GameGenres => "game_genres",
            Table::GameCategories => "game_categories",
        }
    }
}

/// Owns the schema name and renders `"schema"."table"` identifiers.
#[derive(Debug, Clone)]
pub struct SchemaNames {
    schema: String,
}

impl SchemaNames {
    pub fn new(schema: impl Into<String>) -> Self {
        Self { schema: schema.into() }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn qualified(&self, table: Table) -> String {
        format!("\"{}\".\"{}\"", self.schema, table.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_with_schema() {
        let names = SchemaNames::new("custom-steam-dashboard");
        assert_eq!(
            names.qualified(Table::Watchlist),
            "\"custom-steam-dashboard\".\"watchlist\""
        );
    }
}
