pub mod csv_store;
pub mod http_client;
pub mod market_data;
pub mod registry;
