pub mod connection;
pub mod dispatcher;
pub mod live_query;
