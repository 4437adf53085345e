pub mod admin_auth;
pub mod search_query_limit;
