pub mod conference_service;
pub mod live_query;
