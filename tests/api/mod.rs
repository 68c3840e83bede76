mod auth_tests;
mod health_tests;
mod message_tests;
mod user_tests;
