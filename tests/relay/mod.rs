mod relay_tests;
mod socket_tests;
