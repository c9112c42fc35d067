pub mod local_server;
pub mod test_helpers;
