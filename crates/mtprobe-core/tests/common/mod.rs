pub mod rdap_server;
