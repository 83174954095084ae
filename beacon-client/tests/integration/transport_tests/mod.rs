mod test_relay_client;
mod test_signaling_transport;
