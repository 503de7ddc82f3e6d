pub mod snapshot_publisher;
