pub mod snapshot_json;
