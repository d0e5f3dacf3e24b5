// This module is automatically generated from /resources/*.proto
include!(concat!(env!("OUT_DIR"), "/proto_gen/mod.rs"));
