pub mod harvest;
pub mod projection;
pub mod sources;
pub mod step1_fetch;
pub mod step2_import;
pub mod step3_sample;
pub mod step4_normalize;
pub mod step5_merge;
pub mod zones;
