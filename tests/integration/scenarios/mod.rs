pub mod output_tests;
pub mod verdict_tests;
