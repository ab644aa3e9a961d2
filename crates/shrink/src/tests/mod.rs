mod compress_tests;
mod summary_tests;
