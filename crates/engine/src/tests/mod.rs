mod helpers;

mod document_store_tests;
mod read_tests;
