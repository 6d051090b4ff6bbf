/// Connection helpers shared by the model tests
pub mod db_tests;
