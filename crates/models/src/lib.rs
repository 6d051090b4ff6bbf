pub mod errors;
pub mod db;
pub mod admin;
pub mod bus;

#[cfg(test)]
mod tests;
