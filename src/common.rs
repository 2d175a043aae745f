pub mod db_utils;
pub mod error;
pub mod format;
pub mod retry;

#[cfg(test)]
pub mod test_support;
