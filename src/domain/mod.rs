pub mod password;
pub mod session;
pub mod todo;
pub mod user;

#[cfg(test)]
mod test_util;
