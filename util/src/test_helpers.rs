use std::env;

/// Sets an environment variable for the remainder of the test.
///
/// Tests touching the environment must be marked `#[serial]`; the process
/// environment is shared between test threads.
pub fn set_env(key: &str, value: &str) {
    unsafe {
        env::set_var(key, value);
    }
}

/// Removes every listed variable so `AppConfig::from_env` sees its defaults.
pub fn clear_env(keys: &[&str]) {
    for key in keys {
        unsafe {
            env::remove_var(key);
        }
    }
}
