use std::env;

/// Runs `f` with `vars` set, then puts the previous values back.
/// Callers must be `#[serial]`.
pub fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let result = f();

    for (key, previous) in saved {
        match previous {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    result
}
