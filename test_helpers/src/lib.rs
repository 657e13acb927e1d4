//! Test helpers shared across crates in the workspace.
//!
//! Currently limited to scoped environment-variable manipulation.

pub mod env {
    //! Scoped environment-variable mutation for tests.
    //!
    //! The process environment is global, so every mutation happens under a
    //! process-wide mutex and is rolled back when the scope ends. Combine
    //! with `#[serial]` when a test reads the environment outside these
    //! helpers.
    //!
    //! # Examples
    //!
    //! ```
    //! use strata_config_test_helpers::env;
    //!
    //! let seen = env::with_vars(&[("GREETING", Some("hi"))], || {
    //!     std::env::var("GREETING").ok()
    //! });
    //! assert_eq!(seen.as_deref(), Some("hi"));
    //! assert!(std::env::var("GREETING").is_err());
    //! ```

    use std::env;
    use std::ffi::OsString;
    use std::sync::{LazyLock, Mutex, PoisonError};

    static ENV_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    /// Runs `body` with the given variables applied, restoring the previous
    /// state afterwards. A `None` value removes the variable for the scope.
    pub fn with_vars<R>(vars: &[(&str, Option<&str>)], body: impl FnOnce() -> R) -> R {
        let _lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let saved: Vec<(String, Option<OsString>)> = vars
            .iter()
            .map(|(key, _)| ((*key).to_owned(), env::var_os(key)))
            .collect();
        for (key, value) in vars {
            match value {
                Some(value) => unsafe { env::set_var(key, value) },
                None => unsafe { env::remove_var(key) },
            }
        }
        let restore = Restore { saved };
        let result = body();
        drop(restore);
        result
    }

    /// Runs `body` with a single variable set.
    pub fn with_var<R>(key: &str, value: &str, body: impl FnOnce() -> R) -> R {
        with_vars(&[(key, Some(value))], body)
    }

    struct Restore {
        saved: Vec<(String, Option<OsString>)>,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            for (key, original) in self.saved.drain(..) {
                match original {
                    Some(value) => unsafe { env::set_var(&key, value) },
                    None => unsafe { env::remove_var(&key) },
                }
            }
        }
    }

}
